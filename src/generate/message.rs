use prost_types::DescriptorProto;
use tracing::trace;

use super::{hooks::hook_names, FileGenerator};
use crate::{
    error::Error,
    field::FieldType,
    names::{MessageNames, OneofNames},
};

/// A message class being generated.
pub(super) struct MessageInfo<'a> {
    pub descriptor: &'a DescriptorProto,
    pub full_name: String,
    pub class_name: String,
    pub oneofs: Vec<OneofNames>,
    pub members: Vec<Member<'a>>,
}

/// A field of a message, with the names generated for it.
pub(super) struct Member<'a> {
    pub ty: FieldType<'a>,
    /// The name of the field, or of the getter and setter for oneof members.
    pub name: String,
    pub oneof: Option<OneofMember>,
}

pub(super) struct OneofMember {
    pub index: usize,
    /// The static constant holding the field number.
    pub constant: String,
}

impl<'a> MessageInfo<'a> {
    pub fn plain_members(&self) -> impl Iterator<Item = &Member<'a>> {
        self.members.iter().filter(|member| member.oneof.is_none())
    }
}

impl<'a> Member<'a> {
    pub fn number(&self) -> String {
        self.ty.field.number().to_string()
    }
}

impl<'a> FileGenerator<'a> {
    pub(super) fn write_message(
        &mut self,
        scope: &str,
        class_prefix: &str,
        message: &'a DescriptorProto,
    ) -> Result<(), Error> {
        let full_name = format!("{}.{}", scope, message.name());
        let class_name = format!("{}{}", class_prefix, message.name());
        trace!(message = %full_name, class = %class_name, "generating message");

        self.w
            .comment(&format!("MESSAGE START: {}", full_name))?;

        let nested_prefix = format!("{}_", class_name);
        for enu in &message.enum_type {
            self.write_enum(&full_name, &nested_prefix, enu)?;
        }
        for nested in &message.nested_type {
            let is_map_entry = nested
                .options
                .as_ref()
                .map_or(false, |options| options.map_entry());
            if !is_map_entry {
                self.write_message(&full_name, &nested_prefix, nested)?;
            }
        }

        let info = self.message_info(full_name, class_name, message)?;

        self.w
            .start_class(&info.class_name, Some("_protobuf.Message"))?;
        for index in 0..info.oneofs.len() {
            self.write_oneof(&info, index)?;
        }
        for member in info.plain_members() {
            let ty = self.annotation(&member.ty, false)?;
            let default = self.default_value(&member.ty)?;
            self.w.variable(&member.name, &ty, &default)?;
        }
        self.w.new_line();

        if self.options.convert_hooks {
            self.write_deserialize_into(&info)?;
        }
        self.write_default_constructor(&info)?;
        self.write_deserialize_constructor(&info)?;
        if self.options.convert_hooks {
            self.write_convert_hooks(&info)?;
        }
        self.write_serialize(&info)?;
        self.write_num_fields_set(&info)?;
        self.write_protobuf_size(&info)?;
        self.w.end_class()?;

        self.w
            .comment(&format!("MESSAGE END: {}", info.full_name))?;
        self.w.new_line();
        Ok(())
    }

    fn message_info(
        &self,
        full_name: String,
        class_name: String,
        message: &'a DescriptorProto,
    ) -> Result<MessageInfo<'a>, Error> {
        let mut names = MessageNames::new(&full_name, message, self.options.convert_hooks)?;

        let mut members = Vec::with_capacity(message.field.len());
        for (index, field) in message.field.iter().enumerate() {
            let ty = self.classifier.classify(&full_name, field)?;
            let oneof = field.oneof_index.map(|oneof_index| OneofMember {
                index: oneof_index as usize,
                constant: names.case_constant(index),
            });
            members.push(Member {
                ty,
                name: names.fields[index].clone(),
                oneof,
            });
        }

        if self.options.convert_hooks {
            let mut hooks = Vec::new();
            for member in &members {
                hook_names(&member.ty, &member.name, &mut hooks);
            }
            for hook in &hooks {
                names.scope.reserve(hook)?;
            }
        }

        Ok(MessageInfo {
            descriptor: message,
            full_name,
            class_name,
            oneofs: names.oneofs,
            members,
        })
    }
}
