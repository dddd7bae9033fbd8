//! The constructors and the wire format methods of message classes.
//!
//! `serialize`, `num_fields_set` and `protobuf_size` must agree on which fields are present: a
//! field contributes to the size exactly when it is counted as set, and oneof members only when
//! their case is live.

use super::{
    message::{Member, MessageInfo},
    FileGenerator,
};
use crate::{
    error::Error,
    field::{FieldClass, FieldType},
};

/// Refers to `name` through `object`, or directly if the code runs inside the class.
fn qualified(object: Option<&str>, name: &str) -> String {
    match object {
        Some(object) => format!("{}.{}", object, name),
        None => name.to_owned(),
    }
}

impl<'a> FileGenerator<'a> {
    pub(super) fn write_default_constructor(&mut self, info: &MessageInfo<'a>) -> Result<(), Error> {
        let initializers = self.options.constructor_initializers;

        self.w.start_constructor_decl(None)?;
        if initializers {
            for member in &info.members {
                let ty = self.annotation(&member.ty, true)?;
                self.w.end_line();
                self.w
                    .parameter_with_default(&format!("--{}", member.name), &ty, "null")?;
            }
        }
        self.w.end_constructor_decl()?;

        if initializers {
            for member in &info.members {
                self.w.start_call("if")?;
                self.w.argument(&format!("{} != null", member.name))?;
                self.w.start_block(&[])?;
                self.w.start_assignment(&format!("this.{}", member.name))?;
                self.w.argument(&member.name)?;
                self.w.end_assignment()?;
                self.w.end_block()?;
                self.w.end_call()?;
            }
        }

        self.w.end_constructor()?;
        Ok(())
    }

    pub(super) fn write_deserialize_constructor(
        &mut self,
        info: &MessageInfo<'a>,
    ) -> Result<(), Error> {
        self.w.start_constructor_decl(Some("deserialize"))?;
        self.w.parameter("r", "_protobuf.Reader")?;
        self.w.end_constructor_decl()?;

        if self.options.convert_hooks {
            self.w.start_call("deserialize_into")?;
            self.w.argument("r")?;
            self.w.argument("this")?;
            self.w.end_call()?;
        } else {
            self.write_deserialize_body(info, None)?;
        }

        self.w.end_constructor()?;
        Ok(())
    }

    /// Reads every field of the message from `r`, assigning them to `object`.
    pub(super) fn write_deserialize_body(
        &mut self,
        info: &MessageInfo<'a>,
        object: Option<&str>,
    ) -> Result<(), Error> {
        self.w.start_call("r.read_message")?;
        self.w.start_block(&[])?;

        if info.members.is_empty() {
            self.w.literal("1")?;
        }
        for member in &info.members {
            self.w.start_call("r.read_field")?;
            self.w.argument(&member.number())?;
            self.w.start_block(&[])?;
            self.write_read_member(member, object)?;
            self.w.end_block()?;
            self.w.end_call()?;
        }

        self.w.end_block()?;
        self.w.end_call()?;
        Ok(())
    }

    fn write_read_member(&mut self, member: &Member<'a>, object: Option<&str>) -> Result<(), Error> {
        let through_hook =
            self.options.convert_hooks && !matches!(member.ty.class, FieldClass::Object(_));

        if through_hook {
            self.w
                .start_call(&qualified(object, &format!("_deserialize_{}", member.name)))?;
            self.w.end_line();
            self.write_read_value(&member.ty, &member.name, &member.name, object)?;
            self.w.end_call()?;
        } else {
            self.w.start_assignment(&qualified(object, &member.name))?;
            self.write_read_value(&member.ty, &member.name, &member.name, object)?;
            self.w.end_assignment()?;
        }
        Ok(())
    }

    /// Writes an expression reading a value of type `ty`.
    ///
    /// `field` is the name of the field being read, which collections are read into. `hook` names
    /// the convert hooks of the value.
    fn write_read_value(
        &mut self,
        ty: &FieldType<'a>,
        field: &str,
        hook: &str,
        object: Option<&str>,
    ) -> Result<(), Error> {
        match &ty.class {
            FieldClass::Primitive(_) => {
                self.w.start_call("r.read_primitive")?;
                self.w.argument(ty.type_constant())?;
                self.w.end_call()?;
            }
            FieldClass::Object(entry) => {
                if let Some(well_known) = self.well_known(ty) {
                    self.w.start_call(&well_known.deserialize_fn())?;
                    self.w.argument("r")?;
                } else if self.options.convert_hooks {
                    let class_name = self.class_name(entry)?;
                    self.w
                        .start_call(&format!("{}.deserialize_into", class_name))?;
                    self.w.argument("r")?;
                    self.w
                        .argument(&qualified(object, &format!("_initialize_{}", hook)))?;
                } else {
                    let class_name = self.class_name(entry)?;
                    self.w.start_call(&format!("{}.deserialize", class_name))?;
                    self.w.argument("r")?;
                }
                self.w.end_call()?;
            }
            FieldClass::List(element) => {
                self.w.start_call("r.read_array")?;
                self.w.argument(element.type_constant())?;
                self.w.argument(&qualified(object, field))?;
                self.w.start_block(&[])?;
                self.write_read_element(element, &format!("{}_value", hook), object)?;
                self.w.end_block()?;
                self.w.end_call()?;
            }
            FieldClass::Map { key, value } => {
                self.w.start_call("r.read_map")?;
                self.w.argument(&qualified(object, field))?;
                self.w.start_parens_block(&[])?;
                self.write_read_element(key, &format!("{}_key", hook), object)?;
                self.w.end_block()?;
                self.w.start_parens_block(&[])?;
                self.write_read_element(value, &format!("{}_value", hook), object)?;
                self.w.end_block()?;
                self.w.end_call()?;
            }
        }
        Ok(())
    }

    fn write_read_element(
        &mut self,
        ty: &FieldType<'a>,
        hook: &str,
        object: Option<&str>,
    ) -> Result<(), Error> {
        if self.options.convert_hooks && !matches!(ty.class, FieldClass::Object(_)) {
            self.w
                .start_call(&qualified(object, &format!("_deserialize_{}", hook)))?;
            self.write_read_value(ty, "", hook, object)?;
            self.w.end_call()?;
            Ok(())
        } else {
            self.write_read_value(ty, "", hook, object)
        }
    }

    pub(super) fn write_serialize(&mut self, info: &MessageInfo<'a>) -> Result<(), Error> {
        self.w.start_function_decl("serialize")?;
        self.w.parameter("w", "_protobuf.Writer")?;
        self.w.parameter_with_default("--as_field", "int?", "null")?;
        self.w.parameter_with_default("--oneof", "bool", "false")?;
        self.w.end_function_decl("none")?;

        self.w.start_call("w.write_message_header")?;
        self.w.argument("this")?;
        self.w.named_argument("as_field", Some("as_field"))?;
        self.w.named_argument("oneof", Some("oneof"))?;
        self.w.end_call()?;

        for member in &info.members {
            match &member.oneof {
                Some(oneof) => {
                    let names = &info.oneofs[oneof.index];
                    let source = if self.options.convert_hooks {
                        format!("_serialize_{}", member.name)
                    } else {
                        names.storage.clone()
                    };

                    self.w.start_call("if")?;
                    self.w
                        .argument(&format!("{} == {}", names.case_storage, oneof.constant))?;
                    self.w.start_block(&[])?;
                    self.write_serialize_value(
                        &member.ty,
                        &source,
                        &member.name,
                        Some(oneof.constant.as_str()),
                        true,
                    )?;
                    self.w.end_block()?;
                    self.w.end_call()?;
                }
                None => {
                    let source = self.member_value(member);
                    self.write_serialize_value(
                        &member.ty,
                        &source,
                        &member.name,
                        Some(member.number().as_str()),
                        false,
                    )?;
                }
            }
        }

        self.w.end_function()?;
        Ok(())
    }

    /// Writes the statement serializing the value `source` of type `ty`.
    fn write_serialize_value(
        &mut self,
        ty: &FieldType<'a>,
        source: &str,
        hook: &str,
        as_field: Option<&str>,
        oneof: bool,
    ) -> Result<(), Error> {
        match &ty.class {
            FieldClass::Primitive(_) => {
                self.w.start_call("w.write_primitive")?;
                self.w.argument(ty.type_constant())?;
                self.w.argument(source)?;
                self.write_field_arguments(as_field, oneof)?;
                self.w.end_call()?;
            }
            FieldClass::Object(_) => {
                if let Some(well_known) = self.well_known(ty) {
                    self.w.start_call(&well_known.serialize_fn())?;
                    self.w.argument(source)?;
                    self.w.argument("w")?;
                } else {
                    self.w.start_call(&format!("{}.serialize", source))?;
                    self.w.argument("w")?;
                }
                self.write_field_arguments(as_field, oneof)?;
                self.w.end_call()?;
            }
            FieldClass::List(element) => {
                let param = format!("value/{}", self.annotation(element, false)?);
                let hook = format!("{}_value", hook);
                let element_source = self.element_value(&hook, "value");

                self.w.start_call("w.write_array")?;
                self.w.argument(element.type_constant())?;
                self.w.argument(source)?;
                self.write_field_arguments(as_field, oneof)?;
                self.w.start_block(&[param.as_str()])?;
                self.write_serialize_value(element, &element_source, &hook, None, false)?;
                self.w.end_block()?;
                self.w.end_call()?;
            }
            FieldClass::Map { key, value } => {
                let key_param = format!("key/{}", self.annotation(key, false)?);
                let value_param = format!("value/{}", self.annotation(value, false)?);
                let key_hook = format!("{}_key", hook);
                let value_hook = format!("{}_value", hook);
                let key_source = self.element_value(&key_hook, "key");
                let value_source = self.element_value(&value_hook, "value");

                self.w.start_call("w.write_map")?;
                self.w.argument(key.type_constant())?;
                self.w.argument(value.type_constant())?;
                self.w.argument(source)?;
                self.write_field_arguments(as_field, oneof)?;
                self.w.start_parens_block(&[key_param.as_str()])?;
                self.write_serialize_value(key, &key_source, &key_hook, None, false)?;
                self.w.end_block()?;
                self.w.start_parens_block(&[value_param.as_str()])?;
                self.write_serialize_value(value, &value_source, &value_hook, None, false)?;
                self.w.end_block()?;
                self.w.end_call()?;
            }
        }
        Ok(())
    }

    fn write_field_arguments(&mut self, as_field: Option<&str>, oneof: bool) -> Result<(), Error> {
        if let Some(number) = as_field {
            self.w.named_argument("as_field", Some(number))?;
        }
        if oneof {
            self.w.named_argument("oneof", None)?;
        }
        Ok(())
    }

    pub(super) fn write_num_fields_set(&mut self, info: &MessageInfo<'a>) -> Result<(), Error> {
        self.w.start_function_decl("num_fields_set")?;
        self.w.end_function_decl("int")?;
        self.w.start_return()?;

        let mut conditions = Vec::new();
        for names in &info.oneofs {
            conditions.push(format!("{} == null", names.case_storage));
        }
        for member in info.plain_members() {
            let value = self.member_value(member);
            conditions.push(self.is_default(&member.ty, &value)?);
        }

        if conditions.is_empty() {
            self.w.argument("0")?;
        }
        for (index, condition) in conditions.iter().enumerate() {
            if index != 0 {
                self.w.end_line();
                self.w.literal("+")?;
            }
            self.w.condition_expression(condition, "0", "1")?;
        }

        self.w.end_return()?;
        self.w.end_function()?;
        Ok(())
    }

    pub(super) fn write_protobuf_size(&mut self, info: &MessageInfo<'a>) -> Result<(), Error> {
        self.w.start_function_decl("protobuf_size")?;
        self.w.end_function_decl("int")?;
        self.w.start_return()?;

        if info.members.is_empty() {
            self.w.argument("0")?;
        }
        for (index, member) in info.members.iter().enumerate() {
            if index != 0 {
                self.w.end_line();
                self.w.literal("+")?;
            }

            match &member.oneof {
                Some(oneof) => {
                    let names = &info.oneofs[oneof.index];
                    self.w.start_parens()?;
                    self.w
                        .literal(&format!("{} == {} ?", names.case_storage, oneof.constant))?;
                    self.write_size_value(member, true)?;
                    self.w.literal(": 0")?;
                    self.w.end_parens()?;
                }
                None => self.write_size_value(member, false)?,
            }
        }

        self.w.end_return()?;
        self.w.end_function()?;
        Ok(())
    }

    /// Writes a parenthesized expression computing the encoded size of a field.
    fn write_size_value(&mut self, member: &Member<'a>, oneof: bool) -> Result<(), Error> {
        let source = self.member_value(member);

        self.w.start_parens()?;
        match &member.ty.class {
            FieldClass::Primitive(_) => {
                self.w.start_call("_protobuf.size_primitive")?;
                self.w.argument(member.ty.type_constant())?;
                self.w.argument(&source)?;
            }
            FieldClass::List(element) => {
                self.w.start_call("_protobuf.size_array")?;
                self.w.argument(element.type_constant())?;
                self.w.argument(&source)?;
            }
            FieldClass::Map { key, value } => {
                self.w.start_call("_protobuf.size_map")?;
                self.w.argument(key.type_constant())?;
                self.w.argument(value.type_constant())?;
                self.w.argument(&source)?;
            }
            FieldClass::Object(_) => match self.well_known(&member.ty) {
                Some(well_known) => {
                    self.w.start_call(&well_known.size_fn())?;
                    self.w.argument(&source)?;
                }
                None => {
                    self.w.start_call("_protobuf.size_embedded_message")?;
                    self.w.argument(&format!("({}.protobuf_size)", source))?;
                }
            },
        }
        self.write_field_arguments(Some(member.number().as_str()), oneof)?;
        self.w.end_call()?;
        self.w.end_parens()?;
        Ok(())
    }
}
