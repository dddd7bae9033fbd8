//! Convert hooks.
//!
//! With the `convert_hooks` option, every value read from or written to the wire passes through
//! an overridable method of the message class. Subclasses can use these to store fields in a
//! different representation.

use super::{
    message::{Member, MessageInfo},
    FileGenerator,
};
use crate::{
    error::Error,
    field::{FieldClass, FieldType},
};

impl<'a> FileGenerator<'a> {
    /// Writes `static deserialize_into r obj`, which reads the fields of a message into an
    /// existing instance.
    pub(super) fn write_deserialize_into(&mut self, info: &MessageInfo<'a>) -> Result<(), Error> {
        self.w.start_static_function_decl("deserialize_into")?;
        self.w.parameter("r", "_protobuf.Reader")?;
        self.w.parameter("obj", &info.class_name)?;
        self.w.end_function_decl(&info.class_name)?;

        self.write_deserialize_body(info, Some("obj"))?;

        self.w.start_return()?;
        self.w.argument("obj")?;
        self.w.end_return()?;
        self.w.end_function()?;
        Ok(())
    }

    pub(super) fn write_convert_hooks(&mut self, info: &MessageInfo<'a>) -> Result<(), Error> {
        for member in &info.members {
            self.write_field_hooks(&member.ty, &member.name, &member.name, false)?;
        }
        Ok(())
    }

    fn write_field_hooks(
        &mut self,
        ty: &FieldType<'a>,
        field: &str,
        suffix: &str,
        in_collection: bool,
    ) -> Result<(), Error> {
        match &ty.class {
            FieldClass::List(element) => {
                self.write_deserialize_hook(ty, field, suffix, false)?;
                self.write_serialize_hook(ty, field, suffix, false)?;
                self.write_field_hooks(element, field, &format!("{}_value", suffix), true)?;
            }
            FieldClass::Map { key, value } => {
                self.write_deserialize_hook(ty, field, suffix, false)?;
                self.write_serialize_hook(ty, field, suffix, false)?;
                self.write_field_hooks(key, field, &format!("{}_key", suffix), true)?;
                self.write_field_hooks(value, field, &format!("{}_value", suffix), true)?;
            }
            FieldClass::Object(_) => {
                let annotation = self.annotation(ty, false)?;
                let default = self.default_value(ty)?;

                self.w
                    .start_function_decl(&format!("_initialize_{}", suffix))?;
                self.w.end_function_decl(&annotation)?;
                self.w.start_return()?;
                self.w.argument(&default)?;
                self.w.end_return()?;
                self.w.end_function()?;

                self.write_serialize_hook(ty, field, suffix, in_collection)?;
            }
            FieldClass::Primitive(_) => {
                self.write_deserialize_hook(ty, field, suffix, in_collection)?;
                self.write_serialize_hook(ty, field, suffix, in_collection)?;
            }
        }
        Ok(())
    }

    fn write_deserialize_hook(
        &mut self,
        ty: &FieldType<'a>,
        field: &str,
        suffix: &str,
        in_collection: bool,
    ) -> Result<(), Error> {
        let annotation = self.annotation(ty, false)?;

        self.w
            .start_function_decl(&format!("_deserialize_{}", suffix))?;
        self.w.parameter("in", &annotation)?;
        if in_collection {
            self.w.end_function_decl("any")?;
            self.w.start_return()?;
            self.w.argument("in")?;
            self.w.end_return()?;
        } else {
            self.w.end_function_decl("")?;
            self.w.start_assignment(field)?;
            self.w.argument("in")?;
            self.w.end_assignment()?;
        }
        self.w.end_function()?;
        Ok(())
    }

    fn write_serialize_hook(
        &mut self,
        ty: &FieldType<'a>,
        field: &str,
        suffix: &str,
        in_collection: bool,
    ) -> Result<(), Error> {
        let annotation = self.annotation(ty, false)?;

        self.w
            .start_function_decl(&format!("_serialize_{}", suffix))?;
        if in_collection {
            self.w.parameter("in", "any")?;
        }
        self.w.end_function_decl(&annotation)?;
        self.w.start_return()?;
        self.w.argument(if in_collection { "in" } else { field })?;
        self.w.end_return()?;
        self.w.end_function()?;
        Ok(())
    }

    /// The expression that yields the value of a field for serialization.
    pub(super) fn member_value(&self, member: &Member<'a>) -> String {
        if self.options.convert_hooks {
            format!("_serialize_{}", member.name)
        } else {
            member.name.clone()
        }
    }

    /// The expression that yields the element `var` of a collection for serialization.
    pub(super) fn element_value(&self, hook: &str, var: &str) -> String {
        if self.options.convert_hooks {
            format!("(_serialize_{} {})", hook, var)
        } else {
            var.to_owned()
        }
    }
}

/// Collects the names of the hook methods `write_field_hooks` generates for a field.
pub(super) fn hook_names(ty: &FieldType<'_>, suffix: &str, names: &mut Vec<String>) {
    match &ty.class {
        FieldClass::List(element) => {
            names.push(format!("_deserialize_{}", suffix));
            names.push(format!("_serialize_{}", suffix));
            hook_names(element, &format!("{}_value", suffix), names);
        }
        FieldClass::Map { key, value } => {
            names.push(format!("_deserialize_{}", suffix));
            names.push(format!("_serialize_{}", suffix));
            hook_names(key, &format!("{}_key", suffix), names);
            hook_names(value, &format!("{}_value", suffix), names);
        }
        FieldClass::Object(_) => {
            names.push(format!("_initialize_{}", suffix));
            names.push(format!("_serialize_{}", suffix));
        }
        FieldClass::Primitive(_) => {
            names.push(format!("_deserialize_{}", suffix));
            names.push(format!("_serialize_{}", suffix));
        }
    }
}
