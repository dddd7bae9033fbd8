//! Generation of identifiers that are unique within a Toit class.

use std::collections::HashSet;

use prost_types::DescriptorProto;

use crate::{
    case::to_upper_case,
    error::{Error, ErrorKind},
};

/// Names that can never be used for generated members.
pub(crate) const RESERVED_NAMES: &[&str] = &[
    "operator",
    "static",
    "class",
    "constructor",
    "interface",
    "serialize",
    "num_fields_set",
    "protobuf_size",
    // Parameters of the generated constructors and methods.
    "r",
    "w",
    "obj",
];

/// The static method generated with convert hooks.
const DESERIALIZE_INTO: &str = "deserialize_into";

const MARKER: char = '_';

/// Prepends underscores to `name` until it is not contained in `used`.
pub(crate) fn unique_name(name: &str, used: &HashSet<String>) -> String {
    let mut name = name.to_owned();
    while used.contains(&name) {
        name.insert(0, MARKER);
    }
    name
}

/// The set of member names already defined in a class.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Scope {
    name: String,
    used: HashSet<String>,
}

impl Scope {
    pub fn new(name: impl Into<String>) -> Self {
        Scope {
            name: name.into(),
            used: RESERVED_NAMES.iter().map(|&name| name.to_owned()).collect(),
        }
    }

    /// Claims a unique variant of `candidate`.
    pub fn claim(&mut self, candidate: &str) -> String {
        let name = unique_name(candidate, &self.used);
        self.used.insert(name.clone());
        name
    }

    /// Claims `name` exactly, failing if it is already taken.
    pub fn reserve(&mut self, name: &str) -> Result<(), Error> {
        if self.used.insert(name.to_owned()) {
            Ok(())
        } else {
            Err(Error::from_kind(ErrorKind::NameCollision {
                name: name.to_owned(),
                scope: self.name.clone(),
            }))
        }
    }
}

/// Generated names for a single oneof declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct OneofNames {
    /// The slot holding the value of whichever member is set.
    pub storage: String,
    /// The slot holding the number of the member that is set.
    pub case_storage: String,
    pub case_getter: String,
    pub clear: String,
}

/// Generated names for all members of a message class.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct MessageNames {
    pub oneofs: Vec<OneofNames>,
    /// The accessor name of each field, indexed like `DescriptorProto::field`.
    pub fields: Vec<String>,
    /// Every name defined so far, for members generated after the fields.
    pub scope: Scope,
}

impl MessageNames {
    /// Assigns names to the oneofs and fields of `message`, whose fully-qualified name is
    /// `full_name`.
    ///
    /// Oneof groups are named first, in declaration order, followed by the remaining
    /// fields. With `convert_hooks`, fields are kept away from `deserialize_into`.
    pub fn new(
        full_name: &str,
        message: &DescriptorProto,
        convert_hooks: bool,
    ) -> Result<Self, Error> {
        if let Some(field) = message.field.iter().find(|field| {
            field
                .oneof_index
                .map_or(false, |index| index < 0 || index as usize >= message.oneof_decl.len())
        }) {
            return Err(Error::from_kind(ErrorKind::UnsupportedKind {
                field: format!("{}.{}", full_name, field.name()),
                kind: format!("oneof index {} out of range", field.oneof_index()),
            }));
        }

        let mut scope = Scope::new(full_name);
        if convert_hooks {
            scope.reserve(DESERIALIZE_INTO)?;
        }
        let mut fields = vec![String::new(); message.field.len()];

        let mut oneofs = Vec::with_capacity(message.oneof_decl.len());
        for (index, oneof) in message.oneof_decl.iter().enumerate() {
            let storage = scope.claim(&format!("{}_", oneof.name()));
            let case_getter = scope.claim(&format!("{}_oneof_case", oneof.name()));
            let case_storage = format!("{}_", case_getter);
            scope.reserve(&case_storage)?;
            let clear = scope.claim(&format!("{}_oneof_clear", oneof.name()));

            for (field_index, field) in message.field.iter().enumerate() {
                if field.oneof_index != Some(index as i32) {
                    continue;
                }

                let name = scope.claim(&format!("{}{}", storage, field.name()));
                scope.reserve(&to_upper_case(&name))?;
                scope.reserve(&format!("{}=", name))?;
                fields[field_index] = name;
            }

            oneofs.push(OneofNames {
                storage,
                case_storage,
                case_getter,
                clear,
            });
        }

        for (field_index, field) in message.field.iter().enumerate() {
            if field.oneof_index.is_none() {
                fields[field_index] = scope.claim(field.name());
            }
        }

        Ok(MessageNames {
            oneofs,
            fields,
            scope,
        })
    }

    /// The name of the constant holding the field number of a oneof member.
    pub fn case_constant(&self, field_index: usize) -> String {
        to_upper_case(&self.fields[field_index])
    }
}
