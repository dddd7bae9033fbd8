//! Classification of message fields by how they are represented in Toit.

use prost_types::{
    field_descriptor_proto::{Label, Type},
    FieldDescriptorProto,
};

use crate::{
    error::{Error, ErrorKind},
    types::{TypeEntry, TypeKind, TypeRegistry},
};

const MAP_KEY_NUMBER: i32 = 1;
const MAP_VALUE_NUMBER: i32 = 2;

/// A field together with its classification.
#[derive(Debug, Clone)]
pub(crate) struct FieldType<'a> {
    pub field: &'a FieldDescriptorProto,
    pub class: FieldClass<'a>,
}

#[derive(Debug, Clone)]
pub(crate) enum FieldClass<'a> {
    /// A scalar or enum value.
    Primitive(Primitive<'a>),
    /// An embedded message.
    Object(&'a TypeEntry<'a>),
    List(Box<FieldType<'a>>),
    Map {
        key: Box<FieldType<'a>>,
        value: Box<FieldType<'a>>,
    },
}

#[derive(Debug, Clone, Copy)]
pub(crate) enum Primitive<'a> {
    Scalar(Type),
    Enum(&'a TypeEntry<'a>),
}

/// Message types with a dedicated representation in the Toit core library.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum WellKnown {
    Duration,
    Timestamp,
}

impl WellKnown {
    pub fn from_name(full_name: &str) -> Option<Self> {
        match full_name {
            ".google.protobuf.Duration" => Some(WellKnown::Duration),
            ".google.protobuf.Timestamp" => Some(WellKnown::Timestamp),
            _ => None,
        }
    }

    pub fn class_name(self) -> &'static str {
        match self {
            WellKnown::Duration => "_core.Duration",
            WellKnown::Timestamp => "_core.Time",
        }
    }

    pub fn default_value(self) -> &'static str {
        match self {
            WellKnown::Duration => "_core.Duration.ZERO",
            WellKnown::Timestamp => "_protobuf.TIME_ZERO_EPOCH",
        }
    }

    fn helper_suffix(self) -> &'static str {
        match self {
            WellKnown::Duration => "duration",
            WellKnown::Timestamp => "timestamp",
        }
    }

    pub fn deserialize_fn(self) -> String {
        format!("_protobuf.deserialize_{}", self.helper_suffix())
    }

    pub fn serialize_fn(self) -> String {
        format!("_protobuf.serialize_{}", self.helper_suffix())
    }

    pub fn size_fn(self) -> String {
        format!("_protobuf.size_{}", self.helper_suffix())
    }

    /// An expression testing whether `value` holds the default value.
    pub fn is_default(self, value: &str) -> String {
        match self {
            WellKnown::Duration => format!("{}.is_zero", value),
            WellKnown::Timestamp => format!("(_protobuf.time_is_zero_epoch {})", value),
        }
    }
}

/// Classifies fields using the types of a [`TypeRegistry`].
#[derive(Debug, Clone, Copy)]
pub(crate) struct Classifier<'a> {
    registry: &'a TypeRegistry<'a>,
}

impl<'a> Classifier<'a> {
    pub fn new(registry: &'a TypeRegistry<'a>) -> Self {
        Classifier { registry }
    }

    /// Classifies `field`, declared in the message named `message`.
    pub fn classify(
        &self,
        message: &str,
        field: &'a FieldDescriptorProto,
    ) -> Result<FieldType<'a>, Error> {
        self.classify_inner(message, field, false)
    }

    fn classify_inner(
        &self,
        message: &str,
        field: &'a FieldDescriptorProto,
        ignore_repeated: bool,
    ) -> Result<FieldType<'a>, Error> {
        let ty = field.r#type();
        let target = match ty {
            Type::Message | Type::Enum => Some(self.resolve(message, field)?),
            Type::Group => return Err(unsupported(message, field, "groups are not supported")),
            _ => None,
        };

        let repeated = field.label() == Label::Repeated && !ignore_repeated;
        let class = match (ty, target, repeated) {
            (Type::Message, Some(entry), true) if entry.is_map_entry() => {
                let (key, value) = self.map_fields(message, field, entry)?;
                FieldClass::Map {
                    key: Box::new(key),
                    value: Box::new(value),
                }
            }
            (_, _, true) => FieldClass::List(Box::new(self.classify_inner(message, field, true)?)),
            (Type::Message, Some(entry), false) => FieldClass::Object(entry),
            (Type::Enum, Some(entry), false) => FieldClass::Primitive(Primitive::Enum(entry)),
            (ty, _, false) => FieldClass::Primitive(Primitive::Scalar(ty)),
        };

        Ok(FieldType { field, class })
    }

    fn resolve(
        &self,
        message: &str,
        field: &'a FieldDescriptorProto,
    ) -> Result<&'a TypeEntry<'a>, Error> {
        let entry = self.registry.get(field.type_name()).ok_or_else(|| {
            Error::from_kind(ErrorKind::UnresolvedType {
                name: field.type_name().to_owned(),
                field: format!("{}.{}", message, field.name()),
            })
        })?;

        match (field.r#type(), entry.kind) {
            (Type::Message, TypeKind::Message(_)) | (Type::Enum, TypeKind::Enum(_)) => Ok(entry),
            (Type::Message, TypeKind::Enum(_)) => Err(unsupported(
                message,
                field,
                &format!("'{}' is an enum, not a message", entry.full_name),
            )),
            _ => Err(unsupported(
                message,
                field,
                &format!("'{}' is a message, not an enum", entry.full_name),
            )),
        }
    }

    fn map_fields(
        &self,
        message: &str,
        field: &'a FieldDescriptorProto,
        entry: &'a TypeEntry<'a>,
    ) -> Result<(FieldType<'a>, FieldType<'a>), Error> {
        let fields = entry.message().map_or(&[][..], |entry| &entry.field[..]);
        let find = |number: i32| fields.iter().find(|f| f.number() == number);

        match (find(MAP_KEY_NUMBER), find(MAP_VALUE_NUMBER)) {
            (Some(key), Some(value)) => Ok((
                self.classify_inner(&entry.full_name, key, false)?,
                self.classify_inner(&entry.full_name, value, false)?,
            )),
            _ => Err(unsupported(
                message,
                field,
                &format!("map entry '{}' has no key or value field", entry.full_name),
            )),
        }
    }
}

fn unsupported(message: &str, field: &FieldDescriptorProto, kind: &str) -> Error {
    Error::from_kind(ErrorKind::UnsupportedKind {
        field: format!("{}.{}", message, field.name()),
        kind: kind.to_owned(),
    })
}

impl<'a> FieldType<'a> {
    /// The name of the `encoding.protobuf` constant describing how values are encoded.
    ///
    /// For lists this is the type of the elements.
    pub fn type_constant(&self) -> &'static str {
        match &self.class {
            FieldClass::Primitive(Primitive::Scalar(ty)) => scalar_type_constant(*ty),
            FieldClass::Primitive(Primitive::Enum(_)) => "_protobuf.PROTOBUF_TYPE_ENUM",
            FieldClass::Object(_) | FieldClass::Map { .. } => "_protobuf.PROTOBUF_TYPE_MESSAGE",
            FieldClass::List(element) => element.type_constant(),
        }
    }

    /// Whether presence is tested with `.is_empty` rather than by comparing with the default.
    pub fn has_is_empty(&self) -> bool {
        match &self.class {
            FieldClass::Primitive(Primitive::Scalar(ty)) => {
                matches!(ty, Type::String | Type::Bytes)
            }
            FieldClass::Primitive(Primitive::Enum(_)) => false,
            FieldClass::Object(_) | FieldClass::List(_) | FieldClass::Map { .. } => true,
        }
    }
}

pub(crate) fn scalar_type_constant(ty: Type) -> &'static str {
    match ty {
        Type::Double => "_protobuf.PROTOBUF_TYPE_DOUBLE",
        Type::Float => "_protobuf.PROTOBUF_TYPE_FLOAT",
        Type::Int64 => "_protobuf.PROTOBUF_TYPE_INT64",
        Type::Uint64 => "_protobuf.PROTOBUF_TYPE_UINT64",
        Type::Int32 => "_protobuf.PROTOBUF_TYPE_INT32",
        Type::Fixed64 => "_protobuf.PROTOBUF_TYPE_FIXED64",
        Type::Fixed32 => "_protobuf.PROTOBUF_TYPE_FIXED32",
        Type::Bool => "_protobuf.PROTOBUF_TYPE_BOOL",
        Type::String => "_protobuf.PROTOBUF_TYPE_STRING",
        Type::Group | Type::Message => "_protobuf.PROTOBUF_TYPE_MESSAGE",
        Type::Bytes => "_protobuf.PROTOBUF_TYPE_BYTES",
        Type::Uint32 => "_protobuf.PROTOBUF_TYPE_UINT32",
        Type::Enum => "_protobuf.PROTOBUF_TYPE_ENUM",
        Type::Sfixed32 => "_protobuf.PROTOBUF_TYPE_SFIXED32",
        Type::Sfixed64 => "_protobuf.PROTOBUF_TYPE_SFIXED64",
        Type::Sint32 => "_protobuf.PROTOBUF_TYPE_SINT32",
        Type::Sint64 => "_protobuf.PROTOBUF_TYPE_SINT64",
    }
}

/// The Toit class used for values of a scalar type.
pub(crate) fn scalar_toit_type(ty: Type) -> &'static str {
    match ty {
        Type::Double | Type::Float => "float",
        Type::Bool => "bool",
        Type::String => "string",
        Type::Bytes => "ByteArray",
        Type::Int64
        | Type::Uint64
        | Type::Int32
        | Type::Fixed64
        | Type::Fixed32
        | Type::Uint32
        | Type::Sfixed32
        | Type::Sfixed64
        | Type::Sint32
        | Type::Sint64
        | Type::Enum
        | Type::Group
        | Type::Message => "int",
    }
}

/// The protobuf zero value of a scalar type.
pub(crate) fn scalar_default(ty: Type) -> &'static str {
    match ty {
        Type::Double | Type::Float => "0.0",
        Type::Bool => "false",
        Type::String => "\"\"",
        Type::Bytes => "ByteArray 0",
        Type::Int64
        | Type::Uint64
        | Type::Int32
        | Type::Fixed64
        | Type::Fixed32
        | Type::Uint32
        | Type::Sfixed32
        | Type::Sfixed64
        | Type::Sint32
        | Type::Sint64
        | Type::Enum
        | Type::Group
        | Type::Message => "0",
    }
}
