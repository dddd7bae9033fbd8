//! The registry of every message and enum in a request.

use std::collections::HashMap;

use prost_types::{DescriptorProto, EnumDescriptorProto, FileDescriptorProto};
use tracing::debug;

/// The definition of a registered type.
#[derive(Debug, Clone, Copy)]
pub(crate) enum TypeKind<'a> {
    Message(&'a DescriptorProto),
    Enum(&'a EnumDescriptorProto),
}

/// A message or enum, together with the location it was declared at.
#[derive(Debug, Clone)]
pub(crate) struct TypeEntry<'a> {
    pub kind: TypeKind<'a>,
    pub file: &'a FileDescriptorProto,
    /// The names of the enclosing messages, outermost first.
    pub parents: Vec<String>,
    pub full_name: String,
}

impl<'a> TypeEntry<'a> {
    pub fn name(&self) -> &'a str {
        match self.kind {
            TypeKind::Message(message) => message.name(),
            TypeKind::Enum(enu) => enu.name(),
        }
    }

    pub fn message(&self) -> Option<&'a DescriptorProto> {
        match self.kind {
            TypeKind::Message(message) => Some(message),
            TypeKind::Enum(_) => None,
        }
    }

    pub fn is_map_entry(&self) -> bool {
        self.message()
            .and_then(|message| message.options.as_ref())
            .map_or(false, |options| options.map_entry())
    }

    /// The name of the generated Toit class, qualified with `alias` if it is not empty.
    ///
    /// Toit classes cannot be nested, so nested types join the names of their parents
    /// with underscores.
    pub fn class_name(&self, alias: &str) -> String {
        let mut name = self.parents.join("_");
        if !name.is_empty() {
            name.push('_');
        }
        name.push_str(self.name());

        if alias.is_empty() {
            name
        } else {
            format!("{}.{}", alias, name)
        }
    }
}

/// All messages and enums of a request, keyed by their fully-qualified name.
///
/// Names are stored in the form used by [`FieldDescriptorProto::type_name`](prost_types::FieldDescriptorProto::type_name),
/// with a leading dot.
#[derive(Debug, Default)]
pub(crate) struct TypeRegistry<'a> {
    types: HashMap<String, TypeEntry<'a>>,
}

impl<'a> TypeRegistry<'a> {
    pub fn new(files: &'a [FileDescriptorProto]) -> Self {
        let mut registry = TypeRegistry::default();
        for file in files {
            let scope = package_scope(file);
            registry.add_enums(file, &scope, &[], &file.enum_type);
            registry.add_messages(file, &scope, &[], &file.message_type);
        }
        debug!(types = registry.types.len(), "built type registry");
        registry
    }

    pub fn get(&self, full_name: &str) -> Option<&TypeEntry<'a>> {
        self.types.get(full_name)
    }

    fn add_enums(
        &mut self,
        file: &'a FileDescriptorProto,
        scope: &str,
        parents: &[String],
        enums: &'a [EnumDescriptorProto],
    ) {
        for enu in enums {
            let full_name = format!("{}.{}", scope, enu.name());
            self.types.insert(
                full_name.clone(),
                TypeEntry {
                    kind: TypeKind::Enum(enu),
                    file,
                    parents: parents.to_vec(),
                    full_name,
                },
            );
        }
    }

    fn add_messages(
        &mut self,
        file: &'a FileDescriptorProto,
        scope: &str,
        parents: &[String],
        messages: &'a [DescriptorProto],
    ) {
        for message in messages {
            let full_name = format!("{}.{}", scope, message.name());

            let mut nested_parents = parents.to_vec();
            nested_parents.push(message.name().to_owned());
            self.add_enums(file, &full_name, &nested_parents, &message.enum_type);
            self.add_messages(file, &full_name, &nested_parents, &message.nested_type);

            self.types.insert(
                full_name.clone(),
                TypeEntry {
                    kind: TypeKind::Message(message),
                    file,
                    parents: parents.to_vec(),
                    full_name,
                },
            );
        }
    }
}

/// The prefix of fully-qualified names declared at the top level of `file`.
pub(crate) fn package_scope(file: &FileDescriptorProto) -> String {
    match file.package() {
        "" => String::new(),
        package => format!(".{}", package),
    }
}

#[cfg(test)]
mod tests {
    use prost_types::MessageOptions;

    use super::*;

    fn message(name: &str, nested: Vec<DescriptorProto>, enums: Vec<EnumDescriptorProto>) -> DescriptorProto {
        DescriptorProto {
            name: Some(name.to_owned()),
            nested_type: nested,
            enum_type: enums,
            ..Default::default()
        }
    }

    fn enumeration(name: &str) -> EnumDescriptorProto {
        EnumDescriptorProto {
            name: Some(name.to_owned()),
            ..Default::default()
        }
    }

    fn files() -> Vec<FileDescriptorProto> {
        vec![
            FileDescriptorProto {
                name: Some("a.proto".to_owned()),
                package: Some("pkg.sub".to_owned()),
                message_type: vec![message(
                    "Outer",
                    vec![message(
                        "Middle",
                        vec![message("Inner", vec![], vec![])],
                        vec![enumeration("Kind")],
                    )],
                    vec![],
                )],
                enum_type: vec![enumeration("Color")],
                ..Default::default()
            },
            FileDescriptorProto {
                name: Some("b.proto".to_owned()),
                message_type: vec![DescriptorProto {
                    name: Some("Entry".to_owned()),
                    options: Some(MessageOptions {
                        map_entry: Some(true),
                        ..Default::default()
                    }),
                    ..Default::default()
                }],
                ..Default::default()
            },
        ]
    }

    #[test]
    fn nested_names() {
        let files = files();
        let registry = TypeRegistry::new(&files);

        let inner = registry.get(".pkg.sub.Outer.Middle.Inner").unwrap();
        assert_eq!(inner.name(), "Inner");
        assert_eq!(inner.parents, vec!["Outer".to_owned(), "Middle".to_owned()]);
        assert_eq!(inner.file.name(), "a.proto");
        assert_eq!(inner.class_name(""), "Outer_Middle_Inner");
        assert_eq!(inner.class_name("_a"), "_a.Outer_Middle_Inner");

        let kind = registry.get(".pkg.sub.Outer.Middle.Kind").unwrap();
        assert!(matches!(kind.kind, TypeKind::Enum(_)));
        assert_eq!(kind.class_name(""), "Outer_Middle_Kind");

        let color = registry.get(".pkg.sub.Color").unwrap();
        assert!(color.parents.is_empty());
        assert_eq!(color.class_name(""), "Color");
    }

    #[test]
    fn files_without_package() {
        let files = files();
        let registry = TypeRegistry::new(&files);

        let entry = registry.get(".Entry").unwrap();
        assert_eq!(entry.full_name, ".Entry");
        assert!(entry.is_map_entry());
        assert!(!registry.get(".pkg.sub.Outer").unwrap().is_map_entry());
    }

    #[test]
    fn missing_types() {
        let files = files();
        let registry = TypeRegistry::new(&files);

        assert!(registry.get(".pkg.sub.Inner").is_none());
        assert!(registry.get("pkg.sub.Outer").is_none());
    }
}
