use std::collections::BTreeMap;

use tracing::debug;

use crate::path::{module_path, output_file_name, relative_import};

/// The import prefix of the protobuf well-known types.
pub const WELL_KNOWN_TYPES_PREFIX: &str = "google/protobuf/";
/// The Toit library providing the generated well-known types.
pub const WELL_KNOWN_TYPES_LIBRARY: &str = "protogen.google.protobuf";

/// Maps imported protobuf files to Toit import paths.
///
/// Files matching one of the configured prefixes are imported from a library, all other
/// files are assumed to be generated into the same tree as the importing file.
#[derive(Debug, Clone)]
pub struct ImportResolver {
    libraries: BTreeMap<String, String>,
}

impl ImportResolver {
    /// Creates a resolver using the given prefix to library mappings, in addition to the
    /// built-in mapping for the well-known types.
    pub fn new<I, K, V>(libraries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut map = BTreeMap::new();
        map.insert(
            WELL_KNOWN_TYPES_PREFIX.to_owned(),
            WELL_KNOWN_TYPES_LIBRARY.to_owned(),
        );
        map.extend(
            libraries
                .into_iter()
                .map(|(prefix, library)| (prefix.into(), library.into())),
        );
        ImportResolver { libraries: map }
    }

    /// Returns the Toit import path used by `source_file` to import `import_file`.
    pub fn resolve(&self, source_file: &str, import_file: &str) -> String {
        match self.library_for(import_file) {
            Some((prefix, library)) => {
                let remainder = output_file_name(&import_file[prefix.len()..]);
                let resolved = format!("{}{}", library, module_path(&remainder));
                debug!(import_file, prefix, %resolved, "resolved library import");
                resolved
            }
            None => relative_import(source_file, &output_file_name(import_file)),
        }
    }

    /// Finds the library whose prefix is the longest one matching `import_file`.
    fn library_for(&self, import_file: &str) -> Option<(&str, &str)> {
        // Of two prefixes of the same string, the longer one sorts last.
        self.libraries
            .iter()
            .rev()
            .find(|(prefix, _)| import_file.starts_with(prefix.as_str()))
            .map(|(prefix, library)| (prefix.as_str(), library.as_str()))
    }
}

impl Default for ImportResolver {
    fn default() -> Self {
        ImportResolver::new(Vec::<(String, String)>::new())
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    #[test]
    fn well_known_types() {
        let resolver = ImportResolver::default();
        assert_eq!(
            resolver.resolve("foo.proto", "google/protobuf/duration.proto"),
            "protogen.google.protobuf.duration_pb"
        );
    }

    #[test]
    fn relative_imports() {
        let resolver = ImportResolver::default();
        assert_eq!(resolver.resolve("foo.proto", "bar.proto"), ".bar_pb");
        assert_eq!(resolver.resolve("a/foo.proto", "a/bar.proto"), "..a.bar_pb");
        assert_eq!(
            resolver.resolve("a/b/foo.proto", "google/api/http.proto"),
            "...google.api.http_pb"
        );
    }

    #[test]
    fn user_library() {
        let resolver = ImportResolver::new([("vendor/", "lib.vendor")]);
        assert_eq!(
            resolver.resolve("a/foo.proto", "vendor/x/y.proto"),
            "lib.vendor.x.y_pb"
        );
    }

    #[test]
    fn override_well_known_types() {
        let resolver = ImportResolver::new([("google/protobuf/", "my.protobuf")]);
        assert_eq!(
            resolver.resolve("foo.proto", "google/protobuf/timestamp.proto"),
            "my.protobuf.timestamp_pb"
        );
    }

    #[test]
    fn longest_prefix_wins() {
        let resolver = ImportResolver::new([("a/", "X"), ("a/b/", "Y")]);
        assert_eq!(resolver.resolve("foo.proto", "a/b/c.proto"), "Y.c_pb");
        assert_eq!(resolver.resolve("foo.proto", "a/c.proto"), "X.c_pb");
        assert_eq!(resolver.resolve("foo.proto", "a/bc.proto"), "X.bc_pb");
    }

    proptest! {
        #[test]
        fn more_specific_rule_always_wins(
            general in "[a-z]{1,4}/",
            specific in "[a-z]{1,4}/",
            file in "[a-z]{1,4}",
        ) {
            let prefix = format!("{}{}", general, specific);
            let resolver = ImportResolver::new([(general.clone(), "general".to_owned()), (prefix.clone(), "specific".to_owned())]);
            let resolved = resolver.resolve("root.proto", &format!("{}{}.proto", prefix, file));
            prop_assert_eq!(resolved, format!("specific.{}_pb", file));
        }
    }
}
