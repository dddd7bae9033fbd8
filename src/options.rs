use std::collections::BTreeMap;

use crate::{
    error::{Error, ErrorKind},
    imports::ImportResolver,
};

const CONSTRUCTOR_INITIALIZERS: &str = "constructor_initializers";
const IMPORT_LIBRARY: &str = "import_library";
const CONVERT_HOOKS: &str = "convert_hooks";
const CORE_OBJECTS: &str = "core_objects";

/// Options controlling the generated code.
///
/// These are usually parsed from the parameter string passed by `protoc`, for example
/// `--toit_out=core_objects=false;import_library=vendor/=lib.vendor:out`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Options {
    pub(crate) constructor_initializers: bool,
    pub(crate) convert_hooks: bool,
    pub(crate) core_objects: bool,
    pub(crate) import_libraries: BTreeMap<String, String>,
}

impl Default for Options {
    fn default() -> Self {
        Options {
            constructor_initializers: false,
            convert_hooks: false,
            core_objects: true,
            import_libraries: BTreeMap::new(),
        }
    }
}

impl Options {
    /// Parses a parameter string of `;` separated `key=value` pairs.
    ///
    /// Unknown keys are ignored.
    ///
    /// # Errors
    ///
    /// Returns an error if a boolean parameter has a value that is not a boolean.
    pub fn parse(parameter: &str) -> Result<Self, Error> {
        let params = parse_map(parameter, ';', '=');
        let mut options = Options::default();

        if let Some(value) = params.get(CONSTRUCTOR_INITIALIZERS) {
            options.constructor_initializers = parse_bool(CONSTRUCTOR_INITIALIZERS, value)?;
        }
        if let Some(value) = params.get(CONVERT_HOOKS) {
            options.convert_hooks = parse_bool(CONVERT_HOOKS, value)?;
        }
        if let Some(value) = params.get(CORE_OBJECTS) {
            options.core_objects = parse_bool(CORE_OBJECTS, value)?;
        }
        if let Some(value) = params.get(IMPORT_LIBRARY) {
            options.import_libraries = parse_map(value, ',', '=');
        }

        Ok(options)
    }

    /// Set whether the default constructor accepts optional named initializers for every field.
    pub fn constructor_initializers(&mut self, yes: bool) -> &mut Self {
        self.constructor_initializers = yes;
        self
    }

    /// Set whether per-field hooks customizing how values are read and written are generated.
    pub fn convert_hooks(&mut self, yes: bool) -> &mut Self {
        self.convert_hooks = yes;
        self
    }

    /// Set whether `google.protobuf.Duration` and `google.protobuf.Timestamp` fields are
    /// represented by the Toit core `Duration` and `Time` classes.
    ///
    /// Enabled by default.
    pub fn core_objects(&mut self, yes: bool) -> &mut Self {
        self.core_objects = yes;
        self
    }

    /// Import files whose name starts with `prefix` from the Toit library `library`.
    pub fn import_library(&mut self, prefix: impl Into<String>, library: impl Into<String>) -> &mut Self {
        self.import_libraries.insert(prefix.into(), library.into());
        self
    }

    pub(crate) fn import_resolver(&self) -> ImportResolver {
        ImportResolver::new(self.import_libraries.clone())
    }
}

fn parse_map(input: &str, group_separator: char, key_value_separator: char) -> BTreeMap<String, String> {
    input
        .split(group_separator)
        .filter_map(|group| group.split_once(key_value_separator))
        .map(|(key, value)| (key.to_owned(), value.to_owned()))
        .collect()
}

fn parse_bool(name: &str, value: &str) -> Result<bool, Error> {
    match value {
        "1" | "t" | "T" | "TRUE" | "true" | "True" => Ok(true),
        "0" | "f" | "F" | "FALSE" | "false" | "False" => Ok(false),
        _ => Err(Error::from_kind(ErrorKind::MalformedParameter {
            name: name.to_owned(),
            value: value.to_owned(),
        })),
    }
}
