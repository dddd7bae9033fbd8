use std::fmt;

use miette::Diagnostic;
use thiserror::Error;

use crate::writer::WriteError;

/// An error that can occur when generating Toit code.
#[derive(Diagnostic, Error)]
#[error(transparent)]
#[diagnostic(transparent)]
pub struct Error {
    kind: Box<ErrorKind>,
}

#[derive(Debug, Diagnostic, Error)]
pub(crate) enum ErrorKind {
    #[error("type '{name}' referenced by field '{field}' is not defined")]
    #[diagnostic(help(
        "make sure the file declaring '{name}' is part of the request passed to the plugin"
    ))]
    UnresolvedType { name: String, field: String },
    #[error("type '{name}' is declared in '{file}', which is not imported by '{source_file}'")]
    #[diagnostic(help("add `import \"{file}\";` to '{source_file}'"))]
    MissingImport {
        name: String,
        file: String,
        source_file: String,
    },
    #[error("name '{name}' is defined more than once in '{scope}'")]
    #[diagnostic(help("rename one of the fields or oneofs of '{scope}'"))]
    NameCollision { name: String, scope: String },
    #[error("field '{field}' has an unsupported kind: {kind}")]
    UnsupportedKind { field: String, kind: String },
    #[error("invalid value '{value}' for parameter '{name}'")]
    #[diagnostic(help("boolean parameters accept 'true' or 'false'"))]
    MalformedParameter { name: String, value: String },
    #[error("failed to write generated code for '{file}'")]
    Write {
        file: String,
        #[source]
        err: WriteError,
    },
}

impl Error {
    pub(crate) fn from_kind(kind: ErrorKind) -> Self {
        Error {
            kind: Box::new(kind),
        }
    }

    /// Attributes a code writer error to the file that was being generated.
    pub(crate) fn in_file(mut self, name: &str) -> Self {
        if let ErrorKind::Write { file, .. } = &mut *self.kind {
            if file.is_empty() {
                *file = name.to_owned();
            }
        }
        self
    }

    #[cfg(test)]
    pub(crate) fn kind(&self) -> &ErrorKind {
        &self.kind
    }

    /// Returns true if this error was caused by a field referencing a type missing from the request.
    pub fn is_unresolved_type(&self) -> bool {
        matches!(
            &*self.kind,
            ErrorKind::UnresolvedType { .. } | ErrorKind::MissingImport { .. }
        )
    }

    /// Returns true if two generated identifiers could not be made unique.
    pub fn is_name_collision(&self) -> bool {
        matches!(&*self.kind, ErrorKind::NameCollision { .. })
    }

    /// Returns true if a field uses a kind the generator cannot express.
    pub fn is_unsupported(&self) -> bool {
        matches!(&*self.kind, ErrorKind::UnsupportedKind { .. })
    }

    /// Returns true if the plugin parameter string could not be parsed.
    pub fn is_parameter(&self) -> bool {
        matches!(&*self.kind, ErrorKind::MalformedParameter { .. })
    }
}

impl From<WriteError> for Error {
    fn from(err: WriteError) -> Self {
        Error::from_kind(ErrorKind::Write {
            file: String::new(),
            err,
        })
    }
}

impl fmt::Debug for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &*self.kind {
            ErrorKind::Write { err, .. } => write!(f, "{}: {}", self, err),
            ErrorKind::UnresolvedType { .. }
            | ErrorKind::MissingImport { .. }
            | ErrorKind::NameCollision { .. }
            | ErrorKind::UnsupportedKind { .. }
            | ErrorKind::MalformedParameter { .. } => write!(f, "{}", self),
        }
    }
}
