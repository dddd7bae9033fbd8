//! Conversions between protobuf file names and Toit module paths.

use crate::case::to_snake_case;

const PROTO_EXTENSION: &str = ".proto";
const TOIT_EXTENSION: &str = ".toit";
const GENERATED_SUFFIX: &str = "_pb.toit";

/// Returns the name of the Toit file generated for the protobuf file `name`.
///
/// `foo/bar.proto` becomes `foo/bar_pb.toit`. Names without a `.proto` extension are
/// returned unchanged.
pub fn output_file_name(name: &str) -> String {
    match name.strip_suffix(PROTO_EXTENSION) {
        Some(stem) => format!("{}{}", stem, GENERATED_SUFFIX),
        None => name.to_owned(),
    }
}

/// Returns the alias a generated file uses when importing the file `name`.
pub fn import_alias(name: &str) -> String {
    let base = match name.rfind('/') {
        Some(idx) => &name[idx + 1..],
        None => name,
    };
    let stem = match base.rfind('.') {
        Some(idx) => &base[..idx],
        None => base,
    };
    to_snake_case(&format!("_{}", stem))
}

/// Returns the Toit import path of `to`, relative to the file `from`.
///
/// Both are slash separated paths relative to the root of the generated tree.
pub fn relative_import(from: &str, to: &str) -> String {
    let depth = from.matches('/').count();
    module_path(&format!("{}{}", "../".repeat(depth), to))
}

/// Converts a slash separated file path into Toit module syntax.
///
/// Relative paths start with a `.`, and every leading `..` segment adds another `.`.
pub fn module_path(path: &str) -> String {
    let cleaned = clean(path);
    let path = match cleaned.strip_prefix('/') {
        Some(absolute) => absolute.to_owned(),
        None => format!(".{}", cleaned.replace("../", ".")),
    };
    let path = path.strip_suffix(TOIT_EXTENSION).unwrap_or(&path);
    path.replace('/', ".")
}

fn clean(path: &str) -> String {
    let absolute = path.starts_with('/');
    let mut segments: Vec<&str> = Vec::new();
    for segment in path.split('/') {
        match segment {
            "" | "." => {}
            ".." => match segments.last() {
                Some(&last) if last != ".." => {
                    segments.pop();
                }
                _ if absolute => {}
                _ => segments.push(".."),
            },
            _ => segments.push(segment),
        }
    }

    let joined = segments.join("/");
    if absolute {
        format!("/{}", joined)
    } else if joined.is_empty() {
        ".".to_owned()
    } else {
        joined
    }
}
