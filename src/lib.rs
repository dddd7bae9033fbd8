//! A `protoc` plugin generating [Toit](https://toitlang.org) code for protobuf files.
//!
//! For every requested `.proto` file a `_pb.toit` module is generated, containing a class per
//! message with methods to serialize, deserialize and size it using the Toit
//! `encoding.protobuf` library. Enum values become module level constants.
//!
//! The plugin is usually invoked by `protoc`:
//!
//! ```text
//! protoc --plugin=protoc-gen-toit --toit_out=core_objects=false:out/ root.proto
//! ```
//!
//! # Examples
//!
//! The generator can also be used as a library, with descriptors built by any other means:
//!
//! ```
//! use protoc_gen_toit::prost_types::{
//!     compiler::CodeGeneratorRequest,
//!     field_descriptor_proto::{Label, Type},
//!     DescriptorProto, FieldDescriptorProto, FileDescriptorProto,
//! };
//!
//! let request = CodeGeneratorRequest {
//!     file_to_generate: vec!["root.proto".to_owned()],
//!     parameter: Some("constructor_initializers=true".to_owned()),
//!     proto_file: vec![FileDescriptorProto {
//!         name: Some("root.proto".to_owned()),
//!         message_type: vec![DescriptorProto {
//!             name: Some("Foo".to_owned()),
//!             field: vec![FieldDescriptorProto {
//!                 name: Some("bar".to_owned()),
//!                 number: Some(1),
//!                 label: Some(Label::Optional as i32),
//!                 r#type: Some(Type::Int32 as i32),
//!                 ..Default::default()
//!             }],
//!             ..Default::default()
//!         }],
//!         ..Default::default()
//!     }],
//!     ..Default::default()
//! };
//!
//! let response = protoc_gen_toit::generate(&request).unwrap();
//! assert_eq!(response.file[0].name(), "root_pb.toit");
//! assert!(response.file[0].content().contains("class Foo extends _protobuf.Message:"));
//! ```
//!
//! ### Error messages
//!
//! Errors implement [`miette::Diagnostic`], and most include a hint on how to fix them:
//!
//! ```text
//! Error:
//!   × type '.pkg.Bar' is declared in 'bar.proto', which is not imported by 'root.proto'
//!   help: add `import "bar.proto";` to 'root.proto'
//! ```
#![warn(missing_debug_implementations, missing_docs)]
#![deny(unsafe_code)]
#![doc(html_root_url = "https://docs.rs/protoc-gen-toit/0.1.0/")]

mod case;
mod error;
mod field;
mod generate;
mod imports;
mod names;
mod options;
mod path;
mod types;
mod writer;

use prost_types::compiler::{CodeGeneratorRequest, CodeGeneratorResponse};

pub use {prost, prost_types};

pub use self::error::Error;
pub use self::options::Options;

use self::generate::Generator;

/// Generates Toit code for a request, using the options given by its parameter string.
///
/// # Errors
///
/// Returns an error if the parameter string is malformed, or if any of the requested files
/// cannot be generated. No files are returned in that case.
pub fn generate(request: &CodeGeneratorRequest) -> Result<CodeGeneratorResponse, Error> {
    let options = Options::parse(request.parameter())?;
    generate_with_options(request, &options)
}

/// Generates Toit code for a request, ignoring its parameter string.
///
/// # Errors
///
/// Returns an error if any of the requested files cannot be generated.
pub fn generate_with_options(
    request: &CodeGeneratorRequest,
    options: &Options,
) -> Result<CodeGeneratorResponse, Error> {
    let generator = Generator::new(&request.proto_file, options);
    generator.generate(request)
}

/// Generates Toit code for a request, reporting failures in the `error` field of the response
/// as expected by `protoc`.
pub fn run(request: &CodeGeneratorRequest) -> CodeGeneratorResponse {
    match generate(request) {
        Ok(response) => response,
        Err(err) => CodeGeneratorResponse {
            error: Some(err.to_string()),
            ..Default::default()
        },
    }
}
