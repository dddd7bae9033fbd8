mod codec;
mod hooks;
mod message;
mod oneof;

use std::collections::{HashMap, HashSet};

use prost_types::{
    compiler::{code_generator_response::File, CodeGeneratorRequest, CodeGeneratorResponse},
    EnumDescriptorProto, FileDescriptorProto,
};
use tracing::debug;

use crate::{
    error::{Error, ErrorKind},
    field::{scalar_default, scalar_toit_type, Classifier, FieldClass, FieldType, Primitive, WellKnown},
    imports::ImportResolver,
    names::unique_name,
    options::Options,
    path::{import_alias, output_file_name},
    types::{package_scope, TypeEntry, TypeRegistry},
    writer::CodeWriter,
};

const PROTOBUF_MODULE: &str = "encoding.protobuf";
const PROTOBUF_ALIAS: &str = "_protobuf";
const CORE_MODULE: &str = "core";
const CORE_ALIAS: &str = "_core";

/// Generates Toit files for the files of a request.
pub(crate) struct Generator<'a> {
    registry: TypeRegistry<'a>,
    options: &'a Options,
    resolver: ImportResolver,
}

impl<'a> Generator<'a> {
    pub fn new(files: &'a [FileDescriptorProto], options: &'a Options) -> Self {
        Generator {
            registry: TypeRegistry::new(files),
            options,
            resolver: options.import_resolver(),
        }
    }

    /// Generates one file for every file listed in `file_to_generate`, in the order they appear
    /// in `proto_file`.
    pub fn generate(&'a self, request: &'a CodeGeneratorRequest) -> Result<CodeGeneratorResponse, Error> {
        let requested: HashSet<&str> = request
            .file_to_generate
            .iter()
            .map(String::as_str)
            .collect();

        let mut response = CodeGeneratorResponse::default();
        for file in &request.proto_file {
            if requested.contains(file.name()) {
                response.file.push(self.generate_file(file)?);
            }
        }
        Ok(response)
    }

    pub fn generate_file(&'a self, file: &'a FileDescriptorProto) -> Result<File, Error> {
        let name = output_file_name(file.name());
        debug!(file = file.name(), output = %name, "generating file");

        let mut generator = FileGenerator {
            file,
            options: self.options,
            classifier: Classifier::new(&self.registry),
            aliases: HashMap::new(),
            w: CodeWriter::new(),
        };
        generator
            .write_file(&self.resolver)
            .map_err(|err| err.in_file(file.name()))?;
        let content = generator
            .w
            .finish()
            .map_err(|err| Error::from(err).in_file(file.name()))?;

        Ok(File {
            name: Some(name),
            content: Some(content),
            ..Default::default()
        })
    }
}

/// The state of generating a single file.
struct FileGenerator<'a> {
    file: &'a FileDescriptorProto,
    options: &'a Options,
    classifier: Classifier<'a>,
    /// The alias of every imported file, keyed by protobuf file name.
    aliases: HashMap<&'a str, String>,
    w: CodeWriter,
}

impl<'a> FileGenerator<'a> {
    fn write_file(&mut self, resolver: &ImportResolver) -> Result<(), Error> {
        self.w
            .comment("Code generated by protoc-gen-toit. DO NOT EDIT.")?;
        self.w.comment(&format!("source: {}", self.file.name()))?;
        self.w.new_line();

        self.w.import_as(PROTOBUF_MODULE, PROTOBUF_ALIAS)?;
        self.w.import_as(CORE_MODULE, CORE_ALIAS)?;
        self.write_imports(resolver)?;
        self.w.new_line();

        let file = self.file;
        let scope = package_scope(file);
        for enu in &file.enum_type {
            self.write_enum(&scope, "", enu)?;
        }
        for message in &file.message_type {
            self.write_message(&scope, "", message)?;
        }
        Ok(())
    }

    fn write_imports(&mut self, resolver: &ImportResolver) -> Result<(), Error> {
        let file = self.file;
        self.aliases.insert(file.name(), String::new());

        let mut used: HashSet<String> = [PROTOBUF_ALIAS, CORE_ALIAS]
            .iter()
            .map(|&alias| alias.to_owned())
            .collect();
        for dependency in &file.dependency {
            let alias = unique_name(&import_alias(dependency), &used);
            used.insert(alias.clone());

            self.w
                .import_as(&resolver.resolve(file.name(), dependency), &alias)?;
            self.aliases.insert(dependency, alias);
        }
        Ok(())
    }

    /// Writes the values of an enum as module level constants.
    fn write_enum(
        &mut self,
        scope: &str,
        class_prefix: &str,
        enu: &EnumDescriptorProto,
    ) -> Result<(), Error> {
        let full_name = format!("{}.{}", scope, enu.name());
        let class_name = format!("{}{}", class_prefix, enu.name());
        let ty = format!("int/*enum<{}>*/", class_name);

        self.w.comment(&format!("ENUM START: {}", class_name))?;
        for value in &enu.value {
            self.w.constant(
                &format!("{}_{}", class_name, value.name()),
                &ty,
                &value.number().to_string(),
            )?;
        }
        self.w.comment(&format!("ENUM END: {}", full_name))?;
        self.w.new_line();
        Ok(())
    }

    /// The name of the class generated for `entry`, qualified with its import alias.
    fn class_name(&self, entry: &TypeEntry) -> Result<String, Error> {
        match self.aliases.get(entry.file.name()) {
            Some(alias) => Ok(entry.class_name(alias)),
            None => Err(Error::from_kind(ErrorKind::MissingImport {
                name: entry.full_name.clone(),
                file: entry.file.name().to_owned(),
                source_file: self.file.name().to_owned(),
            })),
        }
    }

    /// Returns the core library type used for a field, if any.
    fn well_known(&self, ty: &FieldType) -> Option<WellKnown> {
        match ty.class {
            FieldClass::Object(entry) if self.options.core_objects => {
                WellKnown::from_name(&entry.full_name)
            }
            _ => None,
        }
    }

    /// The Toit type annotation of a field, for example `List/*<int>*/`.
    fn annotation(&self, ty: &FieldType, optional: bool) -> Result<String, Error> {
        self.type_annotation(ty, optional, false)
    }

    fn type_annotation(&self, ty: &FieldType, optional: bool, in_comment: bool) -> Result<String, Error> {
        let opt = |name: &str| {
            if optional {
                format!("{}?", name)
            } else {
                name.to_owned()
            }
        };

        Ok(match &ty.class {
            FieldClass::Primitive(Primitive::Scalar(scalar)) => opt(scalar_toit_type(*scalar)),
            FieldClass::Primitive(Primitive::Enum(entry)) => {
                let actual = opt(&format!("enum<{}>", self.class_name(entry)?));
                if in_comment {
                    actual
                } else {
                    format!("{}/*{}*/", opt("int"), actual)
                }
            }
            FieldClass::Object(entry) => match self.well_known(ty) {
                Some(well_known) => opt(well_known.class_name()),
                None => opt(&self.class_name(entry)?),
            },
            FieldClass::List(element) => {
                let element = self.type_annotation(element, false, true)?;
                if in_comment {
                    opt(&format!("List<{}>", element))
                } else {
                    format!("{}/*<{}>*/", opt("List"), element)
                }
            }
            FieldClass::Map { key, value } => {
                let key = self.type_annotation(key, false, true)?;
                let value = self.type_annotation(value, false, true)?;
                if in_comment {
                    opt(&format!("Map<{},{}>", key, value))
                } else {
                    format!("{}/*<{},{}>*/", opt("Map"), key, value)
                }
            }
        })
    }

    /// The value a field holds when it is not set.
    fn default_value(&self, ty: &FieldType) -> Result<String, Error> {
        Ok(match &ty.class {
            FieldClass::Primitive(Primitive::Scalar(scalar)) => scalar_default(*scalar).to_owned(),
            FieldClass::Primitive(Primitive::Enum(_)) => "0".to_owned(),
            FieldClass::Object(entry) => match self.well_known(ty) {
                Some(well_known) => well_known.default_value().to_owned(),
                None => self.class_name(entry)?,
            },
            FieldClass::List(_) => "[]".to_owned(),
            FieldClass::Map { .. } => "{:}".to_owned(),
        })
    }

    /// An expression that is true if `value` holds the default value of the field.
    fn is_default(&self, ty: &FieldType, value: &str) -> Result<String, Error> {
        if let Some(well_known) = self.well_known(ty) {
            Ok(well_known.is_default(value))
        } else if ty.has_is_empty() {
            Ok(format!("{}.is_empty", value))
        } else {
            Ok(format!("{} == {}", value, self.default_value(ty)?))
        }
    }
}
