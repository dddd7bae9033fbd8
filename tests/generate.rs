use proptest::prelude::*;
use protoc_gen_toit::{
    generate, run,
    prost_types::{
        compiler::CodeGeneratorRequest,
        field_descriptor_proto::{Label, Type},
        DescriptorProto, FieldDescriptorProto, FileDescriptorProto, OneofDescriptorProto,
    },
};

const SCALARS: &[Type] = &[
    Type::Double,
    Type::Float,
    Type::Int64,
    Type::Uint64,
    Type::Int32,
    Type::Fixed64,
    Type::Fixed32,
    Type::Bool,
    Type::String,
    Type::Bytes,
    Type::Uint32,
    Type::Sfixed32,
    Type::Sfixed64,
    Type::Sint32,
    Type::Sint64,
];

#[derive(Debug, Clone)]
struct FieldSpec {
    ty: Type,
    repeated: bool,
    in_oneof: bool,
}

fn field_spec() -> impl Strategy<Value = FieldSpec> {
    (prop::sample::select(SCALARS), any::<bool>(), any::<bool>()).prop_map(
        |(ty, repeated, in_oneof)| FieldSpec {
            ty,
            // Oneof members cannot be repeated.
            repeated: repeated && !in_oneof,
            in_oneof,
        },
    )
}

fn request(files: Vec<FileDescriptorProto>, parameter: Option<&str>) -> CodeGeneratorRequest {
    CodeGeneratorRequest {
        file_to_generate: vec![files[files.len() - 1].name().to_owned()],
        parameter: parameter.map(ToOwned::to_owned),
        proto_file: files,
        ..Default::default()
    }
}

fn message_file(specs: &[FieldSpec]) -> FileDescriptorProto {
    let field = specs
        .iter()
        .enumerate()
        .map(|(index, spec)| FieldDescriptorProto {
            name: Some(format!("f{}", index)),
            number: Some(index as i32 + 1),
            label: Some(if spec.repeated {
                Label::Repeated as i32
            } else {
                Label::Optional as i32
            }),
            r#type: Some(spec.ty as i32),
            oneof_index: if spec.in_oneof { Some(0) } else { None },
            ..Default::default()
        })
        .collect();
    let oneof_decl = if specs.iter().any(|spec| spec.in_oneof) {
        vec![OneofDescriptorProto {
            name: Some("choice".to_owned()),
            ..Default::default()
        }]
    } else {
        vec![]
    };

    FileDescriptorProto {
        name: Some("msg.proto".to_owned()),
        message_type: vec![DescriptorProto {
            name: Some("Msg".to_owned()),
            field,
            oneof_decl,
            ..Default::default()
        }],
        ..Default::default()
    }
}

/// Returns the terms of the expression returned by the method `name`, one per line.
fn returned_terms<'a>(content: &'a str, name: &str) -> Vec<&'a str> {
    let header = format!("  {} -> int:\n", name);
    let start = content.find(&header).unwrap() + header.len();
    let body = &content[start..];
    let end = body.find("\n\n").unwrap();
    body[..end]
        .lines()
        .map(|line| {
            let line = line.trim();
            line.strip_prefix("return ")
                .or_else(|| line.strip_prefix("+ "))
                .unwrap()
        })
        .collect()
}

proptest! {
    #[test]
    fn presence_count_agrees_with_size(specs in prop::collection::vec(field_spec(), 1..8)) {
        let response = generate(&request(vec![message_file(&specs)], None)).unwrap();
        let content = response.file[0].content();

        let counted = returned_terms(content, "num_fields_set");
        let sized = returned_terms(content, "protobuf_size");

        let has_oneof = specs.iter().any(|spec| spec.in_oneof);
        let plain = specs.iter().filter(|spec| !spec.in_oneof).count();
        prop_assert_eq!(counted.len(), plain + usize::from(has_oneof));
        prop_assert_eq!(sized.len(), specs.len());

        if has_oneof {
            prop_assert_eq!(counted[0], "(choice_oneof_case_ == null ? 0 : 1)");
        }

        for (index, spec) in specs.iter().enumerate() {
            let term = sized[index];
            let as_field = format!("--as_field={}", index + 1);
            prop_assert!(term.contains(&as_field), "{}", term);

            if spec.in_oneof {
                let guard = format!("(choice_oneof_case_ == CHOICE_F{} ?", index);
                prop_assert!(term.starts_with(&guard), "{}", term);
                prop_assert!(term.ends_with("--oneof) : 0)"), "{}", term);
            } else {
                let name = format!("f{}", index);
                prop_assert!(!term.contains("--oneof"), "{}", term);
                prop_assert!(
                    counted.iter().any(|term| term.starts_with(&format!("({} ", name))
                        || term.starts_with(&format!("({}.", name))),
                    "no presence term for {}", name
                );
            }
        }
    }

    #[test]
    fn generation_is_deterministic(specs in prop::collection::vec(field_spec(), 0..8)) {
        let request = request(vec![message_file(&specs)], Some("constructor_initializers=true"));
        prop_assert_eq!(generate(&request).unwrap(), generate(&request).unwrap());
    }
}

#[test]
fn parameters_are_applied() {
    let mut file = message_file(&[FieldSpec {
        ty: Type::Int32,
        repeated: false,
        in_oneof: false,
    }]);
    file.dependency.push("a/b/c.proto".to_owned());
    let dependency = FileDescriptorProto {
        name: Some("a/b/c.proto".to_owned()),
        ..Default::default()
    };

    let response = generate(&request(
        vec![dependency, file],
        Some("convert_hooks=true;import_library=a/=X,a/b/=Y;unknown=1"),
    ))
    .unwrap();
    let content = response.file[0].content();

    assert!(content.contains("import Y.c_pb as _c\n"), "{}", content);
    assert!(content.contains("static deserialize_into r/_protobuf.Reader obj/Msg -> Msg:"));
}

#[test]
fn malformed_parameter() {
    let err = generate(&request(vec![message_file(&[])], Some("core_objects=maybe"))).unwrap_err();
    assert!(err.is_parameter());
    insta::assert_snapshot!(err.to_string(), @"invalid value 'maybe' for parameter 'core_objects'");
}

#[test]
fn errors_are_reported_in_response() {
    let file = FileDescriptorProto {
        name: Some("msg.proto".to_owned()),
        message_type: vec![DescriptorProto {
            name: Some("Msg".to_owned()),
            field: vec![FieldDescriptorProto {
                name: Some("missing".to_owned()),
                number: Some(1),
                label: Some(Label::Optional as i32),
                r#type: Some(Type::Message as i32),
                type_name: Some(".Missing".to_owned()),
                ..Default::default()
            }],
            ..Default::default()
        }],
        ..Default::default()
    };

    let response = run(&request(vec![file], None));
    assert!(response.file.is_empty());
    insta::assert_snapshot!(response.error(), @"type '.Missing' referenced by field '.Msg.missing' is not defined");
}

#[test]
fn successful_run_has_no_error() {
    let response = run(&request(vec![message_file(&[])], None));
    assert_eq!(response.error, None);
    assert_eq!(response.file.len(), 1);
    assert_eq!(response.file[0].name(), "msg_pb.toit");
}
