use std::{
    fs,
    io::{self, Read, Write},
    path::PathBuf,
};

use clap::Parser;
use miette::{IntoDiagnostic, Result, WrapErr};
use protoc_gen_toit::prost::Message;
use protoc_gen_toit::prost_types::compiler::CodeGeneratorRequest;
use tracing_subscriber::EnvFilter;

const LOG_ENV: &str = "PROTOC_GEN_TOIT_LOG";

/// Generates Toit code from protobuf files. Normally invoked by protoc.
#[derive(Debug, Parser)]
pub struct Args {
    /// Read the encoded CodeGeneratorRequest from a file instead of stdin.
    #[clap(long, value_name = "PATH", value_parser)]
    request: Option<PathBuf>,
    /// Override the parameter string of the request, for example 'core_objects=false'.
    #[clap(long, value_name = "PARAMS")]
    parameter: Option<String>,
}

pub fn main() -> Result<()> {
    miette::set_panic_hook();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();

    let args = Args::parse();

    let bytes = match &args.request {
        Some(path) => fs::read(path)
            .into_diagnostic()
            .wrap_err_with(|| format!("failed to read request from '{}'", path.display()))?,
        None => {
            let mut bytes = Vec::new();
            io::stdin()
                .read_to_end(&mut bytes)
                .into_diagnostic()
                .wrap_err("failed to read request from stdin")?;
            bytes
        }
    };

    let mut request = CodeGeneratorRequest::decode(bytes.as_slice())
        .into_diagnostic()
        .wrap_err("failed to decode CodeGeneratorRequest")?;
    if let Some(parameter) = args.parameter {
        request.parameter = Some(parameter);
    }

    let response = protoc_gen_toit::run(&request);
    if let Some(err) = &response.error {
        tracing::error!(%err, "code generation failed");
    }

    io::stdout()
        .lock()
        .write_all(&response.encode_to_vec())
        .into_diagnostic()
        .wrap_err("failed to write CodeGeneratorResponse")?;
    Ok(())
}
