use crate::runtime_config::ValidationConfig;
use crate::validator::{RequestValidator, ValidationOutcome, ValidationRequest};
use anyhow::{anyhow, Context};
use clap::{Parser, Subcommand};
use std::io::Write;
use std::path::{Path, PathBuf};

/// Command-line interface for zen-validation
#[derive(Parser, Debug)]
#[command(name = "zen-spec")]
#[command(about = "Inspect OpenAPI documents and validate requests against them", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Parse and compile a document, then list its operations
    Check {
        /// Path to the OpenAPI document (YAML or JSON)
        #[arg(short, long, env = "ZEN_SPEC_PATH")]
        spec: PathBuf,
    },
    /// Validate one request
    Validate {
        #[arg(short, long, env = "ZEN_SPEC_PATH")]
        spec: PathBuf,

        #[arg(short, long, default_value = "GET")]
        method: String,

        /// Request target, including any query string
        #[arg(short, long)]
        path: String,

        /// `Name: value`, repeatable
        #[arg(short = 'H', long = "header", value_parser = parse_header)]
        headers: Vec<(String, String)>,

        /// File holding the request body
        #[arg(short, long)]
        body: Option<PathBuf>,

        #[arg(long)]
        request_id: Option<String>,
    },
    /// Print a body with the operation's sensitive fields redacted
    Redact {
        #[arg(short, long, env = "ZEN_SPEC_PATH")]
        spec: PathBuf,

        #[arg(short, long)]
        operation: String,

        #[arg(short, long)]
        body: PathBuf,

        /// Apply the response rules instead of the request rules
        #[arg(long, default_value_t = false)]
        response: bool,
    },
}

/// Result of a command, mapped to the process exit status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Valid,
    Invalid,
    NoMatch,
}

impl Verdict {
    pub fn exit_code(self) -> u8 {
        match self {
            Verdict::Valid => 0,
            Verdict::Invalid => 1,
            Verdict::NoMatch => 2,
        }
    }
}

fn parse_header(raw: &str) -> Result<(String, String), String> {
    let (name, value) = raw
        .split_once(':')
        .ok_or_else(|| format!("expected 'Name: value', got '{raw}'"))?;
    let name = name.trim();
    if name.is_empty() {
        return Err(format!("header name is empty in '{raw}'"));
    }
    Ok((name.to_string(), value.trim().to_string()))
}

fn read_file(path: &Path) -> anyhow::Result<Vec<u8>> {
    std::fs::read(path).with_context(|| format!("Failed to read {}", path.display()))
}

/// Run a parsed command, writing its report to `out`.
pub fn execute(cli: &Cli, out: &mut impl Write) -> anyhow::Result<Verdict> {
    let config = ValidationConfig::from_env();
    match &cli.command {
        Commands::Check { spec } => {
            let validator = RequestValidator::from_file(spec, config)?;
            let api = validator.spec();
            writeln!(out, "fingerprint: {}", api.fingerprint)?;
            writeln!(out, "operations: {}", api.operations.len())?;
            for op in &api.operations {
                let body = match (&op.request_schema, op.request_body_required) {
                    (Some(_), true) => " body(required)",
                    (Some(_), false) => " body",
                    (None, _) => "",
                };
                writeln!(
                    out,
                    "  {} {} -> {} params={} security={}{body}",
                    op.method,
                    op.path_pattern,
                    op.operation_id,
                    op.parameters.len(),
                    op.security.len(),
                )?;
            }
            Ok(Verdict::Valid)
        }
        Commands::Validate {
            spec,
            method,
            path,
            headers,
            body,
            request_id,
        } => {
            let validator = RequestValidator::from_file(spec, config)?;
            let mut request = ValidationRequest::new(method.as_str(), path).with_headers(headers.clone());
            if let Some(body) = body {
                request = request.with_body(read_file(body)?);
            }
            if let Some(id) = request_id {
                request = request.with_request_id(id.as_str());
            }
            match validator.validate(&mut request) {
                ValidationOutcome::Valid(route) => {
                    writeln!(out, "valid: {}", route.operation_id())?;
                    for (name, value) in route.path_params.iter() {
                        writeln!(out, "  {name} = {value}")?;
                    }
                    Ok(Verdict::Valid)
                }
                ValidationOutcome::NoMatch => {
                    writeln!(out, "no operation matches {method} {path}")?;
                    Ok(Verdict::NoMatch)
                }
                ValidationOutcome::Invalid { problem, .. } => {
                    writeln!(out, "{}", serde_json::to_string_pretty(&problem)?)?;
                    Ok(Verdict::Invalid)
                }
            }
        }
        Commands::Redact {
            spec,
            operation,
            body,
            response,
        } => {
            let validator = RequestValidator::from_file(spec, config)?;
            let rules = validator
                .redaction()
                .get(operation)
                .ok_or_else(|| anyhow!("Unknown operation '{operation}'"))?;
            let bytes = read_file(body)?;
            let redacted = if *response {
                rules.redact_response(&bytes)
            } else {
                rules.redact_request(&bytes)
            };
            writeln!(out, "{redacted}")?;
            Ok(Verdict::Valid)
        }
    }
}

/// Parse process arguments and run the command against stdout.
pub fn run_cli() -> anyhow::Result<Verdict> {
    let cli = Cli::parse();
    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    execute(&cli, &mut out)
}
