//! Shared output formatting for sprintsync CLI commands.

use serde::Serialize;

use crate::error::Result;

pub const SCHEMA_VERSION: &str = "sprintsync.v1";

#[derive(Debug, Clone, Copy)]
pub struct OutputOptions {
    pub json: bool,
    pub quiet: bool,
}

/// Human-readable command output: a header, key/value summary lines, free
/// detail lines, and warnings.
#[derive(Debug, Clone, Default)]
pub struct HumanOutput {
    header: String,
    summary: Vec<(String, String)>,
    details: Vec<String>,
    warnings: Vec<String>,
}

impl HumanOutput {
    pub fn new(header: impl Into<String>) -> Self {
        Self {
            header: header.into(),
            ..Self::default()
        }
    }

    pub fn push_summary(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.summary.push((key.into(), value.into()));
    }

    pub fn push_detail(&mut self, value: impl Into<String>) {
        self.details.push(value.into());
    }

    pub fn push_warning(&mut self, value: impl Into<String>) {
        self.warnings.push(value.into());
    }
}

pub fn emit_success<T: Serialize>(
    options: OutputOptions,
    command: &str,
    data: &T,
    human: Option<&HumanOutput>,
) -> Result<()> {
    if options.json {
        #[derive(Serialize)]
        struct Envelope<'a, T: Serialize> {
            schema_version: &'static str,
            command: &'a str,
            status: &'static str,
            data: &'a T,
            #[serde(skip_serializing_if = "Vec::is_empty")]
            warnings: Vec<String>,
        }

        let payload = Envelope {
            schema_version: SCHEMA_VERSION,
            command,
            status: "success",
            data,
            warnings: human.map(|h| h.warnings.clone()).unwrap_or_default(),
        };
        println!("{}", serde_json::to_string_pretty(&payload)?);
        return Ok(());
    }

    if options.quiet {
        return Ok(());
    }

    if let Some(human) = human {
        println!("{}", format_human(human));
    }
    Ok(())
}

pub fn emit_error(command: &str, err: &crate::error::Error, json: bool) -> Result<()> {
    let hints = error_hints(err);
    if json {
        #[derive(Serialize)]
        struct ErrorBody {
            message: String,
            code: i32,
            #[serde(skip_serializing_if = "Vec::is_empty")]
            hints: Vec<String>,
        }

        #[derive(Serialize)]
        struct Envelope<'a> {
            schema_version: &'static str,
            command: &'a str,
            status: &'static str,
            error: ErrorBody,
        }

        let payload = Envelope {
            schema_version: SCHEMA_VERSION,
            command,
            status: "error",
            error: ErrorBody {
                message: err.to_string(),
                code: err.exit_code(),
                hints,
            },
        };
        println!("{}", serde_json::to_string_pretty(&payload)?);
        return Ok(());
    }

    eprintln!("error: {err}");
    for hint in hints {
        eprintln!("  hint: {hint}");
    }
    Ok(())
}

fn format_human(human: &HumanOutput) -> String {
    let mut lines = Vec::new();
    if !human.header.is_empty() {
        lines.push(human.header.clone());
    }
    for (key, value) in &human.summary {
        lines.push(format!("  {key}: {value}"));
    }
    for detail in &human.details {
        lines.push(detail.clone());
    }
    for warning in &human.warnings {
        lines.push(format!("warning: {warning}"));
    }
    lines.join("\n")
}

/// First positional argument, for labelling errors before clap parsing.
pub fn infer_command_name_from_args() -> String {
    let mut args = std::env::args().skip(1);
    let mut command = None;

    for arg in args.by_ref() {
        if arg.starts_with('-') {
            continue;
        }
        command = Some(arg);
        break;
    }

    let command = match command {
        Some(cmd) => cmd,
        None => return "sprintsync".to_string(),
    };

    if matches!(command.as_str(), "task" | "users" | "admin") {
        for arg in args {
            if arg.starts_with('-') {
                continue;
            }
            return format!("{command} {arg}");
        }
    }

    command
}

fn error_hints(err: &crate::error::Error) -> Vec<String> {
    use crate::error::Error;

    match err {
        Error::NotLoggedIn | Error::AuthRequired(_) => {
            vec!["sprintsync login --email <email> --password <password>".to_string()]
        }
        Error::InvalidConfig(_) => vec!["fix the sprintsync config file then retry".to_string()],
        _ => Vec::new(),
    }
}
