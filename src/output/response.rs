//! CLI response formatting and output.
//!
//! Provides the JSON envelope, the plain-text failure diagnostic, and exit code mapping.

use rebrand::error::Hint;
use rebrand::{Error, ErrorCode, Result};
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct CliResponse<T: Serialize> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<CliError>,
}

#[derive(Debug, Serialize)]
pub struct CliError {
    pub code: String,
    pub message: String,
    pub details: serde_json::Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hints: Option<Vec<Hint>>,
}

impl<T: Serialize> CliResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(|e| {
            Error::internal_unexpected(format!("serialize response: {}", e))
        })
    }
}

impl CliResponse<()> {
    pub fn from_error(err: &Error) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(CliError {
                code: err.code.as_str().to_string(),
                message: err.message.clone(),
                details: err.details.clone(),
                hints: if err.hints.is_empty() {
                    None
                } else {
                    Some(err.hints.clone())
                },
            }),
        }
    }
}

fn print_response<T: Serialize>(response: &CliResponse<T>) -> Result<()> {
    use std::io::{self, Write};

    let payload = response.to_json()?;
    let stdout = io::stdout();
    let mut handle = stdout.lock();
    if let Err(e) = writeln!(handle, "{}", payload) {
        if e.kind() == io::ErrorKind::BrokenPipe {
            return Ok(()); // Exit gracefully on SIGPIPE
        }
        return Err(Error::internal_io(
            e.to_string(),
            Some("write stdout".to_string()),
        ));
    }
    Ok(())
}

pub fn print_success<T: Serialize>(data: T) -> Result<()> {
    print_response(&CliResponse::success(data))
}

pub fn print_error_json(err: &Error) -> Result<()> {
    print_response(&CliResponse::<()>::from_error(err))
}

/// Human-readable failure diagnostic for stderr.
pub fn format_failure(err: &Error) -> String {
    let mut out = format!("[FAIL] {}", err.message);

    let has_details = err
        .details
        .as_object()
        .map(|obj| !obj.is_empty())
        .unwrap_or(!err.details.is_null());
    if has_details && !err.code.is_postcondition() {
        if let Ok(details) = serde_json::to_string(&err.details) {
            out.push_str(&format!("\n  details: {}", details));
        }
    }

    for hint in &err.hints {
        out.push_str(&format!("\n  hint: {}", hint.message));
    }
    out
}

pub fn exit_code_for_error(code: ErrorCode) -> i32 {
    match code {
        ErrorCode::ConfigInvalidJson | ErrorCode::ValidationInvalidArgument => 2,

        ErrorCode::PostconditionMissingMarker
        | ErrorCode::PostconditionForbiddenMarker
        | ErrorCode::PostconditionResidueFound => 3,

        ErrorCode::PreconditionMissingPath => 4,

        ErrorCode::InternalIoError | ErrorCode::InternalUnexpected => 1,
    }
}
