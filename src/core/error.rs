use serde::Serialize;
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    ConfigInvalidJson,

    ValidationInvalidArgument,

    PreconditionMissingPath,

    PostconditionMissingMarker,
    PostconditionForbiddenMarker,
    PostconditionResidueFound,

    InternalIoError,
    InternalUnexpected,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::ConfigInvalidJson => "config.invalid_json",

            ErrorCode::ValidationInvalidArgument => "validation.invalid_argument",

            ErrorCode::PreconditionMissingPath => "precondition.missing_path",

            ErrorCode::PostconditionMissingMarker => "postcondition.missing_marker",
            ErrorCode::PostconditionForbiddenMarker => "postcondition.forbidden_marker",
            ErrorCode::PostconditionResidueFound => "postcondition.residue_found",

            ErrorCode::InternalIoError => "internal.io_error",
            ErrorCode::InternalUnexpected => "internal.unexpected",
        }
    }

    /// Postcondition codes are raised by the validator after files were already rewritten.
    pub fn is_postcondition(&self) -> bool {
        matches!(
            self,
            ErrorCode::PostconditionMissingMarker
                | ErrorCode::PostconditionForbiddenMarker
                | ErrorCode::PostconditionResidueFound
        )
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Hint {
    pub message: String,
}

#[derive(Debug, Clone)]
pub struct Error {
    pub code: ErrorCode,
    pub message: String,
    pub details: Value,
    pub hints: Vec<Hint>,
}

pub type Result<T> = std::result::Result<T, Error>;

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for Error {}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigInvalidJsonDetails {
    pub path: String,
    pub error: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InvalidArgumentDetails {
    pub field: String,
    pub problem: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MissingPathDetails {
    pub path: String,
}

/// A single-file marker check that failed.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MarkerDetails {
    pub file: String,
    pub marker: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResidueDetails {
    pub markers: Vec<String>,
    pub files: Vec<String>,
    pub total_files: usize,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InternalIoErrorDetails {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
}

fn to_details<T: Serialize>(details: T) -> Value {
    serde_json::to_value(details).unwrap_or_else(|_| Value::Object(serde_json::Map::new()))
}

impl Error {
    pub fn new(code: ErrorCode, message: impl Into<String>, details: Value) -> Self {
        Self {
            code,
            message: message.into(),
            details,
            hints: Vec::new(),
        }
    }

    pub fn validation_invalid_argument(
        field: impl Into<String>,
        problem: impl Into<String>,
        value: Option<String>,
    ) -> Self {
        let field = field.into();
        let problem = problem.into();
        let message = format!("Invalid --{}: {}", field.replace('_', "-"), problem);

        Self::new(
            ErrorCode::ValidationInvalidArgument,
            message,
            to_details(InvalidArgumentDetails {
                field,
                problem,
                value,
            }),
        )
    }

    pub fn config_invalid_json(path: impl Into<String>, err: serde_json::Error) -> Self {
        let path = path.into();
        Self::new(
            ErrorCode::ConfigInvalidJson,
            format!("Invalid JSON in config file {}", path),
            to_details(ConfigInvalidJsonDetails {
                path,
                error: err.to_string(),
            }),
        )
    }

    pub fn precondition_missing_path(path: impl Into<String>, what: &str) -> Self {
        let path = path.into();
        Self::new(
            ErrorCode::PreconditionMissingPath,
            format!("{} not found: {}", what, path),
            to_details(MissingPathDetails { path }),
        )
    }

    pub fn postcondition_missing_marker(
        file: impl Into<String>,
        marker: impl Into<String>,
        hint: impl Into<String>,
    ) -> Self {
        let file = file.into();
        let marker = marker.into();
        Self::new(
            ErrorCode::PostconditionMissingMarker,
            format!("Validation failed: {} does not contain '{}'", file, marker),
            to_details(MarkerDetails { file, marker }),
        )
        .with_hint(hint)
    }

    pub fn postcondition_forbidden_marker(
        file: impl Into<String>,
        marker: impl Into<String>,
        hint: impl Into<String>,
    ) -> Self {
        let file = file.into();
        let marker = marker.into();
        Self::new(
            ErrorCode::PostconditionForbiddenMarker,
            format!("Validation failed: {} still contains '{}'", file, marker),
            to_details(MarkerDetails { file, marker }),
        )
        .with_hint(hint)
    }

    /// `files` is the full hit list; only the first `shown` entries are kept in the details.
    pub fn postcondition_residue_found(
        summary: impl Into<String>,
        markers: Vec<String>,
        files: &[String],
        shown: usize,
    ) -> Self {
        let listed: Vec<String> = files.iter().take(shown).cloned().collect();
        let mut message = summary.into();
        for file in &listed {
            message.push_str("\n- ");
            message.push_str(file);
        }

        Self::new(
            ErrorCode::PostconditionResidueFound,
            message,
            to_details(ResidueDetails {
                markers,
                files: listed,
                total_files: files.len(),
            }),
        )
    }

    pub fn internal_io(error: impl Into<String>, context: Option<String>) -> Self {
        Self::new(
            ErrorCode::InternalIoError,
            "IO error",
            to_details(InternalIoErrorDetails {
                error: error.into(),
                context,
            }),
        )
    }

    pub fn internal_unexpected(error: impl Into<String>) -> Self {
        Self::new(
            ErrorCode::InternalUnexpected,
            "Unexpected error",
            serde_json::json!({ "error": error.into() }),
        )
    }

    pub fn with_hint(mut self, message: impl Into<String>) -> Self {
        self.hints.push(Hint {
            message: message.into(),
        });
        self
    }
}
