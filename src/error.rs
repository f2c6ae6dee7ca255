//! Errors raised while loading configuration or reporting to the backend
//!
//! Every error carries a stable `E###` code. The hundreds digit is the
//! family, and the family decides the process exit code.

use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Error family, one per hundreds digit of the code
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Family {
    /// E1xx: nothing was sent
    Config,
    /// E2xx: local files
    Io,
    /// E3xx: the backend could not be reached or refused a report
    Network,
    /// E9xx
    Internal,
}

impl Family {
    pub fn exit_code(self) -> i32 {
        match self {
            Family::Config => 10,
            Family::Io => 20,
            Family::Network => 30,
            Family::Internal => 90,
        }
    }
}

#[derive(Error, Debug)]
pub enum Error {
    #[error("Configuration file not found: {path}")]
    ConfigNotFound { path: PathBuf },

    #[error("Failed to parse configuration: {message}")]
    ConfigParse {
        message: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Configuration validation failed: {message}")]
    ConfigValidation { message: String, field: Option<String> },

    #[error("Failed to read file: {path}")]
    IoRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write file: {path}")]
    IoWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Failed to reach {url}: {message}")]
    ConnectionFailed { url: String, message: String },

    #[error("Request to {url} timed out: {message}")]
    ConnectionTimeout { url: String, message: String },

    /// The backend answered with a non-2xx status
    #[error("Backend rejected POST {url} with status {status}: {body}")]
    BackendRejected {
        url: String,
        status: u16,
        body: String,
    },

    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    pub fn config_not_found(path: impl Into<PathBuf>) -> Self {
        Error::ConfigNotFound { path: path.into() }
    }

    pub fn config_validation(message: impl Into<String>) -> Self {
        Error::ConfigValidation {
            message: message.into(),
            field: None,
        }
    }

    /// Validation error pinned to one config field (dotted path)
    pub fn config_field_invalid(field: impl Into<String>, message: impl Into<String>) -> Self {
        Error::ConfigValidation {
            message: message.into(),
            field: Some(field.into()),
        }
    }

    pub fn connection_failed(url: impl Into<String>, message: impl Into<String>) -> Self {
        Error::ConnectionFailed {
            url: url.into(),
            message: message.into(),
        }
    }

    pub fn backend_rejected(url: impl Into<String>, status: u16, body: impl Into<String>) -> Self {
        Error::BackendRejected {
            url: url.into(),
            status,
            body: body.into(),
        }
    }

    /// Map a reqwest send failure: timeouts stay distinct, the rest is unreachable
    pub fn from_transport(url: impl Into<String>, err: &reqwest::Error) -> Self {
        if err.is_timeout() {
            Error::ConnectionTimeout {
                url: url.into(),
                message: err.to_string(),
            }
        } else {
            Error::connection_failed(url, err.to_string())
        }
    }

    /// Numeric code, e.g. 305
    pub fn code(&self) -> u16 {
        match self {
            Error::ConfigNotFound { .. } => 100,
            Error::ConfigParse { .. } => 101,
            Error::ConfigValidation { .. } => 102,
            Error::IoRead { .. } => 200,
            Error::IoWrite { .. } => 201,
            Error::ConnectionFailed { .. } => 300,
            Error::ConnectionTimeout { .. } => 301,
            Error::BackendRejected { .. } => 305,
            Error::Json(_) | Error::Internal(_) => 900,
        }
    }

    pub fn code_str(&self) -> String {
        format!("E{}", self.code())
    }

    pub fn family(&self) -> Family {
        match self.code() / 100 {
            1 => Family::Config,
            2 => Family::Io,
            3 => Family::Network,
            _ => Family::Internal,
        }
    }

    pub fn exit_code(&self) -> i32 {
        self.family().exit_code()
    }

    /// Transient failures worth another attempt: unreachable, timed out, 429, 5xx
    pub fn is_retryable(&self) -> bool {
        match self {
            Error::ConnectionFailed { .. } | Error::ConnectionTimeout { .. } => true,
            Error::BackendRejected { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }

    /// Raised before any request could have been made
    pub fn is_fatal(&self) -> bool {
        matches!(self.family(), Family::Config | Family::Internal)
    }

    pub fn suggestion(&self) -> Option<&'static str> {
        let hint = match self {
            Error::ConfigNotFound { .. } => {
                "Run 'executor-client config init' to create a config.json, or pass --config <path>."
            }
            Error::ConfigParse { .. } => {
                "The configuration file must be a JSON object. Run 'executor-client config validate' to see details."
            }
            Error::ConfigValidation { field: Some(field), .. } if field == "backend_url" => {
                "Set \"backend_url\" to the base URL of the backend, e.g. {\"backend_url\": \"http://localhost:8000\"}."
            }
            Error::ConfigValidation { .. } => "Review the configuration file and fix the invalid values.",
            Error::ConnectionFailed { .. } => {
                "Check that the backend is running and that backend_url points at it."
            }
            Error::ConnectionTimeout { .. } => {
                "The backend did not answer in time. Raise http.request_timeout_secs or check the backend."
            }
            Error::BackendRejected { .. } => {
                "The backend refused the report. Check the backend logs for the rejected payload."
            }
            _ => return None,
        };
        Some(hint)
    }

    /// Red `Error [E###]` line, then a yellow hint when there is one
    pub fn format_for_terminal(&self) -> String {
        let mut out = format!("\x1b[31mError [{}]\x1b[0m: {}\n", self.code_str(), self);
        if let Some(hint) = self.suggestion() {
            out.push_str(&format!("\n\x1b[33mHint\x1b[0m: {}\n", hint));
        }
        out
    }

    pub fn format_for_log(&self) -> String {
        format!("[{}] {}", self.code_str(), self)
    }
}
