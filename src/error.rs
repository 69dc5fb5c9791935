use crate::infrastructure::transport::TransportError;
use std::fmt;

/// Top-level application error type
#[derive(Debug)]
pub enum AppError {
    /// Transport-level failure (connection, timeout, session)
    Transport(TransportError),
    /// Page payload could not be decoded
    Decode(DecodeError),
    /// Total page count could not be determined
    Discovery(DiscoveryError),
    /// Too many pages failed for the run total to be trusted
    HighFailureRate { failed: usize, total: usize },
    /// Spreadsheet sink error
    Sheet(SheetError),
    /// Chat notification error
    Notify(NotifyError),
    /// Configuration error
    Config(ConfigError),
    /// Anything else (wraps third-party errors)
    Other(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Transport(e) => write!(f, "transport error: {}", e),
            AppError::Decode(e) => write!(f, "decode error: {}", e),
            AppError::Discovery(e) => write!(f, "discovery error: {}", e),
            AppError::HighFailureRate { failed, total } => write!(
                f,
                "too many failed pages: {} of {}, run total discarded",
                failed, total
            ),
            AppError::Sheet(e) => write!(f, "sheet error: {}", e),
            AppError::Notify(e) => write!(f, "notify error: {}", e),
            AppError::Config(e) => write!(f, "config error: {}", e),
            AppError::Other(msg) => write!(f, "error: {}", msg),
        }
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AppError::Transport(e) => Some(e),
            AppError::Decode(e) => Some(e),
            AppError::Discovery(e) => Some(e),
            AppError::Sheet(e) => Some(e),
            AppError::Notify(e) => Some(e),
            AppError::Config(e) => Some(e),
            AppError::HighFailureRate { .. } | AppError::Other(_) => None,
        }
    }
}

/// Page payload decode errors
#[derive(Debug)]
pub enum DecodeError {
    /// Payload is not parseable as JSON
    Malformed {
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    /// Expected entries collection is absent
    MissingEntries,
}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DecodeError::Malformed { source } => {
                write!(f, "payload is not valid JSON: {}", source)
            }
            DecodeError::MissingEntries => write!(f, "no entries collection in response"),
        }
    }
}

impl std::error::Error for DecodeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            DecodeError::Malformed { source } => {
                Some(source.as_ref() as &(dyn std::error::Error + 'static))
            }
            DecodeError::MissingEntries => None,
        }
    }
}

/// Pagination discovery errors
#[derive(Debug)]
pub enum DiscoveryError {
    /// The page-1 probe failed even after the short retry
    ProbeFailed { reason: String },
}

impl fmt::Display for DiscoveryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DiscoveryError::ProbeFailed { reason } => {
                write!(f, "cannot determine total page count: {}", reason)
            }
        }
    }
}

impl std::error::Error for DiscoveryError {}

/// Spreadsheet sink errors
#[derive(Debug)]
pub enum SheetError {
    /// Request to the spreadsheet API failed
    RequestFailed {
        range: String,
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    /// Spreadsheet API returned a non-success status
    BadResponse {
        range: String,
        status: u16,
        message: String,
    },
}

impl fmt::Display for SheetError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SheetError::RequestFailed { range, source } => {
                write!(f, "sheet request failed ({}): {}", range, source)
            }
            SheetError::BadResponse {
                range,
                status,
                message,
            } => {
                write!(f, "sheet API error ({}): HTTP {} {}", range, status, message)
            }
        }
    }
}

impl std::error::Error for SheetError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SheetError::RequestFailed { source, .. } => {
                Some(source.as_ref() as &(dyn std::error::Error + 'static))
            }
            SheetError::BadResponse { .. } => None,
        }
    }
}

/// Chat notification errors
#[derive(Debug)]
pub enum NotifyError {
    /// Message send request failed
    SendFailed {
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    /// Chat API rejected the message
    Rejected { status: u16, body: String },
}

impl fmt::Display for NotifyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NotifyError::SendFailed { source } => write!(f, "message send failed: {}", source),
            NotifyError::Rejected { status, body } => {
                write!(f, "chat API rejected message: HTTP {} {}", status, body)
            }
        }
    }
}

impl std::error::Error for NotifyError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            NotifyError::SendFailed { source } => {
                Some(source.as_ref() as &(dyn std::error::Error + 'static))
            }
            NotifyError::Rejected { .. } => None,
        }
    }
}

/// Configuration errors
#[derive(Debug)]
pub enum ConfigError {
    /// A required environment variable is absent
    EnvVarNotFound { var_name: String },
    /// An environment variable could not be parsed
    EnvVarParseFailed {
        var_name: String,
        value: String,
        expected_type: String,
    },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::EnvVarNotFound { var_name } => {
                write!(f, "missing environment variable: {}", var_name)
            }
            ConfigError::EnvVarParseFailed {
                var_name,
                value,
                expected_type,
            } => {
                write!(
                    f,
                    "environment variable {} has value '{}' which is not a valid {}",
                    var_name, value, expected_type
                )
            }
        }
    }
}

impl std::error::Error for ConfigError {}

// ========== Conversions from common error types ==========
// anyhow already blanket-converts anything implementing std::error::Error,
// so only the inward conversions are spelled out here.

impl From<TransportError> for AppError {
    fn from(err: TransportError) -> Self {
        AppError::Transport(err)
    }
}

impl From<DecodeError> for AppError {
    fn from(err: DecodeError) -> Self {
        AppError::Decode(err)
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Decode(DecodeError::Malformed {
            source: Box::new(err),
        })
    }
}

// ========== Convenience constructors ==========

impl AppError {
    /// Missing environment variable
    pub fn missing_var(var_name: impl Into<String>) -> Self {
        AppError::Config(ConfigError::EnvVarNotFound {
            var_name: var_name.into(),
        })
    }

    /// Sheet API request failure
    pub fn sheet_request_failed(
        range: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        AppError::Sheet(SheetError::RequestFailed {
            range: range.into(),
            source: Box::new(source),
        })
    }

    /// Sheet API bad response
    pub fn sheet_bad_response(
        range: impl Into<String>,
        status: u16,
        message: impl Into<String>,
    ) -> Self {
        AppError::Sheet(SheetError::BadResponse {
            range: range.into(),
            status,
            message: message.into(),
        })
    }
}

// ========== Result type alias ==========

/// Application result type
pub type AppResult<T> = Result<T, AppError>;
