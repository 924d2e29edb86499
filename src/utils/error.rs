use thiserror::Error;

#[derive(Error, Debug)]
pub enum ReportError {
    #[error("Workbook encoding failed: {0}")]
    XlsxError(#[from] rust_xlsxwriter::XlsxError),

    #[error("API request failed: {0}")]
    ApiError(#[from] reqwest::Error),

    #[error("CSV processing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Missing configuration: {field}")]
    MissingConfigError { field: String },

    #[error("Invalid value '{value}' for {field}: {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Configuration error in {field}: {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Invalid TOML configuration: {0}")]
    ConfigParseError(#[from] toml::de::Error),

    #[error("Authentication failed: {message}")]
    AuthFailed { message: String },

    #[error("Not logged in / missing credentials")]
    NotAuthenticated,

    #[error("Unauthorized — please login again.")]
    Unauthorized,

    #[error("Request failed ({status}): {message}")]
    RequestFailed { status: u16, message: String },

    #[error("Request cancelled")]
    Cancelled,

    #[error("Malformed stream: {message}")]
    MalformedStream { message: String },

    #[error("Validation error: {message}")]
    ValidationError { message: String },
}

pub type Result<T> = std::result::Result<T, ReportError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Authentication,
    Network,
    Data,
    Configuration,
    Export,
    Cancelled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl ReportError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            ReportError::AuthFailed { .. }
            | ReportError::NotAuthenticated
            | ReportError::Unauthorized => ErrorCategory::Authentication,
            ReportError::ApiError(_) | ReportError::RequestFailed { .. } => ErrorCategory::Network,
            ReportError::SerializationError(_)
            | ReportError::MalformedStream { .. }
            | ReportError::ValidationError { .. } => ErrorCategory::Data,
            ReportError::MissingConfigError { .. }
            | ReportError::InvalidConfigValueError { .. }
            | ReportError::ConfigValidationError { .. }
            | ReportError::ConfigParseError(_) => ErrorCategory::Configuration,
            ReportError::XlsxError(_) | ReportError::CsvError(_) | ReportError::IoError(_) => {
                ErrorCategory::Export
            }
            ReportError::Cancelled => ErrorCategory::Cancelled,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self.category() {
            ErrorCategory::Cancelled => ErrorSeverity::Low,
            ErrorCategory::Network | ErrorCategory::Authentication => ErrorSeverity::Medium,
            ErrorCategory::Data | ErrorCategory::Export => ErrorSeverity::High,
            ErrorCategory::Configuration => ErrorSeverity::Critical,
        }
    }

    /// 取消不是錯誤，回報前要先濾掉
    pub fn is_cancelled(&self) -> bool {
        matches!(self, ReportError::Cancelled)
    }

    /// 需要強制登出 / 重設狀態的錯誤
    pub fn requires_login(&self) -> bool {
        matches!(self, ReportError::NotAuthenticated | ReportError::Unauthorized)
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            ReportError::NotAuthenticated | ReportError::Unauthorized => {
                "Run `connectview login` and try again"
            }
            ReportError::AuthFailed { .. } => "Check the username and password",
            ReportError::ApiError(_) | ReportError::RequestFailed { .. } => {
                "Check that the backend is reachable, then retry the request"
            }
            ReportError::MalformedStream { .. } | ReportError::SerializationError(_) => {
                "The backend returned an unexpected payload; retry or contact the administrator"
            }
            ReportError::ValidationError { .. } => "Adjust the input and try again",
            ReportError::MissingConfigError { .. }
            | ReportError::InvalidConfigValueError { .. }
            | ReportError::ConfigValidationError { .. }
            | ReportError::ConfigParseError(_) => "Fix the configuration file or flags",
            ReportError::XlsxError(_) | ReportError::CsvError(_) | ReportError::IoError(_) => {
                "Check that the output path exists and is writable"
            }
            ReportError::Cancelled => "No action needed",
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            ReportError::AuthFailed { message } => message.clone(),
            ReportError::RequestFailed { message, .. } => message.clone(),
            ReportError::ValidationError { message } => message.clone(),
            ReportError::ApiError(e) if e.is_timeout() => "The request timed out".to_string(),
            ReportError::ApiError(e) if e.is_connect() => {
                "Could not connect to the server".to_string()
            }
            other => other.to_string(),
        }
    }
}
