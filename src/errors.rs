use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Image processing error: {0}")]
    Image(#[from] image::ImageError),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Missing credentials: environment variable {var} is not set")]
    MissingCredentials { var: String },

    #[error("Root directory not found: {path}")]
    RootDirMissing { path: String },

    #[error("No postable works found under {root}")]
    NoWorks { root: String },

    #[error("Unknown work: {name}")]
    UnknownWork { name: String },

    #[error("Another run is already in progress (PID {pid})")]
    AlreadyRunning { pid: u32 },

    #[error("File not found: {path}")]
    FileNotFound { path: String },

    #[error("Invalid file type: {path}. Only jpg, jpeg and png pages are supported.")]
    InvalidFileType { path: String },

    #[error("File too large: {path}. Maximum size is 5MB.")]
    FileTooLarge { path: String },

    #[error("Upload failed for {path}: {reason}")]
    UploadFailed { path: String, reason: String },

    #[error("Post {batch}/{total} failed: {reason}")]
    PostFailed {
        batch: usize,
        total: usize,
        reason: String,
    },

    #[error("X API error {status}: {message}")]
    Api { status: u16, message: String },

    #[error("Authentication failed: {0}")]
    Auth(String),

    #[error("Validation error: {field} - {message}")]
    Validation { field: String, message: String },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Publish failed for work {work}: {reason}")]
    PublishFailed { work: String, reason: String },
}

/// Custom result type
pub type AppResult<T> = Result<T, AppError>;

impl AppError {
    pub fn validation(field: &str, message: &str) -> Self {
        Self::Validation {
            field: field.to_string(),
            message: message.to_string(),
        }
    }

    pub fn file_not_found(path: &str) -> Self {
        Self::FileNotFound {
            path: path.to_string(),
        }
    }

    pub fn invalid_file_type(path: &str) -> Self {
        Self::InvalidFileType {
            path: path.to_string(),
        }
    }

    pub fn file_too_large(path: &str) -> Self {
        Self::FileTooLarge {
            path: path.to_string(),
        }
    }

    pub fn missing_credentials(var: &str) -> Self {
        Self::MissingCredentials {
            var: var.to_string(),
        }
    }

    pub fn upload_failed(path: &str, reason: impl ToString) -> Self {
        Self::UploadFailed {
            path: path.to_string(),
            reason: reason.to_string(),
        }
    }

    pub fn post_failed(batch: usize, total: usize, reason: impl ToString) -> Self {
        Self::PostFailed {
            batch,
            total,
            reason: reason.to_string(),
        }
    }

    /// Errors the HTTP client may retry on its own. Everything above the
    /// client treats publishing errors as fatal.
    pub fn is_retryable(&self) -> bool {
        matches!(self, AppError::Api { status, .. } if should_retry_status(*status))
    }

    /// Configuration problems: the run stops before anything is posted.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            AppError::MissingCredentials { .. }
                | AppError::Auth(_)
                | AppError::RootDirMissing { .. }
                | AppError::NoWorks { .. }
                | AppError::UnknownWork { .. }
                | AppError::AlreadyRunning { .. }
                | AppError::Validation { .. }
                | AppError::Config(_)
        )
    }
}

fn should_retry_status(status_code: u16) -> bool {
    matches!(status_code, 429 | 500 | 502 | 503 | 504)
}
