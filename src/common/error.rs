use thiserror::Error;

#[derive(Error, Debug)]
pub enum MarketError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Project already purchased")]
    AlreadyPurchased,

    #[error("No completed purchase for this project")]
    NotPurchased,

    #[error("Download quota exhausted or purchase expired")]
    QuotaExceededOrExpired,

    #[error("A qualifying purchase is required to review this project")]
    NotEntitled,

    #[error("User account is deactivated")]
    InactiveUser,

    #[error("Rating must be between 1 and 5, got {0}")]
    InvalidRating(u8),

    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("Invalid field: {0}")]
    InvalidField(String),

    #[error("Storage error: {message}")]
    Storage { message: String },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON deserialization failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML deserialization failed: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Environment variable error: {0}")]
    Env(#[from] std::env::VarError),
}

impl MarketError {
    /// Whether this is an ordinary business outcome rather than a fault.
    /// Expected errors surface as `success: false` payloads, not as 500s.
    pub fn is_expected(&self) -> bool {
        matches!(
            self,
            MarketError::NotFound(_)
                | MarketError::AlreadyPurchased
                | MarketError::NotPurchased
                | MarketError::QuotaExceededOrExpired
                | MarketError::NotEntitled
                | MarketError::InactiveUser
                | MarketError::InvalidRating(_)
                | MarketError::MissingField(_)
                | MarketError::InvalidField(_)
        )
    }

    /// Stable snake_case label for metrics and structured logs.
    pub fn label(&self) -> &'static str {
        match self {
            MarketError::NotFound(_) => "not_found",
            MarketError::AlreadyPurchased => "already_purchased",
            MarketError::NotPurchased => "not_purchased",
            MarketError::QuotaExceededOrExpired => "quota_exceeded_or_expired",
            MarketError::NotEntitled => "not_entitled",
            MarketError::InactiveUser => "inactive_user",
            MarketError::InvalidRating(_) => "invalid_rating",
            MarketError::MissingField(_) => "missing_field",
            MarketError::InvalidField(_) => "invalid_field",
            MarketError::Storage { .. } => "storage",
            MarketError::Config(_) => "config",
            MarketError::Http(_) => "http",
            MarketError::Json(_) => "json",
            MarketError::Toml(_) => "toml",
            MarketError::Io(_) => "io",
            MarketError::Env(_) => "env",
        }
    }
}

pub type Result<T> = std::result::Result<T, MarketError>;
