use std::fmt;
use thiserror::Error;

/// Failures while pulling the raw payload out of a forecast page.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExtractionError {
    #[error("no <custom-forecast> element with a data-forecast attribute")]
    MissingBlob,

    #[error("forecast payload is not valid JSON: {0}")]
    MalformedJson(String),

    #[error("no <select id=\"date_selector\"> element")]
    MissingDateSelector,
}

/// Failures while mapping the raw payload onto the canonical schema.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NormalizationError {
    #[error("{day}: field '{field}' has {found} entries, expected {expected}")]
    CountMismatch {
        day: String,
        field: String,
        expected: usize,
        found: usize,
    },

    #[error("{day}: invalid field '{field}': {reason}")]
    InvalidField {
        day: String,
        field: String,
        reason: String,
    },
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SchemaError {
    #[error("invalid forecast document: {0}")]
    InvalidStructure(String),

    #[error("unknown field '{field}'. Available: {}", .available.join(", "))]
    UnknownField {
        field: String,
        available: Vec<String>,
    },
}

/// Either half of turning a page into a forecast.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PageError {
    #[error(transparent)]
    Extraction(#[from] ExtractionError),

    #[error(transparent)]
    Normalization(#[from] NormalizationError),
}

/// Pipeline stage a refresh failed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Network,
    Extraction,
    Normalization,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Network => "network",
            Stage::Extraction => "extraction",
            Stage::Normalization => "normalization",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RefreshError {
    #[error("network failure: {0}")]
    NetworkFailure(String),

    #[error("request timed out after {0}s")]
    Timeout(u64),

    #[error("extraction failed: {0}")]
    ExtractionFailed(#[from] ExtractionError),

    #[error("normalization failed: {0}")]
    NormalizationFailed(#[from] NormalizationError),

    #[error("parse task did not complete: {0}")]
    Interrupted(String),
}

impl From<PageError> for RefreshError {
    fn from(err: PageError) -> Self {
        match err {
            PageError::Extraction(e) => RefreshError::ExtractionFailed(e),
            PageError::Normalization(e) => RefreshError::NormalizationFailed(e),
        }
    }
}

impl RefreshError {
    pub fn stage(&self) -> Stage {
        match self {
            RefreshError::NetworkFailure(_) | RefreshError::Timeout(_) => Stage::Network,
            RefreshError::ExtractionFailed(_) => Stage::Extraction,
            RefreshError::NormalizationFailed(_) | RefreshError::Interrupted(_) => {
                Stage::Normalization
            }
        }
    }
}

/// Why a coordinator has no forecast to hand out.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NotAvailable {
    #[error("no forecast fetched yet")]
    NotYetFetched,

    #[error("no forecast available: last refresh failed ({0})")]
    FetchFailed(RefreshError),

    #[error("forecast unavailable after {consecutive_failures} consecutive failed refreshes")]
    Degraded { consecutive_failures: u32 },
}

#[derive(Error, Debug)]
pub enum VentuskyError {
    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Page(#[from] PageError),

    #[error(transparent)]
    Schema(#[from] SchemaError),

    #[error("Refresh failed at {stage} stage: {0}", stage = .0.stage())]
    Refresh(#[from] RefreshError),

    #[error(transparent)]
    Unavailable(#[from] NotAvailable),

    #[error("Not found: {0}")]
    NotFound(String),
}

pub type Result<T> = std::result::Result<T, VentuskyError>;
