//! Domain error types.

/// No holding survived screening, so there is nothing to normalise.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("insufficient data: {requested} tickers requested, none usable on the common grid")]
pub struct InsufficientData {
    pub requested: usize,
}

/// Top-level error type for komorebi.
#[derive(Debug, thiserror::Error)]
pub enum KomorebiError {
    #[error("provider error for {ticker}: {reason}")]
    Provider { ticker: String, reason: String },

    #[error("data file error in {path}: {reason}")]
    DataFile { path: String, reason: String },

    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("missing config key [{section}] {key}")]
    ConfigMissing { section: String, key: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },

    #[error("portfolio file error: {reason}")]
    PortfolioFile { reason: String },

    #[error(transparent)]
    InsufficientData(#[from] InsufficientData),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl KomorebiError {
    pub fn provider(ticker: &str, reason: impl Into<String>) -> Self {
        KomorebiError::Provider {
            ticker: ticker.to_string(),
            reason: reason.into(),
        }
    }

    pub fn invalid(section: &str, key: &str, reason: impl Into<String>) -> Self {
        KomorebiError::ConfigInvalid {
            section: section.to_string(),
            key: key.to_string(),
            reason: reason.into(),
        }
    }
}

impl KomorebiError {
    /// Process exit status for this error category.
    pub fn exit_status(&self) -> u8 {
        match self {
            KomorebiError::Io(_) => 1,
            KomorebiError::ConfigParse { .. }
            | KomorebiError::ConfigMissing { .. }
            | KomorebiError::ConfigInvalid { .. } => 2,
            KomorebiError::Provider { .. } | KomorebiError::DataFile { .. } => 3,
            KomorebiError::PortfolioFile { .. } => 4,
            KomorebiError::InsufficientData(_) => 5,
        }
    }
}

impl From<&KomorebiError> for std::process::ExitCode {
    fn from(err: &KomorebiError) -> Self {
        std::process::ExitCode::from(err.exit_status())
    }
}
