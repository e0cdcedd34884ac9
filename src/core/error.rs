//! Error taxonomy for currency reads.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CurrencyError {
    /// The code is neither a direct nor a derived currency.
    #[error("unsupported currency: {0}")]
    Unsupported(String),

    /// Network failure, non-success status or malformed payload from a provider.
    #[error("upstream unavailable: {0:#}")]
    UpstreamUnavailable(#[source] anyhow::Error),

    /// A derived currency was requested before its base snapshot or rate was usable.
    #[error("prerequisite missing: {0}")]
    PrerequisiteMissing(String),
}

impl CurrencyError {
    pub fn upstream(err: impl Into<anyhow::Error>) -> Self {
        Self::UpstreamUnavailable(err.into())
    }
}

pub type CurrencyResult<T> = Result<T, CurrencyError>;
