use thiserror::Error;

use crate::config::ConfigError;

/// The only failure `verify`/`verify_batch` surface. Provider and parse failures become results.
#[derive(Debug, Error)]
pub enum VerifierError {
    #[error("configuration error: {0}")]
    Configuration(#[from] ConfigError),
}
