//! Error types for batch classification.

use thiserror::Error;

/// Primary error type for classification batches.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ClassifyError {
    /// The batch was non-empty but no torrent qualified for classification.
    #[error("no torrent in the batch qualified for classification")]
    NoQualifyingTorrents {
        /// Raw payloads handed to the batch.
        received: usize,
        /// Payloads rejected by snapshot validation.
        invalid: usize,
        /// Valid torrents outside the seeding phase.
        excluded: usize,
    },
}

/// Convenience alias for classification results.
pub type ClassifyResult<T> = Result<T, ClassifyError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn message_is_constant() {
        let err = ClassifyError::NoQualifyingTorrents {
            received: 3,
            invalid: 1,
            excluded: 2,
        };
        assert_eq!(
            err.to_string(),
            "no torrent in the batch qualified for classification"
        );
    }
}
