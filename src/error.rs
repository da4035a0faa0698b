use thiserror::Error;

/// Raised while building a stream from a [`StreamConfig`](crate::config::StreamConfig).
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ConfigurationError {
    #[error("hidden size {hidden_size} is not divisible by the number of attention heads {attention_heads}")]
    IndivisibleHeads {
        hidden_size: usize,
        attention_heads: usize,
    },

    #[error("encoder depth must be at least 1, got {0}")]
    EmptyEncoder(usize),

    #[error("`{0}` must be positive")]
    ZeroDimension(&'static str),

    #[error("dropout must lie in [0, 1), got {0}")]
    InvalidDropout(f64),

    #[error("padding index {padding_idx} is outside the vocabulary of size {vocab_size}")]
    PaddingOutOfRange { padding_idx: usize, vocab_size: usize },

    #[error("unknown {kind} '{value}'")]
    UnknownTag { kind: &'static str, value: String },

    #[error("malformed configuration: {0}")]
    Malformed(String),
}

/// Raised by [`TextualStream::encode`](crate::model::TextualStream::encode) for unusable input.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ShapeError {
    #[error("token batch is empty")]
    EmptyBatch,

    #[error("sequence {row} has length {found}, expected {expected}")]
    Ragged {
        row: usize,
        expected: usize,
        found: usize,
    },

    #[error("token {token} at ({row}, {position}) is outside the vocabulary of size {vocab_size}")]
    TokenOutOfRange {
        row: usize,
        position: usize,
        token: usize,
        vocab_size: usize,
    },

    #[error("sequence length {length} exceeds the maximum of {max}")]
    SequenceTooLong { length: usize, max: usize },
}

#[derive(Debug, Error)]
pub enum StreamError {
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),

    #[error(transparent)]
    Shape(#[from] ShapeError),
}

impl From<serde_json::Error> for ConfigurationError {
    fn from(err: serde_json::Error) -> Self {
        ConfigurationError::Malformed(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn umbrella_error_keeps_the_inner_message() {
        let err: StreamError = ShapeError::SequenceTooLong { length: 40, max: 30 }.into();
        assert_eq!(err.to_string(), "sequence length 40 exceeds the maximum of 30");

        let err: StreamError = ConfigurationError::ZeroDimension("hidden_size").into();
        assert!(matches!(err, StreamError::Configuration(_)));
        assert_eq!(err.to_string(), "`hidden_size` must be positive");
    }

    #[test]
    fn json_errors_become_malformed_configurations() {
        let err: ConfigurationError = serde_json::from_str::<usize>("not json").unwrap_err().into();

        assert!(matches!(err, ConfigurationError::Malformed(_)));
    }
}
