pub mod config;
pub mod data;
pub mod error;
pub mod init;
pub mod mask;
pub mod model;
pub mod ops;
pub mod pad;

pub use config::{ActivationKind, Directionality, NormPlacement, StreamConfig};
pub use data::TokenBatch;
pub use error::{ConfigurationError, ShapeError, StreamError};
pub use model::TextualStream;
