pub mod config;
pub mod errors;
pub mod logging;
pub mod models;
pub mod traits;

pub use errors::{PortalError, PortalResult};
pub use logging::init_logging;
pub use models::{InboundMessage, StartOutcome, StopOutcome, WorkerSnapshot, WorkerStatus};
pub use traits::{ChatTransport, CompletionBackend, Predictor, TransportFactory};
