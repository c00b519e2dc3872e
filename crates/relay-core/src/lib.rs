pub mod audio;
pub mod error;
pub mod orchestrator;
pub mod types;

pub use error::RelayError;
pub use orchestrator::Orchestrator;
pub use types::{ChatReply, ChatRequest, RelayResponse, RelaySettings};
