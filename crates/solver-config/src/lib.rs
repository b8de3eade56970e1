//! Configuration types and loading for the solver.

pub mod loader;
mod serde_helpers;
pub mod types;

pub use loader::{discover_path, load, load_from_str};
pub use types::{AgentConfig, Config, EvaluatorConfig, EvaluatorVariant, NetworkConfig};
