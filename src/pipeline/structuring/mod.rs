pub mod confidence;
pub mod orchestrator;
pub mod patterns;
pub mod table;
pub mod types;

pub use confidence::*;
pub use orchestrator::*;
pub use patterns::*;
pub use table::*;
pub use types::*;
