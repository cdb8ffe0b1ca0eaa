pub mod commands;
pub mod dashboard;
pub mod queries;
pub mod registry;

pub use commands::*;
pub use dashboard::*;
pub use queries::*;
pub use registry::*;
