pub mod persistence;
pub mod remote;
pub mod time;

// Re-exports
pub use persistence::*;
pub use remote::*;
pub use time::*;
