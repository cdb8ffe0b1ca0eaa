pub mod commit;
pub mod events;
pub mod repo;
pub mod status;

// Re-exports for convenience
pub use commit::*;
pub use events::*;
pub use repo::*;
pub use status::*;
