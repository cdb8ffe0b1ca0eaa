pub mod browser;
pub mod credentials;
pub mod github;
pub mod persistence;
