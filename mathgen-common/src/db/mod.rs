//! Database initialization for the local genealogy mirror

pub mod init;

pub use init::*;
