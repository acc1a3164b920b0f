//! Database initialization and the reviewer comment store

pub mod comments;
pub mod init;

pub use comments::*;
pub use init::*;
