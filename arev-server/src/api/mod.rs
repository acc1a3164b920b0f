//! HTTP API handlers for arev-server

pub mod buildinfo;
pub mod comments;
pub mod error;
pub mod health;
pub mod process;

pub use buildinfo::get_build_info;
pub use comments::{add_comment, delete_comment, get_comments, get_comments_by_model};
pub use error::{ApiError, ApiResult};
pub use health::health_routes;
pub use process::{process_files, DROPPED_RECORDS_HEADER, MALFORMED_LINES_HEADER};
