//! Reference HTTP backend for the dashboard API
//!
//! Serves the list and metadata endpoints over any [`RecordStore`]. Every
//! list request is validated server-side before it touches the records.
//!
//! [`RecordStore`]: crate::core::RecordStore

pub mod builder;
pub mod extractors;
pub mod handlers;
pub mod pipeline;

pub use builder::ServerBuilder;
pub use extractors::AuthenticatedUser;
pub use handlers::ServerState;
pub use pipeline::{ListQuery, sort_records};
