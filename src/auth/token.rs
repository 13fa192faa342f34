//! Token value types: the bearer record, redacted secrets, and synthetic-token markers.

pub mod record;
pub mod secret;
pub mod synthetic;
