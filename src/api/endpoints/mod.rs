//! API endpoint handlers, one module per resource.

pub mod backends;
pub mod chat;
pub mod health;
pub mod scans;
