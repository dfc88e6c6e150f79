//! The core module holds the backend interface, error type and configuration.

pub mod device;
pub mod error;
pub mod render_pass;
pub mod settings;
