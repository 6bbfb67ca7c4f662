//! Built-in services registered by the server binary.

pub mod status;

pub use status::register_status;
