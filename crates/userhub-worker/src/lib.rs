//! UserHub worker.
//!
//! The worker owns the user store. It accepts one `EventRelay` stream per
//! gateway request, answers the single event on it, and releases the stream.

pub mod config;
pub mod error;
pub mod handler;
pub mod server;
