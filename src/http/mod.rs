//! HTTP transport layer

pub mod client;
