//! # Common Components
//!
//! Shared utilities and data structures used by both client and server components.
//!
//! ## Modules
//!
//! - [`messages`]: Protocol message definitions and the wire timestamp format
//! - [`connection`]: TCP connection abstraction with message framing
//! - [`config`]: Configuration parsing utilities
//! - [`sanitize`]: Name and score normalization shared by client and server

pub mod messages;
pub mod connection;
pub mod config;
pub mod sanitize;
