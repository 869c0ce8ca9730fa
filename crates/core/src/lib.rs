//! Cartwheel Core - Shared domain types.
//!
//! This crate provides the types shared between the Cartwheel service and its
//! tests:
//! - `app` - The discount automation HTTP service
//! - `integration-tests` - End-to-end tests over the public API
//!
//! # Architecture
//!
//! The core crate contains only types and arithmetic - no I/O, no HTTP
//! clients. This keeps it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Money, discount values, and the bulk-discount tier schedule

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
