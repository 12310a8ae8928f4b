//! Inkbound Core - Shared types library.
//!
//! This crate provides the common vocabulary used across all Inkbound
//! components:
//! - `client` - Resource client and in-memory stores for the storefront
//! - `integration-tests` - Store-level scenario tests
//!
//! # Architecture
//!
//! The core crate contains only types - no I/O, no HTTP clients, no store
//! state. This keeps it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for type-safe IDs and emails, plus the
//!   status enums shared by the stores

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
