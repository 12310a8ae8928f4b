//! Inkbound client - resource client and store layer for the storefront.
//!
//! This crate is the client-side state/synchronization layer of the
//! Inkbound storefront. It talks to the remote REST API through a thin
//! resource client and keeps per-resource state in memory, in *stores*:
//! session, catalog, category, cart, order, inventory, review and
//! dashboard. Views read store state and drive store operations; stores
//! never reach into each other except through the event bus.
//!
//! # Architecture
//!
//! - [`api`] - the resource client: typed HTTP helpers over an
//!   object-safe [`api::Transport`], success-envelope unwrapping, error
//!   normalization and the session-expiry hook
//! - [`stores`] - one store per server resource, constructed together by
//!   [`stores::Stores`]
//! - [`events`] - the broadcast bus carrying the documented cross-store
//!   notifications (session ended, product stock changed)
//! - [`testing`] - a mock transport for driving stores without a network
//!
//! # Example
//!
//! ```rust,ignore
//! use inkbound_client::config::ClientConfig;
//! use inkbound_client::stores::Stores;
//!
//! let config = ClientConfig::from_env()?;
//! let stores = Stores::new(&config)?;
//!
//! stores.session().check_session().await;
//! stores.cart().load_cart().await?;
//! let count = stores.cart().item_count();
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod api;
pub mod config;
pub mod events;
pub mod stores;
pub mod testing;
pub mod types;
