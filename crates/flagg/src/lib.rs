// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Client-side feature flags.
//!
//! This crate resolves named flags against one or more key/value stores,
//! persists overrides, and exposes what an admin surface needs to browse and
//! edit flags at runtime.
//!
//! # Features
//!
//! - **Pluggable Stores**: in-memory, session and durable web-style storage,
//!   environment variables and URL query strings
//! - **Store Routing**: each flag can name the store it lives in
//! - **Hydration**: seed writable stores from read-only sources
//! - **Freezing**: pin flags to their current value
//! - **Change Notifications**: subscribe to every applied write
//! - **Catalog**: grouped, searchable listing for admin tooling
//!
//! # Example
//!
//! ```
//! use flagg::{DefinitionRegistry, FlagDefinition, FlagValue, Flagg, InMemoryStore, Store, UrlStore};
//!
//! # tokio_test::block_on(async {
//! let (flagg, hydrated) = Flagg::builder()
//!     .store(Store::read_write(InMemoryStore::new()))
//!     .definitions(
//!         DefinitionRegistry::new()
//!             .with("app.darkMode", FlagDefinition::empty().with_default(false))
//!             .with("app.title", FlagDefinition::empty().with_default("InstaSnap")),
//!     )
//!     .hydrate_from(UrlStore::parse("?ff={%22app.title%22:%22From%20URL%22}"))
//!     .build_hydrated()
//!     .await?;
//!
//! hydrated?;
//! assert_eq!(flagg.get("app.title"), FlagValue::from("From URL"));
//!
//! flagg.set("app.darkMode", true);
//! assert!(flagg.is_on("app.darkMode"));
//! assert!(flagg.is_overridden("app.darkMode"));
//!
//! flagg.freeze("app.darkMode");
//! flagg.set("app.darkMode", false);
//! assert!(flagg.is_on("app.darkMode"));
//! # Ok::<(), flagg::FlaggError>(())
//! # }).unwrap();
//! ```

pub mod catalog;
mod changes;
mod client;
pub mod config;
pub mod store;

pub use catalog::{CatalogCategory, CatalogEntry};
pub use changes::{ChangeKind, FlagChange};
pub use client::{Flagg, FlaggBuilder, WriteOutcome, DEFAULT_STORE_NAME, FROZEN_STORE_NAME};
pub use config::{ConfigError, FlaggConfig, HydrateConfig};
pub use store::{
	EnvStore, FileWebStorage, InMemoryStore, MemoryWebStorage, ReadableStore, Store, UrlStore,
	WebStorage, WebStorageStore, WritableStore,
};

// Re-export core types for convenience
pub use flagg_core::{
	ControlType, DefinitionRegistry, FlagDefinition, FlagMap, FlagValue, FlaggError, KeyNamespace,
	Result,
};
