// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Storage adapters.
//!
//! A store is a named key/value backend. Every store can be read
//! ([`ReadableStore`]); some can also be written ([`WritableStore`]). The
//! capability is fixed when a store is wrapped in a [`Store`], so the
//! resolver never has to probe a store at write time.
//!
//! | store | name | capability | medium |
//! |-------|------|------------|--------|
//! | [`InMemoryStore`] | `inMemoryStore` | read/write | process memory |
//! | [`WebStorageStore::session`] | `sessionStore` | read/write | [`MemoryWebStorage`] |
//! | [`WebStorageStore::local`] | `localStore` | read/write | [`FileWebStorage`] |
//! | [`EnvStore`] | `envStore` | read-only | environment snapshot |
//! | [`UrlStore`] | `urlStore` | read-only | URL query string |

mod env;
mod memory;
mod query;
mod web;

use std::sync::Arc;

use async_trait::async_trait;
use flagg_core::{FlagMap, FlagValue, Result};

pub use self::env::EnvStore;
pub use self::memory::InMemoryStore;
pub use self::query::{encode_query, UrlStore};
pub use self::web::{FileWebStorage, MemoryWebStorage, WebStorage, WebStorageStore};

pub const MEMORY_STORE_NAME: &str = "inMemoryStore";
pub const SESSION_STORE_NAME: &str = "sessionStore";
pub const LOCAL_STORE_NAME: &str = "localStore";
pub const ENV_STORE_NAME: &str = "envStore";
pub const URL_STORE_NAME: &str = "urlStore";

/// A readable flag store.
#[async_trait]
pub trait ReadableStore: Send + Sync + 'static {
	/// The routing key definitions use to select this store.
	fn name(&self) -> &str;

	/// Returns the stored value for a flag, `None` if nothing is stored.
	///
	/// Never fails for missing keys or malformed stored text.
	fn get(&self, flag_name: &str) -> Option<FlagValue>;

	/// Enumerates every flag this store holds.
	///
	/// Stores sharing a key space only report keys in their own namespace.
	async fn all(&self) -> Result<FlagMap>;
}

/// A flag store that also accepts writes.
pub trait WritableStore: ReadableStore {
	fn set(&self, flag_name: &str, value: &FlagValue) -> Result<()>;

	/// Removes a flag. Removing an absent flag is a no-op.
	fn remove(&self, flag_name: &str) -> Result<()>;
}

/// A store registered with the resolver, tagged with its capability.
#[derive(Clone)]
pub enum Store {
	ReadOnly(Arc<dyn ReadableStore>),
	ReadWrite(Arc<dyn WritableStore>),
}

impl Store {
	pub fn read_only(store: impl ReadableStore) -> Self {
		Store::ReadOnly(Arc::new(store))
	}

	pub fn read_write(store: impl WritableStore) -> Self {
		Store::ReadWrite(Arc::new(store))
	}

	pub fn name(&self) -> &str {
		match self {
			Store::ReadOnly(store) => store.name(),
			Store::ReadWrite(store) => store.name(),
		}
	}

	pub fn get(&self, flag_name: &str) -> Option<FlagValue> {
		match self {
			Store::ReadOnly(store) => store.get(flag_name),
			Store::ReadWrite(store) => store.get(flag_name),
		}
	}

	pub async fn all(&self) -> Result<FlagMap> {
		match self {
			Store::ReadOnly(store) => store.all().await,
			Store::ReadWrite(store) => store.all().await,
		}
	}

	/// Returns the writable view, `None` for read-only stores.
	pub fn as_writable(&self) -> Option<&dyn WritableStore> {
		match self {
			Store::ReadOnly(_) => None,
			Store::ReadWrite(store) => Some(store.as_ref()),
		}
	}

	pub fn is_read_only(&self) -> bool {
		matches!(self, Store::ReadOnly(_))
	}
}

impl std::fmt::Debug for Store {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		let kind = if self.is_read_only() {
			"ReadOnly"
		} else {
			"ReadWrite"
		};
		f.debug_tuple(kind).field(&self.name()).finish()
	}
}
