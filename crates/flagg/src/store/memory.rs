// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use flagg_core::{FlagMap, FlagValue, Result};
use parking_lot::RwLock;

use super::{ReadableStore, WritableStore, MEMORY_STORE_NAME};

/// Process-local store backed by a map.
///
/// Clones share the same map, so a caller can keep a handle to a store it
/// has registered with a resolver.
#[derive(Debug, Clone)]
pub struct InMemoryStore {
	name: Arc<str>,
	values: Arc<RwLock<HashMap<String, FlagValue>>>,
}

impl InMemoryStore {
	pub fn new() -> Self {
		Self::with_name(MEMORY_STORE_NAME)
	}

	pub fn with_name(name: impl Into<String>) -> Self {
		Self {
			name: Arc::from(name.into()),
			values: Arc::new(RwLock::new(HashMap::new())),
		}
	}

	/// Infallible write.
	pub fn insert(&self, flag_name: &str, value: FlagValue) {
		self.values.write().insert(flag_name.to_owned(), value);
	}

	pub fn len(&self) -> usize {
		self.values.read().len()
	}

	pub fn is_empty(&self) -> bool {
		self.values.read().is_empty()
	}
}

impl Default for InMemoryStore {
	fn default() -> Self {
		Self::new()
	}
}

#[async_trait]
impl ReadableStore for InMemoryStore {
	fn name(&self) -> &str {
		&self.name
	}

	fn get(&self, flag_name: &str) -> Option<FlagValue> {
		self.values.read().get(flag_name).cloned()
	}

	async fn all(&self) -> Result<FlagMap> {
		Ok(self
			.values
			.read()
			.iter()
			.map(|(name, value)| (name.clone(), value.clone()))
			.collect())
	}
}

impl WritableStore for InMemoryStore {
	fn set(&self, flag_name: &str, value: &FlagValue) -> Result<()> {
		self.insert(flag_name, value.clone());
		Ok(())
	}

	fn remove(&self, flag_name: &str) -> Result<()> {
		self.values.write().remove(flag_name);
		Ok(())
	}
}
