// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Key namespacing for stores that share a key space with unrelated data.
//!
//! Browser storage and the process environment hold plenty of keys that have
//! nothing to do with feature flags. Stores writing into such a medium prefix
//! every key (`ff_myFlag`) and only report keys carrying that exact prefix.

use serde::{Deserialize, Serialize};

use crate::{FlagMap, FlagValue};

pub const DEFAULT_PREFIX: &str = "ff";
pub const DEFAULT_DELIMITER: &str = "_";

/// A `<prefix><delimiter>` key namespace.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct KeyNamespace {
	pub prefix: String,
	pub delimiter: String,
}

impl KeyNamespace {
	pub fn new(prefix: impl Into<String>, delimiter: impl Into<String>) -> Self {
		Self {
			prefix: prefix.into(),
			delimiter: delimiter.into(),
		}
	}

	/// Returns the raw key for a flag, e.g. `ff_myFlag`.
	pub fn key(&self, flag_name: &str) -> String {
		format!("{}{}{}", self.prefix, self.delimiter, flag_name)
	}

	/// Returns the flag name for a raw key, or `None` if the key is not in
	/// this namespace.
	pub fn strip<'a>(&self, raw_key: &'a str) -> Option<&'a str> {
		raw_key
			.strip_prefix(self.prefix.as_str())?
			.strip_prefix(self.delimiter.as_str())
	}

	pub fn is_namespaced(&self, raw_key: &str) -> bool {
		self.strip(raw_key).is_some()
	}

	/// Collects every namespaced entry of a raw key space.
	///
	/// Keys outside the namespace are skipped. Each flag is re-read through
	/// `get` so values come back parsed the same way single reads are.
	pub fn collect<I, K, F>(&self, raw_keys: I, mut get: F) -> FlagMap
	where
		I: IntoIterator<Item = K>,
		K: AsRef<str>,
		F: FnMut(&str) -> Option<FlagValue>,
	{
		raw_keys
			.into_iter()
			.filter_map(|raw_key| {
				let flag_name = self.strip(raw_key.as_ref())?;
				get(flag_name).map(|value| (flag_name.to_owned(), value))
			})
			.collect()
	}
}

impl Default for KeyNamespace {
	fn default() -> Self {
		Self::new(DEFAULT_PREFIX, DEFAULT_DELIMITER)
	}
}
