// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use std::collections::BTreeMap;

use async_trait::async_trait;
use flagg_core::{FlagMap, FlagValue, KeyNamespace, Result};

use super::{ReadableStore, ENV_STORE_NAME};

/// Read-only snapshot of environment-style variables.
///
/// Flags are read from `<prefix><delimiter><flag>` variables, e.g.
/// `ff_app.darkMode=true`. Values are parsed as JSON where possible and
/// passed through as strings otherwise. Empty values count as unset.
#[derive(Debug, Clone)]
pub struct EnvStore {
	name: String,
	namespace: KeyNamespace,
	vars: BTreeMap<String, String>,
}

impl EnvStore {
	pub fn new<I, K, V>(vars: I) -> Self
	where
		I: IntoIterator<Item = (K, V)>,
		K: Into<String>,
		V: Into<String>,
	{
		Self {
			name: ENV_STORE_NAME.to_string(),
			namespace: KeyNamespace::default(),
			vars: vars
				.into_iter()
				.map(|(key, value)| (key.into(), value.into()))
				.collect(),
		}
	}

	/// Snapshots the current process environment.
	///
	/// Variables whose name or value is not valid unicode are skipped.
	pub fn from_process_env() -> Self {
		Self::new(std::env::vars_os().filter_map(|(key, value)| {
			Some((key.into_string().ok()?, value.into_string().ok()?))
		}))
	}

	pub fn with_name(mut self, name: impl Into<String>) -> Self {
		self.name = name.into();
		self
	}

	pub fn with_namespace(mut self, namespace: KeyNamespace) -> Self {
		self.namespace = namespace;
		self
	}
}

#[async_trait]
impl ReadableStore for EnvStore {
	fn name(&self) -> &str {
		&self.name
	}

	fn get(&self, flag_name: &str) -> Option<FlagValue> {
		self.vars
			.get(&self.namespace.key(flag_name))
			.filter(|raw| !raw.is_empty())
			.map(|raw| FlagValue::parse_stored(raw))
	}

	async fn all(&self) -> Result<FlagMap> {
		Ok(self
			.namespace
			.collect(self.vars.keys(), |flag_name| self.get(flag_name)))
	}
}
