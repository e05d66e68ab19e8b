// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! File-based resolver configuration.
//!
//! ```toml
//! default_store = "localStore"
//! category_separator = "."
//!
//! [namespace]
//! prefix = "ff"
//! delimiter = "_"
//!
//! [hydrate]
//! env = true
//! url = "?ff={\"app.darkMode\":true}"
//!
//! [definitions."app.darkMode"]
//! default = false
//! description = "Dark mode"
//! ```
//!
//! Files ending in `.json` are read as JSON with the same shape; anything
//! else is read as TOML.

use std::path::{Path, PathBuf};

use flagg_core::{DefinitionRegistry, KeyNamespace};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::catalog::DEFAULT_CATEGORY_SEPARATOR;
use crate::client::FlaggBuilder;
use crate::store::{EnvStore, UrlStore};
use crate::Flagg;

/// Errors that can occur while loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
	#[error("I/O error reading {path}: {source}")]
	Io {
		path: PathBuf,
		#[source]
		source: std::io::Error,
	},

	#[error("TOML parse error in {path}: {source}")]
	TomlParse {
		path: PathBuf,
		#[source]
		source: toml::de::Error,
	},

	#[error("JSON parse error in {path}: {source}")]
	JsonParse {
		path: PathBuf,
		#[source]
		source: serde_json::Error,
	},

	#[error("Validation error: {0}")]
	Validation(String),
}

impl ConfigError {
	pub fn validation(msg: impl Into<String>) -> Self {
		Self::Validation(msg.into())
	}
}

/// Read-only sources applied on [`Flagg::hydrate`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HydrateConfig {
	/// Hydrate from namespaced process environment variables.
	pub env: bool,
	/// Query string or URL carrying flags in the namespace prefix parameter.
	pub url: Option<String>,
}

impl Default for HydrateConfig {
	fn default() -> Self {
		Self {
			env: true,
			url: None,
		}
	}
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FlaggConfig {
	pub namespace: KeyNamespace,
	pub default_store: Option<String>,
	/// File backing the durable `localStore`.
	pub storage_path: Option<PathBuf>,
	pub category_separator: String,
	pub hydrate: HydrateConfig,
	pub definitions: DefinitionRegistry,
}

impl Default for FlaggConfig {
	fn default() -> Self {
		Self {
			namespace: KeyNamespace::default(),
			default_store: None,
			storage_path: None,
			category_separator: DEFAULT_CATEGORY_SEPARATOR.to_string(),
			hydrate: HydrateConfig::default(),
			definitions: DefinitionRegistry::new(),
		}
	}
}

impl FlaggConfig {
	/// Loads and validates a configuration file.
	pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
		let path = path.as_ref();
		debug!(path = %path.display(), "loading flagg config");

		let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
			path: path.to_path_buf(),
			source: e,
		})?;

		let config: Self = if is_json(path) {
			serde_json::from_str(&content).map_err(|e| ConfigError::JsonParse {
				path: path.to_path_buf(),
				source: e,
			})?
		} else {
			toml::from_str(&content).map_err(|e| ConfigError::TomlParse {
				path: path.to_path_buf(),
				source: e,
			})?
		};

		config.validate()?;
		Ok(config)
	}

	/// Parses and validates TOML text.
	pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
		let config: Self = toml::from_str(content).map_err(|e| ConfigError::TomlParse {
			path: PathBuf::from("<inline>"),
			source: e,
		})?;
		config.validate()?;
		Ok(config)
	}

	pub fn validate(&self) -> Result<(), ConfigError> {
		if self.namespace.prefix.is_empty() {
			return Err(ConfigError::validation("namespace prefix must not be empty"));
		}
		if self.namespace.delimiter.is_empty() {
			return Err(ConfigError::validation(
				"namespace delimiter must not be empty",
			));
		}
		if self.default_store.as_deref() == Some("") {
			return Err(ConfigError::validation("default_store must not be empty"));
		}
		Ok(())
	}

	/// Starts a [`Flagg`] builder with definitions, namespace and hydration
	/// sources taken from this configuration. Stores are left to the caller.
	pub fn builder(&self) -> FlaggBuilder {
		let mut builder = Flagg::builder()
			.definitions(self.definitions.clone())
			.namespace(self.namespace.clone())
			.category_separator(self.category_separator.clone());

		if let Some(name) = &self.default_store {
			builder = builder.default_store(name.clone());
		}
		if self.hydrate.env {
			builder = builder
				.hydrate_from(EnvStore::from_process_env().with_namespace(self.namespace.clone()));
		}
		if let Some(url) = &self.hydrate.url {
			builder = builder.hydrate_from(UrlStore::parse_param(url, &self.namespace.prefix));
		}
		builder
	}
}

fn is_json(path: &Path) -> bool {
	path
		.extension()
		.and_then(|ext| ext.to_str())
		.is_some_and(|ext| ext.eq_ignore_ascii_case("json"))
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::store::{InMemoryStore, Store};
	use flagg_core::{ControlType, FlagValue};
	use std::io::Write;

	const SAMPLE: &str = r##"
default_store = "scratch"
category_separator = "/"

[namespace]
prefix = "flags"
delimiter = "__"

[hydrate]
env = false
url = "?flags=%7B%22app%2Ftitle%22%3A%22From+URL%22%7D"

[definitions."app/title"]
default = "InstaSnap"

[definitions."app/color"]
default = "#6200ee"
options = ["#6200ee", "#009688"]
"##;

	#[test]
	fn defaults() {
		let config = FlaggConfig::default();
		assert_eq!(config.namespace, KeyNamespace::default());
		assert_eq!(config.category_separator, ".");
		assert!(config.hydrate.env);
		assert!(config.hydrate.url.is_none());
		assert!(config.definitions.is_empty());
		assert!(config.validate().is_ok());
	}

	#[test]
	fn empty_toml_is_default() {
		assert_eq!(FlaggConfig::from_toml_str("").unwrap(), FlaggConfig::default());
	}

	#[test]
	fn parses_toml() {
		let config = FlaggConfig::from_toml_str(SAMPLE).unwrap();
		assert_eq!(config.default_store.as_deref(), Some("scratch"));
		assert_eq!(config.namespace, KeyNamespace::new("flags", "__"));
		assert!(!config.hydrate.env);
		assert_eq!(config.definitions.len(), 2);
		assert_eq!(
			config.definitions.get_or_empty("app/color").control_type(),
			ControlType::Select
		);
	}

	#[test]
	fn rejects_empty_namespace() {
		let err = FlaggConfig::from_toml_str("[namespace]\nprefix = \"\"\n").unwrap_err();
		assert!(matches!(err, ConfigError::Validation(_)));

		let err = FlaggConfig::from_toml_str("[namespace]\ndelimiter = \"\"\n").unwrap_err();
		assert!(matches!(err, ConfigError::Validation(_)));
	}

	#[test]
	fn rejects_malformed_toml() {
		let err = FlaggConfig::from_toml_str("default_store = [").unwrap_err();
		assert!(matches!(err, ConfigError::TomlParse { .. }));
	}

	#[test]
	fn loads_json_by_extension() {
		let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
		write!(
			file,
			r#"{{"definitions": {{"developer.debug": {{"default": true}}}}, "hydrate": {{"env": false}}}}"#
		)
		.unwrap();

		let config = FlaggConfig::load(file.path()).unwrap();
		assert_eq!(
			config.definitions.get_or_empty("developer.debug").default_value(),
			FlagValue::Bool(true)
		);
		assert!(!config.hydrate.env);
	}

	#[test]
	fn load_reports_path_on_error() {
		let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
		write!(file, "{{").unwrap();
		let err = FlaggConfig::load(file.path()).unwrap_err();
		assert!(matches!(err, ConfigError::JsonParse { ref path, .. } if path == file.path()));

		let missing = file.path().with_extension("missing");
		assert!(matches!(
			FlaggConfig::load(&missing).unwrap_err(),
			ConfigError::Io { .. }
		));
	}

	#[tokio::test]
	async fn builder_wires_definitions_and_sources() {
		let config = FlaggConfig::from_toml_str(SAMPLE).unwrap();
		let flagg = config
			.builder()
			.store(Store::read_write(InMemoryStore::new()))
			.store(Store::read_write(InMemoryStore::with_name("scratch")))
			.build()
			.unwrap();

		assert_eq!(flagg.default_store_name(), "scratch");
		assert_eq!(flagg.get("app/title"), FlagValue::from("InstaSnap"));

		flagg.hydrate().await.unwrap();
		assert_eq!(flagg.get("app/title"), FlagValue::from("From URL"));
		assert_eq!(flagg.catalog("")[0].name, "app");
		assert!(flagg.share_query().starts_with("flags="));
	}
}
