// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::FlagValue;

static EMPTY_DEFINITION: FlagDefinition = FlagDefinition::empty();

/// Static metadata for a single flag.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FlagDefinition {
	/// What the flag is for.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub description: Option<String>,
	/// Name of the store backing this flag. `None` means the default store.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub store: Option<String>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub default: Option<FlagValue>,
	/// Choices offered by admin surfaces. Does not constrain writes.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub options: Option<Vec<String>>,
}

impl FlagDefinition {
	pub const fn empty() -> Self {
		Self {
			description: None,
			store: None,
			default: None,
			options: None,
		}
	}

	pub fn with_description(mut self, description: impl Into<String>) -> Self {
		self.description = Some(description.into());
		self
	}

	pub fn with_store(mut self, store: impl Into<String>) -> Self {
		self.store = Some(store.into());
		self
	}

	pub fn with_default(mut self, default: impl Into<FlagValue>) -> Self {
		self.default = Some(default.into());
		self
	}

	pub fn with_options<I, S>(mut self, options: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		self.options = Some(options.into_iter().map(Into::into).collect());
		self
	}

	/// The default value, `null` when none is defined.
	pub fn default_value(&self) -> FlagValue {
		self.default.clone().unwrap_or(FlagValue::Null)
	}

	pub fn control_type(&self) -> ControlType {
		if self.options.is_some() {
			ControlType::Select
		} else if matches!(self.default, Some(FlagValue::String(_))) {
			ControlType::Input
		} else {
			ControlType::Toggle
		}
	}
}

/// The editing control a flag is presented with, inferred from its
/// definition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ControlType {
	/// Pick one of the definition's `options`.
	Select,
	/// Free text; the default is a string.
	Input,
	/// On/off; everything else.
	Toggle,
}

impl ControlType {
	pub fn as_str(&self) -> &'static str {
		match self {
			ControlType::Select => "select",
			ControlType::Input => "input",
			ControlType::Toggle => "toggle",
		}
	}
}

impl std::fmt::Display for ControlType {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.write_str(self.as_str())
	}
}

/// Flag name to definition mapping.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DefinitionRegistry {
	definitions: BTreeMap<String, FlagDefinition>,
}

impl DefinitionRegistry {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn with(mut self, flag_name: impl Into<String>, definition: FlagDefinition) -> Self {
		self.insert(flag_name, definition);
		self
	}

	pub fn insert(
		&mut self,
		flag_name: impl Into<String>,
		definition: FlagDefinition,
	) -> Option<FlagDefinition> {
		self.definitions.insert(flag_name.into(), definition)
	}

	pub fn get(&self, flag_name: &str) -> Option<&FlagDefinition> {
		self.definitions.get(flag_name)
	}

	/// Looks up a definition, treating unknown flags as having an empty one.
	pub fn get_or_empty(&self, flag_name: &str) -> &FlagDefinition {
		self.definitions.get(flag_name).unwrap_or(&EMPTY_DEFINITION)
	}

	pub fn contains(&self, flag_name: &str) -> bool {
		self.definitions.contains_key(flag_name)
	}

	pub fn names(&self) -> impl Iterator<Item = &str> {
		self.definitions.keys().map(String::as_str)
	}

	pub fn iter(&self) -> impl Iterator<Item = (&str, &FlagDefinition)> {
		self.definitions.iter().map(|(name, def)| (name.as_str(), def))
	}

	pub fn len(&self) -> usize {
		self.definitions.len()
	}

	pub fn is_empty(&self) -> bool {
		self.definitions.is_empty()
	}
}

impl<K: Into<String>> FromIterator<(K, FlagDefinition)> for DefinitionRegistry {
	fn from_iter<T: IntoIterator<Item = (K, FlagDefinition)>>(iter: T) -> Self {
		Self {
			definitions: iter
				.into_iter()
				.map(|(name, def)| (name.into(), def))
				.collect(),
		}
	}
}
