// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Browse model for admin surfaces.
//!
//! Flags are grouped into categories by the part of their name before the
//! first separator (`app.darkMode` → category `app`, name `darkMode`).

use std::collections::BTreeMap;

use flagg_core::{ControlType, FlagDefinition, FlagValue};
use serde::Serialize;

use crate::Flagg;

pub const DEFAULT_CATEGORY_SEPARATOR: &str = ".";

/// Display name of the category holding flags without a separator.
pub const UNCATEGORIZED: &str = "Flags";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CatalogEntry {
	/// Full flag name.
	pub flag_name: String,
	/// Flag name without its category.
	pub name: String,
	pub description: Option<String>,
	pub control: ControlType,
	pub options: Vec<String>,
	pub value: FlagValue,
	pub default: FlagValue,
	pub overridden: bool,
	pub frozen: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CatalogCategory {
	/// Empty for uncategorized flags.
	pub name: String,
	pub entries: Vec<CatalogEntry>,
}

impl CatalogCategory {
	pub fn display_name(&self) -> &str {
		if self.name.is_empty() {
			UNCATEGORIZED
		} else {
			&self.name
		}
	}
}

pub(crate) fn build(flagg: &Flagg, search: &str, separator: &str) -> Vec<CatalogCategory> {
	let term = search.trim().to_lowercase();
	let definitions = flagg.get_definitions();

	let mut categories: BTreeMap<&str, Vec<CatalogEntry>> = BTreeMap::new();
	for (flag_name, definition) in definitions.iter() {
		if !matches_search(flag_name, definition, &term) {
			continue;
		}

		let (category, name) = split_name(flag_name, separator);
		categories.entry(category).or_default().push(CatalogEntry {
			flag_name: flag_name.to_owned(),
			name: name.to_owned(),
			description: definition.description.clone(),
			control: definition.control_type(),
			options: definition.options.clone().unwrap_or_default(),
			value: flagg.get(flag_name),
			default: definition.default_value(),
			overridden: flagg.is_overridden(flag_name),
			frozen: flagg.is_frozen(flag_name),
		});
	}

	categories
		.into_iter()
		.map(|(name, mut entries)| {
			entries.sort_by(|a, b| a.name.cmp(&b.name));
			CatalogCategory {
				name: name.to_owned(),
				entries,
			}
		})
		.collect()
}

fn matches_search(flag_name: &str, definition: &FlagDefinition, term: &str) -> bool {
	term.is_empty()
		|| flag_name.to_lowercase().contains(term)
		|| definition
			.description
			.as_deref()
			.is_some_and(|description| description.to_lowercase().contains(term))
}

fn split_name<'a>(flag_name: &'a str, separator: &str) -> (&'a str, &'a str) {
	if separator.is_empty() {
		return ("", flag_name);
	}
	flag_name.split_once(separator).unwrap_or(("", flag_name))
}
