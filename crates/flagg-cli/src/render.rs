// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use std::fmt::Write;

use flagg::{CatalogCategory, CatalogEntry};

/// Renders the catalog as an indented listing, one flag per line.
pub fn catalog(categories: &[CatalogCategory], overridden_only: bool) -> String {
	let mut out = String::new();
	for category in categories {
		let entries: Vec<_> = category
			.entries
			.iter()
			.filter(|entry| !overridden_only || entry.overridden)
			.collect();
		if entries.is_empty() {
			continue;
		}

		let _ = writeln!(out, "{}", category.display_name());
		for entry in entries {
			let _ = writeln!(out, "  {}", line(entry));
		}
	}
	out
}

fn line(entry: &CatalogEntry) -> String {
	let mut line = format!(
		"{} = {} ({})",
		entry.name,
		entry.value.to_json_string(),
		entry.control
	);
	if entry.overridden {
		let _ = write!(line, " [default {}]", entry.default.to_json_string());
	}
	if entry.frozen {
		line.push_str(" [frozen]");
	}
	if !entry.options.is_empty() {
		let _ = write!(line, " options: {}", entry.options.join(", "));
	}
	if let Some(description) = &entry.description {
		let _ = write!(line, " - {description}");
	}
	line
}

#[cfg(test)]
mod tests {
	use super::*;
	use flagg::{DefinitionRegistry, FlagDefinition, Flagg, InMemoryStore, Store};

	fn flagg() -> Flagg {
		Flagg::builder()
			.store(Store::read_write(InMemoryStore::new()))
			.definitions(
				DefinitionRegistry::new()
					.with("app.darkMode", FlagDefinition::empty().with_default(false))
					.with(
						"app.brandColor",
						FlagDefinition::empty()
							.with_default("#6200ee")
							.with_options(["#6200ee", "#009688"]),
					)
					.with(
						"beta",
						FlagDefinition::empty().with_description("Beta features"),
					),
			)
			.build()
			.unwrap()
	}

	#[test]
	fn lists_every_flag() {
		let flagg = flagg();
		flagg.set("app.darkMode", true);
		flagg.freeze("app.darkMode");

		let out = catalog(&flagg.catalog(""), false);
		assert_eq!(
			out,
			"Flags\n\
			 \x20 beta = null (toggle) - Beta features\n\
			 app\n\
			 \x20 brandColor = \"#6200ee\" (select) options: #6200ee, #009688\n\
			 \x20 darkMode = true (toggle) [default false] [frozen]\n"
		);
	}

	#[test]
	fn overridden_only_drops_untouched_categories() {
		let flagg = flagg();
		flagg.set("app.brandColor", "#009688");

		let out = catalog(&flagg.catalog(""), true);
		assert_eq!(
			out,
			"app\n  brandColor = \"#009688\" (select) [default \"#6200ee\"] options: #6200ee, #009688\n"
		);
	}
}
