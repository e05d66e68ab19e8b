// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Flagg terminal admin binary.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use flagg::store::MEMORY_STORE_NAME;
use flagg::{
	FileWebStorage, FlagValue, Flagg, FlaggBuilder, FlaggConfig, InMemoryStore, MemoryWebStorage,
	Store, WebStorageStore, WriteOutcome,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod render;

/// Flagg - inspect and override feature flags.
#[derive(Parser, Debug)]
#[command(name = "flagg", about = "Inspect and override feature flags", version)]
struct Args {
	/// Configuration file (TOML, or JSON with a .json extension)
	#[arg(long, env = "FLAGG_CONFIG")]
	config: Option<PathBuf>,

	/// File backing the durable localStore
	#[arg(long, env = "FLAGG_STORAGE")]
	storage: Option<PathBuf>,

	/// Query string or URL to hydrate flags from
	#[arg(long)]
	url: Option<String>,

	/// Skip hydration from environment variables
	#[arg(long)]
	no_env: bool,

	#[command(subcommand)]
	command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
	/// List flags grouped by category
	List {
		/// Case-insensitive filter over flag names and descriptions
		#[arg(long, short)]
		search: Option<String>,

		/// Only show flags that differ from their default
		#[arg(long)]
		overridden: bool,
	},
	/// Print the effective value of a flag
	Get { name: String },
	/// Override a flag; VALUE is read as JSON, falling back to plain text
	Set { name: String, value: String },
	/// Reset one flag, or every flag, to its default
	Reset { name: Option<String> },
	/// Print a query string carrying every overridden flag
	Share,
	/// Print the flag definitions as JSON
	Definitions,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
	let args = Args::parse();

	tracing_subscriber::registry()
		.with(
			tracing_subscriber::EnvFilter::try_from_default_env()
				.unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
		)
		.with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
		.init();

	let config = load_config(&args)?;
	let (flagg, hydrated) = builder(&config)?
		.build_hydrated()
		.await
		.with_context(|| store_config_error(&args))?;
	if let Err(e) = hydrated {
		tracing::warn!(error = %e, "hydration incomplete");
	}

	run(&flagg, args.command)
}

fn load_config(args: &Args) -> anyhow::Result<FlaggConfig> {
	let mut config = match &args.config {
		Some(path) => FlaggConfig::load(path)
			.with_context(|| format!("failed to load config from {}", path.display()))?,
		None => match default_config_path().filter(|path| path.exists()) {
			Some(path) => FlaggConfig::load(&path)
				.with_context(|| format!("failed to load config from {}", path.display()))?,
			None => FlaggConfig::default(),
		},
	};

	if let Some(url) = &args.url {
		config.hydrate.url = Some(url.clone());
	}
	if args.no_env {
		config.hydrate.env = false;
	}
	if let Some(storage) = &args.storage {
		config.storage_path = Some(storage.clone());
	}
	Ok(config)
}

fn default_config_path() -> Option<PathBuf> {
	dirs::config_dir().map(|dir| dir.join("flagg").join("config.toml"))
}

fn default_storage_path() -> anyhow::Result<PathBuf> {
	let dir = dirs::data_local_dir().context("could not determine local data directory")?;
	Ok(dir.join("flagg").join("flags.json"))
}

/// Registers the durable `localStore`, `sessionStore` and `inMemoryStore`.
fn builder(config: &FlaggConfig) -> anyhow::Result<FlaggBuilder> {
	let storage_path = match &config.storage_path {
		Some(path) => path.clone(),
		None => default_storage_path()?,
	};
	let local = open_local(&storage_path)?;

	Ok(config
		.builder()
		.store(Store::read_write(
			WebStorageStore::local(local).with_namespace(config.namespace.clone()),
		))
		.store(Store::read_write(
			WebStorageStore::session(MemoryWebStorage::new())
				.with_namespace(config.namespace.clone()),
		))
		.store(Store::read_write(InMemoryStore::with_name(MEMORY_STORE_NAME))))
}

fn store_config_error(args: &Args) -> String {
	match &args.config {
		Some(path) => format!("invalid store configuration in {}", path.display()),
		None => "invalid store configuration".to_string(),
	}
}

fn open_local(path: &Path) -> anyhow::Result<FileWebStorage> {
	FileWebStorage::open(path)
		.with_context(|| format!("failed to open flag storage at {}", path.display()))
}

fn run(flagg: &Flagg, command: Command) -> anyhow::Result<()> {
	match command {
		Command::List { search, overridden } => {
			let catalog = flagg.catalog(search.as_deref().unwrap_or_default());
			print!("{}", render::catalog(&catalog, overridden));
		}
		Command::Get { name } => {
			println!("{}", flagg.get(&name).to_json_string());
		}
		Command::Set { name, value } => {
			let outcome = flagg.set(&name, FlagValue::parse_stored(&value));
			report(&name, outcome)?;
		}
		Command::Reset { name: Some(name) } => {
			let outcome = flagg.reset(&name);
			report(&name, outcome)?;
		}
		Command::Reset { name: None } => {
			let refused: Vec<_> = flagg
				.reset_all()
				.into_iter()
				.filter(|(_, outcome)| !outcome.is_applied())
				.map(|(name, _)| name)
				.collect();
			if !refused.is_empty() {
				bail!("could not reset: {}", refused.join(", "));
			}
		}
		Command::Share => {
			println!("?{}", flagg.share_query());
		}
		Command::Definitions => {
			println!("{}", serde_json::to_string_pretty(&*flagg.get_definitions())?);
		}
	}
	Ok(())
}

fn report(name: &str, outcome: WriteOutcome) -> anyhow::Result<()> {
	match outcome {
		WriteOutcome::Stored | WriteOutcome::Removed => Ok(()),
		WriteOutcome::Frozen => bail!("{name} is frozen"),
		WriteOutcome::ReadOnly => bail!("{name} lives in a read-only store"),
		WriteOutcome::Failed(message) => bail!("failed to write {name}: {message}"),
	}
}
