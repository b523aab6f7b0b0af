//! CLI commands module.

use anyhow::{bail, Context, Result};
use clap::Subcommand;
use colored::{ColoredString, Colorize};
use hybridledger_chain::ChainConfig;
use hybridledger_core::{Account, AccountId, BlockType, Ownership};
use hybridledger_policy::{CooldownConfig, DifficultyTable};
use hybridledger_storage::{AccountStore, Storage};
use std::fs;
use std::path::Path;

mod account;
mod init;
mod ledger;
mod map;
mod mint;

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize a data directory
    Init(init::InitArgs),
    /// Account management
    Account(account::AccountArgs),
    /// Inspect and maintain ledgers
    Ledger(ledger::LedgerArgs),
    /// Mint a block on a position
    Mint(mint::MintArgs),
    /// Render ledger ownership over a rectangle of positions
    Map(map::MapArgs),
}

pub fn run(cmd: Commands) -> Result<()> {
    match cmd {
        Commands::Init(args) => init::run(args),
        Commands::Account(args) => account::run(args),
        Commands::Ledger(args) => ledger::run(args),
        Commands::Mint(args) => mint::run(args),
        Commands::Map(args) => map::run(args),
    }
}

const CONFIG_FILE: &str = "config.json";

/// Open the store of an initialized data directory.
fn open_storage(data_dir: &Path) -> Result<Storage> {
    if !data_dir.join(CONFIG_FILE).exists() {
        bail!(
            "No {} in {}. Did you run 'hybridledger init'?",
            CONFIG_FILE,
            data_dir.display()
        );
    }
    Storage::open(data_dir).with_context(|| "Failed to open storage")
}

/// Write `config` as `config.json` in `data_dir`.
fn save_config(data_dir: &Path, config: &ChainConfig) -> Result<()> {
    let difficulty: serde_json::Map<String, serde_json::Value> = BlockType::ALL
        .iter()
        .map(|kind| {
            (
                kind.name().to_string(),
                serde_json::Value::from(config.difficulty.of(*kind)),
            )
        })
        .collect();

    let config_json = serde_json::json!({
        "base_interval_ms": config.cooldown.base_interval_ms,
        "user_divisor": config.cooldown.user_divisor,
        "persist_placeholders": config.persist_placeholders,
        "difficulty": difficulty,
    });

    let config_file = data_dir.join(CONFIG_FILE);
    fs::write(&config_file, serde_json::to_string_pretty(&config_json)?)
        .with_context(|| format!("Failed to write {}", config_file.display()))
}

/// Read `config.json` back, falling back to defaults for missing keys.
fn load_config(data_dir: &Path) -> Result<ChainConfig> {
    let config_file = data_dir.join(CONFIG_FILE);
    let contents = fs::read_to_string(&config_file)
        .context("Failed to read config.json. Did you run 'hybridledger init'?")?;

    let json: serde_json::Value = serde_json::from_str(&contents)?;
    let defaults = CooldownConfig::default();

    let base_interval_ms = json
        .get("base_interval_ms")
        .and_then(|v| v.as_i64())
        .unwrap_or(defaults.base_interval_ms);
    let user_divisor = json
        .get("user_divisor")
        .and_then(|v| v.as_i64())
        .unwrap_or(defaults.user_divisor);
    let persist_placeholders = json
        .get("persist_placeholders")
        .and_then(|v| v.as_bool())
        .unwrap_or(false);

    let mut difficulty = DifficultyTable::default();
    if let Some(levels) = json.get("difficulty").and_then(|v| v.as_object()) {
        for kind in BlockType::ALL {
            if let Some(level) = levels.get(kind.name()).and_then(|v| v.as_u64()) {
                let level = u32::try_from(level)
                    .with_context(|| format!("Difficulty for {} is too large", kind))?;
                difficulty.set(kind, level);
            }
        }
    }

    Ok(ChainConfig {
        difficulty,
        cooldown: CooldownConfig::new(base_interval_ms, user_divisor),
        persist_placeholders,
    })
}

/// Find an account by identity, falling back to display name.
fn resolve_account(storage: &Storage, key: &str) -> Result<Account> {
    let accounts = AccountStore::new(storage);
    if let Some(account) = accounts.get_account(&AccountId::from(key))? {
        return Ok(account);
    }
    accounts.find_by_name(key)?.with_context(|| {
        format!(
            "Unknown account: {}. Use 'hybridledger account list' to see accounts.",
            key
        )
    })
}

/// Paint `text` in an owner's primary colour.
fn paint(text: &str, ownership: &Ownership) -> ColoredString {
    let [primary, _] = ownership.colors();
    match parse_rgb(&primary) {
        Some((r, g, b)) => text.truecolor(r, g, b),
        None => text.normal(),
    }
}

fn parse_rgb(color: &str) -> Option<(u8, u8, u8)> {
    let hex = color.strip_prefix('#')?;
    if hex.len() != 6 {
        return None;
    }
    let channel = |range: std::ops::Range<usize>| {
        hex.get(range)
            .and_then(|part| u8::from_str_radix(part, 16).ok())
    };
    Some((channel(0..2)?, channel(2..4)?, channel(4..6)?))
}

/// Render a millisecond timestamp for humans.
fn format_timestamp(ms: i64) -> String {
    chrono::DateTime::<chrono::Utc>::from_timestamp_millis(ms)
        .map(|at| at.format("%Y-%m-%d %H:%M:%S UTC").to_string())
        .unwrap_or_else(|| ms.to_string())
}
