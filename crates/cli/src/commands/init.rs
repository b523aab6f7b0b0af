//! Initialize data directory command.

use super::save_config;
use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use hybridledger_chain::ChainConfig;
use hybridledger_core::{Account, Tier};
use hybridledger_policy::{CooldownConfig, DEFAULT_BASE_INTERVAL_MS};
use hybridledger_storage::{AccountStore, Storage};
use std::fs;
use std::path::PathBuf;

#[derive(Args)]
pub struct InitArgs {
    /// Directory to store ledger data
    #[arg(short, long, default_value = "./data")]
    data_dir: PathBuf,

    /// Cooldown per lifetime mint, in milliseconds
    #[arg(long, default_value_t = DEFAULT_BASE_INTERVAL_MS)]
    base_interval_ms: i64,

    /// Cooldown divisor for ordinary accounts
    #[arg(long, default_value_t = 1)]
    user_divisor: i64,

    /// Store a position's placeholder as soon as it is first viewed
    #[arg(long)]
    persist_placeholders: bool,

    /// Display name of the administrator account created alongside
    #[arg(long, default_value = "admin")]
    admin_name: String,
}

pub fn run(args: InitArgs) -> Result<()> {
    println!("{}", "Initializing hybridledger...".bold().cyan());
    println!();

    fs::create_dir_all(&args.data_dir)
        .with_context(|| format!("Failed to create data directory: {:?}", args.data_dir))?;

    let storage = Storage::open(&args.data_dir).with_context(|| "Failed to open storage")?;

    println!("{}  Created data directory", "✓".green().bold());

    let config = ChainConfig {
        cooldown: CooldownConfig::new(args.base_interval_ms, args.user_divisor),
        persist_placeholders: args.persist_placeholders,
        ..ChainConfig::default()
    };
    save_config(&args.data_dir, &config)?;
    println!(
        "{}  Saved config to: {}",
        "✓".green().bold(),
        args.data_dir
            .join("config.json")
            .display()
            .to_string()
            .bright_black()
    );

    let accounts = AccountStore::new(&storage);
    let admin = match accounts.find_by_name(&args.admin_name)? {
        Some(existing) => existing,
        None => {
            let admin = Account::new(args.admin_name.as_str(), Tier::Admin);
            accounts.put_account(&admin)?;
            admin
        }
    };
    storage.flush()?;

    println!(
        "{}  Administrator: {} {}",
        "✓".green().bold(),
        admin.display_name.bright_cyan(),
        admin.identity.as_str().bright_yellow()
    );

    println!();
    println!("{}", "Data directory initialized successfully!".green().bold());
    println!();
    println!("Next steps:");
    println!(
        "  • Use {} to create accounts",
        "hybridledger account new".bright_cyan()
    );
    println!(
        "  • Use {} to claim a position",
        "hybridledger mint".bright_cyan()
    );
    println!(
        "  • Use {} to look around",
        "hybridledger map".bright_cyan()
    );

    Ok(())
}
