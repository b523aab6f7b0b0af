//! Account management command.

use super::{format_timestamp, load_config, open_storage, paint, resolve_account};
use anyhow::{bail, Result};
use clap::{Args, Subcommand};
use colored::Colorize;
use hybridledger_chain::LedgerBook;
use hybridledger_core::{Account, Ownership, Tier};
use hybridledger_storage::{AccountStore, BlockStore, RecordStore};
use std::collections::BTreeSet;
use std::path::PathBuf;

#[derive(Args)]
pub struct AccountArgs {
    #[command(subcommand)]
    command: AccountCommand,
}

#[derive(Subcommand)]
enum AccountCommand {
    /// Register a new account
    New {
        /// Directory to store ledger data
        #[arg(short, long, default_value = "./data")]
        data_dir: PathBuf,

        /// Display name
        #[arg(short, long)]
        name: String,

        /// Tier: guest, user, moderator or admin
        #[arg(short, long, default_value = "user")]
        tier: Tier,
    },
    /// Show tier, cooldown and net value
    Info {
        /// Directory to store ledger data
        #[arg(short, long, default_value = "./data")]
        data_dir: PathBuf,

        /// Account identity or display name
        account: String,
    },
    /// List all accounts
    List {
        /// Directory to store ledger data
        #[arg(short, long, default_value = "./data")]
        data_dir: PathBuf,
    },
}

pub fn run(args: AccountArgs) -> Result<()> {
    match args.command {
        AccountCommand::New {
            data_dir,
            name,
            tier,
        } => new_account(data_dir, name, tier),
        AccountCommand::Info { data_dir, account } => show_info(data_dir, account),
        AccountCommand::List { data_dir } => list_accounts(data_dir),
    }
}

fn new_account(data_dir: PathBuf, name: String, tier: Tier) -> Result<()> {
    let storage = open_storage(&data_dir)?;
    let accounts = AccountStore::new(&storage);

    if accounts.find_by_name(&name)?.is_some() {
        bail!("An account named {} already exists", name);
    }

    let account = Account::new(name, tier);
    accounts.put_account(&account)?;
    storage.flush()?;

    println!("{}", "Registered new account:".bold().cyan());
    println!();
    println!("  Identity: {}", account.identity.as_str().bright_yellow());
    println!("  Name:     {}", account.display_name.bright_cyan());
    println!("  Tier:     {}", account.tier.label());
    println!();

    Ok(())
}

fn show_info(data_dir: PathBuf, key: String) -> Result<()> {
    let storage = open_storage(&data_dir)?;
    let config = load_config(&data_dir)?;
    let account = resolve_account(&storage, &key)?;

    let store = BlockStore::new(&storage);
    let book = LedgerBook::new(&store, config);

    let owned = store.find_owned_by(&account.identity)?;
    let positions: BTreeSet<&str> = owned.iter().map(|r| r.position.as_str()).collect();
    let cooldown = book.cooldown_remaining(&account)?;
    let net_value = book.net_value(&account)?;
    let ownership = Ownership::from(account.identity.clone());

    println!();
    println!("{}", "Account Information:".bold().cyan());
    println!();
    println!(
        "  Identity:     {}",
        paint(account.identity.as_str(), &ownership)
    );
    println!("  Name:         {}", account.display_name.bright_cyan());
    println!("  Tier:         {}", account.tier.label());
    println!(
        "  Created:      {}",
        format_timestamp(account.created_at).bright_black()
    );
    println!(
        "  Colors:       {}",
        ownership.colors().join(" ").bright_black()
    );
    println!("  Blocks:       {}", owned.len().to_string().bright_cyan());
    println!(
        "  Positions:    {}",
        positions.len().to_string().bright_cyan()
    );
    println!(
        "  Net Value:    {}",
        format!("{:.6}", net_value).bright_cyan()
    );
    println!(
        "  Cooldown:     {}",
        if account.is_guest() {
            "guests cannot mint".red()
        } else if cooldown > 0 {
            format!("{} ms", cooldown).yellow()
        } else {
            "ready".green()
        }
    );
    println!();

    Ok(())
}

fn list_accounts(data_dir: PathBuf) -> Result<()> {
    let storage = open_storage(&data_dir)?;
    let accounts = AccountStore::new(&storage).list_accounts()?;

    if accounts.is_empty() {
        println!("{}", "No accounts found.".yellow());
        println!(
            "Use {} to create one.",
            "hybridledger account new".bright_cyan()
        );
        return Ok(());
    }

    println!("{}", "Accounts:".bold().cyan());
    println!();
    for account in &accounts {
        let ownership = Ownership::from(account.identity.clone());
        println!(
            "  {} {} {}",
            paint(account.identity.as_str(), &ownership),
            account.display_name.bright_cyan(),
            format!("({})", account.tier.label()).bright_black()
        );
    }
    println!();

    Ok(())
}
