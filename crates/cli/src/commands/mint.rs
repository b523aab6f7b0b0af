//! Mint command.

use super::{load_config, open_storage, paint, resolve_account};
use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use hybridledger_chain::LedgerBook;
use hybridledger_core::{BlockType, Position};
use hybridledger_storage::BlockStore;
use std::path::PathBuf;

#[derive(Args)]
pub struct MintArgs {
    /// Directory to store ledger data
    #[arg(short, long, default_value = "./data")]
    data_dir: PathBuf,

    /// Position, "x,y" or "realm:x,y"
    position: String,

    /// Minting account (identity or display name)
    #[arg(short, long)]
    account: String,

    /// Block kind: minted, transaction, acquirement, locked or obfuscated
    #[arg(short, long, default_value = "minted")]
    kind: BlockType,

    /// Block payload; the amount spent for a transaction
    #[arg(long)]
    data: String,
}

pub fn run(args: MintArgs) -> Result<()> {
    let storage = open_storage(&args.data_dir)?;
    let config = load_config(&args.data_dir)?;
    let account = resolve_account(&storage, &args.account)?;

    let store = BlockStore::new(&storage);
    let book = LedgerBook::new(&store, config);
    let position = Position::from(args.position);

    println!("{}", "Minting block...".bold().cyan());
    println!();
    println!("  Position: {}", position.as_str().bright_yellow());
    println!("  Account:  {}", account.display_name.bright_cyan());
    println!("  Kind:     {}", args.kind.name());

    let mut ledger = book.load_ledger(&position)?;
    let reason = book
        .mint(&mut ledger, &account, args.kind, args.data)
        .with_context(|| format!("Failed to mint on {}", position))?;
    storage.flush()?;

    let block = ledger.last_block();
    println!();
    println!(
        "{}  Minted block #{} ({})",
        "✓".green().bold(),
        block.index,
        reason
    );
    println!("    Hash:       {}", block.hash().to_hex().bright_yellow());
    println!(
        "    Difficulty: {}",
        block.difficulty().to_string().bright_cyan()
    );
    println!(
        "    Owner:      {}",
        paint(ledger.ownership().as_str(), ledger.ownership())
    );
    println!(
        "    Ledger:     {} block(s), value {}",
        ledger.len().to_string().bright_cyan(),
        format!("{:.6}", ledger.value()).bright_cyan()
    );
    println!();

    Ok(())
}
