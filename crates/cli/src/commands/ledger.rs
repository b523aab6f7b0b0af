//! Ledger inspection and maintenance command.

use super::{format_timestamp, load_config, open_storage, paint, resolve_account};
use anyhow::Result;
use clap::{Args, Subcommand};
use colored::Colorize;
use hybridledger_chain::LedgerBook;
use hybridledger_core::{current_timestamp, AccountId, Block, Ledger, Position};
use hybridledger_storage::{BlockRecord, BlockStore};
use std::path::PathBuf;

/// Shown in place of payloads the viewer may not read.
const HIDDEN: &str = "<obfuscated>";

#[derive(Args)]
pub struct LedgerArgs {
    #[command(subcommand)]
    command: LedgerCommand,
}

#[derive(Subcommand)]
enum LedgerCommand {
    /// Show every block of a position
    Show {
        /// Directory to store ledger data
        #[arg(short, long, default_value = "./data")]
        data_dir: PathBuf,

        /// Position, "x,y" or "realm:x,y"
        position: String,

        /// View as this account (identity or name); reveals its obfuscated blocks
        #[arg(long = "as")]
        viewer: Option<String>,

        /// Print the stored records as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show the current value of a position
    Value {
        /// Directory to store ledger data
        #[arg(short, long, default_value = "./data")]
        data_dir: PathBuf,

        /// Position, "x,y" or "realm:x,y"
        position: String,
    },
    /// Relink and re-mine a position after an out-of-band edit
    Repair {
        /// Directory to store ledger data
        #[arg(short, long, default_value = "./data")]
        data_dir: PathBuf,

        /// Position, "x,y" or "realm:x,y"
        position: String,
    },
}

pub fn run(args: LedgerArgs) -> Result<()> {
    match args.command {
        LedgerCommand::Show {
            data_dir,
            position,
            viewer,
            json,
        } => show_ledger(data_dir, position, viewer, json),
        LedgerCommand::Value { data_dir, position } => show_value(data_dir, position),
        LedgerCommand::Repair { data_dir, position } => repair_ledger(data_dir, position),
    }
}

fn show_ledger(
    data_dir: PathBuf,
    position: String,
    viewer: Option<String>,
    json: bool,
) -> Result<()> {
    let storage = open_storage(&data_dir)?;
    let config = load_config(&data_dir)?;
    let viewer = match viewer {
        Some(key) => Some(resolve_account(&storage, &key)?.identity),
        None => None,
    };

    let store = BlockStore::new(&storage);
    let book = LedgerBook::new(&store, config);
    let ledger = book.load_ledger(&Position::from(position))?;

    if json {
        let records: Vec<BlockRecord> = ledger
            .blocks()
            .iter()
            .map(|block| {
                let mut record = BlockRecord::from(block);
                record.data = visible(block, viewer.as_ref()).to_string();
                record
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&records)?);
        return Ok(());
    }

    let now = current_timestamp();
    print_summary(&ledger, now);

    println!("{}", "Blocks:".bold());
    println!();
    for block in ledger.blocks() {
        println!(
            "  {} {} {}",
            format!("#{}", block.index).bright_black(),
            block.block_type.name().bold(),
            paint(block.ownership.as_str(), &block.ownership)
        );
        println!("      Hash:        {}", block.hash().to_hex().bright_yellow());
        println!(
            "      Previous:    {}",
            block.previous_hash_str().bright_black()
        );
        println!(
            "      Difficulty:  {}  Mints: {}  Nonce: {}",
            block.difficulty().to_string().bright_cyan(),
            block.mint_count.to_string().bright_cyan(),
            block.nonce.to_string().bright_cyan()
        );
        println!(
            "      Value:       {}",
            format!("{:.6}", block.value_at(now)).bright_cyan()
        );
        println!(
            "      Minted:      {}",
            format_timestamp(block.timestamp).bright_black()
        );
        println!("      Data:        {}", visible(block, viewer.as_ref()));
        let references = block.references();
        if !references.is_empty() {
            println!("      References:  {}", references.join(", ").bright_black());
        }
        println!();
    }

    Ok(())
}

fn show_value(data_dir: PathBuf, position: String) -> Result<()> {
    let storage = open_storage(&data_dir)?;
    let config = load_config(&data_dir)?;
    let store = BlockStore::new(&storage);
    let book = LedgerBook::new(&store, config);

    let ledger = book.load_ledger(&Position::from(position))?;
    print_summary(&ledger, current_timestamp());

    Ok(())
}

fn repair_ledger(data_dir: PathBuf, position: String) -> Result<()> {
    let storage = open_storage(&data_dir)?;
    let config = load_config(&data_dir)?;
    let store = BlockStore::new(&storage);
    let book = LedgerBook::new(&store, config);

    println!("{}", "Repairing ledger...".bold().cyan());
    println!();

    let mut ledger = book.load_ledger(&Position::from(position))?;
    let was_pristine = ledger.check_pristine();
    let updated = book.repair(&mut ledger)?;
    storage.flush()?;

    println!(
        "{}  Re-mined {} block(s)",
        "✓".green().bold(),
        updated.to_string().bright_cyan()
    );
    println!(
        "    Pristine: {} → {}",
        pristine_mark(was_pristine),
        pristine_mark(ledger.check_pristine())
    );
    println!();

    Ok(())
}

fn print_summary(ledger: &Ledger, now: i64) {
    println!();
    println!("{}", "Ledger Information:".bold().cyan());
    println!();
    println!("  Position:  {}", ledger.position().as_str().bright_yellow());
    println!("  Realm:     {}", ledger.realm());
    println!("  Cell:      {}", ledger.position().coordinate());
    println!(
        "  Owner:     {}",
        paint(ledger.ownership().as_str(), ledger.ownership())
    );
    println!("  Blocks:    {}", ledger.len().to_string().bright_cyan());
    println!("  Pristine:  {}", pristine_mark(ledger.check_pristine()));
    println!(
        "  Value:     {}",
        format!("{:.6}", ledger.value_at(now)).bright_cyan()
    );
    println!();
}

fn pristine_mark(pristine: bool) -> colored::ColoredString {
    if pristine {
        "✓".green().bold()
    } else {
        "✗".red().bold()
    }
}

fn visible<'b>(block: &'b Block, viewer: Option<&AccountId>) -> &'b str {
    block.visible_data(viewer).unwrap_or(HIDDEN)
}
