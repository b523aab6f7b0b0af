//! Ownership map command.

use super::{open_storage, paint};
use anyhow::{bail, Result};
use clap::Args;
use colored::Colorize;
use hybridledger_core::{pick, BlockType, Ownership, Position, DEFAULT_REALM, UNOWNED};
use hybridledger_storage::{AccountStore, BlockRecord, BlockStore, RecordStore, Storage};
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Terrain shown on positions nobody has minted.
const TERRAIN: [char; 4] = ['.', '-', '+', 'o'];

/// Marker for a position with stored history.
const CLAIMED: &str = "█";

#[derive(Args)]
pub struct MapArgs {
    /// Directory to store ledger data
    #[arg(short, long, default_value = "./data")]
    data_dir: PathBuf,

    /// Realm to render
    #[arg(short, long, default_value = DEFAULT_REALM)]
    realm: String,

    /// Left column
    #[arg(long, default_value_t = 0, allow_negative_numbers = true)]
    x0: i64,

    /// Top row
    #[arg(long, default_value_t = 0, allow_negative_numbers = true)]
    y0: i64,

    /// Columns to render
    #[arg(long, default_value_t = 16)]
    width: u32,

    /// Rows to render
    #[arg(long, default_value_t = 8)]
    height: u32,
}

pub fn run(args: MapArgs) -> Result<()> {
    if args.width == 0 || args.height == 0 {
        bail!("Map needs a width and height of at least 1");
    }

    let storage = open_storage(&args.data_dir)?;
    let store = BlockStore::new(&storage);

    println!();
    println!(
        "{} {} from ({}, {})",
        "Realm".bold().cyan(),
        args.realm.bright_yellow(),
        args.x0,
        args.y0
    );
    println!();

    let mut owners: BTreeMap<String, usize> = BTreeMap::new();
    for y in args.y0..args.y0 + i64::from(args.height) {
        let mut row = String::new();
        for x in args.x0..args.x0 + i64::from(args.width) {
            let position = Position::in_realm(&args.realm, x, y);
            let cell = match current_owner(&store, &position)? {
                Some(ownership) => {
                    if let Some(id) = ownership.account() {
                        *owners.entry(id.to_string()).or_default() += 1;
                    }
                    paint(CLAIMED, &ownership).to_string()
                }
                None => terrain(&position).to_string().bright_black().to_string(),
            };
            row.push_str(&cell);
        }
        println!("  {}", row);
    }
    println!();

    print_legend(&storage, &owners)?;
    Ok(())
}

/// Owner of the highest-index stored block.
///
/// `None` for a blank position, including one that only holds a stored
/// unowned Empty placeholder.
fn current_owner(store: &BlockStore, position: &Position) -> Result<Option<Ownership>> {
    let records: Vec<BlockRecord> = store.find_by_position(position)?;
    Ok(records
        .into_iter()
        .max_by_key(|record| record.index)
        .filter(|record| {
            record.block_type != BlockType::Empty.as_u8() || record.ownership != UNOWNED
        })
        .map(|record| Ownership::parse(&record.ownership)))
}

/// Deterministic terrain glyph for a blank position.
fn terrain(position: &Position) -> char {
    pick(position.as_str(), &TERRAIN).copied().unwrap_or(TERRAIN[0])
}

fn print_legend(storage: &Storage, owners: &BTreeMap<String, usize>) -> Result<()> {
    if owners.is_empty() {
        println!("  {}", "Nothing claimed here yet.".bright_black());
        println!();
        return Ok(());
    }

    let accounts = AccountStore::new(storage);
    println!("{}", "Owners:".bold());
    for (identity, cells) in owners {
        let ownership = Ownership::parse(identity);
        let name = match ownership.account() {
            Some(id) => accounts
                .get_account(id)?
                .map(|account| account.display_name)
                .unwrap_or_else(|| identity.clone()),
            None => identity.clone(),
        };
        println!(
            "  {} {} {}",
            paint(CLAIMED, &ownership),
            name.bright_cyan(),
            format!("({} cell(s))", cells).bright_black()
        );
    }
    println!();

    Ok(())
}
