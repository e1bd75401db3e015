mod config;
mod db;
mod logging;
mod search;
mod table;
mod ui;
mod wallets;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Args, Parser, Subcommand, ValueEnum};
use tracing::{info, warn};

use config::Config;
use db::Database;
use table::pipeline::{derive_view, ViewSpec};
use table::SortSpec;
use ui::contacts;
use wallets::{CoinCode, Label, Wallets};

#[derive(Parser, Debug)]
#[command(name = "coinbook", about = "Address book for cryptocurrency wallets")]
struct Cli {
    /// Path to the configuration file
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Write a default configuration file
    Init(InitArgs),
    /// Print saved addresses (code<TAB>label<TAB>address)
    List(ListArgs),
    /// Save an address to a wallet's address book
    Add(AddArgs),
    /// Delete the first entry of a wallet with the given address
    Remove(RemoveArgs),
    /// Rename the first entry of a wallet with the given label
    Rename(RenameArgs),
    /// Print configured wallets (code<TAB>name)
    Wallets,
}

#[derive(Args, Debug)]
struct InitArgs {
    /// Overwrite an existing configuration
    #[arg(long, default_value_t = false)]
    force: bool,

    /// Database location written into the new configuration
    #[arg(long, value_name = "PATH")]
    db: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct ListArgs {
    /// Keep entries whose label or address contains this text
    query: Option<String>,

    /// Whitespace-separated tokens that must all appear in a row
    #[arg(long = "match", value_name = "TOKENS")]
    tokens: Option<String>,

    /// Order by a column, descending unless --asc is given
    #[arg(long, value_enum)]
    sort: Option<SortColumn>,

    /// With --sort, order ascending instead of descending
    #[arg(long, default_value_t = false)]
    asc: bool,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum SortColumn {
    Label,
    Coin,
    Address,
}

impl SortColumn {
    fn index(self) -> usize {
        match self {
            SortColumn::Label => contacts::LABEL_COLUMN,
            SortColumn::Coin => contacts::COIN_COLUMN,
            SortColumn::Address => contacts::ADDRESS_COLUMN,
        }
    }
}

#[derive(Args, Debug)]
struct AddArgs {
    #[arg(long, value_name = "CODE")]
    wallet: String,

    #[arg(long)]
    label: String,

    #[arg(value_name = "ADDRESS")]
    address: String,
}

#[derive(Args, Debug)]
struct RemoveArgs {
    #[arg(long, value_name = "CODE")]
    wallet: String,

    #[arg(value_name = "ADDRESS")]
    address: String,
}

#[derive(Args, Debug)]
struct RenameArgs {
    #[arg(long, value_name = "CODE")]
    wallet: String,

    /// Current label
    #[arg(long, value_name = "OLD")]
    label: String,

    #[arg(value_name = "NEW")]
    new_label: String,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // A missing log directory must not keep the address book from opening.
    let _log_guard = match logging::init() {
        Ok(guard) => Some(guard),
        Err(err) => {
            eprintln!("warning: logging disabled: {:#}", err);
            None
        }
    };

    if let Some(Command::Init(args)) = &cli.command {
        return handle_init(cli.config.as_deref(), args);
    }

    let config = config::load(cli.config.as_deref())?;
    info!(path = %config.config_path.display(), "loaded configuration");
    let mut wallets = open_wallets(&config)?;

    match cli.command {
        None => {
            let mut app = ui::app::App::new(&mut wallets, &config);
            app.run()?;
        }
        Some(Command::Init(_)) => {}
        Some(Command::List(args)) => handle_list(&wallets, args),
        Some(Command::Add(args)) => handle_add(&mut wallets, args)?,
        Some(Command::Remove(args)) => handle_remove(&mut wallets, args)?,
        Some(Command::Rename(args)) => handle_rename(&mut wallets, args)?,
        Some(Command::Wallets) => {
            for wallet in wallets.iter() {
                println!("{}\t{}", wallet.code, wallet.name);
            }
        }
    }

    Ok(())
}

fn open_wallets(config: &Config) -> Result<Wallets> {
    let db = Database::open(&config.db_path)?;
    Ok(Wallets::open(db, &config.wallet_pairs())?)
}

fn handle_init(config_path: Option<&std::path::Path>, args: &InitArgs) -> Result<()> {
    let path = config::write_default(config_path, args.db.as_deref(), args.force)?;
    info!(path = %path.display(), "wrote default configuration");
    println!("Wrote configuration to {}", path.display());
    Ok(())
}

fn handle_list(wallets: &Wallets, args: ListArgs) {
    let entries = contacts::collect_entries(wallets, args.query.as_deref().unwrap_or(""));

    let spec = ViewSpec {
        sort: args.sort.map(|column| {
            if args.asc {
                SortSpec::ascending(column.index())
            } else {
                SortSpec::descending(column.index())
            }
        }),
        filter: args.tokens.unwrap_or_default(),
        page: None,
    };
    let columns = contacts::columns(None);
    let visible = derive_view(&columns, &entries, &spec);

    // Header line, then code<TAB>label<TAB>address
    if visible.is_empty() {
        println!("No contacts");
    } else {
        println!("Found {} contact(s)", visible.len());
    }
    for index in visible {
        let entry = &entries[index];
        println!(
            "{}\t{}\t{}",
            entry.code, entry.address_book.label, entry.address_book.address
        );
    }
}

fn handle_add(wallets: &mut Wallets, args: AddArgs) -> Result<()> {
    let code = CoinCode::new(&args.wallet);
    let saved = wallets.save_to_address_book(
        &code,
        Label {
            label: args.label,
            address: args.address,
        },
    )?;
    println!("Saved {} to {}", saved.label, code);
    Ok(())
}

fn handle_remove(wallets: &mut Wallets, args: RemoveArgs) -> Result<()> {
    let code = CoinCode::new(&args.wallet);
    let removed = wallets.remove_address(&code, &args.address)?;
    println!("Removed {} ({}) from {}", removed.label, removed.address, code);
    Ok(())
}

fn handle_rename(wallets: &mut Wallets, args: RenameArgs) -> Result<()> {
    let code = CoinCode::new(&args.wallet);
    if let Err(err) = wallets.rename_label(&code, &args.label, &args.new_label) {
        warn!(error = %err, "rename failed");
        return Err(err.into());
    }
    println!("Renamed {} to {} in {}", args.label, args.new_label, code);
    Ok(())
}
