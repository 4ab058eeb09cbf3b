use adledger::{AppConfig, Booking, LedgerStore, Menu, NewBooking, SearchOutcome, table};
use chrono::NaiveDate;
use clap::{ArgAction, Parser, Subcommand};
use colored::Colorize;
use eyre::{Result, eyre};
use std::io;
use std::path::PathBuf;
use tracing::Level;

#[derive(Parser)]
#[command(name = "adledger")]
#[command(about = "Ad campaign booking ledger kept in a CSV file")]
#[command(version = env!("GIT_DESCRIBE"))]
struct Cli {
    /// Ledger CSV file (default: from config, else the platform data directory)
    #[arg(short, long, global = true)]
    file: Option<PathBuf>,

    /// Config file (default: <config dir>/adledger/config.yml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Print result sets as JSON instead of tables
    #[arg(long, global = true)]
    json: bool,

    /// Log more (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the ledger file with its header row
    Init,

    /// Append a booking
    Add {
        customer: String,
        title: String,
        manufacturer: String,
        /// Airing date, YYYY-MM-DD
        date: String,
        cost: String,
    },

    /// List all bookings
    List,

    /// Delete a booking by its 1-based number in the listing
    Delete { number: usize },

    /// Bookings whose field equals a value
    Search { field: String, value: String },

    /// Bookings matching two field/value pairs
    Search2 {
        field1: String,
        value1: String,
        field2: String,
        value2: String,
    },

    /// Delete bookings dated before today
    Prune {
        /// Use this date as today (YYYY-MM-DD)
        #[arg(long)]
        today: Option<NaiveDate>,
    },

    /// Multiply a customer's booking costs (default factor from config, 1.10)
    Raise {
        customer: String,
        #[arg(long)]
        factor: Option<f64>,
    },

    /// Bookings airing on a date
    OnDate { date: String },

    /// Interactive menu
    Menu,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Logs go to stderr so stdout stays clean for tables and JSON
    tracing_subscriber::fmt()
        .with_max_level(log_level(cli.verbose))
        .with_writer(io::stderr)
        .init();

    let config = AppConfig::load_or_default(cli.config.as_deref())?;
    let store = LedgerStore::new(config.resolve_ledger_path(cli.file.as_deref()));

    match cli.command {
        Commands::Init => {
            if store.initialize()? {
                println!("Ledger initialized: {}", store.path().display());
            } else {
                println!("Ledger already exists: {}", store.path().display());
            }
        }
        Commands::Add {
            customer,
            title,
            manufacturer,
            date,
            cost,
        } => {
            let booking = store.append(NewBooking {
                customer,
                title,
                manufacturer,
                date,
                cost,
            })?;
            println!("{}", format!("Booking saved with id {}", booking.id).green());
        }
        Commands::List => {
            let bookings = store.list_all()?;
            print_bookings(&bookings, cli.json, "The ledger is empty")?;
        }
        Commands::Delete { number } => {
            let position = number
                .checked_sub(1)
                .ok_or_else(|| eyre!("Booking numbers start at 1"))?;
            match store.delete_at(position)? {
                Some(booking) => println!("Deleted booking {} ({})", number, booking.title),
                None => println!("No booking number {}", number),
            }
        }
        Commands::Search { field, value } => match store.search_by_field(&field, &value)? {
            SearchOutcome::Matches(bookings) => print_bookings(&bookings, cli.json, "No results")?,
            SearchOutcome::NoRecords => print_bookings(&[], cli.json, "The ledger has no records")?,
            SearchOutcome::FieldNotFound(field) => {
                print_bookings(&[], cli.json, &format!("Field '{}' not found", field))?
            }
        },
        Commands::Search2 {
            field1,
            value1,
            field2,
            value2,
        } => {
            let bookings = store.search_by_two_fields(&field1, &value1, &field2, &value2)?;
            print_bookings(&bookings, cli.json, "No results")?;
        }
        Commands::Prune { today } => {
            let removed = match today {
                Some(today) => store.prune_expired_before(today)?,
                None => store.prune_expired()?,
            };
            println!("Removed {} expired booking(s)", removed);
        }
        Commands::Raise { customer, factor } => {
            let factor = factor.unwrap_or(config.cost_factor);
            let changed = store.scale_cost(&customer, factor)?;
            println!("Raised the cost of {} booking(s) for {}", changed, customer);
        }
        Commands::OnDate { date } => {
            let bookings = store.filter_by_date(&date)?;
            print_bookings(&bookings, cli.json, &format!("No bookings on {}", date))?;
        }
        Commands::Menu => {
            let stdin = io::stdin();
            let stdout = io::stdout();
            Menu::new(&store, config.cost_factor, stdin.lock(), stdout.lock()).run()?;
        }
    }

    Ok(())
}

fn log_level(verbose: u8) -> Level {
    match verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    }
}

fn print_bookings(bookings: &[Booking], json: bool, empty_message: &str) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(bookings)?);
    } else if bookings.is_empty() {
        println!("{}", empty_message);
    } else {
        print!("{}", table::render(bookings));
    }
    Ok(())
}
