// adledger - CSV ledger of advertising campaign bookings

pub mod config;
pub mod csvfile;
pub mod error;
pub mod filter;
pub mod menu;
pub mod record;
pub mod store;
pub mod table;

// Re-export main types for convenience
pub use config::AppConfig;
pub use error::LedgerError;
pub use filter::Filter;
pub use menu::Menu;
pub use record::{Booking, HEADER_LABELS, Header, NewBooking};
pub use store::{DEFAULT_COST_FACTOR, LedgerStore, SearchOutcome};
