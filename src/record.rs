// Booking records and the ledger header

use serde::{Deserialize, Serialize};

/// Header labels written to a fresh ledger, in column order
pub const HEADER_LABELS: [&str; 6] = ["ID", "Customer", "Title", "Manufacturer", "Date", "Cost"];

/// Number of columns in every ledger row
pub const COLUMN_COUNT: usize = HEADER_LABELS.len();

pub(crate) const DATE_COLUMN: usize = 4;
pub(crate) const COST_COLUMN: usize = 5;

/// One advertising booking as stored in the ledger.
///
/// Every field is kept as the text found in the file. `id` is the data-row
/// count at the moment the booking was appended; rows are never renumbered,
/// so after a delete followed by an append two bookings can share an id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Booking {
    pub id: String,
    pub customer: String,
    pub title: String,
    pub manufacturer: String,
    pub date: String,
    pub cost: String,
}

impl Booking {
    /// Build the stored form of a pending entry
    pub fn from_entry(id: usize, entry: NewBooking) -> Self {
        Self {
            id: id.to_string(),
            customer: entry.customer,
            title: entry.title,
            manufacturer: entry.manufacturer,
            date: entry.date,
            cost: entry.cost,
        }
    }

    /// Field text by column position
    pub fn field(&self, column: usize) -> Option<&str> {
        match column {
            0 => Some(&self.id),
            1 => Some(&self.customer),
            2 => Some(&self.title),
            3 => Some(&self.manufacturer),
            DATE_COLUMN => Some(&self.date),
            COST_COLUMN => Some(&self.cost),
            _ => None,
        }
    }

    /// Fields in column order
    pub fn fields(&self) -> [&str; COLUMN_COUNT] {
        [
            &self.id,
            &self.customer,
            &self.title,
            &self.manufacturer,
            &self.date,
            &self.cost,
        ]
    }
}

/// Booking data collected from the user but not yet written to the ledger
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewBooking {
    pub customer: String,
    pub title: String,
    pub manufacturer: String,
    /// Expected as `YYYY-MM-DD`; not checked until expiry pruning
    pub date: String,
    /// Decimal text; not checked until cost scaling
    pub cost: String,
}

impl NewBooking {
    pub fn new(
        customer: impl Into<String>,
        title: impl Into<String>,
        manufacturer: impl Into<String>,
        date: impl Into<String>,
        cost: impl Into<String>,
    ) -> Self {
        Self {
            customer: customer.into(),
            title: title.into(),
            manufacturer: manufacturer.into(),
            date: date.into(),
            cost: cost.into(),
        }
    }
}

/// The header row as read from a ledger file.
///
/// Labels are whatever the file contains, so a ledger created with localized
/// labels is searched by those labels.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Header {
    labels: Vec<String>,
}

impl Header {
    pub fn new(labels: Vec<String>) -> Self {
        Self { labels }
    }

    /// Column position of a label, compared exactly
    pub fn position(&self, label: &str) -> Option<usize> {
        self.labels.iter().position(|l| l == label)
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}

impl Default for Header {
    fn default() -> Self {
        Self::new(HEADER_LABELS.iter().map(|l| l.to_string()).collect())
    }
}
