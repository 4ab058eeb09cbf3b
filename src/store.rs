// Ledger store over a single CSV file

use crate::csvfile::{self, Ledger};
use crate::error::LedgerError;
use crate::filter::{self, Filter, ResolvedFilter};
use crate::record::{Booking, Header, NewBooking};
use chrono::{Local, NaiveDate};
use eyre::Result;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Multiplier applied by a cost raise when none is configured
pub const DEFAULT_COST_FACTOR: f64 = 1.10;

/// Date format of the `date` column
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Result of a lenient single-field search
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchOutcome {
    /// Bookings whose field matched, in file order (possibly none)
    Matches(Vec<Booking>),
    /// The ledger has no header row, so there is nothing to search
    NoRecords,
    /// The field name is not one of the header labels
    FieldNotFound(String),
}

/// Booking ledger backed by one CSV file.
///
/// The store keeps nothing in memory between calls: every operation reads the
/// whole file and mutating operations rewrite it. Bookings are addressed by
/// their position among the current data rows, not by their `id` column.
#[derive(Debug, Clone)]
pub struct LedgerStore {
    path: PathBuf,
}

impl LedgerStore {
    /// Bind a store to `path`. Nothing is read or created until an operation runs.
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    /// Path of the backing file
    pub fn path(&self) -> &Path {
        &self.path
    }

    // ========================================================================
    // Basic operations
    // ========================================================================

    /// Write the header row if the ledger file is missing or has no rows.
    ///
    /// Returns true when the header was written. A file that already has a
    /// first row is not checked against the standard labels.
    pub fn initialize(&self) -> Result<bool> {
        csvfile::ensure_header(&self.path)
    }

    /// Append a booking, numbering it with the current data-row count
    pub fn append(&self, entry: NewBooking) -> Result<Booking> {
        csvfile::ensure_header(&self.path)?;

        let ledger = csvfile::read_ledger(&self.path)?;
        let booking = Booking::from_entry(ledger.bookings.len(), entry);
        csvfile::append_row(&self.path, &booking)?;

        info!(file = ?self.path, id = %booking.id, customer = %booking.customer, "Appended booking");
        Ok(booking)
    }

    /// All bookings in file order, header excluded
    pub fn list_all(&self) -> Result<Vec<Booking>> {
        Ok(csvfile::read_ledger(&self.path)?.bookings)
    }

    /// Remove the booking at `position` among the current data rows.
    ///
    /// Out-of-range positions are ignored and `None` is returned without
    /// touching the file. Surviving bookings keep their `id`.
    pub fn delete_at(&self, position: usize) -> Result<Option<Booking>> {
        let mut ledger = csvfile::read_ledger(&self.path)?;

        if position >= ledger.bookings.len() {
            debug!(position, count = ledger.bookings.len(), "delete_at: position out of range");
            return Ok(None);
        }

        let removed = ledger.bookings.remove(position);
        self.rewrite(&ledger)?;

        info!(file = ?self.path, position, id = %removed.id, "Deleted booking");
        Ok(Some(removed))
    }

    // ========================================================================
    // Queries
    // ========================================================================

    /// Bookings whose `field` column equals `value` exactly.
    ///
    /// A missing header or an unknown field name is reported through the
    /// outcome rather than as an error.
    pub fn search_by_field(&self, field: &str, value: &str) -> Result<SearchOutcome> {
        let ledger = csvfile::read_ledger(&self.path)?;

        let header = match &ledger.header {
            Some(header) if !header.is_empty() => header,
            _ => return Ok(SearchOutcome::NoRecords),
        };

        let filter = Filter::new(field, value);
        let Some(resolved) = filter.resolve(header) else {
            warn!(field, "search_by_field: field not found in header");
            return Ok(SearchOutcome::FieldNotFound(field.to_string()));
        };

        Ok(SearchOutcome::Matches(select(ledger.bookings, &[resolved])))
    }

    /// Bookings matching both field/value pairs.
    ///
    /// Unlike [`search_by_field`](Self::search_by_field), an unknown field name
    /// is an error ([`LedgerError::UnknownField`]).
    pub fn search_by_two_fields(&self, field1: &str, value1: &str, field2: &str, value2: &str) -> Result<Vec<Booking>> {
        self.search(&[Filter::new(field1, value1), Filter::new(field2, value2)])
    }

    /// Bookings matching every filter; unknown fields are errors
    pub fn search(&self, filters: &[Filter]) -> Result<Vec<Booking>> {
        let ledger = csvfile::read_ledger(&self.path)?;
        let header = ledger.header.clone().unwrap_or_else(|| Header::new(Vec::new()));

        let resolved = filters
            .iter()
            .map(|f| {
                f.resolve(&header)
                    .ok_or_else(|| LedgerError::UnknownField(f.field.clone()))
            })
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(select(ledger.bookings, &resolved))
    }

    /// Bookings whose date text equals `date` exactly (no date parsing)
    pub fn filter_by_date(&self, date: &str) -> Result<Vec<Booking>> {
        let ledger = csvfile::read_ledger(&self.path)?;
        Ok(ledger.bookings.into_iter().filter(|b| b.date == date).collect())
    }

    // ========================================================================
    // Bulk updates
    // ========================================================================

    /// Drop bookings dated before today (local time). See [`prune_expired_before`](Self::prune_expired_before).
    pub fn prune_expired(&self) -> Result<usize> {
        self.prune_expired_before(Local::now().date_naive())
    }

    /// Drop bookings dated strictly before `reference`; bookings on `reference` stay.
    ///
    /// Every date is parsed before anything is written, so one malformed date
    /// fails the call with [`LedgerError::InvalidDate`] and leaves the file as
    /// it was. Returns the number of bookings removed.
    pub fn prune_expired_before(&self, reference: NaiveDate) -> Result<usize> {
        let ledger = csvfile::read_ledger(&self.path)?;
        if ledger.header.is_none() && ledger.bookings.is_empty() {
            return Ok(0);
        }

        let mut keep = Vec::with_capacity(ledger.bookings.len());
        for (position, booking) in ledger.bookings.iter().enumerate() {
            let date = NaiveDate::parse_from_str(booking.date.trim(), DATE_FORMAT).map_err(|_| {
                LedgerError::InvalidDate {
                    position,
                    value: booking.date.clone(),
                }
            })?;
            keep.push(date >= reference);
        }

        let before = ledger.bookings.len();
        let retained: Vec<Booking> = ledger
            .bookings
            .into_iter()
            .zip(keep)
            .filter_map(|(booking, keep)| keep.then_some(booking))
            .collect();
        let removed = before - retained.len();

        self.rewrite(&Ledger {
            header: ledger.header,
            bookings: retained,
        })?;

        info!(file = ?self.path, %reference, removed, "Pruned expired bookings");
        Ok(removed)
    }

    /// Multiply the cost of every booking for `customer` by `factor`.
    ///
    /// New costs are stored at full float precision. A matching booking with
    /// an unparseable cost fails the call with [`LedgerError::InvalidCost`]
    /// before anything is written. Returns the number of bookings changed.
    pub fn scale_cost(&self, customer: &str, factor: f64) -> Result<usize> {
        let mut ledger = csvfile::read_ledger(&self.path)?;
        if ledger.header.is_none() && ledger.bookings.is_empty() {
            return Ok(0);
        }

        let mut changed = 0;
        for (position, booking) in ledger.bookings.iter_mut().enumerate() {
            if booking.customer != customer {
                continue;
            }
            let cost: f64 = booking.cost.trim().parse().map_err(|_| LedgerError::InvalidCost {
                position,
                value: booking.cost.clone(),
            })?;
            booking.cost = format_cost(cost * factor);
            changed += 1;
        }

        self.rewrite(&ledger)?;

        info!(file = ?self.path, customer, factor, changed, "Scaled booking costs");
        Ok(changed)
    }

    // ========================================================================
    // Helper methods
    // ========================================================================

    fn rewrite(&self, ledger: &Ledger) -> Result<()> {
        csvfile::write_ledger(&self.path, &ledger.header_or_default(), &ledger.bookings)
    }
}

fn select(bookings: Vec<Booking>, filters: &[ResolvedFilter<'_>]) -> Vec<Booking> {
    bookings
        .into_iter()
        .filter(|b| filter::matches_all(filters, b))
        .collect()
}

/// Shortest round-trip text of a cost; whole amounts keep a trailing `.0`.
///
/// Very large or small magnitudes use Rust's exponent form (`1e16`, `1e-5`),
/// not the `1e+16` / `1e-05` spelling some other tools produce.
pub fn format_cost(cost: f64) -> String {
    format!("{:?}", cost)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn entry(customer: &str, title: &str, date: &str, cost: &str) -> NewBooking {
        NewBooking::new(customer, title, "Studio", date, cost)
    }

    fn store_in(temp: &TempDir) -> LedgerStore {
        LedgerStore::new(temp.path().join("ledger.csv"))
    }

    #[test]
    fn test_new_does_not_touch_disk() {
        let temp = TempDir::new().unwrap();
        let store = store_in(&temp);
        assert!(!store.path().exists());
        assert!(store.list_all().unwrap().is_empty());
        assert!(!store.path().exists());
    }

    #[test]
    fn test_initialize_twice() {
        let temp = TempDir::new().unwrap();
        let store = store_in(&temp);

        assert!(store.initialize().unwrap());
        let first = fs::read_to_string(store.path()).unwrap();
        assert!(!store.initialize().unwrap());
        assert_eq!(fs::read_to_string(store.path()).unwrap(), first);
    }

    #[test]
    fn test_append_creates_missing_file() {
        let temp = TempDir::new().unwrap();
        let store = store_in(&temp);

        let booking = store.append(entry("Acme", "Spot1", "2024-01-01", "100")).unwrap();
        assert_eq!(booking.id, "0");

        let content = fs::read_to_string(store.path()).unwrap();
        assert!(content.starts_with("ID,Customer,Title,Manufacturer,Date,Cost"));
        assert_eq!(store.list_all().unwrap(), vec![booking]);
    }

    #[test]
    fn test_append_unwritable_path_fails() {
        let temp = TempDir::new().unwrap();
        let store = LedgerStore::new(temp.path().join("missing-dir").join("ledger.csv"));
        assert!(store.append(entry("Acme", "Spot1", "2024-01-01", "100")).is_err());
    }

    #[test]
    fn test_delete_returns_removed_booking() {
        let temp = TempDir::new().unwrap();
        let store = store_in(&temp);
        store.append(entry("Acme", "Spot1", "2024-01-01", "100")).unwrap();
        store.append(entry("Globex", "Spot2", "2024-01-02", "200")).unwrap();

        let removed = store.delete_at(0).unwrap().unwrap();
        assert_eq!(removed.customer, "Acme");

        let remaining = store.list_all().unwrap();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].id, "1");
    }

    #[test]
    fn test_delete_out_of_range_does_not_rewrite() {
        let temp = TempDir::new().unwrap();
        let store = store_in(&temp);
        store.append(entry("Acme", "Spot1", "2024-01-01", "100")).unwrap();
        let before = fs::read_to_string(store.path()).unwrap();

        assert_eq!(store.delete_at(1).unwrap(), None);
        assert_eq!(store.delete_at(usize::MAX).unwrap(), None);
        assert_eq!(fs::read_to_string(store.path()).unwrap(), before);
    }

    #[test]
    fn test_delete_on_missing_file_is_noop() {
        let temp = TempDir::new().unwrap();
        let store = store_in(&temp);
        assert_eq!(store.delete_at(0).unwrap(), None);
        assert!(!store.path().exists());
    }

    #[test]
    fn test_search_by_field_outcomes() {
        let temp = TempDir::new().unwrap();
        let store = store_in(&temp);

        assert_eq!(store.search_by_field("Customer", "Acme").unwrap(), SearchOutcome::NoRecords);

        store.initialize().unwrap();
        assert_eq!(
            store.search_by_field("Customer", "Acme").unwrap(),
            SearchOutcome::Matches(Vec::new())
        );
        assert_eq!(
            store.search_by_field("Colour", "red").unwrap(),
            SearchOutcome::FieldNotFound("Colour".to_string())
        );
    }

    #[test]
    fn test_search_never_returns_header() {
        let temp = TempDir::new().unwrap();
        let store = store_in(&temp);
        store.append(entry("Acme", "Spot1", "2024-01-01", "100")).unwrap();

        assert_eq!(
            store.search_by_field("Customer", "Customer").unwrap(),
            SearchOutcome::Matches(Vec::new())
        );
    }

    #[test]
    fn test_search_by_two_fields_unknown_field_is_error() {
        let temp = TempDir::new().unwrap();
        let store = store_in(&temp);
        store.append(entry("Acme", "Spot1", "2024-01-01", "100")).unwrap();

        let err = store
            .search_by_two_fields("Customer", "Acme", "Colour", "red")
            .unwrap_err();
        assert_eq!(
            err.downcast_ref::<LedgerError>(),
            Some(&LedgerError::UnknownField("Colour".to_string()))
        );
    }

    #[test]
    fn test_search_by_two_fields_without_header_is_error() {
        let temp = TempDir::new().unwrap();
        let store = store_in(&temp);
        let err = store
            .search_by_two_fields("Customer", "Acme", "Date", "2024-01-01")
            .unwrap_err();
        assert_eq!(
            err.downcast_ref::<LedgerError>(),
            Some(&LedgerError::UnknownField("Customer".to_string()))
        );
    }

    #[test]
    fn test_search_uses_live_header_labels() {
        let temp = TempDir::new().unwrap();
        let store = store_in(&temp);
        fs::write(
            store.path(),
            concat!(
                "ID,Заказчик,Название ролика,Изготовитель,Дата,Стоимость\n",
                "0,Acme,Spot1,Studio1,2024-01-01,100\n",
            ),
        )
        .unwrap();

        match store.search_by_field("Заказчик", "Acme").unwrap() {
            SearchOutcome::Matches(rows) => assert_eq!(rows.len(), 1),
            other => panic!("unexpected outcome: {:?}", other),
        }
        assert_eq!(
            store.search_by_field("Customer", "Acme").unwrap(),
            SearchOutcome::FieldNotFound("Customer".to_string())
        );
    }

    #[test]
    fn test_filter_by_date_is_string_equality() {
        let temp = TempDir::new().unwrap();
        let store = store_in(&temp);
        store.append(entry("Acme", "Spot1", "2024-01-01", "100")).unwrap();
        store.append(entry("Acme", "Spot2", "2024-1-1", "100")).unwrap();
        store.append(entry("Globex", "Spot3", "2024-01-01", "100")).unwrap();

        let rows = store.filter_by_date("2024-01-01").unwrap();
        let titles: Vec<&str> = rows.iter().map(|b| b.title.as_str()).collect();
        assert_eq!(titles, vec!["Spot1", "Spot3"]);
        assert!(store.filter_by_date("1999-12-31").unwrap().is_empty());
    }

    #[test]
    fn test_prune_expired_boundary() {
        let temp = TempDir::new().unwrap();
        let store = store_in(&temp);
        store.append(entry("Acme", "Old", "2024-05-31", "100")).unwrap();
        store.append(entry("Acme", "Today", "2024-06-01", "100")).unwrap();
        store.append(entry("Acme", "Later", "2024-07-15", "100")).unwrap();

        let reference = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();
        assert_eq!(store.prune_expired_before(reference).unwrap(), 1);

        let titles: Vec<String> = store.list_all().unwrap().into_iter().map(|b| b.title).collect();
        assert_eq!(titles, vec!["Today", "Later"]);
    }

    #[test]
    fn test_prune_expired_bad_date_leaves_file() {
        let temp = TempDir::new().unwrap();
        let store = store_in(&temp);
        store.append(entry("Acme", "Old", "2020-01-01", "100")).unwrap();
        store.append(entry("Acme", "Bad", "01/06/2024", "100")).unwrap();
        let before = fs::read_to_string(store.path()).unwrap();

        let err = store
            .prune_expired_before(NaiveDate::from_ymd_opt(2024, 6, 1).unwrap())
            .unwrap_err();
        assert_eq!(
            err.downcast_ref::<LedgerError>(),
            Some(&LedgerError::InvalidDate {
                position: 1,
                value: "01/06/2024".to_string()
            })
        );
        assert_eq!(fs::read_to_string(store.path()).unwrap(), before);
    }

    #[test]
    fn test_prune_expired_uses_today() {
        let temp = TempDir::new().unwrap();
        let store = store_in(&temp);
        store.append(entry("Acme", "Ancient", "1999-01-01", "100")).unwrap();
        store.append(entry("Acme", "Future", "2999-01-01", "100")).unwrap();

        assert_eq!(store.prune_expired().unwrap(), 1);
        assert_eq!(store.list_all().unwrap()[0].title, "Future");
    }

    #[test]
    fn test_prune_on_missing_file_does_not_create_it() {
        let temp = TempDir::new().unwrap();
        let store = store_in(&temp);
        assert_eq!(store.prune_expired().unwrap(), 0);
        assert!(!store.path().exists());
    }

    #[test]
    fn test_scale_cost() {
        let temp = TempDir::new().unwrap();
        let store = store_in(&temp);
        store.append(entry("Acme", "Spot1", "2024-01-01", "100")).unwrap();
        store.append(entry("Globex", "Spot2", "2024-01-01", "12.50")).unwrap();
        store.append(entry("Acme", "Spot3", "2024-01-01", "50")).unwrap();

        assert_eq!(store.scale_cost("Acme", DEFAULT_COST_FACTOR).unwrap(), 2);

        let rows = store.list_all().unwrap();
        let first: f64 = rows[0].cost.parse().unwrap();
        assert!((first - 110.0).abs() < 1e-9);
        assert_eq!(rows[1].cost, "12.50");
        assert_eq!(rows[2].cost, "55.00000000000001");
    }

    #[test]
    fn test_scale_cost_bad_cost_leaves_file() {
        let temp = TempDir::new().unwrap();
        let store = store_in(&temp);
        store.append(entry("Acme", "Spot1", "2024-01-01", "100")).unwrap();
        store.append(entry("Acme", "Spot2", "2024-01-01", "a lot")).unwrap();
        let before = fs::read_to_string(store.path()).unwrap();

        let err = store.scale_cost("Acme", DEFAULT_COST_FACTOR).unwrap_err();
        assert_eq!(
            err.downcast_ref::<LedgerError>(),
            Some(&LedgerError::InvalidCost {
                position: 1,
                value: "a lot".to_string()
            })
        );
        assert_eq!(fs::read_to_string(store.path()).unwrap(), before);
    }

    #[test]
    fn test_scale_cost_ignores_bad_cost_of_other_customers() {
        let temp = TempDir::new().unwrap();
        let store = store_in(&temp);
        store.append(entry("Acme", "Spot1", "2024-01-01", "100")).unwrap();
        store.append(entry("Globex", "Spot2", "2024-01-01", "n/a")).unwrap();

        assert_eq!(store.scale_cost("Acme", 2.0).unwrap(), 1);
        let rows = store.list_all().unwrap();
        assert_eq!(rows[0].cost, "200.0");
        assert_eq!(rows[1].cost, "n/a");
    }

    #[test]
    fn test_format_cost() {
        assert_eq!(format_cost(110.0), "110.0");
        assert_eq!(format_cost(100.0 * 1.1), "110.00000000000001");
        assert_eq!(format_cost(13.75), "13.75");
        assert_eq!(format_cost(1e16), "1e16");
    }
}
