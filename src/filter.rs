// Exact-match filters resolved against the live ledger header

use crate::record::{Booking, Header};

/// Filter for querying bookings by header label
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Filter {
    /// Header label to filter on
    pub field: String,
    /// Value the column must equal exactly (case-sensitive)
    pub value: String,
}

impl Filter {
    pub fn new(field: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            value: value.into(),
        }
    }

    /// Resolve the field label to a column of `header`
    pub fn resolve(&self, header: &Header) -> Option<ResolvedFilter<'_>> {
        header.position(&self.field).map(|column| ResolvedFilter {
            column,
            value: &self.value,
        })
    }
}

/// A filter bound to a column position
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedFilter<'a> {
    pub column: usize,
    pub value: &'a str,
}

impl ResolvedFilter<'_> {
    pub fn matches(&self, booking: &Booking) -> bool {
        booking.field(self.column) == Some(self.value)
    }
}

/// True when every filter matches
pub fn matches_all(filters: &[ResolvedFilter<'_>], booking: &Booking) -> bool {
    filters.iter().all(|f| f.matches(booking))
}
