// Interactive numbered menu over a ledger store

use crate::record::{Booking, NewBooking};
use crate::store::{LedgerStore, SearchOutcome};
use crate::table;
use colored::Colorize;
use eyre::{Context, Result};
use std::io::{BufRead, Write};
use tracing::debug;

const MENU: &str = "\
 1. Initialize the ledger
 2. Enter booking data
 3. Save the entered booking
 4. List all bookings
 5. Delete a booking by number
 6. Search by one field
 7. Search by two fields
 8. Delete expired bookings
 9. Raise a customer's costs
10. List bookings airing on a date
11. Exit";

/// Whether the loop should keep going after an action
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flow {
    Continue,
    Exit,
}

/// Interactive session reading choices from `input` and writing to `output`.
///
/// Booking data entered with item 2 is held in `pending` until item 3 saves
/// it. Errors from an action are printed and the session goes on; input
/// running out ends it.
pub struct Menu<'a, R, W> {
    store: &'a LedgerStore,
    cost_factor: f64,
    input: R,
    output: W,
    pending: Option<NewBooking>,
}

impl<'a, R: BufRead, W: Write> Menu<'a, R, W> {
    pub fn new(store: &'a LedgerStore, cost_factor: f64, input: R, output: W) -> Self {
        Self {
            store,
            cost_factor,
            input,
            output,
            pending: None,
        }
    }

    /// Run until the user picks Exit or input ends
    pub fn run(&mut self) -> Result<()> {
        loop {
            writeln!(self.output, "\n{}", MENU)?;
            let Some(choice) = self.prompt("Choose an action")? else {
                break;
            };

            debug!(choice = %choice, "menu: choice");
            match self.dispatch(&choice) {
                Ok(Flow::Exit) => break,
                Ok(Flow::Continue) => {}
                Err(e) if is_end_of_input(&e) => break,
                Err(e) => writeln!(self.output, "{}", format!("Error: {:#}", e).red())?,
            }
        }
        Ok(())
    }

    /// Booking data entered but not saved yet
    pub fn pending(&self) -> Option<&NewBooking> {
        self.pending.as_ref()
    }

    fn dispatch(&mut self, choice: &str) -> Result<Flow> {
        match choice {
            "1" => self.initialize()?,
            "2" => self.enter_booking()?,
            "3" => self.save_booking()?,
            "4" => {
                let bookings = self.store.list_all()?;
                self.show(&bookings)?;
            }
            "5" => self.delete()?,
            "6" => self.search_one()?,
            "7" => self.search_two()?,
            "8" => {
                let removed = self.store.prune_expired()?;
                self.confirm(&format!("Removed {} expired booking(s).", removed))?;
            }
            "9" => self.raise_cost()?,
            "10" => self.on_date()?,
            "11" => return Ok(Flow::Exit),
            _ => writeln!(self.output, "Invalid choice, please try again.")?,
        }
        Ok(Flow::Continue)
    }

    fn initialize(&mut self) -> Result<()> {
        let created = self.store.initialize()?;
        let verb = if created { "initialized" } else { "already exists" };
        self.confirm(&format!("Ledger {}: {}", verb, self.store.path().display()))
    }

    fn enter_booking(&mut self) -> Result<()> {
        let customer = self.require("Customer")?;
        let title = self.require("Title")?;
        let manufacturer = self.require("Manufacturer")?;
        let date = self.require("Date (YYYY-MM-DD)")?;
        let cost = self.require("Cost")?;

        self.pending = Some(NewBooking {
            customer,
            title,
            manufacturer,
            date,
            cost,
        });
        self.confirm("Booking data stored; choose 3 to save it.")
    }

    fn save_booking(&mut self) -> Result<()> {
        let Some(entry) = self.pending.take() else {
            writeln!(self.output, "Nothing to save. Enter booking data first.")?;
            return Ok(());
        };

        match self.store.append(entry.clone()) {
            Ok(booking) => self.confirm(&format!("Booking saved with id {}.", booking.id)),
            Err(e) => {
                // Keep the entry so the user can retry
                self.pending = Some(entry);
                Err(e)
            }
        }
    }

    fn delete(&mut self) -> Result<()> {
        let raw = self.require("Number of the booking to delete")?;
        let number: usize = match raw.trim().parse() {
            Ok(n) if n > 0 => n,
            _ => {
                writeln!(self.output, "'{}' is not a booking number.", raw)?;
                return Ok(());
            }
        };

        match self.store.delete_at(number - 1)? {
            Some(booking) => self.confirm(&format!("Deleted booking {} ({}).", number, booking.title)),
            None => {
                writeln!(self.output, "No booking number {}.", number)?;
                Ok(())
            }
        }
    }

    fn search_one(&mut self) -> Result<()> {
        let field = self.require("Field to search")?;
        let value = self.require("Value")?;

        match self.store.search_by_field(&field, &value)? {
            SearchOutcome::Matches(bookings) => self.show(&bookings),
            SearchOutcome::NoRecords => {
                writeln!(self.output, "The ledger has no records.")?;
                Ok(())
            }
            SearchOutcome::FieldNotFound(field) => {
                writeln!(self.output, "Field '{}' not found.", field)?;
                Ok(())
            }
        }
    }

    fn search_two(&mut self) -> Result<()> {
        let field1 = self.require("First field")?;
        let value1 = self.require("Value for the first field")?;
        let field2 = self.require("Second field")?;
        let value2 = self.require("Value for the second field")?;

        let bookings = self.store.search_by_two_fields(&field1, &value1, &field2, &value2)?;
        self.show(&bookings)
    }

    fn raise_cost(&mut self) -> Result<()> {
        let customer = self.require("Customer whose costs to raise")?;
        let changed = self.store.scale_cost(&customer, self.cost_factor)?;
        self.confirm(&format!("Raised the cost of {} booking(s) for {}.", changed, customer))
    }

    fn on_date(&mut self) -> Result<()> {
        let date = self.require("Date (YYYY-MM-DD)")?;
        let bookings = self.store.filter_by_date(&date)?;
        if bookings.is_empty() {
            writeln!(self.output, "No bookings on {}.", date)?;
            return Ok(());
        }
        self.show(&bookings)
    }

    // ========================================================================
    // Helper methods
    // ========================================================================

    fn show(&mut self, bookings: &[Booking]) -> Result<()> {
        if bookings.is_empty() {
            writeln!(self.output, "No results to display.")?;
        } else {
            write!(self.output, "{}", table::render(bookings))?;
        }
        Ok(())
    }

    fn confirm(&mut self, message: &str) -> Result<()> {
        writeln!(self.output, "{}", message.green())?;
        Ok(())
    }

    /// Read one line after printing `label`; `None` at end of input
    fn prompt(&mut self, label: &str) -> Result<Option<String>> {
        write!(self.output, "{}: ", label)?;
        self.output.flush()?;

        let mut line = String::new();
        let read = self.input.read_line(&mut line).context("Failed to read input")?;
        if read == 0 {
            return Ok(None);
        }
        Ok(Some(line.trim_end_matches(['\r', '\n']).to_string()))
    }

    fn require(&mut self, label: &str) -> Result<String> {
        self.prompt(label)?.ok_or_else(|| eyre::Report::new(EndOfInput))
    }
}

/// Input ended in the middle of an action
#[derive(Debug, thiserror::Error)]
#[error("input ended")]
struct EndOfInput;

fn is_end_of_input(report: &eyre::Report) -> bool {
    report.downcast_ref::<EndOfInput>().is_some()
}
