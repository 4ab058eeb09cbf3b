// CSV file operations for the ledger

use crate::error::LedgerError;
use crate::record::{Booking, COLUMN_COUNT, Header};
use eyre::{Context, Result, eyre};
use fs2::FileExt;
use std::fs::{self, File, OpenOptions};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Parsed contents of a ledger file
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Ledger {
    /// First row of the file, `None` when the file is missing or empty
    pub header: Option<Header>,
    /// Data rows in file order
    pub bookings: Vec<Booking>,
}

impl Ledger {
    /// Header to write back, falling back to the standard labels
    pub fn header_or_default(&self) -> Header {
        self.header.clone().unwrap_or_default()
    }
}

/// Write the header row unless the ledger already starts with one.
///
/// A missing file, or one with no records at all, gets the header only.
/// Returns true when the header was written. A file that has a first row is
/// left as is, whatever that row contains.
pub fn ensure_header(path: &Path) -> Result<bool> {
    if path.exists() && has_first_row(path)? {
        debug!(file = ?path, "Ledger already has a header row");
        return Ok(false);
    }

    write_ledger(path, &Header::default(), &[])?;
    info!(file = ?path, "Wrote ledger header row");
    Ok(true)
}

fn has_first_row(path: &Path) -> Result<bool> {
    let file = File::open(path).with_context(|| format!("Failed to open ledger {}", path.display()))?;
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(file);

    let mut record = csv::StringRecord::new();
    let found = reader.read_record(&mut record).context("Failed to read ledger header")?;
    Ok(found)
}

/// Read the whole ledger file.
///
/// A missing file reads as an empty ledger with no header.
pub fn read_ledger(path: &Path) -> Result<Ledger> {
    if !path.exists() {
        return Ok(Ledger::default());
    }

    let file = File::open(path).with_context(|| format!("Failed to open ledger {}", path.display()))?;
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(file);

    let mut records = reader.records();
    let header = match records.next() {
        Some(record) => {
            let record = record.context("Failed to read ledger header")?;
            Some(Header::new(record.iter().map(str::to_string).collect()))
        }
        None => None,
    };

    let mut bookings = Vec::new();
    for record in records {
        let record = record.context("Failed to read ledger row")?;
        if record.len() != COLUMN_COUNT {
            let line = record.position().map(|p| p.line()).unwrap_or_default();
            warn!(file = ?path, line, fields = record.len(), "Malformed ledger row");
            return Err(LedgerError::MalformedRow {
                line,
                expected: COLUMN_COUNT,
                found: record.len(),
            }
            .into());
        }
        let booking: Booking = record.deserialize(None).context("Failed to decode ledger row")?;
        bookings.push(booking);
    }

    debug!(file = ?path, count = bookings.len(), "Loaded bookings from ledger");
    Ok(Ledger { header, bookings })
}

/// Append one booking row to the end of the ledger
pub fn append_row(path: &Path, booking: &Booking) -> Result<()> {
    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("Failed to open ledger {} for appending", path.display()))?;

    // Released when the file is dropped
    file.lock_exclusive().context("Failed to acquire ledger lock")?;

    {
        let mut writer = csv::WriterBuilder::new().has_headers(false).from_writer(&mut file);
        writer.serialize(booking).context("Failed to write booking row")?;
        writer.flush()?;
    }
    file.sync_all()?;

    Ok(())
}

/// Replace the ledger with `header` followed by `bookings`.
///
/// Rows go to a temporary file next to the ledger which is then renamed over
/// it, so a failed write leaves the previous contents in place. A symlinked
/// ledger is rewritten at its target and the old file's permissions carry over.
pub fn write_ledger(path: &Path, header: &Header, bookings: &[Booking]) -> Result<()> {
    let target = resolve_target(path)?;
    let dir = target
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let file_name = target
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| eyre!("Invalid ledger path: {}", path.display()))?;
    let tmp_path = dir.join(format!(".{}-{}.tmp", file_name, Uuid::now_v7()));

    let result = write_rows(&tmp_path, header, bookings)
        .and_then(|()| copy_permissions(&target, &tmp_path))
        .and_then(|()| {
            fs::rename(&tmp_path, &target).with_context(|| format!("Failed to replace ledger {}", path.display()))
        });
    if result.is_err() {
        let _ = fs::remove_file(&tmp_path);
    }
    result?;

    debug!(file = ?target, count = bookings.len(), "Rewrote ledger");
    Ok(())
}

fn resolve_target(path: &Path) -> Result<PathBuf> {
    match fs::symlink_metadata(path) {
        Ok(meta) if meta.file_type().is_symlink() => {
            fs::canonicalize(path).with_context(|| format!("Failed to resolve ledger link {}", path.display()))
        }
        _ => Ok(path.to_path_buf()),
    }
}

// No-op when the ledger does not exist yet
fn copy_permissions(from: &Path, to: &Path) -> Result<()> {
    if let Ok(meta) = fs::metadata(from) {
        fs::set_permissions(to, meta.permissions()).context("Failed to copy ledger permissions")?;
    }
    Ok(())
}

fn write_rows(tmp_path: &Path, header: &Header, bookings: &[Booking]) -> Result<()> {
    let file = File::create(tmp_path).with_context(|| format!("Failed to create {}", tmp_path.display()))?;
    let mut writer = csv::WriterBuilder::new().has_headers(false).from_writer(file);

    writer.write_record(header.labels()).context("Failed to write header row")?;
    for booking in bookings {
        writer.serialize(booking).context("Failed to write booking row")?;
    }
    writer.flush()?;

    let file = writer
        .into_inner()
        .map_err(|e| eyre!("Failed to flush ledger: {}", e.error()))?;
    file.sync_all()?;
    Ok(())
}
