//! Sheet import parsers for the tracking workbook layouts
//!
//! Two layouts exist:
//!
//! - **History**: a title row, then a header with `Date`, `J`, `A`, `M`
//!   (plus ignored helper columns such as `MM`, `Week`, `Day`)
//! - **Backup**: a row of year labels, then a header of repeated
//!   `Date,J,A,M` blocks, one per year
//!
//! A blank date cell, or one showing spreadsheet overflow (`###`), continues
//! from the previous date in the same column.

use std::fmt;
use std::io::{Cursor, Read, Seek};
use std::path::Path;

use calamine::{open_workbook, open_workbook_from_rs, Data, Reader, Xlsx};
use chrono::{Duration, NaiveDate, NaiveDateTime};
use csv::ReaderBuilder;
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::models::{Entity, Observation};

/// Rows searched for the header before giving up
const HEADER_SCAN_ROWS: usize = 5;

/// Latest serial accepted as a date (9999-12-31)
const MAX_SERIAL: f64 = 2_958_465.0;

/// Sheet layout of a tracking export
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Layout {
    History,
    Backup,
}

impl Layout {
    pub fn as_str(&self) -> &'static str {
        match self {
            Layout::History => "history",
            Layout::Backup => "backup",
        }
    }

    /// Worksheet name the layout is stored under in the workbook
    pub fn sheet_name(&self) -> &'static str {
        self.as_str()
    }

    /// Rows between the header and the first data row
    fn data_offset(&self) -> usize {
        match self {
            Layout::History => 1,
            Layout::Backup => 2,
        }
    }
}

impl fmt::Display for Layout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A sheet cell, independent of the file format it came from
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Empty,
    Text(String),
    Number(f64),
}

impl Cell {
    /// Interpret a CSV field: numbers stay numeric, everything else is text
    pub fn from_field(field: &str) -> Self {
        let field = field.trim();
        if field.is_empty() {
            Cell::Empty
        } else if let Ok(n) = field.parse::<f64>() {
            Cell::Number(n)
        } else {
            Cell::Text(field.to_string())
        }
    }

    fn is_empty(&self) -> bool {
        matches!(self, Cell::Empty)
    }

    fn is_label(&self, label: &str) -> bool {
        matches!(self, Cell::Text(s) if s.trim().eq_ignore_ascii_case(label))
    }
}

impl From<&Data> for Cell {
    fn from(data: &Data) -> Self {
        match data {
            Data::Empty => Cell::Empty,
            Data::String(s) | Data::DateTimeIso(s) | Data::DurationIso(s) => {
                Cell::from_field(s)
            }
            Data::Int(n) => Cell::Number(*n as f64),
            Data::Float(f) => Cell::Number(*f),
            Data::Bool(b) => Cell::Text(b.to_string()),
            Data::DateTime(dt) => Cell::Number(dt.as_f64()),
            // Error cells render as `#VALUE!` and friends
            Data::Error(e) => Cell::Text(format!("#{:?}", e)),
        }
    }
}

/// Result of reading a date cell
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DateCell {
    Date(NaiveDate),
    /// Blank or overflowed; continue from the previous date
    Continue,
    Invalid,
}

/// Convert a spreadsheet serial (1900 date system) to a calendar date
///
/// Serials from 61 on use the 1899-12-30 epoch to absorb the fictitious
/// 1900-02-29; earlier serials count from 1899-12-31. Fractions (time of
/// day) are dropped.
pub fn serial_to_date(serial: f64) -> Option<NaiveDate> {
    if !serial.is_finite() || serial < 1.0 || serial > MAX_SERIAL {
        return None;
    }
    let days = serial.floor() as i64;
    let epoch = if days < 61 {
        NaiveDate::from_ymd_opt(1899, 12, 31)?
    } else {
        NaiveDate::from_ymd_opt(1899, 12, 30)?
    };
    epoch.checked_add_signed(Duration::days(days))
}

/// Parse a textual date: ISO, US `MM/DD/YYYY` or an ISO datetime
pub fn parse_date_text(text: &str) -> Option<NaiveDate> {
    let text = text.trim();
    for fmt in ["%Y-%m-%d", "%m/%d/%Y", "%Y/%m/%d"] {
        if let Ok(date) = NaiveDate::parse_from_str(text, fmt) {
            return Some(date);
        }
    }
    for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(text, fmt) {
            return Some(dt.date());
        }
    }
    // Zone-suffixed datetimes such as 2024-01-01T00:00:00.000Z
    chrono::DateTime::parse_from_rfc3339(text)
        .ok()
        .map(|dt| dt.date_naive())
}

fn read_date(cell: &Cell) -> DateCell {
    match cell {
        Cell::Empty => DateCell::Continue,
        Cell::Text(s) if s.contains('#') => DateCell::Continue,
        Cell::Text(s) => parse_date_text(s).map_or(DateCell::Invalid, DateCell::Date),
        Cell::Number(n) if *n == 0.0 => DateCell::Continue,
        Cell::Number(n) => serial_to_date(*n).map_or(DateCell::Invalid, DateCell::Date),
    }
}

/// Parse a count cell; `None` only for a blank cell
///
/// Non-numeric, negative and non-finite values count as zero; fractional
/// counts round to the nearest integer.
pub fn parse_count(cell: &Cell) -> Option<u64> {
    let value = match cell {
        Cell::Empty => return None,
        Cell::Number(n) => *n,
        Cell::Text(s) => s.trim().parse::<f64>().unwrap_or(0.0),
    };
    if value.is_finite() && value > 0.0 {
        Some(value.round() as u64)
    } else {
        Some(0)
    }
}

/// Tracks the running date of one date column
#[derive(Debug, Default)]
struct DateColumn {
    last: Option<NaiveDate>,
}

impl DateColumn {
    fn next(&mut self, cell: &Cell, row: usize) -> Option<NaiveDate> {
        let date = match read_date(cell) {
            DateCell::Date(date) => date,
            DateCell::Continue => self.last?.succ_opt()?,
            DateCell::Invalid => {
                debug!(row, value = ?cell, "Skipping row with unparseable date");
                return None;
            }
        };
        self.last = Some(date);
        Some(date)
    }
}

/// One `Date,J,A,M` block of columns
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct ColumnBlock {
    date: usize,
    counts: [(Entity, usize); 3],
}

fn find_header(rows: &[Vec<Cell>]) -> Option<usize> {
    rows.iter()
        .take(HEADER_SCAN_ROWS)
        .position(|row| row.iter().any(|c| c.is_label("Date")))
}

fn column_of(header: &[Cell], label: &str) -> Option<usize> {
    header.iter().position(|c| c.is_label(label))
}

fn history_blocks(header: &[Cell]) -> Option<Vec<ColumnBlock>> {
    let date = column_of(header, "Date")?;
    let j = column_of(header, Entity::J.as_str())?;
    let a = column_of(header, Entity::A.as_str())?;
    let m = column_of(header, Entity::M.as_str())?;
    Some(vec![ColumnBlock {
        date,
        counts: [(Entity::J, j), (Entity::A, a), (Entity::M, m)],
    }])
}

fn backup_blocks(header: &[Cell]) -> Vec<ColumnBlock> {
    header
        .iter()
        .enumerate()
        .filter(|(_, c)| c.is_label("Date"))
        .map(|(date, _)| ColumnBlock {
            date,
            counts: [
                (Entity::J, date + 1),
                (Entity::A, date + 2),
                (Entity::M, date + 3),
            ],
        })
        .collect()
}

/// Detect the layout from the header row
///
/// Returns None if no header is found or its columns are not recognized.
pub fn detect_layout(rows: &[Vec<Cell>]) -> Option<Layout> {
    let header = &rows[find_header(rows)?];
    let date_columns = header.iter().filter(|c| c.is_label("Date")).count();
    if date_columns > 1 {
        Some(Layout::Backup)
    } else if history_blocks(header).is_some() {
        Some(Layout::History)
    } else {
        None
    }
}

/// Extract observations from the rows of one sheet
///
/// A missing header or missing columns log a warning and yield nothing.
pub fn parse_rows(rows: &[Vec<Cell>], layout: Layout) -> Vec<Observation> {
    let Some(header_idx) = find_header(rows) else {
        warn!(layout = %layout, "No header row found in sheet");
        return Vec::new();
    };
    let header = &rows[header_idx];

    let blocks = match layout {
        Layout::History => history_blocks(header).unwrap_or_default(),
        Layout::Backup => backup_blocks(header),
    };
    if blocks.is_empty() {
        warn!(layout = %layout, "Could not find required columns in sheet");
        return Vec::new();
    }
    debug!(layout = %layout, blocks = blocks.len(), header_row = header_idx, "Sheet columns located");

    let mut columns: Vec<DateColumn> = blocks.iter().map(|_| DateColumn::default()).collect();
    let mut observations = Vec::new();
    let empty = Cell::Empty;

    let first_data_row = header_idx + layout.data_offset();
    for (row_idx, row) in rows.iter().enumerate().skip(first_data_row) {
        if row.iter().all(Cell::is_empty) {
            continue;
        }
        let cell = |col: usize| row.get(col).unwrap_or(&empty);

        for (block, column) in blocks.iter().zip(columns.iter_mut()) {
            let Some(date) = column.next(cell(block.date), row_idx) else {
                continue;
            };
            for (entity, col) in block.counts {
                if let Some(count) = parse_count(cell(col)) {
                    observations.push(Observation::new(date, entity, count));
                }
            }
        }
    }

    debug!(layout = %layout, count = observations.len(), "Parsed sheet observations");
    observations
}

/// Parse a CSV export of one sheet
///
/// When `layout` is `None` it is detected from the header row.
pub fn parse_csv<R: Read>(reader: R, layout: Option<Layout>) -> Result<Vec<Observation>> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(reader);

    let mut rows = Vec::new();
    for result in rdr.records() {
        let record = result?;
        rows.push(record.iter().map(Cell::from_field).collect::<Vec<_>>());
    }

    let layout = match layout {
        Some(layout) => layout,
        None => detect_layout(&rows)
            .ok_or_else(|| Error::Import("Unrecognized sheet layout: expected a Date/J/A/M header".into()))?,
    };

    Ok(parse_rows(&rows, layout))
}

/// Parse both sheets of an `.xlsx` workbook on disk
pub fn parse_workbook(path: &Path) -> Result<Vec<Observation>> {
    let mut workbook: Xlsx<_> = open_workbook(path)?;
    read_workbook(&mut workbook)
}

/// Parse both sheets of an `.xlsx` workbook held in memory
pub fn parse_workbook_bytes(bytes: Vec<u8>) -> Result<Vec<Observation>> {
    let mut workbook: Xlsx<_> = open_workbook_from_rs(Cursor::new(bytes))?;
    read_workbook(&mut workbook)
}

fn read_workbook<RS: Read + Seek>(workbook: &mut Xlsx<RS>) -> Result<Vec<Observation>> {
    let sheet_names = workbook.sheet_names();
    debug!(sheets = ?sheet_names, "Opened workbook");

    let mut observations = Vec::new();
    for layout in [Layout::History, Layout::Backup] {
        if !sheet_names.iter().any(|name| name == layout.sheet_name()) {
            warn!(sheet = layout.sheet_name(), "Sheet not found in workbook");
            continue;
        }

        let range = workbook.worksheet_range(layout.sheet_name())?;
        let rows: Vec<Vec<Cell>> = range
            .rows()
            .map(|row| row.iter().map(Cell::from).collect())
            .collect();

        let parsed = parse_rows(&rows, layout);
        debug!(sheet = layout.sheet_name(), count = parsed.len(), "Parsed sheet");
        observations.extend(parsed);
    }

    Ok(observations)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn counts_for(obs: &[Observation], day: NaiveDate, entity: Entity) -> u64 {
        obs.iter()
            .filter(|o| o.date == day && o.entity == entity)
            .map(|o| o.count)
            .sum()
    }

    const HISTORY_CSV: &str = "\
Activity log,,,,,,
Date,MM,Week,Day,J,A,M
2024-01-01,1,1,Mon,2,0,1
###,1,1,Tue,1,,3
,1,1,Wed,,,
01/04/2024,1,1,Thu,4,1.6,-2
";

    const BACKUP_CSV: &str = "\
2023,,,,2024,,,
Date,J,A,M,Date,J,A,M
,,,,,,,
45290,1,0,0,45292,5,0,0
,2,0,0,,6,1,0
";

    #[test]
    fn test_serial_to_date() {
        assert_eq!(serial_to_date(45292.0), Some(date(2024, 1, 1)));
        assert_eq!(serial_to_date(45292.75), Some(date(2024, 1, 1)));
        assert_eq!(serial_to_date(1.0), Some(date(1900, 1, 1)));
        assert_eq!(serial_to_date(61.0), Some(date(1900, 3, 1)));
        assert_eq!(serial_to_date(0.0), None);
        assert_eq!(serial_to_date(-3.0), None);
        assert_eq!(serial_to_date(f64::NAN), None);
    }

    #[test]
    fn test_parse_date_text() {
        assert_eq!(parse_date_text("2024-03-05"), Some(date(2024, 3, 5)));
        assert_eq!(parse_date_text("03/05/2024"), Some(date(2024, 3, 5)));
        assert_eq!(parse_date_text("2024-03-05T00:00:00.000Z"), Some(date(2024, 3, 5)));
        assert_eq!(parse_date_text("2024-03-05 08:15:00"), Some(date(2024, 3, 5)));
        assert_eq!(parse_date_text("tomorrow"), None);
    }

    #[test]
    fn test_parse_count() {
        assert_eq!(parse_count(&Cell::Empty), None);
        assert_eq!(parse_count(&Cell::Number(3.0)), Some(3));
        assert_eq!(parse_count(&Cell::Number(2.5)), Some(3));
        assert_eq!(parse_count(&Cell::Number(-4.0)), Some(0));
        assert_eq!(parse_count(&Cell::Number(f64::INFINITY)), Some(0));
        assert_eq!(parse_count(&Cell::Text("n/a".into())), Some(0));
    }

    #[test]
    fn test_history_csv() {
        let obs = parse_csv(HISTORY_CSV.as_bytes(), Some(Layout::History)).unwrap();

        assert_eq!(counts_for(&obs, date(2024, 1, 1), Entity::J), 2);
        assert_eq!(counts_for(&obs, date(2024, 1, 1), Entity::M), 1);
        // ### continues from the previous date
        assert_eq!(counts_for(&obs, date(2024, 1, 2), Entity::J), 1);
        assert_eq!(counts_for(&obs, date(2024, 1, 2), Entity::M), 3);
        // Blank date continues too, but blank counts emit nothing
        assert!(obs.iter().all(|o| o.date != date(2024, 1, 3)));
        // Fractions round, negatives clamp
        assert_eq!(counts_for(&obs, date(2024, 1, 4), Entity::A), 2);
        assert_eq!(counts_for(&obs, date(2024, 1, 4), Entity::M), 0);
    }

    #[test]
    fn test_backup_csv() {
        let obs = parse_csv(BACKUP_CSV.as_bytes(), None).unwrap();

        // 45290 = 2023-12-30, 45292 = 2024-01-01
        assert_eq!(counts_for(&obs, date(2023, 12, 30), Entity::J), 1);
        assert_eq!(counts_for(&obs, date(2023, 12, 31), Entity::J), 2);
        assert_eq!(counts_for(&obs, date(2024, 1, 1), Entity::J), 5);
        assert_eq!(counts_for(&obs, date(2024, 1, 2), Entity::J), 6);
        assert_eq!(counts_for(&obs, date(2024, 1, 2), Entity::A), 1);
    }

    #[test]
    fn test_continuation_without_prior_date_skipped() {
        let csv = "title\nDate,J,A,M\n###,9,9,9\n2024-02-01,1,1,1\n";
        let obs = parse_csv(csv.as_bytes(), Some(Layout::History)).unwrap();
        assert_eq!(obs.len(), 3);
        assert!(obs.iter().all(|o| o.date == date(2024, 2, 1)));
    }

    #[test]
    fn test_unparseable_date_skips_row_only() {
        let csv = "title\nDate,J,A,M\n2024-02-01,1,0,0\nsoon,7,0,0\n,2,0,0\n";
        let obs = parse_csv(csv.as_bytes(), Some(Layout::History)).unwrap();
        assert_eq!(counts_for(&obs, date(2024, 2, 1), Entity::J), 1);
        // Invalid row keeps the last valid date
        assert_eq!(counts_for(&obs, date(2024, 2, 2), Entity::J), 2);
        assert!(obs.iter().all(|o| o.count != 7));
    }

    #[test]
    fn test_detect_layout() {
        let rows = |csv: &str| -> Vec<Vec<Cell>> {
            csv.lines()
                .map(|l| l.split(',').map(Cell::from_field).collect())
                .collect()
        };
        assert_eq!(detect_layout(&rows(HISTORY_CSV)), Some(Layout::History));
        assert_eq!(detect_layout(&rows(BACKUP_CSV)), Some(Layout::Backup));
        assert_eq!(detect_layout(&rows("Date,Amount\n2024-01-01,3")), None);
    }

    #[test]
    fn test_missing_columns_yield_nothing() {
        let csv = "title\nDate,J,A\n2024-01-01,1,2\n";
        let obs = parse_csv(csv.as_bytes(), Some(Layout::History)).unwrap();
        assert!(obs.is_empty());
    }

    #[test]
    fn test_unrecognized_layout_is_error() {
        let result = parse_csv("a,b\n1,2\n".as_bytes(), None);
        assert!(matches!(result, Err(Error::Import(_))));
    }

    #[test]
    fn test_invalid_workbook_bytes() {
        let result = parse_workbook_bytes(b"not a zip archive".to_vec());
        assert!(matches!(result, Err(Error::Spreadsheet(_))));
    }
}
