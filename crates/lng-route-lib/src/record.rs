//! Raw spreadsheet rows and their normalization into terminal fields

use crate::LoadError;
use crate::terminal::{FacilityType, Status, Terminal};
use csv::StringRecord;
use serde::Serialize;

/// Cell value treated as missing in every column
const UNKNOWN: &str = "Unknown";

/// Column headers required in the source
pub(crate) const TERMINAL_NAME: &str = "TerminalName";
pub(crate) const UNIT_NAME: &str = "UnitName";
pub(crate) const FACILITY_TYPE: &str = "FacilityType";
pub(crate) const STATUS: &str = "Status";
pub(crate) const PARENT: &str = "Parent";
pub(crate) const CAPACITY: &str = "CapacityInMtpa";
pub(crate) const LATITUDE: &str = "Latitude";
pub(crate) const LONGITUDE: &str = "Longitude";

/// Positions of the required columns within a record
#[derive(Debug, Clone, Copy)]
pub(crate) struct Columns {
    terminal_name: usize,
    unit_name: usize,
    facility_type: usize,
    status: usize,
    parent: usize,
    capacity: usize,
    latitude: usize,
    longitude: usize,
}

impl Columns {
    /// Locate every required column in the header row
    pub(crate) fn from_headers(headers: &StringRecord) -> Result<Self, LoadError> {
        let find = |column: &'static str| {
            headers
                .iter()
                .position(|header| header.trim() == column)
                .ok_or(LoadError::MissingColumn { column })
        };

        Ok(Self {
            terminal_name: find(TERMINAL_NAME)?,
            unit_name: find(UNIT_NAME)?,
            facility_type: find(FACILITY_TYPE)?,
            status: find(STATUS)?,
            parent: find(PARENT)?,
            capacity: find(CAPACITY)?,
            latitude: find(LATITUDE)?,
            longitude: find(LONGITUDE)?,
        })
    }
}

/// Why a row did not make it into the registry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum DropReason {
    MissingField(&'static str),
    InvalidCoordinate,
    InvalidCapacity,
}

/// A row that passed every check, ready to become a [`Terminal`]
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct TerminalRow {
    name: String,
    facility_type: String,
    status: String,
    parent: String,
    capacity_mtpa: f64,
    latitude: f64,
    longitude: f64,
}

impl TerminalRow {
    pub(crate) fn into_terminal(self) -> Terminal {
        Terminal::new(
            self.name,
            FacilityType::parse(&self.facility_type),
            Status::parse(&self.status),
            self.parent,
            self.capacity_mtpa,
            self.latitude,
            self.longitude,
        )
    }
}

/// Raw cell text, `None` when the cell is absent or blank
fn raw_cell<'r>(record: &'r StringRecord, index: usize) -> Option<&'r str> {
    record
        .get(index)
        .map(str::trim)
        .filter(|value| !value.is_empty())
}

/// Cell text with the `Unknown` placeholder also treated as missing
fn known_cell(value: Option<&str>) -> Option<&str> {
    value.filter(|value| *value != UNKNOWN)
}

fn required<'r>(value: Option<&'r str>, column: &'static str) -> Result<&'r str, DropReason> {
    known_cell(value).ok_or(DropReason::MissingField(column))
}

fn parse_finite(value: &str) -> Option<f64> {
    value.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Normalize one record
///
/// The unit name is appended before placeholder handling, so a unit written as
/// `Unknown` still becomes part of the display name. All other columns are
/// required; coordinates and capacity must parse to finite numbers, and
/// coordinates must lie on the globe.
pub(crate) fn normalize(record: &StringRecord, columns: &Columns) -> Result<TerminalRow, DropReason> {
    let name = raw_cell(record, columns.terminal_name).map(|terminal| {
        match raw_cell(record, columns.unit_name) {
            Some(unit) => format!("{terminal} {unit}"),
            None => terminal.to_string(),
        }
    });

    let name = required(name.as_deref(), TERMINAL_NAME)?.to_string();
    let facility_type = required(raw_cell(record, columns.facility_type), FACILITY_TYPE)?;
    let status = required(raw_cell(record, columns.status), STATUS)?;
    let parent = required(raw_cell(record, columns.parent), PARENT)?;
    let capacity = required(raw_cell(record, columns.capacity), CAPACITY)?;
    let latitude = required(raw_cell(record, columns.latitude), LATITUDE)?;
    let longitude = required(raw_cell(record, columns.longitude), LONGITUDE)?;

    let latitude = parse_finite(latitude)
        .filter(|lat| (-90.0..=90.0).contains(lat))
        .ok_or(DropReason::InvalidCoordinate)?;
    let longitude = parse_finite(longitude)
        .filter(|lon| (-180.0..=180.0).contains(lon))
        .ok_or(DropReason::InvalidCoordinate)?;
    let capacity_mtpa = parse_finite(capacity).ok_or(DropReason::InvalidCapacity)?;

    Ok(TerminalRow {
        name,
        facility_type: facility_type.to_string(),
        status: status.to_string(),
        parent: parent.to_string(),
        capacity_mtpa,
        latitude,
        longitude,
    })
}

/// Summary of a registry load
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LoadReport {
    /// Data rows seen in the source (header excluded)
    pub rows_read: usize,
    /// Rows that became terminals
    pub rows_kept: usize,
    /// Rows missing at least one required value
    pub missing_field: usize,
    /// Rows whose latitude or longitude is not a usable number
    pub invalid_coordinate: usize,
    /// Rows whose capacity is not a number
    pub invalid_capacity: usize,
    /// Rows the CSV reader could not split into fields
    pub malformed: usize,
}

impl LoadReport {
    pub fn rows_dropped(&self) -> usize {
        self.missing_field + self.invalid_coordinate + self.invalid_capacity + self.malformed
    }

    pub(crate) fn record_drop(&mut self, reason: DropReason) {
        match reason {
            DropReason::MissingField(_) => self.missing_field += 1,
            DropReason::InvalidCoordinate => self.invalid_coordinate += 1,
            DropReason::InvalidCapacity => self.invalid_capacity += 1,
        }
    }
}
