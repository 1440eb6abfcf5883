//! TerminalRegistry - Normalized, read-only collection of terminals
//!
//! This module loads raw tabular terminal records, drops every row that cannot
//! become a complete [`Terminal`], and exposes lookup and filtering queries.

use crate::record::{self, Columns, DropReason, LoadReport};
use crate::{Error, FacilityType, LoadError, Result, Status, Terminal};

use rayon::prelude::*;
use std::collections::HashSet;
use std::io::Read;
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};

/// Source of process-unique registry revisions
static NEXT_REVISION: AtomicU64 = AtomicU64::new(1);

/// Rows below this count are converted sequentially
const PARALLEL_THRESHOLD: usize = 1024;

/// Information about the registry
#[derive(Debug, Clone, Default, serde::Serialize)]
pub struct RegistryInfo {
    /// Number of terminals loaded
    pub terminal_count: usize,
    /// Sum of nameplate capacity in million tonnes per annum
    pub total_capacity_mtpa: f64,
    /// Geographic extent as (min_lat, min_lon, max_lat, max_lon), `None` when empty
    pub bounding_box_wgs84: Option<(f64, f64, f64, f64)>,
}

/// Combined status/type filter for building a terminal view
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TerminalFilter {
    /// Terminals with one of these statuses are hidden
    pub excluded_statuses: HashSet<Status>,
    /// When non-empty, only these facility types are shown
    pub facility_types: HashSet<FacilityType>,
}

impl TerminalFilter {
    /// Check whether a terminal passes the filter
    #[inline]
    pub fn matches(&self, terminal: &Terminal) -> bool {
        !self.excluded_statuses.contains(terminal.status())
            && (self.facility_types.is_empty()
                || self.facility_types.contains(terminal.facility_type()))
    }

    /// Keep the terminals of a view that pass the filter, in view order
    pub fn apply<'a>(
        &self,
        terminals: impl IntoIterator<Item = &'a Terminal>,
    ) -> Vec<&'a Terminal> {
        terminals
            .into_iter()
            .filter(|terminal| self.matches(terminal))
            .collect()
    }
}

/// Clean, queryable collection of terminals
///
/// Built fresh from a source on every load and never mutated afterwards.
#[derive(Debug, Clone)]
pub struct TerminalRegistry {
    /// Terminals in source row order
    terminals: Vec<Terminal>,
    /// What happened to each source row
    report: LoadReport,
    /// Process-unique identity of this load
    revision: u64,
}

#[cfg_attr(feature = "profiling", profiling::all_functions)]
impl TerminalRegistry {
    /// Load terminals from CSV data
    ///
    /// Fails only when the data cannot be read as a table or lacks a required
    /// column. Individual bad rows are dropped and counted in [`LoadReport`].
    /// An empty registry is a valid result.
    pub fn load<R: Read>(source: R) -> std::result::Result<Self, LoadError> {
        #[cfg(feature = "profiling")]
        profiling::scope!("registry::load");

        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(false)
            .from_reader(source);

        let columns = Columns::from_headers(reader.headers()?)?;

        let mut report = LoadReport::default();
        let mut rows = Vec::new();

        for (index, result) in reader.records().enumerate() {
            report.rows_read += 1;
            // Header is line 1
            let line = index + 2;

            let record = match result {
                Ok(record) => record,
                Err(err) if err.is_io_error() => return Err(err.into()),
                Err(err) => {
                    tracing::warn!("Skipping malformed row at line {line}: {err}");
                    report.malformed += 1;
                    continue;
                }
            };

            match record::normalize(&record, &columns) {
                Ok(row) => rows.push(row),
                Err(reason) => {
                    match reason {
                        DropReason::MissingField(column) => {
                            tracing::debug!(line, column, "Dropping row with missing value");
                        }
                        DropReason::InvalidCoordinate => {
                            tracing::debug!(line, "Dropping row with invalid coordinates");
                        }
                        DropReason::InvalidCapacity => {
                            tracing::debug!(line, "Dropping row with invalid capacity");
                        }
                    }
                    report.record_drop(reason);
                }
            }
        }

        let terminals: Vec<Terminal> = if rows.len() < PARALLEL_THRESHOLD {
            rows.into_iter().map(|row| row.into_terminal()).collect()
        } else {
            rows.into_par_iter().map(|row| row.into_terminal()).collect()
        };
        report.rows_kept = terminals.len();

        if terminals.is_empty() {
            tracing::warn!(
                "No terminals left after filtering {} row(s)",
                report.rows_read
            );
        } else {
            tracing::info!(
                "Loaded {} terminal(s), dropped {} of {} row(s)",
                report.rows_kept,
                report.rows_dropped(),
                report.rows_read
            );
        }

        Ok(Self {
            terminals,
            report,
            revision: NEXT_REVISION.fetch_add(1, Ordering::Relaxed),
        })
    }

    /// Load terminals from a CSV file
    pub fn load_path<P: AsRef<Path>>(path: P) -> std::result::Result<Self, LoadError> {
        let path = path.as_ref();
        tracing::debug!("Reading terminals from {}", path.display());
        let file = std::fs::File::open(path)?;
        Self::load(std::io::BufReader::new(file))
    }

    /// First terminal whose name equals `name` exactly
    pub fn by_name(&self, name: &str) -> Result<&Terminal> {
        self.terminals
            .iter()
            .find(|terminal| terminal.name() == name)
            .ok_or_else(|| Error::NotFound {
                name: name.to_string(),
            })
    }

    /// Terminals whose status is not in `excluded`, in registry order
    pub fn filter_by_status(&self, excluded: &HashSet<Status>) -> Vec<&Terminal> {
        TerminalFilter {
            excluded_statuses: excluded.clone(),
            ..Default::default()
        }
        .apply(&self.terminals)
    }

    /// Terminals of the given facility type, in registry order
    pub fn filter_by_type(&self, facility_type: &FacilityType) -> Vec<&Terminal> {
        self.terminals
            .iter()
            .filter(|terminal| terminal.facility_type() == facility_type)
            .collect()
    }

    /// Terminals matching any of the given facility types, in registry order
    pub fn filter_by_types(&self, facility_types: &HashSet<FacilityType>) -> Vec<&Terminal> {
        self.terminals
            .iter()
            .filter(|terminal| facility_types.contains(terminal.facility_type()))
            .collect()
    }

    /// Terminals passing a combined filter, in registry order
    pub fn filter(&self, filter: &TerminalFilter) -> Vec<&Terminal> {
        filter.apply(&self.terminals)
    }

    /// Terminal names in registry order (duplicates included)
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.terminals.iter().map(Terminal::name)
    }

    /// Distinct statuses in first-seen order
    pub fn statuses(&self) -> Vec<&Status> {
        let mut seen = HashSet::new();
        self.terminals
            .iter()
            .map(Terminal::status)
            .filter(|status| seen.insert(*status))
            .collect()
    }

    /// Get all terminals
    #[inline]
    pub fn terminals(&self) -> &[Terminal] {
        &self.terminals
    }

    /// Get total number of terminals
    #[inline]
    pub fn len(&self) -> usize {
        self.terminals.len()
    }

    /// Check if no terminal survived loading
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.terminals.is_empty()
    }

    /// Summary of the load that produced this registry
    #[inline]
    pub fn report(&self) -> &LoadReport {
        &self.report
    }

    /// Process-unique identity of this load
    ///
    /// Two registries never share a revision, even when loaded from the same file.
    #[inline]
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Get registry information
    pub fn info(&self) -> RegistryInfo {
        let bounding_box_wgs84 = self.terminals.iter().fold(None, |bbox, terminal| {
            let (lat, lon) = (terminal.latitude(), terminal.longitude());
            Some(match bbox {
                None => (lat, lon, lat, lon),
                Some((min_lat, min_lon, max_lat, max_lon)) => (
                    f64::min(min_lat, lat),
                    f64::min(min_lon, lon),
                    f64::max(max_lat, lat),
                    f64::max(max_lon, lon),
                ),
            })
        });

        RegistryInfo {
            terminal_count: self.terminals.len(),
            total_capacity_mtpa: self.terminals.iter().map(Terminal::capacity_mtpa).sum(),
            bounding_box_wgs84,
        }
    }
}
