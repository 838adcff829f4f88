//! Market Survey Analysis Tool workbook generator.
//!
//! Builds a three-sheet xlsx workbook for tracking student-housing
//! prelease statistics: an editable market-averages sheet, a
//! property/floorplan data-entry grid, and a read-only summary report.
//! All derived values are spreadsheet formulas evaluated by the host
//! application; missing inputs degrade to blank cells rather than
//! formula errors.
//!
//! [`generate_workbook`] is the whole front door; the underlying
//! building blocks (worksheet grid, style registry, formula builders)
//! are exposed for reuse.

pub mod formula;
pub mod sheet;
pub mod styles;
pub mod types;
pub mod workbook;
pub mod writer;
mod xml;

pub use types::{Bedroom, SampleRow, WorkbookError};
pub use workbook::{
    generate_workbook, sample_rows, ENTRY_ROW_CAPACITY, ENTRY_SHEET, MARKET_SHEET, REPORT_SHEET,
};
