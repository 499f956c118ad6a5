//! Positional extraction of tracking numbers and ASIN runs.
//!
//! Extraction is positional, not interpretive: each layout pins a single
//! tracking cell and the first cell of a downward ASIN run, and nothing is
//! derived across cells.

use crate::classifier::FormatVariant;
use crate::grid::CellGrid;

/// Upper bound on rows scanned for the ASIN run. The invoice templates top
/// out far below this; the cap keeps a pathological sheet from scanning
/// unbounded.
pub const MAX_IDENTIFIER_ROWS: u32 = 1_000;

/// One invoice's worth of extracted data. Immutable once produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedRecord {
    /// Storage-backend identifier of the source file, kept for traceability.
    pub file_id: String,
    pub filename: String,
    pub variant: FormatVariant,
    /// Empty string when the tracking cell is blank. Not an error.
    pub tracking_number: String,
    /// ASINs in top-to-bottom order, trimmed of surrounding whitespace.
    pub asins: Vec<String>,
}

/// Read the variant's fixed cells out of a parsed grid.
///
/// The ASIN run is contiguous: scanning stops at the first absent or blank
/// cell and never skips gaps.
pub fn extract(
    grid: &dyn CellGrid,
    variant: FormatVariant,
    file_id: &str,
    filename: &str,
) -> ExtractedRecord {
    let tracking_cell = variant.tracking_cell();
    let tracking_number = grid
        .cell(tracking_cell.row, tracking_cell.col)
        .map(|value| value.trim().to_string())
        .unwrap_or_default();

    let start = variant.asin_start_cell();
    let mut asins = Vec::new();
    for row in start.row..start.row.saturating_add(MAX_IDENTIFIER_ROWS) {
        match grid.cell(row, start.col) {
            Some(value) => {
                let value = value.trim();
                if value.is_empty() {
                    break;
                }
                asins.push(value.to_string());
            }
            None => break,
        }
    }

    ExtractedRecord {
        file_id: file_id.to_string(),
        filename: filename.to_string(),
        variant,
        tracking_number,
        asins,
    }
}
