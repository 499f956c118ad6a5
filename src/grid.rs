//! Typed access to spreadsheet cell grids.
//!
//! Downloaded invoice bodies are parsed with calamine and exposed through the
//! [`CellGrid`] trait so extraction code (and its tests) never touch the
//! workbook types directly.

use std::collections::HashMap;
use std::io::Cursor;

use calamine::{open_workbook_from_rs, Data, Range, Reader, Xls, Xlsx};

use crate::error::ContentError;

/// Read-only grid of cell values with 1-based (row, column) addressing.
///
/// `None` means the cell is absent from the sheet; `Some("")` means the cell
/// exists but holds an empty string. Extraction treats both as empty, but the
/// accessor keeps them distinguishable.
pub trait CellGrid: Send + Sync {
    fn cell(&self, row: u32, col: u32) -> Option<String>;
}

/// First worksheet of a downloaded Excel body.
#[derive(Debug)]
pub struct SheetGrid {
    range: Range<Data>,
}

impl SheetGrid {
    /// Parse a downloaded body under the format its filename extension
    /// claims. A body that cannot be opened under that extension is a
    /// content error, not a transport error.
    pub fn from_bytes(filename: &str, bytes: Vec<u8>) -> Result<Self, ContentError> {
        let ext = std::path::Path::new(filename)
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase());

        let cursor = Cursor::new(bytes);
        let range = match ext.as_deref() {
            Some("xlsx") => {
                let mut workbook: Xlsx<_> = open_workbook_from_rs(cursor)
                    .map_err(|e| ContentError(format!("failed to open {} as xlsx: {}", filename, e)))?;
                first_worksheet(&mut workbook)?
            }
            Some("xls") => {
                let mut workbook: Xls<_> = open_workbook_from_rs(cursor)
                    .map_err(|e| ContentError(format!("failed to open {} as xls: {}", filename, e)))?;
                first_worksheet(&mut workbook)?
            }
            other => {
                return Err(ContentError(format!(
                    "unsupported spreadsheet extension {:?} for {}",
                    other, filename
                )));
            }
        };

        Ok(Self { range })
    }
}

impl CellGrid for SheetGrid {
    fn cell(&self, row: u32, col: u32) -> Option<String> {
        if row == 0 || col == 0 {
            return None;
        }
        let value = self.range.get_value((row - 1, col - 1))?;
        match value {
            Data::Empty => None,
            Data::String(s) => Some(s.clone()),
            // Numeric and date cells are rendered as plain text, matching
            // what the destination sheet expects.
            other => Some(other.to_string()),
        }
    }
}

fn first_worksheet<R>(workbook: &mut R) -> Result<Range<Data>, ContentError>
where
    R: Reader<Cursor<Vec<u8>>>,
    R::Error: std::fmt::Display,
{
    match workbook.worksheet_range_at(0) {
        Some(Ok(range)) => Ok(range),
        Some(Err(e)) => Err(ContentError(format!("failed to read first worksheet: {}", e))),
        None => Err(ContentError("workbook has no worksheets".to_string())),
    }
}

/// In-memory grid used by tests and fake fetchers.
#[derive(Debug, Clone, Default)]
pub struct VecGrid {
    cells: HashMap<(u32, u32), String>,
}

impl VecGrid {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, row: u32, col: u32, value: &str) {
        self.cells.insert((row, col), value.to_string());
    }

    /// Builder-style `set` for test setup.
    pub fn with(mut self, row: u32, col: u32, value: &str) -> Self {
        self.set(row, col, value);
        self
    }
}

impl CellGrid for VecGrid {
    fn cell(&self, row: u32, col: u32) -> Option<String> {
        self.cells.get(&(row, col)).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vec_grid_distinguishes_absent_and_blank() {
        let grid = VecGrid::new().with(1, 1, "");
        assert_eq!(grid.cell(1, 1), Some(String::new()));
        assert_eq!(grid.cell(2, 1), None);
    }

    #[test]
    fn test_unsupported_extension_is_content_error() {
        let err = SheetGrid::from_bytes("invoice_OCS.pdf", vec![1, 2, 3]).unwrap_err();
        assert!(err.0.contains("unsupported spreadsheet extension"));
    }

    #[test]
    fn test_garbage_body_is_content_error() {
        let err = SheetGrid::from_bytes("invoice_OCS.xlsx", b"not a zip".to_vec()).unwrap_err();
        assert!(err.0.contains("failed to open"));
    }

    #[test]
    fn test_vec_grid_set_overwrites() {
        let mut grid = VecGrid::new();
        grid.set(5, 5, "first");
        grid.set(5, 5, "second");
        assert_eq!(grid.cell(5, 5), Some("second".to_string()));
    }
}
