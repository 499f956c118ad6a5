//! Filename classification into the three supported invoice layouts.
//!
//! Each courier sends invoices in a fixed spreadsheet layout identified by a
//! keyword somewhere in the filename. Classification is a pure function of
//! the filename; it never looks at the file body.

use crate::error::ClassificationError;

/// 1-based spreadsheet cell coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellRef {
    pub row: u32,
    pub col: u32,
}

impl CellRef {
    pub const fn new(row: u32, col: u32) -> Self {
        Self { row, col }
    }
}

/// The three supported invoice layouts.
///
/// Cell coordinates are the layout contract: they were lifted from the real
/// invoice templates and must not drift.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FormatVariant {
    /// "OCS" invoices: tracking in G2, ASINs from G17 down.
    Ocs,
    /// "TW" invoices: tracking in A12, ASINs from K16 down.
    Tw,
    /// "YP" invoices: tracking in F12, ASINs from J21 down. Excel bodies only.
    Yp,
}

/// Extensions accepted for spreadsheet bodies (compared case-insensitively).
pub const SPREADSHEET_EXTENSIONS: &[&str] = &["xls", "xlsx"];

/// Tie-break order for filenames matching more than one keyword. In
/// `Priority` mode the first match in this order wins.
const PRIORITY: &[FormatVariant] = &[FormatVariant::Ocs, FormatVariant::Tw, FormatVariant::Yp];

impl FormatVariant {
    /// Case-sensitive filename keyword identifying this layout.
    pub fn keyword(self) -> &'static str {
        match self {
            FormatVariant::Ocs => "OCS",
            FormatVariant::Tw => "TW",
            FormatVariant::Yp => "YP",
        }
    }

    /// Cell holding the shipment tracking number.
    pub fn tracking_cell(self) -> CellRef {
        match self {
            FormatVariant::Ocs => CellRef::new(2, 7),   // G2
            FormatVariant::Tw => CellRef::new(12, 1),   // A12
            FormatVariant::Yp => CellRef::new(12, 6),   // F12
        }
    }

    /// First cell of the downward ASIN run.
    pub fn asin_start_cell(self) -> CellRef {
        match self {
            FormatVariant::Ocs => CellRef::new(17, 7),  // G17
            FormatVariant::Tw => CellRef::new(16, 11),  // K16
            FormatVariant::Yp => CellRef::new(21, 10),  // J21
        }
    }

    /// Whether this variant claims the given filename. Yp additionally
    /// requires an Excel extension so a "YP" PDF is rejected outright
    /// instead of being mis-extracted.
    fn matches(self, filename: &str) -> bool {
        if !filename.contains(self.keyword()) {
            return false;
        }
        match self {
            FormatVariant::Yp => has_spreadsheet_extension(filename),
            _ => true,
        }
    }
}

/// How filenames matching more than one keyword are resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ClassifyMode {
    /// First match in the fixed Ocs, Tw, Yp order wins.
    #[default]
    Priority,
    /// Multi-keyword filenames are rejected as ambiguous.
    Strict,
}

/// Resolve a filename to its layout. Pure; no side effects.
pub fn classify(filename: &str, mode: ClassifyMode) -> Result<FormatVariant, ClassificationError> {
    let matched: Vec<FormatVariant> = PRIORITY
        .iter()
        .copied()
        .filter(|variant| variant.matches(filename))
        .collect();

    if matched.is_empty() {
        return Err(ClassificationError::NoMatch(filename.to_string()));
    }

    if matched.len() > 1 && mode == ClassifyMode::Strict {
        return Err(ClassificationError::Ambiguous {
            filename: filename.to_string(),
            keywords: matched.iter().map(|v| v.keyword()).collect(),
        });
    }

    Ok(matched[0])
}

/// Check the filename extension against the accepted spreadsheet set.
pub fn has_spreadsheet_extension(filename: &str) -> bool {
    std::path::Path::new(filename)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| {
            let ext = ext.to_lowercase();
            SPREADSHEET_EXTENSIONS.contains(&ext.as_str())
        })
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_keyword_matches() {
        assert_eq!(
            classify("invoice_OCS_001.xlsx", ClassifyMode::Priority),
            Ok(FormatVariant::Ocs)
        );
        assert_eq!(
            classify("TW_report.xls", ClassifyMode::Priority),
            Ok(FormatVariant::Tw)
        );
        assert_eq!(
            classify("2024_YP_batch.xlsx", ClassifyMode::Priority),
            Ok(FormatVariant::Yp)
        );
    }

    #[test]
    fn test_no_keyword_is_no_match() {
        assert_eq!(
            classify("receipt_2024.xlsx", ClassifyMode::Priority),
            Err(ClassificationError::NoMatch("receipt_2024.xlsx".to_string()))
        );
    }

    #[test]
    fn test_keyword_match_is_case_sensitive() {
        assert!(classify("invoice_ocs_001.xlsx", ClassifyMode::Priority).is_err());
        assert!(classify("tw_report.xls", ClassifyMode::Priority).is_err());
    }

    #[test]
    fn test_keyword_position_is_irrelevant() {
        assert_eq!(
            classify("OCS.xlsx", ClassifyMode::Priority),
            Ok(FormatVariant::Ocs)
        );
        assert_eq!(
            classify("report-final-TW", ClassifyMode::Priority),
            Ok(FormatVariant::Tw)
        );
    }

    #[test]
    fn test_yp_requires_excel_extension() {
        assert!(classify("YP_invoice.pdf", ClassifyMode::Priority).is_err());
        assert!(classify("YP_invoice", ClassifyMode::Priority).is_err());
        assert_eq!(
            classify("YP_invoice.XLSX", ClassifyMode::Priority),
            Ok(FormatVariant::Yp)
        );
    }

    #[test]
    fn test_ocs_and_tw_do_not_gate_on_extension() {
        // Non-Excel bodies surface as content errors at extraction time.
        assert_eq!(
            classify("OCS_scan.pdf", ClassifyMode::Priority),
            Ok(FormatVariant::Ocs)
        );
    }

    #[test]
    fn test_priority_tie_break() {
        // Contains both "OCS" and "TW"; Ocs is tested first.
        assert_eq!(
            classify("OCS_TW_combined.xlsx", ClassifyMode::Priority),
            Ok(FormatVariant::Ocs)
        );
        assert_eq!(
            classify("TW_YP_combined.xlsx", ClassifyMode::Priority),
            Ok(FormatVariant::Tw)
        );
    }

    #[test]
    fn test_strict_mode_rejects_ambiguous() {
        let err = classify("OCS_TW_combined.xlsx", ClassifyMode::Strict).unwrap_err();
        assert_eq!(
            err,
            ClassificationError::Ambiguous {
                filename: "OCS_TW_combined.xlsx".to_string(),
                keywords: vec!["OCS", "TW"],
            }
        );
    }

    #[test]
    fn test_strict_mode_accepts_single_match() {
        assert_eq!(
            classify("invoice_OCS.xlsx", ClassifyMode::Strict),
            Ok(FormatVariant::Ocs)
        );
    }

    #[test]
    fn test_coordinates_match_layout_contract() {
        assert_eq!(FormatVariant::Ocs.tracking_cell(), CellRef::new(2, 7));
        assert_eq!(FormatVariant::Ocs.asin_start_cell(), CellRef::new(17, 7));
        assert_eq!(FormatVariant::Tw.tracking_cell(), CellRef::new(12, 1));
        assert_eq!(FormatVariant::Tw.asin_start_cell(), CellRef::new(16, 11));
        assert_eq!(FormatVariant::Yp.tracking_cell(), CellRef::new(12, 6));
        assert_eq!(FormatVariant::Yp.asin_start_cell(), CellRef::new(21, 10));
    }
}
