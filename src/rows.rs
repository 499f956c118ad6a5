//! Destination row construction.

use crate::extractor::ExtractedRecord;

/// What to emit for an invoice that classified and parsed fine but carried
/// zero ASINs. Explicit configuration so blank invoices are never silently
/// dropped or silently written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ZeroIdentifierPolicy {
    /// Emit no rows. Default, so the destination sheet stays free of
    /// empty entries.
    #[default]
    Skip,
    /// Emit one row with an empty ASIN field so the file still shows up.
    Placeholder,
}

/// One row appended to the destination worksheet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SheetRow {
    pub filename: String,
    /// Layout keyword ("OCS", "TW", "YP").
    pub file_type: String,
    pub tracking_number: String,
    /// Empty for placeholder rows.
    pub asin: String,
}

/// Fan a record out into destination rows: one row per ASIN, each carrying
/// the shared tracking number.
pub fn build_rows(record: &ExtractedRecord, policy: ZeroIdentifierPolicy) -> Vec<SheetRow> {
    let base = |asin: String| SheetRow {
        filename: record.filename.clone(),
        file_type: record.variant.keyword().to_string(),
        tracking_number: record.tracking_number.clone(),
        asin,
    };

    if record.asins.is_empty() {
        return match policy {
            ZeroIdentifierPolicy::Skip => Vec::new(),
            ZeroIdentifierPolicy::Placeholder => vec![base(String::new())],
        };
    }

    record.asins.iter().map(|asin| base(asin.clone())).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::FormatVariant;

    fn record(tracking: &str, asins: &[&str]) -> ExtractedRecord {
        ExtractedRecord {
            file_id: "file-1".to_string(),
            filename: "invoice_OCS_001.xlsx".to_string(),
            variant: FormatVariant::Ocs,
            tracking_number: tracking.to_string(),
            asins: asins.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[test]
    fn test_one_row_per_asin() {
        let rows = build_rows(&record("TRK123", &["B001", "B002"]), ZeroIdentifierPolicy::Skip);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].tracking_number, "TRK123");
        assert_eq!(rows[0].asin, "B001");
        assert_eq!(rows[1].tracking_number, "TRK123");
        assert_eq!(rows[1].asin, "B002");
        assert!(rows.iter().all(|r| r.file_type == "OCS"));
    }

    #[test]
    fn test_zero_asins_skip_policy() {
        let rows = build_rows(&record("", &[]), ZeroIdentifierPolicy::Skip);
        assert!(rows.is_empty());
    }

    #[test]
    fn test_zero_asins_placeholder_policy() {
        let rows = build_rows(&record("TRK9", &[]), ZeroIdentifierPolicy::Placeholder);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].tracking_number, "TRK9");
        assert_eq!(rows[0].asin, "");
    }

    #[test]
    fn test_placeholder_policy_does_not_affect_nonempty_records() {
        let rows = build_rows(&record("T", &["B001"]), ZeroIdentifierPolicy::Placeholder);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].asin, "B001");
    }
}
