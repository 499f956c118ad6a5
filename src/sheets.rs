//! Google Sheets v4 writer: appends extracted rows to the invoice worksheet.
//!
//! One `values.append` call per file, all-or-nothing. If the destination
//! worksheet does not exist yet it is created with a header row and the
//! append is retried once.

use async_trait::async_trait;
use serde::Serialize;
use serde_json::json;

use crate::error::WriteError;
use crate::http_client::google_client;
use crate::pipeline::SheetWriter;
use crate::rows::SheetRow;

const SHEETS_URL: &str = "https://sheets.googleapis.com/v4/spreadsheets";
const HEADER_ROW: [&str; 4] = ["File name", "File type", "Tracking number", "ASIN"];

pub struct SheetsClient {
    access_token: String,
    spreadsheet_id: String,
    worksheet: String,
}

#[derive(Serialize)]
struct ValueRange {
    values: Vec<Vec<String>>,
}

enum AppendOutcome {
    Appended,
    MissingWorksheet,
}

impl SheetsClient {
    pub fn new(access_token: String, spreadsheet_id: String, worksheet: String) -> Self {
        Self {
            access_token,
            spreadsheet_id,
            worksheet,
        }
    }

    fn append_url(&self) -> String {
        format!(
            "{}/{}/values/{}!A1:append",
            SHEETS_URL, self.spreadsheet_id, self.worksheet
        )
    }

    async fn try_append(&self, values: &[Vec<String>]) -> Result<AppendOutcome, WriteError> {
        let body = ValueRange {
            values: values.to_vec(),
        };
        let response = google_client()
            .post(self.append_url())
            .bearer_auth(&self.access_token)
            .query(&[
                ("valueInputOption", "RAW"),
                ("insertDataOption", "INSERT_ROWS"),
            ])
            .json(&body)
            .send()
            .await
            .map_err(|e| WriteError(format!("Sheets append request failed: {}", e)))?;

        let status = response.status();
        if status.is_success() {
            return Ok(AppendOutcome::Appended);
        }

        let text = response.text().await.unwrap_or_default();
        // A missing worksheet surfaces as a range-parse failure.
        if status == reqwest::StatusCode::BAD_REQUEST && text.contains("Unable to parse range") {
            return Ok(AppendOutcome::MissingWorksheet);
        }

        Err(WriteError(format!(
            "Sheets append returned {}: {}",
            status, text
        )))
    }

    async fn create_worksheet(&self) -> Result<(), WriteError> {
        let body = json!({
            "requests": [{
                "addSheet": {
                    "properties": { "title": self.worksheet }
                }
            }]
        });
        let url = format!("{}/{}:batchUpdate", SHEETS_URL, self.spreadsheet_id);
        let response = google_client()
            .post(&url)
            .bearer_auth(&self.access_token)
            .json(&body)
            .send()
            .await
            .map_err(|e| WriteError(format!("worksheet creation request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(WriteError(format!(
                "worksheet creation returned {}: {}",
                status, text
            )));
        }

        // Header row first so the appended data lands below it.
        let header = vec![HEADER_ROW.iter().map(|s| s.to_string()).collect()];
        match self.try_append(&header).await? {
            AppendOutcome::Appended => Ok(()),
            AppendOutcome::MissingWorksheet => Err(WriteError(format!(
                "worksheet '{}' still missing after creation",
                self.worksheet
            ))),
        }
    }
}

#[async_trait]
impl SheetWriter for SheetsClient {
    async fn append_rows(&self, rows: &[SheetRow]) -> Result<(), WriteError> {
        let values: Vec<Vec<String>> = rows
            .iter()
            .map(|row| {
                vec![
                    row.filename.clone(),
                    row.file_type.clone(),
                    row.tracking_number.clone(),
                    row.asin.clone(),
                ]
            })
            .collect();

        match self.try_append(&values).await? {
            AppendOutcome::Appended => {
                tracing::info!("appended {} row(s) to '{}'", values.len(), self.worksheet);
                Ok(())
            }
            AppendOutcome::MissingWorksheet => {
                tracing::info!("worksheet '{}' missing, creating it", self.worksheet);
                self.create_worksheet().await?;
                match self.try_append(&values).await? {
                    AppendOutcome::Appended => {
                        tracing::info!(
                            "appended {} row(s) to new worksheet '{}'",
                            values.len(),
                            self.worksheet
                        );
                        Ok(())
                    }
                    AppendOutcome::MissingWorksheet => Err(WriteError(format!(
                        "worksheet '{}' still missing after creation",
                        self.worksheet
                    ))),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_append_url_targets_worksheet() {
        let client = SheetsClient::new(
            "token".to_string(),
            "sheet-id".to_string(),
            "invoice".to_string(),
        );
        assert_eq!(
            client.append_url(),
            "https://sheets.googleapis.com/v4/spreadsheets/sheet-id/values/invoice!A1:append"
        );
    }
}
