use serde::{Deserialize, Serialize};

use crate::config::ReportText;
use crate::types::{FinancialTotals, Metric};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerificationRow {
    pub metric: Metric,
    pub indicator: String,
    pub value: String,
    pub status: String,
}

/// Fixed-schema annex table: one header row and one row per [`Metric`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerificationTable {
    pub header: [String; 3],
    pub rows: Vec<VerificationRow>,
}

impl VerificationTable {
    pub fn from_totals(totals: &FinancialTotals, text: &ReportText) -> Self {
        let rows = Metric::ALL
            .iter()
            .map(|&metric| VerificationRow {
                metric,
                indicator: metric.indicator_label().to_string(),
                value: format!("{:.2}", totals.get(metric)),
                status: text.status.clone(),
            })
            .collect();
        Self {
            header: [
                text.header_indicator.clone(),
                text.header_value.clone(),
                text.header_status.clone(),
            ],
            rows,
        }
    }
}
