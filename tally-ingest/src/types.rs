use serde::{Deserialize, Serialize};

/// The two figures a monthly statement contributes to the sheet.
///
/// Kept as text the way the statement prints them (minus the `$`), so the
/// sheet receives exactly what the statement says.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatementSummary {
    /// Account total at the end of the period
    pub balance: String,
    /// Net deposits during the period; `0.00` when the statement shows `-`
    pub deposits: String,
}
