//! Wire types for the Smart Energy Monitoring backend.
//!
//! Field names mirror the backend JSON exactly (`Machine_ID`, `Power_kW`,
//! `Load_%`, camelCase analysis fields) via serde renames, so these structs
//! round-trip the API payloads without any mapping layer.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// GET /live
// ---------------------------------------------------------------------------

/// One telemetry row for a machine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MachineReading {
    #[serde(rename = "Machine_ID")]
    pub machine_id: String,
    /// Only the newer backend includes the model column.
    #[serde(rename = "Machine_Model", default, skip_serializing_if = "Option::is_none")]
    pub machine_model: Option<String>,
    #[serde(rename = "Power_kW")]
    pub power_kw: f64,
    #[serde(rename = "Energy_kWh")]
    pub energy_kwh: f64,
    #[serde(rename = "Load_%")]
    pub load_percent: f64,
    /// Passed through verbatim — the backend emits database text, not a
    /// normalized datetime.
    #[serde(rename = "Timestamp")]
    pub timestamp: String,
}

// ---------------------------------------------------------------------------
// GET /analytics
// ---------------------------------------------------------------------------

/// Fleet-wide aggregates.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalyticsSummary {
    #[serde(rename = "total_energy_kWh")]
    pub total_energy_kwh: f64,
    #[serde(rename = "avg_power_kW")]
    pub avg_power_kw: f64,
    pub avg_load_percent: f64,
}

// ---------------------------------------------------------------------------
// GET /alerts
// ---------------------------------------------------------------------------

/// A threshold alert raised by the backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Alert {
    #[serde(rename = "Machine_ID")]
    pub machine_id: String,
    pub message: String,
}

// ---------------------------------------------------------------------------
// POST /analysis
// ---------------------------------------------------------------------------

/// Operating profile submitted for analysis.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisRequest {
    pub machine_name: String,
    /// Planned on time in hours.
    pub on_time: f64,
    /// Planned off time in hours.
    pub off_time: f64,
}

/// Prediction returned by the analysis endpoint. The request's machine name
/// and hours are echoed back alongside the computed fields.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisReport {
    pub anomaly_status: String,
    pub predicted_cost: String,
    pub efficiency_score: f64,
    pub energy_wasted: String,
    pub machine_name: String,
    pub on_time: f64,
    pub off_time: f64,
}

// ---------------------------------------------------------------------------
// GET /dashboard
// ---------------------------------------------------------------------------

/// Aggregated dashboard payload: headline stats plus chart series.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardData {
    pub stats: EnergyStats,
    pub consumption_series: Vec<SeriesPoint>,
    pub efficiency_series: Vec<EfficiencyPoint>,
    pub predictions: Vec<PredictionSummary>,
}

/// Headline stat cards. Values are pre-formatted display strings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnergyStats {
    pub total_consumption: String,
    pub average_efficiency: String,
    pub total_cost: String,
    pub total_anomalies: u32,
}

/// One point on the consumption-over-time line chart.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeriesPoint {
    pub time: String,
    pub value: f64,
}

/// One bar on the machine efficiency comparison chart.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EfficiencyPoint {
    pub name: String,
    pub efficiency: f64,
}

/// One row of the prediction summary table.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PredictionSummary {
    pub id: u32,
    pub machine_name: String,
    pub status: String,
    pub predicted_cost: String,
    pub efficiency_score: f64,
}
