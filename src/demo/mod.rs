//! Hard-coded demo dataset — the offline stand-in for the backend.
//!
//! Mirrors the static frontend variant: a fixed fleet of five machines with
//! plausible telemetry, the weekly consumption series, prediction summaries,
//! and a canned analysis result. Demo mode feeds these through the exact
//! same fetch/poll/view path as the live backend, so every view renders
//! identically with `--demo`.
//!
//! The analytics and alert views are *derived* from the telemetry rows using
//! the backend's own rules (sum/average aggregates, the >80 kW and >90 %
//! load thresholds) rather than stored separately, so the demo dataset can
//! never disagree with itself.

use crate::client::models::{
    Alert, AnalysisReport, AnalysisRequest, AnalyticsSummary, DashboardData, EfficiencyPoint,
    EnergyStats, MachineReading, PredictionSummary, SeriesPoint,
};

/// Power threshold (kW) above which a machine raises an alert.
const HIGH_POWER_KW: f64 = 80.0;

/// Load threshold (%) above which a machine raises an alert.
const OVERLOAD_PERCENT: f64 = 90.0;

/// Machine name substituted when the analysis form is submitted empty.
const UNNAMED_MACHINE: &str = "Unnamed Machine";

/// Latest telemetry for the demo fleet, newest first.
pub fn live() -> Vec<MachineReading> {
    let rows = [
        ("Mixer-05", "MX-230", 46.1, 262.0, 71.9, "2026-08-27 08:20:00"),
        ("Welder-04", "WL-340", 88.4, 310.5, 76.3, "2026-08-27 08:15:00"),
        ("Cutter-03", "CT-150", 39.8, 198.2, 64.0, "2026-08-27 08:10:00"),
        ("Lathe-02", "LT-820", 57.6, 241.7, 93.5, "2026-08-27 08:05:00"),
        ("Press-01", "PR-900", 72.3, 335.4, 81.2, "2026-08-27 08:00:00"),
    ];
    rows.into_iter()
        .map(
            |(id, model, power_kw, energy_kwh, load_percent, timestamp)| MachineReading {
                machine_id: id.to_string(),
                machine_model: Some(model.to_string()),
                power_kw,
                energy_kwh,
                load_percent,
                timestamp: timestamp.to_string(),
            },
        )
        .collect()
}

/// Fleet aggregates computed from [`live`] the way the backend computes them:
/// energy summed, power and load averaged, rounded to two decimals.
pub fn analytics() -> AnalyticsSummary {
    let readings = live();
    let n = readings.len() as f64;
    let total_energy: f64 = readings.iter().map(|r| r.energy_kwh).sum();
    let avg_power: f64 = readings.iter().map(|r| r.power_kw).sum::<f64>() / n;
    let avg_load: f64 = readings.iter().map(|r| r.load_percent).sum::<f64>() / n;

    AnalyticsSummary {
        total_energy_kwh: round2(total_energy),
        avg_power_kw: round2(avg_power),
        avg_load_percent: round2(avg_load),
    }
}

/// Threshold alerts derived from [`live`]. High power takes precedence over
/// overload when a machine trips both.
pub fn alerts() -> Vec<Alert> {
    live()
        .iter()
        .filter_map(|r| {
            let message = if r.power_kw > HIGH_POWER_KW {
                "High Power Consumption"
            } else if r.load_percent > OVERLOAD_PERCENT {
                "Machine Overloaded"
            } else {
                return None;
            };
            Some(Alert {
                machine_id: r.machine_id.clone(),
                message: message.to_string(),
            })
        })
        .collect()
}

/// The dashboard payload shown on the demo home page.
pub fn dashboard() -> DashboardData {
    DashboardData {
        stats: EnergyStats {
            total_consumption: "1,250 MWh".to_string(),
            average_efficiency: "92.4%".to_string(),
            total_cost: "$342,000".to_string(),
            total_anomalies: 18,
        },
        consumption_series: [
            ("Mon", 180.0),
            ("Tue", 195.0),
            ("Wed", 210.0),
            ("Thu", 190.0),
            ("Fri", 220.0),
            ("Sat", 205.0),
            ("Sun", 198.0),
        ]
        .into_iter()
        .map(|(time, value)| SeriesPoint {
            time: time.to_string(),
            value,
        })
        .collect(),
        efficiency_series: [
            ("Press-01", 94.0),
            ("Lathe-02", 88.0),
            ("Cutter-03", 91.0),
            ("Welder-04", 86.0),
            ("Mixer-05", 95.0),
        ]
        .into_iter()
        .map(|(name, efficiency)| EfficiencyPoint {
            name: name.to_string(),
            efficiency,
        })
        .collect(),
        predictions: vec![
            prediction(1, "Press-01", "Normal", "$12,400", 95.0),
            prediction(2, "Lathe-02", "Anomaly", "$18,900", 82.0),
            prediction(3, "Cutter-03", "Normal", "$9,750", 93.0),
        ],
    }
}

/// Client-side stand-in for `POST /analysis`: the canned prediction with the
/// request's machine name and hours echoed back.
pub fn simulate_analysis(request: &AnalysisRequest) -> AnalysisReport {
    let machine_name = if request.machine_name.trim().is_empty() {
        UNNAMED_MACHINE.to_string()
    } else {
        request.machine_name.clone()
    };

    AnalysisReport {
        anomaly_status: "Low Anomaly Risk".to_string(),
        predicted_cost: "$15,200 / month".to_string(),
        efficiency_score: 89.0,
        energy_wasted: "3.8%".to_string(),
        machine_name,
        on_time: request.on_time,
        off_time: request.off_time,
    }
}

fn prediction(
    id: u32,
    machine_name: &str,
    status: &str,
    predicted_cost: &str,
    efficiency_score: f64,
) -> PredictionSummary {
    PredictionSummary {
        id,
        machine_name: machine_name.to_string(),
        status: status.to_string(),
        predicted_cost: predicted_cost.to_string(),
        efficiency_score,
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
