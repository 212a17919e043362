//! CLI command implementations for emon.
//!
//! Provides subcommand handlers for:
//! - `emon watch` — live machine telemetry, re-fetched on a fixed interval
//! - `emon live` / `analytics` / `alerts` / `dashboard` — one-shot views
//! - `emon analyze` — submit an operating profile for AI analysis
//! - `emon health` — backend reachability and config diagnostics
//! - `emon config show|init|path` — configuration management
//!
//! Every data view accepts `--demo` to render the built-in dataset through
//! the same fetch/view pipeline used against the real backend.

use std::thread;
use std::time::Duration;

use anyhow::{Context, Result};
use colored::Colorize;
use regex::Regex;

use crate::client::ApiClient;
use crate::client::models::{
    Alert, AnalysisReport, AnalysisRequest, AnalyticsSummary, DashboardData, MachineReading,
};
use crate::config;
use crate::demo;
use crate::fetch::FetchOutcome;
use crate::view::{self, Snapshot, Status};

/// Output format for data views.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Table,
    Json,
    Csv,
}

impl OutputFormat {
    pub fn from_str_opt(s: Option<&str>) -> Self {
        match s {
            Some("json") => Self::Json,
            Some("csv") => Self::Csv,
            _ => Self::Table,
        }
    }

    /// Resolve the effective format: explicit flag first, then the
    /// `[output] format` config key.
    fn resolve(flag: Option<&str>, config: &config::EmonConfig) -> Self {
        match flag {
            Some(s) => Self::from_str_opt(Some(s)),
            None => Self::from_str_opt(Some(&config.output.format)),
        }
    }
}

// ---------------------------------------------------------------------------
// emon watch
// ---------------------------------------------------------------------------

/// Poll the live endpoint and redraw the telemetry table on every delivery.
///
/// Runs until Ctrl+C, or for `duration_secs` when given, in which case the
/// poll handle is stopped explicitly on the way out.
pub fn run_watch(
    demo: bool,
    interval_ms: Option<u64>,
    duration_secs: Option<u64>,
    filter: Option<String>,
) -> Result<()> {
    let cfg = config::load();
    let interval = Duration::from_millis(interval_ms.unwrap_or(cfg.poll.interval_ms));
    let filter = compile_filter(filter)?;

    let source = if demo {
        "demo dataset".to_string()
    } else {
        format!("{}/live", cfg.backend.base_url)
    };

    let (watch_view, handle) = if demo {
        view::bind(move || FetchOutcome::success(demo::live()), interval)
    } else {
        let client = ApiClient::from_config(&cfg);
        view::bind(move || client.live(), interval)
    };

    let listener_source = source.clone();
    let listener_filter = filter.clone();
    watch_view.subscribe(move |snapshot: &Snapshot<Vec<MachineReading>>| {
        draw_watch_frame(snapshot, &listener_source, interval, listener_filter.as_ref());
    });
    // The first fetch may already have landed before the listener was
    // registered; draw whatever state we have so the screen is never blank.
    draw_watch_frame(&watch_view.snapshot(), &source, interval, filter.as_ref());

    match duration_secs {
        Some(secs) => {
            thread::sleep(Duration::from_secs(secs));
            handle.stop();
            println!("\n{}", "watch stopped".dimmed());
        }
        None => loop {
            // The poller worker does all the work; the main thread just
            // stays alive until Ctrl+C.
            thread::sleep(Duration::from_secs(60));
        },
    }

    Ok(())
}

/// Clear the terminal and redraw one watch frame.
fn draw_watch_frame(
    snapshot: &Snapshot<Vec<MachineReading>>,
    source: &str,
    interval: Duration,
    filter: Option<&Regex>,
) {
    print!("\x1b[2J\x1b[1;1H");
    println!("{}", "Live Machine Status".bold().cyan());
    println!("{}", "=".repeat(72));
    println!(
        "  source: {}   every {} ms   status: {}",
        source,
        interval.as_millis(),
        status_label(snapshot.status),
    );
    if let Some(at) = snapshot.last_updated {
        println!("  last updated: {}", at.format("%Y-%m-%d %H:%M:%S UTC"));
    }
    if let Some(kind) = snapshot.last_error {
        match snapshot.status {
            Status::Stale => println!(
                "  {} {} — showing last good data",
                "!".yellow().bold(),
                kind.to_string().yellow()
            ),
            _ => println!("  {} {}", "✗".red().bold(), kind.to_string().red()),
        }
    }
    println!();

    match &snapshot.data {
        Some(readings) => print_readings_table(readings, filter),
        None if snapshot.status == Status::Loading => {
            println!("  {}", "waiting for first fetch...".dimmed());
        }
        None => {
            println!("  {}", "no data — backend unreachable since start".red());
        }
    }
    println!();
    println!("{}", "Press Ctrl+C to stop.".dimmed());
}

fn status_label(status: Status) -> String {
    match status {
        Status::Loading => status.to_string().dimmed().to_string(),
        Status::Ready => status.to_string().green().to_string(),
        Status::Stale => status.to_string().yellow().to_string(),
        Status::Error => status.to_string().red().to_string(),
    }
}

// ---------------------------------------------------------------------------
// emon live
// ---------------------------------------------------------------------------

/// Fetch the live telemetry once and print it.
pub fn run_live(demo: bool, format: Option<&str>, filter: Option<String>) -> Result<()> {
    let cfg = config::load();
    let format = OutputFormat::resolve(format, &cfg);
    let filter = compile_filter(filter)?;

    let outcome = if demo {
        FetchOutcome::success(demo::live())
    } else {
        ApiClient::from_config(&cfg).live()
    };
    let readings = require(outcome)?;
    let readings: Vec<MachineReading> = readings
        .into_iter()
        .filter(|r| filter.as_ref().is_none_or(|re| re.is_match(&r.machine_id)))
        .collect();

    match format {
        OutputFormat::Json => print_json(&readings)?,
        OutputFormat::Csv => print_readings_csv(&readings),
        OutputFormat::Table => {
            println!("{}", "Live Machine Status".bold().cyan());
            println!("{}", "=".repeat(72));
            println!();
            print_readings_table(&readings, None);
        }
    }
    Ok(())
}

fn print_readings_table(readings: &[MachineReading], filter: Option<&Regex>) {
    let rows: Vec<&MachineReading> = readings
        .iter()
        .filter(|r| filter.is_none_or(|re| re.is_match(&r.machine_id)))
        .collect();

    if rows.is_empty() {
        println!("  {}", "no machines match".yellow());
        return;
    }

    println!(
        "  {:<12} {:<10} {:>10} {:>12} {:>8}  Timestamp",
        "Machine", "Model", "Power kW", "Energy kWh", "Load %"
    );
    println!("  {}", "-".repeat(70));

    for (i, r) in rows.iter().enumerate() {
        let load = format!("{:>7.1}%", r.load_percent);
        let load = if r.load_percent > 90.0 {
            load.red().to_string()
        } else if r.load_percent > 75.0 {
            load.yellow().to_string()
        } else {
            load
        };
        let line = format!(
            "  {:<12} {:<10} {:>10.2} {:>12.2} {}  {}",
            r.machine_id,
            r.machine_model.as_deref().unwrap_or("-"),
            r.power_kw,
            r.energy_kwh,
            load,
            r.timestamp,
        );
        if i % 2 == 0 {
            println!("{line}");
        } else {
            println!("{}", line.dimmed());
        }
    }
}

fn print_readings_csv(readings: &[MachineReading]) {
    println!("Machine_ID,Machine_Model,Power_kW,Energy_kWh,Load_%,Timestamp");
    for r in readings {
        println!(
            "{},{},{},{},{},{}",
            r.machine_id,
            r.machine_model.as_deref().unwrap_or(""),
            r.power_kw,
            r.energy_kwh,
            r.load_percent,
            r.timestamp,
        );
    }
}

// ---------------------------------------------------------------------------
// emon analytics
// ---------------------------------------------------------------------------

/// Fetch and print the fleet-wide aggregates.
pub fn run_analytics(demo: bool, format: Option<&str>) -> Result<()> {
    let cfg = config::load();
    let format = OutputFormat::resolve(format, &cfg);

    let outcome = if demo {
        FetchOutcome::success(demo::analytics())
    } else {
        ApiClient::from_config(&cfg).analytics()
    };
    let summary = require(outcome)?;

    match format {
        OutputFormat::Json => print_json(&summary)?,
        OutputFormat::Csv => {
            println!("total_energy_kWh,avg_power_kW,avg_load_percent");
            println!(
                "{},{},{}",
                summary.total_energy_kwh, summary.avg_power_kw, summary.avg_load_percent
            );
        }
        OutputFormat::Table => print_analytics_table(&summary),
    }
    Ok(())
}

fn print_analytics_table(summary: &AnalyticsSummary) {
    println!("{}", "Energy Analytics".bold().cyan());
    println!("{}", "=".repeat(40));
    println!();
    println!(
        "  {} {:.2} kWh",
        "Total energy: ".bold(),
        summary.total_energy_kwh
    );
    println!(
        "  {} {:.2} kW",
        "Average power:".bold(),
        summary.avg_power_kw
    );
    println!(
        "  {} {:.2}%",
        "Average load: ".bold(),
        summary.avg_load_percent
    );
}

// ---------------------------------------------------------------------------
// emon alerts
// ---------------------------------------------------------------------------

/// Fetch and print the active alerts.
pub fn run_alerts(demo: bool, format: Option<&str>, filter: Option<String>) -> Result<()> {
    let cfg = config::load();
    let format = OutputFormat::resolve(format, &cfg);
    let filter = compile_filter(filter)?;

    let outcome = if demo {
        FetchOutcome::success(demo::alerts())
    } else {
        ApiClient::from_config(&cfg).alerts()
    };
    let alerts = require(outcome)?;
    let alerts: Vec<Alert> = alerts
        .into_iter()
        .filter(|a| filter.as_ref().is_none_or(|re| re.is_match(&a.machine_id)))
        .collect();

    match format {
        OutputFormat::Json => print_json(&alerts)?,
        OutputFormat::Csv => {
            println!("Machine_ID,message");
            for a in &alerts {
                println!("{},{}", a.machine_id, a.message);
            }
        }
        OutputFormat::Table => {
            println!("{}", "Alerts".bold().cyan());
            println!("{}", "=".repeat(40));
            println!();
            if alerts.is_empty() {
                println!("  {}", "no active alerts".green());
            }
            for a in &alerts {
                println!(
                    "  {} {:<12} {}",
                    "▲".red().bold(),
                    a.machine_id,
                    a.message.red()
                );
            }
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// emon dashboard
// ---------------------------------------------------------------------------

/// Fetch and print the aggregated dashboard: stat cards, both chart series
/// rendered as terminal bars, and the prediction summaries.
pub fn run_dashboard(demo: bool, format: Option<&str>) -> Result<()> {
    let cfg = config::load();
    let format = OutputFormat::resolve(format, &cfg);

    let outcome = if demo {
        FetchOutcome::success(demo::dashboard())
    } else {
        ApiClient::from_config(&cfg).dashboard()
    };
    let data = require(outcome)?;

    match format {
        OutputFormat::Json => print_json(&data)?,
        OutputFormat::Csv => print_dashboard_csv(&data),
        OutputFormat::Table => print_dashboard_table(&data),
    }
    Ok(())
}

fn print_dashboard_table(data: &DashboardData) {
    println!("{}", "Energy Overview".bold().cyan());
    println!("{}", "=".repeat(60));
    println!();

    println!(
        "  {} {}",
        "Total consumption:  ".bold(),
        data.stats.total_consumption
    );
    println!(
        "  {} {}",
        "Average efficiency: ".bold(),
        data.stats.average_efficiency
    );
    println!(
        "  {} {}",
        "Total cost:         ".bold(),
        data.stats.total_cost
    );
    println!(
        "  {} {} (last 7 days)",
        "Anomalies detected: ".bold(),
        data.stats.total_anomalies
    );
    println!();

    println!("{}", "Energy Consumption Over Time (MWh)".bold().cyan());
    let max = data
        .consumption_series
        .iter()
        .map(|p| p.value)
        .fold(f64::MIN, f64::max);
    for p in &data.consumption_series {
        println!(
            "  {:<4} {:>7.1} {}",
            p.time,
            p.value,
            bar(p.value, max, 36).blue()
        );
    }
    println!();

    println!("{}", "Machine Efficiency Comparison (%)".bold().cyan());
    for p in &data.efficiency_series {
        println!(
            "  {:<10} {:>5.1} {}",
            p.name,
            p.efficiency,
            bar(p.efficiency, 100.0, 36).cyan()
        );
    }
    println!();

    if !data.predictions.is_empty() {
        println!("{}", "Prediction Summaries".bold().cyan());
        println!(
            "  {:<12} {:<10} {:>14} {:>8}",
            "Machine", "Status", "Pred. Cost", "Score"
        );
        println!("  {}", "-".repeat(48));
        for p in &data.predictions {
            let status = if p.status == "Anomaly" {
                p.status.red().to_string()
            } else {
                p.status.green().to_string()
            };
            println!(
                "  {:<12} {:<10} {:>14} {:>8.0}",
                p.machine_name, status, p.predicted_cost, p.efficiency_score
            );
        }
    }
}

fn print_dashboard_csv(data: &DashboardData) {
    println!("section,key,value");
    println!("stats,total_consumption,{}", data.stats.total_consumption);
    println!("stats,average_efficiency,{}", data.stats.average_efficiency);
    println!("stats,total_cost,{}", data.stats.total_cost);
    println!("stats,total_anomalies,{}", data.stats.total_anomalies);
    for p in &data.consumption_series {
        println!("consumption,{},{}", p.time, p.value);
    }
    for p in &data.efficiency_series {
        println!("efficiency,{},{}", p.name, p.efficiency);
    }
}

/// Scale `value` against `max` into a bar of at most `width` block glyphs.
fn bar(value: f64, max: f64, width: usize) -> String {
    if max <= 0.0 || value <= 0.0 {
        return String::new();
    }
    let filled = ((value / max) * width as f64).round() as usize;
    "█".repeat(filled.clamp(1, width))
}

// ---------------------------------------------------------------------------
// emon analyze
// ---------------------------------------------------------------------------

/// Submit an operating profile for analysis and print the prediction card.
pub fn run_analyze(
    demo: bool,
    machine: String,
    on_time: f64,
    off_time: f64,
    format: Option<&str>,
) -> Result<()> {
    let cfg = config::load();
    let format = OutputFormat::resolve(format, &cfg);
    let request = AnalysisRequest {
        machine_name: machine,
        on_time,
        off_time,
    };

    let report = if demo {
        demo::simulate_analysis(&request)
    } else {
        require(ApiClient::from_config(&cfg).analyze(&request))?
    };

    match format {
        OutputFormat::Json => print_json(&report)?,
        OutputFormat::Csv => {
            println!(
                "machineName,anomalyStatus,predictedCost,efficiencyScore,energyWasted,onTime,offTime"
            );
            println!(
                "{},{},{},{},{},{},{}",
                report.machine_name,
                report.anomaly_status,
                report.predicted_cost,
                report.efficiency_score,
                report.energy_wasted,
                report.on_time,
                report.off_time,
            );
        }
        OutputFormat::Table => print_analysis_card(&report),
    }
    Ok(())
}

fn print_analysis_card(report: &AnalysisReport) {
    println!("{}", "AI Prediction Result".bold().cyan());
    println!("{}", "=".repeat(40));
    println!();
    println!(
        "  {} {}",
        "Machine:              ".bold(),
        report.machine_name
    );
    println!(
        "  {} {}",
        "Anomaly status:       ".bold(),
        report.anomaly_status
    );
    println!(
        "  {} {}",
        "Predicted energy cost:".bold(),
        report.predicted_cost
    );
    println!(
        "  {} {:.0}",
        "Efficiency score:     ".bold(),
        report.efficiency_score
    );
    println!(
        "  {} {}",
        "Energy wasted:        ".bold(),
        report.energy_wasted
    );
    println!(
        "  {} {} h on / {} h off",
        "Operating profile:    ".bold(),
        report.on_time,
        report.off_time
    );
}

// ---------------------------------------------------------------------------
// emon health
// ---------------------------------------------------------------------------

/// Check backend reachability and local configuration.
pub fn run_health() -> Result<()> {
    println!("{}", "emon Health Check".bold().cyan());
    println!("{}", "=".repeat(40));

    let global_exists = config::global_config_file()
        .map(|p| p.exists())
        .unwrap_or(false);
    let project_exists = config::project_config_file()
        .map(|p| p.exists())
        .unwrap_or(false);
    let cfg = config::load();

    print_health_item(
        "Global config",
        global_exists,
        if global_exists {
            "~/.emon/config.toml found"
        } else {
            "not found (run `emon config init` to create)"
        },
    );
    print_health_item(
        "Project config",
        project_exists,
        if project_exists {
            ".emon.toml found"
        } else {
            "none (optional)"
        },
    );

    let client = ApiClient::from_config(&cfg);
    let reachable = client.is_reachable();
    let detail = if reachable {
        format!("reachable at {}", client.base_url())
    } else {
        format!(
            "not reachable at {} — is the backend running?",
            client.base_url()
        )
    };
    print_health_item("Backend", reachable, &detail);

    if reachable {
        let live_ok = client.live().is_success();
        print_health_item(
            "/live endpoint",
            live_ok,
            if live_ok {
                "responding with telemetry"
            } else {
                "reachable but not serving telemetry"
            },
        );
    }

    println!();
    Ok(())
}

fn print_health_item(name: &str, ok: bool, detail: &str) {
    let mark = if ok {
        "✓".green().bold()
    } else {
        "✗".red().bold()
    };
    println!("  {mark} {:<16} {}", name.bold(), detail.dimmed());
}

// ---------------------------------------------------------------------------
// emon config
// ---------------------------------------------------------------------------

/// Print the fully resolved configuration as TOML.
pub fn run_config_show() -> Result<()> {
    let cfg = config::load();
    println!("{}", "Resolved configuration".bold().cyan());
    println!();
    print!("{}", config::to_toml_text(&cfg)?);
    Ok(())
}

/// Create `~/.emon/config.toml` with the built-in defaults.
pub fn run_config_init() -> Result<()> {
    let path = config::init_global()?;
    println!("{} wrote {}", "✓".green().bold(), path.display());
    Ok(())
}

/// Print the global config path.
pub fn run_config_path() -> Result<()> {
    let path = config::global_config_file().context("could not resolve the home directory")?;
    println!("{}", path.display());
    Ok(())
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Unwrap a one-shot fetch, turning a failure outcome into a CLI error.
fn require<T>(outcome: FetchOutcome<T>) -> Result<T> {
    match outcome {
        FetchOutcome::Success { data, .. } => Ok(data),
        FetchOutcome::Failure { kind, message, .. } => {
            anyhow::bail!("{message} [{kind}]")
        }
    }
}

fn compile_filter(pattern: Option<String>) -> Result<Option<Regex>> {
    pattern
        .map(|p| Regex::new(&p).with_context(|| format!("invalid --filter pattern `{p}`")))
        .transpose()
}

fn print_json<T: serde::Serialize>(data: &T) -> Result<()> {
    println!(
        "{}",
        serde_json::to_string_pretty(data).context("failed to serialize JSON output")?
    );
    Ok(())
}
