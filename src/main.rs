use anyhow::Result;
use clap::{Parser, Subcommand};

use emon::cli;

#[derive(Debug, Parser)]
#[command(name = "emon")]
#[command(about = "Terminal client for the Smart Energy Monitoring backend")]
struct App {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Poll live machine telemetry and redraw it on every refresh
    Watch {
        /// Refresh interval in milliseconds (default: [poll] interval_ms)
        #[arg(long)]
        interval_ms: Option<u64>,
        /// Stop after this many seconds instead of running until Ctrl+C
        #[arg(long)]
        duration: Option<u64>,
        /// Only show machines whose ID matches this regex
        #[arg(long)]
        filter: Option<String>,
        /// Use the built-in demo dataset instead of the backend
        #[arg(long)]
        demo: bool,
    },
    /// Fetch live machine telemetry once
    Live {
        /// Output format: table (default), json, csv
        #[arg(long)]
        format: Option<String>,
        /// Only show machines whose ID matches this regex
        #[arg(long)]
        filter: Option<String>,
        /// Use the built-in demo dataset instead of the backend
        #[arg(long)]
        demo: bool,
    },
    /// Show fleet-wide energy analytics
    Analytics {
        /// Output format: table (default), json, csv
        #[arg(long)]
        format: Option<String>,
        /// Use the built-in demo dataset instead of the backend
        #[arg(long)]
        demo: bool,
    },
    /// Show active machine alerts
    Alerts {
        /// Output format: table (default), json, csv
        #[arg(long)]
        format: Option<String>,
        /// Only show alerts whose machine ID matches this regex
        #[arg(long)]
        filter: Option<String>,
        /// Use the built-in demo dataset instead of the backend
        #[arg(long)]
        demo: bool,
    },
    /// Show the aggregated energy dashboard
    Dashboard {
        /// Output format: table (default), json, csv
        #[arg(long)]
        format: Option<String>,
        /// Use the built-in demo dataset instead of the backend
        #[arg(long)]
        demo: bool,
    },
    /// Run AI analysis for one machine's operating profile
    Analyze {
        /// Machine name, e.g. Press-01
        machine: String,
        /// Planned on time in hours
        #[arg(long)]
        on_time: f64,
        /// Planned off time in hours
        #[arg(long)]
        off_time: f64,
        /// Output format: table (default), json, csv
        #[arg(long)]
        format: Option<String>,
        /// Simulate the analysis locally instead of calling the backend
        #[arg(long)]
        demo: bool,
    },
    /// Check backend reachability and local configuration
    Health,
    /// Manage emon configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Debug, Subcommand)]
enum ConfigAction {
    /// Print the fully resolved configuration
    Show,
    /// Create ~/.emon/config.toml with the built-in defaults
    Init,
    /// Print the global config file path
    Path,
}

fn main() -> Result<()> {
    let app = App::parse();

    match app.command {
        Commands::Watch {
            interval_ms,
            duration,
            filter,
            demo,
        } => cli::run_watch(demo, interval_ms, duration, filter),
        Commands::Live {
            format,
            filter,
            demo,
        } => cli::run_live(demo, format.as_deref(), filter),
        Commands::Analytics { format, demo } => cli::run_analytics(demo, format.as_deref()),
        Commands::Alerts {
            format,
            filter,
            demo,
        } => cli::run_alerts(demo, format.as_deref(), filter),
        Commands::Dashboard { format, demo } => cli::run_dashboard(demo, format.as_deref()),
        Commands::Analyze {
            machine,
            on_time,
            off_time,
            format,
            demo,
        } => cli::run_analyze(demo, machine, on_time, off_time, format.as_deref()),
        Commands::Health => cli::run_health(),
        Commands::Config { action } => match action {
            ConfigAction::Show => cli::run_config_show(),
            ConfigAction::Init => cli::run_config_init(),
            ConfigAction::Path => cli::run_config_path(),
        },
    }
}
