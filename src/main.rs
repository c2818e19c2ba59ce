//! ==============================================================================
//! main.rs - terminal dashboard entry point
//! ==============================================================================
//!
//! purpose:
//!     command line front end for the aqms api. `watch` (the default) is the
//!     live dashboard: it polls the current reading on a fixed interval and
//!     prints one line per poll. the other subcommands are one-shot views of
//!     the history, chart, stats, export, and settings screens.
//!
//! responsibilities:
//!     - load aqms.toml, then start tracing at the configured level
//!     - open the settings store from the local cache and reconcile it with
//!       the server in the background
//!     - classify readings against the user's thresholds, not the server's
//!
//! architecture:
//!
//!     ┌──────────────────────────────────────────────────────────┐
//!     │                      main.rs (this file)                  │
//!     │  ┌──────────────┐   ┌──────────────┐   ┌──────────────┐  │
//!     │  │ poll loop    │   │ settings     │   │ one-shot     │  │
//!     │  │ (120s cycle) │   │ refresh task │   │ views        │  │
//!     │  └──────┬───────┘   └──────┬───────┘   └──────┬───────┘  │
//!     │         └──────────────────┼──────────────────┘          │
//!     │                  ┌─────────┴─────────┐                   │
//!     │                  │ AqmsService       │ <- api/service.rs │
//!     │                  │ SettingsStore     │ <- settings/      │
//!     │                  └─────────┬─────────┘                   │
//!     └────────────────────────────┼─────────────────────────────┘
//!                                  │ https
//!                           remote aqms api
//!
//! ==============================================================================

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use chrono::Utc;
use clap::{Parser, Subcommand};

use aqms::aggregate;
use aqms::api::{ApiClient, AqmsService};
use aqms::config::DashboardConfig;
use aqms::dates::{self, Window};
use aqms::domain::{
    ChartInterval, ChartRange, ChartSeries, ExportFormat, ExportParams, HistoryFilters, LiveRange,
    StatusFilter,
};
use aqms::logging;
use aqms::settings::{
    ChartType, FileStorage, MemoryStorage, Notifications, SettingsPatch, SettingsStorage,
    SettingsStore, Theme, Thresholds, UserSettings,
};
use aqms::status::{self, Trend};

type Store = SettingsStore<Box<dyn SettingsStorage>, fn(Theme)>;

// ==============================================================================
// command line
// ==============================================================================

#[derive(Parser)]
#[command(name = "aqms", version, about = "Air quality monitor dashboard")]
struct Cli {
    /// Path to aqms.toml (default: ./config/aqms.toml, then ../config/aqms.toml)
    #[arg(long, global = true, env = "AQMS_CONFIG")]
    config: Option<PathBuf>,

    /// Override the api base url from the config file
    #[arg(long, global = true, env = "AQMS_API_URL")]
    api_url: Option<String>,

    /// Log level (trace, debug, info, warn, error); RUST_LOG wins if set
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Live dashboard: poll the current reading until ctrl-c
    Watch {
        /// Seconds between polls (default: polling.interval_seconds)
        #[arg(long)]
        interval: Option<u64>,
    },
    /// Current reading with its status
    Current,
    /// Most recent raw input
    Latest,
    /// Readings inside a live window, averaged per hour
    Range {
        #[arg(default_value = "1h")]
        range: LiveRange,
    },
    /// Paginated history log
    History {
        #[arg(long, default_value = "24h")]
        window: ChartRange,
        #[arg(long, default_value = "all")]
        status: StatusFilter,
        #[arg(long, default_value_t = 20)]
        limit: u32,
        #[arg(long, default_value_t = 0)]
        offset: u32,
    },
    /// Aggregated co2 chart
    Chart {
        #[arg(default_value = "24h")]
        range: ChartRange,
        #[arg(long)]
        interval: Option<ChartInterval>,
    },
    /// Min / max / average and status distribution
    Stats {
        #[arg(long, default_value = "7d")]
        window: ChartRange,
    },
    /// Download history as csv or json
    Export {
        #[arg(long, default_value = "csv")]
        format: ExportFormat,
        #[arg(long, default_value = "7d")]
        window: ChartRange,
        /// Output file (default: aqms-export-<date>.<format>)
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Show or change user settings
    Settings {
        #[command(subcommand)]
        action: SettingsCommand,
    },
}

#[derive(Subcommand)]
enum SettingsCommand {
    /// Print the effective settings
    Show,
    /// Change settings and save them to the server
    Set {
        #[arg(long)]
        theme: Option<Theme>,
        /// Switch between light and dark
        #[arg(long, conflicts_with = "theme")]
        toggle_theme: bool,
        #[arg(long)]
        chart: Option<ChartType>,
        /// Warning threshold in ppm
        #[arg(long)]
        warning: Option<f64>,
        /// Danger threshold in ppm
        #[arg(long)]
        danger: Option<f64>,
        /// on | off
        #[arg(long, value_parser = parse_switch)]
        notifications: Option<bool>,
        /// on | off
        #[arg(long, value_parser = parse_switch)]
        push: Option<bool>,
    },
}

fn parse_switch(s: &str) -> Result<bool, String> {
    match s {
        "on" | "true" | "yes" => Ok(true),
        "off" | "false" | "no" => Ok(false),
        other => Err(format!("expected on|off, got `{}`", other)),
    }
}

// ==============================================================================
// main entry point
// ==============================================================================

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // step 1: configuration, then logging at the configured level
    let (mut config, note) = DashboardConfig::load_or_default(cli.config.as_deref());
    let level = cli.log_level.clone().unwrap_or_else(|| config.logging.level.clone());
    logging::init_tracing(&level);
    note.log();

    if let Some(url) = cli.api_url {
        config.api.base_url = url;
    }

    // step 2: api client
    let client = ApiClient::new(config.api.base_url.clone(), config.api.timeout())
        .context("failed to create api client")?;
    let service = AqmsService::new(client);

    // step 3: settings store, seeded from the local cache
    let store: Arc<Store> = Arc::new(SettingsStore::open(open_storage(&config), apply_theme as fn(Theme)));

    match cli.command.unwrap_or(Command::Watch { interval: None }) {
        Command::Watch { interval } => {
            let seconds = interval.unwrap_or(config.polling.interval_seconds).max(1);
            watch(&config, service, store, Duration::from_secs(seconds)).await
        }
        Command::Current => show_current(&service, &store).await,
        Command::Latest => show_latest(&service, &store).await,
        Command::Range { range } => show_range(&service, range).await,
        Command::History { window, status: filter, limit, offset } => {
            show_history(&service, window, filter, limit, offset).await
        }
        Command::Chart { range, interval } => show_chart(&service, &store, range, interval).await,
        Command::Stats { window } => show_stats(&service, window).await,
        Command::Export { format, window, out } => export(&service, format, window, out).await,
        Command::Settings { action } => match action {
            SettingsCommand::Show => show_settings(&service, &store).await,
            SettingsCommand::Set {
                theme,
                toggle_theme,
                chart,
                warning,
                danger,
                notifications,
                push,
            } => {
                let edit = SettingsEdit {
                    theme,
                    toggle_theme,
                    chart,
                    warning,
                    danger,
                    notifications,
                    push,
                };
                let patch = build_patch(&store.current(), edit)?;
                save_settings(&service, &store, patch).await
            }
        },
    }
}

fn open_storage(config: &DashboardConfig) -> Box<dyn SettingsStorage> {
    match config.cache.resolved_dir() {
        Some(dir) => {
            let storage = FileStorage::in_dir(dir);
            tracing::debug!(path = %storage.path().display(), "settings cache");
            Box::new(storage)
        }
        None => {
            tracing::debug!("settings cache disabled; keeping settings in memory");
            Box::new(MemoryStorage::new())
        }
    }
}

// a terminal has no stylesheet to swap; record the switch
fn apply_theme(theme: Theme) {
    tracing::info!(theme = theme.as_str(), "theme changed");
}

// ==============================================================================
// live dashboard
// ==============================================================================

async fn watch(
    config: &DashboardConfig,
    service: AqmsService,
    store: Arc<Store>,
    every: Duration,
) -> Result<()> {
    println!("===========================================================");
    println!("  AQMS - Air Quality Monitor");
    println!("===========================================================");
    config.print_summary();

    // reconcile settings without holding up the first reading
    let service = Arc::new(service);
    {
        let service = service.clone();
        let store = store.clone();
        tokio::spawn(async move {
            if let Err(e) = store.refresh(service.as_ref()).await {
                tracing::warn!("using local settings: {}", e);
            }
        });
    }

    let show_data = config.logging.show_sensor_data;
    println!("\n[RUNTIME] Polling current reading ({}s interval)", every.as_secs());
    println!("────────────────────────────────────────────────────────────");

    let mut ticker = tokio::time::interval(every);
    let mut previous: Option<f64> = None;

    loop {
        tokio::select! {
            _ = ticker.tick() => {}
            _ = tokio::signal::ctrl_c() => {
                println!("\n[RUNTIME] Stopped");
                return Ok(());
            }
        }

        match service.current_status().await {
            Ok(reading) => {
                let settings = store.current();
                let status = status::classify_with(reading.co2, &settings);
                let trend = previous.map(|p| status::trend(reading.co2, p)).unwrap_or(Trend::Steady);
                previous = Some(reading.co2);

                if show_data {
                    println!(
                        "[AQMS] {} {} | CO₂: {:.0} ppm {} | Temp: {:.1}°C | Humidity: {:.1}% | {}",
                        status::emoji(status),
                        status::label(status),
                        reading.co2,
                        trend.arrow(),
                        reading.temperature,
                        reading.humidity,
                        dates::relative(&reading.timestamp, Utc::now()),
                    );
                }
                if status != reading.status {
                    tracing::debug!(
                        server = %reading.status,
                        local = %status,
                        "server classification differs from user thresholds"
                    );
                }
            }
            Err(e) => println!("[AQMS] ⚠ Read error: {}", e),
        }
    }
}

// ==============================================================================
// one-shot views
// ==============================================================================

async fn show_current(service: &AqmsService, store: &Store) -> Result<()> {
    let reading = service.current_status().await?;
    let status = status::classify_with(reading.co2, &store.current());

    println!("{} {}", status::emoji(status), status::label(status));
    println!("  CO₂:         {:.0} ppm", reading.co2);
    println!("  Temperature: {:.1}°C", reading.temperature);
    println!("  Humidity:    {:.1}%", reading.humidity);
    println!("  Updated:     {}", dates::format_date_time(&reading.timestamp));
    if let Some(id) = &reading.sensor_id {
        println!("  Sensor:      {}", id);
    }
    Ok(())
}

async fn show_latest(service: &AqmsService, store: &Store) -> Result<()> {
    let reading = service.latest().await?;
    let status = status::classify_with(reading.co2, &store.current());

    println!(
        "{} {:.0} ppm | {:.1}°C | {:.1}% | {}",
        status::emoji(status),
        reading.co2,
        reading.temperature,
        reading.humidity,
        dates::relative(&reading.timestamp, Utc::now()),
    );
    Ok(())
}

async fn show_range(service: &AqmsService, range: LiveRange) -> Result<()> {
    let data = service.sensor_range(range).await?;
    println!("{} readings in the last {}", data.count, data.range.as_str());

    let Some(avg) = aggregate::average(&data.data) else {
        println!("(no readings)");
        return Ok(());
    };
    println!(
        "average: CO₂ {:.0} ppm | {:.1}°C | {:.1}%",
        avg.co2, avg.temperature, avg.humidity
    );

    for bucket in aggregate::hourly_buckets(&data.data) {
        println!(
            "  {}  {:>6.0} ppm  {:>5.1}°C  {:>5.1}%  ({} samples)",
            bucket.hour.format("%H:%M"),
            bucket.averages.co2,
            bucket.averages.temperature,
            bucket.averages.humidity,
            bucket.averages.samples,
        );
    }
    Ok(())
}

async fn show_history(
    service: &AqmsService,
    window: ChartRange,
    filter: StatusFilter,
    limit: u32,
    offset: u32,
) -> Result<()> {
    let (start, end) = dates::date_range(Window::from(window), Utc::now());
    let filters = HistoryFilters {
        start_date: Some(start),
        end_date: Some(end),
        status: Some(filter),
        limit: Some(limit),
        offset: Some(offset),
    };

    let page = service.history(&filters).await?;
    // the server may ignore the status param; filter again locally
    let rows = aggregate::filter_by_status(&page.data, filter);

    println!(
        "history ({}): showing {}-{} of {}",
        filter.as_str(),
        page.offset + 1,
        page.offset + rows.len() as u64,
        page.total
    );
    let mut day = String::new();
    for row in &rows {
        let date = dates::format_date(&row.timestamp);
        if date != day {
            println!("{}", date);
            day = date;
        }
        println!(
            "  {}  {} {:>6.0} ppm  {:>5.1}°C  {:>5.1}%  {}",
            dates::format_time(&row.timestamp),
            status::emoji(row.status),
            row.co2,
            row.temperature,
            row.humidity,
            row.sensor_id,
        );
    }
    Ok(())
}

async fn show_chart(
    service: &AqmsService,
    store: &Store,
    range: ChartRange,
    interval: Option<ChartInterval>,
) -> Result<()> {
    let series = service.chart(range, interval).await?;
    if series.data.is_empty() {
        println!("(no data for {})", range.as_str());
        return Ok(());
    }

    println!("CO₂ over {} ({} buckets)", series.range.as_str(), series.interval.as_str());
    match store.current().chart_type() {
        ChartType::Area => println!("{}", sparkline(&series)),
        ChartType::Bar => {
            for line in bars(&series, 40) {
                println!("{}", line);
            }
        }
    }
    Ok(())
}

const SPARKS: [char; 8] = ['▁', '▂', '▃', '▄', '▅', '▆', '▇', '█'];

fn sparkline(series: &ChartSeries) -> String {
    let (lo, hi) = co2_bounds(series);
    series
        .data
        .iter()
        .map(|p| {
            let idx = if hi > lo {
                (((p.co2 - lo) / (hi - lo)) * (SPARKS.len() - 1) as f64).round() as usize
            } else {
                0
            };
            SPARKS[idx.min(SPARKS.len() - 1)]
        })
        .collect()
}

fn bars(series: &ChartSeries, width: usize) -> Vec<String> {
    let (_, hi) = co2_bounds(series);
    series
        .data
        .iter()
        .map(|p| {
            let len = if hi > 0.0 { ((p.co2 / hi) * width as f64).round() as usize } else { 0 };
            format!(
                "{:>8} {} {:.0}",
                dates::chart_label(&p.timestamp, series.interval),
                "█".repeat(len.max(1)),
                p.co2
            )
        })
        .collect()
}

fn co2_bounds(series: &ChartSeries) -> (f64, f64) {
    series
        .data
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), p| (lo.min(p.co2), hi.max(p.co2)))
}

async fn show_stats(service: &AqmsService, window: ChartRange) -> Result<()> {
    let (start, end) = dates::date_range(Window::from(window), Utc::now());
    let stats = service.statistics(Some(&start), Some(&end)).await?;

    println!("┌─────────────────────────────────────────┐");
    println!("│        STATISTICS ({:>3})                 │", window.as_str());
    println!("├─────────────────────────────────────────┤");
    println!("│ Samples: {}", stats.count);
    println!(
        "│ CO₂:   min {:.0}  max {:.0}  avg {:.0} ppm",
        stats.co2.min, stats.co2.max, stats.co2.avg
    );
    println!(
        "│ Temp:  min {:.1}  max {:.1}  avg {:.1} °C",
        stats.temperature.min, stats.temperature.max, stats.temperature.avg
    );
    println!(
        "│ Hum:   min {:.1}  max {:.1}  avg {:.1} %",
        stats.humidity.min, stats.humidity.max, stats.humidity.avg
    );
    let d = stats.status_distribution;
    println!("│ 🟢 {}  🟡 {}  🔴 {}", d.safe, d.warning, d.danger);
    println!("└─────────────────────────────────────────┘");
    Ok(())
}

async fn export(
    service: &AqmsService,
    format: ExportFormat,
    window: ChartRange,
    out: Option<PathBuf>,
) -> Result<()> {
    let now = Utc::now();
    let (start_date, end_date) = dates::date_range(Window::from(window), now);
    let bytes = service.export(&ExportParams { format, start_date, end_date }).await?;

    let path = out.unwrap_or_else(|| {
        PathBuf::from(format!("aqms-export-{}.{}", now.format("%Y-%m-%d"), format.as_str()))
    });
    std::fs::write(&path, &bytes)
        .with_context(|| format!("failed to write {}", path.display()))?;
    println!("saved {} bytes to {}", bytes.len(), path.display());
    Ok(())
}

// ==============================================================================
// settings
// ==============================================================================

async fn show_settings(service: &AqmsService, store: &Store) -> Result<()> {
    if let Err(e) = store.refresh(service).await {
        eprintln!("[SETTINGS] ⚠ Could not reach server, showing local copy: {}", e);
    }
    print_settings(&store.current());
    Ok(())
}

fn print_settings(settings: &UserSettings) {
    let (warning, danger) = settings.limits();
    let on_off = |b: bool| if b { "on" } else { "off" };

    println!("theme:         {}", settings.theme.as_str());
    println!(
        "chart:         {}",
        match settings.chart_type() {
            ChartType::Area => "area",
            ChartType::Bar => "bar",
        }
    );
    println!("warning:       {:.0} ppm", warning);
    println!("danger:        {:.0} ppm", danger);
    println!("notifications: {}", on_off(settings.notifications_enabled()));
    println!("push:          {}", on_off(settings.push_enabled()));
}

struct SettingsEdit {
    theme: Option<Theme>,
    toggle_theme: bool,
    chart: Option<ChartType>,
    warning: Option<f64>,
    danger: Option<f64>,
    notifications: Option<bool>,
    push: Option<bool>,
}

/// Turns flags into a patch. Nested objects are completed from `current`
/// so a single flag never drops its siblings.
fn build_patch(current: &UserSettings, edit: SettingsEdit) -> Result<SettingsPatch> {
    let mut patch = SettingsPatch {
        theme: edit.theme.or(edit.toggle_theme.then(|| current.theme.toggled())),
        chart_type: edit.chart,
        ..SettingsPatch::default()
    };

    if edit.warning.is_some() || edit.danger.is_some() {
        let (warning, danger) = current.limits();
        let thresholds = Thresholds::new(edit.warning.unwrap_or(warning), edit.danger.unwrap_or(danger));
        thresholds.validate()?;
        patch.thresholds = Some(thresholds);
    }

    if edit.notifications.is_some() || edit.push.is_some() {
        patch.notifications = Some(Notifications::new(
            edit.notifications.unwrap_or_else(|| current.notifications_enabled()),
            edit.push.unwrap_or_else(|| current.push_enabled()),
        ));
    }

    if patch.is_empty() {
        bail!("nothing to change; pass at least one of --theme --toggle-theme --chart --warning --danger --notifications --push");
    }
    Ok(patch)
}

async fn save_settings(service: &AqmsService, store: &Store, patch: SettingsPatch) -> Result<()> {
    let saved = store
        .save_settings(service, &patch)
        .await
        .context("settings were not saved")?;
    println!("[SETTINGS] ✓ Saved");
    print_settings(&saved);
    Ok(())
}
