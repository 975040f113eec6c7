//! DinLab CLI — simulate, analyze, and catalogue commands.
//!
//! Commands:
//! - `simulate` — run simulated DIN sessions against an audio tree or a
//!   synthetic catalogue and store the session reports
//! - `analyze` — print SRT and psychometric thresholds from a stored
//!   report, optionally exporting the trial log as CSV
//! - `catalogue check` — verify an audio tree covers the configured
//!   level range at full density

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use dinlab_core::catalogue::InMemoryCatalogue;
use dinlab_core::domain::{Digits, StimulusId, TestConfig};
use dinlab_core::rng::SelectionSeeds;
use dinlab_runner::catalogue_fs::scan_catalogue;
use dinlab_runner::export::export_trials_csv;
use dinlab_runner::simulate::{simulate_sessions, LogisticListener};
use dinlab_runner::store::SessionStore;

#[derive(Parser)]
#[command(name = "dinlab", about = "DinLab CLI — adaptive digits-in-noise test engine")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run simulated sessions and store their reports.
    Simulate {
        /// Number of independent sessions.
        #[arg(long, default_value_t = 1)]
        sessions: u64,

        /// Master seed for stimulus selection and listener behavior.
        #[arg(long, default_value_t = 0)]
        seed: u64,

        /// Path to a TOML test configuration. Defaults to the built-in
        /// 24-trial test.
        #[arg(long)]
        config: Option<PathBuf>,

        /// Audio tree to scan for stimuli. Without it, a synthetic
        /// catalogue is generated.
        #[arg(long)]
        audio_dir: Option<PathBuf>,

        /// Directory for stored session reports.
        #[arg(long, default_value = "data")]
        data_dir: PathBuf,

        /// Simulated listener's threshold location (alpha), dB SNR.
        #[arg(long, default_value_t = -11.0, allow_hyphen_values = true)]
        alpha: f64,

        /// Simulated listener's slope parameter (beta).
        #[arg(long, default_value_t = 1.0)]
        beta: f64,
    },
    /// Print estimates from a stored session report.
    Analyze {
        /// Path to a session report JSON.
        report: PathBuf,

        /// Also write the trial log as CSV to this path.
        #[arg(long)]
        csv: Option<PathBuf>,
    },
    /// Catalogue management commands.
    Catalogue {
        #[command(subcommand)]
        action: CatalogueAction,
    },
}

#[derive(Subcommand)]
enum CatalogueAction {
    /// Verify an audio tree covers the configured level range.
    Check {
        /// Audio tree root (level folders like snr-04).
        dir: PathBuf,

        /// Path to a TOML test configuration. Defaults to the built-in
        /// 24-trial test.
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

fn load_config(path: Option<&PathBuf>) -> Result<TestConfig> {
    let config = match path {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("failed to read config {}", path.display()))?;
            toml::from_str(&text)
                .with_context(|| format!("failed to parse config {}", path.display()))?
        }
        None => TestConfig::default(),
    };
    config.validate().context("invalid test configuration")?;
    Ok(config)
}

/// One distinct label per (level, index); good enough for simulation,
/// where only correctness matters.
fn synthetic_catalogue(config: &TestConfig) -> InMemoryCatalogue {
    let mut cat = InMemoryCatalogue::new();
    for level in config.levels() {
        for i in 0..config.stimuli_per_level {
            let label = format!("{:03}", (i * 7 + 1) % 1000);
            cat.insert(
                level,
                StimulusId::new(format!("snr{level:+03}/{label}-{i}.wav")),
                Digits::parse(&label).expect("three formatted digits"),
            );
        }
    }
    cat
}

fn cmd_simulate(
    sessions: u64,
    seed: u64,
    config: Option<PathBuf>,
    audio_dir: Option<PathBuf>,
    data_dir: PathBuf,
    alpha: f64,
    beta: f64,
) -> Result<()> {
    anyhow::ensure!(beta > 0.0, "--beta must be positive, got {beta}");
    let config = load_config(config.as_ref())?;
    let catalogue = match audio_dir {
        Some(dir) => scan_catalogue(&dir)?,
        None => synthetic_catalogue(&config),
    };
    catalogue
        .check_coverage(&config)
        .context("catalogue does not cover the configured level range")?;

    let seeds = SelectionSeeds::new(seed);
    let params = [alpha, beta, 1.0 / 120.0, 0.0];
    let reports = simulate_sessions(&config, &catalogue, &seeds, sessions, |session| {
        LogisticListener::new(params, seed ^ session)
    })?;

    let store = SessionStore::new(&data_dir)?;
    for report in &reports {
        let path = store.save(report)?;
        println!(
            "{}: srt {:+.2} dB, triplet threshold {}",
            path.display(),
            report.srt,
            format_threshold(report.per_triplet.threshold_50()),
        );
    }
    Ok(())
}

fn cmd_analyze(report_path: PathBuf, csv: Option<PathBuf>) -> Result<()> {
    let store = SessionStore::new(
        report_path.parent().unwrap_or_else(|| std::path::Path::new(".")),
    )?;
    let report = store.load(&report_path)?;

    println!("test:      {} ({})", report.config.name, report.config.language);
    println!("run id:    {}", report.run_id);
    println!("completed: {}", report.completed_at);
    println!("trials:    {}", report.trials.len());
    println!("SRT:       {:+.2} dB SNR", report.srt);
    println!(
        "50% threshold (per digit):   {}",
        format_threshold(report.per_digit.threshold_50())
    );
    println!(
        "50% threshold (per triplet): {}",
        format_threshold(report.per_triplet.threshold_50())
    );
    if let Some(err) = &report.per_digit.fit_error {
        println!("per-digit fit failed: {err}");
    }
    if let Some(err) = &report.per_triplet.fit_error {
        println!("per-triplet fit failed: {err}");
    }

    if let Some(csv_path) = csv {
        let csv_text = export_trials_csv(&report.trials)?;
        std::fs::write(&csv_path, csv_text)
            .with_context(|| format!("failed to write {}", csv_path.display()))?;
        println!("trial log written to {}", csv_path.display());
    }
    Ok(())
}

fn cmd_catalogue_check(dir: PathBuf, config: Option<PathBuf>) -> Result<()> {
    let config = load_config(config.as_ref())?;
    let catalogue = scan_catalogue(&dir)?;
    println!("scanned {} stimuli from {}", catalogue.len(), dir.display());
    catalogue.check_coverage(&config)?;
    println!(
        "coverage ok: {} levels x {} stimuli",
        config.levels().count(),
        config.stimuli_per_level
    );
    Ok(())
}

fn format_threshold(threshold: Option<f64>) -> String {
    match threshold {
        Some(t) => format!("{t:+.2} dB SNR"),
        None => "n/a".to_string(),
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Simulate {
            sessions,
            seed,
            config,
            audio_dir,
            data_dir,
            alpha,
            beta,
        } => cmd_simulate(sessions, seed, config, audio_dir, data_dir, alpha, beta),
        Commands::Analyze { report, csv } => cmd_analyze(report, csv),
        Commands::Catalogue { action } => match action {
            CatalogueAction::Check { dir, config } => cmd_catalogue_check(dir, config),
        },
    }
}
