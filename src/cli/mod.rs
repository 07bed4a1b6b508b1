//! Command-line interface for training, prediction, and serving.

use clap::{Parser, Subcommand};
use colored::*;
use polars::prelude::*;
use std::path::{Path, PathBuf};
use std::time::Instant;

use crate::data::{self, columns, load_dataset};
use crate::model::{PriceEstimator, TrainingConfig};

// ─── Styling helpers ───────────────────────────────────────────────────────────

const W: usize = 58; // box inner width

fn dim(s: &str) -> ColoredString {
    s.truecolor(100, 100, 100)
}
fn muted(s: &str) -> ColoredString {
    s.truecolor(140, 140, 140)
}
fn ok(s: &str) -> ColoredString {
    s.truecolor(100, 210, 120)
}

fn line_box_top() {
    println!("  {}", dim("┌─────────────────────────────────────────────────────────┐"));
}
fn line_box_bottom() {
    println!("  {}", dim("└─────────────────────────────────────────────────────────┘"));
}
fn line_box_sep() {
    println!("  {}", dim("├─────────────────────────────────────────────────────────┤"));
}

fn line_box(content: &str) {
    let visible_len = strip_ansi(content).len();
    let pad = if visible_len < W { W - visible_len } else { 0 };
    println!("  {}  {}{} {}", dim("│"), content, " ".repeat(pad), dim("│"));
}

fn line_box_center(content: &str) {
    let visible_len = strip_ansi(content).len();
    let total_pad = if visible_len < W { W - visible_len } else { 0 };
    let left = total_pad / 2;
    let right = total_pad - left;
    println!("  {}  {}{}{} {}", dim("│"), " ".repeat(left), content, " ".repeat(right), dim("│"));
}

fn line_box_empty() {
    line_box("");
}

fn strip_ansi(s: &str) -> String {
    let mut out = String::new();
    let mut in_escape = false;
    for c in s.chars() {
        if c == '\x1b' {
            in_escape = true;
            continue;
        }
        if in_escape {
            if c == 'm' {
                in_escape = false;
            }
            continue;
        }
        out.push(c);
    }
    out
}

fn kv(key: &str, val: &str) -> String {
    format!("{} {}", muted(key), val.white())
}

fn step_run(msg: &str) {
    print!("  {} {}... ", "›".truecolor(120, 170, 255), msg);
}

fn step_done(detail: &str) {
    println!("{} {}", ok("done"), dim(detail));
}

fn section(title: &str) {
    println!();
    println!("  {}", title.white().bold());
    println!("  {}", dim(&"─".repeat(56)));
}

// ─── CLI definition ────────────────────────────────────────────────────────────

#[derive(Parser)]
#[command(name = "homeval")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Real estate price growth estimator")]
#[command(long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Train the price model on a property dataset
    Train {
        /// Property dataset (CSV)
        #[arg(short, long)]
        data: PathBuf,

        /// Output model file
        #[arg(short, long, default_value = "./models/price_model.json")]
        output: PathBuf,

        /// Random seed for simulation and the train/test split
        #[arg(long, default_value = "42")]
        seed: u64,

        /// Held-out fraction for evaluation
        #[arg(long, default_value = "0.2")]
        test_size: f64,

        /// Use the dataset's 2024/2025 prices as-is instead of simulating growth
        #[arg(long)]
        no_simulate: bool,
    },

    /// Predict next-year prices for a dataset using a trained model
    Predict {
        /// Trained model file
        #[arg(short, long, default_value = "./models/price_model.json")]
        model: PathBuf,

        /// Property dataset (CSV)
        #[arg(short, long)]
        data: PathBuf,

        /// Output CSV with a predicted price column
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Show dataset information
    Info {
        /// Property dataset (CSV)
        #[arg(short, long)]
        data: PathBuf,
    },

    /// Start the web server
    Serve {
        /// Server port
        #[arg(short, long, default_value = "8080")]
        port: u16,

        /// Server host
        #[arg(long, default_value = "0.0.0.0")]
        host: String,

        /// Property dataset (CSV)
        #[arg(short, long)]
        data: Option<PathBuf>,

        /// Model artifact path
        #[arg(short, long)]
        model: Option<PathBuf>,
    },
}

// ─── Commands ──────────────────────────────────────────────────────────────────

pub fn cmd_train(
    data_path: &Path,
    output: &Path,
    seed: u64,
    test_size: f64,
    no_simulate: bool,
) -> anyhow::Result<()> {
    section("Train");

    step_run("Loading data");
    let start = Instant::now();
    let df = load_dataset(data_path)?;
    step_done(&format!("{} rows × {} cols in {:?}", df.height(), df.width(), start.elapsed()));

    let config = TrainingConfig {
        seed,
        test_size,
        simulate_growth: !no_simulate,
        ..Default::default()
    };

    step_run("Training linear regression");
    let start = Instant::now();
    let mut estimator = PriceEstimator::new(config);
    let metrics = estimator.train(&df)?;
    step_done(&format!("{:?}", start.elapsed()));

    println!();
    println!("  {:<16} {}", muted("R²"), format!("{:.4}", metrics.r2).white().bold());
    println!("  {:<16} {}", muted("RMSE"), format!("{:.0} EGP", metrics.rmse).white());
    println!("  {:<16} {}", muted("MAE"), format!("{:.0} EGP", metrics.mae).white());
    println!("  {:<16} {}", muted("Test rows"), metrics.n_samples.to_string().white());
    println!("  {:<16} {}", muted("Features"), estimator.n_features().to_string().white());

    if let Some(parent) = output.parent() {
        std::fs::create_dir_all(parent)?;
    }
    estimator.save(output)?;
    println!();
    println!("  {} model saved to {}", ok("✓"), output.display());
    println!();

    Ok(())
}

pub fn cmd_predict(
    model_path: &Path,
    data_path: &Path,
    output: Option<&Path>,
) -> anyhow::Result<()> {
    section("Predict");

    step_run("Loading model");
    let estimator = PriceEstimator::load(model_path)?;
    step_done(model_path.display().to_string().as_str());

    step_run("Loading data");
    let df = load_dataset(data_path)?;
    step_done(&format!("{} rows × {} cols", df.height(), df.width()));

    step_run("Predicting");
    let start = Instant::now();
    let prepared = estimator.prepare(&df)?;
    let predictions = estimator.predict(&prepared)?;
    step_done(&format!("{:?}", start.elapsed()));

    match output {
        Some(path) => {
            let mut result = prepared;
            result.with_column(Series::new(
                "Predicted Price 2026 (EGP)".into(),
                predictions.to_vec(),
            ))?;
            data::write_csv(&mut result, path)?;
            println!();
            println!("  {} predictions saved to {}", ok("✓"), path.display());
        }
        None => {
            println!();
            println!("  {:<8} {:>18} {:>18}", muted("Row"), muted("Price 2025"), muted("Predicted 2026"));
            println!("  {}", dim(&"─".repeat(46)));
            let price_2025 = prepared
                .column(columns::PRICE_2025)?
                .as_materialized_series()
                .f64()?
                .clone();
            for (i, pred) in predictions.iter().take(10).enumerate() {
                let current = price_2025.get(i).unwrap_or(0.0);
                println!(
                    "  {:<8} {:>18} {:>18}",
                    i,
                    data::format_thousands(current),
                    data::format_thousands(*pred).white()
                );
            }
            if predictions.len() > 10 {
                println!("  {}", dim(&format!("… {} more rows", predictions.len() - 10)));
            }
        }
    }

    println!();
    Ok(())
}

pub fn cmd_info(data_path: &Path) -> anyhow::Result<()> {
    section("Data Info");

    let df = load_dataset(data_path)?;

    println!("  {:<12} {}", muted("File"), data_path.display());
    println!("  {:<12} {}", muted("Rows"), df.height());
    println!("  {:<12} {}", muted("Columns"), df.width());
    println!();

    println!("  {:<24} {:<12} {:>6} {:>8}", muted("Column"), muted("Type"), muted("Nulls"), muted("Unique"));
    println!("  {}", dim(&"─".repeat(54)));

    for col in df.get_columns() {
        println!(
            "  {:<24} {:<12} {:>6} {:>8}",
            col.name(),
            format!("{:?}", col.dtype()).truecolor(140, 140, 140),
            col.null_count(),
            col.n_unique().unwrap_or(0)
        );
    }

    println!();
    Ok(())
}

pub async fn cmd_serve(
    host: &str,
    port: u16,
    data: Option<&Path>,
    model: Option<&Path>,
) -> anyhow::Result<()> {
    use crate::server::{run_server, ServerConfig};

    println!();
    line_box_top();
    line_box_empty();
    line_box_center(&format!("{}", "Property Estimator".white().bold()));
    line_box_center(&format!("{}", dim(&format!("v{}", env!("CARGO_PKG_VERSION")))));
    line_box_empty();
    line_box_sep();
    line_box_empty();
    line_box(&kv("Page   ", &format!("http://{}:{}", host, port)));
    line_box(&kv("API    ", &format!("http://{}:{}/api/predict", host, port)));
    line_box(&kv("Health ", &format!("http://{}:{}/api/health", host, port)));
    line_box_empty();
    line_box_sep();
    line_box_empty();
    line_box_center(&format!("{}", dim("ctrl+c to stop")));
    line_box_empty();
    line_box_bottom();
    println!();

    let defaults = ServerConfig::default();
    let config = ServerConfig {
        host: host.to_string(),
        port,
        data_path: data
            .map(|p| p.display().to_string())
            .unwrap_or(defaults.data_path),
        model_path: model
            .map(|p| p.display().to_string())
            .unwrap_or(defaults.model_path),
    };

    run_server(config).await
}
