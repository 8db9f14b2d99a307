// ringwatch/src/main.rs
//
// ringwatch: transaction graph analytics for fraud ring detection
//
// Three operational modes:
//   analyze  one batch pass over a transaction file, reports written to --output
//   watch    re-analyse the file every --interval seconds (cached when unchanged)
//   eval     score a labelled dataset and print precision / recall / F1
//
// Usage:
//   ringwatch --mode analyze --path transactions.jsonl
//   ringwatch --mode watch --path transactions.jsonl --interval 30
//   ringwatch --mode eval --path labelled.jsonl --threshold 25

use std::path::{Path, PathBuf};

use anyhow::Result;
use clap::{Parser, ValueEnum};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use ringwatch::eval::{report, Evaluator};
use ringwatch::events::RiskLevel;
use ringwatch::output::{ReportWriter, RunRecord};
use ringwatch::source::load_transactions;
use ringwatch::{Analysis, Analyzer, DetectionConfig};

// ── CLI ───────────────────────────────────────────────────────────────────────

#[derive(Parser)]
#[command(
    name    = "ringwatch",
    about   = "Fraud ring detection over transaction graphs",
    version = env!("CARGO_PKG_VERSION"),
)]
struct Cli {
    #[arg(long, value_enum, default_value = "analyze")]
    mode: Mode,

    #[arg(long, help = "Transaction file (JSON array or JSON Lines)")]
    path: PathBuf,

    #[arg(long, default_value = "/tmp/ringwatch_output",
          help = "Report output directory")]
    output: PathBuf,

    #[arg(long, help = "Detection config JSON (defaults when absent)")]
    config: Option<PathBuf>,

    #[arg(long, default_value = "30", help = "Poll interval in seconds (watch mode)")]
    interval: u64,

    #[arg(long, default_value = "30.0", help = "Flag threshold (eval mode)")]
    threshold: f64,
}

#[derive(Clone, ValueEnum)]
enum Mode {
    Analyze, // single batch pass
    Watch,   // poll and re-analyse
    Eval,    // labelled dataset evaluation
}

// ── Terminal output ───────────────────────────────────────────────────────────

fn print_banner() {
    println!("\x1b[1m");
    println!("  ┌─┐┬┌┐┌┌─┐┬ ┬┌─┐┌┬┐┌─┐┬ ┬");
    println!("  ├┬┘│││││ ┬│││├─┤ │ │  ├─┤");
    println!("  ┴└─┴┘└┘└─┘└┴┘┴ ┴ ┴ └─┘┴ ┴");
    println!("\x1b[0m");
    println!("  \x1b[90mFraud ring detection over transaction graphs | Rust\x1b[0m\n");
}

fn print_summary(analysis: &Analysis) {
    let out = &analysis.output;
    let summary = &out.result.summary;
    let reset = "\x1b[0m";

    println!(
        "\n\x1b[1m── run {}  accounts={}  flagged={}  rings={}  {:.3}s{} ──\x1b[0m",
        analysis.run_id(),
        summary.total_accounts_analyzed,
        summary.suspicious_accounts_flagged,
        summary.fraud_rings_detected,
        summary.processing_time_seconds,
        if analysis.cached { "  (cached)" } else { "" },
    );

    for acc in out.result.suspicious_accounts.iter().take(20) {
        let color = match acc.risk_level {
            RiskLevel::High => "\x1b[91;1m",
            RiskLevel::Med  => "\x1b[93;1m",
            RiskLevel::Low  => "\x1b[92m",
        };
        let ring = acc.ring_id.as_deref().map(|r| format!(" \x1b[90m[{}]{}", r, reset)).unwrap_or_default();
        println!("  {}{:4} {:6.1}{}  {}{}", color, acc.risk_level, acc.suspicion_score, reset, acc.account_id, ring);
    }
    if out.result.suspicious_accounts.len() > 20 {
        println!("  \x1b[90m... {} more{}", out.result.suspicious_accounts.len() - 20, reset);
    }

    for ring in &out.canonical.fraud_rings {
        println!(
            "  \x1b[96m{}{}  {:9} risk={:5.1}  {}",
            ring.ring_id, reset, ring.pattern_type, ring.risk_score, ring.member_accounts.join(" → ")
        );
    }
    if out.bounds.cycles_truncated {
        println!("  \x1b[93mcycle search stopped at the {} cap; results are partial{}", out.bounds.max_cycles, reset);
    }
}

// ── Modes ─────────────────────────────────────────────────────────────────────

async fn analyze_once(analyzer: &Analyzer, writer: &ReportWriter, path: &Path) -> Result<Analysis> {
    let transactions = load_transactions(path).await?;
    let analysis = analyzer.analyze(&transactions).await?;
    if !analysis.cached {
        writer.write_reports(&analysis.output).await?;
        let record = RunRecord::new(analysis.run_id(), path.display().to_string(), &analysis.output);
        writer.append_run(&record).await?;
    }
    Ok(analysis)
}

async fn watch(analyzer: Analyzer, writer: ReportWriter, path: PathBuf, interval: u64) -> Result<()> {
    let period = tokio::time::Duration::from_secs(interval.max(1));
    loop {
        match analyze_once(&analyzer, &writer, &path).await {
            Ok(analysis) if !analysis.cached => print_summary(&analysis),
            Ok(analysis) => info!("Batch {} unchanged", analysis.run_id()),
            Err(e) => error!("Analysis failed: {:#}", e),
        }
        let purged = analyzer.purge_expired();
        if purged > 0 {
            info!("Purged {} expired cache entries", purged);
        }
        tokio::time::sleep(period).await;
    }
}

// ── Main ──────────────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env()
            .add_directive("ringwatch=info".parse()?))
        .compact().init();

    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => DetectionConfig::load(path)?,
        None => DetectionConfig::default(),
    };

    if let Mode::Eval = cli.mode {
        let result = Evaluator::new(cli.threshold, config).run_dataset(&cli.path).await?;
        report::print_markdown(&result);
        return Ok(());
    }

    print_banner();
    let analyzer = Analyzer::new(config)?;
    let writer = ReportWriter::new(cli.output.clone())?;

    match cli.mode {
        Mode::Analyze => {
            println!("  Mode: \x1b[96mANALYZE\x1b[0m  |  {}", cli.path.display());
            println!("  Output: \x1b[90m{}\x1b[0m", cli.output.display());
            let analysis = analyze_once(&analyzer, &writer, &cli.path).await?;
            print_summary(&analysis);
        }
        Mode::Watch => {
            println!("  Mode: \x1b[93mWATCH\x1b[0m  |  {}  every {}s", cli.path.display(), cli.interval);
            println!("  Output: \x1b[90m{}\x1b[0m", cli.output.display());
            println!("  Press Ctrl+C to stop.\n");
            watch(analyzer, writer, cli.path.clone(), cli.interval).await?;
        }
        Mode::Eval => {}
    }

    Ok(())
}
