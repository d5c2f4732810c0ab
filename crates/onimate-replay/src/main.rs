use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, ValueEnum};
use onimate_draw::{DrawConfig, StateScope};
use onimate_replay::{replay_capture, Capture, ReplayOptions};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Scope {
    Frame,
    Pass,
    Session,
}

impl From<Scope> for StateScope {
    fn from(scope: Scope) -> Self {
        match scope {
            Scope::Frame => StateScope::Frame,
            Scope::Pass => StateScope::Pass,
            Scope::Session => StateScope::Session,
        }
    }
}

#[derive(Debug, Parser)]
#[command(name = "onimate-replay", version, about = "Replay a captured onimate command stream")]
struct Args {
    /// Capture file (JSON).
    capture: PathBuf,

    /// Print every frame report, call log included, as JSON instead of one line per frame.
    #[arg(long)]
    json: bool,

    /// When render state is reset between buffers.
    #[arg(long, value_enum, default_value = "frame")]
    scope: Scope,

    /// Fail any pass that executes more than this many records.
    #[arg(long)]
    max_records: Option<usize>,

    /// Width per character reported to text measurement.
    #[arg(long, default_value_t = onimate_draw::recording::DEFAULT_GLYPH_ADVANCE)]
    glyph_advance: f64,

    /// Log filter (tracing-subscriber EnvFilter syntax).
    ///
    /// Environment variable: `ONIMATE_LOG`.
    #[arg(long, env = "ONIMATE_LOG", default_value = "info")]
    log: String,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let filter = EnvFilter::try_new(&args.log)
        .with_context(|| format!("invalid log filter {:?}", args.log))?;
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let json = std::fs::read_to_string(&args.capture)
        .with_context(|| format!("failed to read {}", args.capture.display()))?;
    let capture = Capture::from_json(&json)
        .with_context(|| format!("failed to parse capture {}", args.capture.display()))?;
    tracing::info!(
        frames = capture.frames.len(),
        passes = capture.pass_count(),
        "loaded capture"
    );

    let mut draw = DrawConfig::new().state_scope(args.scope.into());
    draw.max_records = args.max_records;
    let options = ReplayOptions {
        draw,
        glyph_advance: args.glyph_advance,
    };
    let reports = replay_capture(&capture, &options).context("replay failed")?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&reports)?);
    } else {
        for report in &reports {
            println!(
                "frame {}: passes={} records={} shapes={} texts={} sha256={}",
                report.frame_index,
                report.stats.passes,
                report.stats.records,
                report.stats.shapes,
                report.stats.texts,
                report.sha256
            );
        }
    }
    Ok(())
}
