use anyhow::Context;
use clap::Parser;
use generator::profile::{build_recording, GeneratorConfig};
use gymcore::processing::ExerciseKind;
use gymcore::CancellationFlag;
use log::{info, warn};
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::PathBuf;
use std::thread;
use tokio::runtime::Builder as TokioBuilder;
use tokio::signal;
use workflow::config::WorkflowConfig;
use workflow::runner::Runner;

mod generator;
mod workflow;

#[derive(Parser)]
#[command(author, version, about = "Offline rep counter and power estimator for workout recordings")]
struct Args {
    /// Keypoint recording (JSON) to process
    #[arg(long)]
    input: Option<PathBuf>,
    /// Load a workflow config from YAML
    #[arg(long)]
    workflow: Option<PathBuf>,
    #[arg(long, default_value = "pullups")]
    exercise: String,
    #[arg(long, default_value_t = 70.0)]
    body_mass: f64,
    #[arg(long, default_value_t = 70.0)]
    exercise_mass: f64,
    #[arg(long, default_value = "output")]
    output_dir: PathBuf,
    /// Synthesise a recording with this many reps instead of reading --input
    #[arg(long)]
    synthetic_reps: Option<usize>,
    #[arg(long, default_value_t = 1)]
    synthetic_tracks: usize,
    #[arg(long, default_value_t = 0)]
    seed: u64,
    /// Log the per-frame overlay for every tracked person
    #[arg(long, default_value_t = false)]
    display: bool,
}

/// Cancels processing on Ctrl+C so partial results still get reported.
fn watch_for_interrupt(cancel: CancellationFlag) -> anyhow::Result<()> {
    let runtime = TokioBuilder::new_current_thread()
        .enable_all()
        .build()
        .context("creating runtime for signal handling")?;
    thread::spawn(move || {
        runtime.block_on(async move {
            if signal::ctrl_c().await.is_ok() {
                warn!("interrupt received, reducing partial results");
                cancel.cancel();
            }
        });
    });
    Ok(())
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Args::parse();

    let workflow_config = if let Some(path) = args.workflow {
        WorkflowConfig::load(path)?
    } else {
        let exercise: ExerciseKind = args
            .exercise
            .parse()
            .with_context(|| format!("parsing exercise '{}'", args.exercise))?;
        WorkflowConfig::from_args(
            exercise,
            args.body_mass,
            args.exercise_mass,
            args.output_dir.clone(),
            args.display,
        )
    };
    fs::create_dir_all(&workflow_config.output_dir).with_context(|| {
        format!("creating output dir {}", workflow_config.output_dir.display())
    })?;

    let input = match (args.synthetic_reps, args.input) {
        (Some(reps), _) => {
            let generator = GeneratorConfig {
                exercise: workflow_config.exercise,
                reps,
                tracks: args.synthetic_tracks,
                seed: args.seed,
                ..Default::default()
            };
            let path = workflow_config
                .output_dir
                .join(format!("synthetic_{}.json", workflow_config.exercise));
            build_recording(&generator)?
                .save(&path)
                .with_context(|| format!("saving synthetic recording {}", path.display()))?;
            info!("synthesised {} reps into {}", reps, path.display());
            path
        }
        (None, Some(path)) => path,
        (None, None) => anyhow::bail!("either --input or --synthetic-reps is required"),
    };

    let cancel = CancellationFlag::new();
    watch_for_interrupt(cancel.clone())?;

    let runner = Runner::new(workflow_config.clone());
    let result = runner.execute(&input, &cancel)?;
    let metrics = &result.report.metrics;

    println!(
        "{} -> reps {}, avg {:.1} W ({:.2} W/kg), max {:.1} W ({:.2} W/kg), annotated {}",
        workflow_config.exercise,
        metrics.rep_count,
        metrics.avg_power,
        metrics.avg_power_per_kg,
        metrics.max_power,
        metrics.max_power_per_kg,
        metrics.processed_video_path
    );
    if result.report.cancelled {
        println!("run was interrupted; metrics cover the frames read so far");
    }

    let mut report = serde_json::to_string(&result.report).context("serialising report")?;
    report.push('\n');
    let report_path = workflow_config.output_dir.join("workout_report.log");
    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&report_path)
        .with_context(|| format!("opening report {}", report_path.display()))?;
    file.write_all(report.as_bytes())?;

    Ok(())
}
