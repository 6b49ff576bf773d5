use std::{
    fs::File,
    io::BufReader,
    path::{Path, PathBuf},
};

use anyhow::Context as _;
use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "quadgrab", version)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Capture channels of a scene description onto a reference surface.
    Capture(CaptureArgs),
    /// Fit a reference surface and depth range over bounding boxes.
    Fit(FitArgs),
}

#[derive(Parser, Debug)]
struct CaptureArgs {
    /// Scene description JSON (layers under the reference surface).
    #[arg(long)]
    scene: PathBuf,

    /// Capture config JSON.
    #[arg(long)]
    config: PathBuf,

    /// Override the config's output directory.
    #[arg(long)]
    out_dir: Option<PathBuf>,

    /// Remove every scene object the run created once it finished.
    #[arg(long)]
    cleanup: bool,
}

#[derive(Parser, Debug)]
struct FitArgs {
    /// JSON array of `{ "min": {x,y,z}, "max": {x,y,z} }` boxes.
    #[arg(long)]
    bounds: PathBuf,

    /// Extra space around the bounds in scene units.
    #[arg(long, default_value_t = 0.0)]
    margin: f64,
}

#[derive(serde::Serialize)]
struct FitOutput {
    placement: quadgrab::SurfacePlacement,
    depth: quadgrab::DepthRange,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("quadgrab=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.cmd {
        Command::Capture(args) => cmd_capture(args),
        Command::Fit(args) => cmd_fit(args),
    }
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path, what: &str) -> anyhow::Result<T> {
    let f = File::open(path).with_context(|| format!("open {what} '{}'", path.display()))?;
    let r = BufReader::new(f);
    serde_json::from_reader(r).with_context(|| format!("parse {what} JSON '{}'", path.display()))
}

fn cmd_capture(args: CaptureArgs) -> anyhow::Result<()> {
    let description: quadgrab::SceneDescription = read_json(&args.scene, "scene")?;
    let mut config: quadgrab::CaptureConfig = read_json(&args.config, "capture config")?;
    if let Some(dir) = args.out_dir {
        config.output_dir = dir;
    }

    let mut scene = quadgrab::MemoryScene::from_description(description);
    let mut artifacts = quadgrab::PipelineArtifacts::new();
    let set = quadgrab::run_capture(&mut scene, &config, None, &mut artifacts)?;

    for r in &set.results {
        match (r.path(), r.failure()) {
            (Some(path), _) => println!("{:<18} ok      {}", r.kind.name(), path.display()),
            (None, Some(reason)) => println!("{:<18} FAILED  {reason}", r.kind.name()),
            (None, None) => println!("{:<18} FAILED", r.kind.name()),
        }
    }
    if set.cancelled {
        println!("capture cancelled after {} channel(s)", set.results.len());
    }
    match &set.preview {
        quadgrab::PreviewStatus::NotRequested => {}
        quadgrab::PreviewStatus::Skipped => println!("preview: skipped, nothing captured"),
        quadgrab::PreviewStatus::Built(p) => println!(
            "preview: {} image(s), displacement {}",
            p.images.len(),
            if p.displacement.is_some() { "on" } else { "off" }
        ),
        quadgrab::PreviewStatus::Failed(reason) => eprintln!("warning: preview failed: {reason}"),
    }

    let succeeded = set.succeeded().count();
    let attempted = set.results.len();

    if args.cleanup {
        let report = quadgrab::cleanup(&mut scene, &artifacts, (&config).into());
        println!(
            "cleanup: {} deleted, {} already gone, {} failed",
            report.deleted.len(),
            report.skipped.len(),
            report.failed.len()
        );
        for f in &report.failed {
            eprintln!("warning: could not delete {}: {}", f.handle, f.reason);
        }
    }

    match set.status {
        quadgrab::RunStatus::Success if succeeded == attempted => {
            println!("captured {succeeded}/{attempted} channel(s)");
            Ok(())
        }
        quadgrab::RunStatus::Success => {
            println!("partial capture: {succeeded}/{attempted} channel(s)");
            Ok(())
        }
        quadgrab::RunStatus::Failed => {
            anyhow::bail!("no channel was captured ({attempted} attempted)")
        }
    }
}

fn cmd_fit(args: FitArgs) -> anyhow::Result<()> {
    let boxes: Vec<quadgrab::Aabb> = read_json(&args.bounds, "bounds")?;
    let boxes = boxes
        .into_iter()
        .map(|b| quadgrab::Aabb::new(b.min, b.max))
        .collect::<Result<Vec<_>, _>>()?;
    let (placement, depth) = quadgrab::SurfacePlacement::fit_to_bounds(&boxes, args.margin)?;

    let out = serde_json::to_string_pretty(&FitOutput { placement, depth })
        .context("serialize fit result")?;
    println!("{out}");
    Ok(())
}
