mod scene;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use stimscape_core::{FailurePolicy, StimResult};
use stimscape_ir::{validate_request, CameraState, PlaceableEntity, PopulatedScene};
use stimscape_place::{emit, SceneSink, ScenePopulator};

use crate::scene::SceneFile;

#[derive(Parser)]
#[command(
    name = "stimscape",
    version,
    about = "Stimscape — constrained 3D stimulus scene generation",
    long_about = "Stimscape places objects and a camera in a 3D background under statistical\nconstraints, producing scene descriptions ready for rendering."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Populate a scene file and print the placements
    Populate {
        /// Path to the scene .toml file
        #[arg()]
        file: PathBuf,

        /// Override the scene's RNG seed
        #[arg(long)]
        seed: Option<u64>,

        /// Number of scenes to generate
        #[arg(short, long, default_value_t = 1)]
        count: usize,

        /// Return the best partial scene instead of failing
        #[arg(long)]
        partial: bool,

        /// Print scenes as JSON
        #[arg(long)]
        json: bool,

        /// Write JSON scenes to this file
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Validate a scene file without sampling
    Check {
        /// Path to the scene .toml file
        #[arg()]
        file: PathBuf,
    },

    /// Write an example scene file
    Init {
        /// Where to write the scene
        #[arg(default_value = "scene.toml")]
        file: PathBuf,
    },

    /// Show engine information
    Info,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let json_stdout = matches!(
        cli.command,
        Commands::Populate {
            json: true,
            output: None,
            ..
        }
    );

    let subscriber = tracing_subscriber::fmt().with_env_filter(
        tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
    );

    if json_stdout {
        // Keep stdout clean for the JSON document.
        subscriber
            .with_ansi(false)
            .with_writer(std::io::stderr)
            .init();
    } else {
        subscriber.init();
    }

    match cli.command {
        Commands::Populate {
            file,
            seed,
            count,
            partial,
            json,
            output,
        } => cmd_populate(&file, seed, count, partial, json, output),
        Commands::Check { file } => cmd_check(&file),
        Commands::Init { file } => cmd_init(&file),
        Commands::Info => cmd_info(),
    }
}

/// Prints each placement as it is handed over.
struct TextSink;

impl SceneSink for TextSink {
    fn place_camera(&mut self, camera: &CameraState) -> StimResult<()> {
        for k in camera.keyframes() {
            println!(
                "   📷 frame {:>4}  at ({:>7.2}, {:>7.2}, {:>7.2})  looking at ({:>6.2}, {:>6.2}, {:>6.2})",
                k.frame,
                k.location.x,
                k.location.y,
                k.location.z,
                k.fixation.x,
                k.fixation.y,
                k.fixation.z
            );
        }
        Ok(())
    }

    fn place(&mut self, entity: &PlaceableEntity) -> StimResult<()> {
        println!(
            "   ▪ {:<16} at ({:>6.2}, {:>6.2}, {:>6.2})  size {:.2}  heading {:>7.1}°",
            entity.name,
            entity.position.x,
            entity.position.y,
            entity.position.z,
            entity.size,
            entity.rotation_z
        );
        Ok(())
    }
}

fn cmd_populate(
    file: &Path,
    seed: Option<u64>,
    count: usize,
    partial: bool,
    json: bool,
    output: Option<PathBuf>,
) -> Result<()> {
    let scene_file = SceneFile::load(file)?;
    let mut config = scene_file.config();
    if seed.is_some() {
        config.rng.seed = seed;
    }
    if partial {
        config.populate.failure_policy = FailurePolicy::Partial;
    }

    let background = scene_file.background()?;
    let camera = scene_file.camera()?;
    let requests = scene_file.requests()?;
    tracing::debug!(
        file = %file.display(),
        objects = requests.len(),
        keyframes = scene_file.frames.keyframes().len(),
        "loaded scene file"
    );
    let mut populator =
        ScenePopulator::new(&config).context("invalid populate configuration")?;

    let start = std::time::Instant::now();
    let mut scenes: Vec<PopulatedScene> = Vec::with_capacity(count);
    for i in 0..count {
        let scene = populator
            .populate(&requests, &background, &camera, &scene_file.frames)
            .with_context(|| format!("failed to populate scene {} of {}", i + 1, count))?;
        scenes.push(scene);
    }
    let elapsed = start.elapsed();

    if json || output.is_some() {
        let rendered = serde_json::to_string_pretty(&scenes)?;
        match output {
            Some(path) => {
                std::fs::write(&path, rendered)
                    .with_context(|| format!("failed to write {}", path.display()))?;
                println!("✓ Wrote {} scene(s) to {}", scenes.len(), path.display());
            }
            None => println!("{rendered}"),
        }
        return Ok(());
    }

    for (i, scene) in scenes.iter().enumerate() {
        let status = if scene.complete { "complete" } else { "PARTIAL" };
        println!(
            "🎯 Scene {} — {} objects, {} attempt(s), {}",
            i + 1,
            scene.objects.len(),
            scene.attempts,
            status
        );
        emit(scene, &mut TextSink).map_err(|e| anyhow::anyhow!("{}", e))?;
        for report in &scene.reports {
            println!("   ⚠️ {}: {}", report.object, report.compatibility.reason);
        }
        println!("   hash {}", scene.content_hash());
    }
    println!(
        "✓ {} scene(s) in {:.1}ms",
        scenes.len(),
        elapsed.as_secs_f64() * 1000.0
    );
    Ok(())
}

fn cmd_check(file: &Path) -> Result<()> {
    println!("🔍 Checking {}", file.display());

    let scene_file = SceneFile::load(file)?;
    println!("   ✓ Parse OK");

    scene_file
        .config()
        .validate()
        .map_err(|e| anyhow::anyhow!("{}", e))?;
    println!("   ✓ Config OK");

    let background = scene_file.background()?;
    let camera = scene_file.camera()?;
    let requests = scene_file.requests()?;
    validate_request(
        &requests,
        background.constraint.params(),
        camera.params(),
        &scene_file.frames.keyframes(),
    )
    .map_err(|errors| {
        let msgs: Vec<String> = errors.into_iter().map(|e| e.to_string()).collect();
        anyhow::anyhow!("Validation errors:\n  {}", msgs.join("\n  "))
    })?;
    println!(
        "   ✓ {} object(s), {} keyframe(s), {} obstacle(s)",
        requests.len(),
        scene_file.frames.keyframes().len(),
        background.obstacles.len()
    );
    Ok(())
}

fn cmd_init(file: &Path) -> Result<()> {
    if file.exists() {
        anyhow::bail!("'{}' already exists", file.display());
    }
    SceneFile::example()?.save(file)?;
    println!("✓ Wrote example scene to {}", file.display());
    println!("   Run: stimscape populate {}", file.display());
    Ok(())
}

fn cmd_info() -> Result<()> {
    let defaults = stimscape_core::PopulateConfig::default();
    println!("🎲 Stimscape");
    println!("   Version:    {}", env!("CARGO_PKG_VERSION"));
    println!("   Strategy:   {:?} (default)", defaults.strategy);
    println!("   Failure:    {:?} (default)", defaults.failure_policy);
    println!(
        "   Attempts:   {} per object, {} per scene",
        defaults.max_attempts, defaults.max_scene_attempts
    );
    println!("   RNG:        ChaCha8 (seedable)");
    Ok(())
}
