use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use zenparticles::generation::{GenerationRequest, GenerationWorker};
use zenparticles::source::{signal_bus, LandmarkReplay};
use zenparticles::{Color, Config, FrameTime, Session, ShapeArchetype, Viewer};

/// Frame rate of headless runs.
const HEADLESS_FPS: f32 = 60.0;

#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Path to a JSON config file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Number of particles (overrides config)
    #[arg(long)]
    particles: Option<usize>,

    /// Initial shape, e.g. "heart", "saturn" or "buddha (ai)"
    #[arg(long)]
    shape: Option<ShapeArchetype>,

    /// Particle colour as hex, e.g. "#33CCFF"
    #[arg(long)]
    color: Option<Color>,

    /// Hand landmark recording (JSON lines) to replay
    #[arg(long)]
    landmarks: Option<PathBuf>,

    /// Directory of pre-generated shapes, one `<prompt>.json` per prompt
    #[arg(long)]
    library: Option<PathBuf>,

    /// Run the animation without a window and log convergence
    #[arg(long, default_value_t = false)]
    headless: bool,

    /// Frames to run in headless mode
    #[arg(long, default_value_t = 600)]
    frames: u64,
}

impl Args {
    fn into_config(self) -> Result<(Config, bool, u64), zenparticles::ConfigError> {
        let mut config = match &self.config {
            Some(path) => Config::load(path)?,
            None => Config::default(),
        };
        if let Some(particles) = self.particles {
            config = config.with_particles(particles);
        }
        if let Some(shape) = self.shape {
            config = config.with_shape(shape);
        }
        if let Some(color) = self.color {
            config = config.with_color(color);
        }
        if let Some(path) = self.landmarks {
            config = config.with_landmarks(path);
        }
        if let Some(dir) = self.library {
            config = config.with_library(dir);
        }
        config.validate()?;
        Ok((config, self.headless, self.frames))
    }
}

fn run_headless(config: &Config, frames: u64) {
    let mut session = Session::new(config);

    let (publisher, mut signals) = signal_bus();
    let _replay = config.gesture.landmarks.as_ref().and_then(|path| {
        LandmarkReplay::new(path)
            .with_rate(config.gesture.replay_rate_hz)
            .with_loop(config.gesture.loop_replay)
            .with_scale_policy(config.gesture.scale_policy)
            .spawn(publisher)
            .map_err(|err| warn!(error = %err, "replay unavailable, using the idle signal"))
            .ok()
    });

    let mut worker = GenerationWorker::new(config.generation.service());
    if let Some(prompt) = config.shape.preset_prompt() {
        let request = GenerationRequest::new(prompt).with_point_count(config.generation.point_count);
        worker.submit(config.shape, request);
    }

    let report_every = (HEADLESS_FPS as u64).max(1);
    for index in 0..frames {
        for outcome in worker.poll() {
            session.apply(outcome);
        }
        if let Some(notice) = session.take_notice() {
            warn!(%notice);
        }

        let signal = signals.latest();
        session.step(FrameTime::fixed(index, HEADLESS_FPS), &signal);

        if (index + 1) % report_every == 0 || index + 1 == frames {
            info!(
                frame = index + 1,
                mean_radius = session.field().mean_radius(),
                target_error = session.field().max_error(session.target()),
                tension = signal.tension(),
                "headless"
            );
        }
    }
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("zenparticles=info")),
        )
        .init();

    let (config, headless, frames) = match Args::parse().into_config() {
        Ok(parsed) => parsed,
        Err(err) => {
            error!(error = %err, "invalid configuration");
            return ExitCode::FAILURE;
        }
    };

    if headless {
        run_headless(&config, frames);
        return ExitCode::SUCCESS;
    }

    match Viewer::new(config).run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!(error = %err, "viewer failed");
            ExitCode::FAILURE
        }
    }
}
