//! Session configuration.
//!
//! Every field has a default, so a config file only needs the values it
//! changes:
//!
//! ```text
//! {
//!   "particles": 5000,
//!   "visuals": { "color": "#33CCFF" },
//!   "generation": { "library": "shapes/" }
//! }
//! ```

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::animation::AnimationConfig;
use crate::archetype::ShapeArchetype;
use crate::error::ConfigError;
use crate::generation::{CommandService, LibraryService, ShapeService, Unconfigured, DEFAULT_POINT_COUNT};
use crate::signal::ScalePolicy;
use crate::visuals::{Color, VisualConfig};

/// Upper bound on the particle count.
pub const MAX_PARTICLES: usize = 1_000_000;

/// Largest accepted explosion distance, in world units.
const MAX_EXPLOSION: f32 = 100.0;
/// Largest accepted wobble rate, in radians per second.
const MAX_RATE: f32 = 1_000.0;
/// Largest accepted spin, in radians per frame.
const MAX_SPIN: f32 = 1.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Particles in the session. Fixed for its lifetime.
    #[serde(default = "Config::default_particles")]
    pub particles: usize,
    /// Archetype selected at start-up.
    #[serde(default)]
    pub shape: ShapeArchetype,
    #[serde(default)]
    pub animation: AnimationConfig,
    #[serde(default)]
    pub visuals: VisualConfig,
    #[serde(default)]
    pub gesture: GestureConfig,
    #[serde(default)]
    pub generation: GenerationConfig,
    #[serde(default)]
    pub window: WindowConfig,
}

impl Config {
    fn default_particles() -> usize {
        3000
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            particles: Self::default_particles(),
            shape: ShapeArchetype::default(),
            animation: AnimationConfig::default(),
            visuals: VisualConfig::default(),
            gesture: GestureConfig::default(),
            generation: GenerationConfig::default(),
            window: WindowConfig::default(),
        }
    }
}

/// Hand-tracking input.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GestureConfig {
    /// Landmark recording to replay. Without one the pointer drives the
    /// signal.
    #[serde(default)]
    pub landmarks: Option<PathBuf>,
    #[serde(default = "GestureConfig::default_replay_rate")]
    pub replay_rate_hz: f32,
    #[serde(default = "GestureConfig::default_loop")]
    pub loop_replay: bool,
    #[serde(default)]
    pub scale_policy: ScalePolicy,
}

impl GestureConfig {
    fn default_replay_rate() -> f32 {
        30.0
    }
    fn default_loop() -> bool {
        true
    }
}

impl Default for GestureConfig {
    fn default() -> Self {
        Self {
            landmarks: None,
            replay_rate_hz: Self::default_replay_rate(),
            loop_replay: Self::default_loop(),
            scale_policy: ScalePolicy::default(),
        }
    }
}

/// Shape generation back end.
///
/// A command takes precedence over a library. With neither, every request
/// fails and the session reports it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationConfig {
    #[serde(default)]
    pub library: Option<PathBuf>,
    #[serde(default)]
    pub command: Option<CommandConfig>,
    #[serde(default = "GenerationConfig::default_point_count")]
    pub point_count: usize,
}

impl GenerationConfig {
    fn default_point_count() -> usize {
        DEFAULT_POINT_COUNT
    }

    /// Build the configured service.
    pub fn service(&self) -> Arc<dyn ShapeService> {
        if let Some(command) = &self.command {
            return Arc::new(
                CommandService::new(command.program.clone())
                    .with_args(command.args.iter().cloned())
                    .with_timeout(command.timeout()),
            );
        }
        match &self.library {
            Some(dir) => Arc::new(LibraryService::new(dir.clone())),
            None => Arc::new(Unconfigured),
        }
    }
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            library: None,
            command: None,
            point_count: Self::default_point_count(),
        }
    }
}

/// External generator program.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommandConfig {
    pub program: String,
    #[serde(default)]
    pub args: Vec<String>,
    #[serde(default = "CommandConfig::default_timeout")]
    pub timeout_secs: f32,
}

impl CommandConfig {
    fn default_timeout() -> f32 {
        60.0
    }

    /// The timeout as a [`Duration`]. Values `validate` would reject fall
    /// back to the default.
    pub fn timeout(&self) -> Duration {
        Duration::try_from_secs_f32(self.timeout_secs)
            .ok()
            .filter(|t| !t.is_zero())
            .unwrap_or(Duration::from_secs_f32(Self::default_timeout()))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    pub title: String,
    pub width: u32,
    pub height: u32,
    pub vsync: bool,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            title: "ZenParticles".into(),
            width: 1280,
            height: 720,
            vsync: true,
        }
    }
}

impl Config {
    /// Read and validate a JSON config file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Config = serde_json::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Check value ranges that serde cannot express.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.particles == 0 || self.particles > MAX_PARTICLES {
            return Err(ConfigError::Invalid(format!(
                "particles must be in 1..={MAX_PARTICLES}, got {}",
                self.particles
            )));
        }
        let a = &self.animation;
        for (name, k) in [("follow", a.follow), ("scale_follow", a.scale_follow)] {
            if !(k > 0.0 && k <= 1.0) {
                return Err(ConfigError::Invalid(format!("animation.{name} must be in (0, 1], got {k}")));
            }
        }
        for (name, value, limit) in [
            ("explosion", a.explosion, MAX_EXPLOSION),
            ("wobble_rate", a.wobble_rate, MAX_RATE),
            ("base_spin", a.base_spin, MAX_SPIN),
            ("tension_spin", a.tension_spin, MAX_SPIN),
        ] {
            if !(value.is_finite() && value.abs() <= limit) {
                return Err(ConfigError::Invalid(format!(
                    "animation.{name} must be within ±{limit}, got {value}"
                )));
            }
        }
        if a.explosion < 0.0 {
            return Err(ConfigError::Invalid("animation.explosion must not be negative".into()));
        }
        if let Some(fps) = a.reference_fps {
            if !(fps > 0.0 && fps.is_finite()) {
                return Err(ConfigError::Invalid(format!("animation.reference_fps must be positive, got {fps}")));
            }
        }
        if !(self.visuals.point_size > 0.0 && self.visuals.point_size.is_finite()) {
            return Err(ConfigError::Invalid("visuals.point_size must be positive".into()));
        }
        if !(0.0..=1.0).contains(&self.visuals.opacity) {
            return Err(ConfigError::Invalid("visuals.opacity must be in [0, 1]".into()));
        }
        if !(self.gesture.replay_rate_hz > 0.0) {
            return Err(ConfigError::Invalid("gesture.replay_rate_hz must be positive".into()));
        }
        if let Some(command) = &self.generation.command {
            if command.program.trim().is_empty() {
                return Err(ConfigError::Invalid("generation.command.program is empty".into()));
            }
            match Duration::try_from_secs_f32(command.timeout_secs) {
                Ok(timeout) if !timeout.is_zero() => {}
                _ => {
                    return Err(ConfigError::Invalid(format!(
                        "generation.command.timeout_secs must be a positive duration, got {}",
                        command.timeout_secs
                    )))
                }
            }
        }
        Ok(())
    }

    // ========== Builder ==========

    pub fn with_particles(mut self, particles: usize) -> Self {
        self.particles = particles;
        self
    }

    pub fn with_shape(mut self, shape: ShapeArchetype) -> Self {
        self.shape = shape;
        self
    }

    pub fn with_color(mut self, color: Color) -> Self {
        self.visuals.color = color;
        self
    }

    pub fn with_landmarks(mut self, path: impl Into<PathBuf>) -> Self {
        self.gesture.landmarks = Some(path.into());
        self
    }

    pub fn with_library(mut self, dir: impl Into<PathBuf>) -> Self {
        self.generation.library = Some(dir.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.particles, 3000);
        assert_eq!(config.shape, ShapeArchetype::Heart);
        assert_eq!(config.visuals.color.to_hex(), "#FF3366");
        assert_eq!(config.generation.point_count, 2000);
        assert_eq!(config.gesture.scale_policy, ScalePolicy::Reset);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_empty_document_is_default() {
        let config: Config = serde_json::from_str("{}").unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_load_partial_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r##"{{
                "particles": 500,
                "shape": "saturn",
                "animation": {{ "follow": 0.1 }},
                "gesture": {{ "scale_policy": "hold" }},
                "generation": {{ "command": {{ "program": "gen-shape" }} }}
            }}"##
        )
        .unwrap();

        let config = Config::load(file.path()).unwrap();
        assert_eq!(config.particles, 500);
        assert_eq!(config.shape, ShapeArchetype::Saturn);
        assert_eq!(config.animation.follow, 0.1);
        assert_eq!(config.animation.explosion, 3.0);
        assert_eq!(config.gesture.scale_policy, ScalePolicy::Hold);
        assert!(config.gesture.loop_replay);
        let command = config.generation.command.as_ref().unwrap();
        assert_eq!(command.timeout_secs, 60.0);
        assert_eq!(config.generation.service().name(), "gen-shape");
    }

    #[test]
    fn test_load_errors() {
        let err = Config::load("/nonexistent/zen.json").unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));

        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{{ \"particles\": \"many\" }}").unwrap();
        assert!(matches!(Config::load(file.path()), Err(ConfigError::Parse { .. })));

        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{{ \"particles\": 0 }}").unwrap();
        assert!(matches!(Config::load(file.path()), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_validation() {
        let mut config = Config::default();
        config.animation.follow = 0.0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.animation.reference_fps = Some(-1.0);
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.visuals.opacity = 1.5;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.animation.tension_spin = f32::NAN;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.animation.explosion = -1.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_non_finite_animation_is_rejected() {
        // 1e39 overflows f32 and parses as infinity.
        for field in ["explosion", "wobble_rate", "base_spin", "tension_spin"] {
            let mut file = tempfile::NamedTempFile::new().unwrap();
            write!(file, r#"{{ "particles": 4, "animation": {{ "{field}": 1e39 }} }}"#).unwrap();
            assert!(
                matches!(Config::load(file.path()), Err(ConfigError::Invalid(_))),
                "{field} accepted"
            );
        }
    }

    #[test]
    fn test_accepted_animation_stays_finite() {
        use crate::animation::ParticleField;
        use crate::cache::ShapeCache;
        use crate::resolver::TargetResolver;
        use crate::signal::InteractionSignal;
        use crate::time::FrameTime;

        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{ "particles": 4, "animation": {{ "explosion": 100, "wobble_rate": 1000, "base_spin": 1, "tension_spin": -1 }} }}"#
        )
        .unwrap();
        let config = Config::load(file.path()).unwrap();

        let cache = ShapeCache::new(config.particles);
        let target = TargetResolver::for_cache(&cache).resolve(ShapeArchetype::Heart, None, &cache);
        let mut field = ParticleField::new(&cache.get(ShapeArchetype::Fireworks), config.animation.clone());
        let signal = InteractionSignal::new(1.0, 3.0, true);
        for frame in 0..3 {
            field.step(FrameTime::fixed(frame, 60.0), &signal, &target);
        }
        assert!(field.positions().iter().all(|v| v.is_finite()));
        assert!(field.rotation().is_finite());
    }

    #[test]
    fn test_oversized_timeout_is_rejected() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{ "generation": {{ "command": {{ "program": "gen-shape", "timeout_secs": 1e20 }} }} }}"#
        )
        .unwrap();
        assert!(matches!(Config::load(file.path()), Err(ConfigError::Invalid(_))));

        let command = CommandConfig {
            program: "gen-shape".into(),
            args: Vec::new(),
            timeout_secs: 1e20,
        };
        assert_eq!(command.timeout(), Duration::from_secs(60));

        let command = CommandConfig {
            timeout_secs: 2.5,
            ..command
        };
        assert_eq!(command.timeout(), Duration::from_millis(2500));
    }

    #[test]
    fn test_service_selection() {
        assert_eq!(Config::default().generation.service().name(), "unconfigured");
        let config = Config::default().with_library("shapes");
        assert_eq!(config.generation.service().name(), "library");
    }

    #[test]
    fn test_builder() {
        let config = Config::default()
            .with_particles(42)
            .with_shape(ShapeArchetype::AiCustom)
            .with_landmarks("hands.jsonl");
        assert_eq!(config.particles, 42);
        assert_eq!(config.shape, ShapeArchetype::AiCustom);
        assert_eq!(config.gesture.landmarks, Some(PathBuf::from("hands.jsonl")));
    }
}
