//! Rover configuration – reads/writes `~/.rover/config.toml`.

use std::fs;
use std::path::{Path, PathBuf};

use rover_runtime::{GoalKind, GoalOptions, Timing};
use rover_types::RoverError;
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Persisted configuration for `rover run`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Goals to schedule, in registration order.
    #[serde(default = "default_goals")]
    pub goals: Vec<GoalKind>,

    /// Rays on the simulated sensor.
    #[serde(default = "default_ray_count")]
    pub ray_count: usize,

    /// Seed for every random source; unset means a fresh seed each run.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,

    /// Length of a run in seconds of virtual time.
    #[serde(default = "default_run_secs")]
    pub run_secs: u64,

    /// Let the roam goal pick its pause state.
    #[serde(default)]
    pub roam_pause: bool,

    /// Make the avoid goal stop once and end when every ray is hit.
    #[serde(default)]
    pub avoid_exclusive_stop: bool,

    /// Minimum passes of forward motion before the next obstacle.
    #[serde(default = "default_obstacle_min")]
    pub obstacle_min_passes: u32,

    /// Maximum passes of forward motion before the next obstacle.
    #[serde(default = "default_obstacle_max")]
    pub obstacle_max_passes: u32,

    #[serde(default)]
    pub timing: Timing,
}

fn default_goals() -> Vec<GoalKind> {
    vec![GoalKind::Avoid]
}
fn default_ray_count() -> usize {
    5
}
fn default_run_secs() -> u64 {
    30
}
fn default_obstacle_min() -> u32 {
    20
}
fn default_obstacle_max() -> u32 {
    60
}

impl Default for Config {
    fn default() -> Self {
        Self {
            goals: default_goals(),
            ray_count: default_ray_count(),
            seed: None,
            run_secs: default_run_secs(),
            roam_pause: false,
            avoid_exclusive_stop: false,
            obstacle_min_passes: default_obstacle_min(),
            obstacle_max_passes: default_obstacle_max(),
            timing: Timing::default(),
        }
    }
}

impl Config {
    /// Reject values the runtime cannot work with.
    pub fn validate(&self) -> Result<(), RoverError> {
        if self.ray_count == 0 {
            return Err(RoverError::Config("ray_count must be at least 1".into()));
        }
        if self.goals.is_empty() {
            return Err(RoverError::Config("at least one goal is required".into()));
        }
        if self.obstacle_min_passes > self.obstacle_max_passes {
            return Err(RoverError::Config(format!(
                "obstacle_min_passes ({}) exceeds obstacle_max_passes ({})",
                self.obstacle_min_passes, self.obstacle_max_passes
            )));
        }
        Ok(())
    }

    pub fn goal_options(&self) -> GoalOptions {
        GoalOptions {
            seed: self.seed,
            roam_pause: self.roam_pause,
            avoid_exclusive_stop: self.avoid_exclusive_stop,
        }
    }
}

/// Return the path to `~/.rover/config.toml`.
pub fn config_path() -> PathBuf {
    config_path_for_home(
        &std::env::var("HOME")
            .or_else(|_| std::env::var("USERPROFILE"))
            .unwrap_or_else(|_| ".".to_string()),
    )
}

pub(crate) fn config_path_for_home(home: &str) -> PathBuf {
    PathBuf::from(home).join(".rover").join("config.toml")
}

/// Load the config from disk with `ROVER_*` overrides applied.  A missing
/// file yields the defaults.
///
/// The result is not validated; callers run [`Config::validate`] once every
/// override (including command line flags) has been applied.
pub fn load() -> Result<Config, RoverError> {
    let mut cfg = load_from(&config_path())?.unwrap_or_default();
    apply_env_overrides(&mut cfg);
    Ok(cfg)
}

/// Load the config from a specific path.  Returns `None` if the file does
/// not exist.
pub(crate) fn load_from(path: &Path) -> Result<Option<Config>, RoverError> {
    if !path.exists() {
        return Ok(None);
    }
    let raw = fs::read_to_string(path).map_err(|e| {
        RoverError::Config(format!("failed to read config at {}: {e}", path.display()))
    })?;
    let cfg: Config = toml::from_str(&raw)
        .map_err(|e| RoverError::Config(format!("failed to parse config: {e}")))?;
    Ok(Some(cfg))
}

/// Apply `ROVER_*` environment variable overrides to `cfg`.
///
/// | Variable | Config field |
/// |---|---|
/// | `ROVER_GOALS` | `goals` (comma-separated) |
/// | `ROVER_RAY_COUNT` | `ray_count` |
/// | `ROVER_SEED` | `seed` |
/// | `ROVER_RUN_SECS` | `run_secs` |
pub fn apply_env_overrides(cfg: &mut Config) {
    apply_overrides(cfg, |key| std::env::var(key).ok());
}

/// Same as [`apply_env_overrides`], reading from `lookup`.  Unparseable
/// values are ignored with a warning.
pub(crate) fn apply_overrides(cfg: &mut Config, lookup: impl Fn(&str) -> Option<String>) {
    if let Some(v) = lookup("ROVER_GOALS") {
        match parse_goal_list(&v) {
            Ok(goals) => cfg.goals = goals,
            Err(e) => warn!(error = %e, "ignoring ROVER_GOALS"),
        }
    }
    if let Some(v) = lookup("ROVER_RAY_COUNT") {
        match v.trim().parse::<usize>() {
            Ok(n) => cfg.ray_count = n,
            Err(_) => warn!(value = %v, "ignoring ROVER_RAY_COUNT"),
        }
    }
    if let Some(v) = lookup("ROVER_SEED") {
        match v.trim().parse::<u64>() {
            Ok(seed) => cfg.seed = Some(seed),
            Err(_) => warn!(value = %v, "ignoring ROVER_SEED"),
        }
    }
    if let Some(v) = lookup("ROVER_RUN_SECS") {
        match v.trim().parse::<u64>() {
            Ok(secs) => cfg.run_secs = secs,
            Err(_) => warn!(value = %v, "ignoring ROVER_RUN_SECS"),
        }
    }
}

pub fn parse_goal_list(raw: &str) -> Result<Vec<GoalKind>, RoverError> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::parse)
        .collect()
}

/// Save the config to disk, creating `~/.rover/` if necessary.
pub fn save(cfg: &Config) -> Result<(), RoverError> {
    save_to(cfg, &config_path())
}

/// Save the config to a specific path with owner-only permissions.
pub(crate) fn save_to(cfg: &Config, path: &Path) -> Result<(), RoverError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .map_err(|e| RoverError::Config(format!("failed to create config directory: {e}")))?;
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(parent, fs::Permissions::from_mode(0o700)).map_err(|e| {
                RoverError::Config(format!("failed to set config directory permissions: {e}"))
            })?;
        }
    }
    let raw = to_toml(cfg)?;
    let write_err =
        |e: std::io::Error| RoverError::Config(format!("failed to write config at {}: {e}", path.display()));
    #[cfg(unix)]
    {
        use std::io::Write;
        use std::os::unix::fs::OpenOptionsExt;
        fs::OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .mode(0o600)
            .open(path)
            .and_then(|mut f| f.write_all(raw.as_bytes()))
            .map_err(write_err)?;
    }
    #[cfg(not(unix))]
    fs::write(path, raw).map_err(write_err)?;
    Ok(())
}

pub fn to_toml(cfg: &Config) -> Result<String, RoverError> {
    toml::to_string_pretty(cfg)
        .map_err(|e| RoverError::Config(format!("failed to serialize config: {e}")))
}
