//! Configuration vault – reads/writes `~/.ltlnav/config.toml`.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use ltlnav_runtime::NodeConfig;
use ltlnav_types::{Pose, TaskSpec};

/// Persisted operator configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Robot name attached to every log line of the planner.
    #[serde(default = "default_robot_name")]
    pub robot_name: String,

    /// TOML plan file replayed by the synthesizer.
    #[serde(default = "default_plan_path")]
    pub plan_path: PathBuf,

    /// Hard task used when none arrives on the bus during startup.
    #[serde(default = "default_hard_task")]
    pub hard_task: String,

    #[serde(default)]
    pub soft_task: String,

    /// How long to listen for tasks and the initial pose before planning.
    #[serde(default = "default_startup_window_ms")]
    pub startup_window_ms: u64,

    /// Bound on the navigation-server readiness wait.
    #[serde(default = "default_server_timeout_secs")]
    pub server_timeout_secs: u64,

    /// Drive a simulated robot instead of waiting for external poses.
    #[serde(default = "default_simulate")]
    pub simulate: bool,

    /// Simulated travel time per goal.
    #[serde(default = "default_sim_travel_ms")]
    pub sim_travel_ms: u64,

    /// Treat the navigation server as up without waiting for the transport.
    /// Implied by `simulate`.
    #[serde(default)]
    pub assume_server_ready: bool,

    /// Initial pose used when none arrives on the bus during startup.
    #[serde(default = "default_initial_pose", skip_serializing_if = "Option::is_none")]
    pub initial_pose: Option<Pose>,
}

fn default_robot_name() -> String {
    "tiago".to_string()
}
fn default_plan_path() -> PathBuf {
    PathBuf::from("plans/demo.toml")
}
fn default_hard_task() -> String {
    "<>(r2 && <>r3) && []<>r4".to_string()
}
fn default_initial_pose() -> Option<Pose> {
    Some(Pose::default())
}
fn default_startup_window_ms() -> u64 {
    3_000
}
fn default_server_timeout_secs() -> u64 {
    120
}
fn default_simulate() -> bool {
    true
}
fn default_sim_travel_ms() -> u64 {
    1_500
}

impl Default for Config {
    fn default() -> Self {
        Self {
            robot_name: default_robot_name(),
            plan_path: default_plan_path(),
            hard_task: default_hard_task(),
            soft_task: String::new(),
            startup_window_ms: default_startup_window_ms(),
            server_timeout_secs: default_server_timeout_secs(),
            simulate: default_simulate(),
            sim_travel_ms: default_sim_travel_ms(),
            assume_server_ready: false,
            initial_pose: default_initial_pose(),
        }
    }
}

impl Config {
    pub fn node_config(&self) -> NodeConfig {
        NodeConfig {
            robot_name: self.robot_name.clone(),
            startup_window: Duration::from_millis(self.startup_window_ms),
            server_timeout: Duration::from_secs(self.server_timeout_secs),
            defaults: TaskSpec {
                hard_task: self.hard_task.clone(),
                soft_task: self.soft_task.clone(),
                initial_pose: self.initial_pose,
            },
        }
    }

    pub fn sim_travel(&self) -> Duration {
        Duration::from_millis(self.sim_travel_ms)
    }

    /// Whether the adapter can be marked ready before startup.  Otherwise
    /// readiness is left to the transport and `server_timeout_secs` applies.
    pub fn server_ready_at_startup(&self) -> bool {
        self.simulate || self.assume_server_ready
    }
}

/// Return the path to `~/.ltlnav/config.toml`.
pub fn config_path() -> PathBuf {
    config_path_for_home(
        &std::env::var("HOME")
            .or_else(|_| std::env::var("USERPROFILE"))
            .unwrap_or_else(|_| ".".to_string()),
    )
}

pub(crate) fn config_path_for_home(home: &str) -> PathBuf {
    PathBuf::from(home).join(".ltlnav").join("config.toml")
}

/// Load the config from disk.  Returns `None` if the file does not exist.
pub fn load() -> Result<Option<Config>, String> {
    load_from(&config_path())
}

pub(crate) fn load_from(path: &Path) -> Result<Option<Config>, String> {
    if !path.exists() {
        return Ok(None);
    }
    let raw = fs::read_to_string(path)
        .map_err(|e| format!("Failed to read config at {}: {}", path.display(), e))?;
    let cfg: Config = toml::from_str(&raw).map_err(|e| format!("Failed to parse config: {}", e))?;
    Ok(Some(cfg))
}

/// Apply `LTLNAV_*` environment variable overrides to `cfg`.
///
/// | Variable | Config field |
/// |---|---|
/// | `LTLNAV_PLAN` | `plan_path` |
/// | `LTLNAV_ROBOT_NAME` | `robot_name` |
/// | `LTLNAV_HARD_TASK` | `hard_task` |
/// | `LTLNAV_SOFT_TASK` | `soft_task` |
/// | `LTLNAV_SERVER_TIMEOUT_SECS` | `server_timeout_secs` |
pub fn apply_env_overrides(cfg: &mut Config) {
    if let Ok(v) = std::env::var("LTLNAV_PLAN") {
        cfg.plan_path = PathBuf::from(v);
    }
    if let Ok(v) = std::env::var("LTLNAV_ROBOT_NAME") {
        cfg.robot_name = v;
    }
    if let Ok(v) = std::env::var("LTLNAV_HARD_TASK") {
        cfg.hard_task = v;
    }
    if let Ok(v) = std::env::var("LTLNAV_SOFT_TASK") {
        cfg.soft_task = v;
    }
    if let Some(secs) = std::env::var("LTLNAV_SERVER_TIMEOUT_SECS")
        .ok()
        .and_then(|v| v.parse::<u64>().ok())
    {
        cfg.server_timeout_secs = secs;
    }
}

/// Save the config to disk, creating `~/.ltlnav/` if necessary.
pub fn save(cfg: &Config) -> Result<(), String> {
    save_to(cfg, &config_path())
}

pub(crate) fn save_to(cfg: &Config, path: &Path) -> Result<(), String> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| format!("Failed to create config directory: {}", e))?;
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(parent, fs::Permissions::from_mode(0o700))
                .map_err(|e| format!("Failed to set config directory permissions: {}", e))?;
        }
    }
    let raw = toml::to_string_pretty(cfg).map_err(|e| format!("Failed to serialize config: {}", e))?;
    write_owner_only(path, raw.as_bytes())
        .map_err(|e| format!("Failed to write config at {}: {}", path.display(), e))
}

#[cfg(unix)]
fn write_owner_only(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    use std::io::Write;
    use std::os::unix::fs::OpenOptionsExt;
    fs::OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .mode(0o600)
        .open(path)?
        .write_all(bytes)
}

#[cfg(not(unix))]
fn write_owner_only(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    fs::write(path, bytes)
}
