/// External configuration loader.
///
/// Reads `config.toml` from the executable's directory (or CWD).
/// Falls back to sensible defaults if the file is missing or incomplete.
///
/// Logging is not up yet when the config is read (the log file path lives
/// in the config), so problems are collected in `warnings` and logged by
/// the caller once the logger is installed.

use serde::Deserialize;
use std::path::PathBuf;

/// Logical canvas size. All world coordinates live in this space;
/// the renderer scales it to whatever the terminal offers.
pub const CANVAS_WIDTH: f32 = 800.0;
pub const CANVAS_HEIGHT: f32 = 400.0;

// ── Public Config Struct ──

#[derive(Clone, Debug)]
pub struct GameConfig {
    pub tuning: Tuning,
    pub tick_rate_ms: u64,
    pub gamepad: GamepadConfig,
    pub sprite: Option<PathBuf>,
    pub strict_assets: bool,
    pub log_file: PathBuf,
    pub seed: Option<u64>,
    pub warnings: Vec<String>,
}

/// Everything the simulation reads. Cloned into `WorldState`.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Tuning {
    pub physics: PhysicsConfig,
    pub speed: SpeedConfig,
    pub spawn: SpawnConfig,
    pub score: ScoreConfig,
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct PhysicsConfig {
    pub gravity: f32,
    pub jump_strength: f32,     // negative = upward
    pub ground_height: f32,
    pub ground_sink: f32,       // runner rests this far into the ground strip
    pub jump_tolerance: f32,    // how far above ground a jump is still honored
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct SpeedConfig {
    pub base_speed: f32,
    pub speed_step: f32,
    pub speed_step_frames: u64,
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct SpawnConfig {
    pub obstacle_interval: f32,
    pub token_interval: f32,
    pub obstacle_chance: f64,
    pub token_chance: f64,
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct ScoreConfig {
    pub token_value: u32,
    pub particle_life: u32,
}

#[derive(Clone, Debug)]
pub struct GamepadConfig {
    pub jump: Vec<String>,
    pub confirm: Vec<String>,
    pub cancel: Vec<String>,
}

impl Default for PhysicsConfig {
    fn default() -> Self {
        PhysicsConfig {
            gravity: 0.6,
            jump_strength: -12.0,
            ground_height: 50.0,
            ground_sink: 4.0,
            jump_tolerance: 5.0,
        }
    }
}

impl Default for SpeedConfig {
    fn default() -> Self {
        SpeedConfig {
            base_speed: 2.5,
            speed_step: 0.5,
            speed_step_frames: 500,
        }
    }
}

impl Default for SpawnConfig {
    fn default() -> Self {
        SpawnConfig {
            obstacle_interval: 220.0,
            token_interval: 150.0,
            obstacle_chance: 0.6,
            token_chance: 0.7,
        }
    }
}

impl Default for ScoreConfig {
    fn default() -> Self {
        ScoreConfig { token_value: 10, particle_life: 30 }
    }
}

// ── TOML Schema (with serde defaults) ──

#[derive(Deserialize, Debug, Default)]
struct TomlConfig {
    #[serde(default)]
    physics: PhysicsConfig,
    #[serde(default)]
    speed: TomlSpeed,
    #[serde(default)]
    spawn: SpawnConfig,
    #[serde(default)]
    score: ScoreConfig,
    #[serde(default)]
    assets: TomlAssets,
    #[serde(default)]
    gamepad: TomlGamepad,
    #[serde(default)]
    general: TomlGeneral,
}

/// `[speed]` mixes loop timing with the simulation's speed curve.
#[derive(Deserialize, Debug)]
struct TomlSpeed {
    #[serde(default = "default_tick_rate")]
    tick_rate_ms: u64,
    #[serde(flatten)]
    curve: SpeedConfig,
}

#[derive(Deserialize, Debug, Default)]
struct TomlAssets {
    #[serde(default)]
    sprite: String,
    #[serde(default)]
    strict: bool,
}

#[derive(Deserialize, Debug)]
struct TomlGamepad {
    #[serde(default = "default_jump")]
    jump: Vec<String>,
    #[serde(default = "default_confirm")]
    confirm: Vec<String>,
    #[serde(default = "default_cancel")]
    cancel: Vec<String>,
}

#[derive(Deserialize, Debug)]
struct TomlGeneral {
    #[serde(default = "default_log_file")]
    log_file: String,
    #[serde(default)]
    seed: Option<u64>,
}

// ── Defaults ──

fn default_tick_rate() -> u64 { 16 }  // ~60 fps
fn default_jump() -> Vec<String> { vec!["A".into(), "B".into()] }
fn default_confirm() -> Vec<String> { vec!["Start".into()] }
fn default_cancel() -> Vec<String> { vec!["Select".into()] }
fn default_log_file() -> String { "springrunner.log".into() }

impl Default for TomlSpeed {
    fn default() -> Self {
        TomlSpeed {
            tick_rate_ms: default_tick_rate(),
            curve: SpeedConfig::default(),
        }
    }
}

impl Default for TomlGamepad {
    fn default() -> Self {
        TomlGamepad {
            jump: default_jump(),
            confirm: default_confirm(),
            cancel: default_cancel(),
        }
    }
}

impl Default for TomlGeneral {
    fn default() -> Self {
        TomlGeneral {
            log_file: default_log_file(),
            seed: None,
        }
    }
}

// ── Loading ──

impl GameConfig {
    /// Load config from `config.toml`.
    /// Search order: (1) exe directory, (2) current working directory.
    /// Missing file or missing keys gracefully fall back to defaults.
    pub fn load() -> Self {
        let search_dirs = candidate_dirs();
        let mut warnings = Vec::new();
        let toml_cfg = load_toml(&search_dirs, &mut warnings);
        Self::resolve(toml_cfg, &search_dirs, warnings)
    }

    /// Parse a config from TOML text. Relative paths resolve against CWD.
    #[cfg(test)]
    pub fn from_toml_str(text: &str) -> Result<Self, toml::de::Error> {
        let toml_cfg = toml::from_str::<TomlConfig>(text)?;
        Ok(Self::resolve(toml_cfg, &[], Vec::new()))
    }

    fn resolve(toml_cfg: TomlConfig, search_dirs: &[PathBuf], mut warnings: Vec<String>) -> Self {
        let sprite = match toml_cfg.assets.sprite.trim() {
            "" => None,
            path => Some(resolve_path(path, search_dirs)),
        };

        let mut tuning = Tuning {
            physics: toml_cfg.physics,
            speed: toml_cfg.speed.curve,
            spawn: toml_cfg.spawn,
            score: toml_cfg.score,
        };
        sanitize(&mut tuning, &mut warnings);

        GameConfig {
            tuning,
            tick_rate_ms: toml_cfg.speed.tick_rate_ms.max(1),
            gamepad: GamepadConfig {
                jump: toml_cfg.gamepad.jump,
                confirm: toml_cfg.gamepad.confirm,
                cancel: toml_cfg.gamepad.cancel,
            },
            sprite,
            strict_assets: toml_cfg.assets.strict,
            log_file: PathBuf::from(toml_cfg.general.log_file),
            seed: toml_cfg.general.seed,
            warnings,
        }
    }
}

impl Default for GameConfig {
    fn default() -> Self {
        Self::resolve(TomlConfig::default(), &[], Vec::new())
    }
}

/// Clamp values that would break the simulation (NaN or infinite
/// numbers, division by zero, probabilities outside [0, 1]).
/// Each fix leaves a warning.
fn sanitize(t: &mut Tuning, warnings: &mut Vec<String>) {
    let defaults = Tuning::default();
    for (name, value, default) in [
        ("physics.gravity", &mut t.physics.gravity, defaults.physics.gravity),
        ("physics.jump_strength", &mut t.physics.jump_strength, defaults.physics.jump_strength),
        ("physics.ground_height", &mut t.physics.ground_height, defaults.physics.ground_height),
        ("physics.ground_sink", &mut t.physics.ground_sink, defaults.physics.ground_sink),
        ("physics.jump_tolerance", &mut t.physics.jump_tolerance, defaults.physics.jump_tolerance),
        ("speed.base_speed", &mut t.speed.base_speed, defaults.speed.base_speed),
        ("speed.speed_step", &mut t.speed.speed_step, defaults.speed.speed_step),
        ("spawn.obstacle_interval", &mut t.spawn.obstacle_interval, defaults.spawn.obstacle_interval),
        ("spawn.token_interval", &mut t.spawn.token_interval, defaults.spawn.token_interval),
    ] {
        if !value.is_finite() {
            warnings.push(format!("{name} = {value} is not a finite number, using {default}"));
            *value = default;
        }
    }

    if t.speed.base_speed <= 0.0 {
        warnings.push(format!("speed.base_speed must be > 0, using {}", defaults.speed.base_speed));
        t.speed.base_speed = defaults.speed.base_speed;
    }
    if t.speed.speed_step_frames == 0 {
        warnings.push(format!("speed.speed_step_frames must be > 0, using {}", defaults.speed.speed_step_frames));
        t.speed.speed_step_frames = defaults.speed.speed_step_frames;
    }
    if t.speed.speed_step < 0.0 {
        warnings.push("speed.speed_step must not be negative, using 0".to_string());
        t.speed.speed_step = 0.0;
    }
    for (name, chance, default) in [
        ("spawn.obstacle_chance", &mut t.spawn.obstacle_chance, defaults.spawn.obstacle_chance),
        ("spawn.token_chance", &mut t.spawn.token_chance, defaults.spawn.token_chance),
    ] {
        if !chance.is_finite() {
            warnings.push(format!("{name} = {chance} is not a finite number, using {default}"));
            *chance = default;
        } else if !(0.0..=1.0).contains(&*chance) {
            warnings.push(format!("{name} = {chance} is outside [0, 1], clamping"));
            *chance = chance.clamp(0.0, 1.0);
        }
    }
}

/// Absolute paths pass through; relative ones are looked up in the
/// candidate dirs, falling back to CWD-relative.
fn resolve_path(path: &str, search_dirs: &[PathBuf]) -> PathBuf {
    let p = PathBuf::from(path);
    if p.is_absolute() {
        return p;
    }
    search_dirs.iter()
        .map(|d| d.join(path))
        .find(|candidate| candidate.exists())
        .unwrap_or(p)
}

/// Candidate directories to search: exe dir + CWD (deduplicated).
fn candidate_dirs() -> Vec<PathBuf> {
    let mut dirs = vec![];

    if let Ok(exe) = std::env::current_exe() {
        let resolved = exe.canonicalize().unwrap_or(exe);
        if let Some(parent) = resolved.parent() {
            dirs.push(parent.to_path_buf());
        }
    }

    if let Ok(cwd) = std::env::current_dir() {
        if !dirs.iter().any(|d| d == &cwd) {
            dirs.push(cwd);
        }
    }

    if dirs.is_empty() {
        dirs.push(PathBuf::from("."));
    }

    dirs
}

/// Search for config.toml in candidate directories.
fn load_toml(search_dirs: &[PathBuf], warnings: &mut Vec<String>) -> TomlConfig {
    for dir in search_dirs {
        let path = dir.join("config.toml");
        if path.exists() {
            match std::fs::read_to_string(&path) {
                Ok(text) => match toml::from_str::<TomlConfig>(&text) {
                    Ok(cfg) => return cfg,
                    Err(e) => {
                        warnings.push(format!("config.toml parse error: {e}; using default settings"));
                        return TomlConfig::default();
                    }
                },
                Err(e) => {
                    warnings.push(format!("could not read {}: {e}", path.display()));
                }
            }
        }
    }
    TomlConfig::default()
}
