/// WorldState: the complete state of the game, owned by the loop.
///
/// ## Phases
///
///   Loading ──(sprite ready / soft failure)──▶ Start
///   Loading ──(failure, strict assets)───────▶ LoadFailed   (sink)
///   Start ────(first jump)───────────────────▶ Playing
///   Playing ──(obstacle hit)─────────────────▶ GameOver
///   GameOver ─(restart)──────────────────────▶ Playing
///
/// No other transitions exist. Every entry into `Playing` goes through
/// `begin_run`, which rebuilds the run from scratch.
///
/// The renderer only reads this struct; all writes happen in `step`
/// and the input handlers next to it.

use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::assets::{LoadStatus, Sprite};
use crate::config::Tuning;
use crate::domain::entity::{Obstacle, Particle, Runner, Token};

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Phase {
    Loading,
    LoadFailed,
    Start,
    Playing,
    GameOver,
}

pub struct WorldState {
    // ── Entities ──
    pub runner: Runner,
    /// Spawn order is preserved; collision scans rely on it.
    pub obstacles: Vec<Obstacle>,
    pub tokens: Vec<Token>,
    pub particles: Vec<Particle>,

    // ── Run progress ──
    pub speed: f32,
    pub frame: u64,
    pub score: u32,
    pub running: bool,

    // ── Meta ──
    pub phase: Phase,
    pub runs: u32,
    pub tuning: Tuning,
    pub rng: StdRng,
}

// ── Construction ──

impl WorldState {
    /// Fresh world waiting for assets. `seed` makes spawning reproducible.
    pub fn new(tuning: Tuning, seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(s) => StdRng::seed_from_u64(s),
            None => StdRng::from_entropy(),
        };
        WorldState {
            runner: Runner::new(&tuning.physics),
            obstacles: vec![],
            tokens: vec![],
            particles: vec![],
            speed: tuning.speed.base_speed,
            frame: 0,
            score: 0,
            running: false,
            phase: Phase::Loading,
            runs: 0,
            tuning,
            rng,
        }
    }
}

// ── Phase transitions ──

impl WorldState {
    /// Loading → Start. Ignored in any other phase.
    pub fn assets_ready(&mut self) {
        if self.phase == Phase::Loading {
            self.phase = Phase::Start;
        }
    }

    /// Loading → LoadFailed. Ignored in any other phase.
    pub fn assets_failed(&mut self) {
        if self.phase == Phase::Loading {
            self.phase = Phase::LoadFailed;
        }
    }

    /// Apply a finished sprite load and hand back the sprite to draw.
    ///
    /// A failure leaves no sprite: with `strict` the world sinks into
    /// LoadFailed, otherwise it goes to Start and the runner is drawn as
    /// a placeholder. `Pending` changes nothing.
    pub fn apply_load(&mut self, status: LoadStatus, strict: bool) -> Option<Sprite> {
        match status {
            LoadStatus::Pending => None,
            LoadStatus::Ready(sprite) => {
                log::info!("sprite ready ({}x{})", sprite.width, sprite.height);
                self.assets_ready();
                Some(sprite)
            }
            LoadStatus::Failed(e) => {
                log::error!("sprite failed to load: {e}");
                if strict {
                    self.assets_failed();
                } else {
                    log::warn!("continuing with placeholder runner");
                    self.assets_ready();
                }
                None
            }
        }
    }

    /// Start / GameOver → Playing with a completely fresh run.
    /// Returns false (and changes nothing) from any other phase.
    pub fn begin_run(&mut self) -> bool {
        if !matches!(self.phase, Phase::Start | Phase::GameOver) {
            return false;
        }
        self.reset_run();
        self.running = true;
        self.runs += 1;
        self.phase = Phase::Playing;
        true
    }

    /// Playing → GameOver. The entity lists are left as they were so the
    /// final frame stays on screen behind the summary.
    pub fn end_run(&mut self) {
        if self.phase == Phase::Playing {
            self.running = false;
            self.phase = Phase::GameOver;
        }
    }

    fn reset_run(&mut self) {
        self.runner = Runner::new(&self.tuning.physics);
        self.obstacles.clear();
        self.tokens.clear();
        self.particles.clear();
        self.speed = self.tuning.speed.base_speed;
        self.frame = 0;
        self.score = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::AssetError;

    fn world() -> WorldState {
        WorldState::new(Tuning::default(), Some(1))
    }

    #[test]
    fn starts_loading() {
        let w = world();
        assert_eq!(w.phase, Phase::Loading);
        assert!(!w.running);
    }

    #[test]
    fn cannot_begin_while_loading() {
        let mut w = world();
        assert!(!w.begin_run());
        assert_eq!(w.phase, Phase::Loading);
    }

    #[test]
    fn load_failure_is_a_sink() {
        let mut w = world();
        w.assets_failed();
        assert_eq!(w.phase, Phase::LoadFailed);
        w.assets_ready();
        assert_eq!(w.phase, Phase::LoadFailed);
        assert!(!w.begin_run());
    }

    #[test]
    fn sprite_load_reaches_start() {
        let mut w = world();
        assert!(w.apply_load(LoadStatus::Pending, false).is_none());
        assert_eq!(w.phase, Phase::Loading);

        let sprite = Sprite::builtin_horse().unwrap();
        assert!(w.apply_load(LoadStatus::Ready(sprite), true).is_some());
        assert_eq!(w.phase, Phase::Start);
    }

    #[test]
    fn soft_load_failure_falls_back_to_placeholder() {
        let mut w = world();
        let sprite = w.apply_load(LoadStatus::Failed(AssetError::Interrupted), false);
        assert!(sprite.is_none());
        assert_eq!(w.phase, Phase::Start);
        assert!(w.begin_run());
    }

    #[test]
    fn strict_load_failure_sinks() {
        let mut w = world();
        let sprite = w.apply_load(LoadStatus::Failed(AssetError::Interrupted), true);
        assert!(sprite.is_none());
        assert_eq!(w.phase, Phase::LoadFailed);
        assert!(!w.begin_run());
    }

    #[test]
    fn full_lifecycle() {
        let mut w = world();
        w.assets_ready();
        assert_eq!(w.phase, Phase::Start);

        assert!(w.begin_run());
        assert_eq!(w.phase, Phase::Playing);
        assert!(w.running);
        // no restart mid-run
        assert!(!w.begin_run());

        w.end_run();
        assert_eq!(w.phase, Phase::GameOver);
        assert!(!w.running);

        assert!(w.begin_run());
        assert_eq!(w.phase, Phase::Playing);
        assert_eq!(w.runs, 2);
    }

    #[test]
    fn end_run_outside_playing_is_ignored() {
        let mut w = world();
        w.assets_ready();
        w.end_run();
        assert_eq!(w.phase, Phase::Start);
    }
}
