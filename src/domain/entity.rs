/// Entities: Runner, Obstacle, Token, Particle.
///
/// Plain records. Behaviour lives in `physics` / `collision` and in the
/// simulation step; the only methods here are construction and bounds.
///
/// All coordinates are canvas units (800×400), y grows downward.

use super::geometry::Rect;
use crate::config::{PhysicsConfig, CANVAS_HEIGHT, CANVAS_WIDTH};

// ── Dimensions ──

pub const RUNNER_X: f32 = 60.0;
pub const RUNNER_SIZE: f32 = 90.0;
/// Sprite silhouette does not fill its square; the hitbox is inset this much.
pub const RUNNER_HITBOX_PADDING: f32 = 20.0;

pub const OBSTACLE_W: f32 = 40.0;
pub const OBSTACLE_H: f32 = 50.0;
pub const OBSTACLE_HITBOX_INSET: f32 = 4.0;

pub const TOKEN_W: f32 = 30.0;
pub const TOKEN_H: f32 = 20.0;
/// Token heights above the ground line: on the ground, mid jump, top of jump.
pub const TOKEN_TIERS: [f32; 3] = [50.0, 120.0, 180.0];

/// Entities are dropped once their right edge passes this x.
pub const DESPAWN_X: f32 = -100.0;
/// Particles drift up this far per frame.
pub const PARTICLE_RISE: f32 = 1.0;

/// y of the ground line (top of the ground strip).
#[inline]
pub fn ground_line(physics: &PhysicsConfig) -> f32 {
    CANVAS_HEIGHT - physics.ground_height
}

// ── Runner ──

#[derive(Clone, Debug, PartialEq)]
pub struct Runner {
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
    pub vy: f32,
    pub airborne: bool,
    pub frame_count: u64,
}

impl Runner {
    /// A runner resting on the ground, ready for a fresh run.
    pub fn new(physics: &PhysicsConfig) -> Self {
        Runner {
            x: RUNNER_X,
            y: Self::rest_y(physics),
            w: RUNNER_SIZE,
            h: RUNNER_SIZE,
            vy: 0.0,
            airborne: false,
            frame_count: 0,
        }
    }

    /// Resting y: feet sink `ground_sink` units into the ground strip.
    #[inline]
    pub fn rest_y(physics: &PhysicsConfig) -> f32 {
        ground_line(physics) - RUNNER_SIZE + physics.ground_sink
    }

    pub fn bounds(&self) -> Rect {
        Rect::new(self.x, self.y, self.w, self.h)
    }

    pub fn hitbox(&self) -> Rect {
        self.bounds().inset_uniform(RUNNER_HITBOX_PADDING)
    }
}

// ── Obstacle ──

#[derive(Clone, Debug, PartialEq)]
pub struct Obstacle {
    /// Frame index the obstacle was spawned on.
    pub id: u64,
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
}

impl Obstacle {
    /// Spawn at the right edge, standing on the ground line.
    pub fn spawn(id: u64, physics: &PhysicsConfig) -> Self {
        Obstacle {
            id,
            x: CANVAS_WIDTH,
            y: ground_line(physics) - OBSTACLE_H,
            w: OBSTACLE_W,
            h: OBSTACLE_H,
        }
    }

    pub fn bounds(&self) -> Rect {
        Rect::new(self.x, self.y, self.w, self.h)
    }

    /// Trimmed left and right, shifted down by the top inset; keeps its full height.
    pub fn hitbox(&self) -> Rect {
        self.bounds().inset(OBSTACLE_HITBOX_INSET, OBSTACLE_HITBOX_INSET, OBSTACLE_HITBOX_INSET, -OBSTACLE_HITBOX_INSET)
    }

    pub fn is_offscreen(&self) -> bool {
        self.x + self.w <= DESPAWN_X
    }
}

// ── Token ──

#[derive(Clone, Debug, PartialEq)]
pub struct Token {
    pub id: u64,
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
    pub collected: bool,
    /// Phase of the floating bob, in [0, 2π).
    pub float_offset: f32,
}

impl Token {
    /// Spawn at the right edge, `tier` units above the ground line.
    pub fn spawn(id: u64, tier: f32, float_offset: f32, physics: &PhysicsConfig) -> Self {
        Token {
            id,
            x: CANVAS_WIDTH,
            y: ground_line(physics) - tier,
            w: TOKEN_W,
            h: TOKEN_H,
            collected: false,
            float_offset,
        }
    }

    pub fn bounds(&self) -> Rect {
        Rect::new(self.x, self.y, self.w, self.h)
    }

    pub fn is_offscreen(&self) -> bool {
        self.x + self.w <= DESPAWN_X
    }
}

// ── Particle ──

/// RGB triple; the renderer maps it onto terminal colors.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Rgb(pub u8, pub u8, pub u8);

pub const GOLD: Rgb = Rgb(245, 158, 11);

#[derive(Clone, Debug, PartialEq)]
pub struct Particle {
    pub x: f32,
    pub y: f32,
    pub life: u32,
    pub text: String,
    pub color: Rgb,
}

impl Particle {
    /// "+10¥" floating up from where a token was picked.
    pub fn score_popup(x: f32, y: f32, value: u32, life: u32) -> Self {
        Particle {
            x,
            y,
            life,
            text: format!("+{value}¥"),
            color: GOLD,
        }
    }

    /// Age one frame and drift up. Returns true while still alive.
    pub fn tick(&mut self) -> bool {
        self.life = self.life.saturating_sub(1);
        self.y -= PARTICLE_RISE;
        self.life > 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn runner_starts_on_ground() {
        let p = PhysicsConfig::default();
        let r = Runner::new(&p);
        // 400 - 50 - 90 + 4
        assert_eq!(r.y, 264.0);
        assert!(!r.airborne);
        assert_eq!(r.hitbox(), Rect::new(80.0, 284.0, 50.0, 50.0));
    }

    #[test]
    fn obstacle_stands_on_ground_line() {
        let p = PhysicsConfig::default();
        let o = Obstacle::spawn(3, &p);
        assert_eq!(o.bounds().bottom(), ground_line(&p));
        assert_eq!(o.x, CANVAS_WIDTH);
        let hb = o.hitbox();
        assert_eq!(hb.x, o.x + 4.0);
        assert_eq!(hb.y, o.y + 4.0);
        assert_eq!(hb.w, o.w - 8.0);
        assert_eq!(hb.h, o.h);
    }

    #[test]
    fn token_tiers_above_ground() {
        let p = PhysicsConfig::default();
        let t = Token::spawn(0, TOKEN_TIERS[1], 0.0, &p);
        assert_eq!(t.y, 350.0 - 120.0);
        assert!(!t.collected);
    }

    #[test]
    fn offscreen_threshold() {
        let p = PhysicsConfig::default();
        let mut o = Obstacle::spawn(0, &p);
        o.x = -139.0;
        assert!(!o.is_offscreen());
        o.x = -140.0;
        assert!(o.is_offscreen());
    }

    #[test]
    fn particle_lifecycle() {
        let mut part = Particle::score_popup(100.0, 50.0, 10, 2);
        assert_eq!(part.text, "+10¥");
        assert!(part.tick());
        assert_eq!(part.y, 49.0);
        assert!(!part.tick());
        assert_eq!(part.life, 0);
    }
}
