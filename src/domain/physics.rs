/// Runner physics and the scroll-speed curve.
///
/// Pure functions over a `Runner` and the tuning tables. No world access.
///
/// ## Vertical motion
///
/// Explicit Euler, one step per frame:
///   vy += gravity
///   y  += vy
/// then clamp to the rest line. The runner never ends a frame below
/// `Runner::rest_y`.
///
/// ## Jump eligibility
///
///   y >= ground_line - size - jump_tolerance
///
/// The band is measured from the unsunk ground position, so a runner
/// resting at `rest_y` (sunk a few units) is always inside it.
///
/// ## Speed curve
///
///   speed(frame) = base + floor(frame / step_frames) * step
///
/// Monotonic in `frame`; a run never slows down.

use super::entity::{ground_line, Runner};
use crate::config::{PhysicsConfig, SpeedConfig};

/// Token bob: angular step per frame and amplitude per frame.
const FLOAT_RATE: f32 = 0.1;
const FLOAT_AMPLITUDE: f32 = 0.5;

/// Integrate gravity for one frame and clamp to the ground.
/// Returns true if the runner touched down this frame.
pub fn integrate(runner: &mut Runner, physics: &PhysicsConfig) -> bool {
    runner.vy += physics.gravity;
    runner.y += runner.vy;

    let rest = Runner::rest_y(physics);
    if runner.y > rest {
        let was_airborne = runner.airborne;
        runner.y = rest;
        runner.vy = 0.0;
        runner.airborne = false;
        return was_airborne;
    }
    false
}

/// Is the runner close enough to the ground to jump?
#[inline]
pub fn can_jump(runner: &Runner, physics: &PhysicsConfig) -> bool {
    let ground_level = ground_line(physics) - runner.h;
    runner.y >= ground_level - physics.jump_tolerance
}

/// Apply the jump impulse if eligible. Returns whether it fired.
pub fn try_jump(runner: &mut Runner, physics: &PhysicsConfig) -> bool {
    if !can_jump(runner, physics) {
        return false;
    }
    runner.vy = physics.jump_strength;
    runner.airborne = true;
    true
}

/// Scroll speed for a given frame of the run.
pub fn speed_at(frame: u64, speed: &SpeedConfig) -> f32 {
    let steps = frame / speed.speed_step_frames.max(1);
    speed.base_speed + steps as f32 * speed.speed_step
}

/// Vertical bob applied to a token this frame.
#[inline]
pub fn token_float(frame: u64, phase: f32) -> f32 {
    (frame as f32 * FLOAT_RATE + phase).sin() * FLOAT_AMPLITUDE
}

/// Spawn interval in frames: faster scroll → more frequent spawns.
/// Never below 1 so `frame % interval` stays defined.
pub fn spawn_interval(base_interval: f32, speed: f32, base_speed: f32) -> u64 {
    let ratio = speed / base_speed;
    let interval = (base_interval / ratio).floor();
    if interval.is_finite() && interval >= 1.0 {
        interval as u64
    } else {
        1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cfg() -> PhysicsConfig {
        PhysicsConfig::default()
    }

    #[test]
    fn resting_runner_stays_put() {
        let p = cfg();
        let mut r = Runner::new(&p);
        let y0 = r.y;
        for _ in 0..50 {
            assert!(!integrate(&mut r, &p));
        }
        assert_eq!(r.y, y0);
        assert_eq!(r.vy, 0.0);
    }

    #[test]
    fn jump_arc_returns_to_ground() {
        let p = cfg();
        let mut r = Runner::new(&p);
        let rest = r.y;
        assert!(try_jump(&mut r, &p));
        assert!(r.airborne);

        let mut landed_at = None;
        let mut apex = rest;
        for frame in 0..200 {
            let landed = integrate(&mut r, &p);
            apex = apex.min(r.y);
            assert!(r.y <= rest + 1e-4, "runner sank below ground");
            if landed {
                landed_at = Some(frame);
                break;
            }
        }
        assert!(landed_at.is_some());
        assert!(!r.airborne);
        assert_eq!(r.y, rest);
        // 12 up, 0.6 down per frame: rises ~114 units
        assert!(rest - apex > 100.0 && rest - apex < 130.0);
    }

    #[test]
    fn no_double_jump() {
        let p = cfg();
        let mut r = Runner::new(&p);
        assert!(try_jump(&mut r, &p));
        for _ in 0..5 {
            integrate(&mut r, &p);
        }
        let vy = r.vy;
        assert!(!try_jump(&mut r, &p));
        assert_eq!(r.vy, vy);
    }

    #[test]
    fn jump_band_edges() {
        let p = cfg();
        let mut r = Runner::new(&p);
        // ground level (unsunk) = 260, tolerance 5 → 255
        r.y = 255.0;
        assert!(can_jump(&r, &p));
        r.y = 254.9;
        assert!(!can_jump(&r, &p));
    }

    #[test]
    fn speed_steps_every_n_frames() {
        let s = SpeedConfig::default();
        assert_eq!(speed_at(0, &s), 2.5);
        assert_eq!(speed_at(499, &s), 2.5);
        assert_eq!(speed_at(500, &s), 3.0);
        assert_eq!(speed_at(1499, &s), 3.5);
        let mut last = 0.0;
        for f in (0..5000).step_by(37) {
            let v = speed_at(f, &s);
            assert!(v >= last);
            last = v;
        }
    }

    #[test]
    fn spawn_interval_shrinks_with_speed() {
        assert_eq!(spawn_interval(220.0, 2.5, 2.5), 220);
        assert_eq!(spawn_interval(220.0, 3.0, 2.5), 183);
        assert_eq!(spawn_interval(150.0, 5.0, 2.5), 75);
        assert_eq!(spawn_interval(1.0, 100.0, 2.5), 1);
    }

    #[test]
    fn token_float_is_bounded() {
        for f in 0..200 {
            assert!(token_float(f, 1.3).abs() <= FLOAT_AMPLITUDE);
        }
    }
}
