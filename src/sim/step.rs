/// The step function: advances the world by one frame.
///
/// Processing order:
///   1. Runner physics (gravity, ground clamp)
///   2. Speed curve
///   3. Scroll + cleanup (obstacles, tokens, particles)
///   4. Frame counters
///   5. Spawning (uses the pre-increment frame)
///   6. Obstacle collision → game over
///   7. Token pickup → score + particle
///
/// Collision runs against post-movement positions. Input handlers
/// (`jump`, `restart`) live here too: they are the only other writers.

use crate::domain::collision;
use crate::domain::entity::Particle;
use crate::domain::physics;
use super::event::GameEvent;
use super::spawn;
use super::world::{Phase, WorldState};

// ══════════════════════════════════════════════════════════════
// Main entry point
// ══════════════════════════════════════════════════════════════

pub fn step(world: &mut WorldState) -> Vec<GameEvent> {
    if world.phase != Phase::Playing || !world.running {
        return vec![];
    }

    let mut events: Vec<GameEvent> = Vec::new();
    let frame = world.frame;

    resolve_runner(world, &mut events);
    resolve_speed(world, frame, &mut events);
    resolve_scroll(world, frame);

    world.frame += 1;
    world.runner.frame_count += 1;

    let spawned = spawn::spawn_entities(world, frame);
    if spawned.obstacle || spawned.token {
        log::trace!("frame {frame}: spawned {spawned:?}");
    }

    if resolve_obstacle_hit(world, &mut events) {
        return events;
    }
    resolve_token_pickup(world, &mut events);

    events
}

// ══════════════════════════════════════════════════════════════
// Input handlers
// ══════════════════════════════════════════════════════════════

/// The single "jump" action from keyboard, mouse or gamepad.
///
/// Start: begins the run (no impulse on that press).
/// Playing: jumps if the runner is inside the ground band.
/// Anything else: no-op.
pub fn jump(world: &mut WorldState) -> Vec<GameEvent> {
    match world.phase {
        Phase::Start => {
            if world.begin_run() {
                vec![GameEvent::RunStarted]
            } else {
                vec![]
            }
        }
        Phase::Playing => {
            if physics::try_jump(&mut world.runner, &world.tuning.physics) {
                vec![GameEvent::Jumped]
            } else {
                vec![]
            }
        }
        Phase::Loading | Phase::LoadFailed | Phase::GameOver => vec![],
    }
}

/// Explicit restart from the game-over summary.
pub fn restart(world: &mut WorldState) -> Vec<GameEvent> {
    if world.phase == Phase::GameOver && world.begin_run() {
        vec![GameEvent::RunStarted]
    } else {
        vec![]
    }
}

// ══════════════════════════════════════════════════════════════
// Movement
// ══════════════════════════════════════════════════════════════

fn resolve_runner(world: &mut WorldState, events: &mut Vec<GameEvent>) {
    if physics::integrate(&mut world.runner, &world.tuning.physics) {
        events.push(GameEvent::Landed);
    }
}

fn resolve_speed(world: &mut WorldState, frame: u64, events: &mut Vec<GameEvent>) {
    let speed = physics::speed_at(frame, &world.tuning.speed);
    if speed > world.speed {
        events.push(GameEvent::SpeedUp { speed });
    }
    world.speed = speed;
}

/// Shift everything left, bob the tokens, age the particles, and drop
/// whatever crossed its despawn threshold (or was collected last frame).
fn resolve_scroll(world: &mut WorldState, frame: u64) {
    let dx = world.speed;

    for o in &mut world.obstacles {
        o.x -= dx;
    }
    world.obstacles.retain(|o| !o.is_offscreen());

    for t in &mut world.tokens {
        t.x -= dx;
        t.y += physics::token_float(frame, t.float_offset);
    }
    world.tokens.retain(|t| !t.is_offscreen() && !t.collected);

    world.particles.retain_mut(Particle::tick);
}

// ══════════════════════════════════════════════════════════════
// Collision
// ══════════════════════════════════════════════════════════════

/// Returns true if the run ended this frame.
fn resolve_obstacle_hit(world: &mut WorldState, events: &mut Vec<GameEvent>) -> bool {
    let Some(idx) = collision::first_obstacle_hit(&world.runner, &world.obstacles) else {
        return false;
    };
    let obstacle_id = world.obstacles[idx].id;
    world.end_run();
    events.push(GameEvent::Crashed { obstacle_id, score: world.score });
    true
}

fn resolve_token_pickup(world: &mut WorldState, events: &mut Vec<GameEvent>) {
    let value = world.tuning.score.token_value;
    let life = world.tuning.score.particle_life;

    for idx in collision::tokens_touched(&world.runner, &world.tokens) {
        let token = &mut world.tokens[idx];
        token.collected = true;
        world.score = world.score.saturating_add(value);
        world.particles.push(Particle::score_popup(token.x, token.y, value, life));
        events.push(GameEvent::TokenCollected { id: token.id, value, score: world.score });
    }
}
