/// Spawn policy: two independent channels, obstacles and tokens.
///
/// A channel is *eligible* on frames that are an exact multiple of its
/// interval. The interval shrinks as the run speeds up:
///
///   interval = floor(base_interval / (speed / base_speed))
///
/// An eligible frame spawns only if that channel's random roll passes
/// (`obstacle_chance`, `token_chance`). Rolls are drawn only on eligible
/// frames, so a seeded run is reproducible frame for frame.
///
/// New entities are appended at the tail, entering at the right edge.

use std::f32::consts::TAU;

use rand::Rng;

use crate::domain::entity::{Obstacle, Token, TOKEN_TIERS};
use crate::domain::physics;
use super::world::WorldState;

/// What a spawn pass produced, for logging and tests.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Spawned {
    pub obstacle: bool,
    pub token: bool,
}

/// Run both spawn channels for `frame` at the world's current speed.
pub fn spawn_entities(world: &mut WorldState, frame: u64) -> Spawned {
    let base_speed = world.tuning.speed.base_speed;
    let spawn = &world.tuning.spawn;
    let mut out = Spawned::default();

    let obstacle_every = physics::spawn_interval(spawn.obstacle_interval, world.speed, base_speed);
    if frame % obstacle_every == 0 && world.rng.gen_bool(spawn.obstacle_chance) {
        world.obstacles.push(Obstacle::spawn(frame, &world.tuning.physics));
        out.obstacle = true;
    }

    let token_every = physics::spawn_interval(spawn.token_interval, world.speed, base_speed);
    if frame % token_every == 0 && world.rng.gen_bool(spawn.token_chance) {
        let tier = TOKEN_TIERS[world.rng.gen_range(0..TOKEN_TIERS.len())];
        let float_offset = world.rng.gen_range(0.0..TAU);
        world.tokens.push(Token::spawn(frame, tier, float_offset, &world.tuning.physics));
        out.token = true;
    }

    out
}
