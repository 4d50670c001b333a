/// Collision rules: pure queries with no side effects.
///
/// ## Hitboxes
/// ┌───────────┬──────────────────────────────┐
/// │ Entity     │ Box used                      │
/// ├───────────┼──────────────────────────────┤
/// │ Runner     │ bounds inset 20 on all sides  │
/// │ Obstacle   │ bounds inset 4 left/right/top │
/// │ Token      │ full bounds                   │
/// └───────────┴──────────────────────────────┘
///
/// Obstacles are scanned first, in spawn order; the first hit ends the
/// run and token pickup is skipped for that frame. Collected tokens are
/// never candidates again.

use super::entity::{Obstacle, Runner, Token};

/// First obstacle (in spawn order) whose hitbox overlaps the runner.
pub fn first_obstacle_hit(runner: &Runner, obstacles: &[Obstacle]) -> Option<usize> {
    let hb = runner.hitbox();
    obstacles.iter().position(|o| hb.overlaps(&o.hitbox()))
}

/// Indices of uncollected tokens touching the runner, in spawn order.
pub fn tokens_touched(runner: &Runner, tokens: &[Token]) -> Vec<usize> {
    let hb = runner.hitbox();
    tokens.iter()
        .enumerate()
        .filter(|(_, t)| !t.collected && hb.overlaps(&t.bounds()))
        .map(|(i, _)| i)
        .collect()
}
