/// Entry point and game loop.

mod assets;
mod config;
mod domain;
mod sim;
mod ui;

use std::fs::File;
use std::path::Path;
use std::time::{Duration, Instant};

use anyhow::Context;
use crossterm::event::KeyCode;

use assets::{AssetLoader, AssetSource, LoadStatus, Sprite};
use config::GameConfig;
use sim::event::GameEvent;
use sim::step;
use sim::world::WorldState;
use ui::gamepad::GamepadState;
use ui::input::InputState;
use ui::renderer::Renderer;
use ui::sound::SoundEngine;

const FRAME_SLEEP: Duration = Duration::from_millis(5);
const MAX_CATCH_UP: u32 = 4;

fn main() {
    let config = GameConfig::load();

    // Raw mode owns the terminal, so logs go to a file.
    if let Err(e) = init_logging(&config.log_file) {
        eprintln!("Logging disabled: {e:#}");
    }
    for w in &config.warnings {
        log::warn!("config: {w}");
    }
    log::info!(
        "starting: tick {}ms, base speed {}, seed {:?}",
        config.tick_rate_ms, config.tuning.speed.base_speed, config.seed,
    );

    let mut world = WorldState::new(config.tuning.clone(), config.seed);

    let source = AssetSource::from_config(config.sprite.as_deref());
    log::info!("loading sprite from {source}");
    let loader = AssetLoader::spawn(source);

    let mut renderer = Renderer::new();
    if let Err(e) = renderer.init() {
        log::error!("terminal init failed: {e}");
        eprintln!("Terminal init failed: {e}");
        return;
    }

    let sound = SoundEngine::new();

    let result = game_loop(&mut world, &mut renderer, sound.as_ref(), loader, &config);

    if let Err(e) = renderer.cleanup() {
        eprintln!("Terminal cleanup failed: {e}");
    }

    if let Err(e) = result {
        log::error!("game loop failed: {e:#}");
        eprintln!("Game error: {e:#}");
    }

    log::info!("exiting after {} run(s), last score {}", world.runs, world.score);
    println!();
    println!("Thanks for playing Spring Runner!");
    println!("Last score: ¥{}", world.score);
}

fn init_logging(path: &Path) -> anyhow::Result<()> {
    let file = File::create(path)
        .with_context(|| format!("cannot open log file {}", path.display()))?;
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_secs()
        .target(env_logger::Target::Pipe(Box::new(file)))
        .try_init()?;
    Ok(())
}

fn game_loop(
    world: &mut WorldState,
    renderer: &mut Renderer,
    sound: Option<&SoundEngine>,
    loader: AssetLoader,
    config: &GameConfig,
) -> anyhow::Result<()> {
    let mut kb = InputState::new();
    let mut gp = GamepadState::new();
    gp.load_button_config(&config.gamepad);
    if gp.connected {
        log::info!("gamepad detected");
    }

    let tick_rate = Duration::from_millis(config.tick_rate_ms);
    let mut last_tick = Instant::now();
    let mut loader = Some(loader);
    let mut sprite: Option<Sprite> = None;
    let mut dirty = true;

    loop {
        kb.drain_events();
        gp.update();

        if kb.ctrl_c_pressed() || kb.any_pressed(KEYS_QUIT) || gp.cancel_pressed() {
            log::info!("quit requested");
            break;
        }

        if let Some(l) = &loader {
            match l.poll() {
                LoadStatus::Pending => {}
                status => {
                    sprite = world.apply_load(status, config.strict_assets);
                    loader = None;
                }
            }
            dirty = true;
        }

        // Input acts immediately; the simulation picks it up next tick.
        let mut events = Vec::new();
        if jump_requested(&kb, &gp) {
            events.extend(step::jump(world));
        }
        if restart_requested(&kb, &gp) {
            events.extend(step::restart(world));
        }

        if tick_due(&mut last_tick, Instant::now(), tick_rate) {
            events.extend(step::step(world));
            dirty = true;
        }

        if !events.is_empty() || kb.resized() {
            dirty = true;
        }
        process_events(world, sound, &events);

        if dirty {
            renderer.render(world, sprite.as_ref()).context("render failed")?;
            dirty = false;
        }
        let until_tick = (last_tick + tick_rate).saturating_duration_since(Instant::now());
        std::thread::sleep(FRAME_SLEEP.min(until_tick));
    }

    Ok(())
}

/// True when a tick is due at `now`. Advances `last_tick` by whole ticks
/// so the rate does not drift with loop latency; a backlog longer than
/// `MAX_CATCH_UP` ticks is dropped instead of replayed.
fn tick_due(last_tick: &mut Instant, now: Instant, rate: Duration) -> bool {
    if now.saturating_duration_since(*last_tick) < rate {
        return false;
    }
    *last_tick += rate;
    if now.saturating_duration_since(*last_tick) > rate * MAX_CATCH_UP {
        *last_tick = now;
    }
    true
}

fn process_events(world: &WorldState, sound: Option<&SoundEngine>, events: &[GameEvent]) {
    for ev in events {
        match ev {
            GameEvent::RunStarted => log::info!("run #{} started", world.runs),
            GameEvent::Crashed { obstacle_id, score } => {
                log::info!("run #{} over: hit mountain {obstacle_id}, collected ¥{score}", world.runs)
            }
            GameEvent::SpeedUp { speed } => log::debug!("speed up to {speed:.1}"),
            GameEvent::TokenCollected { id, value, score } => log::debug!("yuanbao {id} +{value}, score {score}"),
            GameEvent::Jumped | GameEvent::Landed => {}
        }

        let Some(sfx) = sound else { continue };
        match ev {
            GameEvent::RunStarted => sfx.play_start(),
            GameEvent::Jumped => sfx.play_jump(),
            GameEvent::TokenCollected { .. } => sfx.play_coin(),
            GameEvent::SpeedUp { .. } => sfx.play_speed_up(),
            GameEvent::Crashed { .. } => sfx.play_crash(),
            GameEvent::Landed => {}
        }
    }
}

// ── Key bindings ──

const KEYS_JUMP: &[KeyCode] = &[KeyCode::Char(' '), KeyCode::Up, KeyCode::Char('w'), KeyCode::Char('W')];
const KEYS_RESTART: &[KeyCode] = &[KeyCode::Enter, KeyCode::Char('r'), KeyCode::Char('R')];
const KEYS_QUIT: &[KeyCode] = &[KeyCode::Esc, KeyCode::Char('q'), KeyCode::Char('Q')];

/// Keyboard, mouse and gamepad all feed the one jump action.
fn jump_requested(kb: &InputState, gp: &GamepadState) -> bool {
    kb.any_pressed(KEYS_JUMP) || kb.clicked() || gp.jump_pressed()
}

/// A click also restarts, since it is the only input on a touch screen.
fn restart_requested(kb: &InputState, gp: &GamepadState) -> bool {
    kb.any_pressed(KEYS_RESTART) || kb.clicked() || gp.confirm_pressed()
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ticks_keep_a_fixed_cadence() {
        let rate = Duration::from_millis(16);
        let start = Instant::now();
        let mut last = start;

        assert!(!tick_due(&mut last, start + Duration::from_millis(15), rate));
        // Noticed late: the overshoot carries into the next tick.
        assert!(tick_due(&mut last, start + Duration::from_millis(20), rate));
        assert_eq!(last, start + rate);
        assert!(tick_due(&mut last, start + Duration::from_millis(33), rate));
        assert_eq!(last, start + rate * 2);
    }

    #[test]
    fn long_stall_drops_the_backlog() {
        let rate = Duration::from_millis(16);
        let start = Instant::now();
        let mut last = start;
        let now = start + Duration::from_secs(1);

        assert!(tick_due(&mut last, now, rate));
        assert_eq!(last, now);
        assert!(!tick_due(&mut last, now, rate));
    }
}
