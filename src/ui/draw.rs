/// Scene drawing: one stateless routine per visual element.
///
/// Everything here draws in canvas units onto a `Canvas` and reads only
/// the values it is handed. Back-to-front order is the caller's job
/// (sky, clouds, ground, tokens, obstacles, runner, particles).

use crate::assets::Sprite;
use crate::config::{CANVAS_HEIGHT, CANVAS_WIDTH};
use crate::domain::entity::{Obstacle, Particle, Rgb, Runner, Token, GOLD};
use crate::domain::geometry::Rect;
use super::canvas::Canvas;

// ── Palette ──

pub const BG_SKY: Rgb = Rgb(143, 30, 26);
pub const PRIMARY_RED: Rgb = Rgb(220, 38, 38);
pub const DARK_RED: Rgb = Rgb(153, 27, 27);
pub const LIGHT_GOLD: Rgb = Rgb(252, 211, 77);
pub const STONE: Rgb = Rgb(231, 229, 228);
const STONE_SHADE: Rgb = Rgb(168, 162, 158);
const SNOW: Rgb = Rgb(255, 255, 255);
const CLOUD: Rgb = Rgb(176, 58, 46);
const HORSE_TAN: Rgb = Rgb(193, 154, 107);
const HORSE_DARK: Rgb = Rgb(31, 41, 55);

/// Stripe period of the ground pattern, in canvas units.
const GROUND_STRIPE: f32 = 40.0;

pub fn draw_background(canvas: &mut Canvas) {
    canvas.clear(BG_SKY);
}

/// Slow parallax clouds; each wraps around once it leaves the left edge.
pub fn draw_clouds(canvas: &mut Canvas, frame: u64) {
    const CLOUDS: [(f32, f32, f32); 4] = [
        // (start x, y, drift per frame)
        (120.0, 60.0, 0.20),
        (420.0, 35.0, 0.12),
        (650.0, 90.0, 0.25),
        (300.0, 130.0, 0.08),
    ];
    let span = CANVAS_WIDTH + 200.0;

    for (x0, y, drift) in CLOUDS {
        let x = (x0 - frame as f32 * drift).rem_euclid(span) - 100.0;
        canvas.fill_ellipse(Rect::new(x, y, 70.0, 22.0), CLOUD);
        canvas.fill_ellipse(Rect::new(x + 18.0, y - 12.0, 40.0, 24.0), CLOUD);
    }
}

/// Ground strip with a gold rim and stripes scrolling at the run speed.
pub fn draw_ground(canvas: &mut Canvas, ground_height: f32, frame: u64, speed: f32) {
    let top = CANVAS_HEIGHT - ground_height;
    canvas.fill_rect(Rect::new(0.0, top, CANVAS_WIDTH, ground_height), DARK_RED);
    canvas.fill_rect(Rect::new(0.0, top, CANVAS_WIDTH, 4.0), GOLD);

    let offset = (frame as f32 * speed).rem_euclid(GROUND_STRIPE);
    let mut x = -offset;
    while x < CANVAS_WIDTH {
        canvas.fill_rect(Rect::new(x, top + 14.0, GROUND_STRIPE / 2.0, 6.0), PRIMARY_RED);
        x += GROUND_STRIPE;
    }
}

/// The horse. Without a sprite a blocky stand-in is drawn in its place.
pub fn draw_runner(canvas: &mut Canvas, runner: &Runner, sprite: Option<&Sprite>) {
    match sprite {
        Some(s) => canvas.blit_sprite(s, runner.bounds()),
        None => draw_runner_placeholder(canvas, runner),
    }
}

fn draw_runner_placeholder(canvas: &mut Canvas, r: &Runner) {
    let (x, y, w, h) = (r.x, r.y, r.w, r.h);
    // body, neck, head
    canvas.fill_rect(Rect::new(x + w * 0.15, y + h * 0.40, w * 0.60, h * 0.30), HORSE_TAN);
    canvas.fill_rect(Rect::new(x + w * 0.62, y + h * 0.18, w * 0.16, h * 0.30), HORSE_TAN);
    canvas.fill_rect(Rect::new(x + w * 0.68, y + h * 0.14, w * 0.28, h * 0.14), HORSE_TAN);
    // mane and tail
    canvas.fill_rect(Rect::new(x + w * 0.58, y + h * 0.12, w * 0.06, h * 0.30), SNOW);
    canvas.fill_rect(Rect::new(x + w * 0.05, y + h * 0.42, w * 0.10, h * 0.22), SNOW);
    // eye
    canvas.fill_rect(Rect::new(x + w * 0.86, y + h * 0.17, w * 0.04, h * 0.04), HORSE_DARK);

    // legs swap every few frames while on the ground
    let stride = if r.airborne { 0.0 } else if (r.frame_count / 6) % 2 == 0 { 0.04 } else { -0.04 };
    for (lx, dx) in [(0.20, stride), (0.32, -stride), (0.56, stride), (0.66, -stride)] {
        canvas.fill_rect(Rect::new(x + w * (lx + dx), y + h * 0.70, w * 0.07, h * 0.26), HORSE_TAN);
        canvas.fill_rect(Rect::new(x + w * (lx + dx), y + h * 0.92, w * 0.07, h * 0.04), SNOW);
    }
}

/// Stone mountain with a snow cap. Drawn from `bounds`, not the hitbox.
pub fn draw_obstacle(canvas: &mut Canvas, obstacle: &Obstacle) {
    let b = obstacle.bounds();
    let apex = (b.x + b.w / 2.0, b.y);
    canvas.fill_triangle(apex, (b.x, b.bottom()), (b.right(), b.bottom()), STONE_SHADE);
    canvas.fill_triangle(apex, (b.x + b.w * 0.2, b.bottom()), (b.right(), b.bottom()), STONE);

    let cap = b.h * 0.3;
    let half = b.w / 2.0 * 0.3;
    canvas.fill_triangle(apex, (apex.0 - half, b.y + cap), (apex.0 + half, b.y + cap), SNOW);
}

/// Yuanbao ingot: a wide gold boat with a light-gold dome on top.
pub fn draw_token(canvas: &mut Canvas, token: &Token) {
    if token.collected {
        return;
    }
    let b = token.bounds();
    canvas.fill_ellipse(Rect::new(b.x, b.y + b.h * 0.35, b.w, b.h * 0.65), GOLD);
    canvas.fill_ellipse(Rect::new(b.x + b.w * 0.25, b.y, b.w * 0.5, b.h * 0.6), LIGHT_GOLD);
}

pub fn draw_particle(canvas: &mut Canvas, particle: &Particle) {
    canvas.text(particle.x, particle.y, &particle.text, particle.color);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PhysicsConfig;

    fn canvas() -> Canvas {
        let mut c = Canvas::new();
        c.fit(160, 80); // scale 0.2
        draw_background(&mut c);
        c
    }

    fn count(c: &Canvas, color: Rgb) -> usize {
        let mut n = 0;
        for y in 0..c.height() {
            for x in 0..c.width() {
                if c.pixel(x, y) == color {
                    n += 1;
                }
            }
        }
        n
    }

    #[test]
    fn ground_covers_bottom_strip() {
        let mut c = canvas();
        draw_ground(&mut c, 50.0, 0, 2.5);
        // 400 - 50 = 350 → pixel row 70
        assert_eq!(c.pixel(5, 69), BG_SKY);
        assert_eq!(c.pixel(5, 70), GOLD);
        assert_ne!(c.pixel(5, 79), BG_SKY);
    }

    #[test]
    fn ground_stripes_scroll() {
        let mut a = canvas();
        let mut b = canvas();
        draw_ground(&mut a, 50.0, 0, 2.5);
        draw_ground(&mut b, 50.0, 4, 2.5); // shifted 10 units = 2 px
        let row = 73; // inside the stripe band
        let a_row: Vec<_> = (0..a.width()).map(|x| a.pixel(x, row)).collect();
        let b_row: Vec<_> = (0..b.width()).map(|x| b.pixel(x, row)).collect();
        assert_ne!(a_row, b_row);
    }

    #[test]
    fn placeholder_runner_is_visible() {
        let mut c = canvas();
        let r = Runner::new(&PhysicsConfig::default());
        draw_runner(&mut c, &r, None);
        assert!(count(&c, HORSE_TAN) > 20);
    }

    #[test]
    fn sprite_runner_uses_sprite_colors() {
        let mut c = canvas();
        let r = Runner::new(&PhysicsConfig::default());
        let sprite = Sprite::builtin_horse().unwrap();
        draw_runner(&mut c, &r, Some(&sprite));
        assert!(count(&c, SNOW) > 0);
    }

    #[test]
    fn collected_token_is_not_drawn() {
        let mut c = canvas();
        let mut t = Token::spawn(0, 120.0, 0.0, &PhysicsConfig::default());
        t.x = 400.0;
        t.collected = true;
        draw_token(&mut c, &t);
        assert_eq!(count(&c, GOLD), 0);
        t.collected = false;
        draw_token(&mut c, &t);
        assert!(count(&c, GOLD) > 0);
    }

    #[test]
    fn mountain_has_snow_cap() {
        let mut c = canvas();
        let mut o = Obstacle::spawn(0, &PhysicsConfig::default());
        o.x = 400.0;
        draw_obstacle(&mut c, &o);
        assert!(count(&c, STONE) > 0);
        assert!(count(&c, SNOW) > 0);
    }

    #[test]
    fn particle_becomes_label() {
        let mut c = canvas();
        draw_particle(&mut c, &Particle::score_popup(100.0, 100.0, 10, 30));
        assert_eq!(c.labels().len(), 1);
        assert_eq!(c.labels()[0].text, "+10¥");
    }
}
