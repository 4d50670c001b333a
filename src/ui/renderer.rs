/// Presentation layer: double-buffered, diff-based terminal renderer.
///
/// How it works:
///   1. Draw the scene onto the logical `Canvas` (800×400 units)
///   2. Pack canvas pixels into the `front` buffer, two rows per cell
///      with '▀' (fg = upper pixel, bg = lower pixel)
///   3. Lay text (HUD, particles, overlays) over those cells
///   4. Compare each cell with `back` (previous frame) and emit terminal
///      commands only for cells that changed, batched with `queue!`
///   5. Swap front/back
///
/// The renderer reads `WorldState`; it never writes to it.

use std::io::{self, BufWriter, Write};

use crossterm::{
    cursor::{self, MoveTo},
    event::{DisableMouseCapture, EnableMouseCapture},
    execute, queue,
    style::{Color, Print, ResetColor, SetBackgroundColor, SetForegroundColor},
    terminal::{self, Clear, ClearType},
};

use crate::assets::Sprite;
use crate::domain::entity::{Rgb, GOLD};
use crate::sim::world::{Phase, WorldState};
use super::canvas::Canvas;
use super::draw;

// ── Cell: the unit of the back-buffer ──

#[derive(Clone, Copy, PartialEq, Eq)]
struct Cell {
    ch: char,
    fg: Color,
    bg: Color,
}

impl Cell {
    /// Explicit dark background for cells outside the canvas. Matching
    /// the Clear color avoids seams between rows on VTE terminals.
    const BASE_BG: Color = Color::Rgb { r: 40, g: 8, b: 8 };

    const BLANK: Cell = Cell { ch: ' ', fg: Color::White, bg: Cell::BASE_BG };

    /// Sentinel used to invalidate the back buffer; never equals a real cell.
    const INVALID: Cell = Cell { ch: '?', fg: Color::Magenta, bg: Color::Magenta };

    fn new(ch: char, fg: Color, bg: Color) -> Self {
        Cell { ch, fg, bg }
    }

    /// Two stacked pixels in one cell.
    fn half_block(top: Rgb, bottom: Rgb) -> Self {
        Cell { ch: '▀', fg: rgb(top), bg: rgb(bottom) }
    }
}

#[inline]
fn rgb(c: Rgb) -> Color {
    Color::Rgb { r: c.0, g: c.1, b: c.2 }
}

// ── FrameBuffer: a 2D grid of Cells ──

struct FrameBuffer {
    width: usize,
    height: usize,
    cells: Vec<Cell>,
}

impl FrameBuffer {
    fn new(w: usize, h: usize) -> Self {
        FrameBuffer {
            width: w,
            height: h,
            cells: vec![Cell::BLANK; w * h],
        }
    }

    fn resize(&mut self, w: usize, h: usize) {
        if self.width != w || self.height != h {
            self.width = w;
            self.height = h;
            self.cells = vec![Cell::BLANK; w * h];
        }
    }

    fn clear(&mut self) {
        self.cells.fill(Cell::BLANK);
    }

    fn set(&mut self, x: usize, y: usize, cell: Cell) {
        if x < self.width && y < self.height {
            self.cells[y * self.width + x] = cell;
        }
    }

    fn get(&self, x: usize, y: usize) -> Cell {
        if x < self.width && y < self.height {
            self.cells[y * self.width + x]
        } else {
            Cell::BLANK
        }
    }

    /// Write a string at (x, y). Each char occupies 1 column.
    fn put_str(&mut self, x: usize, y: usize, s: &str, fg: Color, bg: Color) {
        for (i, ch) in s.chars().enumerate() {
            if x + i >= self.width { break; }
            self.set(x + i, y, Cell::new(ch, fg, bg));
        }
    }

    fn fill_row(&mut self, y: usize, bg: Color) {
        for x in 0..self.width {
            self.set(x, y, Cell::new(' ', Color::White, bg));
        }
    }
}

// ── Renderer ──

/// Vertical layout
const HUD_ROW: usize = 0;
const MAP_ROW: usize = 2;
/// HUD + gap above the canvas, gap + help bar below it.
const RESERVED_ROWS: usize = MAP_ROW + 2;

const HUD_BG: Color = Color::Rgb { r: 90, g: 14, b: 12 };
const PANEL_BG: Color = Color::Rgb { r: 120, g: 20, b: 18 };
const PANEL_FG: Color = Color::Rgb { r: 254, g: 243, b: 199 };
const ACCENT: Color = Color::Rgb { r: 252, g: 211, b: 77 };
const DIM: Color = Color::Rgb { r: 190, g: 140, b: 120 };

pub struct Renderer {
    writer: BufWriter<io::Stdout>,
    front: FrameBuffer,
    back: FrameBuffer,
    canvas: Canvas,
    term_w: usize,
    term_h: usize,
    /// Column where the canvas starts (canvas is centered).
    canvas_col: usize,
    last_phase: Option<Phase>,
    /// Counts rendered frames; drives blinking prompts.
    anim_tick: u32,
}

impl Renderer {
    pub fn new() -> Self {
        Renderer {
            writer: BufWriter::with_capacity(32768, io::stdout()),
            front: FrameBuffer::new(0, 0),
            back: FrameBuffer::new(0, 0),
            canvas: Canvas::new(),
            term_w: 0,
            term_h: 0,
            canvas_col: 0,
            last_phase: None,
            anim_tick: 0,
        }
    }

    pub fn init(&mut self) -> io::Result<()> {
        terminal::enable_raw_mode()?;
        execute!(
            self.writer,
            terminal::EnterAlternateScreen,
            EnableMouseCapture,
            cursor::Hide,
            SetBackgroundColor(Cell::BASE_BG),
            Clear(ClearType::All)
        )?;

        let (tw, th) = terminal::size().unwrap_or((80, 24));
        self.set_size(tw as usize, th as usize);
        log::debug!("terminal {tw}x{th}, canvas {}x{} px", self.canvas.width(), self.canvas.height());
        Ok(())
    }

    pub fn cleanup(&mut self) -> io::Result<()> {
        execute!(
            self.writer,
            DisableMouseCapture,
            ResetColor,
            cursor::Show,
            terminal::LeaveAlternateScreen
        )?;
        terminal::disable_raw_mode()
    }

    pub fn render(&mut self, world: &WorldState, sprite: Option<&Sprite>) -> io::Result<()> {
        let (tw, th) = terminal::size().unwrap_or((80, 24));
        if tw as usize != self.term_w || th as usize != self.term_h {
            self.set_size(tw as usize, th as usize);
            queue!(self.writer, SetBackgroundColor(Cell::BASE_BG), Clear(ClearType::All))?;
        }

        // Phase change → clean repaint
        if self.last_phase != Some(world.phase) {
            self.back.cells.fill(Cell::INVALID);
            self.last_phase = Some(world.phase);
        }

        self.compose(world, sprite);
        self.flush_diff()?;
        std::mem::swap(&mut self.front, &mut self.back);
        self.anim_tick = self.anim_tick.wrapping_add(1);
        Ok(())
    }

    /// Resize buffers and refit the canvas. Forces a full repaint.
    fn set_size(&mut self, w: usize, h: usize) {
        self.term_w = w;
        self.term_h = h;
        self.front.resize(w, h);
        self.back.resize(w, h);
        self.back.cells.fill(Cell::INVALID);

        let rows = h.saturating_sub(RESERVED_ROWS).max(1);
        self.canvas.fit(w, rows * 2);
        self.canvas_col = w.saturating_sub(self.canvas.width()) / 2;
    }

    // ── Diff flush: only write changed cells ──

    fn flush_diff(&mut self) -> io::Result<()> {
        let mut last_fg = Color::White;
        let mut last_bg = Cell::BASE_BG;
        let mut need_move = true;
        let mut last_x: usize = 0;
        let mut last_y: usize = 0;

        // Explicit base colors; ResetColor would fall back to the
        // terminal default and leave seams.
        queue!(self.writer,
            SetForegroundColor(Color::White),
            SetBackgroundColor(Cell::BASE_BG),
        )?;

        for y in 0..self.front.height {
            for x in 0..self.front.width {
                let cell = self.front.get(x, y);
                if cell == self.back.get(x, y) {
                    need_move = true;
                    continue;
                }

                if need_move || x != last_x + 1 || y != last_y {
                    queue!(self.writer, MoveTo(x as u16, y as u16))?;
                    need_move = false;
                }
                if cell.fg != last_fg {
                    queue!(self.writer, SetForegroundColor(cell.fg))?;
                    last_fg = cell.fg;
                }
                if cell.bg != last_bg {
                    queue!(self.writer, SetBackgroundColor(cell.bg))?;
                    last_bg = cell.bg;
                }
                queue!(self.writer, Print(cell.ch))?;
                last_x = x;
                last_y = y;
            }
        }

        self.writer.flush()
    }

    // ── Compose: build front buffer content ──

    fn compose(&mut self, w: &WorldState, sprite: Option<&Sprite>) {
        self.front.clear();

        self.draw_scene(w, sprite);
        self.compose_canvas();
        self.compose_hud(w);

        match w.phase {
            Phase::Loading => self.compose_loading(),
            Phase::LoadFailed => self.compose_load_failed(),
            Phase::Start => self.compose_start(),
            Phase::Playing => {}
            Phase::GameOver => self.compose_game_over(w),
        }

        self.compose_help(w.phase);
    }

    /// Back-to-front onto the canvas. Entities only exist once a run has begun.
    fn draw_scene(&mut self, w: &WorldState, sprite: Option<&Sprite>) {
        let c = &mut self.canvas;
        let physics = &w.tuning.physics;

        draw::draw_background(c);
        draw::draw_clouds(c, w.frame);
        draw::draw_ground(c, physics.ground_height, w.frame, w.speed);

        if matches!(w.phase, Phase::Loading | Phase::LoadFailed) {
            return;
        }
        for t in &w.tokens {
            draw::draw_token(c, t);
        }
        for o in &w.obstacles {
            draw::draw_obstacle(c, o);
        }
        draw::draw_runner(c, &w.runner, sprite);
        for p in &w.particles {
            draw::draw_particle(c, p);
        }
    }

    /// Canvas pixels → half-block cells, then text labels on top.
    fn compose_canvas(&mut self) {
        let (cw, ch) = (self.canvas.width(), self.canvas.height());
        for cy in 0..ch.div_ceil(2) {
            let row = MAP_ROW + cy;
            if row >= self.front.height { break; }
            for cx in 0..cw {
                let top = self.canvas.pixel(cx, cy * 2);
                let cell = if cy * 2 + 1 < ch {
                    Cell::half_block(top, self.canvas.pixel(cx, cy * 2 + 1))
                } else {
                    Cell { ch: '▀', fg: rgb(top), bg: Cell::BASE_BG }
                };
                self.front.set(self.canvas_col + cx, row, cell);
            }
        }

        for label in self.canvas.labels() {
            let row = MAP_ROW + label.py / 2;
            for (i, chr) in label.text.chars().enumerate() {
                let px = label.px + i;
                if px >= cw { break; }
                let bg = rgb(self.canvas.pixel(px, label.py));
                self.front.set(self.canvas_col + px, row, Cell::new(chr, rgb(label.color), bg));
            }
        }
    }

    fn compose_hud(&mut self, w: &WorldState) {
        self.front.fill_row(HUD_ROW, HUD_BG);
        let score = format!(" ¥{} ", w.score);
        self.front.put_str(1, HUD_ROW, &score, rgb(draw::DARK_RED), Color::White);

        let status = match w.phase {
            Phase::Playing | Phase::GameOver => format!("speed {:.1}   run #{}", w.speed, w.runs),
            _ => String::new(),
        };
        let sx = self.term_w.saturating_sub(status.chars().count() + 2);
        self.front.put_str(sx, HUD_ROW, &status, DIM, HUD_BG);

        let title = "SPRING RUNNER";
        let tx = self.term_w.saturating_sub(title.len()) / 2;
        if tx > score.chars().count() + 2 && tx + title.len() + 2 < sx {
            self.front.put_str(tx, HUD_ROW, title, ACCENT, HUD_BG);
        }
    }

    fn compose_help(&mut self, phase: Phase) {
        let row = MAP_ROW + self.canvas.height().div_ceil(2) + 1;
        if row >= self.front.height { return; }
        let help = match phase {
            Phase::GameOver => " Enter/R/Click: Play Again   Esc/Q: Quit",
            Phase::LoadFailed => " Esc/Q: Quit",
            _ => " Space/↑/W/Click: Jump   Esc/Q: Quit",
        };
        self.front.put_str(self.canvas_col, row, help, DIM, Cell::BASE_BG);
    }

    // ── Overlays (centered on the canvas) ──

    /// Draw a filled panel with one line per entry, centered on the canvas.
    fn compose_panel(&mut self, lines: &[(&str, Color)]) {
        let inner = lines.iter().map(|(s, _)| s.chars().count()).max().unwrap_or(0);
        let box_w = inner + 6;
        let box_h = lines.len() + 2;
        let canvas_rows = self.canvas.height().div_ceil(2);
        let x0 = self.canvas_col + self.canvas.width().saturating_sub(box_w) / 2;
        let y0 = MAP_ROW + canvas_rows.saturating_sub(box_h) / 2;

        for y in y0..y0 + box_h {
            for x in x0..x0 + box_w {
                self.front.set(x, y, Cell::new(' ', PANEL_FG, PANEL_BG));
            }
        }
        for (i, (text, fg)) in lines.iter().enumerate() {
            let lx = x0 + (box_w - text.chars().count()) / 2;
            self.front.put_str(lx, y0 + 1 + i, text, *fg, PANEL_BG);
        }
    }

    fn compose_loading(&mut self) {
        let dots = ".".repeat((self.anim_tick as usize / 10) % 4);
        let text = format!("Loading Assets{dots:<3}");
        self.compose_panel(&[(text.as_str(), ACCENT)]);
    }

    fn compose_load_failed(&mut self) {
        self.compose_panel(&[
            ("The horse sprite could not be loaded.", ACCENT),
            ("", PANEL_FG),
            ("Details are in the log file.", PANEL_FG),
            ("Press Esc to quit", DIM),
        ]);
    }

    fn compose_start(&mut self) {
        let blink = (self.anim_tick / 20) % 2 == 0;
        let prompt = if blink { "▸ Press Space or Click to Jump ◂" } else { "  Press Space or Click to Jump  " };
        self.compose_panel(&[
            ("Ready?", ACCENT),
            ("", PANEL_FG),
            ("Jump the mountains, catch the yuanbao", PANEL_FG),
            (prompt, PANEL_FG),
        ]);
    }

    fn compose_game_over(&mut self, w: &WorldState) {
        let total = format!("¥{}", w.score);
        self.compose_panel(&[
            ("New Year Fortune", ACCENT),
            ("", PANEL_FG),
            ("You collected", PANEL_FG),
            (total.as_str(), rgb(GOLD)),
            ("", PANEL_FG),
            ("[ Enter ] Play Again", PANEL_FG),
        ]);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Tuning;

    fn renderer(w: usize, h: usize) -> Renderer {
        let mut r = Renderer::new();
        r.set_size(w, h);
        r
    }

    fn world(phase: Phase) -> WorldState {
        let mut w = WorldState::new(Tuning::default(), Some(3));
        match phase {
            Phase::Loading => {}
            Phase::LoadFailed => w.assets_failed(),
            Phase::Start => w.assets_ready(),
            Phase::Playing => {
                w.assets_ready();
                w.begin_run();
            }
            Phase::GameOver => {
                w.assets_ready();
                w.begin_run();
                w.score = 40;
                w.end_run();
            }
        }
        w
    }

    fn screen_text(r: &Renderer) -> String {
        let mut out = String::new();
        for y in 0..r.front.height {
            for x in 0..r.front.width {
                out.push(r.front.get(x, y).ch);
            }
            out.push('\n');
        }
        out
    }

    #[test]
    fn layout_fits_canvas_between_hud_and_help() {
        let r = renderer(80, 24);
        // 20 rows free → 40 px tall → scale 0.1 → 80 px wide
        assert_eq!((r.canvas.width(), r.canvas.height()), (80, 40));
        assert_eq!(r.canvas_col, 0);

        let r = renderer(120, 24);
        assert_eq!(r.canvas.width(), 80);
        assert_eq!(r.canvas_col, 20);
    }

    #[test]
    fn canvas_is_packed_into_half_blocks() {
        let mut r = renderer(80, 24);
        r.compose(&world(Phase::Start), None);
        let top = r.front.get(0, MAP_ROW);
        assert_eq!(top.ch, '▀');
        assert_eq!(top.fg, rgb(draw::BG_SKY));
        // bottom canvas row is ground
        let bottom = r.front.get(0, MAP_ROW + 19);
        assert_ne!(bottom.bg, rgb(draw::BG_SKY));
    }

    #[test]
    fn each_phase_has_its_screen() {
        let mut r = renderer(80, 24);
        r.compose(&world(Phase::Loading), None);
        assert!(screen_text(&r).contains("Loading Assets"));

        r.compose(&world(Phase::LoadFailed), None);
        assert!(screen_text(&r).contains("could not be loaded"));

        r.compose(&world(Phase::Start), None);
        let s = screen_text(&r);
        assert!(s.contains("Ready?"));
        assert!(s.contains("Press Space or Click to Jump"));

        r.compose(&world(Phase::Playing), None);
        let s = screen_text(&r);
        assert!(!s.contains("Ready?"));
        assert!(s.contains("¥0"));

        r.compose(&world(Phase::GameOver), None);
        let s = screen_text(&r);
        assert!(s.contains("New Year Fortune"));
        assert!(s.contains("¥40"));
        assert!(s.contains("Play Again"));
    }

    #[test]
    fn particles_show_as_text() {
        let mut r = renderer(80, 24);
        let mut w = world(Phase::Playing);
        w.particles.push(crate::domain::entity::Particle::score_popup(300.0, 150.0, 10, 30));
        r.compose(&w, None);
        assert!(screen_text(&r).contains("+10¥"));
    }

    #[test]
    fn tiny_terminal_does_not_panic() {
        let mut r = renderer(3, 2);
        r.compose(&world(Phase::GameOver), None);
        let mut r = renderer(0, 0);
        r.compose(&world(Phase::Start), None);
    }
}
