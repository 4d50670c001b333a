/// Logical drawing surface.
///
/// The game draws on a fixed 800×400 canvas in world units. `Canvas`
/// rasterises that onto a pixel grid sized to the terminal: the renderer
/// packs two pixel rows into one cell with an upper-half block, so a
/// terminal of C columns × R rows offers C × 2R roughly square pixels.
///
/// The scale is uniform (aspect ratio is kept) and chosen by `fit`.
/// Text is not rasterised; it is collected as `Label`s and printed over
/// the pixels by the renderer.

use crate::config::{CANVAS_HEIGHT, CANVAS_WIDTH};
use crate::domain::entity::Rgb;
use crate::domain::geometry::Rect;
use crate::assets::Sprite;

#[derive(Clone, Debug, PartialEq)]
pub struct Label {
    /// Pixel coordinates of the first character.
    pub px: usize,
    pub py: usize,
    pub text: String,
    pub color: Rgb,
}

pub struct Canvas {
    width: usize,
    height: usize,
    scale: f32,
    pixels: Vec<Rgb>,
    labels: Vec<Label>,
}

impl Canvas {
    pub fn new() -> Self {
        Canvas {
            width: 0,
            height: 0,
            scale: 0.0,
            pixels: vec![],
            labels: vec![],
        }
    }

    /// Pick the largest uniform scale that fits `max_w × max_h` pixels.
    pub fn fit(&mut self, max_w: usize, max_h: usize) {
        let scale = (max_w as f32 / CANVAS_WIDTH).min(max_h as f32 / CANVAS_HEIGHT);
        let w = (CANVAS_WIDTH * scale).floor() as usize;
        let h = (CANVAS_HEIGHT * scale).floor() as usize;
        self.scale = scale;
        if w != self.width || h != self.height {
            self.width = w;
            self.height = h;
            self.pixels = vec![Rgb(0, 0, 0); w * h];
        }
    }

    pub fn width(&self) -> usize { self.width }
    pub fn height(&self) -> usize { self.height }

    #[inline]
    pub fn pixel(&self, x: usize, y: usize) -> Rgb {
        if x < self.width && y < self.height {
            self.pixels[y * self.width + x]
        } else {
            Rgb(0, 0, 0)
        }
    }

    pub fn labels(&self) -> &[Label] {
        &self.labels
    }

    pub fn clear(&mut self, color: Rgb) {
        self.pixels.fill(color);
        self.labels.clear();
    }

    // ── Primitives (all coordinates in canvas units) ──

    pub fn fill_rect(&mut self, r: Rect, color: Rgb) {
        let Some((x0, y0, x1, y1)) = self.pixel_span(r) else { return };
        for y in y0..y1 {
            let row = y * self.width;
            self.pixels[row + x0..row + x1].fill(color);
        }
    }

    /// Solid triangle; a pixel is inside if its center is.
    pub fn fill_triangle(&mut self, a: (f32, f32), b: (f32, f32), c: (f32, f32), color: Rgb) {
        let s = self.scale;
        let (a, b, c) = ((a.0 * s, a.1 * s), (b.0 * s, b.1 * s), (c.0 * s, c.1 * s));
        let area = edge(a, b, c);
        if area == 0.0 {
            return;
        }

        let min_x = a.0.min(b.0).min(c.0).floor().max(0.0) as usize;
        let min_y = a.1.min(b.1).min(c.1).floor().max(0.0) as usize;
        let max_x = (a.0.max(b.0).max(c.0).ceil().max(0.0) as usize).min(self.width);
        let max_y = (a.1.max(b.1).max(c.1).ceil().max(0.0) as usize).min(self.height);

        for y in min_y..max_y {
            for x in min_x..max_x {
                let p = (x as f32 + 0.5, y as f32 + 0.5);
                let w0 = edge(b, c, p) / area;
                let w1 = edge(c, a, p) / area;
                let w2 = edge(a, b, p) / area;
                if w0 >= 0.0 && w1 >= 0.0 && w2 >= 0.0 {
                    self.pixels[y * self.width + x] = color;
                }
            }
        }
    }

    /// Solid ellipse inscribed in `r`.
    pub fn fill_ellipse(&mut self, r: Rect, color: Rgb) {
        let Some((x0, y0, x1, y1)) = self.pixel_span(r) else { return };
        let s = self.scale;
        let (cx, cy) = ((r.x + r.w / 2.0) * s, (r.y + r.h / 2.0) * s);
        let (rx, ry) = ((r.w * s / 2.0).max(0.5), (r.h * s / 2.0).max(0.5));

        for y in y0..y1 {
            for x in x0..x1 {
                let dx = (x as f32 + 0.5 - cx) / rx;
                let dy = (y as f32 + 0.5 - cy) / ry;
                if dx * dx + dy * dy <= 1.0 {
                    self.pixels[y * self.width + x] = color;
                }
            }
        }
    }

    /// Nearest-neighbour blit; transparent sprite pixels are skipped.
    pub fn blit_sprite(&mut self, sprite: &Sprite, dest: Rect) {
        let Some((x0, y0, x1, y1)) = self.pixel_span(dest) else { return };
        let s = self.scale;
        let (ox, oy) = (dest.x * s, dest.y * s);
        let (dw, dh) = (dest.w * s, dest.h * s);

        for y in y0..y1 {
            let v = ((y as f32 + 0.5 - oy) / dh * sprite.height as f32) as usize;
            for x in x0..x1 {
                let u = ((x as f32 + 0.5 - ox) / dw * sprite.width as f32) as usize;
                if let Some(c) = sprite.pixel(u, v) {
                    self.pixels[y * self.width + x] = c;
                }
            }
        }
    }

    /// Queue text anchored at a canvas position. Off-canvas text is dropped.
    pub fn text(&mut self, x: f32, y: f32, text: &str, color: Rgb) {
        let (px, py) = (x * self.scale, y * self.scale);
        if px < 0.0 || py < 0.0 {
            return;
        }
        let (px, py) = (px as usize, py as usize);
        if px >= self.width || py >= self.height {
            return;
        }
        self.labels.push(Label { px, py, text: text.to_string(), color });
    }

    // ── Internal ──

    /// Pixel bounds `[x0, x1) × [y0, y1)` covered by `r`, clipped.
    /// Anything with positive size covers at least one pixel.
    fn pixel_span(&self, r: Rect) -> Option<(usize, usize, usize, usize)> {
        if r.w <= 0.0 || r.h <= 0.0 || self.width == 0 || self.height == 0 {
            return None;
        }
        let s = self.scale;
        let x0 = (r.x * s).round();
        let y0 = (r.y * s).round();
        let x1 = ((r.x + r.w) * s).round().max(x0 + 1.0);
        let y1 = ((r.y + r.h) * s).round().max(y0 + 1.0);

        let clip = |v: f32, max: usize| v.max(0.0).min(max as f32) as usize;
        let (x0, x1) = (clip(x0, self.width), clip(x1, self.width));
        let (y0, y1) = (clip(y0, self.height), clip(y1, self.height));
        if x0 >= x1 || y0 >= y1 {
            return None;
        }
        Some((x0, y0, x1, y1))
    }
}

/// Twice the signed area of (a, b, p).
#[inline]
fn edge(a: (f32, f32), b: (f32, f32), p: (f32, f32)) -> f32 {
    (b.0 - a.0) * (p.1 - a.1) - (b.1 - a.1) * (p.0 - a.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    const RED: Rgb = Rgb(255, 0, 0);
    const BLACK: Rgb = Rgb(0, 0, 0);

    fn canvas(w: usize, h: usize) -> Canvas {
        let mut c = Canvas::new();
        c.fit(w, h);
        c.clear(BLACK);
        c
    }

    #[test]
    fn fit_keeps_aspect() {
        let c = canvas(80, 44);
        assert_eq!((c.width(), c.height()), (80, 40));
        let c = canvas(200, 50);
        assert_eq!((c.width(), c.height()), (100, 50));
    }

    #[test]
    fn rect_covers_scaled_area() {
        let mut c = canvas(80, 40); // scale 0.1
        c.fill_rect(Rect::new(100.0, 100.0, 50.0, 30.0), RED);
        assert_eq!(c.pixel(10, 10), RED);
        assert_eq!(c.pixel(14, 12), RED);
        assert_eq!(c.pixel(15, 10), BLACK);
        assert_eq!(c.pixel(10, 13), BLACK);
        assert_eq!(c.pixel(9, 10), BLACK);
    }

    #[test]
    fn tiny_rect_still_visible() {
        let mut c = canvas(80, 40);
        c.fill_rect(Rect::new(400.0, 200.0, 2.0, 2.0), RED);
        assert_eq!(c.pixel(40, 20), RED);
    }

    #[test]
    fn offscreen_rect_is_clipped() {
        let mut c = canvas(80, 40);
        c.fill_rect(Rect::new(-200.0, -200.0, 100.0, 100.0), RED);
        c.fill_rect(Rect::new(790.0, 390.0, 100.0, 100.0), RED);
        assert_eq!(c.pixel(0, 0), BLACK);
        assert_eq!(c.pixel(79, 39), RED);
    }

    #[test]
    fn triangle_fills_inside_only() {
        let mut c = canvas(80, 40);
        // apex up, base along y = 300
        c.fill_triangle((400.0, 100.0), (300.0, 300.0), (500.0, 300.0), RED);
        assert_eq!(c.pixel(40, 25), RED);
        assert_eq!(c.pixel(31, 11), BLACK);
        assert_eq!(c.pixel(49, 11), BLACK);
    }

    #[test]
    fn ellipse_corners_are_empty() {
        let mut c = canvas(80, 40);
        c.fill_ellipse(Rect::new(100.0, 100.0, 100.0, 100.0), RED);
        assert_eq!(c.pixel(15, 15), RED);
        assert_eq!(c.pixel(10, 10), BLACK);
    }

    #[test]
    fn sprite_blit_scales_and_skips_transparency() {
        let sprite = Sprite::builtin_horse().unwrap();
        let mut c = canvas(80, 40);
        c.blit_sprite(&sprite, Rect::new(0.0, 0.0, 200.0, 200.0)); // 20×20 px, 1:1
        for y in 0..20 {
            for x in 0..20 {
                let expected = sprite.pixel(x, y).unwrap_or(BLACK);
                assert_eq!(c.pixel(x, y), expected, "pixel {x},{y}");
            }
        }
    }

    #[test]
    fn text_is_queued_as_label() {
        let mut c = canvas(80, 40);
        c.text(100.0, 50.0, "+10¥", RED);
        c.text(-5.0, 50.0, "gone", RED);
        assert_eq!(c.labels(), &[Label { px: 10, py: 5, text: "+10¥".into(), color: RED }]);
        c.clear(BLACK);
        assert!(c.labels().is_empty());
    }
}
