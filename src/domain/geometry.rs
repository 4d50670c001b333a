/// Axis-aligned rectangles in canvas units.
/// Collision, spawning and drawing all speak `Rect`.

#[derive(Clone, Copy, PartialEq, Debug, Default)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
}

impl Rect {
    pub const fn new(x: f32, y: f32, w: f32, h: f32) -> Self {
        Rect { x, y, w, h }
    }

    #[inline]
    pub fn right(&self) -> f32 {
        self.x + self.w
    }

    #[inline]
    pub fn bottom(&self) -> f32 {
        self.y + self.h
    }

    /// Strict overlap: rectangles that only share an edge do not touch.
    #[inline]
    pub fn overlaps(&self, other: &Rect) -> bool {
        self.x < other.right()
            && self.right() > other.x
            && self.y < other.bottom()
            && self.bottom() > other.y
    }

    /// Shrink by the given amount on each side. Width/height never go negative.
    pub fn inset(&self, left: f32, top: f32, right: f32, bottom: f32) -> Rect {
        Rect {
            x: self.x + left,
            y: self.y + top,
            w: (self.w - left - right).max(0.0),
            h: (self.h - top - bottom).max(0.0),
        }
    }

    /// Same inset on all four sides.
    pub fn inset_uniform(&self, pad: f32) -> Rect {
        self.inset(pad, pad, pad, pad)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overlapping_rects() {
        let a = Rect::new(0.0, 0.0, 10.0, 10.0);
        let b = Rect::new(5.0, 5.0, 10.0, 10.0);
        assert!(a.overlaps(&b));
        assert!(b.overlaps(&a));
    }

    #[test]
    fn touching_edges_do_not_overlap() {
        let a = Rect::new(0.0, 0.0, 10.0, 10.0);
        let right = Rect::new(10.0, 0.0, 5.0, 5.0);
        let below = Rect::new(0.0, 10.0, 5.0, 5.0);
        assert!(!a.overlaps(&right));
        assert!(!a.overlaps(&below));
    }

    #[test]
    fn inset_shrinks_and_clamps() {
        let r = Rect::new(10.0, 10.0, 90.0, 90.0).inset_uniform(20.0);
        assert_eq!(r, Rect::new(30.0, 30.0, 50.0, 50.0));

        let tiny = Rect::new(0.0, 0.0, 4.0, 4.0).inset_uniform(5.0);
        assert_eq!(tiny.w, 0.0);
        assert_eq!(tiny.h, 0.0);
    }
}
