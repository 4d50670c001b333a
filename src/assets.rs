/// Sprite asset loading.
///
/// Exactly one image is needed: the runner. It comes either from the
/// embedded pixel art (`AssetSource::Builtin`) or from a PNG on disk
/// (`AssetSource::File`, decoded with `image`).
///
/// Loading happens on a background thread. The loop polls
/// `AssetLoader::poll()` every frame while in `Phase::Loading` and moves
/// on once it reports `Ready` or `Failed`. There is no timeout, no retry
/// and no cancellation.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::thread;

use crate::domain::entity::Rgb;

/// Anything larger is thumbnailed on load; the terminal can't show more.
const MAX_SPRITE_DIM: u32 = 128;
/// Pixels with alpha below this are transparent.
const ALPHA_CUTOFF: u8 = 128;

// ── Sprite ──

#[derive(Clone, Debug, PartialEq)]
pub struct Sprite {
    pub width: usize,
    pub height: usize,
    pixels: Vec<Option<Rgb>>,
}

impl Sprite {
    /// Pixel at (x, y); `None` = transparent or out of range.
    #[inline]
    pub fn pixel(&self, x: usize, y: usize) -> Option<Rgb> {
        if x < self.width && y < self.height {
            self.pixels[y * self.width + x]
        } else {
            None
        }
    }

    /// Decode character-cell art. Every row must be the same width and
    /// every non-'.' character must appear in the palette.
    pub fn from_art(rows: &[&str], palette: &[(char, Rgb)]) -> Result<Self, AssetError> {
        let height = rows.len();
        let width = rows.first().map_or(0, |r| r.chars().count());
        if width == 0 || height == 0 {
            return Err(AssetError::Empty);
        }

        let mut pixels = Vec::with_capacity(width * height);
        for (y, row) in rows.iter().enumerate() {
            if row.chars().count() != width {
                return Err(AssetError::Malformed {
                    row: y,
                    reason: format!("expected {width} columns, found {}", row.chars().count()),
                });
            }
            for ch in row.chars() {
                if ch == '.' {
                    pixels.push(None);
                    continue;
                }
                match palette.iter().find(|(key, _)| *key == ch) {
                    Some(&(_, rgb)) => pixels.push(Some(rgb)),
                    None => {
                        return Err(AssetError::Malformed {
                            row: y,
                            reason: format!("unknown palette key {ch:?}"),
                        })
                    }
                }
            }
        }

        Ok(Sprite { width, height, pixels })
    }

    /// Decode an encoded image (PNG). Alpha below 50% becomes transparent.
    pub fn from_image_bytes(bytes: &[u8]) -> Result<Self, AssetError> {
        let mut img = image::load_from_memory(bytes).map_err(AssetError::Decode)?;
        if img.width() > MAX_SPRITE_DIM || img.height() > MAX_SPRITE_DIM {
            img = img.thumbnail(MAX_SPRITE_DIM, MAX_SPRITE_DIM);
        }

        let rgba = img.to_rgba8();
        let (width, height) = rgba.dimensions();
        if width == 0 || height == 0 {
            return Err(AssetError::Empty);
        }

        let pixels = rgba
            .pixels()
            .map(|p| {
                if p[3] < ALPHA_CUTOFF {
                    None
                } else {
                    Some(Rgb(p[0], p[1], p[2]))
                }
            })
            .collect();

        Ok(Sprite { width: width as usize, height: height as usize, pixels })
    }

    pub fn from_file(path: &Path) -> Result<Self, AssetError> {
        let bytes = std::fs::read(path).map_err(|source| AssetError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_image_bytes(&bytes)
    }

    /// The embedded tan toy horse.
    pub fn builtin_horse() -> Result<Self, AssetError> {
        Self::from_art(HORSE_ART, HORSE_PALETTE)
    }
}

// ── Embedded horse ──

const HORSE_PALETTE: &[(char, Rgb)] = &[
    ('W', Rgb(255, 255, 255)),  // mane, tail, soles
    ('T', Rgb(193, 154, 107)),  // body
    ('K', Rgb(31, 41, 55)),     // eye, bridle
];

const HORSE_ART: &[&str] = &[
    "..............W.....",
    ".............WT.....",
    "...........WWTTTT...",
    "..........WWTTTTTT..",
    "..........WTTTTKTTT.",
    "..........WTKTTTTTTT",
    ".........WWTTKTTTTTT",
    ".........WTTTKKKTTT.",
    ".........WTTTT..KT..",
    "........WWTTTT......",
    "....TTTTTTTTTT......",
    "WW.TTTTTTTTTTTT.....",
    "WWWTTTTTTTTTTTT.....",
    "WWWTTTTTTTTTTTT.....",
    ".WWTTTT....TTTTT....",
    "..TTTT......TTTT....",
    "..TTTT......TTTT....",
    "..TTTT......TTTT....",
    "..WWWW......WWWW....",
    "....................",
];

// ── Errors ──

#[derive(Debug)]
pub enum AssetError {
    Io { path: PathBuf, source: std::io::Error },
    Decode(image::ImageError),
    Empty,
    Malformed { row: usize, reason: String },
    /// The loader thread went away without reporting.
    Interrupted,
}

impl fmt::Display for AssetError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AssetError::Io { path, source } => write!(f, "could not read {}: {source}", path.display()),
            AssetError::Decode(e) => write!(f, "could not decode image: {e}"),
            AssetError::Empty => write!(f, "image has no pixels"),
            AssetError::Malformed { row, reason } => write!(f, "sprite art row {row}: {reason}"),
            AssetError::Interrupted => write!(f, "asset loader stopped before finishing"),
        }
    }
}

impl std::error::Error for AssetError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AssetError::Io { source, .. } => Some(source),
            AssetError::Decode(e) => Some(e),
            _ => None,
        }
    }
}

// ── Source + loader ──

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AssetSource {
    Builtin,
    File(PathBuf),
}

impl AssetSource {
    pub fn from_config(sprite: Option<&Path>) -> Self {
        match sprite {
            Some(p) => AssetSource::File(p.to_path_buf()),
            None => AssetSource::Builtin,
        }
    }
}

impl fmt::Display for AssetSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AssetSource::Builtin => write!(f, "built-in horse"),
            AssetSource::File(p) => write!(f, "{}", p.display()),
        }
    }
}

pub fn load_sprite(source: &AssetSource) -> Result<Sprite, AssetError> {
    match source {
        AssetSource::Builtin => Sprite::builtin_horse(),
        AssetSource::File(path) => Sprite::from_file(path),
    }
}

#[derive(Debug)]
pub enum LoadStatus {
    Pending,
    Ready(Sprite),
    Failed(AssetError),
}

pub struct AssetLoader {
    rx: Receiver<Result<Sprite, AssetError>>,
}

impl AssetLoader {
    /// Start loading `source` in the background.
    pub fn spawn(source: AssetSource) -> Self {
        let (tx, rx) = mpsc::channel();
        let thread_tx = tx.clone();
        let thread_source = source.clone();

        let spawned = thread::Builder::new()
            .name("asset-loader".into())
            .spawn(move || {
                let _ = thread_tx.send(load_sprite(&thread_source));
            });

        if let Err(e) = spawned {
            log::warn!("asset thread unavailable ({e}), loading inline");
            let _ = tx.send(load_sprite(&source));
        }

        AssetLoader { rx }
    }

    /// Non-blocking check. Reports `Ready`/`Failed` exactly once; the
    /// caller should drop the loader afterwards.
    pub fn poll(&self) -> LoadStatus {
        match self.rx.try_recv() {
            Ok(Ok(sprite)) => LoadStatus::Ready(sprite),
            Ok(Err(e)) => LoadStatus::Failed(e),
            Err(TryRecvError::Empty) => LoadStatus::Pending,
            Err(TryRecvError::Disconnected) => LoadStatus::Failed(AssetError::Interrupted),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;
    use std::time::{Duration, Instant};

    fn wait(loader: &AssetLoader) -> LoadStatus {
        let deadline = Instant::now() + Duration::from_secs(10);
        loop {
            match loader.poll() {
                LoadStatus::Pending if Instant::now() < deadline => {
                    thread::sleep(Duration::from_millis(5));
                }
                other => return other,
            }
        }
    }

    fn png_bytes(w: u32, h: u32) -> Vec<u8> {
        let mut img = image::RgbaImage::new(w, h);
        img.put_pixel(0, 0, image::Rgba([10, 20, 30, 255]));
        let mut out = Cursor::new(Vec::new());
        image::DynamicImage::ImageRgba8(img)
            .write_to(&mut out, image::ImageFormat::Png)
            .unwrap();
        out.into_inner()
    }

    #[test]
    fn builtin_horse_decodes() {
        let s = Sprite::builtin_horse().unwrap();
        assert_eq!((s.width, s.height), (20, 20));
        assert_eq!(s.pixel(0, 0), None);
        assert_eq!(s.pixel(14, 0), Some(Rgb(255, 255, 255)));
        assert_eq!(s.pixel(99, 0), None);
    }

    #[test]
    fn ragged_art_is_rejected() {
        let err = Sprite::from_art(&["WW", "W"], HORSE_PALETTE).unwrap_err();
        assert!(matches!(err, AssetError::Malformed { row: 1, .. }));
    }

    #[test]
    fn unknown_palette_key_is_rejected() {
        let err = Sprite::from_art(&["WZ"], HORSE_PALETTE).unwrap_err();
        assert!(matches!(err, AssetError::Malformed { row: 0, .. }));
    }

    #[test]
    fn empty_art_is_rejected() {
        assert!(matches!(Sprite::from_art(&[], HORSE_PALETTE), Err(AssetError::Empty)));
    }

    #[test]
    fn png_alpha_becomes_transparency() {
        let s = Sprite::from_image_bytes(&png_bytes(3, 2)).unwrap();
        assert_eq!((s.width, s.height), (3, 2));
        assert_eq!(s.pixel(0, 0), Some(Rgb(10, 20, 30)));
        assert_eq!(s.pixel(1, 0), None);
    }

    #[test]
    fn large_png_is_thumbnailed() {
        let s = Sprite::from_image_bytes(&png_bytes(512, 256)).unwrap();
        assert!(s.width <= MAX_SPRITE_DIM as usize);
        assert!(s.height <= MAX_SPRITE_DIM as usize);
    }

    #[test]
    fn garbage_bytes_fail_to_decode() {
        let err = Sprite::from_image_bytes(b"definitely not a png").unwrap_err();
        assert!(matches!(err, AssetError::Decode(_)));
    }

    #[test]
    fn missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = Sprite::from_file(&dir.path().join("nope.png")).unwrap_err();
        assert!(matches!(err, AssetError::Io { .. }));
        assert!(err.to_string().contains("nope.png"));
    }

    #[test]
    fn loader_delivers_builtin() {
        let loader = AssetLoader::spawn(AssetSource::Builtin);
        assert!(matches!(wait(&loader), LoadStatus::Ready(_)));
    }

    #[test]
    fn loader_reads_png_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("horse.png");
        std::fs::write(&path, png_bytes(4, 4)).unwrap();
        let loader = AssetLoader::spawn(AssetSource::File(path));
        match wait(&loader) {
            LoadStatus::Ready(s) => assert_eq!((s.width, s.height), (4, 4)),
            other => panic!("expected sprite, got {other:?}"),
        }
    }

    #[test]
    fn loader_reports_failure() {
        let loader = AssetLoader::spawn(AssetSource::File(PathBuf::from("/no/such/horse.png")));
        assert!(matches!(wait(&loader), LoadStatus::Failed(AssetError::Io { .. })));
    }

    #[test]
    fn source_from_config() {
        assert_eq!(AssetSource::from_config(None), AssetSource::Builtin);
        let p = PathBuf::from("a.png");
        assert_eq!(AssetSource::from_config(Some(&p)), AssetSource::File(p.clone()));
    }
}
