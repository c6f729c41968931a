use std::path::Path;

use image::{Rgba, RgbaImage};
use tracing::debug;

use crate::config::ArtParams;
use crate::error::{GitArtError, Result};

// --- activation rule ---

/// Decides whether a pixel paints a cell: pure black and sufficiently opaque.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActivationRule {
    pub alpha_threshold: u8,
}

impl ActivationRule {
    pub fn new(alpha_threshold: u8) -> Self {
        Self { alpha_threshold }
    }

    pub fn is_active(&self, pixel: Rgba<u8>) -> bool {
        let [r, g, b, a] = pixel.0;
        r == 0 && g == 0 && b == 0 && a > self.alpha_threshold
    }
}

impl Default for ActivationRule {
    fn default() -> Self {
        Self::new(ArtParams::default().alpha_threshold)
    }
}

// --- grid ---

/// Active/inactive cells of the source image, indexed `[row][col]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PixelGrid {
    rows: Vec<Vec<bool>>,
    width: u32,
}

impl PixelGrid {
    /// Build a grid from row vectors. All rows must share one length.
    pub fn from_rows(rows: Vec<Vec<bool>>, params: &ArtParams) -> Result<Self> {
        let height = rows.len() as u32;
        let width = rows.first().map_or(0, |r| r.len() as u32);
        if rows.iter().any(|r| r.len() as u32 != width) {
            return Err(GitArtError::Dimension {
                width: rows.iter().map(|r| r.len() as u32).max().unwrap_or(0),
                height,
                max_width: params.max_width,
                max_height: params.max_height,
            });
        }
        check_dimensions(width, height, params)?;
        Ok(Self { rows, width })
    }

    /// Decode an image file and threshold every pixel.
    pub fn from_path(path: &Path, params: &ArtParams) -> Result<Self> {
        let img = image::open(path)
            .map_err(|e| GitArtError::ImageLoad {
                path: path.to_path_buf(),
                message: e.to_string(),
            })?
            .to_rgba8();
        debug!(path = %path.display(), "decoded image");
        Self::from_rgba(&img, params)
    }

    /// Same as [`PixelGrid::from_path`] but for already-encoded bytes (png/bmp/etc).
    pub fn from_encoded_bytes(bytes: &[u8], params: &ArtParams) -> Result<Self> {
        let img = image::load_from_memory(bytes)
            .map_err(|e| GitArtError::ImageLoad {
                path: "<memory>".into(),
                message: e.to_string(),
            })?
            .to_rgba8();
        Self::from_rgba(&img, params)
    }

    pub fn from_rgba(img: &RgbaImage, params: &ArtParams) -> Result<Self> {
        let (w, h) = img.dimensions();
        check_dimensions(w, h, params)?;

        let rule = ActivationRule::new(params.alpha_threshold);
        let rows: Vec<Vec<bool>> = (0..h)
            .map(|y| (0..w).map(|x| rule.is_active(*img.get_pixel(x, y))).collect())
            .collect();

        let grid = Self { rows, width: w };
        debug!(
            width = w,
            height = h,
            active = grid.active_count(),
            "extracted pixel grid"
        );
        Ok(grid)
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.rows.len() as u32
    }

    pub fn is_active(&self, row: u32, col: u32) -> bool {
        self.rows
            .get(row as usize)
            .and_then(|r| r.get(col as usize))
            .copied()
            .unwrap_or(false)
    }

    /// Active `(row, col)` pairs, column by column, top to bottom.
    pub fn active_cells(&self) -> impl Iterator<Item = (u32, u32)> + '_ {
        (0..self.width).flat_map(move |col| {
            (0..self.height())
                .filter(move |&row| self.is_active(row, col))
                .map(move |row| (row, col))
        })
    }

    pub fn active_count(&self) -> usize {
        self.rows.iter().flatten().filter(|&&cell| cell).count()
    }
}

fn check_dimensions(width: u32, height: u32, params: &ArtParams) -> Result<()> {
    if width > params.max_width || height > params.max_height {
        return Err(GitArtError::Dimension {
            width,
            height,
            max_width: params.max_width,
            max_height: params.max_height,
        });
    }
    Ok(())
}
