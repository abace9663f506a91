//! Grayscale raster storage and image file I/O.

use std::path::{Path, PathBuf};

use image::GrayImage;

/// Row-major 8-bit grayscale grid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GrayRaster {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
}

impl GrayRaster {
    /// Create a raster filled with a single shade.
    pub fn filled(width: u32, height: u32, shade: u8) -> Self {
        Self {
            width,
            height,
            pixels: vec![shade; width as usize * height as usize],
        }
    }

    /// Wrap existing row-major pixel data.
    pub fn from_pixels(width: u32, height: u32, pixels: Vec<u8>) -> Result<Self, RasterError> {
        let expected = width as usize * height as usize;
        if pixels.len() != expected {
            return Err(RasterError::SizeMismatch {
                expected,
                actual: pixels.len(),
            });
        }
        Ok(Self {
            width,
            height,
            pixels,
        })
    }

    /// Decode an image file in any supported format and convert it to grayscale.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, RasterError> {
        let path = path.as_ref();
        let decoded = image::open(path).map_err(|source| RasterError::Load {
            path: path.to_path_buf(),
            source,
        })?;

        let luma = decoded.to_luma8();
        let (width, height) = luma.dimensions();
        if width == 0 || height == 0 {
            return Err(RasterError::Empty(path.to_path_buf()));
        }

        Self::from_pixels(width, height, luma.into_raw())
    }

    /// Encode as an image file; the format follows the path's extension.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), image::ImageError> {
        // from_raw only fails on a length mismatch, which the constructors rule out
        let buffer = GrayImage::from_raw(self.width, self.height, self.pixels.clone())
            .ok_or_else(|| {
                image::ImageError::Parameter(image::error::ParameterError::from_kind(
                    image::error::ParameterErrorKind::DimensionMismatch,
                ))
            })?;
        buffer.save(path)
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    /// Shade at (x, y).
    #[inline]
    pub fn get(&self, x: u32, y: u32) -> u8 {
        self.pixels[y as usize * self.width as usize + x as usize]
    }

    /// Paint the half-open region `[min_x, max_x) x [min_y, max_y)`.
    pub fn fill_rect(&mut self, min_x: u32, min_y: u32, max_x: u32, max_y: u32, shade: u8) {
        let width = self.width as usize;
        for y in min_y as usize..max_y as usize {
            let row = y * width;
            self.pixels[row + min_x as usize..row + max_x as usize].fill(shade);
        }
    }
}

/// Raster construction and decoding errors.
#[derive(Debug, thiserror::Error)]
pub enum RasterError {
    #[error("Failed to load image {path}: {source}")]
    Load {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
    #[error("Image {0} has no pixels")]
    Empty(PathBuf),
    #[error("Pixel buffer holds {actual} values, expected {expected}")]
    SizeMismatch { expected: usize, actual: usize },
}
