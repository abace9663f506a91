//! Entity genome and rendering.
//!
//! An entity is a background shade overlaid with an ordered list of shaded
//! rectangles. Later genes paint over earlier ones. Entities never change
//! after construction; reproduction always builds a new one.

use rand::Rng;

use super::raster::GrayRaster;

/// Unique, monotonically increasing entity identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EntityId(pub u64);

impl std::fmt::Display for EntityId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Fixed canvas dimensions shared by the target and every entity of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Canvas {
    pub width: u32,
    pub height: u32,
}

impl Canvas {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Canvas matching a raster's dimensions.
    pub fn of(raster: &GrayRaster) -> Self {
        Self::new(raster.width(), raster.height())
    }

    /// Number of pixels.
    pub fn area(&self) -> usize {
        self.width as usize * self.height as usize
    }
}

/// Axis-aligned, half-open rectangle `[min_x, max_x) x [min_y, max_y)`.
///
/// Invariant: `0 <= min <= max <= dimension` on both axes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Bounds {
    pub min_x: u32,
    pub min_y: u32,
    pub max_x: u32,
    pub max_y: u32,
}

impl Bounds {
    /// Build bounds from two arbitrary corners: each coordinate is clipped
    /// to the canvas, then the pair is put in min/max order.
    pub fn from_corners(x1: i64, y1: i64, x2: i64, y2: i64, canvas: Canvas) -> Self {
        let x1 = x1.clamp(0, canvas.width as i64) as u32;
        let x2 = x2.clamp(0, canvas.width as i64) as u32;
        let y1 = y1.clamp(0, canvas.height as i64) as u32;
        let y2 = y2.clamp(0, canvas.height as i64) as u32;

        Self {
            min_x: x1.min(x2),
            min_y: y1.min(y2),
            max_x: x1.max(x2),
            max_y: y1.max(y2),
        }
    }

    /// Bounds covering the whole canvas.
    pub fn full(canvas: Canvas) -> Self {
        Self {
            min_x: 0,
            min_y: 0,
            max_x: canvas.width,
            max_y: canvas.height,
        }
    }

    pub fn width(&self) -> u32 {
        self.max_x - self.min_x
    }

    pub fn height(&self) -> u32 {
        self.max_y - self.min_y
    }

    /// Shrink symmetrically so neither extent exceeds `max_size`.
    ///
    /// Half the overage comes off the min side and the rest off the max
    /// side, so an odd overage still lands exactly on `max_size`.
    pub fn enforce_max_size(self, max_size: u32) -> Self {
        let (min_x, max_x) = shrink_axis(self.min_x, self.max_x, max_size);
        let (min_y, max_y) = shrink_axis(self.min_y, self.max_y, max_size);
        Self {
            min_x,
            min_y,
            max_x,
            max_y,
        }
    }

    /// Whether the invariant holds for `canvas`.
    pub fn fits(&self, canvas: Canvas) -> bool {
        self.min_x <= self.max_x
            && self.min_y <= self.max_y
            && self.max_x <= canvas.width
            && self.max_y <= canvas.height
    }
}

fn shrink_axis(min: u32, max: u32, max_size: u32) -> (u32, u32) {
    let extent = max - min;
    if extent <= max_size {
        return (min, max);
    }
    let overage = extent - max_size;
    let front = overage / 2;
    (min + front, max - (overage - front))
}

/// A single shaded rectangle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RectGene {
    pub shade: u8,
    pub bounds: Bounds,
}

impl RectGene {
    /// Random gene: uniform shade, two independent corners per axis.
    ///
    /// # Panics
    ///
    /// Panics if `canvas` has zero width or height.
    pub fn random<R: Rng + ?Sized>(rng: &mut R, canvas: Canvas, rect_max_size: u32) -> Self {
        let shade = rng.gen_range(0..=255u8);
        let x1 = rng.gen_range(0..canvas.width) as i64;
        let x2 = rng.gen_range(0..canvas.width) as i64;
        let y1 = rng.gen_range(0..canvas.height) as i64;
        let y2 = rng.gen_range(0..canvas.height) as i64;

        Self {
            shade,
            bounds: Bounds::from_corners(x1, y1, x2, y2, canvas).enforce_max_size(rect_max_size),
        }
    }
}

/// A candidate image: background shade plus rectangle genes.
#[derive(Debug, Clone, PartialEq)]
pub struct Entity {
    id: EntityId,
    canvas: Canvas,
    background: u8,
    genes: Vec<RectGene>,
}

impl Entity {
    /// Random entity for the initial generation.
    ///
    /// # Panics
    ///
    /// Panics if `gene_count > 0` and `canvas` has zero width or height.
    pub fn random<R: Rng + ?Sized>(
        id: EntityId,
        canvas: Canvas,
        gene_count: usize,
        rect_max_size: u32,
        rng: &mut R,
    ) -> Self {
        let genes = (0..gene_count)
            .map(|_| RectGene::random(rng, canvas, rect_max_size))
            .collect();
        let background = rng.gen_range(0..=255u8);

        Self {
            id,
            canvas,
            background,
            genes,
        }
    }

    /// Assemble an entity from explicit parts, checking every gene fits the canvas.
    pub fn from_genes(
        id: EntityId,
        canvas: Canvas,
        background: u8,
        genes: Vec<RectGene>,
    ) -> Result<Self, EntityError> {
        if let Some(index) = genes.iter().position(|g| !g.bounds.fits(canvas)) {
            return Err(EntityError::GeneOutOfBounds {
                index,
                bounds: genes[index].bounds,
            });
        }
        Ok(Self {
            id,
            canvas,
            background,
            genes,
        })
    }

    pub fn id(&self) -> EntityId {
        self.id
    }

    pub fn canvas(&self) -> Canvas {
        self.canvas
    }

    pub fn background(&self) -> u8 {
        self.background
    }

    pub fn genes(&self) -> &[RectGene] {
        &self.genes
    }

    /// Paint the background, then every gene in order.
    pub fn render(&self) -> GrayRaster {
        let mut raster = GrayRaster::filled(self.canvas.width, self.canvas.height, self.background);
        for gene in &self.genes {
            let b = gene.bounds;
            raster.fill_rect(b.min_x, b.min_y, b.max_x, b.max_y, gene.shade);
        }
        raster
    }

    /// Sum of squared per-pixel shade differences against `target`.
    ///
    /// `target` must have the entity's canvas dimensions.
    pub fn deviation(&self, target: &GrayRaster) -> f64 {
        debug_assert_eq!(Canvas::of(target), self.canvas);

        // integer accumulation keeps the sum exact and order-independent
        let actual = self.render();
        let total: u64 = actual
            .pixels()
            .iter()
            .zip(target.pixels())
            .map(|(&a, &t)| {
                let d = a as i64 - t as i64;
                (d * d) as u64
            })
            .sum();
        total as f64
    }
}

/// Entity construction errors.
#[derive(Debug, thiserror::Error)]
pub enum EntityError {
    #[error("Gene {index} has bounds {bounds:?} outside the canvas or out of order")]
    GeneOutOfBounds { index: usize, bounds: Bounds },
}
