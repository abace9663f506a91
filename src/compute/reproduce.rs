//! Crossover and mutation.
//!
//! Offspring take each gene from either parent with equal probability, then
//! every chosen gene is perturbed. Coordinates are re-clipped to the canvas,
//! put back in min/max order and shrunk to the size cap. Shades wrap modulo
//! 256 rather than clamping.

use rand::prelude::*;

use super::entity::{Bounds, Canvas, Entity, EntityId, RectGene};

/// Seedable master generator.
///
/// Concurrent tasks never share it: the owner draws one seed per task and
/// each task builds its own generator from that seed.
pub struct GenomeRng {
    rng: StdRng,
}

impl GenomeRng {
    /// Create from seed.
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Create with random seed.
    pub fn random() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }

    /// Generate next u64 for seeding child RNGs.
    pub fn next_seed(&mut self) -> u64 {
        self.rng.r#gen()
    }

    /// Direct access for sequential work.
    pub fn rng_mut(&mut self) -> &mut StdRng {
        &mut self.rng
    }
}

/// Shade value range used to scale shade mutations.
const SHADE_RANGE: f64 = 256.0;

/// Produces offspring from two parents.
#[derive(Debug, Clone, Copy)]
pub struct Reproducer {
    canvas: Canvas,
    rect_max_size: u32,
    mutation_factor: f64,
}

impl Reproducer {
    pub fn new(canvas: Canvas, rect_max_size: u32, mutation_factor: f64) -> Self {
        Self {
            canvas,
            rect_max_size,
            mutation_factor,
        }
    }

    /// Uniform crossover followed by unconditional mutation of every gene
    /// and of the background.
    pub fn reproduce<R: Rng + ?Sized>(
        &self,
        id: EntityId,
        parent_a: &Entity,
        parent_b: &Entity,
        rng: &mut R,
    ) -> Result<Entity, ReproduceError> {
        let (a_genes, b_genes) = (parent_a.genes(), parent_b.genes());
        if a_genes.len() != b_genes.len() {
            return Err(ReproduceError::GeneCountMismatch {
                a: a_genes.len(),
                b: b_genes.len(),
            });
        }

        let genes: Vec<RectGene> = a_genes
            .iter()
            .zip(b_genes)
            .map(|(a, b)| {
                let chosen = if rng.gen_bool(0.5) { *a } else { *b };
                self.mutate_gene(chosen, rng)
            })
            .collect();

        let background = if rng.gen_bool(0.5) {
            parent_a.background()
        } else {
            parent_b.background()
        };
        let background = self.mutate_shade(background, rng);

        Ok(Entity::from_genes(id, self.canvas, background, genes)?)
    }

    /// Perturb shade and all four coordinates, then restore the gene invariants.
    fn mutate_gene<R: Rng + ?Sized>(&self, gene: RectGene, rng: &mut R) -> RectGene {
        let shade = self.mutate_shade(gene.shade, rng);

        let width = self.canvas.width as f64;
        let height = self.canvas.height as f64;
        let b = gene.bounds;
        let min_x = (b.min_x as i64).saturating_add(self.delta(width, rng));
        let max_x = (b.max_x as i64).saturating_add(self.delta(width, rng));
        let min_y = (b.min_y as i64).saturating_add(self.delta(height, rng));
        let max_y = (b.max_y as i64).saturating_add(self.delta(height, rng));

        RectGene {
            shade,
            bounds: Bounds::from_corners(min_x, min_y, max_x, max_y, self.canvas)
                .enforce_max_size(self.rect_max_size),
        }
    }

    fn mutate_shade<R: Rng + ?Sized>(&self, shade: u8, rng: &mut R) -> u8 {
        let delta = self.delta(SHADE_RANGE, rng);
        (shade as i64).saturating_add(delta).rem_euclid(256) as u8
    }

    /// `2 * factor * (U - 0.5) * range`, truncated toward zero. Saturates
    /// at the `i64` limits for very large factors.
    fn delta<R: Rng + ?Sized>(&self, range: f64, rng: &mut R) -> i64 {
        let u: f64 = rng.r#gen();
        (2.0 * self.mutation_factor * (u - 0.5) * range) as i64
    }
}

/// Reproduction errors.
#[derive(Debug, thiserror::Error)]
pub enum ReproduceError {
    #[error("Parents have different gene counts ({a} vs {b})")]
    GeneCountMismatch { a: usize, b: usize },
    #[error("Offspring failed validation: {0}")]
    InvalidOffspring(#[from] super::entity::EntityError),
}
