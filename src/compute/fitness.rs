//! Fitness evaluation against the target raster.

use std::sync::Arc;

use super::entity::{Canvas, Entity, EntityId};
use super::raster::GrayRaster;
use super::workers::WorkerPool;

/// Deviation score of one entity, tagged with its identity.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Evaluation {
    pub id: EntityId,
    /// Sum of squared shade differences. Lower is better, 0 is exact.
    pub deviation: f64,
}

/// Scores entities against a shared, read-only target.
#[derive(Debug, Clone)]
pub struct FitnessEvaluator {
    target: Arc<GrayRaster>,
}

impl FitnessEvaluator {
    pub fn new(target: Arc<GrayRaster>) -> Self {
        Self { target }
    }

    pub fn canvas(&self) -> Canvas {
        Canvas::of(&self.target)
    }

    /// Score a single entity.
    pub fn evaluate(&self, entity: &Entity) -> Evaluation {
        Evaluation {
            id: entity.id(),
            deviation: entity.deviation(&self.target),
        }
    }

    /// Score every entity concurrently, one task per entity.
    ///
    /// Results come back in the order of `entities`.
    pub fn evaluate_all(&self, pool: &WorkerPool, entities: &[Arc<Entity>]) -> Vec<Evaluation> {
        pool.scatter_gather(entities.iter().collect::<Vec<_>>(), |entity: &Arc<Entity>| {
            self.evaluate(entity)
        })
    }
}
