//! Generation driver and snapshot output.

use std::convert::Infallible;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::schema::EvolutionConfig;

use super::entity::EntityId;
use super::population::{Population, PopulationError};
use super::raster::{GrayRaster, RasterError};

/// Summary of one generation, handed to progress callbacks.
#[derive(Debug, Clone)]
pub struct GenerationReport {
    /// Index of the population that was evaluated (0 = random start).
    pub generation: u64,
    pub best_id: EntityId,
    pub best_deviation: f64,
    pub mean_deviation: f64,
    /// Best entity differs from the previous generation's best.
    pub improved: bool,
    /// Snapshot written for this generation, if any.
    pub snapshot: Option<PathBuf>,
}

/// Writes numbered PNG renders into an existing directory.
#[derive(Debug, Clone)]
pub struct SnapshotWriter {
    dir: PathBuf,
}

impl SnapshotWriter {
    pub fn new<P: Into<PathBuf>>(dir: P) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// `<dir>/<generation, 9 digits>.png`
    pub fn path_for(&self, generation: u64) -> PathBuf {
        self.dir.join(format!("{generation:09}.png"))
    }

    /// Save `raster` for `generation`. The directory is never created here.
    pub fn write(&self, generation: u64, raster: &GrayRaster) -> Result<PathBuf, EvolveError> {
        let path = self.path_for(generation);
        if let Err(source) = raster.save(&path) {
            log::error!("Failed to write snapshot {}: {}", path.display(), source);
            return Err(EvolveError::Snapshot { path, source });
        }
        Ok(path)
    }
}

/// Drives a population generation after generation and snapshots every
/// new best entity.
pub struct EvolutionLoop {
    population: Population,
    snapshots: SnapshotWriter,
    generation: u64,
    best_id: Option<EntityId>,
}

impl EvolutionLoop {
    /// Set up a run against an already loaded target.
    pub fn new(config: &EvolutionConfig, target: GrayRaster) -> Result<Self, EvolveError> {
        let snapshots = SnapshotWriter::new(&config.output_dir);
        if !snapshots.dir().is_dir() {
            log::warn!(
                "Output directory {} does not exist; snapshot writes will fail",
                snapshots.dir().display()
            );
        }

        let population = Population::new(config, Arc::new(target))?;

        Ok(Self {
            population,
            snapshots,
            generation: 0,
            best_id: None,
        })
    }

    /// Load the target image from `path`, then set up the run.
    pub fn from_image<P: AsRef<Path>>(config: &EvolutionConfig, path: P) -> Result<Self, EvolveError> {
        let target = GrayRaster::load(path)?;
        log::info!("Loaded {}x{} target", target.width(), target.height());
        Self::new(config, target)
    }

    /// Number of generations evaluated so far.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn population(&self) -> &Population {
        &self.population
    }

    pub fn best_id(&self) -> Option<EntityId> {
        self.best_id
    }

    /// Evaluate and evolve one generation, snapshotting on improvement.
    pub fn advance(&mut self) -> Result<GenerationReport, EvolveError> {
        let generation = self.generation;
        let step = self.population.step()?;
        self.generation += 1;

        let best = step.best();
        let improved = self.best_id != Some(best.id);
        log::debug!(
            "Generation {}: best {} deviation {:.1}",
            generation,
            best.id,
            best.deviation
        );

        let snapshot = if improved {
            self.best_id = Some(best.id);
            log::info!(
                "New optimum {} at generation {} (deviation = {:.1})",
                best.id,
                generation,
                best.deviation
            );
            // after a step the leader slot holds the generation's best
            Some(self.snapshots.write(generation, &self.population.leader().render())?)
        } else {
            None
        };

        Ok(GenerationReport {
            generation,
            best_id: best.id,
            best_deviation: best.deviation,
            mean_deviation: step.mean_deviation(),
            improved,
            snapshot,
        })
    }

    /// Run until an error occurs. There is no stopping condition.
    pub fn run_with_callback<F>(&mut self, mut callback: F) -> Result<Infallible, EvolveError>
    where
        F: FnMut(&GenerationReport),
    {
        loop {
            let report = self.advance()?;
            callback(&report);
        }
    }
}

/// Errors that end a run.
#[derive(Debug, thiserror::Error)]
pub enum EvolveError {
    #[error(transparent)]
    Raster(#[from] RasterError),
    #[error(transparent)]
    Population(#[from] PopulationError),
    #[error("Failed to write snapshot {path}: {source}")]
    Snapshot {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
}
