//! Shade Evolve - Evolutionary grayscale image approximation.
//!
//! A population of entities, each a background shade overlaid with an
//! ordered list of shaded rectangles, is evolved to minimize the squared
//! pixel error against a target image. Every generation is scored in
//! parallel, the best entities are kept, and the rest of the population is
//! refilled by uniform crossover and mutation between them.
//!
//! # Architecture
//!
//! The crate is split into two main modules:
//!
//! - `schema`: Evolution parameters
//! - `compute`: Rasters, entities, fitness, reproduction and the evolution loop
//!
//! # Example
//!
//! ```rust,no_run
//! use shade_evolve::{
//!     compute::EvolutionLoop,
//!     schema::EvolutionConfig,
//! };
//!
//! let config = EvolutionConfig {
//!     random_seed: Some(42),
//!     ..Default::default()
//! };
//!
//! let mut evolution = EvolutionLoop::from_image(&config, "target.png")?;
//! for _ in 0..100 {
//!     let report = evolution.advance()?;
//!     println!("Generation {}: deviation = {:.1}", report.generation, report.best_deviation);
//! }
//! # Ok::<(), shade_evolve::compute::EvolveError>(())
//! ```

pub mod compute;
pub mod schema;

// Re-export commonly used types
pub use compute::{Entity, EvolutionLoop, EvolveError, GenerationReport, GrayRaster, Population};
pub use schema::EvolutionConfig;
