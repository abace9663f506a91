//! Configuration types for evolution parameters.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Top-level evolution configuration.
///
/// Every field has a default, so an empty JSON object (`{}`) yields the
/// stock parameters: 600 genes, 30px rectangles, 200 entities, 20 elites
/// and a mutation factor of 0.05.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvolutionConfig {
    /// Rectangle genes per entity.
    #[serde(default = "default_gene_count")]
    pub gene_count: usize,
    /// Maximum extent of a rectangle on either axis, in pixels.
    #[serde(default = "default_rect_max_size")]
    pub rect_max_size: u32,
    /// Population size.
    #[serde(default = "default_entity_count")]
    pub entity_count: usize,
    /// Elites carried unchanged into the next generation.
    #[serde(default = "default_entity_keep")]
    pub entity_keep: usize,
    /// Mutation amplitude as a fraction of each value's range.
    #[serde(default = "default_mutation_factor")]
    pub mutation_factor: f64,
    /// Worker thread cap. `None` uses one thread per available core.
    #[serde(default)]
    pub worker_threads: Option<usize>,
    /// Random seed for reproducibility.
    #[serde(default)]
    pub random_seed: Option<u64>,
    /// Directory receiving numbered snapshots. Must already exist.
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
}

impl Default for EvolutionConfig {
    fn default() -> Self {
        Self {
            gene_count: default_gene_count(),
            rect_max_size: default_rect_max_size(),
            entity_count: default_entity_count(),
            entity_keep: default_entity_keep(),
            mutation_factor: default_mutation_factor(),
            worker_threads: None,
            random_seed: None,
            output_dir: default_output_dir(),
        }
    }
}

fn default_gene_count() -> usize {
    600
}
fn default_rect_max_size() -> u32 {
    30
}
fn default_entity_count() -> usize {
    200
}
fn default_entity_keep() -> usize {
    20
}
fn default_mutation_factor() -> f64 {
    0.05
}
fn default_output_dir() -> PathBuf {
    PathBuf::from("out")
}

impl EvolutionConfig {
    /// Validate configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.entity_count == 0 {
            return Err(ConfigError::EmptyPopulation);
        }
        if self.entity_keep == 0 {
            return Err(ConfigError::NoElites);
        }
        if self.entity_keep > self.entity_count {
            return Err(ConfigError::TooManyElites {
                keep: self.entity_keep,
                count: self.entity_count,
            });
        }
        if !self.mutation_factor.is_finite() || self.mutation_factor < 0.0 {
            return Err(ConfigError::InvalidMutationFactor(self.mutation_factor));
        }
        if self.worker_threads == Some(0) {
            return Err(ConfigError::InvalidWorkerThreads);
        }
        if self.output_dir.as_os_str().is_empty() {
            return Err(ConfigError::EmptyOutputDir);
        }
        Ok(())
    }
}

/// Configuration validation errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Population size must be non-zero")]
    EmptyPopulation,
    #[error("At least one elite must be kept")]
    NoElites,
    #[error("Elite count {keep} exceeds population size {count}")]
    TooManyElites { keep: usize, count: usize },
    #[error("Mutation factor must be finite and non-negative, got {0}")]
    InvalidMutationFactor(f64),
    #[error("Worker thread count must be non-zero")]
    InvalidWorkerThreads,
    #[error("Output directory must not be empty")]
    EmptyOutputDir,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_valid() {
        let config = EvolutionConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.gene_count, 600);
        assert_eq!(config.rect_max_size, 30);
        assert_eq!(config.entity_count, 200);
        assert_eq!(config.entity_keep, 20);
        assert_eq!(config.mutation_factor, 0.05);
    }

    #[test]
    fn test_empty_json_uses_defaults() {
        let config: EvolutionConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config.gene_count, 600);
        assert_eq!(config.entity_keep, 20);
        assert_eq!(config.output_dir, PathBuf::from("out"));
        assert!(config.random_seed.is_none());
    }

    #[test]
    fn test_serialization() {
        let config = EvolutionConfig {
            random_seed: Some(7),
            worker_threads: Some(2),
            ..Default::default()
        };
        let json = serde_json::to_string(&config).unwrap();
        let parsed: EvolutionConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.random_seed, Some(7));
        assert_eq!(parsed.worker_threads, Some(2));
        assert_eq!(parsed.entity_count, config.entity_count);
    }

    #[test]
    fn test_invalid_configs() {
        let too_many = EvolutionConfig {
            entity_count: 10,
            entity_keep: 11,
            ..Default::default()
        };
        assert!(matches!(
            too_many.validate(),
            Err(ConfigError::TooManyElites { keep: 11, count: 10 })
        ));

        let no_elites = EvolutionConfig {
            entity_keep: 0,
            ..Default::default()
        };
        assert!(matches!(no_elites.validate(), Err(ConfigError::NoElites)));

        let bad_factor = EvolutionConfig {
            mutation_factor: -0.1,
            ..Default::default()
        };
        assert!(matches!(
            bad_factor.validate(),
            Err(ConfigError::InvalidMutationFactor(_))
        ));

        let no_threads = EvolutionConfig {
            worker_threads: Some(0),
            ..Default::default()
        };
        assert!(matches!(
            no_threads.validate(),
            Err(ConfigError::InvalidWorkerThreads)
        ));
    }

    #[test]
    fn test_zero_mutation_factor_is_valid() {
        let config = EvolutionConfig {
            mutation_factor: 0.0,
            ..Default::default()
        };
        assert!(config.validate().is_ok());
    }
}
