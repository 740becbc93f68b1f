use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

use super::entity::{BurstCause, BurstOutcome};

/// Running counters of reproduction and death in the tank.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReproductionStats {
    /// Protozoa that split.
    pub splits: u64,
    /// Splits whose parent carried a mate's genome.
    pub crossover_splits: u64,
    /// Protozoa born from splits.
    pub births: u64,
    /// Offspring whose genome could not be expressed.
    pub miscarriages: u64,
    /// Protozoa that died and decomposed.
    pub decompositions: u64,
    /// Plants that divided.
    pub plant_splits: u64,
    /// Genomes captured from mates.
    pub matings: u64,
    /// Births dropped because the tank was full.
    pub dropped_births: u64,
    /// Children per recent split
    pub litter_sizes: VecDeque<usize>,
    /// Maximum number of recent splits to track
    pub max_history: usize,
}

impl Default for ReproductionStats {
    fn default() -> Self {
        Self {
            splits: 0,
            crossover_splits: 0,
            births: 0,
            miscarriages: 0,
            decompositions: 0,
            plant_splits: 0,
            matings: 0,
            dropped_births: 0,
            litter_sizes: VecDeque::new(),
            max_history: 100,
        }
    }
}

impl ReproductionStats {
    /// Record a burst and update the counters
    pub fn record_burst(&mut self, outcome: &BurstOutcome, crossed: bool) {
        self.miscarriages += outcome.miscarriages as u64;
        match outcome.cause {
            BurstCause::Split => {
                self.splits += 1;
                if crossed {
                    self.crossover_splits += 1;
                }
                self.births += outcome.children.len() as u64;
                self.litter_sizes.push_back(outcome.children.len());
                if self.litter_sizes.len() > self.max_history {
                    self.litter_sizes.pop_front();
                }
            }
            BurstCause::Decomposition => self.decompositions += 1,
            BurstCause::PlantSplit => self.plant_splits += 1,
            BurstCause::Expired => {}
        }
    }

    /// Record a captured mate genome
    pub fn record_mating(&mut self) {
        self.matings += 1;
    }

    /// Average number of children per split (last N splits)
    pub fn avg_litter_size(&self) -> f64 {
        if self.litter_sizes.is_empty() {
            0.0
        } else {
            self.litter_sizes.iter().sum::<usize>() as f64 / self.litter_sizes.len() as f64
        }
    }

    /// Fraction of splits that used a mate's genome
    pub fn crossover_ratio(&self) -> f64 {
        if self.splits == 0 {
            0.0
        } else {
            self.crossover_splits as f64 / self.splits as f64
        }
    }
}
