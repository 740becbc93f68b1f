//! Spikes: weapons that grow out of a protozoan's membrane.

use serde::{Deserialize, Serialize};

use super::super::genome::SpikeGene;

/// A spike at a fixed angle that grows towards its target length.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Spike {
    angle: f32,
    target_length: f32,
    growth_rate: f32,
    current_length: f32,
}

impl Spike {
    /// Expresses a spike gene; the spike starts with zero length.
    pub fn from_gene(gene: &SpikeGene) -> Self {
        Self::new(
            gene.angle.expressed(),
            gene.length.expressed(),
            gene.growth_rate.expressed(),
        )
    }

    /// Creates a spike with zero length.
    pub fn new(angle: f32, target_length: f32, growth_rate: f32) -> Self {
        Self {
            angle,
            target_length,
            growth_rate,
            current_length: 0.0,
        }
    }

    /// Grows the spike, never past its target length.
    pub fn update(&mut self, dt: f32) {
        if self.current_length < self.target_length {
            self.current_length = (self.current_length + self.growth_rate * dt).min(self.target_length);
        }
    }

    /// Angle relative to the facing direction.
    pub fn angle(&self) -> f32 {
        self.angle
    }

    /// Length the spike grows towards.
    pub fn target_length(&self) -> f32 {
        self.target_length
    }

    /// Length grown per second.
    pub fn growth_rate(&self) -> f32 {
        self.growth_rate
    }

    /// Length grown so far.
    pub fn current_length(&self) -> f32 {
        self.current_length
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spike_growth_clamps_at_target() {
        let mut spike = Spike::new(0.0, 1.0, 0.4);
        spike.update(1.0);
        assert!((spike.current_length() - 0.4).abs() < 1e-6);
        spike.update(10.0);
        assert_eq!(spike.current_length(), 1.0);
        spike.update(1.0);
        assert_eq!(spike.current_length(), 1.0);
    }
}
