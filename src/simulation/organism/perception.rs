//! Perception system that combines the senses into brain inputs.

use ndarray::Array1;

use super::super::entity::Body;
use super::super::params::Params;
use super::Protozoa;
use super::contact::Touch;
use super::proprioception::Proprioception;
use super::retina::Sight;
use super::sense::Sense;

/// Ordered set of senses whose outputs are concatenated into brain inputs.
///
/// The default order matches the sensor neuron layout of every network:
/// proprioception, touch, then sight.
pub struct Perception {
    senses: Vec<Box<dyn Sense>>,
}

impl Perception {
    /// Creates a perception system querying `senses` in order.
    pub fn new(senses: Vec<Box<dyn Sense>>) -> Self {
        Self { senses }
    }

    /// Process all senses and return combined brain inputs.
    ///
    /// # Arguments
    ///
    /// * `protozoa` - The organism doing the sensing
    /// * `body` - Its physical state
    /// * `params` - Simulation parameters
    ///
    /// # Returns
    ///
    /// All sensory activations concatenated in order.
    pub fn perceive(&self, protozoa: &Protozoa, body: &Body, params: &Params) -> Array1<f32> {
        let mut combined = Array1::zeros(self.total_input_size(protozoa, params));
        let mut offset = 0;
        for sense in &self.senses {
            let size = sense.input_size(protozoa, params);
            for (i, &value) in sense.sense(protozoa, body, params).iter().take(size).enumerate() {
                combined[offset + i] = value;
            }
            offset += size;
        }
        combined
    }

    /// Returns the total number of brain inputs produced by all senses.
    pub fn total_input_size(&self, protozoa: &Protozoa, params: &Params) -> usize {
        self.senses.iter().map(|s| s.input_size(protozoa, params)).sum()
    }

    /// Returns the senses in query order.
    pub fn senses(&self) -> &[Box<dyn Sense>] {
        &self.senses
    }
}

impl Default for Perception {
    fn default() -> Self {
        Self::new(vec![
            Box::new(Proprioception),
            Box::new(Touch),
            Box::new(Sight),
        ])
    }
}
