//! Proprioception sense: the organism's awareness of its own state.

use ndarray::{Array1, array};

use super::super::entity::Body;
use super::super::genome::BASE_SENSORS;
use super::super::params::Params;
use super::Protozoa;
use super::sense::Sense;

/// Outputs a constant bias, the current health and the fill level of the
/// energy store.
pub struct Proprioception;

impl Sense for Proprioception {
    fn sense(&self, protozoa: &Protozoa, body: &Body, params: &Params) -> Array1<f32> {
        let capacity = protozoa.energy_capacity(body, params);
        let energy_level = if capacity > 0.0 {
            (protozoa.energy() / capacity).clamp(0.0, 1.0)
        } else {
            0.0
        };
        array![1.0, body.health(), energy_level]
    }

    fn input_size(&self, _protozoa: &Protozoa, _params: &Params) -> usize {
        BASE_SENSORS
    }

    fn name(&self) -> &'static str {
        "Proprioception"
    }
}
