//! Sense trait for protozoa perception.
//!
//! Senses read the organism's own state (including what its retina and contact
//! sensors recorded this tick) and turn it into neural network inputs.

use ndarray::Array1;

use super::super::entity::Body;
use super::super::params::Params;
use super::Protozoa;

/// A sensory modality feeding the brain.
///
/// Each sense produces a fixed-length slice of activations that is
/// concatenated with the other senses by [`super::Perception`].
pub trait Sense: Send + Sync {
    /// Process sensory information and return neural network inputs.
    ///
    /// # Arguments
    ///
    /// * `protozoa` - The organism doing the sensing
    /// * `body` - Its physical state
    /// * `params` - Simulation parameters
    ///
    /// # Returns
    ///
    /// A 1D array of [`Sense::input_size`] activations.
    fn sense(&self, protozoa: &Protozoa, body: &Body, params: &Params) -> Array1<f32>;

    /// Returns the number of neural network inputs this sense produces.
    fn input_size(&self, protozoa: &Protozoa, params: &Params) -> usize;

    /// Returns a human-readable name for this sense.
    fn name(&self) -> &str;
}
