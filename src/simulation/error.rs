//! Error types for genome expression and simulation setup.

use thiserror::Error;

/// Genome expression could not produce a viable organism.
///
/// Raised by [`crate::simulation::organism::Protozoa::from_genome`]; the spawn
/// path drops the offspring and carries on with the tick.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MiscarriageError {
    /// Two neuron genes share the same id.
    #[error("neuron id {0} appears more than once")]
    DuplicateNeuron(u32),
    /// A synapse refers to a neuron that does not exist.
    #[error("synapse {from} -> {to} references a missing neuron")]
    DanglingSynapse {
        /// Source neuron id.
        from: u32,
        /// Target neuron id.
        to: u32,
    },
    /// A synapse feeds into a sensor neuron.
    #[error("synapse {from} -> {to} targets a sensor neuron")]
    SynapseIntoSensor {
        /// Source neuron id.
        from: u32,
        /// Target neuron id.
        to: u32,
    },
    /// The network contains a cycle, which the feed-forward evaluator rejects.
    #[error("network contains a cycle")]
    CyclicNetwork,
    /// The number of sensor neurons does not match the organism's senses.
    #[error("network has {actual} sensor neurons but the phenotype provides {expected}")]
    SensorMismatch {
        /// Sensor count required by the phenotype.
        expected: usize,
        /// Sensor count present in the network gene.
        actual: usize,
    },
    /// The number of output neurons does not match the motor interface.
    #[error("network has {actual} output neurons but the brain needs {expected}")]
    OutputMismatch {
        /// Output count required by the brain.
        expected: usize,
        /// Output count present in the network gene.
        actual: usize,
    },
    /// Retina gene outside its declared range.
    #[error("retina with {0} cells cannot be expressed")]
    InvalidRetina(usize),
}

/// Errors raised while configuring, saving or loading a simulation.
#[derive(Debug, Error)]
pub enum SimulationError {
    /// Configuration values that cannot be used.
    #[error("invalid configuration: {0}")]
    InvalidConfig(&'static str),
    /// Reading or writing a file failed.
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
    /// Encoding or decoding simulation state failed.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
