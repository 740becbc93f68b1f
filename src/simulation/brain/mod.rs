//! Brains that turn sensor readings into motor commands.
//!
//! A brain is either backed by an evolved [`NeuralNetwork`] or scripted with
//! fixed commands. Both expose the same small contract: `tick`, `turn`,
//! `speed` and the mating decisions.

use ndarray::Array1;
use serde::{Deserialize, Serialize};

pub mod network;
pub mod neuron;

pub use network::NeuralNetwork;
pub use neuron::{Activation, Neuron, NeuronType};

use super::entity::BodyView;

/// Number of motor outputs every network must provide.
pub const OUTPUT_SIZE: usize = 3;
/// Output index of the turn command.
pub const TURN_OUTPUT: usize = 0;
/// Output index of the speed command.
pub const SPEED_OUTPUT: usize = 1;
/// Output index of the mating signal.
pub const MATE_OUTPUT: usize = 2;

/// Kind of brain driving an organism.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BrainType {
    /// Evolved neural network.
    Neural,
    /// Fixed commands.
    Scripted,
}

/// Network-backed brain.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NeuralBrain {
    /// Network evaluated every tick.
    pub network: NeuralNetwork,
    /// Largest turn command the brain can issue.
    pub max_turn: f32,
}

/// Decision maker of a protozoan.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Brain {
    /// Evaluates sensor inputs through a neural network.
    Neural(NeuralBrain),
    /// Issues the same commands every tick.
    Scripted {
        /// Turn command.
        turn: f32,
        /// Speed command.
        speed: f32,
        /// Whether the organism consents to mating.
        mate: bool,
    },
}

impl Brain {
    /// Creates a network-backed brain.
    pub fn neural(network: NeuralNetwork, max_turn: f32) -> Self {
        Brain::Neural(NeuralBrain { network, max_turn })
    }

    /// Creates a brain with fixed commands.
    pub fn scripted(turn: f32, speed: f32, mate: bool) -> Self {
        Brain::Scripted { turn, speed, mate }
    }

    /// Updates internal state from the organism's current sensor readings.
    pub fn tick(&mut self, inputs: &Array1<f32>) {
        match self {
            Brain::Neural(brain) => {
                brain.network.set_inputs(inputs);
                brain.network.settle();
            }
            Brain::Scripted { .. } => {}
        }
    }

    /// Turn command in radians-per-second units of `turn_rate`.
    pub fn turn(&self) -> f32 {
        match self {
            Brain::Neural(brain) => brain.output(TURN_OUTPUT) * brain.max_turn,
            Brain::Scripted { turn, .. } => *turn,
        }
    }

    /// Speed command; the organism uses its magnitude.
    pub fn speed(&self) -> f32 {
        match self {
            Brain::Neural(brain) => brain.output(SPEED_OUTPUT),
            Brain::Scripted { speed, .. } => *speed,
        }
    }

    /// Whether the brain currently signals willingness to mate.
    pub fn wants_to_mate(&self) -> bool {
        match self {
            Brain::Neural(brain) => brain.output(MATE_OUTPUT) > 0.0,
            Brain::Scripted { mate, .. } => *mate,
        }
    }

    /// Whether the brain wants to mate with `other`.
    pub fn want_to_mate_with(&self, other: &BodyView) -> bool {
        self.wants_to_mate() && !other.dead && other.organism.is_some()
    }

    /// The network, for network-backed brains.
    pub fn network(&self) -> Option<&NeuralNetwork> {
        match self {
            Brain::Neural(brain) => Some(&brain.network),
            Brain::Scripted { .. } => None,
        }
    }

    /// Returns the type of brain.
    pub fn brain_type(&self) -> BrainType {
        match self {
            Brain::Neural(_) => BrainType::Neural,
            Brain::Scripted { .. } => BrainType::Scripted,
        }
    }
}

impl NeuralBrain {
    fn output(&self, index: usize) -> f32 {
        self.network.output(index).unwrap_or(0.0)
    }
}
