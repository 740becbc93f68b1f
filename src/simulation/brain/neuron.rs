//! Typed neurons with a two-phase tick/update protocol.

use std::cmp::Ordering;

use ndarray::Array1;
use serde::{Deserialize, Serialize};

/// Activation function applied to a neuron's weighted input sum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Activation {
    /// Logistic function, output in (0, 1).
    Sigmoid,
    /// Identity.
    Linear,
    /// Hyperbolic tangent, output in (-1, 1).
    Tanh,
}

impl Activation {
    /// Applies the activation to `z`.
    #[inline]
    pub fn apply(self, z: f32) -> f32 {
        match self {
            Activation::Sigmoid => 1.0 / (1.0 + (-z).exp()),
            Activation::Linear => z,
            Activation::Tanh => z.tanh(),
        }
    }
}

/// Role of a neuron in the network.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NeuronType {
    /// Holds a value written from outside the network.
    Sensor,
    /// Internal unit.
    Hidden,
    /// Read by the organism as a motor command.
    Output,
}

/// A single neuron.
///
/// Inputs refer to other neurons by their index in the owning network.
/// `tick` only writes `next_state`, so every neuron in a pass reads the states
/// committed by the previous `update`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Neuron {
    id: u32,
    kind: NeuronType,
    activation: Activation,
    inputs: Vec<(usize, f32)>,
    state: f32,
    next_state: f32,
}

impl Neuron {
    /// Creates a neuron with no inputs and zero state.
    pub fn new(id: u32, kind: NeuronType, activation: Activation) -> Self {
        Self {
            id,
            kind,
            activation,
            inputs: Vec::new(),
            state: 0.0,
            next_state: 0.0,
        }
    }

    /// Adds a weighted connection from the neuron at index `input`.
    pub fn add_input(&mut self, input: usize, weight: f32) {
        self.inputs.push((input, weight));
    }

    /// Computes the next state from the committed `states` of the network.
    ///
    /// Sensors have no inputs and carry their current state forward.
    pub fn tick(&mut self, states: &Array1<f32>) {
        if self.kind == NeuronType::Sensor {
            self.next_state = self.state;
            return;
        }
        let z: f32 = self
            .inputs
            .iter()
            .map(|&(input, weight)| states[input] * weight)
            .sum();
        self.next_state = self.activation.apply(z);
    }

    /// Commits the state computed by the last `tick`.
    pub fn update(&mut self) {
        self.state = self.next_state;
    }

    /// Neuron id, unique within its network.
    pub fn id(&self) -> u32 {
        self.id
    }

    /// Neuron type.
    pub fn kind(&self) -> NeuronType {
        self.kind
    }

    /// Activation function.
    pub fn activation(&self) -> Activation {
        self.activation
    }

    /// Committed state.
    pub fn state(&self) -> f32 {
        self.state
    }

    /// Overwrites the committed state (and the pending one).
    pub fn set_state(&mut self, state: f32) {
        self.state = state;
        self.next_state = state;
    }

    /// Weighted inputs as `(neuron index, weight)` pairs.
    pub fn inputs(&self) -> &[(usize, f32)] {
        &self.inputs
    }
}

impl PartialEq for Neuron {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Neuron {}

impl PartialOrd for Neuron {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Neuron {
    fn cmp(&self, other: &Self) -> Ordering {
        self.id.cmp(&other.id)
    }
}
