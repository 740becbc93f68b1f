//! Neural network built from a network gene and evaluated synchronously.

use std::collections::{HashMap, VecDeque};

use ndarray::Array1;
use serde::{Deserialize, Serialize};

use super::neuron::{Neuron, NeuronType};
use crate::simulation::error::MiscarriageError;
use crate::simulation::genome::NetworkGene;

/// A feed-forward network of [`Neuron`]s.
///
/// Evaluation is two-phase: every neuron ticks against the committed states,
/// then all next states are committed together. The order in which neurons
/// tick within a pass therefore does not affect the result.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NeuralNetwork {
    neurons: Vec<Neuron>,
    /// Neuron indices in topological order.
    order: Vec<usize>,
    sensors: Vec<usize>,
    outputs: Vec<usize>,
    depth: usize,
}

impl NeuralNetwork {
    /// Builds a network from its gene.
    ///
    /// Fails when ids collide, synapses dangle or feed sensors, the graph has a
    /// cycle, or the sensor/output counts differ from the expected ones.
    pub fn from_gene(
        gene: &NetworkGene,
        expected_sensors: usize,
        expected_outputs: usize,
    ) -> Result<Self, MiscarriageError> {
        let mut index = HashMap::with_capacity(gene.neurons.len());
        let mut neurons = Vec::with_capacity(gene.neurons.len());
        for (i, neuron_gene) in gene.neurons.iter().enumerate() {
            if index.insert(neuron_gene.id, i).is_some() {
                return Err(MiscarriageError::DuplicateNeuron(neuron_gene.id));
            }
            neurons.push(Neuron::new(
                neuron_gene.id,
                neuron_gene.kind,
                neuron_gene.activation,
            ));
        }

        let mut successors: Vec<Vec<usize>> = vec![Vec::new(); neurons.len()];
        let mut in_degree = vec![0usize; neurons.len()];
        for synapse in &gene.synapses {
            let (Some(&from), Some(&to)) = (index.get(&synapse.from), index.get(&synapse.to)) else {
                return Err(MiscarriageError::DanglingSynapse {
                    from: synapse.from,
                    to: synapse.to,
                });
            };
            if neurons[to].kind() == NeuronType::Sensor {
                return Err(MiscarriageError::SynapseIntoSensor {
                    from: synapse.from,
                    to: synapse.to,
                });
            }
            neurons[to].add_input(from, synapse.weight);
            successors[from].push(to);
            in_degree[to] += 1;
        }

        let (order, depth) = topological_order(&successors, in_degree)?;

        let by_kind = |kind: NeuronType| {
            let mut indices: Vec<usize> = (0..neurons.len())
                .filter(|&i| neurons[i].kind() == kind)
                .collect();
            indices.sort_by_key(|&i| neurons[i].id());
            indices
        };
        let sensors = by_kind(NeuronType::Sensor);
        let outputs = by_kind(NeuronType::Output);

        if sensors.len() != expected_sensors {
            return Err(MiscarriageError::SensorMismatch {
                expected: expected_sensors,
                actual: sensors.len(),
            });
        }
        if outputs.len() != expected_outputs {
            return Err(MiscarriageError::OutputMismatch {
                expected: expected_outputs,
                actual: outputs.len(),
            });
        }

        Ok(Self {
            neurons,
            order,
            sensors,
            outputs,
            depth,
        })
    }

    /// Writes sensor values, in sensor id order. Extra values are ignored and
    /// missing ones leave the sensor unchanged.
    pub fn set_inputs(&mut self, inputs: &Array1<f32>) {
        for (&sensor, &value) in self.sensors.iter().zip(inputs.iter()) {
            self.neurons[sensor].set_state(value);
        }
    }

    /// Ticks the neurons at `order` against the currently committed states.
    ///
    /// Nothing becomes visible until [`NeuralNetwork::commit`].
    pub fn tick_neurons(&mut self, order: &[usize]) {
        tick_indices(&mut self.neurons, order);
    }

    /// Commits every pending next state.
    pub fn commit(&mut self) {
        for neuron in &mut self.neurons {
            neuron.update();
        }
    }

    /// One synchronous pass: tick every neuron, then commit.
    pub fn step(&mut self) {
        tick_indices(&mut self.neurons, &self.order);
        self.commit();
    }

    /// Runs enough passes for sensor values to reach the outputs.
    pub fn settle(&mut self) {
        for _ in 0..self.depth.max(1) {
            self.step();
        }
    }

    /// Committed output states, in output id order.
    pub fn outputs(&self) -> Array1<f32> {
        self.outputs
            .iter()
            .map(|&i| self.neurons[i].state())
            .collect()
    }

    /// Committed state of the output at `index`, in output id order.
    pub fn output(&self, index: usize) -> Option<f32> {
        self.outputs.get(index).map(|&i| self.neurons[i].state())
    }

    /// Committed state of every neuron, in network order.
    pub fn states(&self) -> Array1<f32> {
        self.neurons.iter().map(Neuron::state).collect()
    }

    /// Neuron indices in topological order.
    pub fn order(&self) -> &[usize] {
        &self.order
    }

    /// Longest sensor-to-output path, in synapses.
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Number of neurons.
    pub fn size(&self) -> usize {
        self.neurons.len()
    }

    /// All neurons, in network order.
    pub fn neurons(&self) -> &[Neuron] {
        &self.neurons
    }
}

fn tick_indices(neurons: &mut [Neuron], order: &[usize]) {
    let states: Array1<f32> = neurons.iter().map(Neuron::state).collect();
    for &i in order {
        neurons[i].tick(&states);
    }
}

/// Kahn's algorithm; also measures the longest path.
fn topological_order(
    successors: &[Vec<usize>],
    mut in_degree: Vec<usize>,
) -> Result<(Vec<usize>, usize), MiscarriageError> {
    let mut queue: VecDeque<usize> = (0..in_degree.len()).filter(|&i| in_degree[i] == 0).collect();
    let mut longest = vec![0usize; in_degree.len()];
    let mut order = Vec::with_capacity(in_degree.len());

    while let Some(node) = queue.pop_front() {
        order.push(node);
        for &next in &successors[node] {
            longest[next] = longest[next].max(longest[node] + 1);
            in_degree[next] -= 1;
            if in_degree[next] == 0 {
                queue.push_back(next);
            }
        }
    }

    if order.len() != in_degree.len() {
        return Err(MiscarriageError::CyclicNetwork);
    }
    let depth = longest.into_iter().max().unwrap_or(0);
    Ok((order, depth))
}
