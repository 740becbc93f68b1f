//! Genomes: bounded trait genes plus structural genes for the retina, spikes
//! and brain network.
//!
//! A [`Genome`] is never modified after construction. [`Genome::mutate`],
//! [`Genome::crossover`] and [`Genome::create_child`] always return a new
//! instance, and trait values are clamped to their declared range only when
//! they are expressed.

use std::f32::consts::{PI, TAU};

use rand::Rng;
use serde::{Deserialize, Serialize};

use super::brain::{Activation, NeuronType, OUTPUT_SIZE};
use super::entity::Colour;
use super::params::Params;
use super::rng::SimRng;

/// Most retina cells a genome can express.
pub const MAX_RETINA_CELLS: usize = 8;
/// Most spikes a genome can express.
pub const MAX_SPIKES: usize = 4;
/// Sensors present regardless of phenotype: bias, health and energy.
pub const BASE_SENSORS: usize = 3;
/// Sensor inputs contributed by every retina cell: red, green, blue, proximity.
pub const INPUTS_PER_RETINA_CELL: usize = 4;

const SPIKE_ANGLE_BOUNDS: (f32, f32) = (0.0, TAU);
const SPIKE_LENGTH_BOUNDS: (f32, f32) = (0.2, 1.5);
const SPIKE_GROWTH_BOUNDS: (f32, f32) = (0.05, 0.5);
const RESAMPLE_CHANCE: f32 = 0.2;

/// Number of sensor neurons a phenotype with these senses needs.
pub fn sensor_count(retina_cells: usize, contact_sensors: usize) -> usize {
    BASE_SENSORS + contact_sensors + INPUTS_PER_RETINA_CELL * retina_cells
}

/// Scalar traits carried by every genome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum TraitKind {
    /// Radius at birth.
    Radius,
    /// Relative growth per second.
    GrowthRate,
    /// Radius above which the organism splits.
    SplitRadius,
    /// Plant digestion multiplier; meat digestion is its inverse.
    HerbivoreFactor,
    /// Largest turn command.
    MaxTurn,
    /// Retina field of view in radians.
    RetinaFov,
    /// Red channel of the body colour.
    ColourRed,
    /// Green channel of the body colour.
    ColourGreen,
    /// Blue channel of the body colour.
    ColourBlue,
}

impl TraitKind {
    /// Every trait, in genome order.
    pub const ALL: [TraitKind; 9] = [
        TraitKind::Radius,
        TraitKind::GrowthRate,
        TraitKind::SplitRadius,
        TraitKind::HerbivoreFactor,
        TraitKind::MaxTurn,
        TraitKind::RetinaFov,
        TraitKind::ColourRed,
        TraitKind::ColourGreen,
        TraitKind::ColourBlue,
    ];

    /// Declared `(min, max)` range of the trait.
    pub fn bounds(self) -> (f32, f32) {
        match self {
            TraitKind::Radius => (0.6, 1.6),
            TraitKind::GrowthRate => (0.02, 0.15),
            TraitKind::SplitRadius => (1.8, 3.5),
            TraitKind::HerbivoreFactor => (0.5, 2.0),
            TraitKind::MaxTurn => (0.1, 1.0),
            TraitKind::RetinaFov => (0.2, 0.8 * PI),
            TraitKind::ColourRed | TraitKind::ColourGreen | TraitKind::ColourBlue => (0.0, 1.0),
        }
    }
}

/// A scalar gene with a declared range.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FloatGene {
    value: f32,
    min: f32,
    max: f32,
}

impl FloatGene {
    /// Creates a gene holding `value` with range `bounds`.
    pub fn new(value: f32, bounds: (f32, f32)) -> Self {
        Self {
            value,
            min: bounds.0,
            max: bounds.1,
        }
    }

    /// Creates a gene with a value drawn uniformly from `bounds`.
    pub fn random(bounds: (f32, f32), rng: &mut SimRng) -> Self {
        let value = if bounds.0 < bounds.1 {
            rng.random_range(bounds.0..bounds.1)
        } else {
            bounds.0
        };
        Self::new(value, bounds)
    }

    /// Raw stored value; may lie outside the range after drift.
    pub fn raw(&self) -> f32 {
        self.value
    }

    /// Declared range.
    pub fn bounds(&self) -> (f32, f32) {
        (self.min, self.max)
    }

    /// Value as expressed in a phenotype, clamped to the declared range.
    pub fn expressed(&self) -> f32 {
        self.value.clamp(self.min, self.max)
    }

    fn mutated(&self, params: &Params, rng: &mut SimRng) -> Self {
        if rng.random::<f32>() < RESAMPLE_CHANCE {
            return Self::random(self.bounds(), rng);
        }
        let span = self.max - self.min;
        let delta = rng.random_range(-1.0..=1.0) * span * params.mutation_scale;
        Self::new(self.value + delta, self.bounds())
    }

    fn crossed(&self, other: &Self, rng: &mut SimRng) -> Self {
        if rng.random_bool(0.5) { *self } else { *other }
    }
}

/// Gene of one spike.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpikeGene {
    /// Angle relative to the facing direction.
    pub angle: FloatGene,
    /// Target length at full size.
    pub length: FloatGene,
    /// Length grown per second.
    pub growth_rate: FloatGene,
}

impl SpikeGene {
    /// Random spike within the declared ranges.
    pub fn random(rng: &mut SimRng) -> Self {
        Self {
            angle: FloatGene::random(SPIKE_ANGLE_BOUNDS, rng),
            length: FloatGene::random(SPIKE_LENGTH_BOUNDS, rng),
            growth_rate: FloatGene::random(SPIKE_GROWTH_BOUNDS, rng),
        }
    }

    fn mutated(&self, params: &Params, rng: &mut SimRng) -> (Self, u32) {
        let mut count = 0;
        let mut maybe = |gene: &FloatGene, rng: &mut SimRng| {
            if rng.random::<f32>() < params.mutation_chance {
                count += 1;
                gene.mutated(params, rng)
            } else {
                *gene
            }
        };
        let spike = Self {
            angle: maybe(&self.angle, rng),
            length: maybe(&self.length, rng),
            growth_rate: maybe(&self.growth_rate, rng),
        };
        (spike, count)
    }
}

/// Gene describing the retina.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetinaGene {
    /// Number of retina cells.
    pub cells: usize,
}

/// Gene of one neuron.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NeuronGene {
    /// Unique id within the network.
    pub id: u32,
    /// Neuron role.
    pub kind: NeuronType,
    /// Activation function.
    pub activation: Activation,
}

/// Gene of one weighted connection.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SynapseGene {
    /// Source neuron id.
    pub from: u32,
    /// Target neuron id.
    pub to: u32,
    /// Connection weight.
    pub weight: f32,
}

/// Topology and weights of a brain network.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct NetworkGene {
    /// Neuron genes.
    pub neurons: Vec<NeuronGene>,
    /// Synapse genes.
    pub synapses: Vec<SynapseGene>,
}

impl NetworkGene {
    /// Layered network: sensors feed the hidden layer (or the outputs directly
    /// when `hidden` is zero), hidden neurons feed the outputs.
    pub fn seeded(sensors: usize, hidden: usize, rng: &mut SimRng) -> Self {
        let mut gene = Self::default();
        let sensor_ids: Vec<u32> = (0..sensors as u32).collect();
        let output_ids: Vec<u32> = (0..OUTPUT_SIZE as u32).map(|i| sensors as u32 + i).collect();
        let hidden_ids: Vec<u32> = (0..hidden as u32)
            .map(|i| (sensors + OUTPUT_SIZE) as u32 + i)
            .collect();

        for &id in &sensor_ids {
            gene.neurons.push(NeuronGene {
                id,
                kind: NeuronType::Sensor,
                activation: Activation::Linear,
            });
        }
        for &id in &output_ids {
            gene.neurons.push(NeuronGene {
                id,
                kind: NeuronType::Output,
                activation: Activation::Tanh,
            });
        }
        for &id in &hidden_ids {
            gene.neurons.push(NeuronGene {
                id,
                kind: NeuronType::Hidden,
                activation: Activation::Tanh,
            });
        }

        let first_layer = if hidden_ids.is_empty() { &output_ids } else { &hidden_ids };
        for &from in &sensor_ids {
            for &to in first_layer {
                gene.connect(from, to, rng);
            }
        }
        for &from in &hidden_ids {
            for &to in &output_ids {
                gene.connect(from, to, rng);
            }
        }
        gene
    }

    fn connect(&mut self, from: u32, to: u32, rng: &mut SimRng) {
        self.synapses.push(SynapseGene {
            from,
            to,
            weight: rng.random_range(-1.0..1.0),
        });
    }

    /// Sensor neuron ids in ascending order.
    pub fn sensor_ids(&self) -> Vec<u32> {
        let mut ids: Vec<u32> = self
            .neurons
            .iter()
            .filter(|n| n.kind == NeuronType::Sensor)
            .map(|n| n.id)
            .collect();
        ids.sort_unstable();
        ids
    }

    fn next_id(&self) -> u32 {
        self.neurons.iter().map(|n| n.id + 1).max().unwrap_or(0)
    }

    /// Copy of this gene with exactly `sensors` sensor neurons.
    ///
    /// Surplus sensors (highest ids first) are dropped with their synapses.
    /// New sensors are wired to the neurons the first sensor feeds.
    pub fn with_sensor_count(&self, sensors: usize, rng: &mut SimRng) -> Self {
        let mut gene = self.clone();
        let current = gene.sensor_ids();

        if current.len() > sensors {
            let dropped = &current[sensors..];
            gene.neurons.retain(|n| !dropped.contains(&n.id));
            gene.synapses
                .retain(|s| !dropped.contains(&s.from) && !dropped.contains(&s.to));
        } else if current.len() < sensors {
            let targets: Vec<u32> = match current.first() {
                Some(&first) => self
                    .synapses
                    .iter()
                    .filter(|s| s.from == first)
                    .map(|s| s.to)
                    .collect(),
                None => self
                    .neurons
                    .iter()
                    .filter(|n| n.kind == NeuronType::Output)
                    .map(|n| n.id)
                    .collect(),
            };
            for _ in current.len()..sensors {
                let id = gene.next_id();
                gene.neurons.push(NeuronGene {
                    id,
                    kind: NeuronType::Sensor,
                    activation: Activation::Linear,
                });
                for &to in &targets {
                    gene.connect(id, to, rng);
                }
            }
        }
        gene
    }

    fn mutated(&self, params: &Params, rng: &mut SimRng) -> (Self, u32) {
        let mut gene = self.clone();
        let mut count = 0;
        for synapse in &mut gene.synapses {
            if rng.random::<f32>() < params.mutation_chance {
                synapse.weight += rng.random_range(-1.0..=1.0) * params.weight_mutation_scale;
                count += 1;
            }
        }
        (gene, count)
    }

    fn crossed(&self, other: &Self, rng: &mut SimRng) -> Self {
        let mut gene = self.clone();
        for synapse in &mut gene.synapses {
            let matching = other
                .synapses
                .iter()
                .find(|s| s.from == synapse.from && s.to == synapse.to);
            if let Some(theirs) = matching
                && rng.random_bool(0.5)
            {
                synapse.weight = theirs.weight;
            }
        }
        gene
    }
}

/// Complete genotype of a protozoan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Genome {
    traits: Vec<(TraitKind, FloatGene)>,
    retina: RetinaGene,
    spikes: Vec<SpikeGene>,
    network: NetworkGene,
    mutations: u32,
    generation: u32,
}

impl Genome {
    /// Random founder genome.
    pub fn random(params: &Params, rng: &mut SimRng) -> Self {
        let traits = TraitKind::ALL
            .iter()
            .map(|&kind| (kind, FloatGene::random(kind.bounds(), rng)))
            .collect();
        let retina = RetinaGene {
            cells: rng.random_range(0..=MAX_RETINA_CELLS / 2),
        };
        let spikes = (0..rng.random_range(0..=1))
            .map(|_| SpikeGene::random(rng))
            .collect();
        let network = NetworkGene::seeded(
            sensor_count(retina.cells, params.num_contact_sensors),
            params.initial_hidden_neurons,
            rng,
        );
        Self {
            traits,
            retina,
            spikes,
            network,
            mutations: 0,
            generation: 0,
        }
    }

    /// Expressed value of a trait, clamped to its declared range.
    pub fn trait_value(&self, kind: TraitKind) -> f32 {
        self.gene(kind).map_or_else(
            || {
                let (min, max) = kind.bounds();
                (min + max) / 2.0
            },
            FloatGene::expressed,
        )
    }

    /// The gene for a trait.
    pub fn gene(&self, kind: TraitKind) -> Option<&FloatGene> {
        self.traits.iter().find(|(k, _)| *k == kind).map(|(_, g)| g)
    }

    /// Body colour.
    pub fn colour(&self) -> Colour {
        Colour::new(
            self.trait_value(TraitKind::ColourRed),
            self.trait_value(TraitKind::ColourGreen),
            self.trait_value(TraitKind::ColourBlue),
        )
    }

    /// Retina gene.
    pub fn retina(&self) -> RetinaGene {
        self.retina
    }

    /// Spike genes.
    pub fn spikes(&self) -> &[SpikeGene] {
        &self.spikes
    }

    /// Network gene.
    pub fn network(&self) -> &NetworkGene {
        &self.network
    }

    /// Mutations accumulated along the lineage.
    pub fn mutations(&self) -> u32 {
        self.mutations
    }

    /// Generations since the founder.
    pub fn generation(&self) -> u32 {
        self.generation
    }

    /// Copy of this genome with `kind` set to `value`.
    pub fn with_trait(&self, kind: TraitKind, value: f32) -> Self {
        let mut genome = self.clone();
        match genome.traits.iter_mut().find(|(k, _)| *k == kind) {
            Some((_, gene)) => *gene = FloatGene::new(value, kind.bounds()),
            None => genome.traits.push((kind, FloatGene::new(value, kind.bounds()))),
        }
        genome
    }

    /// Copy of this genome with a different network gene.
    pub fn with_network(&self, network: NetworkGene) -> Self {
        Self {
            network,
            ..self.clone()
        }
    }

    /// Copy of this genome with different retina and spike genes. The network
    /// is not adjusted to the new sensor count.
    pub fn with_structure(&self, retina: RetinaGene, spikes: Vec<SpikeGene>) -> Self {
        Self {
            retina,
            spikes,
            ..self.clone()
        }
    }

    /// New genome with random per-gene mutations.
    pub fn mutate(&self, params: &Params, rng: &mut SimRng) -> Self {
        let mut count = 0;
        let traits = self
            .traits
            .iter()
            .map(|&(kind, gene)| {
                if rng.random::<f32>() < params.mutation_chance {
                    count += 1;
                    (kind, gene.mutated(params, rng))
                } else {
                    (kind, gene)
                }
            })
            .collect();

        let mut spikes = Vec::with_capacity(self.spikes.len() + 1);
        for spike in &self.spikes {
            let (spike, n) = spike.mutated(params, rng);
            count += n;
            spikes.push(spike);
        }
        if rng.random::<f32>() < params.mutation_chance / 2.0 {
            if spikes.len() < MAX_SPIKES {
                spikes.push(SpikeGene::random(rng));
                count += 1;
            }
        } else if !spikes.is_empty() && rng.random::<f32>() < params.mutation_chance / 2.0 {
            let index = rng.random_range(0..spikes.len());
            spikes.remove(index);
            count += 1;
        }

        let mut retina = self.retina;
        if rng.random::<f32>() < params.mutation_chance {
            retina.cells = if rng.random_bool(0.5) {
                (retina.cells + 1).min(MAX_RETINA_CELLS)
            } else {
                retina.cells.saturating_sub(1)
            };
            count += 1;
        }

        let network = self
            .network
            .with_sensor_count(sensor_count(retina.cells, params.num_contact_sensors), rng);
        let (network, n) = network.mutated(params, rng);
        count += n;

        Self {
            traits,
            retina,
            spikes,
            network,
            mutations: self.mutations + count,
            generation: self.generation,
        }
    }

    /// New genome taking each gene from either parent.
    ///
    /// The retina and network topology come from the same parent so that the
    /// sensor layout stays consistent; weights of shared synapses are mixed.
    pub fn crossover(&self, other: &Genome, rng: &mut SimRng) -> Self {
        let traits = self
            .traits
            .iter()
            .map(|&(kind, gene)| match other.gene(kind) {
                Some(theirs) => (kind, gene.crossed(theirs, rng)),
                None => (kind, gene),
            })
            .collect();

        let (structural, donor) = if rng.random_bool(0.5) {
            (self, other)
        } else {
            (other, self)
        };
        let spikes = if rng.random_bool(0.5) {
            self.spikes.clone()
        } else {
            other.spikes.clone()
        };

        Self {
            traits,
            retina: structural.retina,
            spikes,
            network: structural.network.crossed(&donor.network, rng),
            mutations: self.mutations.max(other.mutations),
            generation: self.generation.max(other.generation),
        }
    }

    /// Genome of an offspring: crossed with `mate` when one is held, then
    /// mutated, one generation later.
    pub fn create_child(&self, mate: Option<&Genome>, params: &Params, rng: &mut SimRng) -> Self {
        let base = match mate {
            Some(mate) => self.crossover(mate, rng),
            None => self.clone(),
        };
        let mut child = base.mutate(params, rng);
        child.generation = self.generation.max(base.generation) + 1;
        child
    }
}
