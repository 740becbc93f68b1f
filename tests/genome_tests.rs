#![allow(missing_docs)]

mod common;

use std::sync::Arc;

use common::{create_test_params, plain_genome, test_rng};
use protozoa::simulation::error::MiscarriageError;
use protozoa::simulation::genome::{
    Genome, MAX_RETINA_CELLS, MAX_SPIKES, NetworkGene, NeuronGene, RetinaGene, SynapseGene, TraitKind,
    sensor_count,
};
use protozoa::simulation::brain::{Activation, NeuronType};
use protozoa::simulation::organism::Protozoa;
use protozoa::simulation::params::Params;

#[test]
fn expressed_traits_stay_in_bounds_under_mutation() {
    let params = Params {
        mutation_chance: 0.9,
        mutation_scale: 1.5,
        ..create_test_params()
    };
    let mut rng = test_rng();
    let mut genome = Genome::random(&params, &mut rng);

    for _ in 0..300 {
        genome = genome.mutate(&params, &mut rng);
        for kind in TraitKind::ALL {
            let (min, max) = kind.bounds();
            let value = genome.trait_value(kind);
            assert!(value >= min && value <= max, "{kind:?} = {value}");
        }
        assert!(genome.retina().cells <= MAX_RETINA_CELLS);
        assert!(genome.spikes().len() <= MAX_SPIKES);
        for spike in genome.spikes() {
            let (min, max) = spike.length.bounds();
            assert!(spike.length.expressed() >= min && spike.length.expressed() <= max);
        }
    }
}

#[test]
fn mutated_children_remain_expressible() {
    let params = Params {
        mutation_chance: 0.5,
        ..create_test_params()
    };
    let mut rng = test_rng();
    let mut genome = Genome::random(&params, &mut rng);

    for _ in 0..100 {
        genome = genome.create_child(None, &params, &mut rng);
        let sensors = sensor_count(genome.retina().cells, params.num_contact_sensors);
        assert_eq!(genome.network().sensor_ids().len(), sensors);
        assert!(Protozoa::from_genome(Arc::new(genome.clone()), &params, &mut rng).is_ok());
    }
    assert_eq!(genome.generation(), 100);
}

#[test]
fn mutation_returns_new_genome() {
    let params = Params {
        mutation_chance: 1.0,
        ..create_test_params()
    };
    let mut rng = test_rng();
    let parent = Genome::random(&params, &mut rng);
    let snapshot = parent.clone();

    let child = parent.mutate(&params, &mut rng);
    assert_eq!(parent, snapshot);
    assert!(child.mutations() > parent.mutations());
}

#[test]
fn crossover_takes_each_trait_from_a_parent() {
    let params = create_test_params();
    let mut rng = test_rng();
    let a = plain_genome(&params, &mut rng).with_trait(TraitKind::MaxTurn, 0.2);
    let b = plain_genome(&params, &mut rng).with_trait(TraitKind::MaxTurn, 0.9);

    for _ in 0..20 {
        let child = a.crossover(&b, &mut rng);
        let turn = child.trait_value(TraitKind::MaxTurn);
        assert!(turn == 0.2 || turn == 0.9);
        let sensors = sensor_count(child.retina().cells, params.num_contact_sensors);
        assert_eq!(child.network().sensor_ids().len(), sensors);
    }
}

#[test]
fn sensor_reconciliation_adds_and_removes_highest_ids() {
    let mut rng = test_rng();
    let gene = NetworkGene::seeded(5, 2, &mut rng);

    let shrunk = gene.with_sensor_count(3, &mut rng);
    assert_eq!(shrunk.sensor_ids(), vec![0, 1, 2]);
    assert!(shrunk.synapses.iter().all(|s| s.from != 3 && s.from != 4));

    let grown = gene.with_sensor_count(7, &mut rng);
    assert_eq!(grown.sensor_ids().len(), 7);
    let newest = *grown.sensor_ids().last().unwrap();
    assert!(grown.synapses.iter().any(|s| s.from == newest));
}

#[test]
fn cyclic_genome_miscarries() {
    let params = create_test_params();
    let mut rng = test_rng();
    let base = plain_genome(&params, &mut rng);
    let mut network = base.network().clone();

    let a = 100;
    let b = 101;
    network.neurons.push(NeuronGene { id: a, kind: NeuronType::Hidden, activation: Activation::Tanh });
    network.neurons.push(NeuronGene { id: b, kind: NeuronType::Hidden, activation: Activation::Tanh });
    network.synapses.push(SynapseGene { from: a, to: b, weight: 1.0 });
    network.synapses.push(SynapseGene { from: b, to: a, weight: 1.0 });

    let genome = Arc::new(base.with_network(network));
    let result = Protozoa::from_genome(genome, &params, &mut rng);
    assert!(matches!(result, Err(MiscarriageError::CyclicNetwork)));
}

#[test]
fn oversized_retina_miscarries() {
    let params = create_test_params();
    let mut rng = test_rng();
    let genome = plain_genome(&params, &mut rng)
        .with_structure(RetinaGene { cells: MAX_RETINA_CELLS + 1 }, Vec::new());
    let result = Protozoa::from_genome(Arc::new(genome), &params, &mut rng);
    assert!(matches!(result, Err(MiscarriageError::InvalidRetina(_))));
}
