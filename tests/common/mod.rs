#![allow(dead_code)]

use std::f32::consts::TAU;
use std::sync::Arc;

use protozoa::simulation::brain::Brain;
use protozoa::simulation::entity::Entity;
use protozoa::simulation::genome::{
    FloatGene, Genome, NetworkGene, RetinaGene, SpikeGene, TraitKind, sensor_count,
};
use protozoa::simulation::geometric_utils::Vector2;
use protozoa::simulation::organism::Protozoa;
use protozoa::simulation::params::Params;
use protozoa::simulation::rng::{SimRng, create_rng};

pub fn create_test_params() -> Params {
    Params {
        seed: 7,
        tank_width: 100.0,
        tank_height: 100.0,
        initial_protozoa: 0,
        min_protozoa: 0,
        initial_plants: 0,
        min_plants: 0,
        ..Params::default()
    }
}

pub fn test_rng() -> SimRng {
    create_rng(1234)
}

/// Genome without retina or spikes, radius 1 and split radius 3.
pub fn plain_genome(params: &Params, rng: &mut SimRng) -> Genome {
    Genome::random(params, rng)
        .with_structure(RetinaGene { cells: 0 }, Vec::new())
        .with_network(NetworkGene::seeded(
            sensor_count(0, params.num_contact_sensors),
            2,
            rng,
        ))
        .with_trait(TraitKind::Radius, 1.0)
        .with_trait(TraitKind::SplitRadius, 3.0)
        .with_trait(TraitKind::GrowthRate, 0.02)
}

/// Plain protozoan at `pos` facing `direction`.
pub fn protozoa_at(params: &Params, rng: &mut SimRng, pos: Vector2, direction: f32) -> Entity {
    let genome = Arc::new(plain_genome(params, rng));
    let (mut body, protozoa) = Protozoa::from_genome(genome, params, rng).expect("plain genome is viable");
    body.pos = pos;
    body.direction = direction;
    protozoa.into_entity(body)
}

/// Plain protozoan driven by a scripted brain.
pub fn scripted_protozoa(
    params: &Params,
    rng: &mut SimRng,
    pos: Vector2,
    direction: f32,
    speed: f32,
    mate: bool,
) -> Entity {
    let mut entity = protozoa_at(params, rng, pos, direction);
    if let Some(protozoa) = entity.as_protozoa_mut() {
        protozoa.set_brain(Brain::scripted(0.0, speed, mate));
    }
    entity
}

/// Plain protozoan with one fully grown forward spike of target length 1.
pub fn spiky_protozoa(params: &Params, rng: &mut SimRng, pos: Vector2, direction: f32) -> Entity {
    let spike = SpikeGene {
        angle: FloatGene::new(0.0, (0.0, TAU)),
        length: FloatGene::new(1.0, (0.2, 2.0)),
        growth_rate: FloatGene::new(1.0, (0.1, 2.0)),
    };
    let genome = plain_genome(params, rng).with_structure(RetinaGene { cells: 0 }, vec![spike]);
    let (mut body, mut protozoa) =
        Protozoa::from_genome(Arc::new(genome), params, rng).expect("spiky genome is viable");
    protozoa.update_spikes(1.0);
    body.pos = pos;
    body.direction = direction;
    protozoa.into_entity(body)
}
