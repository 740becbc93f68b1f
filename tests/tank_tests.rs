#![allow(missing_docs)]

mod common;

use std::f32::consts::PI;

use common::{create_test_params, protozoa_at, scripted_protozoa, test_rng};
use protozoa::simulation::error::SimulationError;
use protozoa::simulation::event_log::EventKind;
use protozoa::simulation::food::Pellet;
use protozoa::simulation::geometric_utils::Vector2;
use protozoa::simulation::params::Params;
use protozoa::simulation::tank::Tank;

fn small_tank_params(seed: u64) -> Params {
    Params {
        seed,
        tank_width: 60.0,
        tank_height: 60.0,
        initial_protozoa: 8,
        min_protozoa: 4,
        initial_plants: 40,
        min_plants: 20,
        ..Params::default()
    }
}

#[test]
fn approaching_organisms_end_up_touching() {
    let params = Params {
        kinetic_work_factor: 0.0,
        growth_energy_cost: 0.0,
        ..create_test_params()
    };
    let mut rng = test_rng();
    let mut tank = Tank::empty(params.clone()).unwrap();
    let a = tank.add(scripted_protozoa(&params, &mut rng, Vector2::new(40.0, 50.0), 0.0, 1.0, false));
    let b = tank.add(scripted_protozoa(&params, &mut rng, Vector2::new(60.0, 50.0), PI, 1.0, false));

    for _ in 0..300 {
        tank.step();
    }

    let first = &tank.get(a).unwrap().body;
    let second = &tank.get(b).unwrap().body;
    let d = first.pos.distance_to(second.pos);
    assert!((d - (first.radius() + second.radius())).abs() < 1e-3, "distance {d}");
}

#[test]
fn organism_without_energy_does_not_move() {
    let params = create_test_params();
    let mut rng = test_rng();
    let mut tank = Tank::empty(params.clone()).unwrap();
    let mut entity = protozoa_at(&params, &mut rng, Vector2::new(50.0, 50.0), 0.0);
    entity.as_protozoa_mut().unwrap().set_energy(0.0);
    let id = tank.add(entity);

    for _ in 0..5 {
        tank.step();
    }

    let entity = tank.get(id).unwrap();
    assert_eq!(entity.body.pos, Vector2::new(50.0, 50.0));
    assert_eq!(entity.body.speed, 0.0);
    let network = entity.as_protozoa().unwrap().brain().network().unwrap();
    assert!(network.states().iter().any(|&s| s != 0.0));
}

#[test]
fn overlapping_pellets_converge_to_tangency() {
    let params = create_test_params();
    let mut tank = Tank::empty(params.clone()).unwrap();
    let a = tank.add(Pellet::meat(Vector2::new(50.0, 50.0), 1.0, &params));
    let b = tank.add(Pellet::meat(Vector2::new(51.0, 50.0), 1.0, &params));

    tank.step();
    let pa = tank.get(a).unwrap().body.pos;
    let pb = tank.get(b).unwrap().body.pos;
    assert!((pa.distance_to(pb) - 2.0).abs() < 1e-5);

    tank.step();
    assert_eq!(tank.get(a).unwrap().body.pos, pa);
    assert_eq!(tank.get(b).unwrap().body.pos, pb);
}

#[test]
fn dead_organism_decomposes_into_meat() {
    let params = create_test_params();
    let mut rng = test_rng();
    let mut tank = Tank::empty(params.clone()).unwrap();
    let mut entity = protozoa_at(&params, &mut rng, Vector2::new(50.0, 50.0), 0.0);
    entity.body.set_health(0.05);
    let id = tank.add(entity);

    tank.step();

    assert!(tank.get(id).is_none());
    let census = tank.census();
    assert_eq!(census.protozoa, 0);
    assert!((2..=4).contains(&census.meat));
    assert_eq!(tank.reproduction_stats().decompositions, 1);
    assert!(tank.event_log().events().iter().any(|e| e.kind == EventKind::Death));
    assert_eq!(tank.chunks().len(), tank.len());
}

#[test]
fn new_tank_matches_initial_populations() {
    let params = small_tank_params(3);
    let tank = Tank::new(params).unwrap();
    let census = tank.census();
    assert_eq!(census.protozoa, 8);
    assert_eq!(census.plants, 40);
    assert_eq!(census.meat, 0);
    assert_eq!(tank.tick(), 0);
}

#[test]
fn invalid_parameters_are_rejected() {
    let params = Params {
        chunk_size: 4.0,
        ..Params::default()
    };
    assert!(matches!(Tank::new(params), Err(SimulationError::InvalidConfig(_))));
}

#[test]
fn runs_are_deterministic_for_a_seed() {
    let run = |seed| {
        let mut tank = Tank::new(small_tank_params(seed)).unwrap();
        for _ in 0..60 {
            tank.step();
        }
        tank.to_bytes().unwrap()
    };
    assert_eq!(run(11), run(11));
    assert_ne!(run(11), run(12));
}

#[test]
fn tank_survives_many_ticks() {
    let mut tank = Tank::new(small_tank_params(5)).unwrap();
    for _ in 0..400 {
        tank.step();
        assert_eq!(tank.chunks().len(), tank.len());
    }
    assert!(tank.census().protozoa >= 4);
    assert!((tank.time() - 400.0 * tank.params().dt).abs() < 1e-2);
    for (_, entity) in tank.entities() {
        assert!(!entity.body.is_dead());
        assert!(entity.body.radius() > 0.0);
    }
}

#[test]
fn save_and_load_round_trip() {
    let mut tank = Tank::new(small_tank_params(9)).unwrap();
    for _ in 0..20 {
        tank.step();
    }

    let bytes = tank.to_bytes().unwrap();
    let restored = Tank::from_bytes(&bytes).unwrap();
    assert_eq!(restored.to_bytes().unwrap(), bytes);
    assert_eq!(restored.tick(), 20);
    assert_eq!(restored.chunks().len(), restored.len());

    let path = std::env::temp_dir().join(format!("protozoa_tank_{}.json", std::process::id()));
    tank.save_to_file(&path).unwrap();
    let loaded = Tank::load_from_file(&path).unwrap();
    std::fs::remove_file(&path).ok();
    assert_eq!(loaded.to_bytes().unwrap(), bytes);
    assert_eq!(loaded.census(), tank.census());
}

#[test]
fn collision_across_chunk_boundary_keeps_index_current() {
    let params = create_test_params();
    let mut tank = Tank::empty(params.clone()).unwrap();
    let a = tank.add(Pellet::meat(Vector2::new(20.6, 50.0), 1.0, &params));
    let b = tank.add(Pellet::meat(Vector2::new(20.2, 50.0), 1.0, &params));

    tank.step();

    let pushed = tank.get(b).unwrap().body.pos;
    assert!(pushed.x < 20.0, "expected b to cross into the lower chunk, got {pushed:?}");
    for id in [a, b] {
        let pos = tank.get(id).unwrap().body.pos;
        let chunks = tank.chunks();
        assert_eq!(chunks.chunk_of_entity(id), Some(chunks.chunk_of(pos)));
        assert!(tank.query(pos, 0.5).any(|found| found == id));
    }
}

#[test]
fn stationary_organism_is_pushed_by_the_approaching_one() {
    let params = Params {
        kinetic_work_factor: 0.0,
        growth_energy_cost: 0.0,
        ..create_test_params()
    };
    let mut rng = test_rng();
    let mut tank = Tank::empty(params.clone()).unwrap();
    let still = tank.add(scripted_protozoa(&params, &mut rng, Vector2::new(40.0, 50.0), 0.0, 0.0, false));
    let mover = tank.add(scripted_protozoa(&params, &mut rng, Vector2::new(50.0, 50.0), PI, 1.0, false));

    for _ in 0..200 {
        let before = tank.get(mover).unwrap().body.clone();
        tank.step();
        let after = &tank.get(mover).unwrap().body;
        let travelled = before.pos.distance_to(after.pos);
        assert!((travelled - before.speed * params.dt).abs() < 1e-4, "the approaching organism was displaced");
    }

    let still = &tank.get(still).unwrap().body;
    let mover = &tank.get(mover).unwrap().body;
    assert_eq!(still.speed, 0.0);
    assert!(still.pos.x < 40.0);
    let d = still.pos.distance_to(mover.pos);
    assert!((d - (still.radius() + mover.radius())).abs() < 1e-3, "distance {d}");
}

#[test]
fn contacts_are_cleared_at_the_end_of_a_tick() {
    let params = create_test_params();
    let mut rng = test_rng();
    let mut tank = Tank::empty(params.clone()).unwrap();
    let id = tank.add(protozoa_at(&params, &mut rng, Vector2::new(50.0, 50.0), 0.0));
    tank.add(Pellet::meat(Vector2::new(51.5, 50.0), 0.6, &params));

    tank.step();

    let protozoa = tank.get(id).unwrap().as_protozoa().unwrap();
    assert!(protozoa.contact_sensors().iter().all(|s| !s.in_contact()));
    assert!(!protozoa.was_just_damaged());
}
