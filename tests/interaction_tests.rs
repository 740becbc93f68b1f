#![allow(missing_docs)]

mod common;

use std::f32::consts::PI;

use common::{create_test_params, protozoa_at, scripted_protozoa, spiky_protozoa, test_rng};
use protozoa::simulation::brain::Brain;
use protozoa::simulation::entity::{Body, Colour, Entity, EntityId};
use protozoa::simulation::event_log::EventLog;
use protozoa::simulation::events::{CommitState, EventQueue, SimulationEvent, apply_events};
use protozoa::simulation::food::Pellet;
use protozoa::simulation::geometric_utils::Vector2;
use protozoa::simulation::interaction::{accumulate_crowding, interact, resolve_collision};
use protozoa::simulation::reproduction::ReproductionStats;
use slotmap::SlotMap;

#[test]
fn equal_momentum_collision_moves_the_larger_id() {
    let params = create_test_params();
    let mut entities: SlotMap<EntityId, Entity> = SlotMap::with_key();
    let a = entities.insert(Pellet::meat(Vector2::new(50.0, 50.0), 1.0, &params));
    let b = entities.insert(Pellet::meat(Vector2::new(51.0, 50.0), 1.0, &params));
    assert!(a < b);

    let view_a = entities[a].view(a);
    let view_b = entities[b].view(b);

    assert!(!resolve_collision(a, &mut entities[a].body, &view_b));
    assert_eq!(entities[a].body.pos, Vector2::new(50.0, 50.0));

    assert!(resolve_collision(b, &mut entities[b].body, &view_a));
    let d = entities[b].body.pos.distance_to(entities[a].body.pos);
    assert!((d - 2.0).abs() < 1e-5);

    let view_a = entities[a].view(a);
    let before = entities[b].body.pos;
    assert!(!resolve_collision(b, &mut entities[b].body, &view_a));
    assert_eq!(entities[b].body.pos, before);
}

#[test]
fn slower_body_yields_in_a_collision() {
    let params = create_test_params();
    let mut entities: SlotMap<EntityId, Entity> = SlotMap::with_key();
    let a = entities.insert(Pellet::meat(Vector2::new(50.0, 50.0), 1.0, &params));
    let b = entities.insert(Pellet::meat(Vector2::new(50.0, 51.5), 1.0, &params));
    entities[b].body.speed = 2.0;

    let view_b = entities[b].view(b);
    assert!(resolve_collision(a, &mut entities[a].body, &view_b));
    let d = entities[a].body.pos.distance_to(entities[b].body.pos);
    assert!((d - 2.0).abs() < 1e-5);
    assert!(entities[a].body.pos.y < 50.0);
}

#[test]
fn coincident_centres_separate_along_facing_direction() {
    let params = create_test_params();
    let mut entities: SlotMap<EntityId, Entity> = SlotMap::with_key();
    let a = entities.insert(Pellet::meat(Vector2::new(20.0, 20.0), 1.0, &params));
    let b = entities.insert(Pellet::meat(Vector2::new(20.0, 20.0), 0.5, &params));
    entities[b].body.direction = PI / 2.0;

    let view_a = entities[a].view(a);
    assert!(resolve_collision(b, &mut entities[b].body, &view_a));
    let pos = entities[b].body.pos;
    assert!((pos.x - 20.0).abs() < 1e-5);
    assert!((pos.y - 21.5).abs() < 1e-5);
}

#[test]
fn feeding_is_first_come_first_served() {
    let params = create_test_params();
    let mut rng = test_rng();
    let mut entities: SlotMap<EntityId, Entity> = SlotMap::with_key();
    let plant = entities.insert(Pellet::plant(Vector2::new(50.0, 50.0), 1.0, &params));
    let first = entities.insert(protozoa_at(&params, &mut rng, Vector2::new(48.0, 50.0), 0.0));
    let second = entities.insert(protozoa_at(&params, &mut rng, Vector2::new(52.0, 50.0), PI));
    for id in [first, second] {
        entities[id].as_protozoa_mut().unwrap().set_energy(0.0);
    }

    let plant_mass = entities[plant].body.mass(&params);
    let mut queue = EventQueue::new();
    for consumer in [first, second] {
        queue.push(SimulationEvent::Feed {
            consumer,
            food: plant,
            mass: 0.8 * plant_mass,
        });
    }

    let mut reproduction = ReproductionStats::default();
    let mut log = EventLog::new(10);
    let mut state = CommitState {
        entities: &mut entities,
        params: &params,
        reproduction: &mut reproduction,
        log: &mut log,
        time: 0.0,
    };
    let births = apply_events(&mut state, queue);
    assert!(births.is_empty());

    let first_energy = entities[first].as_protozoa().unwrap().energy();
    let second_energy = entities[second].as_protozoa().unwrap().energy();
    assert!((first_energy - 0.8 * plant_mass).abs() < 1e-4);
    assert!((second_energy - 0.2 * plant_mass).abs() < 1e-4);
    assert!(entities[plant].body.is_dead());
    assert!(entities[plant].body.death_handled());
}

#[test]
fn damage_is_applied_at_commit() {
    let params = create_test_params();
    let mut rng = test_rng();
    let mut entities: SlotMap<EntityId, Entity> = SlotMap::with_key();
    let attacker = entities.insert(protozoa_at(&params, &mut rng, Vector2::new(40.0, 40.0), 0.0));
    let target = entities.insert(protozoa_at(&params, &mut rng, Vector2::new(42.0, 40.0), 0.0));

    let mut queue = EventQueue::new();
    queue.push(SimulationEvent::Damage {
        target,
        attacker,
        amount: 0.25,
    });
    queue.push(SimulationEvent::Mated {
        organism: attacker,
        partner: target,
    });

    let mut reproduction = ReproductionStats::default();
    let mut log = EventLog::new(10);
    let mut state = CommitState {
        entities: &mut entities,
        params: &params,
        reproduction: &mut reproduction,
        log: &mut log,
        time: 1.0,
    };
    apply_events(&mut state, queue);

    assert!((entities[target].body.health() - 0.75).abs() < 1e-6);
    assert!(entities[target].as_protozoa().unwrap().was_just_damaged());
    assert_eq!(entities[attacker].body.health(), 1.0);
    assert_eq!(reproduction.matings, 1);
    assert_eq!(log.len(), 1);
}

#[test]
fn spikes_only_hurt_what_they_pierce() {
    let params = create_test_params();
    let mut rng = test_rng();
    let mut ids: SlotMap<EntityId, ()> = SlotMap::with_key();
    let front_id = ids.insert(());
    let behind_id = ids.insert(());

    let attacker = spiky_protozoa(&params, &mut rng, Vector2::new(50.0, 50.0), 0.0);
    let protozoa = attacker.as_protozoa().unwrap();
    let spike = protozoa.spikes()[0];
    let tip = protozoa.spike_tip(&attacker.body, &spike);
    assert!((tip.x - (51.0 + 1.0 / 3.0)).abs() < 1e-4);
    assert!((tip.y - 50.0).abs() < 1e-4);

    let mut front = protozoa_at(&params, &mut rng, Vector2::new(52.0, 50.0), 0.0).view(front_id);
    let mut behind = protozoa_at(&params, &mut rng, Vector2::new(48.0, 50.0), 0.0).view(behind_id);
    for view in [&mut front, &mut behind] {
        view.organism.as_mut().unwrap().shield_factor = 0.0;
    }

    assert!(protozoa.spike_in_contact(&attacker.body, &spike, &front));
    assert!(!protozoa.spike_in_contact(&attacker.body, &spike, &behind));
    assert!(protozoa.attack(&attacker.body, &front, &params, params.dt, &mut rng) > 0.0);
    assert_eq!(protozoa.attack(&attacker.body, &behind, &params, params.dt, &mut rng), 0.0);
}

#[test]
fn strong_shield_absorbs_every_attack() {
    let params = create_test_params();
    let mut rng = test_rng();
    let attacker = spiky_protozoa(&params, &mut rng, Vector2::new(50.0, 50.0), 0.0);
    let protozoa = attacker.as_protozoa().unwrap();
    let mut target = protozoa_at(&params, &mut rng, Vector2::new(52.0, 50.0), 0.0).view(EntityId::default());
    target.organism.as_mut().unwrap().shield_factor = 100.0;

    for _ in 0..50 {
        assert_eq!(protozoa.attack(&attacker.body, &target, &params, params.dt, &mut rng), 0.0);
    }
}

#[test]
fn crowding_counts_neighbours_within_three_radii() {
    let params = create_test_params();
    let mut body = Body::new(Vector2::new(10.0, 10.0), 1.0, Colour::default());
    let near = Pellet::meat(Vector2::new(12.0, 10.0), 0.5, &params).view(EntityId::default());
    let edge = Pellet::meat(Vector2::new(13.0, 10.0), 0.5, &params).view(EntityId::default());
    let far = Pellet::meat(Vector2::new(10.0, 14.0), 2.0, &params).view(EntityId::default());

    for other in [&near, &edge, &far] {
        accumulate_crowding(&mut body, other);
    }
    assert!((body.crowding_factor - 0.1).abs() < 1e-6);
}

#[test]
fn contact_sensors_keep_the_last_touch_until_reset() {
    let params = create_test_params();
    let mut rng = test_rng();
    let mut ids: SlotMap<EntityId, ()> = SlotMap::with_key();
    let a = ids.insert(());
    let b = ids.insert(());

    let mut entity = protozoa_at(&params, &mut rng, Vector2::new(50.0, 50.0), 0.0);
    let body = entity.body.clone();
    let protozoa = entity.as_protozoa_mut().unwrap();
    let tip = protozoa.contact_sensors()[0].tip(&body);
    assert!((tip.x - 51.01).abs() < 1e-4);

    let first = Pellet::meat(Vector2::new(51.5, 50.0), 0.6, &params).view(a);
    let second = Pellet::meat(Vector2::new(51.2, 50.0), 0.5, &params).view(b);

    protozoa.sense_contact(&body, &first);
    assert_eq!(protozoa.contact_sensors()[0].contact(), Some(a));
    assert!(protozoa.contact_sensors()[1..].iter().all(|s| !s.in_contact()));

    protozoa.sense_contact(&body, &second);
    assert_eq!(protozoa.contact_sensors()[0].contact(), Some(b));

    let inputs = protozoa.sensor_inputs(&body, &params);
    assert_eq!(inputs[3], 1.0);
    assert!(inputs.iter().skip(4).all(|&v| v == 0.0));

    protozoa.reset_contacts();
    assert!(protozoa.contact_sensors().iter().all(|s| !s.in_contact()));
}

#[test]
fn feed_requests_follow_diet_and_spikes() {
    let params = create_test_params();
    let mut rng = test_rng();
    let dt = params.dt;
    let plant = Pellet::plant(Vector2::new(51.0, 50.0), 0.5, &params).view(EntityId::default());
    let meat = Pellet::meat(Vector2::new(51.0, 50.0), 0.5, &params).view(EntityId::default());

    let plain = protozoa_at(&params, &mut rng, Vector2::new(50.0, 50.0), 0.0);
    let plain = plain.as_protozoa().unwrap();
    let h = plain.herbivore_factor();
    let request = plain.feed_request(&plant, &params, dt).unwrap();
    assert!((request - params.consume_rate * h * dt).abs() < 1e-6);
    let request = plain.feed_request(&meat, &params, dt).unwrap();
    assert!((request - params.consume_rate / h * dt).abs() < 1e-6);

    let spiky = spiky_protozoa(&params, &mut rng, Vector2::new(50.0, 50.0), 0.0);
    let spiky = spiky.as_protozoa().unwrap();
    let h = spiky.herbivore_factor();
    let request = spiky.feed_request(&plant, &params, dt).unwrap();
    let expected = params.consume_rate * h * params.spike_plant_consumption_penalty * dt;
    assert!((request - expected).abs() < 1e-6);
    let request = spiky.feed_request(&meat, &params, dt).unwrap();
    assert!((request - params.consume_rate / h * dt).abs() < 1e-6);

    let mut rotten = meat.clone();
    rotten.dead = true;
    assert!(plain.feed_request(&rotten, &params, dt).is_none());
    let organism = protozoa_at(&params, &mut rng, Vector2::ZERO, 0.0).view(EntityId::default());
    assert!(plain.feed_request(&organism, &params, dt).is_none());
}

#[test]
fn mating_needs_consent_from_both_sides() {
    let params = create_test_params();
    let mut rng = test_rng();
    let mut entities: SlotMap<EntityId, Entity> = SlotMap::with_key();
    let a = entities.insert(scripted_protozoa(&params, &mut rng, Vector2::new(50.0, 50.0), 0.0, 0.0, true));
    let b = entities.insert(scripted_protozoa(&params, &mut rng, Vector2::new(52.0, 50.0), PI, 0.0, false));
    let mut events = Vec::new();

    let view_b = entities[b].view(b);
    for _ in 0..20 {
        interact(a, &mut entities[a], &view_b, &params, params.dt, &mut rng, &mut events);
    }
    let suitor = entities[a].as_protozoa().unwrap();
    assert_eq!(suitor.mate(), None);
    assert_eq!(suitor.time_mating(), 0.0);
    assert!(events.is_empty());

    entities[b]
        .as_protozoa_mut()
        .unwrap()
        .set_brain(Brain::scripted(0.0, 0.0, true));
    let view_b = entities[b].view(b);
    for _ in 0..20 {
        interact(a, &mut entities[a], &view_b, &params, params.dt, &mut rng, &mut events);
    }
    let suitor = entities[a].as_protozoa().unwrap();
    assert_eq!(suitor.mate(), Some(b));
    assert!(suitor.crossover_genome().is_some());
    let matings = events
        .iter()
        .filter(|e| matches!(e, SimulationEvent::Mated { organism, partner } if *organism == a && *partner == b))
        .count();
    assert_eq!(matings, 1);
    assert_eq!(events.len(), 1);
}
