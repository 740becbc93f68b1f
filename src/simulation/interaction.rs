//! Pairwise interaction between an entity and one of its neighbours.
//!
//! An entity only ever changes its own state here. Effects on the neighbour
//! (damage, feeding) are pushed as [`SimulationEvent`]s.

use super::entity::{Body, BodyView, Entity, EntityId, EntityKind};
use super::events::SimulationEvent;
use super::params::Params;
use super::rng::SimRng;

/// Adds the crowding contribution of `other` when it is within three radii.
pub fn accumulate_crowding(body: &mut Body, other: &BodyView) {
    let d2 = body.pos.distance2_to(other.pos);
    let reach = 3.0 * body.radius();
    if d2 < reach * reach {
        body.crowding_factor += other.radius / (body.radius() + d2);
    }
}

/// Pushes `body` out of `other` when they overlap and `body` is the one that
/// yields.
///
/// The entity with the lower momentum moves; on a tie the larger id moves.
/// The mover ends exactly tangent to `other`, along the line of centres, or
/// along its own facing direction when the centres coincide.
///
/// # Returns
///
/// `true` if `body` was moved.
pub fn resolve_collision(id: EntityId, body: &mut Body, other: &BodyView) -> bool {
    if !body.is_colliding_with(other) {
        return false;
    }
    let mine = body.momentum();
    let theirs = other.momentum();
    let yields = mine < theirs || (mine == theirs && id > other.id);
    if !yields {
        return false;
    }
    let offset = body.pos - other.pos;
    let dir = offset.unit().unwrap_or_else(|| body.dir());
    body.pos = other.pos + dir * (body.radius() + other.radius);
    true
}

/// Runs every interaction step of `entity` against `other`.
///
/// # Arguments
///
/// * `id` - Handle of the acting entity
/// * `entity` - The acting entity, mutated in place
/// * `other` - Snapshot of the neighbour
/// * `params` - Simulation parameters
/// * `dt` - Time step
/// * `rng` - Random stream of the acting entity
/// * `events` - Sink for effects on the neighbour
pub fn interact(
    id: EntityId,
    entity: &mut Entity,
    other: &BodyView,
    params: &Params,
    dt: f32,
    rng: &mut SimRng,
    events: &mut Vec<SimulationEvent>,
) {
    let Entity { body, kind } = entity;
    accumulate_crowding(body, other);
    resolve_collision(id, body, other);

    let EntityKind::Protozoa(protozoa) = kind else {
        return;
    };
    let range = params.protozoa_interact_range;
    if body.pos.distance2_to(other.pos) > range * range {
        return;
    }

    protozoa.sense_contact(body, other);
    protozoa.see(body, other, params);

    if other.organism.is_some() {
        let amount = protozoa.attack(body, other, params, dt, rng);
        if amount > 0.0 {
            events.push(SimulationEvent::Damage {
                target: other.id,
                attacker: id,
                amount,
            });
        }
    }

    if !body.is_touching(other) {
        return;
    }

    if let Some(organism) = &other.organism
        && organism.wants_to_mate
        && protozoa.brain().want_to_mate_with(other)
        && protozoa.register_mating_tick(other.id, &organism.genome, dt, params.mating_time)
    {
        events.push(SimulationEvent::Mated {
            organism: id,
            partner: other.id,
        });
    }

    if let Some(mass) = protozoa.feed_request(other, params, dt) {
        events.push(SimulationEvent::Feed {
            consumer: id,
            food: other.id,
            mass,
        });
    }
}
