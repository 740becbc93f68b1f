//! Per-entity phases of a tank tick.
//!
//! [`prepare`] runs before the snapshot and only needs the entity itself.
//! [`update`] runs after it, reading neighbours through their [`BodyView`]s.

use slotmap::SecondaryMap;

use super::entity::{BodyView, Entity, EntityId, EntityKind};
use super::events::SimulationEvent;
use super::geometric_utils::clamp_to_bounds;
use super::interaction;
use super::params::Params;
use super::rng::SimRng;
use super::spatial::ChunkManager;

/// Read-only state shared by every entity during the interaction pass.
pub struct TickContext<'a> {
    /// Simulation parameters.
    pub params: &'a Params,
    /// Snapshot of every entity taken after the prepare phase.
    pub views: &'a SecondaryMap<EntityId, BodyView>,
    /// Chunk index matching the snapshot.
    pub chunks: &'a ChunkManager,
    /// Largest radius in the snapshot.
    pub max_radius: f32,
}

impl TickContext<'_> {
    /// Radius to query around `entity` so that every neighbour it can touch,
    /// crowd or sense is a candidate.
    pub fn query_radius(&self, entity: &Entity) -> f32 {
        let r = entity.body.radius();
        let physical = (3.0 * r).max(r + self.max_radius);
        match entity.kind {
            EntityKind::Protozoa(_) => physical.max(self.params.protozoa_interact_range),
            EntityKind::Pellet(_) => physical,
        }
    }
}

/// Prepare phase: ageing, growth, movement and per-tick resets.
///
/// Movement uses the speed chosen in the previous tick's think step.
pub fn prepare(entity: &mut Entity, params: &Params, dt: f32) {
    let Entity { body, kind } = entity;
    if body.is_dead() {
        return;
    }
    body.time_alive += dt;
    match kind {
        EntityKind::Protozoa(protozoa) => {
            protozoa.grow(body, params, dt);
            protozoa.reset_retina();
        }
        EntityKind::Pellet(_) => {
            let radius = body.radius() * (1.0 + body.growth_rate * dt);
            body.set_radius(radius);
        }
    }
    body.crowding_factor = 0.0;
    body.pos += body.velocity() * dt;
    body.pos = clamp_to_bounds(body.pos, body.radius(), params.tank_width, params.tank_height);
}

/// Interaction pass for one entity.
///
/// Dead entities only run their death handling. A protozoan ready to split
/// bursts and does nothing else. Otherwise the entity interacts with every
/// live neighbour, then protozoa age, think and grow their spikes while
/// pellets grow, divide or decay.
///
/// # Returns
///
/// Effects on other entities, in the order they were produced.
pub fn update(id: EntityId, entity: &mut Entity, ctx: &TickContext<'_>, rng: &mut SimRng) -> Vec<SimulationEvent> {
    let params = ctx.params;
    let dt = params.dt;
    let mut events = Vec::new();

    if entity.body.is_dead() {
        push_death(id, entity, params, rng, &mut events);
        return events;
    }

    if let EntityKind::Protozoa(protozoa) = &entity.kind
        && protozoa.should_split(&entity.body, params)
    {
        let crossed = protozoa.crossover_genome().is_some();
        let outcome = protozoa.split(&mut entity.body, params, rng);
        events.push(SimulationEvent::Burst {
            parent: id,
            crossed,
            outcome,
        });
        return events;
    }

    let Some(own) = ctx.views.get(id) else {
        return events;
    };
    let radius = ctx.query_radius(entity);
    for other_id in ctx.chunks.query(own.pos, radius) {
        if other_id == id {
            continue;
        }
        let Some(other) = ctx.views.get(other_id) else {
            continue;
        };
        if other.dead {
            continue;
        }
        interaction::interact(id, entity, other, params, dt, rng, &mut events);
    }

    let Entity { body, kind } = entity;
    let burst = match kind {
        EntityKind::Protozoa(protozoa) => {
            protozoa.age(body, params, dt);
            if !body.is_dead() {
                protozoa.think(body, params, dt);
                protozoa.update_spikes(dt);
                protozoa.reset_contacts();
            }
            None
        }
        EntityKind::Pellet(pellet) => pellet.update(body, params, dt, rng),
    };
    if let Some(outcome) = burst {
        events.push(SimulationEvent::Burst {
            parent: id,
            crossed: false,
            outcome,
        });
    }

    if entity.body.is_dead() {
        push_death(id, entity, params, rng, &mut events);
    }
    events
}

fn push_death(id: EntityId, entity: &mut Entity, params: &Params, rng: &mut SimRng, events: &mut Vec<SimulationEvent>) {
    if let Some(outcome) = entity.handle_death(params, rng) {
        events.push(SimulationEvent::Burst {
            parent: id,
            crossed: false,
            outcome,
        });
    }
}
