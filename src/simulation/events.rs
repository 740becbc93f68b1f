//! Event system for thread-safe tank updates.
//!
//! Entities mutate only themselves during the parallel interaction pass and
//! describe every effect on other entities as a [`SimulationEvent`]. The
//! events are then applied serially in a fixed order during the commit phase.

use std::collections::HashMap;

use slotmap::SlotMap;
use tracing::debug;

use super::entity::{BurstCause, BurstOutcome, Entity, EntityId, EntityKind};
use super::event_log::{EventKind, EventLog};
use super::food::Pellet;
use super::params::Params;
use super::reproduction::ReproductionStats;

/// Cross-entity effects staged during the interaction pass.
#[derive(Debug, Clone)]
pub enum SimulationEvent {
    /// A protozoan asks to eat from a pellet.
    Feed {
        /// The eater.
        consumer: EntityId,
        /// The pellet.
        food: EntityId,
        /// Mass requested this tick.
        mass: f32,
    },
    /// A spike hit another protozoan.
    Damage {
        /// The organism hit.
        target: EntityId,
        /// The organism attacking.
        attacker: EntityId,
        /// Health removed.
        amount: f32,
    },
    /// A protozoan captured its partner's genome.
    Mated {
        /// The organism that captured the genome.
        organism: EntityId,
        /// The partner.
        partner: EntityId,
    },
    /// An entity burst; its children are born at commit.
    Burst {
        /// The entity that burst.
        parent: EntityId,
        /// Whether the parent carried a mate's genome.
        crossed: bool,
        /// Children and bookkeeping.
        outcome: BurstOutcome,
    },
}

/// Queue for collecting simulation events from parallel updates.
#[derive(Debug, Default)]
pub struct EventQueue {
    events: Vec<SimulationEvent>,
}

impl EventQueue {
    /// Creates an empty event queue.
    pub fn new() -> Self {
        Self { events: Vec::new() }
    }

    /// Adds an event to the queue.
    pub fn push(&mut self, event: SimulationEvent) {
        self.events.push(event);
    }

    /// Appends a batch of events, keeping their order.
    pub fn extend(&mut self, events: impl IntoIterator<Item = SimulationEvent>) {
        self.events.extend(events);
    }

    /// Number of queued events.
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Whether the queue is empty.
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Drains all events from the queue.
    pub fn drain(&mut self) -> std::vec::Drain<'_, SimulationEvent> {
        self.events.drain(..)
    }
}

/// Tank state touched while applying events.
pub struct CommitState<'a> {
    /// All entities.
    pub entities: &'a mut SlotMap<EntityId, Entity>,
    /// Simulation parameters.
    pub params: &'a Params,
    /// Reproduction counters.
    pub reproduction: &'a mut ReproductionStats,
    /// Recent event log.
    pub log: &'a mut EventLog,
    /// Current tank time.
    pub time: f32,
}

/// Applies all queued events to the tank state.
///
/// Bursts are recorded first, then feeding is resolved first come, first
/// served in queue order: a pellet never gives away more mass than it has.
/// Damage is applied last.
///
/// # Returns
///
/// The children of every burst, to be inserted by the caller.
pub fn apply_events(state: &mut CommitState<'_>, mut queue: EventQueue) -> Vec<Entity> {
    let mut births = Vec::new();
    let mut feeds = Vec::new();
    let mut damages = Vec::new();

    for event in queue.drain() {
        match event {
            SimulationEvent::Burst {
                parent,
                crossed,
                outcome,
            } => {
                record_burst(state, parent, crossed, &outcome);
                births.extend(outcome.children);
            }
            SimulationEvent::Mated { organism, partner } => {
                state.reproduction.record_mating();
                state.log.log(
                    state.time,
                    format!("{organism:?} mated with {partner:?}"),
                    EventKind::Mating,
                );
            }
            SimulationEvent::Feed {
                consumer,
                food,
                mass,
            } => feeds.push((consumer, food, mass)),
            SimulationEvent::Damage { target, amount, .. } => damages.push((target, amount)),
        }
    }

    resolve_feeding(state, &feeds);

    for (target, amount) in damages {
        if let Some(entity) = state.entities.get_mut(target)
            && let EntityKind::Protozoa(protozoa) = &mut entity.kind
        {
            protozoa.damage(&mut entity.body, amount);
        }
    }

    births
}

fn resolve_feeding(state: &mut CommitState<'_>, feeds: &[(EntityId, EntityId, f32)]) {
    let mut remaining: HashMap<EntityId, f32> = HashMap::new();
    let mut taken: Vec<(EntityId, f32)> = Vec::new();

    for &(consumer, food, mass) in feeds {
        let Some(pellet) = state.entities.get(food) else {
            continue;
        };
        if !pellet.is_edible() {
            continue;
        }
        let nutrition = pellet.body.nutrition;
        let available = remaining
            .entry(food)
            .or_insert_with(|| pellet.body.mass(state.params));
        let granted = mass.min(*available);
        if granted <= 0.0 {
            continue;
        }

        let Some(eater) = state.entities.get_mut(consumer) else {
            continue;
        };
        if eater.body.is_dead() {
            continue;
        }
        if let EntityKind::Protozoa(protozoa) = &mut eater.kind {
            protozoa.eat(&mut eater.body, granted, nutrition, state.params);
            *available -= granted;
            taken.push((food, granted));
        }
    }

    for (food, mass) in taken {
        if let Some(pellet) = state.entities.get_mut(food)
            && !pellet.body.death_handled()
        {
            Pellet::consume(&mut pellet.body, mass, state.params);
        }
    }
}

/// Updates counters and the log for one burst.
pub fn record_burst(state: &mut CommitState<'_>, parent: EntityId, crossed: bool, outcome: &BurstOutcome) {
    state.reproduction.record_burst(outcome, crossed);
    let entry = match outcome.cause {
        BurstCause::Split => Some((
            format!("{parent:?} split into {}", outcome.children.len()),
            EventKind::Split,
        )),
        BurstCause::Decomposition => Some((format!("{parent:?} died"), EventKind::Death)),
        BurstCause::PlantSplit | BurstCause::Expired => None,
    };
    if let Some((description, kind)) = entry {
        state.log.log(state.time, description, kind);
    }
    if outcome.miscarriages > 0 {
        debug!(?parent, miscarriages = outcome.miscarriages, "offspring miscarried");
        state.log.log(
            state.time,
            format!("{parent:?} lost {} offspring", outcome.miscarriages),
            EventKind::Miscarriage,
        );
    }
}
