//! The tank: owner of every entity and driver of the tick.
//!
//! A tick runs in five phases:
//! 1. prepare every entity in parallel (growth, movement, resets)
//! 2. re-index moved entities in the chunk manager
//! 3. snapshot every entity into a read-only [`BodyView`]
//! 4. run the interaction pass in parallel, each entity touching only itself
//! 5. commit staged events, deaths and births serially in a fixed order
//!
//! All randomness is derived from `(seed, tick, entity)`, so a run is
//! reproducible regardless of how rayon schedules the parallel phases.

use std::path::Path;

use rand::Rng;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use slotmap::{Key, SecondaryMap, SlotMap};
use tracing::{debug, info, warn};

use super::entity::{BodyView, Entity, EntityId, Stats};
use super::error::SimulationError;
use super::event_log::EventLog;
use super::events::{self, CommitState, EventQueue};
use super::food::{FoodType, Pellet};
use super::geometric_utils::{Vector2, clamp_to_bounds};
use super::lifecycle::{self, TickContext};
use super::organism::Protozoa;
use super::params::Params;
use super::reproduction::ReproductionStats;
use super::rng::{COMMIT_STREAM, SimRng, create_rng, derive_rng};
use super::spatial::ChunkManager;

/// Population counts by entity kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Census {
    /// Living protozoa.
    pub protozoa: usize,
    /// Plant pellets.
    pub plants: usize,
    /// Meat pellets.
    pub meat: usize,
}

/// Saved tank together with the wall-clock time it was saved at.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Snapshot {
    /// RFC 3339 timestamp of the save.
    pub saved_at: String,
    /// The saved tank.
    pub tank: Tank,
}

/// The simulated tank.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tank {
    params: Params,
    entities: SlotMap<EntityId, Entity>,
    #[serde(skip)]
    chunks: ChunkManager,
    time: f32,
    tick: u64,
    reproduction: ReproductionStats,
    log: EventLog,
}

impl Tank {
    /// Creates a tank seeded with random protozoa and plants.
    ///
    /// # Errors
    ///
    /// Fails when `params` does not validate.
    pub fn new(params: Params) -> Result<Self, SimulationError> {
        let mut tank = Self::empty(params)?;
        let mut rng = create_rng(tank.params.seed);

        for _ in 0..tank.params.initial_plants {
            let plant = Pellet::new_random_plant(&tank.params, &mut rng);
            tank.add(plant);
        }
        let founders = tank.params.initial_protozoa;
        tank.spawn_protozoa(founders, &mut rng);

        info!(
            protozoa = founders,
            plants = tank.params.initial_plants,
            seed = tank.params.seed,
            "tank created"
        );
        Ok(tank)
    }

    /// Creates a tank with no entities.
    ///
    /// # Errors
    ///
    /// Fails when `params` does not validate.
    pub fn empty(params: Params) -> Result<Self, SimulationError> {
        params.validate()?;
        Ok(Self {
            chunks: ChunkManager::new(params.chunk_size)?,
            entities: SlotMap::with_key(),
            time: 0.0,
            tick: 0,
            reproduction: ReproductionStats::default(),
            log: EventLog::new(params.event_log_size),
            params,
        })
    }

    /// Adds an entity and indexes it.
    pub fn add(&mut self, entity: Entity) -> EntityId {
        let pos = entity.body.pos;
        let id = self.entities.insert(entity);
        self.chunks.insert(id, pos);
        id
    }

    /// Removes an entity.
    pub fn remove(&mut self, id: EntityId) -> Option<Entity> {
        self.chunks.remove(id);
        self.entities.remove(id)
    }

    /// Looks up an entity.
    pub fn get(&self, id: EntityId) -> Option<&Entity> {
        self.entities.get(id)
    }

    /// Mutable access to an entity. Call [`Tank::reindex`] after moving it by
    /// hand if queries are made before the next step.
    pub fn get_mut(&mut self, id: EntityId) -> Option<&mut Entity> {
        self.entities.get_mut(id)
    }

    /// Moves an entity and updates the index.
    pub fn set_position(&mut self, id: EntityId, pos: Vector2) -> bool {
        let Some(entity) = self.entities.get_mut(id) else {
            return false;
        };
        entity.body.pos = pos;
        self.chunks.update(id, pos);
        true
    }

    /// Brings the chunk index up to date with every entity position.
    pub fn reindex(&mut self) {
        for (id, entity) in &self.entities {
            self.chunks.update(id, entity.body.pos);
        }
    }

    /// Iterates over every entity.
    pub fn entities(&self) -> impl Iterator<Item = (EntityId, &Entity)> {
        self.entities.iter()
    }

    /// Number of entities.
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    /// Whether the tank holds no entities.
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Ids of entities in chunks overlapping the square around `center`.
    pub fn query(&self, center: Vector2, radius: f32) -> impl Iterator<Item = EntityId> + '_ {
        self.chunks.query(center, radius)
    }

    /// The chunk manager.
    pub fn chunks(&self) -> &ChunkManager {
        &self.chunks
    }

    /// Simulation parameters.
    pub fn params(&self) -> &Params {
        &self.params
    }

    /// Simulated seconds elapsed.
    pub fn time(&self) -> f32 {
        self.time
    }

    /// Ticks elapsed.
    pub fn tick(&self) -> u64 {
        self.tick
    }

    /// Reproduction counters.
    pub fn reproduction_stats(&self) -> &ReproductionStats {
        &self.reproduction
    }

    /// Recent notable events.
    pub fn event_log(&self) -> &EventLog {
        &self.log
    }

    /// Counts entities by kind.
    pub fn census(&self) -> Census {
        let mut census = Census::default();
        for entity in self.entities.values() {
            match (entity.as_protozoa(), entity.food_type()) {
                (Some(_), _) => census.protozoa += 1,
                (None, Some(FoodType::Plant)) => census.plants += 1,
                (None, Some(FoodType::Meat)) => census.meat += 1,
                (None, None) => {}
            }
        }
        census
    }

    /// HUD statistics of one entity.
    pub fn stats(&self, id: EntityId) -> Option<Stats> {
        self.entities.get(id).map(|e| e.stats(&self.params))
    }

    /// Advances the tank by one tick of `params.dt` seconds.
    pub fn step(&mut self) {
        let params = &self.params;
        let dt = params.dt;
        let seed = params.seed;
        let tick = self.tick;

        // prepare
        self.entities
            .values_mut()
            .collect::<Vec<_>>()
            .into_par_iter()
            .for_each(|entity| lifecycle::prepare(entity, params, dt));

        // re-index
        for (id, entity) in &self.entities {
            self.chunks.update(id, entity.body.pos);
        }

        // snapshot
        let mut views: SecondaryMap<EntityId, BodyView> = SecondaryMap::with_capacity(self.entities.len());
        let mut max_radius: f32 = 0.0;
        for (id, entity) in &self.entities {
            max_radius = max_radius.max(entity.body.radius());
            views.insert(id, entity.view(id));
        }

        // interaction pass
        let ctx = TickContext {
            params,
            views: &views,
            chunks: &self.chunks,
            max_radius,
        };
        let staged: Vec<_> = self
            .entities
            .iter_mut()
            .collect::<Vec<_>>()
            .into_par_iter()
            .map(|(id, entity)| {
                let mut rng = derive_rng(seed, tick, id.data().as_ffi());
                lifecycle::update(id, entity, &ctx, &mut rng)
            })
            .collect();

        let mut queue = EventQueue::new();
        for events in staged {
            queue.extend(events);
        }
        self.commit(queue);
    }

    fn commit(&mut self, queue: EventQueue) {
        let mut rng = derive_rng(self.params.seed, self.tick, COMMIT_STREAM);
        let mut state = CommitState {
            entities: &mut self.entities,
            params: &self.params,
            reproduction: &mut self.reproduction,
            log: &mut self.log,
            time: self.time,
        };
        let mut births = events::apply_events(&mut state, queue);

        // deaths caused by the commit itself (damage, eaten pellets)
        let dead: Vec<EntityId> = state
            .entities
            .iter()
            .filter(|(_, e)| e.body.is_dead())
            .map(|(id, _)| id)
            .collect();
        for &id in &dead {
            let outcome = state
                .entities
                .get_mut(id)
                .and_then(|entity| entity.handle_death(state.params, &mut rng));
            if let Some(outcome) = outcome {
                events::record_burst(&mut state, id, false, &outcome);
                births.extend(outcome.children);
            }
        }
        for id in dead {
            self.remove(id);
        }
        // collisions moved bodies during the interaction pass
        self.reindex();

        let born = births.len();
        for mut child in births {
            if self.entities.len() >= self.params.max_entities {
                self.reproduction.dropped_births += 1;
                continue;
            }
            child.body.pos = clamp_to_bounds(
                child.body.pos,
                child.body.radius(),
                self.params.tank_width,
                self.params.tank_height,
            );
            self.add(child);
        }
        if born > 0 {
            debug!(tick = self.tick, born, "births committed");
        }

        self.top_up(&mut rng);

        self.time += self.params.dt;
        self.tick += 1;
    }

    /// Spawns plants and protozoa while below their minimum counts.
    fn top_up(&mut self, rng: &mut SimRng) {
        let census = self.census();

        if census.plants < self.params.min_plants {
            let expected = self.params.plant_spawn_rate * self.params.dt;
            let mut count = expected.floor() as usize;
            if rng.random::<f32>() < expected.fract() {
                count += 1;
            }
            count = count.min(self.params.min_plants - census.plants);
            for _ in 0..count {
                if self.entities.len() >= self.params.max_entities {
                    break;
                }
                let plant = Pellet::new_random_plant(&self.params, rng);
                self.add(plant);
            }
        }

        if census.protozoa < self.params.min_protozoa {
            self.spawn_protozoa(self.params.min_protozoa - census.protozoa, rng);
        }
    }

    fn spawn_protozoa(&mut self, count: usize, rng: &mut SimRng) {
        for _ in 0..count {
            if self.entities.len() >= self.params.max_entities {
                break;
            }
            match Protozoa::new_random(&self.params, rng) {
                Ok(entity) => {
                    self.add(entity);
                }
                Err(err) => warn!(%err, "random founder could not be expressed"),
            }
        }
    }

    /// Encodes the tank as opaque bytes.
    ///
    /// # Errors
    ///
    /// Fails when serialization fails.
    pub fn to_bytes(&self) -> Result<Vec<u8>, SimulationError> {
        Ok(serde_json::to_vec(self)?)
    }

    /// Decodes a tank from [`Tank::to_bytes`] output, rebuilding the chunk index.
    ///
    /// # Errors
    ///
    /// Fails when the bytes do not decode or the parameters do not validate.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, SimulationError> {
        let tank: Tank = serde_json::from_slice(bytes)?;
        tank.restored()
    }

    /// Saves the tank to a JSON file.
    ///
    /// # Errors
    ///
    /// Fails on I/O or serialization errors.
    pub fn save_to_file(&self, path: impl AsRef<Path>) -> Result<(), SimulationError> {
        let snapshot = Snapshot {
            saved_at: chrono::Utc::now().to_rfc3339(),
            tank: self.clone(),
        };
        let json = serde_json::to_string_pretty(&snapshot)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Loads a tank saved with [`Tank::save_to_file`].
    ///
    /// # Errors
    ///
    /// Fails on I/O or decoding errors, or when the parameters do not validate.
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Self, SimulationError> {
        let json = std::fs::read_to_string(path)?;
        let snapshot: Snapshot = serde_json::from_str(&json)?;
        info!(saved_at = %snapshot.saved_at, tick = snapshot.tank.tick, "tank loaded");
        snapshot.tank.restored()
    }

    fn restored(mut self) -> Result<Self, SimulationError> {
        self.params.validate()?;
        self.chunks = ChunkManager::new(self.params.chunk_size)?;
        for (id, entity) in &self.entities {
            self.chunks.insert(id, entity.body.pos);
        }
        Ok(self)
    }
}
