//! Spatial chunk manager for neighbour queries.
//!
//! The tank is divided into square chunks keyed by integer coordinates.
//! Entities are re-bucketed incrementally when they cross a chunk boundary,
//! so no per-tick rebuild is needed.

use std::collections::HashMap;

use super::entity::EntityId;
use super::error::SimulationError;
use super::geometric_utils::Vector2;

/// Integer coordinates of a chunk.
pub type ChunkKey = (i32, i32);

/// Uniform grid of chunks holding entity ids.
#[derive(Debug, Clone)]
pub struct ChunkManager {
    chunk_size: f32,
    chunks: HashMap<ChunkKey, Vec<EntityId>>,
    membership: HashMap<EntityId, ChunkKey>,
}

impl Default for ChunkManager {
    fn default() -> Self {
        Self {
            chunk_size: 1.0,
            chunks: HashMap::new(),
            membership: HashMap::new(),
        }
    }
}

impl ChunkManager {
    /// Creates an empty manager.
    ///
    /// # Errors
    ///
    /// Fails when `chunk_size` is not positive.
    pub fn new(chunk_size: f32) -> Result<Self, SimulationError> {
        if !(chunk_size > 0.0 && chunk_size.is_finite()) {
            return Err(SimulationError::InvalidConfig("chunk_size must be positive"));
        }
        Ok(Self {
            chunk_size,
            ..Self::default()
        })
    }

    /// Edge length of a chunk.
    pub fn chunk_size(&self) -> f32 {
        self.chunk_size
    }

    /// Chunk containing `pos`.
    pub fn chunk_of(&self, pos: Vector2) -> ChunkKey {
        (
            (pos.x / self.chunk_size).floor() as i32,
            (pos.y / self.chunk_size).floor() as i32,
        )
    }

    /// Adds `id` at `pos`, moving it if it is already indexed.
    pub fn insert(&mut self, id: EntityId, pos: Vector2) {
        if self.membership.contains_key(&id) {
            self.update(id, pos);
            return;
        }
        let key = self.chunk_of(pos);
        self.chunks.entry(key).or_default().push(id);
        self.membership.insert(id, key);
    }

    /// Removes `id`. Returns whether it was indexed.
    pub fn remove(&mut self, id: EntityId) -> bool {
        let Some(key) = self.membership.remove(&id) else {
            return false;
        };
        self.detach(id, key);
        true
    }

    /// Moves `id` to the chunk of `pos`.
    ///
    /// The maps are only touched when the chunk changes. Returns `true` when
    /// the entity moved to another chunk. Unknown ids are inserted.
    pub fn update(&mut self, id: EntityId, pos: Vector2) -> bool {
        let key = self.chunk_of(pos);
        match self.membership.get(&id).copied() {
            Some(old) if old == key => false,
            Some(old) => {
                self.detach(id, old);
                self.chunks.entry(key).or_default().push(id);
                self.membership.insert(id, key);
                true
            }
            None => {
                self.insert(id, pos);
                true
            }
        }
    }

    fn detach(&mut self, id: EntityId, key: ChunkKey) {
        if let Some(members) = self.chunks.get_mut(&key) {
            if let Some(index) = members.iter().position(|&e| e == id) {
                members.swap_remove(index);
            }
            if members.is_empty() {
                self.chunks.remove(&key);
            }
        }
    }

    /// Ids in every chunk overlapping the square of half-width `radius` around
    /// `center`.
    ///
    /// The result is a superset of the entities within `radius`: callers
    /// filter by exact distance. Any radius is supported.
    pub fn query(&self, center: Vector2, radius: f32) -> impl Iterator<Item = EntityId> + '_ {
        self.overlapping_chunks(center, radius)
            .into_iter()
            .filter_map(|key| self.chunks.get(&key))
            .flat_map(|members| members.iter().copied())
    }

    /// Like [`ChunkManager::query`], appending into `out` after clearing it.
    pub fn query_into(&self, center: Vector2, radius: f32, out: &mut Vec<EntityId>) {
        out.clear();
        out.extend(self.query(center, radius));
    }

    fn overlapping_chunks(&self, center: Vector2, radius: f32) -> Vec<ChunkKey> {
        let radius = radius.max(0.0);
        let (min_x, min_y) = self.chunk_of(Vector2::new(center.x - radius, center.y - radius));
        let (max_x, max_y) = self.chunk_of(Vector2::new(center.x + radius, center.y + radius));
        let span = (i64::from(max_x) - i64::from(min_x) + 1) * (i64::from(max_y) - i64::from(min_y) + 1);

        if span > self.chunks.len() as i64 {
            let mut keys: Vec<ChunkKey> = self
                .chunks
                .keys()
                .copied()
                .filter(|&(x, y)| (min_x..=max_x).contains(&x) && (min_y..=max_y).contains(&y))
                .collect();
            keys.sort_unstable_by_key(|&(x, y)| (y, x));
            return keys;
        }

        let mut keys = Vec::with_capacity(span as usize);
        for y in min_y..=max_y {
            for x in min_x..=max_x {
                keys.push((x, y));
            }
        }
        keys
    }

    /// Number of indexed entities.
    pub fn len(&self) -> usize {
        self.membership.len()
    }

    /// Whether nothing is indexed.
    pub fn is_empty(&self) -> bool {
        self.membership.is_empty()
    }

    /// Number of non-empty chunks.
    pub fn chunk_count(&self) -> usize {
        self.chunks.len()
    }

    /// Whether `id` is indexed.
    pub fn contains(&self, id: EntityId) -> bool {
        self.membership.contains_key(&id)
    }

    /// Chunk currently holding `id`.
    pub fn chunk_of_entity(&self, id: EntityId) -> Option<ChunkKey> {
        self.membership.get(&id).copied()
    }

    /// Removes every entity.
    pub fn clear(&mut self) {
        self.chunks.clear();
        self.membership.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use slotmap::SlotMap;

    #[test]
    fn update_only_moves_across_chunks() {
        let mut ids: SlotMap<EntityId, ()> = SlotMap::with_key();
        let id = ids.insert(());
        let mut chunks = ChunkManager::new(10.0).expect("valid chunk size");

        chunks.insert(id, Vector2::new(1.0, 1.0));
        assert!(!chunks.update(id, Vector2::new(9.0, 9.0)));
        assert!(chunks.update(id, Vector2::new(11.0, 9.0)));
        assert_eq!(chunks.chunk_of_entity(id), Some((1, 0)));
        assert_eq!(chunks.chunk_count(), 1);

        assert!(chunks.remove(id));
        assert!(chunks.is_empty());
        assert_eq!(chunks.chunk_count(), 0);
    }

    #[test]
    fn negative_coordinates_floor() {
        let chunks = ChunkManager::new(10.0).expect("valid chunk size");
        assert_eq!(chunks.chunk_of(Vector2::new(-0.5, 5.0)), (-1, 0));
    }

    #[test]
    fn rejects_non_positive_size() {
        assert!(ChunkManager::new(0.0).is_err());
    }
}
