use hashbrown::HashMap;

use crate::chunk::{ChunkKey, RenderChunk};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ChunkCacheStats {
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
    pub entries: usize,
}

struct CacheSlot {
    chunk: RenderChunk,
    last_access: u64,
}

/// Render-thread cache of chunk geometry keyed by (node, floor).
///
/// Access frames drive eviction only; whether the geometry is current is
/// decided by comparing the chunk's stamp with the node's.
#[derive(Default)]
pub struct ChunkCache {
    slots: HashMap<ChunkKey, CacheSlot>,
    hits: u64,
    misses: u64,
    evictions: u64,
}

impl ChunkCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&mut self, key: ChunkKey, frame: u64) -> Option<&mut RenderChunk> {
        match self.slots.get_mut(&key) {
            Some(slot) => {
                self.hits += 1;
                slot.last_access = frame;
                Some(&mut slot.chunk)
            }
            None => {
                self.misses += 1;
                None
            }
        }
    }

    /// Returns the slot for `key`, allocating an unbuilt one on a miss.
    pub fn get_or_create(&mut self, key: ChunkKey, frame: u64) -> &mut RenderChunk {
        if self.slots.contains_key(&key) {
            self.hits += 1;
        } else {
            self.misses += 1;
        }
        let slot = self.slots.entry(key).or_insert_with(|| CacheSlot {
            chunk: RenderChunk::new(key),
            last_access: frame,
        });
        slot.last_access = frame;
        &mut slot.chunk
    }

    /// Lookup that does not count as an access.
    pub fn peek_mut(&mut self, key: ChunkKey) -> Option<&mut RenderChunk> {
        self.slots.get_mut(&key).map(|s| &mut s.chunk)
    }

    pub fn contains(&self, key: ChunkKey) -> bool {
        self.slots.contains_key(&key)
    }

    pub fn last_access(&self, key: ChunkKey) -> Option<u64> {
        self.slots.get(&key).map(|s| s.last_access)
    }

    pub fn invalidate(&mut self, key: ChunkKey) -> bool {
        let removed = self.slots.remove(&key).is_some();
        if removed {
            self.evictions += 1;
        }
        removed
    }

    pub fn clear(&mut self) {
        self.evictions += self.slots.len() as u64;
        self.slots.clear();
    }

    /// Evicts every entry not touched within `max_age` frames. A frame
    /// counter behind an entry's access frame also evicts it.
    pub fn prune(&mut self, frame: u64, max_age: u64) -> usize {
        let before = self.slots.len();
        self.slots.retain(|_, slot| {
            frame >= slot.last_access && frame - slot.last_access <= max_age
        });
        let removed = before - self.slots.len();
        self.evictions += removed as u64;
        removed
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn stats(&self) -> ChunkCacheStats {
        ChunkCacheStats {
            hits: self.hits,
            misses: self.misses,
            evictions: self.evictions,
            entries: self.slots.len(),
        }
    }
}
