//! Generational Arena
//!
//! Slot storage for tree nodes. Removing an item bumps the slot's
//! generation, so indices handed out before the removal stop resolving
//! instead of aliasing whatever is stored in the slot next.

/// Index with generation for use-after-free detection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GenIndex {
    pub index: u32,
    pub generation: u32,
}

/// Arena with generational indices
#[derive(Debug)]
pub struct GenArena<T> {
    items: Vec<Option<(T, u32)>>,
    free_list: Vec<u32>,
    generations: Vec<u32>,
}

impl<T> GenArena<T> {
    pub fn new() -> Self {
        Self {
            items: Vec::new(),
            free_list: Vec::new(),
            generations: Vec::new(),
        }
    }

    /// Insert item
    pub fn insert(&mut self, value: T) -> GenIndex {
        if let Some(index) = self.free_list.pop() {
            let generation = self.generations[index as usize];
            self.items[index as usize] = Some((value, generation));
            GenIndex { index, generation }
        } else {
            let index = self.items.len() as u32;
            self.items.push(Some((value, 0)));
            self.generations.push(0);
            GenIndex { index, generation: 0 }
        }
    }

    /// Get item
    pub fn get(&self, idx: GenIndex) -> Option<&T> {
        self.items
            .get(idx.index as usize)
            .and_then(|opt| opt.as_ref())
            .filter(|(_, g)| *g == idx.generation)
            .map(|(val, _)| val)
    }

    /// Get item mutably
    pub fn get_mut(&mut self, idx: GenIndex) -> Option<&mut T> {
        self.items
            .get_mut(idx.index as usize)
            .and_then(|opt| opt.as_mut())
            .filter(|(_, g)| *g == idx.generation)
            .map(|(val, _)| val)
    }

    pub fn contains(&self, idx: GenIndex) -> bool {
        self.get(idx).is_some()
    }

    /// Remove item
    pub fn remove(&mut self, idx: GenIndex) -> Option<T> {
        let slot = self.items.get_mut(idx.index as usize)?;
        if !matches!(slot, Some((_, g)) if *g == idx.generation) {
            return None;
        }
        let (val, _) = slot.take()?;
        self.generations[idx.index as usize] += 1;
        self.free_list.push(idx.index);
        Some(val)
    }

    pub fn len(&self) -> usize {
        self.items.iter().filter(|i| i.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Live items with their indices, in slot order
    pub fn iter(&self) -> impl Iterator<Item = (GenIndex, &T)> {
        self.items.iter().enumerate().filter_map(|(i, slot)| {
            slot.as_ref().map(|(val, generation)| {
                (
                    GenIndex {
                        index: i as u32,
                        generation: *generation,
                    },
                    val,
                )
            })
        })
    }
}

impl<T> Default for GenArena<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gen_arena() {
        let mut arena = GenArena::new();
        let idx = arena.insert(42);

        assert_eq!(arena.get(idx), Some(&42));
        arena.remove(idx);
        assert_eq!(arena.get(idx), None);
    }

    #[test]
    fn test_slot_reuse_bumps_generation() {
        let mut arena = GenArena::new();
        let a = arena.insert("a");
        arena.remove(a);
        let b = arena.insert("b");

        assert_eq!(a.index, b.index);
        assert_ne!(a.generation, b.generation);
        assert_eq!(arena.get(a), None);
        assert_eq!(arena.get(b), Some(&"b"));
        assert_eq!(arena.remove(a), None);
        assert_eq!(arena.len(), 1);
    }

    #[test]
    fn test_iter_skips_free_slots() {
        let mut arena = GenArena::new();
        let a = arena.insert(1);
        let _b = arena.insert(2);
        arena.remove(a);
        let values: Vec<i32> = arena.iter().map(|(_, v)| *v).collect();
        assert_eq!(values, vec![2]);
    }
}
