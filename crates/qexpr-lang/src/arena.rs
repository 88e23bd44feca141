use std::{
    fmt,
    marker::PhantomData,
    ops::{Index, IndexMut},
};

/// A type-safe identifier for elements stored in an [`Arena`].
///
/// Uses phantom data so that an `ArenaId<A>` cannot index an `Arena<B>`;
/// compilation unit ids and constant-pool ids are both arena ids and must
/// never be confused.
pub struct ArenaId<T> {
    id: u32,
    _phantom_data: PhantomData<fn() -> T>,
}

impl<T> Copy for ArenaId<T> {}

impl<T> Clone for ArenaId<T> {
    #[inline(always)]
    fn clone(&self) -> ArenaId<T> {
        *self
    }
}

impl<T> PartialEq for ArenaId<T> {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl<T> Eq for ArenaId<T> {}

impl<T> std::hash::Hash for ArenaId<T> {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl<T> fmt::Debug for ArenaId<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ArenaId({})", self.id)
    }
}

impl<T> fmt::Display for ArenaId<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.id)
    }
}

impl<T> From<u32> for ArenaId<T> {
    fn from(id: u32) -> Self {
        Self::new(id)
    }
}

impl<T> From<usize> for ArenaId<T> {
    fn from(id: usize) -> Self {
        Self::new(id as u32)
    }
}

impl<T> ArenaId<T> {
    /// Creates a new arena identifier from a raw `u32` index.
    pub const fn new(id: u32) -> ArenaId<T> {
        Self {
            id,
            _phantom_data: PhantomData,
        }
    }

    /// Returns the position of the element inside its arena.
    #[inline(always)]
    pub const fn index(self) -> usize {
        self.id as usize
    }
}

/// An append-only arena.
///
/// Elements are allocated sequentially and addressed by [`ArenaId`]s that stay
/// valid for the arena's lifetime; ids are never reused.
#[derive(Debug, Clone)]
pub struct Arena<T> {
    items: Vec<T>,
}

impl<T> Default for Arena<T> {
    fn default() -> Self {
        Self { items: Vec::new() }
    }
}

impl<T> Arena<T> {
    /// Creates a new arena with the specified initial capacity.
    pub fn new(size: usize) -> Self {
        Arena {
            items: Vec::with_capacity(size),
        }
    }

    /// Allocates a value in the arena and returns its identifier.
    pub fn alloc(&mut self, value: T) -> ArenaId<T> {
        let arena_id = self.items.len() as u32;
        self.items.push(value);
        ArenaId::new(arena_id)
    }

    /// Returns the number of elements in the arena.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Returns `true` if the arena contains no elements.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns a reference to the element at the given `ArenaId`, or `None` if out of bounds.
    pub fn get(&self, id: ArenaId<T>) -> Option<&T> {
        self.items.get(id.index())
    }

    pub fn iter(&self) -> impl Iterator<Item = (ArenaId<T>, &T)> {
        self.items
            .iter()
            .enumerate()
            .map(|(i, item)| (ArenaId::new(i as u32), item))
    }
}

impl<T> Index<ArenaId<T>> for Arena<T> {
    type Output = T;

    fn index(&self, index: ArenaId<T>) -> &Self::Output {
        &self.items[index.index()]
    }
}

impl<T> IndexMut<ArenaId<T>> for Arena<T> {
    fn index_mut(&mut self, index: ArenaId<T>) -> &mut Self::Output {
        &mut self.items[index.index()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(vec![1, 2, 3], 1, Some(2))]
    #[case(vec![1, 2, 3], 0, Some(1))]
    #[case(vec![1, 2, 3], 3, None)]
    fn test_get(#[case] values: Vec<i32>, #[case] index: u32, #[case] expected: Option<i32>) {
        let mut arena = Arena::new(values.len());
        for v in values {
            arena.alloc(v);
        }
        assert_eq!(arena.get(ArenaId::new(index)).copied(), expected);
    }

    #[test]
    fn test_ids_are_sequential_and_stable() {
        let mut arena = Arena::default();
        let first = arena.alloc("a");
        let second = arena.alloc("b");
        assert_eq!(first.index(), 0);
        assert_eq!(second.index(), 1);
        arena[first] = "c";
        assert_eq!(arena[first], "c");
        assert_eq!(arena[second], "b");
        assert_eq!(arena.len(), 2);
        assert!(!arena.is_empty());
    }

    #[test]
    fn test_iter_yields_ids() {
        let mut arena = Arena::new(2);
        arena.alloc(10);
        arena.alloc(20);
        let ids: Vec<_> = arena.iter().map(|(id, v)| (id.index(), *v)).collect();
        assert_eq!(ids, vec![(0, 10), (1, 20)]);
    }
}
