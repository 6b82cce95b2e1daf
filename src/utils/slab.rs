//! Generational slab used as the unit arena.
//!
//! Slots are reused once freed, but every removal bumps the slot generation so
//! a key that outlived its value never resolves to whatever was stored next.

pub(crate) struct Slab<T> {
    entries: Vec<Entry<T>>,
    free: Vec<usize>,
    len: usize,
}

struct Entry<T> {
    generation: u64,
    value: Option<T>,
}

impl<T> Slab<T> {
    pub(crate) fn new() -> Self {
        Self {
            entries: Vec::new(),
            free: Vec::new(),
            len: 0,
        }
    }

    /// Stores `value` and returns its `(index, generation)` key.
    pub(crate) fn insert(&mut self, value: T) -> (usize, u64) {
        self.len += 1;

        if let Some(index) = self.free.pop() {
            let entry = &mut self.entries[index];
            entry.value = Some(value);
            return (index, entry.generation);
        }

        self.entries.push(Entry {
            generation: 0,
            value: Some(value),
        });

        (self.entries.len() - 1, 0)
    }

    pub(crate) fn get(&self, index: usize, generation: u64) -> Option<&T> {
        self.entries
            .get(index)
            .filter(|entry| entry.generation == generation)
            .and_then(|entry| entry.value.as_ref())
    }

    pub(crate) fn get_mut(&mut self, index: usize, generation: u64) -> Option<&mut T> {
        self.entries
            .get_mut(index)
            .filter(|entry| entry.generation == generation)
            .and_then(|entry| entry.value.as_mut())
    }

    pub(crate) fn remove(&mut self, index: usize, generation: u64) -> Option<T> {
        let entry = self.entries.get_mut(index)?;
        if entry.generation != generation {
            return None;
        }

        let value = entry.value.take()?;
        entry.generation += 1;
        self.free.push(index);
        self.len -= 1;

        Some(value)
    }

    /// Empties the slab, handing every stored value back to the caller.
    ///
    /// Values are returned rather than dropped in place so that their
    /// destructors may touch the slab again.
    pub(crate) fn take_all(&mut self) -> Vec<T> {
        let mut values = Vec::with_capacity(self.len);

        for (index, entry) in self.entries.iter_mut().enumerate() {
            if let Some(value) = entry.value.take() {
                entry.generation += 1;
                self.free.push(index);
                values.push(value);
            }
        }

        self.len = 0;
        values
    }

    pub(crate) fn len(&self) -> usize {
        self.len
    }
}
