use crate::error::{CelError, CelResult};
use crate::value::{Value, VectorId};

/// The value arena. Every vector and panic is a slot here, addressed by
/// VectorId. Slots are never reclaimed; the arena only grows.
pub struct Heap {
    slots: Vec<Vec<Value>>,
    capacity: usize,
}

impl Heap {
    pub fn new(capacity: usize) -> Self {
        Heap {
            slots: Vec::with_capacity(capacity.min(1024)),
            capacity,
        }
    }

    /// Allocate an empty sequence.
    /// Returns Err(ArenaOverflow) if capacity is exceeded.
    pub fn alloc(&mut self) -> CelResult<VectorId> {
        self.alloc_from(&[])
    }

    /// Allocate a sequence holding a copy of `values`.
    pub fn alloc_from(&mut self, values: &[Value]) -> CelResult<VectorId> {
        if self.slots.len() >= self.capacity {
            return Err(CelError::ArenaOverflow(self.capacity));
        }
        let id = VectorId(self.slots.len() as u32);
        self.slots.push(values.to_vec());
        Ok(id)
    }

    /// Append one value to a sequence under construction.
    #[inline]
    pub fn push(&mut self, id: VectorId, value: Value) {
        self.slots[id.0 as usize].push(value);
    }

    /// Append every element of `src` to `dest`.
    pub fn concat(&mut self, dest: VectorId, src: VectorId) {
        let tail = self.slots[src.0 as usize].clone();
        self.slots[dest.0 as usize].extend(tail);
    }

    /// The elements of a sequence.
    #[inline]
    pub fn get(&self, id: VectorId) -> &[Value] {
        &self.slots[id.0 as usize]
    }

    /// Element `index` of a sequence, if in range.
    #[inline]
    pub fn nth(&self, id: VectorId, index: usize) -> Option<Value> {
        self.slots[id.0 as usize].get(index).copied()
    }

    #[inline]
    pub fn len(&self, id: VectorId) -> usize {
        self.slots[id.0 as usize].len()
    }

    /// Build a vector from an iterator of values.
    pub fn vector_from_iter(&mut self, iter: impl IntoIterator<Item = Value>) -> CelResult<Value> {
        let items: Vec<_> = iter.into_iter().collect();
        Ok(Value::Vector(self.alloc_from(&items)?))
    }

    /// Returns the number of allocated slots.
    pub fn total_vectors(&self) -> usize {
        self.slots.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn append_and_concat_grow_in_place() {
        let mut heap = Heap::new(16);
        let a = heap.alloc().unwrap();
        heap.push(a, Value::Number(1));
        let b = heap.alloc_from(&[Value::Number(2), Value::Number(3)]).unwrap();
        heap.concat(a, b);
        assert_eq!(
            heap.get(a),
            &[Value::Number(1), Value::Number(2), Value::Number(3)]
        );
        assert_eq!(heap.len(b), 2);
        assert_eq!(heap.nth(a, 2), Some(Value::Number(3)));
        assert_eq!(heap.nth(a, 3), None);
    }

    #[test]
    fn concat_with_itself_doubles() {
        let mut heap = Heap::new(4);
        let a = heap.alloc_from(&[Value::Number(7)]).unwrap();
        heap.concat(a, a);
        assert_eq!(heap.get(a), &[Value::Number(7), Value::Number(7)]);
    }

    #[test]
    fn overflow_is_reported() {
        let mut heap = Heap::new(2);
        heap.alloc().unwrap();
        heap.alloc().unwrap();
        assert!(matches!(heap.alloc(), Err(CelError::ArenaOverflow(2))));
        assert_eq!(heap.total_vectors(), 2);
    }
}
