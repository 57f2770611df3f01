use super::PrimitiveId;

/// Ordered set of live primitives. The position of a primitive in this sequence is its slot in every GPU buffer.
#[derive(Clone, Debug, Default)]
pub struct Registry {
    slots: Vec<PrimitiveId>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends the primitive to the end of the sequence.
    /// - Returns false and changes nothing when it is already registered.
    pub fn register(&mut self, id: PrimitiveId) -> bool {
        if self.slots.contains(&id) {
            return false;
        }
        self.slots.push(id);
        true
    }

    /// Removes the primitive, every following primitive moves one slot down.
    /// - Returns false when it was not registered.
    pub fn deregister(&mut self, id: PrimitiveId) -> bool {
        let Some(slot) = self.slot_of(id) else {
            return false;
        };
        self.slots.remove(slot);
        true
    }

    pub fn slot_of(&self, id: PrimitiveId) -> Option<usize> {
        self.slots.iter().position(|registered| *registered == id)
    }

    pub fn contains(&self, id: PrimitiveId) -> bool {
        self.slots.contains(&id)
    }

    pub fn iter(&self) -> impl Iterator<Item = PrimitiveId> + '_ {
        self.slots.iter().copied()
    }

    pub fn as_slice(&self) -> &[PrimitiveId] {
        &self.slots
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use slotmap::SlotMap;

    use super::*;

    fn ids(count: usize) -> Vec<PrimitiveId> {
        let mut keys = SlotMap::<PrimitiveId, ()>::with_key();
        (0..count).map(|_| keys.insert(())).collect()
    }

    #[test]
    fn registration_preserves_order_and_ignores_duplicates() {
        let ids = ids(3);
        let mut registry = Registry::new();

        assert!(registry.register(ids[0]));
        assert!(registry.register(ids[1]));
        assert!(!registry.register(ids[0]));
        assert!(registry.register(ids[2]));

        assert_eq!(registry.as_slice(), &ids[..]);
    }

    #[test]
    fn removal_shifts_following_slots_down() {
        let ids = ids(3);
        let mut registry = Registry::new();
        ids.iter().for_each(|id| { registry.register(*id); });

        assert!(registry.deregister(ids[1]));

        assert_eq!(registry.slot_of(ids[0]), Some(0));
        assert_eq!(registry.slot_of(ids[2]), Some(1));
        assert_eq!(registry.slot_of(ids[1]), None);
    }

    #[test]
    fn removing_absent_primitive_is_a_no_op() {
        let ids = ids(2);
        let mut registry = Registry::new();
        registry.register(ids[0]);

        assert!(!registry.deregister(ids[1]));
        assert!(registry.deregister(ids[0]));
        assert!(!registry.deregister(ids[0]));
        assert!(registry.is_empty());
    }
}
