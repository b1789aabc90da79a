// Project libraries.
use crate::query::TypeId;
use crate::types::PendingRequestRegistry;

impl PendingRequestRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark `type_id` outstanding and return the generation of the new marker, or `None` if it already was, in which
    /// case no new request must be issued.
    pub fn mark(&mut self, type_id: TypeId) -> Option<u64> {
        if self.outstanding.contains_key(&type_id) {
            return None;
        }
        let generation = self.next_generation;
        self.next_generation += 1;
        self.outstanding.insert(type_id, generation);
        Some(generation)
    }

    /// Mark every id not already outstanding and not rejected by `skip`, returning the newly marked ones with their
    /// generations, in input order. Duplicates in `type_ids` are marked once.
    pub fn mark_all(&mut self, type_ids: &[TypeId], skip: impl Fn(TypeId) -> bool) -> Vec<(TypeId, u64)> {
        let mut marked = Vec::new();
        for type_id in type_ids {
            if skip(*type_id) {
                continue;
            }
            if let Some(generation) = self.mark(*type_id) {
                marked.push((*type_id, generation));
            }
        }
        marked
    }

    /// Drop the marker because an answer arrived, whichever request it belonged to.
    pub fn settle(&mut self, type_id: TypeId) -> bool {
        self.outstanding.remove(&type_id).is_some()
    }

    /// Drop the marker of a request that never left. A marker set since then by someone else is kept.
    pub fn rollback(&mut self, type_id: TypeId, generation: u64) -> bool {
        if self.outstanding.get(&type_id) == Some(&generation) {
            self.outstanding.remove(&type_id);
            true
        } else {
            false
        }
    }

    pub fn is_outstanding(&self, type_id: TypeId) -> bool {
        self.outstanding.contains_key(&type_id)
    }

    pub fn len(&self) -> usize {
        self.outstanding.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outstanding.is_empty()
    }

    /// Generations keep counting across a clear, so a marker set afterwards never matches an older one.
    pub fn clear(&mut self) {
        self.outstanding.clear();
    }
}
