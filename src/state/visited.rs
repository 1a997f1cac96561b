use std::collections::HashSet;

/// Ids whose references and citations have been expanded
///
/// Besides membership, the set remembers the order in which ids were marked,
/// which is the crawl's visitation order.
#[derive(Debug, Clone, Default)]
pub struct VisitedSet {
    seen: HashSet<String>,
    order: Vec<String>,
}

impl VisitedSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks `id` as visited; returns false if it already was
    pub fn mark(&mut self, id: &str) -> bool {
        if !self.seen.insert(id.to_string()) {
            return false;
        }
        self.order.push(id.to_string());
        true
    }

    pub fn contains(&self, id: &str) -> bool {
        self.seen.contains(id)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Visited ids in the order they were marked
    pub fn order(&self) -> &[String] {
        &self.order
    }
}
