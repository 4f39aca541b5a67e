// Union-find over roadmap vertex ids
use super::VertexId;

/// Disjoint-set forest tracking which roadmap vertices are connected.
///
/// Components only ever merge, so once two vertices share a component
/// they keep sharing it until the roadmap is cleared.
#[derive(Debug, Clone, Default)]
pub struct ConnectivityIndex {
    parent: Vec<VertexId>,
    rank: Vec<u8>,
    components: usize,
}

impl ConnectivityIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new singleton set; ids must be added in order
    pub fn add(&mut self) -> VertexId {
        let id = self.parent.len();
        self.parent.push(id);
        self.rank.push(0);
        self.components += 1;
        id
    }

    pub fn len(&self) -> usize {
        self.parent.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parent.is_empty()
    }

    pub fn component_count(&self) -> usize {
        self.components
    }

    /// Representative of `v`'s set, without compressing the path
    pub fn find(&self, v: VertexId) -> Option<VertexId> {
        if v >= self.parent.len() {
            return None;
        }
        let mut current = v;
        while self.parent[current] != current {
            current = self.parent[current];
        }
        Some(current)
    }

    fn find_compress(&mut self, v: VertexId) -> VertexId {
        let mut root = v;
        while self.parent[root] != root {
            root = self.parent[root];
        }
        let mut current = v;
        while self.parent[current] != root {
            let next = self.parent[current];
            self.parent[current] = root;
            current = next;
        }
        root
    }

    /// Merge the sets of `a` and `b`; returns false if they already matched
    /// or either id is unknown
    pub fn union(&mut self, a: VertexId, b: VertexId) -> bool {
        if a >= self.len() || b >= self.len() {
            return false;
        }
        let (ra, rb) = (self.find_compress(a), self.find_compress(b));
        if ra == rb {
            return false;
        }

        match self.rank[ra].cmp(&self.rank[rb]) {
            std::cmp::Ordering::Less => self.parent[ra] = rb,
            std::cmp::Ordering::Greater => self.parent[rb] = ra,
            std::cmp::Ordering::Equal => {
                self.parent[rb] = ra;
                self.rank[ra] += 1;
            }
        }
        self.components -= 1;
        true
    }

    pub fn same_component(&self, a: VertexId, b: VertexId) -> bool {
        match (self.find(a), self.find(b)) {
            (Some(ra), Some(rb)) => ra == rb,
            _ => false,
        }
    }

    pub fn clear(&mut self) {
        self.parent.clear();
        self.rank.clear();
        self.components = 0;
    }
}
