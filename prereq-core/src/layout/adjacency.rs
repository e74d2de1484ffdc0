// Prerequisite adjacency and depth computation.
//
// Builds the directed "course -> direct prerequisites" map over the whole catalog, used to:
// 1. Compute shortest-hop depths from the root (ring index per node)
// 2. Count live parents when a close cascades
// 3. Reconcile edges between independently opened nodes
// 4. Find fallback anchors for layout clusters
//
// Defined over the full catalog, not the revealed subgraph, so it only changes with the catalog
// and the depths only change with the root.

use std::collections::{BTreeSet, HashMap, VecDeque};

use crate::catalog::{Catalog, CourseId, list_direct_prerequisite_ids};

/// Shortest-hop depth from the root. Unreachable ids are absent.
pub type DepthMap = HashMap<CourseId, usize>;

static NO_PREREQS: BTreeSet<CourseId> = BTreeSet::new();

#[derive(Debug, Clone, Default)]
pub struct Adjacency {
    /// For each known course, its direct prerequisite ids (sorted).
    prereqs: HashMap<CourseId, BTreeSet<CourseId>>,
}

impl Adjacency {
    pub fn from_catalog(catalog: &Catalog) -> Self {
        let prereqs = catalog
            .ids()
            .into_iter()
            .map(|id| (id.clone(), list_direct_prerequisite_ids(catalog, id)))
            .collect();
        Self { prereqs }
    }

    /// Direct prerequisites of a course, or an empty set if it has none or is unknown.
    pub fn get_prereqs(&self, id: &str) -> &BTreeSet<CourseId> {
        self.prereqs.get(id).unwrap_or(&NO_PREREQS)
    }

    /// Whether `child` is a direct prerequisite of `parent`.
    pub fn is_prereq(&self, parent: &str, child: &str) -> bool {
        self.get_prereqs(parent).contains(child)
    }

    pub fn edge_count(&self) -> usize {
        self.prereqs.values().map(BTreeSet::len).sum()
    }

    /// Breadth-first depths from `root` (depth 0).
    pub fn depths_from(&self, root: &str) -> DepthMap {
        let mut depths = DepthMap::new();
        let mut queue = VecDeque::new();
        depths.insert(root.to_string(), 0);
        queue.push_back(root.to_string());

        while let Some(id) = queue.pop_front() {
            let depth = depths[&id];
            for next in self.get_prereqs(&id) {
                if !depths.contains_key(next) {
                    depths.insert(next.clone(), depth + 1);
                    queue.push_back(next.clone());
                }
            }
        }

        depths
    }
}

/// Adjacency plus BFS in one go, for callers that do not keep the adjacency around.
pub fn build_depths(catalog: &Catalog, root: &str) -> DepthMap {
    Adjacency::from_catalog(catalog).depths_from(root)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::tests::fixture;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_prereqs_from_fixture() {
        let adjacency = Adjacency::from_catalog(&fixture());
        assert_eq!(adjacency.get_prereqs("ECON 201").len(), 8);
        assert!(adjacency.is_prereq("ECON 201", "MATH 157"));
        assert!(!adjacency.is_prereq("MATH 157", "ECON 201"));
        assert!(adjacency.get_prereqs("ECON 103").is_empty());
        assert!(adjacency.get_prereqs("NOPE 1").is_empty());
    }

    #[test]
    fn test_depths_are_shortest_hops() {
        let depths = build_depths(&fixture(), "ECON 305");
        assert_eq!(depths["ECON 305"], 0);
        // Reachable both directly and through ECON 201.
        assert_eq!(depths["ECON 103"], 1);
        assert_eq!(depths["ECON 201"], 1);
        assert_eq!(depths["MATH 150"], 2);
        assert_eq!(depths["MATH 100"], 3);
        assert_eq!(depths["Pre-Calculus 12"], 3);
        assert!(!depths.contains_key("ECON 999"));
    }

    #[test]
    fn test_unknown_root_has_only_itself() {
        let depths = build_depths(&fixture(), "NOPE 1");
        assert_eq!(depths.len(), 1);
        assert_eq!(depths["NOPE 1"], 0);
    }
}
