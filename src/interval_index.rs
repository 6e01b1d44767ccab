//! Construct-once interval lookup over inclusive coordinate ranges, built on
//! rust-bio's interval tree. Query result order is unspecified.

use bio::data_structures::interval_tree::IntervalTree;

#[derive(Clone, Debug)]
pub struct IntervalHit<V> {
    pub start: i32,
    pub stop: i32,
    pub value: V,
}

pub struct IntervalIndex<V> {
    tree: IntervalTree<i32, V>,
}

impl<V: Clone> IntervalIndex<V> {
    pub fn new(entries: &[(i32, i32, V)]) -> Self {
        let mut tree = IntervalTree::new();
        for (start, stop, value) in entries {
            // Inclusive coordinates, half-open internally.
            tree.insert(*start..stop + 1, value.clone());
        }
        IntervalIndex { tree }
    }

    /// Every stored interval with `start <= q_stop && stop >= q_start`.
    pub fn find_overlapping(&self, q_start: i32, q_stop: i32) -> Vec<IntervalHit<V>> {
        if q_stop < q_start {
            return Vec::new();
        }
        self.tree
            .find(q_start..q_stop + 1)
            .map(|entry| IntervalHit {
                start: entry.interval().start,
                stop: entry.interval().end - 1,
                value: entry.data().clone(),
            })
            .collect()
    }

    /// Stored intervals fully inside `[q_start, q_stop]`.
    pub fn find_contained(&self, q_start: i32, q_stop: i32) -> Vec<IntervalHit<V>> {
        self.find_overlapping(q_start, q_stop)
            .into_iter()
            .filter(|hit| hit.start >= q_start && hit.stop <= q_stop)
            .collect()
    }
}

impl<V: Clone> Default for IntervalIndex<V> {
    fn default() -> Self {
        IntervalIndex {
            tree: IntervalTree::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn index() -> IntervalIndex<&'static str> {
        IntervalIndex::new(&[
            (10, 19, "a"),
            (15, 30, "b"),
            (40, 45, "c"),
            (44, 60, "d"),
        ])
    }

    fn names(hits: Vec<IntervalHit<&'static str>>) -> Vec<&'static str> {
        let mut names: Vec<_> = hits.into_iter().map(|hit| hit.value).collect();
        names.sort_unstable();
        names
    }

    #[test]
    fn test_overlapping() {
        let index = index();
        assert_eq!(names(index.find_overlapping(18, 41)), vec!["a", "b", "c"]);
        assert_eq!(names(index.find_overlapping(1, 9)), Vec::<&str>::new());
        assert_eq!(names(index.find_overlapping(60, 100)), vec!["d"]);
    }

    #[test]
    fn test_overlap_is_inclusive_at_edges() {
        let index = index();
        // Query touching a stored stop coordinate still overlaps.
        assert_eq!(names(index.find_overlapping(19, 19)), vec!["a", "b"]);
        assert_eq!(names(index.find_overlapping(20, 25)), vec!["b"]);
    }

    #[test]
    fn test_contained() {
        let index = index();
        assert_eq!(names(index.find_contained(10, 30)), vec!["a", "b"]);
        assert_eq!(names(index.find_contained(11, 30)), vec!["b"]);
        assert_eq!(names(index.find_contained(39, 61)), vec!["c", "d"]);
    }

    #[test]
    fn test_inverted_query_is_empty() {
        let index = index();
        assert!(index.find_overlapping(101, 100).is_empty());
    }

    #[test]
    fn test_hit_reports_inclusive_coordinates() {
        let index = IntervalIndex::new(&[(5, 8, "x")]);
        let hits = index.find_overlapping(1, 100);
        assert_eq!(hits.len(), 1);
        assert_eq!((hits[0].start, hits[0].stop), (5, 8));
    }
}
