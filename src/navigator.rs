use indexmap::IndexMap;

use crate::event::Relation;

/// A related object index together with the accumulated link weight.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Related {
    pub index: usize,
    pub weight: f32,
}

/// Lookup from the `from` side of a relation collection to the objects it links to.
///
/// Related objects are listed in the order their first link appears in the collection, and the
/// first entry is treated as the best match. Repeated links between the same pair of objects are
/// merged into one entry whose weight is the sum of the link weights.
#[derive(Debug, Clone, Default)]
pub struct RelationNavigator {
    to_map: IndexMap<usize, Vec<Related>>,
}

impl RelationNavigator {
    pub fn new(relations: &[Relation]) -> Self {
        let mut to_map: IndexMap<usize, Vec<Related>> = IndexMap::new();
        for rel in relations {
            let related = to_map.entry(rel.from).or_default();
            match related.iter_mut().find(|r| r.index == rel.to) {
                Some(existing) => existing.weight += rel.weight,
                None => related.push(Related {
                    index: rel.to,
                    weight: rel.weight,
                }),
            }
        }
        Self { to_map }
    }

    pub fn related_to(&self, from: usize) -> &[Related] {
        //! Objects the `from` object links to, best match first.
        self.to_map.get(&from).map(Vec::as_slice).unwrap_or(&[])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn best_match_first() {
        let nav = RelationNavigator::new(&[
            Relation::new(2, 0, 0.8),
            Relation::new(2, 3, 0.2),
            Relation::new(1, 3, 1.0),
        ]);
        assert_eq!(
            nav.related_to(2),
            &[
                Related { index: 0, weight: 0.8 },
                Related { index: 3, weight: 0.2 }
            ]
        );
        assert!(nav.related_to(0).is_empty());
        assert_eq!(nav.related_to(1), &[Related { index: 3, weight: 1.0 }]);
    }

    #[test]
    fn repeated_links_merge() {
        let nav = RelationNavigator::new(&[Relation::new(0, 5, 0.25), Relation::new(0, 5, 0.5)]);
        assert_eq!(nav.related_to(0), &[Related { index: 5, weight: 0.75 }]);
    }

    #[test]
    fn empty_collection() {
        let nav = RelationNavigator::new(&[]);
        assert!(nav.related_to(0).is_empty());
    }
}
