use crate::model::{Posting, PostingValue, Uid, Value};

/// Immutable snapshot of the postings stored under one (entity,
/// attribute) key, in append (timestamp) order.
///
/// Lists are shared behind `Arc` by the index; an append produces a new
/// list and republishes it, so holders of a snapshot never observe a
/// partial write.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PostingList {
    postings: Vec<Posting>,
}

/// Classification of a posting list by its tags.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListKind {
    /// No postings at all.
    Empty,
    /// Every posting carries a scalar value.
    Scalar,
    /// Every posting carries a target entity.
    Relation,
    /// Scalar and edge postings under the same attribute.
    Mixed,
}

impl PostingList {
    pub fn new(postings: Vec<Posting>) -> Self {
        Self { postings }
    }

    pub fn postings(&self) -> &[Posting] {
        &self.postings
    }

    pub fn len(&self) -> usize {
        self.postings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.postings.is_empty()
    }

    pub fn push(&mut self, posting: Posting) {
        self.postings.push(posting);
    }

    /// Determines whether this list is scalar-valued, edge-valued, or an
    /// inconsistent mix. Relation-vs-scalar is a per-entity property of
    /// the data, so it has to be discovered here at resolution time.
    pub fn kind(&self) -> ListKind {
        let mut scalars = false;
        let mut edges = false;
        for posting in &self.postings {
            match posting.value {
                PostingValue::Scalar(_) => scalars = true,
                PostingValue::Edge(_) => edges = true,
            }
        }
        match (scalars, edges) {
            (false, false) => ListKind::Empty,
            (true, false) => ListKind::Scalar,
            (false, true) => ListKind::Relation,
            (true, true) => ListKind::Mixed,
        }
    }

    /// Scalar values in posting order. Caller must have checked `kind`.
    pub fn scalar_values(&self) -> Vec<Value> {
        self.postings
            .iter()
            .filter_map(|p| match &p.value {
                PostingValue::Scalar(v) => Some(v.clone()),
                PostingValue::Edge(_) => None,
            })
            .collect()
    }

    /// Edge targets in posting order. Caller must have checked `kind`.
    pub fn targets(&self) -> Vec<Uid> {
        self.postings.iter().filter_map(Posting::target).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_classifies_lists() {
        assert_eq!(PostingList::default().kind(), ListKind::Empty);

        let scalar = PostingList::new(vec![Posting::scalar("a", 1), Posting::scalar("b", 2)]);
        assert_eq!(scalar.kind(), ListKind::Scalar);

        let relation = PostingList::new(vec![Posting::edge(2, 1)]);
        assert_eq!(relation.kind(), ListKind::Relation);

        let mixed = PostingList::new(vec![Posting::scalar("a", 1), Posting::edge(2, 2)]);
        assert_eq!(mixed.kind(), ListKind::Mixed);
    }

    #[test]
    fn values_and_targets_preserve_posting_order() {
        let list = PostingList::new(vec![
            Posting::scalar("first", 5),
            Posting::scalar("second", 9),
        ]);
        assert_eq!(
            list.scalar_values(),
            vec![Value::from("first"), Value::from("second")]
        );

        let edges = PostingList::new(vec![Posting::edge(9, 1), Posting::edge(3, 2)]);
        assert_eq!(edges.targets(), vec![9, 3]);
    }
}
