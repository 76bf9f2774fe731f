//! Reordering the children of a container by a derived key.

use std::cmp::Ordering;

use crate::error::SortError;
use crate::sort::sort_by;

/// An ordered collection of child nodes that can be detached and re-appended.
pub trait ChildContainer {
    type Node;

    /// A snapshot of the current children, in order.
    fn children(&self) -> Vec<Self::Node>;

    /// Removes all children.
    fn detach_children(&mut self);

    /// Appends `node` as the last child.
    fn append_child(&mut self, node: Self::Node);
}

impl<N: Clone> ChildContainer for Vec<N> {
    type Node = N;

    fn children(&self) -> Vec<N> {
        self.clone()
    }

    fn detach_children(&mut self) {
        self.clear();
    }

    fn append_child(&mut self, node: N) {
        self.push(node);
    }
}

/// A child together with its key, computed once.
struct Entry<N, K> {
    node: N,
    key: Option<K>,
}

/// Sorts the children of `container` by the key `transform` derives from each of them.
///
/// `transform` is called exactly once per child. Children without a key (`None`) are placed
/// after all children with one and keep their relative order. The container is only modified
/// after the sort has succeeded, on error it keeps its original order.
pub fn reorder_children<C, K, F, G>(
    container: &mut C,
    mut compare: F,
    mut transform: G,
) -> Result<(), SortError>
where
    C: ChildContainer,
    F: FnMut(&K, &K) -> Ordering,
    G: FnMut(&C::Node) -> Option<K>,
{
    let mut entries: Vec<Entry<C::Node, K>> = container
        .children()
        .into_iter()
        .map(|node| {
            let key = transform(&node);
            Entry { node, key }
        })
        .collect();

    sort_by(&mut entries, |a, b| match (&a.key, &b.key) {
        (Some(a), Some(b)) => compare(a, b),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    })?;

    container.detach_children();
    for entry in entries {
        container.append_child(entry.node);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vec_container_reorders_by_key() {
        let mut names = vec!["delta", "alpha", "charlie", "bravo"];
        reorder_children(&mut names, |a: &char, b: &char| a.cmp(b), |name: &&str| {
            name.chars().next()
        })
        .unwrap();

        assert_eq!(names, ["alpha", "bravo", "charlie", "delta"]);
    }

    #[test]
    fn transform_runs_once_per_child() {
        let mut v: Vec<u32> = (0..100).rev().collect();
        let mut calls = 0;
        reorder_children(&mut v, |a: &u32, b: &u32| a.cmp(b), |x: &u32| {
            calls += 1;
            Some(*x)
        })
        .unwrap();

        assert_eq!(calls, 100);
        assert_eq!(v, (0..100).collect::<Vec<_>>());
    }

    #[test]
    fn empty_container() {
        let mut v: Vec<i32> = Vec::new();
        reorder_children(&mut v, |a: &i32, b: &i32| a.cmp(b), |x: &i32| Some(*x)).unwrap();
        assert!(v.is_empty());
    }
}
