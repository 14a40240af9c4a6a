//! Parent/child grouping of a flat account list
//!
//! The grouping pass runs after search, filter and sort have reduced the
//! working set. It rebuilds one level of hierarchy:
//!
//! - a record whose parent is present (and not itself a child) is attached
//!   under that parent, in scan order
//! - every other record is a group root, in the order it was given
//!
//! Only one level is modelled. A record that is attached as a child keeps
//! its place under its own parent; records pointing at it are promoted to
//! standalone roots instead of being nested a second level deep. Parents
//! outside the working set and self-references are treated as absent, so
//! every record lands in exactly one group.

use crate::core::record::Account;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// A record that may point at a parent record of the same kind
pub trait Hierarchical {
    fn node_id(&self) -> &str;

    fn parent_ref(&self) -> Option<&str>;
}

impl<T: Hierarchical + ?Sized> Hierarchical for &T {
    fn node_id(&self) -> &str {
        (**self).node_id()
    }

    fn parent_ref(&self) -> Option<&str> {
        (**self).parent_ref()
    }
}

impl Hierarchical for Account {
    fn node_id(&self) -> &str {
        &self.id
    }

    fn parent_ref(&self) -> Option<&str> {
        self.parent_id.as_deref()
    }
}

/// One primary row and its indented sub-rows
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountGroup<T> {
    pub root: T,
    pub children: Vec<T>,
    /// True iff no child was attached to the root
    pub is_standalone: bool,
}

impl<T> AccountGroup<T> {
    /// Number of records in the group, root included; never zero
    pub fn record_count(&self) -> usize {
        1 + self.children.len()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Slot {
    Root(usize),
    Child(usize),
}

/// Parent reference that counts for grouping: present in the set and not self
fn visible_parent<'a, T: Hierarchical>(record: &'a T, present: &HashSet<&str>) -> Option<&'a str> {
    record
        .parent_ref()
        .filter(|parent| *parent != record.node_id() && present.contains(parent))
}

/// Decide where every record goes without moving anything
fn plan<T: Hierarchical>(records: &[T]) -> (Vec<Slot>, usize) {
    let present: HashSet<&str> = records.iter().map(|r| r.node_id()).collect();

    // Anything with a visible parent is claimed; only unclaimed records adopt
    let parents: Vec<Option<&str>> = records
        .iter()
        .map(|r| visible_parent(r, &present))
        .collect();
    let adopters: HashSet<&str> = records
        .iter()
        .zip(&parents)
        .filter(|(_, parent)| parent.is_none())
        .map(|(r, _)| r.node_id())
        .collect();

    // Roots are numbered in input order, promoted grandchildren included
    let mut group_of_id: HashMap<&str, usize> = HashMap::new();
    let mut pending: Vec<Result<usize, &str>> = Vec::with_capacity(records.len());
    let mut root_count = 0;

    for (record, parent) in records.iter().zip(&parents) {
        match parent {
            Some(parent) if adopters.contains(parent) => pending.push(Err(*parent)),
            _ => {
                if parent.is_none() {
                    group_of_id.entry(record.node_id()).or_insert(root_count);
                }
                pending.push(Ok(root_count));
                root_count += 1;
            }
        }
    }

    let slots = pending
        .into_iter()
        .map(|entry| match entry {
            Ok(group) => Slot::Root(group),
            // Every adopter id was registered as a root above
            Err(parent) => Slot::Child(group_of_id[parent]),
        })
        .collect();

    (slots, root_count)
}

/// Group a post-sort working set into parent/child groups
///
/// Never fails: dangling and self-referential parents produce standalone
/// roots, and the output is a total partition of the input.
pub fn group_by_parent<T: Hierarchical>(records: Vec<T>) -> Vec<AccountGroup<T>> {
    let (slots, root_count) = plan(&records);

    let mut roots: Vec<Option<T>> = (0..root_count).map(|_| None).collect();
    let mut children: Vec<Vec<T>> = (0..root_count).map(|_| Vec::new()).collect();

    for (record, slot) in records.into_iter().zip(slots) {
        match slot {
            Slot::Root(group) => roots[group] = Some(record),
            Slot::Child(group) => children[group].push(record),
        }
    }

    let groups: Vec<AccountGroup<T>> = roots
        .into_iter()
        .zip(children)
        .filter_map(|(root, children)| {
            root.map(|root| AccountGroup {
                is_standalone: children.is_empty(),
                root,
                children,
            })
        })
        .collect();

    tracing::debug!(groups = groups.len(), "grouped accounts by parent");
    groups
}

/// Borrowing variant of [`group_by_parent`]
pub fn group_refs<T: Hierarchical>(records: &[T]) -> Vec<AccountGroup<&T>> {
    group_by_parent(records.iter().collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    struct Node {
        id: &'static str,
        parent: Option<&'static str>,
    }

    impl Hierarchical for Node {
        fn node_id(&self) -> &str {
            self.id
        }

        fn parent_ref(&self) -> Option<&str> {
            self.parent
        }
    }

    fn node(id: &'static str, parent: Option<&'static str>) -> Node {
        Node { id, parent }
    }

    fn shape(groups: &[AccountGroup<Node>]) -> Vec<(&'static str, Vec<&'static str>, bool)> {
        groups
            .iter()
            .map(|g| {
                (
                    g.root.id,
                    g.children.iter().map(|c| c.id).collect(),
                    g.is_standalone,
                )
            })
            .collect()
    }

    #[test]
    fn test_dangling_parent_becomes_standalone_root() {
        let groups = group_by_parent(vec![
            node("A", None),
            node("B", Some("A")),
            node("C", Some("Z")),
        ]);
        assert_eq!(
            shape(&groups),
            vec![("A", vec!["B"], false), ("C", vec![], true)]
        );
    }

    #[test]
    fn test_child_before_parent_in_input() {
        let groups = group_by_parent(vec![node("B", Some("A")), node("A", None)]);
        assert_eq!(shape(&groups), vec![("A", vec!["B"], false)]);
    }

    #[test]
    fn test_children_keep_scan_order() {
        let groups = group_by_parent(vec![
            node("C2", Some("P")),
            node("P", None),
            node("C1", Some("P")),
            node("C3", Some("P")),
        ]);
        assert_eq!(shape(&groups), vec![("P", vec!["C2", "C1", "C3"], false)]);
    }

    #[test]
    fn test_self_parent_is_standalone() {
        let groups = group_by_parent(vec![node("A", Some("A"))]);
        assert_eq!(shape(&groups), vec![("A", vec![], true)]);
    }

    #[test]
    fn test_grandchildren_are_promoted_not_nested() {
        let groups = group_by_parent(vec![
            node("A", None),
            node("B", Some("A")),
            node("C", Some("B")),
            node("D", Some("C")),
        ]);
        assert_eq!(
            shape(&groups),
            vec![("A", vec!["B"], false), ("C", vec![], true), ("D", vec![], true)]
        );
    }

    #[test]
    fn test_two_cycle_yields_two_roots() {
        let groups = group_by_parent(vec![node("A", Some("B")), node("B", Some("A"))]);
        assert_eq!(shape(&groups), vec![("A", vec![], true), ("B", vec![], true)]);
    }

    #[test]
    fn test_empty_input() {
        let groups: Vec<AccountGroup<Node>> = group_by_parent(Vec::new());
        assert!(groups.is_empty());
    }

    #[test]
    fn test_group_refs_borrows() {
        let records = vec![node("A", None), node("B", Some("A"))];
        let groups = group_refs(&records);
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].root.id, "A");
        assert_eq!(groups[0].record_count(), 2);
    }

    #[test]
    fn test_accounts_group_by_parent_id() {
        let accounts = vec![
            Account::new("001P", "Globex Holdings"),
            Account::new("001C", "Globex EMEA").with_parent("001P"),
        ];
        let groups = group_by_parent(accounts);
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].children[0].name, "Globex EMEA");
    }
}
