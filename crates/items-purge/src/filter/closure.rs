//! Deletion closure over the pile ownership graph.

use std::collections::VecDeque;

use rustc_hash::{FxHashMap, FxHashSet};

use crate::config::Protection;
use crate::index::ItemIndex;
use crate::model::Identifier;

/// Items to remove, plus what the walk refused to touch.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Closure {
    /// Identifiers of every item to remove.
    pub ids: FxHashSet<Identifier>,
    /// Ownership cycles found in the index, each in walk order.
    pub cycles: Vec<Vec<Identifier>>,
    /// Protected items that would otherwise have been removed.
    pub protected: Vec<Identifier>,
    /// Items that must survive even inside a removed record: every
    /// protected item and cycle member, and everything held by them.
    pub kept: FxHashSet<Identifier>,
}

impl Closure {
    pub fn contains(&self, id: &str) -> bool {
        self.ids.contains(id)
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Returns true if the item must not be removed, not even along with
    /// an enclosing record.
    pub fn keeps(&self, id: &str) -> bool {
        self.kept.contains(id)
    }
}

/// Computes the set of items in a deleted pile, directly or through the
/// items holding them.
pub fn compute_closure(index: &ItemIndex, deleted_piles: &FxHashSet<Identifier>) -> Closure {
    compute_closure_with(index, deleted_piles, &Protection::default())
}

/// Like [`compute_closure`], never entering protected items.
///
/// Items on an ownership cycle are never removed, and neither is anything
/// reachable only through them. A protected item keeps its contents too.
pub fn compute_closure_with(
    index: &ItemIndex,
    deleted_piles: &FxHashSet<Identifier>,
    protection: &Protection,
) -> Closure {
    let cycles = find_cycles(index);
    for cycle in &cycles {
        log::warn!(
            "ownership cycle left untouched: {}",
            cycle
                .iter()
                .map(Identifier::as_str)
                .collect::<Vec<_>>()
                .join(" -> ")
        );
    }
    let on_cycle: FxHashSet<&Identifier> = cycles.iter().flatten().collect();

    let mut seeds: Vec<&Identifier> = deleted_piles
        .iter()
        .flat_map(|pile| index.members(pile.as_str()))
        .collect();
    seeds.sort();
    let mut queue: VecDeque<&Identifier> = seeds.into_iter().collect();

    let mut ids = FxHashSet::default();
    let mut protected = Vec::new();
    let mut visited: FxHashSet<&Identifier> = FxHashSet::default();

    while let Some(id) = queue.pop_front() {
        if !visited.insert(id) {
            continue;
        }
        if on_cycle.contains(id) {
            continue;
        }
        if protection.covers(id) {
            log::debug!("keeping protected item {id}");
            protected.push(id.clone());
            continue;
        }
        ids.insert(id.clone());

        let mut held: Vec<&Identifier> = index
            .members(id.as_str())
            .filter(|held| !visited.contains(held))
            .collect();
        held.sort();
        queue.extend(held);
    }

    protected.sort();
    let kept = kept_items(index, &cycles, protection, &ids);
    Closure {
        ids,
        cycles,
        protected,
        kept,
    }
}

/// Protected items and cycle members, plus everything they hold that is
/// not already being removed.
fn kept_items(
    index: &ItemIndex,
    cycles: &[Vec<Identifier>],
    protection: &Protection,
    removed: &FxHashSet<Identifier>,
) -> FxHashSet<Identifier> {
    let mut queue: VecDeque<&Identifier> = cycles.iter().flatten().collect();
    if !protection.is_empty() {
        queue.extend(index.iter().map(|(id, _)| id).filter(|id| protection.covers(id)));
    }

    let mut kept = FxHashSet::default();
    while let Some(id) = queue.pop_front() {
        if removed.contains(id) || !kept.insert(id.clone()) {
            continue;
        }
        queue.extend(index.members(id.as_str()));
    }
    kept
}

/// Finds every cycle in the item -> pile graph.
///
/// Each item has at most one pile, so the graph is functional: walking
/// pile links from any item either leaves the index, joins an
/// already-explored path, or closes a cycle on the current path.
pub fn find_cycles(index: &ItemIndex) -> Vec<Vec<Identifier>> {
    #[derive(Clone, Copy, PartialEq)]
    enum Mark {
        OnPath,
        Done,
    }

    let mut starts: Vec<&Identifier> = index.iter().map(|(id, _)| id).collect();
    starts.sort();

    let mut marks: FxHashMap<&Identifier, Mark> = FxHashMap::default();
    let mut cycles = Vec::new();

    for start in starts {
        let mut path: Vec<&Identifier> = Vec::new();
        let mut current = Some(start);

        while let Some(id) = current {
            match marks.get(id) {
                Some(Mark::OnPath) => {
                    if let Some(pos) = path.iter().position(|p| *p == id) {
                        cycles.push(path[pos..].iter().map(|i| (*i).clone()).collect());
                    }
                    break;
                }
                Some(Mark::Done) => break,
                None => {}
            }
            marks.insert(id, Mark::OnPath);
            path.push(id);
            current = index
                .pile_of(id.as_str())
                .filter(|pile| index.contains(pile.as_str()));
        }

        for id in path {
            marks.insert(id, Mark::Done);
        }
    }

    cycles
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Grammar;
    use crate::limits::DELETED_PILE;
    use crate::syntax::parse;

    fn index(input: &str) -> ItemIndex {
        let doc = parse(input.as_bytes(), &Grammar::default()).unwrap();
        ItemIndex::build(&doc).unwrap()
    }

    fn deleted() -> FxHashSet<Identifier> {
        [Identifier::from(DELETED_PILE)].into_iter().collect()
    }

    fn sorted(closure: &Closure) -> Vec<&str> {
        let mut ids: Vec<_> = closure.ids.iter().map(Identifier::as_str).collect();
        ids.sort();
        ids
    }

    #[test]
    fn test_direct_members() {
        let index = index(
            "item { id = 1 pile = Garage }
             item { id = 2 pile = PermanentlyDeletedItems }",
        );
        let closure = compute_closure(&index, &deleted());
        assert_eq!(sorted(&closure), vec!["2"]);
        assert!(closure.cycles.is_empty());
    }

    #[test]
    fn test_transitive_members() {
        let index = index(
            "item { id = box pile = PermanentlyDeletedItems }
             item { id = bag pile = box }
             item { id = can pile = bag }
             item { id = lid pile = jar }
             item { id = jar pile = Kitchen }",
        );
        let closure = compute_closure(&index, &deleted());
        assert_eq!(sorted(&closure), vec!["bag", "box", "can"]);
    }

    #[test]
    fn test_item_without_pile_is_never_removed() {
        let index = index("item { id = 1 }\nitem { id = 2 pile = 1 }");
        let closure = compute_closure(&index, &deleted());
        assert!(closure.is_empty());
    }

    #[test]
    fn test_unknown_pile_is_preserved() {
        let index = index("item { id = 1 pile = FutureStorage }");
        let closure = compute_closure(&index, &deleted());
        assert!(closure.is_empty());
    }

    #[test]
    fn test_multiple_deleted_piles() {
        let index = index(
            "item { id = 1 pile = Trash }
             item { id = 2 pile = Landfill }
             item { id = 3 pile = Garage }",
        );
        let piles = [Identifier::from("Trash"), Identifier::from("Landfill")]
            .into_iter()
            .collect();
        let closure = compute_closure(&index, &piles);
        assert_eq!(sorted(&closure), vec!["1", "2"]);
    }

    #[test]
    fn test_cycle_is_reported_and_kept() {
        let index = index("item { id = A pile = B }\nitem { id = B pile = A }");
        let closure = compute_closure(&index, &deleted());
        assert!(closure.is_empty());
        assert_eq!(
            closure.cycles,
            vec![vec![Identifier::from("A"), Identifier::from("B")]]
        );
    }

    #[test]
    fn test_self_cycle() {
        let index = index("item { id = A pile = A }");
        assert_eq!(find_cycles(&index), vec![vec![Identifier::from("A")]]);
    }

    #[test]
    fn test_cycle_through_deleted_pile_id_terminates() {
        // An item that reuses the reserved pile id and sits in a loop.
        let index = index(
            "item { id = PermanentlyDeletedItems pile = X }
             item { id = X pile = PermanentlyDeletedItems }
             item { id = Y pile = X }",
        );
        let closure = compute_closure(&index, &deleted());
        assert_eq!(closure.cycles.len(), 1);
        assert!(closure.is_empty());
    }

    #[test]
    fn test_tail_into_cycle_is_not_a_cycle() {
        let index = index(
            "item { id = T pile = A }
             item { id = A pile = B }
             item { id = B pile = A }",
        );
        let cycles = find_cycles(&index);
        assert_eq!(cycles, vec![vec![Identifier::from("A"), Identifier::from("B")]]);
    }

    #[test]
    fn test_protected_item_keeps_contents() {
        let index = index(
            "item { id = milkx pile = PermanentlyDeletedItems }
             item { id = cap pile = milkx }
             item { id = bottle pile = PermanentlyDeletedItems }",
        );
        let protection = Protection {
            prefixes: vec!["milk".to_string()],
            ..Protection::default()
        };
        let closure = compute_closure_with(&index, &deleted(), &protection);
        assert_eq!(sorted(&closure), vec!["bottle"]);
        assert_eq!(closure.protected, vec![Identifier::from("milkx")]);
        assert!(closure.keeps("milkx"));
        assert!(closure.keeps("cap"));
        assert!(!closure.keeps("bottle"));
    }

    #[test]
    fn test_cycle_members_and_their_contents_are_kept() {
        let index = index(
            "item { id = A pile = B }
             item { id = B pile = A }
             item { id = C pile = A }
             item { id = D pile = Garage }",
        );
        let closure = compute_closure(&index, &deleted());
        let mut kept: Vec<_> = closure.kept.iter().map(Identifier::as_str).collect();
        kept.sort();
        assert_eq!(kept, vec!["A", "B", "C"]);
    }
}
