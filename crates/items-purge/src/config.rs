//! Tokenizer contract and cleaning options.

use rustc_hash::FxHashSet;

use crate::limits::{DEFAULT_MAX_BACKUPS, DELETED_PILE};
use crate::model::Identifier;

/// Grammar knobs for the save-file tokenizer.
///
/// The block/field shape is fixed; which keys carry item semantics and how
/// comments are spelled are not, so they are configured here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Grammar {
    /// Prefixes that start a comment running to end of line.
    ///
    /// Only recognised where a token could start, and not as the first
    /// thing after `=` on the same line, so `color = #ff0000` is a value.
    pub comment_prefixes: Vec<String>,
    /// Field keys holding an item's own identifier.
    pub id_keys: Vec<String>,
    /// Field keys holding an item's pile membership.
    pub pile_keys: Vec<String>,
    /// Field keys that count a block's children.
    pub count_keys: Vec<String>,
}

impl Default for Grammar {
    fn default() -> Self {
        Self {
            comment_prefixes: vec!["#".to_string(), "//".to_string()],
            id_keys: vec!["id".to_string()],
            pile_keys: vec!["pile".to_string()],
            count_keys: vec!["count".to_string()],
        }
    }
}

impl Grammar {
    /// Creates the default grammar.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_comment_prefixes<I, S>(mut self, prefixes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.comment_prefixes = prefixes.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_id_keys<I, S>(mut self, keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.id_keys = keys.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_pile_keys<I, S>(mut self, keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.pile_keys = keys.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_count_keys<I, S>(mut self, keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.count_keys = keys.into_iter().map(Into::into).collect();
        self
    }

    pub(crate) fn is_id_key(&self, key: &[u8]) -> bool {
        contains_key(&self.id_keys, key)
    }

    pub(crate) fn is_pile_key(&self, key: &[u8]) -> bool {
        contains_key(&self.pile_keys, key)
    }

    pub(crate) fn is_count_key(&self, key: &[u8]) -> bool {
        contains_key(&self.count_keys, key)
    }
}

fn contains_key(keys: &[String], key: &[u8]) -> bool {
    keys.iter().any(|k| k.as_bytes() == key)
}

/// Items the cleaner must never remove.
///
/// Some items sit in the deleted pile on a fresh save but are still
/// referenced from elsewhere; removing them corrupts the game state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Protection {
    pub ids: FxHashSet<Identifier>,
    pub prefixes: Vec<String>,
}

impl Protection {
    /// Returns true if the item must be kept.
    pub fn covers(&self, id: &Identifier) -> bool {
        self.ids.contains(id) || self.prefixes.iter().any(|p| id.as_str().starts_with(p.as_str()))
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty() && self.prefixes.is_empty()
    }
}

/// Options for a cleaning run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CleanOptions {
    /// Pile identifiers whose contents are permanently deleted.
    pub deleted_piles: FxHashSet<Identifier>,
    /// Number of rotated backups to keep (at least 1).
    pub max_backups: usize,
    /// Items never removed, even when they sit in a deleted pile.
    pub protection: Protection,
    /// Compute and report without writing anything.
    pub dry_run: bool,
}

impl Default for CleanOptions {
    fn default() -> Self {
        let mut deleted_piles = FxHashSet::default();
        deleted_piles.insert(Identifier::from(DELETED_PILE));
        Self {
            deleted_piles,
            max_backups: DEFAULT_MAX_BACKUPS,
            protection: Protection::default(),
            dry_run: false,
        }
    }
}

impl CleanOptions {
    /// Creates default options: the reserved deleted pile and ten backups.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the deleted pile set. An empty iterator keeps the default.
    pub fn with_deleted_piles<I, S>(mut self, piles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<Identifier>,
    {
        let piles: FxHashSet<Identifier> = piles.into_iter().map(Into::into).collect();
        if !piles.is_empty() {
            self.deleted_piles = piles;
        }
        self
    }

    pub fn with_max_backups(mut self, max_backups: usize) -> Self {
        self.max_backups = max_backups.max(1);
        self
    }

    pub fn with_protected_ids<I, S>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<Identifier>,
    {
        self.protection.ids.extend(ids.into_iter().map(Into::into));
        self
    }

    pub fn with_protected_prefixes<I, S>(mut self, prefixes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.protection
            .prefixes
            .extend(prefixes.into_iter().map(Into::into));
        self
    }

    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_options() {
        let options = CleanOptions::default();
        assert!(options.deleted_piles.contains(DELETED_PILE));
        assert_eq!(options.max_backups, DEFAULT_MAX_BACKUPS);
        assert!(options.protection.is_empty());
        assert!(!options.dry_run);
    }

    #[test]
    fn test_empty_deleted_piles_keeps_default() {
        let options = CleanOptions::new().with_deleted_piles(Vec::<String>::new());
        assert!(options.deleted_piles.contains(DELETED_PILE));

        let options = CleanOptions::new().with_deleted_piles(["Trash"]);
        assert!(options.deleted_piles.contains("Trash"));
        assert!(!options.deleted_piles.contains(DELETED_PILE));
    }

    #[test]
    fn test_max_backups_clamped() {
        assert_eq!(CleanOptions::new().with_max_backups(0).max_backups, 1);
        assert_eq!(CleanOptions::new().with_max_backups(3).max_backups, 3);
    }

    #[test]
    fn test_protection() {
        let options = CleanOptions::new()
            .with_protected_ids(["milkx"])
            .with_protected_prefixes(["battery"]);
        assert!(options.protection.covers(&Identifier::from("milkx")));
        assert!(options.protection.covers(&Identifier::from("battery12")));
        assert!(!options.protection.covers(&Identifier::from("milkx2")));
    }

    #[test]
    fn test_grammar_keys() {
        let grammar = Grammar::new().with_pile_keys(["location", "pile"]);
        assert!(grammar.is_pile_key(b"location"));
        assert!(grammar.is_pile_key(b"pile"));
        assert!(grammar.is_id_key(b"id"));
        assert!(!grammar.is_count_key(b"id"));
    }
}
