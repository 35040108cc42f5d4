//! Items and progressive-item resolution.

use std::collections::BTreeSet;

use crate::ids::ItemName;

/// An item as defined by the seed. Immutable once rules are loaded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Item {
    pub name: ItemName,
    pub groups: BTreeSet<String>,
    pub event: bool,
    pub advancement: Option<bool>,
    pub priority: Option<bool>,
}

impl Item {
    pub fn new(name: impl Into<ItemName>) -> Self {
        Self {
            name: name.into(),
            groups: BTreeSet::new(),
            event: false,
            advancement: None,
            priority: None,
        }
    }

    pub fn in_group(&self, group: &str) -> bool {
        self.groups.contains(group)
    }
}

/// One resolved rung of a progressive item's ladder.
///
/// Owning `level` or more copies of the progressive item's base name grants
/// every resolved item at or below that level.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgressionEntry {
    pub name: ItemName,
    pub level: u32,
    pub provides: Vec<String>,
}

/// Maps a base item name (`"Progressive Sword"`) to its ordered resolution
/// ladder. Built once at load time; immutable afterwards.
#[derive(Debug, Clone, Default)]
pub struct ProgressionMapping {
    ladders: std::collections::HashMap<ItemName, Vec<ProgressionEntry>>,
}

impl ProgressionMapping {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, base: ItemName, ladder: Vec<ProgressionEntry>) {
        self.ladders.insert(base, ladder);
    }

    pub fn ladder(&self, base: &str) -> Option<&[ProgressionEntry]> {
        self.ladders.get(base).map(Vec::as_slice)
    }

    /// Every resolved item name granted by owning `count` copies of `base`.
    pub fn resolved_at(&self, base: &str, count: u32) -> Vec<&ProgressionEntry> {
        match self.ladders.get(base) {
            Some(ladder) => ladder.iter().filter(|e| e.level <= count).collect(),
            None => Vec::new(),
        }
    }

    /// The base item (and the level it would need to reach) whose ladder
    /// resolves to `resolved_name` at some level, if any. Used by
    /// `Inventory::has` to answer "is this name reachable via progression".
    pub fn bases_resolving_to(&self, resolved_name: &str) -> Vec<(&ItemName, u32)> {
        let mut out = Vec::new();
        for (base, ladder) in &self.ladders {
            for entry in ladder {
                if entry.name.as_str() == resolved_name {
                    out.push((base, entry.level));
                }
            }
        }
        out
    }

    pub fn iter_bases(&self) -> impl Iterator<Item = &ItemName> {
        self.ladders.keys()
    }
}
