//! Universe membership types exchanged with the host.
//!
//! Selection stages answer with a [`UniverseSelection`]; the host diffs the
//! selected symbols against its current membership and reports the result
//! back as [`SecurityChanges`]. Data ticks arrive as a [`DataSlice`].

use crate::ports::broker_port::BrokerPort;
use std::collections::{BTreeSet, HashSet};

/// Answer from a selection stage.
#[derive(Debug, Clone, PartialEq)]
pub enum UniverseSelection {
    /// Keep the current universe; the stage did not run.
    Unchanged,
    Symbols(Vec<String>),
}

impl UniverseSelection {
    pub fn is_unchanged(&self) -> bool {
        matches!(self, UniverseSelection::Unchanged)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RemovedSecurity {
    pub symbol: String,
    pub invested: bool,
}

/// Membership diff reported by the host after applying a selection.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SecurityChanges {
    pub removed: Vec<RemovedSecurity>,
    pub added: Vec<String>,
}

impl SecurityChanges {
    pub fn is_empty(&self) -> bool {
        self.removed.is_empty() && self.added.is_empty()
    }
}

/// Builds the change notification for moving from `current` to `selected`.
///
/// Removals come out sorted; additions keep selection order.
pub fn diff_universe(
    current: &BTreeSet<String>,
    selected: &[String],
    broker: &dyn BrokerPort,
) -> SecurityChanges {
    let selected_set: HashSet<&str> = selected.iter().map(String::as_str).collect();

    let removed = current
        .iter()
        .filter(|s| !selected_set.contains(s.as_str()))
        .map(|s| RemovedSecurity {
            symbol: s.clone(),
            invested: broker.is_invested(s),
        })
        .collect();

    let mut seen = HashSet::new();
    let added = selected
        .iter()
        .filter(|s| !current.contains(*s) && seen.insert(s.as_str()))
        .cloned()
        .collect();

    SecurityChanges { removed, added }
}

/// Symbols carrying a bar on one data tick.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DataSlice {
    symbols: HashSet<String>,
}

impl DataSlice {
    pub fn new<I, S>(symbols: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        DataSlice {
            symbols: symbols.into_iter().map(Into::into).collect(),
        }
    }

    pub fn contains(&self, symbol: &str) -> bool {
        self.symbols.contains(symbol)
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }
}
