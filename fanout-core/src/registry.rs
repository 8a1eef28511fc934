//! Remote registry — classifies configured remotes into fleet categories.
//!
//! Classification is a pure lookup over a handful of configured names:
//! the primary origin, the canonical mirror, the excluded list and the
//! external list. Anything else is a [`Category::Flavor`] target.
//!
//! When a name appears in more than one role the first match wins, in
//! the order Primary > Canonical > Excluded > External.

use std::collections::BTreeSet;

use crate::config::FleetConfig;
use crate::types::{Category, Remote, RemoteName};

/// Name-based classifier for the remotes of one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Registry {
    primary: String,
    canonical: String,
    excluded: BTreeSet<String>,
    external: BTreeSet<String>,
}

impl Default for Registry {
    fn default() -> Self {
        Self::from_config(&FleetConfig::default())
    }
}

impl Registry {
    pub fn from_config(config: &FleetConfig) -> Self {
        Self {
            primary: config.primary.clone(),
            canonical: config.canonical.clone(),
            excluded: config.excluded.iter().cloned().collect(),
            external: config.external.iter().map(|r| r.name.clone()).collect(),
        }
    }

    /// Exclude `name` on top of the configured `excluded` list.
    pub fn exclude(&mut self, name: impl Into<String>) {
        self.excluded.insert(name.into());
    }

    /// Category for `name`. Total: every name gets exactly one category.
    pub fn classify(&self, name: &str) -> Category {
        if name == self.primary {
            Category::Primary
        } else if name == self.canonical {
            Category::Canonical
        } else if self.excluded.contains(name) {
            Category::Excluded
        } else if self.external.contains(name) {
            Category::External
        } else {
            Category::Flavor
        }
    }

    /// Classify an enumerated remote list.
    ///
    /// Blank and duplicate names are dropped; the result is in reporting
    /// order (category, then name).
    pub fn remotes<I, S>(&self, names: I) -> Vec<Remote>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let unique: BTreeSet<String> = names
            .into_iter()
            .map(|n| n.as_ref().trim().to_string())
            .filter(|n| !n.is_empty())
            .collect();
        let mut remotes: Vec<Remote> = unique
            .into_iter()
            .map(|name| {
                let category = self.classify(&name);
                Remote {
                    name: RemoteName::from(name),
                    category,
                }
            })
            .collect();
        remotes.sort_by(|a, b| (a.category, &a.name).cmp(&(b.category, &b.name)));
        remotes
    }
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
