// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Many-to-many tag membership with boolean queries.

use std::collections::{BTreeSet, HashMap};

/// One term of a tag query.
///
/// A query is a list of terms combined with OR. A [`TagTerm::All`] group
/// matches entries carrying every tag in it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TagTerm {
    /// Matches entries carrying this tag.
    Tag(String),
    /// Matches entries carrying all of these tags. An empty group matches
    /// nothing.
    All(Vec<String>),
}

impl TagTerm {
    /// Builds an AND-group.
    pub fn all<I, S>(tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        TagTerm::All(tags.into_iter().map(Into::into).collect())
    }
}

impl From<&str> for TagTerm {
    fn from(tag: &str) -> Self {
        TagTerm::Tag(tag.to_string())
    }
}

impl From<String> for TagTerm {
    fn from(tag: String) -> Self {
        TagTerm::Tag(tag)
    }
}

impl<S: Into<String>> From<Vec<S>> for TagTerm {
    fn from(tags: Vec<S>) -> Self {
        TagTerm::all(tags)
    }
}

impl<S: Into<String>, const N: usize> From<[S; N]> for TagTerm {
    fn from(tags: [S; N]) -> Self {
        TagTerm::all(tags)
    }
}

/// Maps each tag to the ordered set of keys carrying it.
///
/// Buckets are deleted as soon as they empty, so [`tag_count`](Self::tag_count)
/// only counts tags in use.
#[derive(Debug, Clone)]
pub struct TagIndex<K> {
    buckets: HashMap<String, BTreeSet<K>>,
}

impl<K> Default for TagIndex<K> {
    fn default() -> Self {
        Self {
            buckets: HashMap::new(),
        }
    }
}

impl<K: Ord + Copy> TagIndex<K> {
    /// Creates an empty index.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records that `key` carries `tag`. Returns `false` if it already did.
    pub fn insert(&mut self, tag: &str, key: K) -> bool {
        self.buckets.entry(tag.to_string()).or_default().insert(key)
    }

    /// Records that `key` no longer carries `tag`. Returns `false` if it did not.
    pub fn remove(&mut self, tag: &str, key: K) -> bool {
        let Some(bucket) = self.buckets.get_mut(tag) else {
            return false;
        };
        let removed = bucket.remove(&key);
        if bucket.is_empty() {
            self.buckets.remove(tag);
        }
        removed
    }

    /// Returns `true` if `key` carries `tag`.
    pub fn contains(&self, tag: &str, key: K) -> bool {
        self.buckets.get(tag).is_some_and(|b| b.contains(&key))
    }

    /// The keys carrying `tag`, in key order.
    pub fn tagged(&self, tag: &str) -> impl Iterator<Item = K> + '_ {
        self.buckets.get(tag).into_iter().flatten().copied()
    }

    /// The number of keys carrying `tag`.
    pub fn count(&self, tag: &str) -> usize {
        self.buckets.get(tag).map_or(0, BTreeSet::len)
    }

    /// The number of distinct tags in use.
    pub fn tag_count(&self) -> usize {
        self.buckets.len()
    }

    /// Evaluates an OR of terms. Each key appears once, in key order.
    pub fn query(&self, terms: &[TagTerm]) -> BTreeSet<K> {
        let mut matches = BTreeSet::new();
        for term in terms {
            match term {
                TagTerm::Tag(tag) => matches.extend(self.tagged(tag)),
                TagTerm::All(group) => matches.extend(self.all_of(group)),
            }
        }
        matches
    }

    fn all_of(&self, group: &[String]) -> BTreeSet<K> {
        // Intersect starting from the smallest bucket.
        let mut buckets = Vec::with_capacity(group.len());
        for tag in group {
            match self.buckets.get(tag) {
                Some(bucket) => buckets.push(bucket),
                None => return BTreeSet::new(),
            }
        }
        buckets.sort_by_key(|b| b.len());
        let Some((smallest, rest)) = buckets.split_first() else {
            return BTreeSet::new();
        };
        smallest
            .iter()
            .filter(|key| rest.iter().all(|b| b.contains(key)))
            .copied()
            .collect()
    }
}
