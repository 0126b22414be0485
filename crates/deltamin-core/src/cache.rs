//! Outcome caches for configuration oracles.
//!
//! Reducers never cache verdicts themselves. Callers that know their oracle
//! is deterministic can wrap it in a [`CachedOracle`] so repeated candidates
//! are answered from memory.
//!
//! | Store | Lookup | Memory | Notes |
//! |-------|--------|--------|-------|
//! | [`HashStore`] | one hash of the whole key | one key copy per entry | default |
//! | [`TrieStore`] | one step per retained index | shared prefixes | drops supersets of a failing key |

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::trace;

use crate::configuration::Configuration;
use crate::oracle::Oracle;
use crate::verdict::Verdict;

/// Storage for verdicts keyed by a configuration's retained indices.
pub trait VerdictStore: Send {
    /// The verdict stored for `key`, if any.
    fn get(&self, key: &[usize]) -> Option<Verdict>;

    /// Store `verdict` for `key`.
    fn insert(&mut self, key: &[usize], verdict: Verdict);

    /// Number of stored verdicts.
    fn len(&self) -> usize;

    /// Returns true if nothing is stored.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Forget everything.
    fn clear(&mut self);
}

/// Verdicts in a hash map, one entry per distinct key.
#[derive(Debug, Default)]
pub struct HashStore {
    map: HashMap<Vec<usize>, Verdict>,
}

impl HashStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

impl VerdictStore for HashStore {
    fn get(&self, key: &[usize]) -> Option<Verdict> {
        self.map.get(key).copied()
    }

    fn insert(&mut self, key: &[usize], verdict: Verdict) {
        self.map.insert(key.to_vec(), verdict);
    }

    fn len(&self) -> usize {
        self.map.len()
    }

    fn clear(&mut self) {
        self.map.clear();
    }
}

#[derive(Debug, Default)]
struct TrieNode {
    verdict: Option<Verdict>,
    children: BTreeMap<usize, TrieNode>,
}

impl TrieNode {
    fn count(&self) -> usize {
        let mut total = 0;
        let mut stack = vec![self];
        while let Some(node) = stack.pop() {
            total += usize::from(node.verdict.is_some());
            stack.extend(node.children.values());
        }
        total
    }
}

/// Verdicts in a trie over the retained indices.
///
/// Keys that share a prefix share storage. Storing a FAIL drops every
/// stored key that extends it: those are supersets of a failing
/// configuration, which a reducer never tests again.
#[derive(Debug, Default)]
pub struct TrieStore {
    root: TrieNode,
    len: usize,
}

impl TrieStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

impl VerdictStore for TrieStore {
    fn get(&self, key: &[usize]) -> Option<Verdict> {
        let mut node = &self.root;
        for index in key {
            node = node.children.get(index)?;
        }
        node.verdict
    }

    fn insert(&mut self, key: &[usize], verdict: Verdict) {
        let mut node = &mut self.root;
        for &index in key {
            node = node.children.entry(index).or_default();
        }
        if node.verdict.replace(verdict).is_none() {
            self.len += 1;
        }
        if verdict.is_fail() {
            let dropped: usize = node.children.values().map(TrieNode::count).sum();
            node.children.clear();
            self.len -= dropped;
        }
    }

    fn len(&self) -> usize {
        self.len
    }

    fn clear(&mut self) {
        self.root = TrieNode::default();
        self.len = 0;
    }
}

/// Which [`VerdictStore`] backs a cache.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CacheKind {
    /// [`HashStore`].
    #[default]
    Hash,
    /// [`TrieStore`].
    Trie,
}

impl CacheKind {
    /// Every kind, in declaration order.
    pub const ALL: [CacheKind; 2] = [CacheKind::Hash, CacheKind::Trie];

    /// Lowercase name, as used in configuration files.
    pub fn as_str(&self) -> &'static str {
        match self {
            CacheKind::Hash => "hash",
            CacheKind::Trie => "trie",
        }
    }

    /// An empty store of this kind.
    pub fn store(&self) -> Box<dyn VerdictStore> {
        match self {
            CacheKind::Hash => Box::new(HashStore::new()),
            CacheKind::Trie => Box::new(TrieStore::new()),
        }
    }
}

impl fmt::Display for CacheKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Decorator that remembers the verdict of every distinct configuration.
///
/// Configurations are keyed by their retained indices, so the cache must not
/// be shared between runs over different inputs.
pub struct CachedOracle<O> {
    inner: O,
    store: Mutex<Box<dyn VerdictStore>>,
    hits: AtomicUsize,
    misses: AtomicUsize,
}

impl<O> CachedOracle<O> {
    /// Cache the verdicts of `inner` in a [`HashStore`].
    pub fn new(inner: O) -> Self {
        Self::with_kind(inner, CacheKind::Hash)
    }

    /// Cache the verdicts of `inner` in a fresh store of `kind`.
    pub fn with_kind(inner: O, kind: CacheKind) -> Self {
        Self::with_store(inner, kind.store())
    }

    /// Cache the verdicts of `inner` in `store`.
    pub fn with_store(inner: O, store: Box<dyn VerdictStore>) -> Self {
        Self {
            inner,
            store: Mutex::new(store),
            hits: AtomicUsize::new(0),
            misses: AtomicUsize::new(0),
        }
    }

    /// Number of candidates answered from the cache.
    pub fn hits(&self) -> usize {
        self.hits.load(Ordering::Relaxed)
    }

    /// Number of candidates forwarded to the wrapped oracle.
    pub fn misses(&self) -> usize {
        self.misses.load(Ordering::Relaxed)
    }

    /// Number of cached verdicts.
    pub async fn len(&self) -> usize {
        self.store.lock().await.len()
    }

    /// Returns true if nothing has been cached yet.
    pub async fn is_empty(&self) -> bool {
        self.store.lock().await.is_empty()
    }

    /// Forget every cached verdict. Hit and miss counters are kept.
    pub async fn clear(&self) {
        self.store.lock().await.clear();
    }
}

#[async_trait]
impl<T, O> Oracle<Configuration<T>> for CachedOracle<O>
where
    T: Send + Sync,
    O: Oracle<Configuration<T>>,
{
    async fn test(&self, candidate: &Configuration<T>) -> Verdict {
        if let Some(verdict) = self.store.lock().await.get(candidate.indices()) {
            self.hits.fetch_add(1, Ordering::Relaxed);
            trace!(len = candidate.len(), %verdict, "Cache hit");
            return verdict;
        }

        // The lock is not held across the oracle call; two workers racing on
        // the same candidate both call the oracle and store the same key.
        self.misses.fetch_add(1, Ordering::Relaxed);
        let verdict = self.inner.test(candidate).await;
        self.store
            .lock()
            .await
            .insert(candidate.indices(), verdict);
        verdict
    }

    fn name(&self) -> &str {
        self.inner.name()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::Input;
    use crate::oracle::{oracle_fn, RecordingOracle};

    #[tokio::test]
    async fn test_cache_answers_repeats() {
        for kind in CacheKind::ALL {
            let input = Input::new(vec![1, 2, 3, 4]).into_shared();
            let full = Configuration::full(input);

            let inner = RecordingOracle::new(oracle_fn(|c: &Configuration<i32>| {
                if c.iter().any(|&x| x == 3) {
                    Verdict::Fail
                } else {
                    Verdict::Pass
                }
            }));
            let cached = CachedOracle::with_kind(&inner, kind);

            let a = full.complement(0..2);
            let b = full.complement(2..4);

            assert_eq!(cached.test(&a).await, Verdict::Fail);
            assert_eq!(cached.test(&b).await, Verdict::Pass);
            assert_eq!(cached.test(&a).await, Verdict::Fail);
            assert_eq!(cached.test(&full.complement(0..2)).await, Verdict::Fail);

            assert_eq!(inner.calls(), 2, "{}", kind);
            assert_eq!(cached.hits(), 2);
            assert_eq!(cached.misses(), 2);
            assert_eq!(cached.len().await, 2);

            cached.clear().await;
            assert!(cached.is_empty().await);
        }
    }

    #[test]
    fn test_trie_shares_prefixes() {
        let mut store = TrieStore::new();
        store.insert(&[0, 1, 2], Verdict::Pass);
        store.insert(&[0, 1], Verdict::Unresolved);
        store.insert(&[0, 2], Verdict::Pass);

        assert_eq!(store.len(), 3);
        assert_eq!(store.get(&[0, 1]), Some(Verdict::Unresolved));
        assert_eq!(store.get(&[0, 1, 2]), Some(Verdict::Pass));
        assert_eq!(store.get(&[0]), None);
        assert_eq!(store.get(&[1]), None);
        assert_eq!(store.get(&[]), None);

        store.insert(&[0, 2], Verdict::Unresolved);
        assert_eq!(store.len(), 3);
        assert_eq!(store.get(&[0, 2]), Some(Verdict::Unresolved));
    }

    #[test]
    fn test_trie_fail_drops_extensions() {
        let mut store = TrieStore::new();
        store.insert(&[0, 1, 2, 3], Verdict::Pass);
        store.insert(&[0, 1, 3], Verdict::Pass);
        store.insert(&[0, 2], Verdict::Pass);

        store.insert(&[0, 1], Verdict::Fail);
        assert_eq!(store.len(), 2);
        assert_eq!(store.get(&[0, 1]), Some(Verdict::Fail));
        assert_eq!(store.get(&[0, 1, 3]), None);
        assert_eq!(store.get(&[0, 2]), Some(Verdict::Pass));

        store.clear();
        assert!(store.is_empty());
        assert_eq!(store.get(&[0, 1]), None);
    }

    #[test]
    fn test_hash_store() {
        let mut store = HashStore::new();
        store.insert(&[3, 4], Verdict::Fail);
        store.insert(&[3, 4, 5], Verdict::Pass);

        assert_eq!(store.len(), 2);
        assert_eq!(store.get(&[3, 4, 5]), Some(Verdict::Pass));
        assert_eq!(store.get(&[3]), None);
    }

    #[test]
    fn test_cache_kind_names() {
        assert_eq!(CacheKind::default(), CacheKind::Hash);
        assert_eq!(CacheKind::Trie.to_string(), "trie");
        assert_eq!(CacheKind::Hash.store().len(), 0);
    }
}
