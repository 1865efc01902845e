//! ChainedHashMap: separate-chaining table with head insertion and
//! `2n + 1` growth.

use crate::bucket::{Bucket, Chain, Entry, Node, Nodes};
use crate::reentrancy::DebugReentrancy;
use core::borrow::Borrow;
use core::fmt;
use core::hash::{BuildHasher, Hash};
use hashbrown::hash_map::DefaultHashBuilder;
use log::trace;

/// Bucket count of a fresh or cleared table, and the floor for any
/// requested initial capacity.
pub const DEFAULT_CAPACITY: usize = 4;

/// An insert that finds `len / capacity` at or above this value grows the
/// table before placing the new entry.
pub const LOAD_FACTOR_THRESHOLD: f64 = 0.5;

/// Bucket array plus node arena. Kept apart from the hasher and the
/// reentrancy guard so operations can hold the guard while mutating it.
struct Table<K, V> {
    buckets: Vec<Option<Bucket>>,
    nodes: Nodes<K, V>,
    size: usize,
}

impl<K, V> Table<K, V> {
    fn with_capacity(capacity: usize) -> Self {
        Self {
            buckets: vec![None; capacity],
            nodes: Nodes::new(),
            size: 0,
        }
    }

    fn capacity(&self) -> usize {
        self.buckets.len()
    }

    fn load_factor(&self) -> f64 {
        self.size as f64 / self.capacity() as f64
    }

    fn index_for(&self, hash: u64) -> usize {
        (hash % self.capacity() as u64) as usize
    }

    /// Link arena node `k` at the head of the bucket its hash selects,
    /// creating the bucket on first use.
    fn place(&mut self, k: slotmap::DefaultKey, hash: u64) {
        let index = self.index_for(hash);
        self.buckets[index]
            .get_or_insert_with(Bucket::default)
            .push_front(&mut self.nodes, k);
    }

    fn find<F>(&self, hash: u64, mut eq: F) -> Option<&Entry<K, V>>
    where
        F: FnMut(&K) -> bool,
    {
        let bucket = self.buckets[self.index_for(hash)].as_ref()?;
        let k = bucket.find(&self.nodes, |e| e.hash() == hash && eq(e.key()))?;
        Some(self.nodes[k].entry())
    }

    /// Detach the head-most node matching `eq`. Returns whether the bucket
    /// for `hash` exists, matched or not. `size` keeps counting the
    /// detached node until the next resize.
    fn remove_first<F>(&mut self, hash: u64, mut eq: F) -> bool
    where
        F: FnMut(&K) -> bool,
    {
        let index = self.index_for(hash);
        let Some(bucket) = self.buckets[index].as_mut() else {
            return false;
        };
        if let Some(k) = bucket.find(&self.nodes, |e| e.hash() == hash && eq(e.key())) {
            bucket.unlink(&mut self.nodes, k);
            self.nodes.remove(k);
        }
        true
    }

    /// Grow to `2 * capacity + 1` buckets and relocate every node.
    ///
    /// Old buckets are drained in array order and each chain head to tail;
    /// every node is pushed onto the front of its new bucket, so nodes that
    /// stay together end up in reverse order. `size` is recounted from the
    /// relocated nodes.
    fn grow(&mut self) {
        let old_capacity = self.capacity();
        let new_capacity = old_capacity * 2 + 1;
        let old = std::mem::replace(&mut self.buckets, vec![None; new_capacity]);
        self.size = 0;
        for bucket in old.into_iter().flatten() {
            let mut cursor = bucket.head();
            while let Some(k) = cursor {
                let node = &self.nodes[k];
                cursor = node.next();
                let hash = node.entry().hash();
                self.place(k, hash);
                self.size += 1;
            }
        }
        trace!(
            "chained table grew from {} to {} buckets, {} entries relocated",
            old_capacity,
            new_capacity,
            self.size
        );
    }

    fn reset(&mut self) {
        let dropped = self.nodes.len();
        *self = Self::with_capacity(DEFAULT_CAPACITY);
        trace!("chained table cleared, {} entries dropped", dropped);
    }
}

/// Hash table resolving collisions by separate chaining.
///
/// Each bucket is a doubly linked chain with the newest entry at its head.
/// Inserting a key that is already present does not replace the old entry:
/// a second node is linked in front of it and `lookup`/`remove` only ever
/// see the head-most match.
pub struct ChainedHashMap<K, V> {
    hasher: DefaultHashBuilder,
    table: Table<K, V>,
    reentrancy: DebugReentrancy,
}

impl<K, V> ChainedHashMap<K, V>
where
    K: Eq + Hash,
{
    /// Empty table with [`DEFAULT_CAPACITY`] buckets.
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    /// Empty table with `capacity` buckets. Requests below
    /// [`DEFAULT_CAPACITY`], zero included, get the default instead.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            hasher: DefaultHashBuilder::default(),
            table: Table::with_capacity(capacity.max(DEFAULT_CAPACITY)),
            reentrancy: DebugReentrancy::new(),
        }
    }

    /// Number of buckets.
    pub fn capacity(&self) -> usize {
        self.table.capacity()
    }

    /// The entry counter. Inserts always increment it; removals do not
    /// decrement it, so it can overcount until the next resize recounts.
    pub fn len(&self) -> usize {
        self.table.size
    }

    pub fn is_empty(&self) -> bool {
        self.table.size == 0
    }

    /// `len() / capacity()`.
    pub fn load_factor(&self) -> f64 {
        self.table.load_factor()
    }

    /// Bucket index `q` maps to under the current capacity.
    pub fn bucket_index<Q>(&self, q: &Q) -> usize
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash,
    {
        let _g = self.reentrancy.enter();
        self.table.index_for(self.hasher.hash_one(q))
    }

    /// Link a new entry at the head of its bucket, growing the table first
    /// when the load factor has reached [`LOAD_FACTOR_THRESHOLD`].
    pub fn insert(&mut self, key: K, value: V) {
        let _g = self.reentrancy.enter();
        if self.table.load_factor() >= LOAD_FACTOR_THRESHOLD {
            self.table.grow();
        }
        let hash = self.hasher.hash_one(&key);
        let k = self.table.nodes.insert(Node::new(Entry::new(key, value, hash)));
        self.table.place(k, hash);
        self.table.size += 1;
    }

    /// Value of the head-most entry whose key equals `q`.
    pub fn lookup<Q>(&self, q: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let _g = self.reentrancy.enter();
        let hash = self.hasher.hash_one(q);
        self.table
            .find(hash, |k| k.borrow() == q)
            .map(|e| e.value())
    }

    pub fn contains_key<Q>(&self, q: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.lookup(q).is_some()
    }

    /// Unlink the head-most entry whose key equals `q`.
    ///
    /// Returns `false` only when no bucket has been created at `q`'s index.
    /// When the bucket exists the result is `true` whether or not a matching
    /// entry was found in it. [`len`](Self::len) is left unchanged.
    pub fn remove<Q>(&mut self, q: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let _g = self.reentrancy.enter();
        let hash = self.hasher.hash_one(q);
        self.table.remove_first(hash, |k| k.borrow() == q)
    }

    /// Drop every entry and shrink back to [`DEFAULT_CAPACITY`] buckets.
    pub fn clear(&mut self) {
        let _g = self.reentrancy.enter();
        self.table.reset();
    }
}

impl<K, V> ChainedHashMap<K, V> {
    /// Every stored node, duplicates included. Order is unspecified.
    pub fn iter(&self) -> Iter<'_, K, V> {
        let nodes = &self.table.nodes;
        Iter {
            buckets: self.table.buckets.iter(),
            chain: Bucket::default().chain(nodes),
            nodes,
        }
    }
}

impl<K, V> Default for ChainedHashMap<K, V>
where
    K: Eq + Hash,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V> fmt::Debug for ChainedHashMap<K, V>
where
    K: fmt::Debug,
    V: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

impl<K, V> Extend<(K, V)> for ChainedHashMap<K, V>
where
    K: Eq + Hash,
{
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (k, v) in iter {
            self.insert(k, v);
        }
    }
}

impl<K, V> FromIterator<(K, V)> for ChainedHashMap<K, V>
where
    K: Eq + Hash,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut m = Self::new();
        m.extend(iter);
        m
    }
}

impl<'a, K, V> IntoIterator for &'a ChainedHashMap<K, V> {
    type Item = (&'a K, &'a V);
    type IntoIter = Iter<'a, K, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Iterator over the nodes of a `ChainedHashMap`, bucket by bucket.
pub struct Iter<'a, K, V> {
    buckets: core::slice::Iter<'a, Option<Bucket>>,
    chain: Chain<'a, K, V>,
    nodes: &'a Nodes<K, V>,
}

impl<'a, K, V> Iterator for Iter<'a, K, V> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some((_, node)) = self.chain.next() {
                let e = node.entry();
                return Some((e.key(), e.value()));
            }
            if let Some(bucket) = self.buckets.next()? {
                self.chain = bucket.chain(self.nodes);
            }
        }
    }
}

#[cfg(test)]
impl<K, V> ChainedHashMap<K, V>
where
    K: Eq + Hash,
{
    /// Panics unless every node sits in the bucket its key hashes to and
    /// every arena node is reachable from exactly one chain.
    pub(crate) fn assert_invariants(&self) {
        assert!(self.capacity() >= DEFAULT_CAPACITY);
        let mut reachable = 0;
        for (i, slot) in self.table.buckets.iter().enumerate() {
            let Some(bucket) = slot else { continue };
            for (_, node) in bucket.chain(&self.table.nodes) {
                let e = node.entry();
                assert_eq!(e.hash(), self.hasher.hash_one(e.key()), "stale stored hash");
                assert_eq!(self.table.index_for(e.hash()), i, "entry in wrong bucket");
                reachable += 1;
            }
        }
        assert_eq!(reachable, self.table.nodes.len(), "orphaned arena node");
    }

    pub(crate) fn bucket_exists(&self, index: usize) -> bool {
        self.table.buckets[index].is_some()
    }

    pub(crate) fn node_count(&self) -> usize {
        self.table.nodes.len()
    }
}
