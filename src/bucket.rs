//! Bucket chains: doubly linked lists of entries threaded through a
//! per-table node arena.
//!
//! A `Bucket` only stores the arena key of its head node; each node links
//! to its neighbours by arena key. Nodes are owned by the arena, the arena
//! is owned by the table, so nothing is shared or reference counted.

use slotmap::{DefaultKey, SlotMap};

/// An immutable key/value pair plus the hash computed for `key` when the
/// pair was inserted.
#[derive(Debug)]
pub(crate) struct Entry<K, V> {
    key: K,
    value: V,
    hash: u64,
}

impl<K, V> Entry<K, V> {
    pub(crate) fn new(key: K, value: V, hash: u64) -> Self {
        Self { key, value, hash }
    }

    pub(crate) fn key(&self) -> &K {
        &self.key
    }

    pub(crate) fn value(&self) -> &V {
        &self.value
    }

    pub(crate) fn hash(&self) -> u64 {
        self.hash
    }
}

#[derive(Debug)]
pub(crate) struct Node<K, V> {
    entry: Entry<K, V>,
    prev: Option<DefaultKey>,
    next: Option<DefaultKey>,
}

impl<K, V> Node<K, V> {
    pub(crate) fn new(entry: Entry<K, V>) -> Self {
        Self {
            entry,
            prev: None,
            next: None,
        }
    }

    pub(crate) fn entry(&self) -> &Entry<K, V> {
        &self.entry
    }

    pub(crate) fn next(&self) -> Option<DefaultKey> {
        self.next
    }
}

/// Arena holding every node of every bucket in one table.
pub(crate) type Nodes<K, V> = SlotMap<DefaultKey, Node<K, V>>;

/// Head of one chain. Newest node first.
#[derive(Copy, Clone, Debug, Default)]
pub(crate) struct Bucket {
    head: Option<DefaultKey>,
}

impl Bucket {
    pub(crate) fn head(&self) -> Option<DefaultKey> {
        self.head
    }

    #[cfg(test)]
    pub(crate) fn is_empty(&self) -> bool {
        self.head.is_none()
    }

    /// Link node `k` in front of the current head. Any links `k` carried
    /// from a previous chain are overwritten.
    pub(crate) fn push_front<K, V>(&mut self, nodes: &mut Nodes<K, V>, k: DefaultKey) {
        let old_head = self.head;
        {
            let node = &mut nodes[k];
            node.prev = None;
            node.next = old_head;
        }
        if let Some(h) = old_head {
            nodes[h].prev = Some(k);
        }
        self.head = Some(k);
    }

    /// Detach node `k` from this chain. The node stays in the arena with
    /// cleared links; the caller decides whether to free or relink it.
    pub(crate) fn unlink<K, V>(&mut self, nodes: &mut Nodes<K, V>, k: DefaultKey) {
        let (prev, next) = {
            let node = &mut nodes[k];
            (node.prev.take(), node.next.take())
        };
        match prev {
            Some(p) => nodes[p].next = next,
            None => self.head = next,
        }
        if let Some(n) = next {
            nodes[n].prev = prev;
        }
    }

    /// First node, walking head to tail, whose entry satisfies `pred`.
    pub(crate) fn find<K, V, F>(&self, nodes: &Nodes<K, V>, mut pred: F) -> Option<DefaultKey>
    where
        F: FnMut(&Entry<K, V>) -> bool,
    {
        self.chain(nodes)
            .find(|&(_, node)| pred(&node.entry))
            .map(|(k, _)| k)
    }

    /// Walk the chain head to tail.
    pub(crate) fn chain<'a, K, V>(&self, nodes: &'a Nodes<K, V>) -> Chain<'a, K, V> {
        Chain {
            nodes,
            cursor: self.head,
        }
    }
}

/// Head-to-tail walk over one bucket.
pub(crate) struct Chain<'a, K, V> {
    nodes: &'a Nodes<K, V>,
    cursor: Option<DefaultKey>,
}

impl<'a, K, V> Iterator for Chain<'a, K, V> {
    type Item = (DefaultKey, &'a Node<K, V>);

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        let k = self.cursor?;
        let node = &self.nodes[k];
        self.cursor = node.next;
        Some((k, node))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn push(
        bucket: &mut Bucket,
        nodes: &mut Nodes<&'static str, i32>,
        key: &'static str,
        v: i32,
    ) -> DefaultKey {
        let k = nodes.insert(Node::new(Entry::new(key, v, 0)));
        bucket.push_front(nodes, k);
        k
    }

    fn values(bucket: &Bucket, nodes: &Nodes<&'static str, i32>) -> Vec<i32> {
        bucket.chain(nodes).map(|(_, n)| *n.entry().value()).collect()
    }

    /// Invariant: `push_front` places the newest node at the head.
    #[test]
    fn push_front_orders_newest_first() {
        let mut nodes = Nodes::new();
        let mut b = Bucket::default();
        assert!(b.is_empty());
        push(&mut b, &mut nodes, "a", 1);
        push(&mut b, &mut nodes, "b", 2);
        push(&mut b, &mut nodes, "c", 3);
        assert_eq!(values(&b, &nodes), vec![3, 2, 1]);
    }

    /// Invariant: unlinking head, middle or tail keeps the remaining chain
    /// intact in both directions.
    #[test]
    fn unlink_head_middle_tail() {
        let mut nodes = Nodes::new();
        let mut b = Bucket::default();
        let k1 = push(&mut b, &mut nodes, "a", 1);
        let k2 = push(&mut b, &mut nodes, "b", 2);
        let k3 = push(&mut b, &mut nodes, "c", 3);
        let k4 = push(&mut b, &mut nodes, "d", 4);

        b.unlink(&mut nodes, k2);
        assert_eq!(values(&b, &nodes), vec![4, 3, 1]);
        assert_eq!(nodes[k1].prev, Some(k3));

        b.unlink(&mut nodes, k4);
        assert_eq!(values(&b, &nodes), vec![3, 1]);
        assert_eq!(nodes[k3].prev, None);

        b.unlink(&mut nodes, k1);
        assert_eq!(values(&b, &nodes), vec![3]);
        assert_eq!(nodes[k3].next, None);

        b.unlink(&mut nodes, k3);
        assert!(b.is_empty());
    }

    /// Invariant: `find` returns the head-most match only.
    #[test]
    fn find_returns_first_match_from_head() {
        let mut nodes = Nodes::new();
        let mut b = Bucket::default();
        push(&mut b, &mut nodes, "k", 1);
        let newer = push(&mut b, &mut nodes, "k", 2);
        push(&mut b, &mut nodes, "x", 3);
        assert_eq!(b.find(&nodes, |e| *e.key() == "k"), Some(newer));
        assert_eq!(b.find(&nodes, |e| *e.key() == "zz"), None);
    }

    /// Invariant: relinking a node into another chain discards its old links.
    #[test]
    fn push_front_overwrites_stale_links() {
        let mut nodes = Nodes::new();
        let mut from = Bucket::default();
        let k1 = push(&mut from, &mut nodes, "a", 1);
        let k2 = push(&mut from, &mut nodes, "b", 2);

        let mut to = Bucket::default();
        to.push_front(&mut nodes, k2);
        assert_eq!(values(&to, &nodes), vec![2]);
        to.push_front(&mut nodes, k1);
        assert_eq!(values(&to, &nodes), vec![1, 2]);
        assert_eq!(nodes[k2].prev, Some(k1));
        assert_eq!(nodes[k2].next, None);
    }
}
