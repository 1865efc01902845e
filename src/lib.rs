//! chained-hashmap: a single-threaded hash table that resolves collisions
//! by separate chaining.
//!
//! Internal Design:
//!
//! Summary
//! - Goal: keep the bucketing, growth and relocation rules small and
//!   explicit so each can be checked on its own.
//! - Layers:
//!   - `bucket`: immutable `Entry` records, a generational node arena
//!     (`slotmap`), and `Bucket`, a doubly linked chain threaded through
//!     that arena with the newest node at its head.
//!   - `ChainedHashMap<K, V>`: the bucket array, the entry counter, the
//!     hasher, and the load-factor policy that triggers growth.
//!
//! Table rules
//! - Capacity starts at [`DEFAULT_CAPACITY`] (or the requested value if
//!   larger) and never drops below it.
//! - An insert that sees `len / capacity >= LOAD_FACTOR_THRESHOLD` first
//!   grows the table to `2 * capacity + 1` buckets, alternating the parity
//!   of the modulus, and relocates every node.
//! - Buckets are created lazily on first placement and, once created,
//!   persist until the next growth or `clear`.
//! - `clear` drops everything and returns to [`DEFAULT_CAPACITY`].
//!
//! Multi-entry keys
//! - Inserts never replace: a repeated key gets a new node at the head of
//!   its chain. `lookup` and `remove` act on the head-most match only.
//! - Growth drains each old chain head to tail and pushes every node onto
//!   the front of its new chain, so duplicates that stay together swap
//!   precedence.
//!
//! Counter semantics
//! - `len()` counts inserts since the last growth or `clear`; `remove`
//!   unlinks a node without decrementing it, so `len()` and
//!   `load_factor()` overcount until growth recounts relocated nodes.
//! - `remove` returns `true` whenever the bucket at the key's index
//!   exists, whether or not a matching node was found in it.
//!
//! Hasher and rehashing invariants
//! - Each entry stores the `u64` hash computed at insertion; relocation
//!   uses the stored hash, so `K: Hash` is never invoked after insertion.
//! - Hashes are unsigned, so the bucket index is `hash % capacity`
//!   without any sign normalization.
//!
//! Reentrancy
//! - Single-threaded: the table is `!Sync`. Public operations open a
//!   debug-only reentrancy guard before calling into `K: Hash`/`K: Eq`;
//!   re-entering the table from those impls panics in debug builds.

mod bucket;
mod chained_hash_map;
mod chained_hash_map_proptest;
mod reentrancy;

// Public surface
pub use chained_hash_map::{ChainedHashMap, Iter, DEFAULT_CAPACITY, LOAD_FACTOR_THRESHOLD};
