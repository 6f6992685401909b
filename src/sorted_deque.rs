//! The `sorted_deque` module exposes the [`SortedDeque`] container, as
//! well as its associated traits.
//!
//! A [`SortedDeque`] wraps a [`SlidingDeque`] to implement a special
//! case of sorted containers:
//!
//! - values are inserted at the back, in ascending key order; the rare
//!   out-of-order arrival is relocated to its sorted position
//! - values may be searched for by key (with binary search)
//! - values may be marked as logically erased anywhere, but are only
//!   physically deleted once they become the first or last value in
//!   FIFO (sorted) order
//!
//! Insertion amortises to constant time, lookups are logarithmic time
//! (in the number of *physically* stored values, since items that are
//! logically but not yet physically deleted still participate in the
//! search), and deletion takes as much time as a lookup plus some
//! amortised constant-time cleanup.
//!
//! The container tracks its tombstones exactly: the logical size is
//! always the physical size minus the erased count, and the physical
//! front and back are always live.  We could also periodically compact
//! away interior tombstones at an amortised constant-time cost; that is
//! not implemented because we expect most deletions to happen in FIFO
//! order, in which case amortised sweeping is a useless complication.
use std::cmp::Ordering;

use crate::quick_key::QuickKey;
use crate::sliding_deque::PushTruncateContainer;
use crate::sliding_deque::SlidingDeque;

/// In the general case, a [`SortedDeque`] accepts an object that
/// implements the read-only methods we need on an arbitrary item type.
///
/// There is a blanket definition for `(Key, Option<Value>)` pairs where
/// the pair is [`Copy`]able, and the `Key` implements [`Ord`].
///
/// There is also a default definition for types that implement
/// [`SortedDequeItem`].
pub trait SortedDequeComparator<T> {
    /// Items have a key for comparisons.  The simple case is that the
    /// whole `T` is the comparison key, but it makes sense to have a
    /// subset of the item as a key, e.g., for key-value pairs.
    ///
    /// Lookup operations work in terms of `Key`, not `T`.  The key is
    /// immutable once the item is inserted.
    type Key;

    /// We can extract a comparison key from an item.
    ///
    /// The key is returned by value to allow complex extraction logic,
    /// and because `T` must be copyable to fit in a [`SlidingDeque`].
    fn extract_key(&self, item: &T) -> Self::Key;

    /// And we can compare keys.
    fn cmp(&self, x: &Self::Key, y: &Self::Key) -> std::cmp::Ordering;

    /// Check whether an item is erased.
    ///
    /// Defaults to always false; should be overridden when
    /// [`SortedDequeMarker`] is implemented.
    #[inline(always)]
    fn is_erased(&self, item: &T) -> bool {
        let _ = item;
        false
    }
}

/// A [`SortedDequeMarker`] is a [`SortedDequeComparator`] that can also
/// mark items as erased (tombstoned): the one-way transition out of the
/// logical view.
///
/// There is a blanket definition for `(Key, Option<Value>)` pairs where
/// the pair is [`Copy`]able, and the `Key` implements [`Ord`]: a `None`
/// value represents a logically erased item.
///
/// There is also a default definition for types that implement
/// [`SortedDequeItem`].
pub trait SortedDequeMarker<T>: SortedDequeComparator<T> {
    /// We can mark an item as erased.
    ///
    /// Implementors of this trait must also implement
    /// [`SortedDequeComparator::is_erased`].
    fn mark_erased(&self, item: &mut T);
}

/// In the simple case, [`SortedDeque`] supports any type that
/// implements [`Ord`] and the new `mark_erased` / `is_erased`
/// operations: we'll just compare the whole object.
pub trait SortedDequeItem: Ord {
    /// Marks the item as erased.
    fn mark_erased(&mut self);

    /// Determines whether the item was erased.
    fn is_erased(&self) -> bool;
}

impl<T: SortedDequeItem + Copy> SortedDequeComparator<T> for () {
    type Key = T;

    #[inline(always)]
    fn extract_key(&self, item: &T) -> T {
        *item
    }

    #[inline(always)]
    fn cmp(&self, x: &T, y: &T) -> Ordering {
        x.cmp(y)
    }

    #[inline(always)]
    fn is_erased(&self, item: &T) -> bool {
        item.is_erased()
    }
}

impl<T: SortedDequeItem + Copy> SortedDequeMarker<T> for () {
    #[inline(always)]
    fn mark_erased(&self, item: &mut T) {
        item.mark_erased();
        assert!(item.is_erased());
    }
}

/// We also have an easy implementation for pairs of key and optional value.
impl<Key: Copy + Ord, Value: Copy> SortedDequeComparator<(Key, Option<Value>)> for () {
    type Key = Key;

    #[inline(always)]
    fn extract_key(&self, item: &(Key, Option<Value>)) -> Key {
        item.0
    }

    #[inline(always)]
    fn cmp(&self, x: &Key, y: &Key) -> Ordering {
        x.cmp(y)
    }

    #[inline(always)]
    fn is_erased(&self, item: &(Key, Option<Value>)) -> bool {
        item.1.is_none()
    }
}

impl<Key: Copy + Ord, Value: Copy> SortedDequeMarker<(Key, Option<Value>)> for () {
    #[inline(always)]
    fn mark_erased(&self, item: &mut (Key, Option<Value>)) {
        item.1 = None;
    }
}

/// A [`SortedDeque`] is a contiguous container wrapped in a restricted
/// sorted container.
///
/// Items may be:
///
/// - inserted at the back in amortised constant time (out-of-order
///   arrivals take a rare linear-time relocation path)
/// - inserted at the front, when strictly smaller than the current front
/// - popped from either end in amortised constant time
/// - searched for in logarithmic time (as a function of *physically*
///   stored items)
/// - removed by key in amortised logarithmic time, or by [`QuickKey`]
///   in amortised constant time
///
/// Removal from the middle only erases logically; the tombstone stays
/// resident until it drifts to an end, where the next pop or removal
/// trims it off.  The exact tombstone count is tracked so the logical
/// [`len`](SortedDeque::len) stays constant-time.
#[derive(Debug)]
pub struct SortedDeque<Container, Marker = ()>
where
    Container: PushTruncateContainer + Clone + Default,
    <Container as PushTruncateContainer>::Item: Copy,
    Marker: SortedDequeComparator<<Container as PushTruncateContainer>::Item> + Clone,
{
    /// Values in the `items` deque may be logically erased, except for
    /// the first/last: we always clean up from both ends.
    items: SlidingDeque<Container>,
    marker: Marker,
    /// Count of physically present but logically erased values.
    erased: usize,
    /// Bumped by every mutation that shifts physical indices.  A
    /// [`QuickKey`] stamped with an older generation is stale, and is
    /// rejected instead of silently resolving to whatever value now
    /// sits at its index.
    generation: u64,
}

impl<Container, Marker> Default for SortedDeque<Container, Marker>
where
    Container: PushTruncateContainer + Clone + Default,
    Container::Item: Copy,
    Marker: SortedDequeComparator<Container::Item> + Clone + Default,
{
    #[inline(always)]
    fn default() -> Self {
        Self::new(Default::default(), Default::default())
    }
}

impl<Container, Marker> SortedDeque<Container, Marker>
where
    Container: PushTruncateContainer + Clone + Default,
    Container::Item: Copy,
    Marker: SortedDequeComparator<Container::Item> + Clone,
{
    /// Creates a fresh [`SortedDeque`] from the given `items` and
    /// `marker`.
    ///
    /// The initial `items` are trusted to already be sorted in ascending
    /// key order, with no erased value.
    #[must_use]
    #[inline(always)]
    pub fn new(items: Container, marker: Marker) -> Self {
        let ret = Self {
            items: items.into(),
            marker,
            erased: 0,
            generation: 0,
        };

        ret.check_rep();
        ret
    }

    /// Pushes `item` at the back of the [`SortedDeque`].
    ///
    /// The fast path expects the item's key to be strictly greater than
    /// the current back's; an out-of-order arrival is relocated to its
    /// sorted position with a linear-time shift.  Equal keys land
    /// *before* any already present equal key (lower-bound placement).
    ///
    /// No-ops if `item` is already erased.
    pub fn push_back(&mut self, item: Container::Item) {
        if self.marker.is_erased(&item) {
            return;
        }

        self.check_rep();

        if let Some(back) = self.items.back() {
            let key = self.marker.extract_key(&item);
            if self.marker.cmp(&self.marker.extract_key(back), &key) != Ordering::Less {
                self.relocate_back(item, key);
                return;
            }
        }

        self.items.push_back(item);
        self.check_rep();
    }

    /// Pushes `item` at the back of the [`SortedDeque`].
    ///
    /// Panics if the `item` isn't strictly greater than the last
    /// element, if any: use this instead of
    /// [`push_back`](SortedDeque::push_back) when an out-of-order
    /// arrival is a programmer error rather than a fact of life.
    ///
    /// No-ops if `item` is already erased.
    pub fn push_back_or_panic(&mut self, item: Container::Item) {
        if self.marker.is_erased(&item) {
            return;
        }

        self.check_rep();

        if let Some(back) = self.items.back() {
            assert_eq!(
                self.marker.cmp(
                    &self.marker.extract_key(back),
                    &self.marker.extract_key(&item)
                ),
                Ordering::Less
            );
        }

        self.items.push_back(item);
        self.check_rep();
    }

    /// Pushes `item` at the front of the [`SortedDeque`].
    ///
    /// Panics unless the item's key is strictly less than the current
    /// front's, or the item is erased: unlike
    /// [`push_back`](SortedDeque::push_back), front insertion has no
    /// relocation path.
    pub fn push_front(&mut self, item: Container::Item) {
        assert!(!self.marker.is_erased(&item));
        self.check_rep();

        if let Some(front) = self.items.front() {
            assert_eq!(
                self.marker.cmp(
                    &self.marker.extract_key(&item),
                    &self.marker.extract_key(front)
                ),
                Ordering::Less
            );
        }

        self.items.push_front(item);
        self.generation = self.generation.wrapping_add(1);
        self.check_rep();
    }

    /// Removes all items from `self`.
    #[inline(always)]
    pub fn clear(&mut self) {
        self.check_rep();

        self.items.clear();
        self.erased = 0;
        self.generation = self.generation.wrapping_add(1);
        self.check_rep();
    }

    /// Determines whether we have no item in the container.
    #[must_use]
    #[inline(always)]
    pub fn is_empty(&self) -> bool {
        self.check_rep();

        self.items.is_empty()
    }

    /// Returns the logical size of the container: the number of live
    /// (non-erased) items.
    #[must_use]
    pub fn len(&self) -> usize {
        self.check_rep();

        let physical = self.items.len();
        if physical <= 1 {
            debug_assert_eq!(self.erased, 0);
            return physical;
        }

        // Both edges are live, so the tombstones can never swallow the
        // whole of a multi-item deque.
        let net = physical - self.erased;
        debug_assert!(net > 1);
        net
    }

    /// Returns the physical size of the container: all stored items,
    /// tombstones included.
    #[must_use]
    #[inline(always)]
    pub fn physical_len(&self) -> usize {
        self.items.len()
    }

    /// Returns an iterator for the (non-erased) items in the
    /// [`SortedDeque`], in FIFO (and thus sorted) order.
    ///
    /// The iterator is double-ended: `.rev()` yields the same live items
    /// in descending key order.  Tombstones are skipped transparently in
    /// both directions.
    #[inline(always)]
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &Container::Item> {
        self.check_rep();

        self.items
            .iter()
            .filter(|item| !self.marker.is_erased(item))
    }

    /// Returns an iterator for the (non-erased) items at or after `key`'s
    /// position, in FIFO order.
    ///
    /// This is the checked consumption of a [`QuickKey`]: a key that is
    /// invalid, stale, out of bounds, or that points at a tombstone
    /// yields an empty iterator rather than a dangling position.
    pub fn iter_from(&self, key: QuickKey) -> impl DoubleEndedIterator<Item = &Container::Item> {
        self.check_rep();

        let start = match self.quick_key_index(key) {
            Some(idx) if !self.marker.is_erased(&self.items[idx]) => idx,
            _ => self.items.len(),
        };

        self.items[start..]
            .iter()
            .filter(|item| !self.marker.is_erased(item))
    }

    /// Returns the first (least-keyed) item, if we have one.
    #[must_use]
    #[inline(always)]
    pub fn first(&self) -> Option<&Container::Item> {
        self.check_rep();

        self.items.front()
    }

    /// Consumes and returns the first item.
    #[inline(never)]
    pub fn pop_first(&mut self) -> Option<Container::Item> {
        self.check_rep();

        let ret = self.items.pop_front()?;
        self.generation = self.generation.wrapping_add(1);
        self.cleanup_front();

        self.check_rep();

        Some(ret)
    }

    /// Returns the last (highest-keyed) item, if we have one.
    #[must_use]
    #[inline(always)]
    pub fn last(&self) -> Option<&Container::Item> {
        self.check_rep();

        self.items.back()
    }

    /// Consumes and returns the last item.
    #[inline(never)]
    pub fn pop_last(&mut self) -> Option<Container::Item> {
        self.check_rep();

        let ret = self.items.pop_back()?;
        self.cleanup_back();

        self.check_rep();

        Some(ret)
    }

    /// Looks for the item that matches `key`.
    ///
    /// A tombstone that still matches by key behaves as absent.
    #[must_use]
    pub fn find(&self, key: &Marker::Key) -> Option<&Container::Item> {
        self.check_rep();

        let idx = self.find_index(key)?;

        let item = &self.items[idx];
        if self.marker.is_erased(item) {
            None
        } else {
            Some(item)
        }
    }

    /// Looks for the item that matches `key`, and returns a [`QuickKey`]
    /// for constant-time re-access instead of a reference.
    ///
    /// The dominant lookup pattern targets the current front, so that
    /// case is special-cased to a single key comparison, without any
    /// binary search.  Absent (or tombstoned) keys yield the invalid
    /// quick key.
    #[must_use]
    pub fn find_front(&self, key: &Marker::Key) -> QuickKey {
        self.check_rep();

        if let Some(front) = self.items.front() {
            if self.marker.cmp(&self.marker.extract_key(front), key) == Ordering::Equal {
                return QuickKey::new(0, self.generation);
            }

            if let Some(idx) = self.find_index(key) {
                if !self.marker.is_erased(&self.items[idx]) {
                    return QuickKey::new(idx, self.generation);
                }
            }
        }

        QuickKey::invalid()
    }

    /// Finds the index of the item that corresponds to `key`, if any.
    ///
    /// The search runs over the whole physical slice, tombstones
    /// included: erased items keep their position and key.
    fn find_index(&self, key: &Marker::Key) -> Option<usize> {
        let back = self.items.back()?;

        // A key past the physical back cannot match; skip the search.
        if self.marker.cmp(key, &self.marker.extract_key(back)) == Ordering::Greater {
            return None;
        }

        let idx = self.lower_bound(key);
        debug_assert!(idx < self.items.len());

        if self.marker.cmp(&self.marker.extract_key(&self.items[idx]), key) == Ordering::Equal {
            Some(idx)
        } else {
            None
        }
    }

    /// Returns the first physical index whose key is not less than `key`
    /// (lower-bound semantics), up to the physical size.
    #[inline(always)]
    fn lower_bound(&self, key: &Marker::Key) -> usize {
        self.items
            .partition_point(|item| self.marker.cmp(&self.marker.extract_key(item), key) == Ordering::Less)
    }

    /// Maps `key` back to a physical index, if the key is still live
    /// with respect to the current layout: valid, stamped with the
    /// current generation, and in bounds.
    fn quick_key_index(&self, key: QuickKey) -> Option<usize> {
        if key.is_valid() && key.generation() == self.generation && key.index() < self.items.len()
        {
            Some(key.index())
        } else {
            None
        }
    }

    /// The out-of-order slow path for
    /// [`push_back`](SortedDeque::push_back): kept out of line so the
    /// common append stays branch-predictable.
    #[inline(never)]
    fn relocate_back(&mut self, item: Container::Item, key: Marker::Key) {
        let dst = self.lower_bound(&key);
        debug_assert!(dst < self.items.len());

        self.items.push_back(item);
        self.items[dst..].rotate_right(1);

        // Every index at or after `dst` just shifted.
        self.generation = self.generation.wrapping_add(1);
        self.check_rep();
    }

    /// Removes the newly exposed erased items at the front of the
    /// underlying deque.
    fn cleanup_front(&mut self) {
        // The physical back is live whenever the deque is non-empty, so
        // an erased prefix never extends over the whole deque.
        let run = self
            .items
            .iter()
            .take_while(|item| self.marker.is_erased(item))
            .count();

        if run > 0 {
            let dropped = self.items.advance(run);
            debug_assert_eq!(dropped, run);
            self.erased -= run;
            self.generation = self.generation.wrapping_add(1);
        }
    }

    /// Removes the newly exposed erased items at the back of the
    /// underlying deque.
    fn cleanup_back(&mut self) {
        while let Some(back) = self.items.back() {
            if !self.marker.is_erased(back) {
                break;
            }

            self.items.pop_back();
            self.erased -= 1;
        }
    }

    #[inline(always)]
    #[cfg_attr(test, mutants::skip)] // obviously, removing checks will not be detected.
    fn check_rep(&self) {
        // First item, if any, must not be erased.
        debug_assert_ne!(
            self.items.front().map(|x| self.marker.is_erased(x)),
            Some(true)
        );

        // Last item, if any, must not be erased.
        debug_assert_ne!(
            self.items.back().map(|x| self.marker.is_erased(x)),
            Some(true)
        );

        // The erased count is exact: live edges leave at most
        // `physical - 2` slots for tombstones.
        if self.items.len() <= 1 {
            debug_assert_eq!(self.erased, 0);
        } else {
            debug_assert!(self.erased <= self.items.len() - 2);
        }
    }
}

impl<Container, Marker> SortedDeque<Container, Marker>
where
    Container: PushTruncateContainer + Clone + Default,
    Container::Item: Copy,
    Marker: SortedDequeMarker<Container::Item> + Clone,
{
    /// Looks for the item that matches `key`, and removes it if it is
    /// found.
    ///
    /// Once removed, an item will not be found again.  Returns `None`,
    /// with the container untouched, when `key` is absent or already
    /// tombstoned.
    #[inline(never)]
    pub fn remove(&mut self, key: &Marker::Key) -> Option<Container::Item> {
        let idx = self.find_index(key)?;

        if self.marker.is_erased(&self.items[idx]) {
            self.check_rep();
            return None;
        }

        self.remove_at(idx)
    }

    /// Removes the item a previously issued `key` points at, bypassing
    /// the binary search.
    ///
    /// Returns `None`, with the container untouched, when `key` is
    /// invalid, stale, or points at a tombstone.
    pub fn remove_quick(&mut self, key: QuickKey) -> Option<Container::Item> {
        let idx = self.quick_key_index(key)?;

        if self.marker.is_erased(&self.items[idx]) {
            self.check_rep();
            return None;
        }

        self.remove_at(idx)
    }

    /// Removes the live item at physical index `idx`.
    fn remove_at(&mut self, idx: usize) -> Option<Container::Item> {
        let len = self.items.len();

        if idx == 0 {
            // The `pop_first` method is better for large batches;
            // prefer to call that if we removed the first item.
            self.pop_first()
        } else if idx == len - 1 {
            self.pop_last()
        } else {
            // Deletion from the middle, can only erase logically.
            let item = &mut self.items[idx];
            let ret = *item;

            self.marker.mark_erased(item);
            assert!(self.marker.is_erased(item));

            self.erased += 1;
            self.check_rep();
            Some(ret)
        }
    }
}

/// Cloning filters the tombstones out: the clone holds exactly the live
/// items, in order, with a zero erased count and a minimal footprint.
impl<Container, Marker> Clone for SortedDeque<Container, Marker>
where
    Container: PushTruncateContainer + Clone + Default,
    Container::Item: Copy,
    Marker: SortedDequeComparator<Container::Item> + Clone,
{
    fn clone(&self) -> Self {
        self.check_rep();

        let mut items = Container::default();
        for item in self.iter() {
            items.push(*item);
        }

        Self {
            items: items.into(),
            marker: self.marker.clone(),
            erased: 0,
            generation: 0,
        }
    }
}

impl<Container, Marker> std::ops::Index<QuickKey> for SortedDeque<Container, Marker>
where
    Container: PushTruncateContainer + Clone + Default,
    Container::Item: Copy,
    Marker: SortedDequeComparator<Container::Item> + Clone,
{
    type Output = Container::Item;

    /// Trusted positional access for a freshly issued [`QuickKey`]:
    /// panics on an invalid or stale key, but does not re-check the
    /// erased flag.
    #[inline(always)]
    fn index(&self, key: QuickKey) -> &Container::Item {
        assert!(key.is_valid());
        assert_eq!(key.generation(), self.generation, "stale quick key");

        &self.items[key.index()]
    }
}

#[cfg(test)]
#[derive(Clone, Copy, Debug, Ord, PartialOrd, Eq, PartialEq)]
struct TestItem {
    key: u32,
    value: Option<std::num::NonZeroU32>,
}

#[cfg(test)]
impl SortedDequeItem for TestItem {
    fn mark_erased(&mut self) {
        self.value = None
    }

    fn is_erased(&self) -> bool {
        self.value.is_none()
    }
}

#[cfg(test)]
fn test_item(key: u32) -> TestItem {
    TestItem {
        key,
        value: Some(1.try_into().unwrap()),
    }
}

#[cfg(test)]
#[derive(Clone, Copy, Debug, Ord, PartialOrd, Eq, PartialEq)]
struct KeyOnlyTestItem {
    key: u32,
}

#[cfg(test)]
impl SortedDequeComparator<KeyOnlyTestItem> for () {
    type Key = u32;

    #[inline(always)]
    fn extract_key(&self, item: &KeyOnlyTestItem) -> Self::Key {
        item.key
    }

    #[inline(always)]
    fn cmp(&self, x: &u32, y: &u32) -> std::cmp::Ordering {
        x.cmp(y)
    }
}

/// A marker that counts key comparisons, to confirm which lookups hit
/// the binary search.
#[cfg(test)]
#[derive(Clone, Debug, Default)]
struct CountingMarker {
    comparisons: std::cell::Cell<usize>,
}

#[cfg(test)]
impl SortedDequeComparator<(u32, Option<()>)> for CountingMarker {
    type Key = u32;

    fn extract_key(&self, item: &(u32, Option<()>)) -> u32 {
        item.0
    }

    fn cmp(&self, x: &u32, y: &u32) -> Ordering {
        self.comparisons.set(self.comparisons.get() + 1);
        x.cmp(y)
    }

    fn is_erased(&self, item: &(u32, Option<()>)) -> bool {
        item.1.is_none()
    }
}

#[cfg(test)]
impl SortedDequeMarker<(u32, Option<()>)> for CountingMarker {
    fn mark_erased(&self, item: &mut (u32, Option<()>)) {
        item.1 = None;
    }
}

#[test]
fn test_happy_path_miri() {
    let mut deque: SortedDeque<Vec<TestItem>> = Default::default();

    assert!(deque.is_empty());
    assert_eq!(deque.len(), 0);
    assert_eq!(deque.first(), None);
    assert_eq!(deque.pop_first(), None);
    assert_eq!(deque.last(), None);
    assert_eq!(deque.pop_last(), None);

    let item = test_item(0);
    assert_eq!(deque.find(&item), None);
    assert_eq!(deque.iter().copied().collect::<Vec<_>>(), []);

    deque.push_back(item);
    assert!(!deque.is_empty());
    assert_eq!(deque.len(), 1);
    assert_eq!(deque.physical_len(), 1);
    assert_eq!(deque.iter().copied().collect::<Vec<_>>(), [item]);

    // Clearing should work
    deque.clear();
    assert!(deque.is_empty());
    assert_eq!(deque.iter().copied().collect::<Vec<_>>(), []);

    // Put it back in.
    deque.push_back(item);

    assert_eq!(deque.first(), Some(&item));
    assert_eq!(deque.last(), Some(&item));

    assert_eq!(deque.find(&item), Some(&item));
    // No false match.
    assert_eq!(deque.find(&test_item(1)), None);
    assert_eq!(
        deque.find(&TestItem {
            key: 0,
            value: None
        }),
        None
    );

    assert_eq!(deque.remove(&item), Some(item));

    assert!(deque.is_empty());
}

#[test]
fn test_happy_path_key_only_miri() {
    let mut deque: SortedDeque<Vec<KeyOnlyTestItem>> = Default::default();

    assert!(deque.is_empty());
    assert_eq!(deque.first(), None);
    assert_eq!(deque.pop_first(), None);
    assert_eq!(deque.last(), None);
    assert_eq!(deque.pop_last(), None);

    let item = KeyOnlyTestItem { key: 0 };
    assert_eq!(deque.find(&0), None);
    assert_eq!(deque.iter().copied().collect::<Vec<_>>(), []);

    deque.push_back(item);
    assert!(!deque.is_empty());
    assert_eq!(deque.iter().copied().collect::<Vec<_>>(), [item]);

    // Clearing should work
    deque.clear();
    assert!(deque.is_empty());
    assert_eq!(deque.iter().copied().collect::<Vec<_>>(), []);

    // Put it back in.
    deque.push_back(item);
    assert_eq!(deque.first(), Some(&item));
    assert_eq!(deque.last(), Some(&item));

    // No false match.
    assert_eq!(deque.find(&1), None);
}

#[test]
fn test_remove_middle_miri() {
    let mut deque: SortedDeque<Vec<TestItem>> = Default::default();

    let items = [
        test_item(0),
        test_item(1),
        test_item(2),
        // This one is already erased, should no-op.
        TestItem {
            key: 0,
            value: None,
        },
    ];
    assert_eq!(deque.find(&items[0]), None);

    deque.push_back(items[0]);
    deque.push_back(items[1]);
    deque.push_back(items[2]);
    deque.push_back(items[3]);

    assert_eq!(deque.iter().map(|x| x.key).collect::<Vec<_>>(), [0, 1, 2]);
    assert_eq!(deque.len(), 3);
    assert_eq!(deque.physical_len(), 3);

    assert_eq!(deque.first(), Some(&items[0]));
    assert_eq!(deque.last(), Some(&items[2]));

    assert_eq!(deque.find(&items[0]), Some(&items[0]));
    assert_eq!(deque.find(&items[1]), Some(&items[1]));
    assert_eq!(deque.find(&items[2]), Some(&items[2]));
    assert_eq!(deque.find(&items[3]), None);

    assert_eq!(deque.remove(&items[1]), Some(items[1]));

    // The middle tombstone stays physically resident.
    assert_eq!(deque.len(), 2);
    assert_eq!(deque.physical_len(), 3);
    assert_eq!(deque.erased, 1);

    assert_eq!(deque.iter().map(|x| x.key).collect::<Vec<_>>(), [0, 2]);
    assert_eq!(deque.find(&items[0]), Some(&items[0]));
    assert_eq!(deque.find(&items[1]), None);
    assert_eq!(deque.find(&items[2]), Some(&items[2]));

    // Removing an already removed key is a no-op failure.
    assert_eq!(deque.remove(&items[1]), None);
    assert_eq!(deque.len(), 2);

    assert_eq!(deque.remove(&items[0]), Some(items[0]));

    // Popping the front trimmed the tombstone off.
    assert_eq!(deque.physical_len(), 1);
    assert_eq!(deque.erased, 0);
    assert_eq!(deque.first(), Some(&items[2]));
    assert_eq!(deque.last(), Some(&items[2]));

    assert_eq!(deque.remove(&items[2]), Some(items[2]));

    assert!(deque.is_empty());
}

#[test]
fn test_remove_middle_then_pop_miri() {
    let mut deque: SortedDeque<Vec<TestItem>> = Default::default();

    let items = [test_item(0), test_item(1), test_item(2)];
    assert_eq!(deque.find(&items[0]), None);

    deque.push_back(items[0]);
    deque.push_back(items[1]);
    deque.push_back(items[2]);

    assert!(!deque.is_empty());

    assert_eq!(deque.first(), Some(&items[0]));
    assert_eq!(deque.last(), Some(&items[2]));

    assert_eq!(deque.remove(&items[1]), Some(items[1]));

    assert_eq!(deque.find(&items[0]), Some(&items[0]));
    assert_eq!(deque.find(&items[1]), None);
    assert_eq!(deque.find(&items[2]), Some(&items[2]));

    assert_eq!(deque.pop_last(), Some(items[2]));

    // Popping the back exposed the tombstone; it's gone now.
    assert_eq!(deque.physical_len(), 1);
    assert_eq!(deque.erased, 0);

    assert_eq!(deque.find(&items[0]), Some(&items[0]));
    assert_eq!(deque.find(&items[1]), None);
    assert_eq!(deque.find(&items[2]), None);
    assert_eq!(deque.pop_first(), Some(items[0]));

    assert!(deque.is_empty());
}

#[test]
fn test_key_val_miri() {
    type Entry = (u32, Option<()>);
    let mut deque: SortedDeque<smallvec::SmallVec<[Entry; 4]>> = Default::default();

    deque.push_back((1, Some(())));
    deque.push_back((2, Some(())));
    deque.push_back((1, None));
    deque.push_back((3, Some(())));

    assert_eq!(deque.find(&0), None);
    assert_eq!(deque.remove(&0), None);

    assert_eq!(deque.find(&1), Some(&(1, Some(()))));
    assert_eq!(deque.find(&2), Some(&(2, Some(()))));
    assert_eq!(deque.find(&3), Some(&(3, Some(()))));
    assert_eq!(deque.find(&4), None);

    assert_eq!(deque.remove(&2), Some((2, Some(()))));
    assert_eq!(deque.remove(&2), None);

    assert_eq!(deque.find(&1), Some(&(1, Some(()))));
    assert_eq!(deque.find(&2), None);
    assert_eq!(deque.find(&3), Some(&(3, Some(()))));

    assert_eq!(deque.remove(&3), Some((3, Some(()))));
    assert_eq!(deque.find(&3), None);

    assert_eq!(deque.remove(&1), Some((1, Some(()))));

    assert!(deque.is_empty());
}

// Front-consumption pattern: erase by key, and let edge cleanup trim
// tombstones as they reach either end.
#[test]
fn test_erase_then_consume_edges_miri() {
    let mut deque: SortedDeque<Vec<TestItem>> = Default::default();

    for key in 1..=5 {
        deque.push_back(test_item(key));
    }

    assert_eq!(deque.len(), 5);

    // Erase from the middle.
    assert_eq!(deque.remove(&test_item(3)), Some(test_item(3)));
    assert_eq!(deque.len(), 4);
    assert_eq!(deque.find(&test_item(3)), None);
    assert_eq!(deque.iter().map(|x| x.key).collect::<Vec<_>>(), [1, 2, 4, 5]);

    // Erase the front: the pop path runs, the new front is live.
    assert_eq!(deque.remove(&test_item(1)), Some(test_item(1)));
    assert_eq!(deque.first().map(|x| x.key), Some(2));

    // Erase the back: same, from the other end.
    assert_eq!(deque.remove(&test_item(5)), Some(test_item(5)));
    assert_eq!(deque.last().map(|x| x.key), Some(4));

    assert_eq!(deque.len(), 2);
    assert_eq!(deque.physical_len(), 3);
    assert_eq!(deque.erased, 1);

    // Erase the (new) front: cleanup drops the interior tombstone of
    // key 3 as it becomes the front.
    assert_eq!(deque.remove(&test_item(2)), Some(test_item(2)));
    assert_eq!(deque.len(), 1);
    assert_eq!(deque.physical_len(), 1);
    assert_eq!(deque.erased, 0);
    assert_eq!(deque.first().map(|x| x.key), Some(4));
}

#[test]
fn test_out_of_order_push_back_miri() {
    let mut deque: SortedDeque<Vec<TestItem>> = Default::default();

    deque.push_back(test_item(10));
    deque.push_back(test_item(20));
    // Out of order: relocated between 10 and 20.
    deque.push_back(test_item(15));

    assert_eq!(
        deque.iter().map(|x| x.key).collect::<Vec<_>>(),
        [10, 15, 20]
    );
    assert_eq!(deque.len(), 3);
    assert_eq!(deque.find(&test_item(15)), Some(&test_item(15)));

    // Below the front: relocated all the way to the front.
    deque.push_back(test_item(5));
    assert_eq!(
        deque.iter().map(|x| x.key).collect::<Vec<_>>(),
        [5, 10, 15, 20]
    );
    assert_eq!(deque.first(), Some(&test_item(5)));
}

#[test]
fn test_out_of_order_tie_placement_miri() {
    type Entry = (u32, Option<char>);
    let mut deque: SortedDeque<Vec<Entry>> = Default::default();

    deque.push_back((1, Some('a')));
    deque.push_back((2, Some('b')));

    // An equal key lands before the existing one (lower-bound
    // placement), so lookups deterministically see the newer entry.
    deque.push_back((2, Some('c')));

    assert_eq!(
        deque.iter().copied().collect::<Vec<_>>(),
        [(1, Some('a')), (2, Some('c')), (2, Some('b'))]
    );
    assert_eq!(deque.find(&2), Some(&(2, Some('c'))));
}

#[test]
#[should_panic(expected = "left: Greater")]
fn test_push_back_or_panic_miri() {
    let mut deque: SortedDeque<Vec<TestItem>> = Default::default();

    deque.push_back_or_panic(test_item(1));
    deque.push_back_or_panic(test_item(2));

    // Not strictly greater; this should panic.
    deque.push_back_or_panic(test_item(1));
}

#[test]
fn test_push_front_miri() {
    let mut deque: SortedDeque<Vec<TestItem>> = Default::default();

    deque.push_front(test_item(10));
    deque.push_front(test_item(5));
    deque.push_back(test_item(20));

    assert_eq!(deque.iter().map(|x| x.key).collect::<Vec<_>>(), [5, 10, 20]);

    // Consuming the front leaves slack that the next front insertion
    // reuses; the contents stay sorted either way.
    assert_eq!(deque.pop_first(), Some(test_item(5)));
    deque.push_front(test_item(1));
    assert_eq!(deque.iter().map(|x| x.key).collect::<Vec<_>>(), [1, 10, 20]);
}

#[test]
#[should_panic(expected = "left: Greater")]
fn test_push_front_out_of_order_miri() {
    let mut deque: SortedDeque<Vec<TestItem>> = Default::default();

    deque.push_front(test_item(5));

    // Not strictly less than the current front; this should panic.
    deque.push_front(test_item(7));
}

#[test]
fn test_pop_first_and_last_miri() {
    let mut deque: SortedDeque<Vec<TestItem>> = Default::default();

    deque.push_back(test_item(1));
    deque.push_back(test_item(2));

    assert_eq!(deque.pop_first(), Some(test_item(1)));
    assert_eq!(deque.pop_last(), Some(test_item(2)));
    assert!(deque.is_empty());
}

#[test]
fn test_erasure_logic_miri() {
    let mut deque: SortedDeque<Vec<TestItem>> = Default::default();

    deque.push_back(test_item(1));
    deque.push_back(test_item(2));

    deque.remove(&test_item(2));

    assert_eq!(deque.find(&test_item(2)), None);
}

#[test]
fn test_find_miri() {
    let mut deque: SortedDeque<Vec<TestItem>> = Default::default();

    deque.push_back(test_item(1));
    deque.push_back(test_item(2));

    assert_eq!(deque.find(&test_item(1)), Some(&test_item(1)));
    assert_eq!(deque.find(&test_item(2)), Some(&test_item(2)));
    // Past the physical back: rejected before any search.
    assert_eq!(
        deque.find(&TestItem {
            key: 3,
            value: None
        }),
        None
    );
}

#[test]
fn test_cleanup_methods_miri() {
    let mut deque: SortedDeque<Vec<TestItem>> = Default::default();

    deque.push_back(test_item(1));
    deque.push_back(test_item(2));

    assert_eq!(deque.remove(&test_item(2)), Some(test_item(2)));
    deque.cleanup_back();

    assert_eq!(deque.last(), Some(&test_item(1)));
    assert_eq!(deque.find(&test_item(2)), None);
}

#[test]
fn test_reverse_iter_miri() {
    let mut deque: SortedDeque<Vec<TestItem>> = Default::default();

    for key in 1..=5 {
        deque.push_back(test_item(key));
    }

    deque.remove(&test_item(2));
    deque.remove(&test_item(4));

    assert_eq!(deque.iter().map(|x| x.key).collect::<Vec<_>>(), [1, 3, 5]);
    assert_eq!(
        deque.iter().rev().map(|x| x.key).collect::<Vec<_>>(),
        [5, 3, 1]
    );
}

#[test]
fn test_quick_key_access_miri() {
    type Entry = (u32, Option<()>);
    let mut deque: SortedDeque<Vec<Entry>> = Default::default();

    deque.push_back((1, Some(())));
    deque.push_back((2, Some(())));
    deque.push_back((3, Some(())));
    deque.push_back((4, Some(())));

    let front = deque.find_front(&1);
    assert!(front.is_valid());
    assert!(front.is_front());
    assert_eq!(deque[front], (1, Some(())));

    let inner = deque.find_front(&3);
    assert!(inner.is_valid());
    assert!(!inner.is_front());
    assert_eq!(deque[inner], (3, Some(())));

    // Iterator conversion starts at the pointed-at item.
    assert_eq!(
        deque.iter_from(inner).copied().collect::<Vec<_>>(),
        [(3, Some(())), (4, Some(()))]
    );

    // Absent keys yield the invalid quick key, which converts to an
    // empty traversal.
    let missing = deque.find_front(&7);
    assert!(!missing.is_valid());
    assert_eq!(deque.iter_from(missing).count(), 0);

    // Indexed removal bypasses the search.
    assert_eq!(deque.remove_quick(inner), Some((3, Some(()))));
    assert_eq!(deque.find(&3), None);
    assert_eq!(deque.len(), 3);

    // The key now points at a tombstone: re-removal fails, and the
    // iterator conversion is empty.
    assert_eq!(deque.remove_quick(inner), None);
    assert_eq!(deque.iter_from(inner).count(), 0);
}

#[test]
fn test_quick_key_tombstone_lookup_miri() {
    type Entry = (u32, Option<()>);
    let mut deque: SortedDeque<Vec<Entry>> = Default::default();

    deque.push_back((1, Some(())));
    deque.push_back((2, Some(())));
    deque.push_back((3, Some(())));

    assert_eq!(deque.remove(&2), Some((2, Some(()))));

    // A tombstoned key looks absent through find_front as well.
    assert!(!deque.find_front(&2).is_valid());
}

#[test]
fn test_quick_key_staleness_miri() {
    type Entry = (u32, Option<()>);
    let mut deque: SortedDeque<Vec<Entry>> = Default::default();

    deque.push_back((1, Some(())));
    deque.push_back((2, Some(())));
    deque.push_back((3, Some(())));

    let stale = deque.find_front(&2);
    assert!(stale.is_valid());

    // Shift the front: index 1 now holds key 3's entry.
    assert_eq!(deque.pop_first(), Some((1, Some(()))));

    // The stale key is detected instead of resolving to key 3.
    assert_eq!(deque.remove_quick(stale), None);
    assert_eq!(deque.iter_from(stale).count(), 0);
    assert_eq!(deque.len(), 2);

    // A freshly issued key works again.
    let fresh = deque.find_front(&2);
    assert!(fresh.is_front());
    assert_eq!(deque.remove_quick(fresh), Some((2, Some(()))));

    // Clearing invalidates outstanding keys too.
    let last = deque.find_front(&3);
    deque.clear();
    assert_eq!(deque.remove_quick(last), None);
}

#[test]
#[should_panic(expected = "stale quick key")]
fn test_stale_quick_key_index_panics_miri() {
    type Entry = (u32, Option<()>);
    let mut deque: SortedDeque<Vec<Entry>> = Default::default();

    deque.push_back((1, Some(())));
    deque.push_back((2, Some(())));

    let stale = deque.find_front(&2);
    assert_eq!(deque.pop_first(), Some((1, Some(()))));

    // Trusted access panics rather than return the wrong entry.
    let _ = deque[stale];
}

#[test]
fn test_find_front_is_constant_time_for_front_miri() {
    type Entry = (u32, Option<()>);
    let mut deque: SortedDeque<Vec<Entry>, CountingMarker> =
        SortedDeque::new(Vec::new(), CountingMarker::default());

    for key in 1..=16 {
        deque.push_back((key, Some(())));
    }

    // Matching the front costs exactly one key comparison: no binary
    // search runs.
    deque.marker.comparisons.set(0);
    let front = deque.find_front(&1);
    assert!(front.is_front());
    assert_eq!(deque.marker.comparisons.get(), 1);

    // Any other key falls back to the logarithmic search.
    deque.marker.comparisons.set(0);
    let inner = deque.find_front(&11);
    assert!(inner.is_valid());
    assert!(!inner.is_front());
    assert!(deque.marker.comparisons.get() > 1);
}

#[test]
fn test_clone_filters_tombstones_miri() {
    let mut deque: SortedDeque<Vec<TestItem>> = Default::default();

    for key in 1..=6 {
        deque.push_back(test_item(key));
    }

    deque.remove(&test_item(2));
    deque.remove(&test_item(4));
    assert_eq!(deque.len(), 4);
    assert_eq!(deque.physical_len(), 6);

    let clone = deque.clone();

    // The clone holds only the live items.
    assert_eq!(clone.erased, 0);
    assert_eq!(clone.len(), 4);
    assert_eq!(clone.physical_len(), 4);
    assert_eq!(
        clone.iter().copied().collect::<Vec<_>>(),
        deque.iter().copied().collect::<Vec<_>>()
    );

    // And it's independent of the source.
    let mut clone = clone;
    assert_eq!(clone.remove(&test_item(1)), Some(test_item(1)));
    assert_eq!(deque.find(&test_item(1)), Some(&test_item(1)));
}

#[test]
fn test_from_sorted_container_miri() {
    // External sequences are trusted to be sorted and tombstone-free.
    let deque: SortedDeque<Vec<TestItem>> =
        SortedDeque::new(vec![test_item(1), test_item(2), test_item(3)], ());

    assert_eq!(deque.len(), 3);
    assert_eq!(deque.physical_len(), 3);
    assert_eq!(deque.find(&test_item(2)), Some(&test_item(2)));
}

#[test]
fn test_len_tracks_tombstones_miri() {
    let mut deque: SortedDeque<Vec<TestItem>> = Default::default();

    assert_eq!(deque.len(), 0);
    assert_eq!(deque.physical_len(), 0);

    for key in 1..=4 {
        deque.push_back(test_item(key));
    }

    assert_eq!(deque.remove(&test_item(2)), Some(test_item(2)));
    assert_eq!(deque.remove(&test_item(3)), Some(test_item(3)));

    assert_eq!(deque.len(), 2);
    assert_eq!(deque.physical_len(), 4);
    assert_eq!(deque.erased, 2);

    // Popping the back sweeps the whole tombstone run.
    assert_eq!(deque.pop_last(), Some(test_item(4)));
    assert_eq!(deque.len(), 1);
    assert_eq!(deque.physical_len(), 1);
    assert_eq!(deque.erased, 0);
}
