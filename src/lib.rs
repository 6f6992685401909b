//! The `sorted_deque` crate defines the [`SortedDeque`] container and its
//! backing [`SlidingDeque`] storage.
//!
//! A [`SortedDeque`] holds key-bearing items in ascending key order, and
//! implements a restricted special case of sorted containers:
//!
//! - items are usually inserted at the back (i.e., in ascending order);
//!   out-of-order back insertions are accepted but take a rare slow path
//! - items may be searched for by key (with binary search)
//! - items may be marked as logically erased anywhere, but are only
//!   physically removed once they reach the first or last position
//!
//! Insertion and removal from either end amortise to constant time, lookups
//! and keyed removal are logarithmic in the number of *physically* stored
//! items (erased items linger until they drift to an end).  The container is
//! built for workloads that consume mostly from the front, occasionally
//! delete from the middle, and care about predictable latency: nothing here
//! ever shifts the interior on deletion.
//!
//! The base [`SlidingDeque`] is similar to the standard [`VecDeque`], but
//! keeps its elements ordered in a single contiguous slice, and is defined
//! over an arbitrary container type; this crate comes with support for
//! [`Vec`] for the regular case, and [`SmallVec`] for queues that are
//! usually small.
//!
//! # Examples
//!
//! ```rust
//! use sorted_deque::SortedDeque;
//!
//! let mut deque: SortedDeque<Vec<(u32, Option<()>)>> = Default::default();
//! deque.push_back((1, Some(())));
//! deque.push_back((3, Some(())));
//! deque.push_back((4, Some(())));
//! // Out of order: relocated to its sorted position.
//! deque.push_back((2, Some(())));
//!
//! assert_eq!(deque.len(), 4);
//! assert_eq!(deque.find(&2), Some(&(2, Some(()))));
//!
//! // Erase from the middle: the slot is tombstoned in place.
//! assert_eq!(deque.remove(&3), Some((3, Some(()))));
//! assert_eq!(deque.find(&3), None);
//! assert_eq!(deque.len(), 3);
//!
//! assert_eq!(deque.iter().map(|x| x.0).collect::<Vec<_>>(), [1, 2, 4]);
//! assert_eq!(deque.pop_first(), Some((1, Some(()))));
//! ```
//!
//! ```rust
//! use sorted_deque::SortedDeque;
//!
//! let mut deque: SortedDeque<Vec<(u32, Option<()>)>> = Default::default();
//! deque.push_back((10, Some(())));
//! deque.push_back((20, Some(())));
//!
//! // Quick keys give constant-time re-access to the front.
//! let qk = deque.find_front(&10);
//! assert!(qk.is_front());
//! assert_eq!(deque[qk], (10, Some(())));
//! assert_eq!(deque.remove_quick(qk), Some((10, Some(()))));
//!
//! // The removal shifted the front; the old quick key is now stale and
//! // is rejected instead of resolving to the wrong item.
//! assert_eq!(deque.remove_quick(qk), None);
//! ```
//!
//! [`VecDeque`]: std::collections::VecDeque
//! [`SmallVec`]: smallvec::SmallVec

mod quick_key;
mod sliding_deque;
mod sorted_deque;

pub use quick_key::QuickKey;

pub use sliding_deque::SlidingDeque;
pub use sliding_deque::SlidingSmallVec;
pub use sliding_deque::SlidingVec;

pub use sorted_deque::SortedDeque;

pub mod traits {
    //! The `traits` module contains the extension traits that let
    //! [`SortedDeque`](crate::SortedDeque) work with arbitrary item types.
    //!
    //! Basic usage (key-value pairs, or items that implement
    //! [`SortedDequeItem`]) should not need to implement these traits.

    pub use crate::sliding_deque::PushTruncateContainer;
    pub use crate::sorted_deque::SortedDequeComparator;
    pub use crate::sorted_deque::SortedDequeItem;
    pub use crate::sorted_deque::SortedDequeMarker;
}
