//! The `quick_key` module defines the [`QuickKey`] position handle.
//!
//! A [`QuickKey`] caches the physical index of an item that was already
//! located once (e.g., by
//! [`SortedDeque::find_front`](crate::SortedDeque::find_front)), so that
//! later accesses can skip the binary search.  The index is only
//! meaningful against the issuing container's current layout: any
//! mutation that shifts physical positions (front removal, front
//! insertion, out-of-order relocation, clear) invalidates every
//! previously issued key.
//!
//! A raw index cannot detect that kind of staleness on its own: after a
//! front shift, a stale index can still be in bounds, and would silently
//! resolve to a different, live item.  Each key therefore also carries
//! the generation stamp of the container at issue time; the container
//! bumps its generation on every index-shifting mutation and rejects
//! keys from older generations.

/// Sentinel index for a [`QuickKey`] that never matched anything.
const INVALID_INDEX: usize = usize::MAX;

/// A cheap, copyable handle for constant-time re-access to an item in a
/// [`SortedDeque`](crate::SortedDeque).
///
/// Quick keys are issued by lookups and consumed by indexed access,
/// iterator conversion, and indexed removal.  A key is *live* only while
/// the issuing container's layout is unchanged; checked accessors return
/// `None`/empty for stale keys, and trusted ones
/// ([`Index`](std::ops::Index)) panic.
#[derive(Clone, Copy, Debug)]
pub struct QuickKey {
    index: usize,
    generation: u64,
}

impl QuickKey {
    /// Returns the key for physical position `index`, stamped with the
    /// issuing container's current `generation`.
    #[inline(always)]
    pub(crate) fn new(index: usize, generation: u64) -> Self {
        debug_assert_ne!(index, INVALID_INDEX);
        Self { index, generation }
    }

    /// Returns the distinguished "not found" key.
    #[inline(always)]
    pub(crate) fn invalid() -> Self {
        Self {
            index: INVALID_INDEX,
            generation: 0,
        }
    }

    /// Determines whether this key was issued for an actual position.
    ///
    /// A valid key may still be stale; only the issuing container can
    /// tell (it remembers the current generation).
    #[inline(always)]
    pub fn is_valid(&self) -> bool {
        self.index != INVALID_INDEX
    }

    /// Determines whether this key points at the physical front.
    #[inline(always)]
    pub fn is_front(&self) -> bool {
        self.index == 0
    }

    /// The physical index this key was issued for.
    #[inline(always)]
    pub(crate) fn index(&self) -> usize {
        self.index
    }

    /// The container generation this key was issued at.
    #[inline(always)]
    pub(crate) fn generation(&self) -> u64 {
        self.generation
    }
}

/// Quick keys compare by physical position only; comparing keys from
/// different generations (or different containers) is meaningless but
/// harmless.
impl PartialEq for QuickKey {
    #[inline(always)]
    fn eq(&self, other: &Self) -> bool {
        self.index == other.index
    }
}

impl Eq for QuickKey {}

impl PartialOrd for QuickKey {
    #[inline(always)]
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for QuickKey {
    #[inline(always)]
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.index.cmp(&other.index)
    }
}

#[test]
fn test_quick_key_predicates_miri() {
    let front = QuickKey::new(0, 7);
    let inner = QuickKey::new(3, 7);
    let missing = QuickKey::invalid();

    assert!(front.is_valid());
    assert!(front.is_front());

    assert!(inner.is_valid());
    assert!(!inner.is_front());

    assert!(!missing.is_valid());
    assert!(!missing.is_front());

    assert!(front < inner);
    assert!(inner < missing); // the sentinel sorts last
    assert_eq!(inner, QuickKey::new(3, 7));
}
