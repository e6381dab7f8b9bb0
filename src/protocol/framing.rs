//! Fragment reassembly buffer for multi-fragment responses
//!
//! Holds CRC-verified fragments by index until the response is complete.

use crate::config::protocol::MAX_RF_FRAGMENT_COUNT;
use crate::protocol::fragment::Fragment;
use heapless::Vec;

/// Progress of a reassembly
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reassembly {
    /// Nothing has been stored yet
    Empty,
    /// Every fragment up to the last one is present
    Complete,
    /// The given fragment index should be requested next
    Missing(u8),
    /// Every slot is filled but none carried the last-fragment flag
    Unterminated,
}

/// Accumulates verified fragments, ordered by their 1-based index.
///
/// A fragment stored under an index that is already occupied replaces the
/// stale copy.
pub struct FragmentBuffer {
    slots: [Option<Fragment>; MAX_RF_FRAGMENT_COUNT],
    highest: u8,
    last: Option<u8>,
}

impl FragmentBuffer {
    /// Create a new empty buffer.
    pub fn new() -> Self {
        Self {
            slots: core::array::from_fn(|_| None),
            highest: 0,
            last: None,
        }
    }

    /// Store a fragment under its index.
    ///
    /// Returns `false` if the fragment has no usable index.
    pub fn insert(&mut self, fragment: Fragment) -> bool {
        let index = match fragment.index() {
            Some(index) if index >= 1 && usize::from(index) <= MAX_RF_FRAGMENT_COUNT => index,
            _ => return false,
        };

        if fragment.is_last() {
            self.last = Some(index);
        }
        if index > self.highest {
            self.highest = index;
        }
        self.slots[usize::from(index) - 1] = Some(fragment);
        true
    }

    /// Work out what, if anything, is still missing.
    pub fn status(&self) -> Reassembly {
        if self.highest == 0 {
            return Reassembly::Empty;
        }

        let upper = self.last.unwrap_or(self.highest);
        if let Some(gap) = (1..=upper).find(|&index| !self.contains(index)) {
            return Reassembly::Missing(gap);
        }

        match self.last {
            Some(_) => Reassembly::Complete,
            None if usize::from(self.highest) >= MAX_RF_FRAGMENT_COUNT => Reassembly::Unterminated,
            None => Reassembly::Missing(self.highest + 1),
        }
    }

    /// Returns true if a fragment with the given index is stored.
    pub fn contains(&self, index: u8) -> bool {
        index >= 1
            && self
                .slots
                .get(usize::from(index) - 1)
                .is_some_and(Option::is_some)
    }

    /// Fragments `1..=last` in order; only meaningful once complete.
    pub fn ordered(&self) -> Vec<Fragment, MAX_RF_FRAGMENT_COUNT> {
        let upper = usize::from(self.last.unwrap_or(self.highest));
        self.slots[..upper].iter().flatten().cloned().collect()
    }

    /// Reset the buffer, discarding all fragments.
    pub fn reset(&mut self) {
        self.slots.iter_mut().for_each(|slot| *slot = None);
        self.highest = 0;
        self.last = None;
    }

    /// Returns true if no fragment is stored.
    pub fn is_empty(&self) -> bool {
        self.highest == 0
    }

    /// Returns the number of stored fragments.
    pub fn len(&self) -> usize {
        self.slots.iter().filter(|slot| slot.is_some()).count()
    }
}

impl Default for FragmentBuffer {
    fn default() -> Self {
        Self::new()
    }
}
