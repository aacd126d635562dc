//! The bounded-window shuffle at the heart of shuffled.
//!
//! A [`ShuffleChain`] is a multiset of [`Item`]s split into a `pool` of
//! candidates and a FIFO `window` of recently surfaced items. Picks draw
//! uniformly from the pool into the window and surface the window's front,
//! so an item cannot come back until at least `window + 1` other picks have
//! happened, as long as enough distinct items remain. A window of 0
//! degenerates to plain uniform choice with replacement.

use std::collections::VecDeque;

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

/// One playback unit: an ordered, non-empty group of song URIs that are
/// always queued together. An ungrouped song is a group of one.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Item {
    uris: Vec<String>,
}

impl Item {
    /// Creates an item from a non-empty group of URIs.
    ///
    /// # Panics
    ///
    /// Panics when `uris` is empty.
    #[must_use]
    pub fn new(uris: Vec<String>) -> Self {
        assert!(!uris.is_empty(), "an item must hold at least one URI");
        Self { uris }
    }

    #[must_use]
    pub fn uris(&self) -> &[String] {
        &self.uris
    }

    /// Number of URIs in this item.
    #[must_use]
    pub fn len(&self) -> usize {
        self.uris.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.uris.is_empty()
    }
}

impl From<String> for Item {
    fn from(uri: String) -> Self {
        Self::new(vec![uri])
    }
}

impl From<&str> for Item {
    fn from(uri: &str) -> Self {
        Self::from(uri.to_string())
    }
}

impl From<Vec<String>> for Item {
    fn from(uris: Vec<String>) -> Self {
        Self::new(uris)
    }
}

/// Windowed random multiset of [`Item`]s.
///
/// Items live in a backing store; `pool` and `window` hold indexes into it.
/// Every stored item is in exactly one of the two at any time.
#[derive(Debug)]
pub struct ShuffleChain {
    max_window: usize,
    items: Vec<Item>,
    pool: Vec<usize>,
    window: VecDeque<usize>,
    rng: SmallRng,
}

impl ShuffleChain {
    /// Creates an empty chain with the given window size.
    #[must_use]
    pub fn new(window: usize) -> Self {
        Self::with_rng(window, SmallRng::from_entropy())
    }

    /// Creates an empty chain with the given window size and a caller
    /// supplied generator, for deterministic picking.
    #[must_use]
    pub fn with_rng(window: usize, rng: SmallRng) -> Self {
        Self {
            max_window: window,
            items: Vec::new(),
            pool: Vec::new(),
            window: VecDeque::new(),
            rng,
        }
    }

    /// Adds an item to the pool.
    pub fn add<I>(&mut self, item: I)
    where
        I: Into<Item>,
    {
        self.items.push(item.into());
        self.pool.push(self.items.len() - 1);
    }

    /// Removes all items. The window size and generator are retained.
    pub fn clear(&mut self) {
        self.items.clear();
        self.pool.clear();
        self.window.clear();
    }

    /// Total number of items, picked recently or not.
    #[must_use]
    pub fn len(&self) -> usize {
        self.pool.len() + self.window.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Total number of URIs across all items.
    #[must_use]
    pub fn len_uris(&self) -> usize {
        self.items.iter().map(Item::len).sum()
    }

    /// Picks the next item to play.
    ///
    /// The window is refilled with uniformly random pool draws, then the
    /// item at the front of the window is surfaced and handed back to the
    /// pool so it becomes eligible again for future draws.
    ///
    /// # Panics
    ///
    /// Panics when the chain is empty. Callers guard against an empty song
    /// pool before entering the event loop, so this is a defensive check.
    pub fn pick(&mut self) -> &Item {
        assert!(!self.is_empty(), "cannot pick from an empty chain");
        self.fill_window();
        let index = self
            .window
            .pop_front()
            .expect("filled window cannot be empty");
        self.pool.push(index);
        &self.items[index]
    }

    /// Copies out all items, window first, then pool. Heavyweight; meant
    /// for introspection only.
    #[must_use]
    pub fn items(&self) -> Vec<Item> {
        self.window
            .iter()
            .chain(self.pool.iter())
            .map(|&index| self.items[index].clone())
            .collect()
    }

    fn fill_window(&mut self) {
        // The window deliberately holds up to max_window + 1 entries, so a
        // pick can surface one and still leave max_window behind it.
        while self.window.len() <= self.max_window && !self.pool.is_empty() {
            let drawn = self.rng.gen_range(0..self.pool.len());
            let index = self.pool.swap_remove(drawn);
            self.window.push_back(index);
        }
    }
}
