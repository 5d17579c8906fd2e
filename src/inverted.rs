/*
 * This file is part of nachos-core.
 *
 * nachos-core is free software: you can redistribute it and/or modify it
 * under the terms of the GNU General Public License as published by the
 * Free Software Foundation, either version 3 of the License, or (at your
 * option) any later version.
 *
 * nachos-core is distributed in the hope that it will be useful, but
 * WITHOUT ANY WARRANTY; without even the implied warranty of
 * MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the GNU General
 * Public License for more details.
 */

//! The demand-paged variant's inverted page table.
//!
//! Unlike the resident [`crate::page_table::PageTable`] the basic variant
//! gives each process, here there is exactly one table, shared by every
//! process, keyed by `(pid, virtual page)`. A process only occupies an
//! entry for the pages it actually has resident; everything else is either
//! not yet faulted in or has been evicted to make room for someone else's
//! page.

use std::collections::{BTreeMap, VecDeque};

use crate::page_table::TranslationEntry;
use crate::process::pid::Pid;

/// `(pid, virtual page number)`.
pub type PageKey = (Pid, u32);

/// A global, shared table mapping resident `(pid, vpn)` pairs to their
/// physical frame and protection bits.
#[derive(Debug, Default)]
pub struct InvertedPageTable {
    entries: BTreeMap<PageKey, TranslationEntry>,
    /// Residency order, oldest first, used to pick an eviction victim.
    order: VecDeque<PageKey>,
}

impl InvertedPageTable {
    pub fn new() -> Self {
        InvertedPageTable {
            entries: BTreeMap::new(),
            order: VecDeque::new(),
        }
    }

    pub fn get(&self, pid: Pid, vpn: u32) -> Option<&TranslationEntry> {
        self.entries.get(&(pid, vpn))
    }

    pub fn get_mut(&mut self, pid: Pid, vpn: u32) -> Option<&mut TranslationEntry> {
        self.entries.get_mut(&(pid, vpn))
    }

    /// Installs a freshly-faulted-in page. The key must not already be
    /// resident.
    pub fn insert(&mut self, pid: Pid, entry: TranslationEntry) {
        let key = (pid, entry.virtual_page);
        let previous = self.entries.insert(key, entry);
        assert!(previous.is_none(), "double insert of resident page {key:?}");
        self.order.push_back(key);
    }

    /// Removes one entry, e.g. because its process exited. Returns the
    /// physical frame it held so the caller can release it back to the
    /// pool.
    pub fn remove(&mut self, pid: Pid, vpn: u32) -> Option<TranslationEntry> {
        let key = (pid, vpn);
        let entry = self.entries.remove(&key);
        if entry.is_some() {
            self.order.retain(|k| *k != key);
        }
        entry
    }

    /// Removes every entry belonging to `pid`, returning the physical
    /// frames they held. Called when a process exits.
    pub fn remove_all_for(&mut self, pid: Pid) -> Vec<TranslationEntry> {
        let keys: Vec<PageKey> = self
            .entries
            .keys()
            .filter(|(p, _)| *p == pid)
            .copied()
            .collect();
        let mut freed = Vec::with_capacity(keys.len());
        for key in keys {
            if let Some(entry) = self.entries.remove(&key) {
                freed.push(entry);
            }
            self.order.retain(|k| *k != key);
        }
        freed
    }

    /// Picks and removes the oldest-resident entry to make room for a new
    /// page, returning its key and translation entry.
    ///
    /// A page evicted this way is not written back anywhere: this crate has
    /// no backing store. If the evicted page was dirty, whatever the
    /// process wrote to it is lost, and a later fault on the same virtual
    /// page reloads it from the executable image (or zero-fills it, for an
    /// anonymous page) rather than recovering the lost content. This
    /// matches the reference system's own lack of a swap device; a real
    /// deployment would pair this table with a disk-backed store instead.
    pub fn evict(&mut self) -> Option<(PageKey, TranslationEntry)> {
        let key = self.order.pop_front()?;
        let entry = self
            .entries
            .remove(&key)
            .expect("residency order and entry map out of sync");
        Some((key, entry))
    }

    pub fn resident_count(&self) -> usize {
        self.entries.len()
    }
}
