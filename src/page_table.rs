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

//! The per-process resident page table used by the basic (non-demand-paged)
//! address-space variant.
//!
//! Every virtual page a process owns is loaded and mapped once, up front,
//! by the image loader; this table never grows or shrinks afterwards, and
//! every entry in it is always valid.

use crate::error::UserFault;

/// One entry of a resident page table: where a virtual page lives in
/// physical memory, and what's allowed to happen to it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TranslationEntry {
    pub virtual_page: u32,
    pub physical_page: u32,
    pub valid: bool,
    pub read_only: bool,
    /// Set once the page has actually been written to. Informational only
    /// for the basic variant; the demand-paged variant uses it to decide
    /// whether an evicted page can be dropped or must be preserved.
    pub dirty: bool,
    pub used: bool,
}

impl TranslationEntry {
    pub fn new(virtual_page: u32, physical_page: u32, read_only: bool) -> Self {
        TranslationEntry {
            virtual_page,
            physical_page,
            valid: true,
            read_only,
            dirty: false,
            used: false,
        }
    }
}

/// A flat, fully-resident map from virtual page number to translation entry.
#[derive(Debug, Default)]
pub struct PageTable {
    entries: Vec<TranslationEntry>,
}

impl PageTable {
    /// Builds an empty table sized for `num_pages` virtual pages; callers
    /// fill it in with [`PageTable::install`] as sections are loaded.
    pub fn with_capacity(num_pages: u32) -> Self {
        PageTable {
            entries: Vec::with_capacity(num_pages as usize),
        }
    }

    /// The number of virtual pages this table covers.
    pub fn num_pages(&self) -> u32 {
        self.entries.len() as u32
    }

    /// Appends the next entry. Entries must be installed in increasing
    /// virtual-page order; this mirrors how the loader walks sections and
    /// lets lookups be a direct index instead of a search.
    pub fn install(&mut self, entry: TranslationEntry) {
        assert_eq!(
            entry.virtual_page,
            self.entries.len() as u32,
            "page table entries must be installed in vpn order"
        );
        self.entries.push(entry);
    }

    /// Looks up the entry for a virtual page, enforcing write permission if
    /// `for_write` is set.
    pub fn translate(&mut self, vpn: u32, for_write: bool) -> Result<u32, UserFault> {
        let entry = self
            .entries
            .get_mut(vpn as usize)
            .filter(|e| e.valid)
            .ok_or(UserFault::BadAddress)?;
        if for_write && entry.read_only {
            return Err(UserFault::ReadOnly);
        }
        entry.used = true;
        if for_write {
            entry.dirty = true;
        }
        Ok(entry.physical_page)
    }

    pub fn entry(&self, vpn: u32) -> Option<&TranslationEntry> {
        self.entries.get(vpn as usize)
    }

    /// Merges dirty/used bits observed by the hardware TLB back into the
    /// backing entry when that TLB slot is evicted. The TLB can set these
    /// bits without the software table noticing, so a write-back on
    /// eviction is the only way the table stays accurate.
    pub fn merge_flags(&mut self, vpn: u32, dirty: bool, used: bool) {
        if let Some(entry) = self.entries.get_mut(vpn as usize) {
            entry.dirty |= dirty;
            entry.used |= used;
        }
    }

    pub fn entries(&self) -> &[TranslationEntry] {
        &self.entries
    }
}
