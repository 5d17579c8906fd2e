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

//! A running user process: its address space, its place in the parent/child
//! tree, and its exit status.
//!
//! A process's address space comes in one of two shapes, chosen once for
//! the whole kernel by [`kernel::KernelConfig::demand_paging`]:
//!
//! - [`AddressSpace::Resident`]: every virtual page is loaded and mapped by
//!   [`exec::load`] before the process's first instruction runs, in a
//!   private [`crate::page_table::PageTable`].
//! - [`AddressSpace::Paged`]: pages are faulted in on first touch, tracked
//!   in the kernel-wide [`crate::inverted::InvertedPageTable`], with a
//!   software-refilled TLB (see [`crate::tlb`]).
//!
//! Both variants live behind the same [`Process::translate`] call so the
//! memory-copy engine ([`crate::mem_copy`]) and the TLB-miss handler
//! ([`crate::tlb`]) don't need to know which one they're talking to.

pub mod exec;
pub mod kernel;
pub mod pid;

use std::sync::{Arc, Mutex};

use crate::addr::PageSize;
use crate::error::UserFault;
use crate::frame::FramePool;
use crate::inverted::InvertedPageTable;
use crate::page_table::{PageTable, TranslationEntry};
use crate::platform::{CoffImage, Platform};
use pid::Pid;

/// How a process's virtual address space is backed.
pub enum AddressSpace<P: Platform> {
    /// Every page is resident from the start, in a private page table.
    Resident {
        page_table: PageTable,
        frame_pool: Arc<Mutex<FramePool>>,
    },
    /// Pages are faulted in on demand, tracked in a table shared by every
    /// process.
    Paged {
        inverted: Arc<Mutex<InvertedPageTable>>,
        frame_pool: Arc<Mutex<FramePool>>,
        image: Arc<P::CoffFile>,
        /// One past the highest virtual page covered by `image`'s sections.
        /// Pages at or above this number are anonymous (stack).
        image_pages: u32,
    },
}

/// How a process finished, or that it hasn't yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessStatus {
    Running,
    /// Exited normally (via the `exit` syscall or falling off `main`),
    /// carrying the status value the parent's `join` will receive.
    Exited(i32),
    /// Killed by the kernel for a process-fatal fault. `join` on a killed
    /// child reports the death without a meaningful status value.
    Killed,
}

/// A running (or finished, but not yet reaped) user process.
pub struct Process<P: Platform> {
    pid: Pid,
    parent: Option<Pid>,
    children: Vec<Pid>,
    status: ProcessStatus,
    address_space: AddressSpace<P>,
    page_size: PageSize,
    thread: Option<P::Thread>,
}

impl<P: Platform> Process<P> {
    pub(crate) fn new(
        pid: Pid,
        parent: Option<Pid>,
        address_space: AddressSpace<P>,
        page_size: PageSize,
    ) -> Self {
        Process {
            pid,
            parent,
            children: Vec::new(),
            status: ProcessStatus::Running,
            address_space,
            page_size,
            thread: None,
        }
    }

    pub fn pid(&self) -> Pid {
        self.pid
    }

    pub fn parent(&self) -> Option<Pid> {
        self.parent
    }

    pub fn children(&self) -> &[Pid] {
        &self.children
    }

    pub fn status(&self) -> ProcessStatus {
        self.status
    }

    pub(crate) fn set_status(&mut self, status: ProcessStatus) {
        self.status = status;
    }

    pub(crate) fn add_child(&mut self, child: Pid) {
        self.children.push(child);
    }

    pub(crate) fn forget_child(&mut self, child: Pid) {
        self.children.retain(|c| *c != child);
    }

    pub(crate) fn set_thread(&mut self, thread: P::Thread) {
        self.thread = Some(thread);
    }

    pub(crate) fn clear_parent(&mut self) {
        self.parent = None;
    }

    /// Releases every physical frame this process holds back to the shared
    /// pool. Called once, when a process exits or is killed.
    pub(crate) fn release_resources(&mut self) {
        match &mut self.address_space {
            AddressSpace::Resident {
                page_table,
                frame_pool,
            } => {
                let mut pool = frame_pool.lock().unwrap();
                for entry in page_table.entries() {
                    pool.release(entry.physical_page);
                }
            }
            AddressSpace::Paged {
                inverted,
                frame_pool,
                ..
            } => {
                let freed = inverted.lock().unwrap().remove_all_for(self.pid);
                let mut pool = frame_pool.lock().unwrap();
                for entry in freed {
                    pool.release(entry.physical_page);
                }
            }
        }
    }

    pub fn page_size(&self) -> PageSize {
        self.page_size
    }

    /// Translates a virtual address to a physical one, faulting the page in
    /// if this process uses the demand-paged variant and the page isn't
    /// resident yet.
    ///
    /// This is the path the syscall memory-copy engine uses; it does not
    /// consult or update the simulated hardware TLB; the TLB only matters
    /// for the CPU's own instruction and data fetches (see
    /// [`crate::tlb::handle_tlb_miss`]).
    pub fn translate(
        &mut self,
        platform: &mut P,
        vaddr: u32,
        for_write: bool,
    ) -> Result<u32, UserFault> {
        let vpn = self.page_size.vpn(vaddr);
        let offset = self.page_size.offset(vaddr);
        let entry = self.resolve_page(platform, vpn, for_write)?;
        Ok(self.page_size.addr(entry.physical_page, offset))
    }

    pub fn read_byte(&mut self, platform: &mut P, vaddr: u32) -> Result<u8, UserFault> {
        let paddr = self.translate(platform, vaddr, false)?;
        let ppn = self.page_size.vpn(paddr);
        let offset = self.page_size.offset(paddr);
        Ok(platform.read_phys_byte(ppn, offset))
    }

    pub fn write_byte(&mut self, platform: &mut P, vaddr: u32, value: u8) -> Result<(), UserFault> {
        let paddr = self.translate(platform, vaddr, true)?;
        let ppn = self.page_size.vpn(paddr);
        let offset = self.page_size.offset(paddr);
        platform.write_phys_byte(ppn, offset, value);
        Ok(())
    }

    /// Merges dirty/used bits observed by a hardware TLB slot back into
    /// this process's backing table, when that slot is evicted during a
    /// refill. See [`crate::tlb::handle_tlb_miss`].
    pub(crate) fn merge_tlb_flags(&mut self, vpn: u32, dirty: bool, used: bool) {
        match &mut self.address_space {
            AddressSpace::Resident { page_table, .. } => {
                page_table.merge_flags(vpn, dirty, used);
            }
            AddressSpace::Paged { inverted, .. } => {
                let mut table = inverted.lock().unwrap();
                let entry = table
                    .get_mut(self.pid, vpn)
                    .expect("valid tlb entry with no backing resident page");
                entry.dirty |= dirty;
                entry.used |= used;
            }
        }
    }

    /// Resolves a virtual page to its resident translation entry, faulting
    /// it in first if necessary. Shared by [`Process::translate`] and the
    /// TLB-miss handler, which both need the full entry (not just the
    /// physical page number) to do their job.
    pub fn resolve_page(
        &mut self,
        platform: &mut P,
        vpn: u32,
        for_write: bool,
    ) -> Result<TranslationEntry, UserFault> {
        match &mut self.address_space {
            AddressSpace::Resident { page_table, .. } => {
                page_table.translate(vpn, for_write)?;
                Ok(*page_table.entry(vpn).expect("just translated this vpn"))
            }
            AddressSpace::Paged {
                inverted,
                frame_pool,
                image,
                image_pages,
            } => {
                let pid = self.pid;
                {
                    let mut table = inverted.lock().unwrap();
                    if let Some(entry) = table.get_mut(pid, vpn) {
                        if for_write && entry.read_only {
                            return Err(UserFault::ReadOnly);
                        }
                        entry.used = true;
                        if for_write {
                            entry.dirty = true;
                        }
                        return Ok(*entry);
                    }
                }
                let mut entry = fault_in_page(
                    platform,
                    frame_pool,
                    inverted,
                    image.as_ref(),
                    *image_pages,
                    self.page_size,
                    pid,
                    vpn,
                )?;
                if for_write && entry.read_only {
                    return Err(UserFault::ReadOnly);
                }
                entry.used = true;
                if for_write {
                    entry.dirty = true;
                }
                if let Some(stored) = inverted.lock().unwrap().get_mut(pid, vpn) {
                    *stored = entry;
                }
                Ok(entry)
            }
        }
    }
}

/// Loads a not-yet-resident page into a free frame and records it in the
/// shared inverted table. Used by both a kernel-side fault (via
/// [`Process::resolve_page`]) and a hardware TLB miss (via
/// [`crate::tlb::handle_tlb_miss`]).
pub(crate) fn fault_in_page<P: Platform>(
    platform: &mut P,
    frame_pool: &Arc<Mutex<FramePool>>,
    inverted: &Arc<Mutex<InvertedPageTable>>,
    image: &P::CoffFile,
    image_pages: u32,
    page_size: PageSize,
    pid: Pid,
    vpn: u32,
) -> Result<TranslationEntry, UserFault> {
    let ppn = {
        let mut pool = frame_pool.lock().unwrap();
        match pool.allocate() {
            Some(ppn) => ppn,
            None => {
                let (_, victim) = inverted
                    .lock()
                    .unwrap()
                    .evict()
                    .expect("frame pool exhausted but nothing resident to evict");
                victim.physical_page
            }
        }
    };

    let read_only = if vpn < image_pages {
        let (section, page_offset) = locate_section_page(image, vpn)
            .ok_or(UserFault::MalformedImage)?;
        let data = &section.pages[page_offset];
        for (i, byte) in data.iter().enumerate() {
            platform.write_phys_byte(ppn, i as u32, *byte);
        }
        for i in data.len()..page_size.bytes() as usize {
            platform.write_phys_byte(ppn, i as u32, 0);
        }
        section.read_only
    } else {
        for i in 0..page_size.bytes() {
            platform.write_phys_byte(ppn, i, 0);
        }
        false
    };

    let entry = TranslationEntry::new(vpn, ppn, read_only);
    inverted.lock().unwrap().insert(pid, entry);
    Ok(entry)
}

fn locate_section_page<'a, I: CoffImage>(
    image: &'a I,
    vpn: u32,
) -> Option<(&'a crate::platform::CoffSection, usize)> {
    for section in image.sections() {
        let start = section.virtual_page_start;
        let end = start + section.pages.len() as u32;
        if vpn >= start && vpn < end {
            return Some((section, (vpn - start) as usize));
        }
    }
    None
}
