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

//! The boundary between this crate and the simulator it runs inside.
//!
//! Everything this core does *not* implement — the simulated CPU's physical
//! memory and TLB, the COFF parser, the console device, and the thread
//! scheduler — is reached through a single [`Platform`] trait. A concrete
//! simulator implements it once; every other module in this crate is
//! generic over it.
//!
//! Bundling these collaborators into one trait, rather than threading four
//! separate generic parameters through [`crate::process::Process`] and
//! [`crate::process::kernel::Kernel`], keeps those types to a single type
//! parameter each.

use crate::process::pid::Pid;

/// The MIPS general-purpose registers a syscall or exception handler cares
/// about: the ones that carry arguments, the return value, and control
/// flow.
#[derive(Debug, Clone, Copy, Default)]
pub struct Regs {
    pub v0: u32,
    pub v1: u32,
    pub a0: u32,
    pub a1: u32,
    pub a2: u32,
    pub a3: u32,
    pub pc: u32,
    pub sp: u32,
}

/// A snapshot of one TLB slot, as read from or written to the simulated
/// CPU's hardware TLB.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TlbEntry {
    pub virtual_page: u32,
    pub physical_page: u32,
    pub valid: bool,
    pub read_only: bool,
    pub dirty: bool,
    pub used: bool,
}

/// One loadable section of a parsed COFF image: a run of contiguous virtual
/// pages and their initial content.
#[derive(Debug, Clone)]
pub struct CoffSection {
    pub virtual_page_start: u32,
    pub read_only: bool,
    /// One page-sized (or shorter, for a trailing bss-like page) buffer per
    /// page covered by this section. A page present here but shorter than
    /// the machine's page size is zero-padded by the loader.
    pub pages: Vec<Vec<u8>>,
}

/// A parsed COFF executable image, as produced by the simulator's loader.
pub trait CoffImage {
    /// The virtual address the program counter starts at.
    fn entry_point(&self) -> u32;
    /// The loadable sections, in increasing virtual-page order with no
    /// gaps or overlaps.
    fn sections(&self) -> &[CoffSection];
    /// The total number of virtual pages the text/data image occupies,
    /// i.e. one past the highest virtual page named by [`Self::sections`].
    fn image_pages(&self) -> u32;
}

/// Everything this core needs from the host simulator.
pub trait Platform {
    /// A schedulable unit of control; opaque to this crate.
    type Thread;
    /// A parsed executable image.
    type CoffFile: CoffImage;

    /// Disables interrupts, returning whether they were enabled beforehand.
    /// Every component in this crate restores exactly what it was given,
    /// so disable/restore pairs nest correctly even though the
    /// simulated CPU has only one interrupt-enable bit.
    fn disable_interrupts(&mut self) -> bool;
    /// Restores the interrupt-enable state returned by a matching
    /// [`Platform::disable_interrupts`].
    fn restore_interrupts(&mut self, was_enabled: bool);

    /// Reads one byte of simulated physical memory.
    fn read_phys_byte(&self, ppn: u32, offset: u32) -> u8;
    /// Writes one byte of simulated physical memory.
    fn write_phys_byte(&mut self, ppn: u32, offset: u32, value: u8);

    /// The number of hardware TLB slots.
    fn tlb_size(&self) -> usize;
    /// Reads one TLB slot.
    fn tlb_entry(&self, index: usize) -> TlbEntry;
    /// Overwrites one TLB slot.
    fn tlb_write(&mut self, index: usize, entry: TlbEntry);

    /// Opens and parses an executable by name from the host filesystem.
    fn open_coff(&mut self, name: &str) -> Option<Self::CoffFile>;

    /// Reads one byte from the console, if any is waiting.
    fn console_read_byte(&mut self) -> Option<u8>;
    /// Writes one byte to the console.
    fn console_write_byte(&mut self, byte: u8);

    /// Spawns a new schedulable thread that starts executing `pid` at
    /// `initial_regs`, returning a handle to it. Used by `exec` to give the
    /// child process its own thread of control while the parent keeps
    /// running. How the thread actually fetches and executes instructions
    /// is entirely the simulator's concern; this crate only needs a handle
    /// back to wait on.
    fn fork_thread(&mut self, pid: Pid, initial_regs: Regs) -> Self::Thread;
    /// Voluntarily yields the CPU, e.g. while a parent is blocked in `join`
    /// waiting on a child that has not yet exited.
    fn yield_now(&mut self);
}

/// A scope guard that disables interrupts on construction and restores the
/// prior state on drop, regardless of how the scope is exited (including
/// via an early `return` or `?`).
///
/// Every critical section named in this crate's module docs is written as
/// `let _guard = InterruptGuard::new(platform);` at the top of the
/// section, rather than matched disable/restore calls, so a `?` in the
/// middle can never leave interrupts disabled.
pub struct InterruptGuard<'p, P: Platform + ?Sized> {
    platform: &'p mut P,
    was_enabled: bool,
}

impl<'p, P: Platform + ?Sized> InterruptGuard<'p, P> {
    pub fn new(platform: &'p mut P) -> Self {
        let was_enabled = platform.disable_interrupts();
        InterruptGuard {
            platform,
            was_enabled,
        }
    }

    /// Reborrows the guarded platform for use inside the critical section.
    pub fn platform(&mut self) -> &mut P {
        self.platform
    }
}

impl<P: Platform + ?Sized> Drop for InterruptGuard<'_, P> {
    fn drop(&mut self) {
        self.platform.restore_interrupts(self.was_enabled);
    }
}
