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

//! Software TLB refill.
//!
//! The simulated CPU's TLB is small and has no hardware refill logic of its
//! own; a miss traps into [`handle_tlb_miss`], which resolves the faulting
//! page (faulting it in first if this process is demand-paged) and installs
//! it into a TLB slot.
//!
//! This assumes the host simulator flushes the TLB on every context switch,
//! so every resident slot always belongs to whichever process is currently
//! running — the same assumption the reference system makes, since its TLB
//! entries carry no process tag to distinguish otherwise.

use rand::Rng;

use crate::diag::{diag, KEY_VM};
use crate::error::UserFault;
use crate::platform::{Platform, TlbEntry};
use crate::process::Process;

/// Services a TLB miss for `faulting_vaddr`, installing a fresh slot.
///
/// Picks the first invalid slot if one exists; otherwise evicts a slot
/// chosen uniformly at random, which avoids the pathological eviction
/// patterns a fixed replacement order (always slot 0, always round-robin)
/// can hit on regular access patterns.
pub fn handle_tlb_miss<P: Platform>(
    platform: &mut P,
    process: &mut Process<P>,
    faulting_vaddr: u32,
    for_write: bool,
) -> Result<(), UserFault> {
    let page_size = process.page_size();
    let vpn = page_size.vpn(faulting_vaddr);

    let slot = select_victim_slot(platform);
    let victim = platform.tlb_entry(slot);
    if victim.valid {
        process.merge_tlb_flags(victim.virtual_page, victim.dirty, victim.used);
    }

    let resolved = process.resolve_page(platform, vpn, for_write)?;

    platform.tlb_write(
        slot,
        TlbEntry {
            virtual_page: vpn,
            physical_page: resolved.physical_page,
            valid: true,
            read_only: resolved.read_only,
            dirty: resolved.dirty,
            used: resolved.used,
        },
    );
    diag!(KEY_VM, "tlb refill: vpn {vpn} -> ppn {} (slot {slot})", resolved.physical_page);
    Ok(())
}

fn select_victim_slot<P: Platform>(platform: &mut P) -> usize {
    let size = platform.tlb_size();
    for i in 0..size {
        if !platform.tlb_entry(i).valid {
            return i;
        }
    }
    rand::thread_rng().gen_range(0..size)
}
