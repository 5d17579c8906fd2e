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

//! The exception entry point: classifies why the simulated CPU trapped and
//! routes it to the right handler.
//!
//! This is the only place in the crate that turns a [`ProcessFault`] into
//! an actual call to [`Kernel::kill_process`] — every other component just
//! returns one and lets its caller decide, which keeps the "kill on
//! process-fatal fault, never on user fault" rule in one place instead of
//! scattered through every syscall and memory access.

use crate::diag::{diag, KEY_VM};
use crate::error::ProcessFault;
use crate::platform::{Platform, Regs};
use crate::process::kernel::Kernel;
use crate::process::pid::Pid;
use crate::syscall;

/// Why the CPU trapped into the kernel.
#[derive(Debug, Clone, Copy)]
pub enum ExceptionCause {
    /// A `syscall` instruction; `regs.v0` names which one.
    Syscall,
    /// A TLB miss on a memory access at `vaddr`.
    TlbMiss { vaddr: u32, for_write: bool },
    /// Anything else the simulated CPU can trap on (illegal instruction,
    /// bus error, alignment fault, ...) — this core doesn't distinguish
    /// among them because the outcome is the same for all of them.
    Other,
}

/// Handles one trap for `pid`, mutating `regs` in place when the process
/// survives to resume.
///
/// Returns `false` if the process was killed or exited as a result (the
/// caller should stop scheduling it and pick another thread to run), or
/// `true` if it should resume at the (possibly just-advanced) `regs.pc`.
pub fn handle_exception<P: Platform>(
    kernel: &mut Kernel<P>,
    platform: &mut P,
    pid: Pid,
    cause: ExceptionCause,
    regs: &mut Regs,
) -> bool {
    match cause {
        ExceptionCause::Syscall => match syscall::dispatch(kernel, platform, pid, regs) {
            syscall::SyscallOutcome::Continue(v0) => {
                regs.v0 = v0 as u32;
                regs.pc = regs.pc.wrapping_add(4);
                true
            }
            syscall::SyscallOutcome::Terminated => false,
        },
        ExceptionCause::TlbMiss { vaddr, for_write } => {
            let Some(process) = kernel.process_mut(pid) else {
                return false;
            };
            match crate::tlb::handle_tlb_miss(platform, process, vaddr, for_write) {
                Ok(()) => true,
                Err(fault) => {
                    let process_fault = ProcessFault::InvalidAccess;
                    diag!(
                        KEY_VM,
                        "pid {pid}: {process_fault} at {vaddr:#x} ({fault}), killing"
                    );
                    kernel.kill_process(platform, pid);
                    false
                }
            }
        }
        ExceptionCause::Other => {
            let process_fault = ProcessFault::IllegalOperation;
            diag!(KEY_VM, "pid {pid}: {process_fault}, killing");
            kernel.kill_process(platform, pid);
            false
        }
    }
}
