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

//! The `join` syscall: `int join(int pid, int *status)`.
//!
//! Blocks the caller until the named child has finished, then reports how.
//!
//! A child that called `exit` writes its status to `*status` and this
//! returns `1`. A child that was killed for a process-fatal fault leaves
//! `*status` untouched (there is no meaningful status to report) and this
//! returns `0`, distinguishing "your child is gone" from "your child told
//! you why": a return value of `-1` is reserved for `pid` not naming a
//! child of the caller at all.

use super::SyscallOutcome;
use crate::mem_copy::write_to_user;
use crate::platform::{Platform, Regs};
use crate::process::kernel::{JoinResult, Kernel};
use crate::process::pid::Pid;

pub fn join<P: Platform>(
    kernel: &mut Kernel<P>,
    platform: &mut P,
    pid: Pid,
    regs: &Regs,
) -> SyscallOutcome {
    let child = regs.a0;
    let result = match kernel.join(platform, pid, child) {
        Ok(result) => result,
        Err(_) => return SyscallOutcome::Continue(-1),
    };

    match result {
        JoinResult::Exited(status) => {
            if let Some(process) = kernel.process_mut(pid) {
                let bytes = status.to_le_bytes();
                if write_to_user(process, platform, regs.a1, &bytes).is_err() {
                    return SyscallOutcome::Continue(-1);
                }
            }
            SyscallOutcome::Continue(1)
        }
        JoinResult::Killed => SyscallOutcome::Continue(0),
    }
}
