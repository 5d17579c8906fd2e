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

//! The `write` syscall: `int write(int fd, void *buffer, int count)`.
//!
//! Only the console's output stream (fd [`super::STDOUT_FD`]) is backed;
//! anything else is an invalid file descriptor. Always writes all-or-
//! nothing: a bad buffer pointer fails the whole call rather than writing
//! a truncated prefix to the console.

use super::{SyscallOutcome, STDOUT_FD};
use crate::mem_copy::read_from_user;
use crate::platform::{Platform, Regs};
use crate::process::kernel::Kernel;
use crate::process::pid::Pid;

pub fn write<P: Platform>(
    kernel: &mut Kernel<P>,
    platform: &mut P,
    pid: Pid,
    regs: &Regs,
) -> SyscallOutcome {
    let fd = regs.a0 as i32;
    let count = regs.a2 as i32;
    if fd != STDOUT_FD || count < 0 {
        return SyscallOutcome::Continue(-1);
    }

    let Some(process) = kernel.process_mut(pid) else {
        return SyscallOutcome::Terminated;
    };
    let mut buf = vec![0u8; count as usize];
    if read_from_user(process, platform, regs.a1, &mut buf).is_err() {
        return SyscallOutcome::Continue(-1);
    }

    for byte in &buf {
        platform.console_write_byte(*byte);
    }
    // Returns 0, not the byte count, on success — preserved bug-for-bug
    // for ABI compatibility with existing user-mode test binaries.
    SyscallOutcome::Continue(0)
}
