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

//! The `read` syscall: `int read(int fd, void *buffer, int count)`.
//!
//! Only the console's input stream (fd [`super::STDIN_FD`]) is backed;
//! anything else is an invalid file descriptor.

use super::{SyscallOutcome, STDIN_FD};
use crate::mem_copy::write_to_user;
use crate::platform::{Platform, Regs};
use crate::process::kernel::Kernel;
use crate::process::pid::Pid;

pub fn read<P: Platform>(
    kernel: &mut Kernel<P>,
    platform: &mut P,
    pid: Pid,
    regs: &Regs,
) -> SyscallOutcome {
    let fd = regs.a0 as i32;
    let count = regs.a2 as i32;
    if fd != STDIN_FD || count < 0 {
        return SyscallOutcome::Continue(-1);
    }

    let mut buf = Vec::with_capacity(count as usize);
    for _ in 0..count {
        match platform.console_read_byte() {
            Some(byte) => buf.push(byte),
            None => break,
        }
    }

    let Some(process) = kernel.process_mut(pid) else {
        return SyscallOutcome::Terminated;
    };
    if write_to_user(process, platform, regs.a1, &buf).is_err() {
        return SyscallOutcome::Continue(-1);
    }
    SyscallOutcome::Continue(buf.len() as i32)
}
