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

//! The `exec` syscall: `int exec(char *name, int argc, char **argv)`.
//!
//! Unpacks the filename and argument vector out of the caller's address
//! space, then hands them to [`Kernel::exec`] to do the actual loading.

use super::SyscallOutcome;
use crate::error::UserFault;
use crate::mem_copy::{read_c_string, read_from_user, MAX_STRING_LEN};
use crate::platform::{Platform, Regs};
use crate::process::kernel::Kernel;
use crate::process::pid::Pid;

pub fn exec<P: Platform>(
    kernel: &mut Kernel<P>,
    platform: &mut P,
    pid: Pid,
    regs: &Regs,
) -> SyscallOutcome {
    let argc = regs.a1 as i32;
    if argc < 0 {
        return SyscallOutcome::Continue(-1);
    }

    let Some(process) = kernel.process_mut(pid) else {
        return SyscallOutcome::Terminated;
    };

    let name = match read_c_string(process, platform, regs.a0, MAX_STRING_LEN)
        .ok()
        .and_then(|bytes| String::from_utf8(bytes).ok())
    {
        Some(name) => name,
        None => return SyscallOutcome::Continue(-1),
    };

    let mut args = Vec::with_capacity(argc as usize);
    for i in 0..argc as u32 {
        let mut ptr_bytes = [0u8; 4];
        if read_from_user(process, platform, regs.a2 + i * 4, &mut ptr_bytes).is_err() {
            return SyscallOutcome::Continue(-1);
        }
        let arg_ptr = u32::from_le_bytes(ptr_bytes);
        // An argument with no terminator within the length limit is
        // replaced with an empty string rather than failing the whole
        // call; only a bad pointer aborts `exec` outright.
        let arg = match read_c_string(process, platform, arg_ptr, MAX_STRING_LEN) {
            Ok(bytes) => String::from_utf8(bytes).unwrap_or_default(),
            Err(UserFault::InvalidArgument) => String::new(),
            Err(_) => return SyscallOutcome::Continue(-1),
        };
        args.push(arg);
    }

    match kernel.exec(platform, pid, &name, &args) {
        Ok(child_pid) => SyscallOutcome::Continue(child_pid as i32),
        Err(_) => SyscallOutcome::Continue(-1),
    }
}
