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

//! The `exit` syscall: terminates the calling process normally. There is
//! no return from this one — the process is gone once it returns.

use super::SyscallOutcome;
use crate::platform::Platform;
use crate::process::kernel::Kernel;
use crate::process::pid::Pid;

pub fn exit<P: Platform>(
    kernel: &mut Kernel<P>,
    platform: &mut P,
    pid: Pid,
    status: i32,
) -> SyscallOutcome {
    kernel.exit(platform, pid, status);
    SyscallOutcome::Terminated
}
