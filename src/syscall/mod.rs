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

//! The syscall dispatch table.
//!
//! Each syscall lives in its own module, matching the convention the rest
//! of this crate's corpus uses for per-syscall files. A handler never kills
//! its own caller for a bad argument — it returns `-1` — and never panics
//! for one either; only [`crate::error::ProcessFault`]-tier problems (an
//! unrecognized syscall number) reach [`crate::process::kernel::Kernel::kill_process`].

mod exec;
mod exit;
mod halt;
mod join;
mod read;
mod write;

use crate::diag::{diag, KEY_SYSCALL};
use crate::error::ProcessFault;
use crate::platform::{Platform, Regs};
use crate::process::kernel::Kernel;
use crate::process::pid::Pid;

pub const SYS_HALT: u32 = 0;
pub const SYS_EXIT: u32 = 1;
pub const SYS_EXEC: u32 = 2;
pub const SYS_JOIN: u32 = 3;
pub const SYS_READ: u32 = 6;
pub const SYS_WRITE: u32 = 7;

/// The file descriptor tied to the console's input stream.
pub const STDIN_FD: i32 = 0;
/// The file descriptor tied to the console's output stream.
pub const STDOUT_FD: i32 = 1;

/// What should happen to the calling process's registers after a syscall.
pub enum SyscallOutcome {
    /// Write `v0` with this value and advance the program counter past the
    /// `syscall` instruction.
    Continue(i32),
    /// The process is gone (it called `exit`, or the syscall number itself
    /// was invalid and the process was killed for it); there is nothing
    /// left to resume.
    Terminated,
}

/// Dispatches the syscall named by `regs.v0` for the process `pid`.
pub fn dispatch<P: Platform>(
    kernel: &mut Kernel<P>,
    platform: &mut P,
    pid: Pid,
    regs: &Regs,
) -> SyscallOutcome {
    diag!(KEY_SYSCALL, "pid {pid}: syscall {}", regs.v0);
    match regs.v0 {
        SYS_HALT => halt::halt(kernel, pid),
        SYS_EXIT => exit::exit(kernel, platform, pid, regs.a0 as i32),
        SYS_EXEC => exec::exec(kernel, platform, pid, regs),
        SYS_JOIN => join::join(kernel, platform, pid, regs),
        SYS_READ => read::read(kernel, platform, pid, regs),
        SYS_WRITE => write::write(kernel, platform, pid, regs),
        other => {
            let fault = ProcessFault::UnknownSyscall(other);
            diag!(KEY_SYSCALL, "pid {pid}: {fault}, killing");
            kernel.kill_process(platform, pid);
            SyscallOutcome::Terminated
        }
    }
}
