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

//! Error tiers.
//!
//! This core distinguishes three kinds of failure (see the module-level
//! docs of [`crate::process`] for where each is handled):
//!
//! 1. [`UserFault`] — a bad argument or bad pointer. Never kills the caller;
//!    the syscall dispatcher turns it into an ABI error code.
//! 2. [`ProcessFault`] — the user program did something the CPU itself
//!    cannot execute (illegal instruction, unknown syscall, a write to a
//!    read-only page reaching the CPU instead of a syscall). The offending
//!    process is killed; the kernel survives.
//! 3. Kernel-fatal invariant violations (double free, negative alive count,
//!    a TLB entry with no backing page-table entry) are not `Result`s at
//!    all — they are `assert!`/`panic!`, by design. A kernel bug should be
//!    loud, not silently downgraded to a process fault.

use thiserror::Error;

/// A failure attributable to the calling user program or its arguments.
///
/// These never abort the kernel; they become `-1` (or `0` for `halt`) on the
/// syscall ABI boundary.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum UserFault {
    /// The virtual address is out of range, unmapped, or not yet resident.
    #[error("bad virtual address")]
    BadAddress,
    /// A write targeted a read-only page.
    #[error("write to a read-only page")]
    ReadOnly,
    /// `join` was given a pid that is not (or no longer) a child of the caller.
    #[error("no such child process")]
    NoSuchChild,
    /// The packed argv block would not fit in a single page.
    #[error("argument list too long")]
    ArgsTooLong,
    /// The named executable could not be opened.
    #[error("executable not found")]
    NotFound,
    /// The COFF image failed validation (e.g. non-contiguous sections).
    #[error("malformed executable image")]
    MalformedImage,
    /// Not enough free physical pages to satisfy a `loadSections`.
    #[error("out of physical memory")]
    OutOfMemory,
    /// A filename passed to `exec` did not end in `.coff`, or a string
    /// argument had no null terminator within the permitted length.
    #[error("invalid argument")]
    InvalidArgument,
}

/// A failure that is fatal to the process but not to the kernel.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum ProcessFault {
    /// The process touched memory it has no business touching.
    #[error("invalid memory access")]
    InvalidAccess,
    /// `v0` held a number not in the syscall table.
    #[error("unknown syscall {0}")]
    UnknownSyscall(u32),
    /// Any other CPU exception that is not a syscall or TLB miss.
    #[error("illegal operation")]
    IllegalOperation,
}
