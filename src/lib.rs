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

//! The user-process core of a pedagogical MIPS kernel.
//!
//! This crate owns everything that turns a COFF binary into a running
//! process: address-space construction, the user/kernel memory copy engine,
//! the syscall dispatcher, process lifecycle (exec/join/exit), and, when the
//! demand-paged [`KernelConfig::demand_paging`] variant is selected, an
//! inverted page table with a software-refilled TLB.
//!
//! The simulated CPU, the thread scheduler, the COFF parser, and the console
//! device are **not** implemented here: this crate only depends on them
//! through the [`platform::Platform`] trait and friends. An integrator wires
//! a concrete simulator up by implementing that trait.

pub mod addr;
pub mod diag;
pub mod error;
pub mod exception;
pub mod frame;
pub mod inverted;
pub mod mem_copy;
pub mod page_table;
pub mod platform;
pub mod process;
pub mod syscall;
pub mod tlb;

pub use addr::PageSize;
pub use error::{ProcessFault, UserFault};
pub use exception::ExceptionCause;
pub use frame::FramePool;
pub use page_table::{PageTable, TranslationEntry};
pub use platform::Platform;
pub use process::kernel::{Kernel, KernelConfig};
pub use process::pid::Pid;
pub use process::Process;
