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

//! The process lifecycle manager: creation, exec, join, exit and kill,
//! and the bookkeeping that ties them together — the parent/child tree,
//! the count of still-alive processes, and which process is root.
//!
//! This struct replaces the ambient globals a straightforward port would
//! reach for (a static process table, a static alive counter): every
//! method here takes the context it needs as an argument instead of
//! reading it off a singleton, which is what lets more than one kernel
//! instance exist side by side in, for instance, a test suite.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use crate::addr::PageSize;
use crate::diag::{diag, KEY_LIFECYCLE};
use crate::error::UserFault;
use crate::frame::FramePool;
use crate::inverted::InvertedPageTable;
use crate::platform::{InterruptGuard, Platform, Regs};

use super::exec::{load_paged, load_resident};
use super::pid::{Pid, PidAllocator};
use super::{Process, ProcessStatus};

/// Kernel-wide configuration decided once at startup.
#[derive(Debug, Clone, Copy)]
pub struct KernelConfig {
    /// Selects the demand-paged address-space variant over the resident
    /// one.
    pub demand_paging: bool,
    /// The number of physical frames the simulated machine has.
    pub physical_pages: u32,
    pub page_size: PageSize,
}

impl Default for KernelConfig {
    fn default() -> Self {
        KernelConfig {
            demand_paging: false,
            physical_pages: 64,
            page_size: PageSize::DEFAULT,
        }
    }
}

/// Why a process stopped running, as reported to its parent's `join`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinResult {
    /// The child called `exit` (or returned from `main`) with this status.
    Exited(i32),
    /// The kernel killed the child for a process-fatal fault.
    Killed,
}

/// Owns every live process and the resources they share: the frame pool
/// and, under the demand-paged variant, the inverted page table.
pub struct Kernel<P: Platform> {
    config: KernelConfig,
    processes: HashMap<Pid, Process<P>>,
    pid_alloc: PidAllocator,
    frame_pool: Arc<Mutex<FramePool>>,
    inverted: Option<Arc<Mutex<InvertedPageTable>>>,
    root_pid: Option<Pid>,
    alive_count: u32,
    halted: bool,
}

impl<P: Platform> Kernel<P> {
    pub fn new(config: KernelConfig) -> Self {
        let inverted = config
            .demand_paging
            .then(|| Arc::new(Mutex::new(InvertedPageTable::new())));
        Kernel {
            config,
            processes: HashMap::new(),
            pid_alloc: PidAllocator::new(),
            frame_pool: Arc::new(Mutex::new(FramePool::new(config.physical_pages))),
            inverted,
            root_pid: None,
            alive_count: 0,
            halted: false,
        }
    }

    pub fn config(&self) -> KernelConfig {
        self.config
    }

    /// Requests that the simulated machine shut down. Only meaningful
    /// effect this crate has: flips a flag the integrator's run loop is
    /// expected to check after every instruction. See [`Kernel::is_halted`].
    pub(crate) fn request_halt(&mut self) {
        self.halted = true;
    }

    /// Whether `halt` has been called by the root process.
    pub fn is_halted(&self) -> bool {
        self.halted
    }

    /// The number of processes that have been created but not yet exited
    /// or been killed.
    pub fn alive_count(&self) -> u32 {
        self.alive_count
    }

    /// The number of physical frames not currently owned by any process.
    /// Exposed mainly so integration tests can assert frame accounting
    /// across `exec`/`exit` without reaching into a process's private
    /// address space.
    pub fn free_frame_count(&self) -> u32 {
        self.frame_pool.lock().unwrap().free_count()
    }

    pub fn is_root(&self, pid: Pid) -> bool {
        self.root_pid == Some(pid)
    }

    pub fn process(&self, pid: Pid) -> Option<&Process<P>> {
        self.processes.get(&pid)
    }

    pub fn process_mut(&mut self, pid: Pid) -> Option<&mut Process<P>> {
        self.processes.get_mut(&pid)
    }

    /// Creates the first process the kernel runs. Must be called exactly
    /// once, before any `exec`.
    pub fn spawn_root(
        &mut self,
        platform: &mut P,
        image: P::CoffFile,
        args: &[String],
    ) -> Result<(Pid, Regs), UserFault> {
        assert!(self.root_pid.is_none(), "spawn_root called more than once");

        let pid = {
            let _guard = InterruptGuard::new(platform);
            self.pid_alloc.allocate()
        };

        let loaded = {
            let mut guard = InterruptGuard::new(platform);
            match &self.inverted {
                Some(inverted) => load_paged(
                    guard.platform(),
                    pid,
                    None,
                    Arc::new(image),
                    args,
                    self.frame_pool.clone(),
                    inverted.clone(),
                    self.config.page_size,
                )?,
                None => load_resident(
                    guard.platform(),
                    pid,
                    None,
                    &image,
                    args,
                    self.frame_pool.clone(),
                    self.config.page_size,
                )?,
            }
        };

        {
            let _guard = InterruptGuard::new(platform);
            self.processes.insert(pid, loaded.process);
            self.root_pid = Some(pid);
            self.alive_count += 1;
        }
        diag!(KEY_LIFECYCLE, "pid {pid}: spawned as root");
        Ok((pid, loaded.initial_regs))
    }

    /// Loads `filename` as a new child of `parent`, giving it its own
    /// thread of control. Returns the child's pid.
    pub fn exec(
        &mut self,
        platform: &mut P,
        parent: Pid,
        filename: &str,
        args: &[String],
    ) -> Result<Pid, UserFault> {
        if !filename.ends_with(".coff") {
            return Err(UserFault::InvalidArgument);
        }
        let image = platform.open_coff(filename).ok_or(UserFault::NotFound)?;

        let pid = {
            let _guard = InterruptGuard::new(platform);
            self.pid_alloc.allocate()
        };

        let loaded = {
            let mut guard = InterruptGuard::new(platform);
            match &self.inverted {
                Some(inverted) => load_paged(
                    guard.platform(),
                    pid,
                    Some(parent),
                    Arc::new(image),
                    args,
                    self.frame_pool.clone(),
                    inverted.clone(),
                    self.config.page_size,
                )?,
                None => load_resident(
                    guard.platform(),
                    pid,
                    Some(parent),
                    &image,
                    args,
                    self.frame_pool.clone(),
                    self.config.page_size,
                )?,
            }
        };

        let initial_regs = {
            let _guard = InterruptGuard::new(platform);
            self.processes.insert(pid, loaded.process);
            if let Some(parent_proc) = self.processes.get_mut(&parent) {
                parent_proc.add_child(pid);
            }
            self.alive_count += 1;
            loaded.initial_regs
        };

        let thread = platform.fork_thread(pid, initial_regs);
        if let Some(child) = self.processes.get_mut(&pid) {
            child.set_thread(thread);
        }
        diag!(KEY_LIFECYCLE, "pid {parent}: exec'd {filename} as pid {pid}");
        Ok(pid)
    }

    /// Normal process termination: records `status`, frees the process's
    /// physical memory, and orphans its children.
    pub fn exit(&mut self, platform: &mut P, pid: Pid, status: i32) {
        self.finish(platform, pid, ProcessStatus::Exited(status));
        diag!(KEY_LIFECYCLE, "pid {pid}: exited with status {status}");
    }

    /// Kernel-initiated termination for a process-fatal fault. The kernel
    /// itself is unaffected; every other process keeps running.
    pub fn kill_process(&mut self, platform: &mut P, pid: Pid) {
        self.finish(platform, pid, ProcessStatus::Killed);
        diag!(KEY_LIFECYCLE, "pid {pid}: killed");
    }

    fn finish(&mut self, platform: &mut P, pid: Pid, status: ProcessStatus) {
        let _guard = InterruptGuard::new(platform);
        let children = {
            let Some(proc) = self.processes.get_mut(&pid) else {
                return;
            };
            proc.set_status(status);
            proc.release_resources();
            proc.children().to_vec()
        };
        for child in children {
            if let Some(child_proc) = self.processes.get_mut(&child) {
                child_proc.clear_parent();
            }
        }
        self.alive_count -= 1;
    }

    /// Blocks the calling context until `child` (which must be a live or
    /// finished child of `parent`) has exited or been killed, then reaps
    /// it, removing it from the process table.
    pub fn join(
        &mut self,
        platform: &mut P,
        parent: Pid,
        child: Pid,
    ) -> Result<JoinResult, UserFault> {
        let is_child = self
            .processes
            .get(&parent)
            .is_some_and(|p| p.children().contains(&child));
        if !is_child {
            return Err(UserFault::NoSuchChild);
        }

        loop {
            let status = {
                let _guard = InterruptGuard::new(platform);
                self.processes.get(&child).map(|c| c.status())
            };
            match status {
                Some(ProcessStatus::Exited(code)) => {
                    self.reap(parent, child);
                    return Ok(JoinResult::Exited(code));
                }
                Some(ProcessStatus::Killed) => {
                    self.reap(parent, child);
                    return Ok(JoinResult::Killed);
                }
                Some(ProcessStatus::Running) => platform.yield_now(),
                None => return Err(UserFault::NoSuchChild),
            }
        }
    }

    fn reap(&mut self, parent: Pid, child: Pid) {
        if let Some(parent_proc) = self.processes.get_mut(&parent) {
            parent_proc.forget_child(child);
        }
        self.processes.remove(&child);
    }
}
