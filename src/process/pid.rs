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

//! Process identifiers.
//!
//! Pids here are assigned monotonically and never reused: once a process
//! exits, its pid stays retired for the life of the kernel. This is simpler
//! than a reclaim-on-exit scheme and, since a full simulator run is a single
//! short-lived test program rather than a long-running system, pid exhaustion
//! is not a practical concern.

/// A process identifier.
pub type Pid = u32;

/// Hands out pids in increasing order starting at zero.
///
/// The very first pid allocated (`0`) belongs to the root process; the
/// kernel, not this allocator, is responsible for remembering which pid that
/// was, since "am I root" needs to survive independently of allocation
/// order in case that convention ever changes.
#[derive(Debug, Default)]
pub struct PidAllocator {
    next: Pid,
}

impl PidAllocator {
    pub fn new() -> Self {
        PidAllocator { next: 0 }
    }

    /// Allocates the next pid.
    pub fn allocate(&mut self) -> Pid {
        let pid = self.next;
        self.next = self
            .next
            .checked_add(1)
            .expect("pid space exhausted");
        pid
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pids_are_monotonic_and_unique() {
        let mut alloc = PidAllocator::new();
        let pids: Vec<_> = (0..5).map(|_| alloc.allocate()).collect();
        assert_eq!(pids, vec![0, 1, 2, 3, 4]);
    }
}
