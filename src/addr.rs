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

//! Virtual and physical address arithmetic.
//!
//! The simulated MIPS CPU has a fixed page size; every address splits into a
//! page number and a page offset. `vpn(addr) * size + offset(addr) == addr`
//! for every address, by construction.

/// The page size of the simulated machine, in bytes. Always a power of two.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageSize(u32);

impl PageSize {
    /// The page size used by every example Nachos machine: 1 KiB.
    pub const DEFAULT: PageSize = PageSize(1024);

    /// Builds a page size, panicking if it is not a power of two.
    ///
    /// A non-power-of-two page size would make `vpn`/`offset` diverge from
    /// plain division/modulo, which every other component assumes.
    pub fn new(bytes: u32) -> Self {
        assert!(bytes.is_power_of_two(), "page size must be a power of two");
        PageSize(bytes)
    }

    /// The page size in bytes.
    pub fn bytes(self) -> u32 {
        self.0
    }

    /// The page number component of a virtual or physical address.
    pub fn vpn(self, addr: u32) -> u32 {
        addr / self.0
    }

    /// The offset-within-page component of a virtual or physical address.
    pub fn offset(self, addr: u32) -> u32 {
        addr & (self.0 - 1)
    }

    /// Reassembles an address from a page number and an offset.
    ///
    /// # Panics
    ///
    /// Panics if `offset >= self.bytes()`; an out-of-range offset would
    /// silently corrupt the page number component.
    pub fn addr(self, page: u32, offset: u32) -> u32 {
        assert!(offset < self.0, "offset out of range for page size");
        page * self.0 + offset
    }

    /// The number of pages needed to hold `bytes` bytes.
    pub fn pages_for(self, bytes: u32) -> u32 {
        (bytes + self.0 - 1) / self.0
    }
}

impl Default for PageSize {
    fn default() -> Self {
        Self::DEFAULT
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trip() {
        let ps = PageSize::DEFAULT;
        for addr in [0u32, 1, 1023, 1024, 1025, 5000, 0xffff_ffff] {
            let vpn = ps.vpn(addr);
            let off = ps.offset(addr);
            assert!(off < ps.bytes());
            assert_eq!(ps.addr(vpn, off), addr, "round trip failed for {addr:#x}");
        }
    }

    #[test]
    fn pages_for_rounds_up() {
        let ps = PageSize::DEFAULT;
        assert_eq!(ps.pages_for(0), 0);
        assert_eq!(ps.pages_for(1), 1);
        assert_eq!(ps.pages_for(1024), 1);
        assert_eq!(ps.pages_for(1025), 2);
    }

    #[test]
    #[should_panic]
    fn rejects_non_power_of_two() {
        PageSize::new(1000);
    }
}
