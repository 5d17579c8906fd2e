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

//! A minimal in-memory [`Platform`] used by the integration tests in this
//! directory. It never actually schedules a thread — tests drive a
//! process's lifecycle by calling `Kernel` methods directly, the way a
//! real simulator's CPU loop would on the process's behalf.

use std::collections::{HashMap, VecDeque};

use nachos_core::platform::{CoffImage, CoffSection, Platform, Regs, TlbEntry};
use nachos_core::Pid;

#[derive(Debug, Clone)]
pub struct MockCoffFile {
    pub entry_point: u32,
    pub sections: Vec<CoffSection>,
    pub image_pages: u32,
}

impl CoffImage for MockCoffFile {
    fn entry_point(&self) -> u32 {
        self.entry_point
    }

    fn sections(&self) -> &[CoffSection] {
        &self.sections
    }

    fn image_pages(&self) -> u32 {
        self.image_pages
    }
}

/// Builds a trivial one-page, writable image: a single zero-filled page of
/// code starting at vpn 0.
pub fn one_page_image(page_size: u32) -> MockCoffFile {
    MockCoffFile {
        entry_point: 0,
        sections: vec![CoffSection {
            virtual_page_start: 0,
            read_only: false,
            pages: vec![vec![0u8; page_size as usize]],
        }],
        image_pages: 1,
    }
}

/// An image with no sections at all, for scenarios that don't care about
/// program content (e.g. the root process in the `halt` test).
pub fn empty_image() -> MockCoffFile {
    MockCoffFile {
        entry_point: 0,
        sections: Vec::new(),
        image_pages: 0,
    }
}

pub struct MockPlatform {
    page_size: u32,
    phys: Vec<u8>,
    tlb: Vec<TlbEntry>,
    interrupts_enabled: bool,
    programs: HashMap<String, MockCoffFile>,
    console_in: VecDeque<u8>,
    console_out: Vec<u8>,
    next_thread: u32,
}

impl MockPlatform {
    pub fn new(physical_pages: u32, page_size: u32, tlb_slots: usize) -> Self {
        MockPlatform {
            page_size,
            phys: vec![0u8; (physical_pages * page_size) as usize],
            tlb: vec![TlbEntry::default(); tlb_slots],
            interrupts_enabled: true,
            programs: HashMap::new(),
            console_in: VecDeque::new(),
            console_out: Vec::new(),
            next_thread: 0,
        }
    }

    pub fn register_program(&mut self, name: &str, image: MockCoffFile) {
        self.programs.insert(name.to_string(), image);
    }

    pub fn feed_console(&mut self, bytes: &[u8]) {
        self.console_in.extend(bytes);
    }

    pub fn console_output(&self) -> &[u8] {
        &self.console_out
    }
}

impl Platform for MockPlatform {
    type Thread = u32;
    type CoffFile = MockCoffFile;

    fn disable_interrupts(&mut self) -> bool {
        let was = self.interrupts_enabled;
        self.interrupts_enabled = false;
        was
    }

    fn restore_interrupts(&mut self, was_enabled: bool) {
        self.interrupts_enabled = was_enabled;
    }

    fn read_phys_byte(&self, ppn: u32, offset: u32) -> u8 {
        self.phys[(ppn * self.page_size + offset) as usize]
    }

    fn write_phys_byte(&mut self, ppn: u32, offset: u32, value: u8) {
        self.phys[(ppn * self.page_size + offset) as usize] = value;
    }

    fn tlb_size(&self) -> usize {
        self.tlb.len()
    }

    fn tlb_entry(&self, index: usize) -> TlbEntry {
        self.tlb[index]
    }

    fn tlb_write(&mut self, index: usize, entry: TlbEntry) {
        self.tlb[index] = entry;
    }

    fn open_coff(&mut self, name: &str) -> Option<Self::CoffFile> {
        self.programs.get(name).cloned()
    }

    fn console_read_byte(&mut self) -> Option<u8> {
        self.console_in.pop_front()
    }

    fn console_write_byte(&mut self, byte: u8) {
        self.console_out.push(byte);
    }

    fn fork_thread(&mut self, _pid: Pid, _initial_regs: Regs) -> Self::Thread {
        let id = self.next_thread;
        self.next_thread += 1;
        id
    }

    fn yield_now(&mut self) {
        // Tests always finish a child before joining it, so `Kernel::join`
        // never actually needs to spin here.
    }
}
