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

//! Turns a parsed COFF image and an argument list into a freshly loaded
//! process: a populated address space and the register state its first
//! instruction should run with.
//!
//! The virtual address space this builds, from low to high, is: the
//! program's own sections (however many pages [`CoffImage::image_pages`]
//! reports), [`STACK_PAGES`] pages of stack, then one final page holding
//! the packed `argv` block. The initial stack pointer sits at the top of
//! the stack region — the boundary with `argv`'s page — so the stack
//! grows down into its own pages without ever touching `argv`'s.

use std::sync::{Arc, Mutex};

use crate::diag::{diag, KEY_LIFECYCLE};
use crate::error::UserFault;
use crate::frame::FramePool;
use crate::inverted::InvertedPageTable;
use crate::page_table::{PageTable, TranslationEntry};
use crate::platform::{CoffImage, Platform, Regs};

use super::pid::Pid;
use super::{locate_section_page, AddressSpace, Process};

/// The number of stack pages given to every process. The reference system
/// this is modeled on uses the same fixed allowance rather than growing
/// the stack region dynamically.
pub const STACK_PAGES: u32 = 8;

/// A process and the register state execution should begin with.
pub struct LoadedProcess<P: Platform> {
    pub process: Process<P>,
    pub initial_regs: Regs,
}

/// Loads `image` into a fresh address space for `pid`, using the resident
/// (non-demand-paged) strategy: every page is allocated and filled in
/// before this returns.
pub fn load_resident<P: Platform>(
    platform: &mut P,
    pid: Pid,
    parent: Option<Pid>,
    image: &P::CoffFile,
    args: &[String],
    frame_pool: Arc<Mutex<FramePool>>,
    page_size: crate::addr::PageSize,
) -> Result<LoadedProcess<P>, UserFault> {
    let image_pages = image.image_pages();
    let argv_vpn = image_pages + STACK_PAGES;
    let total_pages = argv_vpn + 1;

    let mut page_table = PageTable::with_capacity(total_pages);

    for vpn in 0..image_pages {
        let (section, page_offset) =
            locate_section_page(image, vpn).ok_or(UserFault::MalformedImage)?;
        let ppn = allocate_frame(&frame_pool)?;
        let data = &section.pages[page_offset];
        for (i, byte) in data.iter().enumerate() {
            platform.write_phys_byte(ppn, i as u32, *byte);
        }
        for i in data.len()..page_size.bytes() as usize {
            platform.write_phys_byte(ppn, i as u32, 0);
        }
        page_table.install(TranslationEntry::new(vpn, ppn, section.read_only));
    }

    for vpn in image_pages..argv_vpn {
        let ppn = allocate_frame(&frame_pool)?;
        for i in 0..page_size.bytes() {
            platform.write_phys_byte(ppn, i, 0);
        }
        page_table.install(TranslationEntry::new(vpn, ppn, false));
    }

    let argv_vaddr = page_size.addr(argv_vpn, 0);
    let argv_bytes = pack_argv(args, page_size, argv_vaddr)?;
    let argv_ppn = allocate_frame(&frame_pool)?;
    for (i, byte) in argv_bytes.iter().enumerate() {
        platform.write_phys_byte(argv_ppn, i as u32, *byte);
    }
    page_table.install(TranslationEntry::new(argv_vpn, argv_ppn, false));

    let initial_sp = argv_vpn * page_size.bytes();

    diag!(KEY_LIFECYCLE, "pid {pid}: loaded resident image, {total_pages} pages");

    let address_space = AddressSpace::Resident {
        page_table,
        frame_pool,
    };
    let process = Process::new(pid, parent, address_space, page_size);
    let initial_regs = Regs {
        a0: args.len() as u32,
        a1: argv_vaddr,
        pc: image.entry_point(),
        sp: initial_sp,
        ..Default::default()
    };
    Ok(LoadedProcess {
        process,
        initial_regs,
    })
}

/// Loads `image` for `pid` using the demand-paged strategy: only the
/// `argv` page is made resident up front, since a program's very first
/// instructions read `a0`/`a1` before they have any chance to take a page
/// fault of their own. Everything else — the program's own pages and the
/// stack — is left to fault in lazily through
/// [`crate::tlb::handle_tlb_miss`] or [`Process::translate`].
pub fn load_paged<P: Platform>(
    platform: &mut P,
    pid: Pid,
    parent: Option<Pid>,
    image: Arc<P::CoffFile>,
    args: &[String],
    frame_pool: Arc<Mutex<FramePool>>,
    inverted: Arc<Mutex<InvertedPageTable>>,
    page_size: crate::addr::PageSize,
) -> Result<LoadedProcess<P>, UserFault> {
    let image_pages = image.image_pages();
    let argv_vpn = image_pages + STACK_PAGES;

    let argv_vaddr = page_size.addr(argv_vpn, 0);
    let argv_bytes = pack_argv(args, page_size, argv_vaddr)?;
    let argv_ppn = {
        let ppn = allocate_frame(&frame_pool)?;
        for (i, byte) in argv_bytes.iter().enumerate() {
            platform.write_phys_byte(ppn, i as u32, *byte);
        }
        ppn
    };
    inverted
        .lock()
        .unwrap()
        .insert(pid, TranslationEntry::new(argv_vpn, argv_ppn, false));

    let initial_sp = argv_vpn * page_size.bytes();
    let entry_point = image.entry_point();

    diag!(
        KEY_LIFECYCLE,
        "pid {pid}: loaded paged image, {image_pages} image pages, argv eager-resident"
    );

    let address_space = AddressSpace::Paged {
        inverted,
        frame_pool,
        image,
        image_pages,
    };
    let process = Process::new(pid, parent, address_space, page_size);
    let initial_regs = Regs {
        a0: args.len() as u32,
        a1: argv_vaddr,
        pc: entry_point,
        sp: initial_sp,
        ..Default::default()
    };
    Ok(LoadedProcess {
        process,
        initial_regs,
    })
}

fn allocate_frame(frame_pool: &Arc<Mutex<FramePool>>) -> Result<u32, UserFault> {
    frame_pool
        .lock()
        .unwrap()
        .allocate()
        .ok_or(UserFault::OutOfMemory)
}

/// Packs an argument list into a single page: a table of `argc` pointers
/// (into the strings that follow, within the same page) and then the
/// strings themselves, NUL-terminated.
fn pack_argv(
    args: &[String],
    page_size: crate::addr::PageSize,
    argv_vaddr: u32,
) -> Result<Vec<u8>, UserFault> {
    let pointer_table_len = args.len() * 4;
    let mut buf = vec![0u8; page_size.bytes() as usize];
    let mut string_offset = pointer_table_len;

    for (i, arg) in args.iter().enumerate() {
        let needed = arg.len() + 1;
        if string_offset + needed > buf.len() {
            return Err(UserFault::ArgsTooLong);
        }
        let pointer = argv_vaddr + string_offset as u32;
        buf[i * 4..i * 4 + 4].copy_from_slice(&pointer.to_le_bytes());
        buf[string_offset..string_offset + arg.len()].copy_from_slice(arg.as_bytes());
        buf[string_offset + arg.len()] = 0;
        string_offset += needed;
    }
    Ok(buf)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pack_argv_lays_out_pointers_before_strings() {
        let args = vec!["a.coff".to_string(), "1".to_string()];
        let ps = crate::addr::PageSize::DEFAULT;
        let argv_vaddr = 0x4000;
        let buf = pack_argv(&args, ps, argv_vaddr).unwrap();

        let ptr0 = u32::from_le_bytes(buf[0..4].try_into().unwrap());
        let ptr1 = u32::from_le_bytes(buf[4..8].try_into().unwrap());
        assert_eq!(ptr0, argv_vaddr + 8);
        assert_eq!(ptr1, argv_vaddr + 8 + 7);

        let s0_start = (ptr0 - argv_vaddr) as usize;
        assert_eq!(&buf[s0_start..s0_start + 6], b"a.coff");
        assert_eq!(buf[s0_start + 6], 0);
    }

    #[test]
    fn pack_argv_rejects_overflow() {
        let ps = crate::addr::PageSize::new(8);
        let args = vec!["too long for one tiny page".to_string()];
        assert_eq!(pack_argv(&args, ps, 0), Err(UserFault::ArgsTooLong));
    }
}
