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

//! End-to-end scenarios over the whole crate, driven through a mock
//! [`Platform`](nachos_core::Platform) instead of a real simulated CPU.
//!
//! A real integrator's fetch-execute loop would call `exception::handle_exception`
//! on every trap; these tests call `Kernel`/`syscall` entry points directly in
//! the order a running program would trigger them, which exercises the same
//! code paths without needing an actual instruction interpreter.

mod common;

use common::{empty_image, one_page_image, MockPlatform};
use nachos_core::platform::Regs;
use nachos_core::process::kernel::{JoinResult, Kernel, KernelConfig};
use nachos_core::syscall;
use nachos_core::{PageSize, Platform};

fn resident_config() -> KernelConfig {
    KernelConfig {
        demand_paging: false,
        physical_pages: 64,
        page_size: PageSize::DEFAULT,
    }
}

fn paged_config(physical_pages: u32) -> KernelConfig {
    KernelConfig {
        demand_paging: true,
        physical_pages,
        page_size: PageSize::DEFAULT,
    }
}

#[test]
fn root_halts() {
    let mut platform = MockPlatform::new(64, PageSize::DEFAULT.bytes(), 4);
    let mut kernel: Kernel<MockPlatform> = Kernel::new(resident_config());

    let (root, _regs) = kernel
        .spawn_root(&mut platform, empty_image(), &[])
        .expect("root spawn should succeed");
    assert_eq!(kernel.alive_count(), 1);
    assert!(!kernel.is_halted());

    let halt_regs = Regs {
        v0: syscall::SYS_HALT,
        ..Default::default()
    };
    let outcome = syscall::dispatch(&mut kernel, &mut platform, root, &halt_regs);
    assert!(matches!(outcome, syscall::SyscallOutcome::Continue(0)));
    assert!(kernel.is_halted());
    assert_eq!(kernel.alive_count(), 1, "halt does not itself terminate the process");
}

#[test]
fn non_root_halt_is_refused() {
    let mut platform = MockPlatform::new(64, PageSize::DEFAULT.bytes(), 4);
    platform.register_program("child.coff", one_page_image(PageSize::DEFAULT.bytes()));
    let mut kernel: Kernel<MockPlatform> = Kernel::new(resident_config());

    let (root, _) = kernel.spawn_root(&mut platform, empty_image(), &[]).unwrap();
    let child = kernel
        .exec(&mut platform, root, "child.coff", &[])
        .expect("exec should succeed");

    let halt_regs = Regs {
        v0: syscall::SYS_HALT,
        ..Default::default()
    };
    let outcome = syscall::dispatch(&mut kernel, &mut platform, child, &halt_regs);
    assert!(matches!(outcome, syscall::SyscallOutcome::Continue(1)));
    assert!(!kernel.is_halted());
}

#[test]
fn parent_joins_normal_child() {
    let mut platform = MockPlatform::new(64, PageSize::DEFAULT.bytes(), 4);
    platform.register_program("child.coff", one_page_image(PageSize::DEFAULT.bytes()));
    let mut kernel: Kernel<MockPlatform> = Kernel::new(resident_config());

    let (root, _) = kernel.spawn_root(&mut platform, empty_image(), &[]).unwrap();
    let child = kernel
        .exec(
            &mut platform,
            root,
            "child.coff",
            &["child".to_string(), "x".to_string()],
        )
        .unwrap();

    // Stand in for the child thread itself calling `exit(7)`.
    kernel.exit(&mut platform, child, 7);

    let result = kernel.join(&mut platform, root, child).unwrap();
    assert_eq!(result, JoinResult::Exited(7));
    assert!(kernel.process(child).is_none(), "child should be reaped");
    assert!(kernel.process(root).unwrap().children().is_empty());
    assert_eq!(kernel.alive_count(), 1);
}

#[test]
fn parent_joins_killed_child() {
    let mut platform = MockPlatform::new(64, PageSize::DEFAULT.bytes(), 4);
    platform.register_program("child.coff", one_page_image(PageSize::DEFAULT.bytes()));
    let mut kernel: Kernel<MockPlatform> = Kernel::new(resident_config());

    let (root, _) = kernel.spawn_root(&mut platform, empty_image(), &[]).unwrap();
    let child = kernel.exec(&mut platform, root, "child.coff", &[]).unwrap();

    // Stand in for the exception entry routing a fatal fault to kill_process.
    kernel.kill_process(&mut platform, child);

    let result = kernel.join(&mut platform, root, child).unwrap();
    assert_eq!(result, JoinResult::Killed);
    assert!(kernel.process(child).is_none());
}

#[test]
fn join_on_non_child_fails() {
    let mut platform = MockPlatform::new(64, PageSize::DEFAULT.bytes(), 4);
    platform.register_program("a.coff", one_page_image(PageSize::DEFAULT.bytes()));
    platform.register_program("b.coff", one_page_image(PageSize::DEFAULT.bytes()));
    let mut kernel: Kernel<MockPlatform> = Kernel::new(resident_config());

    let (root, _) = kernel.spawn_root(&mut platform, empty_image(), &[]).unwrap();
    let a = kernel.exec(&mut platform, root, "a.coff", &[]).unwrap();
    let _b = kernel.exec(&mut platform, root, "b.coff", &[]).unwrap();

    // `a` is not root's parent, so root may not join on it... wait, root IS
    // a's parent; instead assert that `a` joining on an unrelated pid fails.
    assert!(kernel.join(&mut platform, a, root).is_err());
}

#[test]
fn exec_rejects_non_coff_suffix() {
    let mut platform = MockPlatform::new(64, PageSize::DEFAULT.bytes(), 4);
    let mut kernel: Kernel<MockPlatform> = Kernel::new(resident_config());
    let (root, _) = kernel.spawn_root(&mut platform, empty_image(), &[]).unwrap();

    let before = kernel.alive_count();
    let result = kernel.exec(&mut platform, root, "child.exe", &[]);
    assert!(result.is_err());
    assert_eq!(kernel.alive_count(), before);
}

#[test]
fn frame_accounting_across_exec_and_exit() {
    let mut platform = MockPlatform::new(64, PageSize::DEFAULT.bytes(), 4);
    platform.register_program("child.coff", one_page_image(PageSize::DEFAULT.bytes()));
    let mut kernel: Kernel<MockPlatform> = Kernel::new(resident_config());

    let (root, _) = kernel.spawn_root(&mut platform, empty_image(), &[]).unwrap();
    let before = kernel.free_frame_count();

    let child = kernel.exec(&mut platform, root, "child.coff", &[]).unwrap();
    let child_pages: u32 = 1 /* image */ + 1 /* argv */ + 8 /* stack */;
    assert_eq!(kernel.free_frame_count(), before - child_pages);

    kernel.exit(&mut platform, child, 0);
    kernel.join(&mut platform, root, child).unwrap();
    assert_eq!(kernel.free_frame_count(), before);
}

#[test]
fn tlb_miss_then_resident_hit() {
    let mut platform = MockPlatform::new(16, PageSize::DEFAULT.bytes(), 4);
    let mut kernel: Kernel<MockPlatform> =
        Kernel::new(paged_config(16));

    let image = one_page_image(PageSize::DEFAULT.bytes());
    let (pid, _regs) = kernel.spawn_root(&mut platform, image, &[]).unwrap();

    let process = kernel.process_mut(pid).unwrap();
    nachos_core::tlb::handle_tlb_miss(&mut platform, process, 0, false)
        .expect("first touch should fault the page in and install a tlb slot");

    let slot = (0..platform.tlb_size())
        .find(|&i| platform.tlb_entry(i).valid)
        .expect("a tlb slot should now be valid");
    assert_eq!(platform.tlb_entry(slot).virtual_page, 0);

    // A second resolution of the same page must not double-insert into the
    // inverted table (which would panic) — it should hit the existing entry.
    let process = kernel.process_mut(pid).unwrap();
    nachos_core::tlb::handle_tlb_miss(&mut platform, process, 4, true)
        .expect("second touch of the same page should not fault again");
}

#[test]
fn eviction_of_dirty_page_loses_the_write() {
    use nachos_core::mem_copy::{read_from_user, write_to_user};

    let page_size = PageSize::DEFAULT.bytes();
    // Only two physical frames: just enough to hold the argv page and one
    // faulted-in page at a time, so a third and fourth fault are each
    // forced to evict the oldest resident entry.
    let mut platform = MockPlatform::new(2, page_size, 4);
    let mut kernel: Kernel<MockPlatform> = Kernel::new(paged_config(2));

    let image = one_page_image(page_size);
    let (pid, _regs) = kernel.spawn_root(&mut platform, image, &[]).unwrap();
    // Residency order is now [argv].

    let process = kernel.process_mut(pid).unwrap();
    write_to_user(process, &mut platform, 0, &[0xAB]).unwrap();
    // Residency order is now [argv, vpn 0], both frames in use.

    // Fault in the first stack page (vpn 1): the pool is exhausted, so this
    // evicts argv, the oldest entry. Order: [vpn 0, vpn 1].
    let process = kernel.process_mut(pid).unwrap();
    let mut scratch = [0u8; 1];
    read_from_user(process, &mut platform, page_size, &mut scratch).unwrap();

    // Fault in the second stack page (vpn 2): the pool is exhausted again,
    // so this evicts vpn 0 — the page we just wrote a dirty byte into.
    // Order: [vpn 1, vpn 2].
    let process = kernel.process_mut(pid).unwrap();
    read_from_user(process, &mut platform, page_size * 2, &mut scratch).unwrap();

    // Re-faulting vpn 0 reloads it from the executable image (this page's
    // image content is all zero) rather than recovering the lost write.
    let process = kernel.process_mut(pid).unwrap();
    let mut reloaded = [0u8; 1];
    read_from_user(process, &mut platform, 0, &mut reloaded).unwrap();
    assert_eq!(reloaded[0], 0, "dirty write should not survive eviction with no swap device");
}

#[test]
fn write_then_read_round_trip() {
    use nachos_core::mem_copy::{read_from_user, write_to_user};

    let mut platform = MockPlatform::new(64, PageSize::DEFAULT.bytes(), 4);
    let mut kernel: Kernel<MockPlatform> = Kernel::new(resident_config());
    let (root, _) = kernel
        .spawn_root(&mut platform, one_page_image(PageSize::DEFAULT.bytes()), &[])
        .unwrap();

    let process = kernel.process_mut(root).unwrap();
    let payload = b"hello, nachos";
    write_to_user(process, &mut platform, 0, payload).unwrap();

    let process = kernel.process_mut(root).unwrap();
    let mut out = vec![0u8; payload.len()];
    read_from_user(process, &mut platform, 0, &mut out).unwrap();
    assert_eq!(&out, payload);
}
