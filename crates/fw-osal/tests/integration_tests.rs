// SPDX-License-Identifier: Apache-2.0
// Copyright 2024-2026 Qbitel Inc.

//! Behavioral tests for the host kernel backend

use fw_osal::host::HostKernel;
use fw_osal::kernel::{KernelOps, TaskHandle};
use fw_osal::{MutexId, TimerId};
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

#[test]
fn signals_wake_a_created_task() {
    static SEEN: AtomicU32 = AtomicU32::new(0);

    fn body() {
        let bits = fw_osal::task::wait_signal();
        SEEN.store(bits, Ordering::SeqCst);
    }

    let host = fw_osal::host::init();
    let handle = fw_osal::task::create_task(body, 6, 256, 1).expect("create");
    assert_eq!(handle, TaskHandle(6));

    // The task may not have reached its wait yet; signal bits are sticky
    // on the notification word, so ordering does not matter.
    fw_osal::task::send_signal(handle, 0b1010).expect("signal");
    host.join_tasks();

    assert_eq!(SEEN.load(Ordering::SeqCst), 0b1010);
}

#[test]
fn queue_passes_items_in_order() {
    let kernel = fw_osal::host::init();

    kernel.queue_send(7, 11).unwrap();
    kernel.queue_send(7, 22).unwrap();

    assert_eq!(kernel.queue_wait(7), 11);
    assert_eq!(kernel.queue_wait(7), 22);
}

#[test]
fn mutex_excludes_across_threads() {
    let kernel: &'static HostKernel = fw_osal::host::init();

    kernel.mutex_take(MutexId::Settings).unwrap();

    let contender = std::thread::spawn(move || {
        kernel.mutex_take(MutexId::Settings).unwrap();
        kernel.mutex_give(MutexId::Settings).unwrap();
    });

    // Holder side: the contender must still be blocked
    std::thread::sleep(Duration::from_millis(20));
    assert!(!contender.is_finished());

    kernel.mutex_give(MutexId::Settings).unwrap();
    contender.join().unwrap();
}

#[test]
fn timer_start_is_idempotent() {
    fn tick(_now: u32) {}

    let kernel = fw_osal::host::init();
    kernel
        .timer_create(TimerId::Periodic, tick, 5, true)
        .unwrap();
    kernel.timer_start(TimerId::Periodic).unwrap();
    kernel.timer_start(TimerId::Periodic).unwrap();
    assert!(kernel.timer_is_running(TimerId::Periodic));
    kernel.timer_stop(TimerId::Periodic).unwrap();
    assert!(!kernel.timer_is_running(TimerId::Periodic));
}
