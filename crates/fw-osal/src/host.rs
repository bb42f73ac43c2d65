// SPDX-License-Identifier: Apache-2.0
// Copyright 2024-2026 Qbitel Inc.

//! Host kernel backend
//!
//! Implements [`KernelOps`] on std threads for the test suites and the
//! host demo. Signals are per-slot words under a mutex/condvar pair, the
//! millisecond clock is virtual and advanced explicitly, and software
//! timers fire on the thread that advances the clock - which makes every
//! timing test deterministic.

use crate::kernel::{self, KernelOps, StackInfo, TaskEntry, TaskHandle, TimerCallback};
use crate::mutex::{MutexId, NUM_MUTEXES};
use crate::timer::{TimerId, NUM_TIMERS};
use core::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use fw_common::{Error, Result};
use std::cell::Cell;
use std::collections::VecDeque;
use std::sync::{Condvar, Mutex, OnceLock};
use std::thread::JoinHandle;
use std::vec::Vec;

/// Maximum number of task slots the host backend supports
pub const MAX_TASKS: usize = 8;

std::thread_local! {
    static CURRENT_SLOT: Cell<Option<u32>> = const { Cell::new(None) };
}

struct SlotState {
    created: AtomicBool,
    stack_depth: AtomicU32,
    signal: Mutex<u32>,
    signal_cv: Condvar,
    queue: Mutex<VecDeque<usize>>,
    queue_cv: Condvar,
}

impl SlotState {
    fn new() -> Self {
        Self {
            created: AtomicBool::new(false),
            stack_depth: AtomicU32::new(0),
            signal: Mutex::new(0),
            signal_cv: Condvar::new(),
            queue: Mutex::new(VecDeque::new()),
            queue_cv: Condvar::new(),
        }
    }
}

#[derive(Clone, Copy)]
struct TimerState {
    callback: TimerCallback,
    period_ms: u32,
    repeat: bool,
    running: bool,
    next_due: u32,
}

/// Host implementation of the kernel surface
pub struct HostKernel {
    slots: [SlotState; MAX_TASKS],
    mutexes: [(Mutex<bool>, Condvar); NUM_MUTEXES],
    timers: Mutex<[Option<TimerState>; NUM_TIMERS]>,
    clock_ms: AtomicU32,
    threads: Mutex<Vec<JoinHandle<()>>>,
}

impl HostKernel {
    fn new() -> Self {
        Self {
            slots: core::array::from_fn(|_| SlotState::new()),
            mutexes: core::array::from_fn(|_| (Mutex::new(false), Condvar::new())),
            timers: Mutex::new([None; NUM_TIMERS]),
            clock_ms: AtomicU32::new(0),
            threads: Mutex::new(Vec::new()),
        }
    }

    fn slot(&self, slot: u32) -> Result<&SlotState> {
        self.slots.get(slot as usize).ok_or(Error::InvalidId)
    }

    /// Mark the calling thread as running the given task slot
    ///
    /// Created tasks attach automatically; tests attach their own thread
    /// before using blocking waits.
    pub fn attach_current_thread(slot: u32) {
        CURRENT_SLOT.with(|current| current.set(Some(slot)));
    }

    /// Advance the virtual clock, firing due timers on this thread
    pub fn advance_time(&self, ms: u32) {
        for _ in 0..ms {
            let now = self.clock_ms.fetch_add(1, Ordering::SeqCst) + 1;

            let mut due: Vec<TimerCallback> = Vec::new();
            {
                let mut timers = self.timers.lock().unwrap_or_else(|e| e.into_inner());
                for timer in timers.iter_mut().flatten() {
                    if timer.running && now.wrapping_sub(timer.next_due) < u32::MAX / 2 {
                        due.push(timer.callback);
                        if timer.repeat {
                            timer.next_due = timer.next_due.wrapping_add(timer.period_ms);
                        } else {
                            timer.running = false;
                        }
                    }
                }
            }

            for callback in due {
                callback(now);
            }
        }
    }

    /// Join every task thread created so far
    ///
    /// Used by tests after requesting task termination.
    pub fn join_tasks(&self) {
        let handles: Vec<JoinHandle<()>> = {
            let mut threads = self.threads.lock().unwrap_or_else(|e| e.into_inner());
            threads.drain(..).collect()
        };
        for handle in handles {
            let _ = handle.join();
        }
    }
}

impl KernelOps for HostKernel {
    fn create_task(
        &self,
        entry: TaskEntry,
        slot: u32,
        stack_depth: u16,
        priority: u32,
    ) -> Result<TaskHandle> {
        let _ = priority; // The host scheduler is the OS scheduler
        let state = self.slot(slot)?;
        if state.created.swap(true, Ordering::SeqCst) {
            return Err(Error::TooManyAttempts);
        }
        state
            .stack_depth
            .store(u32::from(stack_depth), Ordering::SeqCst);

        let handle = std::thread::Builder::new()
            .name(std::format!("fw-task-{slot}"))
            .spawn(move || {
                CURRENT_SLOT.with(|current| current.set(Some(slot)));
                entry();
            })
            .map_err(|_| Error::NoMemory)?;

        self.threads
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(handle);

        Ok(TaskHandle(slot as usize))
    }

    fn send_signal(&self, handle: TaskHandle, bits: u32) -> Result<()> {
        let state = self.slot(handle.0 as u32)?;
        let mut signal = state.signal.lock().unwrap_or_else(|e| e.into_inner());
        *signal |= bits;
        state.signal_cv.notify_all();
        Ok(())
    }

    fn wait_signal(&self) -> u32 {
        let Some(slot) = CURRENT_SLOT.with(Cell::get) else {
            return 0;
        };
        let Ok(state) = self.slot(slot) else {
            return 0;
        };

        let mut signal = state.signal.lock().unwrap_or_else(|e| e.into_inner());
        while *signal == 0 {
            signal = state
                .signal_cv
                .wait(signal)
                .unwrap_or_else(|e| e.into_inner());
        }
        let bits = *signal;
        *signal = 0;
        bits
    }

    fn mutex_take(&self, id: MutexId) -> Result<()> {
        let (lock, cv) = &self.mutexes[id as usize];
        let mut held = lock.lock().unwrap_or_else(|e| e.into_inner());
        while *held {
            held = cv.wait(held).unwrap_or_else(|e| e.into_inner());
        }
        *held = true;
        Ok(())
    }

    fn mutex_give(&self, id: MutexId) -> Result<()> {
        let (lock, cv) = &self.mutexes[id as usize];
        let mut held = lock.lock().unwrap_or_else(|e| e.into_inner());
        *held = false;
        cv.notify_one();
        Ok(())
    }

    fn queue_send(&self, slot: u32, item: usize) -> Result<()> {
        let state = self.slot(slot)?;
        let mut queue = state.queue.lock().unwrap_or_else(|e| e.into_inner());
        queue.push_back(item);
        state.queue_cv.notify_all();
        Ok(())
    }

    fn queue_wait(&self, slot: u32) -> usize {
        let Ok(state) = self.slot(slot) else {
            return 0;
        };
        let mut queue = state.queue.lock().unwrap_or_else(|e| e.into_inner());
        loop {
            if let Some(item) = queue.pop_front() {
                return item;
            }
            queue = state
                .queue_cv
                .wait(queue)
                .unwrap_or_else(|e| e.into_inner());
        }
    }

    fn timer_create(
        &self,
        id: TimerId,
        callback: TimerCallback,
        period_ms: u32,
        repeat: bool,
    ) -> Result<()> {
        if period_ms == 0 {
            return Err(Error::InvalidTime);
        }
        let mut timers = self.timers.lock().unwrap_or_else(|e| e.into_inner());
        match &timers[id as usize] {
            Some(existing) => {
                if existing.period_ms != period_ms || existing.repeat != repeat {
                    return Err(Error::TooManyAttempts);
                }
            }
            None => {
                timers[id as usize] = Some(TimerState {
                    callback,
                    period_ms,
                    repeat,
                    running: false,
                    next_due: 0,
                });
            }
        }
        Ok(())
    }

    fn timer_start(&self, id: TimerId) -> Result<()> {
        let now = self.clock_ms.load(Ordering::SeqCst);
        let mut timers = self.timers.lock().unwrap_or_else(|e| e.into_inner());
        let timer = timers[id as usize].as_mut().ok_or(Error::DeviceNotFound)?;
        if !timer.running {
            timer.running = true;
            timer.next_due = now.wrapping_add(timer.period_ms);
        }
        Ok(())
    }

    fn timer_stop(&self, id: TimerId) -> Result<()> {
        let mut timers = self.timers.lock().unwrap_or_else(|e| e.into_inner());
        let timer = timers[id as usize].as_mut().ok_or(Error::DeviceNotFound)?;
        timer.running = false;
        Ok(())
    }

    fn timer_is_running(&self, id: TimerId) -> bool {
        let timers = self.timers.lock().unwrap_or_else(|e| e.into_inner());
        timers[id as usize].map(|t| t.running).unwrap_or(false)
    }

    fn now_ms(&self) -> u32 {
        self.clock_ms.load(Ordering::SeqCst)
    }

    fn stack_info(&self, slot: u32) -> StackInfo {
        let depth = self
            .slot(slot)
            .map(|s| s.stack_depth.load(Ordering::SeqCst))
            .unwrap_or(0);
        let size = depth * 4; // Stack depth is in words, as on the targets

        StackInfo {
            base: 0x2000_0000 + (slot as usize) * 0x8000,
            size,
            high_water: size / 4,
        }
    }
}

static HOST: OnceLock<HostKernel> = OnceLock::new();

/// Get the process-wide host kernel
pub fn instance() -> &'static HostKernel {
    HOST.get_or_init(HostKernel::new)
}

/// Install the host kernel as the active kernel (idempotent)
pub fn init() -> &'static HostKernel {
    let host = instance();
    kernel::install(host);
    host
}

/// Advance the virtual clock on the process-wide host kernel
pub fn advance_time(ms: u32) {
    instance().advance_time(ms);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn virtual_clock_advances() {
        let kernel = HostKernel::new();
        assert_eq!(kernel.now_ms(), 0);
        kernel.advance_time(25);
        assert_eq!(kernel.now_ms(), 25);
    }

    #[test]
    fn repeating_timer_fires_per_period() {
        static FIRES: AtomicU32 = AtomicU32::new(0);
        fn tick(_now: u32) {
            FIRES.fetch_add(1, Ordering::SeqCst);
        }

        let kernel = HostKernel::new();
        kernel
            .timer_create(TimerId::Periodic, tick, 10, true)
            .unwrap();
        kernel.timer_start(TimerId::Periodic).unwrap();
        kernel.advance_time(35);
        assert_eq!(FIRES.load(Ordering::SeqCst), 3);

        kernel.timer_stop(TimerId::Periodic).unwrap();
        kernel.advance_time(20);
        assert_eq!(FIRES.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn timer_redefinition_is_rejected() {
        fn tick(_now: u32) {}

        let kernel = HostKernel::new();
        kernel
            .timer_create(TimerId::Periodic, tick, 10, true)
            .unwrap();
        assert_eq!(
            kernel.timer_create(TimerId::Periodic, tick, 20, true),
            Err(Error::TooManyAttempts)
        );
        assert_eq!(
            kernel.timer_create(TimerId::Periodic, tick, 10, true),
            Ok(())
        );
    }
}
