// SPDX-License-Identifier: Apache-2.0
// Copyright 2024-2026 Qbitel Inc.

//! Event bus
//!
//! One bounded ring per task. Producers run in ISR or task context and
//! claim a slot with an atomic fetch-add on the rear counter; a release
//! fence orders the slot write before the owner-task notify. The consumer
//! side is serialised by the `EventHandle` mutex. A full ring is a fatal
//! invariant violation - event loss is not permitted.

use crate::task::{self, Signal, TaskId};
use core::cell::UnsafeCell;
use core::ptr::{addr_of, addr_of_mut};
use core::sync::atomic::{fence, AtomicBool, AtomicU16, Ordering};
use fw_common::{contract, Error, Result};
use fw_osal::mutex::{self, MutexId};

/// Ring capacity per task. Must evenly divide 2^16 so the free-running
/// 16-bit counters stay consistent across wrap.
pub const QUEUE_SIZE: u16 = 256;

/// Opaque pointer-sized event argument
pub type EventArg = usize;

/// Event identity; the owning task is a pure function of the id
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum EventId {
    /// Sentinel returned when a queue is empty
    NullEvent = 0,
    /// Console bytes await in the UART receive ring
    ControlUartInput = 1,
    /// The CLI state machine asked to be advanced
    ControlUpdateCliState = 2,
}

/// Number of event ids including the sentinel
pub const NUM_EVENTS: usize = 3;

impl EventId {
    /// Ordinal of this event id
    #[must_use]
    pub const fn index(self) -> usize {
        self as usize
    }
}

/// Build-time association of events to their owning tasks
const EVENT_TABLE: [(EventId, TaskId); 2] = [
    (EventId::ControlUartInput, TaskId::Control),
    (EventId::ControlUpdateCliState, TaskId::Control),
];

/// A discriminated event record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Event {
    /// Event identity
    pub id: EventId,
    /// Owning task, derived from the id
    pub task: TaskId,
    /// Opaque pointer-sized argument
    pub arg: EventArg,
}

/// Queue positions for diagnostics
#[derive(Debug, Clone, Copy)]
pub struct QueueInfo {
    /// Front position modulo capacity
    pub front_pos: u32,
    /// Rear position modulo capacity
    pub rear_pos: u32,
}

struct Ring {
    slots: [UnsafeCell<Event>; QUEUE_SIZE as usize],
    rear: AtomicU16,
    front: AtomicU16,
}

// SAFETY: Slot cells are written only by the producer that claimed the
// index via fetch-add on `rear`, and read only by the consumer holding
// the EventHandle mutex after observing the release fence. Two producers
// never share a claimed slot.
unsafe impl Sync for Ring {}

impl Ring {
    const fn new(owner: TaskId) -> Self {
        let mut slots = [const {
            UnsafeCell::new(Event {
                id: EventId::NullEvent,
                task: TaskId::Open,
                arg: 0,
            })
        }; QUEUE_SIZE as usize];

        let mut i = 0;
        while i < QUEUE_SIZE as usize {
            slots[i] = UnsafeCell::new(Event {
                id: EventId::NullEvent,
                task: owner,
                arg: 0,
            });
            i += 1;
        }

        Self {
            slots,
            rear: AtomicU16::new(0),
            front: AtomicU16::new(0),
        }
    }
}

static RINGS: [Ring; task::NUM_TASKS] = [Ring::new(TaskId::Open), Ring::new(TaskId::Control)];

static mut EVENT_TASK_ASSOC: [TaskId; NUM_EVENTS] = [TaskId::Open; NUM_EVENTS];

static INITED: AtomicBool = AtomicBool::new(false);

/// Owning task for an event id
#[must_use]
pub fn get_associated_task(event_id: EventId) -> TaskId {
    // SAFETY: EVENT_TASK_ASSOC is written only by init() during
    // single-threaded start-up; read-only afterwards.
    unsafe { (*addr_of!(EVENT_TASK_ASSOC))[event_id.index()] }
}

/// Front and rear positions of a task's queue
#[must_use]
pub fn get_queue_info(task_id: TaskId) -> QueueInfo {
    let ring = &RINGS[task_id.index()];
    QueueInfo {
        front_pos: u32::from(ring.front.load(Ordering::Relaxed) % QUEUE_SIZE),
        rear_pos: u32::from(ring.rear.load(Ordering::Relaxed) % QUEUE_SIZE),
    }
}

/// Post an event to its owning task's ring
///
/// Callable from ISR and task context.
///
/// # Errors
/// Raises a `QueueOverflow` contract fault when the ring has no free
/// slot, and propagates kernel signalling failures.
pub fn post(event_id: EventId, arg: EventArg) -> Result<()> {
    contract::require(INITED.load(Ordering::Acquire), Error::InvalidId)?;

    let owner = get_associated_task(event_id);
    let ring = &RINGS[owner.index()];

    let pos = ring.rear.fetch_add(1, Ordering::AcqRel) % QUEUE_SIZE;
    let next_pos = (pos + 1) % QUEUE_SIZE;
    let front = ring.front.load(Ordering::Acquire) % QUEUE_SIZE;

    contract::invariant(next_pos != front, Error::QueueOverflow)?;

    // SAFETY: The fetch-add above gave this producer exclusive claim of
    // `pos`; the consumer will not read it before observing the release
    // fence issued below.
    unsafe {
        *ring.slots[pos as usize].get() = Event {
            id: event_id,
            task: owner,
            arg,
        };
    }

    fence(Ordering::Release);

    task::send_signal(owner, Signal::GlobalEvent)
}

/// Take the next event from a task's ring
///
/// Called by the owning task only. Returns the `NullEvent` sentinel when
/// the ring is empty.
///
/// # Errors
/// Propagates mutex failures.
pub fn handle(task_id: TaskId) -> Result<Event> {
    let ring = &RINGS[task_id.index()];

    let mut taken = Event {
        id: EventId::NullEvent,
        task: task_id,
        arg: 0,
    };

    mutex::take(MutexId::EventHandle)?;

    let front = ring.front.load(Ordering::Acquire);
    let rear = ring.rear.load(Ordering::Acquire);
    if front % QUEUE_SIZE != rear % QUEUE_SIZE {
        fence(Ordering::Acquire);
        // SAFETY: front != rear means this slot was fully published by
        // its producer (release fence before the notify); the EventHandle
        // mutex serialises consumers.
        taken = unsafe { *ring.slots[(front % QUEUE_SIZE) as usize].get() };
        ring.front.fetch_add(1, Ordering::AcqRel);
    }

    mutex::give(MutexId::EventHandle)?;

    contract::ensure(taken.task == task_id, Error::InvalidId)?;

    Ok(taken)
}

/// Initialise the event bus: counters, slots, and the event→task map
///
/// # Errors
/// Raises a `DeviceInitFailed` contract fault when the platform lacks
/// lock-free 16-bit atomics.
pub fn init() -> Result<()> {
    contract::require(cfg!(target_has_atomic = "16"), Error::DeviceInitFailed)?;

    for ring in &RINGS {
        ring.front.store(0, Ordering::Release);
        ring.rear.store(0, Ordering::Release);
    }

    for (event_id, owner) in EVENT_TABLE {
        // SAFETY: init() runs during single-threaded start-up (or under
        // the test harness lock); no producer exists yet.
        unsafe {
            (*addr_of_mut!(EVENT_TASK_ASSOC))[event_id.index()] = owner;
        }
    }

    INITED.store(true, Ordering::Release);
    Ok(())
}

/// Unit-test accessors
pub mod test_access {
    use super::{Ordering, RINGS};

    /// Reset every ring to empty
    pub fn reset_queues() {
        for ring in &RINGS {
            ring.front.store(0, Ordering::SeqCst);
            ring.rear.store(0, Ordering::SeqCst);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn capacity_divides_the_counter_space() {
        assert_eq!(65536 % u32::from(QUEUE_SIZE), 0);
    }

    #[test]
    fn association_covers_every_non_sentinel_event() {
        assert_eq!(EVENT_TABLE.len(), NUM_EVENTS - 1);
    }
}
