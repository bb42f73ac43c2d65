// SPDX-License-Identifier: Apache-2.0
// Copyright 2024-2026 Qbitel Inc.

//! UART IO elements
//!
//! The console carries `Text` in both directions. Reception is a byte
//! ring fed from ISR context with the same atomic discipline as the
//! event rings: fetch-add claim on the rear, plain front owned by the
//! consumer task, full ring fatal. Each received byte posts a
//! `ControlUartInput` event; a read drains everything received so far.

use crate::event::{self, EventId};
use crate::input::Input;
use crate::io::{ElemType, IoData, IoFamily, IoId, IoMeta, TextBuf};
use crate::output::Output;
use core::cell::UnsafeCell;
use core::fmt;
use core::fmt::Write as _;
use core::sync::atomic::{fence, AtomicBool, AtomicU16, Ordering};
use fw_common::{contract, Error, Result};
use heapless::String;

/// Capacity of the receive byte ring. Must evenly divide 2^16.
pub const RCVD_QUEUE_SIZE: u16 = 64;

/// Kernel handle of the console port
pub const CONSOLE_PORT: u32 = 0;

/// A UART port element
pub struct UartIo {
    meta: IoMeta,
    port: u32,
    isr_enabled: AtomicBool,
    rear: AtomicU16,
    front: UnsafeCell<u16>,
    ring: [UnsafeCell<u8>; RCVD_QUEUE_SIZE as usize],
    drain_buf: UnsafeCell<TextBuf>,
}

// SAFETY: `rear` is atomic and ring slots are written only by the ISR
// producer that claimed them; `front` and `drain_buf` are touched only by
// the single consumer task that owns the element.
unsafe impl Sync for UartIo {}

impl UartIo {
    const fn new(id: IoId, name: &'static str, port: u32) -> Self {
        Self {
            meta: IoMeta::new(id, name, IoFamily::Uart),
            port,
            isr_enabled: AtomicBool::new(false),
            rear: AtomicU16::new(0),
            front: UnsafeCell::new(0),
            ring: [const { UnsafeCell::new(0) }; RCVD_QUEUE_SIZE as usize],
            drain_buf: UnsafeCell::new(String::new()),
        }
    }

    /// Append one received byte from ISR context
    ///
    /// # Errors
    /// Raises a `QueueOverflow` contract fault when the ring is full and
    /// propagates event-post failures.
    pub fn isr_read(&self, byte: u8) -> Result<()> {
        let pos = self.rear.fetch_add(1, Ordering::AcqRel) % RCVD_QUEUE_SIZE;
        let next_pos = (pos + 1) % RCVD_QUEUE_SIZE;

        // SAFETY: `front` is only written by the consumer task; a stale
        // read here errs toward reporting the ring fuller than it is.
        let front = unsafe { *self.front.get() } % RCVD_QUEUE_SIZE;
        contract::invariant(next_pos != front, Error::QueueOverflow)?;

        // SAFETY: The fetch-add gave this producer exclusive claim of
        // `pos`.
        unsafe {
            *self.ring[pos as usize].get() = byte;
        }
        fence(Ordering::Release);

        if !self.isr_enabled.load(Ordering::Acquire) {
            return Ok(());
        }

        event::post(EventId::ControlUartInput, 0)
    }

    fn drain(&self) -> &str {
        let rear = self.rear.load(Ordering::Acquire) % RCVD_QUEUE_SIZE;
        fence(Ordering::Acquire);

        // SAFETY: Single-consumer invariant; only the owning task calls
        // drain, serialised by its event loop.
        unsafe {
            let front = self.front.get();
            let buf = &mut *self.drain_buf.get();
            buf.clear();

            while *front % RCVD_QUEUE_SIZE != rear {
                let byte = *self.ring[(*front % RCVD_QUEUE_SIZE) as usize].get();
                let _ = buf.push(byte as char);
                *front = (*front).wrapping_add(1);
            }

            buf.as_str()
        }
    }
}

impl Input for UartIo {
    fn meta(&self) -> &IoMeta {
        &self.meta
    }

    fn produce(&self) -> Result<IoData<'_>> {
        Ok(IoData::Text(self.drain()))
    }

    fn init(&self) -> Result<()> {
        if !self.meta.enter_init() {
            return Ok(());
        }

        contract::require(cfg!(target_has_atomic = "16"), Error::DeviceInitFailed)?;

        self.rear.store(0, Ordering::Release);
        self.meta.init_input_info(ElemType::Text);
        self.meta.init_output_info(ElemType::Text);

        let opened = fw_hal::uart::open(self.port);
        self.isr_enabled.store(true, Ordering::Release);

        contract::ensure(opened.is_ok(), Error::DeviceInitFailed)?;
        Ok(())
    }
}

impl Output for UartIo {
    fn meta(&self) -> &IoMeta {
        &self.meta
    }

    fn consume(&self, data: &IoData<'_>) -> Result<()> {
        let IoData::Text(text) = data else {
            contract::invariant(false, Error::InvalidType)?;
            return Ok(());
        };

        fw_hal::uart::send(self.port, text)
    }

    fn init(&self) -> Result<()> {
        Input::init(self)
    }
}

/// The console UART
pub static CONSOLE: UartIo = UartIo::new(IoId::UartConsole, "console", CONSOLE_PORT);

/// Console receive ISR entry point
///
/// # Errors
/// Raises a `QueueOverflow` contract fault when the receive ring is full.
pub fn isr_read(byte: u8) -> Result<()> {
    CONSOLE.isr_read(byte)
}

/// Formatted diagnostic output straight to the console port
///
/// Used by the print sink and the memory diagnostics, which write
/// unbounded sequences and must not recurse through the typed IO layer.
pub fn console_print(args: fmt::Arguments<'_>) {
    let mut chunk: String<256> = String::new();
    if chunk.write_fmt(args).is_err() {
        // Truncated; emit what fits
    }
    let _ = fw_hal::uart::send(CONSOLE_PORT, chunk.as_str());
}

/// Unit-test accessors
pub mod test_access {
    use super::{Ordering, CONSOLE};

    /// Reset the console receive ring to empty
    pub fn reset_console_ring() {
        // SAFETY: Test-only reset, serialised by the test harness; no ISR
        // producer is active while tests drive the console directly.
        unsafe {
            *CONSOLE.front.get() = 0;
        }
        CONSOLE.rear.store(0, Ordering::SeqCst);
    }
}
