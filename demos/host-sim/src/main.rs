// SPDX-License-Identifier: Apache-2.0
// Copyright 2024-2026 Qbitel Inc.

//! Host simulation of the FirmCore firmware
//!
//! Boots the full application on the host kernel backend with the
//! simulated board, bridging stdin to the console UART receive ISR and
//! the captured UART transmit side to stdout. The virtual millisecond
//! clock is advanced in real time so periodics fire.
//!
//! Type commands as on a serial console; `help` lists them. Ctrl-D
//! exits.

use fw_common::contract::{self, FaultPolicy};
use std::io::{Read, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

fn main() {
    // Faults surface as errors on the host; a reset request ends the run
    contract::set_policy(FaultPolicy::Propagate);

    let kernel = fw_osal::host::init();
    let board = fw_hal::sim::init();

    fw_runtime::task::init().expect("task creation");

    let running = Arc::new(AtomicBool::new(true));

    // Pump captured console output and the virtual clock
    let pump = {
        let running = Arc::clone(&running);
        std::thread::spawn(move || {
            while running.load(Ordering::Relaxed) {
                kernel.advance_time(10);

                let out = board.take_uart_output(fw_runtime::uart::CONSOLE_PORT);
                if !out.is_empty() {
                    print!("{out}");
                    let _ = std::io::stdout().flush();
                }

                if board.take_reset_requested() {
                    println!("\n[host-sim] reset requested, exiting");
                    std::process::exit(0);
                }

                std::thread::sleep(Duration::from_millis(10));
            }
        })
    };

    // Bridge stdin bytes into the receive ISR
    let stdin = std::io::stdin();
    for byte in stdin.lock().bytes() {
        let Ok(byte) = byte else { break };
        if let Err(error) = fw_runtime::uart::isr_read(byte) {
            eprintln!("[host-sim] receive overrun: {error}");
        }
    }

    running.store(false, Ordering::Relaxed);
    let _ = pump.join();
}
