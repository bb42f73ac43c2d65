// SPDX-License-Identifier: Apache-2.0
// Copyright 2024-2026 Qbitel Inc.

//! Behavioral tests for the HAL facade over the simulated board

use fw_hal::sim;
use fw_hal::ActiveState;

#[test]
fn facade_reaches_the_installed_board() {
    let board = sim::init();

    board.drive_pin(1, 2, true);
    assert!(fw_hal::gpio::read(1, 2).unwrap());

    fw_hal::gpio::reset(1, 2, ActiveState::High).unwrap();
    assert!(!fw_hal::gpio::read(1, 2).unwrap());
}

#[test]
fn adc_conversion_parameters() {
    let board = sim::init();
    board.set_adc_raw(5, 2048);

    assert_eq!(fw_hal::adc::read(0, 5).unwrap(), 2048);
    assert_eq!(fw_hal::adc::bit_width(0, 5).unwrap(), 12);
    let vref = fw_hal::adc::reference_voltage().unwrap();
    assert!((vref - 3.3).abs() < 1e-6);
}

#[test]
fn uart_send_is_captured() {
    let board = sim::init();
    let _ = board.take_uart_output(1);

    fw_hal::uart::send(1, "hello ").unwrap();
    fw_hal::uart::send(1, "world").unwrap();
    assert_eq!(board.take_uart_output(1), "hello world");
}

#[test]
fn flash_alignment_granularity() {
    sim::init();
    assert_eq!(fw_hal::flash::align(0).unwrap(), 0);
    assert_eq!(fw_hal::flash::align(1).unwrap(), 4);
    assert_eq!(fw_hal::flash::align(4).unwrap(), 4);
    assert_eq!(fw_hal::flash::align(17).unwrap(), 20);
    assert_eq!(fw_hal::flash::sector_size().unwrap(), sim::SECTOR_SIZE);
}

#[test]
fn power_reset_is_recorded() {
    let board = sim::init();
    let _ = board.take_reset_requested();

    fw_hal::power::reset();
    assert!(board.take_reset_requested());
    assert!(!board.take_reset_requested());
}
