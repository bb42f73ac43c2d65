// SPDX-License-Identifier: Apache-2.0
// Copyright 2024-2026 Qbitel Inc.

//! Control task
//!
//! Opens its modules behind the barrier, then drains its event ring into
//! the controls framework whenever the event signal fires.

use crate::control;
use crate::event::{self, EventId};
use crate::task::{self, Signal, TaskId};
use fw_common::{log_error, Result};

/// Forward every queued event to the controls framework
fn handle_events(task_id: TaskId) -> Result<()> {
    let mut event = event::handle(task_id)?;
    while event.id != EventId::NullEvent {
        control::disperse_event(&event)?;
        event = event::handle(task_id)?;
    }
    Ok(())
}

/// Task-specific module opens; nothing yet beyond the shared setup
fn open_modules() {}

/// Control task entry
pub fn task_body() {
    task::wait_strict(Signal::GlobalOpen);

    // Open time
    open_modules();
    if let Err(error) = task::send_open_signal(TaskId::Control) {
        log_error!("control", "open signal failed: {}", error);
    }
    task::wait_strict(Signal::GlobalRun);

    // Run time
    loop {
        let received = task::wait_any();
        if received == 0 {
            break; // No kernel; nothing to wait on
        }

        if received & Signal::GlobalEvent.bits() != 0 {
            if let Err(error) = handle_events(TaskId::Control) {
                log_error!("control", "event handling failed: {}", error);
            }
        }

        if received & Signal::GlobalTerminate.bits() != 0 {
            break;
        }
    }
}
