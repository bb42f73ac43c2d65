// SPDX-License-Identifier: Apache-2.0
// Copyright 2024-2026 Qbitel Inc.

//! Command table
//!
//! Built-in commands declared in one table of `(name, handler,
//! description)`. IO arguments accept a decimal id or a name: the parse
//! yields the reserved zero id for non-numeric text, which routes the
//! lookup by name. Flash addresses and data are hexadecimal.

use crate::control;
use crate::event::{EventId, NUM_EVENTS};
use crate::input::{self, Input};
use crate::io::{self, ElemType, IoId, TextBuf};
use crate::output::{self, Output};
use crate::parse;
use crate::settings::{self, SettingId, MAX_STR_LEN};
use crate::task;
use crate::uart;
use core::fmt::{self, Write};
use fw_common::bits::count_digits;
use fw_common::contract;
use fw_common::Error;
use heapless::String;

/// Maximum rendered command output
pub const CMD_OUT_LEN: usize = 1024;

/// Rendered command output
pub type CmdOut = String<CMD_OUT_LEN>;

/// Command handler
pub type CommandFunc = fn(&[&str]) -> CmdOut;

/// A command table entry
pub struct Command {
    /// Name matched against the line
    pub name: &'static str,
    /// Handler
    pub run: CommandFunc,
    /// One-line description for `help`
    pub help: &'static str,
}

const NEWLINE: &str = "\r\n";
const INVALID_ARGS: &str = "Invalid Number of Arguments\r\n";

/// The command table; resolution and completion walk it in order
pub const COMMANDS: &[Command] = &[
    Command {
        name: "help",
        run: help_cmd,
        help: "Lists all commands",
    },
    Command {
        name: "control-on",
        run: control_on,
        help: "Enables the named controls",
    },
    Command {
        name: "control-off",
        run: control_off,
        help: "Disables the named controls",
    },
    Command {
        name: "control-list",
        run: control_list,
        help: "Lists controls and their state",
    },
    Command {
        name: "io-get",
        run: io_get,
        help: "Reads an input by id or name",
    },
    Command {
        name: "io-set",
        run: io_set,
        help: "Writes an output by id or name",
    },
    Command {
        name: "io-print",
        run: io_print,
        help: "Prints an IO's traffic as it happens",
    },
    Command {
        name: "io-quiet",
        run: io_quiet,
        help: "Stops printing an IO's traffic",
    },
    Command {
        name: "io-list",
        run: io_list,
        help: "Lists all registered IO",
    },
    Command {
        name: "mem",
        run: mem_list,
        help: "Dumps heap and stack usage",
    },
    Command {
        name: "setting-set",
        run: setting_set,
        help: "Sets and persists a setting",
    },
    Command {
        name: "setting-get",
        run: setting_get,
        help: "Reads a setting",
    },
    Command {
        name: "flash-write",
        run: flash_write,
        help: "Writes a hex word at a hex offset",
    },
    Command {
        name: "flash-read",
        run: flash_read,
        help: "Reads a hex word at a hex offset",
    },
    Command {
        name: "flash-erase",
        run: flash_erase,
        help: "Erases the sector at a hex offset",
    },
    Command {
        name: "reboot",
        run: reboot,
        help: "Resets the device",
    },
];

fn out_str(text: &str) -> CmdOut {
    let mut out = CmdOut::new();
    let _ = out.push_str(text);
    out
}

/// Diagnostic writer straight to the console port, for output that does
/// not fit a bounded command buffer
struct ConsoleWriter;

impl fmt::Write for ConsoleWriter {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        let _ = fw_hal::uart::send(uart::CONSOLE_PORT, s);
        Ok(())
    }
}

/// Resolve an id-or-name argument to an input
fn get_input_ptr(name_or_id: &str) -> Option<&'static dyn Input> {
    let id = parse::parse_u32(name_or_id);

    if id == IoId::InvalidId as u32 {
        input::get_by_name(name_or_id)
    } else {
        let io_id = IoId::from_u32(id)?;
        input::get_by_id(io_id).ok().flatten()
    }
}

/// Resolve an id-or-name argument to an output
fn get_output_ptr(name_or_id: &str) -> Option<&'static dyn Output> {
    let id = parse::parse_u32(name_or_id);

    if id == IoId::InvalidId as u32 {
        output::get_by_name(name_or_id)
    } else {
        let io_id = IoId::from_u32(id)?;
        output::get_by_id(io_id).ok().flatten()
    }
}

fn help_cmd(_args: &[&str]) -> CmdOut {
    let mut out = CmdOut::new();
    for command in COMMANDS {
        let _ = write!(out, "{}: {}\r\n", command.name, command.help);
    }
    out
}

fn control_on(args: &[&str]) -> CmdOut {
    if args.is_empty() {
        return out_str(INVALID_ARGS);
    }

    for name in args {
        if let Some(ctrl) = control::get_control_by_name(name) {
            ctrl.set_enabled(true);
        }
    }

    out_str(NEWLINE)
}

fn control_off(args: &[&str]) -> CmdOut {
    if args.is_empty() {
        return out_str(INVALID_ARGS);
    }

    for name in args {
        if let Some(ctrl) = control::get_control_by_name(name) {
            ctrl.set_enabled(false);
        }
    }

    out_str(NEWLINE)
}

fn control_list(_args: &[&str]) -> CmdOut {
    out_str(control::get_list_of_controls().as_str())
}

fn io_get(args: &[&str]) -> CmdOut {
    if args.is_empty() {
        return out_str(INVALID_ARGS);
    }

    let Some(io_in) = get_input_ptr(args[0]) else {
        return out_str("Invalid Input\r\n");
    };

    let mut out = CmdOut::new();
    let rendered = match io_in.meta().input_type() {
        Some(ElemType::F32) => input::get::<f32>(io_in).map(|v| {
            let _ = write!(out, "{v:.6}\r\n");
        }),
        Some(ElemType::Bool) => input::get::<bool>(io_in).map(|v| {
            let _ = write!(out, "{}\r\n", u32::from(v));
        }),
        Some(ElemType::U32) => input::get::<u32>(io_in).map(|v| {
            let _ = write!(out, "{v}\r\n");
        }),
        Some(ElemType::I32) => input::get::<i32>(io_in).map(|v| {
            let _ = write!(out, "{v}\r\n");
        }),
        Some(ElemType::Text) => input::get::<TextBuf>(io_in).map(|v| {
            let _ = write!(out, "{v}\r\n");
        }),
        None => {
            let _ = out.push_str(io_in.cmd_input().as_str());
            Ok(())
        }
    };

    if rendered.is_err() {
        return out_str("Invalid Input\r\n");
    }

    out
}

fn io_set(args: &[&str]) -> CmdOut {
    if args.len() < 2 {
        return out_str(INVALID_ARGS);
    }

    let Some(io_out) = get_output_ptr(args[0]) else {
        return out_str("Invalid Output\r\n");
    };

    let value = parse::parse_u32(args[1]);
    let written = match io_out.meta().output_type() {
        Some(ElemType::Bool) => output::set(io_out, &(value != 0)),
        Some(ElemType::U32) => output::set(io_out, &value),
        Some(ElemType::I32) => output::set(io_out, &(value as i32)),
        Some(ElemType::Text) => output::set(io_out, &args[1]),
        Some(ElemType::F32) | None => io_out.cmd_output(&args[1..]),
    };

    if written.is_err() {
        return out_str("Invalid Output\r\n");
    }

    out_str(NEWLINE)
}

fn toggle_print(args: &[&str], print: bool) -> CmdOut {
    let meta = args.first().and_then(|arg| {
        let id = parse::parse_u32(arg);
        if id == IoId::InvalidId as u32 {
            io::get_by_name(arg)
        } else {
            IoId::from_u32(id).and_then(|io_id| io::get_by_id(io_id).ok().flatten())
        }
    });

    match meta {
        Some(meta) => meta.set_print_io(print),
        None => uart::console_print(format_args!("Unrecognized I/O\r\n")),
    }

    out_str(NEWLINE)
}

fn io_print(args: &[&str]) -> CmdOut {
    toggle_print(args, true)
}

fn io_quiet(args: &[&str]) -> CmdOut {
    toggle_print(args, false)
}

fn io_list(_args: &[&str]) -> CmdOut {
    const ID_COLUMN: u32 = 6;

    let mut out = CmdOut::new();
    let _ = out.push_str("ID    Name\r\n");
    let _ = out.push_str(NEWLINE);

    for id in 0..io::NUM_IO_IDS {
        let Some(io_id) = IoId::from_u32(id) else {
            continue;
        };
        let Ok(Some(meta)) = io::get_by_id(io_id) else {
            continue; // Only show IO found in input or output lists
        };

        let _ = write!(out, "{id}");
        for _ in 0..ID_COLUMN.saturating_sub(count_digits(id)) {
            let _ = out.push(' ');
        }
        let _ = write!(out, "{}\r\n", meta.name);
    }

    out
}

fn mem_list(args: &[&str]) -> CmdOut {
    let dump = args.first().is_some_and(|arg| *arg == "dump");

    let mut console = ConsoleWriter;

    if let Ok(heap) = fw_hal::mem::heap_info() {
        let _ = writeln!(console, "Heap Usage:\r");
        let _ = writeln!(console, "Heap Start            (addr): 0x{:08X}\r", heap.base);
        let _ = writeln!(console, "Heap End              (addr): 0x{:08X}\r", heap.end);
        let _ = writeln!(console, "Heap Size            (bytes): {}\r", heap.end - heap.base);
        let _ = writeln!(console, "Heap Max Used        (bytes): {}\r", heap.max - heap.base);
        let _ = writeln!(console, "\r");
    }

    let _ = task::write_stack_usage(&mut console, dump);

    if let Ok(sp) = fw_hal::mem::stack_pointer() {
        let _ = writeln!(console, "Current Stack Pointer (addr): 0x{sp:08X}\r");
    }

    out_str(NEWLINE)
}

fn setting_set(args: &[&str]) -> CmdOut {
    if args.len() < 2 {
        return out_str(INVALID_ARGS);
    }

    let id = parse::parse_u32(args[0]);
    match SettingId::from_u32(id) {
        Some(setting_id) => {
            let _ = settings::set(setting_id, args[1], true);
        }
        None => {
            let _ = contract::require(false, Error::IdNotFound);
        }
    }

    out_str(NEWLINE)
}

fn setting_get(args: &[&str]) -> CmdOut {
    if args.is_empty() {
        return out_str(INVALID_ARGS);
    }

    let mut value: String<MAX_STR_LEN> = String::new();

    let id = parse::parse_u32(args[0]);
    match SettingId::from_u32(id) {
        Some(setting_id) => {
            let _ = settings::get(setting_id, &mut value);
        }
        None => {
            let _ = contract::require(false, Error::IdNotFound);
        }
    }

    let mut out = CmdOut::new();
    let _ = write!(out, "{value}\r\n");
    out
}

fn flash_write(args: &[&str]) -> CmdOut {
    if args.len() < 2 {
        return out_str(INVALID_ARGS);
    }

    let data = parse::parse_u32_hex(args[0]);
    let addr = parse::parse_u32_hex(args[1]);
    let _ = fw_hal::flash::write(addr, &data.to_le_bytes());

    out_str(NEWLINE)
}

fn flash_read(args: &[&str]) -> CmdOut {
    if args.is_empty() {
        return out_str(INVALID_ARGS);
    }

    let addr = parse::parse_u32_hex(args[0]);
    let mut word = [0u8; 4];
    let _ = fw_hal::flash::read(addr, &mut word);

    let mut out = CmdOut::new();
    let _ = write!(out, "0x{:08X} \r\n", u32::from_le_bytes(word));
    out
}

fn flash_erase(args: &[&str]) -> CmdOut {
    if args.is_empty() {
        return out_str(INVALID_ARGS);
    }

    let addr = parse::parse_u32_hex(args[0]);
    let _ = fw_hal::flash::erase(addr);

    out_str(NEWLINE)
}

fn reboot(_args: &[&str]) -> CmdOut {
    uart::console_print(format_args!("\r\n"));

    fw_hal::power::reset();

    out_str(NEWLINE)
}

/// Event-id sanity shared with the tracer: every id fits the trace mask
const _: () = assert!(NUM_EVENTS <= 32);
const _: () = assert!(EventId::NullEvent as u32 == 0);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_are_unique_and_nonempty() {
        for (i, a) in COMMANDS.iter().enumerate() {
            assert!(!a.name.is_empty());
            for b in &COMMANDS[i + 1..] {
                assert_ne!(a.name, b.name);
            }
        }
    }

    #[test]
    fn help_lists_every_command() {
        let rendered = help_cmd(&[]);
        for command in COMMANDS {
            assert!(rendered.as_str().contains(command.name));
        }
    }

    #[test]
    fn argument_count_guards() {
        assert_eq!(io_set(&["2"]).as_str(), INVALID_ARGS);
        assert_eq!(setting_set(&["1"]).as_str(), INVALID_ARGS);
        assert_eq!(flash_write(&["AB"]).as_str(), INVALID_ARGS);
    }
}
