// SPDX-License-Identifier: Apache-2.0
// Copyright 2024-2026 Qbitel Inc.

//! Command-line interpreter control
//!
//! A three-state machine driven by events on the control task:
//! `WritingPrompt` emits the prompt, `WaitingForInput` feeds console
//! bytes through the line editor, `ExecutingCommand` resolves and runs a
//! command, each posting an update event to itself to advance. Console
//! input arriving while not waiting is re-posted to the tail of the
//! queue, which preserves FIFO order among keystrokes; sustained input
//! is bounded by the event ring capacity because every drained input
//! event empties the receive ring.
//!
//! The line editor supports backspace, one-slot history over ANSI
//! up/down arrows, and tab completion with match listing.

use crate::command;
use crate::control::{Control, HandleStatus};
use crate::event::{self, Event, EventId};
use crate::input;
use crate::io::{IoId, TextBuf};
use crate::output::{self, Output};
use crate::uart;
use core::cell::UnsafeCell;
use core::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use fw_common::{contract, log_warn, Error, Result};

/// Maximum command line length in bytes
pub const CMD_STR_LEN: usize = 64;

/// Worst case: single-character arguments separated by single spaces
pub const MAX_ARGS: usize = (CMD_STR_LEN - 2) / 2;

const ECHO_INPUT: bool = true;

/// Bytes received but never echoed back
const ECHO_EXCEPTIONS: [u8; 1] = [b'\t'];

const ESC: u8 = 0x1B;
const LBRACKET: u8 = 0x5B;
const UP: u8 = 0x41;
const DOWN: u8 = 0x42;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
enum CliState {
    WritingPrompt = 0,
    WaitingForInput = 1,
    ExecutingCommand = 2,
}

struct Editor {
    buf: [u8; CMD_STR_LEN + 1],
    last: [u8; CMD_STR_LEN + 1],
    pos: usize,
}

impl Editor {
    const fn new() -> Self {
        Self {
            buf: [0; CMD_STR_LEN + 1],
            last: [0; CMD_STR_LEN + 1],
            pos: 0,
        }
    }
}

/// C-string length of a NUL-terminated buffer
fn cstr_len(buf: &[u8]) -> usize {
    buf.iter().position(|&b| b == 0).unwrap_or(buf.len())
}

fn cstr(buf: &[u8]) -> &str {
    core::str::from_utf8(&buf[..cstr_len(buf)]).unwrap_or("")
}

/// The CLI control singleton state
pub struct CliControl {
    enabled: AtomicBool,
    state: AtomicU8,
    editor: UnsafeCell<Editor>,
}

// SAFETY: The editor cell is touched only from the control task's event
// handler; the enabled/state words are atomics.
unsafe impl Sync for CliControl {}

impl CliControl {
    const fn new() -> Self {
        Self {
            enabled: AtomicBool::new(false),
            state: AtomicU8::new(CliState::WritingPrompt as u8),
            editor: UnsafeCell::new(Editor::new()),
        }
    }

    fn cli_state(&self) -> CliState {
        match self.state.load(Ordering::Acquire) {
            1 => CliState::WaitingForInput,
            2 => CliState::ExecutingCommand,
            _ => CliState::WritingPrompt,
        }
    }

    fn advance_state(&self, next: CliState, advance: bool) -> Result<()> {
        self.state.store(next as u8, Ordering::Release);

        if advance {
            event::post(EventId::ControlUpdateCliState, 0)?;
        }
        Ok(())
    }
}

fn console() -> &'static dyn Output {
    &uart::CONSOLE
}

fn console_write(text: &str) {
    if let Err(error) = output::set(console(), &text) {
        log_warn!("cli", "console write failed: {}", error);
    }
}

fn write_header() {
    console_write("Starting Command Line Interface:");
}

fn write_newline() {
    console_write("\r\n");
}

fn write_prompt() {
    write_newline();
    console_write(">");
}

/// Redraw the prompt and whatever has been entered so far
fn write_current_cmd(editor: &Editor) {
    write_newline();
    write_prompt();
    console_write(cstr(&editor.buf));
}

/// Software echo, honouring the exception list
fn echo(byte: u8) {
    if !ECHO_INPUT || ECHO_EXCEPTIONS.contains(&byte) {
        return;
    }

    let text = [byte];
    if let Ok(text) = core::str::from_utf8(&text) {
        console_write(text);
    }
}

/// A backspace with nothing entered deletes the echoed prompt; rewrite it
fn handle_null_backspace() {
    if ECHO_INPUT {
        write_prompt();
    }
}

/// Attempt tab completion: the buffer must be a prefix of exactly one
/// known command name
fn attempt_completion(editor: &mut Editor) -> Result<bool> {
    contract::require(!command::COMMANDS.is_empty(), Error::TooSmall)?;

    let cmd_len = cstr_len(&editor.buf);
    let prefix = cstr(&editor.buf);

    let mut remaining: Option<&'static str> = None;
    for command in command::COMMANDS {
        if !command.name.starts_with(prefix) {
            continue;
        }
        if remaining.is_some() {
            remaining = None; // Second match; cannot complete
            break;
        }
        remaining = Some(&command.name[cmd_len..]);
    }

    let Some(remaining) = remaining else {
        return Ok(false);
    };

    contract::invariant(cmd_len + remaining.len() <= CMD_STR_LEN, Error::InvalidLength)?;

    editor.buf[editor.pos..editor.pos + remaining.len()].copy_from_slice(remaining.as_bytes());
    editor.buf[editor.pos + remaining.len()] = 0;
    editor.buf[CMD_STR_LEN] = 0; // Truncate if too long
    editor.pos += remaining.len();

    Ok(true)
}

/// List every command matching the buffer, then redraw prompt and buffer
fn list_matches(editor: &Editor) -> Result<()> {
    contract::require(!command::COMMANDS.is_empty(), Error::TooSmall)?;

    write_newline();

    let prefix = cstr(&editor.buf);
    if !prefix.is_empty() {
        for command in command::COMMANDS {
            if command.name.starts_with(prefix) {
                console_write(command.name);
                console_write(" ");
            }
        }
    }

    write_newline();
    write_prompt();
    console_write(cstr(&editor.buf));
    Ok(())
}

/// Feed one byte through the editor; true when the line should execute
fn process_character(editor: &mut Editor, byte: u8) -> bool {
    editor.pos = editor.pos.min(CMD_STR_LEN);
    editor.buf[editor.pos] = 0;

    let newline = byte == b'\r' || byte == b'\n';
    let tab = byte == b'\t';
    let backspace = byte == 0x08 || byte == 0x7F;

    if newline {
        editor.pos = 0;
        return true;
    }

    if tab {
        match attempt_completion(editor) {
            Ok(true) => write_current_cmd(editor),
            Ok(false) => {
                let _ = list_matches(editor);
            }
            Err(_) => {}
        }
        return false;
    }

    if backspace {
        if editor.pos == 0 {
            handle_null_backspace();
        } else {
            editor.buf[editor.pos] = 0;
            editor.pos -= 1;
        }
        return false;
    }

    editor.buf[editor.pos] = byte;
    editor.pos += 1;
    false
}

fn is_up_arrow(editor: &Editor, byte: u8) -> bool {
    editor.buf[editor.pos - 2] == ESC && editor.buf[editor.pos - 1] == LBRACKET && byte == UP
}

fn is_down_arrow(editor: &Editor, byte: u8) -> bool {
    editor.buf[editor.pos - 2] == ESC && editor.buf[editor.pos - 1] == LBRACKET && byte == DOWN
}

/// Save the buffer as the one-slot history
fn save_last_cmd(editor: &mut Editor) {
    editor.last = editor.buf;
    editor.last[CMD_STR_LEN] = 0;
}

/// Recall the one-slot history into the buffer and echo it
fn load_last_cmd(editor: &mut Editor) {
    if editor.pos != 0 {
        write_prompt();
    }

    console_write(cstr(&editor.last));

    editor.buf = editor.last;
    editor.buf[CMD_STR_LEN] = 0;
    editor.pos = cstr_len(&editor.last);
}

/// Clear the line and reprint a fresh line
fn reset_cmd(editor: &mut Editor) {
    editor.buf = [0; CMD_STR_LEN + 1];
    editor.pos = 0;
    write_newline();
}

/// On some terminals an arrow sequence wants a response from the host;
/// without one the next typed byte is consumed out-of-band. Echoing the
/// sequence itself would move the terminal cursor, so answer with a
/// single benign byte instead.
fn arrow_response() {
    console_write("B"); // B = Down
}

/// Feed a received chunk through the editor; true when a line completed
fn process_input(editor: &mut Editor, received: &str) -> bool {
    let bytes = received.as_bytes();
    let take = bytes.len().min(CMD_STR_LEN);

    let mut exec_cmd = false;
    for &byte in &bytes[..take] {
        let up = editor.pos >= 2 && is_up_arrow(editor, byte);
        let down = editor.pos >= 2 && is_down_arrow(editor, byte);

        if up {
            arrow_response();
            load_last_cmd(editor);
        } else if down {
            arrow_response();
            reset_cmd(editor);
            exec_cmd = true; // Empty command
        } else {
            echo(byte);
            exec_cmd = process_character(editor, byte);
        }

        if exec_cmd {
            break;
        }
    }

    exec_cmd
}

/// Split the buffer into arguments after the command token
///
/// Every space owns the text that follows it up to the next space; a
/// trailing space therefore contributes nothing.
fn get_args<'a>(editor: &'a Editor) -> heapless::Vec<&'a str, MAX_ARGS> {
    let mut args = heapless::Vec::new();

    let line = cstr(&editor.buf);
    let bytes = line.as_bytes();
    let scan_end = line.len().saturating_sub(1);

    let mut i = 0;
    while i < scan_end {
        if bytes[i] == b' ' {
            let start = i + 1;
            let mut end = start;
            while end < line.len() && bytes[end] != b' ' {
                end += 1;
            }
            if args.push(&line[start..end]).is_err() {
                break;
            }
        }
        i += 1;
    }

    args
}

/// Resolve and run the buffered command
fn execute_command(editor: &mut Editor) -> Result<()> {
    contract::require(!command::COMMANDS.is_empty(), Error::InvalidLength)?;

    let line = cstr(&editor.buf);

    let mut matched: Option<&'static command::Command> = None;
    for command in command::COMMANDS {
        let name_len = command.name.len();
        let bytes = line.as_bytes();

        let cmd_match = bytes.len() >= name_len && &bytes[..name_len] == command.name.as_bytes();
        let boundary = cmd_match && (bytes.len() == name_len || bytes[name_len] == b' ');

        if boundary {
            matched = Some(command);
            break;
        }
    }

    if matched.is_none() && line.is_empty() {
        return Ok(());
    }

    let Some(matched) = matched else {
        save_last_cmd(editor);

        write_newline();
        console_write("Invalid Command");
        write_newline();
        console_write("Please type 'help' for a list of commands");
        write_newline();

        return Ok(());
    };

    save_last_cmd(editor);

    write_newline();

    {
        let args = get_args(editor);
        let out = (matched.run)(&args);
        console_write(out.as_str());
    }

    editor.buf = [0; CMD_STR_LEN + 1];
    editor.pos = 0;

    Ok(())
}

impl CliControl {
    fn handle_state(&self, received: Option<&str>) -> Result<()> {
        // SAFETY: Only the control task's event handler reaches the
        // editor; see the Sync rationale on CliControl.
        let editor = unsafe { &mut *self.editor.get() };

        match self.cli_state() {
            CliState::WaitingForInput => {
                let exec_cmd = process_input(editor, received.unwrap_or(""));
                let next = if exec_cmd {
                    CliState::ExecutingCommand
                } else {
                    CliState::WaitingForInput
                };
                self.advance_state(next, exec_cmd)
            }

            CliState::ExecutingCommand => {
                execute_command(editor)?;
                self.advance_state(CliState::WritingPrompt, true)
            }

            CliState::WritingPrompt => {
                write_prompt();
                self.advance_state(CliState::WaitingForInput, false)
            }
        }
    }
}

impl Control for CliControl {
    fn name(&self) -> &'static str {
        "cli"
    }

    fn enabled(&self) -> bool {
        self.enabled.load(Ordering::Relaxed)
    }

    fn set_enabled(&self, enabled: bool) {
        self.enabled.store(enabled, Ordering::Relaxed);
    }

    fn init_control(&self) -> Result<()> {
        let console_out = output::get_by_id(IoId::UartConsole)?;
        contract::require(console_out.is_some(), Error::DeviceNotFound)?;

        write_newline();
        write_header();

        self.state
            .store(CliState::WritingPrompt as u8, Ordering::Release);
        self.handle_state(None) // Write first prompt
    }

    fn handle_event(&self, event: &Event) -> Result<HandleStatus> {
        match event.id {
            EventId::ControlUartInput => {
                if self.cli_state() == CliState::WaitingForInput {
                    let received: TextBuf = input::get(&uart::CONSOLE)?;
                    self.handle_state(Some(received.as_str()))?;
                } else {
                    // Mid-execution; keep the keystrokes ordered behind
                    // the state updates already queued
                    event::post(event.id, event.arg)?;
                }
                Ok(HandleStatus::NotHandled)
            }

            EventId::ControlUpdateCliState => {
                self.handle_state(None)?;
                Ok(HandleStatus::Handled)
            }

            EventId::NullEvent => Ok(HandleStatus::NotHandled),
        }
    }
}

/// The CLI control
pub static CLI: CliControl = CliControl::new();

/// Unit-test accessors
pub mod test_access {
    use super::{CliState, Editor, Ordering, CLI};

    /// Reset the editor and park the state machine at input collection
    pub fn reset() {
        // SAFETY: Test-only reset, serialised by the test harness.
        unsafe {
            *CLI.editor.get() = Editor::new();
        }
        CLI.state
            .store(CliState::WaitingForInput as u8, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn editor_appends_and_backspaces() {
        let mut editor = Editor::new();
        assert!(!process_character(&mut editor, b'h'));
        assert!(!process_character(&mut editor, b'i'));
        assert_eq!(cstr(&editor.buf), "hi");

        assert!(!process_character(&mut editor, 0x7F));
        assert!(!process_character(&mut editor, b'x'));
        assert_eq!(cstr(&editor.buf), "hx");
    }

    #[test]
    fn newline_resets_cursor_and_requests_execution() {
        let mut editor = Editor::new();
        process_character(&mut editor, b'o');
        assert!(process_character(&mut editor, b'\r'));
        assert_eq!(editor.pos, 0);
    }

    #[test]
    fn cursor_clamps_at_capacity() {
        let mut editor = Editor::new();
        for _ in 0..(CMD_STR_LEN + 10) {
            process_character(&mut editor, b'a');
        }
        assert!(editor.pos <= CMD_STR_LEN + 1);
        assert!(cstr_len(&editor.buf) <= CMD_STR_LEN + 1);
    }

    #[test]
    fn argument_split_excludes_the_command_token() {
        let mut editor = Editor::new();
        for &b in b"io-set 2 1" {
            process_character(&mut editor, b);
        }
        let args = get_args(&editor);
        assert_eq!(args.as_slice(), &["2", "1"]);
    }

    #[test]
    fn trailing_space_adds_no_argument() {
        let mut editor = Editor::new();
        for &b in b"help " {
            process_character(&mut editor, b);
        }
        let args = get_args(&editor);
        assert!(args.is_empty());
    }
}
