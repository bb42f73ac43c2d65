// SPDX-License-Identifier: Apache-2.0
// Copyright 2024-2026 Qbitel Inc.

//! Typed IO base layer
//!
//! Every IO element carries a runtime element-type tag; the typed
//! accessors in [`crate::input`] and [`crate::output`] check the tag of
//! the caller's type against it and raise a contract fault on mismatch.
//! Elements register in the input and output lists; one registered in
//! both carries the fused `InputOutput` direction.

use crate::input;
use crate::output;
use crate::uart;
use core::fmt::Write;
use core::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use fw_common::{contract, Error, Result};
use heapless::String;

/// Length of IO text values (bounded by the UART receive ring)
pub const IO_TEXT_LEN: usize = 64;

/// Owned text value carried by `Text`-typed elements
pub type TextBuf = String<IO_TEXT_LEN>;

/// IO identity; dense over the IO universe
///
/// `InvalidId` is zero so a failed numeric parse lands on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum IoId {
    /// Reserved: "not a number" parses
    InvalidId = 0,
    /// Console UART
    UartConsole = 1,
    /// Status LED
    LedStatus = 2,
    /// User button
    ButtonUser = 3,
    /// Input voltage sense
    AdcVin = 4,
}

/// Number of IO ids including the reserved one
pub const NUM_IO_IDS: u32 = 5;

impl IoId {
    /// Id from its numeric value
    #[must_use]
    pub const fn from_u32(value: u32) -> Option<Self> {
        match value {
            0 => Some(Self::InvalidId),
            1 => Some(Self::UartConsole),
            2 => Some(Self::LedStatus),
            3 => Some(Self::ButtonUser),
            4 => Some(Self::AdcVin),
            _ => None,
        }
    }
}

/// Device family of an IO element
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IoFamily {
    /// General-purpose IO pin
    Gpio,
    /// Analog-to-digital converter channel
    Adc,
    /// Pulse-width modulation channel
    Pwm,
    /// Serial port
    Uart,
    /// Serial peripheral bus
    Spi,
}

impl IoFamily {
    /// Family name for diagnostics
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Gpio => "GPIO",
            Self::Adc => "ADC",
            Self::Pwm => "PWM",
            Self::Uart => "UART",
            Self::Spi => "SPI",
        }
    }
}

/// Device family by id
const IO_TYPE_LIST: [IoFamily; NUM_IO_IDS as usize] = [
    IoFamily::Gpio, // InvalidId placeholder
    IoFamily::Uart,
    IoFamily::Gpio,
    IoFamily::Gpio,
    IoFamily::Adc,
];

/// Direction an IO element was initialised with
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Direction {
    /// Not initialised
    None = 0,
    /// Readable
    Input = 1,
    /// Writable
    Output = 2,
    /// Readable and writable
    InputOutput = 3,
}

/// Runtime element-type tag: the closed set of carried value types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ElemType {
    /// Logic level
    Bool = 1,
    /// Unsigned 32-bit value
    U32 = 2,
    /// Signed 32-bit value
    I32 = 3,
    /// Text
    Text = 4,
    /// 32-bit float
    F32 = 5,
}

impl ElemType {
    const fn from_u8(value: u8) -> Option<Self> {
        match value {
            1 => Some(Self::Bool),
            2 => Some(Self::U32),
            3 => Some(Self::I32),
            4 => Some(Self::Text),
            5 => Some(Self::F32),
            _ => None,
        }
    }
}

/// A typed IO value in flight
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum IoData<'a> {
    /// Logic level
    Bool(bool),
    /// Unsigned 32-bit value
    U32(u32),
    /// Signed 32-bit value
    I32(i32),
    /// 32-bit float
    F32(f32),
    /// Text
    Text(&'a str),
}

impl IoData<'_> {
    /// Tag of the carried value
    #[must_use]
    pub const fn elem_type(&self) -> ElemType {
        match self {
            Self::Bool(_) => ElemType::Bool,
            Self::U32(_) => ElemType::U32,
            Self::I32(_) => ElemType::I32,
            Self::F32(_) => ElemType::F32,
            Self::Text(_) => ElemType::Text,
        }
    }

    /// Render for the print sink and `io-get`
    pub fn render(&self, out: &mut dyn Write) {
        match self {
            Self::Bool(v) => {
                let _ = write!(out, "{}", u32::from(*v));
            }
            Self::U32(v) => {
                let _ = write!(out, "{v}");
            }
            Self::I32(v) => {
                let _ = write!(out, "{v}");
            }
            Self::F32(v) => {
                let _ = write!(out, "{v:.6}");
            }
            Self::Text(v) => {
                let _ = write!(out, "{v}");
            }
        }
    }
}

/// Binding between a Rust type and its element tag
pub trait Element: Sized {
    /// Tag checked against the element's registered type
    const TAG: ElemType;

    /// View as wire data
    fn to_data(&self) -> IoData<'_>;

    /// Copy out of wire data; `None` for a borrow-only type
    fn from_data(data: &IoData<'_>) -> Option<Self>;
}

impl Element for bool {
    const TAG: ElemType = ElemType::Bool;

    fn to_data(&self) -> IoData<'_> {
        IoData::Bool(*self)
    }

    fn from_data(data: &IoData<'_>) -> Option<Self> {
        match data {
            IoData::Bool(v) => Some(*v),
            _ => None,
        }
    }
}

impl Element for u32 {
    const TAG: ElemType = ElemType::U32;

    fn to_data(&self) -> IoData<'_> {
        IoData::U32(*self)
    }

    fn from_data(data: &IoData<'_>) -> Option<Self> {
        match data {
            IoData::U32(v) => Some(*v),
            _ => None,
        }
    }
}

impl Element for i32 {
    const TAG: ElemType = ElemType::I32;

    fn to_data(&self) -> IoData<'_> {
        IoData::I32(*self)
    }

    fn from_data(data: &IoData<'_>) -> Option<Self> {
        match data {
            IoData::I32(v) => Some(*v),
            _ => None,
        }
    }
}

impl Element for f32 {
    const TAG: ElemType = ElemType::F32;

    fn to_data(&self) -> IoData<'_> {
        IoData::F32(*self)
    }

    fn from_data(data: &IoData<'_>) -> Option<Self> {
        match data {
            IoData::F32(v) => Some(*v),
            _ => None,
        }
    }
}

impl Element for TextBuf {
    const TAG: ElemType = ElemType::Text;

    fn to_data(&self) -> IoData<'_> {
        IoData::Text(self.as_str())
    }

    fn from_data(data: &IoData<'_>) -> Option<Self> {
        match data {
            IoData::Text(v) => {
                let mut buf = TextBuf::new();
                for c in v.chars() {
                    if buf.push(c).is_err() {
                        break; // Truncate at capacity
                    }
                }
                Some(buf)
            }
            _ => None,
        }
    }
}

/// Borrow-only text: usable with `set`, not with `get`
impl Element for &str {
    const TAG: ElemType = ElemType::Text;

    fn to_data(&self) -> IoData<'_> {
        IoData::Text(*self)
    }

    fn from_data(_data: &IoData<'_>) -> Option<Self> {
        None
    }
}

/// Shared metadata block of every IO element
pub struct IoMeta {
    /// IO identity
    pub id: IoId,
    /// Element name for by-name lookup
    pub name: &'static str,
    /// Device family
    pub family: IoFamily,
    direction: AtomicU8,
    print_io: AtomicBool,
    reentry_guard: AtomicBool,
    input_type: AtomicU8,
    output_type: AtomicU8,
}

impl IoMeta {
    /// Metadata for a device instance
    #[must_use]
    pub const fn new(id: IoId, name: &'static str, family: IoFamily) -> Self {
        Self {
            id,
            name,
            family,
            direction: AtomicU8::new(Direction::None as u8),
            print_io: AtomicBool::new(false),
            reentry_guard: AtomicBool::new(false),
            input_type: AtomicU8::new(0),
            output_type: AtomicU8::new(0),
        }
    }

    /// Current direction
    #[must_use]
    pub fn direction(&self) -> Direction {
        match self.direction.load(Ordering::Relaxed) {
            1 => Direction::Input,
            2 => Direction::Output,
            3 => Direction::InputOutput,
            _ => Direction::None,
        }
    }

    /// Print-on-access toggle
    #[must_use]
    pub fn print_io(&self) -> bool {
        self.print_io.load(Ordering::Relaxed)
    }

    /// Set the print-on-access toggle
    pub fn set_print_io(&self, print: bool) {
        self.print_io.store(print, Ordering::Relaxed);
    }

    /// Registered input element type, if initialised as an input
    #[must_use]
    pub fn input_type(&self) -> Option<ElemType> {
        ElemType::from_u8(self.input_type.load(Ordering::Relaxed))
    }

    /// Registered output element type, if initialised as an output
    #[must_use]
    pub fn output_type(&self) -> Option<ElemType> {
        ElemType::from_u8(self.output_type.load(Ordering::Relaxed))
    }

    /// One-shot init guard; the first caller gets `true`
    pub fn enter_init(&self) -> bool {
        !self.reentry_guard.swap(true, Ordering::AcqRel)
    }

    /// Record initialisation as an input, fusing the direction
    pub fn init_input_info(&self, elem: ElemType) {
        self.input_type.store(elem as u8, Ordering::Relaxed);
        let fused = match self.direction() {
            Direction::Output | Direction::InputOutput => Direction::InputOutput,
            Direction::None | Direction::Input => Direction::Input,
        };
        self.direction.store(fused as u8, Ordering::Relaxed);
        self.print_io.store(false, Ordering::Relaxed);
    }

    /// Record initialisation as an output, fusing the direction
    pub fn init_output_info(&self, elem: ElemType) {
        self.output_type.store(elem as u8, Ordering::Relaxed);
        let fused = match self.direction() {
            Direction::Input | Direction::InputOutput => Direction::InputOutput,
            Direction::None | Direction::Output => Direction::Output,
        };
        self.direction.store(fused as u8, Ordering::Relaxed);
        self.print_io.store(false, Ordering::Relaxed);
    }
}

/// Emit the generic data-traffic line for a print-enabled element
pub fn print(family: &str, name: &str, id: IoId, data: &IoData<'_>, direction: Direction) {
    let mut rendered: String<80> = String::new();
    data.render(&mut rendered);

    match direction {
        Direction::Input => uart::console_print(format_args!(
            "Received Data. IO: {}, Name: {}, ID: {}, Data: {}\r\n",
            family, name, id as u32, rendered
        )),
        Direction::Output => uart::console_print(format_args!(
            "Sent Data. IO: {}, Name: {}, ID: {}, Data: {}\r\n",
            family, name, id as u32, rendered
        )),
        Direction::None | Direction::InputOutput => {}
    }
}

/// Look an element up by name, outputs first
#[must_use]
pub fn get_by_name(name: &str) -> Option<&'static IoMeta> {
    output::get_by_name(name)
        .map(|element| element.meta())
        .or_else(|| input::get_by_name(name).map(|element| element.meta()))
}

/// Look an element up by id, outputs first
///
/// # Errors
/// Raises an `InvalidId` contract fault for an id outside the universe.
pub fn get_by_id(id: IoId) -> Result<Option<&'static IoMeta>> {
    contract::require((id as u32) < NUM_IO_IDS, Error::InvalidId)?;

    Ok(output::get_by_id(id)?
        .map(|element| element.meta())
        .or(input::get_by_id(id)?.map(|element| element.meta())))
}

/// Device family of an id
///
/// # Errors
/// Raises an `InvalidId` contract fault for an id outside the universe.
pub fn get_type(id: IoId) -> Result<IoFamily> {
    contract::require((id as u32) < NUM_IO_IDS, Error::InvalidId)?;
    Ok(IO_TYPE_LIST[id as usize])
}

/// Open the IO module: initialise every registered element exactly once
///
/// # Errors
/// Propagates device initialisation failures.
pub fn open() -> Result<()> {
    input::init_input_list()?;
    output::init_output_list()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn direction_fuses_to_input_output() {
        let meta = IoMeta::new(IoId::LedStatus, "led", IoFamily::Gpio);
        meta.init_input_info(ElemType::Bool);
        assert_eq!(meta.direction(), Direction::Input);
        meta.init_output_info(ElemType::Bool);
        assert_eq!(meta.direction(), Direction::InputOutput);
    }

    #[test]
    fn fusion_is_order_independent() {
        let meta = IoMeta::new(IoId::LedStatus, "led", IoFamily::Gpio);
        meta.init_output_info(ElemType::Bool);
        assert_eq!(meta.direction(), Direction::Output);
        meta.init_input_info(ElemType::Bool);
        assert_eq!(meta.direction(), Direction::InputOutput);
    }

    #[test]
    fn reentry_guard_is_one_shot() {
        let meta = IoMeta::new(IoId::AdcVin, "vin", IoFamily::Adc);
        assert!(meta.enter_init());
        assert!(!meta.enter_init());
    }

    #[test]
    fn element_tags_round_trip() {
        assert_eq!(bool::TAG, ElemType::Bool);
        assert_eq!(<&str>::TAG, ElemType::Text);
        assert_eq!(u32::from_data(&IoData::U32(7)), Some(7));
        assert_eq!(u32::from_data(&IoData::I32(7)), None);
        assert_eq!(i32::from_data(&IoData::I32(-3)), Some(-3));
        assert_eq!(bool::from_data(&IoData::Bool(true)), Some(true));
    }

    #[test]
    fn text_copies_and_truncates() {
        let long = "x".repeat(IO_TEXT_LEN + 10);
        let data = IoData::Text(&long);
        let copied = TextBuf::from_data(&data).unwrap();
        assert_eq!(copied.len(), IO_TEXT_LEN);
    }

    #[test]
    fn invalid_id_is_zero() {
        assert_eq!(IoId::InvalidId as u32, 0);
        assert_eq!(IoId::from_u32(0), Some(IoId::InvalidId));
        assert_eq!(IoId::from_u32(99), None);
    }
}
