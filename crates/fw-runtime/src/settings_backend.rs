// SPDX-License-Identifier: Apache-2.0
// Copyright 2024-2026 Qbitel Inc.

//! Flash-log settings backend
//!
//! Two equal logical sectors hold an append-only record log. A record is
//! a 16-byte little-endian header `{id, size, deleted, reserved}`
//! followed by the text payload, padded with 0xFF to the programming
//! granularity. A header still in the unprogrammed all-0xFF state marks
//! the end of used space; a zeroed `deleted` word tombstones a record
//! without erasing. When an append no longer fits, the next sector in
//! rotation is erased, live records are compacted into it, and the
//! sources are tombstoned. A failing write triggers one rotation and a
//! single retry.
//!
//! The backend is single-threaded by construction: it is reached only
//! through the settings front-end (which holds the `Settings` mutex) and
//! the boot path.

use crate::settings::{self, ParamValue, SettingId};
use core::ptr::addr_of_mut;
use fw_common::{contract, log_warn, Error, Result};
use fw_hal::flash;

/// Maximum payload bytes per record
pub const MAX_SETTING_SIZE: u32 = 128;

const NUM_SECTORS: u32 = 2;
const STARTING_OFFSET: u32 = 0;
const UNSET_FLASH: u32 = 0xFFFF_FFFF;
const HEADER_SIZE: u32 = 16;

#[derive(Debug, Clone, Copy)]
struct RecordHeader {
    id: u32,
    size: u32,
    deleted: u32,
    reserved: u32,
}

impl RecordHeader {
    const fn new(id: u32, size: u32) -> Self {
        Self {
            id,
            size,
            deleted: UNSET_FLASH,
            reserved: UNSET_FLASH,
        }
    }

    fn to_bytes(self) -> [u8; HEADER_SIZE as usize] {
        let mut bytes = [0u8; HEADER_SIZE as usize];
        bytes[0..4].copy_from_slice(&self.id.to_le_bytes());
        bytes[4..8].copy_from_slice(&self.size.to_le_bytes());
        bytes[8..12].copy_from_slice(&self.deleted.to_le_bytes());
        bytes[12..16].copy_from_slice(&self.reserved.to_le_bytes());
        bytes
    }

    fn from_bytes(bytes: &[u8; HEADER_SIZE as usize]) -> Self {
        Self {
            id: u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]),
            size: u32::from_le_bytes([bytes[4], bytes[5], bytes[6], bytes[7]]),
            deleted: u32::from_le_bytes([bytes[8], bytes[9], bytes[10], bytes[11]]),
            reserved: u32::from_le_bytes([bytes[12], bytes[13], bytes[14], bytes[15]]),
        }
    }

    const fn slot_empty(&self) -> bool {
        self.id == UNSET_FLASH
    }

    const fn live(&self) -> bool {
        self.deleted == UNSET_FLASH
    }
}

struct BackendState {
    curr_sector_addr: u32,
    fail_sector: u32,
    fail_sector_set: bool,
}

static mut STATE: BackendState = BackendState {
    curr_sector_addr: 0,
    fail_sector: 0,
    fail_sector_set: false,
};

fn state() -> &'static mut BackendState {
    // SAFETY: The backend is single-threaded by construction; every
    // caller path holds the Settings mutex or runs during start-up.
    unsafe { &mut *addr_of_mut!(STATE) }
}

/// First address past the sector containing `addr`
fn sector_end(addr: u32) -> Result<u32> {
    let size = flash::sector_size()?;
    Ok((addr + size) & !(size - 1))
}

/// Address of the record after the one at `addr`
fn increment(addr: u32, header: &RecordHeader) -> Result<u32> {
    flash::align(addr + HEADER_SIZE + header.size)
}

fn read_header(addr: u32) -> Result<RecordHeader> {
    let mut bytes = [0u8; HEADER_SIZE as usize];
    flash::read(addr, &mut bytes)?;
    Ok(RecordHeader::from_bytes(&bytes))
}

/// Next live record at or after `starting_addr`, within its sector
fn next_entry(starting_addr: u32) -> Result<Option<u32>> {
    let end = sector_end(starting_addr)?;

    let mut addr = starting_addr;
    while addr < end {
        let header = read_header(addr)?;

        if header.slot_empty() {
            break; // Reached end of used space
        }
        if header.live() {
            return Ok(Some(addr));
        }

        addr = increment(addr, &header)?;
    }

    Ok(None)
}

/// Next unprogrammed slot at or after `starting_addr`, within its sector
fn next_empty_addr(starting_addr: u32) -> Result<Option<u32>> {
    let end = sector_end(starting_addr)?;

    let mut addr = starting_addr;
    while addr < end {
        let header = read_header(addr)?;

        if header.slot_empty() {
            return Ok(Some(addr));
        }

        addr = increment(addr, &header)?;
    }

    Ok(None)
}

/// Erase the next sector in rotation, compact live records into it, and
/// move the active-sector pointer
///
/// Erase failures rotate onward; a full cycle of failures emits a
/// diagnostic and gives up. A write failure during compaction rotates
/// again.
fn next_sector() -> Result<()> {
    let sector_size = flash::sector_size()?;
    let old_sector_addr = state().curr_sector_addr;

    let mut curr_sector = old_sector_addr / sector_size + 1;
    if curr_sector < NUM_SECTORS {
        state().curr_sector_addr = curr_sector * sector_size;
    } else {
        state().curr_sector_addr = STARTING_OFFSET;
    }

    if !state().fail_sector_set {
        state().fail_sector_set = true;
        state().fail_sector = curr_sector; // Sector tried first
    }

    while flash::erase(state().curr_sector_addr).is_err() {
        curr_sector += 1;

        // A full cycle through the rotation failed
        if curr_sector == state().fail_sector {
            crate::uart::console_print(format_args!(
                "Flash Erase/Write Error: All sectors failed\r\n"
            ));
            log_warn!("settings", "flash rotation exhausted, settings not persisted");
            return Ok(());
        }

        if curr_sector < NUM_SECTORS {
            state().curr_sector_addr = curr_sector * sector_size;
        } else {
            curr_sector = 0;
            state().curr_sector_addr = STARTING_OFFSET;
        }
    }

    // Compact: copy live records from the old sector, tombstoning each
    // source as its copy lands
    let mut dest = state().curr_sector_addr;
    let mut cursor = next_entry(old_sector_addr)?;
    while let Some(addr) = cursor {
        let mut header = read_header(addr)?;

        let mut payload = [0u8; MAX_SETTING_SIZE as usize];
        let len = (header.size as usize).min(MAX_SETTING_SIZE as usize);
        flash::read(addr + HEADER_SIZE, &mut payload[..len])?;

        if flash::write(dest, &header.to_bytes()).is_err() {
            return next_sector();
        }
        if flash::write(dest + HEADER_SIZE, &payload[..len]).is_err() {
            return next_sector();
        }
        dest = flash::align(dest + HEADER_SIZE + header.size)?;

        header.deleted = 0;
        if flash::write(addr, &header.to_bytes()).is_err() {
            return next_sector();
        }

        cursor = next_entry(increment(addr, &header)?)?;
    }

    state().fail_sector_set = false;
    Ok(())
}

/// Append a setting record, tombstoning earlier records with the same id
///
/// A failing write rotates sectors and retries once; further failures
/// within the same call are not retried.
///
/// # Errors
/// Raises an `InvalidLength` contract fault for an oversized value and
/// propagates flash failures that survive rotation.
pub fn save_setting(id: SettingId, value: &str) -> Result<()> {
    contract::require(
        (value.len() as u32) < MAX_SETTING_SIZE,
        Error::InvalidLength,
    )?;

    let sector_size = flash::sector_size()?;

    let mut next_addr = next_empty_addr(state().curr_sector_addr)?;
    let fits = match next_addr {
        None => false,
        Some(addr) => {
            addr + HEADER_SIZE + value.len() as u32 <= state().curr_sector_addr + sector_size
        }
    };

    if !fits {
        next_sector()?; // Sector full, consolidate to next sector
        next_addr = next_empty_addr(state().curr_sector_addr)?;
    }

    let Some(next_addr) = next_addr else {
        return Err(Error::WriteFailed);
    };

    // Tombstone any existing records with the same id
    let mut cursor = next_entry(state().curr_sector_addr)?;
    while let Some(addr) = cursor {
        let mut header = read_header(addr)?;

        if header.id == id as u32 {
            header.deleted = 0;
            if flash::write(addr, &header.to_bytes()).is_err() {
                next_sector()?;
                return save_setting(id, value);
            }
        }

        cursor = next_entry(increment(addr, &header)?)?;
    }

    let mut payload = [0xFFu8; MAX_SETTING_SIZE as usize];
    payload[..value.len()].copy_from_slice(value.as_bytes());

    let header = RecordHeader::new(id as u32, value.len() as u32);

    if flash::write(next_addr, &header.to_bytes()).is_err() {
        next_sector()?;
    }
    if flash::write(next_addr + HEADER_SIZE, &payload[..value.len()]).is_err() {
        next_sector()?;
    }

    Ok(())
}

/// Replay every live record through the settings front-end
///
/// Replays with `save = false`: persisting during replay would overwrite
/// the records being walked.
///
/// # Errors
/// Propagates flash failures; undecodable records are skipped.
pub fn load_settings() -> Result<()> {
    let mut cursor = next_entry(state().curr_sector_addr)?;
    while let Some(addr) = cursor {
        let header = read_header(addr)?;
        contract::invariant(header.size < MAX_SETTING_SIZE, Error::ReadFailed)?;

        let mut payload = [0u8; MAX_SETTING_SIZE as usize];
        flash::read(addr + HEADER_SIZE, &mut payload[..header.size as usize])?;

        match (
            SettingId::from_u32(header.id),
            core::str::from_utf8(&payload[..header.size as usize]),
        ) {
            (Some(id), Ok(text)) => {
                // Must not save, to prevent overwriting the entry walked
                if let Err(error) = settings::set_unlocked(id, text, false) {
                    log_warn!("settings", "replay of id {} failed: {}", header.id, error);
                }
            }
            _ => {
                log_warn!("settings", "skipping undecodable record id {}", header.id);
            }
        }

        cursor = next_entry(increment(addr, &header)?)?;
    }

    Ok(())
}

/// Pick the active sector: the first with a live record or an empty slot
///
/// # Errors
/// Propagates flash failures.
pub fn backend_init() -> Result<()> {
    state().curr_sector_addr = 0; // Default when no sector qualifies
    state().fail_sector_set = false;

    let flash_size = flash::sector_size()? * NUM_SECTORS;
    let mut addr = STARTING_OFFSET;
    while addr < flash_size {
        if next_entry(addr)?.is_some() || next_empty_addr(addr)?.is_some() {
            state().curr_sector_addr = addr;
            break;
        }
        addr = sector_end(addr)?;
    }

    Ok(())
}

/// Settings callback: `FactoryReset` is write-only
///
/// # Errors
/// `UnknownType` always; the permission check rejects reads first.
pub fn get_param(id: SettingId) -> Result<ParamValue> {
    let _ = id;
    Err(Error::UnknownType)
}

/// Settings callback: writing non-zero to `FactoryReset` erases the region
///
/// # Errors
/// `UnknownType` for settings this module does not own; propagates flash
/// failures.
pub fn set_param(id: SettingId, value: &ParamValue, bootup: bool) -> Result<()> {
    let _ = bootup;

    match (id, value) {
        (SettingId::FactoryReset, ParamValue::Uint(v)) => {
            if *v == 0 {
                return Ok(());
            }

            let sector_size = flash::sector_size()?;
            for sector in 0..NUM_SECTORS {
                flash::erase(sector * sector_size)?;
            }
            state().curr_sector_addr = STARTING_OFFSET;
            Ok(())
        }
        _ => Err(Error::UnknownType),
    }
}

/// Unit-test accessors
pub mod test_access {
    use super::state;

    /// Active sector base address
    #[must_use]
    pub fn get_curr_sector() -> u32 {
        state().curr_sector_addr
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_layout_is_little_endian() {
        let header = RecordHeader::new(0x0102_0304, 5);
        let bytes = header.to_bytes();
        assert_eq!(&bytes[0..4], &[0x04, 0x03, 0x02, 0x01]);
        assert_eq!(&bytes[4..8], &[0x05, 0x00, 0x00, 0x00]);
        assert_eq!(&bytes[8..16], &[0xFF; 8]);

        let parsed = RecordHeader::from_bytes(&bytes);
        assert_eq!(parsed.id, 0x0102_0304);
        assert_eq!(parsed.size, 5);
        assert!(parsed.live());
        assert!(!parsed.slot_empty());
    }

    #[test]
    fn all_ff_header_is_an_empty_slot() {
        let header = RecordHeader::from_bytes(&[0xFF; 16]);
        assert!(header.slot_empty());
    }

    #[test]
    fn zeroed_deleted_word_is_a_tombstone() {
        let mut header = RecordHeader::new(1, 4);
        header.deleted = 0;
        let parsed = RecordHeader::from_bytes(&header.to_bytes());
        assert!(!parsed.live());
        assert!(!parsed.slot_empty());
    }
}
