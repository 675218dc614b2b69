/*
 * This file is part of gp66-fancontrol.
 *
 * Copyright (C) 2025 gp66-fancontrol contributors
 *
 * gp66-fancontrol is free software: you can redistribute it and/or modify
 * it under the terms of the GNU General Public License as published by
 * the Free Software Foundation, either version 3 of the License, or
 * (at your option) any later version.
 *
 * gp66-fancontrol is distributed in the hope that it will be useful,
 * but WITHOUT ANY WARRANTY; without even the implied warranty of
 * MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
 * GNU General Public License for more details.
 *
 * You should have received a copy of the GNU General Public License
 * along with gp66-fancontrol. If not, see <https://www.gnu.org/licenses/>.
 */

//! Embedded controller access
//!
//! [`EmbeddedController`] is the only way the crate touches fan hardware.
//! [`DebugfsEc`] implements it on top of the `ec_sys` kernel module, which
//! exposes the EC register space as a 256-byte file. The module must be
//! loaded with `write_support=1`.
//!
//! MSI register map used here: CPU fan duty steps at `0x72..=0x78`, GPU fan
//! duty steps at `0x8A..=0x90`, fan mode at `0xF4`. The profile flag goes to
//! the register named by the caller's offset.

use std::fs::{File, OpenOptions};
use std::io;
use std::ops::Range;
use std::os::unix::fs::FileExt;
use std::path::{Path, PathBuf};

use crate::error::HardwareError;
use crate::profile::{RegisterVector, CURVE_LEN};

/// First of the seven CPU fan duty registers
pub const CPU_CURVE_REGISTER: u64 = 0x72;

/// First of the seven GPU fan duty registers
pub const GPU_CURVE_REGISTER: u64 = 0x8A;

/// Register holding the fan control mode selector
pub const FAN_MODE_REGISTER: u64 = 0xF4;

/// Size of the EC register space exposed by `ec_sys`
pub const EC_REGISTER_SPACE: u64 = 0x100;

pub fn ec_io_path() -> PathBuf {
    PathBuf::from("/sys/kernel/debug/ec/ec0/io")
}

/// Fan control modes understood by the EC
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum Mode {
    /// User-defined curves from the profile registers
    Advanced,
}

impl Mode {
    /// Value written to [`FAN_MODE_REGISTER`]
    pub fn selector(self) -> u8 {
        match self {
            Mode::Advanced => 0x8C,
        }
    }
}

/// Write access to the embedded controller.
///
/// Implementations must write the whole register vector or fail; callers
/// serialize access, so implementations need no locking.
#[cfg_attr(test, mockall::automock)]
pub trait EmbeddedController {
    fn write_mode(&mut self, mode: Mode, registers: &RegisterVector, offset: u64) -> Result<(), HardwareError>;
}

/// Positioned writes into a register space
pub trait RegisterIo {
    fn write_at(&self, buf: &[u8], offset: u64) -> io::Result<usize>;
}

impl RegisterIo for File {
    fn write_at(&self, buf: &[u8], offset: u64) -> io::Result<usize> {
        FileExt::write_at(self, buf, offset)
    }
}

fn register_span(start: u64, len: usize) -> Option<Range<u64>> {
    start
        .checked_add(len as u64)
        .filter(|end| *end <= EC_REGISTER_SPACE)
        .map(|end| start..end)
}

/// Reject a flag register that lies outside the register space or on top of
/// the curve or mode registers.
fn check_flag_register(offset: u64) -> Result<(), HardwareError> {
    let Some(span) = register_span(offset, 1) else {
        return Err(HardwareError::Rejected(format!(
            "flag register {:#x} is outside the EC register space",
            offset
        )));
    };
    let reserved = [
        CPU_CURVE_REGISTER..CPU_CURVE_REGISTER + CURVE_LEN as u64,
        GPU_CURVE_REGISTER..GPU_CURVE_REGISTER + CURVE_LEN as u64,
        FAN_MODE_REGISTER..FAN_MODE_REGISTER + 1,
    ];
    if reserved.iter().any(|r| r.contains(&span.start)) {
        return Err(HardwareError::Rejected(format!(
            "flag register {:#04x} overlaps the fan curve or mode registers",
            offset
        )));
    }
    Ok(())
}

fn write_block<R: RegisterIo>(io: &R, path: &Path, bytes: &[u8], offset: u64) -> Result<(), HardwareError> {
    let written = io
        .write_at(bytes, offset)
        .map_err(|e| HardwareError::from_io(path, e))?;
    if written != bytes.len() {
        return Err(HardwareError::Rejected(format!(
            "short write: {} of {} registers at {:#04x}",
            written,
            bytes.len(),
            offset
        )));
    }
    Ok(())
}

/// Fixed order: CPU curve, GPU curve, flag, then the mode selector, so the
/// EC only switches modes once every curve register holds its new value.
fn write_profile<R: RegisterIo>(
    io: &R,
    path: &Path,
    mode: Mode,
    registers: &RegisterVector,
    offset: u64,
) -> Result<(), HardwareError> {
    write_block(io, path, registers.cpu(), CPU_CURVE_REGISTER)?;
    write_block(io, path, registers.gpu(), GPU_CURVE_REGISTER)?;
    write_block(io, path, &[registers.flag()], offset)?;
    write_block(io, path, &[mode.selector()], FAN_MODE_REGISTER)
}

/// EC backend over the `ec_sys` debugfs register file
#[derive(Debug, Clone)]
pub struct DebugfsEc {
    path: PathBuf,
}

impl DebugfsEc {
    pub fn new() -> Self {
        Self::with_path(ec_io_path())
    }

    /// Use a different register file (tests point this at a temp file)
    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Default for DebugfsEc {
    fn default() -> Self {
        Self::new()
    }
}

impl EmbeddedController for DebugfsEc {
    fn write_mode(&mut self, mode: Mode, registers: &RegisterVector, offset: u64) -> Result<(), HardwareError> {
        check_flag_register(offset)?;

        let file = OpenOptions::new()
            .write(true)
            .open(&self.path)
            .map_err(|e| HardwareError::from_io(&self.path, e))?;

        write_profile(&file, &self.path, mode, registers, offset)
    }
}
