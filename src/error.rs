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

//! Error types for profile validation, persistence and EC access.
//!
//! The three kinds never overlap: a profile is either rejected
//! ([`ValidationError`]), could not be read or written ([`ConfigError`]), or
//! the embedded controller refused the write ([`HardwareError`]). Operations
//! that can fail in more than one way return [`Error`], which wraps the kind
//! unchanged.

use std::io;
use std::path::PathBuf;

/// Result type alias using [`Error`]
pub type Result<T> = std::result::Result<T, Error>;

/// Any failure surfaced by the store or the applier
#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Hardware(#[from] HardwareError),
}

/// A raw profile violates the range or length rules
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("profile must be a JSON object with optional flag, cpu and gpu keys")]
    NotAnObject,

    #[error("{field} must be a list of values")]
    NotACurve { field: &'static str },

    #[error("{field} curve must contain exactly 7 values (got {len})")]
    CurveLength { field: &'static str, len: usize },

    #[error("{field} value {value} is not an integer")]
    NotAnInteger { field: &'static str, value: String },

    #[error("{field} value {value} is out of range (must be 0-255)")]
    OutOfRange { field: &'static str, value: String },
}

/// The persisted profile could not be read or written
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("Failed to create config directory {path}: {source}")]
    CreateDir { path: PathBuf, source: io::Error },

    #[error("Failed to read config {path}: {source}")]
    Read { path: PathBuf, source: io::Error },

    #[error("Failed to parse config {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("Failed to serialize profile: {0}")]
    Serialize(#[source] serde_json::Error),

    #[error("Failed to write config {path}: {source}")]
    Write { path: PathBuf, source: io::Error },
}

/// The embedded controller write failed
#[derive(thiserror::Error, Debug)]
pub enum HardwareError {
    #[error("Permission denied writing EC registers at {path} (run as root with ec_sys write_support=1)")]
    PermissionDenied { path: PathBuf },

    #[error("Embedded controller unavailable at {path} (is the ec_sys module loaded?)")]
    Unavailable { path: PathBuf },

    #[error("Embedded controller rejected the write: {0}")]
    Rejected(String),

    #[error("EC I/O error at {path}: {source}")]
    Io { path: PathBuf, source: io::Error },
}

impl HardwareError {
    /// Classify an I/O error raised while talking to the EC register file
    pub fn from_io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        let path = path.into();
        match source.kind() {
            io::ErrorKind::PermissionDenied => Self::PermissionDenied { path },
            io::ErrorKind::NotFound => Self::Unavailable { path },
            _ => Self::Io { path, source },
        }
    }
}
