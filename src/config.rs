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

//! Persisted fan profile.
//!
//! The profile lives in a small pretty-printed JSON file that operators may
//! edit by hand. A missing file is seeded with the default profile on first
//! load; a file that exists but does not parse is an error, never silently
//! replaced.

use std::env;
use std::fs;
use std::io::{self, Write};
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

use serde_json::{json, Value};
use tempfile::NamedTempFile;

use crate::error::{ConfigError, Result};
use crate::logger;
use crate::profile::{default_profile, normalize, FanProfile, ProfileInput};

/// Overrides the config location (used by tests and packaging)
pub const CONFIG_PATH_ENV: &str = "GP66_FANCONTROL_CONFIG";

pub fn config_path() -> PathBuf {
    if let Ok(path) = env::var(CONFIG_PATH_ENV) {
        if !path.is_empty() {
            return PathBuf::from(path);
        }
    }
    PathBuf::from("/etc/gp66-fancontrol/config.json")
}

#[derive(Debug, Clone)]
pub struct ProfileStore {
    path: PathBuf,
}

impl ProfileStore {
    /// Store at the system location, see [`config_path`]
    pub fn system() -> Self {
        Self::new(config_path())
    }

    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the persisted profile, seeding the default when none exists yet
    pub fn load(&self) -> Result<FanProfile> {
        self.ensure_dir()?;

        let data = match fs::read(&self.path) {
            Ok(data) => data,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                let profile = default_profile();
                self.save(&profile)?;
                logger::log_event("profile_seeded", json!({ "path": self.path }));
                return Ok(profile);
            }
            Err(source) => {
                return Err(ConfigError::Read { path: self.path.clone(), source }.into());
            }
        };

        let raw: Value = serde_json::from_slice(&data)
            .map_err(|source| ConfigError::Parse { path: self.path.clone(), source })?;
        Ok(normalize(&raw)?)
    }

    /// Normalize and persist. The file always holds the normalized form.
    pub fn save<I: ProfileInput + ?Sized>(&self, input: &I) -> Result<()> {
        self.ensure_dir()?;
        let profile = normalize(input)?;

        let mut text = serde_json::to_string_pretty(&profile).map_err(ConfigError::Serialize)?;
        text.push('\n');
        self.replace_contents(text.as_bytes())
            .map_err(|source| ConfigError::Write { path: self.path.clone(), source })?;

        logger::log_event("profile_saved", json!({ "path": self.path, "profile": profile }));
        Ok(())
    }

    /// Write a sibling temp file and rename it over the config, so the file
    /// holds either the old profile or the new one, never a prefix
    fn replace_contents(&self, bytes: &[u8]) -> io::Result<()> {
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        let mut tmp = NamedTempFile::new_in(dir)?;
        tmp.write_all(bytes)?;
        tmp.as_file().sync_all()?;
        // Best-effort set permissions to 0644
        let _ = tmp.as_file().set_permissions(fs::Permissions::from_mode(0o644));
        tmp.persist(&self.path).map_err(|e| e.error)?;
        Ok(())
    }

    fn ensure_dir(&self) -> Result<()> {
        let Some(parent) = self.path.parent() else { return Ok(()) };
        if parent.as_os_str().is_empty() || parent.exists() {
            return Ok(());
        }
        fs::create_dir_all(parent)
            .map_err(|source| ConfigError::CreateDir { path: parent.to_path_buf(), source })?;
        let _ = fs::set_permissions(parent, fs::Permissions::from_mode(0o755));
        Ok(())
    }
}
