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

//! gp66-fancontrol - CPU/GPU fan curves for the MSI GP66 embedded controller
//!
//! A [`profile::FanProfile`] holds a mode flag and a 7-step curve per fan.
//! [`config::ProfileStore`] persists it as JSON, and
//! [`applier::HardwareApplier`] writes it to the EC through an
//! [`ec::EmbeddedController`].

pub mod applier;
pub mod config;
pub mod ec;
pub mod error;
pub mod logger;
pub mod profile;

#[cfg(test)]
pub mod test_utils;

pub use applier::HardwareApplier;
pub use config::ProfileStore;
pub use ec::{DebugfsEc, EmbeddedController, Mode};
pub use error::{ConfigError, Error, HardwareError, Result, ValidationError};
pub use profile::{default_profile, normalize, to_register_vector, FanCurve, FanProfile, RegisterVector};
