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

//! Commits a fan profile to the embedded controller.
//!
//! `apply` borrows the applier mutably, so one applier never has two writes
//! in flight. Hardware errors are returned as-is and never retried.

use serde_json::json;

use crate::ec::{EmbeddedController, Mode};
use crate::error::Result;
use crate::logger;
use crate::profile::{normalize, to_register_vector, ProfileInput};

/// Register that receives the profile flag. The curve blocks and the mode
/// selector live at fixed addresses, see [`crate::ec`].
pub const PROFILE_OFFSET: u64 = 0xD4;

/// Mode the EC is switched to when a profile is applied
pub const APPLY_MODE: Mode = Mode::Advanced;

pub struct HardwareApplier<E: EmbeddedController> {
    ec: E,
}

impl<E: EmbeddedController> HardwareApplier<E> {
    pub fn new(ec: E) -> Self {
        Self { ec }
    }

    pub fn into_inner(self) -> E {
        self.ec
    }

    pub fn apply<I: ProfileInput + ?Sized>(&mut self, input: &I) -> Result<()> {
        let profile = normalize(input)?;
        let registers = to_register_vector(&profile);

        if let Err(e) = self.ec.write_mode(APPLY_MODE, &registers, PROFILE_OFFSET) {
            logger::log_event("apply_failed", json!({ "error": e.to_string() }));
            return Err(e.into());
        }

        logger::log_event(
            "profile_applied",
            json!({
                "offset": PROFILE_OFFSET,
                "registers": registers.as_bytes(),
            }),
        );
        Ok(())
    }
}
