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

//! Fan profile model
//!
//! A profile is a mode flag plus one 7-step curve per fan. Raw input (a JSON
//! object from the config file or the front-end) goes through [`normalize`],
//! which first coerces every value to an integer and then range-checks it.
//! Nothing else in the crate validates profiles.

use std::borrow::Cow;
use std::num::IntErrorKind;

use serde::Serialize;
use serde_json::{json, Value};

use crate::error::ValidationError;

/// Number of steps in each fan curve
pub const CURVE_LEN: usize = 7;

/// Number of registers written to the EC: flag, CPU curve, GPU curve
pub const REGISTER_COUNT: usize = 1 + 2 * CURVE_LEN;

/// Temperature break-points (°C) of the curve steps, for display only
pub const TEMP_POINTS: [u8; CURVE_LEN] = [40, 50, 60, 70, 80, 90, 100];

pub const DEFAULT_FLAG: u8 = 13;
pub const DEFAULT_CPU_CURVE: [u8; CURVE_LEN] = [45, 50, 60, 72, 80, 85, 100];
pub const DEFAULT_GPU_CURVE: [u8; CURVE_LEN] = [0, 50, 60, 72, 80, 85, 100];

/// Seven duty-cycle steps for one fan
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FanCurve([u8; CURVE_LEN]);

impl FanCurve {
    pub const fn new(steps: [u8; CURVE_LEN]) -> Self {
        Self(steps)
    }

    pub fn steps(&self) -> &[u8; CURVE_LEN] {
        &self.0
    }

    /// Pair each step with its temperature break-point
    pub fn points(&self) -> impl Iterator<Item = (u8, u8)> + '_ {
        TEMP_POINTS.iter().copied().zip(self.0.iter().copied())
    }
}

/// A validated flag + CPU curve + GPU curve.
///
/// Fields are private: a profile can only be built from already-typed values
/// or through [`normalize`], so every instance is in range. To change one,
/// build a new one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FanProfile {
    flag: u8,
    cpu: FanCurve,
    gpu: FanCurve,
}

impl FanProfile {
    pub const fn new(flag: u8, cpu: FanCurve, gpu: FanCurve) -> Self {
        Self { flag, cpu, gpu }
    }

    pub fn flag(&self) -> u8 {
        self.flag
    }

    pub fn cpu(&self) -> &FanCurve {
        &self.cpu
    }

    pub fn gpu(&self) -> &FanCurve {
        &self.gpu
    }

    /// Loosely-typed form, as accepted by [`normalize`]
    pub fn to_value(&self) -> Value {
        json!({
            "flag": self.flag,
            "cpu": self.cpu.steps(),
            "gpu": self.gpu.steps(),
        })
    }
}

impl Default for FanProfile {
    fn default() -> Self {
        default_profile()
    }
}

/// Flattened `[flag, cpu.., gpu..]` as written to the EC
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegisterVector([u8; REGISTER_COUNT]);

impl RegisterVector {
    pub fn as_bytes(&self) -> &[u8; REGISTER_COUNT] {
        &self.0
    }

    pub fn flag(&self) -> u8 {
        self.0[0]
    }

    pub fn cpu(&self) -> &[u8] {
        &self.0[1..=CURVE_LEN]
    }

    pub fn gpu(&self) -> &[u8] {
        &self.0[CURVE_LEN + 1..]
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        false
    }
}

impl From<&FanProfile> for RegisterVector {
    fn from(profile: &FanProfile) -> Self {
        to_register_vector(profile)
    }
}

/// Anything that can be handed to [`normalize`]
pub trait ProfileInput {
    fn to_raw(&self) -> Cow<'_, Value>;
}

impl ProfileInput for Value {
    fn to_raw(&self) -> Cow<'_, Value> {
        Cow::Borrowed(self)
    }
}

impl ProfileInput for FanProfile {
    fn to_raw(&self) -> Cow<'_, Value> {
        Cow::Owned(self.to_value())
    }
}

pub const fn default_profile() -> FanProfile {
    FanProfile::new(
        DEFAULT_FLAG,
        FanCurve::new(DEFAULT_CPU_CURVE),
        FanCurve::new(DEFAULT_GPU_CURVE),
    )
}

/// Coerce and validate a raw profile.
///
/// Missing `flag`, `cpu` or `gpu` keys take the default values. Present keys
/// (including explicit `null`) must coerce: integers and finite floats
/// (truncated toward zero), booleans, and strings holding an integer.
pub fn normalize<I: ProfileInput + ?Sized>(input: &I) -> Result<FanProfile, ValidationError> {
    let raw = input.to_raw();
    let map = raw.as_object().ok_or(ValidationError::NotAnObject)?;

    let flag = match map.get("flag") {
        Some(v) => check_range("flag", coerce_int("flag", v)?)?,
        None => DEFAULT_FLAG,
    };
    let cpu = match map.get("cpu") {
        Some(v) => normalize_curve("cpu", v)?,
        None => FanCurve::new(DEFAULT_CPU_CURVE),
    };
    let gpu = match map.get("gpu") {
        Some(v) => normalize_curve("gpu", v)?,
        None => FanCurve::new(DEFAULT_GPU_CURVE),
    };

    Ok(FanProfile::new(flag, cpu, gpu))
}

pub fn to_register_vector(profile: &FanProfile) -> RegisterVector {
    let mut regs = [0u8; REGISTER_COUNT];
    regs[0] = profile.flag;
    regs[1..=CURVE_LEN].copy_from_slice(profile.cpu.steps());
    regs[CURVE_LEN + 1..].copy_from_slice(profile.gpu.steps());
    RegisterVector(regs)
}

fn normalize_curve(field: &'static str, value: &Value) -> Result<FanCurve, ValidationError> {
    let items = value.as_array().ok_or(ValidationError::NotACurve { field })?;
    if items.len() != CURVE_LEN {
        return Err(ValidationError::CurveLength { field, len: items.len() });
    }

    // coerce everything first, then range-check
    let ints = items
        .iter()
        .map(|v| coerce_int(field, v))
        .collect::<Result<Vec<_>, _>>()?;

    let mut steps = [0u8; CURVE_LEN];
    for (slot, v) in steps.iter_mut().zip(ints) {
        *slot = check_range(field, v)?;
    }
    Ok(FanCurve::new(steps))
}

fn coerce_int(field: &'static str, value: &Value) -> Result<i128, ValidationError> {
    let not_int = || ValidationError::NotAnInteger { field, value: value.to_string() };
    let too_big = |shown: String| ValidationError::OutOfRange { field, value: shown };
    match value {
        Value::Bool(b) => Ok(i128::from(*b)),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Ok(i128::from(i))
            } else if let Some(u) = n.as_u64() {
                Ok(i128::from(u))
            } else {
                match n.as_f64() {
                    Some(f) if f.is_finite() => {
                        let t = f.trunc();
                        if t < i128::MIN as f64 || t > i128::MAX as f64 {
                            return Err(too_big(n.to_string()));
                        }
                        Ok(t as i128)
                    }
                    _ => Err(not_int()),
                }
            }
        }
        Value::String(s) => {
            let s = s.trim();
            s.parse::<i128>().map_err(|e| match e.kind() {
                IntErrorKind::PosOverflow | IntErrorKind::NegOverflow => too_big(s.to_string()),
                _ => not_int(),
            })
        }
        Value::Null | Value::Array(_) | Value::Object(_) => Err(not_int()),
    }
}

fn check_range(field: &'static str, value: i128) -> Result<u8, ValidationError> {
    u8::try_from(value).map_err(|_| ValidationError::OutOfRange { field, value: value.to_string() })
}
