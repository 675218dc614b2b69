/*
 * Integration tests for gp66-fancontrol
 *
 * These tests drive the profile store and the hardware applier together
 * through the public API, the way a front-end would.
 */

use std::fs;
use std::path::PathBuf;

use gp66_fancontrol::config::{config_path, CONFIG_PATH_ENV};
use gp66_fancontrol::ec::{CPU_CURVE_REGISTER, EC_REGISTER_SPACE, FAN_MODE_REGISTER, GPU_CURVE_REGISTER};
use gp66_fancontrol::applier::PROFILE_OFFSET;
use gp66_fancontrol::{
    default_profile, normalize, to_register_vector, DebugfsEc, EmbeddedController, Error, HardwareApplier,
    HardwareError, Mode, ProfileStore, RegisterVector, ValidationError,
};
use serde_json::json;
use serial_test::serial;
use tempfile::TempDir;

/// Records every write; optionally fails them all
#[derive(Default)]
struct RecordingEc {
    writes: Vec<(Mode, RegisterVector, u64)>,
    deny: bool,
}

impl EmbeddedController for RecordingEc {
    fn write_mode(&mut self, mode: Mode, registers: &RegisterVector, offset: u64) -> Result<(), HardwareError> {
        if self.deny {
            return Err(HardwareError::PermissionDenied {
                path: PathBuf::from("/sys/kernel/debug/ec/ec0/io"),
            });
        }
        self.writes.push((mode, *registers, offset));
        Ok(())
    }
}

fn temp_store() -> (TempDir, ProfileStore) {
    let dir = TempDir::new().unwrap();
    let store = ProfileStore::new(dir.path().join("etc").join("config.json"));
    (dir, store)
}

#[test]
fn test_first_run_load_then_apply() {
    let (_dir, store) = temp_store();
    let mut applier = HardwareApplier::new(RecordingEc::default());

    let profile = store.load().unwrap();
    assert_eq!(profile, default_profile());
    applier.apply(&profile).unwrap();

    let ec = applier.into_inner();
    assert_eq!(ec.writes.len(), 1);
    let (mode, regs, offset) = ec.writes[0];
    assert_eq!(mode, Mode::Advanced);
    assert_eq!(offset, PROFILE_OFFSET);
    assert_eq!(
        regs.as_bytes(),
        &[13, 45, 50, 60, 72, 80, 85, 100, 0, 50, 60, 72, 80, 85, 100]
    );
}

#[test]
fn test_save_and_apply_front_end_flow() {
    let (_dir, store) = temp_store();
    let mut applier = HardwareApplier::new(RecordingEc::default());
    let raw = json!({ "flag": 13, "cpu": [50, 55, 65, 75, 85, 95, 100], "gpu": ["0", 40, 50, 60, 70, 80, 90] });

    store.save(&raw).unwrap();
    applier.apply(&raw).unwrap();

    let loaded = store.load().unwrap();
    assert_eq!(loaded, normalize(&raw).unwrap());
    let ec = applier.into_inner();
    assert_eq!(ec.writes[0].1, to_register_vector(&loaded));
}

#[test]
fn test_hardware_failure_leaves_persisted_profile_alone() {
    let (_dir, store) = temp_store();
    let saved = json!({ "flag": 1, "cpu": [1, 1, 1, 1, 1, 1, 1], "gpu": [2, 2, 2, 2, 2, 2, 2] });
    store.save(&saved).unwrap();
    let before = fs::read_to_string(store.path()).unwrap();

    let mut applier = HardwareApplier::new(RecordingEc { deny: true, ..Default::default() });
    let err = applier.apply(&default_profile()).unwrap_err();
    assert!(matches!(err, Error::Hardware(HardwareError::PermissionDenied { .. })));
    assert!(err.to_string().contains("Permission denied"));

    assert_eq!(fs::read_to_string(store.path()).unwrap(), before);
    assert_eq!(store.load().unwrap(), normalize(&saved).unwrap());
}

#[test]
fn test_invalid_input_rejected_by_both_paths() {
    let (_dir, store) = temp_store();
    let mut applier = HardwareApplier::new(RecordingEc::default());
    let raw = json!({ "cpu": [1, 2, 3] });

    assert!(matches!(
        store.save(&raw).unwrap_err(),
        Error::Validation(ValidationError::CurveLength { field: "cpu", len: 3 })
    ));
    assert!(matches!(
        applier.apply(&raw).unwrap_err(),
        Error::Validation(ValidationError::CurveLength { field: "cpu", len: 3 })
    ));
    assert!(applier.into_inner().writes.is_empty());
    assert!(!store.path().exists());
}

#[test]
fn test_apply_through_debugfs_backend() {
    let dir = TempDir::new().unwrap();
    let io = dir.path().join("io");
    fs::write(&io, vec![0u8; EC_REGISTER_SPACE as usize]).unwrap();

    let mut applier = HardwareApplier::new(DebugfsEc::with_path(&io));
    applier.apply(&json!({ "flag": 200 })).unwrap();

    let space = fs::read(&io).unwrap();
    let cpu = CPU_CURVE_REGISTER as usize;
    let gpu = GPU_CURVE_REGISTER as usize;
    assert_eq!(&space[cpu..cpu + 7], default_profile().cpu().steps());
    assert_eq!(&space[gpu..gpu + 7], default_profile().gpu().steps());
    assert_eq!(space[PROFILE_OFFSET as usize], 200);
    assert_eq!(space[FAN_MODE_REGISTER as usize], Mode::Advanced.selector());
    // the gap between the two curve blocks is not part of the map
    assert!(space[cpu + 7..gpu].iter().all(|b| *b == 0));
}

#[test]
#[serial]
fn test_system_store_follows_env_override() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("nested").join("fan.json");
    std::env::set_var(CONFIG_PATH_ENV, &path);

    let store = ProfileStore::system();
    assert_eq!(store.path(), path.as_path());
    assert_eq!(config_path(), path);
    assert_eq!(store.load().unwrap(), default_profile());
    assert!(path.exists());

    std::env::remove_var(CONFIG_PATH_ENV);
}
