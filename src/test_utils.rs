/*
 * Test utilities and fixtures for gp66-fancontrol
 *
 * Shared helpers for the unit tests: temporary profile stores, a fake EC
 * register file and a few raw profiles.
 */

#[cfg(test)]
pub mod test_utils {
    use crate::config::ProfileStore;
    use crate::ec::EC_REGISTER_SPACE;
    use serde_json::{json, Value};
    use std::io::Write;
    use tempfile::{NamedTempFile, TempDir};

    /// Store inside a fresh temp dir; the config file and its parent dir do
    /// not exist yet. Keep the `TempDir` alive for the duration of the test.
    pub fn create_temp_store() -> (TempDir, ProfileStore) {
        let dir = TempDir::new().expect("Failed to create temp dir");
        let store = ProfileStore::new(dir.path().join("gp66-fancontrol").join("config.json"));
        (dir, store)
    }

    /// Zero-filled stand-in for the `ec_sys` register file
    pub fn create_fake_ec_file() -> NamedTempFile {
        let mut file = NamedTempFile::new().expect("Failed to create temp file");
        file.write_all(&vec![0u8; EC_REGISTER_SPACE as usize])
            .expect("Failed to write temp file");
        file.flush().expect("Failed to flush temp file");
        file
    }

    /// A profile that differs from the default in every field
    pub fn create_custom_raw_profile() -> Value {
        json!({
            "flag": 77,
            "cpu": [30, 40, 50, 60, 70, 80, 90],
            "gpu": [10, 20, 30, 40, 50, 60, 70],
        })
    }
}

#[cfg(test)]
mod tests {
    use super::test_utils::*;
    use crate::profile::normalize;

    #[test]
    fn test_create_temp_store_starts_empty() {
        let (dir, store) = create_temp_store();
        assert!(store.path().starts_with(dir.path()));
        assert!(!store.path().exists());
    }

    #[test]
    fn test_fake_ec_file_size() {
        let file = create_fake_ec_file();
        assert_eq!(std::fs::metadata(file.path()).unwrap().len(), 256);
    }

    #[test]
    fn test_custom_raw_profile_is_valid() {
        assert_eq!(normalize(&create_custom_raw_profile()).unwrap().flag(), 77);
    }
}
