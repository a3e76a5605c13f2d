use std::path::Path;

use facelive_core::LivenessConfig;
use serde::{Deserialize, Serialize};

use crate::SessionError;

/// Session configuration: liveness tunables plus driver settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Give up waiting for a blink after this many seconds (0 disables).
    pub attempt_timeout_secs: u64,
    /// Bound on queued detection events between the caller and the engine thread.
    pub channel_capacity: usize,
    pub liveness: LivenessConfig,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            attempt_timeout_secs: 30,
            channel_capacity: 4,
            liveness: LivenessConfig::default(),
        }
    }
}

impl SessionConfig {
    /// Read a TOML configuration file. Missing keys take their defaults.
    pub fn load(path: &Path) -> Result<Self, SessionError> {
        let text = std::fs::read_to_string(path).map_err(|source| SessionError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&text).map_err(|source| SessionError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Load configuration from `FACELIVE_*` environment variables with defaults.
    ///
    /// `FACELIVE_CONFIG` names a TOML file used as the base; individual
    /// variables override it. Unparsable values keep the base value.
    pub fn from_env() -> Result<Self, SessionError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, SessionError> {
        let mut config = match lookup("FACELIVE_CONFIG") {
            Some(path) => Self::load(Path::new(&path))?,
            None => Self::default(),
        };

        let liveness = &mut config.liveness;
        override_parsed(&lookup, "FACELIVE_REQUIRED_BLINKS", &mut liveness.required_blinks);
        override_parsed(&lookup, "FACELIVE_EYE_OPEN_THRESHOLD", &mut liveness.eye_open_threshold);
        override_parsed(&lookup, "FACELIVE_BLINK_DEBOUNCE_MS", &mut liveness.blink_debounce_ms);
        override_parsed(&lookup, "FACELIVE_MOTION_THRESHOLD", &mut liveness.motion_threshold);
        override_parsed(&lookup, "FACELIVE_MOTION_WINDOW_MS", &mut liveness.motion_window_ms);
        if let Some(v) = lookup("FACELIVE_LATCH_SUCCESS") {
            liveness.latch_success = v != "0";
        }
        override_parsed(
            &lookup,
            "FACELIVE_ATTEMPT_TIMEOUT_SECS",
            &mut config.attempt_timeout_secs,
        );

        Ok(config)
    }

    /// Validate both the liveness tunables and the driver settings.
    pub fn validate(&self) -> Result<(), SessionError> {
        self.liveness.validate()?;
        if self.channel_capacity == 0 {
            return Err(SessionError::ChannelCapacity);
        }
        Ok(())
    }

    pub fn to_toml(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }
}

fn override_parsed<T: std::str::FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    slot: &mut T,
) {
    let Some(raw) = lookup(key) else {
        return;
    };
    match raw.parse() {
        Ok(value) => *slot = value,
        Err(_) => tracing::warn!(key, value = %raw, "ignoring unparsable setting"),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use facelive_core::AdmissionWindow;

    use super::*;

    fn temp_path(tag: &str) -> std::path::PathBuf {
        std::env::temp_dir().join(format!(
            "facelive-config-test-{tag}-{}.toml",
            std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .unwrap()
                .as_nanos()
        ))
    }

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_without_env() {
        let config = SessionConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, SessionConfig::default());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_env_overrides() {
        let config = SessionConfig::from_lookup(lookup(&[
            ("FACELIVE_REQUIRED_BLINKS", "2"),
            ("FACELIVE_EYE_OPEN_THRESHOLD", "0.3"),
            ("FACELIVE_MOTION_WINDOW_MS", "750"),
            ("FACELIVE_LATCH_SUCCESS", "0"),
            ("FACELIVE_ATTEMPT_TIMEOUT_SECS", "5"),
        ]))
        .unwrap();
        assert_eq!(config.liveness.required_blinks, 2);
        assert_eq!(config.liveness.eye_open_threshold, 0.3);
        assert_eq!(config.liveness.motion_window_ms, 750);
        assert!(!config.liveness.latch_success);
        assert_eq!(config.attempt_timeout_secs, 5);
    }

    #[test]
    fn test_unparsable_env_keeps_default() {
        let config = SessionConfig::from_lookup(lookup(&[
            ("FACELIVE_REQUIRED_BLINKS", "two"),
            ("FACELIVE_MOTION_THRESHOLD", ""),
        ]))
        .unwrap();
        assert_eq!(config.liveness.required_blinks, 1);
        assert_eq!(config.liveness.motion_threshold, 5.0);
    }

    #[test]
    fn test_load_partial_toml() {
        let path = temp_path("partial");
        std::fs::write(
            &path,
            r#"
attempt_timeout_secs = 12

[liveness]
required_blinks = 2
motion_threshold = 8.0

[liveness.admission]
mode = "relative"
width = [0.2, 0.6]
height = [0.2, 0.6]
top = [0.1, 0.5]
left = [0.1, 0.5]
bottom = [0.5, 0.9]
right = [0.5, 0.9]
"#,
        )
        .unwrap();

        let config = SessionConfig::load(&path).unwrap();
        assert_eq!(config.attempt_timeout_secs, 12);
        assert_eq!(config.channel_capacity, 4);
        assert_eq!(config.liveness.required_blinks, 2);
        assert_eq!(config.liveness.motion_threshold, 8.0);
        assert_eq!(config.liveness.blink_debounce_ms, 200);
        assert_eq!(config.liveness.admission, AdmissionWindow::centered());

        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn test_env_file_then_override() {
        let path = temp_path("layered");
        std::fs::write(&path, "[liveness]\nrequired_blinks = 3\nblink_debounce_ms = 150\n").unwrap();
        let path_str = path.to_string_lossy().into_owned();

        let config = SessionConfig::from_lookup(lookup(&[
            ("FACELIVE_CONFIG", path_str.as_str()),
            ("FACELIVE_REQUIRED_BLINKS", "2"),
        ]))
        .unwrap();
        assert_eq!(config.liveness.required_blinks, 2);
        assert_eq!(config.liveness.blink_debounce_ms, 150);

        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn test_load_missing_file() {
        let err = SessionConfig::load(&temp_path("missing")).unwrap_err();
        assert!(matches!(err, SessionError::Read { .. }));
    }

    #[test]
    fn test_load_malformed_file() {
        let path = temp_path("malformed");
        std::fs::write(&path, "[liveness\nrequired_blinks = ").unwrap();
        let err = SessionConfig::load(&path).unwrap_err();
        assert!(matches!(err, SessionError::Parse { .. }));
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn test_zero_capacity_rejected() {
        let config = SessionConfig {
            channel_capacity: 0,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(SessionError::ChannelCapacity)));
    }

    #[test]
    fn test_default_toml_loads_back() {
        let text = SessionConfig::default().to_toml().unwrap();
        let parsed: SessionConfig = toml::from_str(&text).unwrap();
        assert_eq!(parsed, SessionConfig::default());
    }
}
