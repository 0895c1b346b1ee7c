use std::{collections::HashMap, fs, path::Path};

use serde::Deserialize;

pub const SETTINGS_FILE_NAME: &str = "sensor_hub.toml";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct HubSettings {
    pub bind_addr: String,
}

impl Default for HubSettings {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:5000".into(),
        }
    }
}

pub fn load_settings() -> HubSettings {
    load_settings_from(Path::new(SETTINGS_FILE_NAME), |key| std::env::var(key).ok())
}

pub fn load_settings_from(path: &Path, env: impl Fn(&str) -> Option<String>) -> HubSettings {
    let mut settings = HubSettings::default();

    if let Ok(raw) = fs::read_to_string(path) {
        if let Ok(file_cfg) = toml::from_str::<HashMap<String, String>>(&raw) {
            if let Some(v) = file_cfg.get("bind_addr") {
                settings.bind_addr = v.clone();
            }
        }
    }

    if let Some(v) = env("SENSOR_HUB_BIND") {
        settings.bind_addr = v;
    }
    if let Some(v) = env("APP__BIND_ADDR") {
        settings.bind_addr = v;
    }

    settings
}

#[cfg(test)]
mod tests {
    use std::{
        env,
        time::{SystemTime, UNIX_EPOCH},
    };

    use super::*;

    #[test]
    fn defaults_to_all_interfaces_on_port_5000() {
        let settings = load_settings_from(Path::new("/nonexistent/sensor_hub.toml"), |_| None);
        assert_eq!(settings.bind_addr, "0.0.0.0:5000");
    }

    #[test]
    fn env_overrides_file() {
        let suffix = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("clock")
            .as_nanos();
        let path = env::temp_dir().join(format!("aid4all_hub_settings_{suffix}.toml"));
        fs::write(&path, "bind_addr = \"127.0.0.1:6000\"\n").expect("write");

        let from_file = load_settings_from(&path, |_| None);
        assert_eq!(from_file.bind_addr, "127.0.0.1:6000");

        let from_env = load_settings_from(&path, |key| {
            (key == "SENSOR_HUB_BIND").then(|| "127.0.0.1:7000".to_string())
        });
        assert_eq!(from_env.bind_addr, "127.0.0.1:7000");

        fs::remove_file(path).expect("cleanup");
    }
}
