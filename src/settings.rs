use std::path;
use std::time;

use config;
use failure;

const DEFAULT_CATALOG_URL: &'static str = "https://68fe47e07c700772bb135bfd.mockapi.io/deviceList";
const DEFAULT_FILE: &'static str = "iotmon";

#[derive(Debug, Deserialize)]
pub struct Settings {
    /// Where to fetch the device catalog from; empty means the built-in devices.
    pub catalog_url: String,
    pub catalog_timeout_ms: u64,
    pub tick_interval_ms: u64,
    /// Root of the `local` and `session` stores.
    pub state_dir: path::PathBuf,
    /// Devices switched off as soon as the monitor starts.
    pub disabled_devices: Vec<String>,
    pub credentials: Credentials,
}

#[derive(Clone, Debug, Deserialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

impl Settings {
    /// Layers the built-in defaults, a config file and `IOTMON_*` environment variables.
    ///
    /// Without an explicit `file`, an `iotmon.{toml,json,yaml}` in the working directory is used
    /// when present.
    pub fn load(file: Option<&path::Path>) -> Result<Self, failure::Error> {
        let mut settings = config::Config::default();

        settings.set_default("catalog_url", DEFAULT_CATALOG_URL)?;
        settings.set_default("catalog_timeout_ms", 3000i64)?;
        settings.set_default("tick_interval_ms", 5000i64)?;
        settings.set_default("state_dir", ".iotmon")?;
        settings.set_default("disabled_devices", Vec::<String>::new())?;
        settings.set_default("credentials.email", "admin@example.com")?;
        settings.set_default("credentials.password", "password123")?;

        match file {
            Some(file) => {
                settings.merge(config::File::from(file))?;
            }
            None => {
                settings.merge(config::File::with_name(DEFAULT_FILE).required(false))?;
            }
        }
        settings.merge(config::Environment::with_prefix("IOTMON").separator("__"))?;

        let settings: Settings = settings.try_into()?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn catalog_timeout(&self) -> time::Duration {
        time::Duration::from_millis(self.catalog_timeout_ms)
    }

    pub fn tick_interval(&self) -> time::Duration {
        time::Duration::from_millis(self.tick_interval_ms)
    }

    pub fn local_dir(&self) -> path::PathBuf {
        self.state_dir.join("local")
    }

    pub fn session_dir(&self) -> path::PathBuf {
        self.state_dir.join("session")
    }

    fn validate(&self) -> Result<(), failure::Error> {
        if self.tick_interval_ms == 0 {
            bail!("tick_interval_ms must be positive");
        }
        if self.catalog_timeout_ms == 0 {
            bail!("catalog_timeout_ms must be positive");
        }
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    use std::fs;

    use tempfile;

    #[test]
    fn defaults() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("empty.toml");
        fs::write(&file, "").unwrap();

        let settings = Settings::load(Some(file.as_path())).unwrap();
        assert_eq!(time::Duration::from_secs(3), settings.catalog_timeout());
        assert!(settings.disabled_devices.is_empty());
        assert_eq!("admin@example.com", settings.credentials.email);
        assert_eq!(
            path::Path::new(".iotmon").join("session"),
            settings.session_dir()
        );
    }

    #[test]
    fn file_overrides() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("iotmon.toml");
        fs::write(
            &file,
            r#"
catalog_url = ""
tick_interval_ms = 250
state_dir = "/var/lib/iotmon"
disabled_devices = ["dev-2"]

[credentials]
password = "s3cret"
"#,
        )
        .unwrap();

        let settings = Settings::load(Some(file.as_path())).unwrap();
        assert_eq!("", settings.catalog_url);
        assert_eq!(time::Duration::from_millis(250), settings.tick_interval());
        assert_eq!(path::Path::new("/var/lib/iotmon/local"), settings.local_dir());
        assert_eq!(vec!["dev-2".to_owned()], settings.disabled_devices);
        assert_eq!("admin@example.com", settings.credentials.email);
        assert_eq!("s3cret", settings.credentials.password);
    }

    #[test]
    fn rejects_zero_interval() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("iotmon.toml");
        fs::write(&file, "tick_interval_ms = 0\n").unwrap();

        assert!(Settings::load(Some(file.as_path())).is_err());
    }
}
