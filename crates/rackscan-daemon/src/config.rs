//! Configuration loading

use anyhow::{Context, Result};
use rackscan_core::DEFAULT_PORT;
use serde::{Deserialize, Serialize};
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::info;

/// Name of the equipment directory next to the executable
pub const EQUIPMENT_DIR_NAME: &str = "equipment";

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub equipment: EquipmentConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// TCP port to listen on
    #[serde(default = "default_port")]
    pub port: u16,
    /// Interface address to bind (all interfaces by default)
    #[serde(default = "default_bind_ip")]
    pub bind_ip: IpAddr,
    /// Deadline for a client's request in seconds (0 waits forever)
    #[serde(default)]
    pub read_timeout_secs: u64,
    /// Deadline for writing the response in seconds (0 waits forever)
    #[serde(default)]
    pub write_timeout_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            bind_ip: default_bind_ip(),
            read_timeout_secs: 0,
            write_timeout_secs: 0,
        }
    }
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

fn default_bind_ip() -> IpAddr {
    IpAddr::V4(Ipv4Addr::UNSPECIFIED)
}

impl ServerConfig {
    pub fn bind_addr(&self) -> SocketAddr {
        SocketAddr::new(self.bind_ip, self.port)
    }

    pub fn read_timeout(&self) -> Option<Duration> {
        non_zero_secs(self.read_timeout_secs)
    }

    pub fn write_timeout(&self) -> Option<Duration> {
        non_zero_secs(self.write_timeout_secs)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EquipmentConfig {
    /// Equipment directory; defaults to `equipment` beside the executable
    #[serde(default)]
    pub dir: Option<PathBuf>,
    /// Re-scan interval in seconds (0 scans once at startup)
    #[serde(default)]
    pub rescan_interval_secs: u64,
}

impl EquipmentConfig {
    pub fn rescan_interval(&self) -> Option<Duration> {
        non_zero_secs(self.rescan_interval_secs)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Path to the SQLite database file
    #[serde(default = "default_database_path")]
    pub path: PathBuf,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_database_path(),
        }
    }
}

fn default_database_path() -> PathBuf {
    PathBuf::from("equipment.db")
}

fn non_zero_secs(secs: u64) -> Option<Duration> {
    (secs > 0).then(|| Duration::from_secs(secs))
}

impl Config {
    /// Equipment directory to scan: the configured one, or `equipment`
    /// next to the running executable
    pub fn equipment_dir(&self) -> Result<PathBuf> {
        match &self.equipment.dir {
            Some(dir) => Ok(dir.clone()),
            None => executable_equipment_dir(),
        }
    }
}

fn executable_equipment_dir() -> Result<PathBuf> {
    let exe = std::env::current_exe().context("Failed to locate the running executable")?;
    let exe_dir = exe
        .parent()
        .context("Executable path has no parent directory")?;
    Ok(exe_dir.join(EQUIPMENT_DIR_NAME))
}

/// Load configuration from file
pub fn load_config(path: &Path) -> Result<Config> {
    if path.exists() {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Invalid configuration file {}", path.display()))?;
        info!(path = %path.display(), "Loaded configuration");
        Ok(config)
    } else {
        info!(
            path = %path.display(),
            "Configuration file not found, using defaults"
        );
        Ok(Config::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_uses_defaults() {
        let dir = TempDir::new().unwrap();
        let config = load_config(&dir.path().join("rackscan.toml")).unwrap();

        assert_eq!(config.server.port, 12345);
        assert_eq!(config.server.bind_addr().to_string(), "0.0.0.0:12345");
        assert_eq!(config.server.read_timeout(), None);
        assert_eq!(config.equipment.rescan_interval(), None);
        assert_eq!(config.database.path, PathBuf::from("equipment.db"));
    }

    #[test]
    fn test_partial_file_keeps_other_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("rackscan.toml");
        std::fs::write(
            &path,
            r#"
[server]
port = 4000
read_timeout_secs = 30

[equipment]
dir = "/srv/equipment"
rescan_interval_secs = 300
"#,
        )
        .unwrap();

        let config = load_config(&path).unwrap();
        assert_eq!(config.server.port, 4000);
        assert_eq!(config.server.read_timeout(), Some(Duration::from_secs(30)));
        assert_eq!(config.server.write_timeout(), None);
        assert_eq!(
            config.equipment_dir().unwrap(),
            PathBuf::from("/srv/equipment")
        );
        assert_eq!(
            config.equipment.rescan_interval(),
            Some(Duration::from_secs(300))
        );
        assert_eq!(config.database.path, PathBuf::from("equipment.db"));
    }

    #[test]
    fn test_invalid_file_is_an_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("rackscan.toml");
        std::fs::write(&path, "[server]\nport = \"not a number\"\n").unwrap();
        assert!(load_config(&path).is_err());
    }

    #[test]
    fn test_default_equipment_dir_is_beside_executable() {
        let dir = Config::default().equipment_dir().unwrap();
        assert!(dir.ends_with(EQUIPMENT_DIR_NAME));
        let exe = std::env::current_exe().unwrap();
        assert_eq!(dir.parent(), exe.parent());
    }
}
