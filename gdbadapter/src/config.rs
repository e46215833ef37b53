/// Session configuration and persistence.
///
/// Two layers: a per-user `GlobalConfig` (recent target list, window
/// layout) resolved via the `directories` crate, and a per-ELF `.bmcfg` INI
/// file sitting next to the debugged executable, read/written with the
/// `ini` crate.
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use ini::Ini;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to resolve config directory")]
    NoConfigDir,
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("ini parse error: {0}")]
    Ini(#[from] ini::Error),
}

pub type Result<T> = std::result::Result<T, ConfigError>;

/// Per-user settings, independent of which ELF is open.
#[derive(Debug, Clone, Default)]
pub struct GlobalConfig {
    pub recent_targets: Vec<PathBuf>,
    pub gdb_path: Option<PathBuf>,
    pub window_width: Option<u32>,
    pub window_height: Option<u32>,
}

impl GlobalConfig {
    pub fn config_path() -> Result<PathBuf> {
        let dirs = directories::ProjectDirs::from("", "", "bmdebug").ok_or(ConfigError::NoConfigDir)?;
        Ok(dirs.config_dir().join("bmdebug.ini"))
    }

    pub fn load() -> Result<Self> {
        let path = Self::config_path()?;
        if !path.exists() {
            return Ok(Self::default());
        }
        let ini = Ini::load_from_file(&path)?;
        let mut cfg = Self::default();

        if let Some(section) = ini.section(Some("Recent")) {
            let mut entries: Vec<(u32, PathBuf)> = section
                .iter()
                .filter_map(|(k, v)| k.strip_prefix("target").and_then(|n| n.parse::<u32>().ok()).map(|n| (n, PathBuf::from(v))))
                .collect();
            entries.sort_by_key(|(n, _)| *n);
            cfg.recent_targets = entries.into_iter().map(|(_, p)| p).collect();
        }
        if let Some(section) = ini.section(Some("Gdb")) {
            cfg.gdb_path = section.get("path").map(PathBuf::from);
        }
        if let Some(section) = ini.section(Some("Window")) {
            cfg.window_width = section.get("width").and_then(|v| v.parse().ok());
            cfg.window_height = section.get("height").and_then(|v| v.parse().ok());
        }
        Ok(cfg)
    }

    pub fn save(&self) -> Result<()> {
        let path = Self::config_path()?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let mut ini = Ini::new();
        for (i, target) in self.recent_targets.iter().enumerate() {
            ini.with_section(Some("Recent")).set(format!("target{}", i), target.to_string_lossy().to_string());
        }
        if let Some(gdb_path) = &self.gdb_path {
            ini.with_section(Some("Gdb")).set("path", gdb_path.to_string_lossy().to_string());
        }
        if let Some(w) = self.window_width {
            ini.with_section(Some("Window")).set("width", w.to_string());
        }
        if let Some(h) = self.window_height {
            ini.with_section(Some("Window")).set("height", h.to_string());
        }
        ini.write_to_file(&path)?;
        Ok(())
    }

    pub fn push_recent(&mut self, target: PathBuf) {
        self.recent_targets.retain(|t| t != &target);
        self.recent_targets.insert(0, target);
        self.recent_targets.truncate(10);
    }
}

/// SWO trace capture settings, persisted under the `[SWO trace]` section.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SwoSettings {
    pub enabled: bool,
    pub cpu_freq_hz: Option<u32>,
    pub baud_rate: Option<u32>,
    pub channel_mask: u32,
}

/// Flash programming settings, persisted under `[Flash]`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FlashSettings {
    pub verify: bool,
    pub always_download: bool,
    pub fast_load: bool,
}

/// Serial monitor settings, persisted under `[Serial monitor]`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SerialMonitorSettings {
    pub enabled: bool,
    pub port: Option<String>,
    pub baud_rate: Option<u32>,
}

/// Per-ELF configuration, one `.bmcfg` file sitting next to the executable.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ElfConfig {
    pub target_id: Option<String>,
    pub interface: Option<String>,
    pub settings: HashMap<String, String>,
    pub flash: FlashSettings,
    pub swo: SwoSettings,
    pub serial_monitor: SerialMonitorSettings,
}

impl ElfConfig {
    pub fn path_for_elf(elf_path: &Path) -> PathBuf {
        elf_path.with_extension("bmcfg")
    }

    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let ini = Ini::load_from_file(path)?;
        let mut cfg = Self::default();

        if let Some(section) = ini.section(Some("Target")) {
            cfg.target_id = section.get("id").map(str::to_string);
            cfg.interface = section.get("interface").map(str::to_string);
        }
        if let Some(section) = ini.section(Some("Settings")) {
            for (k, v) in section.iter() {
                cfg.settings.insert(k.to_string(), v.to_string());
            }
        }
        if let Some(section) = ini.section(Some("Flash")) {
            cfg.flash.verify = section.get("verify").map(|v| v == "1" || v == "true").unwrap_or(false);
            cfg.flash.always_download = section.get("always_download").map(|v| v == "1" || v == "true").unwrap_or(false);
            cfg.flash.fast_load = section.get("fast_load").map(|v| v == "1" || v == "true").unwrap_or(false);
        }
        if let Some(section) = ini.section(Some("SWO trace")) {
            cfg.swo.enabled = section.get("enabled").map(|v| v == "1" || v == "true").unwrap_or(false);
            cfg.swo.cpu_freq_hz = section.get("cpu_freq_hz").and_then(|v| v.parse().ok());
            cfg.swo.baud_rate = section.get("baud_rate").and_then(|v| v.parse().ok());
            cfg.swo.channel_mask = section.get("channel_mask").and_then(|v| v.parse().ok()).unwrap_or(0);
        }
        if let Some(section) = ini.section(Some("Serial monitor")) {
            cfg.serial_monitor.enabled = section.get("enabled").map(|v| v == "1" || v == "true").unwrap_or(false);
            cfg.serial_monitor.port = section.get("port").map(str::to_string);
            cfg.serial_monitor.baud_rate = section.get("baud_rate").and_then(|v| v.parse().ok());
        }
        Ok(cfg)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let mut ini = Ini::new();
        {
            let mut section = ini.with_section(Some("Target"));
            if let Some(id) = &self.target_id {
                section.set("id", id);
            }
            if let Some(interface) = &self.interface {
                section.set("interface", interface);
            }
        }
        {
            let mut section = ini.with_section(Some("Settings"));
            for (k, v) in &self.settings {
                section.set(k, v);
            }
        }
        ini.with_section(Some("Flash"))
            .set("verify", bool_str(self.flash.verify))
            .set("always_download", bool_str(self.flash.always_download))
            .set("fast_load", bool_str(self.flash.fast_load));
        {
            let mut section = ini.with_section(Some("SWO trace"));
            section.set("enabled", bool_str(self.swo.enabled));
            if let Some(freq) = self.swo.cpu_freq_hz {
                section.set("cpu_freq_hz", freq.to_string());
            }
            if let Some(baud) = self.swo.baud_rate {
                section.set("baud_rate", baud.to_string());
            }
            section.set("channel_mask", self.swo.channel_mask.to_string());
        }
        {
            let mut section = ini.with_section(Some("Serial monitor"));
            section.set("enabled", bool_str(self.serial_monitor.enabled));
            if let Some(port) = &self.serial_monitor.port {
                section.set("port", port);
            }
            if let Some(baud) = self.serial_monitor.baud_rate {
                section.set("baud_rate", baud.to_string());
            }
        }
        ini.write_to_file(path)?;
        Ok(())
    }
}

fn bool_str(b: bool) -> &'static str {
    if b {
        "1"
    } else {
        "0"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn elf_config_round_trips_through_ini_file() {
        let dir = std::env::temp_dir().join(format!("bmdebug-test-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("firmware.bmcfg");

        let mut cfg = ElfConfig::default();
        cfg.target_id = Some("STM32F4".into());
        cfg.interface = Some("swd".into());
        cfg.flash.verify = true;
        cfg.swo.enabled = true;
        cfg.swo.cpu_freq_hz = Some(168_000_000);
        cfg.serial_monitor.port = Some("/dev/ttyACM0".into());

        cfg.save(&path).unwrap();
        let loaded = ElfConfig::load(&path).unwrap();

        assert_eq!(loaded.target_id, cfg.target_id);
        assert_eq!(loaded.interface, cfg.interface);
        assert_eq!(loaded.flash.verify, cfg.flash.verify);
        assert_eq!(loaded.swo.enabled, cfg.swo.enabled);
        assert_eq!(loaded.swo.cpu_freq_hz, cfg.swo.cpu_freq_hz);
        assert_eq!(loaded.serial_monitor.port, cfg.serial_monitor.port);

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn missing_elf_config_file_yields_default() {
        let cfg = ElfConfig::load(Path::new("/nonexistent/path.bmcfg")).unwrap();
        assert_eq!(cfg, ElfConfig::default());
    }

    #[test]
    fn path_for_elf_swaps_extension() {
        let p = ElfConfig::path_for_elf(Path::new("/tmp/firmware.elf"));
        assert_eq!(p, PathBuf::from("/tmp/firmware.bmcfg"));
    }
}
