use anyhow::Context;
use serde::{Deserialize, Serialize};
use vfs::VfsPath;

use crate::AliasMap;

pub const SETTINGS_FILE: &str = "alias.toml";

/// Read/write access to the user-facing settings.
pub trait Settings {
    fn alias(&self) -> AliasMap;
    fn bundler_config_path(&self) -> Option<String>;
    /// Replace the stored alias table wholesale.
    fn update_alias(&mut self, alias: &AliasMap) -> anyhow::Result<()>;
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SettingsData {
    // Plain values have to precede the `[alias]` table in TOML output.
    #[serde(
        rename = "bundlerConfigPath",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub bundler_config_path: Option<String>,
    #[serde(default, skip_serializing_if = "AliasMap::is_empty")]
    pub alias: AliasMap,
}

#[derive(Clone, Debug, Default)]
pub struct MemorySettings {
    pub data: SettingsData,
}

impl MemorySettings {
    pub fn new(alias: AliasMap, bundler_config_path: Option<&str>) -> Self {
        Self {
            data: SettingsData {
                alias,
                bundler_config_path: bundler_config_path.map(str::to_string),
            },
        }
    }
}

impl Settings for MemorySettings {
    fn alias(&self) -> AliasMap {
        self.data.alias.clone()
    }

    fn bundler_config_path(&self) -> Option<String> {
        self.data.bundler_config_path.clone()
    }

    fn update_alias(&mut self, alias: &AliasMap) -> anyhow::Result<()> {
        self.data.alias = alias.clone();
        Ok(())
    }
}

/// Settings kept in `alias.toml` at the project root. Every read goes back to
/// disk so edits made by other processes are seen on the next sync.
pub struct FileSettings {
    path: VfsPath,
}

impl FileSettings {
    pub fn new(root: &VfsPath) -> anyhow::Result<Self> {
        Ok(Self {
            path: root.join(SETTINGS_FILE)?,
        })
    }

    pub fn path(&self) -> &VfsPath {
        &self.path
    }

    /// A missing file is empty settings; one that does not parse is an error.
    pub fn load(&self) -> anyhow::Result<SettingsData> {
        if !self.path.exists()? {
            return Ok(SettingsData::default());
        }
        let contents = self.path.read_to_string()?;
        toml::from_str(&contents).with_context(|| format!("malformed {}", self.path.as_str()))
    }

    fn store(&self, data: &SettingsData) -> anyhow::Result<()> {
        let contents = toml::to_string_pretty(data)?;
        let mut f = self.path.create_file()?;
        use std::io::Write;
        f.write_all(contents.as_bytes())?;
        Ok(())
    }
}

// Reads of an unusable file see nothing; writes refuse to replace it.
impl Settings for FileSettings {
    fn alias(&self) -> AliasMap {
        self.load().map(|d| d.alias).unwrap_or_default()
    }

    fn bundler_config_path(&self) -> Option<String> {
        self.load().ok().and_then(|d| d.bundler_config_path)
    }

    fn update_alias(&mut self, alias: &AliasMap) -> anyhow::Result<()> {
        let mut data = self.load()?;
        data.alias = alias.clone();
        self.store(&data)
    }
}
