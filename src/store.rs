use std::rc::Rc;

use crate::bundler::load_bundler_alias;
use crate::discovery::AliasDiscovery;
use crate::settings::Settings;
use crate::tsconfig::ConfigSynchronizer;
use crate::{AliasMap, LogLevel, Logger, Notifier, Project};

/// Owns the alias table: where it is persisted, how it is merged and what
/// has to be regenerated when it changes.
pub struct AliasStore {
    project: Project,
    settings: Box<dyn Settings>,
    synchronizer: ConfigSynchronizer,
    logger: Rc<dyn Logger>,
    notifier: Rc<dyn Notifier>,
    /// `bundlerConfigPath` as seen by the previous sync.
    bundler_config_path: Option<String>,
}

impl AliasStore {
    /// Sync from the settings and, if that leaves the table empty, seed it
    /// from `discovery`.
    pub fn new(
        project: Project,
        settings: Box<dyn Settings>,
        discovery: &dyn AliasDiscovery,
        logger: Rc<dyn Logger>,
        notifier: Rc<dyn Notifier>,
    ) -> anyhow::Result<Self> {
        let synchronizer =
            ConfigSynchronizer::new(project.clone(), logger.clone(), notifier.clone());
        let mut store = Self {
            project,
            settings,
            synchronizer,
            logger,
            notifier,
            bundler_config_path: None,
        };
        store.sync_from_external_config()?;
        if store.alias().is_empty() {
            let discovered = discovery.discover(&store.project, &*store.logger);
            if let Err(e) = store.set_alias(discovered) {
                let msg = format!("default aliases not saved: {e:#}");
                store.logger.log(LogLevel::Error, &msg);
                store.notifier.notify(&msg);
            }
        }
        Ok(store)
    }

    pub fn project(&self) -> &Project {
        &self.project
    }

    pub fn alias(&self) -> AliasMap {
        self.settings.alias()
    }

    /// Merge `entries` over the current table, persist the result with every
    /// value root-relative and rebuild the path-mapping config.
    pub fn set_alias(&mut self, entries: AliasMap) -> anyhow::Result<()> {
        if entries.is_empty() {
            return Ok(());
        }
        let merged = self
            .alias()
            .merged_with(&entries)
            .map_values(|v| self.project.relativize(v));
        self.settings.update_alias(&merged)?;
        self.logger.log(
            LogLevel::Debug,
            &format!("alias table now has {} entries", merged.len()),
        );
        self.synchronizer.build_config(&merged)
    }

    /// Rebuild the path-mapping config from the current table.
    pub fn build_config(&self) -> anyhow::Result<()> {
        self.synchronizer.build_config(&self.alias())
    }

    /// Pick up settings changes. A bundler config is only read when
    /// `bundlerConfigPath` differs from the previous sync.
    pub fn sync_from_external_config(&mut self) -> anyhow::Result<()> {
        let previous = self.bundler_config_path.take();
        let current = self
            .settings
            .bundler_config_path()
            .filter(|p| !p.is_empty());
        self.bundler_config_path = current.clone();
        let Some(path) = current else {
            return Ok(());
        };
        if previous.as_deref() == Some(path.as_str()) {
            return Ok(());
        }
        let Some(bundler) = load_bundler_alias(self.project.root(), &path, &*self.logger) else {
            return Ok(());
        };
        // Explicitly configured entries win over the bundler's.
        let merged = bundler.merged_with(&self.alias());
        self.set_alias(merged)
    }
}
