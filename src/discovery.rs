use vfs::VfsFileType;

use crate::tsconfig::load_tsconfig_aliases;
use crate::{AliasMap, LogLevel, Logger, Project};

/// Proposes an alias table for a project that has none configured.
pub trait AliasDiscovery {
    fn discover(&self, project: &Project, logger: &dyn Logger) -> AliasMap;
}

/// Reuses the `paths` of an existing tsconfig/jsconfig, else maps `@` to
/// `src` when that directory exists.
pub struct DefaultAliasDiscovery;

impl AliasDiscovery for DefaultAliasDiscovery {
    fn discover(&self, project: &Project, logger: &dyn Logger) -> AliasMap {
        let from_config = load_tsconfig_aliases(project, logger);
        if !from_config.is_empty() {
            logger.log(
                LogLevel::Debug,
                &format!("discovered {} aliases from config paths", from_config.len()),
            );
            return from_config;
        }
        let mut alias = AliasMap::new();
        let is_dir = project
            .path("src")
            .ok()
            .and_then(|p| p.metadata().ok())
            .map(|m| m.file_type == VfsFileType::Directory)
            .unwrap_or(false);
        if is_dir {
            logger.log(LogLevel::Debug, "discovered default alias @ -> src");
            alias.insert("@", "src");
        }
        alias
    }
}

/// Always proposes the same table.
pub struct FixedAliasDiscovery(pub AliasMap);

impl AliasDiscovery for FixedAliasDiscovery {
    fn discover(&self, _project: &Project, _logger: &dyn Logger) -> AliasMap {
        self.0.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::EmptyLogger;
    use crate::test_util::TestFS;

    #[test]
    fn test_src_convention() {
        let fs = TestFS::new([("src/main.ts", "")]);
        let alias = DefaultAliasDiscovery.discover(&fs.project(), &EmptyLogger);
        assert_eq!(alias, [("@", "src")].into_iter().collect());
    }

    #[test]
    fn test_config_paths_win() {
        let fs = TestFS::new([
            (
                "tsconfig.json",
                r#"{"compilerOptions": {"baseUrl": ".", "paths": {"~/*": ["app/*"]}}}"#,
            ),
            ("src/main.ts", ""),
        ]);
        let alias = DefaultAliasDiscovery.discover(&fs.project(), &EmptyLogger);
        assert_eq!(alias, [("~", "app")].into_iter().collect());
    }

    #[test]
    fn test_nothing_to_discover() {
        let fs = TestFS::new([("main.ts", "")]);
        assert!(
            DefaultAliasDiscovery
                .discover(&fs.project(), &EmptyLogger)
                .is_empty()
        );
    }
}
