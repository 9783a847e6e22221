use jsonc_parser::ParseOptions;
use jsonc_parser::parse_to_serde_value;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value, json};
use std::rc::Rc;
use vfs::{VfsFileType, VfsPath};

use crate::project::normalize;
use crate::resolve::has_known_extension;
use crate::{AliasMap, LogLevel, Logger, Notifier, Project};

pub const TSCONFIG: &str = "tsconfig.json";
pub const JSCONFIG: &str = "jsconfig.json";

/// `compilerOptions.paths`, in file order. Entries are kept as found so a
/// malformed one does not spoil the rest.
pub type PathsTable = Map<String, Value>;

/// On-disk `tsconfig.json` / `jsconfig.json`. Only `compilerOptions.baseUrl`
/// and `compilerOptions.paths` are owned here; everything else is carried
/// through untouched. An owned field of the wrong shape reads as absent.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PathMappingArtifact {
    #[serde(
        rename = "compilerOptions",
        default,
        deserialize_with = "lenient",
        skip_serializing_if = "Option::is_none"
    )]
    pub compiler_options: Option<CompilerOptions>,
    #[serde(flatten)]
    pub rest: Map<String, Value>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct CompilerOptions {
    #[serde(
        rename = "baseUrl",
        default,
        deserialize_with = "lenient",
        skip_serializing_if = "Option::is_none"
    )]
    pub base_url: Option<String>,
    #[serde(
        default,
        deserialize_with = "lenient",
        skip_serializing_if = "Option::is_none"
    )]
    pub paths: Option<PathsTable>,
    #[serde(flatten)]
    pub rest: Map<String, Value>,
}

fn lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).ok())
}

impl PathMappingArtifact {
    pub fn template() -> Self {
        let value = json!({
            "compilerOptions": {
                "baseUrl": ".",
                "paths": {}
            },
            "exclude": ["node_modules", "dist"]
        });
        serde_json::from_value(value).unwrap_or_default()
    }

    /// Parse JSONC text. `None` when it is not JSONC or not an object.
    pub fn parse(contents: &str) -> Option<Self> {
        match parse_to_serde_value(contents, &ParseOptions::default()) {
            Ok(Some(value)) => serde_json::from_value(value).ok(),
            _ => None,
        }
    }

    pub fn to_json(&self) -> anyhow::Result<String> {
        let mut out = serde_json::to_string_pretty(self)?;
        out.push('\n');
        Ok(out)
    }
}

/// Keeps the project's path-mapping config in step with the alias table.
pub struct ConfigSynchronizer {
    project: Project,
    logger: Rc<dyn Logger>,
    notifier: Rc<dyn Notifier>,
}

impl ConfigSynchronizer {
    pub fn new(project: Project, logger: Rc<dyn Logger>, notifier: Rc<dyn Notifier>) -> Self {
        Self {
            project,
            logger,
            notifier,
        }
    }

    /// The existing config file, `tsconfig.json` first.
    pub fn find_config(&self) -> anyhow::Result<Option<VfsPath>> {
        for name in [TSCONFIG, JSCONFIG] {
            let path = self.project.root().join(name)?;
            if path.exists()? {
                return Ok(Some(path));
            }
        }
        Ok(None)
    }

    fn load(&self) -> anyhow::Result<(VfsPath, PathMappingArtifact)> {
        let Some(path) = self.find_config()? else {
            let path = self.project.root().join(JSCONFIG)?;
            self.logger.log(
                LogLevel::Debug,
                &format!("no config found, creating {}", path.as_str()),
            );
            return Ok((path, PathMappingArtifact::template()));
        };
        let doc = match path.read_to_string() {
            Ok(contents) => PathMappingArtifact::parse(&contents),
            Err(e) => {
                self.logger.log(
                    LogLevel::Debug,
                    &format!("failed to read {}: {e}", path.as_str()),
                );
                None
            }
        };
        let doc = doc.unwrap_or_else(|| {
            self.logger.log(
                LogLevel::Debug,
                &format!("{} is not valid, starting from template", path.as_str()),
            );
            PathMappingArtifact::template()
        });
        Ok((path, doc))
    }

    /// Compute the `paths` entries for `alias`, relative to root-relative `base`.
    pub fn paths_for(&self, alias: &AliasMap, base: &str) -> PathsTable {
        let mut table = PathsTable::new();
        for (key, target) in alias.iter() {
            let rel = self.project.relative_to(base, target);
            if has_known_extension(target) {
                let is_file = self
                    .project
                    .path(target)
                    .and_then(|p| Ok(p.metadata()?))
                    .map(|m| m.file_type == VfsFileType::File);
                match is_file {
                    Ok(true) => {
                        table.insert(key.to_string(), json!([rel]));
                        continue;
                    }
                    Ok(false) => {}
                    Err(e) => {
                        self.notifier
                            .notify(&format!("alias {key}: cannot access {target}: {e}"));
                        continue;
                    }
                }
            }
            let pattern = if rel == "." {
                "./*".to_string()
            } else {
                format!("{rel}/*")
            };
            table.insert(format!("{key}/*"), json!([pattern]));
        }
        table
    }

    /// Rewrite the config file from `alias`, merging into what is already there.
    pub fn build_config(&self, alias: &AliasMap) -> anyhow::Result<()> {
        let (path, mut doc) = self.load()?;
        let template_base = PathMappingArtifact::template()
            .compiler_options
            .and_then(|o| o.base_url)
            .unwrap_or_else(|| ".".to_string());

        let options = doc.compiler_options.get_or_insert_with(Default::default);
        let base = match &options.base_url {
            Some(base) => self.project.relativize(base),
            None => normalize(&template_base),
        };
        options.base_url = Some(base.clone());

        let computed = self.paths_for(alias, &base);
        // A document without a `paths` section keeps not having one. Existing
        // keys keep their position; new ones are appended.
        if let Some(paths) = options.paths.as_mut() {
            paths.extend(computed);
        }

        let contents = doc.to_json()?;
        let mut f = path.create_file()?;
        use std::io::Write;
        f.write_all(contents.as_bytes())?;
        self.logger.log(
            LogLevel::Debug,
            &format!("wrote {} ({} aliases)", path.as_str(), alias.len()),
        );
        Ok(())
    }
}

/// Read `compilerOptions.paths` back as an alias table (`@x/*` → `base/x`).
pub fn load_tsconfig_aliases(project: &Project, logger: &dyn Logger) -> AliasMap {
    let mut aliases = AliasMap::new();
    for name in [TSCONFIG, JSCONFIG] {
        let Ok(path) = project.root().join(name) else {
            continue;
        };
        if !path.exists().unwrap_or(false) {
            continue;
        }
        let contents = match path.read_to_string() {
            Ok(c) => c,
            Err(e) => {
                logger.log(
                    LogLevel::Error,
                    &format!("failed to read {}: {e}", path.as_str()),
                );
                return aliases;
            }
        };
        let Some(doc) = PathMappingArtifact::parse(&contents) else {
            logger.log(LogLevel::Error, &format!("failed to parse {name}"));
            return aliases;
        };
        let Some(opts) = doc.compiler_options else {
            return aliases;
        };
        let base = project.relativize(opts.base_url.as_deref().unwrap_or("."));
        for (alias, targets) in opts.paths.unwrap_or_default() {
            let first = targets
                .as_array()
                .and_then(|t| t.first())
                .and_then(Value::as_str);
            if let Some(first) = first {
                let alias_prefix = alias.trim_end_matches("/*");
                let target = first.trim_end_matches("/*");
                aliases.insert(alias_prefix, normalize(&format!("{base}/{target}")));
            }
        }
        return aliases;
    }
    aliases
}
