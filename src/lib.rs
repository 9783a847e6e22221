//! Resolve bundler-style import aliases (`@/components/Foo`) to files and keep
//! `tsconfig.json` / `jsconfig.json` path mappings in step with them.

mod alias;
pub mod bundler;
pub mod coordinator;
pub mod definition;
pub mod discovery;
mod logger;
mod project;
pub mod resolve;
pub mod settings;
pub mod store;
pub mod tsconfig;
#[cfg(test)]
pub(crate) mod test_util;

pub use alias::AliasMap;
pub use coordinator::{ChangeCoordinator, ChangeFeed, Subscription};
pub use definition::{DefinitionProvider, Document, ImportReference, Location};
pub use discovery::{AliasDiscovery, DefaultAliasDiscovery};
pub use logger::{ConsoleLogger, EmptyLogger, LogLevel, Logger, Notifier};
pub use project::{Project, normalize};
pub use resolve::{CancelToken, fix_file_path_extension, resolve_import_path};
pub use settings::{FileSettings, MemorySettings, Settings};
pub use store::AliasStore;
pub use tsconfig::{ConfigSynchronizer, PathMappingArtifact};
