use alias::settings::SETTINGS_FILE;
use alias::{
    AliasMap, AliasStore, CancelToken, ChangeCoordinator, ChangeFeed, ConsoleLogger,
    DefaultAliasDiscovery, DefinitionProvider, Document, FileSettings, LogLevel, Logger, Project,
};
use clap::{Parser, Subcommand};
use std::cell::RefCell;
use std::path::PathBuf;
use std::rc::Rc;
use std::time::Duration;

/// CLI arguments

#[derive(Parser)]
#[command(
    name = "alias",
    about = "Resolve import aliases and keep tsconfig/jsconfig paths in sync",
    after_help = "Environment variables:\n  CI - disable color output by default"
)]
struct Args {
    /// Project root
    #[arg(long, default_value = ".")]
    root: PathBuf,

    /// Verbose output
    #[arg(long, default_value_t = false)]
    verbose: bool,

    /// Colored output
    #[arg(long, default_value_t = default_color())]
    color: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print the alias table
    Show,
    /// Add or replace aliases, e.g. `@=src`
    Set {
        #[arg(value_parser = parse_entry, required = true)]
        entries: Vec<(String, String)>,
    },
    /// Rewrite tsconfig.json/jsconfig.json from the alias table
    Sync,
    /// Print the file an import on FILE:LINE points to
    Resolve {
        /// Source file, relative to the project root
        file: String,
        /// Zero-based line
        #[arg(long)]
        line: usize,
        /// Zero-based character within the line
        #[arg(long, default_value_t = 0)]
        character: usize,
    },
    /// Re-sync whenever alias.toml changes
    Watch {
        #[arg(long, default_value_t = 500)]
        interval_ms: u64,
    },
}

fn default_color() -> bool {
    std::env::var("CI").map(|v| v.is_empty()).unwrap_or(true)
}

fn parse_entry(s: &str) -> Result<(String, String), String> {
    match s.split_once('=') {
        Some((k, v)) if !k.is_empty() && !v.is_empty() => Ok((k.to_string(), v.to_string())),
        _ => Err(format!("expected KEY=PATH, got `{s}`")),
    }
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let project = Project::physical(&args.root)?;
    let logger = Rc::new(ConsoleLogger {
        color: args.color,
        verbose: args.verbose,
    });
    let settings = FileSettings::new(project.root())?;
    let mut store = AliasStore::new(
        project.clone(),
        Box::new(settings),
        &DefaultAliasDiscovery,
        logger.clone(),
        logger.clone(),
    )?;

    match args.command {
        Command::Show => {
            for (key, value) in store.alias().iter() {
                println!("{key} -> {value}");
            }
        }
        Command::Set { entries } => {
            let entries: AliasMap = entries.into_iter().collect();
            store.set_alias(entries)?;
            println!("Saving {} aliases", store.alias().len());
        }
        Command::Sync => {
            store.build_config()?;
            println!("Synced {} aliases", store.alias().len());
        }
        Command::Resolve {
            file,
            line,
            character,
        } => {
            let path = project.path(&file)?;
            let document = Document {
                text: path.read_to_string()?,
                path,
            };
            let provider = DefinitionProvider::new(&project, &*logger);
            let found = provider.provide_definition(
                &store.alias(),
                &document,
                line,
                character,
                &CancelToken::new(),
            );
            if let Some(location) = found {
                println!("{}", project.dir().join(project.rel_str(&location.path)).display());
            }
        }
        Command::Watch { interval_ms } => watch(store, &project, logger, interval_ms)?,
    }
    Ok(())
}

fn watch(
    store: AliasStore,
    project: &Project,
    logger: Rc<ConsoleLogger>,
    interval_ms: u64,
) -> anyhow::Result<()> {
    let settings_path = project.root().join(SETTINGS_FILE)?;
    let read = || settings_path.read_to_string().unwrap_or_default();
    let feed = ChangeFeed::new();
    let _coordinator = ChangeCoordinator::new(
        Rc::new(RefCell::new(store)),
        &feed,
        logger.clone(),
        logger.clone(),
    );
    logger.log(
        LogLevel::Info,
        &format!("watching {}", project.dir().join(SETTINGS_FILE).display()),
    );
    let mut last = read();
    loop {
        std::thread::sleep(Duration::from_millis(interval_ms));
        let current = read();
        if current != last {
            last = current;
            feed.notify();
        }
    }
}
