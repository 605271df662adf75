//! Command-line interface for credsync.
//!
//! Flags win over legacy `name=value` arguments, which win over the settings
//! file.

use clap::Parser;
use log::LevelFilter;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use credsync_profile::{Dialect, NameValuePair};
use credsync_watcher::DEFAULT_DEBOUNCE;

use crate::config::{Settings, default_target, expand_home};
use crate::identity::DEFAULT_REGION;

const USAGE_HINT: &str = "USAGE:
credsync \\
   --source path/to/the/source/credentials/file \\
   --target path/to/the/target/credentials/file \\
   --map path/to/the/aws_account_number/to/profile_name/mapping/properties/file
[Note: target is optional and will default to ~/.aws/credentials]
[Legacy form: credsync source=... target=... map=...]";

/// credsync - keep a named AWS profile in sync with a downloaded credentials file
#[derive(Parser, Debug, Default)]
#[command(name = "credsync")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Credentials file that is periodically re-downloaded
    #[arg(long, value_name = "PATH")]
    pub source: Option<PathBuf>,

    /// Credentials or config file to update (default: ~/.aws/credentials)
    #[arg(long, value_name = "PATH")]
    pub target: Option<PathBuf>,

    /// Properties file mapping account ids to profile names
    #[arg(long, value_name = "PATH")]
    pub map: Option<PathBuf>,

    /// Header style of the target file (default: inferred from its file name)
    #[arg(long, value_name = "credentials|config")]
    pub dialect: Option<Dialect>,

    /// Region for the account lookup when the profile names none
    #[arg(long, value_name = "REGION")]
    pub default_region: Option<String>,

    /// Window in which events for one write are coalesced
    #[arg(long, value_name = "MS")]
    pub debounce_ms: Option<u64>,

    /// Log level (off, error, warn, info, debug, trace)
    #[arg(long, value_name = "LEVEL", value_parser = parse_level)]
    pub log_level: Option<LevelFilter>,

    /// Merge the current source file once and exit instead of watching
    #[arg(long)]
    pub once: bool,

    /// Settings file (default: ~/.config/credsync/config.yaml)
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Legacy `source=PATH target=PATH map=PATH` arguments
    #[arg(value_name = "NAME=VALUE")]
    pub legacy: Vec<String>,
}

/// Fully resolved runtime options.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RuntimeOptions {
    pub source: PathBuf,
    pub target: PathBuf,
    pub map: PathBuf,
    pub dialect: Dialect,
    pub default_region: String,
    pub debounce: Duration,
    /// Level from the command line (highest precedence)
    pub log_level: Option<LevelFilter>,
    /// Level from the settings file (below `RUST_LOG`)
    pub settings_log_level: Option<LevelFilter>,
    pub log_file: Option<PathBuf>,
    pub once: bool,
}

/// Result of CLI processing
pub enum CliResult {
    /// Continue with normal startup
    Continue(RuntimeOptions),
    /// Exit with the given code
    Exit(i32),
}

/// Values from legacy `name=value` arguments; names compare case-insensitively.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct LegacyArgs {
    pub source: Option<PathBuf>,
    pub target: Option<PathBuf>,
    pub map: Option<PathBuf>,
}

impl LegacyArgs {
    pub fn parse(args: &[String], problems: &mut Vec<String>) -> Self {
        let mut legacy = Self::default();
        for arg in args {
            let pair = NameValuePair::new(arg.as_str());
            let Some(value) = pair.value().filter(|_| pair.is_pair()) else {
                problems.push(format!("  - \"{arg}\" is not a name=value argument"));
                continue;
            };
            let value = Some(PathBuf::from(value));
            if pair.is_ignore_case("source") {
                legacy.source = value;
            } else if pair.is_ignore_case("target") {
                legacy.target = value;
            } else if pair.is_ignore_case("map") {
                legacy.map = value;
            } else {
                problems.push(format!("  - \"{arg}\" is not a recognized argument"));
            }
        }
        legacy
    }
}

fn parse_level(s: &str) -> Result<LevelFilter, String> {
    LevelFilter::from_str(s.trim()).map_err(|_| format!("unknown log level '{s}'"))
}

fn has_existing_parent(path: &Path) -> bool {
    path.parent()
        .is_some_and(|p| !p.as_os_str().is_empty() && p.is_dir())
}

impl Cli {
    /// Merge flags, legacy arguments and settings, then validate.
    ///
    /// Every problem is collected so they can be reported together.
    pub fn resolve(self, settings: Settings) -> Result<RuntimeOptions, Vec<String>> {
        let mut problems = Vec::new();
        let legacy = LegacyArgs::parse(&self.legacy, &mut problems);

        let source = self.source.or(legacy.source).or(settings.source);
        let target = self
            .target
            .or(legacy.target)
            .or(settings.target)
            .unwrap_or_else(default_target);
        let map = self.map.or(legacy.map).or(settings.map);

        let source = source.map(|p| expand_home(&p));
        let target = expand_home(&target);
        let map = map.map(|p| expand_home(&p));

        match &source {
            None => problems.push("  - no source credentials path given".to_string()),
            Some(p) if !has_existing_parent(p) => problems.push(format!(
                "  - \"{}\" is an invalid source credentials path",
                p.display()
            )),
            Some(_) => {}
        }
        if !has_existing_parent(&target) {
            problems.push(format!(
                "  - \"{}\" is an invalid target credentials path",
                target.display()
            ));
        }
        match &map {
            Some(p) if p.is_file() => {}
            Some(p) => problems.push(format!("  - \"{}\" is an invalid map file", p.display())),
            None => problems.push("  - \"null\" is an invalid map file".to_string()),
        }

        let settings_log_level = match settings.log_level.as_deref().map(parse_level) {
            Some(Ok(level)) => Some(level),
            Some(Err(e)) => {
                problems.push(format!("  - settings file: {e}"));
                None
            }
            None => None,
        };

        let (Some(source), Some(map)) = (source, map) else {
            return Err(problems);
        };
        if !problems.is_empty() {
            return Err(problems);
        }

        Ok(RuntimeOptions {
            dialect: self.dialect.unwrap_or_else(|| Dialect::from_path(&target)),
            source,
            target,
            map,
            default_region: self
                .default_region
                .or(settings.default_region)
                .unwrap_or_else(|| DEFAULT_REGION.to_string()),
            debounce: self
                .debounce_ms
                .or(settings.debounce_ms)
                .map(Duration::from_millis)
                .unwrap_or(DEFAULT_DEBOUNCE),
            log_level: self.log_level,
            settings_log_level,
            log_file: settings.log_file,
            once: self.once,
        })
    }
}

/// Parse the command line and settings file.
pub fn process_cli() -> CliResult {
    let cli = Cli::parse();

    let settings_path = cli.config.clone().unwrap_or_else(Settings::settings_path);
    let settings = match Settings::load_from(&settings_path) {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("credsync: error: {e:#}");
            return CliResult::Exit(1);
        }
    };

    match cli.resolve(settings) {
        Ok(options) => CliResult::Continue(options),
        Err(problems) => {
            eprintln!("Invalid/Missing args:\n{}\n{USAGE_HINT}", problems.join("\n"));
            CliResult::Exit(2)
        }
    }
}
