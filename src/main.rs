use anyhow::{Context, Result};
use credsync::cli::{self, RuntimeOptions};
use credsync::handler::CredentialsEventHandler;
use credsync::identity::StsAccountResolver;
use credsync::profile::ProfileNameMapper;
use credsync::watcher::FileWatcher;

fn main() -> Result<()> {
    // Process CLI arguments first (before logging init for cleaner output)
    let options = match cli::process_cli() {
        cli::CliResult::Exit(code) => {
            if code == 0 {
                return Ok(());
            }
            std::process::exit(code);
        }
        cli::CliResult::Continue(options) => options,
    };

    // CLI --log-level flag takes highest precedence, then RUST_LOG, then the settings file.
    credsync::debug::init_log_bridge(
        options.log_level,
        options.settings_log_level,
        options.log_file.as_deref(),
    );

    log::info!("Starting credsync {}", credsync::VERSION);

    let result = run(options);
    if let Err(ref e) = result {
        log::error!("credsync: error: {e:#}");
    }
    log::logger().flush();
    result
}

fn run(options: RuntimeOptions) -> Result<()> {
    let mapper = ProfileNameMapper::load(&options.map)?;
    let mut handler = CredentialsEventHandler::new(
        &options.target,
        options.dialect,
        mapper,
        StsAccountResolver::new(),
        options.default_region.clone(),
    );

    log::info!(
        "Source: {}, target: {} ({} dialect)",
        options.source.display(),
        options.target.display(),
        options.dialect
    );

    if options.once {
        let outcome = handler.handle(&options.source)?;
        log::info!("Single run finished: {:?}", outcome);
        return Ok(());
    }

    let watcher = FileWatcher::with_debounce(&options.source, options.debounce)?;

    // The watch loop runs on its own thread; main only waits for it.
    let thread = std::thread::Builder::new()
        .name("credsync-watcher".to_string())
        .spawn(move || watcher.run(&mut handler))
        .context("Failed to spawn watcher thread")?;

    let reason = thread
        .join()
        .map_err(|_| anyhow::anyhow!("Watcher thread panicked"))??;
    log::info!("Watcher finished: {}", reason);
    Ok(())
}
