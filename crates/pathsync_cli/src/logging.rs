use tracing_subscriber::EnvFilter;

/// Install the stderr log renderer. `RUST_LOG` wins over the flags.
pub fn init_logging(verbose: u8, if_quiet: bool) {
    let c_default = match (if_quiet, verbose) {
        (true, _) => "warn",
        (false, 0) => "info",
        (false, 1) => "debug",
        (false, _) => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(c_default));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}
