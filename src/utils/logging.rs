use log::LevelFilter;

/// Install the process-wide logger.
///
/// `RUST_LOG` wins when set; otherwise `--verbose` selects `debug` for this
/// crate and everything else stays at `warn`.
pub fn init_logging(verbose: bool) {
    let level = if verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Warn
    };

    let mut builder = env_logger::Builder::new();
    builder
        .filter_level(LevelFilter::Warn)
        .filter_module(env!("CARGO_CRATE_NAME"), level)
        .format_timestamp(None)
        .parse_default_env();

    // A second call (tests, embedding) keeps the first logger.
    let _ = builder.try_init();
}

pub fn print_verbose(verbose: bool, msg: &str) {
    if verbose {
        eprintln!("Verbose: {}", msg);
    }
}
