/// Initialises the global logger.
///
/// `RUST_LOG` takes precedence when set; otherwise warnings are shown and
/// `verbose` lowers the threshold to debug.
pub fn init_logger(verbose: bool) {
    env_logger::Builder::new()
        .filter_level(if verbose {
            log::LevelFilter::Debug
        } else {
            log::LevelFilter::Warn
        })
        .parse_default_env()
        .format_timestamp(None)
        .init();
}
