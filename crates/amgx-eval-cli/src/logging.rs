//! Logger setup.

/// Default filter for a given `-v` count. AMGX's own console output is
/// logged under the `amgx` target and stays visible at the default level.
pub fn default_filter(verbosity: u8) -> &'static str {
    match verbosity {
        0 => "warn,amgx=info",
        1 => "info",
        2 => "debug",
        _ => "trace",
    }
}

/// Initialize `env_logger`. `RUST_LOG` overrides the verbosity flag.
pub fn init(verbosity: u8) {
    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(default_filter(verbosity)),
    )
    .format_timestamp(None)
    .format_target(false)
    .init();
}
