//! Process-wide logger setup.

/// Installs `env_logger`, honouring `RUST_LOG` and defaulting to `info`.
/// Calling it more than once is harmless.
pub fn init() {
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .try_init();
}
