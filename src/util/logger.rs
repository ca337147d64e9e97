//! Built-in logger bootstrap.
//!
//! Enabled by the default Cargo feature `builtin_env_logger`, this wires the `log` facade to
//! `env_logger` so an embedding runtime gets sensible output without any configuration of its
//! own. A runtime that already owns a logging setup can disable the feature and register its own
//! implementation with the `log` crate instead.

#[cfg(feature = "builtin_env_logger")]
pub(crate) fn try_init() {
    let result = env_logger::try_init_from_env(
        env_logger::Env::default().filter_or(env_logger::DEFAULT_FILTER_ENV, "info"),
    );
    match result {
        Ok(()) => debug!("rtgc initialized the logger."),
        Err(e) => debug!("rtgc failed to initialize the built-in env_logger: {e}"),
    }
}

#[cfg(not(feature = "builtin_env_logger"))]
pub(crate) fn try_init() {
    debug!("rtgc didn't initialize the built-in env_logger; the feature is disabled.");
}
