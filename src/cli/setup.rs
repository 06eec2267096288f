//! Runtime setup performed once at startup: logging and the rayon pool.

/// Rayon thread stack size (8MB for large source files split on the pool)
const RAYON_STACK_SIZE: usize = 8 * 1024 * 1024;

/// Initialize `env_logger`.
///
/// `RUST_LOG` wins when set; otherwise the level is `info`, or `debug`
/// with `--debug`.
pub fn init_logging(debug: bool) {
    let default_level = if debug { "debug" } else { "info" };
    let env = env_logger::Env::default().default_filter_or(default_level);
    // A second initialization (tests, embedding) is harmless
    let _ = env_logger::Builder::from_env(env)
        .format_timestamp(None)
        .try_init();
}

/// Configure rayon global thread pool once at startup
pub fn configure_thread_pool(jobs: usize) {
    let mut builder = rayon::ThreadPoolBuilder::new().stack_size(RAYON_STACK_SIZE);

    if jobs > 0 {
        builder = builder.num_threads(jobs);
    }

    if let Err(e) = builder.build_global() {
        log::debug!("Thread pool already configured: {}", e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_configure_thread_pool_twice_is_harmless() {
        configure_thread_pool(2);
        configure_thread_pool(3);
        assert!(rayon::current_num_threads() >= 1);
    }
}
