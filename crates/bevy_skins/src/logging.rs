use std::sync::OnceLock;

use tracing_subscriber::{EnvFilter, fmt};

const DEFAULT_LOG_FILTER: &str = "info,bevy_skins=info,bevy_ecs=warn,bevy_app=warn";

static LOGGING_INITIALIZED: OnceLock<()> = OnceLock::new();

/// Install a process-wide `fmt` subscriber for skinning diagnostics.
///
/// `RUST_LOG` takes precedence over the default filter. Cascade steps log at
/// `trace`, skin and style transitions at `debug`, degraded failures at `warn`.
///
/// Idempotent.
pub fn init_logging() {
    LOGGING_INITIALIZED.get_or_init(|| {
        let env_filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));

        let _ = fmt().with_env_filter(env_filter).try_init();
    });
}
