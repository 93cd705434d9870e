use crate::config::{Environment, LogFormat, Settings};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Filter used when `RUST_LOG` is not set.
fn default_directives(env: &Environment) -> &'static str {
    match env {
        Environment::Dev => "intake_service=debug,tower_http=debug,info",
        Environment::Staging => "intake_service=debug,tower_http=info,info",
        Environment::Prod => "intake_service=info,tower_http=info,warn",
    }
}

pub fn init_logging(settings: &Settings) {
    let env = &settings.env;
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directives(env)));

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .with_thread_ids(false)
        .with_file(env.is_dev())
        .with_line_number(env.is_dev());

    match settings.log_format {
        LogFormat::Json => tracing_subscriber::registry()
            .with(filter)
            .with(fmt_layer.json())
            .init(),
        LogFormat::Pretty => tracing_subscriber::registry()
            .with(filter)
            .with(fmt_layer.pretty())
            .init(),
    }

    tracing::info!(
        env = ?env,
        format = ?settings.log_format,
        "Logging initialized"
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_directives_parse() {
        for env in [Environment::Dev, Environment::Staging, Environment::Prod] {
            assert!(default_directives(&env).parse::<EnvFilter>().is_ok());
        }
    }
}
