use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

pub const DEFAULT_FILTER: &str = "certingest_rs=info";

/// Instala o subscriber de logs do addon.
///
/// `RUST_LOG` tem precedência sobre `filter`. Retorna `false` se já havia um
/// subscriber global (o host pode ter instalado o seu).
pub fn init(filter: Option<&str>) -> bool {
  let env_filter = EnvFilter::try_from_default_env()
    .unwrap_or_else(|_| EnvFilter::new(filter.unwrap_or(DEFAULT_FILTER)));

  tracing_subscriber::registry()
    .with(env_filter)
    .with(tracing_subscriber::fmt::layer().with_target(true))
    .try_init()
    .is_ok()
}
