use server::config::Config;

fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = Config::from_env()?;

    // Sentry must be initialised before the runtime starts
    let sentry_guard = config
        .sentry_dsn
        .as_deref()
        .map(|dsn| utils::sentry::init(dsn, &config.environment));
    utils::logging::init_tracing(sentry_guard.is_some());

    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?
        .block_on(server::run(config))
}
