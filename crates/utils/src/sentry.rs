use std::borrow::Cow;

/// Start the sentry client. Keep the guard alive for the life of the process.
pub fn init(dsn: &str, environment: &str) -> ::sentry::ClientInitGuard {
    ::sentry::init((
        dsn,
        ::sentry::ClientOptions {
            release: ::sentry::release_name!(),
            environment: Some(Cow::Owned(environment.to_string())),
            ..Default::default()
        },
    ))
}
