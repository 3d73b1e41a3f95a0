use envconfig::Envconfig;
use tokio::signal;

use universe::config::{Config, SourceSettings};
use universe::router;
use universe::sink::{FirebaseSink, PrintSink};
use universe::time::SystemClock;
use universe::topics::HttpTopicResolver;

const DEFAULT_TARGET: &str = "https://github.com/pyblish";

async fn shutdown() {
    let mut term = signal::unix::signal(signal::unix::SignalKind::terminate())
        .expect("failed to register SIGTERM handler");

    let mut interrupt = signal::unix::signal(signal::unix::SignalKind::interrupt())
        .expect("failed to register SIGINT handler");

    tokio::select! {
        _ = term.recv() => {},
        _ = interrupt.recv() => {},
    };

    tracing::info!("Shutting down gracefully...");
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    let config = Config::init_from_env().expect("Invalid configuration:");

    let settings =
        SourceSettings::new(&config.forum_url, DEFAULT_TARGET).expect("invalid forum url");

    let resolver = HttpTopicResolver::new(&config.forum_url, config.request_timeout.0);

    let app = if config.print_sink {
        router::router(
            SystemClock {},
            PrintSink {},
            resolver,
            settings,
            config.export_prometheus,
        )
    } else {
        let sink = FirebaseSink::new(&config.feed_url, config.request_timeout.0);

        router::router(
            SystemClock {},
            sink,
            resolver,
            settings,
            config.export_prometheus,
        )
    };

    let listener = tokio::net::TcpListener::bind(config.address)
        .await
        .expect("failed to bind server address");

    tracing::info!("listening on {}", config.address);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown())
        .await
        .unwrap();
}
