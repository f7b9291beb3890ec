use chrono::Utc;
use tracing::{error, info};
use tracing_subscriber::FmtSubscriber;
use uuid::{uuid, Uuid};

use notification_publisher::config::{log_filter, Config};
use notification_publisher::contracts::NotificationMessage;
use notification_publisher::messaging::{publish, ExchangeSpec, PublishRequest};

const MEMBERSHIP_ID: Uuid = uuid!("de98f01b-7f7a-474d-a98c-12015e35df27");
const USER_ID: Uuid = uuid!("df1ed9e9-1e85-4bba-a8ef-78ffe391e123");
const MEMBERSHIP_TYPE: &str = "Premium";

#[tokio::main]
async fn main() {
    setup_panic_handler();
    let config = match Config::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            std::process::exit(1);
        }
    };

    setup_logging(&config.rust_log);

    info!(
        version = env!("CARGO_PKG_VERSION"),
        exchange = %config.exchange,
        routing_key = %config.routing_key,
        "Notification publisher starting"
    );

    let message = match NotificationMessage::new(MEMBERSHIP_ID, USER_ID, Utc::now(), MEMBERSHIP_TYPE) {
        Ok(message) => message,
        Err(e) => {
            eprintln!("Invalid notification: {}", e);
            std::process::exit(1);
        }
    };

    let body = match message.to_json_bytes() {
        Ok(body) => body,
        Err(e) => {
            eprintln!("Failed to encode notification: {}", e);
            std::process::exit(1);
        }
    };

    let request = PublishRequest::json(
        config.rabbitmq_url.clone(),
        ExchangeSpec::topic(config.exchange.clone()),
        config.routing_key.clone(),
        body,
    );

    if let Err(e) = publish(&request).await {
        error!(error = %e, label = e.as_label(), "Publish failed");
        eprintln!("Failed to publish notification: {}", e);
        std::process::exit(1);
    }

    match message.to_pretty_json() {
        Ok(pretty) => println!("Message published: {}", pretty),
        Err(e) => eprintln!("Message published, but could not render it: {}", e),
    }

    info!("Notification publisher finished");
}

fn setup_logging(rust_log: &str) {
    // stdout is reserved for the published payload.
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(log_filter(rust_log))
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_file(true)
        .with_line_number(true)
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
    }
}

fn setup_panic_handler() {
    std::panic::set_hook(Box::new(|panic_info| {
        let payload = panic_info.payload();
        let message = if let Some(s) = payload.downcast_ref::<&str>() {
            *s
        } else if let Some(s) = payload.downcast_ref::<String>() {
            s.as_str()
        } else {
            "Unknown panic payload"
        };

        let location = panic_info
            .location()
            .map(|loc| format!("{}:{}:{}", loc.file(), loc.line(), loc.column()))
            .unwrap_or_else(|| "unknown location".to_string());

        eprintln!("PANIC: {} at {}", message, location);
    }));
}
