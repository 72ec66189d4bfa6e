//! # statehubd — statehub daemon
//!
//! Composition root that wires all adapters together and runs the pipeline.
//!
//! ## Responsibilities
//! - Parse configuration (config file, env vars)
//! - Initialize logging
//! - Initialize the `SQLite` connection pool and run migrations
//! - Connect to the MQTT broker; failure here is fatal
//! - Build the event router, load rules, register the rule engine and the
//!   notification bridge as listeners (in that order), subscribe
//! - Spawn the delivery loop, the notification task and optional simulators
//! - Serve the admin API until SIGTERM/SIGINT, then shut down gracefully;
//!   exit with an error if the delivery loop ends first
//!
//! ## Dependency rule
//! This is the **only** crate that depends on all other crates.
//! It is the wiring layer: no domain logic belongs here.

mod chat;
mod config;

use std::sync::Arc;
use std::time::Duration;

use statehub_adapter_http_axum::state::AppState;
use statehub_adapter_mqtt::MqttConfig;
use statehub_adapter_simulators::{Clock, Fleet, Simulator, Switch, TemperatureSensor};
use statehub_adapter_storage_sqlite_sqlx::{
    Config as DbConfig, SqliteDeviceRepository, SqliteEventStore, SqliteRuleRepository,
};
use statehub_app::event_router::EventRouter;
use statehub_app::notification_bridge::NotificationBridge;
use statehub_app::rule_engine::RuleEngine;
use statehub_app::services::device_service::DeviceService;
use statehub_app::services::event_service::EventService;
use statehub_app::services::rule_service::RuleService;
use statehub_domain::id::DeviceId;
use statehub_domain::topic::BaseTopic;
use tokio::task::JoinHandle;
use tracing_subscriber::EnvFilter;

use crate::chat::ConsoleChat;
use crate::config::{Config, SimulatorsConfig};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load()?;

    let filter =
        EnvFilter::try_new(&config.logging.filter).unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let base = config.base_topic()?;

    // Database
    let db = DbConfig {
        database_url: config.database_url().to_string(),
    }
    .build()
    .await?;
    let pool = db.pool().clone();

    // Repositories
    let devices = SqliteDeviceRepository::new(pool.clone());
    let events = SqliteEventStore::new(pool.clone());
    let rules = SqliteRuleRepository::new(pool);

    // Transport
    let (transport, delivery) = statehub_adapter_mqtt::connect(&config.mqtt)
        .await
        .inspect_err(|err| tracing::error!(error = %err, "cannot reach MQTT broker"))?;

    // Core pipeline
    let event_router = Arc::new(EventRouter::new(
        base.clone(),
        devices.clone(),
        events.clone(),
        transport.clone(),
    ));
    let engine = Arc::new(RuleEngine::new(rules.clone(), event_router.controller()));
    let active = engine.reload_rules().await?;
    tracing::info!(active, "rules loaded");

    let mut tasks: Vec<JoinHandle<()>> = Vec::new();

    event_router.register_listener(engine.clone());
    if config.notifications.enabled {
        let (bridge, queue) = NotificationBridge::channel(config.notifications.queue_capacity);
        event_router.register_listener(Arc::new(bridge));
        let guild = config.notifications.guild.clone();
        tasks.push(tokio::spawn(async move {
            queue.run(&ConsoleChat::default(), guild.as_deref()).await;
        }));
    }
    event_router.start()?;
    let delivery = tokio::spawn(delivery.run(Arc::clone(&event_router)));
    let delivery_abort = delivery.abort_handle();

    if config.simulators.enabled {
        tasks.extend(start_simulators(&config.mqtt, base.clone(), &config.simulators).await?);
    }

    // Services
    let device_service = Arc::new(DeviceService::new(devices));
    let event_service = Arc::new(EventService::new(events));
    let rule_service = Arc::new(RuleService::new(rules, Arc::clone(&engine)));

    // HTTP
    let state = AppState::from_arcs(
        device_service,
        event_service,
        rule_service,
        event_router.controller(),
    );
    let app = statehub_adapter_http_axum::router::build(state);

    let bind_addr = config.bind_addr();
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    tracing::info!(addr = %bind_addr, base = %base, "statehubd listening");

    let server = axum::serve(listener, app).with_graceful_shutdown(shutdown_signal());
    let outcome = serve_while_delivering(server.into_future(), delivery).await;

    tracing::info!("shutting down");
    delivery_abort.abort();
    for task in &tasks {
        task.abort();
    }
    if let Err(err) = transport.disconnect() {
        tracing::warn!(error = %err, "MQTT disconnect failed");
    }

    outcome
}

/// Run `server` until it stops. Ingestion depends on the delivery task, so
/// its end is fatal too.
async fn serve_while_delivering<S>(
    server: S,
    delivery: JoinHandle<()>,
) -> Result<(), Box<dyn std::error::Error>>
where
    S: Future<Output = std::io::Result<()>>,
{
    tokio::select! {
        result = server => Ok(result?),
        outcome = delivery => {
            match outcome {
                Ok(()) => tracing::error!("MQTT delivery loop stopped"),
                Err(err) => tracing::error!(error = %err, "MQTT delivery loop crashed"),
            }
            Err("MQTT delivery loop ended, no more messages can be ingested".into())
        }
    }
}

/// Connect a second client for the simulated devices and start them.
async fn start_simulators(
    mqtt: &MqttConfig,
    base: BaseTopic,
    config: &SimulatorsConfig,
) -> Result<Vec<JoinHandle<()>>, Box<dyn std::error::Error>> {
    let clock_id = DeviceId::new(config.clock_id.as_str())?;
    let clock = match &config.clock_start {
        Some(start) => Clock::starting_at(clock_id, start, config.clock_increment_secs)?,
        None => Clock::from_local_time(clock_id, config.clock_increment_secs),
    };
    let simulators = vec![
        Simulator::Sensor(TemperatureSensor::new(
            DeviceId::new(config.sensor_id.as_str())?,
            config.sensor_min,
            config.sensor_max,
        )?),
        Simulator::Switch(Switch::new(DeviceId::new(config.switch_id.as_str())?)),
        Simulator::Clock(clock),
    ];

    let sim_mqtt = mqtt.with_client_id(format!("{}-simulators", mqtt.client_id));
    let (transport, delivery) = statehub_adapter_mqtt::connect(&sim_mqtt).await?;
    let fleet = Arc::new(Fleet::start(
        base,
        simulators,
        Duration::from_secs(config.period_secs),
        transport,
    )?);

    let ticker = Arc::clone(&fleet);
    Ok(vec![
        tokio::spawn(delivery.run(fleet)),
        tokio::spawn(async move { ticker.run().await }),
    ])
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %err, "failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                tracing::error!(error = %err, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn should_fail_when_delivery_loop_returns() {
        let server = std::future::pending::<std::io::Result<()>>();
        let delivery = tokio::spawn(async {});

        let result = serve_while_delivering(server, delivery).await;

        assert!(result.is_err());
    }

    #[tokio::test]
    async fn should_fail_when_delivery_loop_panics() {
        let server = std::future::pending::<std::io::Result<()>>();
        let delivery = tokio::spawn(async { panic!("storage call panicked") });

        let result = serve_while_delivering(server, delivery).await;

        assert!(result.is_err());
    }

    #[tokio::test]
    async fn should_succeed_when_server_shuts_down_first() {
        let delivery = tokio::spawn(std::future::pending::<()>());
        let abort = delivery.abort_handle();

        let result = serve_while_delivering(async { Ok(()) }, delivery).await;

        assert!(result.is_ok());
        abort.abort();
    }

    #[tokio::test]
    async fn should_report_server_errors() {
        let delivery = tokio::spawn(std::future::pending::<()>());
        let abort = delivery.abort_handle();
        let server = async { Err(std::io::Error::other("listener closed")) };

        let result = serve_while_delivering(server, delivery).await;

        assert_eq!(result.unwrap_err().to_string(), "listener closed");
        abort.abort();
    }
}
