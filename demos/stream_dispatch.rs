//! # Example: stream_dispatch
//!
//! Fire-and-forget publishing through the internal stream.
//!
//! Demonstrates how to:
//! - Bind the bus to a [`StreamPublisher`] with `with_stream_publisher()`.
//! - Start filtered and unfiltered dispatchers with [`EventBus::bind`].
//! - Publish single events and batches.
//! - Cancel one [`Subscription`] and shut the rest down.
//!
//! ## Flow
//! ```text
//! publish(ev) ──► StreamPublisher ──► EventStream
//!                                       ├─► dispatcher(SensorRead) ─► threshold-check
//!                                       └─► dispatcher(*)          ─► threshold-check, audit-log
//! ```
//!
//! ## Run
//! ```bash
//! RUST_LOG=eventdrive=debug cargo run --example stream_dispatch
//! ```

use std::time::Duration;

use eventdrive::{
    BusConfig, Event, EventBus, EventKey, EventRef, HandlerDeclaration, HandlerError, HandlerFn,
};
use tracing_subscriber::EnvFilter;

struct SensorRead {
    sensor: &'static str,
    celsius: f32,
}
impl Event for SensorRead {}

struct SensorOffline {
    sensor: &'static str,
}
impl Event for SensorOffline {}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let threshold = HandlerFn::arc("threshold-check", |event: EventRef| async move {
        if let Some(read) = event.downcast_ref::<SensorRead>() {
            if read.celsius > 80.0 {
                return Err(HandlerError::fail(format!("{} overheating", read.sensor)));
            }
            println!("[threshold-check] {} ok at {:.1}°C", read.sensor, read.celsius);
        }
        Ok::<_, HandlerError>(())
    });

    let audit = HandlerFn::arc("audit-log", |event: EventRef| async move {
        if let Some(off) = event.downcast_ref::<SensorOffline>() {
            println!("[audit-log] {} went offline", off.sensor);
        } else {
            println!("[audit-log] {}", event.key());
        }
        Ok::<_, HandlerError>(())
    });

    let bus = EventBus::builder(BusConfig {
        stream_capacity: 64,
        ..BusConfig::default()
    })
    .with_handlers([
        HandlerDeclaration::singleton(threshold).on::<SensorRead>(),
        HandlerDeclaration::singleton(audit)
            .on::<SensorRead>()
            .on::<SensorOffline>(),
    ])
    .with_stream_publisher()
    .build()?;

    // Two dispatchers: one for readings only, one for everything.
    let readings = bus.bind(Some(EventKey::of::<SensorRead>()));
    let _everything = bus.bind(None);

    bus.publish(SensorRead { sensor: "boiler", celsius: 64.5 }.into_ref())
        .await?;
    bus.publish_all(vec![
        SensorRead { sensor: "boiler", celsius: 91.0 }.into_ref(),
        SensorOffline { sensor: "attic" }.into_ref(),
    ])
    .await?;
    tokio::time::sleep(Duration::from_millis(100)).await;

    // Stop the readings dispatcher; the unfiltered one keeps going.
    readings.cancel();
    bus.publish(SensorOffline { sensor: "garage" }.into_ref())
        .await?;
    tokio::time::sleep(Duration::from_millis(100)).await;

    bus.shutdown().await;
    Ok(())
}
