/*
 *  source/mod.rs
 *
 *  InkMonS - data on slow glass
 *  (c) 2023-26 Stuart Hunter
 *
 *  Data source adapters - normalize inbound feeds to (key, value) updates
 *
 *  This program is free software: you can redistribute it and/or modify
 *  it under the terms of the GNU General Public License as published by
 *  the Free Software Foundation, either version 3 of the License, or
 *  (at your option) any later version.
 *
 *  This program is distributed in the hope that it will be useful,
 *  but WITHOUT ANY WARRANTY; without even the implied warranty of
 *  MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
 *  GNU General Public License for more details.
 *
 *  See <http://www.gnu.org/licenses/> to get a copy of the GNU General
 *  Public License.
 *
 */

pub mod mqtt;
pub mod signalk;

pub use mqtt::MqttSource;
pub use signalk::SignalKSource;

use std::time::Duration;

use log::debug;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;

use crate::config::SourceConfig;
use crate::values::{SharedValues, Value};

const DEFAULT_MQTT_PORT: u16 = 1883;
const DEFAULT_CLIENT_ID: &str = "inkmons";
const DEFAULT_SIGNALK_PERIOD: u64 = 10;

/// What an adapter surfaces to the render loop. Values themselves travel
/// through the shared store; the events only carry the trigger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceEvent {
    Connected,
    Disconnected,
    Updated,
}

/// Enum dispatch over the supported feeds.
pub enum DataSource {
    Mqtt(MqttSource),
    SignalK(SignalKSource),
}

impl DataSource {
    /// `keys` are the dashboard's data-keys: MQTT topics or SignalK paths,
    /// depending on the adapter.
    pub fn from_config(cfg: &SourceConfig, keys: Vec<String>) -> Self {
        match cfg {
            SourceConfig::Mqtt { host, port, client_id } => DataSource::Mqtt(MqttSource::new(
                host,
                port.unwrap_or(DEFAULT_MQTT_PORT),
                client_id.as_deref().unwrap_or(DEFAULT_CLIENT_ID),
                keys,
            )),
            SourceConfig::Signalk { url, period_secs } => DataSource::SignalK(SignalKSource::new(
                url,
                Duration::from_secs(period_secs.unwrap_or(DEFAULT_SIGNALK_PERIOD)),
                keys,
            )),
        }
    }

    /// Start the adapter task. It runs until shutdown is flagged or the
    /// render loop drops its end of the event channel.
    pub fn spawn(
        self,
        store: SharedValues,
        events: mpsc::Sender<SourceEvent>,
        shutdown: watch::Receiver<bool>,
    ) -> JoinHandle<()> {
        tokio::spawn(async move {
            match self {
                DataSource::Mqtt(src) => src.run(store, events, shutdown).await,
                DataSource::SignalK(src) => src.run(store, events, shutdown).await,
            }
            debug!("data source task finished");
        })
    }
}

/// Store the reading, then nudge the render loop. Returns false when the
/// render loop is gone and the adapter should wind down.
pub(crate) async fn push_value(
    store: &SharedValues,
    events: &mpsc::Sender<SourceEvent>,
    key: &str,
    value: Value,
) -> bool {
    debug!("value update: {key} = {value}");
    store.lock().unwrap().insert(key, value);
    events.send(SourceEvent::Updated).await.is_ok()
}
