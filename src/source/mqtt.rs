use std::time::Duration;

use log::{info, warn};
use rumqttc::{AsyncClient, Event, Incoming, MqttOptions, QoS};
use tokio::sync::{mpsc, watch};

use crate::source::{push_value, SourceEvent};
use crate::values::{SharedValues, Value};

/// Breather between reconnect attempts; rumqttc re-dials on the next poll.
const RECONNECT_DELAY: Duration = Duration::from_secs(3);

/// Subscribes to one topic per bound data-key and forwards each publish
/// as a value update.
pub struct MqttSource {
    host: String,
    port: u16,
    client_id: String,
    topics: Vec<String>,
}

impl MqttSource {
    pub fn new(host: &str, port: u16, client_id: &str, topics: Vec<String>) -> Self {
        Self {
            host: host.to_string(),
            port,
            client_id: client_id.to_string(),
            topics,
        }
    }

    pub(crate) async fn run(
        self,
        store: SharedValues,
        events: mpsc::Sender<SourceEvent>,
        mut shutdown: watch::Receiver<bool>,
    ) {
        let mut options = MqttOptions::new(&self.client_id, &self.host, self.port);
        options.set_keep_alive(Duration::from_secs(30));
        let (client, mut eventloop) = AsyncClient::new(options, 16);

        let mut connected = false;
        loop {
            tokio::select! {
                res = shutdown.changed() => {
                    if res.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
                polled = eventloop.poll() => match polled {
                    Ok(Event::Incoming(Incoming::ConnAck(_))) => {
                        info!("connected to mqtt://{}:{}", self.host, self.port);
                        connected = true;
                        events.send(SourceEvent::Connected).await.ok();
                        // (re)subscribe on every connect so reconnects recover
                        for topic in &self.topics {
                            if let Err(e) = client.subscribe(topic, QoS::AtMostOnce).await {
                                warn!("subscribe '{topic}' failed: {e}");
                            }
                        }
                    }
                    Ok(Event::Incoming(Incoming::Publish(publish))) => {
                        let payload = String::from_utf8_lossy(&publish.payload);
                        if !push_value(&store, &events, &publish.topic, Value::parse(&payload)).await {
                            break;
                        }
                    }
                    Ok(_) => {}
                    Err(e) => {
                        if connected {
                            warn!("mqtt connection lost: {e}");
                            connected = false;
                        } else {
                            warn!("mqtt connect failed: {e}");
                        }
                        events.send(SourceEvent::Disconnected).await.ok();
                        tokio::time::sleep(RECONNECT_DELAY).await;
                    }
                }
            }
        }

        client.disconnect().await.ok();
    }
}
