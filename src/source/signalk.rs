use std::collections::HashMap;
use std::time::Duration;

use log::{info, warn};
use tokio::sync::{mpsc, watch};

use crate::source::{push_value, SourceEvent};
use crate::values::{SharedValues, Value};

/// Polls a SignalK full-model REST endpoint and forwards subscribed paths
/// whose values changed since the previous poll.
pub struct SignalKSource {
    url: String,
    period: Duration,
    paths: Vec<String>,
}

impl SignalKSource {
    pub fn new(url: &str, period: Duration, paths: Vec<String>) -> Self {
        Self {
            url: url.to_string(),
            period,
            paths,
        }
    }

    pub(crate) async fn run(
        self,
        store: SharedValues,
        events: mpsc::Sender<SourceEvent>,
        mut shutdown: watch::Receiver<bool>,
    ) {
        let client = match reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
        {
            Ok(client) => client,
            Err(e) => {
                warn!("signalk http client init failed: {e}");
                return;
            }
        };

        let mut cache: HashMap<String, Value> = HashMap::new();
        let mut connected = false;
        let mut ticker = tokio::time::interval(self.period);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                res = shutdown.changed() => {
                    if res.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
                _ = ticker.tick() => {
                    let fetched = match client.get(&self.url).send().await.and_then(|r| r.error_for_status()) {
                        Ok(response) => response.json::<serde_json::Value>().await,
                        Err(e) => Err(e),
                    };

                    match fetched {
                        Ok(model) => {
                            if !connected {
                                info!("connected to signalk at {}", self.url);
                                connected = true;
                                events.send(SourceEvent::Connected).await.ok();
                            }
                            for path in &self.paths {
                                let Some(value) = extract(&model, path) else {
                                    continue;
                                };
                                if changed(&mut cache, path, &value)
                                    && !push_value(&store, &events, path, value).await
                                {
                                    return;
                                }
                            }
                        }
                        Err(e) => {
                            warn!("signalk poll failed: {e}");
                            if connected {
                                connected = false;
                                events.send(SourceEvent::Disconnected).await.ok();
                            }
                        }
                    }
                }
            }
        }
    }
}

/// Walk a slash-separated path into the full-model document.
fn extract(model: &serde_json::Value, path: &str) -> Option<Value> {
    let mut node = model;
    for part in path.split('/').filter(|p| !p.is_empty()) {
        node = node.get(part)?;
    }
    Value::from_json(node)
}

/// Only pass on readings that differ from the previous poll.
fn changed(cache: &mut HashMap<String, Value>, path: &str, value: &Value) -> bool {
    match cache.get(path) {
        Some(prev) if prev == value => false,
        _ => {
            cache.insert(path.to_string(), value.clone());
            true
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn model() -> serde_json::Value {
        json!({
            "electrical": {
                "batteries": {
                    "house": { "voltage": { "value": 12.8 }, "name": "house" }
                }
            }
        })
    }

    #[test]
    fn extract_walks_nested_objects() {
        assert_eq!(
            extract(&model(), "electrical/batteries/house/voltage/value"),
            Some(Value::Number(12.8))
        );
        assert_eq!(
            extract(&model(), "electrical/batteries/house/name"),
            Some(Value::Text("house".into()))
        );
        assert_eq!(extract(&model(), "electrical/missing/path"), None);
    }

    #[test]
    fn unchanged_values_are_suppressed() {
        let mut cache = HashMap::new();
        let v = Value::Number(12.8);

        assert!(changed(&mut cache, "a/b", &v));
        assert!(!changed(&mut cache, "a/b", &v));
        assert!(changed(&mut cache, "a/b", &Value::Number(12.9)));
        assert!(changed(&mut cache, "a/c", &v));
    }
}
