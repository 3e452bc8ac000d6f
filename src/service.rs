/*
 *  service.rs
 *
 *  InkMonS - data on slow glass
 *	(c) 2023-26 Stuart Hunter
 *
 *	Render loop: data-source events and timer ticks in, frames out
 *
 *	This program is free software: you can redistribute it and/or modify
 *	it under the terms of the GNU General Public License as published by
 *	the Free Software Foundation, either version 3 of the License, or
 *	(at your option) any later version.
 *
 *	This program is distributed in the hope that it will be useful,
 *	but WITHOUT ANY WARRANTY; without even the implied warranty of
 *	MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
 *	GNU General Public License for more details.
 *
 *	See <http://www.gnu.org/licenses/> to get a copy of the GNU General
 *	Public License.
 *
 */

use std::time::Duration;

use log::{debug, error, info, warn};
use tokio::sync::{mpsc, watch};
use tokio::time::MissedTickBehavior;

use crate::display::{DisplayError, DisplaySink, RefreshKind};
use crate::layout::Dashboard;
use crate::source::SourceEvent;
use crate::values::SharedValues;

/// Loop states. The loop is a single task, so Rendering is only observable
/// in log output, but the coalescing contract hangs off it: triggers that
/// arrive while Rendering queue in the event channel and collapse into one
/// follow-up redraw. At most one render is ever in flight.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LoopState {
    Idle,
    Rendering,
}

/// Drives the dashboard: renders one frame per trigger from the current
/// value snapshot and pushes it to the sink.
pub struct Service {
    dashboard: Dashboard,
    store: SharedValues,
    sink: Box<dyn DisplaySink>,
    tick: Duration,
    full_refresh_every: u32,
    partials: u32,
    state: LoopState,
}

impl Service {
    pub fn new(
        dashboard: Dashboard,
        store: SharedValues,
        sink: Box<dyn DisplaySink>,
        tick: Duration,
        full_refresh_every: u32,
    ) -> Self {
        Self {
            dashboard,
            store,
            sink,
            tick,
            full_refresh_every,
            // forces a full refresh on the very first frame
            partials: full_refresh_every,
            state: LoopState::Idle,
        }
    }

    /// Run until shutdown is flagged, the event channel closes, or the
    /// preview window is closed. The in-flight render always completes
    /// before the sink is released.
    pub async fn run(
        mut self,
        mut events: mpsc::Receiver<SourceEvent>,
        mut shutdown: watch::Receiver<bool>,
    ) -> Result<(), DisplayError> {
        info!(
            "render loop up: {}x{}, tick {:?}, full refresh every {} partials",
            self.dashboard.width(),
            self.dashboard.height(),
            self.tick,
            self.full_refresh_every
        );

        let mut closed = false;

        // first frame straight away; widgets show placeholders until data lands
        if self.cycle(&mut closed) {
            let mut ticker =
                tokio::time::interval_at(tokio::time::Instant::now() + self.tick, self.tick);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

            'main: loop {
                tokio::select! {
                    res = shutdown.changed() => {
                        if res.is_err() || *shutdown.borrow() {
                            info!("shutdown requested");
                            break 'main;
                        }
                    }
                    maybe = events.recv() => match maybe {
                        None => {
                            debug!("event channel closed");
                            break 'main;
                        }
                        Some(ev) => {
                            let mut dirty = self.note(ev);
                            // coalesce whatever queued while the last frame
                            // was on its way to the panel
                            while let Ok(ev) = events.try_recv() {
                                dirty |= self.note(ev);
                            }
                            if dirty && !self.cycle(&mut closed) {
                                break 'main;
                            }
                        }
                    },
                    _ = ticker.tick() => {
                        if !self.cycle(&mut closed) {
                            break 'main;
                        }
                    }
                }
            }
        }

        info!("render loop stopped, releasing display");
        if !closed {
            if let Err(e) = self.sink.clear() {
                warn!("shutdown clear failed: {e}");
            }
            if let Err(e) = self.sink.sleep() {
                warn!("shutdown sleep failed: {e}");
            }
        }
        Ok(())
    }

    /// One redraw attempt; false means the loop should stop.
    fn cycle(&mut self, closed: &mut bool) -> bool {
        match self.redraw() {
            Ok(()) => true,
            Err(DisplayError::Closed) => {
                info!("preview window closed, shutting down");
                *closed = true;
                false
            }
            // a bad cycle is skipped, the loop keeps the last good frame
            Err(e) => {
                error!("render cycle skipped: {e}");
                true
            }
        }
    }

    fn redraw(&mut self) -> Result<(), DisplayError> {
        debug!("{:?} -> Rendering", self.state);
        self.state = LoopState::Rendering;

        let snapshot = self.store.lock().unwrap().clone();
        debug!(
            "rendering store revision {} ({} keys)",
            snapshot.revision(),
            snapshot.len()
        );
        let frame = self.dashboard.render(&snapshot);

        let refresh = self.pick_refresh();
        let result = self.sink.present(&frame, refresh);
        self.state = LoopState::Idle;

        if result.is_ok() {
            match refresh {
                RefreshKind::Full => self.partials = 0,
                RefreshKind::Partial => self.partials += 1,
            }
        }
        result
    }

    fn pick_refresh(&self) -> RefreshKind {
        if !self.sink.spec().supports_partial {
            return RefreshKind::Full;
        }
        if self.partials >= self.full_refresh_every {
            // ghosting control: clear artifacts left by partial refreshes
            RefreshKind::Full
        } else {
            RefreshKind::Partial
        }
    }

    /// Fold an adapter event into the loop; true means a redraw is due.
    fn note(&mut self, ev: SourceEvent) -> bool {
        match ev {
            SourceEvent::Updated => true,
            SourceEvent::Connected => {
                info!("data source connected");
                false
            }
            SourceEvent::Disconnected => {
                warn!("data source disconnected, keeping last values");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::display::PanelSpec;
    use crate::frame::Frame;
    use crate::values::{Value, ValueStore};
    use std::sync::{Arc, Mutex};

    type Presented = Arc<Mutex<Vec<(Frame, RefreshKind)>>>;

    struct RecordingSink {
        spec: PanelSpec,
        presented: Presented,
    }

    impl DisplaySink for RecordingSink {
        fn spec(&self) -> &PanelSpec {
            &self.spec
        }

        fn present(&mut self, frame: &Frame, refresh: RefreshKind) -> Result<(), DisplayError> {
            self.presented.lock().unwrap().push((frame.clone(), refresh));
            Ok(())
        }

        fn clear(&mut self) -> Result<(), DisplayError> {
            Ok(())
        }

        fn sleep(&mut self) -> Result<(), DisplayError> {
            Ok(())
        }
    }

    fn test_service(tick: Duration, full_refresh_every: u32) -> (Service, Presented, SharedValues) {
        let cfg = Config::default();
        let dashboard = Dashboard::from_config(&cfg).unwrap();
        let store = ValueStore::shared();
        let presented: Presented = Arc::new(Mutex::new(Vec::new()));
        let sink = Box::new(RecordingSink {
            spec: PanelSpec {
                width: dashboard.width(),
                height: dashboard.height(),
                supports_partial: true,
            },
            presented: presented.clone(),
        });
        let service = Service::new(dashboard, store.clone(), sink, tick, full_refresh_every);
        (service, presented, store)
    }

    #[tokio::test]
    async fn queued_updates_coalesce_into_one_render() {
        let (service, presented, store) = test_service(Duration::from_secs(3600), 10);
        let (tx, rx) = mpsc::channel(8);
        let (_shutdown_tx, shutdown_rx) = watch::channel(false);

        // three updates land while the first frame is "in flight"
        for load in [10.0, 20.0, 30.0] {
            store.lock().unwrap().insert("battery/load", Value::Number(load));
            tx.send(SourceEvent::Updated).await.unwrap();
        }
        drop(tx);

        service.run(rx, shutdown_rx).await.unwrap();

        // initial frame plus exactly one coalesced redraw
        let frames = presented.lock().unwrap();
        assert_eq!(frames.len(), 2);

        // and that redraw used the latest snapshot
        let cfg = Config::default();
        let dashboard = Dashboard::from_config(&cfg).unwrap();
        let mut expected = ValueStore::new();
        expected.insert("battery/load", Value::Number(30.0));
        assert_eq!(
            frames[1].0.as_slice(),
            dashboard.render(&expected).as_slice()
        );
    }

    #[tokio::test]
    async fn connection_events_do_not_redraw() {
        let (service, presented, store) = test_service(Duration::from_secs(3600), 10);
        let (tx, rx) = mpsc::channel(8);
        let (_shutdown_tx, shutdown_rx) = watch::channel(false);

        tx.send(SourceEvent::Connected).await.unwrap();
        tx.send(SourceEvent::Disconnected).await.unwrap();
        drop(tx);

        service.run(rx, shutdown_rx).await.unwrap();

        // only the startup frame; the store never changed
        assert_eq!(presented.lock().unwrap().len(), 1);
        assert!(store.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn shutdown_flag_stops_the_loop() {
        let (service, presented, _store) = test_service(Duration::from_secs(3600), 10);
        let (_tx, rx) = mpsc::channel::<SourceEvent>(8);
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        shutdown_tx.send(true).unwrap();

        let result =
            tokio::time::timeout(Duration::from_secs(5), service.run(rx, shutdown_rx)).await;
        assert!(result.expect("loop should stop promptly").is_ok());
        assert_eq!(presented.lock().unwrap().len(), 1);
    }

    /// Stands in for the preview window: accepts `close_after` frames, then
    /// reports the window closed.
    struct ClosingSink {
        spec: PanelSpec,
        presents: u32,
        close_after: u32,
    }

    impl DisplaySink for ClosingSink {
        fn spec(&self) -> &PanelSpec {
            &self.spec
        }

        fn present(&mut self, _frame: &Frame, _refresh: RefreshKind) -> Result<(), DisplayError> {
            self.presents += 1;
            if self.presents > self.close_after {
                return Err(DisplayError::Closed);
            }
            Ok(())
        }

        fn clear(&mut self) -> Result<(), DisplayError> {
            Ok(())
        }

        fn sleep(&mut self) -> Result<(), DisplayError> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn window_close_is_a_clean_exit() {
        let cfg = Config::default();
        let dashboard = Dashboard::from_config(&cfg).unwrap();
        let spec = PanelSpec {
            width: dashboard.width(),
            height: dashboard.height(),
            supports_partial: false,
        };
        let sink = Box::new(ClosingSink { spec, presents: 0, close_after: 1 });
        let service = Service::new(
            dashboard,
            ValueStore::shared(),
            sink,
            Duration::from_millis(10),
            10,
        );

        let (_tx, rx) = mpsc::channel::<SourceEvent>(8);
        let (_shutdown_tx, shutdown_rx) = watch::channel(false);

        // startup frame is accepted, the next tick's frame reports Closed;
        // that reads as a clean shutdown, not an error
        let result =
            tokio::time::timeout(Duration::from_secs(5), service.run(rx, shutdown_rx)).await;
        assert!(result.expect("loop should stop promptly").is_ok());
    }

    #[test]
    fn full_refresh_cadence_clears_ghosting() {
        let (mut service, presented, _store) = test_service(Duration::from_secs(3600), 2);

        for _ in 0..6 {
            service.redraw().unwrap();
        }

        let kinds: Vec<RefreshKind> =
            presented.lock().unwrap().iter().map(|(_, k)| *k).collect();
        assert_eq!(
            kinds,
            vec![
                RefreshKind::Full,
                RefreshKind::Partial,
                RefreshKind::Partial,
                RefreshKind::Full,
                RefreshKind::Partial,
                RefreshKind::Partial,
            ]
        );
    }
}
