/*
 *  main.rs
 *
 *  InkMonS - data on slow glass
 *	(c) 2023-26 Stuart Hunter
 *
 *	Widgets on an e-paper panel, fed by MQTT or SignalK
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

use anyhow::Context;
use env_logger::Env;
use log::{error, info};
use tokio::sync::{mpsc, watch};

#[cfg(unix)] // Only compile this block on Unix-like systems
use tokio::signal::unix::{signal, SignalKind};

mod config;
mod display;
mod draw;
mod frame;
mod glyphs;
mod layout;
mod service;
mod source;
mod values;
mod widgets;

use layout::Dashboard;
use service::Service;
use source::DataSource;
use values::ValueStore;

include!(concat!(env!("OUT_DIR"), "/build_info.rs"));

/// Waits for SIGINT, SIGTERM, or SIGHUP and returns so main can flag the
/// shutdown. The render loop finishes its in-flight frame first.
async fn signal_handler() -> std::io::Result<()> {
    let mut sigint = signal(SignalKind::interrupt())?;
    let mut sigterm = signal(SignalKind::terminate())?;
    let mut sighup = signal(SignalKind::hangup())?;

    tokio::select! {
        _ = sigint.recv() => {
            info!("SIGINT received. Initiating graceful shutdown.");
        }
        _ = sigterm.recv() => {
            info!("SIGTERM received. Initiating graceful shutdown.");
        }
        _ = sighup.recv() => {
            info!("SIGHUP received. Initiating graceful shutdown.");
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cfg = config::load()?;

    env_logger::Builder::from_env(
        Env::default().default_filter_or(cfg.log_level.as_deref().unwrap_or("info")),
    )
    .format_timestamp_secs()
    .init();

    info!("{} - data on slow glass", env!("CARGO_PKG_NAME"));
    info!("v{} built {}", env!("CARGO_PKG_VERSION"), BUILD_DATE);

    let dashboard = Dashboard::from_config(&cfg)?;
    let store = ValueStore::shared();

    let (event_tx, event_rx) = mpsc::channel(32);
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let data_source = DataSource::from_config(&cfg.source_or_default(), dashboard.keys());
    let source_task = data_source.spawn(store.clone(), event_tx, shutdown_rx.clone());

    // sink bring-up failure is fatal; it surfaces as a non-zero exit
    let sink = display::create_sink(&cfg).context("display sink initialization failed")?;

    let display_cfg = cfg.display_or_default();
    let service = Service::new(
        dashboard,
        store,
        sink,
        Duration::from_secs(display_cfg.tick_secs()),
        display_cfg.full_refresh_every(),
    );

    tokio::spawn(async move {
        if let Err(e) = signal_handler().await {
            error!("signal handler failed: {e}");
        }
        shutdown_tx.send(true).ok();
    });

    // the service runs on the main task: the preview window isn't Send
    let result = service.run(event_rx, shutdown_rx).await;

    source_task.abort();
    let _ = source_task.await;

    info!("clean shutdown");
    result.map_err(Into::into)
}
