/*
 *  display/mod.rs
 *
 *  InkMonS - data on slow glass
 *  (c) 2023-26 Stuart Hunter
 *
 *  Display subsystem - sink trait plus the panel and preview backends
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

pub mod error;
pub mod traits;

#[cfg(feature = "epaper")]
pub mod epd;

#[cfg(feature = "preview")]
pub mod preview;

pub use error::DisplayError;
pub use traits::{DisplaySink, PanelSpec, RefreshKind};

use crate::config::{Config, SinkKind};

/// Build and initialize the configured sink. A failure here is fatal at
/// startup and surfaces as a non-zero exit.
pub fn create_sink(cfg: &Config) -> Result<Box<dyn DisplaySink>, DisplayError> {
    let display = cfg.display_or_default();

    match display.sink() {
        SinkKind::Epd2in9 => {
            #[cfg(feature = "epaper")]
            return Ok(Box::new(epd::EpdPanel::open(&display)?));

            #[cfg(not(feature = "epaper"))]
            return Err(DisplayError::InvalidConfiguration(
                "built without the 'epaper' feature; run with -s for the preview sink".into(),
            ));
        }
        SinkKind::Preview => {
            #[cfg(feature = "preview")]
            return Ok(Box::new(preview::PreviewWindow::open(&display)));

            #[cfg(not(feature = "preview"))]
            return Err(DisplayError::InvalidConfiguration(
                "built without the 'preview' feature".into(),
            ));
        }
    }
}
