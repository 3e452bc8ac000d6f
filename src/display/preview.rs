/*
 *  display/preview.rs
 *
 *  InkMonS - data on slow glass
 *  (c) 2023-26 Stuart Hunter
 *
 *  Preview window sink for desktop development
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

use embedded_graphics::pixelcolor::BinaryColor;
use embedded_graphics::prelude::*;
use embedded_graphics_simulator::{
    BinaryColorTheme, OutputSettingsBuilder, SimulatorDisplay, SimulatorEvent, Window,
};
use log::info;

use crate::config::DisplayConfig;
use crate::display::error::DisplayError;
use crate::display::traits::{DisplaySink, PanelSpec, RefreshKind};
use crate::frame::Frame;

/// On-screen stand-in for the panel. Closing the window reads as a clean
/// shutdown request, not a failure.
pub struct PreviewWindow {
    display: SimulatorDisplay<BinaryColor>,
    window: Window,
    spec: PanelSpec,
}

impl PreviewWindow {
    pub fn open(cfg: &DisplayConfig) -> Self {
        let (w, h) = (cfg.width(), cfg.height());
        let settings = OutputSettingsBuilder::new()
            .scale(cfg.scale().max(1))
            .theme(BinaryColorTheme::LcdWhite)
            .build();

        info!("preview window {}x{} at {}x scale", w, h, cfg.scale().max(1));

        Self {
            display: SimulatorDisplay::new(Size::new(w, h)),
            window: Window::new("InkMonS preview", &settings),
            spec: PanelSpec { width: w, height: h, supports_partial: false },
        }
    }

    fn pump_events(&mut self) -> Result<(), DisplayError> {
        for event in self.window.events() {
            if let SimulatorEvent::Quit = event {
                return Err(DisplayError::Closed);
            }
        }
        Ok(())
    }
}

impl DisplaySink for PreviewWindow {
    fn spec(&self) -> &PanelSpec {
        &self.spec
    }

    fn present(&mut self, frame: &Frame, _refresh: RefreshKind) -> Result<(), DisplayError> {
        let expected = (self.spec.width, self.spec.height);
        let actual = (frame.width(), frame.height());
        if expected != actual {
            return Err(DisplayError::FrameSizeMismatch { expected, actual });
        }

        let width = frame.width() as usize;
        self.display
            .draw_iter(frame.as_slice().iter().enumerate().map(|(i, c)| {
                Pixel(Point::new((i % width) as i32, (i / width) as i32), *c)
            }))
            .ok();

        self.window.update(&self.display);
        self.pump_events()
    }

    fn clear(&mut self) -> Result<(), DisplayError> {
        self.display.clear(BinaryColor::Off).ok();
        self.window.update(&self.display);
        self.pump_events()
    }

    fn sleep(&mut self) -> Result<(), DisplayError> {
        Ok(())
    }
}
