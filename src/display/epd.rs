/*
 *  display/epd.rs
 *
 *  InkMonS - data on slow glass
 *  (c) 2023-26 Stuart Hunter
 *
 *  Hardware sink for the Waveshare 2.9" panel over SPI + cdev GPIO
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

use embedded_graphics::prelude::*;
use epd_waveshare::epd2in9::{Epd2in9, HEIGHT as NATIVE_HEIGHT, WIDTH as NATIVE_WIDTH};
use epd_waveshare::prelude::*;
use linux_embedded_hal::gpio_cdev::{Chip, LineRequestFlags};
use linux_embedded_hal::spidev::{SpiModeFlags, SpidevOptions};
use linux_embedded_hal::{CdevPin, Delay, SpidevDevice};
use log::{debug, info};

use crate::config::DisplayConfig;
use crate::display::error::DisplayError;
use crate::display::traits::{DisplaySink, PanelSpec, RefreshKind};
use crate::frame::Frame;

const SPI_SPEED_HZ: u32 = 4_000_000;

type PanelDevice = Epd2in9<SpidevDevice, CdevPin, CdevPin, CdevPin, Delay>;

/// The physical panel. The controller is wired portrait (128x296); a
/// landscape-configured layout is rotated into native orientation here.
pub struct EpdPanel {
    spi: SpidevDevice,
    delay: Delay,
    epd: PanelDevice,
    spec: PanelSpec,
    rotated: bool,
    lut: RefreshKind,
}

impl EpdPanel {
    pub fn open(cfg: &DisplayConfig) -> Result<Self, DisplayError> {
        let (w, h) = (cfg.width(), cfg.height());
        let rotated = if (w, h) == (NATIVE_WIDTH, NATIVE_HEIGHT) {
            false
        } else if (w, h) == (NATIVE_HEIGHT, NATIVE_WIDTH) {
            true
        } else {
            return Err(DisplayError::InvalidConfiguration(format!(
                "panel is {NATIVE_WIDTH}x{NATIVE_HEIGHT} native; configure {NATIVE_WIDTH}x{NATIVE_HEIGHT} or {NATIVE_HEIGHT}x{NATIVE_WIDTH}"
            )));
        };

        let mut spi = SpidevDevice::open(cfg.spidev())
            .map_err(|e| DisplayError::SpiError(format!("{}: {e:?}", cfg.spidev())))?;
        spi.0
            .configure(
                &SpidevOptions::new()
                    .bits_per_word(8)
                    .max_speed_hz(SPI_SPEED_HZ)
                    .mode(SpiModeFlags::SPI_MODE_0)
                    .build(),
            )
            .map_err(|e| DisplayError::SpiError(format!("{e:?}")))?;

        let mut chip = Chip::new(cfg.gpiochip())
            .map_err(|e| DisplayError::GpioError(format!("{}: {e:?}", cfg.gpiochip())))?;
        let busy = request_pin(&mut chip, cfg.busy_pin(), LineRequestFlags::INPUT, "inkmons-busy")?;
        let dc = request_pin(&mut chip, cfg.dc_pin(), LineRequestFlags::OUTPUT, "inkmons-dc")?;
        let rst = request_pin(&mut chip, cfg.rst_pin(), LineRequestFlags::OUTPUT, "inkmons-rst")?;

        let mut delay = Delay {};
        let epd = Epd2in9::new(&mut spi, busy, dc, rst, &mut delay, None)
            .map_err(|e| DisplayError::InitFailed(format!("{e:?}")))?;

        info!(
            "e-paper panel up on {} ({}x{} native{})",
            cfg.spidev(),
            NATIVE_WIDTH,
            NATIVE_HEIGHT,
            if rotated { ", rotated" } else { "" }
        );

        Ok(Self {
            spi,
            delay,
            epd,
            spec: PanelSpec { width: w, height: h, supports_partial: true },
            rotated,
            lut: RefreshKind::Full,
        })
    }

    /// Pack the frame into the controller's native portrait buffer:
    /// 1bpp, MSB first, set bit = white.
    fn pack_native(&self, frame: &Frame) -> Vec<u8> {
        let bytes_per_row = (NATIVE_WIDTH as usize + 7) / 8;
        let mut buf = vec![0u8; bytes_per_row * NATIVE_HEIGHT as usize];

        for ny in 0..NATIVE_HEIGHT as i32 {
            for nx in 0..NATIVE_WIDTH as i32 {
                let src = if self.rotated {
                    Point::new(ny, NATIVE_WIDTH as i32 - 1 - nx)
                } else {
                    Point::new(nx, ny)
                };
                let lit = frame.get(src).map(|c| c.is_on()).unwrap_or(false);
                if !lit {
                    buf[ny as usize * bytes_per_row + nx as usize / 8] |= 0x80 >> (nx as usize % 8);
                }
            }
        }
        buf
    }

    fn apply_lut(&mut self, refresh: RefreshKind) -> Result<(), DisplayError> {
        if refresh == self.lut {
            return Ok(());
        }
        let lut = match refresh {
            RefreshKind::Full => RefreshLut::Full,
            RefreshKind::Partial => RefreshLut::Quick,
        };
        self.epd
            .set_lut(&mut self.spi, &mut self.delay, Some(lut))
            .map_err(|e| DisplayError::DeviceError(format!("set_lut: {e:?}")))?;
        self.lut = refresh;
        Ok(())
    }
}

impl DisplaySink for EpdPanel {
    fn spec(&self) -> &PanelSpec {
        &self.spec
    }

    fn present(&mut self, frame: &Frame, refresh: RefreshKind) -> Result<(), DisplayError> {
        let expected = (self.spec.width, self.spec.height);
        let actual = (frame.width(), frame.height());
        if expected != actual {
            return Err(DisplayError::FrameSizeMismatch { expected, actual });
        }

        self.apply_lut(refresh)?;
        debug!("pushing frame ({:?} refresh)", refresh);

        let buffer = self.pack_native(frame);
        self.epd
            .update_and_display_frame(&mut self.spi, &buffer, &mut self.delay)
            .map_err(|e| DisplayError::DeviceError(format!("update: {e:?}")))
    }

    fn clear(&mut self) -> Result<(), DisplayError> {
        self.apply_lut(RefreshKind::Full)?;
        self.epd
            .clear_frame(&mut self.spi, &mut self.delay)
            .map_err(|e| DisplayError::DeviceError(format!("clear: {e:?}")))?;
        self.epd
            .display_frame(&mut self.spi, &mut self.delay)
            .map_err(|e| DisplayError::DeviceError(format!("clear: {e:?}")))
    }

    fn sleep(&mut self) -> Result<(), DisplayError> {
        self.epd
            .sleep(&mut self.spi, &mut self.delay)
            .map_err(|e| DisplayError::DeviceError(format!("sleep: {e:?}")))
    }
}

fn request_pin(
    chip: &mut Chip,
    line: u32,
    flags: LineRequestFlags,
    label: &'static str,
) -> Result<CdevPin, DisplayError> {
    let handle = chip
        .get_line(line)
        .and_then(|l| l.request(flags, 0, label))
        .map_err(|e| DisplayError::GpioError(format!("line {line}: {e:?}")))?;
    CdevPin::new(handle).map_err(|e| DisplayError::GpioError(format!("line {line}: {e:?}")))
}
