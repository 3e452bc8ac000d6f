/*
 *  display/error.rs
 *
 *  InkMonS - data on slow glass
 *  (c) 2023-26 Stuart Hunter
 *
 *  Unified error types for the display subsystem
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

use std::error::Error;
use std::fmt;

/// Unified error type for all display sink operations
#[derive(Debug)]
pub enum DisplayError {
    /// Hardware initialization failed - fatal at startup
    InitFailed(String),

    /// SPI communication error
    SpiError(String),

    /// GPIO pin error
    GpioError(String),

    /// Frame dimensions don't match the panel
    FrameSizeMismatch { expected: (u32, u32), actual: (u32, u32) },

    /// Device rejected an update mid-cycle
    DeviceError(String),

    /// Preview window was closed by the user
    Closed,

    /// Invalid sink configuration
    InvalidConfiguration(String),
}

impl fmt::Display for DisplayError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DisplayError::InitFailed(msg) =>
                write!(f, "Display initialization failed: {}", msg),
            DisplayError::SpiError(msg) =>
                write!(f, "SPI communication error: {}", msg),
            DisplayError::GpioError(msg) =>
                write!(f, "GPIO error: {}", msg),
            DisplayError::FrameSizeMismatch { expected, actual } =>
                write!(f, "Frame size mismatch: panel is {}x{}, frame is {}x{}",
                    expected.0, expected.1, actual.0, actual.1),
            DisplayError::DeviceError(msg) =>
                write!(f, "Device error: {}", msg),
            DisplayError::Closed =>
                write!(f, "Preview window closed"),
            DisplayError::InvalidConfiguration(msg) =>
                write!(f, "Invalid configuration: {}", msg),
        }
    }
}

impl Error for DisplayError {
    // the wrapped HAL errors don't implement std::error::Error uniformly,
    // so they are carried as formatted strings with no source()
}
