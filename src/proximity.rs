//! Proximity actuator.
//!
//! Lights an indicator while the latest reading is within
//! [`PROXIMITY_THRESHOLD`] metres. The output is only written when the
//! desired state changes, so the relay loop can call [`ProximityActuator::update`]
//! on every tick.

use crate::reading::Reading;
use log::{info, warn};

/// Distance (metres) at or below which the indicator engages.
pub const PROXIMITY_THRESHOLD: f32 = 1.0;

/// A binary output such as an LED.
pub trait Indicator {
    /// Error raised by the underlying output.
    type Error: std::fmt::Display;

    /// Switch the output on or off.
    fn set_active(&mut self, active: bool) -> Result<(), Self::Error>;
}

/// Drives an [`Indicator`] from the latest reading.
pub struct ProximityActuator<I: Indicator> {
    indicator: I,
    threshold: f32,
    /// Last state successfully written, `None` before the first write.
    active: Option<bool>,
}

impl<I: Indicator> ProximityActuator<I> {
    /// Create an actuator using [`PROXIMITY_THRESHOLD`].
    pub fn new(indicator: I) -> Self {
        Self::with_threshold(indicator, PROXIMITY_THRESHOLD)
    }

    /// Create an actuator with a custom threshold.
    pub fn with_threshold(indicator: I, threshold: f32) -> Self {
        Self {
            indicator,
            threshold,
            active: None,
        }
    }

    /// Whether the indicator is currently on.
    pub fn is_active(&self) -> bool {
        self.active.unwrap_or(false)
    }

    /// Bring the indicator in line with `reading`.
    ///
    /// A missing or non-numeric reading switches it off. Output errors are
    /// logged and retried on the next call.
    pub fn update(&mut self, reading: Option<&Reading>) {
        let near = reading.is_some_and(|r| r.is_near(self.threshold));
        if self.active == Some(near) {
            return;
        }

        match self.indicator.set_active(near) {
            Ok(()) => {
                if near {
                    info!("Proximity alert on (threshold {} m)", self.threshold);
                } else if self.active.is_some() {
                    info!("Proximity alert off");
                }
                self.active = Some(near);
            }
            Err(e) => warn!("Failed to drive proximity indicator: {}", e),
        }
    }

    /// Access the wrapped indicator.
    pub fn indicator(&self) -> &I {
        &self.indicator
    }
}

/// LED on a GPIO pin, active high.
#[cfg(feature = "esp32")]
pub struct LedIndicator<'d> {
    pin: esp_idf_hal::gpio::PinDriver<'d, esp_idf_hal::gpio::AnyOutputPin, esp_idf_hal::gpio::Output>,
}

#[cfg(feature = "esp32")]
impl<'d> LedIndicator<'d> {
    /// Configure `pin` as a push-pull output, initially low.
    pub fn new(pin: esp_idf_hal::gpio::AnyOutputPin) -> Result<Self, esp_idf_sys::EspError> {
        let mut pin = esp_idf_hal::gpio::PinDriver::output(pin)?;
        pin.set_low()?;
        Ok(Self { pin })
    }
}

#[cfg(feature = "esp32")]
impl Indicator for LedIndicator<'_> {
    type Error = esp_idf_sys::EspError;

    fn set_active(&mut self, active: bool) -> Result<(), Self::Error> {
        if active {
            self.pin.set_high()
        } else {
            self.pin.set_low()
        }
    }
}

/// Indicator that only logs. Used by the host build in place of an LED.
#[derive(Debug, Default)]
pub struct LogIndicator;

impl Indicator for LogIndicator {
    type Error = std::convert::Infallible;

    fn set_active(&mut self, active: bool) -> Result<(), Self::Error> {
        info!("LED {}", if active { "ON" } else { "OFF" });
        Ok(())
    }
}
