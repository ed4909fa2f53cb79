//! Bus handler boundary.
//!
//! Each physical chip is driven by a handler object owned by exactly one
//! sensor adapter. Handlers are opened through a [`Board`], which knows how
//! the chips are wired on a particular machine.

pub mod sysfs;

pub use sysfs::SysfsBoard;

use thiserror::Error;

use crate::models::BusId;

/// Failure reported by a bus handler
#[derive(Debug, Error)]
pub enum HandlerError {
    /// The handler rejected the requested bus identifier
    #[error("{chip}: invalid bus {bus}: {desc}")]
    InvalidBus {
        chip: &'static str,
        bus: String,
        desc: String,
    },

    /// The chip could not be located on the requested bus
    #[error("{chip} not found: {desc}")]
    NotFound { chip: &'static str, desc: String },

    /// The chip answered with something unusable
    #[error("{chip} communication failed: {desc}")]
    Communication { chip: &'static str, desc: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Temperature, pressure and humidity board
pub trait Bme280Handler: Send {
    /// Temperature in degrees Celsius
    fn read_temperature(&mut self) -> Result<f64, HandlerError>;
    /// Pressure in hectopascals
    fn read_pressure(&mut self) -> Result<f64, HandlerError>;
    /// Relative humidity in percent
    fn read_humidity(&mut self) -> Result<f64, HandlerError>;
}

/// Light intensity board
pub trait Tsl2561Handler: Send {
    fn read_full_spectrum(&mut self) -> Result<f64, HandlerError>;
    fn read_infrared(&mut self) -> Result<f64, HandlerError>;

    fn read_visible(&mut self) -> Result<f64, HandlerError> {
        Ok(self.read_full_spectrum()? - self.read_infrared()?)
    }
}

/// Rain sensor
pub trait Yl83Handler: Send {
    /// `true` while rain is falling
    fn read_precipitation(&mut self) -> Result<bool, HandlerError>;
}

/// Opens handlers for the chips attached to this machine.
///
/// `None` selects the handler's default bus.
pub trait Board: Send + Sync {
    fn open_bme280(&self, bus: Option<BusId>) -> Result<Box<dyn Bme280Handler>, HandlerError>;
    fn open_tsl2561(&self, bus: Option<BusId>) -> Result<Box<dyn Tsl2561Handler>, HandlerError>;
    fn open_yl83(&self, bus: Option<BusId>) -> Result<Box<dyn Yl83Handler>, HandlerError>;
}
