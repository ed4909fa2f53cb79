//! Weather station sensor reader.
//!
//! Polls the BME280, TSL2561 and YL83 boards of a single-board computer,
//! samples each several times per burst and reports one averaged value per
//! measured quantity.
//!
//! ```no_run
//! use std::sync::Arc;
//! use weather_reader::{Reader, Registry, SysfsBoard};
//!
//! # fn main() -> Result<(), weather_reader::Error> {
//! let mut reader = Reader::new(Registry::standard(Arc::new(SysfsBoard::default())))?;
//! reader.acquire_readers();
//! reader.initialize_readers()?;
//! let data = reader.collect(10, 0.3)?;
//! println!("{:?}", data);
//! # Ok(())
//! # }
//! ```

pub mod adapters;
pub mod config;
pub mod error;
pub mod factory;
pub mod hardware;
pub mod models;
pub mod reader;
pub mod utils;

pub use adapters::SensorAdapter;
pub use error::{Error, Result};
pub use factory::{AdapterFactory, Registry};
pub use hardware::{Board, HandlerError, SysfsBoard};
pub use models::{BusId, InitArgs, MeasurementMap, SampleBuffer};
pub use reader::{Reader, ReaderState};
