//! Sensor adapters: one per chip, all behind the same sample/average contract.
//!
//! Lifecycle of an adapter: constructed with an empty [`SampleBuffer`] and no
//! handler, bound to its bus handler by [`SensorAdapter::initialize`], sampled
//! any number of times, then summarised by [`SensorAdapter::get_averaged`].

pub mod bme280;
pub mod tsl2561;
pub mod yl83;

pub use bme280::Bme280Adapter;
pub use tsl2561::Tsl2561Adapter;
pub use yl83::Yl83Adapter;

use crate::error::Result;
use crate::models::{InitArgs, MeasurementMap, SampleBuffer};
use crate::utils::average;

pub trait SensorAdapter: Send {
    /// Registry identifier of this adapter
    fn name(&self) -> &'static str;

    /// Bind the adapter to its bus handler.
    ///
    /// Handler validation failures (e.g. a bus the chip does not support)
    /// are returned unchanged.
    fn initialize(&mut self, args: InitArgs) -> Result<()>;

    /// Read every channel once and append the values to the buffer.
    ///
    /// # Panics
    ///
    /// Panics if called before a successful `initialize`.
    fn sample_once(&mut self) -> Result<()>;

    fn buffer(&self) -> &SampleBuffer;

    /// Mean of every channel collected so far, 0 for channels without samples
    fn get_averaged(&self) -> MeasurementMap {
        self.buffer()
            .iter()
            .map(|(channel, samples)| (channel.to_string(), average(samples)))
            .collect()
    }
}
