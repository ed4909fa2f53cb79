use log::{debug, info};
use std::sync::Arc;

use super::SensorAdapter;
use crate::error::Result;
use crate::hardware::{Bme280Handler, Board};
use crate::models::{InitArgs, SampleBuffer};

pub const NAME: &str = "BME280";

const TEMPERATURE: &str = "temperature";
const PRESSURE: &str = "pressure";
const HUMIDITY: &str = "humidity";

/// Temperature, pressure and humidity from a BME280 board
pub struct Bme280Adapter {
    board: Arc<dyn Board>,
    handler: Option<Box<dyn Bme280Handler>>,
    buffer: SampleBuffer,
}

impl Bme280Adapter {
    pub fn new(board: Arc<dyn Board>) -> Self {
        info!("Initializing BME280Adapter...");
        Bme280Adapter {
            board,
            handler: None,
            buffer: SampleBuffer::new(&[TEMPERATURE, PRESSURE, HUMIDITY]),
        }
    }
}

impl SensorAdapter for Bme280Adapter {
    fn name(&self) -> &'static str {
        NAME
    }

    fn initialize(&mut self, args: InitArgs) -> Result<()> {
        info!("Started BME280 initialization with {:?}", args);
        self.handler = Some(self.board.open_bme280(args.bus())?);
        info!("BME280 initialization successful");
        Ok(())
    }

    fn sample_once(&mut self) -> Result<()> {
        let bme280 = match self.handler.as_mut() {
            Some(handler) => handler,
            None => panic!("BME280 adapter sampled before initialization"),
        };

        let temperature = bme280.read_temperature()?;
        let pressure = bme280.read_pressure()?;
        let humidity = bme280.read_humidity()?;

        debug!("Temperature: {}", temperature);
        debug!("Pressure: {}", pressure);
        debug!("Humidity: {}", humidity);

        self.buffer.push(TEMPERATURE, temperature);
        self.buffer.push(PRESSURE, pressure);
        self.buffer.push(HUMIDITY, humidity);
        Ok(())
    }

    fn buffer(&self) -> &SampleBuffer {
        &self.buffer
    }
}
