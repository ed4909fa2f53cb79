use log::{debug, info};
use std::sync::Arc;

use super::SensorAdapter;
use crate::error::Result;
use crate::hardware::{Board, Tsl2561Handler};
use crate::models::{InitArgs, SampleBuffer};

pub const NAME: &str = "TSL2561";

const LIGHT_INTENSITY: &str = "light_intensity";

/// Full-spectrum light intensity from a TSL2561 board
pub struct Tsl2561Adapter {
    board: Arc<dyn Board>,
    handler: Option<Box<dyn Tsl2561Handler>>,
    buffer: SampleBuffer,
}

impl Tsl2561Adapter {
    pub fn new(board: Arc<dyn Board>) -> Self {
        info!("Initializing TSL2561Adapter...");
        Tsl2561Adapter {
            board,
            handler: None,
            buffer: SampleBuffer::new(&[LIGHT_INTENSITY]),
        }
    }
}

impl SensorAdapter for Tsl2561Adapter {
    fn name(&self) -> &'static str {
        NAME
    }

    fn initialize(&mut self, args: InitArgs) -> Result<()> {
        info!("Started TSL2561 initialization with {:?}", args);
        self.handler = Some(self.board.open_tsl2561(args.bus())?);
        info!("TSL2561 initialization successful");
        Ok(())
    }

    fn sample_once(&mut self) -> Result<()> {
        let tsl2561 = match self.handler.as_mut() {
            Some(handler) => handler,
            None => panic!("TSL2561 adapter sampled before initialization"),
        };

        let light_intensity = tsl2561.read_full_spectrum()?;
        debug!("Light intensity: {}", light_intensity);

        self.buffer.push(LIGHT_INTENSITY, light_intensity);
        Ok(())
    }

    fn buffer(&self) -> &SampleBuffer {
        &self.buffer
    }
}
