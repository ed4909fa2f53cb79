use log::{debug, info};
use std::sync::Arc;

use super::SensorAdapter;
use crate::error::Result;
use crate::hardware::{Board, Yl83Handler};
use crate::models::{InitArgs, SampleBuffer};

pub const NAME: &str = "YL83";

const PRECIPITATION: &str = "precipitation";

/// Rain detection from a YL83 plate; samples are stored as 1 (rain) or 0
pub struct Yl83Adapter {
    board: Arc<dyn Board>,
    handler: Option<Box<dyn Yl83Handler>>,
    buffer: SampleBuffer,
}

impl Yl83Adapter {
    pub fn new(board: Arc<dyn Board>) -> Self {
        info!("Initializing YL83Adapter...");
        Yl83Adapter {
            board,
            handler: None,
            buffer: SampleBuffer::new(&[PRECIPITATION]),
        }
    }
}

impl SensorAdapter for Yl83Adapter {
    fn name(&self) -> &'static str {
        NAME
    }

    fn initialize(&mut self, args: InitArgs) -> Result<()> {
        info!("Started YL83 initialization with {:?}", args);
        self.handler = Some(self.board.open_yl83(args.bus())?);
        info!("YL83 initialization successful");
        Ok(())
    }

    fn sample_once(&mut self) -> Result<()> {
        let yl83 = match self.handler.as_mut() {
            Some(handler) => handler,
            None => panic!("YL83 adapter sampled before initialization"),
        };

        let precipitation = yl83.read_precipitation()?;
        debug!("Precipitation: {}", precipitation);

        self.buffer.push(PRECIPITATION, u8::from(precipitation) as f64);
        Ok(())
    }

    fn buffer(&self) -> &SampleBuffer {
        &self.buffer
    }
}
