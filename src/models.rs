use std::collections::HashMap;
use std::fmt;

use crate::error::{Error, Result};

/// Channel name -> averaged value
pub type MeasurementMap = HashMap<String, f64>;

/// Name of the only keyword accepted by adapter initialization
pub const BUS_KEYWORD: &str = "i2c_id";

/// Identifier of the bus a chip is attached to (the I2C bus number)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BusId(pub u8);

impl fmt::Display for BusId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Argument shape accepted by `SensorAdapter::initialize`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InitArgs {
    /// Default bus selection of the handler
    #[default]
    NoArgs,
    /// A single positional bus identifier
    BusId(BusId),
    /// A single `i2c_id=<n>` keyword argument
    NamedBusId(BusId),
}

impl InitArgs {
    /// Parse raw argument text such as `""`, `"1"` or `"i2c_id=0"`.
    ///
    /// Tokens are separated by whitespace or commas. A token containing `=`
    /// is a named argument, anything else is positional. Shapes other than
    /// none, one positional or one `i2c_id` keyword are rejected with the
    /// raw arguments attached.
    pub fn parse(raw: &str) -> Result<Self> {
        let tokens: Vec<&str> = raw
            .split(|c: char| c == ',' || c.is_whitespace())
            .filter(|t| !t.is_empty())
            .collect();

        let invalid = || Error::InvalidArguments {
            args: format!("{:?}", tokens),
        };

        match tokens.as_slice() {
            [] => Ok(InitArgs::NoArgs),
            [token] => match token.split_once('=') {
                None => parse_bus(token).map(InitArgs::BusId).ok_or_else(invalid),
                Some((key, value)) if key.trim() == BUS_KEYWORD => parse_bus(value)
                    .map(InitArgs::NamedBusId)
                    .ok_or_else(invalid),
                Some(_) => Err(invalid()),
            },
            _ => Err(invalid()),
        }
    }

    /// Bus selected by these arguments, `None` for the handler default
    pub fn bus(&self) -> Option<BusId> {
        match self {
            InitArgs::NoArgs => None,
            InitArgs::BusId(bus) | InitArgs::NamedBusId(bus) => Some(*bus),
        }
    }
}

fn parse_bus(value: &str) -> Option<BusId> {
    value.trim().parse::<u8>().ok().map(BusId)
}

#[derive(Debug, Clone)]
struct Channel {
    name: &'static str,
    samples: Vec<f64>,
}

/// Raw samples per channel collected during one polling burst.
///
/// Channels keep their declaration order and samples keep capture order.
#[derive(Debug, Clone, Default)]
pub struct SampleBuffer {
    channels: Vec<Channel>,
}

impl SampleBuffer {
    pub fn new(names: &[&'static str]) -> Self {
        SampleBuffer {
            channels: names
                .iter()
                .map(|&name| Channel {
                    name,
                    samples: Vec::new(),
                })
                .collect(),
        }
    }

    /// Append one sample to `channel`.
    ///
    /// Panics if the channel was not declared at construction; adapters only
    /// push to their own fixed channel set.
    pub fn push(&mut self, channel: &str, value: f64) {
        match self.channels.iter_mut().find(|c| c.name == channel) {
            Some(c) => c.samples.push(value),
            None => panic!("channel {} is not part of this buffer", channel),
        }
    }

    pub fn samples(&self, channel: &str) -> Option<&[f64]> {
        self.channels
            .iter()
            .find(|c| c.name == channel)
            .map(|c| c.samples.as_slice())
    }

    /// Channels in declaration order with their samples
    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &[f64])> + '_ {
        self.channels.iter().map(|c| (c.name, c.samples.as_slice()))
    }

    pub fn channel_names(&self) -> Vec<&'static str> {
        self.channels.iter().map(|c| c.name).collect()
    }
}
