/// Linux sysfs handlers: kernel IIO drivers for the I2C boards, GPIO for the rain sensor
use log::{debug, info};
use std::fs;
use std::path::{Path, PathBuf};

use super::{Bme280Handler, Board, HandlerError, Tsl2561Handler, Yl83Handler};
use crate::models::BusId;

// Wiring of the weather station
const DEFAULT_I2C_BUS: u8 = 1;
const VALID_I2C_BUSES: [u8; 2] = [0, 1];
const BME280_ADDRESS: u16 = 0x77;
const TSL2561_ADDRESS: u16 = 0x29;
const YL83_GPIO: u32 = 26; // physical pin 37, offset within the SoC GPIO chip

// Labels of the SoC GPIO controller on Raspberry Pi boards
const SOC_GPIO_LABELS: &[&str] = &["pinctrl-bcm2835", "pinctrl-bcm2711", "pinctrl-rp1"];

// Names the IIO drivers register for each chip
const BME280_DRIVER_NAMES: &[&str] = &["bme280"];
const TSL2561_DRIVER_NAMES: &[&str] = &["tsl2561", "tsl2563"];

/// Board backed by the sysfs tree of a Raspberry Pi style machine
///
/// The BME280 is served by the `bmp280` IIO driver and the TSL2561 by the
/// `tsl2563` IIO driver; both must be bound (e.g. via device tree overlays).
/// The YL83 digital output is read through the sysfs GPIO interface.
#[derive(Debug, Clone)]
pub struct SysfsBoard {
    root: PathBuf,
}

impl SysfsBoard {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        SysfsBoard { root: root.into() }
    }

    /// Locate the IIO device for `chip` on `bus` at `address`
    fn find_iio_device(
        &self,
        chip: &'static str,
        names: &[&str],
        bus: u8,
        address: u16,
    ) -> Result<PathBuf, HandlerError> {
        let devices = self.root.join("bus/iio/devices");
        let client = format!("{}-{:04x}", bus, address);

        let entries = fs::read_dir(&devices).map_err(|e| HandlerError::NotFound {
            chip,
            desc: format!("cannot list {}: {}", devices.display(), e),
        })?;

        for entry in entries {
            let path = entry?.path();
            let name = match fs::read_to_string(path.join("name")) {
                Ok(name) => name,
                Err(_) => continue,
            };
            if !names.contains(&name.trim()) {
                continue;
            }

            // Devices are symlinks into the bus topology, e.g. .../i2c-1/1-0077/iio:device0
            let resolved = fs::canonicalize(&path)?;
            if resolved.components().any(|c| c.as_os_str() == client.as_str()) {
                debug!("{} found at {}", chip, resolved.display());
                return Ok(path);
            }
        }

        Err(HandlerError::NotFound {
            chip,
            desc: format!("no IIO device for I2C client {}", client),
        })
    }

    /// First sysfs GPIO number of the SoC controller.
    ///
    /// Newer kernels no longer number the SoC lines from 0 (e.g. 512 on a
    /// Pi 4 running 6.6). Falls back to 0 when no known controller is listed.
    fn soc_gpio_base(&self) -> Result<u32, HandlerError> {
        let entries = match fs::read_dir(self.root.join("class/gpio")) {
            Ok(entries) => entries,
            Err(_) => return Ok(0),
        };

        for entry in entries {
            let controller = entry?.path();
            let is_chip = controller
                .file_name()
                .and_then(|n| n.to_str())
                .map_or(false, |n| n.starts_with("gpiochip"));
            if !is_chip {
                continue;
            }
            let label = match fs::read_to_string(controller.join("label")) {
                Ok(label) => label,
                Err(_) => continue,
            };
            if !SOC_GPIO_LABELS.contains(&label.trim()) {
                continue;
            }

            let raw = fs::read_to_string(controller.join("base"))?;
            let base = raw.trim().parse::<u32>().map_err(|e| HandlerError::Communication {
                chip: "YL83",
                desc: format!("{}: bad GPIO base {:?} ({})", controller.display(), raw.trim(), e),
            })?;
            debug!("{} is {} with base {}", controller.display(), label.trim(), base);
            return Ok(base);
        }

        Ok(0)
    }
}

impl Default for SysfsBoard {
    fn default() -> Self {
        SysfsBoard::new("/sys")
    }
}

fn select_i2c_bus(chip: &'static str, bus: Option<BusId>) -> Result<u8, HandlerError> {
    let bus = bus.map(|b| b.0).unwrap_or(DEFAULT_I2C_BUS);
    if !VALID_I2C_BUSES.contains(&bus) {
        return Err(HandlerError::InvalidBus {
            chip,
            bus: bus.to_string(),
            desc: format!("I2C ID must be one of {:?}", VALID_I2C_BUSES),
        });
    }
    Ok(bus)
}

fn read_attribute(chip: &'static str, path: &Path) -> Result<f64, HandlerError> {
    let raw = fs::read_to_string(path)?;
    raw.trim()
        .parse::<f64>()
        .map_err(|e| HandlerError::Communication {
            chip,
            desc: format!("{}: {:?} is not a number ({})", path.display(), raw.trim(), e),
        })
}

impl Board for SysfsBoard {
    fn open_bme280(&self, bus: Option<BusId>) -> Result<Box<dyn Bme280Handler>, HandlerError> {
        let bus = select_i2c_bus("BME280", bus)?;
        let dir = self.find_iio_device("BME280", BME280_DRIVER_NAMES, bus, BME280_ADDRESS)?;
        info!("BME280 opened on I2C bus {}", bus);
        Ok(Box::new(IioBme280 { dir }))
    }

    fn open_tsl2561(&self, bus: Option<BusId>) -> Result<Box<dyn Tsl2561Handler>, HandlerError> {
        let bus = select_i2c_bus("TSL2561", bus)?;
        let dir = self.find_iio_device("TSL2561", TSL2561_DRIVER_NAMES, bus, TSL2561_ADDRESS)?;
        info!("TSL2561 opened on I2C bus {}", bus);
        Ok(Box::new(IioTsl2561 { dir }))
    }

    fn open_yl83(&self, bus: Option<BusId>) -> Result<Box<dyn Yl83Handler>, HandlerError> {
        if let Some(bus) = bus {
            return Err(HandlerError::InvalidBus {
                chip: "YL83",
                bus: bus.to_string(),
                desc: "YL83 is read over GPIO and takes no bus id".to_string(),
            });
        }

        let gpio = self.soc_gpio_base()? + YL83_GPIO;
        let gpio_root = self.root.join("class/gpio");
        let pin_dir = gpio_root.join(format!("gpio{}", gpio));
        if !pin_dir.exists() {
            fs::write(gpio_root.join("export"), gpio.to_string())?;
        }
        if !pin_dir.exists() {
            return Err(HandlerError::NotFound {
                chip: "YL83",
                desc: format!("GPIO {} was not exported", gpio),
            });
        }
        fs::write(pin_dir.join("direction"), "in")?;

        info!("YL83 opened on GPIO {}", gpio);
        Ok(Box::new(GpioYl83 {
            value: pin_dir.join("value"),
        }))
    }
}

struct IioBme280 {
    dir: PathBuf,
}

impl Bme280Handler for IioBme280 {
    fn read_temperature(&mut self) -> Result<f64, HandlerError> {
        // millidegrees Celsius
        Ok(read_attribute("BME280", &self.dir.join("in_temp_input"))? / 1000.0)
    }

    fn read_pressure(&mut self) -> Result<f64, HandlerError> {
        // kilopascals
        Ok(read_attribute("BME280", &self.dir.join("in_pressure_input"))? * 10.0)
    }

    fn read_humidity(&mut self) -> Result<f64, HandlerError> {
        // milli-percent
        Ok(read_attribute("BME280", &self.dir.join("in_humidityrelative_input"))? / 1000.0)
    }
}

struct IioTsl2561 {
    dir: PathBuf,
}

impl Tsl2561Handler for IioTsl2561 {
    fn read_full_spectrum(&mut self) -> Result<f64, HandlerError> {
        read_attribute("TSL2561", &self.dir.join("in_intensity_both_raw"))
    }

    fn read_infrared(&mut self) -> Result<f64, HandlerError> {
        read_attribute("TSL2561", &self.dir.join("in_intensity_ir_raw"))
    }
}

struct GpioYl83 {
    value: PathBuf,
}

impl Yl83Handler for GpioYl83 {
    fn read_precipitation(&mut self) -> Result<bool, HandlerError> {
        // Output is pulled low while the plate is wet
        match fs::read_to_string(&self.value)?.trim() {
            "0" => Ok(true),
            "1" => Ok(false),
            other => Err(HandlerError::Communication {
                chip: "YL83",
                desc: format!("unexpected GPIO value {:?}", other),
            }),
        }
    }
}
