//! Fake sysfs trees for driving `SysfsBoard` in integration tests

use std::fs;
use std::os::unix::fs::symlink;
use std::path::Path;
use tempfile::TempDir;

/// Register an IIO device for I2C `client` (e.g. `1-0077`) under `root`
pub fn add_iio_device(root: &Path, index: u32, name: &str, client: &str, attrs: &[(&str, &str)]) {
    let bus = client.split('-').next().unwrap();
    let real = root
        .join("devices/platform/soc/fe804000.i2c")
        .join(format!("i2c-{}", bus))
        .join(client)
        .join(format!("iio:device{}", index));
    fs::create_dir_all(&real).unwrap();
    fs::write(real.join("name"), format!("{}\n", name)).unwrap();
    for (attr, value) in attrs {
        fs::write(real.join(attr), format!("{}\n", value)).unwrap();
    }

    let devices = root.join("bus/iio/devices");
    fs::create_dir_all(&devices).unwrap();
    symlink(&real, devices.join(format!("iio:device{}", index))).unwrap();
}

/// Exported GPIO 26 holding `value`
pub fn add_rain_pin(root: &Path, value: &str) {
    let pin = root.join("class/gpio/gpio26");
    fs::create_dir_all(&pin).unwrap();
    fs::write(pin.join("value"), value).unwrap();
    fs::write(pin.join("direction"), "in").unwrap();
}

/// A weather station with all three boards on I2C bus 1
pub fn weather_station() -> TempDir {
    let tmp = TempDir::new().unwrap();
    add_iio_device(
        tmp.path(),
        0,
        "bme280",
        "1-0077",
        &[
            ("in_temp_input", "20000"),
            ("in_pressure_input", "100"),
            ("in_humidityrelative_input", "50000"),
        ],
    );
    add_iio_device(
        tmp.path(),
        1,
        "tsl2561",
        "1-0029",
        &[("in_intensity_both_raw", "640"), ("in_intensity_ir_raw", "120")],
    );
    add_rain_pin(tmp.path(), "0\n");
    tmp
}
