//! Reader: drives initialization and burst sampling across every adapter.
//!
//! A reader moves through `Uninitialized -> ReadersAcquired ->
//! ReadersInitialized -> DataCollected`. Steps are expected in that order;
//! sampling adapters that were never initialized panics inside the adapter.

use log::{debug, info};
use std::collections::HashMap;
use std::thread;
use std::time::Duration;

use crate::adapters::SensorAdapter;
use crate::error::{Error, Result};
use crate::factory::{AdapterFactory, Registry};
use crate::models::{InitArgs, MeasurementMap};
use crate::utils::merge_into;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReaderState {
    Uninitialized,
    ReadersAcquired,
    ReadersInitialized,
    DataCollected,
}

pub struct Reader {
    factory: AdapterFactory,
    readers: Vec<Box<dyn SensorAdapter>>,
    init_args: HashMap<String, InitArgs>,
    data: MeasurementMap,
    state: ReaderState,
}

impl Reader {
    /// Build a reader around the process's adapter factory.
    ///
    /// Fails with `TooManyFactories` if a factory was already constructed in
    /// this process, so at most one reader can exist.
    pub fn new(registry: Registry) -> Result<Self> {
        Self::from_factory(AdapterFactory::new(registry)?)
    }

    #[cfg(test)]
    pub(crate) fn new_in(counter: &crate::factory::InstanceCounter, registry: Registry) -> Result<Self> {
        Self::from_factory(AdapterFactory::new_in(counter, registry)?)
    }

    fn from_factory(factory: AdapterFactory) -> Result<Self> {
        info!("Reader initialized");
        Ok(Reader {
            factory,
            readers: Vec::new(),
            init_args: HashMap::new(),
            data: MeasurementMap::new(),
            state: ReaderState::Uninitialized,
        })
    }

    pub fn state(&self) -> ReaderState {
        self.state
    }

    pub fn readers(&self) -> &[Box<dyn SensorAdapter>] {
        &self.readers
    }

    /// Arguments passed to the named adapter by `initialize_readers`.
    ///
    /// Adapters without an entry are initialized with `InitArgs::NoArgs`.
    /// Names the factory does not know are refused with `UnknownAdapter`.
    pub fn set_init_args(&mut self, name: &str, args: InitArgs) -> Result<()> {
        if !self.factory.names().iter().any(|known| *known == name) {
            return Err(Error::UnknownAdapter {
                name: name.to_string(),
            });
        }
        self.init_args.insert(name.to_string(), args);
        Ok(())
    }

    /// Replace the held adapters with a fresh set from the factory
    pub fn acquire_readers(&mut self) {
        self.readers = self.factory.get_all_adapters();
        self.state = ReaderState::ReadersAcquired;
        info!("Got readers: {:?}", self.factory.names());
    }

    /// Initialize every held adapter in acquisition order.
    ///
    /// The first failure is returned as is; adapters initialized before it
    /// stay initialized.
    pub fn initialize_readers(&mut self) -> Result<()> {
        for reader in self.readers.iter_mut() {
            let args = self.init_args.get(reader.name()).copied().unwrap_or_default();
            reader.initialize(args)?;
        }

        self.state = ReaderState::ReadersInitialized;
        info!("Initialized readers");
        Ok(())
    }

    /// Sample every adapter `repetitions` times and return the merged averages.
    ///
    /// Each sample is followed by a blocking sleep of `delay` seconds so the
    /// sensors can settle. Averages of later adapters overwrite colliding
    /// channels of earlier ones. The returned map is a copy.
    pub fn collect(&mut self, repetitions: i64, delay: f64) -> Result<MeasurementMap> {
        let repetitions = u64::try_from(repetitions).map_err(|_| Error::InvalidParameter {
            name: "repetitions",
            value: repetitions.to_string(),
        })?;
        let pause = validate_delay(delay)?;

        for reader in self.readers.iter_mut() {
            for _ in 0..repetitions {
                reader.sample_once()?;
                thread::sleep(pause);
            }

            let averaged = reader.get_averaged();
            debug!("{} averaged: {:?}", reader.name(), averaged);
            merge_into(&mut self.data, averaged);
        }

        self.state = ReaderState::DataCollected;
        info!("Got data: {:?}", self.data);
        Ok(self.data.clone())
    }

    /// Acquire fresh adapters, initialize them and run one sampling burst.
    ///
    /// Every burst starts from new adapters, so a handler that failed in an
    /// earlier burst is reopened here.
    pub fn run_burst(&mut self, repetitions: i64, delay: f64) -> Result<MeasurementMap> {
        self.acquire_readers();
        self.initialize_readers()?;
        self.collect(repetitions, delay)
    }

    /// Copy of everything collected so far
    pub fn data(&self) -> MeasurementMap {
        self.data.clone()
    }
}

fn validate_delay(delay: f64) -> Result<Duration> {
    let invalid = || Error::InvalidParameter {
        name: "delay",
        value: delay.to_string(),
    };

    if !delay.is_finite() || delay < 0.0 {
        return Err(invalid());
    }
    Duration::try_from_secs_f64(delay).map_err(|_| invalid())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::testing::StubBoard;
    use crate::factory::InstanceCounter;
    use crate::hardware::HandlerError;
    use crate::models::{BusId, SampleBuffer};
    use std::sync::atomic::Ordering;
    use std::sync::Arc;
    use std::time::Instant;

    /// Adapter that reports fixed values for its channels
    struct FixedAdapter {
        name: &'static str,
        values: Vec<(&'static str, f64)>,
        buffer: SampleBuffer,
        initialized: bool,
    }

    impl FixedAdapter {
        fn new(name: &'static str, values: Vec<(&'static str, f64)>) -> Self {
            let channels: Vec<_> = values.iter().map(|(c, _)| *c).collect();
            FixedAdapter {
                name,
                values,
                buffer: SampleBuffer::new(&channels),
                initialized: false,
            }
        }
    }

    impl SensorAdapter for FixedAdapter {
        fn name(&self) -> &'static str {
            self.name
        }

        fn initialize(&mut self, _args: InitArgs) -> Result<()> {
            self.initialized = true;
            Ok(())
        }

        fn sample_once(&mut self) -> Result<()> {
            assert!(self.initialized, "sampled before initialization");
            for (channel, value) in &self.values {
                self.buffer.push(channel, *value);
            }
            Ok(())
        }

        fn buffer(&self) -> &SampleBuffer {
            &self.buffer
        }
    }

    fn ready(counter: &InstanceCounter, registry: Registry) -> Reader {
        let mut reader = Reader::new_in(counter, registry).unwrap();
        reader.acquire_readers();
        reader.initialize_readers().unwrap();
        reader
    }

    #[test]
    fn constant_board_averages_to_its_constants() {
        static COUNTER: InstanceCounter = InstanceCounter::new();
        let registry = Registry::builder()
            .register("BME280", || {
                Box::new(crate::adapters::Bme280Adapter::new(Arc::new(StubBoard::constant())))
            })
            .build();

        let mut reader = ready(&COUNTER, registry);
        let data = reader.collect(3, 0.0).unwrap();

        let expected: MeasurementMap = [("temperature", 20.0), ("pressure", 1000.0), ("humidity", 50.0)]
            .into_iter()
            .map(|(k, v)| (k.to_string(), v))
            .collect();
        assert_eq!(data, expected);
        assert_eq!(reader.state(), ReaderState::DataCollected);
    }

    #[test]
    fn adapters_are_merged_into_one_map() {
        static COUNTER: InstanceCounter = InstanceCounter::new();
        let registry = Registry::builder()
            .register("AB", || Box::new(FixedAdapter::new("AB", vec![("a", 1.0), ("b", 2.0)])))
            .register("C", || Box::new(FixedAdapter::new("C", vec![("c", 3.0)])))
            .build();

        let mut reader = ready(&COUNTER, registry);
        let data = reader.collect(2, 0.0).unwrap();

        assert_eq!(data.len(), 3);
        assert_eq!(data["a"], 1.0);
        assert_eq!(data["b"], 2.0);
        assert_eq!(data["c"], 3.0);
        for adapter in reader.readers() {
            assert!(adapter.buffer().iter().all(|(_, s)| s.len() == 2));
        }
    }

    #[test]
    fn colliding_channels_keep_the_last_adapter() {
        static COUNTER: InstanceCounter = InstanceCounter::new();
        let registry = Registry::builder()
            .register("first", || Box::new(FixedAdapter::new("first", vec![("x", 1.0)])))
            .register("second", || Box::new(FixedAdapter::new("second", vec![("x", 9.0)])))
            .build();

        let mut reader = ready(&COUNTER, registry);
        assert_eq!(reader.collect(1, 0.0).unwrap()["x"], 9.0);
    }

    #[test]
    fn zero_repetitions_never_touch_the_handlers() {
        static COUNTER: InstanceCounter = InstanceCounter::new();
        let board = Arc::new(StubBoard::constant());
        let mut reader = ready(&COUNTER, Registry::standard(board.clone()));

        let data = reader.collect(0, 0.0).unwrap();

        assert_eq!(board.reads.load(Ordering::SeqCst), 0);
        assert_eq!(data.len(), 5);
        assert!(data.values().all(|v| *v == 0.0));
    }

    #[test]
    fn malformed_parameters_are_rejected() {
        static COUNTER: InstanceCounter = InstanceCounter::new();
        let mut reader = ready(&COUNTER, Registry::standard(Arc::new(StubBoard::constant())));

        match reader.collect(-1, 0.1) {
            Err(Error::InvalidParameter { name, value }) => {
                assert_eq!(name, "repetitions");
                assert_eq!(value, "-1");
            }
            other => panic!("unexpected {:?}", other),
        }
        for delay in [-1.0, f64::NAN, f64::INFINITY] {
            assert!(matches!(
                reader.collect(5, delay),
                Err(Error::InvalidParameter { name: "delay", .. })
            ));
        }
        assert_eq!(reader.state(), ReaderState::ReadersInitialized);
    }

    #[test]
    fn every_sample_is_followed_by_the_delay() {
        static COUNTER: InstanceCounter = InstanceCounter::new();
        let registry = Registry::builder()
            .register("A", || Box::new(FixedAdapter::new("A", vec![("a", 1.0)])))
            .register("B", || Box::new(FixedAdapter::new("B", vec![("b", 1.0)])))
            .build();
        let mut reader = ready(&COUNTER, registry);

        let started = Instant::now();
        reader.collect(2, 0.025).unwrap();
        assert!(started.elapsed() >= Duration::from_millis(100));
    }

    #[test]
    fn returned_map_is_a_snapshot() {
        static COUNTER: InstanceCounter = InstanceCounter::new();
        let registry = Registry::builder()
            .register("C", || Box::new(FixedAdapter::new("C", vec![("c", 3.0)])))
            .build();
        let mut reader = ready(&COUNTER, registry);

        let mut data = reader.collect(1, 0.0).unwrap();
        data.insert("c".to_string(), -1.0);
        data.insert("injected".to_string(), 0.0);

        assert_eq!(reader.data().len(), 1);
        assert_eq!(reader.data()["c"], 3.0);
    }

    #[test]
    fn first_initialization_failure_aborts() {
        static COUNTER: InstanceCounter = InstanceCounter::new();
        let board = Arc::new(StubBoard::constant());
        let mut reader = Reader::new_in(&COUNTER, Registry::standard(board.clone())).unwrap();
        reader.set_init_args("BME280", InitArgs::BusId(BusId(0))).unwrap();
        reader.set_init_args("TSL2561", InitArgs::NamedBusId(BusId(4))).unwrap();
        reader.acquire_readers();

        match reader.initialize_readers() {
            Err(Error::Handler(HandlerError::InvalidBus { chip, .. })) => assert_eq!(chip, "TSL2561"),
            other => panic!("unexpected {:?}", other),
        }

        // BME280 was opened before the failure, YL83 never was
        let opened = board.opened.lock().unwrap().clone();
        assert_eq!(
            opened,
            vec![("BME280", Some(BusId(0))), ("TSL2561", Some(BusId(4)))]
        );
        assert_eq!(reader.state(), ReaderState::ReadersAcquired);
    }

    #[test]
    fn handler_failure_aborts_the_burst() {
        static COUNTER: InstanceCounter = InstanceCounter::new();
        let board = StubBoard {
            fail_reads: true,
            ..StubBoard::constant()
        };
        let mut reader = ready(&COUNTER, Registry::standard(Arc::new(board)));

        assert!(matches!(
            reader.collect(3, 0.0),
            Err(Error::Handler(HandlerError::Communication { chip: "BME280", .. }))
        ));
        assert!(reader.data().is_empty());
    }

    #[test]
    fn acquiring_again_replaces_the_adapters() {
        static COUNTER: InstanceCounter = InstanceCounter::new();
        let mut reader = ready(&COUNTER, Registry::standard(Arc::new(StubBoard::constant())));
        reader.collect(2, 0.0).unwrap();

        reader.acquire_readers();
        assert_eq!(reader.readers().len(), 3);
        assert!(reader
            .readers()
            .iter()
            .all(|r| r.buffer().iter().all(|(_, s)| s.is_empty())));
    }

    #[test]
    fn init_args_for_unregistered_sensors_are_refused() {
        static COUNTER: InstanceCounter = InstanceCounter::new();
        let board = Arc::new(StubBoard::constant());
        let mut reader = Reader::new_in(&COUNTER, Registry::standard(board.clone())).unwrap();

        match reader.set_init_args("BME208", InitArgs::BusId(BusId(0))) {
            Err(Error::UnknownAdapter { name }) => assert_eq!(name, "BME208"),
            other => panic!("unexpected {:?}", other),
        }
        reader.set_init_args("BME280", InitArgs::NamedBusId(BusId(0))).unwrap();

        reader.acquire_readers();
        reader.initialize_readers().unwrap();
        let opened = board.opened.lock().unwrap().clone();
        assert_eq!(opened[0], ("BME280", Some(BusId(0))));
    }

    #[test]
    fn a_failed_burst_does_not_poison_the_next_one() {
        static COUNTER: InstanceCounter = InstanceCounter::new();
        let board = Arc::new(StubBoard::constant());
        let mut reader = Reader::new_in(&COUNTER, Registry::standard(board.clone())).unwrap();

        reader.set_init_args("YL83", InitArgs::BusId(BusId(9))).unwrap();
        assert!(matches!(
            reader.run_burst(2, 0.0),
            Err(Error::Handler(HandlerError::InvalidBus { chip: "YL83", .. }))
        ));

        reader.set_init_args("YL83", InitArgs::NoArgs).unwrap();
        let data = reader.run_burst(2, 0.0).unwrap();
        assert_eq!(data["temperature"], 20.0);
        assert_eq!(data["precipitation"], 0.0);
        assert_eq!(reader.state(), ReaderState::DataCollected);
    }
}
