/// Adapter factory: the fixed identifier -> constructor registry and the process-wide singleton
use log::info;
use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use crate::adapters::{bme280, tsl2561, yl83, Bme280Adapter, SensorAdapter, Tsl2561Adapter, Yl83Adapter};
use crate::error::{Error, Result};
use crate::hardware::Board;

type Constructor = Box<dyn Fn() -> Box<dyn SensorAdapter> + Send + Sync>;

/// Ordered, immutable mapping from sensor identifier to adapter constructor
pub struct Registry {
    entries: Vec<(&'static str, Constructor)>,
}

impl Registry {
    /// The weather station's sensors, wired to `board`
    pub fn standard(board: Arc<dyn Board>) -> Self {
        let bme = board.clone();
        let tsl = board.clone();
        let yl = board;
        Registry::builder()
            .register(bme280::NAME, move || Box::new(Bme280Adapter::new(bme.clone())))
            .register(tsl2561::NAME, move || Box::new(Tsl2561Adapter::new(tsl.clone())))
            .register(yl83::NAME, move || Box::new(Yl83Adapter::new(yl.clone())))
            .build()
    }

    pub fn builder() -> RegistryBuilder {
        RegistryBuilder {
            entries: Vec::new(),
        }
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.entries.iter().map(|(name, _)| *name).collect()
    }
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registry")
            .field("names", &self.names())
            .finish()
    }
}

pub struct RegistryBuilder {
    entries: Vec<(&'static str, Constructor)>,
}

impl RegistryBuilder {
    /// Add a constructor; registering a name twice replaces the constructor in place
    pub fn register<F>(mut self, name: &'static str, constructor: F) -> Self
    where
        F: Fn() -> Box<dyn SensorAdapter> + Send + Sync + 'static,
    {
        match self.entries.iter_mut().find(|(n, _)| *n == name) {
            Some(entry) => entry.1 = Box::new(constructor),
            None => self.entries.push((name, Box::new(constructor))),
        }
        self
    }

    pub fn build(self) -> Registry {
        Registry {
            entries: self.entries,
        }
    }
}

/// Counts factory constructions over the process lifetime
pub(crate) struct InstanceCounter(AtomicUsize);

impl InstanceCounter {
    pub(crate) const fn new() -> Self {
        InstanceCounter(AtomicUsize::new(0))
    }

    /// Take the only slot, or report how many instances already exist
    fn claim(&self) -> Result<()> {
        self.0
            .compare_exchange(0, 1, Ordering::AcqRel, Ordering::Acquire)
            .map(|_| ())
            .map_err(|existing| Error::TooManyFactories { existing })
    }
}

// Zero at process start, never reset
static FACTORIES: InstanceCounter = InstanceCounter::new();

/// Produces sensor adapters; at most one may be constructed per process.
///
/// The limit applies to factories only. Any number of adapters, including
/// several of the same kind, can be produced through the one factory.
#[derive(Debug)]
pub struct AdapterFactory {
    registry: Registry,
}

impl AdapterFactory {
    pub fn new(registry: Registry) -> Result<Self> {
        Self::new_in(&FACTORIES, registry)
    }

    pub(crate) fn new_in(counter: &InstanceCounter, registry: Registry) -> Result<Self> {
        info!("Reader factory initialization...");
        counter.claim()?;
        info!("Reader factory initialized with {:?}", registry.names());
        Ok(AdapterFactory { registry })
    }

    /// A fresh, uninitialized adapter for `name`
    pub fn get_adapter(&self, name: &str) -> Result<Box<dyn SensorAdapter>> {
        self.registry
            .entries
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(_, constructor)| constructor())
            .ok_or_else(|| Error::UnknownAdapter {
                name: name.to_string(),
            })
    }

    /// One fresh, uninitialized adapter per registered sensor, in registry order
    pub fn get_all_adapters(&self) -> Vec<Box<dyn SensorAdapter>> {
        self.registry
            .entries
            .iter()
            .map(|(_, constructor)| constructor())
            .collect()
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.registry.names()
    }
}
