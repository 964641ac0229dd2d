use crate::{PluginModule, RegistryError, Result};
use std::collections::BTreeMap;
use std::fmt;

/// A location that can enumerate and load plugin candidates.
///
/// Loading a candidate may run arbitrary plugin code; sources are trusted.
pub trait PluginSource {
    /// Human readable description of where candidates come from.
    fn location(&self) -> String;

    /// Every candidate name at this location, hidden ones included.
    fn candidates(&self) -> Result<Vec<String>>;

    fn load(&self, candidate: &str) -> Result<PluginModule>;
}

type ModuleLoader = Box<dyn Fn() -> std::result::Result<PluginModule, String> + Send + Sync>;

/// Plugin modules linked into the binary, registered by name at startup.
pub struct StaticSource {
    label: String,
    modules: BTreeMap<String, ModuleLoader>,
}

impl StaticSource {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            modules: BTreeMap::new(),
        }
    }

    /// Register `loader` as candidate `name`; a loader error is a load failure.
    #[must_use]
    pub fn module<F>(mut self, name: impl Into<String>, loader: F) -> Self
    where
        F: Fn() -> std::result::Result<PluginModule, String> + Send + Sync + 'static,
    {
        self.modules.insert(name.into(), Box::new(loader));
        self
    }

    /// Register an already built module under its own name.
    #[must_use]
    pub fn with_module(self, module: PluginModule) -> Self {
        let name = module.name().to_string();
        self.module(name, move || Ok(module.clone()))
    }
}

impl PluginSource for StaticSource {
    fn location(&self) -> String {
        format!("static modules ({})", self.label)
    }

    fn candidates(&self) -> Result<Vec<String>> {
        Ok(self.modules.keys().cloned().collect())
    }

    fn load(&self, candidate: &str) -> Result<PluginModule> {
        let loader = self
            .modules
            .get(candidate)
            .ok_or_else(|| RegistryError::load(candidate, "no such module"))?;
        loader().map_err(|reason| RegistryError::load(candidate, reason))
    }
}

impl fmt::Debug for StaticSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StaticSource")
            .field("label", &self.label)
            .field("modules", &self.modules.keys().collect::<Vec<_>>())
            .finish()
    }
}
