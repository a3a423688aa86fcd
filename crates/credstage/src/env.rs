use std::collections::HashMap;

/// Lookup seam for environment variables.
///
/// The materializer never reads ambient process state directly; callers inject
/// a source, which keeps the operation testable without mutating the real
/// process environment.
pub trait EnvSource {
    /// Returns the value of `name`, or `None` when it is unset.
    fn get(&self, name: &str) -> Option<String>;
}

/// Production source backed by the process environment.
#[derive(Debug, Default, Clone, Copy)]
pub struct ProcessEnv;

impl EnvSource for ProcessEnv {
    fn get(&self, name: &str) -> Option<String> {
        std::env::var(name).ok()
    }
}

/// Source backed by an explicit key-value map, for tests and embedding.
#[derive(Debug, Default, Clone)]
pub struct MapEnv {
    vars: HashMap<String, String>,
}

impl MapEnv {
    /// Construct an empty map source.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets `name` to `value`, returning the source for chaining.
    pub fn with(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.vars.insert(name.into(), value.into());
        self
    }
}

impl EnvSource for MapEnv {
    fn get(&self, name: &str) -> Option<String> {
        self.vars.get(name).cloned()
    }
}

impl FromIterator<(String, String)> for MapEnv {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self {
            vars: iter.into_iter().collect(),
        }
    }
}
