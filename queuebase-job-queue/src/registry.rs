//! Immutable registry of jobs exposed by the gateway.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use serde::ser::{Serialize, SerializeMap, Serializer};
use serde_json::Value;

use crate::error::JobQueueError;
use crate::executor::JobExecutor;
use crate::types::JobConfig;

/// A registered job: its public configuration plus the handler that runs it.
#[derive(Clone)]
pub struct JobDefinition {
    config: JobConfig,
    handler: Arc<dyn JobExecutor>,
}

impl fmt::Debug for JobDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JobDefinition")
            .field("config", &self.config)
            .field("handler", &"<dyn JobExecutor>")
            .finish()
    }
}

impl JobDefinition {
    pub fn new<E: JobExecutor + 'static>(config: JobConfig, handler: E) -> Self {
        Self::from_shared(config, Arc::new(handler))
    }

    pub fn from_shared(config: JobConfig, handler: Arc<dyn JobExecutor>) -> Self {
        Self { config, handler }
    }

    #[inline]
    pub fn config(&self) -> &JobConfig {
        &self.config
    }

    #[inline]
    pub fn handler(&self) -> Arc<dyn JobExecutor> {
        Arc::clone(&self.handler)
    }
}

/// Name to [`JobDefinition`] mapping, fixed at construction.
///
/// Cloning is cheap; all clones share the same definitions. Names iterate in
/// ascending byte order so listings are stable across calls.
#[derive(Clone, Default)]
pub struct JobRegistry {
    jobs: Arc<BTreeMap<String, JobDefinition>>,
}

impl fmt::Debug for JobRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JobRegistry")
            .field("jobs", &self.jobs.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl JobRegistry {
    pub fn builder() -> JobRegistryBuilder {
        JobRegistryBuilder::default()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> + '_ {
        self.jobs.keys().map(String::as_str)
    }

    #[inline]
    pub fn get(&self, name: &str) -> Option<&JobDefinition> {
        self.jobs.get(name)
    }

    #[inline]
    pub fn contains(&self, name: &str) -> bool {
        self.jobs.contains_key(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &JobDefinition)> + '_ {
        self.jobs.iter().map(|(name, def)| (name.as_str(), def))
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }

    /// Project every job into its public listing form.
    pub fn listing(&self) -> Vec<JobListingEntry<'_>> {
        self.iter()
            .map(|(name, def)| JobListingEntry {
                name,
                config: def.config(),
            })
            .collect()
    }
}

/// Collects job definitions and validates them into a [`JobRegistry`].
///
/// Errors are deferred to [`JobRegistryBuilder::build`] so registrations can
/// be chained.
#[derive(Default)]
pub struct JobRegistryBuilder {
    jobs: BTreeMap<String, JobDefinition>,
    error: Option<JobQueueError>,
}

impl JobRegistryBuilder {
    /// Register a job. `config` must be a JSON object.
    pub fn job<E: JobExecutor + 'static>(
        self,
        name: impl Into<String>,
        config: Value,
        handler: E,
    ) -> Self {
        self.shared_job(name, config, Arc::new(handler))
    }

    /// Register a job whose handler is already behind an `Arc`.
    pub fn shared_job(
        mut self,
        name: impl Into<String>,
        config: Value,
        handler: Arc<dyn JobExecutor>,
    ) -> Self {
        if self.error.is_some() {
            return self;
        }

        let name = name.into();
        let config = match config {
            Value::Object(map) => map,
            Value::Null => JobConfig::new(),
            other => {
                self.error = Some(JobQueueError::InvalidConfig {
                    name,
                    reason: format!("expected a JSON object, got {}", json_kind(&other)),
                });
                return self;
            }
        };

        if self.jobs.contains_key(&name) {
            self.error = Some(JobQueueError::DuplicateJob(name));
            return self;
        }

        self.jobs
            .insert(name, JobDefinition::from_shared(config, handler));
        self
    }

    pub fn build(self) -> Result<JobRegistry, JobQueueError> {
        match self.error {
            Some(err) => Err(err),
            None => Ok(JobRegistry {
                jobs: Arc::new(self.jobs),
            }),
        }
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Listing projection of a job: `{ "name": ..., ...config }`.
///
/// `name` is always the first key. A `name` key inside the config overrides
/// the registry key, matching object-spread semantics.
#[derive(Debug, Clone, Copy)]
pub struct JobListingEntry<'a> {
    pub name: &'a str,
    pub config: &'a JobConfig,
}

impl Serialize for JobListingEntry<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let overridden = self.config.get("name");
        let len = self.config.len() + usize::from(overridden.is_none());
        let mut map = serializer.serialize_map(Some(len))?;

        match overridden {
            Some(value) => map.serialize_entry("name", value)?,
            None => map.serialize_entry("name", self.name)?,
        }
        for (key, value) in self.config.iter().filter(|(key, _)| key.as_str() != "name") {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}
