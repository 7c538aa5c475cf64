use std::collections::HashSet;
use std::fmt;

use serde::Deserialize;

use avgpulse_core::datum::qualified_namespace;
use avgpulse_core::error::{AvgPulseError, Result};
use avgpulse_core::CounterArgs;

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AgentConfig {
    pub version: u32,

    pub backend: BackendSection,

    #[serde(default)]
    pub counters: Vec<CounterConfig>,
}

impl AgentConfig {
    pub fn validate(&self) -> Result<()> {
        if self.version != 1 {
            return Err(AvgPulseError::UnsupportedVersion);
        }

        self.backend.validate()?;

        let mut seen = HashSet::new();
        for c in &self.counters {
            c.args()?;
            if !seen.insert(c.name.as_str()) {
                return Err(AvgPulseError::Config(format!(
                    "duplicate counter name: {}",
                    c.name
                )));
            }
        }

        Ok(())
    }
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BackendSection {
    #[serde(default = "default_region")]
    pub region: String,

    #[serde(default)]
    pub access_key_id: Option<String>,

    #[serde(default)]
    pub secret_access_key: Option<String>,

    pub namespace: String,
}

impl BackendSection {
    /// Backend section with the default region and no credentials.
    pub fn with_namespace(namespace: impl Into<String>) -> Self {
        Self {
            region: default_region(),
            access_key_id: None,
            secret_access_key: None,
            namespace: namespace.into(),
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.namespace.trim().is_empty() {
            return Err(AvgPulseError::Config(
                "backend.namespace must not be empty".into(),
            ));
        }
        if self.region.trim().is_empty() {
            return Err(AvgPulseError::Config("backend.region must not be empty".into()));
        }
        if self.access_key_id.is_some() != self.secret_access_key.is_some() {
            return Err(AvgPulseError::Config(
                "backend.access_key_id and backend.secret_access_key must be set together".into(),
            ));
        }
        Ok(())
    }

    pub fn has_credentials(&self) -> bool {
        self.access_key_id.is_some() && self.secret_access_key.is_some()
    }

    /// Namespace as sent to the sink (`AverageCounter/<namespace>`).
    pub fn qualified_namespace(&self) -> String {
        qualified_namespace(&self.namespace)
    }
}

// Keep the secret out of logs.
impl fmt::Debug for BackendSection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BackendSection")
            .field("region", &self.region)
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &self.secret_access_key.as_ref().map(|_| "<redacted>"))
            .field("namespace", &self.namespace)
            .finish()
    }
}

fn default_region() -> String {
    "eu-central-1".into()
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CounterConfig {
    pub name: String,
    #[serde(default)]
    pub pulse_secs: f64,
    #[serde(default)]
    pub silent: bool,
}

impl CounterConfig {
    pub fn args(&self) -> Result<CounterArgs> {
        CounterArgs::new(&self.name, Some(self.pulse_secs), Some(self.silent))
    }
}
