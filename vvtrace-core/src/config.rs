//! Configuration for trace matrix runs

use std::path::{
    Path,
    PathBuf,
};

use serde::{
    Deserialize,
    Serialize,
};

use crate::{
    error::{
        TraceError,
        TraceResult,
    },
    trace::TestMethod,
};

/// File names searched for a configuration file, in order
pub const CONFIG_FILE_NAMES: [&str; 3] = ["vvtrace.toml", ".vvtrace.toml", ".config/vvtrace.toml"];

/// Trace matrix run settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TraceConfig {
    /// Prefix of product requirement ids
    pub prd_prefix:          String,
    /// Prefix of system requirement ids
    pub srs_prefix:          String,
    /// Export normalizer and builder rejects in the error log
    pub include_filtered:    bool,
    /// Test name prefixes that mark a test as part of the trace
    pub domain_prefixes:     DomainPrefixes,
    /// Longest test name that is still too short to count as a real test;
    /// a name needs more than this many characters
    pub short_test_name_len: usize,
}

impl Default for TraceConfig {
    fn default() -> Self {
        Self {
            prd_prefix:          "US".to_string(),
            srs_prefix:          "TC".to_string(),
            include_filtered:    true,
            domain_prefixes:     DomainPrefixes::default(),
            short_test_name_len: 5,
        }
    }
}

/// Accepted test name prefixes per execution method
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DomainPrefixes {
    /// Prefixes of manual as-run test names
    pub manual:    Vec<String>,
    /// Prefixes of automated test names
    pub automatic: Vec<String>,
}

impl Default for DomainPrefixes {
    fn default() -> Self {
        Self {
            manual:    vec!["PRD".to_string(), "SRS".to_string()],
            automatic: vec!["TC".to_string(), "ES".to_string()],
        }
    }
}

impl DomainPrefixes {
    /// Prefixes accepted for `method`
    pub fn for_method(&self, method: TestMethod) -> &[String] {
        match method {
            TestMethod::Manual => &self.manual,
            TestMethod::Automatic => &self.automatic,
        }
    }

    /// Whether `test_name` starts with one of the prefixes for `method`
    pub fn accepts(&self, method: TestMethod, test_name: &str) -> bool {
        self.for_method(method)
            .iter()
            .any(|prefix| test_name.starts_with(prefix.as_str()))
    }
}

impl TraceConfig {
    /// Load configuration from a TOML file
    pub fn load(path: &Path) -> TraceResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            TraceError::Config(format!(
                "Failed to read config file {}: {}",
                path.display(),
                e
            ))
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| {
            TraceError::Config(format!(
                "Failed to parse config file {}: {}",
                path.display(),
                e
            ))
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Find the first configuration file under `root`
    pub fn discover(root: &Path) -> Option<PathBuf> {
        CONFIG_FILE_NAMES
            .iter()
            .map(|name| root.join(name))
            .find(|path| path.is_file())
    }

    /// Load the configuration found under `root`, or the defaults
    pub fn load_or_default(root: &Path) -> TraceResult<Self> {
        match Self::discover(root) {
            Some(path) => Self::load(&path),
            None => Ok(Self::default()),
        }
    }

    /// Reject settings no run can work with
    pub fn validate(&self) -> TraceResult<()> {
        if self.prd_prefix.trim().is_empty() {
            return Err(TraceError::Config("prd_prefix must not be empty".to_string()));
        }
        if self.srs_prefix.trim().is_empty() {
            return Err(TraceError::Config("srs_prefix must not be empty".to_string()));
        }
        if self.prd_prefix == self.srs_prefix {
            return Err(TraceError::Config(format!(
                "prd_prefix and srs_prefix must differ (both '{}')",
                self.prd_prefix
            )));
        }

        for (method, prefixes) in [
            (TestMethod::Manual, &self.domain_prefixes.manual),
            (TestMethod::Automatic, &self.domain_prefixes.automatic),
        ] {
            if prefixes.is_empty() || prefixes.iter().any(|p| p.is_empty()) {
                return Err(TraceError::Config(format!(
                    "{} domain prefixes must be a non-empty list of non-empty prefixes",
                    method
                )));
            }
        }

        Ok(())
    }
}
