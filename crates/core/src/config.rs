use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::CoreError;

/// Settings shared by the job binaries. Missing fields fall back to the
/// defaults, so a config file only needs the values it overrides.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct JobConfig {
    pub workers: usize,
    pub top_n: i64,
    pub report_metrics: bool,
}

impl Default for JobConfig {
    fn default() -> Self {
        Self { workers: 1, top_n: 5, report_metrics: true }
    }
}

impl JobConfig {
    pub fn from_json(text: &str) -> Result<Self, CoreError> {
        let cfg: Self = serde_json::from_str(text)?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn load(path: &Path) -> Result<Self, CoreError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json(&text)
    }

    pub fn validate(&self) -> Result<(), CoreError> {
        if self.workers == 0 {
            return Err(CoreError::Configuration("workers must be at least 1".to_string()));
        }
        if self.top_n <= 0 {
            return Err(CoreError::Configuration(format!(
                "top_n must be positive, got {}",
                self.top_n
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_json_keeps_defaults() {
        let cfg = JobConfig::from_json(r#"{ "top_n": 3 }"#).unwrap();
        assert_eq!(cfg, JobConfig { top_n: 3, ..JobConfig::default() });
    }

    #[test]
    fn invalid_values_are_rejected() {
        assert!(matches!(
            JobConfig::from_json(r#"{ "top_n": 0 }"#),
            Err(CoreError::Configuration(_))
        ));
        assert!(matches!(
            JobConfig::from_json(r#"{ "workers": 0 }"#),
            Err(CoreError::Configuration(_))
        ));
        assert!(matches!(JobConfig::from_json("{"), Err(CoreError::Serde(_))));
    }
}
