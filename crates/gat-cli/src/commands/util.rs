use std::path::Path;

use anyhow::{Context, Result};
use gat_kpi::KpiConfig;

pub fn parse_partitions(spec: Option<&String>) -> Vec<String> {
    spec.map_or("", String::as_str)
        .split(',')
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

/// Configuration from `path`, or the defaults when no file is given.
pub fn load_config(path: Option<&Path>) -> Result<KpiConfig> {
    match path {
        Some(path) => KpiConfig::from_path(path)
            .with_context(|| format!("loading config '{}'", path.display())),
        None => Ok(KpiConfig::default()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partitions_are_trimmed_and_filtered() {
        let spec = " side, ,quantity ".to_string();
        assert_eq!(parse_partitions(Some(&spec)), vec!["side", "quantity"]);
        assert!(parse_partitions(None).is_empty());
    }

    #[test]
    fn missing_config_path_uses_defaults() {
        let config = load_config(None).unwrap();
        assert_eq!(config.reference_bus, 1);
    }
}
