//! Instance file loading.

use anyhow::{bail, Context, Result};
use chargestop_model::{InstanceData, ProblemInstance};
use std::fs;
use std::path::Path;

/// Supported instance encodings, chosen by file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputFormat {
    Toml,
    Json,
}

impl InputFormat {
    pub fn detect(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "toml" => Some(InputFormat::Toml),
            "json" => Some(InputFormat::Json),
            _ => None,
        }
    }
}

/// Read raw instance data from a TOML or JSON file.
pub fn load_instance_data(path: &Path) -> Result<InstanceData> {
    let Some(format) = InputFormat::detect(path) else {
        bail!(
            "Unable to determine format for '{}'. Use a .toml or .json instance file.",
            path.display()
        );
    };
    let text = fs::read_to_string(path)
        .with_context(|| format!("reading instance file: {}", path.display()))?;

    let data = match format {
        InputFormat::Toml => toml::from_str(&text).context("parsing instance TOML")?,
        InputFormat::Json => serde_json::from_str(&text).context("parsing instance JSON")?,
    };
    Ok(data)
}

/// Read and validate an instance.
pub fn load_instance(path: &Path) -> Result<ProblemInstance> {
    let data = load_instance_data(path)?;
    let instance = ProblemInstance::from_data(&data)
        .with_context(|| format!("validating instance {}", path.display()))?;
    Ok(instance)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    const TOML_INSTANCE: &str = r#"
min_soc_percent = 10.0
route_length = 130.0
station_count = 1
nonstop_time = 100.0
battery_capacity = 100.0
initial_energy = 50.0
breakpoint_percent = 80.0
slope_percent = 25.0

[[stations]]
order = 1
energy_to_reach = 40.0
time_to_reach = 30.0
power_kw = 50.0
cost_per_unit = 0.4
"#;

    #[test]
    fn detect_format_by_extension() {
        assert_eq!(InputFormat::detect(&PathBuf::from("a.toml")), Some(InputFormat::Toml));
        assert_eq!(InputFormat::detect(&PathBuf::from("a.JSON")), Some(InputFormat::Json));
        assert_eq!(InputFormat::detect(&PathBuf::from("a.csv")), None);
        assert_eq!(InputFormat::detect(&PathBuf::from("noext")), None);
    }

    #[test]
    fn load_toml_instance() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("route.toml");
        fs::write(&path, TOML_INSTANCE).unwrap();

        let instance = load_instance(&path).unwrap();
        assert_eq!(instance.station_count(), 1);
        assert!((instance.min_soc_fraction() - 0.1).abs() < 1e-12);
        assert!((instance.reserve_energy() - 10.0).abs() < 1e-12);
    }

    #[test]
    fn json_and_toml_agree() {
        let data: InstanceData = toml::from_str(TOML_INSTANCE).unwrap();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("route.json");
        fs::write(&path, serde_json::to_string(&data).unwrap()).unwrap();

        assert_eq!(load_instance_data(&path).unwrap(), data);
    }

    #[test]
    fn reject_invalid_instance() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("route.toml");
        fs::write(&path, TOML_INSTANCE.replace("station_count = 1", "station_count = 2")).unwrap();

        let err = load_instance(&path).unwrap_err();
        assert!(format!("{err:#}").contains("station count mismatch"));
    }
}
