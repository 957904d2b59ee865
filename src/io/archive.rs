//! Region archives: producer definitions and demand curves on disk.
//!
//! An archive is a directory with the layout:
//!
//! ```text
//! archive/
//!   archive-info.yml     # area: nl
//!   demand.csv           # one demand value per line, one line per point
//!   producers/
//!     coal.yml
//!     wind.yml
//!     ...
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

use crate::model::{CostModel, Curve, Producer, Region};

/// Errors raised while reading a region archive.
#[derive(Debug, Error)]
pub enum ArchiveError {
    /// A file or directory could not be read.
    #[error("cannot read {path}: {source}")]
    Io {
        /// The offending path.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },
    /// A YAML file failed to parse.
    #[error("invalid YAML in {path}: {source}")]
    Yaml {
        /// The offending path.
        path: PathBuf,
        /// The underlying YAML error.
        #[source]
        source: serde_yaml::Error,
    },
    /// A CSV curve file failed to parse.
    #[error("invalid curve in {path}: {message}")]
    Curve {
        /// The offending path.
        path: PathBuf,
        /// What was wrong.
        message: String,
    },
    /// A definition is structurally valid but semantically wrong.
    #[error("{path}: {message}")]
    Invalid {
        /// The offending path.
        path: PathBuf,
        /// What was wrong.
        message: String,
    },
}

/// Archive metadata (`archive-info.yml`).
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ArchiveInfo {
    /// Region code, e.g. `nl`.
    area: String,
}

/// One producer definition (`producers/*.yml`).
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ProducerDef {
    key: String,
    #[serde(rename = "type")]
    kind: ProducerKind,
    marginal_costs: Option<f64>,
    cost_spread: Option<f64>,
    output_capacity_per_unit: Option<f64>,
    number_of_units: Option<f64>,
    #[serde(default = "default_availability")]
    availability: f64,
    /// CSV file with the production profile, relative to the archive
    /// directory. Required for always-on producers.
    production_curve: Option<String>,
}

fn default_availability() -> f64 {
    1.0
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "snake_case")]
enum ProducerKind {
    Dispatchable,
    AlwaysOn,
}

/// Loads a region archive from `dir`, validating every curve against the
/// `points`-long horizon.
///
/// # Errors
///
/// Returns an [`ArchiveError`] describing the offending file when any
/// part of the archive is missing or malformed.
pub fn load_region(dir: &Path, points: usize) -> Result<Region, ArchiveError> {
    let info_path = dir.join("archive-info.yml");
    let info: ArchiveInfo = read_yaml(&info_path)?;

    let mut region = Region::new(info.area, points);
    region.set_demand(read_curve(&dir.join("demand.csv"), points)?);

    for path in producer_files(&dir.join("producers"))? {
        let def: ProducerDef = read_yaml(&path)?;
        region.add_producer(build_producer(def, &path, dir, points)?);
    }

    Ok(region)
}

/// Reads a single-column CSV curve with one value per point.
///
/// # Errors
///
/// Fails when the file cannot be read, a field is not a number, or the
/// row count does not match `points`.
pub fn read_curve(path: &Path, points: usize) -> Result<Curve, ArchiveError> {
    let content = fs::read_to_string(path).map_err(|source| ArchiveError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let curve = parse_curve(&content, points).map_err(|message| ArchiveError::Curve {
        path: path.to_path_buf(),
        message,
    })?;

    Ok(curve)
}

fn parse_curve(content: &str, points: usize) -> Result<Curve, String> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .from_reader(content.as_bytes());

    let mut values = Vec::with_capacity(points);
    for (line, record) in reader.records().enumerate() {
        let record = record.map_err(|err| err.to_string())?;
        let field = record
            .get(0)
            .ok_or_else(|| format!("line {}: empty record", line + 1))?;
        let value: f64 = field
            .trim()
            .parse()
            .map_err(|_| format!("line {}: \"{field}\" is not a number", line + 1))?;
        values.push(value);
    }

    if values.len() != points {
        return Err(format!("has {} points, expected {points}", values.len()));
    }

    Ok(Curve::from_values(values))
}

fn read_yaml<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T, ArchiveError> {
    let content = fs::read_to_string(path).map_err(|source| ArchiveError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    serde_yaml::from_str(&content).map_err(|source| ArchiveError::Yaml {
        path: path.to_path_buf(),
        source,
    })
}

/// Lists producer definition files, sorted by name so that producer
/// insertion order (and therefore merit-order tie-breaking) is
/// deterministic across platforms.
fn producer_files(dir: &Path) -> Result<Vec<PathBuf>, ArchiveError> {
    let entries = fs::read_dir(dir).map_err(|source| ArchiveError::Io {
        path: dir.to_path_buf(),
        source,
    })?;

    let mut files = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|source| ArchiveError::Io {
            path: dir.to_path_buf(),
            source,
        })?;
        let path = entry.path();
        let is_yaml = path
            .extension()
            .is_some_and(|ext| ext == "yml" || ext == "yaml");
        if is_yaml {
            files.push(path);
        }
    }

    files.sort();
    Ok(files)
}

fn build_producer(
    def: ProducerDef,
    path: &Path,
    dir: &Path,
    points: usize,
) -> Result<Producer, ArchiveError> {
    let invalid = |message: String| ArchiveError::Invalid {
        path: path.to_path_buf(),
        message,
    };

    match def.kind {
        ProducerKind::AlwaysOn => {
            let file = def
                .production_curve
                .ok_or_else(|| invalid("always_on producer needs a production_curve".into()))?;
            let production = read_curve(&dir.join(file), points)?;
            Ok(Producer::always_on(def.key, production))
        }
        ProducerKind::Dispatchable => {
            let marginal_costs = def
                .marginal_costs
                .ok_or_else(|| invalid("dispatchable producer needs marginal_costs".into()))?;
            if !marginal_costs.is_finite() {
                return Err(invalid(format!(
                    "marginal_costs must be finite, got {marginal_costs}"
                )));
            }
            let per_unit = def.output_capacity_per_unit.ok_or_else(|| {
                invalid("dispatchable producer needs output_capacity_per_unit".into())
            })?;
            let units = def.number_of_units.unwrap_or(1.0);

            let cost = match def.cost_spread {
                Some(spread) => CostModel::function(marginal_costs, spread),
                None => CostModel::constant(marginal_costs),
            };

            Ok(Producer::dispatchable(
                def.key,
                cost,
                per_unit,
                units,
                def.availability,
                points,
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Role;

    fn def(yaml: &str) -> ProducerDef {
        serde_yaml::from_str(yaml).expect("definition parses")
    }

    fn build(yaml: &str, points: usize) -> Result<Producer, ArchiveError> {
        build_producer(def(yaml), Path::new("test.yml"), Path::new("."), points)
    }

    #[test]
    fn dispatchable_definition_builds() {
        let producer = build(
            "key: coal\n\
             type: dispatchable\n\
             marginal_costs: 23.5\n\
             output_capacity_per_unit: 740.0\n\
             number_of_units: 3\n\
             availability: 0.9\n",
            4,
        )
        .unwrap();

        assert_eq!(producer.key(), "coal");
        assert_eq!(producer.role(), Role::Dispatchable);
        assert!((producer.max_load_at(0) - 1998.0).abs() < 1e-9);
        assert!(!producer.cost().is_function());
    }

    #[test]
    fn cost_spread_makes_a_cost_function_producer() {
        let producer = build(
            "key: gas\n\
             type: dispatchable\n\
             marginal_costs: 20.0\n\
             cost_spread: 0.4\n\
             output_capacity_per_unit: 0.1\n\
             number_of_units: 10\n",
            1,
        )
        .unwrap();

        assert!(producer.cost().is_function());
        assert!((producer.cost_at_load(0.98, 0) - 23.84).abs() < 1e-9);
    }

    #[test]
    fn dispatchable_without_costs_is_invalid() {
        let err = build(
            "key: broken\n\
             type: dispatchable\n\
             output_capacity_per_unit: 1.0\n",
            1,
        )
        .unwrap_err();
        assert!(matches!(err, ArchiveError::Invalid { .. }));
    }

    #[test]
    fn non_finite_costs_are_rejected() {
        let err = build(
            "key: broken\n\
             type: dispatchable\n\
             marginal_costs: .nan\n\
             output_capacity_per_unit: 1.0\n",
            1,
        )
        .unwrap_err();
        assert!(matches!(err, ArchiveError::Invalid { .. }));
    }

    #[test]
    fn unknown_fields_are_rejected() {
        let result: Result<ProducerDef, _> = serde_yaml::from_str(
            "key: coal\n\
             type: dispatchable\n\
             marginal_costs: 1.0\n\
             output_capacity_per_unit: 1.0\n\
             bogus: true\n",
        );
        assert!(result.is_err());
    }

    #[test]
    fn curve_parses_one_value_per_line() {
        let curve = parse_curve("1.0\n2.5\n0.0\n", 3).unwrap();
        assert_eq!(curve.get(1), 2.5);
    }

    #[test]
    fn curve_with_wrong_length_is_rejected() {
        let err = parse_curve("1.0\n2.0\n", 3).unwrap_err();
        assert!(err.contains("expected 3"));
    }

    #[test]
    fn curve_with_garbage_is_rejected() {
        let err = parse_curve("1.0\nnope\n", 2).unwrap_err();
        assert!(err.contains("not a number"));
    }
}
