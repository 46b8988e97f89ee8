use std::sync::Arc;

use anyhow::{Context, Result, bail};
use countymander::{DistanceKind, PipelineConfig, Redistricter, UnitRegistry, write_assignments_csv, write_json};
use tracing::info;

use crate::cli::{Cli, DistanceArg, RedistrictArgs};

/// Merge the optional config file with command-line overrides.
pub fn build_config(args: &RedistrictArgs) -> Result<PipelineConfig> {
    let mut config = match &args.config {
        Some(path) => PipelineConfig::from_json_file(path)?,
        None => {
            let Some(districts) = args.districts else {
                bail!("[redistrict] --districts is required when no --config file is given");
            };
            PipelineConfig::new(districts)
        }
    };

    if let Some(districts) = args.districts { config.num_districts = districts }
    if let Some(deviation) = args.deviation { config.deviation = deviation }
    if let Some(secs) = args.time_limit { config.time_limit_secs = Some(secs) }
    if args.no_time_limit { config.time_limit_secs = None }
    if args.no_bounds { config.enforce_bounds = false }
    if let Some(distance) = args.distance {
        config.distance = match distance {
            DistanceArg::Uniform => DistanceKind::Uniform,
            DistanceArg::Haversine => DistanceKind::Haversine,
        };
    }

    Ok(config)
}

pub fn run(_cli: &Cli, args: &RedistrictArgs) -> Result<()> {
    let out_path = &args.output.clone().unwrap_or("./plan.csv".into());
    let config = build_config(args)?;

    info!("[redistrict] loading units from {}", args.units.display());
    let registry = Arc::new(UnitRegistry::from_records(super::read_units(&args.units)?)?);

    let redistricter = Redistricter::new(registry.clone(), config)?;
    let outcome = redistricter.run()
        .with_context(|| format!("[redistrict] Failed to district {} units", registry.len()))?;

    for district in &outcome.summary(&registry).districts {
        info!(
            district = district.district,
            population = district.total_population,
            deviation = district.deviation(outcome.bounds.target),
            members = district.num_members(),
            "district"
        );
    }
    if !outcome.is_optimal() {
        tracing::warn!("[redistrict] result is the best incumbent found within the time limit, not a proven optimum");
    }

    info!("[redistrict] writing plan to {}", out_path.display());
    write_assignments_csv(&outcome.unit_exports(&registry), out_path)?;

    if let Some(summary_path) = &args.summary {
        info!("[redistrict] writing summary to {}", summary_path.display());
        write_json(&outcome.report(&registry), summary_path)?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    fn parse(args: &[&str]) -> RedistrictArgs {
        let cli = Cli::try_parse_from(args).unwrap();
        match cli.command {
            crate::cli::Commands::Redistrict(args) => args,
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn flags_override_defaults() {
        let args = parse(&["countymander", "redistrict", "units.json", "-d", "11", "--deviation", "0.1", "--no-time-limit", "--distance", "haversine"]);
        let config = build_config(&args).unwrap();

        assert_eq!(config.num_districts, 11);
        assert_eq!(config.deviation, 0.1);
        assert_eq!(config.time_limit_secs, None);
        assert_eq!(config.distance, DistanceKind::Haversine);
        assert!(config.enforce_bounds);
    }

    #[test]
    fn config_file_supplies_missing_flags() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{"num_districts": 5, "deviation": 0.2}"#).unwrap();

        let args = parse(&["countymander", "redistrict", "units.csv", "--config", path.to_str().unwrap(), "--no-bounds"]);
        let config = build_config(&args).unwrap();

        assert_eq!(config.num_districts, 5);
        assert_eq!(config.deviation, 0.2);
        assert!(!config.enforce_bounds);
    }

    #[test]
    fn districts_are_required_without_config() {
        let args = parse(&["countymander", "redistrict", "units.json"]);
        assert!(build_config(&args).is_err());
    }
}
