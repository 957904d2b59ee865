//! merit-sim entry point: CLI wiring and config-driven study execution.

use std::path::{Path, PathBuf};
use std::process;

use tracing_subscriber::EnvFilter;

use merit_sim::config::StudyConfig;
use merit_sim::convergence::ConvergenceRunner;
use merit_sim::dispatch::DispatchEngine;
use merit_sim::io::{archive, export};
use merit_sim::model::{CostModel, Curve, Producer, Region, Series};

/// Parsed CLI arguments.
struct CliArgs {
    study_path: Option<PathBuf>,
    demo: bool,
    report_out: Option<PathBuf>,
    report_point: Option<usize>,
}

fn print_help() {
    eprintln!("merit-sim: merit-order dispatch with cross-border convergence");
    eprintln!();
    eprintln!("Usage: merit-sim [OPTIONS]");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --study <path>       Load a two-region study from a TOML config file");
    eprintln!("  --demo               Run a built-in two-region demo study");
    eprintln!("  --out <path>         Export the per-point flow report to CSV");
    eprintln!("  --point <index>      Override the point summarized on stdout");
    eprintln!("  --help               Show this help message");
    eprintln!();
    eprintln!("Either --study or --demo is required.");
}

fn parse_args() -> CliArgs {
    let args: Vec<String> = std::env::args().collect();
    let mut cli = CliArgs {
        study_path: None,
        demo: false,
        report_out: None,
        report_point: None,
    };

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--help" | "-h" => {
                print_help();
                process::exit(0);
            }
            "--study" => {
                i += 1;
                if i >= args.len() {
                    eprintln!("error: --study requires a path argument");
                    process::exit(1);
                }
                cli.study_path = Some(PathBuf::from(&args[i]));
            }
            "--demo" => {
                cli.demo = true;
            }
            "--out" => {
                i += 1;
                if i >= args.len() {
                    eprintln!("error: --out requires a path argument");
                    process::exit(1);
                }
                cli.report_out = Some(PathBuf::from(&args[i]));
            }
            "--point" => {
                i += 1;
                if i >= args.len() {
                    eprintln!("error: --point requires an index argument");
                    process::exit(1);
                }
                match args[i].parse::<usize>() {
                    Ok(point) => cli.report_point = Some(point),
                    Err(_) => {
                        eprintln!("error: --point value \"{}\" is not a valid index", args[i]);
                        process::exit(1);
                    }
                }
            }
            other => {
                eprintln!("error: unknown argument: {other}");
                print_help();
                process::exit(1);
            }
        }
        i += 1;
    }

    if cli.demo == cli.study_path.is_some() {
        eprintln!("error: pass exactly one of --study or --demo");
        print_help();
        process::exit(1);
    }

    cli
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = parse_args();

    let (local, foreign, capacity, engine, report_point) = if cli.demo {
        let (local, foreign, capacity) = demo_regions();
        (local, foreign, capacity, DispatchEngine::new(), 0)
    } else {
        match load_study(cli.study_path.as_deref().unwrap_or(Path::new(""))) {
            Ok(study) => study,
            Err(message) => {
                eprintln!("error: {message}");
                process::exit(1);
            }
        }
    };

    let report_point = cli.report_point.unwrap_or(report_point);
    if let Err(message) = check_report_point(report_point, local.points()) {
        eprintln!("error: {message}");
        process::exit(1);
    }

    let local_code = local.code().to_string();
    let foreign_code = foreign.code().to_string();

    let mut runner = ConvergenceRunner::new(local);
    if let Err(err) = runner.add_interconnect(foreign, capacity) {
        eprintln!("error: {err}");
        process::exit(1);
    }

    if let Err(err) = runner.run(&engine) {
        eprintln!("error: {err}");
        process::exit(1);
    }

    let result = match (runner.result(), runner.foreign_result()) {
        (Some(result), Some(foreign_result)) => (result, foreign_result),
        _ => {
            eprintln!("error: run completed without results");
            process::exit(1);
        }
    };
    let (final_dispatch, foreign_dispatch) = result;

    let flow = match runner.interconnect_flow(&foreign_code) {
        Ok(flow) => flow,
        Err(err) => {
            eprintln!("error: {err}");
            process::exit(1);
        }
    };

    print_summary(
        &local_code,
        &foreign_code,
        final_dispatch,
        foreign_dispatch,
        &flow,
        report_point,
    );

    if let Some(path) = cli.report_out {
        let rows = export::flow_rows(final_dispatch, foreign_dispatch, &flow);
        match export::export_csv(&rows, &path) {
            Ok(()) => println!("Flow report written to {}", path.display()),
            Err(err) => {
                eprintln!("error: cannot write \"{}\": {err}", path.display());
                process::exit(1);
            }
        }
    }
}

type Study = (Region, Region, Series, DispatchEngine, usize);

/// Rejects a report point outside the study horizon. Covers the `--point`
/// override, which bypasses the config-level range check.
fn check_report_point(point: usize, points: usize) -> Result<(), String> {
    if point >= points {
        return Err(format!(
            "point {point} is out of range; the horizon has {points} points"
        ));
    }
    Ok(())
}

fn load_study(path: &Path) -> Result<Study, String> {
    let config = StudyConfig::from_toml_file(path).map_err(|err| err.to_string())?;

    let errors = config.validate();
    if !errors.is_empty() {
        let joined: Vec<String> = errors.iter().map(|err| err.to_string()).collect();
        return Err(joined.join("; "));
    }

    let points = config.study.points;
    let local =
        archive::load_region(&config.local.archive, points).map_err(|err| err.to_string())?;
    let foreign =
        archive::load_region(&config.foreign.archive, points).map_err(|err| err.to_string())?;

    let capacity = match &config.interconnect.capacity_curve {
        Some(curve_path) => {
            Series::from(archive::read_curve(curve_path, points).map_err(|err| err.to_string())?)
        }
        None => Series::from(config.interconnect.capacity),
    };

    let engine = DispatchEngine::with_emergency_price(config.study.emergency_price);
    Ok((local, foreign, capacity, engine, config.study.report_point))
}

/// A small built-in study: a cheap local market with a stepped gas park
/// facing an expensive foreign market over a 24-point day.
fn demo_regions() -> (Region, Region, Series) {
    let points = 24;

    let mut local = Region::new("nl", points);
    local.add_producer(Producer::always_on(
        "nl_wind",
        Curve::from_values((0..points).map(|t| 2.0 + (t % 6) as f64 * 0.5).collect()),
    ));
    local.add_producer(Producer::dispatchable(
        "nl_coal",
        CostModel::constant(23.0),
        4.0,
        2.0,
        0.95,
        points,
    ));
    local.add_producer(Producer::dispatchable(
        "nl_gas",
        CostModel::function(38.0, 0.3),
        1.5,
        8.0,
        1.0,
        points,
    ));
    local.set_demand(Curve::from_values(
        (0..points)
            .map(|t| 10.0 + 4.0 * ((t as f64 - 12.0) / 12.0).cos().abs())
            .collect(),
    ));

    let mut foreign = Region::new("de", points);
    foreign.add_producer(Producer::dispatchable(
        "de_lignite",
        CostModel::constant(30.0),
        5.0,
        2.0,
        0.9,
        points,
    ));
    foreign.add_producer(Producer::dispatchable(
        "de_gas",
        CostModel::constant(55.0),
        3.0,
        3.0,
        1.0,
        points,
    ));
    foreign.set_demand(Curve::flat(points, 12.0));

    (local, foreign, Series::from(3.0))
}

fn print_summary(
    local_code: &str,
    foreign_code: &str,
    local: &merit_sim::model::Dispatch,
    foreign: &merit_sim::model::Dispatch,
    flow: &Curve,
    point: usize,
) {
    let exported: f64 = flow.iter().filter(|v| *v > 0.0).sum();
    let imported: f64 = flow.iter().filter(|v| *v < 0.0).map(f64::abs).sum();

    println!("Convergence study: {local_code} <-> {foreign_code}");
    println!("  points:          {}", local.points());
    println!("  total export:    {exported:.2}");
    println!("  total import:    {imported:.2}");
    println!("  shortfall points: {}", local.shortfalls().len());
    println!();
    println!("Point {point}:");
    println!("  demand:          {:.2}", local.demand_at(point));
    println!("  {local_code} price:        {:.2}", local.price_at(point));
    println!("  {foreign_code} price:        {:.2}", foreign.price_at(point));
    println!("  interconnect:    {:.2}", flow.get(point));

    match local.price_setter(point) {
        Some(producer) => println!("  price setter:    {}", producer.key()),
        None => println!("  price setter:    none (emergency price)"),
    }

    println!();
    println!("  {:<24} {:>10} {:>10}", "producer", "load", "max");
    for producer in local.producers() {
        println!(
            "  {:<24} {:>10.2} {:>10.2}",
            producer.key(),
            producer.load_at(point),
            producer.max_load_at(point)
        );
    }
}
