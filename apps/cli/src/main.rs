#![deny(warnings)]

//! Headless CLI for evaluating a single food-security scenario.

use anyhow::{anyhow, bail, Context, Result};
use fwe_core::{ConflictIntensity, ModelConfig, ScenarioInput};
use fwe_data::{FileReferenceData, ReferenceDataProvider};
use fwe_runtime::{run_scenario, Evaluation, Pipeline};
use std::path::PathBuf;
use std::str::FromStr;
use tracing::info;
use tracing_subscriber::EnvFilter;

const USAGE: &str = "usage:
  fwe run --pi <-1..1> --ci <0..3> --weeks <n> [--pop <millions>] [--budget <MUSD>]
          [--demand <kcal>] [--seed <n>] [--input <scenario.json>]
          [--config <model.yaml>] [--reference <tables.json>] [--json]
  fwe version";

#[derive(Debug, Default, PartialEq)]
struct RunArgs {
    pi: Option<f64>,
    ci: Option<u8>,
    weeks: Option<u32>,
    pop: Option<f64>,
    budget: Option<f64>,
    demand: Option<u32>,
    seed: Option<u64>,
    input: Option<PathBuf>,
    config: Option<PathBuf>,
    reference: Option<PathBuf>,
    json: bool,
}

#[derive(Debug, PartialEq)]
enum Command {
    Run(RunArgs),
    Version,
    Help,
}

fn value<T>(flag: &str, v: Option<String>) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    let v = v.ok_or_else(|| anyhow!("{flag} expects a value"))?;
    v.parse::<T>()
        .with_context(|| format!("invalid value for {flag}: {v}"))
}

fn parse_args<I: IntoIterator<Item = String>>(args: I) -> Result<Command> {
    let mut it = args.into_iter();
    match it.next().as_deref() {
        Some("run") => {}
        Some("version") | Some("--version") => return Ok(Command::Version),
        Some("help") | Some("--help") | None => return Ok(Command::Help),
        Some(other) => bail!("unknown command: {other}\n{USAGE}"),
    }
    let mut a = RunArgs::default();
    while let Some(arg) = it.next() {
        match arg.as_str() {
            "--pi" => a.pi = Some(value(&arg, it.next())?),
            "--ci" => a.ci = Some(value(&arg, it.next())?),
            "--weeks" => a.weeks = Some(value(&arg, it.next())?),
            "--pop" => a.pop = Some(value(&arg, it.next())?),
            "--budget" => a.budget = Some(value(&arg, it.next())?),
            "--demand" => a.demand = Some(value(&arg, it.next())?),
            "--seed" => a.seed = Some(value(&arg, it.next())?),
            "--input" => a.input = Some(value(&arg, it.next())?),
            "--config" => a.config = Some(value(&arg, it.next())?),
            "--reference" => a.reference = Some(value(&arg, it.next())?),
            "--json" => a.json = true,
            other => bail!("unknown flag: {other}\n{USAGE}"),
        }
    }
    Ok(Command::Run(a))
}

/// Scenario from `--input` (if any) with flags layered on top.
fn build_input(a: &RunArgs) -> Result<ScenarioInput> {
    let mut s = match &a.input {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("reading {}", path.display()))?;
            serde_json::from_str::<ScenarioInput>(&text)
                .with_context(|| format!("parsing scenario {}", path.display()))?
        }
        None => {
            let pi = a.pi.ok_or_else(|| anyhow!("--pi is required\n{USAGE}"))?;
            let ci = a.ci.ok_or_else(|| anyhow!("--ci is required\n{USAGE}"))?;
            let weeks = a.weeks.ok_or_else(|| anyhow!("--weeks is required\n{USAGE}"))?;
            ScenarioInput::new(pi, ConflictIntensity::try_from(ci)?, weeks)
        }
    };
    if a.input.is_some() {
        if let Some(pi) = a.pi {
            s.posture_index = pi;
        }
        if let Some(ci) = a.ci {
            s.conflict_intensity = ConflictIntensity::try_from(ci)?;
        }
        if let Some(weeks) = a.weeks {
            s.duration_weeks = weeks;
        }
    }
    if let Some(pop) = a.pop {
        s.population_millions = pop;
    }
    if let Some(budget) = a.budget {
        s.budget_musd = budget;
    }
    if let Some(demand) = a.demand {
        s.demand_cal_per_cap_day = demand;
    }
    if a.seed.is_some() {
        s.seed = a.seed;
    }
    Ok(s)
}

fn evaluate_with<P: ReferenceDataProvider>(
    pipeline: Pipeline<P>,
    input: &ScenarioInput,
) -> Result<Evaluation> {
    run_scenario(&pipeline, input).context("scenario evaluation failed")
}

fn print_report(input: &ScenarioInput, e: &Evaluation) {
    let seed = input
        .seed
        .map(|s| s.to_string())
        .unwrap_or_else(|| "entropy".to_string());
    println!(
        "Scenario | PI: {:.2} | CI: {} | weeks: {} | budget: ${:.1}M | population: {:.1}M | seed: {}",
        input.posture_index,
        input.conflict_intensity.level(),
        input.duration_weeks,
        input.budget_musd,
        input.population_millions,
        seed
    );
    let kpis: Vec<String> = e
        .result
        .kpis
        .iter()
        .map(|(k, v)| format!("{k}: {v:.2}"))
        .collect();
    println!("KPI | {}", kpis.join(" | "));
    let diags: Vec<String> = e
        .result
        .diagnostics
        .iter()
        .map(|(k, v)| format!("{k}: {v:.4}"))
        .collect();
    println!("Diagnostics | {}", diags.join(" | "));
    println!("Buy plan:");
    for line in &e.optimization.buy_plan {
        println!(
            "  {:<12} {:>14.1} t @ ${:.2}/t",
            line.commodity, line.tons, line.unit_price
        );
    }
    println!("Protein acquired: {:.0} t", e.optimization.total_protein_g / 1.0e6);
    if !e.result.notes.is_empty() {
        println!("Notes:");
        for n in &e.result.notes {
            println!(" - {n}");
        }
    }
}

fn run(a: RunArgs) -> Result<()> {
    let input = build_input(&a)?;
    let config = match &a.config {
        Some(p) => ModelConfig::load(p).with_context(|| format!("loading {}", p.display()))?,
        None => ModelConfig::default(),
    };
    info!(?input, json = a.json, "evaluating scenario");
    let eval = match &a.reference {
        Some(p) => evaluate_with(Pipeline::with_reference(&config, FileReferenceData::load(p)?), &input)?,
        None => evaluate_with(Pipeline::new(&config), &input)?,
    };
    if a.json {
        println!("{}", serde_json::to_string_pretty(&eval.result)?);
    } else {
        print_report(&input, &eval);
    }
    Ok(())
}

fn main() -> Result<()> {
    // Logging setup; stderr keeps --json output clean
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match parse_args(std::env::args().skip(1))? {
        Command::Run(a) => run(a),
        Command::Version => {
            println!(
                "fwe {} ({} {})",
                env!("CARGO_PKG_VERSION"),
                env!("GIT_SHA"),
                env!("BUILD_DATE")
            );
            Ok(())
        }
        Command::Help => {
            println!("{USAGE}");
            Ok(())
        }
    }
}
