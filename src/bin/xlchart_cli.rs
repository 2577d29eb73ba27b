//! CLI tool for xlchart - extracts charts from XLSX files and outputs JSON
//!
//! Usage:
//!   xlchart_cli <input.xlsx>                     # All sheets, JSON to stdout
//!   xlchart_cli <input.xlsx> --sheet Summary     # One sheet
//!   xlchart_cli <input.xlsx> --config opts.json  # Override render options
//!   xlchart_cli <input.xlsx> --overrides s.json  # Resolve against overridden cells
//!   xlchart_cli <input.xlsx> -o out.json         # Output JSON to file
//!
//! Logging goes to stderr and is controlled by `RUST_LOG` (default `warn`).

#![allow(clippy::exit)]

use serde::Serialize;
use std::env;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

use xlchart::render::DatasetData;
use xlchart::session::{RenderFailure, RenderedChart};
use xlchart::{
    CellOverride, ChartDescriptor, ChartSession, ChartStatus, ExtractOptions, PlotConfig,
    PlotHandle, RecordingSurface, SurfaceCapabilities, XlchartError,
};

const USAGE: &str = "Usage: xlchart_cli <input.xlsx> [--sheet NAME] [--config FILE] [--overrides FILE] [-o output.json]";

#[derive(Debug, Default)]
struct Args {
    input: PathBuf,
    sheet: Option<String>,
    config: Option<PathBuf>,
    overrides: Option<PathBuf>,
    output: Option<PathBuf>,
}

fn parse_args(raw: &[String]) -> Result<Args, String> {
    let mut args = Args::default();
    let mut input = None;
    let mut iter = raw.iter();

    while let Some(arg) = iter.next() {
        let mut value = |flag: &str| {
            iter.next()
                .cloned()
                .ok_or_else(|| format!("{flag} needs a value"))
        };
        match arg.as_str() {
            "--sheet" => args.sheet = Some(value("--sheet")?),
            "--config" => args.config = Some(value("--config")?.into()),
            "--overrides" => args.overrides = Some(value("--overrides")?.into()),
            "-o" | "--output" => args.output = Some(value("-o")?.into()),
            flag if flag.starts_with('-') => return Err(format!("unknown option {flag}")),
            path if input.is_none() => input = Some(PathBuf::from(path)),
            extra => return Err(format!("unexpected argument {extra}")),
        }
    }

    args.input = input.ok_or_else(|| "missing input file".to_string())?;
    Ok(args)
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ChartOutput<'a> {
    heading: &'a str,
    aria_label: &'a str,
    descriptor: &'a ChartDescriptor,
    plot: &'a PlotConfig,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SheetOutput<'a> {
    name: String,
    status: ChartStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<String>,
    charts: Vec<ChartOutput<'a>>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    failures: Vec<RenderFailure>,
    #[serde(skip_serializing_if = "is_zero")]
    truncated: usize,
}

#[derive(Serialize)]
struct Output<'a> {
    sheets: Vec<SheetOutput<'a>>,
}

fn is_zero(n: &usize) -> bool {
    *n == 0
}

fn read_overrides(path: &Path) -> xlchart::Result<Vec<CellOverride>> {
    let json = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&json)?)
}

fn run(args: &Args) -> xlchart::Result<String> {
    let options = match &args.config {
        Some(path) => ExtractOptions::from_path(path)?,
        None => ExtractOptions::default(),
    };
    let data = fs::read(&args.input)?;
    let mut session: ChartSession<PlotHandle> = ChartSession::load(data, options);

    if session.status() == ChartStatus::ExtractionFailed {
        return Err(XlchartError::CorruptContainer(format!(
            "{}: {}",
            args.input.display(),
            session.status_message().unwrap_or_default()
        )));
    }

    let base = session.cached_model();
    let overrides = match &args.overrides {
        Some(path) => {
            let label = path
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned());
            session.set_scenario(label);
            read_overrides(path)?
        }
        None => Vec::new(),
    };
    let model = base.with_overrides(overrides);

    let sheets: Vec<String> = match &args.sheet {
        Some(name) => {
            if !session.select_sheet(name) {
                return Err(XlchartError::MissingEntry(format!("sheet {name:?}")));
            }
            vec![name.clone()]
        }
        None => session.sheet_names().into_iter().map(str::to_string).collect(),
    };

    let mut surface = RecordingSurface::new(SurfaceCapabilities::all());
    let mut reports = Vec::with_capacity(sheets.len());
    for name in &sheets {
        session.select_sheet(name);
        reports.push((name.clone(), session.render(&model, &mut surface)));
    }
    session.close(&mut surface);

    let output = Output {
        sheets: reports
            .iter()
            .map(|(name, report)| SheetOutput {
                name: name.clone(),
                status: report.status,
                message: report.message.clone(),
                charts: chart_outputs(session.charts_for(name), &report.charts),
                failures: report.failures.clone(),
                truncated: report.truncated,
            })
            .collect(),
    };
    log_summary(&output);
    Ok(serde_json::to_string_pretty(&output)?)
}

fn chart_outputs<'a>(
    descriptors: &'a [ChartDescriptor],
    rendered: &'a [RenderedChart],
) -> Vec<ChartOutput<'a>> {
    rendered
        .iter()
        .filter_map(|chart| {
            let descriptor = descriptors.get(chart.slot)?;
            Some(ChartOutput {
                heading: &chart.heading,
                aria_label: &chart.aria_label,
                descriptor,
                plot: &chart.plot,
            })
        })
        .collect()
}

fn log_summary(output: &Output<'_>) {
    for sheet in &output.sheets {
        let points: usize = sheet
            .charts
            .iter()
            .flat_map(|c| &c.plot.datasets)
            .map(|d| match &d.data {
                DatasetData::Values(v) => v.iter().flatten().count(),
                other => other.len(),
            })
            .sum();
        tracing::info!(
            "sheet {:?}: {} chart(s), {} data point(s)",
            sheet.name,
            sheet.charts.len(),
            points
        );
    }
}

fn main() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init();

    let raw: Vec<String> = env::args().skip(1).collect();
    let args = match parse_args(&raw) {
        Ok(args) => args,
        Err(e) => {
            eprintln!("Error: {e}");
            eprintln!("{USAGE}");
            std::process::exit(1);
        }
    };

    let json = match run(&args) {
        Ok(json) => json,
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    };

    match &args.output {
        Some(path) => {
            if let Err(e) = fs::write(path, &json) {
                eprintln!("Error writing {}: {}", path.display(), e);
                std::process::exit(1);
            }
            eprintln!("Written: {}", path.display());
        }
        None => {
            let mut stdout = io::stdout().lock();
            if let Err(e) = writeln!(stdout, "{json}") {
                eprintln!("Error writing output: {e}");
                std::process::exit(1);
            }
        }
    }
}
