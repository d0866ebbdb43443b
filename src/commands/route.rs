use std::path::PathBuf;

use anyhow::{Context, Result, anyhow};
use clap::ValueEnum;
use gridwalk::{Coordinate, find_path};
use serde::Serialize;

use super::load_map;

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum RouteFormat {
    Text,
    Json,
    Toon,
}

#[derive(Debug, Clone, Serialize)]
struct RouteReport {
    from: Coordinate,
    to: Coordinate,
    found: bool,
    cost: Option<u32>,
    expanded: Option<usize>,
    steps: Vec<Coordinate>,
}

pub(super) fn run_route(
    map: Option<PathBuf>,
    from: Coordinate,
    to: Coordinate,
    format: RouteFormat,
) -> Result<()> {
    let (path, spec) = load_map(map)?;
    let grid = spec
        .build()
        .with_context(|| format!("invalid map {}", path.display()))?;

    let route = find_path(&grid, from, to);
    let report = RouteReport {
        from,
        to,
        found: route.is_some(),
        cost: route.as_ref().map(|r| r.cost),
        expanded: route.as_ref().map(|r| r.expanded),
        steps: route.map(|r| r.steps).unwrap_or_default(),
    };

    match format {
        RouteFormat::Text => print_text(&report),
        RouteFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        RouteFormat::Toon => {
            let toon = serde_toon::to_string_pretty(&report)
                .map_err(|e| anyhow!("encode route as toon: {}", e))?;
            println!("{}", toon);
        }
    }
    Ok(())
}

fn print_text(report: &RouteReport) {
    if !report.found {
        println!("No path from {} to {}", report.from, report.to);
        return;
    }

    println!(
        "Path from {} to {}: {} step(s), cost={}, expanded={}",
        report.from,
        report.to,
        report.steps.len(),
        report.cost.unwrap_or_default(),
        report.expanded.unwrap_or_default()
    );
    let cells: Vec<String> = report.steps.iter().map(|c| c.to_string()).collect();
    println!(" {}", cells.join(" -> "));
}
