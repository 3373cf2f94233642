// SPDX-License-Identifier: AGPL-3.0-only
// Copyright (C) 2024 Jonathan Lee
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License version 3
// as published by the Free Software Foundation.
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.
// See the GNU Affero General Public License for more details.
// You should have received a copy of the GNU Affero General Public License
// along with this program. If not, see https://www.gnu.org/licenses/.

use anyhow::Result;
use clap::Parser;
use sightline::{
    AnnotatedDataset, DataProfiler, ErrorReporter, RawClause, Recommendation,
    RecommendationConfig, RecommendationError, RecommendationSystem,
};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug, Clone)]
#[command(name = "sightline-demo")]
#[command(about = "Recommend charts for a CSV file from a partial intent.")]
struct Cli {
    /// CSV file to explore.
    csv: PathBuf,
    /// Intent clause, e.g. `Horsepower`, `?`, `Origin=USA`, `Weight>3000`, `A|B`.
    #[arg(long = "intent", short = 'i')]
    intent: Vec<String>,
    /// Query clause for a similarity search over the intent's charts.
    #[arg(long = "query", short = 'q')]
    query: Vec<String>,
    #[arg(long)]
    top_k: Option<usize>,
    /// YAML file with recommendation settings.
    #[arg(long)]
    config: Option<PathBuf>,
    /// Print each chart's specification as JSON.
    #[arg(long, default_value_t = false)]
    json: bool,
    #[arg(long, default_value_t = false)]
    debug: bool,
}

fn main() -> Result<()> {
    let args = Cli::parse();
    let filter = if args.debug {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"))
    } else {
        EnvFilter::new("info")
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
    if let Err(error) = run(&args) {
        eprintln!("{}", ErrorReporter::new().report(&error));
        std::process::exit(1);
    }
    Ok(())
}

fn run(args: &Cli) -> sightline::Result<()> {
    let mut config = match &args.config {
        Some(path) => RecommendationConfig::from_yaml_file(path)?,
        None => RecommendationConfig::default(),
    };
    if let Some(top_k) = args.top_k {
        config.top_k = top_k;
    }
    let profiler = DataProfiler::with_config(config.profiling.clone());
    let dataset = AnnotatedDataset::from_csv_with_profiler(&args.csv, &profiler)?;
    info!(
        dataset = dataset.name(),
        rows = dataset.len(),
        "loaded dataset"
    );
    let system = RecommendationSystem::with_config(config)?;
    let intent: Vec<RawClause> = args.intent.iter().map(|s| RawClause::from(s.as_str())).collect();
    if !args.query.is_empty() {
        let query: Vec<RawClause> = args
            .query
            .iter()
            .map(|s| RawClause::from(s.as_str()))
            .collect();
        let similar = system.similar_pattern(&dataset, &intent, &query, args.top_k)?;
        return print_recommendation(&similar, args.json);
    }
    let current = system.compile_intent(&dataset, &intent)?;
    if !current.is_empty() {
        println!("== Current visualizations ({}) ==", current.len());
        for vis in &current {
            println!("  {vis}");
        }
    }
    for recommendation in system.recommend(&dataset, &intent)?.values() {
        print_recommendation(recommendation, args.json)?;
    }
    Ok(())
}

fn print_recommendation(recommendation: &Recommendation, json: bool) -> sightline::Result<()> {
    println!(
        "== {} ({}) ==",
        recommendation.action,
        recommendation.collection.len()
    );
    println!("   {}", recommendation.description);
    for vis in &recommendation.collection {
        if json {
            let spec = serde_json::to_string_pretty(&vis.to_spec())
                .map_err(RecommendationError::from)?;
            println!("{spec}");
        } else {
            println!("  {vis}");
        }
    }
    Ok(())
}
