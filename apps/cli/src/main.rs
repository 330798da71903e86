// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! SiteCheck command line
//!
//! Imports a site model, optionally binds a batch of compliance results and
//! prints a JSON review report. Logs go to stderr.

mod report;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use report::ReviewReport;
use sitecheck_core::{CheckKind, CheckResults, DocumentDecoder, ModelFormat, ModelLoader, ModelSource};
use sitecheck_engine::{ReviewConfig, ReviewSession};
use sitecheck_geometry::UpAxis;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Format {
    /// Decoded native document (.3dm export, .json)
    Native,
    /// glTF / GLB
    Interchange,
}

impl From<Format> for ModelFormat {
    fn from(format: Format) -> Self {
        match format {
            Format::Native => ModelFormat::Native,
            Format::Interchange => ModelFormat::Interchange,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Axis {
    X,
    Y,
    Z,
}

impl From<Axis> for UpAxis {
    fn from(axis: Axis) -> Self {
        match axis {
            Axis::X => UpAxis::X,
            Axis::Y => UpAxis::Y,
            Axis::Z => UpAxis::Z,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Check {
    Height,
    Setback,
    SightCorridor,
    FireAccess,
    SkyBridge,
}

impl From<Check> for CheckKind {
    fn from(check: Check) -> Self {
        match check {
            Check::Height => CheckKind::Height,
            Check::Setback => CheckKind::Setback,
            Check::SightCorridor => CheckKind::SightCorridor,
            Check::FireAccess => CheckKind::FireAccess,
            Check::SkyBridge => CheckKind::SkyBridge,
        }
    }
}

#[derive(Parser, Debug)]
#[command(
    name = "sitecheck",
    author,
    version,
    about = "Import a site model, bind compliance results and report overlays"
)]
struct Cli {
    /// Model file (.3dm / .json decoded document, .gltf / .glb)
    model: PathBuf,

    /// Override the format guessed from the extension
    #[arg(long, value_enum)]
    format: Option<Format>,

    /// Compliance results JSON ({"height": [...], "setback": [...], ...})
    #[arg(long, value_name = "JSON")]
    results: Option<PathBuf>,

    /// Review configuration JSON; SITECHECK_* variables still apply on top
    #[arg(long, value_name = "JSON")]
    config: Option<PathBuf>,

    /// Source up axis, skipping detection
    #[arg(long = "up-axis", value_enum)]
    up_axis: Option<Axis>,

    /// Hide the overlays of a check family (repeatable)
    #[arg(long, value_enum)]
    hide: Vec<Check>,

    /// Write the report here instead of stdout
    #[arg(long, value_name = "PATH")]
    report: Option<PathBuf>,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info,sitecheck_engine=debug".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let report = run(&cli).await?;
    let json = serde_json::to_string_pretty(&report)?;

    match &cli.report {
        Some(path) => {
            tokio::fs::write(path, json)
                .await
                .with_context(|| format!("writing report to {}", path.display()))?;
            tracing::info!(path = %path.display(), "report written");
        }
        None => println!("{}", json),
    }
    Ok(())
}

async fn run(cli: &Cli) -> Result<ReviewReport> {
    let config = match &cli.config {
        Some(path) => ReviewConfig::from_json_file(path)?.with_env_overrides(),
        None => ReviewConfig::from_env(),
    };
    config.validate()?;

    let loader = ModelLoader::new().with_native_decoder(Arc::new(DocumentDecoder));
    let source = ModelSource::from_path(&cli.model, cli.format.map(Into::into))?;
    let mut session = ReviewSession::new(config, loader).with_up_override(cli.up_axis.map(Into::into));
    session
        .load(source)
        .await
        .with_context(|| format!("loading {}", cli.model.display()))?;

    for check in &cli.hide {
        session.set_visibility((*check).into(), false);
    }

    if let Some(path) = &cli.results {
        let text = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("reading results {}", path.display()))?;
        let results: CheckResults = serde_json::from_str(&text)
            .with_context(|| format!("parsing results {}", path.display()))?;
        session.set_results(results)?;
    }

    let report = ReviewReport::from_session(&session).context("no model generation installed")?;
    tracing::info!(
        meshes = report.meshes.len(),
        bindings = report.bindings.len(),
        warnings = report.warnings.len(),
        "review complete"
    );
    Ok(report)
}
