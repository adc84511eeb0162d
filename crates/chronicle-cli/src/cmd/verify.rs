//! `chron verify`: re-check a stored graph.

use std::io::Write;
use std::path::PathBuf;

use anyhow::Result;
use chronicle_core::config::{EngineOverrides, resolve_config};
use chronicle_graph::{Violation, verify};
use clap::Args;
use serde::Serialize;

use crate::input::read_graph;
use crate::output::{OutputMode, pretty_kv, pretty_section, render_mode};

#[derive(Args, Debug)]
pub struct VerifyArgs {
    /// Graph file produced by `chron build`.
    #[arg(long, value_name = "FILE")]
    pub graph: PathBuf,

    /// Threshold the graph was built with; defaults to the configured one.
    #[arg(long)]
    pub threshold: Option<f64>,

    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,
}

#[derive(Debug, Serialize)]
struct VerifyReport {
    id: String,
    threshold: f64,
    ok: bool,
    violations: Vec<Violation>,
}

/// Returns `true` when the graph is clean.
pub fn run_verify(args: &VerifyArgs, output: OutputMode) -> Result<bool> {
    let overrides = EngineOverrides {
        relation_threshold: args.threshold,
        ..EngineOverrides::default()
    };
    let threshold = resolve_config(args.config.as_deref(), &overrides)?
        .engine
        .relation_threshold;
    let graph = read_graph(&args.graph)?;

    let violations = verify(&graph, threshold);
    let report = VerifyReport {
        id: graph.id,
        threshold,
        ok: violations.is_empty(),
        violations,
    };
    render_mode(output, &report, render_text, render_pretty)?;
    Ok(report.ok)
}

fn render_text(report: &VerifyReport, w: &mut dyn Write) -> std::io::Result<()> {
    if report.ok {
        return writeln!(w, "{} ok", report.id);
    }
    for violation in &report.violations {
        writeln!(w, "{violation}")?;
    }
    Ok(())
}

fn render_pretty(report: &VerifyReport, w: &mut dyn Write) -> std::io::Result<()> {
    pretty_section(w, &format!("Verify {}", report.id))?;
    pretty_kv(w, "Threshold", format!("{:.3}", report.threshold))?;
    pretty_kv(w, "Violations", report.violations.len().to_string())?;
    for violation in &report.violations {
        writeln!(w, "  ✗ {violation}")?;
    }
    if report.ok {
        writeln!(w, "✓ all invariants hold")?;
    }
    Ok(())
}
