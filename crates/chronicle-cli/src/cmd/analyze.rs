//! `chron analyze`: levels, critical path, slack and edge summary.

use std::io::Write;
use std::path::PathBuf;

use anyhow::Result;
use chronicle_core::model::{GraphStats, TimelineGraph};
use chronicle_graph::graph::{EdgeSummary, RelationGraph, Topology, analyze, edge_summary};
use clap::Args;
use serde::Serialize;

use crate::input::read_graph;
use crate::output::{OutputMode, pretty_kv, pretty_section, render_mode};

#[derive(Args, Debug)]
pub struct AnalyzeArgs {
    /// Graph file produced by `chron build`.
    #[arg(long, value_name = "FILE")]
    pub graph: PathBuf,
}

#[derive(Debug, Serialize)]
struct Analysis {
    id: String,
    stats: GraphStats,
    topology: Topology,
    edges: EdgeSummary,
}

fn analyze_graph(graph: &TimelineGraph) -> Result<Analysis> {
    let rg = RelationGraph::from_timeline(graph)?;
    let topology = analyze(&rg)?;
    Ok(Analysis {
        id: graph.id.clone(),
        stats: graph.stats.clone(),
        topology,
        edges: edge_summary(&graph.edges),
    })
}

pub fn run_analyze(args: &AnalyzeArgs, output: OutputMode) -> Result<()> {
    let graph = read_graph(&args.graph)?;
    let analysis = analyze_graph(&graph)?;
    render_mode(output, &analysis, render_text, render_pretty)
}

fn render_text(analysis: &Analysis, w: &mut dyn Write) -> std::io::Result<()> {
    for (i, level) in analysis.topology.levels.iter().enumerate() {
        writeln!(w, "level {i}: {}", level.join(" "))?;
    }
    writeln!(w, "critical_path: {}", analysis.topology.critical_path.join(" -> "))?;
    for s in &analysis.topology.schedule {
        writeln!(w, "{} level={} depth={} slack={}", s.id, s.level, s.depth, s.slack)?;
    }
    Ok(())
}

fn render_pretty(analysis: &Analysis, w: &mut dyn Write) -> std::io::Result<()> {
    let topology = &analysis.topology;
    let edges = &analysis.edges;

    pretty_section(w, &format!("Graph {}", analysis.id))?;
    pretty_kv(w, "Nodes", analysis.stats.node_count.to_string())?;
    pretty_kv(w, "Edges", analysis.stats.edge_count.to_string())?;
    pretty_kv(w, "Levels", topology.levels.len().to_string())?;
    pretty_kv(w, "Max path", topology.max_path_length.to_string())?;
    pretty_kv(w, "Critical path", topology.critical_path.join(" -> "))?;
    writeln!(w)?;

    pretty_section(w, "Levels")?;
    for (i, level) in topology.levels.iter().enumerate() {
        writeln!(w, "{i:>3}  {}", level.join(", "))?;
    }
    writeln!(w)?;

    pretty_section(w, "Schedule")?;
    writeln!(w, "{:<24} {:>5} {:>5} {:>6} {:>5}", "node", "level", "depth", "latest", "slack")?;
    for s in &topology.schedule {
        writeln!(
            w,
            "{:<24} {:>5} {:>5} {:>6} {:>5}",
            s.id, s.level, s.depth, s.latest, s.slack
        )?;
    }
    writeln!(w)?;

    pretty_section(w, "Edges")?;
    for (relation, count) in &edges.by_type {
        pretty_kv(w, relation.as_str(), count.to_string())?;
    }
    if edges.count > 0 {
        pretty_kv(
            w,
            "Strength",
            format!(
                "min {:.3} / mean {:.3} / max {:.3}",
                edges.min_strength, edges.mean_strength, edges.max_strength
            ),
        )?;
    }
    if let Some(gap) = edges.mean_abs_gap_days {
        pretty_kv(w, "Mean gap", format!("{gap:.1} days"))?;
    }
    Ok(())
}
