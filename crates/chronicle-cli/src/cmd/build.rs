//! `chron build`: events in, graph JSON out.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use chronicle_core::config::{EngineOverrides, resolve_config};
use chronicle_core::heuristics::Heuristics;
use chronicle_core::model::Event;
use chronicle_graph::{Construction, GraphBuilder};
use clap::Args;
use serde::Serialize;
use tracing::{debug, info};

use crate::input::{read_events, read_to_string, write_json};
use crate::output::{OutputMode, pretty_kv, pretty_section, render_mode};

#[derive(Args, Debug)]
pub struct BuildArgs {
    /// Event file: a JSON array or an envelope with `items`/`events`.
    #[arg(long, value_name = "FILE")]
    pub events: PathBuf,

    /// Source text used for marker evidence; overrides the envelope text.
    #[arg(long, value_name = "FILE")]
    pub text: Option<PathBuf>,

    /// Graph title; overrides the envelope title.
    #[arg(long)]
    pub title: Option<String>,

    /// Minimum relation strength in [0, 1].
    #[arg(long)]
    pub threshold: Option<f64>,

    /// Maximum number of events to keep.
    #[arg(long)]
    pub max_events: Option<usize>,

    /// Look-ahead window of the candidate generator.
    #[arg(long)]
    pub window: Option<usize>,

    /// Scoring threads.
    #[arg(long)]
    pub workers: Option<usize>,

    /// Explicit config file, applied over the user and project files.
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Write the graph here instead of stdout.
    #[arg(long, short, value_name = "FILE")]
    pub out: Option<PathBuf>,

    /// Abandon construction after this many milliseconds.
    #[arg(long, value_name = "MS")]
    pub timeout_ms: Option<u64>,
}

impl BuildArgs {
    fn overrides(&self) -> EngineOverrides {
        EngineOverrides {
            relation_threshold: self.threshold,
            max_events: self.max_events,
            window: self.window,
            workers: self.workers,
            ..EngineOverrides::default()
        }
    }
}

/// Summary printed when the graph itself goes to a file or a terminal.
#[derive(Debug, Serialize)]
struct BuildSummary<'a> {
    id: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    out: Option<&'a Path>,
    node_count: usize,
    edge_count: usize,
    avg_degree: f64,
    max_path_length: usize,
    cycles_broken: usize,
    candidate_count: usize,
    transitive_removed: usize,
    truncated_events: usize,
    critical_path: &'a [String],
}

impl<'a> BuildSummary<'a> {
    fn new(construction: &'a Construction, out: Option<&'a Path>) -> Self {
        let graph = &construction.graph;
        let report = &construction.report;
        Self {
            id: &graph.id,
            out,
            node_count: graph.stats.node_count,
            edge_count: graph.stats.edge_count,
            avg_degree: graph.stats.avg_degree,
            max_path_length: graph.stats.max_path_length,
            cycles_broken: graph.stats.cyclic_count,
            candidate_count: report.candidate_count,
            transitive_removed: report.transitive_removed.len(),
            truncated_events: report.truncated_events,
            critical_path: &construction.topology.critical_path,
        }
    }
}

pub fn run_build(args: &BuildArgs, output: OutputMode) -> Result<()> {
    let resolved = resolve_config(args.config.as_deref(), &args.overrides())?;
    debug!(sources = ?resolved.sources, "configuration resolved");
    let heuristics = Heuristics::from_config(&resolved.heuristics)?;

    let input = read_events(&args.events)?;
    let text = match args.text {
        Some(ref path) => read_to_string(path)?,
        None => input.text.unwrap_or_default(),
    };
    let title = args.title.clone().or(input.title).unwrap_or_default();

    let builder = GraphBuilder::new(resolved.engine)
        .with_heuristics(heuristics)
        .with_title(title)
        .with_text(text);
    let construction = build_with_deadline(builder, input.events, args.timeout_ms)?;
    info!(id = %construction.graph.id, "build finished");

    if let Some(ref path) = args.out {
        write_json(path, &construction.graph)?;
    } else if !output.is_pretty() {
        return render_mode(
            output,
            &construction.graph,
            |graph, w| {
                serde_json::to_writer_pretty(&mut *w, graph)?;
                writeln!(w)
            },
            |_, _| Ok(()),
        );
    }

    let summary = BuildSummary::new(&construction, args.out.as_deref());
    render_mode(output, &summary, render_summary_text, render_summary_pretty)
}

/// Run construction on a worker thread and give up once `timeout_ms`
/// elapses. The abandoned worker's result is discarded.
fn build_with_deadline(
    builder: GraphBuilder,
    events: Vec<Event>,
    timeout_ms: Option<u64>,
) -> Result<Construction> {
    let Some(ms) = timeout_ms else {
        return builder.build(&events).context("graph construction failed");
    };

    let (tx, rx) = mpsc::channel();
    thread::Builder::new()
        .name("chronicle-build".to_string())
        .spawn(move || {
            let _ = tx.send(builder.build(&events));
        })
        .context("Failed to start construction thread")?;

    match rx.recv_timeout(Duration::from_millis(ms)) {
        Ok(result) => result.context("graph construction failed"),
        Err(mpsc::RecvTimeoutError::Timeout) => {
            bail!("graph construction exceeded {ms} ms; result discarded")
        }
        Err(mpsc::RecvTimeoutError::Disconnected) => {
            bail!("construction thread exited without a result")
        }
    }
}

fn render_summary_text(summary: &BuildSummary<'_>, w: &mut dyn Write) -> std::io::Result<()> {
    writeln!(
        w,
        "{} nodes={} edges={} max_path_length={} cycles_broken={}",
        summary.id,
        summary.node_count,
        summary.edge_count,
        summary.max_path_length,
        summary.cycles_broken
    )?;
    if let Some(out) = summary.out {
        writeln!(w, "wrote {}", out.display())?;
    }
    Ok(())
}

fn render_summary_pretty(summary: &BuildSummary<'_>, w: &mut dyn Write) -> std::io::Result<()> {
    pretty_section(w, &format!("Graph {}", summary.id))?;
    pretty_kv(w, "Nodes", summary.node_count.to_string())?;
    pretty_kv(w, "Edges", summary.edge_count.to_string())?;
    pretty_kv(w, "Avg degree", format!("{:.3}", summary.avg_degree))?;
    pretty_kv(w, "Max path", summary.max_path_length.to_string())?;
    pretty_kv(w, "Candidates", summary.candidate_count.to_string())?;
    pretty_kv(w, "Cycles broken", summary.cycles_broken.to_string())?;
    pretty_kv(w, "Reduced", summary.transitive_removed.to_string())?;
    if summary.truncated_events > 0 {
        pretty_kv(w, "Truncated", summary.truncated_events.to_string())?;
    }
    pretty_kv(w, "Critical path", summary.critical_path.join(" -> "))?;
    if let Some(out) = summary.out {
        pretty_kv(w, "Written to", out.display().to_string())?;
    }
    Ok(())
}
