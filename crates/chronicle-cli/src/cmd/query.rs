//! `chron query`: run one structural query against a graph file.

use std::io::Write;
use std::path::PathBuf;
use std::str::FromStr;

use anyhow::{Context, Result};
use chronicle_core::config::{EngineOverrides, resolve_config};
use chronicle_core::error::EngineError;
use chronicle_core::model::RelationType;
use chronicle_graph::{QueryEngine, QueryRequest, QueryResponse, QueryResult, QueryType};
use clap::Args;

use crate::input::{read_graph, read_request};
use crate::output::{OutputMode, pretty_kv, pretty_section, render_mode};

#[derive(Args, Debug)]
pub struct QueryArgs {
    /// Graph file produced by `chron build`.
    #[arg(long, value_name = "FILE")]
    pub graph: PathBuf,

    /// JSON request file with `query_type` and its parameters.
    #[arg(long, value_name = "FILE", conflicts_with = "query_type")]
    pub request: Option<PathBuf>,

    /// Query type: path, causal_chain, influence, prerequisite, parallel, impact.
    #[arg(long = "type", value_name = "TYPE", required_unless_present = "request")]
    pub query_type: Option<String>,

    #[arg(long, value_name = "ID")]
    pub start: Option<String>,

    #[arg(long, value_name = "ID")]
    pub end: Option<String>,

    #[arg(long, value_name = "ID")]
    pub node: Option<String>,

    /// Relation types to follow (repeatable).
    #[arg(long = "relation", value_name = "TYPE")]
    pub relations: Vec<String>,

    /// Edge bound for path queries.
    #[arg(long)]
    pub max_depth: Option<usize>,

    #[arg(long)]
    pub max_results: Option<usize>,

    /// Config file supplying the default path depth.
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,
}

impl QueryArgs {
    fn to_request(&self) -> Result<QueryRequest> {
        if let Some(ref path) = self.request {
            return read_request(path);
        }
        let raw = self
            .query_type
            .as_deref()
            .context("either --request or --type is required")?;
        let relation_types = self
            .relations
            .iter()
            .map(|r| RelationType::from_str(r).map_err(EngineError::from))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(QueryRequest {
            query_type: QueryType::from_str(raw)?,
            start_node_id: self.start.clone(),
            end_node_id: self.end.clone(),
            node_id: self.node.clone(),
            relation_types,
            max_results: self.max_results,
            max_depth: self.max_depth,
        })
    }
}

pub fn run_query(args: &QueryArgs, output: OutputMode) -> Result<()> {
    let request = args.to_request()?;
    let resolved = resolve_config(args.config.as_deref(), &EngineOverrides::default())?;
    let graph = read_graph(&args.graph)?;

    let engine = QueryEngine::new(&graph).with_max_depth(resolved.engine.max_path_depth);
    let response = engine.execute(&request)?;
    render_mode(output, &response, render_text, render_pretty)
}

fn render_text(response: &QueryResponse, w: &mut dyn Write) -> std::io::Result<()> {
    match response.result {
        QueryResult::Paths { ref paths } => {
            for path in paths {
                writeln!(w, "{}", path.join(" -> "))?;
            }
        }
        QueryResult::NodeIds { ref node_ids } => {
            for id in node_ids {
                writeln!(w, "{id}")?;
            }
        }
        QueryResult::Influence {
            influenced,
            confidence,
        } => writeln!(w, "influenced={influenced} confidence={confidence}")?,
    }
    Ok(())
}

fn render_pretty(response: &QueryResponse, w: &mut dyn Write) -> std::io::Result<()> {
    pretty_section(w, &format!("Query: {}", response.query_type))?;
    match response.result {
        QueryResult::Paths { ref paths } => {
            if paths.is_empty() {
                writeln!(w, "No paths found.")?;
            }
            for (i, path) in paths.iter().enumerate() {
                writeln!(w, "{:>3}. {}", i + 1, path.join(" -> "))?;
            }
        }
        QueryResult::NodeIds { ref node_ids } => {
            if node_ids.is_empty() {
                writeln!(w, "No nodes found.")?;
            }
            for id in node_ids {
                writeln!(w, "  {id}")?;
            }
        }
        QueryResult::Influence {
            influenced,
            confidence,
        } => {
            pretty_kv(w, "Influenced", if influenced { "yes" } else { "no" })?;
            pretty_kv(w, "Confidence", format!("{confidence:.3}"))?;
        }
    }
    Ok(())
}
