//! Reading event, graph and request files; writing JSON artifacts.
//!
//! A path of `-` reads from stdin.

use std::fs;
use std::io::{self, Read, Write};
use std::path::Path;

use anyhow::{Context, Result};
use chronicle_core::model::{Event, EventBatch, TimelineGraph};
use serde::Serialize;
use serde::de::DeserializeOwned;

/// Events plus the optional title and source text of an envelope file.
#[derive(Debug, Default)]
pub struct EventInput {
    pub title: Option<String>,
    pub text: Option<String>,
    pub events: Vec<Event>,
}

pub fn read_to_string(path: &Path) -> Result<String> {
    if path == Path::new("-") {
        let mut buf = String::new();
        io::stdin()
            .read_to_string(&mut buf)
            .context("Failed to read stdin")?;
        return Ok(buf);
    }
    fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))
}

fn read_json<T: DeserializeOwned>(path: &Path, what: &str) -> Result<T> {
    let raw = read_to_string(path)?;
    serde_json::from_str(&raw)
        .with_context(|| format!("Failed to parse {what} from {}", path.display()))
}

pub fn read_events(path: &Path) -> Result<EventInput> {
    let batch: EventBatch = read_json(path, "events")?;
    let (title, text, events) = batch.into_parts();
    Ok(EventInput {
        title,
        text,
        events,
    })
}

pub fn read_graph(path: &Path) -> Result<TimelineGraph> {
    read_json(path, "graph")
}

pub fn read_request<T: DeserializeOwned>(path: &Path) -> Result<T> {
    read_json(path, "query request")
}

/// Write `value` as pretty JSON to `path`, replacing any existing file.
pub fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let mut body = serde_json::to_vec_pretty(value).context("Failed to serialize output")?;
    body.push(b'\n');
    let mut file =
        fs::File::create(path).with_context(|| format!("Failed to create {}", path.display()))?;
    file.write_all(&body)
        .with_context(|| format!("Failed to write {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn reads_bare_and_envelope_event_files() {
        let dir = TempDir::new().unwrap();
        let bare = dir.path().join("bare.json");
        fs::write(&bare, r#"[{"id":"a","title":"A"}]"#).unwrap();
        let input = read_events(&bare).unwrap();
        assert_eq!(input.events.len(), 1);
        assert!(input.title.is_none());

        let envelope = dir.path().join("env.json");
        fs::write(
            &envelope,
            r#"{"title":"T","text":"src","events":[{"id":"a","title":"A"},{"id":"b","title":"B"}]}"#,
        )
        .unwrap();
        let input = read_events(&envelope).unwrap();
        assert_eq!(input.events.len(), 2);
        assert_eq!(input.title.as_deref(), Some("T"));
        assert_eq!(input.text.as_deref(), Some("src"));
    }

    #[test]
    fn parse_errors_name_the_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("broken.json");
        fs::write(&path, "{not json").unwrap();
        let err = read_graph(&path).unwrap_err();
        assert!(format!("{err:#}").contains("broken.json"));
    }

    #[test]
    fn write_json_ends_with_newline() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("out.json");
        write_json(&path, &serde_json::json!({"ok": true})).unwrap();
        let body = fs::read_to_string(&path).unwrap();
        assert!(body.ends_with("}\n"));
    }
}
