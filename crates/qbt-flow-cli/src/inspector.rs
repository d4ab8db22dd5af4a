//! Torrent source backed by a saved `/torrents/info` dump.
//!
//! # Design
//! - Accepts a bare torrent array, a single-client object, or a `clients` map.
//! - The file is re-read on every call so one inspector can serve several commands.

use std::path::{Path, PathBuf};

use anyhow::{Context, anyhow, bail};
use async_trait::async_trait;
use qbt_flow_torrent_core::TorrentInspector;
use serde_json::Value;

/// Reads torrents for a client from a JSON file on disk.
#[derive(Debug, Clone)]
pub(crate) struct JsonDumpInspector {
    path: PathBuf,
}

impl JsonDumpInspector {
    pub(crate) fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub(crate) fn path(&self) -> &Path {
        &self.path
    }

    async fn client_section(&self, client: &str) -> anyhow::Result<Value> {
        let text = tokio::fs::read_to_string(&self.path)
            .await
            .with_context(|| format!("failed to read torrent dump {}", self.path.display()))?;
        let document: Value = serde_json::from_str(&text)
            .with_context(|| format!("torrent dump {} is not valid JSON", self.path.display()))?;

        match document {
            Value::Object(mut map) if map.contains_key("clients") => {
                let Some(Value::Object(mut clients)) = map.remove("clients") else {
                    bail!("torrent dump field 'clients' must be an object");
                };
                clients
                    .remove(client)
                    .ok_or_else(|| anyhow!("torrent dump has no section for client '{client}'"))
            }
            other => Ok(other),
        }
    }
}

#[async_trait]
impl TorrentInspector for JsonDumpInspector {
    async fn list_raw(&self, client: &str) -> anyhow::Result<Vec<Value>> {
        match self.client_section(client).await? {
            Value::Array(torrents) => Ok(torrents),
            Value::Object(mut section) => match section.remove("torrents") {
                Some(Value::Array(torrents)) => Ok(torrents),
                Some(_) => bail!("torrent dump field 'torrents' must be an array"),
                None => bail!("torrent dump has no 'torrents' array"),
            },
            _ => bail!("torrent dump must be an array or an object"),
        }
    }

    async fn free_space_on_disk(&self, client: &str) -> anyhow::Result<Option<u64>> {
        let section = self.client_section(client).await?;
        let reported = section
            .get("free_space_on_disk")
            .or_else(|| section.pointer("/server_state/free_space_on_disk"));
        match reported {
            None | Some(Value::Null) => Ok(None),
            Some(value) => value
                .as_u64()
                .map(Some)
                .ok_or_else(|| anyhow!("free_space_on_disk must be a non-negative integer")),
        }
    }
}
