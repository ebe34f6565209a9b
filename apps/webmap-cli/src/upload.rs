//! Upload batch format.
//!
//! A batch file is a JSON array of chunk uploads:
//!
//! ```json
//! [{ "x": 3, "z": -2, "data": "<base64>", "meta": { "biome": "plains" } }]
//! ```
//!
//! `data` is either a PNG-encoded 16x16 block or a raw 16x16 RGBA block
//! (1024 bytes, row = z, column = x). `y` defaults to the surface layer.
//! Coordinates may be JSON integers or decimal strings. A string `meta` is
//! stored as-is; any other JSON value is stored in compact form.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::de::Error as _;
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use webmap_core::constants::DEFAULT_LAYER;
use webmap_core::{CellPos, CellWrite};

/// Number of cells written per store transaction.
pub const UPLOAD_BATCH: usize = 100;

const fn default_layer() -> i32 {
    DEFAULT_LAYER
}

#[derive(Deserialize)]
#[serde(untagged)]
enum Coordinate {
    Int(i64),
    Text(String),
}

fn coordinate<'de, D>(deserializer: D) -> std::result::Result<i32, D::Error>
where
    D: Deserializer<'de>,
{
    let wide = match Coordinate::deserialize(deserializer)? {
        Coordinate::Int(n) => n,
        Coordinate::Text(text) => text
            .trim()
            .parse()
            .map_err(|_| D::Error::custom(format!("coordinate {text:?} is not an integer")))?,
    };
    i32::try_from(wide).map_err(|_| D::Error::custom(format!("coordinate {wide} out of range")))
}

/// One chunk as it appears in a batch file.
#[derive(Debug, Clone, Deserialize)]
pub struct ChunkUpload {
    #[serde(deserialize_with = "coordinate")]
    pub x: i32,
    #[serde(default = "default_layer", deserialize_with = "coordinate")]
    pub y: i32,
    #[serde(deserialize_with = "coordinate")]
    pub z: i32,
    pub data: String,
    #[serde(default)]
    pub meta: Value,
}

impl ChunkUpload {
    /// Decode the payload into a cell write.
    pub fn into_cell(self) -> Result<CellWrite> {
        let color = STANDARD
            .decode(self.data.as_bytes())
            .with_context(|| format!("chunk ({}, {}, {}) has invalid base64 data", self.x, self.y, self.z))?;
        let meta = match self.meta {
            Value::Null => String::new(),
            Value::String(raw) => raw,
            other => other.to_string(),
        };
        Ok(CellWrite::new(CellPos::new(self.x, self.y, self.z), color, meta))
    }
}

/// Parse a batch from JSON text.
pub fn parse_batch(json: &str) -> Result<Vec<CellWrite>> {
    let uploads: Vec<ChunkUpload> = serde_json::from_str(json).context("malformed upload batch")?;
    uploads.into_iter().map(ChunkUpload::into_cell).collect()
}

/// Read and parse a batch file.
pub fn load_batch(path: &Path) -> Result<Vec<CellWrite>> {
    let json = fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    parse_batch(&json).with_context(|| format!("parsing {}", path.display()))
}
