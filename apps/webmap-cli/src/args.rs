//! Command line parsing.

use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use anyhow::{anyhow, bail, Context, Result};
use webmap_core::{ServerId, TileRequest};
use webmap_tile::TileServiceConfig;

/// What to run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Write an upload batch into a dimension.
    Ingest {
        db: PathBuf,
        server: ServerId,
        dimension: String,
        batch: PathBuf,
        verify: bool,
    },
    /// Render a tile to a PNG file.
    Render {
        db: PathBuf,
        request: TileRequest,
        output: PathBuf,
    },
    /// List the dimensions registered for a server.
    Dimensions { db: PathBuf, server: ServerId },
}

/// Parsed command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cli {
    pub command: Command,
    /// JSON file with a [`TileServiceConfig`].
    pub config_path: Option<PathBuf>,
    pub cache_ttl_ms: Option<u64>,
    pub read_timeout_ms: Option<u64>,
    pub max_region_chunks: Option<u32>,
}

fn value<'a>(args: &'a [String], i: &mut usize, flag: &str) -> Result<&'a str> {
    *i += 1;
    args.get(*i)
        .map(String::as_str)
        .ok_or_else(|| anyhow!("{flag} requires a value"))
}

fn number<T>(raw: &str, flag: &str) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    raw.parse().with_context(|| format!("invalid value for {flag}: {raw:?}"))
}

impl Cli {
    /// Parse from the process arguments.
    pub fn from_args() -> Result<Self> {
        let args: Vec<String> = std::env::args().collect();
        Self::parse_args(&args)
    }

    /// Parse `args`, where `args[0]` is the program name.
    ///
    /// Flags may appear anywhere; the remaining words are the subcommand and
    /// its positional arguments.
    pub fn parse_args(args: &[String]) -> Result<Self> {
        let mut positional = Vec::new();
        let mut config_path = None;
        let mut cache_ttl_ms = None;
        let mut read_timeout_ms = None;
        let mut max_region_chunks = None;
        let mut verify = false;
        let mut output = None;
        let (mut x, mut z, mut w, mut h, mut scale, mut y) = (0, 0, 1, 1, 1, None);

        let mut i = 1;
        while i < args.len() {
            let flag = args[i].as_str();
            match flag {
                "-c" | "--config" => config_path = Some(PathBuf::from(value(args, &mut i, flag)?)),
                "--cache-ttl-ms" => cache_ttl_ms = Some(number(value(args, &mut i, flag)?, flag)?),
                "--read-timeout-ms" => read_timeout_ms = Some(number(value(args, &mut i, flag)?, flag)?),
                "--max-region" => max_region_chunks = Some(number(value(args, &mut i, flag)?, flag)?),
                "--verify" => verify = true,
                "-o" | "--output" => output = Some(PathBuf::from(value(args, &mut i, flag)?)),
                "-x" | "--x" => x = number(value(args, &mut i, flag)?, flag)?,
                "-z" | "--z" => z = number(value(args, &mut i, flag)?, flag)?,
                "-w" | "--w" => w = number(value(args, &mut i, flag)?, flag)?,
                "--h" => h = number(value(args, &mut i, flag)?, flag)?,
                "-s" | "--scale" => scale = number(value(args, &mut i, flag)?, flag)?,
                "-y" | "--y" => y = Some(number(value(args, &mut i, flag)?, flag)?),
                other if other.starts_with('-') && other.len() > 1 && other.parse::<i64>().is_err() => {
                    bail!("unknown option {other}");
                }
                other => positional.push(other.to_string()),
            }
            i += 1;
        }

        let mut words = positional.into_iter();
        let mut next = |what: &str| words.next().ok_or_else(|| anyhow!("missing <{what}>"));

        let command = match next("command")?.as_str() {
            "ingest" => Command::Ingest {
                db: next("db").map(PathBuf::from)?,
                server: ServerId(number(&next("server")?, "<server>")?),
                dimension: next("dimension")?,
                batch: next("batch").map(PathBuf::from)?,
                verify,
            },
            "render" => {
                let db = next("db").map(PathBuf::from)?;
                let server = ServerId(number(&next("server")?, "<server>")?);
                let dimension = next("dimension")?;
                let mut request = TileRequest::new(server, dimension, x, z)
                    .with_size(w, h)
                    .with_scale(scale);
                if let Some(y) = y {
                    request = request.with_layer(y);
                }
                Command::Render {
                    db,
                    request,
                    output: output.unwrap_or_else(|| PathBuf::from("tile.png")),
                }
            }
            "dimensions" => Command::Dimensions {
                db: next("db").map(PathBuf::from)?,
                server: ServerId(number(&next("server")?, "<server>")?),
            },
            other => bail!("unknown command {other:?}"),
        };
        if let Some(extra) = words.next() {
            bail!("unexpected argument {extra:?}");
        }

        Ok(Self {
            command,
            config_path,
            cache_ttl_ms,
            read_timeout_ms,
            max_region_chunks,
        })
    }

    /// Service configuration: the config file if given, then flag overrides.
    pub fn service_config(&self) -> Result<TileServiceConfig> {
        let mut config = match &self.config_path {
            Some(path) => load_config(path)?,
            None => TileServiceConfig::default(),
        };
        if let Some(ttl) = self.cache_ttl_ms {
            config.cache_ttl_ms = ttl;
        }
        if let Some(timeout) = self.read_timeout_ms {
            // 0 disables the bound
            config.read_timeout_ms = (timeout > 0).then_some(timeout);
        }
        if let Some(max) = self.max_region_chunks {
            config.max_region_chunks = max;
        }
        Ok(config)
    }
}

fn load_config(path: &Path) -> Result<TileServiceConfig> {
    let json = fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    serde_json::from_str(&json).with_context(|| format!("parsing {}", path.display()))
}
