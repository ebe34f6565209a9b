//! Webmap command-line front end
//!
//! Ingests chunk upload batches into a chunk store and renders composite
//! tiles from it.
//!
//! ## Usage
//!
//! ```bash
//! cargo run -p webmap-cli -- <COMMAND> [ARGS] [OPTIONS]
//! ```
//!
//! ## Commands
//!
//! - `ingest <db> <server> <dimension> <batch.json>`: Write an upload batch
//! - `render <db> <server> <dimension>`: Render a tile to PNG
//! - `dimensions <db> <server>`: List a server's dimensions
//!
//! ## Environment Variables
//!
//! - `RUST_LOG`: Set log level (e.g., info, debug, trace)

mod args;
mod upload;

use std::fs;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use tracing::info;
use tracing_subscriber::EnvFilter;
use webmap_core::{CellWrite, ServerId};
use webmap_store::{ChunkDb, ChunkRepository, NamespaceResolver};
use webmap_tile::TileService;

use crate::args::{Cli, Command};
use crate::upload::{load_batch, UPLOAD_BATCH};

fn main() -> Result<()> {
    if std::env::args().any(|arg| arg == "-h" || arg == "--help") || std::env::args().len() < 2 {
        print_help();
        return Ok(());
    }

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::from_args()?;
    let config = cli.service_config()?;

    match cli.command {
        Command::Ingest {
            db,
            server,
            dimension,
            batch,
            verify,
        } => {
            let cells = load_batch(&batch)?;
            let store = Arc::new(ChunkDb::open(&db).with_context(|| format!("opening {}", db.display()))?);
            let service = TileService::new(Arc::clone(&store), config);
            for chunk in cells.chunks(UPLOAD_BATCH) {
                service.write_cells(server, &dimension, chunk)?;
            }
            info!(%server, %dimension, cells = cells.len(), "ingested batch");
            if verify {
                verify_cells(&*store, server, &dimension, &cells)?;
                info!(cells = cells.len(), "verified stored cells");
            }
        }
        Command::Render { db, request, output } => {
            let store = Arc::new(ChunkDb::open(&db).with_context(|| format!("opening {}", db.display()))?);
            let service = TileService::new(store, config);
            let png = service.render_tile(&request)?;
            fs::write(&output, &png).with_context(|| format!("writing {}", output.display()))?;
            let (width, height) = request.pixel_size();
            info!(path = %output.display(), width, height, bytes = png.len(), "rendered tile");
        }
        Command::Dimensions { db, server } => {
            let store = ChunkDb::open(&db).with_context(|| format!("opening {}", db.display()))?;
            for (dimension, namespace) in store.dimensions(server)? {
                println!("{dimension}\t{namespace}");
            }
        }
    }

    Ok(())
}

/// Read every written cell back and compare it with the upload.
fn verify_cells<S>(store: &S, server: ServerId, dimension: &str, cells: &[CellWrite]) -> Result<()>
where
    S: NamespaceResolver + ChunkRepository,
{
    let namespace = store.resolve_namespace(server, dimension)?;
    // later entries win for duplicated coordinates
    let mut expected = std::collections::HashMap::new();
    for cell in cells {
        expected.insert(cell.pos, cell);
    }
    for (pos, cell) in expected {
        match store.get_cell(namespace, pos)? {
            Some(stored) if stored.color == cell.color && stored.meta == cell.meta => {}
            Some(_) => bail!("cell {pos:?} differs from upload"),
            None => bail!("cell {pos:?} missing after upload"),
        }
    }
    Ok(())
}

fn print_help() {
    eprintln!(
        "Webmap chunk store

USAGE:
    cargo run -p webmap-cli -- <COMMAND> [ARGS] [OPTIONS]

COMMANDS:
    ingest <db> <server> <dimension> <batch.json>
                            Write a JSON upload batch into a dimension
    render <db> <server> <dimension>
                            Render a tile to a PNG file
    dimensions <db> <server>
                            List dimensions registered for a server

INGEST OPTIONS:
    --verify                Read every cell back after writing

RENDER OPTIONS:
    -x, --x <N>             First chunk column (default: 0)
    -z, --z <N>             First chunk row (default: 0)
    -w, --w <N>             Width in chunks (default: 1)
    --h <N>                 Height in chunks (default: 1)
    -s, --scale <N>         Downsampling factor, 1-16 (default: 1)
    -y, --y <N>             Layer (default: -9999, the surface map)
    -o, --output <PATH>     Output file (default: tile.png)

SERVICE OPTIONS:
    -c, --config <FILE>     JSON service configuration
    --cache-ttl-ms <N>      Tile cache time-to-live (default: 60000)
    --read-timeout-ms <N>   Tile computation bound, 0 disables (default: 10000)
    --max-region <N>        Largest footprint per axis (default: 64)

OTHER:
    -h, --help              Print this help message

BATCH FORMAT:
    [{{ \"x\": 0, \"z\": 0, \"y\": -9999, \"data\": \"<base64>\", \"meta\": \"{{}}\" }}]
    data is a PNG 16x16 block or raw 16x16 RGBA (1024 bytes)
    x, y and z may be integers or decimal strings; a string meta is stored as-is

EXAMPLES:
    # Ingest a batch for server 1
    cargo run -p webmap-cli -- ingest map.redb 1 minecraft:overworld batch.json

    # Render an 8x8 chunk area at half resolution
    cargo run -p webmap-cli -- render map.redb 1 minecraft:overworld -x -4 -z -4 -w 8 --h 8 -s 2

ENVIRONMENT VARIABLES:
    RUST_LOG                Set log level (e.g., info, debug, trace)"
    );
}
