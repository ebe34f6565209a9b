use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Barrier};
use std::thread;
use std::time::Duration;

use image::{Rgb, RgbImage};
use webmap_core::constants::{BACKGROUND, RAW_CHUNK_LEN};
use webmap_core::{CellPos, CellWrite, NamespaceId, Region, ServerId, TileRequest};
use webmap_store::{
    CellScan, ChunkDb, ChunkRepository, NamespaceResolver, StoredCell, StoreError,
};
use webmap_tile::{encode_tile, TileError, TileService, TileServiceConfig};

/// Store wrapper counting region scans, optionally slowing them down.
struct CountingStore {
    inner: ChunkDb,
    scans: AtomicUsize,
    scan_delay: Duration,
}

impl CountingStore {
    fn new() -> Self {
        Self::with_delay(Duration::ZERO)
    }

    fn with_delay(scan_delay: Duration) -> Self {
        Self {
            inner: ChunkDb::in_memory().unwrap(),
            scans: AtomicUsize::new(0),
            scan_delay,
        }
    }

    fn scans(&self) -> usize {
        self.scans.load(Ordering::SeqCst)
    }
}

impl NamespaceResolver for CountingStore {
    fn resolve_namespace(&self, server: ServerId, dimension: &str) -> webmap_store::Result<NamespaceId> {
        self.inner.resolve_namespace(server, dimension)
    }

    fn ensure_namespace_storage(&self, namespace: NamespaceId) -> webmap_store::Result<()> {
        self.inner.ensure_namespace_storage(namespace)
    }

    fn dimensions(&self, server: ServerId) -> webmap_store::Result<Vec<(String, NamespaceId)>> {
        self.inner.dimensions(server)
    }
}

impl ChunkRepository for CountingStore {
    fn upsert_cells(&self, namespace: NamespaceId, cells: &[CellWrite]) -> webmap_store::Result<()> {
        self.inner.upsert_cells(namespace, cells)
    }

    fn scan_range(&self, namespace: NamespaceId, region: &Region) -> webmap_store::Result<CellScan> {
        self.scans.fetch_add(1, Ordering::SeqCst);
        if !self.scan_delay.is_zero() {
            thread::sleep(self.scan_delay);
        }
        self.inner.scan_range(namespace, region)
    }

    fn get_cell(&self, namespace: NamespaceId, pos: CellPos) -> webmap_store::Result<Option<StoredCell>> {
        self.inner.get_cell(namespace, pos)
    }
}

const SERVER: ServerId = ServerId(1);
const DIM: &str = "minecraft:overworld";
const BG: Rgb<u8> = Rgb(BACKGROUND);

fn solid_png(color: [u8; 3]) -> Vec<u8> {
    encode_tile(&RgbImage::from_pixel(16, 16, Rgb(color))).unwrap().to_vec()
}

fn cell(x: i32, z: i32, color: [u8; 3]) -> CellWrite {
    CellWrite::new(CellPos::on_default_layer(x, z), solid_png(color), "{}")
}

fn decode(bytes: &[u8]) -> RgbImage {
    image::load_from_memory(bytes).unwrap().to_rgb8()
}

fn service(store: &Arc<CountingStore>, config: TileServiceConfig) -> TileService<CountingStore> {
    TileService::new(Arc::clone(store), config)
}

#[test]
fn empty_dimension_renders_background() {
    let store = Arc::new(CountingStore::new());
    let service = service(&store, TileServiceConfig::default());

    let tile = decode(&service.render_tile(&TileRequest::new(SERVER, DIM, 0, 0).with_size(4, 3)).unwrap());
    assert_eq!(tile.dimensions(), (64, 48));
    assert!(tile.pixels().all(|p| *p == BG));

    // the read registered the dimension
    let dims = store.dimensions(SERVER).unwrap();
    assert_eq!(dims.len(), 1);
    assert_eq!(dims[0].0, DIM);
}

#[test]
fn written_cell_appears_at_offset() {
    let store = Arc::new(CountingStore::new());
    let service = service(&store, TileServiceConfig::default());
    service.write_cells(SERVER, DIM, &[cell(5, 5, [10, 200, 30])]).unwrap();

    let request = TileRequest::new(SERVER, DIM, 0, 0).with_size(10, 10);
    let tile = decode(&service.render_tile(&request).unwrap());
    assert_eq!(tile.dimensions(), (160, 160));
    for (x, y, pixel) in tile.enumerate_pixels() {
        let inside = (80..96).contains(&x) && (80..96).contains(&y);
        assert_eq!(*pixel, if inside { Rgb([10, 200, 30]) } else { BG });
    }
}

#[test]
fn second_write_replaces_first() {
    let store = Arc::new(CountingStore::new());
    let service = service(&store, TileServiceConfig::default());
    service.write_cells(SERVER, DIM, &[cell(0, 0, [1, 1, 1])]).unwrap();
    service.write_cells(SERVER, DIM, &[cell(0, 0, [2, 2, 2])]).unwrap();

    let namespace = store.resolve_namespace(SERVER, DIM).unwrap();
    let scan: Vec<_> = store
        .scan_range(namespace, &Region::new(0, 0, 1, 1, -9999))
        .unwrap()
        .collect();
    assert_eq!(scan.len(), 1);

    let tile = decode(&service.render_uncached(&TileRequest::new(SERVER, DIM, 0, 0)).unwrap());
    assert!(tile.pixels().all(|p| *p == Rgb([2, 2, 2])));
}

#[test]
fn identical_requests_scan_once() {
    let store = Arc::new(CountingStore::new());
    let service = service(&store, TileServiceConfig::default());
    service.write_cells(SERVER, DIM, &[cell(0, 0, [9, 9, 9])]).unwrap();

    let request = TileRequest::new(SERVER, DIM, 0, 0).with_size(2, 2);
    let first = service.render_tile(&request).unwrap();
    let second = service.render_tile(&request).unwrap();

    assert_eq!(first, second);
    assert_eq!(store.scans(), 1);

    service.render_tile(&request.clone().with_scale(2)).unwrap();
    assert_eq!(store.scans(), 2);
}

#[test]
fn concurrent_identical_renders_scan_once() {
    const CALLERS: usize = 8;
    let store = Arc::new(CountingStore::with_delay(Duration::from_millis(100)));
    let service = service(&store, TileServiceConfig::default());
    service.write_cells(SERVER, DIM, &[cell(1, 1, [7, 8, 9])]).unwrap();
    let request = TileRequest::new(SERVER, DIM, 0, 0).with_size(2, 2);
    let barrier = Barrier::new(CALLERS);

    let tiles: Vec<_> = thread::scope(|s| {
        let handles: Vec<_> = (0..CALLERS)
            .map(|_| {
                s.spawn(|| {
                    barrier.wait();
                    service.render_tile(&request).unwrap()
                })
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    assert_eq!(store.scans(), 1);
    assert!(tiles.iter().all(|tile| *tile == tiles[0]));
    let tile = decode(&tiles[0]);
    assert_eq!(tile.get_pixel(16, 16), &Rgb([7, 8, 9]));
}

#[test]
fn cached_tile_is_stale_until_ttl() {
    let store = Arc::new(CountingStore::new());
    let config = TileServiceConfig::default().with_cache_ttl(Duration::from_millis(100));
    let service = service(&store, config);
    let request = TileRequest::new(SERVER, DIM, 0, 0);

    service.write_cells(SERVER, DIM, &[cell(0, 0, [1, 1, 1])]).unwrap();
    let before = service.render_tile(&request).unwrap();

    service.write_cells(SERVER, DIM, &[cell(0, 0, [2, 2, 2])]).unwrap();
    let stale = service.render_tile(&request).unwrap();
    assert_eq!(stale, before);

    thread::sleep(Duration::from_millis(300));
    let fresh = decode(&service.render_tile(&request).unwrap());
    assert!(fresh.pixels().all(|p| *p == Rgb([2, 2, 2])));
}

#[test]
fn corrupt_cells_are_skipped() {
    let store = Arc::new(CountingStore::new());
    let service = service(&store, TileServiceConfig::default());
    service
        .write_cells(
            SERVER,
            DIM,
            &[
                CellWrite::new(CellPos::on_default_layer(0, 0), b"garbage".to_vec(), "{}"),
                cell(1, 0, [50, 60, 70]),
            ],
        )
        .unwrap();

    let tile = decode(&service.render_tile(&TileRequest::new(SERVER, DIM, 0, 0).with_size(2, 1)).unwrap());
    assert_eq!(tile.get_pixel(0, 0), &BG);
    assert_eq!(tile.get_pixel(16, 0), &Rgb([50, 60, 70]));
}

#[test]
fn raw_rgba_uploads_render() {
    let store = Arc::new(CountingStore::new());
    let service = service(&store, TileServiceConfig::default());
    let raw: Vec<u8> = [100u8, 110, 120, 127].repeat(RAW_CHUNK_LEN / 4);
    service
        .write_cells(SERVER, DIM, &[CellWrite::new(CellPos::on_default_layer(0, 0), raw, "{}")])
        .unwrap();

    let tile = decode(&service.render_tile(&TileRequest::new(SERVER, DIM, 0, 0)).unwrap());
    assert!(tile.pixels().all(|p| *p == Rgb([100, 110, 120])));
}

#[test]
fn layers_are_independent() {
    let store = Arc::new(CountingStore::new());
    let service = service(&store, TileServiceConfig::default());
    service
        .write_cells(
            SERVER,
            DIM,
            &[CellWrite::new(CellPos::new(0, 64, 0), solid_png([3, 3, 3]), "{}")],
        )
        .unwrap();

    let default_layer = decode(&service.render_tile(&TileRequest::new(SERVER, DIM, 0, 0)).unwrap());
    assert!(default_layer.pixels().all(|p| *p == BG));

    let layer = decode(&service.render_tile(&TileRequest::new(SERVER, DIM, 0, 0).with_layer(64)).unwrap());
    assert!(layer.pixels().all(|p| *p == Rgb([3, 3, 3])));
}

#[test]
fn downsampled_region() {
    let store = Arc::new(CountingStore::new());
    let service = service(&store, TileServiceConfig::default());
    service
        .write_cells(SERVER, DIM, &[cell(0, 0, [1, 2, 3]), cell(3, 3, [4, 5, 6])])
        .unwrap();

    let request = TileRequest::new(SERVER, DIM, 0, 0).with_size(4, 4).with_scale(4);
    let tile = decode(&service.render_tile(&request).unwrap());
    assert_eq!(tile.dimensions(), (16, 16));
    assert_eq!(tile.get_pixel(0, 0), &Rgb([1, 2, 3]));
    assert_eq!(tile.get_pixel(3, 3), &Rgb([1, 2, 3]));
    assert_eq!(tile.get_pixel(4, 0), &BG);
    assert_eq!(tile.get_pixel(12, 12), &Rgb([4, 5, 6]));
}

#[test]
fn invalid_requests_fail_before_scanning() {
    let store = Arc::new(CountingStore::new());
    let service = service(&store, TileServiceConfig::default());

    for request in [
        TileRequest::new(SERVER, DIM, 0, 0).with_scale(0),
        TileRequest::new(SERVER, DIM, 0, 0).with_size(0, 1),
        TileRequest::new(SERVER, DIM, 0, 0).with_size(65, 65),
    ] {
        assert!(matches!(service.render_tile(&request), Err(TileError::Request(_))));
    }
    assert_eq!(store.scans(), 0);
}

#[test]
fn slow_scan_exceeds_deadline_and_is_not_cached() {
    let store = Arc::new(CountingStore::with_delay(Duration::from_millis(50)));
    let config = TileServiceConfig::default().with_read_timeout(Some(Duration::from_millis(1)));
    let service = service(&store, config);
    let request = TileRequest::new(SERVER, DIM, 0, 0);

    let err = service.render_tile(&request).unwrap_err();
    assert!(matches!(err.unshared(), TileError::DeadlineExceeded(_)));

    let _ = service.render_tile(&request);
    assert_eq!(store.scans(), 2);
}

#[test]
fn disabled_cache_always_scans() {
    let store = Arc::new(CountingStore::new());
    let service = service(&store, TileServiceConfig::default().with_cache_capacity(0));
    let request = TileRequest::new(SERVER, DIM, 0, 0);

    service.render_tile(&request).unwrap();
    service.render_tile(&request).unwrap();
    assert_eq!(store.scans(), 2);
}

#[test]
fn unknown_namespace_surfaces_from_store() {
    let store = CountingStore::new();
    assert!(matches!(
        store.scan_range(NamespaceId(99), &Region::new(0, 0, 1, 1, 0)),
        Err(StoreError::UnknownNamespace(_))
    ));
}
