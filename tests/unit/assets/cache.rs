use std::cell::Cell;
use std::io::Cursor;

use super::*;
use crate::assets::source::MemoryAssetSource;

fn png_bytes(w: u32, h: u32) -> Vec<u8> {
    let img = image::RgbaImage::from_pixel(w, h, image::Rgba([10, 20, 30, 255]));
    let mut buf = Vec::new();
    image::DynamicImage::ImageRgba8(img)
        .write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
        .unwrap();
    buf
}

fn cache_with(files: &[&str]) -> ImageCache {
    let mut src = MemoryAssetSource::new();
    for f in files {
        src.insert(f, png_bytes(2, 2)).unwrap();
    }
    ImageCache::new(src)
}

#[test]
fn same_path_returns_identical_handle() {
    let mut cache = cache_with(&["a.png"]);
    let p = AssetPath::new("a.png").unwrap();
    let h1 = cache.get_or_create(&p);
    let h2 = cache.get_or_create(&AssetPath::new("./a.png").unwrap());
    assert!(h1.ptr_eq(&h2));
    assert_eq!(cache.len(), 1);
    assert_eq!(cache.pending(), 1);
}

#[test]
fn in_flight_then_loaded_handle_is_reused() {
    let mut cache = cache_with(&["a.png"]);
    let p = AssetPath::new("a.png").unwrap();
    let h1 = cache.get_or_create(&p);
    assert!(h1.is_loading());

    assert_eq!(cache.pump(), 1);
    assert!(h1.is_ready());
    assert_eq!(h1.image().unwrap().width, 2);

    let h2 = cache.get_or_create(&p);
    assert!(h1.ptr_eq(&h2));
    assert_eq!(cache.pump(), 0);
    assert_eq!(cache.load_count(&p), 1);
}

#[test]
fn missing_asset_fails_the_handle() {
    let mut cache = cache_with(&[]);
    let h = cache.get_or_create(&AssetPath::new("nope.png").unwrap());
    cache.pump();
    assert!(h.is_failed());
    assert!(!h.is_ready());
    assert!(matches!(h.state(), LoadState::Failed(msg) if msg.contains("nope.png")));
}

#[test]
fn hash_collision_falls_back_to_exact_path() {
    let mut cache = cache_with(&["a.png", "b.png"]);
    let a = AssetPath::new("a.png").unwrap();
    let forged = AssetPath {
        rel: "b.png".to_string(),
        id: a.id(),
    };
    let ha = cache.get_or_create(&a);
    let hb = cache.get_or_create(&forged);
    assert!(!ha.ptr_eq(&hb));
    assert_eq!(cache.len(), 2);
    assert!(cache.get(&forged).unwrap().ptr_eq(&hb));
}

#[test]
fn waiters_run_once_on_settle() {
    let mut cache = cache_with(&["a.png"]);
    let h = cache.get_or_create(&AssetPath::new("a.png").unwrap());
    let hits = std::rc::Rc::new(Cell::new(0));
    let hits2 = hits.clone();
    assert!(h.when_settled(Box::new(move || hits2.set(hits2.get() + 1))));

    cache.pump();
    assert_eq!(hits.get(), 1);

    // Already settled: the waiter is refused and a repeated settle is ignored.
    assert!(!h.when_settled(Box::new(|| panic!("must not run"))));
    h.settle(Err(crate::SpriteError::asset_load("late")));
    assert!(h.is_ready());
    assert_eq!(hits.get(), 1);
}

#[test]
fn pump_is_fifo() {
    let mut cache = cache_with(&["a.png", "b.png"]);
    let ha = cache.get_or_create(&AssetPath::new("a.png").unwrap());
    let hb = cache.get_or_create(&AssetPath::new("b.png").unwrap());
    assert!(cache.pump_one());
    assert!(ha.is_ready());
    assert!(hb.is_loading());
    assert!(cache.pump_one());
    assert!(!cache.pump_one());
}
