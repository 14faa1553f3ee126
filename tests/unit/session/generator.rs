use std::io::Cursor;

use super::*;
use crate::assets::source::MemoryAssetSource;
use crate::catalog::layers::OutfitLayer;

const CATALOG: &str = r#"{
    "2x2": {
        "base": {
            "adult": { "body": 1, "arms": 1, "head": 1, "eyes": 1, "ears": 1 },
            "child": { "body": 1, "arms": 1, "head": 1, "eyes": 1, "ears": 1 }
        },
        "outfit": { "hair": 2, "hat": 1 }
    }
}"#;

const RED: [u8; 4] = [255, 0, 0, 255];
const BLUE: [u8; 4] = [0, 0, 255, 255];
const GREY: [u8; 4] = [90, 90, 90, 255];
const CLEAR: [u8; 4] = [0, 0, 0, 0];

fn png(px: [u8; 4]) -> Vec<u8> {
    let img = image::RgbaImage::from_pixel(6, 8, image::Rgba(px));
    let mut buf = Vec::new();
    image::DynamicImage::ImageRgba8(img)
        .write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
        .unwrap();
    buf
}

fn source(skip: &[&str]) -> MemoryAssetSource {
    let mut src = MemoryAssetSource::new();
    let files = [
        ("2x2/base/head/000-rear.png", CLEAR),
        ("2x2/base/ears/000-rear.png", CLEAR),
        ("2x2/base/body/adult/body/000.png", GREY),
        ("2x2/base/body/adult/arms/000.png", CLEAR),
        ("2x2/base/body/child/body/000.png", GREY),
        ("2x2/base/body/child/arms/000.png", CLEAR),
        ("2x2/base/head/000.png", CLEAR),
        ("2x2/base/eyes/000.png", CLEAR),
        ("2x2/base/ears/000.png", CLEAR),
        ("2x2/outfit/hair/001.png", RED),
        ("2x2/outfit/hair/002.png", BLUE),
    ];
    for (path, px) in files {
        if !skip.contains(&path) {
            src.insert(path, png(px)).unwrap();
        }
    }
    src
}

fn generator(skip: &[&str]) -> SpriteGenerator {
    let catalog = LayerCatalog::from_reader(CATALOG.as_bytes()).unwrap();
    SpriteGenerator::new(catalog, source(skip), GeneratorOpts::default())
}

fn hair(index: u32) -> SelectionState {
    SelectionState::new(FrameSize::new(2, 2).unwrap(), "adult")
        .with_outfit(OutfitLayer::Hair, index)
}

fn sheet_px(g: &SpriteGenerator) -> Option<[u8; 4]> {
    g.sheet().and_then(|s| s.pixel(0, 0))
}

#[test]
fn render_completes_after_advance() {
    let mut g = generator(&[]);
    assert_eq!(g.status(), &RenderStatus::Idle);

    let generation = g.render(hair(1)).unwrap();
    assert_eq!(g.status(), &RenderStatus::Loading { generation });
    assert!(g.sheet().is_none());

    g.advance(Duration::ZERO).unwrap();
    assert_eq!(g.status(), &RenderStatus::Ready { generation });
    let sheet = g.sheet().unwrap();
    assert_eq!((sheet.width, sheet.height), (6, 8));
    assert_eq!(sheet_px(&g), Some(RED));
    assert!(g.animation().is_running());
    assert_eq!(g.preview().map(|p| (p.width, p.height)), Some((6, 2)));
    assert!(g.last_error().is_none());
}

#[test]
fn cached_render_completes_synchronously() {
    let mut g = generator(&[]);
    g.render(hair(1)).unwrap();
    g.advance(Duration::ZERO).unwrap();

    let generation = g.render(hair(1)).unwrap();
    assert_eq!(g.status(), &RenderStatus::Ready { generation });
    assert_eq!(g.cache().pending(), 0);
}

#[test]
fn repeated_selection_reuses_cached_images() {
    let mut g = generator(&[]);
    g.render(hair(2)).unwrap();
    g.advance(Duration::ZERO).unwrap();
    let entries = g.cache().len();

    g.render(hair(2)).unwrap();
    g.advance(Duration::ZERO).unwrap();
    assert_eq!(g.cache().len(), entries);

    let path = crate::assets::path::AssetPath::new("2x2/outfit/hair/002.png").unwrap();
    assert_eq!(g.cache().load_count(&path), 1);
}

#[test]
fn superseded_render_never_draws() {
    let mut g = generator(&[]);
    let first = g.render(hair(1)).unwrap();
    let second = g.render(hair(2)).unwrap();
    assert!(second > first);

    // A late completion of the first render is ignored.
    g.mailbox
        .borrow_mut()
        .push_back(LoadEvent::Complete { generation: first });
    g.drain_mailbox().unwrap();
    assert!(g.sheet().is_none());
    assert_eq!(g.status(), &RenderStatus::Loading { generation: second });

    g.advance(Duration::ZERO).unwrap();
    assert_eq!(g.status(), &RenderStatus::Ready { generation: second });
    assert_eq!(sheet_px(&g), Some(BLUE));
}

#[test]
fn invalid_selection_keeps_previous_sheet() {
    let mut g = generator(&[]);
    let generation = g.render(hair(1)).unwrap();
    g.advance(Duration::ZERO).unwrap();

    let bad = SelectionState::new(FrameSize::new(2, 2).unwrap(), "giant");
    assert!(matches!(g.render(bad), Err(SpriteError::InvalidSelection(_))));
    let out_of_range = hair(3);
    assert!(matches!(
        g.render(out_of_range),
        Err(SpriteError::InvalidSelection(_))
    ));

    assert_eq!(g.generation(), generation);
    assert_eq!(g.status(), &RenderStatus::Ready { generation });
    assert_eq!(sheet_px(&g), Some(RED));
    assert!(g.animation().is_running());
    assert_eq!(g.current_selection(), Some(&hair(1)));
}

#[test]
fn failed_asset_stalls_and_keeps_previous_sheet() {
    let mut g = generator(&["2x2/outfit/hair/002.png"]);
    g.render(hair(1)).unwrap();
    g.advance(Duration::ZERO).unwrap();

    let generation = g.render(hair(2)).unwrap();
    g.advance(Duration::ZERO).unwrap();

    assert_eq!(g.status(), &RenderStatus::Stalled { generation });
    assert!(matches!(g.last_error(), Some(SpriteError::AssetLoad(_))));
    assert_eq!(sheet_px(&g), Some(RED));
    assert!(g.animation().is_running());
}

#[test]
fn load_timeout_abandons_render() {
    let mut g = generator(&[]);
    let generation = g.render(hair(1)).unwrap();

    // Let time pass without performing any loads.
    g.run_timers_until(Duration::from_secs(4)).unwrap();
    assert_eq!(g.status(), &RenderStatus::Loading { generation });
    g.run_timers_until(Duration::from_secs(6)).unwrap();
    assert_eq!(g.status(), &RenderStatus::Stalled { generation });
    assert!(matches!(g.last_error(), Some(SpriteError::AssetLoad(_))));
    assert!(g.sheet().is_none());

    // Loads finishing afterwards do not resurrect the abandoned render.
    g.advance(Duration::ZERO).unwrap();
    assert_eq!(g.status(), &RenderStatus::Stalled { generation });
    assert!(g.sheet().is_none());
}

#[test]
fn completed_render_disarms_timeout() {
    let mut g = generator(&[]);
    let generation = g.render(hair(1)).unwrap();
    g.advance(Duration::from_secs(10)).unwrap();
    assert_eq!(g.status(), &RenderStatus::Ready { generation });
    assert_eq!(g.clock(), Duration::from_secs(10));
    assert!(g.animation().redraws() > 250);
}

#[test]
fn new_render_restarts_animation_once() {
    let mut g = generator(&[]);
    g.render(hair(1)).unwrap();
    g.advance(Duration::from_millis(100)).unwrap();
    g.render(hair(2)).unwrap();
    assert!(!g.animation().is_running());
    g.advance(Duration::from_millis(100)).unwrap();
    assert!(g.animation().is_running());
    assert_eq!(g.scheduler.len(), 1);
}

#[test]
fn build_png_requires_a_sheet() {
    let mut g = generator(&[]);
    assert!(matches!(g.build_png(), Err(SpriteError::Validation(_))));

    g.render(hair(1).with_upscale(true)).unwrap();
    g.advance(Duration::ZERO).unwrap();
    let png = g.build_png().unwrap();
    let decoded = image::load_from_memory(&png).unwrap();
    assert_eq!((decoded.width(), decoded.height()), (12, 16));
}

#[test]
fn zero_tick_interval_still_lets_advance_return() {
    let catalog = LayerCatalog::from_reader(CATALOG.as_bytes()).unwrap();
    let mut opts = GeneratorOpts::default();
    opts.animation.tick_interval = Duration::ZERO;
    let mut g = SpriteGenerator::new(catalog, source(&[]), opts);

    g.render(hair(1)).unwrap();
    g.advance(Duration::from_millis(10)).unwrap();
    assert_eq!(g.clock(), Duration::from_millis(10));
    assert_eq!(g.animation().redraws(), 11);
}
