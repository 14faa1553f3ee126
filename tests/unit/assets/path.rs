use super::*;
use crate::catalog::layers::{BaseLayer, OutfitLayer};

fn size() -> FrameSize {
    "48x64".parse().unwrap()
}

fn req(layer: LayerRef, body_type: Option<&'static str>, index: u32) -> AssetRequest<'static> {
    AssetRequest {
        size: size(),
        body_type,
        layer,
        index,
        suffix: None,
    }
}

#[test]
fn index_padding_convention() {
    assert_eq!(index_string(0), "000");
    assert_eq!(index_string(7), "007");
    assert_eq!(index_string(42), "042");
    assert_eq!(index_string(99), "099");
    assert_eq!(index_string(100), "100");
    assert_eq!(index_string(150), "150");
    assert_eq!(index_string(1234), "1234");
}

#[test]
fn unique_base_layers_are_per_body_type() {
    let p = resolve(&req(LayerRef::Base(BaseLayer::Arms), Some("elder"), 1)).unwrap();
    assert_eq!(p.as_str(), "48x64/base/body/elder/arms/001.png");

    let err = resolve(&req(LayerRef::Base(BaseLayer::Body), None, 0)).unwrap_err();
    assert!(matches!(err, SpriteError::Validation(_)));
}

#[test]
fn common_base_layers_ignore_body_type() {
    let a = resolve(&req(LayerRef::Base(BaseLayer::Eyes), Some("adult"), 7)).unwrap();
    let b = resolve(&req(LayerRef::Base(BaseLayer::Eyes), Some("child"), 7)).unwrap();
    assert_eq!(a.as_str(), "48x64/base/eyes/007.png");
    assert_eq!(a, b);
}

#[test]
fn suffix_goes_before_extension() {
    let mut r = req(LayerRef::Base(BaseLayer::Head), Some("adult"), 2);
    r.suffix = Some("rear");
    assert_eq!(resolve(&r).unwrap().as_str(), "48x64/base/head/002-rear.png");
}

#[test]
fn outfit_paths_with_and_without_body() {
    let p = resolve(&req(LayerRef::Outfit(OutfitLayer::Hair), None, 150)).unwrap();
    assert_eq!(p.as_str(), "48x64/outfit/hair/150.png");

    let p = resolve(&req(LayerRef::Outfit(OutfitLayer::Torso), Some("adult"), 2)).unwrap();
    assert_eq!(p.as_str(), "48x64/outfit/body/adult/torso/002.png");
}

#[test]
fn outfit_index_zero_never_resolves() {
    for layer in OutfitLayer::ALL {
        assert!(resolve(&req(LayerRef::Outfit(layer), None, 0)).is_err());
    }
}

#[test]
fn every_in_range_request_matches_convention() {
    for layer in BaseLayer::ALL {
        for idx in [0u32, 1, 9, 99, 100, 101] {
            let p = resolve(&req(LayerRef::Base(layer), Some("adult"), idx)).unwrap();
            let s = p.as_str();
            assert!(s.starts_with("48x64/base/"));
            assert!(s.ends_with(&format!("/{}/{}.png", layer.name(), index_string(idx))));
            assert_eq!(s.contains("/body/adult/"), layer.is_unique());
        }
    }
}

#[test]
fn join_path_trims_delimiters() {
    assert_eq!(join_path(&["/48x64/", " base", "head/", "000.png"]), "48x64/base/head/000.png");
}

#[test]
fn normalize_path_slash_normalization() {
    assert_eq!(normalize_rel_path("a/b.png").unwrap(), "a/b.png");
    assert_eq!(normalize_rel_path("a\\b.png").unwrap(), "a/b.png");
    assert_eq!(normalize_rel_path("./a//b.png").unwrap(), "a/b.png");
    assert!(normalize_rel_path("../x.png").is_err());
    assert!(normalize_rel_path("/abs.png").is_err());
    assert!(normalize_rel_path("").is_err());
}

#[test]
fn asset_id_is_stable_and_path_derived() {
    let a = AssetPath::new("48x64/base/head/000.png").unwrap();
    let b = AssetPath::new("48x64\\base\\head\\000.png").unwrap();
    let c = AssetPath::new("48x64/base/head/001.png").unwrap();
    assert_eq!(a.id(), b.id());
    assert_ne!(a.id(), c.id());
    assert_eq!(AssetId::from_u64(a.id().as_u64()), a.id());
}
