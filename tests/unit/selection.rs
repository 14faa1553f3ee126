use super::*;

const SAMPLE: &str = include_str!("../data/layers.json");

fn catalog() -> LayerCatalog {
    LayerCatalog::from_reader(SAMPLE.as_bytes()).unwrap()
}

fn adult() -> SelectionState {
    SelectionState::new("48x64".parse().unwrap(), "adult")
}

#[test]
fn default_selection_is_valid() {
    adult().validate(&catalog()).unwrap();
}

#[test]
fn defaults_for_missing_entries() {
    let sel = adult();
    assert_eq!(sel.outfit_index(OutfitLayer::Hair), 0);
    assert!(sel.is_visible(BaseLayer::Eyes));
    assert!(sel.bodymap_override(OutfitLayer::Torso).unwrap().is_none());
}

#[test]
fn builders_produce_new_values() {
    let a = adult();
    let b = a.clone().with_outfit(OutfitLayer::Hair, 2).with_visible(BaseLayer::Eyes, false);
    assert_ne!(a, b);
    assert_eq!(b.outfit_index(OutfitLayer::Hair), 2);
    assert!(!b.is_visible(BaseLayer::Eyes));
}

#[test]
fn out_of_range_indices_are_rejected() {
    let cat = catalog();
    let err = adult().with_base(BaseLayer::Head, 3).validate(&cat).unwrap_err();
    assert!(matches!(err, SpriteError::InvalidSelection(_)));

    let err = adult().with_outfit(OutfitLayer::Hair, 6).validate(&cat).unwrap_err();
    assert!(matches!(err, SpriteError::InvalidSelection(_)));

    adult().with_outfit(OutfitLayer::Hair, 5).validate(&cat).unwrap();
}

#[test]
fn unknown_size_or_body_type_is_rejected() {
    let cat = catalog();
    let sel = SelectionState::new("96x128".parse().unwrap(), "adult");
    assert!(matches!(sel.validate(&cat), Err(SpriteError::InvalidSelection(_))));

    let sel = SelectionState::new("48x64".parse().unwrap(), "giant");
    assert!(matches!(sel.validate(&cat), Err(SpriteError::InvalidSelection(_))));
}

#[test]
fn missing_base_layer_is_rejected() {
    let mut sel = adult();
    sel.base.remove(&BaseLayer::Ears);
    assert!(matches!(
        sel.validate(&catalog()),
        Err(SpriteError::InvalidSelection(_))
    ));
}

#[test]
fn outfit_layer_with_zero_count_rejects_nonzero_index() {
    let sel =
        SelectionState::new("24x32".parse().unwrap(), "adult").with_outfit(OutfitLayer::Hat, 1);
    assert!(sel.validate(&catalog()).is_err());
}

#[test]
fn parses_ui_record() {
    let json = r#"{
        "size": "48x64",
        "body_type": "elder",
        "base": { "body": 1, "arms": 0, "head": 1, "eyes": 0, "ears": 0 },
        "outfit": { "hair": 2, "torso": 1 },
        "visible": { "eyes": false },
        "upscale": true,
        "bodymap": { "torso": "adult-1" }
    }"#;
    let sel = SelectionState::from_reader(json.as_bytes()).unwrap();
    assert_eq!(sel.body_type, "elder");
    assert!(sel.upscale);
    assert_eq!(
        sel.bodymap_override(OutfitLayer::Torso).unwrap(),
        Some(BodyMapping::Substitute {
            body_type: "adult".to_string(),
            index: 1
        })
    );
    sel.validate(&catalog()).unwrap();
}

#[test]
fn unknown_layer_names_fail_to_parse() {
    let json = r#"{ "size": "48x64", "body_type": "adult", "outfit": { "tail": 1 } }"#;
    assert!(matches!(
        SelectionState::from_reader(json.as_bytes()),
        Err(SpriteError::InvalidSelection(_))
    ));
}
