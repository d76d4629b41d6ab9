//! End-to-end document flow: build, serialize, reload, compose.

use card_core::{
    compose, enforce_size_limit, engine, CardError, Document, ElementContent, ElementDraft,
    ElementPatch, LayerContent, Position, Size,
};

fn draft(content: ElementContent, x: f64, y: f64, width: f64, height: f64) -> ElementDraft {
    ElementDraft::new(
        content,
        Position { x, y },
        Size { width, height },
    )
}

#[test]
fn edited_documents_survive_a_save_and_reload_and_compose_identically() {
    let doc = Document::new(800, 1000, "#ffffff").expect("valid dimensions");

    let (doc, text_id) = engine::add_element(
        &doc,
        draft(ElementContent::text("Grandma's Pancakes", 24.0, "#2d3748"), 50.0, 50.0, 200.0, 30.0),
    )
    .expect("add text");
    let (doc, step_id) = engine::add_element(
        &doc,
        draft(ElementContent::step("Whisk the batter", 16.0, "#000"), 50.0, 150.0, 300.0, 40.0),
    )
    .expect("add step");

    let saved = doc.to_json().expect("serialize");
    let reloaded = Document::from_json(&saved).expect("deserialize");
    assert_eq!(reloaded, doc);

    let composite = compose(&reloaded);
    assert_eq!(composite.width, 800);
    assert_eq!(composite.height, 1000);
    assert_eq!(composite.layers.len(), 2);

    // creation order carries into paint order here: the step was added later
    assert_eq!(composite.layers[0].id, text_id);
    assert_eq!(composite.layers[1].id, step_id);

    let text_layer = &composite.layers[0];
    assert!((text_layer.frame.x - 50.0).abs() < f64::EPSILON);
    assert!((text_layer.frame.y - 50.0).abs() < f64::EPSILON);
    assert!(matches!(
        &text_layer.content,
        LayerContent::Text { bold: false, .. }
    ));

    let step_layer = &composite.layers[1];
    assert!((step_layer.frame.y - 150.0).abs() < f64::EPSILON);
    let LayerContent::Text { text, bold, .. } = &step_layer.content else {
        panic!("expected a text layer");
    };
    assert_eq!(text, "Whisk the batter");
    assert!(*bold);
}

#[test]
fn a_full_editing_round_keeps_every_invariant() {
    let doc = Document::default();

    let (doc, title) = engine::add_element(
        &doc,
        draft(ElementContent::text("Soup", 32.0, "#111"), 250.0, 40.0, 300.0, 50.0),
    )
    .expect("add title");
    let (doc, icon) = engine::add_element(
        &doc,
        draft(
            ElementContent::svg_icon(
                "Carrot",
                r##"<svg viewBox="0 0 24 24"><path d="M4 20l8-12 8 12z" fill="#fb8c00"/></svg>"##,
            ),
            30.0,
            30.0,
            48.0,
            48.0,
        ),
    )
    .expect("add icon");

    // drag the icon off the top-left corner; both axes clamp to the page
    let doc = engine::move_element(&doc, &icon, Position { x: -20.0, y: -3.0 });
    // retitle without losing font size
    let mut data = serde_json::Map::new();
    data.insert("text".to_string(), serde_json::json!("Carrot Soup"));
    let doc = engine::update_element(&doc, &title, &ElementPatch::data(data));

    let saved = doc.to_json().expect("serialize");
    enforce_size_limit(&saved, 204_800).expect("a two-element card is small");
    let reloaded = Document::from_json(&saved).expect("deserialize");

    let icon_element = reloaded.element(&icon).expect("icon survived");
    assert!((icon_element.position.x - 0.0).abs() < f64::EPSILON);
    assert!((icon_element.position.y - 0.0).abs() < f64::EPSILON);

    let composite = compose(&reloaded);
    assert!(composite
        .layers
        .iter()
        .any(|layer| matches!(&layer.content, LayerContent::Icon { .. })));
    assert!(composite.layers.iter().any(|layer| matches!(
        &layer.content,
        LayerContent::Text { text, .. } if text == "Carrot Soup"
    )));
}

#[test]
fn oversize_documents_are_rejected_with_both_numbers() {
    let mut doc = Document::default();
    // a wall of text elements pushes the serialized form past a small limit
    for row in 0..12 {
        let (next, _) = engine::add_element(
            &doc,
            draft(
                ElementContent::text("x".repeat(64), 14.0, "#000"),
                10.0,
                f64::from(row) * 30.0,
                400.0,
                24.0,
            ),
        )
        .expect("add");
        doc = next;
    }

    let payload = doc.to_json().expect("serialize");
    let limit = 512;
    assert!(payload.len() > limit);

    let err = enforce_size_limit(&payload, limit).expect_err("over the limit");
    let CardError::PayloadTooLarge {
        measured_bytes,
        limit_bytes,
    } = err
    else {
        panic!("expected a size error");
    };
    assert_eq!(measured_bytes, payload.len());
    assert_eq!(limit_bytes, limit);
}
