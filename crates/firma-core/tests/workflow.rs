//! Place, persist, reload and export a document

#[path = "common/pdf.rs"]
mod pdf;

use chrono::NaiveDate;
use firma_core::data_url::{measure_image, DataUrl};
use firma_core::{
    content_hash, export_pdf, ExportOptions, FieldPatch, FieldSeed, FieldStore,
    FileSessionStore, OfflineFontSource, ScreenPoint, SessionStore, SignatureLibrary,
};
use firma_types::{FieldDefaults, FieldType, PageView, SignatureKind, Size, UserProfile};
use lopdf::{Object, StringFormat};
use pdf::{assert_close, letter_pdf, num, ops_named, page_ops, png_data_url};
use pretty_assertions::assert_eq;

#[tokio::test]
async fn test_fields_survive_a_session_round_trip() {
    let input = letter_pdf(2);
    let hash = content_hash(&input);

    let profile = UserProfile {
        name: "Ada Lovelace".to_string(),
        ..Default::default()
    };
    let defaults = FieldDefaults::default();
    let seed = FieldSeed {
        profile: &profile,
        defaults: &defaults,
        today: NaiveDate::from_ymd_opt(2024, 3, 9).unwrap(),
    };
    // Zoomed to 150% on the second page
    let view = PageView::new(Size::new(612.0, 792.0), 1.5, 2);

    let mut store = FieldStore::new();
    let name_id = store
        .add_text_field(FieldType::FullName, &view, &seed)
        .unwrap()
        .id
        .clone();
    assert!(store
        .update_position(&name_id, ScreenPoint { x: 459.0, y: 594.0 }, &view)
        .unwrap());
    store.update_property(&name_id, FieldPatch::Bold(true)).unwrap();

    let mut library = SignatureLibrary::new();
    let url = png_data_url(30, 10);
    let signature_id = library.create(SignatureKind::Draw, url.clone()).id.clone();
    let placed_id = store
        .place_signature(&signature_id, &library, &view)
        .unwrap()
        .id
        .clone();
    let (w, h) = measure_image(&DataUrl::parse(&url).unwrap().bytes).unwrap();
    assert!(store.complete_signature_measurement(&placed_id, w, h));
    store.deselect_all();

    let field = store.text_field(&name_id).unwrap();
    assert_close(field.x, 0.5);
    assert_close(field.y, 0.5);
    assert_eq!(field.page, 2);
    assert_close(store.signature_field(&placed_id).unwrap().height, 50.0);

    let dir = tempfile::tempdir().unwrap();
    let sessions = FileSessionStore::new(dir.path());
    sessions
        .save(&store.snapshot(&hash, "lease.pdf", 1_700_000_000_000))
        .unwrap();
    let restored = FieldStore::restore(sessions.load(&hash).unwrap().unwrap());
    assert_eq!(restored.text_fields(), store.text_fields());
    assert_eq!(restored.signature_fields(), store.signature_fields());

    let out = export_pdf(
        &input,
        restored.text_fields(),
        restored.signature_fields(),
        &OfflineFontSource,
        &ExportOptions::default(),
    )
    .await
    .unwrap();
    assert_eq!(out.summary.pages, vec![2]);
    assert_eq!(out.summary.texts, 1);
    assert_eq!(out.summary.images, 1);

    let ops = page_ops(&out.bytes, 2);
    let tj = ops_named(&ops, "Tj");
    assert!(matches!(
        &tj[0].operands[0],
        Object::String(bytes, StringFormat::Literal) if bytes.as_slice() == b"Ada Lovelace"
    ));
    let td = ops_named(&ops, "Td");
    assert_close(num(&td[0].operands[0]), 310.0);
    assert_close(num(&td[0].operands[1]), 792.0 - 396.0 - 12.0 - 2.0);
    assert!(ops_named(&page_ops(&out.bytes, 1), "Tj").is_empty());
}

#[test]
fn test_store_serializes_for_the_editor() {
    let defaults = FieldDefaults::default();
    let profile = UserProfile::default();
    let seed = FieldSeed {
        profile: &profile,
        defaults: &defaults,
        today: NaiveDate::from_ymd_opt(2024, 12, 25).unwrap(),
    };
    let view = PageView::new(Size::new(612.0, 792.0), 1.0, 1);

    let mut store = FieldStore::new();
    store.add_text_field(FieldType::Date, &view, &seed).unwrap();

    let json = serde_json::to_value(&store).unwrap();
    let field = &json["textFields"][0];
    assert_eq!(field["text"], "12/25/2024");
    assert_eq!(field["fontFamily"], "Inter");
    assert_eq!(field["isNew"], true);
    assert_eq!(json["activeFieldId"], field["id"]);
}
