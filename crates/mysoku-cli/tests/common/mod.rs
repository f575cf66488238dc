//! Shared helpers for the CLI integration tests.
//!
//! Each test binary compiles its own copy, so not every helper is used
//! by every binary.
#![allow(dead_code)]

use std::path::Path;

use lopdf::content::{Content, Operation};
use lopdf::{Document, Object, Stream, dictionary};

/// Build a one-page PDF whose content stream carries the given lines at
/// the given font sizes. Rendering fidelity is irrelevant; only the
/// operator stream matters here.
pub fn fixture_pdf(path: &Path, lines: &[(&str, i64)]) {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! { "F1" => font_id },
    });

    let mut ops = vec![Operation::new("BT", vec![])];
    for (text, size) in lines {
        ops.push(Operation::new("Tf", vec!["F1".into(), (*size).into()]));
        ops.push(Operation::new("Tj", vec![Object::string_literal(*text)]));
        ops.push(Operation::new("Td", vec![0.into(), (-30).into()]));
    }
    ops.push(Operation::new("ET", vec![]));
    let content = Content { operations: ops };
    let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));
    let page_id = doc.add_object(dictionary! {
        "Type" => "Page",
        "Parent" => pages_id,
        "Contents" => content_id,
    });
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => vec![page_id.into()],
            "Count" => 1,
            "Resources" => resources_id,
            "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);
    doc.save(path).unwrap();
}

/// A sale flyer: emphasised building name, 億-unit asking price.
pub fn sale_flyer(path: &Path) {
    fixture_pdf(
        path,
        &[("グランドタワー渋谷", 24), ("販売価格：1.5億円", 12)],
    );
}

/// A lease flyer with a labelled property name.
pub fn lease_flyer(path: &Path) {
    fixture_pdf(
        path,
        &[("物件名：サニーコート目黒", 14), ("家賃：98,000円", 12)],
    );
}
