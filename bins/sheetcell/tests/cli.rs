//! CLI round trips through a temporary JSON sheet.

use assert_cmd::Command;
use image::{DynamicImage, ImageOutputFormat, Rgb, RgbImage};
use predicates::prelude::*;
use std::io::Cursor;
use std::path::Path;

fn write_png(path: &Path, width: u32, height: u32) {
    let img = RgbImage::from_fn(width, height, |x, y| Rgb([(x * 4) as u8, (y * 4) as u8, 200]));
    let mut buffer = Cursor::new(Vec::new());
    DynamicImage::ImageRgb8(img)
        .write_to(&mut buffer, ImageOutputFormat::Png)
        .unwrap();
    std::fs::write(path, buffer.into_inner()).unwrap();
}

fn sheetcell() -> Command {
    Command::cargo_bin("sheetcell").unwrap()
}

#[test]
fn encode_then_decode_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let source = dir.path().join("photo.png");
    let sheet = dir.path().join("sheet.json");
    let restored = dir.path().join("restored.jpg");
    write_png(&source, 48, 32);

    sheetcell()
        .args(["encode", source.to_str().unwrap(), "--sheet", sheet.to_str().unwrap()])
        .args(["--row", "product-1", "--json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"encoded_length\""));

    let json: serde_json::Value = serde_json::from_str(&std::fs::read_to_string(&sheet).unwrap()).unwrap();
    assert!(json["rows"]["product-1"]["image"].as_str().unwrap().len() > 0);
    assert_eq!(json["rows"]["product-1"]["image_extra"], "");

    sheetcell()
        .args(["decode", "--sheet", sheet.to_str().unwrap(), "--row", "product-1"])
        .args(["--out", restored.to_str().unwrap()])
        .assert()
        .success();

    let decoded = image::open(&restored).unwrap();
    assert_eq!((decoded.width(), decoded.height()), (48, 32));
}

#[test]
fn decode_missing_row_fails() {
    let dir = tempfile::tempdir().unwrap();
    let sheet = dir.path().join("sheet.json");

    sheetcell()
        .args(["decode", "--sheet", sheet.to_str().unwrap(), "--row", "nope"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("has no image"));
}

#[test]
fn encode_rejects_non_image() {
    let dir = tempfile::tempdir().unwrap();
    let source = dir.path().join("notes.txt");
    let sheet = dir.path().join("sheet.json");
    std::fs::write(&source, "just some text").unwrap();

    sheetcell()
        .args(["encode", source.to_str().unwrap(), "--sheet", sheet.to_str().unwrap()])
        .args(["--row", "product-2"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Choose another image file"));
    assert!(!sheet.exists());
}

#[test]
fn measure_reports_decoded_size() {
    let dir = tempfile::tempdir().unwrap();
    let payload = dir.path().join("payload.txt");
    std::fs::write(&payload, "data:image/jpeg;base64,TWFuTWE=\n").unwrap();

    sheetcell()
        .args(["measure", payload.to_str().unwrap()])
        .assert()
        .success()
        .stdout(predicate::str::contains("Decoded size: 5 B"))
        .stdout(predicate::str::contains("Characters: 8"));
}

#[test]
fn batch_encodes_a_directory() {
    let dir = tempfile::tempdir().unwrap();
    let photos = dir.path().join("photos");
    std::fs::create_dir_all(photos.join("shoes")).unwrap();
    write_png(&photos.join("cover.png"), 20, 20);
    write_png(&photos.join("shoes/red.png"), 30, 10);
    std::fs::write(photos.join("README.txt"), "not an image").unwrap();
    let sheet = dir.path().join("sheet.json");

    sheetcell()
        .args(["batch", photos.to_str().unwrap(), "--sheet", sheet.to_str().unwrap()])
        .args(["--preset", "portfolio", "--field", "main_image"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Stored 2 images"));

    let json: serde_json::Value = serde_json::from_str(&std::fs::read_to_string(&sheet).unwrap()).unwrap();
    assert!(json["rows"]["cover"]["main_image"].is_string());
    assert!(json["rows"]["shoes/red"]["main_image"].is_string());
}

#[test]
fn batch_warns_on_duplicate_row_ids() {
    let dir = tempfile::tempdir().unwrap();
    let photos = dir.path().join("photos");
    std::fs::create_dir_all(&photos).unwrap();
    write_png(&photos.join("cover.jpg"), 20, 20);
    write_png(&photos.join("cover.png"), 40, 10);
    let sheet = dir.path().join("sheet.json");

    sheetcell()
        .args(["batch", photos.to_str().unwrap(), "--sheet", sheet.to_str().unwrap()])
        .assert()
        .success()
        .stdout(predicate::str::contains("Stored 1 images"))
        .stderr(predicate::str::contains("row cover is already taken"));

    let json: serde_json::Value = serde_json::from_str(&std::fs::read_to_string(&sheet).unwrap()).unwrap();
    let rows = json["rows"].as_object().unwrap();
    assert_eq!(rows.len(), 1);
    assert!(rows["cover"]["image"].is_string());
}
