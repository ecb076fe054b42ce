mod common;

use axum::http::StatusCode;
use axum_test::multipart::{MultipartForm, Part};

use common::{Factory, TestApp};

const CARDS_CSV: &str = "\
Name,Price,Category,Bought Date,Status,Sold Price,Sold Date
Wayne Gretzky,150,Hockey,2024-01-15,bought,,
Broken Row,not-a-price,Hockey,2024-01-15,bought,,
Mario Lemieux,40,Hockey,2024-01-10,sold,65,2024-03-01
";

fn csv_form(file_name: &str, contents: &str) -> MultipartForm {
    let part = Part::bytes(contents.as_bytes().to_vec())
        .file_name(file_name)
        .mime_type("text/csv");
    MultipartForm::new().add_part("file", part)
}

#[tokio::test]
async fn test_import_requires_premium() {
    let app = TestApp::new().await;
    let factory = Factory::new(&app.state);
    let auth = factory.create_user().await;

    let response = app
        .server
        .post("/api/import/excel")
        .add_header("Authorization", auth.auth_header())
        .multipart(csv_form("cards.csv", CARDS_CSV))
        .await;

    response.assert_status(StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_import_csv() {
    let app = TestApp::new().await;
    let factory = Factory::new(&app.state);
    let auth = factory.create_premium_user().await;

    let response = app
        .server
        .post("/api/import/excel")
        .add_header("Authorization", auth.auth_header())
        .multipart(csv_form("cards.csv", CARDS_CSV))
        .await;

    response.assert_status(StatusCode::OK);

    let body: serde_json::Value = response.json();
    assert_eq!(body["imported"].as_u64().unwrap(), 2);
    let skipped = body["skipped"].as_array().unwrap();
    assert_eq!(skipped.len(), 1);
    assert_eq!(skipped[0]["row"].as_u64().unwrap(), 3);

    let response = app
        .server
        .get("/api/cards")
        .add_header("Authorization", auth.auth_header())
        .await;

    let body: serde_json::Value = response.json();
    assert_eq!(body["total"].as_u64().unwrap(), 2);
    let sold = body["data"]
        .as_array()
        .unwrap()
        .iter()
        .find(|card| card["name"] == "Mario Lemieux")
        .unwrap();
    assert_eq!(sold["status"].as_str().unwrap(), "sold");
    assert_eq!(sold["profit"].as_f64().unwrap(), 25.0);
    assert_eq!(sold["collection_id"].as_i64().unwrap(), 1);
}

#[tokio::test]
async fn test_import_defaults() {
    let app = TestApp::new().await;
    let factory = Factory::new(&app.state);
    let auth = factory.create_premium_user().await;

    let response = app
        .server
        .post("/api/import/excel")
        .add_header("Authorization", auth.auth_header())
        .multipart(csv_form("cards.csv", "Price\n12.5\n"))
        .await;

    response.assert_status(StatusCode::OK);

    let body: serde_json::Value = response.json();
    assert_eq!(body["imported"].as_u64().unwrap(), 1);

    let response = app
        .server
        .get("/api/cards")
        .add_header("Authorization", auth.auth_header())
        .await;

    let body: serde_json::Value = response.json();
    let card = &body["data"][0];
    assert_eq!(card["name"].as_str().unwrap(), "Unknown");
    assert_eq!(card["category"].as_str().unwrap(), "Other");
    assert_eq!(card["status"].as_str().unwrap(), "bought");
    let today = time::OffsetDateTime::now_utc().date();
    assert_eq!(card["bought_date"].as_str().unwrap(), today.to_string());
}

#[tokio::test]
async fn test_import_unsupported_format() {
    let app = TestApp::new().await;
    let factory = Factory::new(&app.state);
    let auth = factory.create_premium_user().await;

    let response = app
        .server
        .post("/api/import/excel")
        .add_header("Authorization", auth.auth_header())
        .multipart(csv_form("cards.pdf", CARDS_CSV))
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_import_missing_file() {
    let app = TestApp::new().await;
    let factory = Factory::new(&app.state);
    let auth = factory.create_premium_user().await;

    let form = MultipartForm::new().add_text("note", "no file here");

    let response = app
        .server
        .post("/api/import/excel")
        .add_header("Authorization", auth.auth_header())
        .multipart(form)
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_import_empty_spreadsheet() {
    let app = TestApp::new().await;
    let factory = Factory::new(&app.state);
    let auth = factory.create_premium_user().await;

    let response = app
        .server
        .post("/api/import/excel")
        .add_header("Authorization", auth.auth_header())
        .multipart(csv_form("cards.csv", "Name,Price\n"))
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
}
