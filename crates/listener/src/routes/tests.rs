use axum::body::{to_bytes, Body};
use axum::http::Request;
use pipeline::{GenerationError, SheetError};
use tower::ServiceExt;
use workflow::test_support::{InMemoryWorksheet, ScriptedGenerator};
use workflow::PacingPolicy;

use super::*;

struct Harness {
    generator: Arc<ScriptedGenerator>,
    sheet: Arc<InMemoryWorksheet>,
    app: Router,
}

fn harness(generator: ScriptedGenerator, sheet: InMemoryWorksheet, mode: TriggerMode) -> Harness {
    let generator = Arc::new(generator);
    let sheet = Arc::new(sheet);
    let processor: DynProcessor = RowProcessor::new(
        Arc::clone(&generator) as Arc<dyn TextGenerator>,
        Arc::clone(&sheet) as Arc<dyn Worksheet>,
    )
    .with_pacing(PacingPolicy::disabled());
    let app = router(AppState::new(Arc::new(processor), mode));
    Harness {
        generator,
        sheet,
        app,
    }
}

async fn post_generate(app: &Router, body: &str) -> (StatusCode, Value) {
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/generate")
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .expect("request"),
        )
        .await
        .expect("response");
    let status = response.status();
    let bytes = to_bytes(response.into_body(), 1024 * 1024)
        .await
        .expect("body");
    let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, json)
}

fn cats_sheet() -> InMemoryWorksheet {
    InMemoryWorksheet::blog_layout().with_row(2, &["Cats", "Write about cats"])
}

#[tokio::test]
async fn targeted_success_writes_row_and_reports_it() {
    let h = harness(ScriptedGenerator::new(), cats_sheet(), TriggerMode::Targeted);

    let (status, body) = post_generate(&h.app, r#"{"row": 2}"#).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "status": "success", "row": 2 }));
    assert_eq!(
        h.generator.prompts(),
        vec![
            "Write an SEO meta description for: Cats",
            "Write a compelling blog header for: Cats",
            "Write about cats",
            "List 5 SEO keywords for: Cats",
        ]
    );
    let writes = h.sheet.writes();
    assert_eq!(writes.len(), 1);
    assert_eq!(writes[0].0, "C2:J2");
    assert_eq!(writes[0].1[5], "Generated ✅");
}

#[tokio::test]
async fn invalid_rows_are_rejected_before_any_io() {
    for body in [
        r#"{"row": 1}"#,
        r#"{"row": 0}"#,
        r#"{"row": -3}"#,
        r#"{"row": "two"}"#,
        r#"{"row": 2.5}"#,
        r#"{}"#,
        "",
        "not json",
    ] {
        let h = harness(ScriptedGenerator::new(), cats_sheet(), TriggerMode::Targeted);

        let (status, json) = post_generate(&h.app, body).await;

        assert_eq!(status, StatusCode::BAD_REQUEST, "body {body:?}");
        assert_eq!(json, json!({ "error": "Invalid or missing row number" }));
        assert_eq!(h.sheet.read_count(), 0, "body {body:?}");
        assert_eq!(h.generator.call_count(), 0, "body {body:?}");
    }
}

#[tokio::test]
async fn finished_row_needs_no_generation() {
    let sheet =
        InMemoryWorksheet::blog_layout().with_row(3, &["Cats", "Write about cats", "done"]);
    let h = harness(ScriptedGenerator::new(), sheet, TriggerMode::Targeted);

    let (status, body) = post_generate(&h.app, r#"{"row": 3}"#).await;

    assert_eq!(status, StatusCode::OK);
    assert!(body["message"]
        .as_str()
        .unwrap()
        .contains("no generation needed"));
    assert_eq!(h.generator.call_count(), 0);
    assert!(h.sheet.writes().is_empty());
}

#[tokio::test]
async fn generation_failure_is_a_server_error_without_write() {
    let generator = ScriptedGenerator::new().failing_on(
        "keywords",
        GenerationError::Upstream {
            status: 500,
            body: "boom".to_string(),
        },
    );
    let h = harness(generator, cats_sheet(), TriggerMode::Targeted);

    let (status, body) = post_generate(&h.app, r#"{"row": 2}"#).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "One or more generation tasks failed");
    assert_eq!(body["task"], "keywords");
    assert_eq!(body["detail"], "[Error 500]: boom");
    assert!(h.sheet.writes().is_empty());
}

#[tokio::test]
async fn sheet_failure_is_a_server_error() {
    let sheet = cats_sheet().failing_reads(SheetError::Transport {
        message: "connection refused".to_string(),
    });
    let h = harness(ScriptedGenerator::new(), sheet, TriggerMode::Targeted);

    let (status, body) = post_generate(&h.app, r#"{"row": 2}"#).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        body["error"],
        "Spreadsheet transport error: connection refused"
    );
}

#[tokio::test]
async fn scan_ignores_body_and_reports_counts() {
    let sheet = cats_sheet()
        .with_row(3, &["Dogs", "", ""])
        .with_row(4, &["Birds", "Write about birds"]);
    let generator = ScriptedGenerator::new().failing_on("Birds", GenerationError::TimedOut);
    let h = harness(generator, sheet, TriggerMode::Scan);

    let (status, body) = post_generate(&h.app, "").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({ "status": "success", "examined": 3, "committed": 1, "skipped": 1, "failed": 1 })
    );
    assert_eq!(h.sheet.writes().len(), 1);
}

#[tokio::test]
async fn repeated_scan_does_not_rewrite() {
    let h = harness(ScriptedGenerator::new(), cats_sheet(), TriggerMode::Scan);

    post_generate(&h.app, "").await;
    let (status, body) = post_generate(&h.app, "").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["committed"], 0);
    assert_eq!(h.sheet.writes().len(), 1);
    assert_eq!(h.generator.call_count(), 4);
}

#[tokio::test]
async fn health_is_ok() {
    let h = harness(ScriptedGenerator::new(), cats_sheet(), TriggerMode::Scan);
    let response = h
        .app
        .oneshot(
            Request::builder()
                .uri("/health")
                .body(Body::empty())
                .expect("request"),
        )
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::OK);
}

#[test]
fn trigger_mode_parses_aliases() {
    assert_eq!("scan".parse::<TriggerMode>(), Ok(TriggerMode::Scan));
    assert_eq!("Batch".parse::<TriggerMode>(), Ok(TriggerMode::Scan));
    assert_eq!(" targeted ".parse::<TriggerMode>(), Ok(TriggerMode::Targeted));
    assert!("sometimes".parse::<TriggerMode>().is_err());
}
