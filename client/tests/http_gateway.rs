use std::sync::Arc;

use bytes::Bytes;
use chrono::NaiveDate;
use common::{
    data::{LogStatus, OutcomeStatus, PolicyAction, Statistics},
    payloads::LogQuery,
};
use mockito::{Matcher, Server, ServerGuard};
use scangate_client::{api::UploadRequest, ClientConfig, ClientError, Gateway, HttpGateway};
use tokio::sync::watch;

const LOG_ENTRY: &str = r#"{
    "timestamp": "2024-05-01T08:00:00",
    "fileName": "payroll.csv",
    "fileSize": 2048,
    "userId": "alice",
    "status": "BLOCKED",
    "riskScore": 85,
    "sensitiveDataFound": true,
    "sensitiveTypes": ["SSN"],
    "policyAction": "BLOCK"
}"#;

fn gateway(server: &ServerGuard, streamed: bool) -> HttpGateway {
    let config = ClientConfig {
        base_url: format!("{}/api/v1", server.url()),
        streamed_upload: streamed,
        ..ClientConfig::default()
    };
    HttpGateway::new(&config).unwrap()
}

fn page_body(total_pages: u32, number: u32) -> String {
    format!(
        r#"{{"content":[{LOG_ENTRY}],"totalPages":{total_pages},"totalElements":{},"number":{number},"first":{},"last":{}}}"#,
        total_pages * 10,
        number == 0,
        number + 1 == total_pages,
    )
}

#[tokio::test]
async fn blocked_upload_is_parsed_from_a_403() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", "/api/v1/upload")
        .match_header("content-type", Matcher::Regex("^multipart/form-data".to_string()))
        .match_body(Matcher::AllOf(vec![
            Matcher::Regex(r#"name="file"; filename="payroll.csv""#.to_string()),
            Matcher::Regex(r#"name="userId"\r\n\r\nalice"#.to_string()),
            Matcher::Regex("SSN 123-45-6789".to_string()),
        ]))
        .with_status(403)
        .with_header("content-type", "application/json")
        .with_body(
            r#"{"status":"BLOCKED","fileId":"f-1","fileName":"payroll.csv","riskScore":85,
                "sensitiveDataFound":true,"sensitiveTypes":["SSN"],"policyAction":"BLOCK",
                "reason":"SSN found","timestamp":"2024-05-01T08:00:00"}"#,
        )
        .create_async()
        .await;

    let gateway = gateway(&server, true);
    assert!(gateway.reports_progress());
    let content = Bytes::from_static(b"name,ssn\nbob,SSN 123-45-6789\n");
    let (sender, receiver) = watch::channel(0u64);
    let response = gateway
        .upload(
            UploadRequest {
                file_name: "payroll.csv".to_string(),
                content: content.clone(),
                user_id: Some("alice".to_string()),
            },
            Arc::new(sender),
        )
        .await
        .unwrap();

    mock.assert_async().await;
    assert_eq!(response.status_code, 403);
    assert_eq!(response.outcome.status, Some(OutcomeStatus::Blocked));
    assert_eq!(response.outcome.risk_score, Some(85));
    assert_eq!(response.outcome.policy_action, Some(PolicyAction::Block));
    assert_eq!(response.outcome.sensitive_types(), ["SSN".to_string()]);
    assert_eq!(*receiver.borrow(), content.len() as u64);
}

#[tokio::test]
async fn unstreamed_upload_still_sends_the_file() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", "/api/v1/upload")
        .match_body(Matcher::Regex(r#"filename="notes.txt"\r\n"#.to_string()))
        .with_status(200)
        .with_body(
            r#"{"status":"ALLOWED","fileId":"f-2","fileName":"notes.txt","riskScore":0,
                "sensitiveDataFound":false,"sensitiveTypes":[],"policyAction":"UPLOAD",
                "storageLocation":"s3://uploads/f-2"}"#,
        )
        .create_async()
        .await;

    let gateway = gateway(&server, false);
    assert!(!gateway.reports_progress());
    let (sender, _receiver) = watch::channel(0u64);
    let response = gateway
        .upload(
            UploadRequest {
                file_name: "notes.txt".to_string(),
                content: Bytes::from_static(b"hello"),
                user_id: None,
            },
            Arc::new(sender),
        )
        .await
        .unwrap();

    mock.assert_async().await;
    assert_eq!(response.status_code, 200);
    assert_eq!(response.outcome.status, Some(OutcomeStatus::Allowed));
    assert_eq!(response.outcome.storage_location.as_deref(), Some("s3://uploads/f-2"));
}

#[tokio::test]
async fn upload_with_unreadable_answer_is_a_decode_error() {
    let mut server = Server::new_async().await;
    server
        .mock("POST", "/api/v1/upload")
        .with_status(502)
        .with_body("<html>Bad Gateway</html>")
        .create_async()
        .await;

    let (sender, _receiver) = watch::channel(0u64);
    let err = gateway(&server, true)
        .upload(
            UploadRequest {
                file_name: "a.txt".to_string(),
                content: Bytes::from_static(b"a"),
                user_id: None,
            },
            Arc::new(sender),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, ClientError::JsonDecode(_)), "{err:?}");
}

#[tokio::test]
async fn statistics() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("GET", "/api/v1/logs/statistics")
        .with_header("content-type", "application/json")
        .with_body(r#"{"totalUploads":12,"allowedUploads":7,"blockedUploads":4,"quarantinedUploads":1}"#)
        .create_async()
        .await;

    let stats = gateway(&server, true).statistics().await.unwrap();
    mock.assert_async().await;
    assert_eq!(
        stats,
        Statistics {
            total_uploads: 12,
            allowed_uploads: 7,
            blocked_uploads: 4,
            quarantined_uploads: 1,
        }
    );
}

#[tokio::test]
async fn logs_by_status_send_page_and_size() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("GET", "/api/v1/logs/status/BLOCKED")
        .match_query(Matcher::AllOf(vec![
            Matcher::UrlEncoded("page".to_string(), "2".to_string()),
            Matcher::UrlEncoded("size".to_string(), "10".to_string()),
        ]))
        .with_body(page_body(5, 2))
        .create_async()
        .await;

    let query = LogQuery::ByStatus {
        status: LogStatus::Blocked,
        page: 2,
        size: 10,
    };
    let page = gateway(&server, true).logs(&query).await.unwrap();
    mock.assert_async().await;
    assert_eq!(page.total_pages, 5);
    assert!(!page.first && !page.last);
    assert_eq!(page.content[0].file_name, "payroll.csv");
    assert_eq!(page.content[0].status, LogStatus::Blocked);
}

#[tokio::test]
async fn user_id_is_a_single_encoded_segment() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("GET", Matcher::Regex("^/api/v1/logs/user/jane%20doe%2Fops$".to_string()))
        .match_query(Matcher::UrlEncoded("page".to_string(), "0".to_string()))
        .with_body(page_body(1, 0))
        .create_async()
        .await;

    let query = LogQuery::ByUser {
        user_id: "jane doe/ops".to_string(),
        page: 0,
        size: 10,
    };
    gateway(&server, true).logs(&query).await.unwrap();
    mock.assert_async().await;
}

#[tokio::test]
async fn high_risk_list_comes_back_as_one_page() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("GET", "/api/v1/logs/highrisk")
        .match_query(Matcher::UrlEncoded("threshold".to_string(), "70".to_string()))
        .with_body(format!("[{LOG_ENTRY},{LOG_ENTRY}]"))
        .create_async()
        .await;

    let page = gateway(&server, true)
        .logs(&LogQuery::HighRisk { threshold: 70 })
        .await
        .unwrap();
    mock.assert_async().await;
    assert_eq!(page.content.len(), 2);
    assert_eq!(page.total_pages, 1);
    assert!(page.first && page.last);
}

#[tokio::test]
async fn failed_listing_is_a_bad_status_code() {
    let mut server = Server::new_async().await;
    server
        .mock("GET", "/api/v1/logs")
        .match_query(Matcher::Any)
        .with_status(500)
        .with_body("boom")
        .create_async()
        .await;

    let err = gateway(&server, true)
        .logs(&LogQuery::All { page: 0, size: 10 })
        .await
        .unwrap_err();
    match err {
        ClientError::BadStatusCode { code, body } => {
            assert_eq!(code, 500);
            assert_eq!(body, "boom");
        }
        other => panic!("unexpected error {other:?}"),
    }
}

#[tokio::test]
async fn malformed_listing_is_a_decode_error() {
    let mut server = Server::new_async().await;
    server
        .mock("GET", "/api/v1/logs/recent")
        .with_body(r#"{"not":"a list"}"#)
        .create_async()
        .await;

    let err = gateway(&server, true).logs(&LogQuery::Recent).await.unwrap_err();
    assert!(matches!(err, ClientError::JsonDecode(_)), "{err:?}");
}

#[tokio::test]
async fn health() {
    let mut server = Server::new_async().await;
    server
        .mock("GET", "/api/v1/health")
        .with_body("File Upload Security Service is running")
        .create_async()
        .await;
    assert_eq!(
        gateway(&server, true).health().await.unwrap(),
        "File Upload Security Service is running"
    );
}

#[tokio::test]
async fn unhealthy_gateway_is_a_bad_status_code() {
    let mut server = Server::new_async().await;
    server
        .mock("GET", "/api/v1/health")
        .with_status(503)
        .create_async()
        .await;
    assert!(matches!(
        gateway(&server, true).health().await,
        Err(ClientError::BadStatusCode { code: 503, .. })
    ));
}

#[tokio::test]
async fn date_range_sends_iso_bounds() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("GET", "/api/v1/logs/daterange")
        .match_query(Matcher::AllOf(vec![
            Matcher::UrlEncoded("start".to_string(), "2024-05-01T00:00:00".to_string()),
            Matcher::UrlEncoded("end".to_string(), "2024-05-02T00:00:00".to_string()),
            Matcher::UrlEncoded("page".to_string(), "0".to_string()),
            Matcher::UrlEncoded("size".to_string(), "20".to_string()),
        ]))
        .with_body(page_body(2, 0))
        .create_async()
        .await;

    let day = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap();
    let query = LogQuery::DateRange {
        start: day.and_hms_opt(0, 0, 0).unwrap(),
        end: day.succ_opt().unwrap().and_hms_opt(0, 0, 0).unwrap(),
        page: 0,
        size: 20,
    };
    let page = gateway(&server, true).logs(&query).await.unwrap();
    mock.assert_async().await;
    assert_eq!(page.total_pages, 2);
    assert!(page.first && !page.last);
}

#[tokio::test]
async fn blocked_list_comes_back_as_one_page() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("GET", "/api/v1/logs/blocked")
        .with_body(format!("[{LOG_ENTRY}]"))
        .create_async()
        .await;

    let page = gateway(&server, true).logs(&LogQuery::Blocked).await.unwrap();
    mock.assert_async().await;
    assert_eq!(page.content.len(), 1);
    assert_eq!(page.content[0].status, LogStatus::Blocked);
    assert!(page.first && page.last);
}
