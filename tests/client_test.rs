use axum::{
    Json, Router,
    extract::{Multipart, Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use indexer_ui::client::{ClientError, FileUpload, IndexerApi, RagClient};
use indexer_ui::config::ClientConfig;
use indexer_ui::models::{ActorState, TaskFilter, TaskStatus};
use serde_json::{Value, json};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

const TOKEN: &str = "good-token";

#[derive(Debug, Clone)]
struct ReceivedUpload {
    partition: String,
    file_id: String,
    file_name: Option<String>,
    content_type: Option<String>,
    content: Vec<u8>,
    metadata: Option<String>,
}

#[derive(Clone, Default)]
struct Backend {
    task_queries: Arc<Mutex<Vec<Option<String>>>>,
    uploads: Arc<Mutex<Vec<ReceivedUpload>>>,
    deleted: Arc<Mutex<Vec<String>>>,
    restarted: Arc<Mutex<Vec<String>>>,
}

fn authorized(headers: &HeaderMap) -> bool {
    headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v == format!("Bearer {}", TOKEN))
}

fn guarded(headers: &HeaderMap, body: Value) -> Response {
    if authorized(headers) {
        Json(body).into_response()
    } else {
        (StatusCode::UNAUTHORIZED, Json(json!({"detail": "bad token"}))).into_response()
    }
}

async fn health_check(headers: HeaderMap) -> Response {
    guarded(&headers, json!({"status": "ok"}))
}

async fn list_partitions(headers: HeaderMap) -> Response {
    guarded(
        &headers,
        json!({"partitions": [
            {"partition": "docs", "created_at": 1_700_000_000},
            {"partition": "my docs", "created_at": 1_700_000_100}
        ]}),
    )
}

async fn list_files(headers: HeaderMap, Path(partition): Path<String>) -> Response {
    guarded(
        &headers,
        json!({"files": [{
            "file_id": "f1",
            "filename": "report.pdf",
            "link": format!("http://rag/partition/{}/file/f1", partition),
            "partition": partition,
            "source": "/data/report.pdf",
            "created_at": "2025-03-01T10:00:00",
            "file_size": "1.2 MB"
        }]}),
    )
}

async fn delete_partition(
    State(backend): State<Backend>,
    headers: HeaderMap,
    Path(partition): Path<String>,
) -> Response {
    if partition == "missing" {
        return (StatusCode::NOT_FOUND, Json(json!({"detail": "no such partition"}))).into_response();
    }
    if authorized(&headers) {
        backend.deleted.lock().unwrap().push(partition);
    }
    guarded(&headers, json!({"message": "deleted"}))
}

async fn get_file(headers: HeaderMap, Path((partition, file_id)): Path<(String, String)>) -> Response {
    guarded(
        &headers,
        json!({
            "metadata": {
                "file_id": file_id,
                "filename": "report.pdf",
                "partition": partition,
                "source": "/data/report.pdf",
                "page": 4,
                "file_size": "1.2 MB",
                "created_at": "2025-03-01T10:00:00"
            },
            "documents": [
                {"link": "http://rag/extract/e1"},
                {"link": "http://rag/extract/e2"}
            ]
        }),
    )
}

async fn get_extract(headers: HeaderMap, Path(extract_id): Path<String>) -> Response {
    guarded(
        &headers,
        json!({
            "metadata": {
                "_id": extract_id,
                "partition": "docs",
                "file_id": "f1",
                "filename": "report.pdf",
                "page": 2,
                "page_sep": "[PAGE_SEP]",
                "source": "/data/report.pdf"
            },
            "page_content": "Revenue grew by 12%."
        }),
    )
}

async fn list_tasks(
    State(backend): State<Backend>,
    headers: HeaderMap,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    backend
        .task_queries
        .lock()
        .unwrap()
        .push(params.get("status").cloned());
    guarded(
        &headers,
        json!({"tasks": [
            {
                "task_id": "t1",
                "state": "COMPLETED",
                "details": {"file_id": "f1", "partition": "docs", "metadata": {}},
                "url": "http://rag/indexer/task/t1"
            },
            {
                "task_id": "t2",
                "state": "INSERTING",
                "details": {"file_id": "f2", "partition": "docs", "metadata": {}},
                "url": "http://rag/indexer/task/t2"
            }
        ]}),
    )
}

async fn get_task(headers: HeaderMap, Path(task_id): Path<String>) -> Response {
    guarded(
        &headers,
        json!({
            "task_id": task_id,
            "task_state": "FAILED",
            "details": {"file_id": "f9", "partition": "docs", "metadata": {"lang": "fr"}}
        }),
    )
}

async fn add_file(
    State(backend): State<Backend>,
    headers: HeaderMap,
    Path((partition, file_id)): Path<(String, String)>,
    mut multipart: Multipart,
) -> Response {
    if !authorized(&headers) {
        return StatusCode::UNAUTHORIZED.into_response();
    }

    let mut upload = ReceivedUpload {
        partition,
        file_id: file_id.clone(),
        file_name: None,
        content_type: None,
        content: Vec::new(),
        metadata: None,
    };

    while let Some(field) = multipart.next_field().await.unwrap() {
        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some("file") => {
                upload.file_name = field.file_name().map(str::to_string);
                upload.content_type = field.content_type().map(str::to_string);
                upload.content = field.bytes().await.unwrap().to_vec();
            }
            Some("metadata") => upload.metadata = Some(field.text().await.unwrap()),
            _ => {}
        }
    }

    backend.uploads.lock().unwrap().push(upload);
    (
        StatusCode::CREATED,
        Json(json!({"task_status_url": format!("http://rag/indexer/task/task-{}", file_id)})),
    )
        .into_response()
}

async fn delete_file(
    State(backend): State<Backend>,
    headers: HeaderMap,
    Path((partition, file_id)): Path<(String, String)>,
) -> Response {
    if !authorized(&headers) {
        return StatusCode::UNAUTHORIZED.into_response();
    }
    backend
        .deleted
        .lock()
        .unwrap()
        .push(format!("{}/{}", partition, file_id));
    StatusCode::NO_CONTENT.into_response()
}

async fn list_actors(headers: HeaderMap) -> Response {
    guarded(
        &headers,
        json!({"actors": [
            {"actor_id": "a1", "namespace": "openrag", "name": "Indexer", "class_name": "Indexer", "state": "ALIVE"},
            {"actor_id": "a2", "namespace": "openrag", "name": "TaskStateManager", "class_name": "TaskStateManager", "state": "DEAD"}
        ]}),
    )
}

async fn restart_actor(
    State(backend): State<Backend>,
    headers: HeaderMap,
    Path(name): Path<String>,
) -> Response {
    if authorized(&headers) {
        backend.restarted.lock().unwrap().push(name);
    }
    guarded(&headers, json!({"message": "restarted"}))
}

async fn user_info(headers: HeaderMap) -> Response {
    guarded(
        &headers,
        json!({
            "id": "u1",
            "display_name": "Alice",
            "is_admin": true,
            "memberships": [],
            "file_count": 12,
            "pending_files": 2,
            "total_files": 14,
            "file_quota": -1
        }),
    )
}

async fn spawn_backend() -> (String, Backend) {
    let backend = Backend::default();
    let app = Router::new()
        .route("/health_check", get(health_check))
        .route("/partition/", get(list_partitions))
        .route(
            "/partition/:partition",
            get(list_files).delete(delete_partition),
        )
        .route("/partition/:partition/file/:file_id", get(get_file))
        .route("/extract/:extract_id", get(get_extract))
        .route("/queue/tasks", get(list_tasks))
        .route("/indexer/task/:task_id", get(get_task))
        .route(
            "/indexer/partition/:partition/file/:file_id",
            post(add_file).delete(delete_file),
        )
        .route("/actors/", get(list_actors))
        .route("/actors/:name/restart", post(restart_actor))
        .route("/user/info", get(user_info))
        .with_state(backend.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    (format!("http://{}/", addr), backend)
}

fn client_for(base_url: &str) -> RagClient {
    let config = ClientConfig {
        api_base_url: base_url.to_string(),
        request_timeout_secs: 5,
        ..ClientConfig::default()
    };
    RagClient::new(&config).unwrap()
}

async fn authed_client() -> (RagClient, Backend) {
    let (url, backend) = spawn_backend().await;
    let client = client_for(&url).with_token(Some(TOKEN.to_string()));
    (client, backend)
}

#[tokio::test]
async fn test_login_adopts_valid_token() {
    let (url, _backend) = spawn_backend().await;
    let client = client_for(&url);

    client.login(TOKEN).await.unwrap();

    let partitions = client.fetch_partitions().await.unwrap();
    assert_eq!(partitions.len(), 2);
    assert_eq!(partitions[0].partition, "docs");
    assert_eq!(partitions[0].created_at, 1_700_000_000);
}

#[tokio::test]
async fn test_login_rejects_bad_token() {
    let (url, _backend) = spawn_backend().await;
    let client = client_for(&url);

    let err = client.login("wrong").await.unwrap_err();
    assert_eq!(err.to_string(), "Failed to log in: 401 Unauthorized");
    assert!(err.is_unauthorized());

    // The rejected token was not kept
    let err = client.fetch_partitions().await.unwrap_err();
    assert!(matches!(
        err,
        ClientError::Status {
            operation: "fetch partitions",
            status: StatusCode::UNAUTHORIZED
        }
    ));
}

#[tokio::test]
async fn test_partition_names_are_path_encoded() {
    let (client, _backend) = authed_client().await;

    let files = client.fetch_files("my docs").await.unwrap();
    assert_eq!(files.len(), 1);
    assert_eq!(files[0].partition, "my docs");
    assert_eq!(files[0].file_size, "1.2 MB");
}

#[tokio::test]
async fn test_delete_partition() {
    let (client, backend) = authed_client().await;

    client.delete_partition("docs").await.unwrap();
    assert_eq!(*backend.deleted.lock().unwrap(), vec!["docs".to_string()]);

    let err = client.delete_partition("missing").await.unwrap_err();
    assert_eq!(err.status(), Some(StatusCode::NOT_FOUND));
    assert_eq!(
        err.to_string(),
        "Failed to delete partition: 404 Not Found"
    );
}

#[tokio::test]
async fn test_fetch_file_and_extract() {
    let (client, _backend) = authed_client().await;

    let file = client.fetch_file("docs", "f1").await.unwrap();
    assert_eq!(file.metadata.page, 4);
    assert_eq!(file.extract_ids(), vec!["e1", "e2"]);

    let extract = client.fetch_extract("e2").await.unwrap();
    assert_eq!(extract.metadata.id, "e2");
    assert_eq!(extract.page_content, "Revenue grew by 12%.");
}

#[tokio::test]
async fn test_fetch_tasks_sends_status_filter() {
    let (client, backend) = authed_client().await;

    let tasks = client.fetch_tasks(None).await.unwrap();
    assert_eq!(tasks.len(), 2);
    assert_eq!(tasks[0].state, TaskStatus::Completed);
    assert_eq!(tasks[1].file_id(), "f2");

    client.fetch_tasks(Some(TaskFilter::Active)).await.unwrap();
    client
        .fetch_tasks(Some(TaskFilter::Status(TaskStatus::Failed)))
        .await
        .unwrap();

    assert_eq!(
        *backend.task_queries.lock().unwrap(),
        vec![None, Some("ACTIVE".to_string()), Some("FAILED".to_string())]
    );
}

#[tokio::test]
async fn test_fetch_single_task() {
    let (client, _backend) = authed_client().await;

    let task = client.fetch_task("t42").await.unwrap();
    assert_eq!(task.task_id, "t42");
    assert_eq!(task.task_state, TaskStatus::Failed);
    assert_eq!(task.details.metadata["lang"], "fr");
}

#[tokio::test]
async fn test_add_file_sends_multipart_form() {
    let (client, backend) = authed_client().await;

    let upload = FileUpload::new("report.pdf", b"%PDF-1.4 fake".to_vec());
    let url = client
        .add_file("docs", "f1", upload, Some(r#"{"author":"alice"}"#.to_string()))
        .await
        .unwrap();
    assert_eq!(url, "http://rag/indexer/task/task-f1");

    let uploads = backend.uploads.lock().unwrap().clone();
    assert_eq!(uploads.len(), 1);
    let received = &uploads[0];
    assert_eq!(received.partition, "docs");
    assert_eq!(received.file_id, "f1");
    assert_eq!(received.file_name.as_deref(), Some("report.pdf"));
    assert_eq!(received.content_type.as_deref(), Some("application/pdf"));
    assert_eq!(received.content, b"%PDF-1.4 fake");
    assert_eq!(received.metadata.as_deref(), Some(r#"{"author":"alice"}"#));
}

#[tokio::test]
async fn test_add_file_without_metadata() {
    let (client, backend) = authed_client().await;

    client
        .add_file("docs", "f2", FileUpload::new("notes.txt", b"hello".to_vec()), None)
        .await
        .unwrap();

    let uploads = backend.uploads.lock().unwrap().clone();
    assert_eq!(uploads[0].metadata, None);
    assert_eq!(
        uploads[0].content_type.as_deref(),
        Some("application/octet-stream")
    );
}

#[tokio::test]
async fn test_delete_file() {
    let (client, backend) = authed_client().await;

    client.delete_file("docs", "f1").await.unwrap();
    assert_eq!(*backend.deleted.lock().unwrap(), vec!["docs/f1".to_string()]);
}

#[tokio::test]
async fn test_actors_and_restart() {
    let (client, backend) = authed_client().await;

    let actors = client.fetch_actors().await.unwrap();
    assert_eq!(actors.len(), 2);
    assert_eq!(actors[1].state, ActorState::Dead);

    client.restart_actor("TaskStateManager").await.unwrap();
    assert_eq!(
        *backend.restarted.lock().unwrap(),
        vec!["TaskStateManager".to_string()]
    );
}

#[tokio::test]
async fn test_user_info_with_unlimited_quota() {
    let (client, _backend) = authed_client().await;

    let user = client.fetch_user_info().await.unwrap();
    assert_eq!(user.display_name, "Alice");
    assert!(user.is_admin);
    assert_eq!(user.remaining_quota(), None);
}

#[tokio::test]
async fn test_unreachable_backend_is_http_error() {
    // Port 9 (discard) is not expected to serve HTTP locally
    let client = client_for("http://127.0.0.1:9");
    let err = client.fetch_partitions().await.unwrap_err();
    assert!(matches!(err, ClientError::Http(_)));
}
