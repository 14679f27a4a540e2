mod common;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use axum::async_trait;
use chrono::NaiveDateTime;
use reqwest::{Method, StatusCode};
use serde_json::{json, Value};
use uuid::Uuid;

use common::{send, TestServer, BOB, CAROL, ORG};
use steward_core::{Error, Meeting, MeetingRepository, NewMeeting, Result};
use steward_db::Database;
use steward_inference::MockGenerationBackend;

async fn server() -> TestServer {
    TestServer::spawn(MockGenerationBackend::new()).await
}

async fn arrange(server: &TestServer, participants: &[&str]) -> String {
    let (status, body) = server
        .post(
            "/api/v1/pending-meetings",
            ORG,
            json!({
                "title": "Planning",
                "agenda": "Q2 roadmap",
                "participants": participants,
                "availability": {
                    "2025-02-03": ["9:00 - 10:00", "10:00 - 11:00"],
                    "2025-02-04": ["14:00 - 15:00"]
                }
            }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{}", body);
    assert_eq!(body["pendingResponse"], participants.len());
    body["id"].as_str().unwrap().to_string()
}

async fn accept(server: &TestServer, id: &str, who: &str, availability: Value) -> (StatusCode, Value) {
    server
        .post(
            &format!("/api/v1/invites/{}/accept", id),
            who,
            json!({ "availability": availability }),
        )
        .await
}

async fn reject(server: &TestServer, id: &str, who: &str) -> (StatusCode, Value) {
    server
        .post_empty(&format!("/api/v1/invites/{}/reject", id), who)
        .await
}

#[tokio::test]
async fn test_invitation_resolves_to_earliest_common_slot() {
    let server = server().await;
    let id = arrange(&server, &[BOB, CAROL]).await;

    let (_, invites) = server.get("/api/v1/invites", BOB).await;
    assert_eq!(invites.as_array().unwrap().len(), 1);
    let (_, invites) = server.get("/api/v1/invites", ORG).await;
    assert!(invites.as_array().unwrap().is_empty());

    let (status, body) = accept(
        &server,
        &id,
        BOB,
        json!({"2025-02-03": ["10:00 - 11:00"], "2025-02-04": ["14:00 - 15:00"]}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"outcome": "pending", "remaining": 1}));

    let (_, invites) = server.get("/api/v1/invites", BOB).await;
    assert!(invites.as_array().unwrap().is_empty());

    let (status, body) = reject(&server, &id, CAROL).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["outcome"], "scheduled");
    assert_eq!(body["meeting"]["time"], "2025-02-03T10:00");
    assert_eq!(body["meeting"]["organizer"], ORG);

    let (_, meetings) = server.get("/api/v1/meetings", ORG).await;
    assert_eq!(meetings.as_array().unwrap().len(), 1);
    assert_eq!(meetings[0]["title"], "Planning");

    // Resolved pending meetings are gone.
    let (status, _) = reject(&server, &id, CAROL).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_invitation_without_shared_slot_is_discarded() {
    let server = server().await;
    let id = arrange(&server, &[BOB]).await;

    let (status, body) = accept(&server, &id, BOB, json!({"2025-02-05": ["9:00 - 10:00"]})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"outcome": "no_common_slot"}));

    let (_, meetings) = server.get("/api/v1/meetings", ORG).await;
    assert!(meetings.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_invitation_declined_by_everyone() {
    let server = server().await;
    let id = arrange(&server, &[BOB, CAROL]).await;

    reject(&server, &id, BOB).await;
    let (status, body) = reject(&server, &id, CAROL).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"outcome": "all_declined"}));
}

/// Meeting storage whose first insert fails.
struct FlakyMeetings {
    inner: Arc<dyn MeetingRepository>,
    failed: AtomicBool,
}

#[async_trait]
impl MeetingRepository for FlakyMeetings {
    async fn insert(&self, meeting: NewMeeting) -> Result<Meeting> {
        if !self.failed.swap(true, Ordering::SeqCst) {
            return Err(Error::Internal("disk full".to_string()));
        }
        self.inner.insert(meeting).await
    }

    async fn get(&self, id: Uuid) -> Result<Option<Meeting>> {
        self.inner.get(id).await
    }

    async fn update(&self, id: Uuid, meeting: NewMeeting) -> Result<Meeting> {
        self.inner.update(id, meeting).await
    }

    async fn delete(&self, id: Uuid) -> Result<()> {
        self.inner.delete(id).await
    }

    async fn list_upcoming(&self, identity: &str, from: NaiveDateTime) -> Result<Vec<Meeting>> {
        self.inner.list_upcoming(identity, from).await
    }
}

#[tokio::test]
async fn test_failed_meeting_write_keeps_invitation_open() {
    let mut db = Database::in_memory();
    db.meetings = Arc::new(FlakyMeetings {
        inner: db.meetings.clone(),
        failed: AtomicBool::new(false),
    });
    let server = TestServer::spawn_with_db(MockGenerationBackend::new(), db).await;
    let id = arrange(&server, &[BOB]).await;
    let availability = json!({"2025-02-03": ["9:00 - 10:00"]});

    let (status, _) = accept(&server, &id, BOB, availability.clone()).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);

    let (_, invites) = server.get("/api/v1/invites", BOB).await;
    assert_eq!(invites.as_array().unwrap().len(), 1);
    assert_eq!(invites[0]["pendingResponse"], 1);

    let (status, body) = accept(&server, &id, BOB, availability).await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    assert_eq!(body["outcome"], "scheduled");
    assert_eq!(body["meeting"]["time"], "2025-02-03T09:00");
}

#[tokio::test]
async fn test_invitation_response_rules() {
    let server = server().await;
    let id = arrange(&server, &[BOB, CAROL]).await;

    let (status, _) = reject(&server, &id, "mallory@x.io").await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    reject(&server, &id, BOB).await;
    let (status, _) = reject(&server, &id, BOB).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, _) = accept(&server, &id, CAROL, json!({})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = accept(&server, &id, CAROL, json!({"2025-02-03": ["9 to 10"]})).await;
    assert!(status.is_client_error());
}

#[tokio::test]
async fn test_arrange_requires_other_participants() {
    let server = server().await;
    let (status, _) = server
        .post(
            "/api/v1/pending-meetings",
            ORG,
            json!({
                "title": "Solo",
                "participants": [ORG, " "],
                "availability": {"2025-02-03": ["9:00 - 10:00"]}
            }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_meeting_crud_is_organizer_only() {
    let server = server().await;
    let (status, meeting) = server
        .post(
            "/api/v1/meetings",
            ORG,
            json!({"title": "1:1", "time": "monday 3pm", "participants": [BOB]}),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(meeting["time"], "2025-02-03T15:00");
    let path = format!("/api/v1/meetings/{}", meeting["id"].as_str().unwrap());

    let (status, _) = server
        .post("/api/v1/meetings", ORG, json!({"title": "x", "time": "monday"}))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let update = json!({"title": "1:1 moved", "time": "2025-02-04T10:00", "participants": [CAROL]});
    let (status, _) = send(server.request(Method::PUT, &path, BOB).json(&update)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = send(server.request(Method::PUT, &path, ORG).json(&update)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["time"], "2025-02-04T10:00");

    let (_, meetings) = server.get("/api/v1/meetings", BOB).await;
    assert!(meetings.as_array().unwrap().is_empty());
    let (_, meetings) = server.get("/api/v1/meetings", CAROL).await;
    assert_eq!(meetings.as_array().unwrap().len(), 1);

    let (status, _) = send(server.request(Method::DELETE, &path, ORG)).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, _) = send(server.request(Method::DELETE, &path, ORG)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_past_meetings_are_not_listed() {
    let server = server().await;
    server
        .post(
            "/api/v1/meetings",
            ORG,
            json!({"title": "Yesterday", "time": "2025-01-31T10:00"}),
        )
        .await;
    let (_, meetings) = server.get("/api/v1/meetings", ORG).await;
    assert!(meetings.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_task_without_due_date_is_rejected() {
    let server = server().await;
    let (status, body) = server
        .post("/api/v1/tasks", ORG, json!({"title": "No deadline"}))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "dueDate is required");

    let (status, _) = server
        .post("/api/v1/tasks", ORG, json!({"title": "Blank", "dueDate": "  "}))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (_, tasks) = server.get("/api/v1/tasks", ORG).await;
    assert!(tasks.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_task_crud() {
    let server = server().await;
    let (status, task) = server
        .post(
            "/api/v1/tasks",
            ORG,
            json!({"title": "Pay rent", "priority": "urgent", "dueDate": "tomorrow"}),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(task["priority"], "Medium");
    assert_eq!(task["dueDate"], "2025-02-02T23:59");
    assert_eq!(task["completed"], false);

    server
        .post(
            "/api/v1/tasks",
            ORG,
            json!({"title": "Someday", "dueDate": "next friday"}),
        )
        .await;
    let (status, _) = server
        .post("/api/v1/tasks", ORG, json!({"title": "Bad", "dueDate": "whenever"}))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (_, tasks) = server.get("/api/v1/tasks", ORG).await;
    let titles: Vec<&str> = tasks
        .as_array()
        .unwrap()
        .iter()
        .map(|t| t["title"].as_str().unwrap())
        .collect();
    assert_eq!(titles, vec!["Pay rent", "Someday"]);

    let toggle = format!("/api/v1/tasks/{}/toggle", task["id"].as_str().unwrap());
    let (status, _) = server.post_empty(&toggle, BOB).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let (_, toggled) = server.post_empty(&toggle, ORG).await;
    assert_eq!(toggled["completed"], true);

    let path = format!("/api/v1/tasks/{}", task["id"].as_str().unwrap());
    let (status, _) = send(server.request(Method::DELETE, &path, ORG)).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
}
