//! PostgreSQL repository tests.
//!
//! Opt-in: run with a reachable database and `cargo test -- --ignored`.

use chrono::Utc;
use steward_core::{
    parse_canonical, Error, NewMeeting, NewTask, NewThread, PendingMeeting, Priority,
};
use steward_db::test_fixtures::TestDatabase;
use uuid::Uuid;

fn task(owner: &str, title: &str, due: Option<&str>) -> NewTask {
    NewTask {
        title: title.to_string(),
        priority: Priority::Low,
        due_date: due.and_then(parse_canonical),
        owner: owner.to_string(),
        participants: vec![],
    }
}

#[tokio::test]
#[ignore]
async fn test_task_lifecycle() {
    let _ = dotenvy::dotenv();
    let test_db = TestDatabase::new().await;
    let owner = test_db.identity("owner");
    let tasks = &test_db.db.tasks;

    tasks.insert(task(&owner, "undated", None)).await.unwrap();
    let dated = tasks
        .insert(task(&owner, "dated", Some("2025-02-02T15:00")))
        .await
        .unwrap();

    let listed = tasks.list_for_owner(&owner).await.unwrap();
    assert_eq!(listed.len(), 2);
    assert_eq!(listed[0].title, "dated");
    assert_eq!(listed[0].due_date, dated.due_date);

    assert!(tasks.toggle(dated.id).await.unwrap().completed);
    tasks.delete(dated.id).await.unwrap();
    assert!(matches!(tasks.delete(dated.id).await, Err(Error::NotFound(_))));
}

#[tokio::test]
#[ignore]
async fn test_upcoming_meetings_for_participant() {
    let _ = dotenvy::dotenv();
    let test_db = TestDatabase::new().await;
    let organizer = test_db.identity("org");
    let guest = test_db.identity("guest");
    let meetings = &test_db.db.meetings;

    for (title, time) in [("past", "2020-01-01T10:00"), ("future", "2099-01-01T10:00")] {
        meetings
            .insert(NewMeeting {
                title: title.to_string(),
                agenda: String::new(),
                time: parse_canonical(time).unwrap(),
                participants: vec![guest.clone()],
                organizer: organizer.clone(),
            })
            .await
            .unwrap();
    }

    let now = Utc::now().naive_utc();
    let upcoming = meetings.list_upcoming(&guest, now).await.unwrap();
    assert_eq!(upcoming.len(), 1);
    assert_eq!(upcoming[0].title, "future");
}

#[tokio::test]
#[ignore]
async fn test_pending_meeting_optimistic_save() {
    let _ = dotenvy::dotenv();
    let test_db = TestDatabase::new().await;
    let repo = &test_db.db.pending_meetings;
    let b = test_db.identity("b");
    let c = test_db.identity("c");

    let pending = PendingMeeting {
        id: Uuid::now_v7(),
        title: "Plan".to_string(),
        agenda: String::new(),
        organiser: test_db.identity("a"),
        participants: vec![b.clone(), c.clone()],
        availabilities: Default::default(),
        pending_response: 2,
        responded: vec![],
        created_at: Utc::now(),
    };
    repo.insert(pending.clone()).await.unwrap();

    let mut answered = pending.clone();
    answered.pending_response = 1;
    answered.responded.push(b.clone());
    repo.save(&answered, 2).await.unwrap();
    assert!(matches!(repo.save(&answered, 2).await, Err(Error::Conflict(_))));

    assert!(repo.list_awaiting(&b).await.unwrap().is_empty());
    assert_eq!(repo.list_awaiting(&c).await.unwrap().len(), 1);

    repo.delete(pending.id).await.unwrap();
    assert!(repo.get(pending.id).await.unwrap().is_none());
}

#[tokio::test]
#[ignore]
async fn test_thread_messages_in_order() {
    let _ = dotenvy::dotenv();
    let test_db = TestDatabase::new().await;
    let a = test_db.identity("a");
    let b = test_db.identity("b");
    let threads = &test_db.db.threads;

    let (thread, _) = threads
        .create(NewThread {
            subject: "Launch".to_string(),
            sender: a.clone(),
            participants: vec![b.clone()],
            text: "first".to_string(),
        })
        .await
        .unwrap();
    threads.post_message(thread.id, &b, "second").await.unwrap();

    let texts: Vec<String> = threads
        .messages(thread.id)
        .await
        .unwrap()
        .into_iter()
        .map(|m| m.text)
        .collect();
    assert_eq!(texts, vec!["first", "second"]);
    assert_eq!(threads.list_for(&a).await.unwrap().len(), 1);
}

#[tokio::test]
#[ignore]
async fn test_user_upsert_and_prefix_search() {
    let _ = dotenvy::dotenv();
    let test_db = TestDatabase::new().await;
    let email = test_db.identity("Zed");

    test_db.db.users.upsert(&email, "Zed").await.unwrap();
    let user = test_db.db.users.upsert(&email, "Zed Z").await.unwrap();
    assert_eq!(user.name, "Zed Z");

    let found = test_db
        .db
        .users
        .search_by_email_prefix(&email[..6].to_uppercase(), 10)
        .await
        .unwrap();
    assert!(found.iter().any(|u| u.email == email));
}
