use super::*;
use crate::github::Issue;
use crate::state::test_helpers::{self, listed_issue};
use crate::vector::{CodeRecord, VectorStore};

fn pull_request(number: i64) -> Issue {
    Issue {
        number,
        title: "Fix the crash".into(),
        body: None,
        pull_request: Some(serde_json::json!({ "url": "https://api.github.com/repos/octo/widgets/pulls/3" })),
    }
}

#[tokio::test]
async fn bootstrap_loads_issues_and_skips_pull_requests() {
    let h = test_helpers::harness();
    let repo = test_helpers::test_repo();
    *h.github.issues.lock().unwrap() =
        vec![listed_issue(1, "Crash", Some("on start")), listed_issue(2, "Docs", None), pull_request(3)];

    let loaded = bootstrap_repository(&h.state, 9, &repo).await.unwrap();

    assert_eq!(loaded, 2);
    assert_eq!(h.store.issue_count(repo.id).await, 2);
    assert!(h.store.issue(repo.id, 3).await.is_none());
    assert_eq!(h.embedder.inputs(), vec!["Crash on start".to_string(), "Docs ".to_string()]);
}

#[tokio::test]
async fn bootstrap_of_empty_repository_stores_nothing() {
    let h = test_helpers::harness();
    let repo = test_helpers::test_repo();

    assert_eq!(bootstrap_repository(&h.state, 9, &repo).await.unwrap(), 0);
    assert!(h.embedder.inputs().is_empty());
}

#[tokio::test]
async fn bootstrap_continues_past_failing_repository() {
    let h = test_helpers::harness();
    *h.github.issues.lock().unwrap() = vec![listed_issue(1, "Crash", None)];
    *h.github.failing_repo.lock().unwrap() = Some("octo/broken".into());
    let broken = Repository { id: 7, full_name: "octo/broken".into(), default_branch: None };
    let repo = test_helpers::test_repo();

    let result = bootstrap_repositories(&h.state, 9, &[broken, repo.clone()]).await;

    assert!(matches!(result, Err(ServiceError::GitHub(_))));
    assert_eq!(h.store.issue_count(repo.id).await, 1);
}

#[tokio::test]
async fn removal_drops_issues_and_code() {
    let h = test_helpers::harness();
    let repo = test_helpers::test_repo();
    *h.github.issues.lock().unwrap() = vec![listed_issue(1, "Crash", None)];
    bootstrap_repository(&h.state, 9, &repo).await.unwrap();
    let file = CodeRecord { file_path: "src/app.py".into(), content: "print()".into(), embedding: vec![1.0] };
    h.store.upsert_code(repo.id, "main", &[file]).await.unwrap();

    remove_repositories(&h.state, std::slice::from_ref(&repo)).await.unwrap();

    assert_eq!(h.store.issue_count(repo.id).await, 0);
    assert_eq!(h.store.code_count(repo.id, "main").await, 0);
}

#[tokio::test]
async fn bootstrap_keeps_one_record_per_repeated_issue() {
    let h = test_helpers::harness();
    let repo = test_helpers::test_repo();
    *h.github.issues.lock().unwrap() = vec![
        listed_issue(7, "Crash", Some("old body")),
        listed_issue(8, "Docs", None),
        listed_issue(7, "Crash", Some("new body")),
    ];

    let loaded = bootstrap_repository(&h.state, 9, &repo).await.unwrap();

    assert_eq!(loaded, 2);
    assert_eq!(h.store.issue_count(repo.id).await, 2);
    assert_eq!(h.store.issue(repo.id, 7).await.unwrap().document, "Crash new body");
    assert_eq!(h.embedder.inputs(), vec!["Docs ".to_string(), "Crash new body".to_string()]);
}
