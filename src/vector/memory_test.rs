use super::*;

fn issue(number: i64, title: &str, embedding: Vec<f32>) -> IssueRecord {
    IssueRecord { number, title: title.into(), document: format!("{title} body"), embedding }
}

fn code(path: &str, embedding: Vec<f32>) -> CodeRecord {
    CodeRecord { file_path: path.into(), content: format!("// {path}"), embedding }
}

#[tokio::test]
async fn nearest_issue_on_empty_repo_is_none() {
    let store = MemoryVectorStore::new();
    assert!(store.nearest_issue(1, &[1.0, 0.0], None).await.unwrap().is_none());
}

#[tokio::test]
async fn nearest_issue_picks_closest_in_same_repo() {
    let store = MemoryVectorStore::new();
    store
        .upsert_issues(1, &[issue(1, "login fails", vec![1.0, 0.0]), issue(2, "dark mode", vec![0.0, 1.0])])
        .await
        .unwrap();
    store
        .upsert_issues(2, &[issue(9, "other repo", vec![1.0, 0.01])])
        .await
        .unwrap();

    let found = store.nearest_issue(1, &[0.9, 0.1], None).await.unwrap().unwrap();
    assert_eq!(found.issue_number, 1);
    assert_eq!(found.title, "login fails");
    assert!(found.similarity() > 0.9);
}

#[tokio::test]
async fn nearest_issue_honours_exclude() {
    let store = MemoryVectorStore::new();
    store
        .upsert_issues(1, &[issue(1, "a", vec![1.0, 0.0]), issue(2, "b", vec![0.0, 1.0])])
        .await
        .unwrap();
    let found = store.nearest_issue(1, &[1.0, 0.0], Some(1)).await.unwrap().unwrap();
    assert_eq!(found.issue_number, 2);
}

#[tokio::test]
async fn upsert_replaces_existing_issue() {
    let store = MemoryVectorStore::new();
    store.upsert_issues(1, &[issue(5, "old", vec![1.0])]).await.unwrap();
    store.upsert_issues(1, &[issue(5, "new", vec![1.0])]).await.unwrap();
    assert_eq!(store.issue_count(1).await, 1);
    assert_eq!(store.issue(1, 5).await.unwrap().title, "new");
}

#[tokio::test]
async fn remove_repo_issues_only_touches_that_repo() {
    let store = MemoryVectorStore::new();
    store
        .upsert_issues(1, &[issue(1, "a", vec![1.0]), issue(2, "b", vec![1.0])])
        .await
        .unwrap();
    store.upsert_issues(2, &[issue(1, "c", vec![1.0])]).await.unwrap();

    assert_eq!(store.remove_repo_issues(1).await.unwrap(), 2);
    assert_eq!(store.issue_count(1).await, 0);
    assert_eq!(store.issue_count(2).await, 1);
}

#[tokio::test]
async fn remove_single_issue() {
    let store = MemoryVectorStore::new();
    store
        .upsert_issues(1, &[issue(1, "a", vec![1.0]), issue(2, "b", vec![1.0])])
        .await
        .unwrap();
    store.remove_issue(1, 1).await.unwrap();
    assert!(store.issue(1, 1).await.is_none());
    assert!(store.issue(1, 2).await.is_some());
}

#[tokio::test]
async fn code_lookup_by_paths_is_branch_scoped() {
    let store = MemoryVectorStore::new();
    store
        .upsert_code(1, "main", &[code("src/a.py", vec![1.0]), code("src/b.py", vec![1.0])])
        .await
        .unwrap();
    store.upsert_code(1, "dev", &[code("src/a.py", vec![1.0])]).await.unwrap();

    let docs = store
        .code_by_paths(1, "main", &["src/b.py".to_string(), "src/missing.py".to_string()])
        .await
        .unwrap();
    assert_eq!(docs.len(), 1);
    assert_eq!(docs[0].file_path, "src/b.py");
    assert_eq!(docs[0].distance, None);
    assert_eq!(store.code_count(1, "dev").await, 1);
}

#[tokio::test]
async fn nearest_code_is_sorted_and_limited() {
    let store = MemoryVectorStore::new();
    store
        .upsert_code(
            1,
            "main",
            &[code("far.py", vec![0.0, 1.0]), code("near.py", vec![1.0, 0.0]), code("mid.py", vec![0.7, 0.7])],
        )
        .await
        .unwrap();

    let docs = store.nearest_code(1, "main", &[1.0, 0.0], 2).await.unwrap();
    let paths: Vec<&str> = docs.iter().map(|d| d.file_path.as_str()).collect();
    assert_eq!(paths, ["near.py", "mid.py"]);
    assert!(docs[0].distance.unwrap() < docs[1].distance.unwrap());
}

#[tokio::test]
async fn remove_repo_code_spans_branches() {
    let store = MemoryVectorStore::new();
    store.upsert_code(1, "main", &[code("a.py", vec![1.0])]).await.unwrap();
    store.upsert_code(1, "dev", &[code("a.py", vec![1.0])]).await.unwrap();
    store.upsert_code(2, "main", &[code("a.py", vec![1.0])]).await.unwrap();

    assert_eq!(store.remove_repo_code(1).await.unwrap(), 2);
    assert_eq!(store.code_count(2, "main").await, 1);
}

#[tokio::test]
async fn prune_code_keeps_listed_paths_of_one_branch() {
    let store = MemoryVectorStore::new();
    store
        .upsert_code(1, "main", &[code("a.py", vec![1.0]), code("gone.py", vec![1.0])])
        .await
        .unwrap();
    store.upsert_code(1, "dev", &[code("gone.py", vec![1.0])]).await.unwrap();

    assert_eq!(store.prune_code(1, "main", &["a.py".to_string()]).await.unwrap(), 1);
    assert_eq!(store.code_count(1, "main").await, 1);
    assert_eq!(store.code_count(1, "dev").await, 1);
}
