use super::*;
use serde_json::json;

fn parse(event_type: &str, value: &serde_json::Value) -> Result<WebhookEvent, EventError> {
    WebhookEvent::parse(event_type, value.to_string().as_bytes())
}

#[test]
fn ping_needs_no_installation() {
    let event = parse("ping", &json!({ "zen": "Keep it logically awesome." })).unwrap();
    assert_eq!(event, WebhookEvent::Ping);
}

#[test]
fn invalid_json_is_rejected() {
    let err = WebhookEvent::parse("issues", b"{not json").unwrap_err();
    assert!(matches!(err, EventError::InvalidJson(_)));
}

#[test]
fn missing_installation_is_rejected() {
    let err = parse("issues", &json!({ "action": "opened" })).unwrap_err();
    assert!(matches!(err, EventError::MissingInstallation));
    assert_eq!(err.to_string(), "Installation ID is missing");
}

#[test]
fn issues_opened_parses_with_null_body() {
    let event = parse(
        "issues",
        &json!({
            "action": "opened",
            "installation": { "id": 7 },
            "repository": { "id": 42, "full_name": "octo/repo" },
            "issue": { "number": 3, "title": "Crash on start", "body": null }
        }),
    )
    .unwrap();
    assert_eq!(
        event,
        WebhookEvent::Issues {
            action: "opened".into(),
            installation_id: 7,
            repository: Repository { id: 42, full_name: "octo/repo".into(), default_branch: None },
            issue: IssuePayload { number: 3, title: "Crash on start".into(), body: String::new() },
        }
    );
}

#[test]
fn issues_without_repository_is_rejected() {
    let err = parse(
        "issues",
        &json!({
            "action": "opened",
            "installation": { "id": 7 },
            "repository": { "full_name": "octo/repo" },
            "issue": { "number": 3, "title": "t" }
        }),
    )
    .unwrap_err();
    assert_eq!(err.to_string(), "Repository full name or ID is missing");
}

#[test]
fn pull_request_parses_default_branch() {
    let event = parse(
        "pull_request",
        &json!({
            "action": "opened",
            "installation": { "id": 1 },
            "repository": { "id": 9, "full_name": "octo/repo", "default_branch": "trunk" },
            "pull_request": { "number": 12, "title": "Add cache", "body": "Speeds things up" }
        }),
    )
    .unwrap();
    let WebhookEvent::PullRequest { repository, pull_request, .. } = event else {
        panic!("expected pull request event");
    };
    assert_eq!(repository.default_branch.as_deref(), Some("trunk"));
    assert_eq!(pull_request.number, 12);
    assert_eq!(pull_request.body, "Speeds things up");
}

#[test]
fn pull_request_without_repository_is_rejected() {
    let err = parse(
        "pull_request",
        &json!({ "action": "opened", "installation": { "id": 1 }, "pull_request": { "number": 12 } }),
    )
    .unwrap_err();
    assert_eq!(err.to_string(), "Repository information missing");
}

#[test]
fn installation_repositories_drops_incomplete_entries() {
    let event = parse(
        "installation_repositories",
        &json!({
            "action": "added",
            "installation": { "id": 5 },
            "repositories_added": [
                { "id": 1, "full_name": "octo/one" },
                { "id": 2 },
                { "full_name": "octo/three" }
            ],
            "repositories_removed": []
        }),
    )
    .unwrap();
    let WebhookEvent::InstallationRepositories { action, added, removed, .. } = event else {
        panic!("expected installation_repositories event");
    };
    assert_eq!(action, "added");
    assert_eq!(added.len(), 1);
    assert_eq!(added[0].full_name, "octo/one");
    assert!(removed.is_empty());
}

#[test]
fn installation_created_lists_repositories() {
    let event = parse(
        "installation",
        &json!({
            "action": "created",
            "installation": { "id": 5 },
            "repositories": [{ "id": 1, "full_name": "octo/one" }, { "id": 2, "full_name": "octo/two" }]
        }),
    )
    .unwrap();
    let WebhookEvent::Installation { repositories, installation_id, .. } = event else {
        panic!("expected installation event");
    };
    assert_eq!(installation_id, 5);
    assert_eq!(repositories.len(), 2);
}

#[test]
fn unknown_event_type_is_ignored() {
    let event = parse("star", &json!({ "action": "created", "installation": { "id": 5 } })).unwrap();
    assert_eq!(event, WebhookEvent::Ignored { event_type: "star".into(), installation_id: 5 });
}
