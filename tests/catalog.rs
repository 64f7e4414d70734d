mod common;

use anyhow::Result;

use common::TestApp;

#[tokio::test]
async fn catalog_lists_sections_and_actions_without_auth() -> Result<()> {
    let t = TestApp::new().await?;

    let reply = t.get("/catalog/permissions", None).await?;
    assert_eq!(reply.status_code, 200);

    let values = |key: &str| -> Vec<String> {
        reply.data[key]
            .as_array()
            .map(|entries| entries.iter().filter_map(|e| e["value"].as_str().map(str::to_string)).collect())
            .unwrap_or_default()
    };
    assert_eq!(values("sections"), vec!["employees", "roles"]);
    assert_eq!(values("actions"), vec!["create", "read", "update", "delete"]);
    assert!(reply.data["actions"][0]["label"].as_str().is_some_and(|label| !label.is_empty()));
    Ok(())
}
