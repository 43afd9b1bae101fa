use serde_json::json;

use crate::common::run_app_test;

#[tokio::test]
#[ignore = "requires a local postgres"]
async fn both_sides_can_talk() {
    run_app_test(|app| async move {
        let path = format!("projects/{}/messages", app.project_id);

        let response = app
            .owner
            .client
            .post(&path)
            .json(&json!({"body": "Draft is up, take a look"}))
            .send()
            .await?;
        assert_eq!(response.status().as_u16(), 201);
        let message: serde_json::Value = response.json().await?;
        assert_eq!(message["author_name"], "Test Owner");

        let response = app
            .client_user
            .client
            .post(&path)
            .json(&json!({"body": "Looks great, one nit on the header"}))
            .send()
            .await?;
        assert_eq!(response.status().as_u16(), 201);

        let list: Vec<serde_json::Value> = app
            .client_user
            .client
            .get(&path)
            .send()
            .await?
            .json()
            .await?;
        assert_eq!(list.len(), 2);
        assert_eq!(list[0]["body"], "Draft is up, take a look");
        assert_eq!(list[0]["author_name"], "Test Owner");
        assert_eq!(list[1]["author_name"], "Test Client");

        Ok(())
    })
    .await
}

#[tokio::test]
#[ignore = "requires a local postgres"]
async fn empty_messages_are_rejected() {
    run_app_test(|app| async move {
        let response = app
            .owner
            .client
            .post(&format!("projects/{}/messages", app.project_id))
            .json(&json!({"body": "   "}))
            .send()
            .await?;
        assert_eq!(response.status().as_u16(), 400);
        Ok(())
    })
    .await
}

#[tokio::test]
#[ignore = "requires a local postgres"]
async fn outsiders_cannot_see_or_join_the_conversation() {
    run_app_test(|app| async move {
        let path = format!("projects/{}/messages", app.project_id);

        let response = app.outsider.client.get(&path).send().await?;
        assert_eq!(response.status().as_u16(), 404);

        let response = app
            .outsider
            .client
            .post(&path)
            .json(&json!({"body": "hello?"}))
            .send()
            .await?;
        assert_eq!(response.status().as_u16(), 404);

        // Nothing was stored by the failed post.
        let list: Vec<serde_json::Value> = app
            .owner
            .client
            .get(&path)
            .send()
            .await?
            .json()
            .await?;
        assert!(list.is_empty());

        Ok(())
    })
    .await
}
