use chrono::{Duration, Utc};
use serde_json::{json, Value};

use freelance_desk_db::object_id::ProjectId;

use crate::common::{run_app_test, TestApp};

async fn expect_error(
    response: reqwest::Response,
    status: u16,
    kind: &str,
    context: &str,
) -> Result<(), anyhow::Error> {
    assert_eq!(response.status().as_u16(), status, "{context}");
    let body: Value = response.json().await?;
    assert_eq!(body["error"]["kind"], kind, "{context}");
    Ok(())
}

async fn seed_todo(app: &TestApp) -> Result<String, anyhow::Error> {
    let todo: Value = app
        .owner
        .client
        .post(&format!("projects/{}/todos", app.project_id))
        .json(&json!({"title": "Send the contract"}))
        .send()
        .await?
        .json()
        .await?;
    Ok(todo["todo_id"].as_str().unwrap().to_string())
}

#[tokio::test]
#[ignore = "requires a local postgres"]
async fn clients_read_and_toggle_but_never_manage() {
    run_app_test(|app| async move {
        let project = app.project_id;
        let due = (Utc::now().date_naive() + Duration::days(30)).to_string();
        let todo_id = seed_todo(&app).await?;
        let milestone: Value = app
            .owner
            .client
            .post(&format!("projects/{project}/milestones"))
            .json(&json!({"title": "Kickoff", "due_date": due}))
            .send()
            .await?
            .json()
            .await?;
        let milestone_id = milestone["milestone_id"].as_str().unwrap().to_string();

        for path in [
            format!("projects/{project}"),
            format!("projects/{project}/todos"),
            format!("projects/{project}/milestones"),
            format!("projects/{project}/invoices"),
            format!("projects/{project}/messages"),
            format!("projects/{project}/files"),
        ] {
            let response = app.client_user.client.get(&path).send().await?;
            assert_eq!(response.status().as_u16(), 200, "GET {path}");
        }

        let c = &app.client_user.client;
        expect_error(
            c.put(&format!("projects/{project}"))
                .json(&json!({"name": "Renamed", "status": "active"}))
                .send()
                .await?,
            403,
            "authz",
            "client renames the project",
        )
        .await?;
        expect_error(
            c.post(&format!("projects/{project}/todos"))
                .json(&json!({"title": "Sneaky"}))
                .send()
                .await?,
            403,
            "authz",
            "client creates a todo",
        )
        .await?;
        expect_error(
            c.put(&format!("projects/{project}/todos/{todo_id}"))
                .json(&json!({"title": "Edited"}))
                .send()
                .await?,
            403,
            "authz",
            "client edits a todo",
        )
        .await?;
        expect_error(
            c.delete(&format!("projects/{project}/todos/{todo_id}"))
                .send()
                .await?,
            403,
            "authz",
            "client deletes a todo",
        )
        .await?;
        expect_error(
            c.post(&format!("projects/{project}/milestones"))
                .json(&json!({"title": "Sneaky", "due_date": due}))
                .send()
                .await?,
            403,
            "authz",
            "client creates a milestone",
        )
        .await?;
        expect_error(
            c.put(&format!("projects/{project}/milestones/{milestone_id}"))
                .json(&json!({"title": "Edited", "due_date": due}))
                .send()
                .await?,
            403,
            "authz",
            "client edits a milestone",
        )
        .await?;
        expect_error(
            c.delete(&format!("projects/{project}/milestones/{milestone_id}"))
                .send()
                .await?,
            403,
            "authz",
            "client deletes a milestone",
        )
        .await?;
        expect_error(
            c.post(&format!("projects/{project}/invoices"))
                .json(&json!({"title": "Sneaky"}))
                .send()
                .await?,
            403,
            "authz",
            "client creates an invoice",
        )
        .await?;
        expect_error(
            c.post(&format!("projects/{project}/invites"))
                .json(&json!({"email": "friend@example.com"}))
                .send()
                .await?,
            403,
            "authz",
            "client invites someone",
        )
        .await?;
        expect_error(
            c.get(&format!("projects/{project}/invites")).send().await?,
            403,
            "authz",
            "client lists invites",
        )
        .await?;

        // Completion state is the one thing a client may change.
        let response = c
            .post(&format!("projects/{project}/todos/{todo_id}/toggle"))
            .json(&json!({"completed": true}))
            .send()
            .await?;
        assert_eq!(response.status().as_u16(), 200);
        let response = c
            .post(&format!(
                "projects/{project}/milestones/{milestone_id}/status"
            ))
            .json(&json!({"status": "in_progress"}))
            .send()
            .await?;
        assert_eq!(response.status().as_u16(), 200);

        Ok(())
    })
    .await
}

#[tokio::test]
#[ignore = "requires a local postgres"]
async fn outsiders_cannot_tell_the_project_from_a_missing_one() {
    run_app_test(|app| async move {
        let project = app.project_id;
        let todo_id = seed_todo(&app).await?;

        for path in [
            format!("projects/{project}"),
            format!("projects/{project}/todos"),
            format!("projects/{project}/milestones"),
            format!("projects/{project}/invoices"),
            format!("projects/{project}/messages"),
            format!("projects/{project}/files"),
        ] {
            expect_error(
                app.outsider.client.get(&path).send().await?,
                404,
                "not_found",
                &format!("GET {path}"),
            )
            .await?;
        }

        // A real project answers an outsider exactly like a fabricated one.
        let missing = ProjectId::new();
        let fabricated: Value = app
            .outsider
            .client
            .get(&format!("projects/{missing}"))
            .send()
            .await?
            .json()
            .await?;
        let real: Value = app
            .outsider
            .client
            .get(&format!("projects/{project}"))
            .send()
            .await?
            .json()
            .await?;
        assert_eq!(real, fabricated);

        let o = &app.outsider.client;
        expect_error(
            o.put(&format!("projects/{project}"))
                .json(&json!({"name": "Taken over", "status": "active"}))
                .send()
                .await?,
            403,
            "authz",
            "outsider renames the project",
        )
        .await?;
        expect_error(
            o.post(&format!("projects/{project}/todos"))
                .json(&json!({"title": "Sneaky"}))
                .send()
                .await?,
            403,
            "authz",
            "outsider creates a todo",
        )
        .await?;
        expect_error(
            o.post(&format!("projects/{project}/todos/{todo_id}/toggle"))
                .json(&json!({"completed": true}))
                .send()
                .await?,
            403,
            "authz",
            "outsider toggles a todo",
        )
        .await?;
        expect_error(
            o.post(&format!("projects/{project}/invites"))
                .json(&json!({"email": "friend@example.com"}))
                .send()
                .await?,
            403,
            "authz",
            "outsider invites someone",
        )
        .await?;

        Ok(())
    })
    .await
}

#[tokio::test]
#[ignore = "requires a local postgres"]
async fn signed_out_requests_are_turned_away() {
    run_app_test(|app| async move {
        let project = app.project_id;

        expect_error(
            app.client.get("projects").send().await?,
            401,
            "authn",
            "anonymous project list",
        )
        .await?;
        expect_error(
            app.client.get(&format!("projects/{project}")).send().await?,
            401,
            "authn",
            "anonymous project read",
        )
        .await?;
        expect_error(
            app.client
                .post(&format!("projects/{project}/todos"))
                .json(&json!({"title": "Sneaky"}))
                .send()
                .await?,
            401,
            "authn",
            "anonymous todo create",
        )
        .await?;
        expect_error(
            app.client.get("me").send().await?,
            401,
            "authn",
            "anonymous profile read",
        )
        .await?;

        Ok(())
    })
    .await
}

#[tokio::test]
#[ignore = "requires a local postgres"]
async fn denied_writes_leave_no_trace() {
    run_app_test(|app| async move {
        let project = app.project_id;
        let todo_id = seed_todo(&app).await?;

        let denials = [
            app.client_user
                .client
                .post(&format!("projects/{project}/todos"))
                .json(&json!({"title": "Sneaky"}))
                .send()
                .await?,
            app.outsider
                .client
                .post(&format!("projects/{project}/todos"))
                .json(&json!({"title": "Sneaky"}))
                .send()
                .await?,
            app.client_user
                .client
                .delete(&format!("projects/{project}/todos/{todo_id}"))
                .send()
                .await?,
            app.client_user
                .client
                .post(&format!("projects/{project}/invoices"))
                .json(&json!({"title": "Sneaky"}))
                .send()
                .await?,
            app.outsider
                .client
                .post(&format!("projects/{project}/invites"))
                .json(&json!({"email": "friend@example.com"}))
                .send()
                .await?,
        ];
        for denied in denials {
            assert_eq!(denied.status().as_u16(), 403);
        }

        let todos: Vec<Value> = app
            .owner
            .client
            .get(&format!("projects/{project}/todos"))
            .send()
            .await?
            .json()
            .await?;
        assert_eq!(todos.len(), 1);
        assert_eq!(todos[0]["todo_id"], todo_id.as_str());

        let invoices: Vec<Value> = app
            .owner
            .client
            .get(&format!("projects/{project}/invoices"))
            .send()
            .await?
            .json()
            .await?;
        assert!(invoices.is_empty());

        let invites: Vec<Value> = app
            .owner
            .client
            .get(&format!("projects/{project}/invites"))
            .send()
            .await?
            .json()
            .await?;
        assert!(invites.is_empty());

        Ok(())
    })
    .await
}
