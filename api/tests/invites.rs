use chrono::{DateTime, Duration, Utc};
use diesel::prelude::*;
use serde_json::json;

use freelance_desk_db::object_id::{InviteId, ProjectId, UserId};
use freelance_desk_db::test_util::run_database_test;
use freelance_desk_db::{
    email_outbox, project_clients, project_invites, project_invites::NewProjectInvite, projects,
    users, PoolExt,
};

use crate::common::{run_app_test, TestApp};

async fn create_invite(app: &TestApp, email: &str) -> anyhow::Result<serde_json::Value> {
    let response = app
        .owner
        .client
        .post(&format!("projects/{}/invites", app.project_id))
        .json(&json!({"email": email}))
        .send()
        .await?;
    assert_eq!(response.status().as_u16(), 201);
    Ok(response.json().await?)
}

/// (recipient, sent_at) for every queued email.
async fn outbox_rows(app: &TestApp) -> anyhow::Result<Vec<(String, Option<DateTime<Utc>>)>> {
    app.database
        .pool
        .interact(|conn| {
            email_outbox::table
                .select((email_outbox::recipient, email_outbox::sent_at))
                .load::<(String, Option<DateTime<Utc>>)>(conn)
                .map_err(anyhow::Error::from)
        })
        .await
}

async fn expire_invite(app: &TestApp, invite_id: InviteId) -> anyhow::Result<()> {
    app.database
        .pool
        .interact(move |conn| {
            diesel::update(
                project_invites::table.filter(project_invites::invite_id.eq(invite_id)),
            )
            .set(project_invites::expires.eq(Utc::now() - Duration::days(1)))
            .execute(conn)
            .map_err(anyhow::Error::from)
        })
        .await?;
    Ok(())
}

#[tokio::test]
#[ignore = "requires a local postgres"]
async fn invited_client_joins_the_project() {
    run_app_test(|app| async move {
        let invite = create_invite(&app, "invited@example.com").await?;
        let token = invite["token"].as_str().unwrap().to_string();
        assert_eq!(invite["accepted"], false);

        // The email is queued for the worker, not sent inline.
        let queued = outbox_rows(&app).await?;
        assert_eq!(queued.len(), 1);
        assert_eq!(queued[0].0, "invited@example.com");
        assert!(queued[0].1.is_none());

        let invited = app.signup("Invited Client", "invited@example.com").await?;
        let redeem_url = format!("http://{}/invite/{}", app.address, token);

        let response = invited.client.get_absolute(&redeem_url).send().await?;
        assert_eq!(response.status().as_u16(), 303);
        assert_eq!(
            response.headers().get("location").unwrap().to_str()?,
            format!("/projects/{}", app.project_id)
        );

        // Membership is real: the project now reads as a client.
        let project: serde_json::Value = invited
            .client
            .get(&format!("projects/{}", app.project_id))
            .send()
            .await?
            .json()
            .await?;
        assert_eq!(project["role"], "client");

        // Following the emailed link again just succeeds again.
        let response = invited.client.get_absolute(&redeem_url).send().await?;
        assert_eq!(response.status().as_u16(), 303);
        assert_eq!(
            response.headers().get("location").unwrap().to_str()?,
            format!("/projects/{}", app.project_id)
        );

        // The owner sees it accepted, and the token is not echoed back.
        let invites: Vec<serde_json::Value> = app
            .owner
            .client
            .get(&format!("projects/{}/invites", app.project_id))
            .send()
            .await?
            .json()
            .await?;
        assert_eq!(invites.len(), 1);
        assert_eq!(invites[0]["accepted"], true);
        assert!(invites[0].get("token").is_none());

        Ok(())
    })
    .await
}

#[tokio::test]
#[ignore = "requires a local postgres"]
async fn anonymous_visitors_bounce_through_login() {
    run_app_test(|app| async move {
        let invite = create_invite(&app, "someone@example.com").await?;
        let token = invite["token"].as_str().unwrap();

        let response = app
            .client
            .get_absolute(&format!("http://{}/invite/{}", app.address, token))
            .send()
            .await?;
        assert_eq!(response.status().as_u16(), 303);
        assert_eq!(
            response.headers().get("location").unwrap().to_str()?,
            format!("/login?next=/invite/{token}"),
            "the invite path rides along so login can come back to it"
        );

        Ok(())
    })
    .await
}

#[tokio::test]
#[ignore = "requires a local postgres"]
async fn unknown_tokens_are_not_found() {
    run_app_test(|app| async move {
        let response = app
            .outsider
            .client
            .get_absolute(&format!("http://{}/invite/not-a-real-token", app.address))
            .send()
            .await?;
        assert_eq!(response.status().as_u16(), 404);

        let response = app
            .outsider
            .client
            .post("invites/not-a-real-token/redeem")
            .send()
            .await?;
        assert_eq!(response.status().as_u16(), 404);

        Ok(())
    })
    .await
}

#[tokio::test]
#[ignore = "requires a local postgres"]
async fn expired_invites_are_gone_and_grant_nothing() {
    run_app_test(|app| async move {
        let invite = create_invite(&app, "late@example.com").await?;
        let token = invite["token"].as_str().unwrap().to_string();
        let invite_id: InviteId = invite["invite_id"].as_str().unwrap().parse().unwrap();
        expire_invite(&app, invite_id).await?;

        let late = app.signup("Too Late", "late@example.com").await?;

        let response = late
            .client
            .get_absolute(&format!("http://{}/invite/{}", app.address, token))
            .send()
            .await?;
        assert_eq!(response.status().as_u16(), 410);
        let body: serde_json::Value = response.json().await?;
        assert_eq!(body["error"]["kind"], "expired_invite");

        let response = late
            .client
            .post(&format!("invites/{token}/redeem"))
            .send()
            .await?;
        assert_eq!(response.status().as_u16(), 410);

        // No membership was granted along the way.
        let response = late
            .client
            .get(&format!("projects/{}", app.project_id))
            .send()
            .await?;
        assert_eq!(response.status().as_u16(), 404);

        Ok(())
    })
    .await
}

#[tokio::test]
#[ignore = "requires a local postgres"]
async fn acceptance_outlives_expiry() {
    run_app_test(|app| async move {
        let invite = create_invite(&app, "prompt@example.com").await?;
        let token = invite["token"].as_str().unwrap().to_string();
        let invite_id: InviteId = invite["invite_id"].as_str().unwrap().parse().unwrap();

        let prompt = app.signup("Prompt Client", "prompt@example.com").await?;
        let redeem: serde_json::Value = prompt
            .client
            .post(&format!("invites/{token}/redeem"))
            .send()
            .await?
            .json()
            .await?;
        assert_eq!(redeem["project_id"], app.project_id.to_string());

        // The invite lapsing later must not lock the client out of
        // re-redeeming the same link.
        expire_invite(&app, invite_id).await?;
        let response = prompt
            .client
            .post(&format!("invites/{token}/redeem"))
            .send()
            .await?;
        assert_eq!(response.status().as_u16(), 200);

        Ok(())
    })
    .await
}

#[tokio::test]
#[ignore = "requires a local postgres"]
async fn resend_repeats_the_email_without_extending_it() {
    run_app_test(|app| async move {
        let invite = create_invite(&app, "slow@example.com").await?;
        let invite_id = invite["invite_id"].as_str().unwrap().to_string();
        let original_expires = invite["expires"].clone();

        let response = app
            .owner
            .client
            .post(&format!(
                "projects/{}/invites/{}/resend",
                app.project_id, invite_id
            ))
            .send()
            .await?;
        assert_eq!(response.status().as_u16(), 202);

        let invites: Vec<serde_json::Value> = app
            .owner
            .client
            .get(&format!("projects/{}/invites", app.project_id))
            .send()
            .await?
            .json()
            .await?;
        assert_eq!(
            invites[0]["expires"], original_expires,
            "resending never extends the deadline"
        );

        let queued = outbox_rows(&app).await?;
        assert_eq!(
            queued
                .iter()
                .filter(|(recipient, _)| recipient == "slow@example.com")
                .count(),
            2
        );

        Ok(())
    })
    .await
}

#[tokio::test]
#[ignore = "requires a local postgres"]
async fn revoke_kills_the_token_but_not_existing_members() {
    run_app_test(|app| async move {
        let invite = create_invite(&app, "member@example.com").await?;
        let token = invite["token"].as_str().unwrap().to_string();
        let invite_id = invite["invite_id"].as_str().unwrap().to_string();

        let member = app.signup("Joined In Time", "member@example.com").await?;
        member
            .client
            .post(&format!("invites/{token}/redeem"))
            .send()
            .await?;

        let response = app
            .owner
            .client
            .delete(&format!(
                "projects/{}/invites/{}",
                app.project_id, invite_id
            ))
            .send()
            .await?;
        assert_eq!(response.status().as_u16(), 204);

        // The token is dead.
        let response = member
            .client
            .post(&format!("invites/{token}/redeem"))
            .send()
            .await?;
        assert_eq!(response.status().as_u16(), 404);

        // The membership it granted is not.
        let response = member
            .client
            .get(&format!("projects/{}", app.project_id))
            .send()
            .await?;
        assert_eq!(response.status().as_u16(), 200);

        Ok(())
    })
    .await
}

#[tokio::test]
#[ignore = "requires a local postgres"]
async fn invite_management_is_owner_only() {
    run_app_test(|app| async move {
        let invites_path = format!("projects/{}/invites", app.project_id);
        let payload = json!({"email": "friend@example.com"});

        for user in [&app.client_user, &app.outsider] {
            let response = user
                .client
                .post(&invites_path)
                .json(&payload)
                .send()
                .await?;
            assert_eq!(response.status().as_u16(), 403);

            let response = user.client.get(&invites_path).send().await?;
            assert_eq!(response.status().as_u16(), 403);
        }

        assert!(outbox_rows(&app).await?.is_empty(), "nothing was queued");

        Ok(())
    })
    .await
}

#[tokio::test]
#[ignore = "requires a local postgres"]
async fn invite_email_must_look_like_one() {
    run_app_test(|app| async move {
        let response = app
            .owner
            .client
            .post(&format!("projects/{}/invites", app.project_id))
            .json(&json!({"email": "not an address"}))
            .send()
            .await?;
        assert_eq!(response.status().as_u16(), 400);
        let body: serde_json::Value = response.json().await?;
        assert_eq!(body["error"]["field"], "email");

        Ok(())
    })
    .await
}

#[tokio::test]
#[ignore = "requires a local postgres"]
async fn racing_redemptions_insert_one_membership() {
    run_database_test(|database| async move {
        let (project_id, outsider_id, invite) = database
            .pool
            .interact(|conn| {
                let project_id = projects::table
                    .select(projects::project_id)
                    .first::<ProjectId>(conn)?;
                let outsider_id = users::table
                    .filter(users::email.eq("outsider@example.com"))
                    .select(users::user_id)
                    .first::<UserId>(conn)?;

                let invite = diesel::insert_into(project_invites::table)
                    .values(&NewProjectInvite {
                        invite_id: InviteId::new(),
                        project_id,
                        email: "outsider@example.com".to_string(),
                        token: project_invites::generate_token(),
                        accepted: false,
                        expires: project_invites::default_expiry(Utc::now()),
                    })
                    .get_result::<project_invites::ProjectInvite>(conn)?;

                Ok::<_, anyhow::Error>((project_id, outsider_id, invite))
            })
            .await?;

        let members = database
            .pool
            .interact(move |conn| {
                // Both halves of a race apply the same grant; the second
                // insert must be a no-op rather than an error.
                project_invites::grant(conn, &invite, outsider_id)?;
                project_invites::grant(conn, &invite, outsider_id)?;

                project_clients::table
                    .filter(
                        project_clients::project_id
                            .eq(project_id)
                            .and(project_clients::client_id.eq(outsider_id)),
                    )
                    .count()
                    .get_result::<i64>(conn)
                    .map_err(anyhow::Error::from)
            })
            .await?;

        assert_eq!(members, 1);
        Ok(())
    })
    .await
}
