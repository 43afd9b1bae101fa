use std::{sync::Arc, time::Duration};

use chrono::Utc;
use tokio::{sync::watch, task::JoinHandle};
use tracing::{event, Level};

use db::{email_outbox, PoolExt};
use freelance_desk_db as db;
use freelance_desk_mail::{EmailMessage, Mailer};

use crate::Error;

/// How many queued emails one delivery pass will claim.
const BATCH_SIZE: i64 = 50;

/// Background task that drains the email outbox. Requests queue mail inside
/// their own transactions; this worker is the only thing that talks to the
/// mail transport.
pub struct OutboxWorker {
    close: watch::Sender<()>,
    join_handle: JoinHandle<()>,
}

impl OutboxWorker {
    /// Spawns the delivery loop. The first pass runs immediately, so mail
    /// left queued by a previous run goes out without waiting an interval.
    pub fn start(db: db::Pool, mailer: Arc<Mailer>, poll_interval: Duration) -> OutboxWorker {
        let (close, mut close_rx) = watch::channel(());

        let join_handle = tokio::spawn(async move {
            let mut interval = tokio::time::interval(poll_interval);
            interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    _ = interval.tick() => {
                        match deliver_due(&db, &mailer).await {
                            Ok(0) => {}
                            Ok(delivered) => {
                                event!(Level::INFO, %delivered, "delivered queued email");
                            }
                            Err(e) => {
                                event!(Level::WARN, error = %e, "outbox delivery pass failed");
                            }
                        }
                    }
                    _ = close_rx.changed() => break,
                }
            }
        });

        OutboxWorker { close, join_handle }
    }

    /// Stops polling and waits for an in-flight delivery pass to finish.
    pub async fn shutdown(self) {
        let _ = self.close.send(());
        if let Err(e) = self.join_handle.await {
            event!(Level::WARN, error = %e, "outbox worker did not shut down cleanly");
        }
    }
}

/// Runs one delivery pass: claim the due batch, hand each message to the
/// mailer, and mark the successes sent. A failed send stays queued; the
/// lease taken when the batch was claimed doubles as its retry backoff.
/// Returns how many emails went out.
pub async fn deliver_due(db: &db::Pool, mailer: &Arc<Mailer>) -> Result<usize, Error> {
    let now = Utc::now();
    let batch = db
        .transaction(move |conn| {
            email_outbox::claim_due(conn, now, BATCH_SIZE).map_err(Error::from)
        })
        .await?;

    let mut delivered = 0;
    for email in batch {
        let message = EmailMessage {
            to: email.recipient.clone(),
            subject: email.subject.clone(),
            html: email.html.clone(),
        };

        let send_mailer = mailer.clone();
        let result = tokio::task::spawn_blocking(move || send_mailer.send(&message)).await;

        match result {
            Ok(Ok(())) => {
                let email_id = email.email_id;
                db.interact(move |conn| {
                    email_outbox::mark_sent(conn, email_id, Utc::now()).map_err(Error::from)
                })
                .await?;
                delivered += 1;
            }
            Ok(Err(e)) => {
                event!(Level::WARN, email_id = %email.email_id, error = %e, "email send failed");
            }
            Err(e) => {
                event!(Level::WARN, email_id = %email.email_id, error = %e, "email send panicked");
            }
        }
    }

    Ok(delivered)
}
