use std::time::Duration;

use log::{debug, error};
use serde::Serialize;
use tokio::sync::mpsc::{self, Sender};
use tokio::task;
use uuid::Uuid;

use crate::config::NotifierConfig;

/// This type is a sender to the push manager
pub type PushManagerChan = Sender<PushManagerMessage>;

/// Messages to control the push manager
pub enum PushManagerMessage {
    /// Deliver an emergency alert to the device behind `push_token`
    EmergencyAlert {
        /// The recipient's device push token
        push_token: String,
        /// The user who triggered the alert
        caller: Uuid,
    },
}

/// The message format of the Expo push gateway
#[derive(Serialize)]
struct PushPayload {
    to: String,
    sound: &'static str,
    title: &'static str,
    body: String,
}

/// Start the push manager.
///
/// It will return a channel to this manager. Every alert is delivered by its
/// own task with an independent request timeout, so one unreachable device
/// can not stall delivery to the rest. Failures are logged and never surface
/// to the sender.
pub async fn start_push_manager(config: &NotifierConfig) -> Result<PushManagerChan, String> {
    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(config.request_timeout))
        .build()
        .map_err(|err| format!("Could not build push client: {err}"))?;

    let url = format!(
        "{}/--/api/v2/push/send",
        config.endpoint.trim_end_matches('/')
    );

    let (tx, mut rx) = mpsc::channel(16);

    tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            match msg {
                PushManagerMessage::EmergencyAlert { push_token, caller } => {
                    let client = client.clone();
                    let url = url.clone();

                    task::spawn(async move {
                        let payload = [PushPayload {
                            to: push_token,
                            sound: "default",
                            title: "Emergency Alert",
                            body: format!("Your friend {caller} needs help!"),
                        }];

                        match client.post(&url).json(&payload).send().await {
                            Ok(res) if res.status().is_success() => {
                                debug!("Push gateway accepted emergency alert of {caller}");
                            }
                            Ok(res) => {
                                error!("Push gateway returned {}", res.status());
                            }
                            Err(err) => {
                                error!("Error sending push message: {err}");
                            }
                        }
                    });
                }
            }
        }
    });

    Ok(tx)
}
