use std::fmt::Display;
use std::time::Duration;

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::response::Response;
use futures::{Sink, SinkExt, Stream, StreamExt};
use tokio::time::interval;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use events::{progress_channel, FailureCause, ProgressEvent};
use orchestrator::{WorkflowEngine, WorkflowRequest};
use resize_core::MutationKind;

use crate::messages::{encode_event, ClientMessage};

const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(30);
const CLIENT_TIMEOUT: Duration = Duration::from_secs(10);

/// What a connection was opened for, taken from the upgrade request.
#[derive(Debug, Clone)]
pub struct WorkflowSession {
    pub instance_id: String,
    pub declared_state: String,
    pub kind: MutationKind,
}

/// Upgrade the connection and run one workflow over it.
pub fn upgrade_workflow(
    ws: WebSocketUpgrade,
    engine: WorkflowEngine,
    session: WorkflowSession,
) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, engine, session))
}

async fn handle_socket(socket: WebSocket, engine: WorkflowEngine, session: WorkflowSession) {
    let (sender, receiver) = socket.split();
    relay(sender, receiver, engine, session).await;
}

enum FirstMessage {
    Target(String),
    Invalid(String),
    Gone,
}

async fn first_message<Rx, E>(receiver: &mut Rx) -> FirstMessage
where
    Rx: Stream<Item = Result<Message, E>> + Unpin,
    E: Display,
{
    while let Some(msg) = receiver.next().await {
        match msg {
            Ok(Message::Text(text)) => {
                return match ClientMessage::parse(text.as_str()) {
                    Ok(msg) => FirstMessage::Target(msg.target),
                    Err(e) => FirstMessage::Invalid(e),
                };
            }
            Ok(Message::Close(_)) => return FirstMessage::Gone,
            Ok(_) => {}
            Err(e) => {
                debug!(error = %e, "WebSocket receive error before target");
                return FirstMessage::Gone;
            }
        }
    }
    FirstMessage::Gone
}

/// Drive one workflow over a split socket.
///
/// Reads the mutation target from the first text message, runs the workflow
/// and forwards every progress record as a JSON text frame. The socket is
/// closed after the terminal record. If the client goes away first the
/// workflow is cancelled.
pub async fn relay<Tx, Rx, E>(
    mut sender: Tx,
    mut receiver: Rx,
    engine: WorkflowEngine,
    session: WorkflowSession,
) where
    Tx: Sink<Message> + Unpin,
    Rx: Stream<Item = Result<Message, E>> + Unpin,
    E: Display,
{
    let first = tokio::time::timeout(CLIENT_TIMEOUT, first_message(&mut receiver)).await;
    let target = match first {
        Ok(FirstMessage::Target(target)) => target,
        Ok(FirstMessage::Invalid(reason)) => {
            send_event(
                &mut sender,
                &ProgressEvent::failure(FailureCause::InvalidPrecondition, reason),
            )
            .await;
            close(&mut sender).await;
            return;
        }
        Ok(FirstMessage::Gone) => {
            debug!(instance_id = %session.instance_id, "Client left before sending a target");
            return;
        }
        Err(_) => {
            send_event(
                &mut sender,
                &ProgressEvent::failure(
                    FailureCause::Transport,
                    format!("no target received within {}s", CLIENT_TIMEOUT.as_secs()),
                ),
            )
            .await;
            close(&mut sender).await;
            return;
        }
    };

    let mutation = match session.kind.with_target(&target) {
        Ok(mutation) => mutation,
        Err(e) => {
            send_event(
                &mut sender,
                &ProgressEvent::failure(FailureCause::InvalidPrecondition, e.to_string()),
            )
            .await;
            close(&mut sender).await;
            return;
        }
    };

    info!(
        instance_id = %session.instance_id,
        declared_state = %session.declared_state,
        mutation = %mutation.describe(),
        "Workflow requested over WebSocket"
    );

    let request = WorkflowRequest::new(
        session.instance_id.clone(),
        session.declared_state,
        mutation,
    );
    let (sink, mut stream) = progress_channel();
    let cancel = CancellationToken::new();
    let task = {
        let cancel = cancel.clone();
        tokio::spawn(async move { engine.execute(request, &sink, &cancel).await })
    };

    let mut heartbeat = interval(HEARTBEAT_INTERVAL);
    heartbeat.reset();
    let mut client_gone = false;

    loop {
        tokio::select! {
            biased;

            event = stream.next() => {
                match event {
                    Some(event) => {
                        if !send_event(&mut sender, &event).await {
                            client_gone = true;
                            cancel.cancel();
                            break;
                        }
                        if event.is_terminal() {
                            break;
                        }
                    }
                    None => {
                        warn!(
                            instance_id = %session.instance_id,
                            "Workflow ended without a terminal record"
                        );
                        send_event(
                            &mut sender,
                            &ProgressEvent::failure(
                                FailureCause::Transport,
                                "workflow ended without a result",
                            ),
                        )
                        .await;
                        break;
                    }
                }
            }

            msg = receiver.next() => {
                match msg {
                    Some(Ok(Message::Close(_))) | None => {
                        client_gone = true;
                    }
                    Some(Err(e)) => {
                        debug!(error = %e, "WebSocket receive error");
                        client_gone = true;
                    }
                    Some(Ok(_)) => {}
                }
                if client_gone {
                    info!(
                        instance_id = %session.instance_id,
                        "Client disconnected, cancelling workflow"
                    );
                    cancel.cancel();
                    break;
                }
            }

            _ = heartbeat.tick() => {
                if sender.send(Message::Ping(Default::default())).await.is_err() {
                    client_gone = true;
                    cancel.cancel();
                    break;
                }
            }
        }
    }

    if !client_gone {
        close(&mut sender).await;
    }
    drop(stream);

    if let Err(e) = task.await {
        warn!(
            instance_id = %session.instance_id,
            error = %e,
            "Workflow task did not finish cleanly"
        );
    }
    debug!(instance_id = %session.instance_id, "WebSocket connection closed");
}

/// Send one record; returns false once the client can no longer be written to.
async fn send_event<Tx>(sender: &mut Tx, event: &ProgressEvent) -> bool
where
    Tx: Sink<Message> + Unpin,
{
    match encode_event(event) {
        Some(json) => sender.send(Message::Text(json.into())).await.is_ok(),
        None => true,
    }
}

async fn close<Tx>(sender: &mut Tx)
where
    Tx: Sink<Message> + Unpin,
{
    let _ = sender.send(Message::Close(None)).await;
    let _ = sender.close().await;
}
