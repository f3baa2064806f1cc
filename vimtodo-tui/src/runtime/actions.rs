use crate::api::ApiClient;
use crate::app::{App, PendingCall};

use super::action_queue::{Action, ActionTx};

pub(super) fn enqueue_call(action_tx: &ActionTx, call: Option<PendingCall>) {
    if let Some(call) = call {
        let _ = action_tx.send(Action::Issue(call));
    }
}

pub(super) fn run_action(action: Action, app: &mut App, client: &ApiClient, action_tx: &ActionTx) {
    match action {
        Action::Issue(call) => spawn_call(call, client, action_tx),
        Action::Settled { ticket, result } => {
            if let Some(next) = app.settle(ticket, result) {
                spawn_call(next, client, action_tx);
            }
        }
    }
}

/// Run the call on its own task so the UI keeps drawing while it is in flight.
fn spawn_call(call: PendingCall, client: &ApiClient, action_tx: &ActionTx) {
    let client = client.clone();
    let action_tx = action_tx.clone();
    tokio::spawn(async move {
        let PendingCall { ticket, request } = call;
        tracing::debug!(ticket, ?request, "issuing task call");
        let result = client.execute(request).await;
        let _ = action_tx.send(Action::Settled { ticket, result });
    });
}
