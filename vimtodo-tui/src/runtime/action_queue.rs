use crate::api::{ClientError, TaskResponse};
use crate::app::{PendingCall, Ticket};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

#[derive(Debug, Clone)]
pub(super) enum Action {
    /// Send a model call to the server.
    Issue(PendingCall),
    /// A call finished; hand the outcome back to the model.
    Settled {
        ticket: Ticket,
        result: Result<TaskResponse, ClientError>,
    },
}

pub(super) type ActionTx = UnboundedSender<Action>;
pub(super) type ActionRx = UnboundedReceiver<Action>;

pub(super) fn channel() -> (ActionTx, ActionRx) {
    mpsc::unbounded_channel()
}
