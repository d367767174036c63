//! Controller notifications
//!
//! The presentation shell subscribes to these to drive its turn label,
//! message log and "next move" button. Listeners are called synchronously
//! while the controller processes an input or a request settlement.

use super::oracle::GameStatus;
use super::types::PieceColor;
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notification {
    /// A move was applied; the payload is the new side to move
    TurnChanged(PieceColor),
    /// The side to move is in check
    Check(PieceColor),
    GameOver(GameStatus),
    /// Human-readable line for the message log
    LogMessage(String),
    RequestStarted,
    RequestDone,
}

impl Notification {
    pub fn kind(&self) -> NotificationKind {
        match self {
            Notification::TurnChanged(_) => NotificationKind::TurnChanged,
            Notification::Check(_) => NotificationKind::Check,
            Notification::GameOver(_) => NotificationKind::GameOver,
            Notification::LogMessage(_) => NotificationKind::LogMessage,
            Notification::RequestStarted => NotificationKind::RequestStarted,
            Notification::RequestDone => NotificationKind::RequestDone,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NotificationKind {
    TurnChanged,
    Check,
    GameOver,
    LogMessage,
    RequestStarted,
    RequestDone,
}

/// Handle returned by [`Notifier::subscribe`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Listener = Box<dyn FnMut(&Notification) + Send>;

struct Subscription {
    id: SubscriptionId,
    kind: Option<NotificationKind>,
    listener: Listener,
}

/// Fan-out of notifications to listeners registered per kind
#[derive(Default)]
pub struct Notifier {
    subscriptions: Vec<Subscription>,
    next_id: u64,
}

impl Notifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Call `listener` for every notification of `kind`
    pub fn subscribe(
        &mut self,
        kind: NotificationKind,
        listener: impl FnMut(&Notification) + Send + 'static,
    ) -> SubscriptionId {
        self.insert(Some(kind), Box::new(listener))
    }

    /// Call `listener` for every notification
    pub fn subscribe_all(
        &mut self,
        listener: impl FnMut(&Notification) + Send + 'static,
    ) -> SubscriptionId {
        self.insert(None, Box::new(listener))
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.subscriptions.len();
        self.subscriptions.retain(|s| s.id != id);
        self.subscriptions.len() != before
    }

    pub fn emit(&mut self, notification: Notification) {
        debug!("[NOTIFY] {:?}", notification);
        let kind = notification.kind();
        for subscription in &mut self.subscriptions {
            if subscription.kind.is_none_or(|k| k == kind) {
                (subscription.listener)(&notification);
            }
        }
    }

    fn insert(&mut self, kind: Option<NotificationKind>, listener: Listener) -> SubscriptionId {
        let id = SubscriptionId(self.next_id);
        self.next_id += 1;
        self.subscriptions.push(Subscription { id, kind, listener });
        id
    }
}

impl std::fmt::Debug for Notifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Notifier")
            .field("subscriptions", &self.subscriptions.len())
            .finish()
    }
}
