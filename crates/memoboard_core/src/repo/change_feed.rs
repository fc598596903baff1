//! In-process realtime change channel.
//!
//! The feed stands in for the backend's row-level change stream: every memo
//! write is broadcast to all subscribers, and each subscription only surfaces
//! events for its own owner.

use crate::model::memo::{Memo, MemoId, OwnerId};
use log::debug;
use tokio::sync::broadcast;
use tokio::sync::broadcast::error::TryRecvError;

pub const DEFAULT_CHANNEL_CAPACITY: usize = 256;

/// Row-level change on the memos collection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChangeEvent {
    Insert(Memo),
    Update(Memo),
    Delete { id: MemoId, owner: OwnerId },
}

impl ChangeEvent {
    pub fn owner(&self) -> OwnerId {
        match self {
            Self::Insert(memo) | Self::Update(memo) => memo.owner,
            Self::Delete { owner, .. } => *owner,
        }
    }

    pub fn memo_id(&self) -> MemoId {
        match self {
            Self::Insert(memo) | Self::Update(memo) => memo.id,
            Self::Delete { id, .. } => *id,
        }
    }

    /// Event name used in log records.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Insert(_) => "insert",
            Self::Update(_) => "update",
            Self::Delete { .. } => "delete",
        }
    }
}

/// Publishing side of the change stream. Clones share one channel.
#[derive(Debug, Clone)]
pub struct ChangeFeed {
    sender: broadcast::Sender<ChangeEvent>,
}

impl ChangeFeed {
    /// Creates a feed buffering up to `capacity` undelivered events per
    /// subscriber. Zero is raised to one.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Broadcasts one event. Having no subscribers is not an error.
    pub fn publish(&self, event: ChangeEvent) {
        let kind = event.kind();
        let memo_id = event.memo_id();
        match self.sender.send(event) {
            Ok(receivers) => debug!(
                "event=change_publish module=feed status=ok kind={kind} memo_id={memo_id} receivers={receivers}"
            ),
            Err(_) => debug!(
                "event=change_publish module=feed status=skip kind={kind} memo_id={memo_id} reason=no_subscribers"
            ),
        }
    }

    /// Opens a subscription filtered to `owner`.
    pub fn subscribe(&self, owner: OwnerId) -> ChangeSubscription {
        ChangeSubscription {
            owner,
            receiver: self.sender.subscribe(),
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for ChangeFeed {
    fn default() -> Self {
        Self::new(DEFAULT_CHANNEL_CAPACITY)
    }
}

/// Result of polling a subscription without blocking.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeedPoll {
    Event(ChangeEvent),
    /// Nothing pending right now.
    Empty,
    /// The subscriber fell behind and `n` events were dropped.
    Lagged(u64),
    /// Every publisher is gone.
    Closed,
}

/// Owner-filtered receiving side of a [`ChangeFeed`].
#[derive(Debug)]
pub struct ChangeSubscription {
    owner: OwnerId,
    receiver: broadcast::Receiver<ChangeEvent>,
}

impl ChangeSubscription {
    pub fn owner(&self) -> OwnerId {
        self.owner
    }

    /// Returns the next event for this owner, skipping other owners' events.
    pub fn try_next(&mut self) -> FeedPoll {
        loop {
            match self.receiver.try_recv() {
                Ok(event) if event.owner() == self.owner => return FeedPoll::Event(event),
                Ok(_) => continue,
                Err(TryRecvError::Empty) => return FeedPoll::Empty,
                Err(TryRecvError::Lagged(skipped)) => return FeedPoll::Lagged(skipped),
                Err(TryRecvError::Closed) => return FeedPoll::Closed,
            }
        }
    }
}
