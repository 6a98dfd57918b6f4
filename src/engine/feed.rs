//! Latest-value input feed between the host and the animator.
//!
//! Publishing replaces the whole snapshot atomically; the animator only
//! ever sees complete inputs and never queues stale ones.

use std::sync::Arc;

use tokio::sync::watch;

use crate::core::Result;
use crate::sky::SkyStateInput;

type Slot = Option<Arc<SkyStateInput>>;

/// Create a connected publisher/feed pair with no input yet.
pub fn input_channel() -> (InputPublisher, InputFeed) {
    let (tx, rx) = watch::channel(None);
    (InputPublisher { tx }, InputFeed { rx })
}

/// Host side. Publishing never blocks and never fails, even once every
/// feed has been dropped.
#[derive(Debug)]
pub struct InputPublisher {
    tx: watch::Sender<Slot>,
}

impl InputPublisher {
    pub fn publish(&self, input: SkyStateInput) {
        self.tx.send_replace(Some(Arc::new(input)));
    }

    /// Publish a snapshot given as JSON (camelCase fields). The previous
    /// input stays in place when parsing fails.
    pub fn publish_json(&self, json: &str) -> Result<()> {
        let input = SkyStateInput::from_json(json)?;
        self.publish(input);
        Ok(())
    }

    /// Withdraw the input; the animator renders nothing until the next publish.
    pub fn clear(&self) {
        self.tx.send_replace(None);
    }

    /// Another feed observing this publisher.
    pub fn subscribe(&self) -> InputFeed {
        InputFeed { rx: self.tx.subscribe() }
    }

    pub fn current(&self) -> Option<Arc<SkyStateInput>> {
        self.tx.borrow().clone()
    }
}

/// Animator side.
#[derive(Debug, Clone)]
pub struct InputFeed {
    rx: watch::Receiver<Slot>,
}

impl InputFeed {
    /// Whether a new value was published since the last [`InputFeed::latest`].
    /// A closed channel reports no change.
    pub fn has_changed(&self) -> bool {
        self.rx.has_changed().unwrap_or(false)
    }

    /// Current snapshot, marking it seen.
    pub fn latest(&mut self) -> Option<Arc<SkyStateInput>> {
        self.rx.borrow_and_update().clone()
    }
}
