//! Intent input plumbing
//!
//! Producers (controllers, scripted players) push intents through a bounded
//! crossbeam channel; the frame loop drains it once per frame into an
//! [`IntentTable`] holding the latest intent per player.

use crossbeam_channel::{bounded, Receiver, Sender, TrySendError};
use hashbrown::HashMap;
use rustc_hash::FxBuildHasher;

use crate::game::entity::PlayerId;
use crate::util::vec2::Vec2;

/// Per-frame control sample for one player
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Intent {
    /// Unit vector or zero
    pub move_dir: Vec2,
    /// Unit vector or zero
    pub aim_dir: Vec2,
    pub fire: bool,
}

impl Intent {
    /// Build an intent, normalizing both directions (non-finite input becomes zero)
    pub fn new(move_dir: Vec2, aim_dir: Vec2, fire: bool) -> Self {
        Self {
            move_dir: move_dir.normalize(),
            aim_dir: aim_dir.normalize(),
            fire,
        }
    }

    /// Whether the player is steering the turret this frame
    #[inline]
    pub fn is_aiming(&self) -> bool {
        !self.aim_dir.is_zero(1e-6)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IntentMessage {
    pub player_id: PlayerId,
    pub intent: Intent,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum InputBufferError {
    /// Buffer is full (backpressure)
    #[error("Intent buffer is full")]
    Full,
    /// Frame loop dropped the receiver
    #[error("Intent buffer disconnected")]
    Disconnected,
}

impl<T> From<TrySendError<T>> for InputBufferError {
    fn from(e: TrySendError<T>) -> Self {
        match e {
            TrySendError::Full(_) => InputBufferError::Full,
            TrySendError::Disconnected(_) => InputBufferError::Disconnected,
        }
    }
}

/// Bounded MPSC intent queue drained by the frame loop
pub struct InputBuffer {
    sender: Sender<IntentMessage>,
    receiver: Receiver<IntentMessage>,
    capacity: usize,
}

impl InputBuffer {
    /// Capacity should cover every intent produced between two frames
    pub fn new(capacity: usize) -> Self {
        let (sender, receiver) = bounded(capacity);
        Self {
            sender,
            receiver,
            capacity,
        }
    }

    /// Handle for a producer; each producer holds its own clone
    pub fn sender(&self) -> InputSender {
        InputSender {
            sender: self.sender.clone(),
        }
    }

    /// Non-blocking submit from the loop's side
    #[inline]
    pub fn try_submit(&self, player_id: PlayerId, intent: Intent) -> Result<(), InputBufferError> {
        self.sender.try_send(IntentMessage { player_id, intent })?;
        Ok(())
    }

    /// Take everything queued since the last frame, in submission order
    pub fn drain(&self) -> Vec<IntentMessage> {
        self.receiver.try_iter().collect()
    }

    /// Drain straight into the intent table; returns how many messages were applied
    pub fn drain_into(&self, table: &mut IntentTable) -> usize {
        let mut applied = 0;
        for message in self.receiver.try_iter() {
            table.set(message.player_id, message.intent);
            applied += 1;
        }
        applied
    }

    #[inline]
    pub fn pending_count(&self) -> usize {
        self.receiver.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.receiver.is_empty()
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl Default for InputBuffer {
    fn default() -> Self {
        // A few frames of intents for a full local arena
        Self::new(256)
    }
}

/// Clonable producer handle
#[derive(Clone)]
pub struct InputSender {
    sender: Sender<IntentMessage>,
}

impl InputSender {
    #[inline]
    pub fn try_send(&self, player_id: PlayerId, intent: Intent) -> Result<(), InputBufferError> {
        self.sender.try_send(IntentMessage { player_id, intent })?;
        Ok(())
    }
}

/// Latest intent per player. Players without an intent source coast.
#[derive(Debug, Clone, Default)]
pub struct IntentTable {
    intents: HashMap<PlayerId, Intent, FxBuildHasher>,
}

impl IntentTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, player_id: PlayerId, intent: Intent) {
        self.intents.insert(player_id, intent);
    }

    /// Intent for `player_id`, or the zero intent when none is bound
    #[inline]
    pub fn get(&self, player_id: PlayerId) -> Intent {
        self.intents.get(&player_id).copied().unwrap_or_default()
    }

    pub fn remove(&mut self, player_id: PlayerId) -> Option<Intent> {
        self.intents.remove(&player_id)
    }

    pub fn len(&self) -> usize {
        self.intents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.intents.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn intent(x: f32, fire: bool) -> Intent {
        Intent::new(Vec2::new(x, 0.0), Vec2::new(0.0, 1.0), fire)
    }

    #[test]
    fn test_submit_and_drain_in_order() {
        let buffer = InputBuffer::new(10);

        buffer.try_submit(1, intent(1.0, false)).unwrap();
        buffer.try_submit(2, intent(-1.0, true)).unwrap();
        buffer.try_submit(1, intent(-1.0, false)).unwrap();
        assert_eq!(buffer.pending_count(), 3);

        let messages = buffer.drain();
        assert_eq!(messages.len(), 3);
        assert_eq!(messages[0].player_id, 1);
        assert_eq!(messages[1].player_id, 2);
        assert!(messages[1].intent.fire);
        assert!(buffer.is_empty());
    }

    #[test]
    fn test_backpressure() {
        let buffer = InputBuffer::new(2);
        buffer.try_submit(0, intent(1.0, false)).unwrap();
        buffer.try_submit(0, intent(1.0, false)).unwrap();
        assert_eq!(buffer.try_submit(0, intent(1.0, false)), Err(InputBufferError::Full));

        buffer.drain();
        assert!(buffer.try_submit(0, intent(1.0, false)).is_ok());
    }

    #[test]
    fn test_sender_clones_share_queue() {
        let buffer = InputBuffer::new(10);
        let a = buffer.sender();
        let b = a.clone();
        a.try_send(0, intent(1.0, false)).unwrap();
        b.try_send(1, intent(1.0, false)).unwrap();
        assert_eq!(buffer.drain().len(), 2);
    }

    #[test]
    fn test_disconnected_sender() {
        let buffer = InputBuffer::new(4);
        let sender = buffer.sender();
        drop(buffer);
        assert_eq!(
            sender.try_send(0, Intent::default()),
            Err(InputBufferError::Disconnected)
        );
    }

    #[test]
    fn test_drain_into_keeps_latest_intent() {
        let buffer = InputBuffer::new(10);
        let mut table = IntentTable::new();
        buffer.try_submit(4, intent(1.0, false)).unwrap();
        buffer.try_submit(4, intent(-1.0, true)).unwrap();

        assert_eq!(buffer.drain_into(&mut table), 2);
        let latest = table.get(4);
        assert_eq!(latest.move_dir, Vec2::new(-1.0, 0.0));
        assert!(latest.fire);
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn test_unknown_player_gets_zero_intent() {
        let table = IntentTable::new();
        let intent = table.get(99);
        assert_eq!(intent, Intent::default());
        assert!(!intent.is_aiming());
    }

    #[test]
    fn test_intent_normalizes_directions() {
        let intent = Intent::new(Vec2::new(3.0, 4.0), Vec2::new(f32::NAN, 1.0), false);
        assert!((intent.move_dir.length() - 1.0).abs() < 1e-6);
        assert_eq!(intent.aim_dir, Vec2::ZERO);
    }
}
