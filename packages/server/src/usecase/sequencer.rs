//! Broadcast sequencer.
//!
//! Registry mutation, the snapshot taken after it and the resulting pushes
//! must not interleave with another submission. Holding a [`Turn`] serializes
//! them. Pushes never block (`try_send`), so a turn is always short.

use tokio::sync::{Mutex, MutexGuard};

/// 配信の直列化ポイント
#[derive(Debug, Default)]
pub struct Sequencer {
    gate: Mutex<()>,
}

/// 順番を保持している間、他の配信は待たされる
#[derive(Debug)]
pub struct Turn<'a> {
    _guard: MutexGuard<'a, ()>,
}

impl Sequencer {
    pub fn new() -> Self {
        Self::default()
    }

    /// 順番を取得（FIFO）
    pub async fn turn(&self) -> Turn<'_> {
        Turn {
            _guard: self.gate.lock().await,
        }
    }
}
