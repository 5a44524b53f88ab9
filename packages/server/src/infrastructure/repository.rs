//! InMemory Room Repository 実装
//!
//! ドメイン層が定義する RoomRepository trait の具体的な実装。
//! `tokio::sync::Mutex` で Room 全体を排他し、登録・削除・スナップショットを
//! 原子的に行います。ロックを保持するのはメモリ操作の間だけで、
//! ソケット I/O をまたいで保持することはありません。

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::domain::{Participant, Room, RoomError, RoomRepository, Timestamp, Username};

/// インメモリ Room Repository 実装
pub struct InMemoryRoomRepository {
    room: Arc<Mutex<Room>>,
}

impl InMemoryRoomRepository {
    pub fn new(room: Arc<Mutex<Room>>) -> Self {
        Self { room }
    }
}

#[async_trait]
impl RoomRepository for InMemoryRoomRepository {
    async fn try_register(&self, name: Username, joined_at: Timestamp) -> Result<(), RoomError> {
        let mut room = self.room.lock().await;
        room.try_register(name, joined_at)
    }

    async fn remove_participant(&self, name: &Username) -> bool {
        let mut room = self.room.lock().await;
        room.remove_participant(name)
    }

    async fn participants(&self) -> Vec<Participant> {
        let room = self.room.lock().await;
        room.participants().to_vec()
    }

    async fn count(&self) -> usize {
        let room = self.room.lock().await;
        room.len()
    }
}
