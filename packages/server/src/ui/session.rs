//! Per-connection session state machine.
//!
//! Handshake → name negotiation → message loop → teardown, generic over the
//! transport so tests can drive it with an in-memory duplex stream instead of
//! a live socket.

use std::sync::Arc;

use tokio::{
    io::{AsyncBufRead, AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader, BufWriter},
    sync::mpsc,
};

use idobata_shared::time::Clock;

use crate::{
    domain::{OutboundChannel, Timestamp, Username, input_prompt},
    usecase::{JoinChatUseCase, JoinError, LeaveChatUseCase, SendMessageUseCase},
};

/// Name prompt sent during negotiation.
pub const NAME_PROMPT: &str = "\n[ENTER YOUR NAME]: ";

/// Session lifecycle states.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Transport accepted, nothing exchanged yet.
    Connected,
    /// Banner sent, waiting for a valid display name.
    Negotiating,
    /// Registered; relaying messages.
    Active,
    /// Read loop ended; deregistering.
    Closing,
    /// Fully torn down.
    Closed,
}

/// Shared dependencies injected into every session.
pub struct SessionContext {
    pub join_chat: Arc<JoinChatUseCase>,
    pub send_message: Arc<SendMessageUseCase>,
    pub leave_chat: Arc<LeaveChatUseCase>,
    pub clock: Arc<dyn Clock>,
    /// Welcome banner sent before the name prompt.
    pub banner: String,
}

/// Drive one client connection through its full lifecycle.
///
/// All outbound bytes flow through one channel so broadcasts from other
/// sessions and this session's own prompts share a single ordered writer.
/// The registry is never locked while any of those bytes are written.
pub async fn handle_connection<S>(stream: S, context: Arc<SessionContext>)
where
    S: AsyncRead + AsyncWrite + Send + 'static,
{
    let (read_half, write_half) = tokio::io::split(stream);
    let mut reader = BufReader::new(read_half);

    let (tx, rx) = mpsc::unbounded_channel::<String>();
    let writer_task = tokio::spawn(write_pump(write_half, rx));

    let mut state = SessionState::Connected;
    transition(&mut state, SessionState::Negotiating);

    let username = match negotiate(&mut reader, &tx, &context).await {
        Some(name) => name,
        None => {
            // Rejected at capacity, or the client went away mid-handshake.
            transition(&mut state, SessionState::Closed);
            drop(tx);
            let _ = writer_task.await;
            return;
        }
    };

    transition(&mut state, SessionState::Active);

    context.join_chat.announce_join(&username).await;
    context.join_chat.replay_history(&username).await;
    context.join_chat.send_initial_prompt(&username).await;

    read_loop(&mut reader, &tx, &username, &context).await;

    transition(&mut state, SessionState::Closing);
    context.leave_chat.execute(&username).await;

    // Deregistration dropped the pusher's sender clone; dropping the local
    // one lets the pump drain whatever is queued and exit.
    drop(tx);
    let _ = writer_task.await;
    transition(&mut state, SessionState::Closed);
}

fn transition(state: &mut SessionState, next: SessionState) {
    tracing::debug!("session state: {:?} -> {:?}", state, next);
    *state = next;
}

/// Run the name-negotiation handshake.
///
/// Returns the registered username, or `None` when the connection should be
/// closed without entering the message loop: EOF, transport error, or a
/// capacity rejection. Name rejections (empty, too long, taken) re-prompt
/// with no retry limit; only the capacity rejection closes the connection.
async fn negotiate<R>(
    reader: &mut R,
    tx: &OutboundChannel,
    context: &SessionContext,
) -> Option<Username>
where
    R: AsyncBufRead + Unpin,
{
    if tx.send(context.banner.clone()).is_err() {
        return None;
    }

    loop {
        if tx.send(NAME_PROMPT.to_string()).is_err() {
            return None;
        }

        let mut line = String::new();
        match reader.read_line(&mut line).await {
            Ok(0) => return None, // EOF before registering
            Ok(_) => {}
            Err(e) => {
                tracing::warn!("Read error during negotiation: {}", e);
                return None;
            }
        }

        let name = match Username::new(line.trim().to_string()) {
            Ok(name) => name,
            Err(e) => {
                // Validation errors are user-facing text, not failures.
                let _ = tx.send(format!("{}\n", e));
                continue;
            }
        };

        match context.join_chat.execute(name.clone(), tx.clone()).await {
            Ok(_) => return Some(name),
            Err(JoinError::NameTaken) => {
                let _ = tx.send(format!("{}\n", JoinError::NameTaken));
            }
            Err(JoinError::RoomFull) => {
                let _ = tx.send(format!("{}\n", JoinError::RoomFull));
                return None;
            }
        }
    }
}

/// Relay inbound lines until EOF or a transport error.
///
/// Every iteration ends by sending the sender a fresh prompt, so its terminal
/// never waits on its own echoed broadcast.
async fn read_loop<R>(
    reader: &mut R,
    tx: &OutboundChannel,
    username: &Username,
    context: &SessionContext,
) where
    R: AsyncBufRead + Unpin,
{
    loop {
        let mut line = String::new();
        match reader.read_line(&mut line).await {
            Ok(0) => {
                tracing::info!("{} disconnected", username);
                return;
            }
            Ok(_) => {}
            Err(e) => {
                tracing::warn!("Error reading from {}: {}", username, e);
                return;
            }
        }

        let text = line.trim_end_matches(['\r', '\n']).to_string();

        if let Err(e) = context.send_message.execute(username, text).await
            && tx.send(format!("{}\n", e)).is_err()
        {
            return;
        }

        let stamp = Timestamp::new(context.clock.now_millis());
        if tx.send(input_prompt(username, stamp)).is_err() {
            return;
        }
    }
}

/// Drain the outbound channel into the transport.
///
/// Exits when every sender is dropped (teardown) or the transport rejects a
/// write; the session notices the latter through its own read loop.
async fn write_pump<W>(write_half: W, mut rx: mpsc::UnboundedReceiver<String>)
where
    W: AsyncWrite + Unpin,
{
    let mut writer = BufWriter::new(write_half);
    while let Some(payload) = rx.recv().await {
        if let Err(e) = writer.write_all(payload.as_bytes()).await {
            tracing::debug!("Write failed, stopping pump: {}", e);
            return;
        }
        if let Err(e) = writer.flush().await {
            tracing::debug!("Flush failed, stopping pump: {}", e);
            return;
        }
    }
    let _ = writer.shutdown().await;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{HistoryError, HistoryStore, Room, RoomRepository};
    use crate::infrastructure::{ChannelMessagePusher, InMemoryRoomRepository};
    use crate::usecase::Broadcaster;
    use async_trait::async_trait;
    use idobata_shared::time::FixedClock;
    use std::time::Duration;
    use tokio::io::{AsyncReadExt, AsyncWriteExt, DuplexStream};
    use tokio::sync::Mutex;
    use tokio::time::timeout;

    // 2023-01-01 00:00:00 UTC
    const STAMP: i64 = 1672531200000;
    const PROMPT: &str = "\n[2023-01-01 00:00:00]";
    const BANNER: &str = "Welcome to idobata chat!\n";

    fn username(name: &str) -> Username {
        Username::new(name.to_string()).unwrap()
    }

    /// 追記内容をメモリに溜めるテスト用 HistoryStore
    struct InMemoryHistory {
        lines: Mutex<Vec<String>>,
    }

    impl InMemoryHistory {
        fn new(lines: &[&str]) -> Self {
            Self {
                lines: Mutex::new(lines.iter().map(|s| s.to_string()).collect()),
            }
        }
    }

    #[async_trait]
    impl HistoryStore for InMemoryHistory {
        async fn append(&self, line: &str) -> Result<(), HistoryError> {
            self.lines.lock().await.push(line.to_string());
            Ok(())
        }

        async fn load_all(&self) -> Result<Vec<String>, HistoryError> {
            Ok(self.lines.lock().await.clone())
        }

        async fn reset(&self) -> Result<(), HistoryError> {
            self.lines.lock().await.clear();
            Ok(())
        }
    }

    struct TestHarness {
        repository: Arc<InMemoryRoomRepository>,
        history: Arc<InMemoryHistory>,
        context: Arc<SessionContext>,
    }

    fn create_harness(capacity: usize, history_lines: &[&str]) -> TestHarness {
        let repository = Arc::new(InMemoryRoomRepository::new(Arc::new(Mutex::new(
            Room::with_capacity(capacity),
        ))));
        let pusher = Arc::new(ChannelMessagePusher::new());
        let history = Arc::new(InMemoryHistory::new(history_lines));
        let clock: Arc<dyn Clock> = Arc::new(FixedClock::new(STAMP));
        let broadcaster = Arc::new(Broadcaster::new(
            repository.clone(),
            pusher.clone(),
            clock.clone(),
        ));
        let context = Arc::new(SessionContext {
            join_chat: Arc::new(JoinChatUseCase::new(
                repository.clone(),
                pusher.clone(),
                history.clone(),
                broadcaster.clone(),
                clock.clone(),
            )),
            send_message: Arc::new(SendMessageUseCase::new(
                history.clone(),
                broadcaster.clone(),
                clock.clone(),
            )),
            leave_chat: Arc::new(LeaveChatUseCase::new(
                repository.clone(),
                pusher.clone(),
                broadcaster,
            )),
            clock,
            banner: BANNER.to_string(),
        });
        TestHarness {
            repository,
            history,
            context,
        }
    }

    /// セッションを張り、クライアント側の DuplexStream を返す
    fn connect(harness: &TestHarness) -> DuplexStream {
        let (client, server) = tokio::io::duplex(4096);
        let context = harness.context.clone();
        tokio::spawn(async move {
            handle_connection(server, context).await;
        });
        client
    }

    /// `pattern` が現れるまで読み続け、読めた全バイトを返す
    async fn read_until(stream: &mut DuplexStream, pattern: &str) -> String {
        let mut received = String::new();
        let mut buf = [0u8; 1024];
        let deadline = Duration::from_secs(5);
        loop {
            if received.contains(pattern) {
                return received;
            }
            let n = timeout(deadline, stream.read(&mut buf))
                .await
                .expect("timed out waiting for pattern")
                .expect("read failed");
            if n == 0 {
                panic!(
                    "stream closed before pattern {:?}; received so far: {:?}",
                    pattern, received
                );
            }
            received.push_str(&String::from_utf8_lossy(&buf[..n]));
        }
    }

    /// 接続直後のハンドシェイクを済ませて Active 状態まで進める
    async fn join(stream: &mut DuplexStream, name: &str) -> String {
        read_until(stream, NAME_PROMPT).await;
        stream
            .write_all(format!("{}\n", name).as_bytes())
            .await
            .unwrap();
        read_until(stream, &format!("[{}]:", name)).await
    }

    /// 参加者数が期待値になるまで待つ（テアダウンは非同期に進む）
    async fn wait_for_count(harness: &TestHarness, expected: usize) {
        for _ in 0..100 {
            if harness.repository.count().await == expected {
                return;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!(
            "registry never reached {} participants (now {})",
            expected,
            harness.repository.count().await
        );
    }

    #[tokio::test]
    async fn test_handshake_sends_banner_then_prompt() {
        // テスト項目: 接続直後にバナーと名前プロンプトが順に届く
        // given (前提条件):
        let harness = create_harness(10, &[]);

        // when (操作):
        let mut client = connect(&harness);
        let received = read_until(&mut client, NAME_PROMPT).await;

        // then (期待する結果):
        assert!(received.starts_with(BANNER));
        assert!(received.ends_with(NAME_PROMPT));
    }

    #[tokio::test]
    async fn test_valid_name_enters_active_state() {
        // テスト項目: 有効な名前で登録され、自分のプロンプトが届く
        // given (前提条件):
        let harness = create_harness(10, &[]);
        let mut client = connect(&harness);

        // when (操作):
        let received = join(&mut client, "alice").await;

        // then (期待する結果):
        assert!(received.contains("\n[2023-01-01 00:00:00][alice]:"));
        assert_eq!(harness.repository.count().await, 1);
    }

    #[tokio::test]
    async fn test_invalid_names_reprompt_without_limit() {
        // テスト項目: 空・長すぎる名前は理由つきで再プロンプトされ、接続は保たれる
        // given (前提条件):
        let harness = create_harness(10, &[]);
        let mut client = connect(&harness);
        read_until(&mut client, NAME_PROMPT).await;

        // when (操作): 空の名前
        client.write_all(b"\n").await.unwrap();
        let received = read_until(&mut client, NAME_PROMPT).await;

        // then (期待する結果):
        assert!(received.contains("username cannot be empty\n"));

        // when (操作): 長すぎる名前
        client
            .write_all(format!("{}\n", "a".repeat(16)).as_bytes())
            .await
            .unwrap();
        let received = read_until(&mut client, NAME_PROMPT).await;

        // then (期待する結果):
        assert!(received.contains("username cannot be more than 15 characters long\n"));

        // 最終的に有効な名前で登録できる
        client.write_all(b"alice\n").await.unwrap();
        read_until(&mut client, "[alice]:").await;
        assert_eq!(harness.repository.count().await, 1);
    }

    #[tokio::test]
    async fn test_duplicate_name_reprompts() {
        // テスト項目: 使用中の名前は再プロンプトされ、別名で登録できる
        // given (前提条件):
        let harness = create_harness(10, &[]);
        let mut alice = connect(&harness);
        join(&mut alice, "alice").await;

        // when (操作): 2 人目が同じ名前を送る
        let mut second = connect(&harness);
        read_until(&mut second, NAME_PROMPT).await;
        second.write_all(b"alice\n").await.unwrap();
        let received = read_until(&mut second, NAME_PROMPT).await;

        // then (期待する結果):
        assert!(received.contains("username already exists\n"));

        // 別名なら登録できる
        second.write_all(b"bob\n").await.unwrap();
        read_until(&mut second, "[bob]:").await;
        assert_eq!(harness.repository.count().await, 2);
    }

    #[tokio::test]
    async fn test_room_full_rejection_closes_connection() {
        // テスト項目: 満室時は断りの文言を送って接続を閉じる（再試行なし）
        // given (前提条件):
        let harness = create_harness(1, &[]);
        let mut alice = connect(&harness);
        join(&mut alice, "alice").await;

        // when (操作): 2 人目が名前を送る
        let mut second = connect(&harness);
        read_until(&mut second, NAME_PROMPT).await;
        second.write_all(b"bob\n").await.unwrap();
        let received =
            read_until(&mut second, "Sorry, the chat room is full. Please try again later.\n")
                .await;

        // then (期待する結果): 断りの後に EOF（再プロンプトされない）
        assert!(!received.ends_with(NAME_PROMPT));
        let mut buf = [0u8; 64];
        let n = timeout(Duration::from_secs(5), second.read(&mut buf))
            .await
            .expect("timed out waiting for close")
            .expect("read failed");
        assert_eq!(n, 0);
        assert_eq!(harness.repository.count().await, 1);
    }

    #[tokio::test]
    async fn test_history_replay_before_first_prompt() {
        // テスト項目: 参加時に履歴が保存順で再生され、その後にプロンプトが来る
        // given (前提条件):
        let harness = create_harness(10, &["m1", "m2", "m3"]);
        let mut client = connect(&harness);

        // when (操作):
        let received = join(&mut client, "alice").await;

        // then (期待する結果):
        let replay_and_prompt = "m1\nm2\nm3\n\n[2023-01-01 00:00:00][alice]:";
        assert!(
            received.ends_with(replay_and_prompt),
            "unexpected replay: {:?}",
            received
        );
    }

    #[tokio::test]
    async fn test_join_announcement_reaches_existing_clients() {
        // テスト項目: 既存の参加者に入室アナウンスと自分用プロンプトが届く
        // given (前提条件):
        let harness = create_harness(10, &[]);
        let mut alice = connect(&harness);
        join(&mut alice, "alice").await;

        // when (操作): bob が参加
        let mut bob = connect(&harness);
        join(&mut bob, "bob").await;

        // then (期待する結果):
        let received = read_until(&mut alice, "[alice]:").await;
        assert!(received.contains("\nbob has joined our chat...\n"));
        assert!(received.ends_with(&format!("{}[alice]:", PROMPT)));
    }

    #[tokio::test]
    async fn test_message_broadcast_excludes_sender() {
        // テスト項目: 発言が他の参加者にだけ届き、送信者には新しいプロンプトが届く
        // given (前提条件):
        let harness = create_harness(10, &[]);
        let mut alice = connect(&harness);
        join(&mut alice, "alice").await;
        let mut bob = connect(&harness);
        join(&mut bob, "bob").await;
        // alice 側に溜まった入室アナウンスを読み捨てる
        read_until(&mut alice, "[alice]:").await;

        // when (操作): alice が発言
        alice.write_all(b"hello bob\n").await.unwrap();

        // then (期待する結果): bob には本文 + 自分のプロンプト
        let received = read_until(&mut bob, "[bob]:").await;
        assert!(
            received.contains("\n[2023-01-01 00:00:00][alice]: hello bob\n"),
            "bob did not receive the message: {:?}",
            received
        );

        // alice には本文は返らず、新しいプロンプトだけが届く
        let received = read_until(&mut alice, "[alice]:").await;
        assert!(!received.contains("hello bob"));

        // 履歴にも 1 行だけ追記されている
        let lines = harness.history.load_all().await.unwrap();
        assert_eq!(lines, vec!["[2023-01-01 00:00:00][alice]: hello bob"]);
    }

    #[tokio::test]
    async fn test_empty_message_gets_local_error_only() {
        // テスト項目: 空メッセージは送信者だけに文言が返り、配送も履歴追記もされない
        // given (前提条件):
        let harness = create_harness(10, &[]);
        let mut alice = connect(&harness);
        join(&mut alice, "alice").await;
        let mut bob = connect(&harness);
        join(&mut bob, "bob").await;
        read_until(&mut alice, "[alice]:").await;

        // when (操作): alice が空行を送る
        alice.write_all(b"\n").await.unwrap();

        // then (期待する結果): alice にエラー文言 + 新しいプロンプト
        let received = read_until(&mut alice, "[alice]:").await;
        assert!(received.contains("you can't send empty messages\n"));

        // bob には何も配送されていない（次の本物の発言だけが届く）
        alice.write_all(b"real one\n").await.unwrap();
        let received = read_until(&mut bob, "real one").await;
        assert!(!received.contains("you can't send empty messages"));

        // 履歴には本物の発言だけが残る
        let lines = harness.history.load_all().await.unwrap();
        assert_eq!(lines, vec!["[2023-01-01 00:00:00][alice]: real one"]);
    }

    #[tokio::test]
    async fn test_disconnect_announces_leave_and_deregisters() {
        // テスト項目: 切断で退室アナウンスが流れ、レジストリから削除される
        // given (前提条件):
        let harness = create_harness(10, &[]);
        let mut alice = connect(&harness);
        join(&mut alice, "alice").await;
        let mut bob = connect(&harness);
        join(&mut bob, "bob").await;
        read_until(&mut alice, "[alice]:").await;

        // when (操作): bob が切断
        drop(bob);

        // then (期待する結果):
        let received = read_until(&mut alice, "bob has left our chat...").await;
        assert!(received.contains("\nbob has left our chat...\n"));
        wait_for_count(&harness, 1).await;

        // 名前は再利用できる
        let mut second = connect(&harness);
        join(&mut second, "bob").await;
        assert_eq!(harness.repository.count().await, 2);
    }

    #[tokio::test]
    async fn test_dead_recipient_does_not_block_others() {
        // テスト項目: 1 人の切断中クライアントがいても他の参加者への配送は続く
        // given (前提条件):
        let harness = create_harness(10, &[]);
        let mut alice = connect(&harness);
        join(&mut alice, "alice").await;
        let mut bob = connect(&harness);
        join(&mut bob, "bob").await;
        let charlie = connect(&harness);
        {
            let mut charlie = charlie;
            join(&mut charlie, "charlie").await;
            // when (操作): charlie のトランスポートが落ちる
            drop(charlie);
        }
        wait_for_count(&harness, 2).await;
        read_until(&mut alice, "charlie has left our chat...").await;
        read_until(&mut bob, "charlie has left our chat...").await;

        // alice の発言は bob に届き続ける
        alice.write_all(b"still here?\n").await.unwrap();
        let received = read_until(&mut bob, "still here?").await;
        assert!(received.contains("[alice]: still here?"));
    }

    #[tokio::test]
    async fn test_eof_before_registration_leaves_registry_untouched() {
        // テスト項目: 名前登録前の切断ではレジストリに何も残らない
        // given (前提条件):
        let harness = create_harness(10, &[]);
        let mut client = connect(&harness);
        read_until(&mut client, NAME_PROMPT).await;

        // when (操作): 名前を送らずに切断
        drop(client);
        tokio::time::sleep(Duration::from_millis(50)).await;

        // then (期待する結果):
        assert_eq!(harness.repository.count().await, 0);
    }
}
