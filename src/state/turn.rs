use crate::api::stream::StreamParser;
use crate::api::GatewayClient;
use crate::types::{ApiMessage, ChatMode, StreamEvent};
use anyhow::Result;
use futures::StreamExt;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use super::session::TurnHandle;

/// Progress of one streamed answer, tagged with the turn it belongs to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TurnUpdate {
    Delta { epoch: u64, text: String },
    Done { epoch: u64 },
    Failed { epoch: u64, error: String },
}

impl TurnUpdate {
    pub fn epoch(&self) -> u64 {
        match self {
            TurnUpdate::Delta { epoch, .. }
            | TurnUpdate::Done { epoch }
            | TurnUpdate::Failed { epoch, .. } => *epoch,
        }
    }
}

fn emit(tx: &mpsc::UnboundedSender<TurnUpdate>, update: TurnUpdate) {
    let _ = tx.send(update);
}

/// Stream one answer, forwarding each text delta as it arrives.
///
/// Returns the full answer text. When the handle is cancelled the stream is
/// dropped and no further updates (not even `Done`) are sent.
pub async fn run_turn(
    client: &GatewayClient,
    mode: ChatMode,
    context: Option<&str>,
    history: &[ApiMessage],
    handle: &TurnHandle,
    tx: &mpsc::UnboundedSender<TurnUpdate>,
) -> Result<String> {
    let epoch = handle.epoch();
    let cancel = handle.cancellation();
    let mut answer = String::new();

    let mut stream = tokio::select! {
        biased;
        _ = cancel.cancelled() => return Ok(answer),
        stream = client.create_stream(mode, context, history) => stream?,
    };
    let mut parser = StreamParser::new();

    loop {
        let next = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Ok(answer),
            next = stream.next() => next,
        };
        let Some(chunk_result) = next else {
            break;
        };
        let chunk = chunk_result?;
        for event in parser.process(&chunk)? {
            if forward(event, epoch, &mut answer, tx) {
                emit(tx, TurnUpdate::Done { epoch });
                return Ok(answer);
            }
        }
    }

    for event in parser.flush() {
        if forward(event, epoch, &mut answer, tx) {
            break;
        }
    }
    emit(tx, TurnUpdate::Done { epoch });
    Ok(answer)
}

/// Returns `true` once the done signal is seen.
fn forward(
    event: StreamEvent,
    epoch: u64,
    answer: &mut String,
    tx: &mpsc::UnboundedSender<TurnUpdate>,
) -> bool {
    match event {
        StreamEvent::Delta(text) => {
            answer.push_str(&text);
            emit(tx, TurnUpdate::Delta { epoch, text });
            false
        }
        StreamEvent::Done => true,
    }
}

/// Run [`run_turn`] on the tokio runtime, reporting transport errors as
/// [`TurnUpdate::Failed`] instead of dropping them.
pub fn spawn_turn(
    client: Arc<GatewayClient>,
    mode: ChatMode,
    context: Option<String>,
    history: Vec<ApiMessage>,
    handle: TurnHandle,
    tx: mpsc::UnboundedSender<TurnUpdate>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        if let Err(error) = run_turn(&client, mode, context.as_deref(), &history, &handle, &tx).await {
            if !handle.is_cancelled() {
                emit(
                    &tx,
                    TurnUpdate::Failed {
                        epoch: handle.epoch(),
                        error: format!("{error:#}"),
                    },
                );
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::mock_client::{delta_frame, MockGateway};
    use crate::segment::{segment, Confidence};
    use crate::state::ChatSession;
    use std::time::Duration;

    fn client_with(responses: Vec<Vec<String>>) -> (Arc<MockGateway>, GatewayClient) {
        let mock = Arc::new(MockGateway::new(responses));
        let client = GatewayClient::new_mock(mock.clone());
        (mock, client)
    }

    #[tokio::test]
    async fn test_run_turn_forwards_deltas_then_done() -> Result<()> {
        let (_mock, client) = client_with(vec![vec![
            delta_frame("# Overview\nThe TAM "),
            delta_frame("is large.\n# Risks\nHigh confidence"),
            delta_frame(" the market will grow."),
            "data: [DONE]".to_string(),
        ]]);
        let mut session = ChatSession::default();
        let handle = session.begin_turn("TAM for AI CRM?")?;
        let (tx, mut rx) = mpsc::unbounded_channel();

        let answer = run_turn(
            &client,
            session.mode(),
            None,
            &session.history_for_api(),
            &handle,
            &tx,
        )
        .await?;
        drop(tx);

        let mut section_counts = Vec::new();
        while let Some(update) = rx.recv().await {
            assert_eq!(update.epoch(), handle.epoch());
            let done = matches!(update, TurnUpdate::Done { .. });
            assert!(session.apply_update(update, Vec::new()));
            if !done {
                section_counts.push(segment(&session.messages()[1].content).len());
            }
        }

        assert_eq!(section_counts, vec![1, 2, 2]);
        assert_eq!(session.messages()[1].content, answer);
        let sections = segment(&answer);
        assert_eq!(sections[1].confidence, Some(Confidence::High));
        assert!(!session.is_streaming());
        Ok(())
    }

    #[tokio::test]
    async fn test_run_turn_without_done_sentinel_still_finishes() -> Result<()> {
        let (_mock, client) = client_with(vec![vec![delta_frame("Just text")]]);
        let mut session = ChatSession::default();
        let handle = session.begin_turn("q")?;
        let (tx, mut rx) = mpsc::unbounded_channel();

        run_turn(&client, session.mode(), None, &session.history_for_api(), &handle, &tx).await?;

        assert_eq!(
            rx.recv().await,
            Some(TurnUpdate::Delta {
                epoch: handle.epoch(),
                text: "Just text".to_string(),
            })
        );
        assert_eq!(rx.recv().await, Some(TurnUpdate::Done { epoch: handle.epoch() }));
        Ok(())
    }

    #[tokio::test]
    async fn test_cancelled_turn_sends_nothing() -> Result<()> {
        let (_mock, client) = client_with(vec![vec![delta_frame("ignored")]]);
        let mut session = ChatSession::default();
        let handle = session.begin_turn("q")?;
        session.cancel_turn();
        let (tx, mut rx) = mpsc::unbounded_channel();

        let answer =
            run_turn(&client, session.mode(), None, &session.history_for_api(), &handle, &tx).await?;
        drop(tx);

        assert!(answer.is_empty());
        assert_eq!(rx.recv().await, None);
        Ok(())
    }

    #[tokio::test]
    async fn test_spawn_turn_reports_stream_errors() {
        let (_mock, client) = client_with(Vec::new());
        let mut session = ChatSession::default();
        let handle = session.begin_turn("q").unwrap();
        let (tx, mut rx) = mpsc::unbounded_channel();

        let task = spawn_turn(
            Arc::new(client),
            session.mode(),
            None,
            session.history_for_api(),
            handle.clone(),
            tx,
        );
        let update = tokio::time::timeout(Duration::from_secs(1), rx.recv())
            .await
            .expect("update should arrive")
            .expect("channel should yield a failure");
        task.await.unwrap();

        match &update {
            TurnUpdate::Failed { epoch, error } => {
                assert_eq!(*epoch, handle.epoch());
                assert!(error.contains("No more responses configured"));
            }
            other => panic!("unexpected update: {other:?}"),
        }
        assert!(session.apply_update(update, Vec::new()));
        assert!(!session.is_streaming());
    }
}
