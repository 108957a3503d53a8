/// Background side of a run: streams stdout, buffers stderr, and reports the
/// exit, all as messages tagged with the run id.
use std::sync::mpsc::Sender;

use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::Child;
use tokio::sync::oneshot;
use tokio::task::AbortHandle;

const READ_CHUNK: usize = 4096;

/// What a run reports back to the main side.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum RunMessage {
    Stdout(String),
    /// The child exited. `code` is `None` when it was ended by a signal.
    Exited { code: Option<i32>, stderr: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Envelope {
    pub run_id: u64,
    pub message: RunMessage,
}

/// Returns how many trailing bytes of `bytes` form an incomplete UTF-8
/// sequence that the next read may complete.
pub(crate) fn incomplete_utf8_tail(bytes: &[u8]) -> usize {
    let floor = bytes.len().saturating_sub(3);
    for i in (floor..bytes.len()).rev() {
        if bytes[i] & 0xC0 != 0x80 {
            return match std::str::from_utf8(&bytes[i..]) {
                Err(e) if e.error_len().is_none() => bytes.len() - i,
                _ => 0,
            };
        }
    }
    0
}

/// Splits off the decodable prefix of `pending`, leaving an incomplete
/// trailing sequence in place.
pub(crate) fn take_complete_utf8(pending: &mut Vec<u8>) -> String {
    let tail = pending.split_off(pending.len() - incomplete_utf8_tail(pending));
    let text = String::from_utf8_lossy(pending).into_owned();
    *pending = tail;
    text
}

async fn stream_stdout<R>(mut stdout: R, run_id: u64, tx: Sender<Envelope>)
where
    R: AsyncRead + Unpin,
{
    let mut buf = [0u8; READ_CHUNK];
    let mut pending: Vec<u8> = Vec::new();

    loop {
        match stdout.read(&mut buf).await {
            Ok(0) => break,
            Ok(n) => {
                pending.extend_from_slice(&buf[..n]);
                let text = take_complete_utf8(&mut pending);
                if text.is_empty() {
                    continue;
                }
                let envelope = Envelope {
                    run_id,
                    message: RunMessage::Stdout(text),
                };
                if tx.send(envelope).is_err() {
                    return;
                }
            }
            Err(e) => {
                tracing::warn!("Run {run_id}: stdout read failed: {e}");
                break;
            }
        }
    }

    if !pending.is_empty() {
        let text = String::from_utf8_lossy(&pending).into_owned();
        let _ = tx.send(Envelope {
            run_id,
            message: RunMessage::Stdout(text),
        });
    }
}

async fn collect_stderr<R>(mut stderr: R, run_id: u64) -> String
where
    R: AsyncRead + Unpin,
{
    let mut bytes = Vec::new();
    if let Err(e) = stderr.read_to_end(&mut bytes).await {
        tracing::warn!("Run {run_id}: stderr read failed: {e}");
    }
    String::from_utf8_lossy(&bytes).into_owned()
}

/// Owns `child` until it exits or `stop` fires.
///
/// On a natural exit the remaining stdout is flushed first, then one
/// `Exited` message carries the status and the whole stderr. On stop the
/// child is killed and reaped and nothing more is sent.
pub(crate) async fn supervise(
    mut child: Child,
    run_id: u64,
    tx: Sender<Envelope>,
    mut stop: oneshot::Receiver<()>,
) {
    let stdout_task = child
        .stdout
        .take()
        .map(|stdout| tokio::spawn(stream_stdout(stdout, run_id, tx.clone())));
    let stderr_task = child
        .stderr
        .take()
        .map(|stderr| tokio::spawn(collect_stderr(stderr, run_id)));

    let aborts: Vec<AbortHandle> = stdout_task
        .iter()
        .map(|t| t.abort_handle())
        .chain(stderr_task.iter().map(|t| t.abort_handle()))
        .collect();

    let status = tokio::select! {
        status = child.wait() => status,
        _ = &mut stop => {
            tracing::debug!("Run {run_id}: stop requested, killing child");
            if let Err(e) = child.kill().await {
                tracing::warn!("Run {run_id}: failed to kill child: {e}");
            }
            aborts.iter().for_each(AbortHandle::abort);
            return;
        }
    };

    let code = match status {
        Ok(status) => status.code(),
        Err(e) => {
            tracing::warn!("Run {run_id}: waiting for child failed: {e}");
            None
        }
    };

    // A grandchild can keep the pipes open after the child exits, so the
    // drain still honours stop.
    let drain = async {
        if let Some(task) = stdout_task {
            let _ = task.await;
        }
        match stderr_task {
            Some(task) => task.await.unwrap_or_default(),
            None => String::new(),
        }
    };
    let stderr = tokio::select! {
        stderr = drain => stderr,
        _ = &mut stop => {
            aborts.iter().for_each(AbortHandle::abort);
            return;
        }
    };

    let _ = tx.send(Envelope {
        run_id,
        message: RunMessage::Exited { code, stderr },
    });
}
