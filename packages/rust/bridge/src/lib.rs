//! Panviva SDK bridge.
//!
//! The Panviva SDK (and its transport, session and credentials) lives in an
//! external bridge program. pageguide spawns it once, then exchanges
//! JSON-lines messages over its stdin/stdout. [`BridgeGateway`] implements
//! both collaborator traits on top of that channel.

mod protocol;

use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use futures::StreamExt;
use tokio::io::AsyncWriteExt;
use tokio::process::{Child, ChildStdin, ChildStdout, Command};
use tokio::sync::Mutex;
use tokio_util::codec::{FramedRead, LinesCodec};
use tracing::{debug, info, instrument, warn};

use pageguide_shared::{
    BridgeConfig, GuidanceError, LiveService, Result, SearchGateway, SearchPayload,
};

use protocol::{BridgeCall, RequestMessage, ResponseMessage, body_text};

/// Longest reply line accepted from the bridge.
const MAX_LINE_BYTES: usize = 8 * 1024 * 1024;

/// Characters of a bad reply quoted in the error.
const PREVIEW_CHARS: usize = 200;

// ---------------------------------------------------------------------------
// Bridge handle
// ---------------------------------------------------------------------------

/// Pipes and bookkeeping for the spawned bridge subprocess.
///
/// `lines` keeps any partially received line across calls, so a call that
/// is dropped mid-read leaves the stream aligned for the next one.
struct BridgeHandle {
    child: Child,
    stdin: ChildStdin,
    lines: FramedRead<ChildStdout, LinesCodec>,
    request_counter: u64,
}

impl BridgeHandle {
    /// Read one non-empty line and decode it.
    async fn read_message(&mut self) -> Result<ResponseMessage> {
        let line = loop {
            match self.lines.next().await {
                Some(Ok(line)) if line.trim().is_empty() => continue,
                Some(Ok(line)) => break line,
                Some(Err(e)) => {
                    return Err(GuidanceError::Bridge(format!("bridge read error: {e}")));
                }
                None => {
                    return Err(GuidanceError::Bridge(
                        "bridge closed stdout unexpectedly".into(),
                    ));
                }
            }
        };

        serde_json::from_str(line.trim()).map_err(|e| {
            GuidanceError::Bridge(format!(
                "invalid bridge response: {e} (got: {})",
                preview(&line)
            ))
        })
    }

    async fn write_message(&mut self, msg: &RequestMessage<'_>) -> Result<()> {
        let mut json = serde_json::to_string(msg)
            .map_err(|e| GuidanceError::Bridge(format!("failed to serialize request: {e}")))?;
        json.push('\n');

        self.stdin
            .write_all(json.as_bytes())
            .await
            .map_err(|e| GuidanceError::Bridge(format!("failed to write to bridge stdin: {e}")))?;
        self.stdin
            .flush()
            .await
            .map_err(|e| GuidanceError::Bridge(format!("failed to flush bridge stdin: {e}")))
    }
}

// ---------------------------------------------------------------------------
// BridgeGateway
// ---------------------------------------------------------------------------

/// Gateway to the Panviva service through the SDK bridge subprocess.
///
/// Calls are serialized: one request is in flight at a time. A caller that
/// gives up on a call (timeout or cancellation) leaves its reply in the
/// pipe, possibly half read. Partial lines stay buffered in the handle and
/// the next call discards replies whose id it did not issue.
pub struct BridgeGateway {
    handle: Mutex<BridgeHandle>,
    timeout: Duration,
}

impl BridgeGateway {
    /// Spawn the bridge and wait for its ready signal.
    #[instrument(skip_all, fields(cmd = %config.command))]
    pub async fn spawn(config: &BridgeConfig) -> Result<Self> {
        info!(args = ?config.args, "spawning panviva bridge");

        let mut command = Command::new(&config.command);
        command
            .args(&config.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit()) // Bridge logs go to parent stderr
            .kill_on_drop(true);
        if let Some(dir) = &config.working_dir {
            command.current_dir(dir);
        }

        let mut child = command.spawn().map_err(|e| {
            GuidanceError::Bridge(format!(
                "failed to spawn bridge: {e}. Is `{}` installed?",
                config.command
            ))
        })?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| GuidanceError::Bridge("failed to capture bridge stdin".into()))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| GuidanceError::Bridge("failed to capture bridge stdout".into()))?;

        let mut handle = BridgeHandle {
            child,
            stdin,
            lines: FramedRead::new(stdout, LinesCodec::new_with_max_length(MAX_LINE_BYTES)),
            request_counter: 0,
        };

        let timeout = Duration::from_secs(config.timeout_secs);
        let ready = tokio::time::timeout(timeout, handle.read_message())
            .await
            .map_err(|_| GuidanceError::Bridge("timed out waiting for bridge ready".into()))??;

        match ready {
            ResponseMessage::Ready => info!("bridge is ready"),
            other => {
                return Err(GuidanceError::Bridge(format!(
                    "expected ready message, got: {other:?}"
                )));
            }
        }

        Ok(Self {
            handle: Mutex::new(handle),
            timeout,
        })
    }

    /// Send shutdown and wait for the bridge to exit.
    pub async fn shutdown(self) -> Result<()> {
        let mut handle = self.handle.into_inner();
        if let Err(e) = handle.write_message(&RequestMessage::Shutdown).await {
            warn!(error = %e, "failed to send bridge shutdown");
        }
        drop(handle.stdin);

        match tokio::time::timeout(self.timeout, handle.child.wait()).await {
            Ok(Ok(status)) => info!(?status, "bridge exited"),
            Ok(Err(e)) => warn!("bridge wait error: {e}"),
            Err(_) => {
                warn!("bridge did not exit in time, killing it");
                let _ = handle.child.kill().await;
            }
        }
        Ok(())
    }

    /// Issue one call and wait for its matching reply.
    async fn call(&self, call: BridgeCall<'_>) -> Result<Option<String>> {
        let op = call.op();
        let mut handle = self.handle.lock().await;

        handle.request_counter += 1;
        let id = format!("req-{}", handle.request_counter);
        debug!(%id, op, "bridge call");

        handle
            .write_message(&RequestMessage::Call {
                id: id.clone(),
                call,
            })
            .await?;

        tokio::time::timeout(self.timeout, await_reply(&mut handle, &id, op))
            .await
            .map_err(|_| GuidanceError::Gateway(format!("{op}: timed out after {:?}", self.timeout)))?
    }

    async fn call_with_body(&self, call: BridgeCall<'_>) -> Result<String> {
        let op = call.op();
        self.call(call)
            .await?
            .ok_or_else(|| GuidanceError::Gateway(format!("{op}: reply carried no body")))
    }
}

/// First characters of a reply line, for error messages.
fn preview(line: &str) -> String {
    line.chars().take(PREVIEW_CHARS).collect()
}

/// Read replies until the one answering `id` arrives.
async fn await_reply(handle: &mut BridgeHandle, id: &str, op: &str) -> Result<Option<String>> {
    loop {
        match handle.read_message().await? {
            ResponseMessage::Result { id: resp_id, body } if resp_id == id => {
                return Ok(body.map(body_text));
            }
            ResponseMessage::Error { id: resp_id, error } if resp_id == id => {
                return Err(GuidanceError::Gateway(format!("{op}: {error}")));
            }
            ResponseMessage::Ready => {
                return Err(GuidanceError::Bridge(
                    "unexpected ready message during call".into(),
                ));
            }
            stale => debug!(?stale, "discarding reply to an abandoned call"),
        }
    }
}

#[async_trait]
impl SearchGateway for BridgeGateway {
    async fn artefact_search(&self, payload: &SearchPayload) -> Result<String> {
        self.call_with_body(BridgeCall::ArtefactSearch { payload })
            .await
    }
}

#[async_trait]
impl LiveService for BridgeGateway {
    async fn live_document(&self, username: &str, document_id: &str) -> Result<()> {
        self.call(BridgeCall::LiveDocument {
            username,
            document_id,
        })
        .await
        .map(|_| ())
    }

    async fn live_search(&self, username: &str, query: &str) -> Result<()> {
        self.call(BridgeCall::LiveSearch { username, query })
            .await
            .map(|_| ())
    }

    async fn live_csh(&self, username: &str, query: &str) -> Result<()> {
        self.call(BridgeCall::LiveCsh { username, query })
            .await
            .map(|_| ())
    }

    async fn document_search(&self, term: &str, page_limit: u32) -> Result<String> {
        self.call_with_body(BridgeCall::DocumentSearch {
            term,
            page_limit: page_limit.to_string(),
        })
        .await
    }
}
