//! Helper-process snapshot source
//!
//! Speaks line-delimited JSON over the child's stdin/stdout:
//!
//! ```text
//! -> {"op":"sample","id":1}
//! <- {"records":[{"speaker":"Ana","time":"00:01","content":"..."}]}
//! -> {"op":"advance","id":2,"step":100,"repetitions":3}
//! <- {"ok":true}
//! <- {"error":"structure not found"}
//! ```
//!
//! Every request is owed exactly one reply. A call cut short by a timeout
//! leaves its reply in the pipe; the source counts those and drains them
//! before the next request. Replies may also echo `id`, and one carrying an
//! older id is skipped.

use std::process::Stdio;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines};
use tokio::process::{Child, ChildStdin, ChildStdout, Command};
use tracing::{debug, trace};

use crate::domain::errors::SourceError;
use crate::domain::models::RawRecord;
use crate::domain::ports::SnapshotSource;

#[derive(Debug, Serialize)]
#[serde(tag = "op", rename_all = "snake_case")]
enum Request {
    Sample { id: u64 },
    Advance { id: u64, step: u32, repetitions: u32 },
}

#[derive(Debug, Deserialize)]
struct Reply {
    #[serde(default)]
    id: Option<u64>,
    #[serde(default)]
    records: Option<Vec<RawRecord>>,
    #[serde(default)]
    ok: Option<bool>,
    #[serde(default)]
    error: Option<String>,
}

/// Snapshot source backed by a child process.
///
/// The child is killed when the source is dropped.
pub struct ProcessSource {
    name: String,
    _child: Child,
    stdin: ChildStdin,
    stdout: Lines<BufReader<ChildStdout>>,
    next_id: u64,
    /// Replies owed to requests whose caller stopped waiting.
    pending: usize,
}

impl ProcessSource {
    /// Spawn `program` with `args`; the helper's stderr is inherited.
    pub fn spawn(program: &str, args: &[String]) -> Result<Self, SourceError> {
        let mut child = Command::new(program)
            .args(args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| SourceError::Unavailable(format!("failed to start {program}: {e}")))?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| SourceError::Unavailable("failed to get helper stdin".to_string()))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| SourceError::Unavailable("failed to get helper stdout".to_string()))?;

        debug!(program, pid = child.id(), "spawned helper process");

        Ok(Self {
            name: format!("process:{program}"),
            _child: child,
            stdin,
            stdout: BufReader::new(stdout).lines(),
            next_id: 1,
            pending: 0,
        })
    }

    async fn request(&mut self, request: &Request, id: u64) -> Result<Reply, SourceError> {
        let mut line = serde_json::to_string(request)
            .map_err(|e| SourceError::Protocol(format!("failed to encode request: {e}")))?;
        line.push('\n');
        trace!(request = %line.trim_end(), "sending to helper");

        self.drain_abandoned().await?;

        self.stdin
            .write_all(line.as_bytes())
            .await
            .map_err(write_error)?;
        self.pending += 1;
        self.stdin.flush().await.map_err(write_error)?;

        loop {
            let reply_line = self.read_line().await?;
            let reply: Result<Reply, _> = serde_json::from_str(reply_line.trim());

            if let Ok(Reply {
                id: Some(reply_id), ..
            }) = &reply
            {
                if *reply_id < id {
                    debug!(reply_id = *reply_id, id, "discarding late reply");
                    continue;
                }
            }

            self.pending = self.pending.saturating_sub(1);
            return reply.map_err(|e| {
                SourceError::Protocol(format!("unparseable reply {reply_line:?}: {e}"))
            });
        }
    }

    /// Consume replies still owed to requests that timed out.
    async fn drain_abandoned(&mut self) -> Result<(), SourceError> {
        while self.pending > 0 {
            let stale = self.read_line().await?;
            self.pending -= 1;
            debug!(
                reply = %stale.trim(),
                remaining = self.pending,
                "discarding reply to abandoned request"
            );
        }
        Ok(())
    }

    async fn read_line(&mut self) -> Result<String, SourceError> {
        self.stdout
            .next_line()
            .await?
            .ok_or_else(|| SourceError::Unavailable("helper closed its output".to_string()))
    }

    fn next_id(&mut self) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }
}

fn write_error(err: std::io::Error) -> SourceError {
    if err.kind() == std::io::ErrorKind::BrokenPipe {
        SourceError::Unavailable("helper process exited".to_string())
    } else {
        SourceError::Io(err.to_string())
    }
}

#[async_trait]
impl SnapshotSource for ProcessSource {
    fn name(&self) -> &str {
        &self.name
    }

    async fn sample(&mut self) -> Result<Vec<RawRecord>, SourceError> {
        let id = self.next_id();
        let reply = self.request(&Request::Sample { id }, id).await?;
        match reply {
            Reply {
                error: Some(message),
                ..
            } => Err(SourceError::Rejected(message)),
            Reply {
                records: Some(records),
                ..
            } => Ok(records),
            _ => Err(SourceError::Protocol(
                "sample reply carried no records".to_string(),
            )),
        }
    }

    async fn advance(&mut self, step: u32, repetitions: u32) -> Result<(), SourceError> {
        let id = self.next_id();
        let reply = self
            .request(
                &Request::Advance {
                    id,
                    step,
                    repetitions,
                },
                id,
            )
            .await?;
        match reply {
            Reply {
                error: Some(message),
                ..
            } => Err(SourceError::Rejected(message)),
            Reply { ok: Some(true), .. } => Ok(()),
            _ => Err(SourceError::Protocol(
                "advance reply was not acknowledged".to_string(),
            )),
        }
    }
}
