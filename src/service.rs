//! Line-oriented evaluation service.
//!
//! Reads one JSON payload per line and writes one JSON result per line, in
//! input order. Evaluations run on tokio's blocking pool because model
//! inference is CPU-bound.

use serde_json::Value;
use std::collections::VecDeque;
use std::sync::Arc;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tokio::task::JoinHandle;

use crate::error::FallbackReason;
use crate::evaluator::{fallback_result, Evaluator};
use crate::settings::Service;
use crate::types::EvaluationResult;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ServiceStats {
    pub served: usize,
    pub fallbacks: usize,
}

type Outcome = Result<EvaluationResult, FallbackReason>;

enum Pending {
    Ready(Outcome),
    Running(JoinHandle<Outcome>),
}

/// One input line. Oversized lines are drained without being kept.
enum RawLine {
    Bytes(Vec<u8>),
    Oversized(usize),
}

pub async fn serve<R, W>(
    evaluator: Arc<Evaluator>,
    mut input: R,
    mut output: W,
    limits: &Service,
) -> std::io::Result<ServiceStats>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let max_in_flight = limits.max_in_flight.max(1);
    let mut stats = ServiceStats::default();
    let mut pending: VecDeque<Pending> = VecDeque::new();

    loop {
        let line = match read_line(&mut input, limits.max_payload_bytes).await {
            Ok(Some(line)) => line,
            Ok(None) => break,
            Err(e) => {
                tracing::error!(error = %e, "input stream failed");
                drain(&mut pending, &mut output, &mut stats).await?;
                return Err(e);
            }
        };
        let Some(next) = dispatch(&evaluator, line, limits.max_payload_bytes) else {
            continue;
        };
        pending.push_back(next);

        if pending.len() >= max_in_flight {
            write_next(&mut pending, &mut output, &mut stats).await?;
        }
    }

    drain(&mut pending, &mut output, &mut stats).await?;
    Ok(stats)
}

/// Reads up to the next `\n`, keeping at most `limit` bytes in memory.
async fn read_line<R>(input: &mut R, limit: usize) -> std::io::Result<Option<RawLine>>
where
    R: AsyncBufRead + Unpin,
{
    let mut line = Vec::new();
    let mut seen = 0usize;
    let mut oversized = false;

    loop {
        let available = input.fill_buf().await?;
        if available.is_empty() {
            if seen == 0 {
                return Ok(None);
            }
            break;
        }

        let (body, used, done) = match available.iter().position(|&b| b == b'\n') {
            Some(i) => (i, i + 1, true),
            None => (available.len(), available.len(), false),
        };
        seen += body;
        if !oversized {
            if seen > limit {
                oversized = true;
                line = Vec::new();
            } else {
                line.extend_from_slice(&available[..body]);
            }
        }
        input.consume(used);

        if done {
            break;
        }
    }

    Ok(Some(if oversized {
        RawLine::Oversized(seen)
    } else {
        RawLine::Bytes(line)
    }))
}

fn dispatch(evaluator: &Arc<Evaluator>, line: RawLine, max_payload_bytes: usize) -> Option<Pending> {
    let bytes = match line {
        RawLine::Bytes(bytes) => bytes,
        RawLine::Oversized(len) => {
            tracing::warn!(bytes = len, limit = max_payload_bytes, "payload too large");
            return Some(Pending::Ready(Err(FallbackReason::InvalidPayload)));
        }
    };

    let text = match String::from_utf8(bytes) {
        Ok(text) => text,
        Err(e) => {
            tracing::warn!(error = %e, "payload is not valid UTF-8");
            return Some(Pending::Ready(Err(FallbackReason::InvalidPayload)));
        }
    };
    if text.trim().is_empty() {
        return None;
    }

    let evaluator = Arc::clone(evaluator);
    Some(Pending::Running(tokio::task::spawn_blocking(move || {
        match serde_json::from_str::<Value>(&text) {
            Ok(payload) => evaluator.try_evaluate_payload(&payload),
            Err(e) => {
                tracing::warn!(error = %e, "payload is not valid JSON");
                Err(FallbackReason::InvalidPayload)
            }
        }
    })))
}

async fn drain<W>(
    pending: &mut VecDeque<Pending>,
    output: &mut W,
    stats: &mut ServiceStats,
) -> std::io::Result<()>
where
    W: AsyncWrite + Unpin,
{
    while !pending.is_empty() {
        write_next(pending, output, stats).await?;
    }
    output.flush().await
}

async fn write_next<W>(
    pending: &mut VecDeque<Pending>,
    output: &mut W,
    stats: &mut ServiceStats,
) -> std::io::Result<()>
where
    W: AsyncWrite + Unpin,
{
    let Some(next) = pending.pop_front() else {
        return Ok(());
    };

    let outcome = match next {
        Pending::Ready(outcome) => outcome,
        Pending::Running(handle) => handle.await.unwrap_or_else(|e| {
            tracing::error!(error = %e, "evaluation task failed");
            Err(FallbackReason::SystemError {
                question: String::new(),
                response: String::new(),
                cause: e.to_string(),
            })
        }),
    };

    stats.served += 1;
    let result = outcome.unwrap_or_else(|reason| {
        stats.fallbacks += 1;
        fallback_result(&reason)
    });

    let mut encoded = serde_json::to_vec(&result)?;
    encoded.push(b'\n');
    output.write_all(&encoded).await
}
