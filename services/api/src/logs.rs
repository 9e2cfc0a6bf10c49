//! Log Sink Access
//!
//! Read-side helpers over the append-only log file the service writes to:
//! a bounded tail for the panel's log view, and a live follow that feeds the
//! panel's event stream.

use std::io::SeekFrom;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncSeekExt, BufReader};
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tracing::{debug, warn};

const TAIL_BLOCK_SIZE: u64 = 4096;

/// Idle wait between polls when following a log file.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Returns the last `lines` lines of the file at `path`, joined by `\n`.
///
/// Reads backwards in fixed-size blocks so large logs are never loaded whole.
/// A missing file yields an empty string.
pub async fn tail(path: &Path, lines: usize) -> std::io::Result<String> {
    let mut file = match tokio::fs::File::open(path).await {
        Ok(file) => file,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(String::new()),
        Err(e) => return Err(e),
    };
    if lines == 0 {
        return Ok(String::new());
    }

    let mut remaining = file.seek(SeekFrom::End(0)).await?;
    let mut data: Vec<u8> = Vec::new();

    while remaining > 0 && newline_count(&data) <= lines {
        let read_size = remaining.min(TAIL_BLOCK_SIZE);
        remaining -= read_size;
        file.seek(SeekFrom::Start(remaining)).await?;

        let mut block = vec![0u8; read_size as usize];
        file.read_exact(&mut block).await?;
        block.extend_from_slice(&data);
        data = block;
    }

    let text = String::from_utf8_lossy(&data);
    let all: Vec<&str> = text.lines().collect();
    let start = all.len().saturating_sub(lines);
    Ok(all[start..].join("\n"))
}

fn newline_count(data: &[u8]) -> usize {
    data.iter().filter(|&&b| b == b'\n').count()
}

/// Streams lines appended to `path` after this call.
///
/// The file is created if absent. Reading happens on a background task that
/// sleeps `poll_interval` whenever it reaches end of file, and exits as soon as
/// the returned stream is dropped. If the file at `path` shrinks (truncation or
/// rotation), it is reopened and read from its beginning.
pub async fn follow(
    path: PathBuf,
    poll_interval: Duration,
) -> std::io::Result<ReceiverStream<String>> {
    let mut file = tokio::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .read(true)
        .open(&path)
        .await?;
    let mut position = file.seek(SeekFrom::End(0)).await?;

    let (tx, rx) = mpsc::channel(64);

    tokio::spawn(async move {
        let mut reader = BufReader::new(file);
        let mut line = String::new();

        loop {
            line.clear();
            match reader.read_line(&mut line).await {
                Ok(0) => {
                    tokio::select! {
                        _ = tx.closed() => break,
                        _ = tokio::time::sleep(poll_interval) => {}
                    }
                    match tokio::fs::metadata(&path).await {
                        Ok(meta) if meta.len() < position => {
                            debug!(path = %path.display(), "Log file truncated or rotated, reopening");
                            match tokio::fs::File::open(&path).await {
                                Ok(file) => {
                                    reader = BufReader::new(file);
                                    position = 0;
                                }
                                Err(e) => {
                                    warn!(error = %e, path = %path.display(), "Failed to reopen log file");
                                    break;
                                }
                            }
                        }
                        Ok(_) => {}
                        Err(e) => {
                            warn!(error = %e, path = %path.display(), "Log file unavailable");
                        }
                    }
                }
                Ok(read) => {
                    position += read as u64;
                    // A line without its newline is still being written.
                    if !line.ends_with('\n') {
                        if let Err(e) = reader.seek(SeekFrom::Start(position - read as u64)).await
                        {
                            warn!(error = %e, "Failed to rewind partial log line");
                            break;
                        }
                        position -= read as u64;
                        tokio::select! {
                            _ = tx.closed() => break,
                            _ = tokio::time::sleep(poll_interval) => {}
                        }
                        continue;
                    }
                    let text = line.trim_end_matches(['\r', '\n']).to_string();
                    if tx.send(text).await.is_err() {
                        break;
                    }
                }
                Err(e) => {
                    warn!(error = %e, path = %path.display(), "Failed reading log file");
                    break;
                }
            }
        }
        debug!(path = %path.display(), "Log follower stopped");
    });

    Ok(ReceiverStream::new(rx))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;
    use tokio::io::AsyncWriteExt;
    use tokio_stream::StreamExt;

    #[tokio::test]
    async fn test_tail_missing_file_is_empty() {
        let dir = tempdir().unwrap();
        let logs = tail(&dir.path().join("absent.log"), 10).await.unwrap();
        assert_eq!(logs, "");
    }

    #[tokio::test]
    async fn test_tail_returns_last_lines() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("app.log");
        std::fs::write(&path, "one\ntwo\nthree\nfour\n").unwrap();

        assert_eq!(tail(&path, 2).await.unwrap(), "three\nfour");
        assert_eq!(tail(&path, 10).await.unwrap(), "one\ntwo\nthree\nfour");
        assert_eq!(tail(&path, 0).await.unwrap(), "");
    }

    #[tokio::test]
    async fn test_tail_spans_multiple_blocks() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("app.log");
        let content: String = (0..2000).map(|i| format!("line number {i}\n")).collect();
        std::fs::write(&path, content).unwrap();

        let logs = tail(&path, 3).await.unwrap();
        assert_eq!(logs, "line number 1997\nline number 1998\nline number 1999");

        let many = tail(&path, 1500).await.unwrap();
        let lines: Vec<_> = many.lines().collect();
        assert_eq!(lines.len(), 1500);
        assert_eq!(lines[0], "line number 500");
    }

    #[tokio::test]
    async fn test_follow_streams_only_new_lines() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("app.log");
        std::fs::write(&path, "old line\n").unwrap();

        let mut stream = follow(path.clone(), Duration::from_millis(10))
            .await
            .unwrap();

        let mut file = tokio::fs::OpenOptions::new()
            .append(true)
            .open(&path)
            .await
            .unwrap();
        file.write_all(b"first new\nsecond new\n").await.unwrap();
        file.flush().await.unwrap();

        let first = tokio::time::timeout(Duration::from_secs(5), stream.next())
            .await
            .unwrap();
        assert_eq!(first.as_deref(), Some("first new"));
        let second = tokio::time::timeout(Duration::from_secs(5), stream.next())
            .await
            .unwrap();
        assert_eq!(second.as_deref(), Some("second new"));
    }

    #[tokio::test]
    async fn test_follow_creates_missing_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("new.log");

        let _stream = follow(path.clone(), Duration::from_millis(10))
            .await
            .unwrap();
        assert!(path.exists());
    }

    #[tokio::test]
    async fn test_follow_picks_up_rotated_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("app.log");
        std::fs::write(&path, "a fairly long line before rotation\n").unwrap();

        let mut stream = follow(path.clone(), Duration::from_millis(10))
            .await
            .unwrap();

        std::fs::rename(&path, dir.path().join("app.log.1")).unwrap();
        std::fs::write(&path, "fresh\n").unwrap();

        let line = tokio::time::timeout(Duration::from_secs(5), stream.next())
            .await
            .unwrap();
        assert_eq!(line.as_deref(), Some("fresh"));
    }
}
