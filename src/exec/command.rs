// src/exec/command.rs

//! External optimizer invocation.

use std::io::ErrorKind;
use std::process::Stdio;

use anyhow::{bail, Context, Result};
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::debug;

/// Pipe `input` through `program args...` and return its stdout.
///
/// Returns `Ok(None)` when the program is not installed, so callers can fall
/// back to copying the input. A non-zero exit status is an error carrying the
/// program's stderr.
pub async fn run_filter(program: &str, args: &[&str], input: &[u8]) -> Result<Option<Vec<u8>>> {
    let mut cmd = Command::new(program);
    cmd.args(args)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    let mut child = match cmd.spawn() {
        Ok(child) => child,
        Err(err) if err.kind() == ErrorKind::NotFound => {
            debug!(program, "optimizer not found on PATH");
            return Ok(None);
        }
        Err(err) => {
            return Err(err).with_context(|| format!("spawning optimizer '{program}'"));
        }
    };

    let mut stdin = child
        .stdin
        .take()
        .with_context(|| format!("opening stdin of '{program}'"))?;
    let data = input.to_vec();
    // Feed stdin concurrently so a full stdout pipe can't deadlock us.
    let writer = tokio::spawn(async move {
        let res = stdin.write_all(&data).await;
        drop(stdin);
        res
    });

    let output = child
        .wait_with_output()
        .await
        .with_context(|| format!("waiting for optimizer '{program}'"))?;

    let written = writer.await.context("joining optimizer stdin writer")?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        bail!(
            "'{program}' exited with {}: {}",
            output.status.code().unwrap_or(-1),
            stderr.trim()
        );
    }

    written.with_context(|| format!("writing input to '{program}'"))?;

    Ok(Some(output.stdout))
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    #[tokio::test]
    async fn missing_program_is_none() {
        let out = run_filter("assetflow-definitely-not-installed", &[], b"x")
            .await
            .unwrap();
        assert!(out.is_none());
    }

    #[tokio::test]
    async fn pipes_through_cat() {
        let out = run_filter("cat", &[], b"hello").await.unwrap();
        assert_eq!(out.as_deref(), Some(&b"hello"[..]));
    }

    #[tokio::test]
    async fn failing_program_is_an_error() {
        assert!(run_filter("false", &[], b"").await.is_err());
    }
}
