//! Command normalization and execution.
//!
//! Input text is split on single spaces: the first token is the program, the
//! rest are positional arguments. No shell is involved and there is no
//! quoting support; a quoted argument containing a space splits incorrectly.
//! Stdout is captured, stderr is discarded, and the child inherits the
//! parent's environment. No timeout, no output size cap.

use regex::Regex;
use std::process::Stdio;
use std::sync::LazyLock;
use tokio::process::Command;

/// Runs of 2+ whitespace characters, including Unicode space separators.
static INSIDE_SPACES: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[\s\p{Zs}]{2,}").expect("whitespace regex"));

/// Trim leading/trailing whitespace and collapse every interior run of 2+
/// whitespace characters to a single ASCII space. Single whitespace
/// characters are left untouched.
pub fn normalize(input: &str) -> String {
    let trimmed = input.trim();
    INSIDE_SPACES.replace_all(trimmed, " ").into_owned()
}

/// Normalize and run `text` as a child process; returns the normalized
/// command and its captured stdout. A start failure returns the error's text
/// in place of output; a non-zero exit returns whatever stdout was produced.
pub async fn execute(text: &str) -> (String, String) {
    let command = normalize(text);
    let mut parts = command.split(' ');
    let program = parts.next().unwrap_or_default();
    let args: Vec<&str> = parts.collect();

    let child = Command::new(program)
        .args(&args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .spawn();
    let child = match child {
        Ok(c) => c,
        Err(e) => return (command, e.to_string()),
    };

    let output = match child.wait_with_output().await {
        Ok(out) => String::from_utf8_lossy(&out.stdout).into_owned(),
        Err(e) => e.to_string(),
    };
    (command, output)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_collapses_runs_and_trims() {
        assert_eq!(normalize("  ls   -la  "), "ls -la");
        assert_eq!(normalize("echo hello"), "echo hello");
        assert_eq!(normalize("a\t\tb"), "a b");
        assert_eq!(normalize("a \n b"), "a b");
        assert_eq!(normalize(""), "");
        assert_eq!(normalize("   "), "");
    }

    #[test]
    fn normalize_leaves_single_whitespace_untouched() {
        // A single tab is not a run of 2+, so it stays as-is.
        assert_eq!(normalize("a\tb"), "a\tb");
    }

    #[test]
    fn normalize_collapses_unicode_space_runs() {
        assert_eq!(normalize("ls\u{00A0}\u{00A0}-la"), "ls -la");
        assert_eq!(normalize("ls \u{2002} -la"), "ls -la");
    }

    #[tokio::test]
    async fn execute_captures_stdout() {
        let (command, output) = execute("echo hello").await;
        assert_eq!(command, "echo hello");
        assert_eq!(output, "hello\n");
    }

    #[tokio::test]
    async fn execute_normalizes_before_splitting() {
        let (command, output) = execute("  echo   hello  world ").await;
        assert_eq!(command, "echo hello world");
        assert_eq!(output, "hello world\n");
    }

    #[tokio::test]
    async fn execute_start_failure_returns_error_text() {
        let (command, output) = execute("nonexistent-binary-xyz").await;
        assert_eq!(command, "nonexistent-binary-xyz");
        assert!(!output.is_empty());
    }

    #[tokio::test]
    async fn execute_nonzero_exit_returns_stdout() {
        // cat exits non-zero on a missing file; nothing was written to stdout.
        let (_, output) = execute("cat /nonexistent-file-for-cmdrelay-test").await;
        assert_eq!(output, "");
    }

    #[tokio::test]
    async fn execute_discards_stderr() {
        // ls writes its error to stderr only.
        let (_, output) = execute("ls /nonexistent-dir-for-cmdrelay-test").await;
        assert_eq!(output, "");
    }
}
