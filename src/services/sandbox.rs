use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

use crate::core::config::JudgeSettings;

/// Modules whose import aborts the run. Covers process/filesystem
/// escape, networking, and re-entry into the interpreter machinery.
const BLOCKED_MODULES: &[&str] = &[
    "os",
    "subprocess",
    "shutil",
    "pathlib",
    "glob",
    "tempfile",
    "socket",
    "http",
    "urllib",
    "ftplib",
    "smtplib",
    "ssl",
    "importlib",
    "runpy",
    "code",
    "codeop",
    "ctypes",
    "multiprocessing",
    "threading",
    "concurrent",
    "_thread",
    "signal",
    "resource",
    "pickle",
    "shelve",
    "sqlite3",
    "pty",
    "tty",
    "fcntl",
    "mmap",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ExecutionStatus {
    Success,
    SyntaxError,
    RuntimeError,
    Timeout,
}

/// Outcome of running one program against one input.
#[derive(Debug, Clone)]
pub(crate) struct Execution {
    pub(crate) status: ExecutionStatus,
    pub(crate) stdout: String,
    pub(crate) message: Option<String>,
}

impl Execution {
    pub(crate) fn succeeded(&self) -> bool {
        self.status == ExecutionStatus::Success
    }
}

/// Seam between judging and actual code execution, so verdict logic is
/// testable without an interpreter on the host.
#[async_trait]
pub(crate) trait Executor: Send + Sync {
    async fn execute(&self, code: &str, input: &str) -> anyhow::Result<Execution>;
}

/// Runs untrusted Python in a separate interpreter process.
///
/// Isolation layers: `-I -E -S` interpreter flags, a cleared
/// environment, a guard preamble that blocks dangerous imports and
/// builtins, per-child stdout/stderr pipes, and a wall-clock deadline
/// after which the child is killed.
pub(crate) struct SandboxExecutor {
    interpreter: String,
    timeout: Duration,
    max_output_bytes: usize,
}

impl SandboxExecutor {
    pub(crate) fn from_settings(settings: &JudgeSettings) -> Self {
        Self {
            interpreter: settings.interpreter.clone(),
            timeout: Duration::from_millis(settings.timeout_ms),
            max_output_bytes: settings.max_output_bytes,
        }
    }

    /// Whether the configured interpreter responds at all. Used by the
    /// worker at startup and by tests to self-skip.
    pub(crate) async fn is_available(&self) -> bool {
        Command::new(&self.interpreter)
            .arg("--version")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .await
            .map(|status| status.success())
            .unwrap_or(false)
    }

    fn guard_preamble() -> String {
        let blocked =
            BLOCKED_MODULES.iter().map(|m| format!("'{m}'")).collect::<Vec<_>>().join(", ");

        format!(
            r#"import sys as _g_sys
import builtins as _g_builtins
_g_blocked = frozenset([{blocked}])
for _g_mod in list(_g_sys.modules):
    if _g_mod.split('.')[0] in _g_blocked:
        del _g_sys.modules[_g_mod]
_g_orig_import = _g_builtins.__import__
def _g_import(name, globals=None, locals=None, fromlist=(), level=0,
              _blocked=_g_blocked, _orig=_g_orig_import):
    if name.split('.')[0] in _blocked:
        raise ImportError(f"module '{{name}}' is not allowed")
    return _orig(name, globals, locals, fromlist, level)
_g_builtins.__import__ = _g_import
_g_builtins.open = None
_g_builtins.eval = None
_g_builtins.exec = None
_g_builtins.compile = None
_g_builtins.breakpoint = None
_g_builtins.help = None
del _g_sys, _g_builtins, _g_mod, _g_orig_import, _g_blocked
"#
        )
    }

    fn wrap_code(code: &str) -> String {
        let mut wrapped = Self::guard_preamble();
        wrapped.push_str(code);
        wrapped.push('\n');
        wrapped
    }

    fn scratch_path() -> PathBuf {
        static COUNTER: AtomicU64 = AtomicU64::new(0);
        let unique = COUNTER.fetch_add(1, Ordering::Relaxed);
        std::env::temp_dir().join(format!("alemni_judge_{}_{unique}.py", std::process::id()))
    }
}

#[async_trait]
impl Executor for SandboxExecutor {
    async fn execute(&self, code: &str, input: &str) -> anyhow::Result<Execution> {
        let scratch = Self::scratch_path();
        tokio::fs::write(&scratch, Self::wrap_code(code)).await?;

        let result = self.run_child(&scratch, input).await;

        let _ = tokio::fs::remove_file(&scratch).await;
        result
    }
}

impl SandboxExecutor {
    async fn run_child(&self, scratch: &Path, input: &str) -> anyhow::Result<Execution> {
        let mut child = Command::new(&self.interpreter)
            .arg("-I")
            .arg("-E")
            .arg("-S")
            .arg("-u")
            .arg(scratch)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .env_clear()
            .kill_on_drop(true)
            .spawn()?;

        if let Some(mut stdin) = child.stdin.take() {
            // A child that never reads stdin may close the pipe early;
            // a write error there is not a judging failure.
            let _ = stdin.write_all(input.as_bytes()).await;
            let _ = stdin.shutdown().await;
        }

        let output = match tokio::time::timeout(self.timeout, child.wait_with_output()).await {
            Ok(output) => output?,
            Err(_) => {
                return Ok(Execution {
                    status: ExecutionStatus::Timeout,
                    stdout: String::new(),
                    message: Some(format!(
                        "execution exceeded {} ms",
                        self.timeout.as_millis()
                    )),
                });
            }
        };

        let stdout = truncate_utf8(&output.stdout, self.max_output_bytes);
        let stderr = truncate_utf8(&output.stderr, self.max_output_bytes);

        if output.status.success() {
            Ok(Execution { status: ExecutionStatus::Success, stdout, message: None })
        } else {
            let status = classify_stderr(&stderr);
            Ok(Execution { status, stdout, message: Some(last_error_line(&stderr)) })
        }
    }
}

/// Distinguishes a program that never parsed from one that crashed.
pub(crate) fn classify_stderr(stderr: &str) -> ExecutionStatus {
    if stderr.contains("SyntaxError") || stderr.contains("IndentationError") {
        ExecutionStatus::SyntaxError
    } else {
        ExecutionStatus::RuntimeError
    }
}

/// The trailing `ExceptionType: message` line is the student-facing part
/// of a traceback; the frames above it leak sandbox paths.
pub(crate) fn last_error_line(stderr: &str) -> String {
    stderr
        .lines()
        .rev()
        .find(|line| !line.trim().is_empty())
        .unwrap_or("execution failed")
        .trim()
        .to_string()
}

fn truncate_utf8(bytes: &[u8], max_bytes: usize) -> String {
    let text = String::from_utf8_lossy(bytes);
    if text.len() <= max_bytes {
        return text.into_owned();
    }

    let mut cut = max_bytes;
    while cut > 0 && !text.is_char_boundary(cut) {
        cut -= 1;
    }
    format!("{}... [truncated]", &text[..cut])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_executor() -> SandboxExecutor {
        SandboxExecutor {
            interpreter: "python3".to_string(),
            timeout: Duration::from_millis(5000),
            max_output_bytes: 64 * 1024,
        }
    }

    #[test]
    fn classify_distinguishes_syntax_errors() {
        assert_eq!(
            classify_stderr("  File \"x.py\", line 1\nSyntaxError: invalid syntax"),
            ExecutionStatus::SyntaxError
        );
        assert_eq!(
            classify_stderr("IndentationError: unexpected indent"),
            ExecutionStatus::SyntaxError
        );
        assert_eq!(
            classify_stderr("Traceback (most recent call last):\nZeroDivisionError: division by zero"),
            ExecutionStatus::RuntimeError
        );
    }

    #[test]
    fn last_error_line_skips_trailing_blanks() {
        let stderr = "Traceback (most recent call last):\n  File ...\nValueError: bad input\n\n";
        assert_eq!(last_error_line(stderr), "ValueError: bad input");
        assert_eq!(last_error_line(""), "execution failed");
    }

    #[test]
    fn truncate_respects_char_boundaries() {
        let text = "héllo".as_bytes();
        let out = truncate_utf8(text, 2);
        assert!(out.starts_with('h'));
        assert!(out.ends_with("[truncated]"));
        assert_eq!(truncate_utf8(b"short", 64), "short");
    }

    #[tokio::test]
    async fn executes_simple_program() {
        let executor = test_executor();
        if !executor.is_available().await {
            return;
        }

        let result = executor.execute("print(1 + 1)", "").await.expect("execute");
        assert!(result.succeeded());
        assert_eq!(result.stdout.trim(), "2");
    }

    #[tokio::test]
    async fn pipes_stdin_to_input() {
        let executor = test_executor();
        if !executor.is_available().await {
            return;
        }

        let result =
            executor.execute("name = input()\nprint(f'hi {name}')", "world").await.expect("execute");
        assert!(result.succeeded());
        assert_eq!(result.stdout.trim(), "hi world");
    }

    #[tokio::test]
    async fn blocks_dangerous_imports() {
        let executor = test_executor();
        if !executor.is_available().await {
            return;
        }

        let result = executor.execute("import os\nprint(os.getcwd())", "").await.expect("execute");
        assert_eq!(result.status, ExecutionStatus::RuntimeError);
        assert!(result.message.unwrap_or_default().contains("not allowed"));
    }

    #[tokio::test]
    async fn syntax_error_is_classified() {
        let executor = test_executor();
        if !executor.is_available().await {
            return;
        }

        let result = executor.execute("def broken(:\n  pass", "").await.expect("execute");
        assert_eq!(result.status, ExecutionStatus::SyntaxError);
    }

    #[tokio::test]
    async fn infinite_loop_times_out() {
        let mut executor = test_executor();
        executor.timeout = Duration::from_millis(500);
        if !executor.is_available().await {
            return;
        }

        let result = executor.execute("while True:\n    pass", "").await.expect("execute");
        assert_eq!(result.status, ExecutionStatus::Timeout);
    }
}
