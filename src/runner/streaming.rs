//! 子进程执行与输出捕获

use super::parser::clean_terminal_output;
use super::types::{CapturedOutput, CommandSpec, Stream};
use std::io::{BufRead, BufReader, Read};
use std::process::{Command, Stdio};
use tokio::sync::mpsc;

/// 从流中逐行读取并发送到 channel
///
/// stdout / stderr 各自一个线程，共用同一个 channel，
/// channel 中的顺序即为两路输出被观察到的交错顺序。
fn read_stream_lines(
    stream: Option<impl Read>,
    tx: &mpsc::UnboundedSender<(Stream, String)>,
    tag: Stream,
) {
    let Some(reader) = stream else {
        return;
    };
    let mut reader = BufReader::new(reader);
    let mut buf = Vec::new();

    loop {
        buf.clear();
        match reader.read_until(b'\n', &mut buf) {
            Ok(0) | Err(_) => break,
            Ok(_) => {
                let cleaned = clean_terminal_output(&String::from_utf8_lossy(&buf));
                if !cleaned.trim().is_empty() {
                    let _ = tx.send((tag, cleaned));
                }
            }
        }
    }
}

/// 执行命令并捕获交错输出
///
/// 启动失败，或在 `check` 模式下退出码非零时，返回单条 stderr 描述，
/// 此时不保留子进程的部分输出。
pub fn run_captured(spec: &CommandSpec) -> CapturedOutput {
    let mut cmd = Command::new(&spec.program);
    cmd.args(&spec.args);
    if let Some(dir) = &spec.cwd {
        cmd.current_dir(dir);
    }
    cmd.stdin(Stdio::null());
    cmd.stdout(Stdio::piped());
    cmd.stderr(Stdio::piped());

    #[cfg(target_os = "linux")]
    {
        use std::os::unix::process::CommandExt;
        // 父进程退出时，子进程收到 SIGTERM
        unsafe {
            cmd.pre_exec(|| {
                libc::prctl(libc::PR_SET_PDEATHSIG, libc::SIGTERM);
                Ok(())
            });
        }
    }

    log::debug!("执行: {}", spec);

    let mut child = match cmd.spawn() {
        Ok(child) => child,
        Err(e) => return CapturedOutput::failure(format!("无法启动 `{}`: {}", spec, e)),
    };

    let stdout = child.stdout.take();
    let stderr = child.stderr.take();

    let (tx, mut rx) = mpsc::unbounded_channel();
    let tx_clone = tx.clone();
    let stdout_handle =
        std::thread::spawn(move || read_stream_lines(stdout, &tx_clone, Stream::Stdout));
    let stderr_handle = std::thread::spawn(move || read_stream_lines(stderr, &tx, Stream::Stderr));

    let _ = stdout_handle.join();
    let _ = stderr_handle.join();

    let mut output = CapturedOutput::new();
    while let Ok(entry) = rx.try_recv() {
        output.entries.push(entry);
    }

    let status = match child.wait() {
        Ok(status) => status,
        Err(e) => return CapturedOutput::failure(format!("等待 `{}` 退出失败: {}", spec, e)),
    };

    if spec.check && !status.success() {
        let detail = output.stderr_text();
        let message = if detail.is_empty() {
            format!("`{}` 执行失败 ({})", spec, status)
        } else {
            format!("`{}` 执行失败 ({}): {}", spec, status, detail)
        };
        log::debug!("{}", message);
        return CapturedOutput::failure(message);
    }

    output
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sh(script: &str) -> CommandSpec {
        CommandSpec::new("sh").args(["-c", script])
    }

    #[test]
    fn preserves_interleaving_across_streams() {
        let out = run_captured(&sh(
            "echo one; sleep 0.1; echo two >&2; sleep 0.1; echo three; sleep 0.1; echo four >&2",
        ));
        assert!(out.success);
        assert_eq!(
            out.entries,
            vec![
                (Stream::Stdout, "one".to_string()),
                (Stream::Stderr, "two".to_string()),
                (Stream::Stdout, "three".to_string()),
                (Stream::Stderr, "four".to_string()),
            ]
        );
    }

    #[test]
    fn checked_failure_collapses_to_single_entry() {
        // 输出文本与命令行不同，才能区分消息里的内容来自哪里
        let out = run_captured(&sh("printf 'par%s\\n' tial; printf 'bro%s\\n' ken >&2; exit 3"));
        assert!(!out.success);
        assert_eq!(out.entries.len(), 1);
        let (stream, message) = &out.entries[0];
        assert_eq!(*stream, Stream::Stderr);
        assert!(message.contains("broken"));
        assert!(!message.contains("partial"));
    }

    #[test]
    fn unchecked_failure_keeps_output() {
        let out = run_captured(&sh("echo partial; echo broken >&2; exit 3").unchecked());
        assert!(out.success);
        assert_eq!(out.entries.len(), 2);
    }

    #[test]
    fn missing_program_is_reported_not_raised() {
        let out = run_captured(&CommandSpec::new("definitely-not-a-real-tool-xyz"));
        assert!(!out.success);
        assert!(out.has_stderr());
    }

    #[test]
    fn runs_in_requested_directory() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("marker"), "").unwrap();
        let out = run_captured(&sh("ls").cwd(dir.path()));
        assert_eq!(out.entries, vec![(Stream::Stdout, "marker".to_string())]);
    }
}
