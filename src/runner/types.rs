//! 命令输出相关数据类型

use std::fmt;
use std::path::{Path, PathBuf};

/// 输出来源
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stream {
    Stdout,
    Stderr,
}

/// 按实际观察到的顺序记录的 stdout / stderr 输出
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapturedOutput {
    pub entries: Vec<(Stream, String)>,
    pub success: bool,
}

impl Default for CapturedOutput {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
            success: true,
        }
    }
}

impl CapturedOutput {
    pub fn new() -> Self {
        Self::default()
    }

    /// 命令失败时由 runner 合成的单条 stderr 输出
    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            entries: vec![(Stream::Stderr, message.into())],
            success: false,
        }
    }

    pub fn stdout(&mut self, line: impl Into<String>) {
        self.entries.push((Stream::Stdout, line.into()));
    }

    pub fn stderr(&mut self, line: impl Into<String>) {
        self.entries.push((Stream::Stderr, line.into()));
    }

    /// 追加另一段输出，保持其内部顺序；任一段失败则整体失败
    pub fn extend(&mut self, other: CapturedOutput) {
        self.success &= other.success;
        self.entries.extend(other.entries);
    }

    /// 追加另一段输出，每一行加上前缀
    pub fn extend_prefixed(&mut self, prefix: &str, other: CapturedOutput) {
        self.success &= other.success;
        self.entries.extend(
            other
                .entries
                .into_iter()
                .map(|(stream, line)| (stream, format!("{}: {}", prefix, line))),
        );
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn has_stderr(&self) -> bool {
        self.entries.iter().any(|(s, _)| *s == Stream::Stderr)
    }

    pub fn stderr_text(&self) -> String {
        self.entries
            .iter()
            .filter(|(s, _)| *s == Stream::Stderr)
            .map(|(_, l)| l.as_str())
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// 渲染为终端文本，stderr 行加 `⚠ ` 前缀
    pub fn render(&self) -> String {
        let mut out = String::new();
        for (stream, line) in &self.entries {
            if *stream == Stream::Stderr {
                out.push_str("⚠ ");
            }
            out.push_str(line);
            out.push('\n');
        }
        out
    }
}

/// 一次外部命令调用
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    pub program: String,
    pub args: Vec<String>,
    pub cwd: Option<PathBuf>,
    /// 非零退出码是否视为失败
    pub check: bool,
}

impl CommandSpec {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            cwd: None,
            check: true,
        }
    }

    pub fn arg(mut self, arg: impl AsRef<std::ffi::OsStr>) -> Self {
        self.args.push(arg.as_ref().to_string_lossy().into_owned());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<std::ffi::OsStr>,
    {
        for a in args {
            self = self.arg(a);
        }
        self
    }

    pub fn cwd(mut self, dir: impl AsRef<Path>) -> Self {
        self.cwd = Some(dir.as_ref().to_path_buf());
        self
    }

    pub fn unchecked(mut self) -> Self {
        self.check = false;
        self
    }
}

impl fmt::Display for CommandSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program)?;
        for a in &self.args {
            write!(f, " {}", a)?;
        }
        Ok(())
    }
}
