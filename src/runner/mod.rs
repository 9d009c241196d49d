//! 外部命令执行 — 对 gettext 工具链等子进程的封装

pub mod parser;
pub mod streaming;
pub mod types;

pub use streaming::run_captured;
pub use types::{CapturedOutput, CommandSpec, Stream};

/// 执行外部命令的接口，测试中可替换为假实现
pub trait Runner: Send + Sync {
    fn run(&self, spec: &CommandSpec) -> CapturedOutput;
}

/// 真实启动子进程的 runner
#[derive(Debug, Clone, Default)]
pub struct SystemRunner;

impl Runner for SystemRunner {
    fn run(&self, spec: &CommandSpec) -> CapturedOutput {
        run_captured(spec)
    }
}
