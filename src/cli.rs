//! 两个命令行工具的参数定义与执行流程
//!
//! 所有输出都交给 `sink`，返回值即进程退出码。

use crate::error::SpiceError;
use crate::makepot::batch::generate_all;
use crate::makepot::{install, make_template};
use crate::runner::CapturedOutput;
use crate::spice::{Package, PackageSource};
use crate::toolchain::{Toolchain, WorkerPool};
use crate::validate::{validate_all, Verdict};
use clap::{CommandFactory, Parser};
use std::collections::BTreeSet;
use std::sync::Arc;

pub const EXIT_OK: u8 = 0;
pub const EXIT_FAILURE: u8 = 1;
pub const EXIT_USAGE: u8 = 2;

/// 为 spice 生成翻译模板，或安装 / 删除本地编译的翻译
#[derive(Parser, Debug)]
#[command(name = "spice-makepot", version, about)]
pub struct MakepotCli {
    /// 编译 .po 并安装到本地 locale 目录
    #[arg(short, long)]
    pub install: bool,

    /// 删除本地已安装的翻译
    #[arg(short, long)]
    pub remove: bool,

    /// 处理工作目录中的所有 spice
    #[arg(short, long)]
    pub all: bool,

    /// spice 的 UUID（目录名）
    pub uuid: Option<String>,
}

/// 发布前检查 spice 的目录结构、描述文件与翻译文件
#[derive(Parser, Debug)]
#[command(name = "spice-validate", version, about)]
pub struct ValidateCli {
    /// 校验工作目录中的所有 spice
    #[arg(short, long)]
    pub all: bool,

    /// spice 的 UUID（目录名）
    pub uuid: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Generate,
    Install,
    Remove,
}

impl MakepotCli {
    /// `--install` 与 `--remove` 同时出现时返回 None
    pub fn mode(&self) -> Option<Mode> {
        match (self.install, self.remove) {
            (true, true) => None,
            (true, false) => Some(Mode::Install),
            (false, true) => Some(Mode::Remove),
            (false, false) => Some(Mode::Generate),
        }
    }
}

fn help<C: CommandFactory>() -> CapturedOutput {
    let mut output = CapturedOutput::new();
    output.stdout(C::command().render_help().to_string());
    output
}

fn note(line: String) -> CapturedOutput {
    let mut output = CapturedOutput::new();
    output.stdout(line);
    output
}

fn lifecycle(mode: Mode, package: &Package, tc: &Toolchain) -> crate::error::Result<CapturedOutput> {
    match mode {
        Mode::Remove => install::remove(&package.id, &tc.config.locale_root),
        Mode::Install | Mode::Generate => install::install(package, tc),
    }
}

pub async fn run_makepot<F>(
    cli: MakepotCli,
    source: &dyn PackageSource,
    tc: Arc<Toolchain>,
    pool: &WorkerPool,
    mut sink: F,
) -> u8
where
    F: FnMut(CapturedOutput),
{
    let Some(mode) = cli.mode() else {
        sink(CapturedOutput::failure("错误: --install 与 --remove 不能同时使用"));
        return EXIT_FAILURE;
    };

    match (cli.all, cli.uuid) {
        (true, _) => makepot_all(mode, source, tc, pool, sink).await,
        (false, Some(id)) => makepot_one(mode, source, &id, tc, sink).await,
        (false, None) => {
            sink(help::<MakepotCli>());
            EXIT_USAGE
        }
    }
}

async fn makepot_all<F>(
    mode: Mode,
    source: &dyn PackageSource,
    tc: Arc<Toolchain>,
    pool: &WorkerPool,
    mut sink: F,
) -> u8
where
    F: FnMut(CapturedOutput),
{
    if mode == Mode::Generate {
        return match generate_all(source, tc, pool, &mut sink).await {
            Ok(succeeded) => {
                log::info!("{} 个 spice 生成成功", succeeded);
                EXIT_OK
            }
            Err(e) => {
                sink(CapturedOutput::failure(format!("错误: {}", e)));
                EXIT_FAILURE
            }
        };
    }

    let ids = match source.packages() {
        Ok(ids) => ids,
        Err(e) => {
            sink(CapturedOutput::failure(format!("错误: {}", e)));
            return EXIT_FAILURE;
        }
    };

    // 单个 spice 出错只记录，继续处理下一个
    let mut failed = 0;
    for id in ids {
        match lifecycle(mode, &source.locate(&id), &tc) {
            Ok(output) => {
                if !output.success {
                    failed += 1;
                }
                sink(output);
            }
            Err(SpiceError::NoTranslations(id)) => {
                sink(note(format!("{}: 没有翻译文件，跳过", id)));
            }
            Err(e) => {
                log::error!("{}: {}", id, e);
                failed += 1;
                sink(CapturedOutput::failure(format!("{}: {}", id, e)));
            }
        }
    }

    if failed > 0 {
        log::warn!("{} 个 spice 处理失败", failed);
        EXIT_FAILURE
    } else {
        EXIT_OK
    }
}

async fn makepot_one<F>(
    mode: Mode,
    source: &dyn PackageSource,
    id: &str,
    tc: Arc<Toolchain>,
    mut sink: F,
) -> u8
where
    F: FnMut(CapturedOutput),
{
    // remove 只看已安装的文件，不要求工作目录中存在该 spice
    let found = match mode {
        Mode::Remove => Ok(source.locate(id)),
        Mode::Generate | Mode::Install => source.find(id),
    };
    let package = match found {
        Ok(package) => package,
        Err(e) => {
            sink(CapturedOutput::failure(format!("错误: {}", e)));
            return EXIT_FAILURE;
        }
    };

    let result = match mode {
        Mode::Generate => Ok(make_template(package, tc).await),
        Mode::Install | Mode::Remove => lifecycle(mode, &package, &tc),
    };
    match result {
        Ok(output) => {
            let code = if output.success { EXIT_OK } else { EXIT_FAILURE };
            sink(output);
            code
        }
        Err(e) => {
            sink(CapturedOutput::failure(format!("错误: {}", e)));
            EXIT_FAILURE
        }
    }
}

pub fn run_validate<F>(cli: ValidateCli, source: &dyn PackageSource, tc: &Toolchain, mut sink: F) -> u8
where
    F: FnMut(CapturedOutput),
{
    let ids: BTreeSet<String> = match (cli.all, cli.uuid) {
        (true, _) => match source.packages() {
            Ok(ids) => ids,
            Err(e) => {
                sink(CapturedOutput::failure(format!("错误: {}", e)));
                return EXIT_FAILURE;
            }
        },
        (false, Some(id)) => BTreeSet::from([id]),
        (false, None) => {
            sink(help::<ValidateCli>());
            return EXIT_USAGE;
        }
    };

    let total = ids.len();
    let mut failed = 0;
    let passed = validate_all(source, ids, tc, |package, verdict| match verdict {
        Verdict::Pass => sink(note(format!("✓ {}", package.id))),
        Verdict::Fail(reason) => {
            failed += 1;
            sink(note(format!("✗ {}: {}", package.id, reason)));
        }
    });

    sink(note(format!(
        "\n共 {} 个，通过 {} 个，失败 {} 个",
        total,
        total - failed,
        failed
    )));
    if passed {
        EXIT_OK
    } else {
        EXIT_FAILURE
    }
}
