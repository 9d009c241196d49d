//! 批量处理工作目录中的所有 spice

use super::make_template;
use crate::error::Result;
use crate::runner::CapturedOutput;
use crate::spice::PackageSource;
use crate::toolchain::{Toolchain, WorkerPool};
use std::io::Write;
use std::sync::Arc;
use tokio::task::JoinSet;

/// 把一个 spice 的完整输出一次性写到终端，避免与其他 spice 交错
pub fn print_atomically(output: &CapturedOutput) {
    let rendered = output.render();
    let mut stdout = std::io::stdout().lock();
    let _ = stdout.write_all(rendered.as_bytes());
    let _ = stdout.flush();
}

/// 对 `source` 给出的每个 spice 并发生成模板
///
/// 结果按完成顺序交给 `sink`；返回成功的 spice 数量。
pub async fn generate_all<F>(
    source: &dyn PackageSource,
    tc: Arc<Toolchain>,
    pool: &WorkerPool,
    mut sink: F,
) -> Result<usize>
where
    F: FnMut(CapturedOutput),
{
    let ids = source.packages()?;
    log::debug!("共 {} 个 spice", ids.len());

    let mut set = JoinSet::new();
    for id in ids {
        let package = source.locate(&id);
        pool.spawn_into(&mut set, make_template(package, tc.clone()));
    }

    let mut succeeded = 0;
    while let Some(joined) = set.join_next().await {
        match joined {
            Ok(output) => {
                if output.success {
                    succeeded += 1;
                }
                sink(output);
            }
            Err(e) => log::error!("spice 任务异常退出: {}", e),
        }
    }
    Ok(succeeded)
}
