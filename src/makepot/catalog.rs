//! 翻译文件整理：去重 → 与模板同步 → 清理过时条目并折行 → 改写头部

use super::header::{self, ArtifactKind};
use crate::error::SpiceError;
use crate::runner::{CapturedOutput, CommandSpec};
use crate::spice::metadata::SpiceInfo;
use crate::spice::{Catalog, Package};
use crate::toolchain::Toolchain;
use std::sync::Arc;

/// 单个翻译文件的整理命令，工作目录为 po/
pub fn catalog_commands(catalog: &Catalog, package: &Package, tc: &Toolchain) -> Vec<CommandSpec> {
    let tools = &tc.config.tools;
    let po_dir = package.po_dir();
    let file = catalog.file_name();
    let file = file.as_str();
    let template = format!("{}.pot", package.id);
    let lang = format!("--lang={}", catalog.locale);
    let width = format!("--width={}", tc.config.wrap_width);

    vec![
        CommandSpec::new(&tools.msguniq)
            .args(["-o", file, file])
            .cwd(&po_dir),
        CommandSpec::new(&tools.msgmerge)
            .args([
                "--update",
                "--backup=off",
                lang.as_str(),
                file,
                template.as_str(),
            ])
            .cwd(&po_dir),
        CommandSpec::new(&tools.msgattrib)
            .args([
                "--no-obsolete",
                width.as_str(),
                "-o",
                file,
                file,
            ])
            .cwd(&po_dir),
    ]
}

/// 依次执行整理命令，任一步失败即停止本文件的处理
pub fn process_catalog(
    catalog: &Catalog,
    package: &Package,
    info: &SpiceInfo,
    tc: &Toolchain,
) -> CapturedOutput {
    let mut output = CapturedOutput::new();
    for spec in catalog_commands(catalog, package, tc) {
        let step = tc.runner.run(&spec);
        let ok = step.success;
        output.extend(step);
        if !ok {
            return output;
        }
    }

    if let Err(e) = header::rewrite_file(&catalog.path, ArtifactKind::Catalog, info) {
        output.extend(CapturedOutput::failure(e.to_string()));
    }
    output
}

/// 并发处理一个 spice 的所有翻译文件
///
/// 输出按启动顺序拼接，每行加上语言前缀；单个文件失败不影响其他文件。
pub async fn process_catalogs(
    package: &Package,
    info: &SpiceInfo,
    tc: &Arc<Toolchain>,
) -> CapturedOutput {
    let handles: Vec<_> = package
        .catalogs()
        .into_iter()
        .map(|catalog| {
            let locale = catalog.locale.clone();
            let package = package.clone();
            let info = info.clone();
            let worker_tc = tc.clone();
            let handle = tc.catalog_pool.spawn_blocking(move || {
                process_catalog(&catalog, &package, &info, &worker_tc)
            });
            (locale, handle)
        })
        .collect();

    let mut output = CapturedOutput::new();
    for (locale, handle) in handles {
        let result = match handle.await {
            Ok(Ok(out)) => out,
            Ok(Err(e)) | Err(e) => CapturedOutput::failure(SpiceError::from(e).to_string()),
        };
        output.extend_prefixed(&locale, result);
    }
    output
}
