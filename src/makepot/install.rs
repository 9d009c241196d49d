//! 编译翻译文件并安装到本地 locale 目录，或从中删除

use crate::error::{Result, SpiceError};
use crate::runner::{CapturedOutput, CommandSpec};
use crate::spice::Package;
use crate::toolchain::Toolchain;
use std::fs;
use std::path::{Path, PathBuf};

/// `<locale_root>/<locale>/LC_MESSAGES/<id>.mo`
pub fn installed_path(locale_root: &Path, locale: &str, id: &str) -> PathBuf {
    locale_root
        .join(locale)
        .join("LC_MESSAGES")
        .join(format!("{}.mo", id))
}

/// 用 msgfmt 编译每个 `.po` 并写入 locale 目录
///
/// 没有任何翻译文件时返回 `NoTranslations`，由调用方决定是否致命。
pub fn install(package: &Package, tc: &Toolchain) -> Result<CapturedOutput> {
    let catalogs = package.catalogs();
    if catalogs.is_empty() {
        return Err(SpiceError::NoTranslations(package.id.clone()));
    }

    let mut output = CapturedOutput::new();
    for catalog in catalogs {
        let target = installed_path(&tc.config.locale_root, &catalog.locale, &package.id);
        if let Some(dir) = target.parent() {
            fs::create_dir_all(dir).map_err(|e| SpiceError::io(dir, e))?;
        }
        let step = tc.runner.run(
            &CommandSpec::new(&tc.config.tools.msgfmt)
                .arg("-c")
                .arg(&catalog.path)
                .arg("-o")
                .arg(&target),
        );
        if step.success {
            output.stdout(format!("已安装 {}", target.display()));
        }
        output.extend_prefixed(&catalog.locale, step);
    }
    Ok(output)
}

/// 删除所有语言下已安装的 `<id>.mo`
pub fn remove(id: &str, locale_root: &Path) -> Result<CapturedOutput> {
    // 只有语言一级是通配符，根目录与 id 中的 `[`、`*` 等按字面匹配
    let pattern = installed_path(
        Path::new(&glob::Pattern::escape(&locale_root.to_string_lossy())),
        "*",
        &glob::Pattern::escape(id),
    );
    let pattern = pattern.to_string_lossy();

    let mut output = CapturedOutput::new();
    let paths = glob::glob(&pattern).map_err(|e| {
        SpiceError::io(
            locale_root,
            std::io::Error::new(std::io::ErrorKind::InvalidInput, e.msg),
        )
    })?;
    for path in paths.filter_map(|p| p.ok()) {
        fs::remove_file(&path).map_err(|e| SpiceError::io(&path, e))?;
        output.stdout(format!("已删除 {}", path.display()));
    }

    if output.is_empty() {
        return Err(SpiceError::NoTranslations(id.to_string()));
    }
    Ok(output)
}
