//! 模板 / 翻译文件头部占位符替换

use crate::error::{Result, SpiceError};
use crate::spice::metadata::SpiceInfo;
use std::fs;
use std::path::Path;

const TITLE_PLACEHOLDER: &str = "SOME DESCRIPTIVE TITLE.";
const AUTHOR_PLACEHOLDER: &str = "FIRST AUTHOR <EMAIL@ADDRESS>, YEAR.";
const PACKAGE_PLACEHOLDER: &str = "the PACKAGE package";

/// 仅翻译文件删除的占位行
const CATALOG_DROPPED_LINES: [&str; 3] = [
    "\"PO-Revision-Date: YEAR-MO-DA HO:MI+ZONE\\n\"",
    "\"Last-Translator: FULL NAME <EMAIL@ADDRESS>\\n\"",
    "\"Language-Team: LANGUAGE <LL@li.org>\\n\"",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactKind {
    Template,
    Catalog,
}

/// 替换头部占位符，并把 `#: ` 位置注释改成 `#. ` 提取注释
///
/// 占位符替换后不会再出现，重复执行结果不变。
pub fn rewrite(text: &str, kind: ArtifactKind, info: &SpiceInfo) -> String {
    let author_line = format!("{}, {}.", info.author, info.year);
    let package_line = format!("the {} package", info.name);

    let mut out = String::with_capacity(text.len());
    for line in text.split_inclusive('\n') {
        let bare = line.trim_end_matches(['\n', '\r']);
        if kind == ArtifactKind::Catalog && CATALOG_DROPPED_LINES.contains(&bare) {
            continue;
        }
        if let Some(rest) = line.strip_prefix("#: ") {
            out.push_str("#. ");
            out.push_str(rest);
            continue;
        }
        out.push_str(
            &line
                .replace(TITLE_PLACEHOLDER, &info.name)
                .replace(AUTHOR_PLACEHOLDER, &author_line)
                .replace(PACKAGE_PLACEHOLDER, &package_line),
        );
    }
    out
}

/// 就地改写文件，内容不变时不写回
pub fn rewrite_file(path: &Path, kind: ArtifactKind, info: &SpiceInfo) -> Result<bool> {
    let text = fs::read_to_string(path).map_err(|e| SpiceError::io(path, e))?;
    let rewritten = rewrite(&text, kind, info);
    if rewritten == text {
        return Ok(false);
    }
    fs::write(path, rewritten).map_err(|e| SpiceError::io(path, e))?;
    Ok(true)
}
