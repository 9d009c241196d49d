//! 各条校验规则

use super::{ensure, RuleError, RuleResult};
use crate::error::SpiceError;
use crate::runner::CommandSpec;
use crate::spice::keyfile::{KeyFile, ACTION_SECTION};
use crate::spice::Package;
use crate::toolchain::Toolchain;
use serde_json::Value;
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// 两者必须且只能出现一个
pub const SELECTOR_KEYS: [&str; 2] = ["Extensions", "Mimetypes"];
pub const REQUIRED_KEYS: [&str; 4] = ["_Name", "_Comment", "Exec", "Selection"];
pub const COMMENT_KEY: &str = "_Comment";
pub const METADATA_REQUIRED: [&str; 3] = ["uuid", "name", "description"];
pub const METADATA_FORBIDDEN: [&str; 4] = ["icon", "dangerous", "last-edited", "max-instances"];

fn has_ext(path: &Path, ext: &str) -> bool {
    path.extension().and_then(|e| e.to_str()) == Some(ext)
}

/// spice 目录下所有指定扩展名的文件，按路径排序
fn files_with_ext(root: &Path, ext: &str) -> Vec<PathBuf> {
    let mut found: Vec<PathBuf> = WalkDir::new(root)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .map(|e| e.into_path())
        .filter(|p| has_ext(p, ext))
        .collect();
    found.sort();
    found
}

fn display_rel(package: &Package, path: &Path) -> String {
    path.strip_prefix(&package.root)
        .unwrap_or(path)
        .display()
        .to_string()
}

pub fn mandatory_files(package: &Package, _tc: &Toolchain) -> RuleResult {
    for path in [package.info_file(), package.icon()] {
        ensure!(path.is_file(), "缺少 {}", display_rel(package, &path));
    }
    Ok(())
}

pub fn catalogs_beside_template(package: &Package, _tc: &Toolchain) -> RuleResult {
    let dirs: BTreeSet<PathBuf> = files_with_ext(&package.root, "po")
        .into_iter()
        .filter_map(|p| p.parent().map(Path::to_path_buf))
        .collect();
    for dir in dirs {
        let has_template = fs::read_dir(&dir)
            .map_err(|e| SpiceError::io(&dir, e))?
            .filter_map(|e| e.ok())
            .any(|e| has_ext(&e.path(), "pot"));
        ensure!(
            has_template,
            "{} 中有 .po 文件但没有 .pot 模板",
            display_rel(package, &dir)
        );
    }
    Ok(())
}

pub fn descriptor_present(package: &Package, _tc: &Toolchain) -> RuleResult {
    let descriptor = package.descriptor();
    ensure!(
        descriptor.is_file(),
        "缺少 {}",
        display_rel(package, &descriptor)
    );
    Ok(())
}

pub fn no_catalogs_at_root(package: &Package, _tc: &Toolchain) -> RuleResult {
    let entries = fs::read_dir(&package.root).map_err(|e| SpiceError::io(&package.root, e))?;
    for entry in entries.filter_map(|e| e.ok()) {
        let path = entry.path();
        ensure!(
            !(path.is_file() && (has_ext(&path, "po") || has_ext(&path, "pot"))),
            "翻译文件不应放在 spice 根目录: {}",
            display_rel(package, &path)
        );
    }
    Ok(())
}

pub fn single_template(package: &Package, _tc: &Toolchain) -> RuleResult {
    let templates = files_with_ext(&package.root, "pot");
    ensure!(
        templates.len() <= 1,
        "存在多个 .pot 模板: {}",
        templates
            .iter()
            .map(|p| display_rel(package, p))
            .collect::<Vec<_>>()
            .join(", ")
    );
    Ok(())
}

/// 描述文件结构检查，只依赖文本内容
pub fn check_descriptor(text: &str) -> RuleResult {
    let keyfile = KeyFile::parse(text);
    ensure!(
        keyfile.sections.len() == 1,
        "描述文件必须且只能有一个小节，实际有 {} 个",
        keyfile.sections.len()
    );
    let section = &keyfile.sections[0];
    ensure!(
        section.name == ACTION_SECTION,
        "小节名必须是 [{}]，实际是 [{}]",
        ACTION_SECTION,
        section.name
    );

    let dups = section.duplicate_keys();
    ensure!(dups.is_empty(), "重复的键: {}", dups.join(", "));

    let selectors = SELECTOR_KEYS
        .iter()
        .filter(|k| section.contains(k))
        .count();
    ensure!(
        selectors == 1,
        "{} 与 {} 必须且只能设置一个",
        SELECTOR_KEYS[0],
        SELECTOR_KEYS[1]
    );

    for entry in &section.entries {
        ensure!(
            !entry.key.contains('[') && !entry.key.contains(']'),
            "第 {} 行: 键名不能包含方括号 ({})，翻译请放在 po 文件中",
            entry.line,
            entry.key
        );
    }

    let desktop = section
        .get("Conditions")
        .map(|e| e.value.split(';').any(|c| c.trim() == "desktop"))
        .unwrap_or(false);
    for key in REQUIRED_KEYS {
        if key == COMMENT_KEY && desktop {
            ensure!(
                !section.contains(key),
                "Conditions 包含 desktop 时不能设置 {}",
                key
            );
            continue;
        }
        ensure!(section.contains(key), "缺少必需的键 {}", key);
    }

    for entry in section.entries.iter().filter(|e| e.key.starts_with('_')) {
        ensure!(
            !entry.value.contains('"'),
            "第 {} 行: {} 的值不能包含引号",
            entry.line,
            entry.key
        );
    }
    Ok(())
}

pub fn descriptor_schema(package: &Package, _tc: &Toolchain) -> RuleResult {
    let path = package.descriptor();
    let text = fs::read_to_string(&path).map_err(|e| SpiceError::io(&path, e))?;
    check_descriptor(&text)
}

pub fn no_legacy_files(package: &Package, _tc: &Toolchain) -> RuleResult {
    let generated = package
        .files_dir()
        .join(format!("{}.nemo_action", package.id));
    ensure!(
        !generated.exists(),
        "不应提交生成的描述文件 {}",
        display_rel(package, &generated)
    );
    let compiled = files_with_ext(&package.root, "mo");
    ensure!(
        compiled.is_empty(),
        "不应提交编译后的翻译文件 {}",
        compiled
            .iter()
            .map(|p| display_rel(package, p))
            .collect::<Vec<_>>()
            .join(", ")
    );
    Ok(())
}

pub fn mandatory_dirs(package: &Package, _tc: &Toolchain) -> RuleResult {
    for dir in [package.files_root(), package.files_dir()] {
        ensure!(dir.is_dir(), "缺少目录 {}", display_rel(package, &dir));
    }
    Ok(())
}

pub fn files_dir_exclusive(package: &Package, _tc: &Toolchain) -> RuleResult {
    let root = package.files_root();
    let entries = fs::read_dir(&root).map_err(|e| SpiceError::io(&root, e))?;
    for entry in entries.filter_map(|e| e.ok()) {
        let name = entry.file_name().to_string_lossy().into_owned();
        ensure!(
            name == package.id,
            "files/ 下只能有 {} 目录，发现多余的 {}",
            package.id,
            name
        );
    }
    Ok(())
}

fn parse_object(path: &Path, label: &str) -> Result<serde_json::Map<String, Value>, RuleError> {
    ensure!(path.is_file(), "缺少 {}", label);
    let text = fs::read_to_string(path).map_err(|e| SpiceError::io(path, e))?;
    match serde_json::from_str::<Value>(&text) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(_) => Err(RuleError::Check(format!("{} 必须是 JSON 对象", label))),
        Err(e) => Err(RuleError::Check(format!("{} 解析失败: {}", label, e))),
    }
}

pub fn info_record(package: &Package, _tc: &Toolchain) -> RuleResult {
    let info = parse_object(&package.info_file(), "info.json")?;
    ensure!(info.contains_key("author"), "info.json 缺少 author 字段");
    Ok(())
}

/// 找出第一个含非 ASCII 字符的字符串值，返回其字段路径
fn first_non_ascii(value: &Value, path: &str) -> Option<String> {
    match value {
        Value::String(s) if !s.is_ascii() => Some(path.to_string()),
        Value::Array(items) => items
            .iter()
            .enumerate()
            .find_map(|(i, v)| first_non_ascii(v, &format!("{}[{}]", path, i))),
        Value::Object(map) => map
            .iter()
            .find_map(|(k, v)| first_non_ascii(v, &format!("{}.{}", path, k))),
        _ => None,
    }
}

/// metadata.json 内容检查
pub fn check_metadata(map: &serde_json::Map<String, Value>, id: &str) -> RuleResult {
    for key in METADATA_FORBIDDEN {
        ensure!(!map.contains_key(key), "metadata.json 不能包含 {} 字段", key);
    }
    for key in METADATA_REQUIRED {
        ensure!(map.contains_key(key), "metadata.json 缺少 {} 字段", key);
    }
    let uuid = map.get("uuid").and_then(Value::as_str).unwrap_or_default();
    ensure!(
        uuid == id,
        "metadata.json 的 uuid ({}) 与目录名 ({}) 不一致",
        uuid,
        id
    );
    for (key, value) in map {
        if let Some(field) = first_non_ascii(value, key) {
            return Err(RuleError::Check(format!(
                "metadata.json 的 {} 包含多字节字符",
                field
            )));
        }
    }
    Ok(())
}

pub fn metadata_record(package: &Package, _tc: &Toolchain) -> RuleResult {
    let map = parse_object(&package.metadata_file(), "metadata.json")?;
    check_metadata(&map, &package.id)
}

pub fn square_icon(package: &Package, _tc: &Toolchain) -> RuleResult {
    let icon = package.icon();
    let (width, height) = image::image_dimensions(&icon)
        .map_err(|e| RuleError::Check(format!("无法读取 icon.png: {}", e)))?;
    ensure!(
        width == height,
        "icon.png 必须是正方形，实际为 {}x{}",
        width,
        height
    );
    Ok(())
}

/// `.po` 用 msgfmt 严格编译，`.pot` 用 xgettext 重新提取；
/// 退出码非零或有任何诊断输出即失败
pub fn catalog_syntax(package: &Package, tc: &Toolchain) -> RuleResult {
    let tools = &tc.config.tools;
    let checks = files_with_ext(&package.root, "po")
        .into_iter()
        .map(|p| {
            CommandSpec::new(&tools.msgfmt)
                .args(["-c", "-o", "/dev/null"])
                .arg(&p)
        })
        .chain(files_with_ext(&package.root, "pot").into_iter().map(|p| {
            CommandSpec::new(&tools.xgettext)
                .args(["-o", "/dev/null"])
                .arg(&p)
        }));

    for spec in checks {
        let output = tc.runner.run(&spec);
        ensure!(
            output.success && !output.has_stderr(),
            "`{}` 报告错误:\n{}",
            spec,
            output.stderr_text()
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::makepot::testing::{scaffold, NoHistory};
    use crate::runner::SystemRunner;
    use crate::toolchain::WorkerPool;
    use std::sync::Arc;

    const VALID: &str = "\
[Nemo Action]
_Name=Compress
_Comment=Compress the selected files
Exec=file-roller --add %F
Selection=notnone
Extensions=any;
";

    fn reason(result: RuleResult) -> String {
        match result {
            Err(RuleError::Check(r)) => r,
            other => panic!("expected check failure, got {:?}", other),
        }
    }

    #[test]
    fn valid_descriptor_passes() {
        assert!(check_descriptor(VALID).is_ok());
    }

    #[test]
    fn exactly_one_selector() {
        let both = format!("{}Mimetypes=text/plain;\n", VALID);
        assert!(reason(check_descriptor(&both)).contains("Mimetypes"));

        let neither = VALID.replace("Extensions=any;\n", "");
        assert!(reason(check_descriptor(&neither)).contains("Extensions"));

        let mimetypes_only = VALID.replace("Extensions=any;", "Mimetypes=text/plain;");
        assert!(check_descriptor(&mimetypes_only).is_ok());
    }

    #[test]
    fn section_rules() {
        let two = format!("{}[Other]\nA=b\n", VALID);
        assert!(reason(check_descriptor(&two)).contains("2"));

        let renamed = VALID.replace("[Nemo Action]", "[Desktop Entry]");
        assert!(reason(check_descriptor(&renamed)).contains("Desktop Entry"));
    }

    #[test]
    fn duplicate_and_bracketed_keys() {
        let dup = format!("{}Exec=other\n", VALID);
        assert!(reason(check_descriptor(&dup)).contains("Exec"));

        let localized = format!("{}Name[fr]=Compresser\n", VALID);
        assert!(reason(check_descriptor(&localized)).contains("Name[fr]"));
    }

    #[test]
    fn desktop_condition_flips_comment_requirement() {
        let desktop_with_comment = format!("{}Conditions=desktop;\n", VALID);
        assert!(reason(check_descriptor(&desktop_with_comment)).contains("_Comment"));

        let desktop_without_comment = desktop_with_comment.replace("_Comment=Compress the selected files\n", "");
        assert!(check_descriptor(&desktop_without_comment).is_ok());

        let missing_comment = VALID.replace("_Comment=Compress the selected files\n", "");
        assert!(reason(check_descriptor(&missing_comment)).contains("_Comment"));
    }

    #[test]
    fn quotes_in_localized_values() {
        let quoted = VALID.replace("_Name=Compress", "_Name=\"Compress\"");
        assert!(reason(check_descriptor(&quoted)).contains("_Name"));

        let quoted_exec = VALID.replace("Exec=file-roller --add %F", "Exec=sh -c \"x\"");
        assert!(check_descriptor(&quoted_exec).is_ok());
    }

    fn syntax_check_with(msgfmt: &str) -> RuleResult {
        let tree = tempfile::tempdir().unwrap();
        let package = scaffold(tree.path(), "zip@mint", &["fr"]);
        let mut config = Config::default();
        config.tools.msgfmt = msgfmt.to_string();
        config.tools.xgettext = "true".to_string();
        let tc = Toolchain::new(
            config,
            Arc::new(SystemRunner),
            Arc::new(NoHistory),
            WorkerPool::new(1),
        );
        catalog_syntax(&package, &tc)
    }

    #[test]
    fn silent_compiler_failure_fails_syntax_check() {
        assert!(syntax_check_with("true").is_ok());

        let r = reason(syntax_check_with("false"));
        assert!(r.contains("fr.po"));
    }

    fn metadata(json: &str) -> serde_json::Map<String, Value> {
        match serde_json::from_str::<Value>(json).unwrap() {
            Value::Object(map) => map,
            _ => unreachable!(),
        }
    }

    #[test]
    fn metadata_uuid_must_match_directory() {
        let map = metadata(r#"{"uuid": "other@mint", "name": "Zip", "description": "Zip it"}"#);
        assert!(reason(check_metadata(&map, "zip@mint")).contains("other@mint"));
    }

    #[test]
    fn metadata_forbidden_and_required_fields() {
        let map = metadata(
            r#"{"uuid": "zip@mint", "name": "Zip", "description": "Zip it", "max-instances": 1}"#,
        );
        assert!(reason(check_metadata(&map, "zip@mint")).contains("max-instances"));

        let map = metadata(r#"{"uuid": "zip@mint", "name": "Zip"}"#);
        assert!(reason(check_metadata(&map, "zip@mint")).contains("description"));
    }

    #[test]
    fn metadata_multibyte_values() {
        let map = metadata(
            r#"{"uuid": "zip@mint", "name": "Zip", "description": "Zip it", "author": {"name": "Zoë"}}"#,
        );
        assert!(reason(check_metadata(&map, "zip@mint")).contains("author.name"));
    }
}
