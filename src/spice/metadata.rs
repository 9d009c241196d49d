//! 名称 / 版本 / 作者信息解析

use super::Package;
use chrono::Datelike;
use serde_json::Value;
use std::ffi::OsString;
use std::fs;
use std::path::Path;

/// 表示"无作者"的占位值
pub const AUTHOR_SENTINEL: &str = "none";

/// 版本历史查询：返回某路径的 (作者, 年份)，按时间从早到晚排序
pub trait RevisionHistory: Send + Sync {
    fn authors(&self, path: &Path) -> Vec<(String, i32)>;
}

/// 基于 `git log` 的历史查询
#[derive(Debug, Clone)]
pub struct GitHistory {
    pub program: String,
}

impl GitHistory {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

impl RevisionHistory for GitHistory {
    fn authors(&self, path: &Path) -> Vec<(String, i32)> {
        let args: Vec<OsString> = vec![
            "log".into(),
            "--reverse".into(),
            "--format=%an%x09%aI".into(),
            "--".into(),
            ".".into(),
        ];
        match duct::cmd(self.program.as_str(), args)
            .dir(path)
            .stderr_null()
            .unchecked()
            .read()
        {
            Ok(out) => parse_history(&out),
            Err(e) => {
                log::debug!("git log 失败 {}: {}", path.display(), e);
                Vec::new()
            }
        }
    }
}

/// 解析 `%an<TAB>%aI` 格式的 git log 输出，无法解析日期的行跳过
pub fn parse_history(text: &str) -> Vec<(String, i32)> {
    text.lines()
        .filter_map(|line| {
            let (author, date) = line.split_once('\t')?;
            let year = chrono::DateTime::parse_from_rfc3339(date.trim())
                .ok()?
                .year();
            Some((author.trim().to_string(), year))
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NameVersion {
    pub name: String,
    pub version: String,
}

/// 写入模板与翻译文件头部的信息
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpiceInfo {
    pub name: String,
    pub version: String,
    pub author: String,
    pub year: i32,
}

fn read_json(path: &Path) -> Option<Value> {
    let content = fs::read_to_string(path).ok()?;
    serde_json::from_str(&content).ok()
}

fn field_text(record: &Value, key: &str) -> Option<String> {
    match record.get(key)? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// 读取 metadata.json 中的 name / version
///
/// 文件缺失或字段缺失不是错误：返回说明文字并使用默认值
/// （name = 大写 id，version = "1.0"）。
pub fn resolve_name_version(package: &Package) -> (NameVersion, Vec<String>) {
    let mut notes = Vec::new();
    let record = read_json(&package.metadata_file());
    if record.is_none() {
        notes.push(format!(
            "{} 不存在或无法解析，使用默认名称和版本",
            package.metadata_file().display()
        ));
    }

    let name = record.as_ref().and_then(|r| field_text(r, "name"));
    let version = record.as_ref().and_then(|r| field_text(r, "version"));
    if record.is_some() && name.is_none() {
        notes.push("metadata.json 缺少 name 字段".to_string());
    }
    if record.is_some() && version.is_none() {
        notes.push("metadata.json 缺少 version 字段".to_string());
    }

    let resolved = NameVersion {
        name: name.unwrap_or_else(|| package.id.to_uppercase()),
        version: version.unwrap_or_else(|| "1.0".to_string()),
    };
    (resolved, notes)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorCandidate {
    pub author: String,
    pub year: Option<i32>,
}

impl AuthorCandidate {
    pub fn new(author: impl Into<String>, year: Option<i32>) -> Self {
        Self {
            author: author.into(),
            year,
        }
    }

    fn is_usable(&self) -> bool {
        let a = self.author.trim();
        !a.is_empty() && a != AUTHOR_SENTINEL
    }
}

/// 第一个非空且不是 "none" 的候选胜出，年份取自同一来源
pub fn pick_author(candidates: &[AuthorCandidate], default_year: i32) -> (String, i32) {
    candidates
        .iter()
        .find(|c| c.is_usable())
        .map(|c| (c.author.trim().to_string(), c.year.unwrap_or(default_year)))
        .unwrap_or_else(|| (String::new(), default_year))
}

/// 作者回退链：info.json 的 original_author → author → 最早的提交作者
///
/// info.json 字段的年份取 spice 最早一次提交的年份。
pub fn resolve_author_year(
    package: &Package,
    history: &dyn RevisionHistory,
    default_year: i32,
) -> (String, i32) {
    let info = read_json(&package.info_file());
    let commits = history.authors(&package.root);
    let first_year = commits.first().map(|(_, y)| *y);

    let mut candidates = Vec::new();
    for key in ["original_author", "author"] {
        if let Some(author) = info.as_ref().and_then(|r| field_text(r, key)) {
            candidates.push(AuthorCandidate::new(author, first_year));
        }
    }
    if let Some((author, year)) = commits.first() {
        candidates.push(AuthorCandidate::new(author.clone(), Some(*year)));
    }

    pick_author(&candidates, default_year)
}

/// 汇总模板头部所需的全部信息
pub fn resolve(
    package: &Package,
    history: &dyn RevisionHistory,
    default_year: i32,
) -> (SpiceInfo, Vec<String>) {
    let (nv, notes) = resolve_name_version(package);
    let (author, year) = resolve_author_year(package, history, default_year);
    (
        SpiceInfo {
            name: nv.name,
            version: nv.version,
            author,
            year,
        },
        notes,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedHistory(Vec<(String, i32)>);

    impl RevisionHistory for FixedHistory {
        fn authors(&self, _path: &Path) -> Vec<(String, i32)> {
            self.0.clone()
        }
    }

    fn candidates(authors: [&str; 3]) -> Vec<AuthorCandidate> {
        vec![
            AuthorCandidate::new(authors[0], Some(2019)),
            AuthorCandidate::new(authors[1], Some(2019)),
            AuthorCandidate::new(authors[2], Some(2021)),
        ]
    }

    #[test]
    fn explicit_author_beats_history() {
        assert_eq!(
            pick_author(&candidates(["", "Jane", "git-author"]), 2017),
            ("Jane".to_string(), 2019)
        );
    }

    #[test]
    fn sentinels_fall_through_to_history() {
        assert_eq!(
            pick_author(&candidates(["none", "none", "git-author"]), 2017),
            ("git-author".to_string(), 2021)
        );
    }

    #[test]
    fn nothing_usable_gives_default_year() {
        assert_eq!(
            pick_author(&candidates(["", "none", " "]), 2017),
            (String::new(), 2017)
        );
    }

    #[test]
    fn parses_git_log_lines() {
        let out = "Jane Doe\t2019-03-02T10:11:12+01:00\nbad line\nBob\t2021-01-01T00:00:00Z\n";
        assert_eq!(
            parse_history(out),
            vec![("Jane Doe".to_string(), 2019), ("Bob".to_string(), 2021)]
        );
    }

    #[test]
    fn missing_metadata_uses_defaults_with_note() {
        let tree = tempfile::tempdir().unwrap();
        let p = Package::new(tree.path(), "zip@mint");
        let (nv, notes) = resolve_name_version(&p);
        assert_eq!(nv.name, "ZIP@MINT");
        assert_eq!(nv.version, "1.0");
        assert_eq!(notes.len(), 1);
    }

    #[test]
    fn numeric_version_is_accepted() {
        let tree = tempfile::tempdir().unwrap();
        let p = Package::new(tree.path(), "zip@mint");
        fs::create_dir_all(p.files_dir()).unwrap();
        fs::write(p.metadata_file(), r#"{"name": "Zip", "version": 2.1}"#).unwrap();
        let (nv, notes) = resolve_name_version(&p);
        assert_eq!(nv, NameVersion { name: "Zip".into(), version: "2.1".into() });
        assert!(notes.is_empty());
    }

    #[test]
    fn info_fields_take_year_of_first_commit() {
        let tree = tempfile::tempdir().unwrap();
        let p = Package::new(tree.path(), "zip@mint");
        fs::create_dir_all(&p.root).unwrap();
        fs::write(p.info_file(), r#"{"author": "jane", "original_author": "none"}"#).unwrap();
        let history = FixedHistory(vec![("git-user".into(), 2018), ("other".into(), 2022)]);
        assert_eq!(
            resolve_author_year(&p, &history, 2017),
            ("jane".to_string(), 2018)
        );
    }

    #[test]
    fn no_info_no_history() {
        let tree = tempfile::tempdir().unwrap();
        let p = Package::new(tree.path(), "zip@mint");
        let history = FixedHistory(Vec::new());
        assert_eq!(resolve_author_year(&p, &history, 2017), (String::new(), 2017));
    }
}
