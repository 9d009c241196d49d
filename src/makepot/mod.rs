//! 翻译模板生成 — 多个提取器的输出合并为一个 `.pot`，再同步各语言的 `.po`

pub mod batch;
pub mod catalog;
pub mod header;
pub mod install;

use crate::error::SpiceError;
use crate::runner::{CapturedOutput, CommandSpec};
use crate::spice::keyfile::KeyFile;
use crate::spice::metadata::{self, SpiceInfo};
use crate::spice::Package;
use crate::toolchain::Toolchain;
use header::ArtifactKind;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use walkdir::WalkDir;

/// 描述文件中需要翻译的键
const LOCALIZED_KEYS: [&str; 2] = ["_Name", "_Comment"];

fn escape_po(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}

/// 从 `<id>.nemo_action.in` 生成 `_Name` / `_Comment` 两个模板条目
///
/// 文件不存在、没有 `[Nemo Action]` 小节或字段为空时跳过，不报错。
pub fn extract_action_entries(package: &Package) -> String {
    let Ok(text) = fs::read_to_string(package.descriptor()) else {
        return String::new();
    };
    let keyfile = KeyFile::parse(&text);
    let Some(section) = keyfile.action_section() else {
        return String::new();
    };
    let source = format!("{}.{}", package.id, crate::spice::DESCRIPTOR_EXT);

    let mut entries = String::new();
    for key in LOCALIZED_KEYS {
        let Some(entry) = section.get(key) else {
            continue;
        };
        if entry.value.is_empty() {
            continue;
        }
        entries.push_str(&format!(
            "\n#: {}:{}\nmsgid \"{}\"\nmsgstr \"\"\n",
            source,
            entry.line,
            escape_po(&entry.value)
        ));
    }
    entries
}

/// files/<id>/ 下的所有 shell 脚本，按路径排序
fn shell_scripts(package: &Package) -> Vec<PathBuf> {
    let mut scripts: Vec<PathBuf> = WalkDir::new(package.files_dir())
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .map(|e| e.into_path())
        .filter(|p| p.extension().and_then(|e| e.to_str()) == Some("sh"))
        .collect();
    scripts.sort();
    scripts
}

fn append(path: &std::path::Path, text: &str) -> crate::error::Result<()> {
    let mut file = OpenOptions::new()
        .append(true)
        .open(path)
        .map_err(|e| SpiceError::io(path, e))?;
    file.write_all(text.as_bytes())
        .map_err(|e| SpiceError::io(path, e))
}

/// 生成模板（阻塞）
///
/// 返回已捕获的输出；通用提取器没有生成模板时返回 `None`，调用方不再处理翻译文件。
pub fn build_template(package: &Package, tc: &Toolchain) -> (CapturedOutput, Option<SpiceInfo>) {
    let mut output = CapturedOutput::new();
    let template = package.template();
    let tools = &tc.config.tools;

    if template.exists() {
        if let Err(e) = fs::remove_file(&template) {
            output.extend(CapturedOutput::failure(SpiceError::io(&template, e).to_string()));
            return (output, None);
        }
    }
    if let Err(e) = fs::create_dir_all(package.po_dir()) {
        output.extend(CapturedOutput::failure(
            SpiceError::io(package.po_dir(), e).to_string(),
        ));
        return (output, None);
    }

    let action_entries = extract_action_entries(package);

    output.extend(
        tc.runner.run(
            &CommandSpec::new(&tools.makepot)
                .arg("-o")
                .arg(&template)
                .arg(".")
                .cwd(package.files_dir()),
        ),
    );
    if !template.exists() {
        log::warn!("{}: 提取器没有生成模板", package.id);
        output.stderr(format!("未生成 {}，跳过后续步骤", template.display()));
        return (output, None);
    }

    for script in shell_scripts(package) {
        let mut step = tc.runner.run(
            &CommandSpec::new(&tools.xgettext)
                .args(["--join-existing", "--language=Shell", "--from-code=UTF-8", "-o"])
                .arg(&template)
                .arg(&script)
                .unchecked(),
        );
        if !step.success || step.has_stderr() {
            log::warn!("{}: 提取 {} 时出错", package.id, script.display());
        }
        // 单个脚本出错不影响整个 spice
        step.success = true;
        let name = script
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        output.extend_prefixed(&name, step);
    }

    if !action_entries.is_empty() {
        if let Err(e) = append(&template, &action_entries) {
            output.extend(CapturedOutput::failure(e.to_string()));
        }
    }

    let (info, notes) = metadata::resolve(package, tc.history.as_ref(), tc.config.default_year);
    for note in notes {
        log::info!("{}: {}", package.id, note);
        output.stdout(format!("注意: {}", note));
    }

    let pot_name = format!("{}.pot", package.id);
    output.extend(
        tc.runner.run(
            &CommandSpec::new(&tools.xgettext)
                .args([
                    "--from-code=UTF-8".to_string(),
                    format!("--package-name={}", info.name),
                    format!("--package-version={}", info.version),
                    format!("--msgid-bugs-address={}", tc.config.bugs_address),
                    "-o".to_string(),
                    pot_name.clone(),
                    pot_name,
                ])
                .cwd(package.po_dir()),
        ),
    );

    if let Err(e) = header::rewrite_file(&template, ArtifactKind::Template, &info) {
        output.extend(CapturedOutput::failure(e.to_string()));
    }

    (output, Some(info))
}

/// 为一个 spice 生成模板并整理其所有翻译文件
///
/// 模板写完之后才开始并发处理翻译文件。输出第一行为 `[<id>]`。
pub async fn make_template(package: Package, tc: Arc<Toolchain>) -> CapturedOutput {
    let mut output = CapturedOutput::new();
    output.stdout(format!("[{}]", package.id));

    let built = {
        let package = package.clone();
        let tc = tc.clone();
        tokio::task::spawn_blocking(move || build_template(&package, &tc)).await
    };
    let (built, info) = match built {
        Ok(result) => result,
        Err(e) => {
            output.extend(CapturedOutput::failure(SpiceError::from(e).to_string()));
            return output;
        }
    };
    output.extend(built);

    if let Some(info) = info {
        output.extend(catalog::process_catalogs(&package, &info, &tc).await);
    }
    output
}

#[cfg(test)]
pub(crate) mod testing {
    //! 不依赖 gettext 的假工具链

    use crate::config::Config;
    use crate::runner::{CapturedOutput, CommandSpec, Runner};
    use crate::spice::metadata::RevisionHistory;
    use crate::toolchain::{Toolchain, WorkerPool};
    use std::fs;
    use std::path::{Path, PathBuf};
    use std::sync::{Arc, Mutex};

    pub const FAKE_POT: &str = r#"# SOME DESCRIPTIVE TITLE.
# FIRST AUTHOR <EMAIL@ADDRESS>, YEAR.
msgid ""
msgstr ""

#: action.js:3
msgid "Hello"
msgstr ""
"#;

    /// 记录所有命令；makepot 在 `-o` 指定的位置写入模板，
    /// `fail_matching` 中任一子串出现在命令行里时返回失败
    #[derive(Default)]
    pub struct FakeRunner {
        pub calls: Mutex<Vec<CommandSpec>>,
        pub fail_matching: Vec<String>,
        pub skip_template: bool,
        /// 每次 xgettext 调用时 `-o` 文件的内容，与命令行一起记录
        pub xgettext_inputs: Mutex<Vec<(String, String)>>,
    }

    fn output_path(spec: &CommandSpec) -> Option<PathBuf> {
        let pos = spec.args.iter().position(|a| a == "-o")?;
        let path = PathBuf::from(spec.args.get(pos + 1)?);
        Some(match &spec.cwd {
            Some(dir) => dir.join(path),
            None => path,
        })
    }

    impl FakeRunner {
        pub fn programs(&self) -> Vec<String> {
            self.calls
                .lock()
                .unwrap()
                .iter()
                .map(|c| c.program.clone())
                .collect()
        }
    }

    impl Runner for FakeRunner {
        fn run(&self, spec: &CommandSpec) -> CapturedOutput {
            self.calls.lock().unwrap().push(spec.clone());
            let line = spec.to_string();
            if spec.program == "xgettext" {
                let contents = output_path(spec)
                    .and_then(|p| fs::read_to_string(p).ok())
                    .unwrap_or_default();
                self.xgettext_inputs.lock().unwrap().push((line.clone(), contents));
            }
            if self.fail_matching.iter().any(|f| line.contains(f.as_str())) {
                return CapturedOutput::failure(format!("{} failed", line));
            }
            if spec.program == "cinnamon-xlet-makepot" && !self.skip_template {
                if let Some(path) = output_path(spec) {
                    fs::write(path, FAKE_POT).unwrap();
                }
            }
            let mut out = CapturedOutput::new();
            out.stdout(format!("ran {}", spec.program));
            out
        }
    }

    pub struct NoHistory;

    impl RevisionHistory for NoHistory {
        fn authors(&self, _path: &Path) -> Vec<(String, i32)> {
            Vec::new()
        }
    }

    pub fn toolchain(runner: Arc<FakeRunner>) -> Arc<Toolchain> {
        toolchain_with(runner, Config::default())
    }

    pub fn toolchain_with(runner: Arc<FakeRunner>, config: Config) -> Arc<Toolchain> {
        Arc::new(Toolchain::new(
            config,
            runner,
            Arc::new(NoHistory),
            WorkerPool::new(4),
        ))
    }

    /// 在 tree 下创建一个最小的 spice 目录
    pub fn scaffold(tree: &Path, id: &str, locales: &[&str]) -> crate::spice::Package {
        let package = crate::spice::Package::new(tree, id);
        fs::create_dir_all(package.po_dir()).unwrap();
        fs::write(
            package.descriptor(),
            "[Nemo Action]\n_Name=Compress\n_Comment=Compress files\nExec=true\nSelection=any\nExtensions=any;\n",
        )
        .unwrap();
        fs::write(
            package.metadata_file(),
            format!(r#"{{"uuid": "{}", "name": "Compress", "version": "1.2"}}"#, id),
        )
        .unwrap();
        for locale in locales {
            fs::write(
                package.po_dir().join(format!("{}.po", locale)),
                format!(
                    "# SOME DESCRIPTIVE TITLE.\nmsgid \"\"\nmsgstr \"\"\n\"PO-Revision-Date: YEAR-MO-DA HO:MI+ZONE\\n\"\n\"Language: {}\\n\"\n\n#: action.js:3\nmsgid \"Hello\"\nmsgstr \"Salut\"\n",
                    locale
                ),
            )
            .unwrap();
        }
        package
    }
}
