//! `.nemo_action.in` 描述文件的最小解析器
//!
//! 保留重复键与出现顺序，校验需要这些信息，通用 ini 库会把它们合并掉。

/// 唯一合法的小节名
pub const ACTION_SECTION: &str = "Nemo Action";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    pub key: String,
    pub value: String,
    /// 1 起始的行号
    pub line: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section {
    pub name: String,
    pub entries: Vec<Entry>,
}

impl Section {
    pub fn get(&self, key: &str) -> Option<&Entry> {
        self.entries.iter().find(|e| e.key == key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// 出现超过一次的键
    pub fn duplicate_keys(&self) -> Vec<&str> {
        let mut dups: Vec<&str> = Vec::new();
        for (i, e) in self.entries.iter().enumerate() {
            let repeated = self.entries[..i].iter().any(|p| p.key == e.key);
            if repeated && !dups.contains(&e.key.as_str()) {
                dups.push(&e.key);
            }
        }
        dups
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeyFile {
    pub sections: Vec<Section>,
}

impl KeyFile {
    /// 解析不会失败：无法识别的行直接忽略，结构问题留给校验规则判断。
    /// 出现在任何小节之前的键归入名为空字符串的小节。
    pub fn parse(text: &str) -> Self {
        let mut sections: Vec<Section> = Vec::new();

        for (idx, raw) in text.lines().enumerate() {
            let line = raw.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            if line.starts_with('[') && line.ends_with(']') {
                sections.push(Section {
                    name: line[1..line.len() - 1].to_string(),
                    entries: Vec::new(),
                });
                continue;
            }
            let Some((key, value)) = line.split_once('=') else {
                continue;
            };
            if sections.is_empty() {
                sections.push(Section {
                    name: String::new(),
                    entries: Vec::new(),
                });
            }
            if let Some(section) = sections.last_mut() {
                section.entries.push(Entry {
                    key: key.trim().to_string(),
                    value: value.trim().to_string(),
                    line: idx + 1,
                });
            }
        }

        Self { sections }
    }

    pub fn action_section(&self) -> Option<&Section> {
        self.sections.iter().find(|s| s.name == ACTION_SECTION)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\
# comment
[Nemo Action]
_Name=Compress
_Comment=Compress the selected files
Exec=file-roller --add %F
Selection=notnone
Extensions=any;
";

    #[test]
    fn parses_single_section_with_line_numbers() {
        let kf = KeyFile::parse(SAMPLE);
        assert_eq!(kf.sections.len(), 1);
        let section = kf.action_section().unwrap();
        let name = section.get("_Name").unwrap();
        assert_eq!(name.value, "Compress");
        assert_eq!(name.line, 3);
        assert_eq!(section.get("Extensions").unwrap().value, "any;");
    }

    #[test]
    fn value_keeps_embedded_equals() {
        let kf = KeyFile::parse("[Nemo Action]\nExec=sh -c \"a=b\"\n");
        assert_eq!(kf.sections[0].get("Exec").unwrap().value, "sh -c \"a=b\"");
    }

    #[test]
    fn reports_duplicates_once() {
        let kf = KeyFile::parse("[Nemo Action]\nExec=a\nExec=b\nExec=c\nSelection=s\n");
        assert_eq!(kf.sections[0].duplicate_keys(), vec!["Exec"]);
    }

    #[test]
    fn keys_before_any_section_form_anonymous_section() {
        let kf = KeyFile::parse("Exec=a\n[Nemo Action]\nSelection=s\n");
        assert_eq!(kf.sections.len(), 2);
        assert_eq!(kf.sections[0].name, "");
    }
}
