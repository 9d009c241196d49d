//! spice 目录结构与发现

pub mod keyfile;
pub mod metadata;

use crate::error::{Result, SpiceError};
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

/// 描述文件扩展名
pub const DESCRIPTOR_EXT: &str = "nemo_action.in";

/// 一个 spice（Nemo action），目录结构固定：
///
/// ```text
/// <id>/<id>.nemo_action.in
/// <id>/info.json
/// <id>/files/<id>/metadata.json
/// <id>/files/<id>/icon.png
/// <id>/files/<id>/po/<id>.pot
/// <id>/files/<id>/po/<locale>.po
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Package {
    pub id: String,
    pub root: PathBuf,
}

impl Package {
    pub fn new(tree: &Path, id: impl Into<String>) -> Self {
        let id = id.into();
        Self {
            root: tree.join(&id),
            id,
        }
    }

    pub fn descriptor(&self) -> PathBuf {
        self.root.join(format!("{}.{}", self.id, DESCRIPTOR_EXT))
    }

    pub fn info_file(&self) -> PathBuf {
        self.root.join("info.json")
    }

    pub fn files_root(&self) -> PathBuf {
        self.root.join("files")
    }

    pub fn files_dir(&self) -> PathBuf {
        self.files_root().join(&self.id)
    }

    pub fn metadata_file(&self) -> PathBuf {
        self.files_dir().join("metadata.json")
    }

    pub fn icon(&self) -> PathBuf {
        self.files_dir().join("icon.png")
    }

    pub fn po_dir(&self) -> PathBuf {
        self.files_dir().join("po")
    }

    pub fn template(&self) -> PathBuf {
        self.po_dir().join(format!("{}.pot", self.id))
    }

    /// `po/` 下的所有翻译文件，按文件名排序
    pub fn catalogs(&self) -> Vec<Catalog> {
        let mut catalogs: Vec<Catalog> = fs::read_dir(self.po_dir())
            .map(|rd| {
                rd.filter_map(|e| e.ok())
                    .map(|e| e.path())
                    .filter_map(|p| Catalog::from_path(&p))
                    .collect()
            })
            .unwrap_or_default();
        catalogs.sort_by(|a, b| a.locale.cmp(&b.locale));
        catalogs
    }
}

/// 单个语言的翻译文件
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Catalog {
    pub locale: String,
    pub path: PathBuf,
}

impl Catalog {
    pub fn from_path(path: &Path) -> Option<Self> {
        if !path.is_file() || path.extension().and_then(|e| e.to_str()) != Some("po") {
            return None;
        }
        let locale = path.file_stem()?.to_str()?.to_string();
        Some(Self {
            locale,
            path: path.to_path_buf(),
        })
    }

    pub fn file_name(&self) -> String {
        format!("{}.po", self.locale)
    }
}

/// spice 列表来源，批量模式通过它获取要处理的 spice
pub trait PackageSource: Send + Sync {
    fn packages(&self) -> Result<BTreeSet<String>>;

    fn locate(&self, id: &str) -> Package;

    /// 与 `locate` 相同，但目录不存在（或是隐藏目录）时返回 `PackageNotFound`
    fn find(&self, id: &str) -> Result<Package> {
        let package = self.locate(id);
        if id.starts_with('.') || !package.root.is_dir() {
            return Err(SpiceError::PackageNotFound(id.to_string()));
        }
        Ok(package)
    }
}

/// 以工作目录的一级子目录作为 spice 列表（跳过隐藏目录）
#[derive(Debug, Clone)]
pub struct WorkTree {
    pub root: PathBuf,
}

impl WorkTree {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl PackageSource for WorkTree {
    fn packages(&self) -> Result<BTreeSet<String>> {
        let entries = fs::read_dir(&self.root).map_err(|e| SpiceError::io(&self.root, e))?;
        let mut ids = BTreeSet::new();
        for entry in entries {
            let entry = entry.map_err(|e| SpiceError::io(&self.root, e))?;
            let name = entry.file_name().to_string_lossy().into_owned();
            if name.starts_with('.') || !entry.path().is_dir() {
                continue;
            }
            ids.insert(name);
        }
        Ok(ids)
    }

    fn locate(&self, id: &str) -> Package {
        Package::new(&self.root, id)
    }
}
