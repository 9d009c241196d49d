//! 错误类型

use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, SpiceError>;

#[derive(Error, Debug)]
pub enum SpiceError {
    /// 工作目录中不存在该 spice
    #[error("未找到 spice: {0}")]
    PackageNotFound(String),

    /// 单个 spice 没有任何翻译文件（install / remove）
    #[error("{0} 没有可用的翻译文件")]
    NoTranslations(String),

    #[error("配置文件解析失败 {path}: {source}")]
    Config {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("IO 错误 {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("工作线程异常退出: {0}")]
    Worker(#[from] tokio::task::JoinError),
}

impl SpiceError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        SpiceError::Io {
            path: path.into(),
            source,
        }
    }
}
