use crate::error::{Result, SpiceError};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

/// 外部工具的程序名，可在配置文件 `[tools]` 中覆盖
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Tools {
    pub makepot: String,
    pub xgettext: String,
    pub msguniq: String,
    pub msgmerge: String,
    pub msgattrib: String,
    pub msgfmt: String,
    pub git: String,
}

impl Default for Tools {
    fn default() -> Self {
        Self {
            makepot: "cinnamon-xlet-makepot".to_string(),
            xgettext: "xgettext".to_string(),
            msguniq: "msguniq".to_string(),
            msgmerge: "msgmerge".to_string(),
            msgattrib: "msgattrib".to_string(),
            msgfmt: "msgfmt".to_string(),
            git: "git".to_string(),
        }
    }
}

impl Tools {
    pub fn all(&self) -> [&str; 7] {
        [
            &self.makepot,
            &self.xgettext,
            &self.msguniq,
            &self.msgmerge,
            &self.msgattrib,
            &self.msgfmt,
            &self.git,
        ]
    }

    /// 检查工具是否在 PATH 中，缺失只记录警告
    pub fn warn_missing(&self) {
        for tool in self.all() {
            if which::which(tool).is_err() {
                log::warn!("未在 PATH 中找到 {}", tool);
            }
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub locale_root: PathBuf,
    pub bugs_address: String,
    pub default_year: i32,
    pub wrap_width: u32,
    pub tools: Tools,
}

impl Default for Config {
    fn default() -> Self {
        let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
        Self {
            locale_root: PathBuf::from(home).join(".local/share/locale"),
            bugs_address: "https://github.com/linuxmint/cinnamon-spices-actions/issues"
                .to_string(),
            default_year: 2017,
            wrap_width: 79,
            tools: Tools::default(),
        }
    }
}

impl Config {
    pub fn load_or_default() -> Result<Self> {
        let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
        let config_path = PathBuf::from(home).join(".config/spice-po/config.toml");

        if config_path.exists() {
            let content =
                fs::read_to_string(&config_path).map_err(|e| SpiceError::io(&config_path, e))?;
            Self::from_toml(&content).map_err(|source| SpiceError::Config {
                path: config_path,
                source,
            })
        } else {
            Ok(Self::default())
        }
    }

    pub fn from_toml(content: &str) -> std::result::Result<Self, toml::de::Error> {
        toml::from_str(content)
    }
}
