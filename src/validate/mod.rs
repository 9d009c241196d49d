//! spice 发布前校验
//!
//! 每个 spice 依次执行固定顺序的规则，第一条失败的规则即为结果，
//! 后面的规则依赖前面规则保证的前提，因此顺序不可调整。

pub mod rules;

use crate::error::SpiceError;
use crate::spice::{Package, PackageSource};
use crate::toolchain::Toolchain;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RuleError {
    /// 规则未通过
    #[error("{0}")]
    Check(String),

    /// 校验过程本身出错（读文件失败等）
    #[error(transparent)]
    Unexpected(#[from] SpiceError),
}

pub type RuleResult = std::result::Result<(), RuleError>;

pub type Rule = fn(&Package, &Toolchain) -> RuleResult;

/// 条件不成立时返回 `RuleError::Check`
macro_rules! ensure {
    ($cond:expr, $($arg:tt)+) => {
        if !$cond {
            return Err($crate::validate::RuleError::Check(format!($($arg)+)));
        }
    };
}
pub(crate) use ensure;

/// 规则表，按执行顺序排列
pub const RULES: &[(&str, Rule)] = &[
    ("mandatory-files", rules::mandatory_files),
    ("po-beside-pot", rules::catalogs_beside_template),
    ("descriptor-present", rules::descriptor_present),
    ("no-po-at-root", rules::no_catalogs_at_root),
    ("single-pot", rules::single_template),
    ("descriptor-schema", rules::descriptor_schema),
    ("no-legacy-files", rules::no_legacy_files),
    ("mandatory-dirs", rules::mandatory_dirs),
    ("files-dir-exclusive", rules::files_dir_exclusive),
    ("info-record", rules::info_record),
    ("metadata-record", rules::metadata_record),
    ("square-icon", rules::square_icon),
    ("po-syntax", rules::catalog_syntax),
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    Pass,
    Fail(String),
}

impl Verdict {
    pub fn passed(&self) -> bool {
        matches!(self, Verdict::Pass)
    }
}

/// 校验单个 spice；意外错误只记为该 spice 失败
pub fn validate_package(package: &Package, tc: &Toolchain) -> Verdict {
    let outcome = RULES
        .iter()
        .try_for_each(|(name, rule)| rule(package, tc).map_err(|e| (*name, e)));

    match outcome {
        Ok(()) => Verdict::Pass,
        Err((_, RuleError::Check(reason))) => Verdict::Fail(reason),
        Err((name, RuleError::Unexpected(e))) => {
            log::error!("{}: 规则 {} 执行出错: {}", package.id, name, e);
            Verdict::Fail(format!("校验出错: {}", e))
        }
    }
}

/// 校验 `ids` 中的每个 spice，全部通过时返回 true
pub fn validate_all<F>(
    source: &dyn PackageSource,
    ids: impl IntoIterator<Item = String>,
    tc: &Toolchain,
    mut report: F,
) -> bool
where
    F: FnMut(&Package, &Verdict),
{
    let mut all_passed = true;
    for id in ids {
        let package = source.locate(&id);
        let verdict = validate_package(&package, tc);
        all_passed &= verdict.passed();
        report(&package, &verdict);
    }
    all_passed
}
