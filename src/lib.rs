//! Nemo action spice 的翻译模板生成与发布前校验

pub mod cli;
pub mod config;
pub mod error;
pub mod makepot;
pub mod runner;
pub mod spice;
pub mod toolchain;
pub mod validate;
