use anyhow::Result;
use clap::Parser;
use spice_po::cli::{run_makepot, MakepotCli};
use spice_po::config::Config;
use spice_po::makepot::batch::print_atomically;
use spice_po::spice::WorkTree;
use spice_po::toolchain::{Toolchain, WorkerPool};
use std::process::ExitCode;
use std::sync::Arc;

#[tokio::main]
async fn main() -> Result<ExitCode> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = MakepotCli::parse();

    // 加载配置
    let config = Config::load_or_default()?;
    config.tools.warn_missing();

    let tree = WorkTree::new(std::env::current_dir()?);
    let tc = Arc::new(Toolchain::system(config));
    let pool = WorkerPool::with_available_parallelism();

    let code = run_makepot(cli, &tree, tc, &pool, |output| print_atomically(&output)).await;
    Ok(ExitCode::from(code))
}
