use anyhow::Result;
use clap::Parser;
use spice_po::cli::{run_validate, ValidateCli};
use spice_po::config::Config;
use spice_po::makepot::batch::print_atomically;
use spice_po::spice::WorkTree;
use spice_po::toolchain::Toolchain;
use std::process::ExitCode;

fn main() -> Result<ExitCode> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = ValidateCli::parse();

    let config = Config::load_or_default()?;
    config.tools.warn_missing();

    let tree = WorkTree::new(std::env::current_dir()?);
    let tc = Toolchain::system(config);

    let code = run_validate(cli, &tree, &tc, |output| print_atomically(&output));
    Ok(ExitCode::from(code))
}
