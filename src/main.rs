//! # vaspsets - VASP 计算参数集解析工具
//!
//! 为晶体结构生成各类 VASP 计算的参数集。
//!
//! ## 子命令
//! - `resolve`  - 为单个结构解析一个配置档
//! - `batch`    - 批量并行解析
//! - `atat`     - 写出 ATAT 拐点检测输入
//! - `profiles` - 列出配置档
//!
//! ## 依赖关系
//! ```text
//! main.rs
//!   ├── cli/        (命令行参数定义)
//!   ├── commands/   (命令执行逻辑)
//!   └── vaspsets    (库: sets, models, parsers, batch, utils)
//! ```

mod cli;
mod commands;

use clap::Parser;
use cli::Cli;
use vaspsets::utils::{logging, output};

fn main() {
    // Initialize colored output for Windows compatibility
    #[cfg(windows)]
    colored::control::set_virtual_terminal(true).ok();

    let cli = Cli::parse();

    if let Err(e) = logging::setup_logging(cli.verbose, cli.quiet, cli.log_file.as_deref()) {
        output::print_error(&format!("{}", e));
        std::process::exit(1);
    }

    if let Err(e) = commands::run(cli.command) {
        output::print_error(&format!("{}", e));
        std::process::exit(1);
    }
}
