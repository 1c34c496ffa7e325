//! # 命令执行模块
//!
//! 实现各子命令的业务逻辑。
//!
//! ## 依赖关系
//! - 被 `main.rs` 调用
//! - 使用 `cli/`, `vaspsets::{parsers, sets, batch, utils}`
//! - 子模块: inputs, resolve, batch, atat, profiles

pub mod atat;
pub mod batch;
pub mod inputs;
pub mod profiles;
pub mod resolve;

use crate::cli::Commands;
use vaspsets::Result;

/// 执行命令
pub fn run(cmd: Commands) -> Result<()> {
    match cmd {
        Commands::Resolve(args) => resolve::execute(args),
        Commands::Batch(args) => batch::execute(args),
        Commands::Atat(args) => atat::execute(args),
        Commands::Profiles => profiles::execute(),
    }
}
