//! # batch 子命令 CLI 定义
//!
//! 对目录中的所有结构解析同一配置档，输出汇总表
//!
//! ## 依赖关系
//! - 被 `cli/mod.rs` 使用
//! - 参数传递给 `commands/batch.rs`

use super::resolve::OverrideArgs;
use super::ProfileArg;
use clap::Args;
use std::path::PathBuf;
use vaspsets::batch::DEFAULT_PATTERN;

/// batch 子命令参数
#[derive(Args, Debug)]
pub struct BatchArgs {
    /// Input structure file or directory
    #[arg(short, long)]
    pub input: PathBuf,

    /// Calculation profile
    #[arg(short, long, value_enum)]
    pub profile: ProfileArg,

    #[command(flatten)]
    pub overrides: OverrideArgs,

    /// File name pattern(s), comma separated
    #[arg(long, default_value = DEFAULT_PATTERN)]
    pub pattern: String,

    /// Search subdirectories
    #[arg(short, long, default_value_t = false)]
    pub recursive: bool,

    /// Number of parallel jobs (0 = all cores)
    #[arg(short, long, default_value_t = 0)]
    pub jobs: usize,

    /// Write the summary as CSV
    #[arg(long)]
    pub csv: Option<PathBuf>,
}
