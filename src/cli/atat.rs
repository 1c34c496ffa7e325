//! # atat 子命令 CLI 定义
//!
//! ## 依赖关系
//! - 被 `cli/mod.rs` 使用
//! - 参数传递给 `commands/atat.rs`

use clap::Args;
use std::path::PathBuf;
use vaspsets::sets::AtatIdSettings;

/// atat 子命令参数
#[derive(Args, Debug)]
pub struct AtatArgs {
    /// Structure file (POSCAR, CONTCAR, *.vasp)
    #[arg(short, long)]
    pub structure: PathBuf,

    /// k-points per reciprocal atom (KPPRA)
    #[arg(long, default_value_t = AtatIdSettings::DEFAULT_GRID_DENSITY)]
    pub grid_density: u32,

    /// Output directory
    #[arg(short = 'd', long, default_value = ".")]
    pub output_dir: PathBuf,

    /// Print the file instead of writing it
    #[arg(long, default_value_t = false)]
    pub dry_run: bool,
}
