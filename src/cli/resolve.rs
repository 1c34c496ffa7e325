//! # resolve 子命令 CLI 定义
//!
//! 为单个结构解析一个配置档。覆盖相关的参数与 `batch` 共用。
//!
//! ## 依赖关系
//! - 被 `cli/mod.rs` 使用
//! - 参数传递给 `commands/resolve.rs`

use super::ProfileArg;
use clap::Args;
use std::path::PathBuf;

/// 用户覆盖与配置档选项
#[derive(Args, Debug, Clone, Default)]
pub struct OverrideArgs {
    /// TOML file with [parameters], [settings.<Group>], potcar_functional, kpoint_density
    #[arg(short = 'o', long)]
    pub overrides: Option<PathBuf>,

    /// Override a parameter: KEY=VALUE or Group_settings.KEY=VALUE (repeatable)
    #[arg(long = "set", value_name = "KEY=VALUE")]
    pub set: Vec<String>,

    /// Pseudopotential functional family (e.g. PBE_54)
    #[arg(long)]
    pub potcar_functional: Option<String>,

    /// k-point density per reciprocal atom
    #[arg(long)]
    pub kpoint_density: Option<f64>,

    /// Extra base template file(s) merged into the built-in registry
    #[arg(long)]
    pub templates: Vec<PathBuf>,

    /// Relax the volume only (ISIF = 7)
    #[arg(long, default_value_t = false)]
    pub volume_relax: bool,

    /// Explicit ISIF
    #[arg(long)]
    pub isif: Option<i64>,
}

/// resolve 子命令参数
#[derive(Args, Debug)]
pub struct ResolveArgs {
    /// Structure file (POSCAR, CONTCAR, *.vasp)
    #[arg(short, long)]
    pub structure: PathBuf,

    /// Calculation profile
    #[arg(short, long, value_enum)]
    pub profile: ProfileArg,

    #[command(flatten)]
    pub overrides: OverrideArgs,

    /// Print the structure-bound INCAR preview instead of the parameter table
    #[arg(long, default_value_t = false)]
    pub incar: bool,

    /// Save the resolved settings bundle as TOML
    #[arg(long)]
    pub save: Option<PathBuf>,
}
