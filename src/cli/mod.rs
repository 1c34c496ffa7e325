//! # CLI 模块
//!
//! 使用 `clap` 定义命令行参数和子命令。
//!
//! ## 命令结构
//! - `resolve`: 为单个结构解析一个配置档
//! - `batch`: 对目录中的结构批量解析
//! - `atat`: 写出 ATAT 拐点检测的 `vaspid.wrap`
//! - `profiles`: 列出可用配置档
//!
//! ## 依赖关系
//! - 被 `main.rs` 使用
//! - 子模块: resolve, batch, atat

pub mod atat;
pub mod batch;
pub mod resolve;

use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use vaspsets::sets::ProfileKind;

/// vaspsets - VASP 计算参数集解析
#[derive(Parser)]
#[command(name = "vaspsets")]
#[command(author = "Changjiang Wu")]
#[command(version)]
#[command(about = "Resolve layered VASP calculation-parameter sets", long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Silence log output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Also write logs to this file
    #[arg(long, global = true, env = "VASPSETS_LOG_FILE")]
    pub log_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

/// 可用的子命令
#[derive(Subcommand)]
pub enum Commands {
    /// Resolve one calculation profile for a structure
    Resolve(resolve::ResolveArgs),

    /// Resolve one profile for every structure in a directory
    Batch(batch::BatchArgs),

    /// Write the ATAT inflection-detection vaspid.wrap file
    Atat(atat::AtatArgs),

    /// List the available calculation profiles
    Profiles,
}

/// 命令行可选的配置档
#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq)]
pub enum ProfileArg {
    /// Full relaxation
    Relax,
    /// Coarse fixed-geometry run before static
    Prestatic,
    /// Finite-difference force constants
    #[value(alias = "fc")]
    Forceconstants,
    /// Dense fixed-geometry run
    Static,
    /// Tightly converged forces
    Forces,
    /// Dielectric tensor and Born effective charges
    Born,
    /// Strained-cell stress relaxation
    Elastic,
}

impl From<ProfileArg> for ProfileKind {
    fn from(arg: ProfileArg) -> Self {
        match arg {
            ProfileArg::Relax => ProfileKind::Relax,
            ProfileArg::Prestatic => ProfileKind::PreStatic,
            ProfileArg::Forceconstants => ProfileKind::ForceConstants,
            ProfileArg::Static => ProfileKind::Static,
            ProfileArg::Forces => ProfileKind::Forces,
            ProfileArg::Born => ProfileKind::BornCharge,
            ProfileArg::Elastic => ProfileKind::Elastic,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_profile_arg_names_match_profiles() {
        for arg in ProfileArg::value_variants() {
            let kind = ProfileKind::from(*arg);
            let name = arg.to_possible_value().map(|v| v.get_name().to_string());
            assert_eq!(name.as_deref(), Some(kind.name()));
        }
    }
}
