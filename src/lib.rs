//! # vaspsets - VASP 计算参数集解析
//!
//! 为一个晶体结构生成某类 VASP 计算（弛豫、静态、力常数、Born 有效电荷、弹性常数等）
//! 所需的完整参数集：INCAR 参数、k 点采样和赝势选择。
//!
//! 参数集由多层组合而成：基础模板、配置档基线、由成分推导的默认值（自旋极化、
//! k 点密度）、用户覆盖与命名覆盖组。解析是纯函数，不修改任何输入。
//!
//! ## 依赖关系
//! ```text
//! lib.rs
//!   ├── sets/      (模板注册表、配置档、解析引擎)
//!   ├── models/    (结构、参数集、覆盖设置)
//!   ├── parsers/   (POSCAR 读取)
//!   ├── batch/     (批量并行解析)
//!   ├── utils/     (输出、进度条、日志)
//!   └── error.rs   (错误处理)
//! ```

pub mod batch;
pub mod error;
pub mod models;
pub mod parsers;
pub mod sets;
pub mod utils;

pub use error::{Result, SetsError};
