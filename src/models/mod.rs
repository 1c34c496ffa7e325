//! # 数据模型模块
//!
//! 定义晶体结构、参数集和用户覆盖设置的数据模型。
//!
//! ## 依赖关系
//! - 被 `parsers/`、`sets/` 和 `commands/` 使用
//! - 子模块: structure, settings, overrides

pub mod overrides;
pub mod settings;
pub mod structure;

pub use overrides::{is_group_name, OverrideGroup, OverrideSet, ProfileOptions};
pub use settings::{
    normalize_key, DensityBasis, KpointDensity, ParamValue, Parameters, PseudopotentialSelection,
    Sampling, SettingsBundle,
};
pub use structure::{Atom, Crystal, Lattice};
