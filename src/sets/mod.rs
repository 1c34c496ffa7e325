//! # 参数集解析
//!
//! 从基础模板出发，为给定结构和用户覆盖设置得到某个计算配置档的完整参数集。
//!
//! ## 依赖关系
//! - 被 `commands/` 使用
//! - 使用 `models/`
//! - 子模块: composition, registry, profiles, invariants, engine, finalize, atat

pub mod atat;
pub mod composition;
pub mod engine;
pub mod finalize;
pub mod invariants;
pub mod profiles;
pub mod registry;

pub use atat::AtatIdSettings;
pub use composition::PhysicalDefaults;
pub use engine::{resolve, ResolvedProfile, Resolver};
pub use finalize::FinalizedInput;
pub use profiles::{ProfileDefinition, ProfileKind, PROFILES};
pub use registry::{TemplateRegistry, MP_RELAX_SET};
