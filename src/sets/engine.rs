//! # 覆盖解析引擎
//!
//! 把基础模板、配置档基线、由成分推导的默认值、用户覆盖和命名覆盖组合并为一个参数集。
//!
//! ## 解析顺序
//! 1. 基础模板（深拷贝）
//! 2. 配置档基线：删键/替换、基线参数、赝势修改、默认 k 点密度
//! 3. 自旋极化默认值与磁矩清理
//! 4. 弛豫模式互斥检查（仅 relax）
//! 5. 命名覆盖组，带键专属变换
//! 6. 剩余用户覆盖
//! 7. 配置档不变量
//! 8. 赝势泛函覆盖
//!
//! 后面的步骤可以覆盖或删除前面步骤写入的键。每一步都接收并返回完整的 `Resolution`。
//!
//! ## 依赖关系
//! - 使用 `sets/profiles.rs`, `sets/invariants.rs`, `sets/composition.rs`, `sets/registry.rs`
//! - 被 `commands/` 调用

use crate::error::{Result, SetsError};
use crate::models::{
    normalize_key, Crystal, OverrideSet, ParamValue, ProfileOptions, Sampling, SettingsBundle,
};
use crate::sets::composition::PhysicalDefaults;
use crate::sets::invariants::{self, ISIF_KEY, MOMENT_KEY, PRECISION_KEY, SPIN_KEY};
use crate::sets::profiles::{ProfileDefinition, ProfileKind, FUNCTIONAL, POTCAR_UPDATES};
use crate::sets::registry::TemplateRegistry;

use tracing::debug;

/// 覆盖组中的采样键
const DENSITY_KEY: &str = "grid_density";
const MESH_KEY: &str = "k_mesh";
const PRECISION_GROUP_KEY: &str = "prec";

/// 解析结果
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedProfile {
    pub profile: ProfileKind,
    pub bundle: SettingsBundle,
    /// 写出 KPOINTS 时使用 Γ 中心网格
    pub force_gamma: bool,
    pub defaults: PhysicalDefaults,
}

/// 解析过程中的状态：正在构建的参数集 + 尚未应用的用户覆盖
#[derive(Debug, Clone)]
pub struct Resolution {
    pub bundle: SettingsBundle,
    pub pending: OverrideSet,
}

impl Resolution {
    fn new(base: &SettingsBundle, overrides: &OverrideSet) -> Self {
        let mut pending = overrides.clone();
        pending.parameters = overrides
            .parameters
            .iter()
            .map(|(k, v)| (normalize_key(k), v.clone()))
            .collect();
        Resolution {
            bundle: base.clone(),
            pending,
        }
    }
}

/// 单次解析的只读上下文
pub struct Context<'a> {
    pub profile: &'static ProfileDefinition,
    pub structure: &'a Crystal,
    pub options: ProfileOptions,
    pub defaults: PhysicalDefaults,
}

type Step = fn(Resolution, &Context) -> Result<Resolution>;

/// 基础模板之后的解析步骤，按顺序执行
pub const PIPELINE: [(&str, Step); 7] = [
    ("baseline", apply_baseline),
    ("spin", apply_spin_default),
    ("relaxation_mode", apply_relaxation_mode),
    ("override_group", apply_override_group),
    ("user", apply_user_layer),
    ("profile_invariants", apply_profile_invariants),
    ("potcar_functional", apply_potcar_functional),
];

/// 以给定基础模板解析一个配置档
pub fn resolve(
    base: &SettingsBundle,
    profile: ProfileKind,
    structure: &Crystal,
    overrides: &OverrideSet,
    options: ProfileOptions,
) -> Result<ResolvedProfile> {
    let definition = profile.definition();
    let ctx = Context {
        profile: definition,
        structure,
        options,
        defaults: PhysicalDefaults::classify(structure),
    };

    let mut state = Resolution::new(base, overrides);
    for (name, step) in PIPELINE.iter() {
        state = step(state, &ctx)?;
        debug!(
            profile = %profile,
            structure = %structure.name,
            step = name,
            parameters = state.bundle.parameters.len(),
            "applied resolution step"
        );
    }

    Ok(ResolvedProfile {
        profile,
        bundle: state.bundle,
        force_gamma: definition.force_gamma,
        defaults: ctx.defaults,
    })
}

/// 通过模板注册表解析配置档
pub struct Resolver<'r> {
    registry: &'r TemplateRegistry,
}

impl<'r> Resolver<'r> {
    pub fn new(registry: &'r TemplateRegistry) -> Self {
        Resolver { registry }
    }

    pub fn resolve(
        &self,
        profile: ProfileKind,
        structure: &Crystal,
        overrides: &OverrideSet,
        options: ProfileOptions,
    ) -> Result<ResolvedProfile> {
        let base = self.registry.get(profile.definition().template)?;
        resolve(&base, profile, structure, overrides, options)
    }

    /// 按名称解析，未知名称返回 `UnknownProfile`
    pub fn resolve_named(
        &self,
        profile: &str,
        structure: &Crystal,
        overrides: &OverrideSet,
        options: ProfileOptions,
    ) -> Result<ResolvedProfile> {
        self.resolve(profile.parse()?, structure, overrides, options)
    }
}

// ─────────────────────────────────────────────────────────────
// 解析步骤
// ─────────────────────────────────────────────────────────────

fn apply_baseline(mut state: Resolution, ctx: &Context) -> Result<Resolution> {
    let profile = ctx.profile;
    let bundle = &mut state.bundle;

    if profile.replace_parameters {
        bundle.parameters.clear();
    }
    for key in profile.remove {
        bundle.remove(key);
    }
    for (key, lit) in profile.baseline {
        bundle.set(key, lit.to_value());
    }

    bundle.pseudopotentials.functional = FUNCTIONAL.to_string();
    for (element, variant) in POTCAR_UPDATES {
        bundle
            .pseudopotentials
            .variants
            .insert(element.to_string(), variant.to_string());
    }

    let density = state
        .pending
        .kpoint_density
        .unwrap_or_else(|| profile.sampling.density(ctx.defaults.is_metallic));
    bundle.sampling = Sampling::per_atom(density);

    if let Some(isif) = profile.default_isif {
        state.pending.parameters.insert(
            ISIF_KEY.to_string(),
            ParamValue::Int(ctx.options.isif.unwrap_or(isif)),
        );
    }

    Ok(state)
}

fn apply_spin_default(mut state: Resolution, ctx: &Context) -> Result<Resolution> {
    let user = &mut state.pending.parameters;

    if !user.contains_key(SPIN_KEY) {
        let ispin = if ctx.defaults.is_magnetic { 2 } else { 1 };
        user.insert(SPIN_KEY.to_string(), ParamValue::Int(ispin));
    }

    if user.contains_key(MOMENT_KEY) {
        // 用户给出的磁矩取代模板中的磁矩
        state.bundle.remove(MOMENT_KEY);
    }
    // 非自旋极化时两层中的磁矩都删除
    if user.get(SPIN_KEY).and_then(ParamValue::as_i64) == Some(1) {
        invariants::drop_moments(&mut state.bundle.parameters, user);
    }

    Ok(state)
}

/// ISIF 大于 4 时原子位置不弛豫
fn position_relax_disabled(options: &ProfileOptions) -> bool {
    options.volume_relax || options.isif.map(|isif| isif > 4).unwrap_or(false)
}

fn apply_relaxation_mode(mut state: Resolution, ctx: &Context) -> Result<Resolution> {
    if !ctx.profile.relax_guard {
        return Ok(state);
    }
    let options = &ctx.options;

    if let (true, Some(isif)) = (options.volume_relax, options.isif) {
        return Err(SetsError::ConfigurationConflict {
            profile: ctx.profile.kind.to_string(),
            reason: format!(
                "isif = {} cannot be combined with volume-only relaxation (ISIF = 7)",
                isif
            ),
        });
    }

    if position_relax_disabled(options) {
        let pending = &mut state.pending;
        let removed = invariants::strip_force_criterion(
            &mut pending.parameters,
            pending
                .settings
                .values_mut()
                .chain(pending.inline_groups.values_mut()),
        );
        if removed > 0 {
            debug!(removed, "dropped force criterion without position relaxation");
        }
    }

    let isif = if options.volume_relax {
        Some(7)
    } else {
        options.isif
    };
    if let Some(isif) = isif {
        state
            .pending
            .parameters
            .insert(ISIF_KEY.to_string(), ParamValue::Int(isif));
    }

    Ok(state)
}

fn apply_override_group(mut state: Resolution, ctx: &Context) -> Result<Resolution> {
    let group = ctx
        .profile
        .group
        .and_then(|name| state.pending.group(name))
        .cloned();

    match group {
        Some(group) => {
            for (key, value) in group.iter() {
                apply_group_entry(&mut state.bundle, key, value)?;
            }
        }
        None => {
            if let Some(mesh) = ctx.profile.fallback_mesh {
                state.bundle.sampling = Sampling::Mesh(mesh);
            }
        }
    }

    Ok(state)
}

/// 覆盖组条目的键专属变换
fn apply_group_entry(bundle: &mut SettingsBundle, key: &str, value: &ParamValue) -> Result<()> {
    if key.eq_ignore_ascii_case(PRECISION_GROUP_KEY) {
        invariants::evict_cutoff(&mut bundle.parameters);
        bundle.set(PRECISION_KEY, value.clone());
    } else if key == DENSITY_KEY {
        bundle.sampling = Sampling::per_atom(parse_density(key, value)?);
    } else if key == MESH_KEY {
        bundle.sampling = Sampling::Mesh(parse_mesh(key, value)?);
    } else {
        bundle.set(key, value.clone());
    }
    Ok(())
}

fn parse_density(key: &str, value: &ParamValue) -> Result<f64> {
    match value.as_f64() {
        Some(d) if d > 0.0 => Ok(d),
        _ => Err(SetsError::MalformedSampling {
            key: key.to_string(),
            reason: format!("expected a positive density, got '{}'", value),
        }),
    }
}

/// 接受 `[a, b, c]` 或 `[[a, b, c]]`
fn parse_mesh(key: &str, value: &ParamValue) -> Result<[u32; 3]> {
    let malformed = |reason: String| SetsError::MalformedSampling {
        key: key.to_string(),
        reason,
    };

    let items = match value {
        ParamValue::List(items) => match items.as_slice() {
            [ParamValue::List(inner)] => inner,
            _ => items,
        },
        other => {
            return Err(malformed(format!(
                "expected three integers, got '{}'",
                other
            )))
        }
    };

    if items.len() != 3 {
        return Err(malformed(format!(
            "expected three integers, got {} value(s)",
            items.len()
        )));
    }

    let mut mesh = [0u32; 3];
    for (slot, item) in mesh.iter_mut().zip(items) {
        *slot = match item.as_i64() {
            Some(n) if n >= 1 && n <= u32::MAX as i64 => n as u32,
            _ => {
                return Err(malformed(format!(
                    "mesh divisions must be positive integers, got '{}'",
                    item
                )))
            }
        };
    }
    Ok(mesh)
}

fn apply_user_layer(mut state: Resolution, _ctx: &Context) -> Result<Resolution> {
    for (key, value) in &state.pending.parameters {
        state.bundle.parameters.insert(key.clone(), value.clone());
    }
    Ok(state)
}

fn apply_profile_invariants(mut state: Resolution, ctx: &Context) -> Result<Resolution> {
    let params = &mut state.bundle.parameters;
    if ctx.profile.calceps_replaces_lepsilon {
        invariants::evict_dielectric_for_calceps(params, &state.pending.parameters);
    }
    if ctx.profile.tetrahedron_drops_sigma {
        invariants::drop_sigma_for_tetrahedron(params);
    }
    Ok(state)
}

fn apply_potcar_functional(mut state: Resolution, _ctx: &Context) -> Result<Resolution> {
    if let Some(functional) = &state.pending.potcar_functional {
        state.bundle.pseudopotentials.functional = functional.clone();
    }
    Ok(state)
}
