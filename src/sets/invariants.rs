//! # 参数集不变量
//!
//! 解析各层调用的具名删键规则。每条规则只做一件事，可单独测试。
//!
//! ## 依赖关系
//! - 被 `sets/engine.rs` 调用
//! - 使用 `models/settings.rs`, `models/overrides.rs`

use crate::models::{OverrideGroup, ParamValue, Parameters};

pub const CUTOFF_KEY: &str = "ENCUT";
pub const PRECISION_KEY: &str = "PREC";
pub const SPIN_KEY: &str = "ISPIN";
pub const MOMENT_KEY: &str = "MAGMOM";
pub const ISIF_KEY: &str = "ISIF";
pub const FORCE_CRITERION_KEY: &str = "EDIFFG";
pub const SMEARING_KEY: &str = "ISMEAR";
pub const SIGMA_KEY: &str = "SIGMA";
pub const DIELECTRIC_KEY: &str = "LEPSILON";
pub const CALCEPS_KEY: &str = "LCALCEPS";

/// 四面体方法对应的 ISMEAR
pub const TETRAHEDRON_SMEARING: i64 = -5;

/// 精度设定隐含截断能：删除显式 ENCUT
pub fn evict_cutoff(params: &mut Parameters) -> bool {
    params.remove(CUTOFF_KEY).is_some()
}

/// 非自旋极化时从参数集和用户层同时删除磁矩
pub fn drop_moments(params: &mut Parameters, user: &mut Parameters) -> bool {
    let from_bundle = params.remove(MOMENT_KEY).is_some();
    let from_user = user.remove(MOMENT_KEY).is_some();
    from_bundle || from_user
}

/// 不弛豫原子位置时 EDIFFG 无意义：从用户层和所有覆盖组中删除，返回删除的条目数
pub fn strip_force_criterion<'a>(
    user: &mut Parameters,
    groups: impl IntoIterator<Item = &'a mut OverrideGroup>,
) -> usize {
    let mut removed = usize::from(user.remove(FORCE_CRITERION_KEY).is_some());
    for group in groups {
        removed += group.remove(FORCE_CRITERION_KEY);
    }
    removed
}

/// 四面体方法不使用展宽：ISMEAR = -5 时删除 SIGMA
pub fn drop_sigma_for_tetrahedron(params: &mut Parameters) -> bool {
    let tetrahedron = params
        .get(SMEARING_KEY)
        .and_then(ParamValue::as_i64)
        .map(|v| v == TETRAHEDRON_SMEARING)
        .unwrap_or(false);
    tetrahedron && params.remove(SIGMA_KEY).is_some()
}

/// 用户要求 LCALCEPS 时删除 LEPSILON，两种介电响应方式不共存
pub fn evict_dielectric_for_calceps(params: &mut Parameters, user: &Parameters) -> bool {
    user.contains_key(CALCEPS_KEY) && params.remove(DIELECTRIC_KEY).is_some()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(entries: &[(&str, ParamValue)]) -> Parameters {
        entries
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn test_evict_cutoff() {
        let mut p = params(&[("ENCUT", ParamValue::Int(520)), ("PREC", "Accurate".into())]);
        assert!(evict_cutoff(&mut p));
        assert!(!p.contains_key("ENCUT"));
        assert!(p.contains_key("PREC"));
        assert!(!evict_cutoff(&mut p));
    }

    #[test]
    fn test_drop_moments_from_both_layers() {
        let mut bundle = params(&[("MAGMOM", ParamValue::List(vec![ParamValue::Float(5.0)]))]);
        let mut user = params(&[("MAGMOM", ParamValue::List(vec![ParamValue::Float(1.0)]))]);
        assert!(drop_moments(&mut bundle, &mut user));
        assert!(bundle.is_empty());
        assert!(user.is_empty());
    }

    #[test]
    fn test_strip_force_criterion() {
        let mut user = params(&[("EDIFFG", ParamValue::Float(-0.01))]);
        let mut relax = OverrideGroup::new().with("EDIFFG", -0.02).with("NSW", 40i64);
        let mut other = OverrideGroup::new().with("ediffg", -0.03);

        let removed = strip_force_criterion(&mut user, [&mut relax, &mut other]);
        assert_eq!(removed, 3);
        assert!(user.is_empty());
        assert_eq!(relax.len(), 1);
        assert!(other.is_empty());
    }

    #[test]
    fn test_drop_sigma_only_for_tetrahedron() {
        let mut tetra = params(&[("ISMEAR", ParamValue::Int(-5)), ("SIGMA", ParamValue::Float(0.05))]);
        assert!(drop_sigma_for_tetrahedron(&mut tetra));
        assert!(!tetra.contains_key("SIGMA"));

        let mut gauss = params(&[("ISMEAR", ParamValue::Int(0)), ("SIGMA", ParamValue::Float(0.05))]);
        assert!(!drop_sigma_for_tetrahedron(&mut gauss));
        assert!(gauss.contains_key("SIGMA"));
    }

    #[test]
    fn test_calceps_evicts_lepsilon() {
        let mut bundle = params(&[("LEPSILON", ParamValue::Bool(true))]);
        let user = params(&[("LCALCEPS", ParamValue::Bool(true))]);
        assert!(evict_dielectric_for_calceps(&mut bundle, &user));
        assert!(bundle.is_empty());

        let mut untouched = params(&[("LEPSILON", ParamValue::Bool(true))]);
        assert!(!evict_dielectric_for_calceps(&mut untouched, &Parameters::new()));
        assert!(untouched.contains_key("LEPSILON"));
    }
}
