//! # 结构绑定的最终参数
//!
//! 把解析结果与具体结构结合，得到写出器可以直接使用的扁平参数：
//! - `EDIFF_PER_ATOM` 换算为 `EDIFF`（已有 `EDIFF` 时只删除前者）
//! - 以元素为键的 `MAGMOM` 表展开为逐原子列表
//! - 按原子出现顺序列出每种元素的赝势符号
//!
//! ## 依赖关系
//! - 扩展 `sets/engine.rs` 的 `ResolvedProfile`
//! - 被 `commands/resolve.rs` 调用

use crate::models::{Crystal, ParamValue, Parameters, Sampling};
use crate::sets::engine::ResolvedProfile;
use crate::sets::invariants::MOMENT_KEY;

use std::fmt::Write as _;

const EDIFF_KEY: &str = "EDIFF";
const EDIFF_PER_ATOM_KEY: &str = "EDIFF_PER_ATOM";

/// 磁矩表中没有登记的元素使用的初始磁矩
pub const DEFAULT_MOMENT: f64 = 0.6;

/// 写出器所需的全部输入
#[derive(Debug, Clone, PartialEq)]
pub struct FinalizedInput {
    pub parameters: Parameters,
    pub sampling: Sampling,
    pub force_gamma: bool,
    pub functional: String,
    /// 每种元素一个赝势符号，顺序与结构中元素首次出现的顺序一致
    pub potcar_symbols: Vec<String>,
}

impl FinalizedInput {
    /// INCAR 文本，键按字母序
    pub fn to_incar_string(&self) -> String {
        let mut out = String::new();
        for (key, value) in &self.parameters {
            let _ = writeln!(out, "{} = {}", key, value);
        }
        out
    }
}

impl ResolvedProfile {
    pub fn finalize(&self, structure: &Crystal) -> FinalizedInput {
        let mut parameters = self.bundle.parameters.clone();

        if let Some(per_atom) = parameters.remove(EDIFF_PER_ATOM_KEY) {
            if !parameters.contains_key(EDIFF_KEY) {
                if let Some(v) = per_atom.as_f64() {
                    let ediff = v * structure.num_sites() as f64;
                    parameters.insert(EDIFF_KEY.to_string(), ParamValue::Float(ediff));
                }
            }
        }

        if let Some(ParamValue::Table(moments)) = parameters.get(MOMENT_KEY) {
            let per_site = site_moments(structure, |element| {
                moments.get(element).and_then(ParamValue::as_f64)
            });
            parameters.insert(MOMENT_KEY.to_string(), per_site);
        }

        let pseudopotentials = &self.bundle.pseudopotentials;
        let potcar_symbols = structure
            .species()
            .into_iter()
            .map(|element| pseudopotentials.variant_for(element).to_string())
            .collect();

        FinalizedInput {
            parameters,
            sampling: self.bundle.sampling.clone(),
            force_gamma: self.force_gamma,
            functional: pseudopotentials.functional.clone(),
            potcar_symbols,
        }
    }
}

fn site_moments(structure: &Crystal, lookup: impl Fn(&str) -> Option<f64>) -> ParamValue {
    ParamValue::List(
        structure
            .atoms
            .iter()
            .map(|atom| ParamValue::Float(lookup(&atom.element).unwrap_or(DEFAULT_MOMENT)))
            .collect(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Atom, Lattice, OverrideSet, ProfileOptions};
    use crate::sets::engine::resolve;
    use crate::sets::profiles::ProfileKind;
    use crate::sets::registry::{TemplateRegistry, MP_RELAX_SET};

    fn crystal(elements: &[&str]) -> Crystal {
        let lattice = Lattice::from_vectors([[5.0, 0.0, 0.0], [0.0, 5.0, 0.0], [0.0, 0.0, 5.0]]);
        let atoms = elements
            .iter()
            .enumerate()
            .map(|(i, e)| Atom::new(*e, [0.0, 0.0, 0.2 * i as f64]))
            .collect();
        Crystal::new("test", lattice, atoms)
    }

    fn resolved(profile: ProfileKind, structure: &Crystal, overrides: &OverrideSet) -> ResolvedProfile {
        let base = TemplateRegistry::builtin()
            .unwrap()
            .get(MP_RELAX_SET)
            .unwrap();
        resolve(&base, profile, structure, overrides, ProfileOptions::default()).unwrap()
    }

    #[test]
    fn test_ediff_per_atom_is_scaled() {
        let structure = crystal(&["Si", "Si", "Si", "Si"]);
        let input = resolved(ProfileKind::Static, &structure, &OverrideSet::new()).finalize(&structure);

        assert!(!input.parameters.contains_key("EDIFF_PER_ATOM"));
        let ediff = input.parameters["EDIFF"].as_f64().unwrap();
        assert!((ediff - 4e-6).abs() < 1e-15);
    }

    #[test]
    fn test_explicit_ediff_wins() {
        let structure = crystal(&["Si", "Si"]);
        let overrides = OverrideSet::new().with_parameter("EDIFF", 1e-4);
        let input = resolved(ProfileKind::Static, &structure, &overrides).finalize(&structure);

        assert_eq!(input.parameters["EDIFF"], ParamValue::Float(1e-4));
        assert!(!input.parameters.contains_key("EDIFF_PER_ATOM"));
    }

    #[test]
    fn test_moment_table_expands_per_site() {
        let structure = crystal(&["Fe", "O", "Fe"]);
        let input = resolved(ProfileKind::Relax, &structure, &OverrideSet::new()).finalize(&structure);

        assert_eq!(
            input.parameters["MAGMOM"],
            ParamValue::List(vec![
                ParamValue::Float(5.0),
                ParamValue::Float(DEFAULT_MOMENT),
                ParamValue::Float(5.0),
            ])
        );
    }

    #[test]
    fn test_moment_list_is_kept() {
        let structure = crystal(&["Fe", "Fe"]);
        let moments = ParamValue::parse_loose("3,-3");
        let overrides = OverrideSet::new().with_parameter("MAGMOM", moments.clone());
        let input = resolved(ProfileKind::Static, &structure, &overrides).finalize(&structure);
        assert_eq!(input.parameters["MAGMOM"], moments);
    }

    #[test]
    fn test_potcar_symbols_in_site_order() {
        let structure = crystal(&["O", "Ti", "O", "Fe"]);
        let input = resolved(ProfileKind::Forces, &structure, &OverrideSet::new()).finalize(&structure);
        assert_eq!(input.potcar_symbols, vec!["O", "Ti_sv", "Fe_pv"]);
        assert_eq!(input.functional, "PBE");
    }

    #[test]
    fn test_incar_string() {
        let structure = crystal(&["Si"]);
        let input = resolved(ProfileKind::ForceConstants, &structure, &OverrideSet::new())
            .finalize(&structure);
        let incar = input.to_incar_string();

        assert!(incar.contains("IBRION = 6\n"));
        assert!(incar.contains("LREAL = .FALSE.\n"));
        assert!(input.force_gamma);
    }
}
