//! # 配置档定义
//!
//! 七种计算配置档的声明式表格。每个配置档给出：基础模板名、表达物理意图的基线参数、
//! 默认 k 点采样、可识别的覆盖组名，以及少量只属于该配置档的开关。
//! 所有配置档共用同一个解析引擎。
//!
//! ## 依赖关系
//! - 被 `sets/engine.rs` 读取
//! - 被 `cli/` 用作命令行枚举
//! - 使用 `models/settings.rs`

use crate::error::SetsError;
use crate::models::ParamValue;
use crate::sets::registry::MP_RELAX_SET;

use std::fmt;
use std::str::FromStr;

/// 配置档种类
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ProfileKind {
    Relax,
    PreStatic,
    ForceConstants,
    Static,
    Forces,
    BornCharge,
    Elastic,
}

impl ProfileKind {
    pub const ALL: [ProfileKind; 7] = [
        ProfileKind::Relax,
        ProfileKind::PreStatic,
        ProfileKind::ForceConstants,
        ProfileKind::Static,
        ProfileKind::Forces,
        ProfileKind::BornCharge,
        ProfileKind::Elastic,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            ProfileKind::Relax => "relax",
            ProfileKind::PreStatic => "prestatic",
            ProfileKind::ForceConstants => "forceconstants",
            ProfileKind::Static => "static",
            ProfileKind::Forces => "forces",
            ProfileKind::BornCharge => "born",
            ProfileKind::Elastic => "elastic",
        }
    }

    pub fn definition(&self) -> &'static ProfileDefinition {
        // PROFILES 与 ALL 顺序一致
        &PROFILES[*self as usize]
    }
}

impl fmt::Display for ProfileKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for ProfileKind {
    type Err = SetsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key: String = s
            .trim()
            .to_lowercase()
            .chars()
            .filter(|c| *c != '-' && *c != '_')
            .collect();
        match key.as_str() {
            "relax" | "relaxation" => Ok(ProfileKind::Relax),
            "prestatic" => Ok(ProfileKind::PreStatic),
            "forceconstants" | "forceconstant" | "fc" => Ok(ProfileKind::ForceConstants),
            "static" => Ok(ProfileKind::Static),
            "forces" => Ok(ProfileKind::Forces),
            "born" | "borncharge" => Ok(ProfileKind::BornCharge),
            "elastic" => Ok(ProfileKind::Elastic),
            _ => Err(SetsError::UnknownProfile(s.to_string())),
        }
    }
}

/// 基线参数字面量
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Lit {
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(&'static str),
}

impl Lit {
    pub fn to_value(self) -> ParamValue {
        match self {
            Lit::Bool(v) => ParamValue::Bool(v),
            Lit::Int(v) => ParamValue::Int(v),
            Lit::Float(v) => ParamValue::Float(v),
            Lit::Text(v) => ParamValue::Text(v.to_string()),
        }
    }
}

/// 默认 k 点密度（每倒易原子）
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SamplingDefault {
    PerAtom(f64),
    /// 全金属结构使用更密的采样
    ByComposition { metallic: f64, other: f64 },
}

impl SamplingDefault {
    pub fn density(&self, is_metallic: bool) -> f64 {
        match *self {
            SamplingDefault::PerAtom(d) => d,
            SamplingDefault::ByComposition { metallic, other } => {
                if is_metallic {
                    metallic
                } else {
                    other
                }
            }
        }
    }
}

/// 单个配置档的定义
#[derive(Debug)]
pub struct ProfileDefinition {
    pub kind: ProfileKind,
    pub description: &'static str,
    pub template: &'static str,
    /// 丢弃模板中的全部 INCAR 参数，只保留基线
    pub replace_parameters: bool,
    pub remove: &'static [&'static str],
    pub baseline: &'static [(&'static str, Lit)],
    pub sampling: SamplingDefault,
    pub group: Option<&'static str>,
    /// 未提供覆盖组时使用的显式网格
    pub fallback_mesh: Option<[u32; 3]>,
    /// 提示写出器使用 Γ 中心网格
    pub force_gamma: bool,
    /// 未显式指定时写入的 ISIF
    pub default_isif: Option<i64>,
    /// 检查体积弛豫与 ISIF 的互斥，并处理 EDIFFG
    pub relax_guard: bool,
    pub tetrahedron_drops_sigma: bool,
    pub calceps_replaces_lepsilon: bool,
}

/// 所有配置档的赝势泛函族
pub const FUNCTIONAL: &str = "PBE";

/// 对模板赝势选择的统一修改
pub const POTCAR_UPDATES: [(&str, &str); 5] = [
    ("Cu", "Cu"),
    ("Mo", "Mo_sv"),
    ("Nb", "Nb_sv"),
    ("Ti", "Ti_sv"),
    ("V", "V_sv"),
];

pub static PROFILES: [ProfileDefinition; 7] = [
    ProfileDefinition {
        kind: ProfileKind::Relax,
        description: "Full cell and ionic relaxation with Methfessel-Paxton smearing",
        template: MP_RELAX_SET,
        replace_parameters: false,
        remove: &[],
        baseline: &[
            ("EDIFF_PER_ATOM", Lit::Float(1e-7)),
            ("ISMEAR", Lit::Int(1)),
            ("SIGMA", Lit::Float(0.2)),
            ("LREAL", Lit::Bool(false)),
            ("PREC", Lit::Text("Accurate")),
            ("ALGO", Lit::Text("NORMAL")),
            ("LORBIT", Lit::Int(11)),
            ("LWAVE", Lit::Bool(false)),
            ("LCHARG", Lit::Bool(false)),
            ("ISIF", Lit::Int(3)),
            ("ICHARG", Lit::Int(2)),
            ("ENCUT", Lit::Int(520)),
        ],
        sampling: SamplingDefault::PerAtom(8000.0),
        group: Some("Relax_settings"),
        fallback_mesh: None,
        force_gamma: false,
        default_isif: None,
        relax_guard: true,
        tetrahedron_drops_sigma: false,
        calceps_replaces_lepsilon: false,
    },
    ProfileDefinition {
        kind: ProfileKind::PreStatic,
        description: "Coarse fixed-geometry run writing charge and potential analysis data",
        template: MP_RELAX_SET,
        replace_parameters: false,
        remove: &[],
        baseline: &[
            ("EDIFF_PER_ATOM", Lit::Float(1e-5)),
            ("ENCUT", Lit::Int(520)),
            ("ISMEAR", Lit::Int(1)),
            ("NSW", Lit::Int(0)),
            ("IBRION", Lit::Int(-1)),
            ("LREAL", Lit::Bool(false)),
            ("ALGO", Lit::Text("NORMAL")),
            ("LAECHG", Lit::Bool(true)),
            ("LCHARG", Lit::Bool(false)),
            ("LWAVE", Lit::Bool(false)),
            ("LORBIT", Lit::Int(11)),
            ("LVHAR", Lit::Bool(true)),
            ("ICHARG", Lit::Int(2)),
            ("NEDOS", Lit::Int(5001)),
        ],
        sampling: SamplingDefault::PerAtom(1000.0),
        group: Some("PreStatic_settings"),
        fallback_mesh: None,
        force_gamma: false,
        default_isif: None,
        relax_guard: false,
        tetrahedron_drops_sigma: false,
        calceps_replaces_lepsilon: false,
    },
    ProfileDefinition {
        kind: ProfileKind::ForceConstants,
        description: "Symmetry-reduced finite-difference force constants",
        template: MP_RELAX_SET,
        replace_parameters: false,
        remove: &["ENCUT"],
        baseline: &[
            ("EDIFF", Lit::Float(5e-7)),
            ("ISMEAR", Lit::Int(1)),
            ("SIGMA", Lit::Float(0.2)),
            ("LREAL", Lit::Bool(false)),
            ("LORBIT", Lit::Int(11)),
            ("ISIF", Lit::Int(2)),
            ("IBRION", Lit::Int(6)),
            ("POTIM", Lit::Float(0.015)),
            ("NFREE", Lit::Int(2)),
            ("NSW", Lit::Int(1)),
            ("PREC", Lit::Text("Accurate")),
            ("ALGO", Lit::Text("Fast")),
            ("SYMPREC", Lit::Float(1e-4)),
            ("ICHARG", Lit::Int(2)),
        ],
        sampling: SamplingDefault::PerAtom(8000.0),
        group: Some("Forceconstant_settings"),
        fallback_mesh: Some([3, 3, 3]),
        force_gamma: true,
        default_isif: None,
        relax_guard: false,
        tetrahedron_drops_sigma: false,
        calceps_replaces_lepsilon: false,
    },
    ProfileDefinition {
        kind: ProfileKind::Static,
        description: "Dense fixed-geometry run with tetrahedron smearing, charge density kept",
        template: MP_RELAX_SET,
        replace_parameters: false,
        remove: &[],
        baseline: &[
            ("EDIFF_PER_ATOM", Lit::Float(1e-6)),
            ("ENCUT", Lit::Int(520)),
            ("ISMEAR", Lit::Int(-5)),
            ("NSW", Lit::Int(0)),
            ("IBRION", Lit::Int(-1)),
            ("LREAL", Lit::Bool(false)),
            ("ALGO", Lit::Text("NORMAL")),
            ("LAECHG", Lit::Bool(true)),
            ("LCHARG", Lit::Bool(true)),
            ("LWAVE", Lit::Bool(false)),
            ("LORBIT", Lit::Int(11)),
            ("LVHAR", Lit::Bool(true)),
            ("ICHARG", Lit::Int(2)),
            ("NEDOS", Lit::Int(5001)),
        ],
        sampling: SamplingDefault::PerAtom(8000.0),
        group: Some("Static_settings"),
        fallback_mesh: None,
        force_gamma: false,
        default_isif: Some(2),
        relax_guard: false,
        tetrahedron_drops_sigma: false,
        calceps_replaces_lepsilon: false,
    },
    ProfileDefinition {
        kind: ProfileKind::Forces,
        description: "Very tightly converged forces with Gaussian smearing",
        template: MP_RELAX_SET,
        replace_parameters: false,
        remove: &["ENCUT"],
        baseline: &[
            ("EDIFF_PER_ATOM", Lit::Float(1e-8)),
            ("ISMEAR", Lit::Int(0)),
            ("SIGMA", Lit::Float(0.05)),
            ("NSW", Lit::Int(0)),
            ("IBRION", Lit::Int(-1)),
            ("LREAL", Lit::Bool(false)),
            ("ALGO", Lit::Text("NORMAL")),
            ("LCHARG", Lit::Bool(false)),
            ("LORBIT", Lit::Int(11)),
            ("LVHAR", Lit::Bool(true)),
            ("LWAVE", Lit::Bool(false)),
            ("ICHARG", Lit::Int(2)),
            ("NEDOS", Lit::Int(5001)),
        ],
        sampling: SamplingDefault::PerAtom(8000.0),
        group: None,
        fallback_mesh: None,
        force_gamma: false,
        default_isif: None,
        relax_guard: false,
        tetrahedron_drops_sigma: false,
        calceps_replaces_lepsilon: false,
    },
    ProfileDefinition {
        kind: ProfileKind::BornCharge,
        description: "Dielectric tensor and Born effective charges from linear response",
        template: MP_RELAX_SET,
        replace_parameters: false,
        remove: &[],
        baseline: &[
            ("LEPSILON", Lit::Bool(true)),
            ("NCORE", Lit::Int(1)),
            ("LRPA", Lit::Bool(false)),
            ("EDIFF_PER_ATOM", Lit::Float(1e-6)),
            ("ISMEAR", Lit::Int(0)),
            ("NSW", Lit::Int(0)),
            ("LORBIT", Lit::Int(11)),
            ("IBRION", Lit::Int(-1)),
            ("LREAL", Lit::Bool(false)),
            ("ALGO", Lit::Text("NORMAL")),
            ("LCHARG", Lit::Bool(false)),
            ("LWAVE", Lit::Bool(false)),
            ("ICHARG", Lit::Int(2)),
            ("PREC", Lit::Text("High")),
        ],
        sampling: SamplingDefault::PerAtom(8000.0),
        group: Some("Born_settings"),
        fallback_mesh: None,
        force_gamma: false,
        default_isif: None,
        relax_guard: false,
        tetrahedron_drops_sigma: true,
        calceps_replaces_lepsilon: true,
    },
    ProfileDefinition {
        kind: ProfileKind::Elastic,
        description: "Strained-cell stress relaxation for elastic constants",
        template: MP_RELAX_SET,
        replace_parameters: true,
        remove: &[],
        baseline: &[
            ("EDIFF", Lit::Float(1e-6)),
            ("ISMEAR", Lit::Int(-5)),
            ("IBRION", Lit::Int(2)),
            ("LREAL", Lit::Bool(false)),
            ("ALGO", Lit::Text("NORMAL")),
            ("LAECHG", Lit::Bool(true)),
            ("LCHARG", Lit::Bool(true)),
            ("LWAVE", Lit::Bool(false)),
            ("LORBIT", Lit::Int(11)),
            ("LVHAR", Lit::Bool(true)),
            ("ICHARG", Lit::Int(0)),
            ("NSW", Lit::Int(99)),
            ("ISPIN", Lit::Int(2)),
            ("ISIF", Lit::Int(2)),
            ("PREC", Lit::Text("High")),
        ],
        sampling: SamplingDefault::ByComposition {
            metallic: 15625.0,
            other: 8000.0,
        },
        group: Some("Elastic_settings"),
        fallback_mesh: None,
        force_gamma: false,
        default_isif: None,
        relax_guard: false,
        tetrahedron_drops_sigma: true,
        calceps_replaces_lepsilon: false,
    },
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_order_matches_kinds() {
        for kind in ProfileKind::ALL {
            assert_eq!(kind.definition().kind, kind);
        }
    }

    #[test]
    fn test_parse_profile_names() {
        assert_eq!("Relax".parse::<ProfileKind>().unwrap(), ProfileKind::Relax);
        assert_eq!("pre-static".parse::<ProfileKind>().unwrap(), ProfileKind::PreStatic);
        assert_eq!(
            "force_constants".parse::<ProfileKind>().unwrap(),
            ProfileKind::ForceConstants
        );
        assert_eq!("born-charge".parse::<ProfileKind>().unwrap(), ProfileKind::BornCharge);
        for kind in ProfileKind::ALL {
            assert_eq!(kind.name().parse::<ProfileKind>().unwrap(), kind);
        }
    }

    #[test]
    fn test_unknown_profile() {
        let err = "phonon".parse::<ProfileKind>().unwrap_err();
        assert!(matches!(err, SetsError::UnknownProfile(name) if name == "phonon"));
    }

    #[test]
    fn test_elastic_density_depends_on_composition() {
        let sampling = ProfileKind::Elastic.definition().sampling;
        assert_eq!(sampling.density(true), 15625.0);
        assert_eq!(sampling.density(false), 8000.0);
        assert!(sampling.density(true) > sampling.density(false));
    }

    #[test]
    fn test_group_names() {
        assert_eq!(ProfileKind::Relax.definition().group, Some("Relax_settings"));
        assert_eq!(
            ProfileKind::ForceConstants.definition().group,
            Some("Forceconstant_settings")
        );
        assert_eq!(ProfileKind::Forces.definition().group, None);
    }
}
