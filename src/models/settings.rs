//! # 计算参数集数据模型
//!
//! 定义参数集的三个命名空间：INCAR 参数、k 点采样、赝势选择。
//!
//! ## 依赖关系
//! - 被 `sets/` 解析引擎构建和修改
//! - 被 `commands/` 用于展示和保存
//! - 使用 `serde` 与 TOML 互转

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// INCAR 参数表
pub type Parameters = BTreeMap<String, ParamValue>;

/// 参数键统一为大写
pub fn normalize_key(key: &str) -> String {
    key.trim().to_uppercase()
}

/// 单个参数值
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    List(Vec<ParamValue>),
    /// 按元素给出的值（如基础模板中的 MAGMOM）
    Table(BTreeMap<String, ParamValue>),
}

impl ParamValue {
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            ParamValue::Int(v) => Some(*v),
            ParamValue::Float(v) if v.fract() == 0.0 => Some(*v as i64),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            ParamValue::Int(v) => Some(*v as f64),
            ParamValue::Float(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            ParamValue::Bool(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            ParamValue::Text(v) => Some(v.as_str()),
            _ => None,
        }
    }

    /// 从命令行文本推断类型
    ///
    /// `.TRUE.`/`true` 为布尔值，逗号分隔为列表，其余依次尝试整数、浮点数、文本。
    pub fn parse_loose(text: &str) -> ParamValue {
        let trimmed = text.trim();
        if trimmed.contains(',') {
            return ParamValue::List(
                trimmed
                    .split(',')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(ParamValue::parse_loose)
                    .collect(),
            );
        }
        match trimmed.to_lowercase().as_str() {
            "true" | ".true." | "t" => return ParamValue::Bool(true),
            "false" | ".false." | "f" => return ParamValue::Bool(false),
            _ => {}
        }
        if let Ok(v) = trimmed.parse::<i64>() {
            return ParamValue::Int(v);
        }
        if let Ok(v) = trimmed.parse::<f64>() {
            return ParamValue::Float(v);
        }
        ParamValue::Text(trimmed.to_string())
    }
}

impl From<bool> for ParamValue {
    fn from(v: bool) -> Self {
        ParamValue::Bool(v)
    }
}

impl From<i64> for ParamValue {
    fn from(v: i64) -> Self {
        ParamValue::Int(v)
    }
}

impl From<f64> for ParamValue {
    fn from(v: f64) -> Self {
        ParamValue::Float(v)
    }
}

impl From<&str> for ParamValue {
    fn from(v: &str) -> Self {
        ParamValue::Text(v.to_string())
    }
}

impl From<String> for ParamValue {
    fn from(v: String) -> Self {
        ParamValue::Text(v)
    }
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamValue::Bool(true) => write!(f, ".TRUE."),
            ParamValue::Bool(false) => write!(f, ".FALSE."),
            ParamValue::Int(v) => write!(f, "{}", v),
            ParamValue::Float(v) => write!(f, "{}", v),
            ParamValue::Text(v) => write!(f, "{}", v),
            ParamValue::List(items) => {
                let parts: Vec<String> = items.iter().map(|v| v.to_string()).collect();
                write!(f, "{}", parts.join(" "))
            }
            ParamValue::Table(map) => {
                let parts: Vec<String> = map.iter().map(|(k, v)| format!("{}={}", k, v)).collect();
                write!(f, "{}", parts.join(" "))
            }
        }
    }
}

/// k 点密度的计量基准
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DensityBasis {
    /// 每倒易原子的 k 点数
    PerReciprocalAtom,
    /// 每倒易体积的 k 点数
    PerReciprocalVolume,
}

/// 标量 k 点密度
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct KpointDensity {
    pub value: f64,
    pub basis: DensityBasis,
}

/// k 点采样：密度或显式网格，二者互斥
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Sampling {
    Density(KpointDensity),
    Mesh([u32; 3]),
}

impl Sampling {
    pub fn per_atom(value: f64) -> Self {
        Sampling::Density(KpointDensity {
            value,
            basis: DensityBasis::PerReciprocalAtom,
        })
    }

    pub fn per_volume(value: f64) -> Self {
        Sampling::Density(KpointDensity {
            value,
            basis: DensityBasis::PerReciprocalVolume,
        })
    }

    pub fn density(&self) -> Option<&KpointDensity> {
        match self {
            Sampling::Density(d) => Some(d),
            Sampling::Mesh(_) => None,
        }
    }

    pub fn mesh(&self) -> Option<[u32; 3]> {
        match self {
            Sampling::Mesh(m) => Some(*m),
            Sampling::Density(_) => None,
        }
    }
}

impl fmt::Display for Sampling {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Sampling::Density(d) => match d.basis {
                DensityBasis::PerReciprocalAtom => write!(f, "{} per reciprocal atom", d.value),
                DensityBasis::PerReciprocalVolume => {
                    write!(f, "{} per reciprocal volume", d.value)
                }
            },
            Sampling::Mesh(m) => write!(f, "{}x{}x{} mesh", m[0], m[1], m[2]),
        }
    }
}

/// 赝势选择：泛函族 + 元素到赝势变体的映射
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PseudopotentialSelection {
    pub functional: String,
    #[serde(default)]
    pub variants: BTreeMap<String, String>,
}

impl PseudopotentialSelection {
    /// 查询元素的赝势变体，未登记的元素使用元素符号本身
    pub fn variant_for<'a>(&'a self, element: &'a str) -> &'a str {
        self.variants
            .get(element)
            .map(String::as_str)
            .unwrap_or(element)
    }
}

/// 完整参数集
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SettingsBundle {
    #[serde(default)]
    pub parameters: Parameters,
    pub sampling: Sampling,
    pub pseudopotentials: PseudopotentialSelection,
}

impl SettingsBundle {
    pub fn get(&self, key: &str) -> Option<&ParamValue> {
        self.parameters.get(&normalize_key(key))
    }

    pub fn contains(&self, key: &str) -> bool {
        self.parameters.contains_key(&normalize_key(key))
    }

    /// 写入参数（键转为大写），返回旧值
    pub fn set(&mut self, key: &str, value: impl Into<ParamValue>) -> Option<ParamValue> {
        self.parameters.insert(normalize_key(key), value.into())
    }

    pub fn remove(&mut self, key: &str) -> Option<ParamValue> {
        self.parameters.remove(&normalize_key(key))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bundle() -> SettingsBundle {
        SettingsBundle {
            parameters: Parameters::new(),
            sampling: Sampling::per_volume(64.0),
            pseudopotentials: PseudopotentialSelection {
                functional: "PBE".to_string(),
                variants: BTreeMap::new(),
            },
        }
    }

    #[test]
    fn test_set_normalizes_keys() {
        let mut b = bundle();
        b.set("prec", "High");
        assert!(b.contains("PREC"));
        assert_eq!(b.get("Prec"), Some(&ParamValue::Text("High".to_string())));
        assert!(b.remove("PREC").is_some());
        assert!(b.parameters.is_empty());
    }

    #[test]
    fn test_parse_loose_types() {
        assert_eq!(ParamValue::parse_loose(".TRUE."), ParamValue::Bool(true));
        assert_eq!(ParamValue::parse_loose("false"), ParamValue::Bool(false));
        assert_eq!(ParamValue::parse_loose("-5"), ParamValue::Int(-5));
        assert_eq!(ParamValue::parse_loose("1e-6"), ParamValue::Float(1e-6));
        assert_eq!(
            ParamValue::parse_loose("Accurate"),
            ParamValue::Text("Accurate".to_string())
        );
        assert_eq!(
            ParamValue::parse_loose("3, 3,3"),
            ParamValue::List(vec![
                ParamValue::Int(3),
                ParamValue::Int(3),
                ParamValue::Int(3)
            ])
        );
    }

    #[test]
    fn test_numeric_accessors() {
        assert_eq!(ParamValue::Int(7).as_f64(), Some(7.0));
        assert_eq!(ParamValue::Float(2.0).as_i64(), Some(2));
        assert_eq!(ParamValue::Float(2.5).as_i64(), None);
        assert_eq!(ParamValue::Text("x".into()).as_f64(), None);
    }

    #[test]
    fn test_sampling_accessors_are_exclusive() {
        let density = Sampling::per_atom(8000.0);
        assert!(density.mesh().is_none());
        assert_eq!(density.density().map(|d| d.value), Some(8000.0));

        let mesh = Sampling::Mesh([3, 3, 3]);
        assert!(mesh.density().is_none());
        assert_eq!(mesh.mesh(), Some([3, 3, 3]));
        assert_eq!(mesh.to_string(), "3x3x3 mesh");
    }

    #[test]
    fn test_variant_falls_back_to_symbol() {
        let mut pp = bundle().pseudopotentials;
        pp.variants.insert("Ti".to_string(), "Ti_sv".to_string());
        assert_eq!(pp.variant_for("Ti"), "Ti_sv");
        assert_eq!(pp.variant_for("O"), "O");
    }

    #[test]
    fn test_bundle_toml_round_trip() {
        let mut b = bundle();
        b.set("ISPIN", 2i64);
        b.set("EDIFF", 1e-6);
        b.set("LCHARG", false);
        b.sampling = Sampling::Mesh([4, 4, 2]);

        let text = toml::to_string(&b).unwrap();
        let parsed: SettingsBundle = toml::from_str(&text).unwrap();
        assert_eq!(parsed, b);
    }
}
