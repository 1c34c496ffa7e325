//! # 用户覆盖设置数据模型
//!
//! 调用方每次解析时构造一个 `OverrideSet`，解析引擎只读不写。
//!
//! ## 覆盖设置的三个来源
//! - `parameters`: 扁平的 INCAR 参数覆盖
//! - `settings`: 嵌套的命名覆盖组（如 `Relax_settings`），优先级最高
//! - `inline_groups`: 作为扁平参数条目给出的同名覆盖组
//!
//! ## 依赖关系
//! - 被 `sets/engine.rs` 读取
//! - 被 `commands/` 从 TOML 文件和命令行构建
//! - 使用 `models/settings.rs`

use crate::error::{Result, SetsError};
use crate::models::settings::{normalize_key, ParamValue, Parameters};

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

/// 命名覆盖组，保持条目的插入顺序
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OverrideGroup {
    entries: Vec<(String, ParamValue)>,
}

impl OverrideGroup {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<ParamValue>) -> Self {
        self.push(key, value);
        self
    }

    pub fn push(&mut self, key: impl Into<String>, value: impl Into<ParamValue>) {
        self.entries.push((key.into(), value.into()));
    }

    /// 删除所有与 `key` 同名（不区分大小写）的条目
    pub fn remove(&mut self, key: &str) -> usize {
        let target = normalize_key(key);
        let before = self.entries.len();
        self.entries.retain(|(k, _)| normalize_key(k) != target);
        before - self.entries.len()
    }

    pub fn get(&self, key: &str) -> Option<&ParamValue> {
        let target = normalize_key(key);
        self.entries
            .iter()
            .rev()
            .find(|(k, _)| normalize_key(k) == target)
            .map(|(_, v)| v)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ParamValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// 配置文件中表值条目被视为覆盖组的后缀
const GROUP_SUFFIX: &str = "_settings";

/// 判断一个扁平参数名是否指代覆盖组
pub fn is_group_name(key: &str) -> bool {
    key.to_lowercase().ends_with(GROUP_SUFFIX)
}

/// 用户覆盖设置
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OverrideSet {
    /// 扁平 INCAR 参数
    pub parameters: Parameters,

    /// 嵌套覆盖组
    pub settings: BTreeMap<String, OverrideGroup>,

    /// 与扁平参数一同给出的覆盖组
    pub inline_groups: BTreeMap<String, OverrideGroup>,

    /// 赝势泛函族
    pub potcar_functional: Option<String>,

    /// 用户指定的 k 点密度（每倒易原子）
    pub kpoint_density: Option<f64>,
}

impl OverrideSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_parameter(mut self, key: &str, value: impl Into<ParamValue>) -> Self {
        self.parameters.insert(normalize_key(key), value.into());
        self
    }

    pub fn with_group(mut self, name: impl Into<String>, group: OverrideGroup) -> Self {
        self.settings.insert(name.into(), group);
        self
    }

    pub fn with_inline_group(mut self, name: impl Into<String>, group: OverrideGroup) -> Self {
        self.inline_groups.insert(name.into(), group);
        self
    }

    pub fn with_potcar_functional(mut self, functional: impl Into<String>) -> Self {
        self.potcar_functional = Some(functional.into());
        self
    }

    pub fn with_kpoint_density(mut self, density: f64) -> Self {
        self.kpoint_density = Some(density);
        self
    }

    /// 查找覆盖组：非空的嵌套组优先，其次是同名的内联组
    pub fn group(&self, name: &str) -> Option<&OverrideGroup> {
        self.settings
            .get(name)
            .filter(|g| !g.is_empty())
            .or_else(|| self.inline_groups.get(name).filter(|g| !g.is_empty()))
    }

    /// 从 TOML 文件读取覆盖设置
    pub fn from_toml_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| SetsError::FileReadError {
            path: path.display().to_string(),
            source: e,
        })?;
        Self::from_toml_str(&content, &path.display().to_string())
    }

    /// 从 TOML 文本解析覆盖设置
    ///
    /// ```toml
    /// potcar_functional = "PBE_54"
    /// kpoint_density = 6000
    ///
    /// [parameters]
    /// ISPIN = 2
    ///
    /// [settings.Relax_settings]
    /// PREC = "High"
    /// k_mesh = [4, 4, 4]
    /// ```
    pub fn from_toml_str(content: &str, origin: &str) -> Result<Self> {
        let parse_error = |reason: String| SetsError::ParseError {
            format: "toml".to_string(),
            path: origin.to_string(),
            reason,
        };

        let table = content
            .parse::<toml::Table>()
            .map_err(|e| parse_error(e.message().to_string()))?;

        let mut overrides = OverrideSet::new();

        for (key, value) in table {
            match key.as_str() {
                "parameters" => {
                    let entries = expect_table(value, &key).map_err(&parse_error)?;
                    for (name, value) in entries {
                        match value {
                            toml::Value::Table(group) if is_group_name(&name) => {
                                let group = group_from_table(group).map_err(&parse_error)?;
                                overrides.inline_groups.insert(name, group);
                            }
                            other => {
                                let value = to_param(other, &name).map_err(&parse_error)?;
                                overrides.parameters.insert(normalize_key(&name), value);
                            }
                        }
                    }
                }
                "settings" => {
                    let groups = expect_table(value, &key).map_err(&parse_error)?;
                    for (name, value) in groups {
                        let group = expect_table(value, &name).map_err(&parse_error)?;
                        let group = group_from_table(group).map_err(&parse_error)?;
                        overrides.settings.insert(name, group);
                    }
                }
                "potcar_functional" => match value {
                    toml::Value::String(s) => overrides.potcar_functional = Some(s),
                    _ => return Err(parse_error("potcar_functional must be a string".into())),
                },
                "kpoint_density" => match value {
                    toml::Value::Integer(v) => overrides.kpoint_density = Some(v as f64),
                    toml::Value::Float(v) => overrides.kpoint_density = Some(v),
                    _ => return Err(parse_error("kpoint_density must be a number".into())),
                },
                other => return Err(parse_error(format!("Unknown section '{}'", other))),
            }
        }

        Ok(overrides)
    }
}

fn expect_table(value: toml::Value, name: &str) -> std::result::Result<toml::Table, String> {
    match value {
        toml::Value::Table(t) => Ok(t),
        _ => Err(format!("'{}' must be a table", name)),
    }
}

fn to_param(value: toml::Value, name: &str) -> std::result::Result<ParamValue, String> {
    value
        .try_into::<ParamValue>()
        .map_err(|e| format!("Unsupported value for '{}': {}", name, e))
}

fn group_from_table(table: toml::Table) -> std::result::Result<OverrideGroup, String> {
    let mut group = OverrideGroup::new();
    for (key, value) in table {
        let value = to_param(value, &key)?;
        group.push(key, value);
    }
    Ok(group)
}

/// 每次解析时传给配置档的选项
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProfileOptions {
    /// 只弛豫体积（ISIF=7）
    pub volume_relax: bool,

    /// 显式指定的 ISIF
    pub isif: Option<i64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_group_keeps_insertion_order() {
        let group = OverrideGroup::new()
            .with("PREC", "High")
            .with("k_mesh", ParamValue::parse_loose("3,3,3"))
            .with("prec", "Normal");

        let keys: Vec<&str> = group.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["PREC", "k_mesh", "prec"]);
        // 同名条目以最后一次为准
        assert_eq!(group.get("PREC"), Some(&ParamValue::from("Normal")));
    }

    #[test]
    fn test_group_remove_is_case_insensitive() {
        let mut group = OverrideGroup::new()
            .with("EDIFFG", -0.01)
            .with("ediffg", -0.02)
            .with("NSW", 50i64);
        assert_eq!(group.remove("EDIFFG"), 2);
        assert_eq!(group.len(), 1);
    }

    #[test]
    fn test_nested_group_wins_over_inline() {
        let overrides = OverrideSet::new()
            .with_group("Static_settings", OverrideGroup::new().with("NEDOS", 3001i64))
            .with_inline_group("Static_settings", OverrideGroup::new().with("NEDOS", 9i64));

        let group = overrides.group("Static_settings").unwrap();
        assert_eq!(group.get("NEDOS"), Some(&ParamValue::Int(3001)));
    }

    #[test]
    fn test_empty_nested_group_falls_through() {
        let overrides = OverrideSet::new()
            .with_group("Static_settings", OverrideGroup::new())
            .with_inline_group("Static_settings", OverrideGroup::new().with("NEDOS", 9i64));

        let group = overrides.group("Static_settings").unwrap();
        assert_eq!(group.get("NEDOS"), Some(&ParamValue::Int(9)));
        assert!(overrides.group("Relax_settings").is_none());
    }

    #[test]
    fn test_from_toml_str() {
        let content = r#"
potcar_functional = "PBE_54"
kpoint_density = 6000

[parameters]
ispin = 2
MAGMOM = { Fe = 4.0 }

[parameters.Static_settings]
NEDOS = 3001

[settings.Relax_settings]
k_mesh = [4, 4, 4]
PREC = "High"
grid_density = 2000
"#;
        let overrides = OverrideSet::from_toml_str(content, "test.toml").unwrap();

        assert_eq!(overrides.potcar_functional.as_deref(), Some("PBE_54"));
        assert_eq!(overrides.kpoint_density, Some(6000.0));
        assert_eq!(overrides.parameters.get("ISPIN"), Some(&ParamValue::Int(2)));
        assert!(matches!(
            overrides.parameters.get("MAGMOM"),
            Some(ParamValue::Table(_))
        ));
        assert!(overrides.inline_groups.contains_key("Static_settings"));

        let relax = overrides.group("Relax_settings").unwrap();
        let keys: Vec<&str> = relax.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["k_mesh", "PREC", "grid_density"]);
    }

    #[test]
    fn test_from_toml_str_rejects_unknown_section() {
        let result = OverrideSet::from_toml_str("[incar]\nISPIN = 1\n", "bad.toml");
        assert!(matches!(result, Err(SetsError::ParseError { .. })));
    }
}
