//! # 基础模板注册表
//!
//! 模板名到基础参数集的只读映射。内置 `MPRelaxSet`，可从 TOML 文件追加或覆盖模板。
//! 解析引擎只拿到模板的深拷贝，注册表本身从不被修改。
//!
//! ## 模板文件格式
//! ```toml
//! [templates.MyTemplate.parameters]
//! ENCUT = 600
//!
//! [templates.MyTemplate.sampling.density]
//! value = 64.0
//! basis = "per_reciprocal_volume"
//!
//! [templates.MyTemplate.pseudopotentials]
//! functional = "PBE"
//! ```
//!
//! ## 依赖关系
//! - 被 `sets/engine.rs` 的 `Resolver` 使用
//! - 使用 `toml` + `serde` 反序列化 `models/settings.rs`

use crate::error::{Result, SetsError};
use crate::models::SettingsBundle;

use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use tracing::info;

/// 内置模板文件
const BUILTIN_TEMPLATES: &str = include_str!("../../data/MPRelaxSet.toml");

/// 所有配置档使用的基础模板名
pub const MP_RELAX_SET: &str = "MPRelaxSet";

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct TemplateFile {
    templates: BTreeMap<String, SettingsBundle>,
}

/// 基础模板注册表
#[derive(Debug, Clone, Default)]
pub struct TemplateRegistry {
    templates: BTreeMap<String, SettingsBundle>,
}

impl TemplateRegistry {
    /// 空注册表
    pub fn empty() -> Self {
        Self::default()
    }

    /// 含内置模板的注册表
    pub fn builtin() -> Result<Self> {
        Self::from_toml_str(BUILTIN_TEMPLATES, "<builtin>")
    }

    /// 从 TOML 文本构建
    pub fn from_toml_str(content: &str, origin: &str) -> Result<Self> {
        let mut registry = Self::empty();
        registry.merge_toml_str(content, origin)?;
        Ok(registry)
    }

    /// 从文件追加模板，同名模板被替换，返回读入的模板数
    pub fn load_file(&mut self, path: &Path) -> Result<usize> {
        let content = fs::read_to_string(path).map_err(|e| SetsError::FileReadError {
            path: path.display().to_string(),
            source: e,
        })?;
        self.merge_toml_str(&content, &path.display().to_string())
    }

    fn merge_toml_str(&mut self, content: &str, origin: &str) -> Result<usize> {
        let file: TemplateFile = toml::from_str(content).map_err(|e| SetsError::ParseError {
            format: "template".to_string(),
            path: origin.to_string(),
            reason: e.message().to_string(),
        })?;

        let count = file.templates.len();
        for (name, bundle) in file.templates {
            info!(template = %name, origin, "registered base template");
            self.templates.insert(name, bundle);
        }
        Ok(count)
    }

    pub fn insert(&mut self, name: impl Into<String>, bundle: SettingsBundle) {
        self.templates.insert(name.into(), bundle);
    }

    /// 取模板的独立副本
    pub fn get(&self, name: &str) -> Result<SettingsBundle> {
        self.templates
            .get(name)
            .cloned()
            .ok_or_else(|| SetsError::UnknownTemplate(name.to_string()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.templates.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.templates.keys().map(String::as_str)
    }
}
