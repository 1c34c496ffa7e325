//! # 命令行输入组装
//!
//! 把 `OverrideArgs` 变成模板注册表、`OverrideSet` 和 `ProfileOptions`。
//! 优先级：覆盖文件 < `--set` < 专用选项（`--potcar-functional`、`--kpoint-density`）。
//!
//! ## 依赖关系
//! - 被 `commands/resolve.rs`、`commands/batch.rs` 使用
//! - 使用 `regex` 解析 `--set` 条目

use crate::cli::resolve::OverrideArgs;

use regex::Regex;
use tracing::debug;
use vaspsets::error::{Result, SetsError};
use vaspsets::models::{is_group_name, OverrideSet, ParamValue, ProfileOptions};
use vaspsets::sets::TemplateRegistry;

/// 单个 `--set` 条目
#[derive(Debug, Clone, PartialEq)]
pub struct SetEntry {
    pub group: Option<String>,
    pub key: String,
    pub value: ParamValue,
}

/// 解析 `KEY=VALUE` 或 `Group_settings.KEY=VALUE`
pub fn parse_set_entry(entry: &str) -> Result<SetEntry> {
    let re = Regex::new(r"^\s*(?:([A-Za-z][A-Za-z0-9_]*)\.)?([A-Za-z][A-Za-z0-9_]*)\s*=\s*(.+?)\s*$")
        .map_err(|e| SetsError::Other(e.to_string()))?;

    let caps = re.captures(entry).ok_or_else(|| {
        SetsError::InvalidArgument(format!(
            "Expected KEY=VALUE or Group_settings.KEY=VALUE, got '{}'",
            entry
        ))
    })?;

    let group = caps.get(1).map(|m| m.as_str().to_string());
    if let Some(name) = &group {
        if !is_group_name(name) {
            return Err(SetsError::InvalidArgument(format!(
                "'{}' is not an override group name (expected a *_settings name)",
                name
            )));
        }
    }

    Ok(SetEntry {
        group,
        key: caps[2].to_string(),
        value: ParamValue::parse_loose(&caps[3]),
    })
}

/// 内置模板加上 `--templates` 指定的文件
pub fn build_registry(args: &OverrideArgs) -> Result<TemplateRegistry> {
    let mut registry = TemplateRegistry::builtin()?;
    for path in &args.templates {
        let count = registry.load_file(path)?;
        debug!(path = %path.display(), count, "loaded template file");
    }
    Ok(registry)
}

pub fn build_overrides(args: &OverrideArgs) -> Result<OverrideSet> {
    let mut overrides = match &args.overrides {
        Some(path) => OverrideSet::from_toml_file(path)?,
        None => OverrideSet::new(),
    };

    for entry in &args.set {
        let SetEntry { group, key, value } = parse_set_entry(entry)?;
        match group {
            Some(name) => overrides.settings.entry(name).or_default().push(key, value),
            None => overrides = overrides.with_parameter(&key, value),
        }
    }

    if let Some(functional) = &args.potcar_functional {
        overrides.potcar_functional = Some(functional.clone());
    }
    if let Some(density) = args.kpoint_density {
        if density <= 0.0 {
            return Err(SetsError::InvalidArgument(format!(
                "kpoint density must be positive, got {}",
                density
            )));
        }
        overrides.kpoint_density = Some(density);
    }

    Ok(overrides)
}

pub fn build_options(args: &OverrideArgs) -> ProfileOptions {
    ProfileOptions {
        volume_relax: args.volume_relax,
        isif: args.isif,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_parse_flat_entry() {
        let entry = parse_set_entry("ispin=1").unwrap();
        assert_eq!(entry.group, None);
        assert_eq!(entry.key, "ispin");
        assert_eq!(entry.value, ParamValue::Int(1));

        let entry = parse_set_entry("  LREAL = .FALSE. ").unwrap();
        assert_eq!(entry.value, ParamValue::Bool(false));
    }

    #[test]
    fn test_parse_group_entry() {
        let entry = parse_set_entry("Relax_settings.k_mesh=4,4,2").unwrap();
        assert_eq!(entry.group.as_deref(), Some("Relax_settings"));
        assert_eq!(entry.key, "k_mesh");
        assert_eq!(entry.value, ParamValue::parse_loose("4,4,2"));
    }

    #[test]
    fn test_parse_rejects_bad_entries() {
        assert!(matches!(
            parse_set_entry("ENCUT"),
            Err(SetsError::InvalidArgument(_))
        ));
        assert!(matches!(
            parse_set_entry("Relax.PREC=High"),
            Err(SetsError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_build_overrides_layers() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            "potcar_functional = \"PBE\"\n[parameters]\nNSW = 10\n[settings.Static_settings]\nNEDOS = 3001\n"
        )
        .unwrap();

        let args = OverrideArgs {
            overrides: Some(file.path().to_path_buf()),
            set: vec![
                "nsw=20".to_string(),
                "Static_settings.prec=High".to_string(),
            ],
            potcar_functional: Some("PBE_54".to_string()),
            kpoint_density: Some(4000.0),
            ..OverrideArgs::default()
        };
        let overrides = build_overrides(&args).unwrap();

        assert_eq!(overrides.parameters.get("NSW"), Some(&ParamValue::Int(20)));
        assert_eq!(overrides.potcar_functional.as_deref(), Some("PBE_54"));
        assert_eq!(overrides.kpoint_density, Some(4000.0));

        let group = overrides.group("Static_settings").unwrap();
        let keys: Vec<&str> = group.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["NEDOS", "prec"]);
    }

    #[test]
    fn test_negative_density_is_rejected() {
        let args = OverrideArgs {
            kpoint_density: Some(-1.0),
            ..OverrideArgs::default()
        };
        assert!(matches!(
            build_overrides(&args),
            Err(SetsError::InvalidArgument(_))
        ));
    }
}
