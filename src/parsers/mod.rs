//! # 解析器模块
//!
//! 读取结构文件，供参数集解析使用。
//!
//! ## 依赖关系
//! - 被 `commands/` 模块使用
//! - 使用 `models/` 数据模型
//! - 子模块: poscar

pub mod poscar;

use crate::error::{Result, SetsError};
use crate::models::Crystal;
use std::path::Path;

/// 从文件路径推断格式并解析
pub fn parse_structure_file(path: &Path) -> Result<Crystal> {
    if !path.is_file() {
        return Err(SetsError::FileNotFound {
            path: path.display().to_string(),
        });
    }

    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|s| s.to_lowercase())
        .unwrap_or_default();

    match ext.as_str() {
        "vasp" | "poscar" | "contcar" => poscar::parse_poscar_file(path),
        _ => {
            // POSCAR/CONTCAR 通常没有扩展名
            if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
                let upper = name.to_uppercase();
                if upper.starts_with("POSCAR") || upper.starts_with("CONTCAR") {
                    return poscar::parse_poscar_file(path);
                }
            }
            Err(SetsError::UnsupportedFormat(format!(
                "Cannot determine format for: {}",
                path.display()
            )))
        }
    }
}
