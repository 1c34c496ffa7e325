//! # ATAT 拐点检测配置档
//!
//! 不经过解析引擎：固定的 INCAR 键表加上两个由结构决定的值，
//! 以 `[INCAR]` 文本块写入 `vaspid.wrap`，供 ATAT 的 `robustrelax_vasp -mk` 生成其余输入。
//!
//! ## 依赖关系
//! - 被 `commands/atat.rs` 调用
//! - 使用 `models/structure.rs`

use crate::error::{Result, SetsError};
use crate::models::Crystal;

use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

pub const WRAP_FILE_NAME: &str = "vaspid.wrap";

/// 每原子能量收敛判据
pub const EDIFF_PER_ATOM: f64 = 1e-6;

/// 固定键表，EDIFF 之后、KPPRA 之前按此顺序写出
const FIXED_KEYS: [(&str, &str); 15] = [
    ("PREC", "Accurate"),
    ("ALGO", "Fast"),
    ("ENCUT", "520"),
    ("ISMEAR", "1"),
    ("SIGMA", "0.2"),
    ("IBRION", "-1"),
    ("NSW", "1"),
    ("ISPIN", "2"),
    ("NELMIN", "4"),
    ("ISIF", "2"),
    ("LREAL", "False"),
    ("ISYM", "0"),
    ("ICHARG", "1"),
    ("ISTART", "2"),
    ("USEPOT", "PAWPBE"),
];

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AtatIdSettings {
    /// 每倒易原子 k 点数
    pub grid_density: u32,
}

impl Default for AtatIdSettings {
    fn default() -> Self {
        AtatIdSettings {
            grid_density: Self::DEFAULT_GRID_DENSITY,
        }
    }
}

impl AtatIdSettings {
    pub const DEFAULT_GRID_DENSITY: u32 = 8000;

    pub fn new(grid_density: u32) -> Self {
        AtatIdSettings { grid_density }
    }

    pub fn ediff(structure: &Crystal) -> f64 {
        structure.num_sites() as f64 * EDIFF_PER_ATOM
    }

    /// 生成 `vaspid.wrap` 的内容
    pub fn to_wrap_string(&self, structure: &Crystal) -> String {
        let mut out = String::from("[INCAR]\n");
        let _ = writeln!(out, "EDIFF = {:e}", Self::ediff(structure));
        for (key, value) in FIXED_KEYS {
            let _ = writeln!(out, "{} = {}", key, value);
        }
        let _ = writeln!(out, "KPPRA = {}", self.grid_density);
        out
    }

    /// 写入 `<dir>/vaspid.wrap`，返回文件路径
    pub fn write_input(&self, structure: &Crystal, dir: &Path) -> Result<PathBuf> {
        if !dir.is_dir() {
            return Err(SetsError::DirectoryNotFound {
                path: dir.display().to_string(),
            });
        }

        let path = dir.join(WRAP_FILE_NAME);
        fs::write(&path, self.to_wrap_string(structure)).map_err(|e| {
            SetsError::FileWriteError {
                path: path.display().to_string(),
                source: e,
            }
        })?;

        info!(
            structure = %structure.name,
            path = %path.display(),
            grid_density = self.grid_density,
            "wrote ATAT wrap file"
        );
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Atom, Lattice};

    fn crystal(n: usize) -> Crystal {
        let lattice = Lattice::from_vectors([[3.0, 0.0, 0.0], [0.0, 3.0, 0.0], [0.0, 0.0, 3.0]]);
        let atoms = (0..n)
            .map(|i| Atom::new("Al", [i as f64 / n as f64, 0.0, 0.0]))
            .collect();
        Crystal::new("Al", lattice, atoms)
    }

    #[test]
    fn test_ediff_scales_with_sites() {
        assert!((AtatIdSettings::ediff(&crystal(4)) - 4e-6).abs() < 1e-15);
        assert!((AtatIdSettings::ediff(&crystal(1)) - 1e-6).abs() < 1e-15);
    }

    #[test]
    fn test_wrap_string_layout() {
        let text = AtatIdSettings::default().to_wrap_string(&crystal(2));
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines[0], "[INCAR]");
        assert_eq!(lines[1], "EDIFF = 2e-6");
        assert_eq!(lines[2], "PREC = Accurate");
        assert_eq!(lines.last().copied(), Some("KPPRA = 8000"));
        assert!(lines.contains(&"USEPOT = PAWPBE"));
        assert_eq!(lines.len(), FIXED_KEYS.len() + 3);
    }

    #[test]
    fn test_custom_grid_density() {
        let text = AtatIdSettings::new(4000).to_wrap_string(&crystal(1));
        assert!(text.ends_with("KPPRA = 4000\n"));
    }

    #[test]
    fn test_write_input() {
        let dir = tempfile::tempdir().unwrap();
        let path = AtatIdSettings::default()
            .write_input(&crystal(4), dir.path())
            .unwrap();

        assert_eq!(path.file_name().and_then(|n| n.to_str()), Some(WRAP_FILE_NAME));
        let content = fs::read_to_string(&path).unwrap();
        assert!(content.starts_with("[INCAR]\nEDIFF = 4e-6\n"));
    }

    #[test]
    fn test_write_input_missing_dir() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope");
        let result = AtatIdSettings::default().write_input(&crystal(1), &missing);
        assert!(matches!(result, Err(SetsError::DirectoryNotFound { .. })));
    }
}
