//! # 成分分类器
//!
//! 根据结构中元素的原子序数判断磁性与金属性，用于选择自旋极化和 k 点密度的默认值。
//! 分类按固定的闭区间划分周期表。
//!
//! ## 依赖关系
//! - 被 `sets/engine.rs`、`commands/batch.rs` 使用
//! - 使用 `models/structure.rs`

use crate::models::Crystal;
use std::ops::RangeInclusive;

/// 周期表元素符号，下标 + 1 为原子序数
const ELEMENT_SYMBOLS: [&str; 118] = [
    "H", "He", "Li", "Be", "B", "C", "N", "O", "F", "Ne", "Na", "Mg", "Al", "Si", "P", "S", "Cl",
    "Ar", "K", "Ca", "Sc", "Ti", "V", "Cr", "Mn", "Fe", "Co", "Ni", "Cu", "Zn", "Ga", "Ge", "As",
    "Se", "Br", "Kr", "Rb", "Sr", "Y", "Zr", "Nb", "Mo", "Tc", "Ru", "Rh", "Pd", "Ag", "Cd", "In",
    "Sn", "Sb", "Te", "I", "Xe", "Cs", "Ba", "La", "Ce", "Pr", "Nd", "Pm", "Sm", "Eu", "Gd", "Tb",
    "Dy", "Ho", "Er", "Tm", "Yb", "Lu", "Hf", "Ta", "W", "Re", "Os", "Ir", "Pt", "Au", "Hg", "Tl",
    "Pb", "Bi", "Po", "At", "Rn", "Fr", "Ra", "Ac", "Th", "Pa", "U", "Np", "Pu", "Am", "Cm", "Bk",
    "Cf", "Es", "Fm", "Md", "No", "Lr", "Rf", "Db", "Sg", "Bh", "Hs", "Mt", "Ds", "Rg", "Cn", "Nh",
    "Fl", "Mc", "Lv", "Ts", "Og",
];

/// 磁性元素: V-Ni, Ru-Pd, Ce-Lu, Pa 之后
const MAGNETIC_RANGES: [RangeInclusive<u8>; 4] = [23..=28, 44..=46, 58..=71, 91..=118];

/// 金属元素: Li-Be, Na-Al, K-Ga, Rb-Sn, Cs-At, Ra 之后
const METALLIC_RANGES: [RangeInclusive<u8>; 6] =
    [3..=4, 11..=13, 19..=31, 37..=50, 55..=85, 87..=118];

/// 元素符号转原子序数
///
/// 接受带赝势后缀的符号（`Fe_pv`、`Fe/abc123`），只取开头的元素符号部分。
pub fn atomic_number(symbol: &str) -> Option<u8> {
    let bare = symbol
        .trim()
        .split(|c: char| c == '_' || c == '/')
        .next()
        .unwrap_or("");
    ELEMENT_SYMBOLS
        .iter()
        .position(|&s| s == bare)
        .map(|idx| (idx + 1) as u8)
}

fn in_ranges(z: u8, ranges: &[RangeInclusive<u8>]) -> bool {
    ranges.iter().any(|r| r.contains(&z))
}

/// 结构中是否含有磁性元素
pub fn is_magnetic(structure: &Crystal) -> bool {
    structure.atoms.iter().any(|atom| {
        atomic_number(&atom.element)
            .map(|z| in_ranges(z, &MAGNETIC_RANGES))
            .unwrap_or(false)
    })
}

/// 结构是否完全由金属元素组成
pub fn is_metallic(structure: &Crystal) -> bool {
    structure.atoms.iter().all(|atom| {
        atomic_number(&atom.element)
            .map(|z| in_ranges(z, &METALLIC_RANGES))
            .unwrap_or(false)
    })
}

/// 由结构推导的物理默认值
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PhysicalDefaults {
    pub is_magnetic: bool,
    pub is_metallic: bool,
}

impl PhysicalDefaults {
    pub fn classify(structure: &Crystal) -> Self {
        PhysicalDefaults {
            is_magnetic: is_magnetic(structure),
            is_metallic: is_metallic(structure),
        }
    }
}
