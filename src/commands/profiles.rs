//! # profiles 命令实现
//!
//! 以表格列出全部配置档。
//!
//! ## 依赖关系
//! - 使用 `vaspsets::sets::PROFILES`

use tabled::{Table, Tabled};
use vaspsets::error::Result;
use vaspsets::sets::profiles::{ProfileDefinition, SamplingDefault};
use vaspsets::sets::PROFILES;
use vaspsets::utils::output;

#[derive(Debug, Clone, Tabled)]
struct ProfileRow {
    #[tabled(rename = "Profile")]
    name: &'static str,
    #[tabled(rename = "Override group")]
    group: &'static str,
    #[tabled(rename = "k-points / atom")]
    sampling: String,
    #[tabled(rename = "Description")]
    description: &'static str,
}

impl From<&'static ProfileDefinition> for ProfileRow {
    fn from(def: &'static ProfileDefinition) -> Self {
        let mut sampling = match def.sampling {
            SamplingDefault::PerAtom(d) => format!("{}", d),
            SamplingDefault::ByComposition { metallic, other } => {
                format!("{} metallic / {} other", metallic, other)
            }
        };
        if let Some(m) = def.fallback_mesh {
            sampling.push_str(&format!(" ({}x{}x{} without group)", m[0], m[1], m[2]));
        }

        ProfileRow {
            name: def.kind.name(),
            group: def.group.unwrap_or("-"),
            sampling,
            description: def.description,
        }
    }
}

/// 执行 profiles 命令
pub fn execute() -> Result<()> {
    output::print_header("Calculation Profiles");
    let rows: Vec<ProfileRow> = PROFILES.iter().map(ProfileRow::from).collect();
    println!("{}", Table::new(&rows));
    output::print_info("The ATAT inflection-detection set is written with `vaspsets atat`.");
    Ok(())
}
