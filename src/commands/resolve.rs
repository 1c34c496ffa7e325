//! # resolve 命令实现
//!
//! 读取结构，解析配置档，以表格展示结果，可选保存为 TOML。
//!
//! ## 依赖关系
//! - 使用 `cli/resolve.rs` 定义的参数
//! - 使用 `commands/inputs.rs` 组装覆盖设置
//! - 使用 `vaspsets::sets::Resolver`

use super::inputs;
use crate::cli::resolve::ResolveArgs;

use serde::Serialize;
use std::fs;
use std::path::Path;
use tabled::{Table, Tabled};
use vaspsets::error::{Result, SetsError};
use vaspsets::models::{Crystal, SettingsBundle};
use vaspsets::parsers;
use vaspsets::sets::{FinalizedInput, ProfileKind, ResolvedProfile, Resolver};
use vaspsets::utils::output;

/// 参数表中的一行
#[derive(Debug, Clone, Tabled)]
struct ParameterRow {
    #[tabled(rename = "Parameter")]
    key: String,
    #[tabled(rename = "Value")]
    value: String,
}

/// `--save` 写出的文件内容
#[derive(Serialize)]
struct SavedBundle<'a> {
    profile: &'a str,
    structure: &'a str,
    formula: String,
    force_gamma: bool,
    #[serde(flatten)]
    bundle: &'a SettingsBundle,
}

/// 执行 resolve 命令
pub fn execute(args: ResolveArgs) -> Result<()> {
    let structure = parsers::parse_structure_file(&args.structure)?;
    let registry = inputs::build_registry(&args.overrides)?;
    let overrides = inputs::build_overrides(&args.overrides)?;
    let options = inputs::build_options(&args.overrides);
    let profile = ProfileKind::from(args.profile);

    let resolved = Resolver::new(&registry).resolve(profile, &structure, &overrides, options)?;
    let input = resolved.finalize(&structure);

    if args.incar {
        print!("{}", input.to_incar_string());
    } else {
        print_summary(&structure, &resolved, &input);
    }

    if let Some(path) = &args.save {
        save_bundle(&structure, &resolved, path)?;
        output::print_written("Settings bundle", &path.display().to_string());
    }

    Ok(())
}

fn print_summary(structure: &Crystal, resolved: &ResolvedProfile, input: &FinalizedInput) {
    output::print_header(&format!(
        "Profile '{}' for {}",
        resolved.profile, structure.name
    ));

    let yes_no = |b: bool| if b { "yes" } else { "no" };
    output::print_field("Formula", &structure.formula());
    output::print_field("Sites", &structure.num_sites().to_string());
    output::print_field("Magnetic", yes_no(resolved.defaults.is_magnetic));
    output::print_field("Metallic", yes_no(resolved.defaults.is_metallic));
    output::print_field("k-points", &resolved.bundle.sampling.to_string());
    output::print_field("Gamma-centred", yes_no(input.force_gamma));
    output::print_field("POTCAR functional", &input.functional);
    output::print_field("POTCAR symbols", &input.potcar_symbols.join(" "));
    println!();

    let rows: Vec<ParameterRow> = input
        .parameters
        .iter()
        .map(|(key, value)| ParameterRow {
            key: key.clone(),
            value: value.to_string(),
        })
        .collect();

    println!("{}", Table::new(&rows));
    output::print_done(&format!("{} parameters resolved", rows.len()));
}

fn save_bundle(structure: &Crystal, resolved: &ResolvedProfile, path: &Path) -> Result<()> {
    let saved = SavedBundle {
        profile: resolved.profile.name(),
        structure: &structure.name,
        formula: structure.formula(),
        force_gamma: resolved.force_gamma,
        bundle: &resolved.bundle,
    };
    let content = render_toml(&saved)?;

    fs::write(path, content).map_err(|e| SetsError::FileWriteError {
        path: path.display().to_string(),
        source: e,
    })
}

fn render_toml<T: Serialize>(value: &T) -> Result<String> {
    toml::to_string_pretty(value)
        .map_err(|e| SetsError::Other(format!("Failed to serialize settings: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use vaspsets::models::{Atom, Lattice, OverrideSet, ProfileOptions};
    use vaspsets::sets::TemplateRegistry;

    fn resolved_static() -> (Crystal, ResolvedProfile) {
        let lattice = Lattice::from_vectors([[4.0, 0.0, 0.0], [0.0, 4.0, 0.0], [0.0, 0.0, 4.0]]);
        let structure = Crystal::new(
            "FeO",
            lattice,
            vec![Atom::new("Fe", [0.0; 3]), Atom::new("O", [0.5; 3])],
        );
        let registry = TemplateRegistry::builtin().unwrap();
        let resolved = Resolver::new(&registry)
            .resolve(
                ProfileKind::Static,
                &structure,
                &OverrideSet::new(),
                ProfileOptions::default(),
            )
            .unwrap();
        (structure, resolved)
    }

    #[test]
    fn test_saved_bundle_reads_back() {
        let (structure, resolved) = resolved_static();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("static.toml");
        save_bundle(&structure, &resolved, &path).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        assert!(content.contains("profile = \"static\""));

        let bundle: SettingsBundle = toml::from_str(&content).unwrap();
        assert_eq!(bundle, resolved.bundle);
    }
}
