//! # batch 命令实现
//!
//! 对一批结构并行解析同一配置档，打印汇总表并可导出 CSV。
//! 单个结构失败不影响其他结构，失败信息在最后统一报告。
//!
//! ## 依赖关系
//! - 使用 `cli/batch.rs` 定义的参数
//! - 使用 `vaspsets::batch` 收集文件并并行执行
//! - 使用 `commands/inputs.rs` 组装覆盖设置

use super::inputs;
use crate::cli::batch::BatchArgs;

use serde::Serialize;
use std::path::Path;
use tabled::{Table, Tabled};
use vaspsets::batch::{BatchRunner, FileCollector, ProcessResult};
use vaspsets::error::{Result, SetsError};
use vaspsets::models::{OverrideSet, ProfileOptions};
use vaspsets::parsers;
use vaspsets::sets::{ProfileKind, Resolver, TemplateRegistry};
use vaspsets::utils::output;

/// 每个结构的汇总行
#[derive(Debug, Clone, Serialize, Tabled)]
pub struct SummaryRow {
    #[tabled(rename = "Structure")]
    pub structure: String,
    #[tabled(rename = "Formula")]
    pub formula: String,
    #[tabled(rename = "Sites")]
    pub sites: usize,
    #[tabled(rename = "Magnetic")]
    pub magnetic: bool,
    #[tabled(rename = "Metallic")]
    pub metallic: bool,
    #[tabled(rename = "ISPIN")]
    pub ispin: String,
    #[tabled(rename = "k-points")]
    pub sampling: String,
}

/// 执行 batch 命令
pub fn execute(args: BatchArgs) -> Result<()> {
    output::print_header("Batch Resolution");

    let files = FileCollector::new(args.input.clone())
        .with_pattern(&args.pattern)?
        .recursive(args.recursive)
        .collect()?;

    if files.is_empty() {
        return Err(SetsError::NoFilesFound {
            pattern: args.pattern.clone(),
        });
    }

    let registry = inputs::build_registry(&args.overrides)?;
    let overrides = inputs::build_overrides(&args.overrides)?;
    let options = inputs::build_options(&args.overrides);
    let profile = ProfileKind::from(args.profile);

    let runner = BatchRunner::new(args.jobs);
    output::print_info(&format!(
        "Resolving '{}' for {} structure(s) with {} job(s)",
        profile,
        files.len(),
        runner.jobs()
    ));

    let result = runner.run(&files, |path| {
        match summarize(path, &registry, profile, &overrides, options) {
            Ok(row) => ProcessResult::Success(row),
            Err(e) => ProcessResult::Failed(path.display().to_string(), e.to_string()),
        }
    })?;

    if !result.outputs.is_empty() {
        println!("{}", Table::new(&result.outputs));
    }

    if let Some(csv_path) = &args.csv {
        save_summary_csv(&result.outputs, csv_path)?;
        output::print_written("Summary", &csv_path.display().to_string());
    }

    for (path, err) in &result.failures {
        output::print_warning(&format!("{}: {}", path, err));
    }

    output::print_separator();
    output::print_done(&format!(
        "{} resolved, {} failed, {} total",
        result.success(),
        result.failed(),
        result.total()
    ));

    Ok(())
}

fn summarize(
    path: &Path,
    registry: &TemplateRegistry,
    profile: ProfileKind,
    overrides: &OverrideSet,
    options: ProfileOptions,
) -> Result<SummaryRow> {
    let structure = parsers::parse_structure_file(path)?;
    let resolved = Resolver::new(registry).resolve(profile, &structure, overrides, options)?;

    Ok(SummaryRow {
        structure: path.display().to_string(),
        formula: structure.formula(),
        sites: structure.num_sites(),
        magnetic: resolved.defaults.is_magnetic,
        metallic: resolved.defaults.is_metallic,
        ispin: resolved
            .bundle
            .get("ISPIN")
            .map(|v| v.to_string())
            .unwrap_or_default(),
        sampling: resolved.bundle.sampling.to_string(),
    })
}

/// 保存汇总到 CSV
fn save_summary_csv(rows: &[SummaryRow], output_path: &Path) -> Result<()> {
    let mut wtr = csv::Writer::from_path(output_path)?;
    for row in rows {
        wtr.serialize(row)?;
    }
    wtr.flush().map_err(|e| SetsError::FileWriteError {
        path: output_path.display().to_string(),
        source: e,
    })?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_summarize_and_csv() {
        let dir = tempfile::tempdir().unwrap();
        let poscar = dir.path().join("POSCAR");
        fs::write(
            &poscar,
            "Ni\n1.0\n3.5 0 0\n0 3.5 0\n0 0 3.5\nNi\n1\nDirect\n0 0 0\n",
        )
        .unwrap();

        let registry = TemplateRegistry::builtin().unwrap();
        let row = summarize(
            &poscar,
            &registry,
            ProfileKind::Elastic,
            &OverrideSet::new(),
            ProfileOptions::default(),
        )
        .unwrap();

        assert_eq!(row.formula, "Ni");
        assert!(row.magnetic);
        assert!(row.metallic);
        assert_eq!(row.ispin, "2");
        assert_eq!(row.sampling, "15625 per reciprocal atom");

        let csv_path = dir.path().join("summary.csv");
        save_summary_csv(&[row], &csv_path).unwrap();
        let content = fs::read_to_string(&csv_path).unwrap();
        assert!(content.starts_with("structure,formula,sites,magnetic,metallic,ispin,sampling\n"));
    }
}
