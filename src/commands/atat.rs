//! # atat 命令实现
//!
//! ## 依赖关系
//! - 使用 `cli/atat.rs` 定义的参数
//! - 使用 `vaspsets::sets::AtatIdSettings`

use crate::cli::atat::AtatArgs;

use vaspsets::error::{Result, SetsError};
use vaspsets::parsers;
use vaspsets::sets::AtatIdSettings;
use vaspsets::utils::output;

/// 执行 atat 命令
pub fn execute(args: AtatArgs) -> Result<()> {
    if args.grid_density == 0 {
        return Err(SetsError::InvalidArgument(
            "grid density must be positive".to_string(),
        ));
    }

    let structure = parsers::parse_structure_file(&args.structure)?;
    let settings = AtatIdSettings::new(args.grid_density);

    if args.dry_run {
        print!("{}", settings.to_wrap_string(&structure));
        return Ok(());
    }

    let path = settings.write_input(&structure, &args.output_dir)?;
    output::print_written(&structure.formula(), &path.display().to_string());
    Ok(())
}
