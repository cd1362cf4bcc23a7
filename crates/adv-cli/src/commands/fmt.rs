use std::path::Path;

pub fn run(path: &Path, write: bool) -> Result<(), String> {
    let source = super::read_source(path)?;
    let doc = adv_dsl::parse_document(&source).map_err(|err| {
        super::print_diagnostics(
            &source,
            path,
            &[adv_dsl::Diagnostic::from_format_error(&err)],
        );
        format!("{} has a format error", path.display())
    })?;

    let formatted = adv_dsl::write_document(&doc);
    if !write {
        print!("{formatted}");
        return Ok(());
    }

    if formatted == source {
        println!("  {} is already formatted.", path.display());
        return Ok(());
    }
    std::fs::write(path, &formatted)
        .map_err(|e| format!("cannot write {}: {e}", path.display()))?;
    println!("  Formatted {}.", path.display());
    Ok(())
}
