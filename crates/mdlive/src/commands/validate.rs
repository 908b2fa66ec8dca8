use anyhow::Result;
use colored::Colorize;
use std::path::Path;

use crate::upload;

pub fn run(file: &Path) -> Result<()> {
    let size = upload::validate_path(file)?;
    let content = super::read_markdown(file)?;
    let slides = crate::parser::segment(&content).len();
    println!(
        "{} {} ({size} bytes, {slides} slide(s))",
        "ok".green().bold(),
        file.display()
    );
    Ok(())
}
