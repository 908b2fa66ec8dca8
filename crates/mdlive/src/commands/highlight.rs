use anyhow::Result;
use std::path::Path;

pub fn run(file: &Path) -> Result<()> {
    let content = super::read_markdown(file)?;
    print!("{}", crate::editor::Editor::new(content).highlighted());
    Ok(())
}
