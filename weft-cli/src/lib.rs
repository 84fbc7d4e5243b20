use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use weft_template::{ComponentClass, Registry};

/// Summary of one compiled template file.
#[derive(Debug, Clone)]
pub struct Checked {
    pub path: PathBuf,
    /// Component name, taken from the file stem.
    pub name: String,
    pub nodes: usize,
    pub slots: Vec<String>,
    pub outline: String,
}

/// Component name for a template file: its stem, lowercased.
pub fn component_name(path: &Path) -> String {
    path.file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("component")
        .to_ascii_lowercase()
}

/// Compile `inputs` in order. Each file becomes a component named after its
/// stem and is registered, so later files may use it as a tag.
pub fn check_files(inputs: &[PathBuf]) -> Result<Vec<Checked>> {
    let mut registry = Registry::new();
    let mut out = Vec::with_capacity(inputs.len());
    for input in inputs {
        let src = fs::read_to_string(input)
            .with_context(|| format!("failed to read {}", input.display()))?;
        let name = component_name(input);
        let class = ComponentClass::builder(name.as_str())
            .template(src)
            .build(&registry)
            .with_context(|| format!("failed to compile {}", input.display()))?;
        log::debug!("{} compiled as `{name}`", input.display());

        let template = class.template();
        out.push(Checked {
            path: input.clone(),
            name: name.clone(),
            nodes: template.len(),
            slots: template.slots().iter().cloned().collect(),
            outline: template.outline(),
        });
        registry.register(name, &class);
    }
    Ok(out)
}

/// `weft check`: compile every input and print a line per file, plus the
/// node outline with `tree`.
pub fn check_cmd(inputs: &[PathBuf], tree: bool) -> Result<()> {
    for checked in check_files(inputs)? {
        let slots = if checked.slots.is_empty() {
            String::new()
        } else {
            format!(", slots: {}", checked.slots.join(" "))
        };
        println!(
            "ok: {} as <{}> ({} nodes{slots})",
            checked.path.display(),
            checked.name,
            checked.nodes
        );
        if tree {
            print!("{}", checked.outline);
        }
    }
    Ok(())
}
