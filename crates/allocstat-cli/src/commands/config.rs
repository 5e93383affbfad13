//! `allocstat config` — print the effective status priorities.

pub fn run(config: Option<&str>) -> anyhow::Result<()> {
    print!("{}", render(config)?);
    Ok(())
}

pub fn render(config: Option<&str>) -> anyhow::Result<String> {
    let priorities = super::load_priorities(config)?;
    Ok(priorities.to_toml_string()?)
}
