use askama::Template;

/// One generated bindings file: header, imports, one impl per type.
#[derive(Template)]
#[template(path = "bindings.rs.txt", escape = "none")]
pub(super) struct BindingsFile {
    /// Rendered `use` lines
    pub imports: Vec<String>,
    /// Rendered `impl BindParameters` blocks
    pub impls: Vec<String>,
}

impl BindingsFile {
    /// Renders with exactly one trailing newline.
    pub(super) fn render_source(&self) -> askama::Result<String> {
        let mut out = self.render()?;
        out.truncate(out.trim_end().len());
        out.push('\n');
        Ok(out)
    }
}
