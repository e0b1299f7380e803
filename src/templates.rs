//! Starter files pushed into every new site repository.
//!
//! The files live under `templates/` and are compiled into the binary with
//! `rust-embed`, so a deployed server needs nothing on disk.

use rust_embed::RustEmbed;

use crate::errors::SiteError;

#[derive(RustEmbed)]
#[folder = "$CARGO_MANIFEST_DIR/templates/"]
struct Assets;

/// Placeholder in `index.html` replaced by the site's display name.
pub const DISPLAY_NAME_PLACEHOLDER: &str = "My Site";

/// `(embedded path, repository path)` in push order. The workflow goes last
/// so the first dispatch happens as late as possible after it lands.
const FILES: &[(&str, &str)] = &[
    ("index.html", "index.html"),
    ("CLAUDE.md", "CLAUDE.md"),
    ("netlify.toml", "netlify.toml"),
    ("workflows/ai-edit.yml", ".github/workflows/ai-edit.yml"),
];

/// One file to commit into a new repository.
#[derive(Debug, Clone, PartialEq)]
pub struct TemplateFile {
    pub path: &'static str,
    pub content: String,
}

/// Render the starter files for a site shown as `display_name`.
pub fn site_files(display_name: &str) -> Result<Vec<TemplateFile>, SiteError> {
    FILES
        .iter()
        .map(|(embedded, path)| {
            let file = Assets::get(embedded).ok_or_else(|| SiteError::MissingTemplate {
                path: embedded.to_string(),
            })?;
            let mut content = String::from_utf8_lossy(&file.data).into_owned();
            if *path == "index.html" {
                content = content.replace(DISPLAY_NAME_PLACEHOLDER, display_name);
            }
            Ok(TemplateFile { path, content })
        })
        .collect()
}
