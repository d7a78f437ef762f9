use handlebars::Handlebars;
use rust_embed::RustEmbed;
use serde::Serialize;

// Embed the page templates into the binary
#[derive(RustEmbed)]
#[folder = "templates/"]
struct TemplateAssets;

pub const CAPTURE_PAGE: &str = "capture";
pub const RECORD_PAGE: &str = "record";

const PAGES: [(&str, &str); 2] = [(CAPTURE_PAGE, "capture.html"), (RECORD_PAGE, "record.html")];

#[derive(Debug, thiserror::Error)]
pub enum TemplateLoadError {
    #[error("template file `{0}` is not embedded")]
    Missing(&'static str),
    #[error("template file `{0}` is not UTF-8")]
    NotUtf8(&'static str),
    #[error(transparent)]
    Parse(#[from] handlebars::TemplateError),
}

/// Compiled HTML templates. Values are HTML-escaped on render.
pub struct Templates {
    registry: Handlebars<'static>,
}

impl Templates {
    pub fn load() -> Result<Self, TemplateLoadError> {
        let mut registry = Handlebars::new();

        for (name, file) in PAGES {
            let asset = TemplateAssets::get(file).ok_or(TemplateLoadError::Missing(file))?;
            let source = std::str::from_utf8(&asset.data).map_err(|_| TemplateLoadError::NotUtf8(file))?;
            registry.register_template_string(name, source)?;
        }

        Ok(Self { registry })
    }

    pub fn render<T: Serialize>(&self, name: &str, data: &T) -> Result<String, handlebars::RenderError> {
        self.registry.render(name, data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::views::CapturePage;

    #[test]
    fn capture_page_escapes_url() {
        let templates = Templates::load().unwrap();
        let html = templates
            .render(
                CAPTURE_PAGE,
                &CapturePage { url: "http://h/<script>".to_string() },
            )
            .unwrap();

        assert!(html.contains("http://h/&lt;script&gt;"));
        assert!(!html.contains("<script>"));
    }
}
