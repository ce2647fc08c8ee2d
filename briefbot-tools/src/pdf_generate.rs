//! PDF report rendering with genpdf.

use async_trait::async_trait;
use briefbot_core::adapters::ReportRenderer;
use briefbot_core::config::ReportConfig;
use briefbot_core::error::FlowError;
use briefbot_core::types::{Report, Summary};
use genpdf::elements::{Break, Paragraph, UnorderedList};
use genpdf::fonts::{FontData, FontFamily};
use genpdf::style::{Style, StyledString};
use genpdf::{Document, PaperSize, SimplePageDecorator};
use std::path::PathBuf;
use tracing::debug;

/// System locations tried after the configured font, in order.
const FALLBACK_FONTS: &[(&str, &str)] = &[
    ("", "LiberationSans"),
    ("/usr/share/fonts/truetype/liberation", "LiberationSans"),
    ("/usr/share/fonts/liberation-sans", "LiberationSans"),
    ("/usr/share/fonts/truetype/dejavu", "DejaVuSans"),
    ("/System/Library/Fonts", "Helvetica"),
    ("/Library/Fonts", "Arial"),
];

/// [`ReportRenderer`] that lays out a summary as a single-column PDF.
pub struct GenPdfRenderer {
    font_dir: Option<PathBuf>,
    font_family: String,
    filename: String,
}

impl GenPdfRenderer {
    pub fn new(config: &ReportConfig) -> Self {
        Self {
            font_dir: config.font_dir.clone(),
            font_family: config.font_family.clone(),
            filename: config.filename.clone(),
        }
    }

    /// Font directories and family names to try, configured one first.
    fn font_candidates(&self) -> Vec<(PathBuf, String)> {
        let mut candidates = Vec::with_capacity(FALLBACK_FONTS.len() + 1);
        if let Some(dir) = &self.font_dir {
            candidates.push((dir.clone(), self.font_family.clone()));
        }
        candidates.extend(
            FALLBACK_FONTS
                .iter()
                .map(|(dir, family)| (PathBuf::from(dir), family.to_string())),
        );
        candidates
    }
}

fn load_font_family(candidates: &[(PathBuf, String)]) -> Result<FontFamily<FontData>, FlowError> {
    for (dir, family) in candidates {
        match genpdf::fonts::from_files(dir, family, None) {
            Ok(fonts) => {
                debug!(dir = %dir.display(), family = family.as_str(), "Loaded report font");
                return Ok(fonts);
            }
            Err(e) => debug!(dir = %dir.display(), family = family.as_str(), error = %e, "Font not usable"),
        }
    }
    Err(FlowError::RenderFailed {
        message: format!(
            "No usable font found (tried {} locations); set report.font_dir",
            candidates.len()
        ),
    })
}

/// Lay out the report and render it to bytes.
fn render_document(
    fonts: FontFamily<FontData>,
    topic: &str,
    summary: &Summary,
) -> Result<Vec<u8>, FlowError> {
    let title = format!("Research Summary for: {}", topic);

    let mut doc = Document::new(fonts);
    doc.set_title(title.clone());
    doc.set_paper_size(PaperSize::Letter);

    let mut decorator = SimplePageDecorator::new();
    decorator.set_margins(25);
    doc.set_page_decorator(decorator);

    let title_style = Style::new().bold().with_font_size(18);
    doc.push(Paragraph::new(StyledString::new(title, title_style)));
    doc.push(Break::new(1));

    let mut bullets = UnorderedList::new();
    for bullet in &summary.bullets {
        bullets.push(Paragraph::new(bullet.as_str()));
    }
    doc.push(bullets);

    if !summary.sources.is_empty() {
        doc.push(Break::new(1));
        let heading_style = Style::new().bold().with_font_size(13);
        doc.push(Paragraph::new(StyledString::new("Sources".to_string(), heading_style)));
        doc.push(Break::new(0.5));
        for (i, source) in summary.sources.iter().enumerate() {
            doc.push(Paragraph::new(format!("{}. {}", i + 1, source.title)));
            doc.push(Paragraph::new(StyledString::new(
                source.url.clone(),
                Style::new().italic().with_font_size(9),
            )));
            doc.push(Break::new(0.3));
        }
    }

    let mut buf = Vec::new();
    doc.render(&mut buf).map_err(|e| FlowError::RenderFailed {
        message: format!("Failed to render PDF: {}", e),
    })?;
    Ok(buf)
}

#[async_trait]
impl ReportRenderer for GenPdfRenderer {
    async fn render(&self, topic: &str, summary: &Summary) -> Result<Report, FlowError> {
        let candidates = self.font_candidates();
        let topic_owned = topic.to_string();
        let summary = summary.clone();

        // Font loading and layout are blocking and CPU-bound.
        let bytes = tokio::task::spawn_blocking(move || {
            let fonts = load_font_family(&candidates)?;
            render_document(fonts, &topic_owned, &summary)
        })
        .await
        .map_err(|e| FlowError::RenderFailed {
            message: format!("Render task failed: {}", e),
        })??;

        debug!(bytes = bytes.len(), "Rendered PDF report");
        Ok(Report::new(topic, bytes).with_filename(self.filename.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use briefbot_core::types::SourceLink;

    fn summary() -> Summary {
        Summary::new(
            "quantum computing",
            vec!["Qubits use superposition.".into(), "Error correction is hard.".into()],
        )
        .with_sources(vec![SourceLink {
            title: "Qubit".into(),
            url: "https://en.wikipedia.org/wiki/Qubit".into(),
        }])
    }

    #[test]
    fn test_configured_font_is_tried_first() {
        let dir = tempfile::TempDir::new().unwrap();
        let renderer = GenPdfRenderer::new(&ReportConfig {
            font_dir: Some(dir.path().to_path_buf()),
            font_family: "MyFont".into(),
            ..Default::default()
        });
        let candidates = renderer.font_candidates();
        assert_eq!(candidates[0], (dir.path().to_path_buf(), "MyFont".to_string()));
        assert_eq!(candidates.len(), FALLBACK_FONTS.len() + 1);
    }

    #[test]
    fn test_no_font_dir_uses_fallbacks_only() {
        let renderer = GenPdfRenderer::new(&ReportConfig::default());
        assert_eq!(renderer.font_candidates().len(), FALLBACK_FONTS.len());
    }

    #[test]
    fn test_missing_fonts_are_render_failures() {
        let dir = tempfile::TempDir::new().unwrap();
        let candidates = vec![(dir.path().to_path_buf(), "Nope".to_string())];
        match load_font_family(&candidates) {
            Err(FlowError::RenderFailed { message }) => assert!(message.contains("font")),
            Err(other) => panic!("unexpected error: {other:?}"),
            Ok(_) => panic!("empty directory should have no fonts"),
        }
    }

    // Needs a TrueType font on the host; skips itself otherwise.
    #[tokio::test]
    async fn test_render_produces_pdf_when_fonts_available() {
        let renderer = GenPdfRenderer::new(&ReportConfig::default());
        match renderer.render("quantum computing", &summary()).await {
            Ok(report) => {
                assert!(report.bytes.starts_with(b"%PDF"));
                assert_eq!(report.filename, "research_summary.pdf");
                assert_eq!(report.topic, "quantum computing");
            }
            Err(FlowError::RenderFailed { message }) if message.contains("No usable font") => {}
            Err(other) => panic!("unexpected error: {other:?}"),
        }
    }
}
