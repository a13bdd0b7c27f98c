//! Rich-text rendering of a resume: paragraphs of styled runs, packed as DOCX.

use bytes::Bytes;
use serde::Serialize;
use tracing::debug;

use crate::export::docx;
use crate::export::error::ExportError;
use crate::export::{ExportArtifact, ExportFormat};
use crate::models::resume::Resume;

/// Run font size in WordprocessingML half-points.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RunSize {
    /// Document default.
    Body,
    /// 12pt, contact line.
    Medium,
    /// 14pt, section headings.
    Heading,
    /// 16pt, the candidate's name.
    Large,
}

impl RunSize {
    pub fn half_points(self) -> Option<u32> {
        match self {
            RunSize::Body => None,
            RunSize::Medium => Some(24),
            RunSize::Heading => Some(28),
            RunSize::Large => Some(32),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TextRun {
    /// `\n` inside the text is emitted as a line break.
    pub text: String,
    pub bold: bool,
    pub size: RunSize,
}

impl TextRun {
    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            bold: false,
            size: RunSize::Body,
        }
    }

    pub fn bold(text: impl Into<String>, size: RunSize) -> Self {
        Self {
            text: text.into(),
            bold: true,
            size,
        }
    }

    pub fn sized(text: impl Into<String>, size: RunSize) -> Self {
        Self {
            text: text.into(),
            bold: false,
            size,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Paragraph {
    pub runs: Vec<TextRun>,
}

impl Paragraph {
    pub fn single(run: TextRun) -> Self {
        Self { runs: vec![run] }
    }

    fn separator() -> Self {
        Self::single(TextRun::plain("\n"))
    }

    fn heading(title: &str) -> Self {
        Self::single(TextRun::bold(title, RunSize::Heading))
    }
}

/// Builds the paragraph sequence for a resume.
///
/// Sections appear in fixed order: name, contact, summary, experience,
/// education, skills. Each section after the header is a separator, a
/// heading, then one paragraph per entry.
pub fn build_document(resume: &Resume) -> Vec<Paragraph> {
    let info = &resume.personal_info;
    let mut paragraphs = vec![
        Paragraph::single(TextRun::bold(&info.full_name, RunSize::Large)),
        Paragraph::single(TextRun::sized(info.contact_line(), RunSize::Medium)),
        Paragraph::separator(),
        Paragraph::heading("Professional Summary"),
        Paragraph::single(TextRun::plain(&resume.summary)),
    ];

    paragraphs.push(Paragraph::separator());
    paragraphs.push(Paragraph::heading("Experience"));
    paragraphs.extend(resume.experience.iter().map(|exp| Paragraph {
        runs: vec![
            TextRun::bold(&exp.company, RunSize::Body),
            TextRun::plain(format!(
                "\n{}\n{}\n{}",
                exp.position,
                exp.date_range(),
                exp.description
            )),
        ],
    }));

    paragraphs.push(Paragraph::separator());
    paragraphs.push(Paragraph::heading("Education"));
    paragraphs.extend(resume.education.iter().map(|edu| Paragraph {
        runs: vec![
            TextRun::bold(&edu.school, RunSize::Body),
            TextRun::plain(format!("\n{}\n{}", edu.degree, edu.graduation_date)),
        ],
    }));

    paragraphs.push(Paragraph::separator());
    paragraphs.push(Paragraph::heading("Skills"));
    paragraphs.extend(
        resume
            .skills
            .iter()
            .map(|skill| Paragraph::single(TextRun::plain(skill))),
    );

    paragraphs
}

/// Renders the resume as a complete `.docx` artifact.
///
/// Packing is CPU-bound and runs on the blocking pool. The artifact is only
/// produced once the whole archive has been written.
pub async fn format_as_document(resume: &Resume) -> Result<ExportArtifact, ExportError> {
    let paragraphs = build_document(resume);
    let paragraph_count = paragraphs.len();

    let bytes = tokio::task::spawn_blocking(move || docx::pack(&paragraphs)).await??;

    debug!(
        "Packed DOCX: {} paragraphs, {} bytes",
        paragraph_count,
        bytes.len()
    );

    Ok(ExportArtifact::new(ExportFormat::Docx, Bytes::from(bytes)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::resume::{Education, Experience, PersonalInfo};
    use std::io::Read;

    fn sample() -> Resume {
        Resume {
            personal_info: PersonalInfo {
                full_name: "Jane Roe".to_string(),
                email: "jane@x.com".to_string(),
                phone: "555-0100".to_string(),
                location: "Austin, TX".to_string(),
            },
            summary: "Engineer.".to_string(),
            experience: vec![
                Experience {
                    company: "Acme".to_string(),
                    position: "Dev".to_string(),
                    start_date: "2021".to_string(),
                    end_date: "2023".to_string(),
                    description: "Built things.".to_string(),
                },
                Experience {
                    company: "Globex".to_string(),
                    ..Default::default()
                },
            ],
            education: vec![Education {
                school: "State U".to_string(),
                degree: "BS CS".to_string(),
                graduation_date: "2021".to_string(),
            }],
            skills: vec!["Go".to_string(), "".to_string(), "Rust".to_string()],
            ..Default::default()
        }
    }

    fn first_text(p: &Paragraph) -> &str {
        &p.runs[0].text
    }

    #[test]
    fn test_header_paragraphs_match_styles() {
        let doc = build_document(&sample());

        assert_eq!(doc[0].runs, vec![TextRun::bold("Jane Roe", RunSize::Large)]);
        assert_eq!(
            doc[1].runs,
            vec![TextRun::sized("jane@x.com | 555-0100 | Austin, TX", RunSize::Medium)]
        );
        assert_eq!(first_text(&doc[2]), "\n");
        assert_eq!(
            doc[3].runs,
            vec![TextRun::bold("Professional Summary", RunSize::Heading)]
        );
        assert_eq!(doc[4].runs, vec![TextRun::plain("Engineer.")]);
    }

    #[test]
    fn test_sections_follow_fixed_order_with_one_paragraph_per_entry() {
        let doc = build_document(&sample());
        let headings: Vec<&str> = doc
            .iter()
            .filter(|p| p.runs[0].size == RunSize::Heading)
            .map(first_text)
            .collect();
        assert_eq!(
            headings,
            vec!["Professional Summary", "Experience", "Education", "Skills"]
        );

        let exp = doc.iter().position(|p| first_text(p) == "Experience").unwrap();
        assert_eq!(first_text(&doc[exp + 1]), "Acme");
        assert_eq!(first_text(&doc[exp + 2]), "Globex");
        assert_eq!(doc[exp + 1].runs[1].text, "\nDev\n2021 - 2023\nBuilt things.");

        let skills = doc.iter().position(|p| first_text(p) == "Skills").unwrap();
        let skill_texts: Vec<&str> = doc[skills + 1..].iter().map(first_text).collect();
        assert_eq!(skill_texts, vec!["Go", "", "Rust"]);
    }

    #[test]
    fn test_empty_sections_keep_headings() {
        let doc = build_document(&Resume::default());
        // name, contact, sep, summary heading, summary, then sep + heading for three sections
        assert_eq!(doc.len(), 11);
        assert_eq!(first_text(doc.last().unwrap()), "Skills");
    }

    #[tokio::test]
    async fn test_format_as_document_produces_complete_package() {
        let artifact = format_as_document(&sample()).await.unwrap();
        assert_eq!(artifact.filename, "resume.docx");

        let mut archive = zip::ZipArchive::new(std::io::Cursor::new(artifact.bytes.to_vec())).unwrap();
        let mut xml = String::new();
        archive
            .by_name("word/document.xml")
            .unwrap()
            .read_to_string(&mut xml)
            .unwrap();

        assert!(xml.contains("<w:b/><w:sz w:val=\"32\"/>"));
        assert!(xml.contains(">Jane Roe</w:t>"));
        assert!(xml.contains(">Built things.</w:t>"));
        assert!(archive.by_name("[Content_Types].xml").is_ok());
        assert!(archive.by_name("_rels/.rels").is_ok());
    }

    #[tokio::test]
    async fn test_pasted_control_characters_still_produce_valid_xml() {
        let mut resume = sample();
        resume.summary = "Led team\u{0B}shipped\u{1}".to_string();

        let artifact = format_as_document(&resume).await.unwrap();
        let mut archive = zip::ZipArchive::new(std::io::Cursor::new(artifact.bytes.to_vec())).unwrap();
        let mut xml = String::new();
        archive
            .by_name("word/document.xml")
            .unwrap()
            .read_to_string(&mut xml)
            .unwrap();

        let doc = roxmltree::Document::parse(&xml).unwrap();
        assert!(doc
            .descendants()
            .any(|n| n.has_tag_name("t") && n.text() == Some("shipped")));
    }

    /// A sink that refuses every write, like a full disk.
    struct RejectingWriter;

    impl std::io::Write for RejectingWriter {
        fn write(&mut self, _buf: &[u8]) -> std::io::Result<usize> {
            Err(std::io::Error::new(std::io::ErrorKind::Other, "disk full"))
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    impl std::io::Seek for RejectingWriter {
        fn seek(&mut self, _pos: std::io::SeekFrom) -> std::io::Result<u64> {
            Ok(0)
        }
    }

    #[test]
    fn test_encoding_failure_yields_error_not_partial_package() {
        let paragraphs = build_document(&sample());
        let result = docx::pack_into(&paragraphs, RejectingWriter);
        assert!(matches!(result, Err(ExportError::Encoding(_))));
    }

    #[tokio::test]
    async fn test_format_as_document_is_deterministic() {
        let a = format_as_document(&sample()).await.unwrap();
        let b = format_as_document(&sample()).await.unwrap();
        assert_eq!(a.bytes, b.bytes);
    }
}
