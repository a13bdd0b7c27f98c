//! Plain-text rendering of a resume.

use crate::models::resume::Resume;

pub const SUMMARY_HEADER: &str = "PROFESSIONAL SUMMARY";
pub const EXPERIENCE_HEADER: &str = "EXPERIENCE";
pub const EDUCATION_HEADER: &str = "EDUCATION";
pub const SKILLS_HEADER: &str = "SKILLS";

/// Renders the resume as UTF-8 text.
///
/// Layout: name, contact line, then summary, experience, education and skills
/// sections, each under an upper-case header. Sections with no entries keep
/// their header. The skills line is the last line of the output.
pub fn format_as_text(resume: &Resume) -> String {
    let mut lines: Vec<String> = Vec::new();
    let info = &resume.personal_info;

    lines.push(info.full_name.clone());
    lines.push(info.contact_line());
    lines.push(String::new());

    lines.push(SUMMARY_HEADER.to_string());
    lines.push(resume.summary.clone());
    lines.push(String::new());

    lines.push(EXPERIENCE_HEADER.to_string());
    push_blocks(
        &mut lines,
        resume.experience.iter().map(|exp| {
            [
                exp.company.clone(),
                exp.position.clone(),
                exp.date_range(),
                exp.description.clone(),
            ]
        }),
    );
    lines.push(String::new());

    lines.push(EDUCATION_HEADER.to_string());
    push_blocks(
        &mut lines,
        resume.education.iter().map(|edu| {
            [
                edu.school.clone(),
                edu.degree.clone(),
                edu.graduation_date.clone(),
            ]
        }),
    );
    lines.push(String::new());

    lines.push(SKILLS_HEADER.to_string());
    lines.push(resume.skills.join(", "));

    let mut text = lines.join("\n");
    text.push('\n');
    text
}

/// Appends entry blocks, separated from each other by one blank line.
fn push_blocks<const N: usize>(
    lines: &mut Vec<String>,
    blocks: impl Iterator<Item = [String; N]>,
) {
    for (i, block) in blocks.enumerate() {
        if i > 0 {
            lines.push(String::new());
        }
        lines.extend(block);
    }
}
