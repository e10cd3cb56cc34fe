//! Turns plain CV text into styled blocks following a Harvard-style layout:
//! centred name and contact line, bold canonical section headings, bold organisation
//! lines, bullets and body paragraphs.

/// Visual role of a block. Each kind maps to one fixed style.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockKind {
    Title,
    Contact,
    Section,
    Organization,
    Bullet,
    Paragraph,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Align {
    Left,
    Center,
}

/// Typography for one block kind. All lengths are in points.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BlockStyle {
    pub bold: bool,
    pub size: f32,
    pub align: Align,
    pub indent: f32,
    pub space_before: f32,
    pub space_after: f32,
}

impl BlockKind {
    pub fn style(self) -> BlockStyle {
        let base = BlockStyle {
            bold: false,
            size: 10.0,
            align: Align::Left,
            indent: 0.0,
            space_before: 0.0,
            space_after: 6.0,
        };
        match self {
            BlockKind::Title => BlockStyle {
                bold: true,
                size: 16.0,
                align: Align::Center,
                ..base
            },
            BlockKind::Contact => BlockStyle {
                align: Align::Center,
                space_after: 12.0,
                ..base
            },
            BlockKind::Section => BlockStyle {
                bold: true,
                size: 12.0,
                space_before: 12.0,
                ..base
            },
            BlockKind::Organization => BlockStyle {
                bold: true,
                size: 11.0,
                space_after: 2.0,
                ..base
            },
            BlockKind::Bullet => BlockStyle {
                indent: 18.0,
                space_after: 4.0,
                ..base
            },
            BlockKind::Paragraph => base,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum LayoutBlock {
    Text { kind: BlockKind, text: String },
    /// Vertical gap in points.
    Spacer(f32),
}

impl LayoutBlock {
    fn text(kind: BlockKind, text: impl Into<String>) -> Self {
        LayoutBlock::Text {
            kind,
            text: text.into(),
        }
    }
}

/// 0.2 inch below the header.
const HEADER_GAP: f32 = 14.4;
/// 0.1 inch before every section after the first.
const SECTION_GAP: f32 = 7.2;
const HEADER_SCAN_LINES: usize = 5;
const CONTENT_START_LINE: usize = 3;
const MAX_CONTACT_PARTS: usize = 3;
const MAX_ORGANIZATION_WORDS: usize = 8;

/// Keyword groups and the canonical heading they produce, checked in order.
const SECTION_KEYWORDS: &[(&[&str], &str)] = &[
    (&["education", "formation", "études", "diplôme"], "Education"),
    (&["experience", "expérience", "emploi", "travail"], "Experience"),
    (
        &["leadership", "activité", "activités", "projet", "projets"],
        "Leadership and Activities",
    ),
    (
        &["skill", "compétence", "langue", "technique"],
        "Skills & Interests",
    ),
];

const CONTACT_MARKERS: &[&str] = &["@", "phone", "téléphone", "tel", "+"];

/// Lays out `cv_text` as a sequence of styled blocks.
///
/// The header is taken from the first five non-empty lines: the first becomes the
/// title, and the next two join the contact line when they look like contact details.
/// Body classification starts at the fourth raw line.
pub fn layout_cv(cv_text: &str) -> Vec<LayoutBlock> {
    let lines: Vec<&str> = cv_text.lines().collect();
    let mut blocks = Vec::new();

    let header: Vec<&str> = lines
        .iter()
        .take(HEADER_SCAN_LINES)
        .map(|l| l.trim())
        .filter(|l| !l.is_empty())
        .collect();

    if let Some(name) = header.first() {
        blocks.push(LayoutBlock::text(BlockKind::Title, *name));

        let contact: Vec<&str> = header
            .iter()
            .skip(1)
            .take(2)
            .copied()
            .filter(|l| looks_like_contact(l))
            .take(MAX_CONTACT_PARTS)
            .collect();
        if !contact.is_empty() {
            blocks.push(LayoutBlock::text(BlockKind::Contact, contact.join(" • ")));
        }
        blocks.push(LayoutBlock::Spacer(HEADER_GAP));
    }

    let mut in_section = false;
    for line in lines.iter().skip(CONTENT_START_LINE) {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        if let Some(rest) = bullet_body(line) {
            blocks.push(LayoutBlock::text(BlockKind::Bullet, format!("• {rest}")));
            continue;
        }

        if let Some(heading) = canonical_section(line) {
            if in_section {
                blocks.push(LayoutBlock::Spacer(SECTION_GAP));
            }
            blocks.push(LayoutBlock::text(BlockKind::Section, heading));
            in_section = true;
            continue;
        }

        let starts_lowercase = line.chars().next().is_some_and(char::is_lowercase);
        let kind = if !starts_lowercase && line.split_whitespace().count() <= MAX_ORGANIZATION_WORDS
        {
            BlockKind::Organization
        } else {
            BlockKind::Paragraph
        };
        blocks.push(LayoutBlock::text(kind, line));
    }

    blocks
}

fn looks_like_contact(line: &str) -> bool {
    let lower = line.to_lowercase();
    CONTACT_MARKERS.iter().any(|m| lower.contains(m)) || line.chars().count() < 60
}

fn bullet_body(line: &str) -> Option<&str> {
    if line.starts_with('-') || line.starts_with('•') {
        Some(line.trim_start_matches(['-', ' ', '•']))
    } else {
        None
    }
}

fn canonical_section(line: &str) -> Option<&'static str> {
    let lower = line.to_lowercase();
    SECTION_KEYWORDS
        .iter()
        .find(|(keywords, _)| keywords.iter().any(|k| lower.contains(k)))
        .map(|(_, heading)| *heading)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(blocks: &[LayoutBlock]) -> Vec<Option<BlockKind>> {
        blocks
            .iter()
            .map(|b| match b {
                LayoutBlock::Text { kind, .. } => Some(*kind),
                LayoutBlock::Spacer(_) => None,
            })
            .collect()
    }

    fn texts(blocks: &[LayoutBlock], wanted: BlockKind) -> Vec<&str> {
        blocks
            .iter()
            .filter_map(|b| match b {
                LayoutBlock::Text { kind, text } if *kind == wanted => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }

    const CV: &str = "Jane Doe\n\
                      jane@example.com\n\
                      +33 6 12 34 56 78\n\
                      PROFESSIONAL EXPERIENCE\n\
                      Acme Corp, Paris\n\
                      - Built payment APIs in Rust\n\
                      • Cut latency by 40%\n\
                      \n\
                      led a team of four engineers across two time zones on the migration project work\n\
                      EDUCATION\n\
                      MSc Computer Science\n\
                      Compétences techniques\n\
                      Rust, SQL";

    #[test]
    fn test_header_title_and_contact() {
        let blocks = layout_cv(CV);
        assert_eq!(
            blocks[0],
            LayoutBlock::text(BlockKind::Title, "Jane Doe")
        );
        assert_eq!(
            blocks[1],
            LayoutBlock::text(BlockKind::Contact, "jane@example.com • +33 6 12 34 56 78")
        );
        assert_eq!(blocks[2], LayoutBlock::Spacer(HEADER_GAP));
    }

    #[test]
    fn test_sections_are_canonical() {
        let blocks = layout_cv(CV);
        assert_eq!(
            texts(&blocks, BlockKind::Section),
            vec!["Experience", "Education", "Skills & Interests"]
        );
    }

    #[test]
    fn test_spacer_only_between_sections() {
        let blocks = layout_cv(CV);
        let k = kinds(&blocks);
        let first_section = k
            .iter()
            .position(|k| *k == Some(BlockKind::Section))
            .unwrap();
        assert_eq!(blocks[first_section - 1], LayoutBlock::Spacer(HEADER_GAP));
        let spacers = blocks
            .iter()
            .filter(|b| **b == LayoutBlock::Spacer(SECTION_GAP))
            .count();
        assert_eq!(spacers, 2);
    }

    #[test]
    fn test_bullets_are_normalized() {
        let blocks = layout_cv(CV);
        assert_eq!(
            texts(&blocks, BlockKind::Bullet),
            vec!["• Built payment APIs in Rust", "• Cut latency by 40%"]
        );
    }

    #[test]
    fn test_organization_and_paragraph() {
        let blocks = layout_cv(CV);
        let orgs = texts(&blocks, BlockKind::Organization);
        assert!(orgs.contains(&"Acme Corp, Paris"));
        assert!(orgs.contains(&"MSc Computer Science"));
        assert!(orgs.contains(&"Rust, SQL"));
        let paragraphs = texts(&blocks, BlockKind::Paragraph);
        assert_eq!(paragraphs.len(), 1);
        assert!(paragraphs[0].starts_with("led a team"));
    }

    #[test]
    fn test_long_capitalized_line_is_paragraph() {
        let cv = "Name\n\n\nSummary\nDelivered nine separate production services for clients in banking and retail";
        let blocks = layout_cv(cv);
        assert_eq!(texts(&blocks, BlockKind::Paragraph).len(), 1);
        assert_eq!(texts(&blocks, BlockKind::Organization), vec!["Summary"]);
    }

    #[test]
    fn test_long_header_line_without_markers_is_not_contact() {
        let long = "A".repeat(70);
        let cv = format!("Jane Doe\n{long}\n");
        let blocks = layout_cv(&cv);
        assert!(texts(&blocks, BlockKind::Contact).is_empty());
    }

    #[test]
    fn test_empty_text_yields_no_blocks() {
        assert!(layout_cv("").is_empty());
        assert!(layout_cv("\n\n  \n").is_empty());
    }

    #[test]
    fn test_styles() {
        assert_eq!(BlockKind::Title.style().size, 16.0);
        assert_eq!(BlockKind::Title.style().align, Align::Center);
        assert!(BlockKind::Section.style().bold);
        assert_eq!(BlockKind::Bullet.style().indent, 18.0);
        assert!(!BlockKind::Paragraph.style().bold);
    }
}
