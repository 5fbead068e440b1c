//! PDF rendering: lays a title and plain-text body out as a paginated A4
//! document, entirely in memory.

use printpdf::{
    BuiltinFont, Mm, Op, PdfDocument, PdfPage, PdfSaveOptions, Point, Pt, TextItem,
};
use tracing::debug;

use crate::contract::{RenderError, Renderer};

const PAGE_WIDTH_MM: f32 = 210.0;
const PAGE_HEIGHT_MM: f32 = 297.0;
const MARGIN_MM: f32 = 15.0;
const TITLE_SIZE_PT: f32 = 14.0;
const BODY_SIZE_PT: f32 = 10.0;
const LINE_HEIGHT_PT: f32 = 12.0;
const MAX_LINE_CHARS: usize = 95;
const LINES_PER_PAGE: usize = 60;

/// Renders with a built-in font; font and styling are presentation detail,
/// not part of the synchronisation contract.
pub struct PdfRenderer;

impl PdfRenderer {
    pub fn new() -> Self {
        Self
    }
}

impl Default for PdfRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl Renderer for PdfRenderer {
    fn render(&self, title: &str, body_text: &str) -> Result<Vec<u8>, RenderError> {
        if title.trim().is_empty() && body_text.trim().is_empty() {
            return Err(RenderError::EmptyInput);
        }

        let lines: Vec<String> = body_text
            .lines()
            .flat_map(|line| wrap_line(line, MAX_LINE_CHARS))
            .collect();

        let mut pages = Vec::new();
        if lines.is_empty() {
            // an empty body still produces one page carrying the title
            pages.push(layout_page(Some(title), &[]));
        } else {
            for (i, chunk) in lines.chunks(LINES_PER_PAGE).enumerate() {
                pages.push(layout_page(if i == 0 { Some(title) } else { None }, chunk));
            }
        }

        let mut warnings = Vec::new();
        let bytes = PdfDocument::new(title)
            .with_pages(pages)
            .save(&PdfSaveOptions::default(), &mut warnings);
        debug!(
            title,
            bytes = bytes.len(),
            warnings = warnings.len(),
            "Rendered PDF document"
        );
        Ok(bytes)
    }
}

fn layout_page(title: Option<&str>, lines: &[String]) -> PdfPage {
    let mut ops = vec![
        Op::StartTextSection,
        Op::SetTextCursor {
            pos: Point {
                x: Mm(MARGIN_MM).into_pt(),
                y: Mm(PAGE_HEIGHT_MM - MARGIN_MM).into_pt(),
            },
        },
        Op::SetLineHeight {
            lh: Pt(LINE_HEIGHT_PT),
        },
    ];
    if let Some(title) = title {
        ops.push(Op::SetFontSizeBuiltinFont {
            size: Pt(TITLE_SIZE_PT),
            font: BuiltinFont::HelveticaBold,
        });
        ops.push(Op::WriteTextBuiltinFont {
            items: vec![TextItem::Text(title.to_string())],
            font: BuiltinFont::HelveticaBold,
        });
        ops.push(Op::AddLineBreak);
        ops.push(Op::AddLineBreak);
    }
    ops.push(Op::SetFontSizeBuiltinFont {
        size: Pt(BODY_SIZE_PT),
        font: BuiltinFont::Helvetica,
    });
    for line in lines {
        ops.push(Op::WriteTextBuiltinFont {
            items: vec![TextItem::Text(line.clone())],
            font: BuiltinFont::Helvetica,
        });
        ops.push(Op::AddLineBreak);
    }
    ops.push(Op::EndTextSection);
    PdfPage::new(Mm(PAGE_WIDTH_MM), Mm(PAGE_HEIGHT_MM), ops)
}

/// Naive word wrap; words longer than the limit are split hard so a single
/// token cannot overflow the page.
fn wrap_line(line: &str, max_chars: usize) -> Vec<String> {
    if line.trim().is_empty() {
        return vec![String::new()];
    }
    let mut out = Vec::new();
    let mut current = String::new();
    for word in line.split_whitespace() {
        let word_len = word.chars().count();
        if word_len > max_chars {
            if !current.is_empty() {
                out.push(std::mem::take(&mut current));
            }
            let chars: Vec<char> = word.chars().collect();
            for piece in chars.chunks(max_chars) {
                out.push(piece.iter().collect());
            }
            continue;
        }
        let current_len = current.chars().count();
        if current_len == 0 {
            current.push_str(word);
        } else if current_len + 1 + word_len <= max_chars {
            current.push(' ');
            current.push_str(word);
        } else {
            out.push(std::mem::take(&mut current));
            current.push_str(word);
        }
    }
    if !current.is_empty() {
        out.push(current);
    }
    out
}
