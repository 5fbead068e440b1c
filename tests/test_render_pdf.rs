use wiki_mirror::contract::{RenderError, Renderer};
use wiki_mirror::render::PdfRenderer;

#[test]
fn render_produces_valid_pdf() {
    let renderer = PdfRenderer::new();

    let bytes = renderer
        .render("Team handbook", "line one\nline two\n\nsecond paragraph")
        .expect("PDF rendering failed");

    // Assert output is non-trivial and carries the PDF signature
    assert!(
        bytes.len() > 100,
        "Output PDF is too small and may be empty"
    );
    assert_eq!(&bytes[0..4], b"%PDF", "PDF output missing magic header");
}

#[test]
fn render_handles_placeholder_body() {
    let renderer = PdfRenderer::new();
    let bytes = renderer
        .render("Empty page", "(no content)")
        .expect("PDF rendering failed");
    assert_eq!(&bytes[0..4], b"%PDF");
}

#[test]
fn render_paginates_long_bodies() {
    let renderer = PdfRenderer::new();
    let short = renderer.render("Short", "one line").expect("render failed");
    let body = "a line of body text that should appear on some page\n".repeat(500);
    let long = renderer.render("Long", &body).expect("render failed");
    assert_eq!(&long[0..4], b"%PDF");
    assert!(
        long.len() > short.len(),
        "a 500-line body should produce a larger document than one line"
    );
}

#[test]
fn render_rejects_fully_empty_input() {
    let renderer = PdfRenderer::new();
    assert!(matches!(
        renderer.render("", "   "),
        Err(RenderError::EmptyInput)
    ));
}
