//! Markdown ⇄ DOCX conversion
//!
//! Markdown is walked with pulldown-cmark into a flat list of blocks, then
//! rendered with docx-rs. The reverse direction reads the document body and
//! emits one markdown block per paragraph or table.

use super::{read_text, run_blocking, Converter, ConverterError, ConverterOptions};
use async_trait::async_trait;
use docx_rs::{
    DocumentChild, Docx, Paragraph, ParagraphChild, Run, RunChild, RunFonts, Style, StyleType,
    Table, TableCellContent, TableChild, TableRowChild,
};
use pulldown_cmark::{Event, Options, Parser, Tag, TagEnd};
use std::io::Cursor;
use std::path::Path;

/// Half-point sizes for Heading1..Heading6
const HEADING_SIZES: [usize; 6] = [36, 32, 28, 26, 24, 22];
const CODE_FONT: &str = "Courier New";

#[derive(Debug, Clone, PartialEq, Eq)]
struct Span {
    text: String,
    bold: bool,
    italic: bool,
}

impl Span {
    fn plain(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            bold: false,
            italic: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Block {
    Heading(u8, Vec<Span>),
    Paragraph(Vec<Span>),
    Code(String),
}

/// Event state while flattening markdown into blocks.
#[derive(Default)]
struct MarkdownWalker {
    blocks: Vec<Block>,
    spans: Vec<Span>,
    heading: Option<u8>,
    strong: usize,
    emphasis: usize,
    /// One entry per open list: next number for ordered lists
    lists: Vec<Option<u64>>,
    code: Option<String>,
    row: Vec<String>,
    cell: Option<String>,
}

impl MarkdownWalker {
    fn handle(&mut self, event: Event<'_>) {
        match event {
            Event::Start(Tag::Heading { level, .. }) => {
                self.flush();
                self.heading = Some(level as u8);
            }
            Event::End(TagEnd::Heading(_)) => {
                self.flush();
                self.heading = None;
            }
            Event::End(TagEnd::Paragraph) => self.flush(),
            Event::Start(Tag::Strong) => self.strong += 1,
            Event::End(TagEnd::Strong) => self.strong = self.strong.saturating_sub(1),
            Event::Start(Tag::Emphasis) => self.emphasis += 1,
            Event::End(TagEnd::Emphasis) => self.emphasis = self.emphasis.saturating_sub(1),
            Event::Start(Tag::List(start)) => {
                self.flush();
                self.lists.push(start);
            }
            Event::End(TagEnd::List(_)) => {
                self.flush();
                self.lists.pop();
            }
            Event::Start(Tag::Item) => {
                self.flush();
                let indent = "  ".repeat(self.lists.len().saturating_sub(1));
                let marker = match self.lists.last_mut() {
                    Some(Some(n)) => {
                        let marker = format!("{}. ", n);
                        *n += 1;
                        marker
                    }
                    _ => "• ".to_string(),
                };
                self.spans.push(Span::plain(format!("{}{}", indent, marker)));
            }
            Event::End(TagEnd::Item) => self.flush(),
            Event::Start(Tag::CodeBlock(_)) => {
                self.flush();
                self.code = Some(String::new());
            }
            Event::End(TagEnd::CodeBlock) => {
                if let Some(code) = self.code.take() {
                    self.blocks
                        .extend(code.lines().map(|line| Block::Code(line.to_string())));
                }
            }
            Event::Start(Tag::Table(_)) => self.flush(),
            Event::Start(Tag::TableHead) | Event::Start(Tag::TableRow) => self.row.clear(),
            Event::Start(Tag::TableCell) => self.cell = Some(String::new()),
            Event::End(TagEnd::TableCell) => {
                if let Some(cell) = self.cell.take() {
                    self.row.push(cell.trim().to_string());
                }
            }
            Event::End(TagEnd::TableHead) | Event::End(TagEnd::TableRow) => {
                let row = std::mem::take(&mut self.row);
                self.blocks
                    .push(Block::Paragraph(vec![Span::plain(row.join(" | "))]));
            }
            Event::Text(text) | Event::Code(text) => self.push_text(&text),
            Event::SoftBreak => self.push_text(" "),
            Event::HardBreak => self.flush(),
            Event::Rule => self.flush(),
            _ => {}
        }
    }

    fn push_text(&mut self, text: &str) {
        if let Some(code) = self.code.as_mut() {
            code.push_str(text);
        } else if let Some(cell) = self.cell.as_mut() {
            cell.push_str(text);
        } else {
            self.spans.push(Span {
                text: text.to_string(),
                bold: self.strong > 0,
                italic: self.emphasis > 0,
            });
        }
    }

    fn flush(&mut self) {
        let spans = std::mem::take(&mut self.spans);
        if spans.iter().all(|s| s.text.trim().is_empty()) {
            return;
        }
        self.blocks.push(match self.heading {
            Some(level) => Block::Heading(level, spans),
            None => Block::Paragraph(spans),
        });
    }

    fn finish(mut self) -> Vec<Block> {
        self.flush();
        self.blocks
    }
}

fn parse_markdown(markdown: &str) -> Vec<Block> {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_STRIKETHROUGH);

    let mut walker = MarkdownWalker::default();
    for event in Parser::new_ext(markdown, options) {
        walker.handle(event);
    }
    walker.finish()
}

fn span_run(span: &Span) -> Run {
    let mut run = Run::new().add_text(span.text.as_str());
    if span.bold {
        run = run.bold();
    }
    if span.italic {
        run = run.italic();
    }
    run
}

fn render_docx(blocks: &[Block]) -> Result<Vec<u8>, ConverterError> {
    let mut docx = Docx::new();
    for (i, size) in HEADING_SIZES.iter().enumerate() {
        let level = i + 1;
        docx = docx.add_style(
            Style::new(format!("Heading{}", level), StyleType::Paragraph)
                .name(format!("Heading {}", level))
                .size(*size)
                .bold(),
        );
    }

    for block in blocks {
        let paragraph = match block {
            Block::Heading(level, spans) => spans
                .iter()
                .fold(Paragraph::new(), |p, span| p.add_run(span_run(span)))
                .style(&format!("Heading{}", level)),
            Block::Paragraph(spans) => spans
                .iter()
                .fold(Paragraph::new(), |p, span| p.add_run(span_run(span))),
            Block::Code(line) => Paragraph::new().add_run(
                Run::new()
                    .add_text(line.as_str())
                    .fonts(RunFonts::new().ascii(CODE_FONT)),
            ),
        };
        docx = docx.add_paragraph(paragraph);
    }

    let mut buffer = Cursor::new(Vec::new());
    docx.build()
        .pack(&mut buffer)
        .map_err(|e| ConverterError::Document(format!("failed to write DOCX: {}", e)))?;
    Ok(buffer.into_inner())
}

/// Render markdown text as a DOCX package.
pub fn markdown_to_docx(markdown: &str) -> Result<Vec<u8>, ConverterError> {
    render_docx(&parse_markdown(markdown))
}

fn paragraph_text(p: &Paragraph) -> String {
    let mut text = String::new();
    for child in &p.children {
        match child {
            ParagraphChild::Run(r) => push_run_text(&mut text, r),
            ParagraphChild::Hyperlink(h) => {
                for child in &h.children {
                    if let ParagraphChild::Run(r) = child {
                        push_run_text(&mut text, r);
                    }
                }
            }
            _ => {}
        }
    }
    text
}

fn push_run_text(text: &mut String, run: &Run) {
    for run_child in &run.children {
        match run_child {
            RunChild::Text(t) => text.push_str(&t.text),
            RunChild::Tab(_) => text.push('\t'),
            RunChild::Break(_) => text.push('\n'),
            _ => {}
        }
    }
}

/// Heading level from a paragraph style id such as `Heading2` or `heading 2`.
fn heading_level(p: &Paragraph) -> Option<usize> {
    let style = p.property.style.as_ref()?;
    let id = style.val.to_lowercase().replace(' ', "");
    if id == "title" {
        return Some(1);
    }
    let level: usize = id.strip_prefix("heading")?.parse().ok()?;
    (1..=6).contains(&level).then_some(level)
}

fn table_markdown(t: &Table) -> String {
    let mut rows: Vec<String> = Vec::new();
    for (index, row) in t.rows.iter().enumerate() {
        let TableChild::TableRow(r) = row;
        let cells: Vec<String> = r
            .cells
            .iter()
            .map(|cell| {
                let TableRowChild::TableCell(c) = cell;
                c.children
                    .iter()
                    .filter_map(|child| match child {
                        TableCellContent::Paragraph(p) => Some(paragraph_text(p)),
                        _ => None,
                    })
                    .filter(|text| !text.trim().is_empty())
                    .map(|text| text.trim().replace('|', "\\|"))
                    .collect::<Vec<_>>()
                    .join(" ")
            })
            .collect();

        rows.push(format!("| {} |", cells.join(" | ")));
        if index == 0 {
            rows.push(format!("|{}", " --- |".repeat(cells.len().max(1))));
        }
    }
    rows.join("\n")
}

/// Extract the body of a DOCX package as markdown.
pub fn docx_to_markdown(bytes: &[u8]) -> Result<String, ConverterError> {
    let docx = docx_rs::read_docx(bytes)
        .map_err(|e| ConverterError::Document(format!("failed to parse DOCX: {}", e)))?;

    let mut blocks: Vec<String> = Vec::new();
    for child in &docx.document.children {
        match child {
            DocumentChild::Paragraph(p) => {
                let text = paragraph_text(p);
                if text.trim().is_empty() {
                    continue;
                }
                match heading_level(p) {
                    Some(level) => blocks.push(format!("{} {}", "#".repeat(level), text.trim())),
                    None => blocks.push(text),
                }
            }
            DocumentChild::Table(t) => {
                let table = table_markdown(t);
                if !table.is_empty() {
                    blocks.push(table);
                }
            }
            _ => {}
        }
    }

    Ok(blocks.join("\n\n"))
}

pub struct MarkdownToDocxConverter;

#[async_trait]
impl Converter for MarkdownToDocxConverter {
    fn name(&self) -> &'static str {
        "markdown-to-docx"
    }

    async fn convert(
        &self,
        input: &Path,
        output: &Path,
        _options: &ConverterOptions,
    ) -> Result<(), ConverterError> {
        let markdown = read_text(input).await?;
        let docx = run_blocking(move || markdown_to_docx(&markdown)).await?;
        tokio::fs::write(output, docx).await?;
        Ok(())
    }
}

pub struct DocxToMarkdownConverter;

#[async_trait]
impl Converter for DocxToMarkdownConverter {
    fn name(&self) -> &'static str {
        "docx-to-markdown"
    }

    async fn convert(
        &self,
        input: &Path,
        output: &Path,
        _options: &ConverterOptions,
    ) -> Result<(), ConverterError> {
        let bytes = tokio::fs::read(input).await?;
        let markdown = run_blocking(move || docx_to_markdown(&bytes)).await?;
        tokio::fs::write(output, markdown).await?;
        Ok(())
    }
}
