//! Top-level block scan of `word/document.xml`.
//!
//! The scan records byte spans into the original XML instead of building a tree, so
//! unchanged blocks are written back exactly as they were read.

use quick_xml::events::Event;
use quick_xml::Reader;
use std::ops::Range;

use crate::error::{ReportError, Result};

#[derive(Debug, Clone, PartialEq)]
pub struct RunSpan {
    pub span: Range<usize>,
    pub has_drawing: bool,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct ParagraphInfo {
    pub open_tag: Range<usize>,
    pub self_closing: bool,
    /// `<w:pPr>` element, when present.
    pub properties: Option<Range<usize>>,
    /// Direct `<w:r>` children only (runs inside hyperlinks are not listed).
    pub runs: Vec<RunSpan>,
    pub text: String,
    pub drawings: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub enum BlockKind {
    Paragraph(ParagraphInfo),
    Table { drawings: usize },
    SectionProperties,
    /// Whitespace, comments, bookmarks and anything else at body level.
    Other,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Block {
    pub span: Range<usize>,
    pub kind: BlockKind,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Body {
    /// Bytes between `<w:body>` and `</w:body>`.
    pub content: Range<usize>,
    pub blocks: Vec<Block>,
}

fn is_drawing(name: &[u8]) -> bool {
    matches!(name, b"w:drawing" | b"w:pict" | b"w:object")
}

const FALLBACK: &[u8] = b"mc:Fallback";

/// Subtrees whose text belongs to a shape or to an alternate rendering, not to the paragraph.
fn is_embedded(name: &[u8]) -> bool {
    is_drawing(name) || name == FALLBACK
}

#[derive(Default)]
struct BlockBuilder {
    start: usize,
    paragraph: Option<ParagraphInfo>,
    table: bool,
    section: bool,
    drawings: usize,
    ppr_start: Option<usize>,
    run_start: Option<usize>,
    run_has_drawing: bool,
    /// Nesting of `<w:r>` at any depth (hyperlink runs included).
    run_depth: usize,
    /// Open drawings and `mc:Fallback` elements; text boxes live inside them.
    embed_depth: usize,
    /// Open `mc:Fallback` elements; their drawings duplicate the `mc:Choice` ones.
    fallback_depth: usize,
    in_text: bool,
}

impl BlockBuilder {
    fn open(name: &[u8], start: usize, open_end: usize) -> Self {
        let mut b = BlockBuilder {
            start,
            ..Default::default()
        };
        match name {
            b"w:p" => {
                b.paragraph = Some(ParagraphInfo {
                    open_tag: start..open_end,
                    ..Default::default()
                })
            }
            b"w:tbl" => b.table = true,
            b"w:sectPr" => b.section = true,
            _ => {}
        }
        b
    }

    fn note_drawing(&mut self, name: &[u8]) {
        if !is_drawing(name) {
            return;
        }
        if self.fallback_depth == 0 {
            self.drawings += 1;
        }
        if self.run_depth > 0 {
            self.run_has_drawing = true;
        }
    }

    /// Run content that counts as paragraph text.
    fn in_run_text(&self) -> bool {
        self.run_depth > 0 && self.embed_depth == 0
    }

    fn on_start(&mut self, name: &[u8], pos: usize, rel_depth: usize) {
        self.note_drawing(name);
        if name == FALLBACK {
            self.fallback_depth += 1;
        }
        if is_embedded(name) {
            self.embed_depth += 1;
        }
        if self.paragraph.is_none() {
            return;
        }
        match name {
            b"w:pPr" if rel_depth == 1 => self.ppr_start = Some(pos),
            b"w:r" => {
                if rel_depth == 1 {
                    self.run_start = Some(pos);
                    self.run_has_drawing = false;
                }
                self.run_depth += 1;
            }
            b"w:t" if self.in_run_text() => self.in_text = true,
            _ => {}
        }
    }

    fn on_empty(&mut self, name: &[u8], pos: usize, end: usize, rel_depth: usize) {
        self.note_drawing(name);
        let in_run_text = self.in_run_text();
        let Some(p) = self.paragraph.as_mut() else {
            return;
        };
        match name {
            b"w:pPr" if rel_depth == 1 => p.properties = Some(pos..end),
            b"w:r" if rel_depth == 1 => p.runs.push(RunSpan {
                span: pos..end,
                has_drawing: false,
            }),
            b"w:tab" if in_run_text => p.text.push('\t'),
            b"w:br" | b"w:cr" if in_run_text => p.text.push('\n'),
            _ => {}
        }
    }

    fn on_end(&mut self, name: &[u8], end: usize, rel_depth: usize) {
        if is_embedded(name) {
            self.embed_depth = self.embed_depth.saturating_sub(1);
        }
        if name == FALLBACK {
            self.fallback_depth = self.fallback_depth.saturating_sub(1);
        }
        let Some(p) = self.paragraph.as_mut() else {
            return;
        };
        match name {
            b"w:pPr" if rel_depth == 1 => {
                if let Some(start) = self.ppr_start.take() {
                    p.properties = Some(start..end);
                }
            }
            b"w:r" => {
                self.run_depth = self.run_depth.saturating_sub(1);
                if rel_depth == 1 {
                    if let Some(start) = self.run_start.take() {
                        p.runs.push(RunSpan {
                            span: start..end,
                            has_drawing: self.run_has_drawing,
                        });
                    }
                }
            }
            b"w:t" => self.in_text = false,
            _ => {}
        }
    }

    fn on_text(&mut self, text: &str) {
        if self.in_text {
            if let Some(p) = self.paragraph.as_mut() {
                p.text.push_str(text);
            }
        }
    }

    fn finish(self, end: usize) -> Block {
        let kind = if let Some(mut p) = self.paragraph {
            p.drawings = self.drawings;
            BlockKind::Paragraph(p)
        } else if self.table {
            BlockKind::Table {
                drawings: self.drawings,
            }
        } else if self.section {
            BlockKind::SectionProperties
        } else {
            BlockKind::Other
        };
        Block {
            span: self.start..end,
            kind,
        }
    }
}

impl Body {
    pub fn parse(xml: &str) -> Result<Body> {
        let mut reader = Reader::from_str(xml);
        reader.config_mut().trim_text(false);

        let mut depth = 0usize;
        let mut body_depth: Option<usize> = None;
        let mut content_start = 0usize;
        let mut content_end: Option<usize> = None;
        let mut blocks = Vec::new();
        let mut current: Option<BlockBuilder> = None;

        loop {
            let pos = reader.buffer_position() as usize;
            let event = reader.read_event()?;
            let end = reader.buffer_position() as usize;
            match event {
                Event::Eof => break,
                Event::Start(e) => {
                    let name = e.name();
                    let name = name.as_ref();
                    match body_depth {
                        None => {
                            if name == b"w:body" {
                                body_depth = Some(depth);
                                content_start = end;
                            }
                        }
                        Some(bd) => {
                            if let Some(b) = current.as_mut() {
                                b.on_start(name, pos, depth - (bd + 1));
                            } else if depth == bd + 1 {
                                current = Some(BlockBuilder::open(name, pos, end));
                            }
                        }
                    }
                    depth += 1;
                }
                Event::Empty(e) => {
                    let name = e.name();
                    let name = name.as_ref();
                    if let Some(bd) = body_depth {
                        if let Some(b) = current.as_mut() {
                            b.on_empty(name, pos, end, depth - (bd + 1));
                        } else if depth == bd + 1 {
                            let mut b = BlockBuilder::open(name, pos, end);
                            if let Some(p) = b.paragraph.as_mut() {
                                p.self_closing = true;
                            }
                            if is_drawing(name) {
                                b.drawings += 1;
                            }
                            blocks.push(b.finish(end));
                        }
                    }
                }
                Event::End(e) => {
                    depth = depth.saturating_sub(1);
                    let name = e.name();
                    let name = name.as_ref();
                    if let Some(bd) = body_depth {
                        if depth == bd {
                            content_end = Some(pos);
                            break;
                        }
                        if depth == bd + 1 {
                            if let Some(b) = current.take() {
                                blocks.push(b.finish(end));
                            }
                        } else if let Some(b) = current.as_mut() {
                            b.on_end(name, end, depth - (bd + 1));
                        }
                    }
                }
                Event::Text(t) => {
                    if body_depth.is_some() {
                        if let Some(b) = current.as_mut() {
                            let text = t.unescape().map_err(quick_xml::Error::from)?;
                            b.on_text(&text);
                        } else {
                            blocks.push(Block {
                                span: pos..end,
                                kind: BlockKind::Other,
                            });
                        }
                    }
                }
                _ => {
                    if body_depth.is_some() && current.is_none() {
                        blocks.push(Block {
                            span: pos..end,
                            kind: BlockKind::Other,
                        });
                    }
                }
            }
        }

        let content_end = content_end
            .ok_or_else(|| ReportError::Template("document has no <w:body> element".to_string()))?;
        Ok(Body {
            content: content_start..content_end,
            blocks,
        })
    }

    /// Body-level paragraphs with their block index.
    pub fn paragraphs(&self) -> impl Iterator<Item = (usize, &ParagraphInfo)> {
        self.blocks.iter().enumerate().filter_map(|(i, b)| match &b.kind {
            BlockKind::Paragraph(p) => Some((i, p)),
            _ => None,
        })
    }

    pub fn paragraph_count(&self) -> usize {
        self.paragraphs().count()
    }

    pub fn table_count(&self) -> usize {
        self.blocks
            .iter()
            .filter(|b| matches!(b.kind, BlockKind::Table { .. }))
            .count()
    }

    /// Drawings, pictures and embedded objects anywhere in the body.
    pub fn drawing_count(&self) -> usize {
        self.blocks
            .iter()
            .map(|b| match &b.kind {
                BlockKind::Paragraph(p) => p.drawings,
                BlockKind::Table { drawings } => *drawings,
                _ => 0,
            })
            .sum()
    }

    /// Where appended content goes: before the final `<w:sectPr>`, else at the end of the body.
    pub fn append_position(&self) -> usize {
        let last = self.blocks.iter().rev().find(|b| b.kind != BlockKind::Other);
        match last {
            Some(b) if b.kind == BlockKind::SectionProperties => b.span.start,
            _ => self.content.end,
        }
    }
}
