//! Two-pass text splitter.
//!
//! The structural pass breaks at Markdown headers / horizontal rules (or, in
//! page mode, at `***Subheader***` markers). Sections longer than the chunk
//! length are split again at paragraph, line, sentence and word boundaries,
//! in that order, before falling back to a hard character cut. Adjacent small
//! pieces are merged back up to the chunk length, keeping up to
//! `chunk_overlap` characters of the previous chunk at the start of the next.
//!
//! Every chunk is a (trimmed) slice of the input, so the chunks of a text
//! cover it without gaps. Lengths are counted in characters.

use std::collections::{BTreeMap, VecDeque};

use regex::Regex;
use tracing::debug;

use crate::errors::rag_base_error::{RagBaseError, Result};
use crate::structs::chunk::{Chunk, ChunkMode, ChunkParams, META_FILEPATH, META_PAGE};

/// Page delimiter in extracted PDF text.
pub const PAGE_BREAK: char = '\x0c';

const MARKDOWN_STRUCTURE: &[(&str, Cut)] = &[
    (r"(?m)^#{1,6}\s", Cut::Before),
    (r"(?m)^(?:\*{3,}|-{3,}|_{3,})[ \t]*$", Cut::Before),
];

const PAGE_STRUCTURE: &[(&str, Cut)] = &[(r"\*\*\*[^*\n]+\*\*\*", Cut::Before)];

const LENGTH_FALLBACKS: &[(&str, Cut)] = &[
    (r"\n[ \t]*\n", Cut::After),
    (r"\n", Cut::After),
    (r"[.!?]+\s+", Cut::After),
    (r"\s+", Cut::After),
];

#[derive(Debug, Clone, Copy)]
enum Cut {
    /// Match starts the next piece.
    Before,
    /// Match ends the current piece.
    After,
}

#[derive(Debug)]
struct Separator {
    re: Regex,
    cut: Cut,
}

/// Byte span into the text being split.
type Span = (usize, usize);

/// Recursive splitter for one [`ChunkMode`].
#[derive(Debug)]
pub struct TextSplitter {
    params: ChunkParams,
    separators: Vec<Separator>,
    citation: Regex,
}

impl TextSplitter {
    pub fn new(mode: ChunkMode, params: ChunkParams) -> Result<Self> {
        let structure = match mode {
            ChunkMode::Markdown => MARKDOWN_STRUCTURE,
            ChunkMode::Pages => PAGE_STRUCTURE,
        };
        let separators = structure
            .iter()
            .chain(LENGTH_FALLBACKS)
            .map(|(pat, cut)| {
                Ok(Separator {
                    re: compile(pat)?,
                    cut: *cut,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            params,
            separators,
            citation: compile(r"\[[^\]]*\]")?,
        })
    }

    /// Splits `text` into chunks of at most `chunk_length` characters.
    ///
    /// Blank text yields no chunks; text that already fits is returned as is.
    pub fn split<'a>(&self, text: &'a str) -> Vec<&'a str> {
        if text.trim().is_empty() {
            return Vec::new();
        }
        if char_len(text) <= self.params.chunk_length {
            return vec![text];
        }

        let mut spans = Vec::new();
        self.split_span(text, (0, text.len()), 0, &mut spans);

        spans
            .into_iter()
            .map(|(s, e)| text[s..e].trim())
            .filter(|t| !t.is_empty())
            .collect()
    }

    /// `true` when nothing but citations, formatting and whitespace remains.
    pub fn is_blank_page(&self, page: &str) -> bool {
        self.citation
            .replace_all(page, "")
            .chars()
            .all(|c| c.is_whitespace() || matches!(c, '*' | '_' | '#' | '>' | '-' | '|' | '`' | '~'))
    }

    fn split_span(&self, text: &str, span: Span, level: usize, out: &mut Vec<Span>) {
        let piece = &text[span.0..span.1];
        let chosen = self
            .separators
            .iter()
            .enumerate()
            .skip(level)
            .find(|(_, sep)| sep.re.is_match(piece))
            .map(|(i, _)| i);

        let pieces = match chosen {
            Some(i) => cut_at(piece, &self.separators[i], span.0),
            None => piece
                .char_indices()
                .map(|(i, c)| (span.0 + i, span.0 + i + c.len_utf8()))
                .collect(),
        };

        let mut small: Vec<Span> = Vec::new();
        for p in pieces {
            if char_len(&text[p.0..p.1]) < self.params.chunk_length {
                small.push(p);
                continue;
            }
            if !small.is_empty() {
                self.merge(text, &small, out);
                small.clear();
            }
            match chosen {
                Some(i) => self.split_span(text, p, i + 1, out),
                None => out.push(p),
            }
        }
        if !small.is_empty() {
            self.merge(text, &small, out);
        }
    }

    /// Greedy merge of adjacent spans with overlap carry-over.
    fn merge(&self, text: &str, spans: &[Span], out: &mut Vec<Span>) {
        let ChunkParams {
            chunk_length,
            chunk_overlap,
        } = self.params;

        let mut window: VecDeque<(Span, usize)> = VecDeque::new();
        let mut total = 0usize;

        for &span in spans {
            let len = char_len(&text[span.0..span.1]);
            if total + len > chunk_length {
                if let (Some(first), Some(last)) = (window.front(), window.back()) {
                    out.push((first.0.0, last.0.1));
                }
                while total > chunk_overlap || (total + len > chunk_length && total > 0) {
                    match window.pop_front() {
                        Some((_, l)) => total -= l,
                        None => break,
                    }
                }
            }
            window.push_back((span, len));
            total += len;
        }

        if let (Some(first), Some(last)) = (window.front(), window.back()) {
            out.push((first.0.0, last.0.1));
        }
    }
}

/// Chunks a whole document and attaches metadata.
///
/// In [`ChunkMode::Pages`] the text is split at [`PAGE_BREAK`]; blank pages are
/// dropped and every chunk carries its page number (`first_page` + 1-based index).
pub fn chunk_document(
    text: &str,
    source: &str,
    mode: ChunkMode,
    params: ChunkParams,
    first_page: usize,
) -> Result<Vec<Chunk>> {
    let splitter = TextSplitter::new(mode, params)?;
    let base = base_metadata(source);

    let chunks: Vec<Chunk> = match mode {
        ChunkMode::Markdown => splitter
            .split(text)
            .into_iter()
            .map(|t| Chunk {
                text: t.to_string(),
                metadata: base.clone(),
            })
            .collect(),
        ChunkMode::Pages => {
            let mut out = Vec::new();
            let mut dropped = 0usize;
            for (i, page) in text.split(PAGE_BREAK).enumerate() {
                if splitter.is_blank_page(page) {
                    dropped += 1;
                    continue;
                }
                let mut metadata = base.clone();
                metadata.insert(META_PAGE.to_string(), (first_page + i + 1).to_string());
                out.extend(splitter.split(page).into_iter().map(|t| Chunk {
                    text: t.to_string(),
                    metadata: metadata.clone(),
                }));
            }
            debug!("Dropped {} blank pages", dropped);
            out
        }
    };

    debug!(
        "Split {} chars into {} chunks (length={}, overlap={}, mode={:?})",
        char_len(text),
        chunks.len(),
        params.chunk_length,
        params.chunk_overlap,
        mode
    );
    Ok(chunks)
}

fn base_metadata(source: &str) -> BTreeMap<String, String> {
    let mut m = BTreeMap::new();
    if !source.trim().is_empty() {
        m.insert(META_FILEPATH.to_string(), source.to_string());
    }
    m
}

fn cut_at(piece: &str, sep: &Separator, offset: usize) -> Vec<Span> {
    let mut cuts: Vec<usize> = sep
        .re
        .find_iter(piece)
        .map(|m| match sep.cut {
            Cut::Before => m.start(),
            Cut::After => m.end(),
        })
        .filter(|&at| at > 0 && at < piece.len())
        .collect();
    cuts.dedup();

    let mut spans = Vec::with_capacity(cuts.len() + 1);
    let mut prev = 0;
    for at in cuts.into_iter().chain(std::iter::once(piece.len())) {
        if at > prev {
            spans.push((offset + prev, offset + at));
            prev = at;
        }
    }
    spans
}

fn compile(pattern: &str) -> Result<Regex> {
    Regex::new(pattern)
        .map_err(|e| RagBaseError::InvalidConfig(format!("separator pattern {pattern}: {e}")))
}

fn char_len(s: &str) -> usize {
    s.chars().count()
}
