//! Boundary-preferring passage splitter.
//!
//! Page text is split on paragraph breaks (`\n\n`). Runs of paragraphs that
//! fit within the segment length are merged greedily into passages. A
//! paragraph that is still too long ends the current run, so the passage
//! before it closes on the paragraph break, and is then split the same way
//! on line breaks (`\n`), then on spaces. A piece keeps the separator that
//! ends it. A single word longer than the segment length stays whole, so no
//! boundary ever falls inside a word. Sentence punctuation is never used as
//! a boundary.
//!
//! Within a run, after each passage is emitted, leading pieces are dropped
//! until what remains fits within `overlap_length`; the remainder opens the
//! next passage. Consecutive passages are therefore contiguous or
//! overlapping and together cover the whole page.
//!
//! All lengths are measured in characters, not bytes.

use crate::heuristic::SegmentationParameters;
use crate::models::Passage;

/// Separators in order of preference.
const SEPARATORS: [&str; 3] = ["\n\n", "\n", " "];

/// An unbreakable run of page text.
#[derive(Debug, Clone, Copy)]
struct Piece {
    /// Byte range within the page.
    start: usize,
    end: usize,
    /// Character offset within the page.
    char_start: usize,
    chars: usize,
}

/// A passage span within one page, before it is tagged with page numbers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment {
    pub char_start: usize,
    pub text: String,
}

/// Split one page's text into overlapping segments.
///
/// Whitespace-only segments are dropped, so an empty page yields nothing.
pub fn split_text(text: &str, params: &SegmentationParameters) -> Vec<Segment> {
    let max = params.segment_length.max(1);
    let overlap = params.overlap_length.min(max - 1);

    let whole = Piece {
        start: 0,
        end: text.len(),
        char_start: 0,
        chars: text.chars().count(),
    };
    let mut spans = Vec::new();
    if whole.chars <= max {
        spans.push(whole);
    } else {
        split_piece(text, whole, 0, max, overlap, &mut spans);
    }

    spans
        .into_iter()
        .filter_map(|span| {
            let slice = &text[span.start..span.end];
            if slice.trim().is_empty() {
                None
            } else {
                Some(Segment {
                    char_start: span.char_start,
                    text: slice.to_string(),
                })
            }
        })
        .collect()
}

/// Split every page and number the passages across the whole document.
pub fn split_pages(pages: &[String], params: &SegmentationParameters) -> Vec<Passage> {
    let mut passages = Vec::new();
    for (page_no, page) in pages.iter().enumerate() {
        for segment in split_text(page, params) {
            passages.push(Passage {
                text: segment.text,
                source_page: page_no,
                sequence_position: passages.len(),
                char_start: segment.char_start,
            });
        }
    }
    passages
}

/// Break an oversize `piece` on `SEPARATORS[level]` and append passage spans.
///
/// Fitting parts accumulate and are merged together; an oversize part
/// flushes them first and is then split at the next level.
fn split_piece(
    text: &str,
    piece: Piece,
    level: usize,
    max: usize,
    overlap: usize,
    out: &mut Vec<Piece>,
) {
    let Some(separator) = SEPARATORS.get(level) else {
        out.push(piece);
        return;
    };

    let mut fitting = Vec::new();
    let mut offset = piece.start;
    let mut char_cursor = piece.char_start;
    for part in text[piece.start..piece.end].split_inclusive(*separator) {
        let chars = part.chars().count();
        let sub = Piece {
            start: offset,
            end: offset + part.len(),
            char_start: char_cursor,
            chars,
        };
        offset = sub.end;
        char_cursor += chars;

        if chars <= max {
            fitting.push(sub);
        } else {
            out.extend(merge_pieces(&fitting, max, overlap));
            fitting.clear();
            split_piece(text, sub, level + 1, max, overlap, out);
        }
    }
    out.extend(merge_pieces(&fitting, max, overlap));
}

/// Greedily join consecutive pieces into spans of at most `max` characters.
fn merge_pieces(pieces: &[Piece], max: usize, overlap: usize) -> Vec<Piece> {
    let join = |first: usize, last: usize| Piece {
        start: pieces[first].start,
        end: pieces[last].end,
        char_start: pieces[first].char_start,
        chars: pieces[first..=last].iter().map(|p| p.chars).sum(),
    };

    let mut spans = Vec::new();
    let mut first = 0;
    let mut total = 0;

    for (i, piece) in pieces.iter().enumerate() {
        if total + piece.chars > max && i > first {
            spans.push(join(first, i - 1));
            while first < i && (total > overlap || total + piece.chars > max) {
                total -= pieces[first].chars;
                first += 1;
            }
        }
        total += piece.chars;
    }

    if first < pieces.len() {
        spans.push(join(first, pieces.len() - 1));
    }
    spans
}
