//! Style-block parser for single-file components.
//!
//! Finds the one top-level `<style ...>...</style>` region in a component
//! source. Anything ambiguous (unterminated tags, a second block, a block
//! opened inside another) is an error rather than a best guess, so text is
//! never silently dropped.

use std::ops::Range;
use std::sync::LazyLock;

use regex::Regex;

const OPEN_TAG: &str = "<style";
const CLOSE_TAG: &str = "</style>";

/// Location of a style block within a component source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StyleBlock {
    /// From `<style` through the end of `</style>`.
    pub range: Range<usize>,
    /// Between the opening tag's `>` and `</style>`.
    pub inner: Range<usize>,
    /// Raw attribute text of the opening tag, trimmed.
    pub attributes: String,
}

impl StyleBlock {
    /// Value of the `lang` attribute, if any.
    pub fn lang(&self) -> Option<&str> {
        static LANG_RE: LazyLock<Regex> = LazyLock::new(|| {
            Regex::new(r#"(?:^|\s)lang\s*=\s*["']?([A-Za-z0-9_-]+)"#).expect("valid regex")
        });

        LANG_RE
            .captures(&self.attributes)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str())
    }
}

/// Why a component source's style region could not be isolated.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StyleBlockError {
    #[error("opening <style> tag at byte {offset} is never closed with '>'")]
    UnterminatedOpeningTag { offset: usize },

    #[error("<style> block opened at byte {offset} has no closing </style>")]
    UnclosedBlock { offset: usize },

    #[error("<style> tag at byte {offset} is nested inside another style block")]
    NestedOpeningTag { offset: usize },

    #[error("second <style> block at byte {offset}; only one block per component is supported")]
    MultipleBlocks { offset: usize },
}

/// Result of splitting a component source into style text and the rest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Extraction {
    /// Inner style text: one leading line break removed, trailing line breaks trimmed.
    pub style: String,
    /// Component source with the whole block removed, trailing line breaks trimmed.
    pub remainder: String,
    pub block: StyleBlock,
}

/// Locate the single style block in `text`.
pub fn find_style_block(text: &str) -> Result<Option<StyleBlock>, StyleBlockError> {
    let Some(start) = find_opening(text, 0) else {
        return Ok(None);
    };

    let block = parse_block_at(text, start)?;

    if let Some(offset) = find_opening(text, block.range.end) {
        return Err(StyleBlockError::MultipleBlocks { offset });
    }

    Ok(Some(block))
}

/// Split `text` into its style block and the remaining component source.
///
/// Returns `Ok(None)` when there is no style block; the caller must then
/// leave the file untouched.
pub fn extract_style(text: &str) -> Result<Option<Extraction>, StyleBlockError> {
    let Some(block) = find_style_block(text)? else {
        return Ok(None);
    };

    let style = trim_trailing_line_breaks(strip_leading_line_break(&text[block.inner.clone()]));

    let mut remainder = String::with_capacity(text.len() - block.range.len());
    remainder.push_str(&text[..block.range.start]);
    remainder.push_str(&text[block.range.end..]);

    Ok(Some(Extraction {
        style: style.to_string(),
        remainder: trim_trailing_line_breaks(&remainder).to_string(),
        block,
    }))
}

// ---------------------------------------------------------------------------
// Scanner
// ---------------------------------------------------------------------------

/// Byte offset of the next `<style` opening tag at or after `from`.
///
/// The tag name must end at whitespace, `>` or `/`; `<styled-box>` is not a
/// style tag. A bare `<style` at end of input still counts (it is malformed,
/// and the parser reports it).
fn find_opening(text: &str, from: usize) -> Option<usize> {
    let mut cursor = from;
    while let Some(rel) = text[cursor..].find(OPEN_TAG) {
        let at = cursor + rel;
        let after = at + OPEN_TAG.len();
        match text[after..].chars().next() {
            None => return Some(at),
            Some(c) if c.is_whitespace() || c == '>' || c == '/' => return Some(at),
            Some(_) => cursor = after,
        }
    }
    None
}

fn parse_block_at(text: &str, start: usize) -> Result<StyleBlock, StyleBlockError> {
    let attrs_start = start + OPEN_TAG.len();
    let tag_end = text[attrs_start..]
        .find('>')
        .map(|i| attrs_start + i)
        .ok_or(StyleBlockError::UnterminatedOpeningTag { offset: start })?;

    let content_start = tag_end + 1;
    let content_end = text[content_start..]
        .find(CLOSE_TAG)
        .map(|i| content_start + i)
        .ok_or(StyleBlockError::UnclosedBlock { offset: start })?;

    if let Some(offset) = find_opening(&text[..content_end], content_start) {
        return Err(StyleBlockError::NestedOpeningTag { offset });
    }

    Ok(StyleBlock {
        range: start..content_end + CLOSE_TAG.len(),
        inner: content_start..content_end,
        attributes: text[attrs_start..tag_end].trim().to_string(),
    })
}

fn strip_leading_line_break(s: &str) -> &str {
    s.strip_prefix("\r\n")
        .or_else(|| s.strip_prefix('\n'))
        .or_else(|| s.strip_prefix('\r'))
        .unwrap_or(s)
}

fn trim_trailing_line_breaks(s: &str) -> &str {
    s.trim_end_matches(['\n', '\r'])
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    const COMPONENT: &str = "<template>\n  <div class=\"dv-border-box-1\" />\n</template>\n\n<script>\nexport default {\n  name: 'DvBorderBox1'\n}\n</script>\n\n<style lang=\"less\">\n.dv-border-box-1 {\n  position: relative;\n}\n</style>\n";

    #[test]
    fn extracts_block_and_remainder() {
        let extraction = extract_style(COMPONENT).unwrap().expect("block present");

        assert_eq!(extraction.style, ".dv-border-box-1 {\n  position: relative;\n}");
        assert_eq!(
            extraction.remainder,
            "<template>\n  <div class=\"dv-border-box-1\" />\n</template>\n\n<script>\nexport default {\n  name: 'DvBorderBox1'\n}\n</script>"
        );
        assert_eq!(extraction.block.attributes, "lang=\"less\"");
        assert_eq!(extraction.block.lang(), Some("less"));
    }

    #[test]
    fn remainder_has_no_style_block() {
        let extraction = extract_style(COMPONENT).unwrap().unwrap();
        assert_eq!(find_style_block(&extraction.remainder).unwrap(), None);
        assert_eq!(extract_style(&extraction.remainder).unwrap(), None);
    }

    #[test]
    fn no_block_is_none() {
        let text = "<template><div/></template>\n<script>export default {}</script>\n";
        assert_eq!(extract_style(text).unwrap(), None);
    }

    #[test]
    fn similarly_named_tags_are_not_style() {
        let text = "<template><styled-box>hi</styled-box></template>\n";
        assert_eq!(find_style_block(text).unwrap(), None);
    }

    #[test]
    fn bare_and_scoped_tags() {
        let bare = extract_style("<template/>\n<style>\na { b: c }\n</style>").unwrap().unwrap();
        assert_eq!(bare.style, "a { b: c }");
        assert_eq!(bare.block.attributes, "");
        assert_eq!(bare.block.lang(), None);

        let scoped = extract_style("<style scoped lang='less'>x{}</style>").unwrap().unwrap();
        assert_eq!(scoped.style, "x{}");
        assert_eq!(scoped.block.lang(), Some("less"));
        assert_eq!(scoped.remainder, "");
    }

    #[test]
    fn only_one_leading_line_break_is_stripped() {
        let extraction = extract_style("<style>\n\n  a {}\n\n\n</style>").unwrap().unwrap();
        assert_eq!(extraction.style, "\n  a {}");
    }

    #[test]
    fn crlf_line_breaks() {
        let text = "<template/>\r\n<style>\r\n.a { }\r\n</style>\r\n";
        let extraction = extract_style(text).unwrap().unwrap();
        assert_eq!(extraction.style, ".a { }");
        assert_eq!(extraction.remainder, "<template/>");
    }

    #[test]
    fn text_after_block_is_preserved() {
        let text = "<style>a{}</style>\n<template>kept</template>\n";
        let extraction = extract_style(text).unwrap().unwrap();
        assert_eq!(extraction.remainder, "\n<template>kept</template>");
    }

    #[test]
    fn unclosed_block_is_rejected() {
        let err = extract_style("<template/>\n<style lang=\"less\">\na {}\n").unwrap_err();
        assert_eq!(err, StyleBlockError::UnclosedBlock { offset: 12 });
    }

    #[test]
    fn unterminated_opening_tag_is_rejected() {
        let err = find_style_block("<template/><style lang=\"less\"").unwrap_err();
        assert_eq!(err, StyleBlockError::UnterminatedOpeningTag { offset: 11 });

        let err = find_style_block("<style").unwrap_err();
        assert_eq!(err, StyleBlockError::UnterminatedOpeningTag { offset: 0 });
    }

    #[test]
    fn nested_block_is_rejected() {
        let err = find_style_block("<style>a{}<style>b{}</style>").unwrap_err();
        assert_eq!(err, StyleBlockError::NestedOpeningTag { offset: 10 });
    }

    #[test]
    fn multiple_blocks_are_rejected() {
        let err = find_style_block("<style>a{}</style>\n<style>b{}</style>").unwrap_err();
        assert_eq!(err, StyleBlockError::MultipleBlocks { offset: 19 });
        assert!(err.to_string().contains("second <style> block"));
    }
}
