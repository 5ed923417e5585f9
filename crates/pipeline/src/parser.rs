//! Response block parser
//!
//! Decomposes a generated answer into renderable text and table blocks:
//! - Citation markers are operator-facing provenance, not user-facing
//!   content; they are collected and stripped.
//! - Tables arrive in two equally valid encodings, explicit
//!   start/end delimiters or raw table markup. Each encoding has its own
//!   lazy matcher and matches are merged by earliest start.
//! - Table HTML is sanitized before rendering: scripts and inline event
//!   handlers are removed outright, and only structural table tags
//!   survive.
//!
//! Parsing is a total function: the worst case is a single placeholder
//! text block.

use regex_lite::Regex;

/// Marks the start of a delimited table in model output and prompts
pub const TABLE_START_DELIMITER: &str = "--TABLE-START--";

/// Marks the end of a delimited table in model output and prompts
pub const TABLE_END_DELIMITER: &str = "--TABLE-END--";

/// Fixed message for empty or whitespace-only model output
pub const NO_RESPONSE_MESSAGE: &str = "No response available.";

/// Fixed message when nothing renderable survives parsing
pub const UNPARSED_MESSAGE: &str = "Could not parse response content.";

/// A renderable piece of the response, in document order
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResponseBlock {
    /// Free text content
    Text(String),
    /// Sanitized table HTML
    Table(String),
}

/// Parsed response: ordered blocks plus collected source identifiers
#[derive(Debug, Clone, Default)]
pub struct ParsedResponse {
    pub blocks: Vec<ResponseBlock>,
    /// Distinct source identifiers in first-seen order
    pub sources: Vec<String>,
}

/// A table span located in the response text
#[derive(Debug)]
struct TableSpan {
    start: usize,
    end: usize,
    payload: String,
}

/// Parser for generated answers
pub struct ResponseParser {
    citation: Regex,
    delimited_table: Regex,
    tagged_table: Regex,
    script_block: Regex,
    event_handler: Regex,
    any_tag: Regex,
    allowed_tag: Regex,
    inter_tag_space: Regex,
    space_run: Regex,
    blank_lines: Regex,
}

impl Default for ResponseParser {
    fn default() -> Self {
        Self::new()
    }
}

impl ResponseParser {
    pub fn new() -> Self {
        Self {
            citation: Regex::new(r"(?i)\[source:\s*([^\]]+)\]").unwrap(),
            delimited_table: Regex::new(r"(?is)--TABLE-START--(.*?)--TABLE-END--").unwrap(),
            tagged_table: Regex::new(r"(?is)<table[^>]*>(.*?)</table>").unwrap(),
            script_block: Regex::new(r"(?is)<script[^>]*>.*?</script>").unwrap(),
            event_handler: Regex::new(r#"(?i)\bon\w+\s*=\s*("[^"]*"|'[^']*')"#).unwrap(),
            any_tag: Regex::new(r"<[^>]+>").unwrap(),
            allowed_tag: Regex::new(
                r"(?i)^</?(?:table|thead|tbody|tfoot|tr|th|td|colgroup|col|caption)[\s>/]",
            )
            .unwrap(),
            inter_tag_space: Regex::new(r">\s+<").unwrap(),
            space_run: Regex::new(r"\s+").unwrap(),
            blank_lines: Regex::new(r"\n\s*\n").unwrap(),
        }
    }

    /// Parse a raw answer into ordered blocks; never fails
    pub fn parse(&self, raw: &str) -> ParsedResponse {
        if raw.trim().is_empty() {
            return ParsedResponse {
                blocks: vec![ResponseBlock::Text(NO_RESPONSE_MESSAGE.to_string())],
                sources: Vec::new(),
            };
        }

        let (response, sources) = self.extract_source_citations(raw);

        let mut blocks = Vec::new();
        let mut last_end = 0;

        for span in self.find_table_spans(&response) {
            self.push_text(&mut blocks, &response[last_end..span.start]);
            self.push_table(&mut blocks, &span.payload);
            last_end = span.end;
        }
        self.push_text(&mut blocks, &response[last_end..]);

        if blocks.is_empty() {
            blocks.push(ResponseBlock::Text(UNPARSED_MESSAGE.to_string()));
        }

        ParsedResponse { blocks, sources }
    }

    /// Collect distinct source identifiers and strip their markers
    fn extract_source_citations(&self, response: &str) -> (String, Vec<String>) {
        let mut sources: Vec<String> = Vec::new();

        for caps in self.citation.captures_iter(response) {
            if let Some(m) = caps.get(1) {
                let source = m.as_str().trim().to_string();
                if !sources.contains(&source) {
                    sources.push(source);
                }
            }
        }

        let cleaned = self.citation.replace_all(response, "").trim().to_string();
        (cleaned, sources)
    }

    /// Locate table spans from both encodings, merged by earliest start
    ///
    /// Overlapping candidates are resolved in favor of the
    /// earlier-starting span; later candidates inside it are dropped.
    fn find_table_spans(&self, text: &str) -> Vec<TableSpan> {
        let mut candidates: Vec<TableSpan> = Vec::new();

        for caps in self.delimited_table.captures_iter(text) {
            let whole = caps.get(0).unwrap();
            candidates.push(TableSpan {
                start: whole.start(),
                end: whole.end(),
                payload: caps.get(1).map(|m| m.as_str()).unwrap_or("").to_string(),
            });
        }

        for caps in self.tagged_table.captures_iter(text) {
            let whole = caps.get(0).unwrap();
            candidates.push(TableSpan {
                start: whole.start(),
                end: whole.end(),
                payload: caps.get(1).map(|m| m.as_str()).unwrap_or("").to_string(),
            });
        }

        candidates.sort_by_key(|span| span.start);

        let mut spans: Vec<TableSpan> = Vec::new();
        for candidate in candidates {
            match spans.last() {
                Some(previous) if candidate.start < previous.end => {}
                _ => spans.push(candidate),
            }
        }
        spans
    }

    fn push_text(&self, blocks: &mut Vec<ResponseBlock>, text: &str) {
        let normalized = self.normalize_text(text);
        if !normalized.is_empty() {
            blocks.push(ResponseBlock::Text(normalized));
        }
    }

    fn push_table(&self, blocks: &mut Vec<ResponseBlock>, payload: &str) {
        let payload = payload.trim();
        if payload.is_empty() {
            return;
        }

        let wrapped = if payload.starts_with("<table") {
            payload.to_string()
        } else {
            format!("<table>{}</table>", payload)
        };

        let sanitized = self.sanitize_table_html(&wrapped);
        if !sanitized.is_empty() {
            blocks.push(ResponseBlock::Table(sanitized));
        }
    }

    /// Trim and collapse runs of blank lines into a single blank line
    fn normalize_text(&self, text: &str) -> String {
        let trimmed = text.trim();
        self.blank_lines.replace_all(trimmed, "\n\n").to_string()
    }

    /// Reduce table HTML to safe structural markup
    ///
    /// Scripts and inline event handlers never reach the rendering
    /// surface. Tags outside the allow-list are stripped while their
    /// enclosed text is retained; whitespace between tags is collapsed.
    pub fn sanitize_table_html(&self, html: &str) -> String {
        let html = self.script_block.replace_all(html, "");
        let html = self.event_handler.replace_all(&html, "").into_owned();

        let mut kept = String::with_capacity(html.len());
        let mut last_end = 0;
        for m in self.any_tag.find_iter(&html) {
            kept.push_str(&html[last_end..m.start()]);
            if self.allowed_tag.is_match(m.as_str()) {
                kept.push_str(m.as_str());
            }
            last_end = m.end();
        }
        kept.push_str(&html[last_end..]);

        let collapsed = self.inter_tag_space.replace_all(&kept, "><");
        let collapsed = self.space_run.replace_all(&collapsed, " ");
        collapsed.trim().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(raw: &str) -> ParsedResponse {
        ResponseParser::new().parse(raw)
    }

    #[test]
    fn test_citation_stripped_from_plain_text() {
        let parsed = parse("Answer here. [source: doc.pdf#p1]");
        assert_eq!(
            parsed.blocks,
            vec![ResponseBlock::Text("Answer here.".to_string())]
        );
        assert_eq!(parsed.sources, vec!["doc.pdf#p1".to_string()]);
    }

    #[test]
    fn test_sources_distinct_in_first_seen_order() {
        let parsed = parse(
            "One. [source: b.pdf#p2] Two. [source: a.pdf#p1] Three. [source: b.pdf#p2]",
        );
        assert_eq!(
            parsed.sources,
            vec!["b.pdf#p2".to_string(), "a.pdf#p1".to_string()]
        );
    }

    #[test]
    fn test_delimited_table_between_text() {
        let parsed = parse(
            "Before the table.\n\n--TABLE-START--<tr><td>1</td></tr>--TABLE-END--\n\nAfter the table.",
        );

        assert_eq!(parsed.blocks.len(), 3);
        assert_eq!(
            parsed.blocks[0],
            ResponseBlock::Text("Before the table.".to_string())
        );
        assert_eq!(
            parsed.blocks[1],
            ResponseBlock::Table("<table><tr><td>1</td></tr></table>".to_string())
        );
        assert_eq!(
            parsed.blocks[2],
            ResponseBlock::Text("After the table.".to_string())
        );
    }

    #[test]
    fn test_tagged_table_extracted() {
        let parsed = parse(
            "Specs below:\n<table><tr><th>Size</th></tr><tr><td>6.9-inch</td></tr></table>",
        );
        assert_eq!(parsed.blocks.len(), 2);
        assert!(matches!(&parsed.blocks[1], ResponseBlock::Table(html)
            if html.starts_with("<table") && html.contains("6.9-inch")));
    }

    #[test]
    fn test_multiple_delimited_tables_in_order() {
        let parsed = parse(
            "Processors:\n--TABLE-START--<tr><td>S25</td></tr>--TABLE-END--\nStorage:\n--TABLE-START--<tr><td>256GB</td></tr>--TABLE-END--",
        );

        let tables: Vec<&ResponseBlock> = parsed
            .blocks
            .iter()
            .filter(|b| matches!(b, ResponseBlock::Table(_)))
            .collect();
        assert_eq!(tables.len(), 2);
        assert!(matches!(tables[0], ResponseBlock::Table(h) if h.contains("S25")));
        assert!(matches!(tables[1], ResponseBlock::Table(h) if h.contains("256GB")));
    }

    #[test]
    fn test_script_and_event_handlers_removed() {
        let parsed = parse(
            r#"<table><tr><td onclick="x()">safe</td><script>alert(1)</script></tr></table>"#,
        );

        assert_eq!(parsed.blocks.len(), 1);
        match &parsed.blocks[0] {
            ResponseBlock::Table(html) => {
                assert!(!html.contains("script"));
                assert!(!html.contains("alert"));
                assert!(!html.contains("onclick"));
                assert!(html.contains("safe"));
            }
            other => panic!("expected table, got {:?}", other),
        }
    }

    #[test]
    fn test_disallowed_tags_stripped_text_retained() {
        let parsed = parse("<table><tr><td><b>bold</b> value</td></tr></table>");
        match &parsed.blocks[0] {
            ResponseBlock::Table(html) => {
                assert!(!html.contains("<b>"));
                assert!(html.contains("bold value"));
            }
            other => panic!("expected table, got {:?}", other),
        }
    }

    #[test]
    fn test_empty_input_short_circuits() {
        let parsed = parse("");
        assert_eq!(
            parsed.blocks,
            vec![ResponseBlock::Text(NO_RESPONSE_MESSAGE.to_string())]
        );

        let parsed = parse("   \n\t ");
        assert_eq!(
            parsed.blocks,
            vec![ResponseBlock::Text(NO_RESPONSE_MESSAGE.to_string())]
        );
    }

    #[test]
    fn test_nothing_renderable_falls_back() {
        // The table matcher consumes the empty table; nothing survives
        let parsed = parse("<table></table>");
        assert_eq!(
            parsed.blocks,
            vec![ResponseBlock::Text(UNPARSED_MESSAGE.to_string())]
        );
    }

    #[test]
    fn test_stray_tag_survives_as_text() {
        // A lone row tag is not a table span; it stays renderable text
        let parsed = parse("<tr>");
        assert_eq!(parsed.blocks, vec![ResponseBlock::Text("<tr>".to_string())]);
    }

    #[test]
    fn test_blank_line_runs_collapse() {
        let parsed = parse("First paragraph.\n\n\n\nSecond paragraph.");
        assert_eq!(
            parsed.blocks,
            vec![ResponseBlock::Text(
                "First paragraph.\n\nSecond paragraph.".to_string()
            )]
        );
    }

    #[test]
    fn test_delimited_payload_already_wrapped() {
        let parsed = parse(
            "--TABLE-START--<table class=\"x\"><tr><td>1</td></tr></table>--TABLE-END--",
        );
        match &parsed.blocks[0] {
            ResponseBlock::Table(html) => {
                // Not double-wrapped
                assert!(!html.contains("<table><table"));
                assert!(html.contains("<td>1</td>"));
            }
            other => panic!("expected table, got {:?}", other),
        }
    }

    #[test]
    fn test_earliest_start_wins_on_overlap() {
        // A tagged table nested in a delimited span belongs to the
        // delimited match; it must not be extracted twice
        let parsed = parse(
            "--TABLE-START--<table><tr><td>once</td></tr></table>--TABLE-END-- tail",
        );
        let tables = parsed
            .blocks
            .iter()
            .filter(|b| matches!(b, ResponseBlock::Table(_)))
            .count();
        assert_eq!(tables, 1);
    }

    #[test]
    fn test_whitespace_between_tags_collapsed() {
        let parsed = parse("<table> <tr>  <td>v</td> </tr> </table>");
        assert_eq!(
            parsed.blocks,
            vec![ResponseBlock::Table(
                "<table><tr><td>v</td></tr></table>".to_string()
            )]
        );
    }
}
