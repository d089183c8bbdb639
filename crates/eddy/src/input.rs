//! Graph documents: JSON, and the sankey CSV dialect (`source,target,value[,type]`).

use crate::error::{Error, Result};
use crate::record::{LinkData, NodeData, SankeyInput};
use rustc_hash::FxHashSet;

pub fn parse_json(text: &str) -> Result<SankeyInput> {
    Ok(serde_json::from_str(text)?)
}

/// Parses sankey CSV. An optional `sankey`/`sankey-beta` header may come first; `%%` lines are
/// comments. Nodes are created in order of first appearance.
pub fn parse_csv(text: &str) -> Result<SankeyInput> {
    // Comment and header lines are blanked rather than dropped so error lines stay accurate.
    let mut header_allowed = true;
    let cleaned: String = text
        .split_inclusive('\n')
        .map(|line| {
            let trimmed = line.trim();
            let is_comment = trimmed.starts_with("%%");
            let is_header = header_allowed && is_sankey_header(trimmed);
            if !trimmed.is_empty() && !is_comment {
                header_allowed = false;
            }
            if is_comment || is_header {
                if line.ends_with('\n') { "\n" } else { "" }
            } else {
                line
            }
        })
        .collect();

    let records = CsvParser::new(&cleaned).records()?;
    let mut nodes: Vec<NodeData> = Vec::new();
    let mut seen: FxHashSet<String> = FxHashSet::default();
    let mut links: Vec<LinkData> = Vec::with_capacity(records.len());
    for record in records {
        let line = record.line;
        let mut fields = record.fields.into_iter().map(|f| f.trim().to_string());
        let (Some(source), Some(target), Some(value)) =
            (fields.next(), fields.next(), fields.next())
        else {
            return Err(Error::InvalidInput {
                line,
                message: "expected source,target,value".to_string(),
            });
        };
        let kind = fields.next().filter(|k| !k.is_empty());
        if fields.next().is_some() {
            return Err(Error::InvalidInput {
                line,
                message: "too many fields".to_string(),
            });
        }
        let value: f64 = value.parse().map_err(|_| Error::InvalidInput {
            line,
            message: format!("value {value:?} is not a number"),
        })?;

        for id in [&source, &target] {
            if seen.insert(id.clone()) {
                nodes.push(NodeData::new(id.clone()));
            }
        }
        links.push(LinkData {
            source,
            target,
            value,
            kind,
        });
    }

    Ok(SankeyInput {
        nodes: Some(nodes),
        links: Some(links),
    })
}

fn is_sankey_header(line: &str) -> bool {
    let h = line.to_ascii_lowercase();
    h == "sankey" || h == "sankey-beta"
}

struct Record {
    line: usize,
    fields: Vec<String>,
}

struct CsvParser<'a> {
    input: &'a str,
    pos: usize,
    line: usize,
}

impl<'a> CsvParser<'a> {
    fn new(input: &'a str) -> Self {
        Self {
            input,
            pos: 0,
            line: 1,
        }
    }

    fn error(&self, message: &str) -> Error {
        Error::InvalidInput {
            line: self.line,
            message: message.to_string(),
        }
    }

    fn eof(&self) -> bool {
        self.pos >= self.input.len()
    }

    fn rest(&self) -> &'a str {
        &self.input[self.pos..]
    }

    fn peek_char(&self) -> Option<char> {
        self.rest().chars().next()
    }

    fn records(mut self) -> Result<Vec<Record>> {
        let mut out = Vec::new();
        loop {
            self.consume_blank_lines();
            if self.eof() {
                return Ok(out);
            }
            let line = self.line;
            let mut fields = vec![self.parse_field()?];
            while self.peek_char() == Some(',') {
                self.pos += 1;
                fields.push(self.parse_field()?);
            }
            if !self.try_consume_newline() && !self.eof() {
                return Err(self.error("expected end of record"));
            }
            out.push(Record { line, fields });
        }
    }

    fn consume_blank_lines(&mut self) {
        loop {
            let rest = self.rest();
            let blank = rest.len() - rest.trim_start_matches([' ', '\t']).len();
            let after = &rest[blank..];
            if after.starts_with('\n') || after.starts_with('\r') {
                self.pos += blank;
                self.try_consume_newline();
            } else if after.is_empty() {
                self.pos += blank;
                return;
            } else {
                return;
            }
        }
    }

    fn try_consume_newline(&mut self) -> bool {
        match self.peek_char() {
            Some('\n') => {
                self.pos += 1;
                self.line += 1;
                true
            }
            Some('\r') => {
                self.pos += 1;
                if self.peek_char() == Some('\n') {
                    self.pos += 1;
                }
                self.line += 1;
                true
            }
            _ => false,
        }
    }

    fn parse_field(&mut self) -> Result<String> {
        let lead = self.rest().len() - self.rest().trim_start_matches([' ', '\t']).len();
        if self.rest()[lead..].starts_with('"') {
            self.pos += lead;
            let field = self.parse_quoted_field()?;
            let rest = self.rest();
            let trail = rest.len() - rest.trim_start_matches([' ', '\t']).len();
            self.pos += trail;
            return Ok(field);
        }
        let mut out = String::new();
        while let Some(ch) = self.peek_char() {
            if ch == ',' || ch == '\n' || ch == '\r' {
                break;
            }
            out.push(ch);
            self.pos += ch.len_utf8();
        }
        Ok(out)
    }

    fn parse_quoted_field(&mut self) -> Result<String> {
        self.pos += 1;
        let mut out = String::new();
        while let Some(ch) = self.peek_char() {
            self.pos += ch.len_utf8();
            match ch {
                '"' if self.peek_char() == Some('"') => {
                    self.pos += 1;
                    out.push('"');
                }
                '"' => return Ok(out),
                '\n' => {
                    self.line += 1;
                    out.push(ch);
                }
                _ => out.push(ch),
            }
        }
        Err(self.error("unterminated quoted field"))
    }
}
