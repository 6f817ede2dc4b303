// src/services/extractor.rs

//! Outage record extraction.
//!
//! Page text is flattened into lines (block elements and `<br>` break lines, inline
//! elements do not) and every line is matched against the record grammar:
//!
//! ```text
//! <digits>.<digits>: <always-on marker>
//! <digits>.<digits>: HH:MM[ - HH:MM]...
//! ```
//!
//! Anything else on the page is noise and is dropped without error.

use regex::Regex;
use scraper::{ElementRef, Html, Selector};

use crate::error::{AppError, Result};
use crate::models::{OutageRecord, ScheduleSnapshot, SourceConfig, SourceMode};
use crate::utils::parse_selector;

/// Turns page markup into a schedule snapshot.
pub trait Extractor: Send + Sync {
    fn extract(&self, markup: &str) -> Result<ScheduleSnapshot>;
}

/// Build the extractor selected by `config.mode`.
pub fn build_extractor(config: &SourceConfig) -> Result<Box<dyn Extractor>> {
    let grammar = RecordGrammar::new(&config.always_on_marker)?;
    let extractor: Box<dyn Extractor> = match config.mode {
        SourceMode::PageText => Box::new(PageTextExtractor::new(
            &config.content_selector,
            grammar,
        )?),
        SourceMode::Article => Box::new(ArticleExtractor::new(
            &config.article.article_selector,
            &config.article.id_attr,
            &config.article.heading_selector,
            &config.article.content_selector,
            grammar,
        )?),
    };
    Ok(extractor)
}

/// Line grammar shared by both extractors.
#[derive(Debug, Clone)]
pub struct RecordGrammar {
    line: Regex,
    window: Regex,
    marker: String,
}

impl RecordGrammar {
    pub fn new(always_on_marker: &str) -> Result<Self> {
        Ok(Self {
            line: Regex::new(r"^(\d+\.\d+):\s*(.+?)\s*$")?,
            window: Regex::new(r"^\d{1,2}:\d{2}(?:\s*[-–—]\s*\d{1,2}:\d{2})?")?,
            marker: always_on_marker.trim().to_lowercase(),
        })
    }

    /// Parse one text line, `None` if it is not a record.
    pub fn parse_line(&self, line: &str) -> Option<OutageRecord> {
        let caps = self.line.captures(line.trim())?;
        let line_id = caps.get(1)?.as_str();
        let description = caps.get(2)?.as_str();

        let always_on = description.to_lowercase().starts_with(&self.marker);
        if always_on || self.window.is_match(description) {
            Some(OutageRecord::new(line_id, description))
        } else {
            None
        }
    }

    /// Parse every record in `text`, keeping document order.
    pub fn scan(&self, text: &str) -> Vec<OutageRecord> {
        text.lines().filter_map(|line| self.parse_line(line)).collect()
    }
}

/// Scans all text inside one container element.
pub struct PageTextExtractor {
    container: Selector,
    container_css: String,
    grammar: RecordGrammar,
}

impl PageTextExtractor {
    pub fn new(container_css: &str, grammar: RecordGrammar) -> Result<Self> {
        Ok(Self {
            container: parse_selector(container_css)?,
            container_css: container_css.to_string(),
            grammar,
        })
    }
}

impl Extractor for PageTextExtractor {
    fn extract(&self, markup: &str) -> Result<ScheduleSnapshot> {
        let document = Html::parse_document(markup);
        let container = document.select(&self.container).next().ok_or_else(|| {
            AppError::not_found(format!("no element matches '{}'", self.container_css))
        })?;

        let text = flatten_text(container);
        Ok(ScheduleSnapshot::new(self.grammar.scan(&text)))
    }
}

/// Reads the first article block: its id, heading and content.
pub struct ArticleExtractor {
    article: Selector,
    article_css: String,
    id_attr: String,
    heading: Selector,
    content: Selector,
    content_css: String,
    grammar: RecordGrammar,
}

impl ArticleExtractor {
    pub fn new(
        article_css: &str,
        id_attr: &str,
        heading_css: &str,
        content_css: &str,
        grammar: RecordGrammar,
    ) -> Result<Self> {
        Ok(Self {
            article: parse_selector(article_css)?,
            article_css: article_css.to_string(),
            id_attr: id_attr.to_string(),
            heading: parse_selector(heading_css)?,
            content: parse_selector(content_css)?,
            content_css: content_css.to_string(),
            grammar,
        })
    }
}

impl Extractor for ArticleExtractor {
    fn extract(&self, markup: &str) -> Result<ScheduleSnapshot> {
        let document = Html::parse_document(markup);
        let article = document.select(&self.article).next().ok_or_else(|| {
            AppError::not_found(format!("no article matches '{}'", self.article_css))
        })?;

        let content = article.select(&self.content).next().ok_or_else(|| {
            AppError::not_found(format!(
                "article has no content matching '{}'",
                self.content_css
            ))
        })?;

        let article_id = article
            .value()
            .attr(&self.id_attr)
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .map(str::to_string);

        let heading = article
            .select(&self.heading)
            .next()
            .map(|h| normalize_whitespace(&h.text().collect::<String>()))
            .filter(|h| !h.is_empty());

        let text = flatten_text(content);
        Ok(ScheduleSnapshot {
            records: self.grammar.scan(&text),
            article_id,
            heading,
        })
    }
}

/// Elements whose text never reaches the output.
const SKIPPED: &[&str] = &["script", "style", "noscript", "template"];

/// Elements that do not start a new line.
const INLINE: &[&str] = &[
    "a", "abbr", "b", "bdi", "bdo", "cite", "code", "data", "dfn", "em", "font", "i", "kbd",
    "mark", "q", "s", "samp", "small", "span", "strong", "sub", "sup", "time", "u", "var",
];

/// Collect an element's text with line breaks at block boundaries.
fn flatten_text(element: ElementRef<'_>) -> String {
    let mut out = String::new();
    push_text(element, &mut out);
    out
}

fn push_text(element: ElementRef<'_>, out: &mut String) {
    for child in element.children() {
        if let Some(text) = child.value().as_text() {
            out.push_str(text);
            continue;
        }
        let Some(child) = ElementRef::wrap(child) else {
            continue;
        };

        let name = child.value().name();
        if name == "br" {
            out.push('\n');
            continue;
        }
        if SKIPPED.contains(&name) {
            continue;
        }

        let block = !INLINE.contains(&name);
        if block {
            out.push('\n');
        }
        push_text(child, out);
        if block {
            out.push('\n');
        }
    }
}

fn normalize_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}
