//! Query catalog extracted from tutorial markdown
//!
//! Each heading (level 2 or deeper) opens a section. The heading text is the
//! business question, and fenced `sql` blocks inside the section, including
//! ones nested in list items or block quotes, are its normalized and
//! denormalized queries:
//!
//! ````markdown
//! ## Which customers have never made a purchase?
//!
//! ```sql normalized
//! SELECT c.customer_id FROM customer c LEFT JOIN cart ON ... WHERE cart.purchase_id IS NULL
//! ```
//!
//! > This cannot be performed on the denormalized schema.
//! ````
//!
//! Untagged `sql` blocks fill the normalized role first, then the
//! denormalized one. Sections can carry HTML comment directives such as
//! `<!-- joinlab: unordered, skip -->`.

use crate::error::{CoreError, CoreResult};
use comrak::nodes::{AstNode, NodeValue};
use comrak::{parse_document, Arena, Options};
use serde::Serialize;
use std::collections::HashSet;
use std::path::Path;

/// Prose phrases that mark an entry as not answerable from the denormalized schema
const NOT_REPRESENTABLE_PHRASES: [&str; 2] = [
    "cannot be performed on the denormalized schema",
    "not representable",
];

/// Prefix of directive comments
const DIRECTIVE_PREFIX: &str = "joinlab:";

/// What the catalog expects of an entry's denormalized query
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Expectation {
    /// Both queries must return the same logical result set
    #[default]
    Equivalent,
    /// The question cannot be answered from the denormalized schema
    NotRepresentable,
}

impl std::fmt::Display for Expectation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Expectation::Equivalent => write!(f, "equivalent"),
            Expectation::NotRepresentable => write!(f, "not representable"),
        }
    }
}

/// How row order is treated when comparing results
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderingHint {
    /// Ordered when both queries declare a top-level ORDER BY
    #[default]
    Auto,
    /// Always compare positionally
    Ordered,
    /// Always compare as multisets
    Unordered,
}

/// A `<!-- joinlab: ... -->` directive
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Directive {
    NotRepresentable,
    Equivalent,
    Ordered,
    Unordered,
    Skip,
}

impl std::str::FromStr for Directive {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "not-representable" | "not_representable" => Ok(Directive::NotRepresentable),
            "equivalent" => Ok(Directive::Equivalent),
            "ordered" => Ok(Directive::Ordered),
            "unordered" => Ok(Directive::Unordered),
            "skip" => Ok(Directive::Skip),
            other => Err(other.to_string()),
        }
    }
}

/// One business question with its query pair
#[derive(Debug, Clone, Serialize)]
pub struct CatalogEntry {
    /// Slug of the question, unique within the catalog
    pub id: String,

    /// 1-based position in the catalog
    pub index: usize,

    /// The business question (heading text)
    pub question: String,

    /// Line of the heading in the markdown source
    pub line: usize,

    /// Query over the normalized schema
    pub normalized: String,

    /// Query over the denormalized schema, if the tutorial gives one
    pub denormalized: Option<String>,

    /// Expected relationship between the two results
    pub expectation: Expectation,

    /// Row order treatment
    pub ordering: OrderingHint,

    /// Excluded from validation by directive
    pub skip: bool,
}

/// A non-fatal problem found while reading the catalog
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CatalogIssue {
    /// Line in the markdown source
    pub line: usize,

    /// Question of the section the issue belongs to
    pub section: Option<String>,

    /// Description
    pub message: String,
}

impl std::fmt::Display for CatalogIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.section {
            Some(section) => write!(f, "line {} ({}): {}", self.line, section, self.message),
            None => write!(f, "line {}: {}", self.line, self.message),
        }
    }
}

/// Entries and issues parsed from a markdown document
#[derive(Debug, Clone, Default, Serialize)]
pub struct Catalog {
    pub entries: Vec<CatalogEntry>,
    pub issues: Vec<CatalogIssue>,
}

/// Role of a SQL block within a section
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum QueryRole {
    Normalized,
    Denormalized,
}

/// Section being accumulated while walking the document
struct SectionBuilder {
    question: String,
    line: usize,
    normalized: Option<String>,
    denormalized: Option<String>,
    prose_not_representable: bool,
    directives: Vec<Directive>,
}

impl SectionBuilder {
    fn new(question: String, line: usize) -> Self {
        Self {
            question,
            line,
            normalized: None,
            denormalized: None,
            prose_not_representable: false,
            directives: Vec::new(),
        }
    }

    fn add_query(&mut self, role: Option<QueryRole>, sql: String, line: usize) -> Option<CatalogIssue> {
        let role = match role {
            Some(role) => role,
            None if self.normalized.is_none() => QueryRole::Normalized,
            None if self.denormalized.is_none() => QueryRole::Denormalized,
            None => {
                return Some(self.issue(line, "extra SQL block ignored"));
            }
        };

        let slot = match role {
            QueryRole::Normalized => &mut self.normalized,
            QueryRole::Denormalized => &mut self.denormalized,
        };
        if slot.is_some() {
            let message = match role {
                QueryRole::Normalized => "second normalized SQL block ignored",
                QueryRole::Denormalized => "second denormalized SQL block ignored",
            };
            return Some(self.issue(line, message));
        }
        *slot = Some(sql);
        None
    }

    fn issue(&self, line: usize, message: &str) -> CatalogIssue {
        CatalogIssue {
            line,
            section: Some(self.question.clone()),
            message: message.to_string(),
        }
    }

    fn has_sql(&self) -> bool {
        self.normalized.is_some() || self.denormalized.is_some()
    }

    /// Turn the section into an entry; `Err` carries the reason it was dropped
    fn finish(self) -> Result<PendingEntry, CatalogIssue> {
        let Some(normalized) = self.normalized else {
            return Err(CatalogIssue {
                line: self.line,
                section: Some(self.question),
                message: "section has a denormalized query but no normalized query".to_string(),
            });
        };

        let mut expectation = if self.prose_not_representable {
            Expectation::NotRepresentable
        } else {
            Expectation::Equivalent
        };
        let mut ordering = OrderingHint::Auto;
        let mut skip = false;

        for directive in &self.directives {
            match directive {
                Directive::NotRepresentable => expectation = Expectation::NotRepresentable,
                Directive::Equivalent => expectation = Expectation::Equivalent,
                Directive::Ordered => ordering = OrderingHint::Ordered,
                Directive::Unordered => ordering = OrderingHint::Unordered,
                Directive::Skip => skip = true,
            }
        }

        Ok(PendingEntry {
            question: self.question,
            line: self.line,
            normalized,
            denormalized: self.denormalized,
            expectation,
            ordering,
            skip,
        })
    }
}

/// Entry before ids are assigned
struct PendingEntry {
    question: String,
    line: usize,
    normalized: String,
    denormalized: Option<String>,
    expectation: Expectation,
    ordering: OrderingHint,
    skip: bool,
}

impl Catalog {
    /// Load a catalog from a markdown file
    pub fn load(path: &Path) -> CoreResult<Self> {
        if !path.exists() {
            return Err(CoreError::CatalogNotFound {
                path: path.display().to_string(),
            });
        }

        let content = std::fs::read_to_string(path).map_err(|e| CoreError::IoWithPath {
            path: path.display().to_string(),
            source: e,
        })?;
        let catalog = Self::parse(&content);
        log::debug!(
            "Loaded {} catalog entries ({} issues) from {}",
            catalog.entries.len(),
            catalog.issues.len(),
            path.display()
        );
        Ok(catalog)
    }

    /// Parse markdown into a catalog. Problems are collected as issues.
    pub fn parse(markdown: &str) -> Self {
        let arena = Arena::new();
        let options = Options::default();
        let root = parse_document(&arena, markdown, &options);

        let mut walker = DocumentWalker::default();
        for node in root.children() {
            let ast = node.data.borrow();
            let line = ast.sourcepos.start.line;

            match &ast.value {
                NodeValue::Heading(heading) => {
                    walker.close_section();
                    if heading.level >= 2 {
                        walker.current =
                            Some(SectionBuilder::new(collect_text(node).trim().to_string(), line));
                    }
                }
                NodeValue::CodeBlock(block) => walker.code_block(&block.info, &block.literal, line),
                NodeValue::HtmlBlock(html) => walker.html_block(&html.literal, line),
                NodeValue::Paragraph => walker.prose(node),
                NodeValue::BlockQuote | NodeValue::List(_) => {
                    walker.prose(node);
                    // fences and directives nested in list items or quotes
                    for nested in node.descendants().skip(1) {
                        let nested_ast = nested.data.borrow();
                        let nested_line = nested_ast.sourcepos.start.line;
                        match &nested_ast.value {
                            NodeValue::CodeBlock(block) => {
                                walker.code_block(&block.info, &block.literal, nested_line)
                            }
                            NodeValue::HtmlBlock(html) => walker.html_block(&html.literal, nested_line),
                            _ => {}
                        }
                    }
                }
                _ => {}
            }
        }
        walker.close_section();

        Self {
            entries: assign_ids(walker.pending),
            issues: walker.issues,
        }
    }

    /// Look up an entry by id
    pub fn get(&self, id: &str) -> Option<&CatalogEntry> {
        self.entries.iter().find(|e| e.id == id)
    }

    /// Entries matching the given ids, in catalog order.
    ///
    /// An empty id list selects every entry.
    pub fn select(&self, ids: &[String]) -> CoreResult<Vec<&CatalogEntry>> {
        if ids.is_empty() {
            return Ok(self.entries.iter().collect());
        }

        for id in ids {
            if self.get(id).is_none() {
                let known: Vec<&str> = self.entries.iter().map(|e| e.id.as_str()).collect();
                return Err(CoreError::UnknownEntry {
                    id: id.clone(),
                    known: known.join(", "),
                });
            }
        }

        Ok(self
            .entries
            .iter()
            .filter(|e| ids.iter().any(|id| *id == e.id))
            .collect())
    }
}

/// State carried while walking the top-level blocks of a document
#[derive(Default)]
struct DocumentWalker {
    pending: Vec<PendingEntry>,
    issues: Vec<CatalogIssue>,
    current: Option<SectionBuilder>,
}

impl DocumentWalker {
    fn close_section(&mut self) {
        let Some(section) = self.current.take() else {
            return;
        };
        if !section.has_sql() {
            return;
        }
        match section.finish() {
            Ok(entry) => self.pending.push(entry),
            Err(issue) => self.issues.push(issue),
        }
    }

    fn code_block(&mut self, info: &str, literal: &str, line: usize) {
        let Some(role) = sql_block_role(info) else {
            return;
        };
        let sql = literal.trim().to_string();
        match self.current.as_mut() {
            Some(section) if !sql.is_empty() => {
                if let Some(issue) = section.add_query(role, sql, line) {
                    self.issues.push(issue);
                }
            }
            Some(section) => self.issues.push(section.issue(line, "empty SQL block ignored")),
            None => self.issues.push(CatalogIssue {
                line,
                section: None,
                message: "SQL block outside of a question section ignored".to_string(),
            }),
        }
    }

    fn html_block(&mut self, literal: &str, line: usize) {
        let Some(words) = directive_words(literal) else {
            return;
        };
        for word in words {
            match (word.parse::<Directive>(), self.current.as_mut()) {
                (Ok(directive), Some(section)) => section.directives.push(directive),
                (Ok(_), None) => self.issues.push(CatalogIssue {
                    line,
                    section: None,
                    message: format!("directive '{}' outside of a question section ignored", word),
                }),
                (Err(unknown), section) => self.issues.push(CatalogIssue {
                    line,
                    section: section.map(|s| s.question.clone()),
                    message: format!("unknown directive '{}'", unknown),
                }),
            }
        }
    }

    fn prose<'a>(&mut self, node: &'a AstNode<'a>) {
        if let Some(section) = self.current.as_mut() {
            let prose = collect_text(node).to_lowercase();
            if NOT_REPRESENTABLE_PHRASES.iter().any(|p| prose.contains(p)) {
                section.prose_not_representable = true;
            }
        }
    }
}

fn assign_ids(pending: Vec<PendingEntry>) -> Vec<CatalogEntry> {
    let mut issued: HashSet<String> = HashSet::new();

    pending
        .into_iter()
        .enumerate()
        .map(|(i, entry)| {
            let base = slugify(&entry.question);
            let mut id = base.clone();
            let mut suffix = 1;
            // a suffixed id can collide with another question's slug
            while issued.contains(&id) {
                suffix += 1;
                id = format!("{}-{}", base, suffix);
            }
            issued.insert(id.clone());

            CatalogEntry {
                id,
                index: i + 1,
                question: entry.question,
                line: entry.line,
                normalized: entry.normalized,
                denormalized: entry.denormalized,
                expectation: entry.expectation,
                ordering: entry.ordering,
                skip: entry.skip,
            }
        })
        .collect()
}

/// Role requested by a fenced block's info string.
///
/// Returns `None` for non-SQL blocks and `Some(None)` for untagged SQL blocks.
fn sql_block_role(info: &str) -> Option<Option<QueryRole>> {
    let mut words = info.split_whitespace();
    let language = words.next()?;
    if !language.eq_ignore_ascii_case("sql") {
        return None;
    }
    let role = match words.next().map(|w| w.to_ascii_lowercase()) {
        Some(w) if w == "normalized" => Some(QueryRole::Normalized),
        Some(w) if w == "denormalized" => Some(QueryRole::Denormalized),
        _ => None,
    };
    Some(role)
}

/// Words of a `<!-- joinlab: ... -->` comment, or `None` for other HTML
fn directive_words(html: &str) -> Option<Vec<String>> {
    let body = html.trim().strip_prefix("<!--")?.strip_suffix("-->")?.trim();
    let rest = body.strip_prefix(DIRECTIVE_PREFIX)?;
    Some(
        rest.split(|c: char| c == ',' || c.is_whitespace())
            .filter(|w| !w.is_empty())
            .map(str::to_string)
            .collect(),
    )
}

/// Concatenated inline text of a block node
fn collect_text<'a>(node: &'a AstNode<'a>) -> String {
    let mut text = String::new();
    for descendant in node.descendants() {
        match &descendant.data.borrow().value {
            NodeValue::Text(t) => text.push_str(t),
            NodeValue::Code(code) => text.push_str(&code.literal),
            NodeValue::SoftBreak | NodeValue::LineBreak => text.push(' '),
            _ => {}
        }
    }
    text
}

/// Lowercase slug: alphanumerics kept, everything else collapsed to `-`
pub fn slugify(text: &str) -> String {
    let mut slug = String::with_capacity(text.len());
    for c in text.chars() {
        if c.is_alphanumeric() {
            slug.extend(c.to_lowercase());
        } else if !slug.ends_with('-') {
            slug.push('-');
        }
    }
    let slug = slug.trim_matches('-');
    if slug.is_empty() {
        "entry".to_string()
    } else {
        slug.to_string()
    }
}

#[cfg(test)]
#[path = "catalog_test.rs"]
mod tests;
