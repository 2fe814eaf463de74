//! # Article Splitter
//!
//! ## Purpose
//! Parses a statute's full plain text into an ordered sequence of article
//! records, tracking the current Book/Part/Chapter/Section hierarchy as a
//! breadcrumb. Pure function of its input: no I/O, no persistence awareness,
//! so it is directly unit-testable.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::numeral::cn_to_int;

/// One parsed article, prior to receiving a database identity.
#[derive(Debug, Clone, PartialEq)]
pub struct SplitArticle {
    pub number_int: i64,
    pub number_str: String,
    pub content: String,
    pub chapter_path: String,
}

static HIERARCHY_LINE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^第[〇零一二三四五六七八九十百千万]+(编|分编|章|节)\s*(.+)$").unwrap()
});

static ARTICLE_OPENER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^第([〇零一二三四五六七八九十百千万]+|[0-9]+)条(之([〇零一二三四五六七八九十百千万]+|[0-9]+))?")
        .unwrap()
});

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum HierarchyLevel {
    Book,
    Part,
    Chapter,
    Section,
}

fn hierarchy_level(marker: &str) -> HierarchyLevel {
    match marker {
        "编" => HierarchyLevel::Book,
        "分编" => HierarchyLevel::Part,
        "章" => HierarchyLevel::Chapter,
        _ => HierarchyLevel::Section,
    }
}

struct HierarchyStack {
    book: Option<String>,
    part: Option<String>,
    chapter: Option<String>,
    section: Option<String>,
}

impl HierarchyStack {
    fn new() -> Self {
        Self {
            book: None,
            part: None,
            chapter: None,
            section: None,
        }
    }

    fn push(&mut self, level: HierarchyLevel, line: String) {
        match level {
            HierarchyLevel::Book => {
                self.book = Some(line);
                self.part = None;
                self.chapter = None;
                self.section = None;
            }
            HierarchyLevel::Part => {
                self.part = Some(line);
                self.chapter = None;
                self.section = None;
            }
            HierarchyLevel::Chapter => {
                self.chapter = Some(line);
                self.section = None;
            }
            HierarchyLevel::Section => {
                self.section = Some(line);
            }
        }
    }

    fn path(&self) -> String {
        [&self.book, &self.part, &self.chapter, &self.section]
            .into_iter()
            .flatten()
            .cloned()
            .collect::<Vec<_>>()
            .join(" > ")
    }
}

/// Parse an Arabic or Chinese numeral token into its integer value, falling
/// back to `0` on failure rather than aborting the whole parse.
fn parse_numeral_token(token: &str) -> i64 {
    if let Ok(n) = token.parse::<i64>() {
        return n;
    }
    match cn_to_int(token) {
        Ok(n) => n,
        Err(e) => {
            tracing::warn!(token, error = %e, "article numeral failed to parse");
            0
        }
    }
}

struct InProgress {
    number_int: i64,
    number_str: String,
    lines: Vec<String>,
    chapter_path: String,
}

/// Split a statute's full text into an ordered list of articles.
pub fn split_articles(text: &str) -> Vec<SplitArticle> {
    let mut hierarchy = HierarchyStack::new();
    let mut articles = Vec::new();
    let mut current: Option<InProgress> = None;

    for raw_line in text.lines() {
        let line = raw_line.trim_end();

        if let Some(caps) = HIERARCHY_LINE.captures(line.trim_start()) {
            if let Some(opener) = current.take() {
                articles.push(finish(opener));
            }
            let marker = &caps[1];
            hierarchy.push(hierarchy_level(marker), line.trim().to_string());
            continue;
        }

        if let Some(caps) = ARTICLE_OPENER.captures(line.trim_start()) {
            if let Some(opener) = current.take() {
                articles.push(finish(opener));
            }

            let base_token = &caps[1];
            let suffix_token = caps.get(3).map(|m| m.as_str());
            let number_int = parse_numeral_token(base_token);

            let number_str = match suffix_token {
                Some(suffix) => {
                    if number_int == 0 {
                        format!("{}之{}", base_token, suffix)
                    } else {
                        format!("{}之{}", number_int, suffix)
                    }
                }
                None => {
                    if number_int == 0 {
                        base_token.to_string()
                    } else {
                        number_int.to_string()
                    }
                }
            };

            current = Some(InProgress {
                number_int,
                number_str,
                lines: vec![line.to_string()],
                chapter_path: hierarchy.path(),
            });
            continue;
        }

        if line.trim().is_empty() {
            if let Some(opener) = current.as_mut() {
                opener.lines.push(String::new());
            }
            continue;
        }

        if let Some(opener) = current.as_mut() {
            opener.lines.push(line.to_string());
        }
    }

    if let Some(opener) = current.take() {
        articles.push(finish(opener));
    }

    articles
}

fn finish(opener: InProgress) -> SplitArticle {
    SplitArticle {
        number_int: opener.number_int,
        number_str: opener.number_str,
        content: opener.lines.join("\n"),
        chapter_path: opener.chapter_path,
    }
}

/// Parse a standalone article-number token (`"第147条"`, `"538之一"`, `"1023"`)
/// the way a caller would type it, independent of a full statute scan.
pub fn parse_article_number(token: &str) -> (i64, String) {
    let trimmed = token.trim();
    if let Some(caps) = ARTICLE_OPENER.captures(trimmed) {
        let base_token = &caps[1];
        let suffix_token = caps.get(3).map(|m| m.as_str());
        let number_int = parse_numeral_token(base_token);
        let number_str = match suffix_token {
            Some(suffix) if number_int == 0 => format!("{base_token}之{suffix}"),
            Some(suffix) => format!("{number_int}之{suffix}"),
            None if number_int == 0 => base_token.to_string(),
            None => number_int.to_string(),
        };
        return (number_int, number_str);
    }
    let number_int = parse_numeral_token(trimmed);
    (number_int, trimmed.to_string())
}

/// A hierarchy node in a statute's Book/Part/Chapter/Section tree, without
/// article content — used to render a law's structure on demand.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct StructureNode {
    #[serde(rename = "type")]
    pub kind: String,
    pub title: String,
    pub children: Vec<StructureNode>,
}

/// Parse a statute's hierarchy lines into a nested tree, ignoring article
/// bodies entirely. Articles under the deepest open node are counted but not
/// rendered; the node's `title` carries that count for display.
pub fn parse_structure(text: &str) -> Vec<StructureNode> {
    let mut roots: Vec<StructureNode> = Vec::new();
    // Stack of (level, index path) into `roots`, used to find the current
    // parent for a new line without re-walking the tree each time.
    let mut stack: Vec<(HierarchyLevel, Vec<usize>)> = Vec::new();

    for raw_line in text.lines() {
        let line = raw_line.trim();
        let Some(caps) = HIERARCHY_LINE.captures(line) else {
            continue;
        };
        let marker = &caps[1];
        let level = hierarchy_level(marker);

        while let Some((top_level, _)) = stack.last() {
            if rank(*top_level) >= rank(level) {
                stack.pop();
            } else {
                break;
            }
        }

        let node = StructureNode {
            kind: marker.to_string(),
            title: line.to_string(),
            children: Vec::new(),
        };

        let path = match stack.last() {
            Some((_, parent_path)) => {
                let parent = node_at_mut(&mut roots, parent_path);
                parent.children.push(node);
                let mut path = parent_path.clone();
                path.push(parent.children.len() - 1);
                path
            }
            None => {
                roots.push(node);
                vec![roots.len() - 1]
            }
        };
        stack.push((level, path));
    }

    roots
}

fn rank(level: HierarchyLevel) -> u8 {
    match level {
        HierarchyLevel::Book => 0,
        HierarchyLevel::Part => 1,
        HierarchyLevel::Chapter => 2,
        HierarchyLevel::Section => 3,
    }
}

fn node_at_mut<'a>(roots: &'a mut [StructureNode], path: &[usize]) -> &'a mut StructureNode {
    let mut node = &mut roots[path[0]];
    for &i in &path[1..] {
        node = &mut node.children[i];
    }
    node
}
