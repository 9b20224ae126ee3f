//! Wiki markup scanning: linked mentions, redirect directives, bold lead terms and inline
//! type annotations.

use lazy_static::lazy_static;
use regex::{Captures, Regex};
use std::collections::{HashMap, HashSet};
use tracing::warn;

use super::types::EntityType;
use super::TARGET_ENTITY;

lazy_static! {
    // [[target]] or [[target|display text]]
    static ref LINK_PATTERN: Regex =
        Regex::new(r"\[\[([^\[\]|]+?)(?:\|([^\[\]]*?))?\]\]").expect("valid link pattern");
    static ref REDIRECT_PATTERN: Regex =
        Regex::new(r"(?i)#(?:REDIRECT|DOORVERWIJZING)\s*:?\s*\[\[([^\[\]|#]+?)(?:[#|][^\[\]]*)?\]\]")
            .expect("valid redirect pattern");
    static ref BOLD_PATTERN: Regex = Regex::new(r"'''(.+?)'''").expect("valid bold pattern");
    // Spans the plain-text passes leave alone: annotations and links
    static ref MARKED_PATTERN: Regex =
        Regex::new(r"@@@[^@]*?@@@|\[\[[^\[\]]*\]\]").expect("valid marked span pattern");
    static ref WORD_RUN_BREAK: Regex =
        Regex::new(r#"'{2,}|[.,;:!?()\[\]{}<>|"=*#\n]"#).expect("valid word run break pattern");
}

/// A linked mention found in a body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkMention {
    pub target: String,
    pub text: String,
}

fn is_entity_target(target: &str) -> bool {
    // Namespaced links (categories, files, interlanguage links) are not entity mentions
    !target.trim().is_empty() && !target.contains(':')
}

/// All entity links in document order, including repeats.
pub fn link_mentions(body: &str) -> Vec<LinkMention> {
    LINK_PATTERN
        .captures_iter(body)
        .filter_map(|captures| {
            let target = captures[1].trim();
            if !is_entity_target(target) {
                return None;
            }
            let text = captures
                .get(2)
                .map(|m| m.as_str().trim())
                .filter(|text| !text.is_empty())
                .unwrap_or(target);
            Some(LinkMention {
                target: target.to_string(),
                text: text.to_string(),
            })
        })
        .collect()
}

/// Distinct link targets in document order; the display-text part of a link is ignored.
pub fn linked_entities(body: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    link_mentions(body)
        .into_iter()
        .map(|mention| mention.target)
        .filter(|target| seen.insert(target.clone()))
        .collect()
}

/// Destination title of a redirect directive, if the body carries one.
pub fn redirect_target(body: &str) -> Option<String> {
    REDIRECT_PATTERN
        .captures(body)
        .map(|captures| captures[1].trim().to_string())
        .filter(|target| !target.is_empty())
}

pub fn is_redirect(body: &str) -> bool {
    redirect_target(body).is_some()
}

/// Bold-faced terms in document order.
pub fn bold_terms(body: &str) -> Vec<String> {
    BOLD_PATTERN
        .captures_iter(body)
        .map(|captures| captures[1].trim().to_string())
        .filter(|term| !term.is_empty())
        .collect()
}

/// Formats an inline annotation: `@@@<text>,<TYPE>@@@`.
pub fn annotation(text: &str, entity_type: EntityType) -> String {
    format!("@@@{},{}@@@", text, entity_type)
}

/// Rewrites every entity link: typed targets become annotations, the rest become plain text.
/// Namespaced links are left untouched.
pub fn annotate_links<F>(body: &str, lookup: F) -> String
where
    F: Fn(&str) -> Option<EntityType>,
{
    LINK_PATTERN
        .replace_all(body, |captures: &Captures| {
            let target = captures[1].trim();
            if !is_entity_target(target) {
                return captures[0].to_string();
            }
            let text = captures
                .get(2)
                .map(|m| m.as_str().trim())
                .filter(|text| !text.is_empty())
                .unwrap_or(target);
            match lookup(target) {
                Some(entity_type) => annotation(text, entity_type),
                None => text.to_string(),
            }
        })
        .into_owned()
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

fn at_word_boundary(text: &str, start: usize, end: usize) -> bool {
    let before = text[..start].chars().next_back();
    let after = text[end..].chars().next();
    !before.is_some_and(is_word_char) && !after.is_some_and(is_word_char)
}

/// Applies `rewrite` to the text between annotations and links, keeping those spans verbatim.
fn rewrite_plain_text<F>(body: &str, mut rewrite: F) -> String
where
    F: FnMut(&str) -> String,
{
    let mut rewritten = String::with_capacity(body.len());
    let mut last = 0;
    for marked in MARKED_PATTERN.find_iter(body) {
        rewritten.push_str(&rewrite(&body[last..marked.start()]));
        rewritten.push_str(marked.as_str());
        last = marked.end();
    }
    rewritten.push_str(&rewrite(&body[last..]));
    rewritten
}

/// Annotates plain-text repeats of already typed titles, matched case-insensitively on whole
/// words. Longer titles take precedence; existing annotations and links are not touched.
pub fn annotate_recurring(body: &str, typed: &[(String, EntityType)]) -> String {
    let mut types: HashMap<String, EntityType> = HashMap::new();
    for (title, entity_type) in typed {
        let title = title.trim();
        if !title.is_empty() {
            types.entry(title.to_lowercase()).or_insert(*entity_type);
        }
    }
    if types.is_empty() {
        return body.to_string();
    }

    let mut titles: Vec<&str> = types.keys().map(String::as_str).collect();
    titles.sort_by(|a, b| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));
    let alternation: Vec<String> = titles.iter().map(|title| regex::escape(title)).collect();
    let pattern = match Regex::new(&format!("(?i){}", alternation.join("|"))) {
        Ok(pattern) => pattern,
        Err(err) => {
            warn!(target: TARGET_ENTITY, "Cannot match {} recurring titles: {}", titles.len(), err);
            return body.to_string();
        }
    };

    rewrite_plain_text(body, |segment| {
        let mut annotated = String::with_capacity(segment.len());
        let mut last = 0;
        for found in pattern.find_iter(segment) {
            if !at_word_boundary(segment, found.start(), found.end()) {
                continue;
            }
            if let Some(entity_type) = types.get(&found.as_str().to_lowercase()) {
                annotated.push_str(&segment[last..found.start()]);
                annotated.push_str(&annotation(found.as_str(), *entity_type));
                last = found.end();
            }
        }
        annotated.push_str(&segment[last..]);
        annotated
    })
}

/// Distinct word n-grams of the plain text in document order. A window never spans a link, an
/// annotation or punctuation, and must start with an upper-case letter.
pub fn ngrams(body: &str, n: usize) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut grams = Vec::new();
    if n == 0 {
        return grams;
    }

    for segment in MARKED_PATTERN.split(body) {
        for run in WORD_RUN_BREAK.split(segment) {
            let words: Vec<&str> = run.split_whitespace().collect();
            for window in words.windows(n) {
                if !window[0].chars().next().is_some_and(char::is_uppercase) {
                    continue;
                }
                let gram = window.join(" ");
                if seen.insert(gram.clone()) {
                    grams.push(gram);
                }
            }
        }
    }
    grams
}
