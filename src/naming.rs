//! Filename rendering from the configured template.

use crate::config::{Acronym, AppConfig, DATE_FMT_DEFAULT};
use chrono::Local;
use std::fmt::Write;
use std::path::Path;

/// Characters the document store rejects in item names.
const FORBIDDEN: [char; 15] = [
    '"', '*', ':', '<', '>', '?', '/', '\\', '|', '#', '%', '[', ']', '{', '}',
];
const MAX_NAME_LEN: usize = 120;

/// The pieces that went into a rendered filename.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NameParts {
    pub customer: String,
    pub keyword_acr: String,
    pub detail_acr: String,
    pub date: String,
    pub ext: String,
    pub extra: String,
}

/// What the user picked for a file.
#[derive(Debug, Clone, Default)]
pub struct NameRequest<'a> {
    pub customer: &'a str,
    pub keyword: &'a str,
    pub detail: &'a str,
    /// `detail` is a brand name to be replaced by its acronym.
    pub is_brand: bool,
    pub date_override: Option<&'a str>,
    /// Extension including the leading dot, or empty.
    pub ext: &'a str,
    pub extra: &'a str,
}

pub struct Namer<'a> {
    cfg: &'a AppConfig,
}

impl<'a> Namer<'a> {
    pub fn new(cfg: &'a AppConfig) -> Self {
        Namer { cfg }
    }

    pub fn keyword_acronym(&self, keyword: &str) -> String {
        lookup_acronym(&self.cfg.keywords, keyword)
    }

    pub fn brand_acronym(&self, brand: &str) -> String {
        lookup_acronym(&self.cfg.brands, brand)
    }

    pub fn location_acronym(&self, side: &str, location: &str) -> String {
        self.cfg
            .locations
            .get(side)
            .map(|items| lookup_acronym(items, location))
            .unwrap_or_else(|| location.to_owned())
    }

    /// Renders the filename for `req` and returns it with its parts.
    ///
    /// Unknown placeholders render empty. When `extra` is given but the
    /// template has no `{extra}`, it goes before `{date}` (or at the end).
    pub fn render(&self, req: &NameRequest<'_>) -> (String, NameParts) {
        let date = match req.date_override {
            Some(date) => date.to_owned(),
            None => today(&self.cfg.date_format),
        };
        let keyword_acr = self.keyword_acronym(req.keyword);
        let detail_acr = if req.is_brand {
            self.brand_acronym(req.detail)
        } else {
            req.detail.to_owned()
        };
        let extra = req.extra.trim();

        let mut template = self.cfg.filename_template.clone();
        if !extra.is_empty() && !template.contains("{extra}") {
            if template.contains("{date}") {
                template = template.replace("{date}", "{extra} {date}");
            } else {
                template.push_str(" {extra}");
            }
        }

        let parts = NameParts {
            customer: req.customer.trim().to_owned(),
            keyword_acr,
            detail_acr: detail_acr.trim().to_owned(),
            date,
            ext: req.ext.to_owned(),
            extra: extra.to_owned(),
        };

        let base = fill_template(&template, |key| match key {
            "customer" => Some(parts.customer.as_str()),
            "keyword" => Some(parts.keyword_acr.as_str()),
            "detail" => Some(parts.detail_acr.as_str()),
            "date" => Some(parts.date.as_str()),
            "extra" => Some(parts.extra.as_str()),
            _ => None,
        });
        let base = collapse_whitespace(&base);

        (format!("{base}{}", parts.ext), parts)
    }
}

/// Guesses the customer from a downloaded file's name: the first two
/// capitalized words of the stem, or the whole stem.
pub fn guess_customer(path: &Path) -> String {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let tokens: Vec<&str> = stem.split_whitespace().collect();

    let capitalized = |t: &str| t.chars().next().is_some_and(char::is_uppercase);
    match tokens.as_slice() {
        [first, second, ..] if capitalized(*first) && capitalized(*second) => {
            format!("{first} {second}")
        }
        _ => stem,
    }
}

/// Makes a display string safe to use as a document-store item name.
pub fn sanitize_name(s: &str) -> String {
    let cleaned: String = s.chars().filter(|c| !FORBIDDEN.contains(c)).collect();
    let mut name = collapse_whitespace(&cleaned)
        .trim_matches(|c: char| c == ' ' || c == '.')
        .to_owned();

    if name.is_empty() {
        return "Untitled".to_owned();
    }
    if let Some((idx, _)) = name.char_indices().nth(MAX_NAME_LEN) {
        name.truncate(idx);
        name.truncate(name.trim_end().len());
    }
    name
}

fn lookup_acronym(items: &[Acronym], full: &str) -> String {
    items
        .iter()
        .find(|it| it.name == full)
        .map(|it| it.acronym.clone())
        .unwrap_or_else(|| full.to_owned())
}

fn today(format: &str) -> String {
    let now = Local::now();
    let mut out = String::new();
    if write!(out, "{}", now.format(format)).is_err() {
        return now.format(DATE_FMT_DEFAULT).to_string();
    }
    out
}

fn fill_template<'v>(template: &str, lookup: impl Fn(&str) -> Option<&'v str>) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        match after.find('}') {
            Some(close) => {
                out.push_str(lookup(&after[..close]).unwrap_or(""));
                rest = &after[close + 1..];
            }
            None => {
                out.push_str(&rest[open..]);
                rest = "";
            }
        }
    }
    out.push_str(rest);
    out
}

fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}
