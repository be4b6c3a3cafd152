//! RSS 2.0, RSS 1.0 (RDF) and Atom parsing into [`FeedItem`]s.
//!
//! Documents are deserialized with `quick_xml::de`; the root element decides
//! which layout is expected. Entry order is preserved.

use crate::feeds::sources::FeedSource;
use crate::models::FeedItem;
use itertools::Itertools;
use once_cell::sync::Lazy;
use quick_xml::de::from_str;
use regex::{Captures, Regex};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::error::Error;
use tracing::debug;
use url::Url;

#[derive(Debug, Default, Deserialize)]
struct TextNode {
    #[serde(rename = "$text", default)]
    value: String,
}

#[derive(Debug, Deserialize)]
struct RssDocument {
    channel: RssChannel,
}

#[derive(Debug, Deserialize)]
struct RssChannel {
    #[serde(default)]
    title: Option<String>,
    #[serde(rename = "item", default)]
    items: Vec<RssItem>,
}

#[derive(Debug, Deserialize)]
struct RssItem {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    link: Option<String>,
    #[serde(default)]
    description: Option<String>,
    #[serde(rename = "pubDate", default)]
    pub_date: Option<String>,
    #[serde(rename = "dc:date", alias = "date", default)]
    dc_date: Option<String>,
    #[serde(default)]
    author: Option<String>,
    #[serde(rename = "category", default)]
    categories: Vec<TextNode>,
}

/// RSS 1.0 keeps its items next to the channel instead of inside it.
#[derive(Debug, Deserialize)]
struct RdfDocument {
    #[serde(default)]
    channel: Option<RdfChannel>,
    #[serde(rename = "item", default)]
    items: Vec<RssItem>,
}

#[derive(Debug, Deserialize)]
struct RdfChannel {
    #[serde(default)]
    title: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AtomFeed {
    #[serde(default)]
    title: Option<TextNode>,
    #[serde(rename = "entry", default)]
    entries: Vec<AtomEntry>,
}

#[derive(Debug, Deserialize)]
struct AtomEntry {
    #[serde(default)]
    title: Option<TextNode>,
    #[serde(rename = "link", default)]
    links: Vec<AtomLink>,
    #[serde(default)]
    summary: Option<TextNode>,
    #[serde(default)]
    content: Option<TextNode>,
    #[serde(default)]
    published: Option<String>,
    #[serde(default)]
    updated: Option<String>,
    #[serde(rename = "author", default)]
    authors: Vec<AtomPerson>,
    #[serde(rename = "category", default)]
    categories: Vec<AtomCategory>,
}

#[derive(Debug, Deserialize)]
struct AtomLink {
    #[serde(rename = "@href", default)]
    href: String,
    #[serde(rename = "@rel", default)]
    rel: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AtomPerson {
    #[serde(default)]
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AtomCategory {
    #[serde(rename = "@term", default)]
    term: String,
}

/// Format-independent view of a parsed document.
#[derive(Debug, Default)]
struct ParsedFeed {
    title: Option<String>,
    entries: Vec<ParsedEntry>,
}

#[derive(Debug, Default)]
struct ParsedEntry {
    title: Option<String>,
    link: Option<String>,
    date: Option<String>,
    summary: Option<String>,
    author: Option<String>,
    categories: Vec<String>,
}

impl From<RssItem> for ParsedEntry {
    fn from(item: RssItem) -> Self {
        ParsedEntry {
            title: item.title,
            link: item.link,
            date: item.pub_date.or(item.dc_date),
            summary: item.description,
            author: item.author,
            categories: item.categories.into_iter().map(|c| c.value).collect(),
        }
    }
}

impl From<AtomEntry> for ParsedEntry {
    fn from(entry: AtomEntry) -> Self {
        let link = entry
            .links
            .iter()
            .find(|l| matches!(l.rel.as_deref(), None | Some("alternate")))
            .or_else(|| entry.links.first())
            .map(|l| l.href.clone());
        let author = entry
            .authors
            .into_iter()
            .filter_map(|a| a.name)
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty())
            .join(", ");

        ParsedEntry {
            title: entry.title.map(|t| t.value),
            link,
            date: entry.published.or(entry.updated),
            summary: [entry.summary, entry.content]
                .into_iter()
                .flatten()
                .map(|t| t.value)
                .find(|t| !t.trim().is_empty()),
            author: Some(author).filter(|a| !a.is_empty()),
            categories: entry.categories.into_iter().map(|c| c.term).collect(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FeedFormat {
    Rss,
    Rdf,
    Atom,
}

/// Name of the document's root element, skipping the prolog, comments and
/// the doctype.
fn root_element(xml: &str) -> Option<&str> {
    let mut rest = xml;
    loop {
        rest = &rest[rest.find('<')? + 1..];
        let closer = if rest.starts_with("!--") {
            "-->"
        } else if rest.starts_with('?') {
            "?>"
        } else if rest.starts_with('!') {
            ">"
        } else {
            let end = rest
                .find(|c: char| c.is_whitespace() || c == '>' || c == '/')
                .unwrap_or(rest.len());
            return Some(&rest[..end]);
        };
        rest = &rest[rest.find(closer)? + closer.len()..];
    }
}

fn sniff_format(xml: &str) -> Option<FeedFormat> {
    match root_element(xml)? {
        "rss" => Some(FeedFormat::Rss),
        "rdf:RDF" | "RDF" => Some(FeedFormat::Rdf),
        "feed" => Some(FeedFormat::Atom),
        _ => None,
    }
}

static NAMED_ENTITY: Lazy<Regex> = Lazy::new(|| Regex::new(r"&([A-Za-z][A-Za-z0-9]*);").unwrap());

static XHTML_TEXT: Lazy<[(&str, Regex); 2]> = Lazy::new(|| {
    ["summary", "content"].map(|tag| {
        let re = Regex::new(&format!(
            r#"(?s)<{tag}(\s[^>]*\btype\s*=\s*["']xhtml["'][^>]*)>(.*?)</{tag}>"#
        ))
        .unwrap();
        (tag, re)
    })
});

/// Character for an HTML named entity that XML does not define.
fn html_entity(name: &str) -> Option<&'static str> {
    let ch = match name {
        "nbsp" | "ensp" | "emsp" | "thinsp" => " ",
        "ndash" | "mdash" | "minus" => "-",
        "hellip" => "...",
        "ldquo" | "rdquo" | "bdquo" => "\"",
        "lsquo" | "rsquo" | "sbquo" => "'",
        "laquo" => "«",
        "raquo" => "»",
        "lsaquo" => "‹",
        "rsaquo" => "›",
        "copy" => "©",
        "reg" => "®",
        "trade" => "™",
        "deg" => "°",
        "middot" => "·",
        "bull" => "•",
        "sect" => "§",
        "para" => "¶",
        "times" => "×",
        "divide" => "÷",
        "plusmn" => "±",
        "frac12" => "½",
        "frac14" => "¼",
        "frac34" => "¾",
        "euro" => "€",
        "pound" => "£",
        "yen" => "¥",
        "cent" => "¢",
        "dagger" => "†",
        "szlig" => "ß",
        "agrave" => "à",
        "aacute" => "á",
        "acirc" => "â",
        "atilde" => "ã",
        "auml" => "ä",
        "aring" => "å",
        "aelig" => "æ",
        "ccedil" => "ç",
        "egrave" => "è",
        "eacute" => "é",
        "ecirc" => "ê",
        "euml" => "ë",
        "igrave" => "ì",
        "iacute" => "í",
        "icirc" => "î",
        "iuml" => "ï",
        "ntilde" => "ñ",
        "ograve" => "ò",
        "oacute" => "ó",
        "ocirc" => "ô",
        "otilde" => "õ",
        "ouml" => "ö",
        "oslash" => "ø",
        "ugrave" => "ù",
        "uacute" => "ú",
        "ucirc" => "û",
        "uuml" => "ü",
        "yacute" => "ý",
        "yuml" => "ÿ",
        "Agrave" => "À",
        "Aacute" => "Á",
        "Acirc" => "Â",
        "Auml" => "Ä",
        "Aring" => "Å",
        "Ccedil" => "Ç",
        "Egrave" => "È",
        "Eacute" => "É",
        "Ecirc" => "Ê",
        "Iacute" => "Í",
        "Ntilde" => "Ñ",
        "Oacute" => "Ó",
        "Ouml" => "Ö",
        "Oslash" => "Ø",
        "Uacute" => "Ú",
        "Uuml" => "Ü",
        _ => return None,
    };
    Some(ch)
}

/// Replace HTML-only named entities, which XML rejects, with their
/// characters. The five XML entities are kept; unknown names are dropped.
fn scrub_html_entities(s: &str) -> String {
    NAMED_ENTITY
        .replace_all(s, |caps: &Captures| match &caps[1] {
            "amp" | "lt" | "gt" | "quot" | "apos" => caps[0].to_string(),
            name => html_entity(name).unwrap_or_default().to_string(),
        })
        .into_owned()
}

/// Escape the markup of Atom `type="xhtml"` summaries and contents so they
/// deserialize as HTML text like `type="html"` ones.
fn escape_xhtml_text(s: &str) -> String {
    XHTML_TEXT.iter().fold(s.to_string(), |xml, (tag, re)| {
        re.replace_all(&xml, |caps: &Captures| {
            let inner = caps[2]
                .replace('&', "&amp;")
                .replace('<', "&lt;")
                .replace('>', "&gt;");
            format!("<{tag}{}>{}</{tag}>", &caps[1], inner.trim())
        })
        .into_owned()
    })
}

fn parse_document(xml: &str) -> Result<ParsedFeed, Box<dyn Error>> {
    let parsed = match sniff_format(xml) {
        Some(FeedFormat::Rss) => {
            let doc: RssDocument = from_str(xml)?;
            ParsedFeed {
                title: doc.channel.title,
                entries: doc.channel.items.into_iter().map(ParsedEntry::from).collect(),
            }
        }
        Some(FeedFormat::Rdf) => {
            let doc: RdfDocument = from_str(xml)?;
            ParsedFeed {
                title: doc.channel.and_then(|c| c.title),
                entries: doc.items.into_iter().map(ParsedEntry::from).collect(),
            }
        }
        Some(FeedFormat::Atom) => {
            let doc: AtomFeed = from_str(xml)?;
            ParsedFeed {
                title: doc.title.map(|t| t.value),
                entries: doc.entries.into_iter().map(ParsedEntry::from).collect(),
            }
        }
        None => {
            let root = root_element(xml).unwrap_or("<none>");
            return Err(format!("unrecognized feed document (root element `{root}`)").into());
        }
    };
    Ok(parsed)
}

fn non_empty(s: Option<&str>) -> Option<&str> {
    s.map(str::trim).filter(|s| !s.is_empty())
}

/// Title used to group a feed's entries: the configured title, the title the
/// feed announces, or the host of the feed URL.
fn source_title(source: &FeedSource, announced: Option<&str>) -> String {
    non_empty(source.title.as_deref())
        .or_else(|| non_empty(announced))
        .map(str::to_string)
        .unwrap_or_else(|| {
            Url::parse(&source.url)
                .ok()
                .and_then(|u| u.host_str().map(str::to_string))
                .unwrap_or_else(|| source.url.clone())
        })
}

/// Resolve a possibly relative entry link against the feed URL.
fn resolve_link(base: Option<&Url>, link: &str) -> String {
    match base.map(|b| b.join(link)) {
        Some(Ok(resolved)) => resolved.to_string(),
        _ => link.to_string(),
    }
}

/// Parse a fetched feed document into entries attributed to `source`.
pub fn parse_feed(xml: &str, source: &FeedSource) -> Result<Vec<FeedItem>, Box<dyn Error>> {
    let xml = escape_xhtml_text(&scrub_html_entities(xml));
    let parsed = parse_document(&xml)?;
    let title = source_title(source, parsed.title.as_deref());
    let base = Url::parse(&source.url).ok();

    let items: Vec<FeedItem> = parsed
        .entries
        .into_iter()
        .map(|entry| {
            let mut info = BTreeMap::new();
            info.insert("feed_url".to_string(), source.url.clone());
            if let Some(author) = non_empty(entry.author.as_deref()) {
                info.insert("author".to_string(), author.to_string());
            }
            let categories = entry
                .categories
                .iter()
                .map(|c| c.trim())
                .filter(|c| !c.is_empty())
                .join(", ");
            if !categories.is_empty() {
                info.insert("categories".to_string(), categories);
            }

            FeedItem {
                date: non_empty(entry.date.as_deref()).unwrap_or_default().to_string(),
                link: non_empty(entry.link.as_deref())
                    .map(|l| resolve_link(base.as_ref(), l))
                    .unwrap_or_default(),
                source: title.clone(),
                title: non_empty(entry.title.as_deref()).unwrap_or_default().to_string(),
                summary: non_empty(entry.summary.as_deref()).unwrap_or_default().to_string(),
                info,
                evaluation: None,
            }
        })
        .collect();

    debug!(source = %title, count = items.len(), "Parsed feed document");
    Ok(items)
}
