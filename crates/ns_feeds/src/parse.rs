//! Normalizes RSS 2.0 and Atom documents into [`Article`] records.

use std::collections::BTreeMap;
use ns_core::{Article, Error, Result};
use serde_json::json;

/// Parses a feed document, trying RSS first and then Atom. Entries are
/// returned in document order.
pub fn parse_feed(source: &str, bytes: &[u8]) -> Result<Vec<Article>> {
    let rss_error = match rss::Channel::read_from(bytes) {
        Ok(channel) => return Ok(from_rss(source, &channel)),
        Err(e) => e,
    };

    match atom_syndication::Feed::read_from(bytes) {
        Ok(feed) => Ok(from_atom(source, &feed)),
        Err(atom_error) => Err(Error::Parse {
            feed: source.to_string(),
            message: format!("not RSS ({}) nor Atom ({})", rss_error, atom_error),
        }),
    }
}

fn from_rss(source: &str, channel: &rss::Channel) -> Vec<Article> {
    channel
        .items()
        .iter()
        .map(|item| {
            let media = item.extensions().get("media");
            let media_attrs = |name: &str| {
                media
                    .and_then(|m| m.get(name))
                    .and_then(|v| stringify_attrs(v.iter().map(|e| e.attrs())))
            };
            Article::builder(source)
                .title(item.title().map(str::to_string))
                .link(item.link().map(str::to_string))
                .summary(item.description().or_else(|| item.content()).map(str::to_string))
                .published(item.pub_date().map(str::to_string))
                .id(item.guid().map(|g| g.value().to_string()))
                .media_content(media_attrs("content"))
                .media_thumbnail(media_attrs("thumbnail"))
                .authors(rss_authors(item))
                .build()
        })
        .collect()
}

fn from_atom(source: &str, feed: &atom_syndication::Feed) -> Vec<Article> {
    feed.entries()
        .iter()
        .map(|entry| {
            let media = entry.extensions().get("media");
            let media_attrs = |name: &str| {
                media
                    .and_then(|m| m.get(name))
                    .and_then(|v| stringify_attrs(v.iter().map(|e| e.attrs())))
            };
            let link = entry
                .links()
                .iter()
                .find(|l| l.rel() == "alternate")
                .or_else(|| entry.links().first())
                .map(|l| l.href().to_string());
            let summary = entry
                .summary()
                .map(|s| s.as_str().to_string())
                .or_else(|| entry.content().and_then(|c| c.value()).map(str::to_string));
            let authors = if entry.authors().is_empty() {
                None
            } else {
                let people: Vec<_> = entry
                    .authors()
                    .iter()
                    .map(|p| match p.email() {
                        Some(email) => json!({ "name": p.name(), "email": email }),
                        None => json!({ "name": p.name() }),
                    })
                    .collect();
                Some(serde_json::Value::Array(people).to_string())
            };

            Article::builder(source)
                .title(Some(entry.title().as_str().to_string()))
                .link(link)
                .summary(summary)
                .published(entry.published().map(|d| d.to_rfc3339()))
                .id(Some(entry.id().to_string()))
                .media_content(media_attrs("content"))
                .media_thumbnail(media_attrs("thumbnail"))
                .authors(authors)
                .build()
        })
        .collect()
}

/// Author list from `dc:creator` elements, falling back to `<author>`.
fn rss_authors(item: &rss::Item) -> Option<String> {
    let mut names: Vec<&str> = item
        .dublin_core_ext()
        .map(|dc| dc.creators().iter().map(String::as_str).collect())
        .unwrap_or_default();
    if names.is_empty() {
        names.extend(item.author());
    }
    let names: Vec<_> = names
        .into_iter()
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .map(|n| json!({ "name": n }))
        .collect();
    if names.is_empty() {
        return None;
    }
    Some(serde_json::Value::Array(names).to_string())
}

/// Renders every element's attribute map as a JSON array, e.g.
/// `[{"url":"https://...","medium":"image"}]`.
fn stringify_attrs<'a>(
    attrs: impl Iterator<Item = &'a BTreeMap<String, String>>,
) -> Option<String> {
    let maps: Vec<_> = attrs.collect();
    if maps.is_empty() {
        return None;
    }
    serde_json::to_string(&maps).ok()
}
