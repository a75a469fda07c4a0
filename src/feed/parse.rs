//! RSS 2.0 / Atom decoding into [`Item`]s.

use std::borrow::Cow;

use once_cell::sync::Lazy;
use quick_xml::de::from_str;
use quick_xml::events::Event;
use quick_xml::Reader;
use regex::{Captures, Regex};
use serde::Deserialize;

use super::{Item, SourceKind};
use crate::error::FeedError;

#[derive(Debug, Deserialize)]
struct Rss {
    channel: Channel,
}

#[derive(Debug, Deserialize)]
struct Channel {
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
    guid: Option<TextNode>,
    #[serde(rename = "pubDate", default)]
    pub_date: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AtomFeed {
    #[serde(rename = "entry", default)]
    entries: Vec<AtomEntry>,
}

#[derive(Debug, Deserialize)]
struct AtomEntry {
    #[serde(default)]
    title: Option<TextNode>,
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    published: Option<String>,
    #[serde(default)]
    updated: Option<String>,
    #[serde(rename = "link", default)]
    links: Vec<AtomLink>,
}

#[derive(Debug, Deserialize)]
struct AtomLink {
    #[serde(rename = "@href")]
    href: String,
    #[serde(rename = "@rel", default)]
    rel: Option<String>,
}

/// Element whose attributes (`isPermaLink`, `type`) we don't care about.
#[derive(Debug, Deserialize)]
struct TextNode {
    #[serde(rename = "$text", default)]
    value: String,
}

/// Decode a feed document. The root element decides between RSS and Atom.
pub fn parse_feed(xml: &str, kind: SourceKind) -> Result<Vec<Item>, FeedError> {
    let xml = xmlize_html_entities(xml);
    match root_element(&xml).as_deref() {
        Some("rss") => parse_rss(&xml, kind),
        Some("feed") => parse_atom(&xml, kind),
        Some(other) => Err(FeedError::Parse(format!(
            "unexpected root element <{other}>"
        ))),
        None => Err(FeedError::Parse("document has no root element".into())),
    }
}

fn parse_rss(xml: &str, kind: SourceKind) -> Result<Vec<Item>, FeedError> {
    let rss: Rss = from_str(xml).map_err(|e| FeedError::Parse(e.to_string()))?;

    let mut out = Vec::with_capacity(rss.channel.items.len());
    for it in rss.channel.items {
        let identifier = it
            .guid
            .map(|g| g.value.trim().to_string())
            .filter(|g| !g.is_empty())
            .or_else(|| it.link.map(|l| l.trim().to_string()))
            .unwrap_or_default();
        if identifier.is_empty() {
            tracing::debug!("rss item without guid/link skipped");
            continue;
        }
        out.push(Item {
            identifier,
            title: clean_title(it.title.as_deref().unwrap_or_default()),
            published: it.pub_date.unwrap_or_default().trim().to_string(),
            kind,
        });
    }
    Ok(out)
}

fn parse_atom(xml: &str, kind: SourceKind) -> Result<Vec<Item>, FeedError> {
    let feed: AtomFeed = from_str(xml).map_err(|e| FeedError::Parse(e.to_string()))?;

    let mut out = Vec::with_capacity(feed.entries.len());
    for entry in feed.entries {
        // Prefer rel="alternate" (or no rel, which defaults to alternate).
        let link = entry
            .links
            .iter()
            .find(|l| matches!(l.rel.as_deref(), None | Some("alternate")))
            .or_else(|| entry.links.first())
            .map(|l| l.href.trim().to_string());
        let Some(identifier) = link.or(entry.id).filter(|s| !s.is_empty()) else {
            tracing::debug!("atom entry without link/id skipped");
            continue;
        };
        out.push(Item {
            identifier,
            title: clean_title(entry.title.map(|t| t.value).as_deref().unwrap_or_default()),
            published: entry
                .published
                .or(entry.updated)
                .unwrap_or_default()
                .trim()
                .to_string(),
            kind,
        });
    }
    Ok(out)
}

fn root_element(xml: &str) -> Option<String> {
    let mut reader = Reader::from_str(xml);
    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) | Ok(Event::Empty(e)) => {
                return Some(String::from_utf8_lossy(e.local_name().as_ref()).into_owned());
            }
            Ok(Event::Eof) | Err(_) => return None,
            Ok(_) => continue,
        }
    }
}

fn clean_title(raw: &str) -> String {
    html_escape::decode_html_entities(raw).trim().to_string()
}

// XML only knows five named entities; feeds routinely leak HTML ones.
// Every other named reference becomes a numeric one, unknown names are
// escaped so they survive as literal text.
static NAMED_ENTITY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"&([A-Za-z][A-Za-z0-9]*);").expect("entity regex"));

const XML_ENTITIES: [&str; 5] = ["amp", "lt", "gt", "quot", "apos"];

fn xmlize_html_entities(s: &str) -> Cow<'_, str> {
    NAMED_ENTITY.replace_all(s, |caps: &Captures| {
        let whole = &caps[0];
        if XML_ENTITIES.contains(&&caps[1]) {
            return whole.to_string();
        }
        let decoded = html_escape::decode_html_entities(whole);
        if decoded == whole {
            return format!("&amp;{}", &whole[1..]);
        }
        decoded
            .chars()
            .map(|c| match c {
                '\u{A0}' => " ".to_string(),
                c => format!("&#x{:X};", u32::from(c)),
            })
            .collect()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const RSS: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0" xmlns:dc="http://purl.org/dc/elements/1.1/">
  <channel>
    <title>Bug Bounty on Medium</title>
    <link>https://medium.com/tag/bug-bounty</link>
    <item>
      <title><![CDATA[IDOR &amp; friends]]></title>
      <link>https://medium.com/@x/idor-123?source=rss</link>
      <guid isPermaLink="false">https://medium.com/p/123</guid>
      <dc:creator>x</dc:creator>
      <pubDate>Mon, 19 Oct 2026 08:15:00 GMT</pubDate>
    </item>
    <item>
      <title>No guid here</title>
      <link>https://blog.test/post</link>
      <pubDate>Mon, 19 Oct 2026 09:00:00 +0000</pubDate>
    </item>
  </channel>
</rss>"#;

    #[test]
    fn rss_prefers_guid_and_falls_back_to_link() {
        let items = parse_feed(RSS, SourceKind::Article).unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].identifier, "https://medium.com/p/123");
        assert_eq!(items[0].title, "IDOR & friends");
        assert_eq!(items[0].published, "Mon, 19 Oct 2026 08:15:00 GMT");
        assert_eq!(items[1].identifier, "https://blog.test/post");
    }

    #[test]
    fn html_entities_do_not_break_xml() {
        let xml = RSS.replace("No guid here", "No&nbsp;guid&nbsp;here");
        let items = parse_feed(&xml, SourceKind::Article).unwrap();
        assert_eq!(items[1].title, "No guid here");
    }

    #[test]
    fn any_html_named_entity_is_accepted() {
        let xml = RSS
            .replace("No guid here", "Caf&eacute; XSS &copy; &trade; &laquo;ok&raquo;")
            .replace("IDOR &amp; friends", "IDOR &amp; &lt;friends&gt;");
        let items = parse_feed(&xml, SourceKind::Article).unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].title, "IDOR & <friends>");
        assert_eq!(items[1].title, "Caf\u{e9} XSS \u{a9} \u{2122} \u{ab}ok\u{bb}");
    }

    #[test]
    fn unknown_entity_survives_as_text() {
        let xml = RSS.replace("No guid here", "Rock &bogus; roll");
        let items = parse_feed(&xml, SourceKind::Article).unwrap();
        assert_eq!(items[1].title, "Rock &bogus; roll");
    }

    #[test]
    fn xml_entities_are_left_alone() {
        assert_eq!(
            xmlize_html_entities("a &amp; b &lt; c &eacute;"),
            "a &amp; b &lt; c &#xE9;"
        );
    }

    #[test]
    fn unknown_root_is_an_error() {
        let err = parse_feed("<html><body>nope</body></html>", SourceKind::Article).unwrap_err();
        assert!(matches!(err, FeedError::Parse(_)));
    }
}
