use std::sync::LazyLock;

use chrono::{DateTime, Duration, NaiveDateTime, Utc};
use quick_xml::events::Event;
use quick_xml::name::{Namespace, ResolveResult};
use quick_xml::NsReader;
use regex::Regex;

use super::models::{article_id, Article, Source};
use crate::Result;

const SUMMARY_MAX_CHARS: usize = 300;

/// Published timestamp candidates, in priority order
const PUBLISHED_TAGS: &[&str] = &["pubDate", "published", "updated"];
/// Description candidates, in priority order
const DESCRIPTION_TAGS: &[&str] = &["description", "summary", "content"];

static TAG_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]+>").unwrap());

/// Which entry element style produced a raw entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EntryStyle {
    /// RSS `<item>`
    RssItem,
    /// Atom-namespaced `<entry>`
    AtomEntry,
    /// `<entry>` without a bound namespace
    PlainEntry,
}

/// How a field candidate matches a child element's namespace
#[derive(Debug, Clone, Copy)]
enum NsRule {
    /// Element must carry no namespace (plain RSS tag)
    Unqualified,
    /// Element must be in the Atom namespace
    Atom,
}

#[derive(Debug, Clone)]
struct RawElement {
    tag: String,
    atom_ns: bool,
    text: String,
    href: Option<String>,
}

/// One unprocessed `<item>`/`<entry>`: its direct child elements, kept in
/// document order so field resolution can walk explicit candidate lists.
#[derive(Debug, Clone)]
pub struct RawEntry {
    style: EntryStyle,
    children: Vec<RawElement>,
}

impl RawEntry {
    fn find(&self, tag: &str, ns: NsRule) -> Option<&RawElement> {
        self.children.iter().find(|el| {
            el.tag == tag
                && match ns {
                    NsRule::Unqualified => !el.atom_ns,
                    NsRule::Atom => el.atom_ns,
                }
        })
    }

    /// First non-empty text among the given tags, trying the unqualified
    /// tag before its Atom-namespaced counterpart.
    fn text(&self, tags: &[&str]) -> Option<String> {
        for tag in tags {
            for ns in [NsRule::Unqualified, NsRule::Atom] {
                if let Some(el) = self.find(tag, ns) {
                    let text = el.text.trim();
                    if !text.is_empty() {
                        return Some(text.to_string());
                    }
                }
            }
        }
        None
    }

    fn href(&self, tag: &str) -> Option<String> {
        for ns in [NsRule::Unqualified, NsRule::Atom] {
            if let Some(el) = self.find(tag, ns) {
                if let Some(href) = &el.href {
                    if !href.is_empty() {
                        return Some(href.clone());
                    }
                }
            }
        }
        None
    }

    pub fn title(&self) -> Option<String> {
        self.text(&["title"])
    }

    /// Link element text, else an Atom `link` element's `href` attribute
    pub fn link(&self) -> Option<String> {
        self.text(&["link"]).or_else(|| self.href("link"))
    }

    pub fn published_raw(&self) -> Option<String> {
        self.text(PUBLISHED_TAGS)
    }

    pub fn description(&self) -> Option<String> {
        self.text(DESCRIPTION_TAGS)
    }
}

/// Collect entry elements from an RSS/Atom document: RSS `<item>` first,
/// else Atom-namespaced `<entry>`, else unqualified `<entry>`. The first
/// non-empty style wins; styles are never merged.
pub fn collect_raw_entries(body: &str) -> Result<Vec<RawEntry>> {
    let all = collect_all_entries(body)?;

    for style in [EntryStyle::RssItem, EntryStyle::AtomEntry, EntryStyle::PlainEntry] {
        let group: Vec<RawEntry> = all.iter().filter(|e| e.style == style).cloned().collect();
        if !group.is_empty() {
            return Ok(group);
        }
    }

    Ok(Vec::new())
}

fn collect_all_entries(body: &str) -> Result<Vec<RawEntry>> {
    let mut reader = NsReader::from_str(body);
    reader.config_mut().trim_text(true);

    let mut entries = Vec::new();
    let mut current: Option<RawEntry> = None;
    // Depth inside the entry element; its direct children live at depth 1
    let mut depth = 0usize;

    loop {
        let (resolve, event) = reader
            .read_resolved_event()
            .map_err(|e| crate::Error::FeedParse(e.to_string()))?;
        let atom_ns = matches!(
            resolve,
            ResolveResult::Bound(Namespace(b"http://www.w3.org/2005/Atom"))
        );

        match event {
            Event::Start(e) => {
                let local = e.local_name().as_ref().to_vec();

                if let Some(entry) = current.as_mut() {
                    depth += 1;
                    if depth == 1 {
                        entry.children.push(RawElement {
                            tag: String::from_utf8_lossy(&local).into_owned(),
                            atom_ns,
                            text: String::new(),
                            href: attr_value(&e, b"href"),
                        });
                    }
                } else if let Some(style) = entry_style(&local, atom_ns) {
                    current = Some(RawEntry {
                        style,
                        children: Vec::new(),
                    });
                    depth = 0;
                }
            }
            Event::Empty(e) => {
                if let Some(entry) = current.as_mut() {
                    if depth == 0 {
                        entry.children.push(RawElement {
                            tag: String::from_utf8_lossy(e.local_name().as_ref()).into_owned(),
                            atom_ns,
                            text: String::new(),
                            href: attr_value(&e, b"href"),
                        });
                    }
                }
            }
            Event::Text(e) => {
                if let Some(entry) = current.as_mut() {
                    if depth >= 1 {
                        let text = e
                            .unescape()
                            .map(|c| c.into_owned())
                            .unwrap_or_else(|_| String::from_utf8_lossy(e.as_ref()).into_owned());
                        if let Some(el) = entry.children.last_mut() {
                            el.text.push_str(&text);
                        }
                    }
                }
            }
            Event::CData(e) => {
                if let Some(entry) = current.as_mut() {
                    if depth >= 1 {
                        if let Some(el) = entry.children.last_mut() {
                            el.text
                                .push_str(&String::from_utf8_lossy(e.into_inner().as_ref()));
                        }
                    }
                }
            }
            Event::End(_) => {
                if current.is_some() {
                    if depth == 0 {
                        if let Some(entry) = current.take() {
                            entries.push(entry);
                        }
                    } else {
                        depth -= 1;
                    }
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(entries)
}

fn entry_style(local: &[u8], atom_ns: bool) -> Option<EntryStyle> {
    match local {
        b"item" => Some(EntryStyle::RssItem),
        b"entry" if atom_ns => Some(EntryStyle::AtomEntry),
        b"entry" => Some(EntryStyle::PlainEntry),
        _ => None,
    }
}

fn attr_value(e: &quick_xml::events::BytesStart<'_>, name: &[u8]) -> Option<String> {
    e.attributes()
        .flatten()
        .find(|attr| attr.key.local_name().as_ref() == name)
        .map(|attr| String::from_utf8_lossy(&attr.value).into_owned())
}

/// Resolve a feed timestamp string: RFC 2822 first, then RFC 3339 (a
/// trailing `Z` is a valid UTC offset), then naive ISO assumed UTC.
pub fn parse_feed_date(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc2822(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, fmt) {
            return Some(naive.and_utc());
        }
    }

    None
}

/// Strip HTML tags, trim, and truncate to the summary limit with an
/// ellipsis marker when trimmed.
fn clean_summary(raw: &str) -> String {
    let stripped = TAG_RE.replace_all(raw, "");
    let trimmed = stripped.trim();

    let mut chars = trimmed.chars();
    let head: String = chars.by_ref().take(SUMMARY_MAX_CHARS).collect();
    if chars.next().is_some() {
        format!("{}…", head)
    } else {
        head
    }
}

/// Parse a feed body into normalized articles for one source.
///
/// Accepts RSS/Atom XML or a Reddit JSON listing (dispatched on the first
/// non-whitespace byte). Entries older than `now - window` are dropped.
/// Parse failures degrade to an empty result plus a log line; one bad feed
/// must not abort the batch.
pub fn parse_feed(body: &str, source: &Source, now: DateTime<Utc>, window: Duration) -> Vec<Article> {
    if body.trim_start().starts_with('{') {
        return parse_listing(body, source, now, window);
    }

    let entries = match collect_raw_entries(body) {
        Ok(entries) => entries,
        Err(e) => {
            tracing::warn!("XML parse error for source '{}': {}", source.key, e);
            return Vec::new();
        }
    };

    let cutoff = now - window;
    let mut articles = Vec::new();

    for entry in entries {
        let published = entry
            .published_raw()
            .and_then(|raw| parse_feed_date(&raw))
            .unwrap_or(now);

        if published < cutoff {
            continue;
        }

        let link = entry.link().unwrap_or_else(|| "#".to_string());

        articles.push(Article {
            id: article_id(&link),
            title: entry.title().unwrap_or_else(|| "Untitled".to_string()),
            summary: clean_summary(&entry.description().unwrap_or_default()),
            url: link,
            source: source.key.clone(),
            source_label: source.label.clone(),
            published_at: published,
            author: source.label.clone(),
            score: None,
            thumbnail: None,
            saved: false,
        });
    }

    articles
}

/// Parse a Reddit `new.json` listing into normalized articles
fn parse_listing(body: &str, source: &Source, now: DateTime<Utc>, window: Duration) -> Vec<Article> {
    let value: serde_json::Value = match serde_json::from_str(body) {
        Ok(value) => value,
        Err(e) => {
            tracing::warn!("JSON parse error for source '{}': {}", source.key, e);
            return Vec::new();
        }
    };

    let cutoff = now - window;
    let mut articles = Vec::new();

    let children = value["data"]["children"].as_array().cloned().unwrap_or_default();
    for child in children {
        let data = &child["data"];

        let published = data["created_utc"]
            .as_f64()
            .and_then(|secs| DateTime::from_timestamp(secs as i64, 0))
            .unwrap_or(now);

        if published < cutoff {
            continue;
        }

        let link = data["permalink"]
            .as_str()
            .map(|p| format!("https://www.reddit.com{}", p))
            .or_else(|| data["url"].as_str().map(str::to_string))
            .unwrap_or_else(|| "#".to_string());

        let title = data["title"]
            .as_str()
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .unwrap_or("Untitled")
            .to_string();

        articles.push(Article {
            id: article_id(&link),
            title,
            summary: clean_summary(data["selftext"].as_str().unwrap_or_default()),
            url: link,
            source: source.key.clone(),
            source_label: source.label.clone(),
            published_at: published,
            author: source.label.clone(),
            score: None,
            thumbnail: None,
            saved: false,
        });
    }

    articles
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feed::SourceKind;

    fn test_source() -> Source {
        Source {
            key: "test".to_string(),
            label: "Test Feed".to_string(),
            kind: SourceKind::Rss,
            urls: vec!["https://example.com/feed".to_string()],
        }
    }

    fn window() -> Duration {
        Duration::hours(48)
    }

    fn rss_item(title: &str, link: &str, pub_date: &str, description: &str) -> String {
        format!(
            "<item><title>{}</title><link>{}</link><pubDate>{}</pubDate>\
             <description>{}</description></item>",
            title, link, pub_date, description
        )
    }

    fn rss_doc(items: &str) -> String {
        format!(
            "<?xml version=\"1.0\"?><rss version=\"2.0\"><channel>\
             <title>Feed</title>{}</channel></rss>",
            items
        )
    }

    #[test]
    fn test_parse_rss_three_items() {
        let now = Utc::now();
        let items: String = (1..=3)
            .map(|i| {
                rss_item(
                    &format!("Post {}", i),
                    &format!("https://example.com/post/{}", i),
                    &(now - Duration::minutes(i * 10)).to_rfc2822(),
                    "Some text",
                )
            })
            .collect();

        let articles = parse_feed(&rss_doc(&items), &test_source(), now, window());

        assert_eq!(articles.len(), 3);
        let mut ids: Vec<&str> = articles.iter().map(|a| a.id.as_str()).collect();
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), 3);
        for article in &articles {
            assert_eq!(article.author, "Test Feed");
            assert_eq!(article.source, "test");
            assert!(article.score.is_none());
            assert!(!article.saved);
        }
    }

    #[test]
    fn test_window_filter_boundaries() {
        let now = Utc::now();
        let recent = now - Duration::hours(47) - Duration::minutes(59);
        let stale = now - Duration::hours(48) - Duration::seconds(1);

        let items = rss_item("Recent", "https://example.com/a", &recent.to_rfc2822(), "")
            + &rss_item("Stale", "https://example.com/b", &stale.to_rfc2822(), "");

        let articles = parse_feed(&rss_doc(&items), &test_source(), now, window());

        assert_eq!(articles.len(), 1);
        assert_eq!(articles[0].title, "Recent");
    }

    #[test]
    fn test_missing_title_and_link_defaults() {
        let now = Utc::now();
        let items = format!(
            "<item><pubDate>{}</pubDate><description>no title, no link</description></item>",
            now.to_rfc2822()
        );

        let articles = parse_feed(&rss_doc(&items), &test_source(), now, window());

        assert_eq!(articles.len(), 1);
        assert_eq!(articles[0].title, "Untitled");
        assert_eq!(articles[0].url, "#");
    }

    #[test]
    fn test_atom_namespaced_entries() {
        let now = Utc::now();
        let doc = format!(
            "<?xml version=\"1.0\"?>\
             <feed xmlns=\"http://www.w3.org/2005/Atom\">\
             <title>Atom Feed</title>\
             <entry>\
               <title>Atom Post</title>\
               <link href=\"https://example.com/atom/1\"/>\
               <published>{}</published>\
               <summary>An atom summary</summary>\
             </entry>\
             </feed>",
            now.to_rfc3339()
        );

        let articles = parse_feed(&doc, &test_source(), now, window());

        assert_eq!(articles.len(), 1);
        assert_eq!(articles[0].title, "Atom Post");
        // Link resolved from the href attribute
        assert_eq!(articles[0].url, "https://example.com/atom/1");
        assert_eq!(articles[0].summary, "An atom summary");
    }

    #[test]
    fn test_unqualified_entry_fallback() {
        let now = Utc::now();
        let doc = format!(
            "<?xml version=\"1.0\"?><feed><entry>\
             <title>Plain Entry</title>\
             <link>https://example.com/plain/1</link>\
             <updated>{}</updated>\
             </entry></feed>",
            now.to_rfc3339()
        );

        let articles = parse_feed(&doc, &test_source(), now, window());

        assert_eq!(articles.len(), 1);
        assert_eq!(articles[0].title, "Plain Entry");
        assert_eq!(articles[0].url, "https://example.com/plain/1");
    }

    #[test]
    fn test_items_win_over_entries() {
        let now = Utc::now();
        let doc = format!(
            "<?xml version=\"1.0\"?><root>\
             <item><title>From Item</title><link>https://example.com/i</link>\
             <pubDate>{}</pubDate></item>\
             <entry><title>From Entry</title><link>https://example.com/e</link>\
             <updated>{}</updated></entry>\
             </root>",
            now.to_rfc2822(),
            now.to_rfc3339()
        );

        let articles = parse_feed(&doc, &test_source(), now, window());

        assert_eq!(articles.len(), 1);
        assert_eq!(articles[0].title, "From Item");
    }

    #[test]
    fn test_malformed_xml_returns_empty() {
        let now = Utc::now();
        let articles = parse_feed("<rss><channel><item>", &test_source(), now, window());
        // Truncated document yields whatever closed cleanly, never a panic
        assert!(articles.is_empty());

        let articles = parse_feed("<rss></channel></rss>", &test_source(), now, window());
        assert!(articles.is_empty());
    }

    #[test]
    fn test_html_stripping() {
        assert_eq!(clean_summary("<p>Hello <b>world</b></p>"), "Hello world");
        assert_eq!(clean_summary("  plain text  "), "plain text");
    }

    #[test]
    fn test_summary_truncation() {
        let long = "a".repeat(500);
        let cleaned = clean_summary(&long);
        assert_eq!(cleaned.chars().count(), 301);
        assert!(cleaned.ends_with('…'));

        let short = "b".repeat(50);
        assert_eq!(clean_summary(&short), short);
    }

    #[test]
    fn test_summary_stripped_inside_entry() {
        let now = Utc::now();
        let items = format!(
            "<item><title>HTML</title><link>https://example.com/h</link>\
             <pubDate>{}</pubDate>\
             <description><![CDATA[<p>Hello <b>world</b></p>]]></description></item>",
            now.to_rfc2822()
        );

        let articles = parse_feed(&rss_doc(&items), &test_source(), now, window());

        assert_eq!(articles.len(), 1);
        assert_eq!(articles[0].summary, "Hello world");
    }

    #[test]
    fn test_parse_feed_date_formats() {
        let rfc2822 = parse_feed_date("Tue, 01 Jul 2025 10:52:37 +0200").unwrap();
        assert_eq!(rfc2822.to_rfc3339(), "2025-07-01T08:52:37+00:00");

        let iso_z = parse_feed_date("2025-07-01T08:52:37Z").unwrap();
        assert_eq!(iso_z, rfc2822);

        // Naive timestamps are assumed UTC
        let naive = parse_feed_date("2025-07-01T08:52:37").unwrap();
        assert_eq!(naive, rfc2822);

        assert!(parse_feed_date("next tuesday").is_none());
        assert!(parse_feed_date("").is_none());
    }

    #[test]
    fn test_unparseable_date_falls_back_to_now() {
        let now = Utc::now();
        let items = rss_item("No Date", "https://example.com/nd", "not a date", "");

        let articles = parse_feed(&rss_doc(&items), &test_source(), now, window());

        // Retained, not dropped, with "now" as the timestamp
        assert_eq!(articles.len(), 1);
        assert_eq!(articles[0].published_at, now);
    }

    #[test]
    fn test_published_tag_priority() {
        let now = Utc::now();
        let earlier = now - Duration::hours(1);
        let doc = format!(
            "<?xml version=\"1.0\"?><root><item>\
             <title>Priority</title><link>https://example.com/p</link>\
             <pubDate>{}</pubDate><updated>{}</updated>\
             </item></root>",
            earlier.to_rfc2822(),
            now.to_rfc3339()
        );

        let articles = parse_feed(&doc, &test_source(), now, window());

        assert_eq!(articles.len(), 1);
        let diff = (articles[0].published_at - earlier).num_seconds().abs();
        assert!(diff <= 1, "pubDate should win over updated");
    }

    #[test]
    fn test_reddit_listing() {
        let now = Utc::now();
        let recent = (now - Duration::hours(1)).timestamp();
        let stale = (now - Duration::hours(72)).timestamp();
        let body = format!(
            r#"{{"data":{{"children":[
                {{"data":{{"title":"Fresh post","permalink":"/r/artificial/comments/abc/fresh/","created_utc":{},"selftext":"<p>body</p>"}}}},
                {{"data":{{"title":"Old post","permalink":"/r/artificial/comments/old/","created_utc":{}}}}}
            ]}}}}"#,
            recent, stale
        );

        let articles = parse_feed(&body, &test_source(), now, window());

        assert_eq!(articles.len(), 1);
        assert_eq!(articles[0].title, "Fresh post");
        assert_eq!(
            articles[0].url,
            "https://www.reddit.com/r/artificial/comments/abc/fresh/"
        );
        assert_eq!(articles[0].summary, "body");
        assert!(articles[0].score.is_none());
    }
}
