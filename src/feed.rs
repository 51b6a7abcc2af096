//! Feed parsing: RSS text in, downloadable items out.
//!
//! Every `<item>` carrying an `<enclosure url="...">` becomes one [`Item`].
//! Titles are made filesystem-safe and de-duplicated so that no two items
//! resolve to the same `<title>.<ext>` on disk.

use std::collections::HashSet;

use regex::Regex;
use rss::Channel;
use thiserror::Error;
use tracing::debug;
use url::Url;

use crate::domain::Item;
use crate::utils::sanitize_filename;

const DEFAULT_EXTENSION: &str = "mp3";

#[derive(Error, Debug)]
pub enum FeedError {
    #[error("malformed feed: {0}")]
    Malformed(#[from] rss::Error),

    #[error("invalid pattern: {0}")]
    Pattern(#[from] regex::Error),
}

/// Extract the downloadable items of a feed, in document order.
///
/// A well-formed feed without enclosures yields an empty list.
pub fn parse_items(feed_text: &str) -> Result<Vec<Item>, FeedError> {
    let channel = Channel::read_from(feed_text.as_bytes())?;
    let extension_re = Regex::new(r"\.([A-Za-z0-9]{1,5})$")?;

    let mut items = Vec::new();
    let mut seen = HashSet::new();
    let mut taken = HashSet::new();

    for (index, entry) in channel.items().iter().enumerate() {
        let Some(enclosure) = entry.enclosure() else {
            debug!(index, "skipping feed entry without enclosure");
            continue;
        };
        let source_url = enclosure.url().trim();
        if source_url.is_empty() {
            continue;
        }

        let file_extension = extension_from_url(&extension_re, source_url)
            .or_else(|| extension_from_mime(enclosure.mime_type()).map(str::to_string))
            .unwrap_or_else(|| DEFAULT_EXTENSION.to_string())
            .to_ascii_lowercase();
        let title = entry
            .title()
            .map(sanitize_filename)
            .filter(|t| !t.is_empty())
            .or_else(|| file_stem(source_url))
            .unwrap_or_else(|| format!("episode-{}", index + 1));

        let candidate = Item::new(title, file_extension, source_url);
        if !seen.insert(candidate.clone()) {
            debug!(title = %candidate.title, "dropping duplicate feed entry");
            continue;
        }

        let mut title = candidate.title.clone();
        let mut suffix = 2;
        while taken.contains(&(title.clone(), candidate.file_extension.clone())) {
            title = format!("{} ({})", candidate.title, suffix);
            suffix += 1;
        }
        taken.insert((title.clone(), candidate.file_extension.clone()));

        items.push(Item { title, ..candidate });
    }

    Ok(items)
}

fn last_segment(source_url: &str) -> Option<String> {
    let url = Url::parse(source_url).ok()?;
    url.path_segments()?
        .filter(|s| !s.is_empty())
        .last()
        .map(str::to_string)
}

fn extension_from_url(re: &Regex, source_url: &str) -> Option<String> {
    let segment = last_segment(source_url)?;
    re.captures(&segment).map(|caps| caps[1].to_string())
}

fn extension_from_mime(mime: &str) -> Option<&'static str> {
    let ext = match mime.trim().to_ascii_lowercase().as_str() {
        "audio/mpeg" | "audio/mp3" => "mp3",
        "audio/mp4" | "audio/x-m4a" | "audio/m4a" => "m4a",
        "audio/ogg" => "ogg",
        "audio/aac" => "aac",
        "audio/wav" | "audio/x-wav" => "wav",
        "audio/flac" => "flac",
        "video/mp4" => "mp4",
        _ => return None,
    };
    Some(ext)
}

fn file_stem(source_url: &str) -> Option<String> {
    let segment = last_segment(source_url)?;
    let stem = match segment.rsplit_once('.') {
        Some((stem, _)) => stem,
        None => segment.as_str(),
    };
    let stem = sanitize_filename(stem);
    (!stem.is_empty()).then_some(stem)
}
