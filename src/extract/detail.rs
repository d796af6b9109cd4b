use crate::page::RawPage;
use crate::record::PartialRecord;

use super::{collapse_ws, duration_to_minutes, parse_count, parse_rank, ExtractError, USER_COUNT_RE};

const DETAILS_ITEM: &str = "li.list-item.p-a-0";
const GENRES_ITEM: &str = "li.list-item.p-a-0.show-genres";
const TAGS_ITEM: &str = "li.list-item.p-a-0.show-tags";
const STAT_LINE: &str = "div.hfs";
const SYNOPSIS: &str = ".show-synopsis span";
const RATING: &str = ".deep-orange";
const WATCH_BOX: &str = "div.box";
const PLATFORM_LINK: &str = "a.text-primary b";
const TITLE_SUFFIX: &str = " - MyDramaList";

/// Extract every main-page field of a classified detail page. Any hard
/// failure drops the whole title; optional fields take their absent value
/// and extraction continues.
pub fn extract_detail(page: &RawPage, url: &str) -> Result<PartialRecord, ExtractError> {
    Ok(PartialRecord {
        name: extract_name(page)?,
        synopsis: extract_synopsis(page),
        duration_minutes: extract_duration(page)?,
        episode_count: required_number(page, "Episodes", "episode_count")?,
        country: page
            .own_text_of_item(DETAILS_ITEM, "b", "Country")
            .ok_or(ExtractError::MissingField("country"))?,
        rating: extract_rating(page),
        rank: required_rank(page, "Ranked", "rank")?,
        popularity_rank: required_rank(page, "Popularity", "popularity_rank")?,
        watcher_count: page
            .own_text_of_item(DETAILS_ITEM, "b", "Watchers")
            .and_then(|raw| parse_count(&raw))
            .unwrap_or(0),
        rating_count: extract_rating_count(page),
        review_count: extract_review_count(page)?,
        platforms: page.texts_within_marked(WATCH_BOX, "Where to Watch", PLATFORM_LINK),
        genres: page.texts_within_marked(GENRES_ITEM, "Genres", "a"),
        tags: page.texts_within_marked(TAGS_ITEM, "Tags", "span a"),
        source_url: url.to_string(),
    })
}

fn extract_name(page: &RawPage) -> Result<String, ExtractError> {
    let title = page
        .first_text("title")
        .ok_or(ExtractError::MissingField("name"))?;
    Ok(title
        .strip_suffix(TITLE_SUFFIX)
        .unwrap_or(&title)
        .trim()
        .to_string())
}

fn extract_synopsis(page: &RawPage) -> String {
    collapse_ws(&page.texts(SYNOPSIS).join(" "))
}

/// "N/A" (or any other non-numeric marker) is a legitimate unrated title,
/// never a parse failure.
fn extract_rating(page: &RawPage) -> Option<f32> {
    let raw = page.first_text(RATING)?;
    raw.trim()
        .parse::<f32>()
        .ok()
        .filter(|r| (0.0..=10.0).contains(r))
}

fn extract_duration(page: &RawPage) -> Result<Option<u32>, ExtractError> {
    match page.own_text_of_item(DETAILS_ITEM, "b.inline.duration", "") {
        Some(raw) => Ok(Some(duration_to_minutes(&raw)?)),
        None => Ok(None),
    }
}

fn required_number(page: &RawPage, label: &str, field: &'static str) -> Result<u32, ExtractError> {
    let raw = page
        .own_text_of_item(DETAILS_ITEM, "b", label)
        .ok_or(ExtractError::MissingField(field))?;
    match raw.parse() {
        Ok(n) => Ok(n),
        Err(_) => Err(ExtractError::InvalidValue { field, value: raw }),
    }
}

fn required_rank(page: &RawPage, label: &str, field: &'static str) -> Result<u32, ExtractError> {
    let raw = page
        .own_text_of_item(DETAILS_ITEM, "b", label)
        .ok_or(ExtractError::MissingField(field))?;
    match parse_rank(&raw) {
        Some(n) => Ok(n),
        None => Err(ExtractError::InvalidValue { field, value: raw }),
    }
}

/// The stat block mixes several counters; only lines carrying the "user"
/// marker are rating-count candidates. No candidate means an unrated title,
/// counted as 0.
fn extract_rating_count(page: &RawPage) -> u64 {
    page.own_texts(STAT_LINE)
        .iter()
        .find(|line| line.contains("user"))
        .and_then(|line| USER_COUNT_RE.captures(line))
        .and_then(|c| parse_count(&c[1]))
        .unwrap_or(0)
}

/// The review counter sits behind its own "Reviews:" anchor; a page without
/// that anchor is malformed for our purposes and drops the title.
fn extract_review_count(page: &RawPage) -> Result<u64, ExtractError> {
    let text = page
        .texts_within_marked(STAT_LINE, "Reviews:", "a")
        .into_iter()
        .next()
        .ok_or(ExtractError::MissingField("review_count"))?;
    match USER_COUNT_RE.captures(&text).and_then(|c| parse_count(&c[1])) {
        Some(n) => Ok(n),
        None => Err(ExtractError::InvalidValue {
            field: "review_count",
            value: text,
        }),
    }
}
