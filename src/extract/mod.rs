pub mod cast;
pub mod detail;
pub mod listing;
pub mod userlist;

use std::sync::LazyLock;

use regex::Regex;
use thiserror::Error;

/// Count followed by the "user(s)" marker, thousands separators allowed.
static USER_COUNT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d+(?:,\d+)*) user").unwrap());
static HOURS_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(\d+) hr\.").unwrap());
static MINUTES_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(\d+) min\.").unwrap());
static WS_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());

/// A single field failed extraction hard enough to drop the whole title.
/// Optional fields never produce this; they fall back to their documented
/// absent value instead.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExtractError {
    #[error("required field `{0}` not found")]
    MissingField(&'static str),
    #[error("field `{field}` could not be parsed from {value:?}")]
    InvalidValue { field: &'static str, value: String },
}

/// Convert `"<H> hr. <M> min."` or `"<M> min."` to total minutes. The hour
/// component defaults to 0; a missing minute component is a hard failure.
pub fn duration_to_minutes(raw: &str) -> Result<u32, ExtractError> {
    let hours = HOURS_RE
        .captures(raw)
        .and_then(|c| c[1].parse::<u32>().ok())
        .unwrap_or(0);
    let minutes = MINUTES_RE
        .captures(raw)
        .and_then(|c| c[1].parse::<u32>().ok())
        .ok_or_else(|| ExtractError::InvalidValue {
            field: "duration",
            value: raw.to_string(),
        })?;
    Ok(hours * 60 + minutes)
}

/// Integer with optional thousands separators: `"12,345"` → 12345.
fn parse_count(raw: &str) -> Option<u64> {
    raw.trim().replace(',', "").parse().ok()
}

/// Rank with optional leading marker: `"#12"` → 12.
fn parse_rank(raw: &str) -> Option<u32> {
    raw.trim().trim_start_matches('#').parse().ok()
}

/// Collapse every whitespace run (embedded line breaks included) to one
/// ASCII space and trim.
fn collapse_ws(raw: &str) -> String {
    WS_RE.replace_all(raw, " ").trim().to_string()
}

#[cfg(test)]
mod pipeline_tests {
    use crate::classify::{classify, Classification};
    use crate::db;
    use crate::extract::cast::extract_cast;
    use crate::extract::detail::extract_detail;
    use crate::normalize::normalize;
    use crate::page::RawPage;
    use crate::record::CorrelationState;

    const URL: &str = "https://mydramalist.com/12345-goblin";

    fn detail_page(entity_type: &str) -> String {
        format!(
            r#"<html><head><title>Kim's Goblin - MyDramaList</title></head><body>
<div class="show-synopsis"><span>A cursed immortal
 seeks his bride.</span></div>
<div class="hfs">Ratings: <b class="deep-orange">9.1</b>/10 from 12,345 users</div>
<div class="hfs">Reviews: <a href="/reviews">55 users</a></div>
<ul>
  <li class="list-item p-a-0"><b class="inline">Type:</b> {entity_type}</li>
  <li class="list-item p-a-0"><b class="inline">Episodes:</b> 16</li>
  <li class="list-item p-a-0"><b class="inline">Country:</b> South Korea</li>
  <li class="list-item p-a-0"><b class="inline duration">Duration:</b> 1 hr. 10 min.</li>
  <li class="list-item p-a-0"><b class="inline">Ranked:</b> #12</li>
  <li class="list-item p-a-0"><b class="inline">Popularity:</b> #3</li>
  <li class="list-item p-a-0"><b class="inline">Watchers:</b> 45,678</li>
  <li class="list-item p-a-0 show-genres"><b class="inline">Genres:</b>
    <a href="/g">Thriller</a>, <a href="/g">Romance</a></li>
</ul>
</body></html>"#
        )
    }

    const CAST_PAGE: &str = r#"<html><body>
<h3>Main Role</h3>
<ul>
  <li><a class="text-primary" href="/people/1"><b>Actor A</b></a></li>
  <li><a class="text-primary" href="/people/2"><b>Actor B</b></a></li>
</ul>
</body></html>"#;

    #[test]
    fn drama_assembles_across_both_pages_and_lands_in_the_store() {
        let conn = rusqlite::Connection::open_in_memory().unwrap();
        db::init_schema(&conn).unwrap();

        // Phase one: detail page.
        let page = RawPage::parse(&detail_page("Drama"));
        assert_eq!(classify(&page), Classification::InScope);
        let partial = extract_detail(&page, URL).unwrap();
        let state = CorrelationState::new(partial);
        assert_eq!(state.cast_url(), format!("{URL}/cast"));

        // Phase two: cast page resolves and is merged back.
        let cast_page = RawPage::parse(CAST_PAGE);
        let record = state.complete(extract_cast(&cast_page));

        assert_eq!(record.episode_count, 16);
        assert_eq!(record.duration_minutes, Some(70));
        assert_eq!(record.rating, Some(9.1));
        assert_eq!(record.genres, vec!["Thriller", "Romance"]);
        assert_eq!(record.main_cast, vec!["Actor A", "Actor B"]);

        // Normalize once, store once.
        let normalized = normalize(record);
        assert!(matches!(db::store(&conn, &normalized), db::StoreOutcome::Committed));

        let (name, genres): (String, String) = conn
            .query_row("SELECT name, genres FROM drama", [], |r| {
                Ok((r.get(0)?, r.get(1)?))
            })
            .unwrap();
        // The apostrophe is doubled exactly once, after list encoding.
        assert_eq!(name, "Kim''s Goblin");
        assert!(!name.contains("''''"));
        assert_eq!(genres, r#"["Thriller","Romance"]"#);
    }

    #[test]
    fn movie_page_never_reaches_extraction_or_the_store() {
        let conn = rusqlite::Connection::open_in_memory().unwrap();
        db::init_schema(&conn).unwrap();

        let page = RawPage::parse(&detail_page("Movie"));
        match classify(&page) {
            Classification::OutOfScope(reason) => assert_eq!(reason, "Movie"),
            Classification::InScope => panic!("movie classified in scope"),
        }

        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM drama", [], |r| r.get(0))
            .unwrap();
        assert_eq!(count, 0);
    }

    #[test]
    fn missing_required_field_drops_the_title_before_the_store() {
        let conn = rusqlite::Connection::open_in_memory().unwrap();
        db::init_schema(&conn).unwrap();

        let html = detail_page("Drama").replace(
            r#"<li class="list-item p-a-0"><b class="inline">Episodes:</b> 16</li>"#,
            "",
        );
        let page = RawPage::parse(&html);
        assert_eq!(classify(&page), Classification::InScope);
        assert!(extract_detail(&page, URL).is_err());

        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM drama", [], |r| r.get(0))
            .unwrap();
        assert_eq!(count, 0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duration_with_hours() {
        assert_eq!(duration_to_minutes("2 hr. 5 min."), Ok(125));
        assert_eq!(duration_to_minutes("1 hr. 10 min."), Ok(70));
    }

    #[test]
    fn duration_minutes_only() {
        assert_eq!(duration_to_minutes("45 min."), Ok(45));
    }

    #[test]
    fn duration_without_minutes_fails() {
        assert!(matches!(
            duration_to_minutes("2 hr."),
            Err(ExtractError::InvalidValue { field: "duration", .. })
        ));
    }

    #[test]
    fn counts_strip_thousands_separators() {
        assert_eq!(parse_count("12,345"), Some(12_345));
        assert_eq!(parse_count(" 7 "), Some(7));
        assert_eq!(parse_count("n/a"), None);
    }

    #[test]
    fn ranks_strip_leading_marker() {
        assert_eq!(parse_rank("#12"), Some(12));
        assert_eq!(parse_rank("3"), Some(3));
        assert_eq!(parse_rank("#"), None);
    }

    #[test]
    fn whitespace_runs_collapse_to_single_spaces() {
        assert_eq!(collapse_ws("a  b\n\t c "), "a b c");
    }
}
