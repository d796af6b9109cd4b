use crate::record::Record;

/// A record made storage-safe: list fields serialized to JSON text blobs,
/// then every text value (blobs included) with its single quotes doubled for
/// a SQL string-literal context. Field order matches the sink's column order
/// exactly.
///
/// Quote doubling is not idempotent, so there is deliberately no way to feed
/// a `NormalizedRecord` back through `normalize`; the conversion consumes the
/// `Record` and happens exactly once per title.
#[derive(Debug, Clone)]
pub struct NormalizedRecord {
    pub name: String,
    pub synopsis: String,
    pub duration: Option<i64>,
    pub nb_episodes: i64,
    pub country: String,
    pub rating: Option<f64>,
    pub ranking: i64,
    pub popularity_rank: i64,
    pub nb_watchers: i64,
    pub nb_ratings: i64,
    pub nb_reviews: i64,
    pub streamed_on: String,
    pub genres: String,
    pub tags: String,
    pub mydramalisturl: String,
    pub screenwriter: String,
    pub director: String,
    pub mainroles: String,
    pub supportingroles: String,
    pub guestroles: String,
}

pub fn normalize(record: Record) -> NormalizedRecord {
    NormalizedRecord {
        name: escape_quotes(&record.name),
        synopsis: escape_quotes(&record.synopsis),
        duration: record.duration_minutes.map(i64::from),
        nb_episodes: i64::from(record.episode_count),
        country: escape_quotes(&record.country),
        rating: record.rating.map(f64::from),
        ranking: i64::from(record.rank),
        popularity_rank: i64::from(record.popularity_rank),
        nb_watchers: record.watcher_count as i64,
        nb_ratings: record.rating_count as i64,
        nb_reviews: record.review_count as i64,
        streamed_on: encode_list(&record.platforms),
        genres: encode_list(&record.genres),
        tags: encode_list(&record.tags),
        mydramalisturl: escape_quotes(&record.source_url),
        screenwriter: encode_list(&record.screenwriter),
        director: encode_list(&record.director),
        mainroles: encode_list(&record.main_cast),
        supportingroles: encode_list(&record.support_cast),
        guestroles: encode_list(&record.guest_cast),
    }
}

/// JSON-encode a list to one text blob, then escape. The order matters: a
/// list item containing an apostrophe must end up doubled in the final blob,
/// once.
fn encode_list(items: &[String]) -> String {
    let blob = serde_json::to_string(items).unwrap_or_else(|_| "[]".to_string());
    escape_quotes(&blob)
}

fn escape_quotes(text: &str) -> String {
    text.replace('\'', "''")
}
