use serde::Serialize;

/// Fields harvested from a title's detail page. Only ever constructed once
/// every required field extracted cleanly, so holding one implies the
/// main-page half of the record is complete.
#[derive(Debug, Clone)]
pub struct PartialRecord {
    pub name: String,
    pub synopsis: String,
    pub duration_minutes: Option<u32>,
    pub episode_count: u32,
    pub country: String,
    pub rating: Option<f32>,
    pub rank: u32,
    pub popularity_rank: u32,
    pub watcher_count: u64,
    pub rating_count: u64,
    pub review_count: u64,
    pub platforms: Vec<String>,
    pub genres: Vec<String>,
    pub tags: Vec<String>,
    pub source_url: String,
}

/// Fields harvested from the dependent cast page. All lists; empty is valid.
#[derive(Debug, Clone, Default)]
pub struct CastFields {
    pub screenwriter: Vec<String>,
    pub director: Vec<String>,
    pub main_cast: Vec<String>,
    pub support_cast: Vec<String>,
    pub guest_cast: Vec<String>,
}

/// One complete title. Promoted from a `PartialRecord` when the cast fields
/// merge in; immutable from then on.
#[derive(Debug, Clone, Serialize)]
pub struct Record {
    pub name: String,
    pub synopsis: String,
    pub duration_minutes: Option<u32>,
    pub episode_count: u32,
    pub country: String,
    pub rating: Option<f32>,
    pub rank: u32,
    pub popularity_rank: u32,
    pub watcher_count: u64,
    pub rating_count: u64,
    pub review_count: u64,
    pub platforms: Vec<String>,
    pub genres: Vec<String>,
    pub tags: Vec<String>,
    pub source_url: String,
    pub screenwriter: Vec<String>,
    pub director: Vec<String>,
    pub main_cast: Vec<String>,
    pub support_cast: Vec<String>,
    pub guest_cast: Vec<String>,
}

/// Links a title's detail-page extraction to its pending cast-page fetch.
///
/// Created when a classified detail page has been fully extracted, owned by
/// that title's request chain alone, and consumed exactly once when the cast
/// page resolves. A title whose cast page never resolves keeps its state
/// un-consumed and is simply dropped with it; there is no path from here to
/// the sink without `complete`.
#[derive(Debug)]
pub struct CorrelationState {
    partial: PartialRecord,
    cast_url: String,
}

impl CorrelationState {
    pub fn new(partial: PartialRecord) -> Self {
        let cast_url = format!("{}/cast", partial.source_url);
        Self { partial, cast_url }
    }

    pub fn cast_url(&self) -> &str {
        &self.cast_url
    }

    /// Merge the cast fields in and promote to a complete `Record`.
    pub fn complete(self, cast: CastFields) -> Record {
        let p = self.partial;
        Record {
            name: p.name,
            synopsis: p.synopsis,
            duration_minutes: p.duration_minutes,
            episode_count: p.episode_count,
            country: p.country,
            rating: p.rating,
            rank: p.rank,
            popularity_rank: p.popularity_rank,
            watcher_count: p.watcher_count,
            rating_count: p.rating_count,
            review_count: p.review_count,
            platforms: p.platforms,
            genres: p.genres,
            tags: p.tags,
            source_url: p.source_url,
            screenwriter: cast.screenwriter,
            director: cast.director,
            main_cast: cast.main_cast,
            support_cast: cast.support_cast,
            guest_cast: cast.guest_cast,
        }
    }
}

/// One row of a user's completed-drama list.
#[derive(Debug, Clone, Serialize)]
pub struct UserRating {
    pub user: String,
    pub title: String,
    pub score: u32,
}
