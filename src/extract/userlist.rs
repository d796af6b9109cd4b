use tracing::debug;

use crate::page::RawPage;
use crate::record::UserRating;

const LIST_ROW: &str = "tbody > tr";
const TITLE_CELL: &str = ".title.text-primary span";
const SCORE_CELL: &str = ".score";

/// Extract the (title, score) rows of a user's completed-drama list. Rows
/// missing a title or carrying an unparseable score are skipped.
pub fn extract_user_ratings(page: &RawPage, user: &str) -> Vec<UserRating> {
    page.paired_texts(LIST_ROW, TITLE_CELL, SCORE_CELL)
        .into_iter()
        .filter_map(|(title, score)| {
            let title = title?;
            // Scores render as "8.5"; keep the integer part like the site's
            // own list view does.
            let score = match score.as_deref().map(str::trim).and_then(|s| s.parse::<f32>().ok()) {
                Some(s) => s as u32,
                None => {
                    debug!(user, title = %title, "skipping row without a numeric score");
                    return None;
                }
            };
            Some(UserRating {
                user: user.to_string(),
                title,
                score,
            })
        })
        .collect()
}
