use std::path::Path;

use anyhow::Result;
use rusqlite::Connection;

use crate::normalize::NormalizedRecord;
use crate::record::UserRating;

pub fn connect(path: &Path) -> Result<Connection> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    let conn = Connection::open(path)?;
    conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA foreign_keys=ON;")?;
    Ok(conn)
}

pub fn init_schema(conn: &Connection) -> Result<()> {
    // TODO: add a unique key on mydramalisturl once entity-level uniqueness
    // semantics are decided; until then re-running a crawl inserts duplicate
    // rows for already-seen titles.
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS drama (
            id              INTEGER PRIMARY KEY,
            name            TEXT NOT NULL,
            synopsis        TEXT NOT NULL,
            duration        INTEGER,
            nb_episodes     INTEGER NOT NULL,
            country         TEXT NOT NULL,
            rating          REAL,
            ranking         INTEGER NOT NULL,
            popularity_rank INTEGER NOT NULL,
            nb_watchers     INTEGER NOT NULL,
            nb_ratings      INTEGER NOT NULL,
            nb_reviews      INTEGER NOT NULL,
            streamed_on     TEXT NOT NULL,
            genres          TEXT NOT NULL,
            tags            TEXT NOT NULL,
            mydramalisturl  TEXT NOT NULL,
            screenwriter    TEXT NOT NULL,
            director        TEXT NOT NULL,
            mainroles       TEXT NOT NULL,
            supportingroles TEXT NOT NULL,
            guestroles      TEXT NOT NULL,
            created_at      TEXT NOT NULL DEFAULT (datetime('now'))
        );
        CREATE INDEX IF NOT EXISTS idx_drama_url ON drama(mydramalisturl);

        CREATE TABLE IF NOT EXISTS user_rating (
            id         INTEGER PRIMARY KEY,
            user       TEXT NOT NULL,
            title      TEXT NOT NULL,
            score      INTEGER NOT NULL,
            created_at TEXT NOT NULL DEFAULT (datetime('now'))
        );
        CREATE INDEX IF NOT EXISTS idx_user_rating_user ON user_rating(user);
        ",
    )?;
    Ok(())
}

// ── Sink ──

/// Result of one store call. A failed insert is reported, counted, and must
/// not take down the rest of the run.
#[derive(Debug)]
pub enum StoreOutcome {
    Committed,
    Failed(String),
}

/// Insert one normalized record and commit it as its own unit of work, so a
/// cancelled run never leaves a transaction spanning more than one title.
pub fn store(conn: &Connection, r: &NormalizedRecord) -> StoreOutcome {
    match try_store(conn, r) {
        Ok(()) => StoreOutcome::Committed,
        Err(e) => StoreOutcome::Failed(e.to_string()),
    }
}

fn try_store(conn: &Connection, r: &NormalizedRecord) -> Result<()> {
    let tx = conn.unchecked_transaction()?;
    tx.execute(
        "INSERT INTO drama
         (name, synopsis, duration, nb_episodes, country, rating, ranking,
          popularity_rank, nb_watchers, nb_ratings, nb_reviews, streamed_on,
          genres, tags, mydramalisturl, screenwriter, director, mainroles,
          supportingroles, guestroles)
         VALUES (?1,?2,?3,?4,?5,?6,?7,?8,?9,?10,?11,?12,?13,?14,?15,?16,?17,?18,?19,?20)",
        rusqlite::params![
            r.name, r.synopsis, r.duration, r.nb_episodes, r.country, r.rating,
            r.ranking, r.popularity_rank, r.nb_watchers, r.nb_ratings, r.nb_reviews,
            r.streamed_on, r.genres, r.tags, r.mydramalisturl, r.screenwriter,
            r.director, r.mainroles, r.supportingroles, r.guestroles,
        ],
    )?;
    tx.commit()?;
    Ok(())
}

// ── User lists ──

pub fn insert_user_ratings(conn: &Connection, ratings: &[UserRating]) -> Result<usize> {
    let tx = conn.unchecked_transaction()?;
    let mut count = 0;
    {
        let mut stmt =
            tx.prepare("INSERT INTO user_rating (user, title, score) VALUES (?1, ?2, ?3)")?;
        for r in ratings {
            count += stmt.execute(rusqlite::params![r.user, r.title, r.score])?;
        }
    }
    tx.commit()?;
    Ok(count)
}

// ── Stats ──

pub struct StoreStats {
    pub dramas: usize,
    pub user_ratings: usize,
}

pub fn get_stats(conn: &Connection) -> Result<StoreStats> {
    let dramas: usize = conn.query_row("SELECT COUNT(*) FROM drama", [], |r| r.get(0))?;
    let user_ratings: usize =
        conn.query_row("SELECT COUNT(*) FROM user_rating", [], |r| r.get(0))?;
    Ok(StoreStats {
        dramas,
        user_ratings,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalize::NormalizedRecord;

    fn memory_conn() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        init_schema(&conn).unwrap();
        conn
    }

    fn normalized() -> NormalizedRecord {
        NormalizedRecord {
            name: "Goblin".into(),
            synopsis: "A cursed immortal.".into(),
            duration: Some(70),
            nb_episodes: 16,
            country: "South Korea".into(),
            rating: Some(9.1),
            ranking: 12,
            popularity_rank: 3,
            nb_watchers: 45_678,
            nb_ratings: 1_234,
            nb_reviews: 55,
            streamed_on: r#"["Viki"]"#.into(),
            genres: r#"["Thriller","Romance"]"#.into(),
            tags: "[]".into(),
            mydramalisturl: "https://mydramalist.com/12345-goblin".into(),
            screenwriter: r#"["Kim Eun-sook"]"#.into(),
            director: r#"["Lee Eung-bok"]"#.into(),
            mainroles: r#"["Actor A","Actor B"]"#.into(),
            supportingroles: "[]".into(),
            guestroles: "[]".into(),
        }
    }

    #[test]
    fn store_commits_one_row_per_call() {
        let conn = memory_conn();
        assert!(matches!(store(&conn, &normalized()), StoreOutcome::Committed));

        let (genres, duration): (String, Option<i64>) = conn
            .query_row("SELECT genres, duration FROM drama", [], |r| {
                Ok((r.get(0)?, r.get(1)?))
            })
            .unwrap();
        assert_eq!(genres, r#"["Thriller","Romance"]"#);
        assert_eq!(duration, Some(70));
    }

    #[test]
    fn repeated_stores_duplicate_rows() {
        // No dedup key yet; this pins the known behavior down.
        let conn = memory_conn();
        store(&conn, &normalized());
        store(&conn, &normalized());
        assert_eq!(get_stats(&conn).unwrap().dramas, 2);
    }

    #[test]
    fn store_failure_is_reported_not_raised() {
        let conn = memory_conn();
        conn.execute_batch("DROP TABLE drama;").unwrap();
        match store(&conn, &normalized()) {
            StoreOutcome::Failed(reason) => assert!(!reason.is_empty()),
            StoreOutcome::Committed => panic!("insert into a dropped table committed"),
        }
    }

    #[test]
    fn user_ratings_insert_in_bulk() {
        let conn = memory_conn();
        let ratings = vec![
            UserRating {
                user: "viewer1".into(),
                title: "Goblin".into(),
                score: 9,
            },
            UserRating {
                user: "viewer1".into(),
                title: "Signal".into(),
                score: 8,
            },
        ];
        assert_eq!(insert_user_ratings(&conn, &ratings).unwrap(), 2);
        assert_eq!(get_stats(&conn).unwrap().user_ratings, 2);
    }
}
