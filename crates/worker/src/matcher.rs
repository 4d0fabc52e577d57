//! Bounded-parallel track matching.
//!
//! [`Matcher::match_tracks`] fans one lookup task out per source track,
//! bounded by a semaphore, and funnels every result through a single
//! aggregator (the calling task) which owns the counters and invokes
//! the progress callback. That single consumer is what makes callback
//! observations totally ordered and the counters monotonic without any
//! locking.
//!
//! Per track the ladder is: ISRC lookup, then text search with an
//! exclusion filter and substring scoring. Every input track produces
//! exactly one [`TrackMatch`]; transport failures and cancellation
//! become failed matches, never dropped entries.

use std::future::Future;
use std::sync::Arc;

use tokio::sync::{mpsc, Semaphore};
use tokio_util::sync::CancellationToken;

use tracklift_catalog::TargetCatalog;
use tracklift_core::track::{MatchConfidence, Track, TrackMatch};

/// A candidate whose name contains any of these terms is never matched,
/// regardless of how well its title or artist lines up.
const EXCLUDE_TERMS: [&str; 6] = ["cover", "live", "karaoke", "remix", "tutorial", "reaction"];

pub struct Matcher {
    target: Arc<dyn TargetCatalog>,
}

impl Matcher {
    pub fn new(target: Arc<dyn TargetCatalog>) -> Self {
        Self { target }
    }

    /// Resolve every track against the target catalog.
    ///
    /// Returns one match per input track, in completion order. At most
    /// `concurrency` lookups are in flight at once. `on_progress` is
    /// awaited from the aggregator after each result, with `processed`
    /// increasing by exactly one per call.
    ///
    /// Cancellation is cooperative: tasks that observe a cancelled token
    /// before starting report a `"context cancelled"` failure; lookups
    /// already in flight run to completion and their result still counts.
    pub async fn match_tracks<F, Fut>(
        &self,
        cancel: &CancellationToken,
        tracks: &[Track],
        session_id: &str,
        concurrency: usize,
        mut on_progress: F,
    ) -> Vec<TrackMatch>
    where
        F: FnMut(i32, i32, i32) -> Fut,
        Fut: Future<Output = ()>,
    {
        if tracks.is_empty() {
            return Vec::new();
        }

        let semaphore = Arc::new(Semaphore::new(concurrency.max(1)));
        let (tx, mut rx) = mpsc::channel::<TrackMatch>(tracks.len());

        for track in tracks {
            let semaphore = Arc::clone(&semaphore);
            let target = Arc::clone(&self.target);
            let cancel = cancel.clone();
            let session_id = session_id.to_string();
            let track = track.clone();
            let tx = tx.clone();

            tokio::spawn(async move {
                let _permit = semaphore
                    .acquire_owned()
                    .await
                    .expect("match semaphore is never closed");

                let result = if cancel.is_cancelled() {
                    TrackMatch::failed(track, "context cancelled")
                } else {
                    match_track(target.as_ref(), track, &session_id).await
                };

                // The channel holds one slot per track, so this cannot
                // block; an error only means the receiver is gone.
                let _ = tx.send(result).await;
            });
        }
        drop(tx);

        let mut matches = Vec::with_capacity(tracks.len());
        let (mut processed, mut matched, mut failed) = (0i32, 0i32, 0i32);

        while let Some(result) = rx.recv().await {
            processed += 1;
            if result.is_matched() {
                matched += 1;
            } else {
                failed += 1;
            }
            matches.push(result);
            on_progress(processed, matched, failed).await;
        }

        matches
    }
}

async fn match_track(target: &dyn TargetCatalog, track: Track, session_id: &str) -> TrackMatch {
    if let Some(hit) = try_isrc(target, &track, session_id).await {
        return hit;
    }
    try_text_search(target, track, session_id).await
}

/// First rung: exact lookup by recording code. Lookup errors and misses
/// fall through to text search.
async fn try_isrc(
    target: &dyn TargetCatalog,
    track: &Track,
    session_id: &str,
) -> Option<TrackMatch> {
    let isrc = track.isrc.as_deref().filter(|s| !s.is_empty())?;

    match target.search_by_isrc(isrc, session_id).await {
        Ok(Some(hit)) => Some(TrackMatch::found(
            track.clone(),
            hit,
            MatchConfidence::High,
            "isrc",
        )),
        Ok(None) => None,
        Err(e) => {
            tracing::debug!(track = %track.name, error = %e, "ISRC lookup failed");
            None
        }
    }
}

/// Second rung: free-text search, exclusion filter, substring scoring on
/// the first surviving candidate.
async fn try_text_search(target: &dyn TargetCatalog, track: Track, session_id: &str) -> TrackMatch {
    let candidates = match target
        .search_by_text(&track.name, &track.artist, session_id)
        .await
    {
        Ok(candidates) => candidates,
        Err(e) => {
            tracing::debug!(track = %track.name, artist = %track.artist, error = %e, "text search failed");
            let message = e.to_string();
            return TrackMatch::failed(track, message);
        }
    };

    if candidates.is_empty() {
        return TrackMatch::failed(track, "no match found");
    }

    for candidate in candidates {
        if is_excluded(&candidate.name) {
            continue;
        }

        let artist_hit = has_artist_match(&track, &candidate);
        let title_hit = has_title_match(&track, &candidate);
        let (confidence, method) = match (artist_hit, title_hit) {
            (true, true) => (MatchConfidence::High, "exact_match"),
            (true, false) | (false, true) => (MatchConfidence::Medium, "partial_match"),
            (false, false) => (MatchConfidence::Low, "music_search"),
        };
        return TrackMatch::found(track, candidate, confidence, method);
    }

    TrackMatch::failed(track, "no match found")
}

fn is_excluded(name: &str) -> bool {
    let name = name.to_lowercase();
    EXCLUDE_TERMS.iter().any(|term| name.contains(term))
}

/// The source artist appears in the candidate's artist or name.
fn has_artist_match(source: &Track, candidate: &Track) -> bool {
    let artist = source.artist.to_lowercase();
    candidate.artist.to_lowercase().contains(artist.as_str())
        || candidate.name.to_lowercase().contains(artist.as_str())
}

/// The source title appears in the candidate's name.
fn has_title_match(source: &Track, candidate: &Track) -> bool {
    let title = source.name.to_lowercase();
    candidate.name.to_lowercase().contains(title.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracklift_core::platform::Platform;

    fn source(name: &str, artist: &str) -> Track {
        Track::new(name, artist, Platform::Spotify, "sp1").unwrap()
    }

    fn candidate(name: &str, artist: &str) -> Track {
        Track::new(name, artist, Platform::Youtube, "yt1").unwrap()
    }

    // -----------------------------------------------------------------------
    // Exclusion filter
    // -----------------------------------------------------------------------

    #[test]
    fn official_uploads_are_not_excluded() {
        assert!(!is_excluded("Bohemian Rhapsody Official Video"));
        assert!(!is_excluded("Queen - Bohemian Rhapsody"));
    }

    #[test]
    fn every_exclusion_term_rejects() {
        for name in [
            "Bohemian Rhapsody Cover",
            "Bohemian Rhapsody COVER by Someone",
            "Bohemian Rhapsody Live",
            "Bohemian Rhapsody Karaoke",
            "Bohemian Rhapsody Remix",
            "Bohemian Rhapsody Tutorial",
            "Bohemian Rhapsody Reaction",
        ] {
            assert!(is_excluded(name), "{name} should be excluded");
        }
    }

    // -----------------------------------------------------------------------
    // Substring scoring
    // -----------------------------------------------------------------------

    #[test]
    fn artist_match_in_channel_name() {
        let s = source("Song", "Queen");
        assert!(has_artist_match(&s, &candidate("Some Song", "Queen Official")));
    }

    #[test]
    fn artist_match_in_title() {
        let s = source("Song", "Queen");
        assert!(has_artist_match(&s, &candidate("Queen - Some Song", "Random Channel")));
    }

    #[test]
    fn no_artist_match() {
        let s = source("Song", "Queen");
        assert!(!has_artist_match(&s, &candidate("Some Song", "Random Channel")));
    }

    #[test]
    fn title_match_is_case_folded_substring() {
        let s = source("Bohemian Rhapsody", "Queen");
        assert!(has_title_match(&s, &candidate("queen - BOHEMIAN RHAPSODY (Official)", "Queen")));
        assert!(has_title_match(&s, &candidate("Bohemian Rhapsody", "Queen")));
        assert!(!has_title_match(&s, &candidate("Another Song", "Queen")));
    }
}
