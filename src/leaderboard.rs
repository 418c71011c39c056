//! Ranked leaderboard snapshot with TTL caching, an in-memory fallback
//! dataset, and subscriber notification.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use rand::Rng;
use std::sync::Arc;
use tokio::sync::mpsc;
use uuid::Uuid;

use crate::config;
use crate::models::{LeaderboardEntry, RankContext};
use crate::source::{RankingSource, with_backoff};

struct CachedPage {
    fetched_at: Instant,
    entries: Vec<LeaderboardEntry>,
}

/// Best-effort ranked view of users by cumulative points.
///
/// With a `RankingSource` configured, reads go remote (with backoff) and
/// land in a `(category, limit)`-keyed cache; without one, or when the
/// remote fails, the in-memory fallback dataset serves instead. Every
/// accepted mutation or pushed change fans the current snapshot out to
/// subscribers.
pub struct LeaderboardCache {
    source: Option<Arc<dyn RankingSource>>,
    fallback: Vec<LeaderboardEntry>,
    cache: HashMap<(String, usize), CachedPage>,
    ttl: Duration,
    subscribers: Vec<mpsc::UnboundedSender<Vec<LeaderboardEntry>>>,
}

impl LeaderboardCache {
    pub fn new(source: Option<Arc<dyn RankingSource>>) -> Self {
        let mut cache = Self {
            source,
            fallback: demo_entries(),
            cache: HashMap::new(),
            ttl: config::LEADERBOARD_TTL,
            subscribers: Vec::new(),
        };
        cache.resort_fallback();
        cache
    }

    /// Replace the fallback dataset (tests, demo seeding).
    pub fn with_fallback(mut self, entries: Vec<LeaderboardEntry>) -> Self {
        self.fallback = entries;
        self.resort_fallback();
        self
    }

    /// Make sure the viewer appears in the fallback dataset so their rank
    /// resolves even with no backend.
    pub fn ensure_user(&mut self, user_id: Uuid, username: &str) {
        if !self.fallback.iter().any(|e| e.user_id == user_id) {
            self.fallback.push(LeaderboardEntry::new(user_id, username));
            self.resort_fallback();
        }
    }

    /// Top users, ranked. Served from cache while fresh; remote reads fall
    /// back to the in-memory dataset on any failure.
    pub async fn top_users(
        &mut self,
        limit: usize,
        category: Option<&str>,
    ) -> Vec<LeaderboardEntry> {
        let key = (category.unwrap_or("all").to_string(), limit);
        if let Some(page) = self.cache.get(&key) {
            if page.fetched_at.elapsed() < self.ttl {
                return page.entries.clone();
            }
        }

        let entries = match &self.source {
            Some(source) => {
                match with_backoff("leaderboard read", || source.top_users(limit, category)).await {
                    Ok(entries) => entries,
                    Err(e) => {
                        tracing::warn!("leaderboard read failed, using fallback: {}", e);
                        self.fallback_top(limit)
                    }
                }
            }
            None => self.fallback_top(limit),
        };

        self.cache.insert(
            key,
            CachedPage {
                fetched_at: Instant::now(),
                entries: entries.clone(),
            },
        );
        entries
    }

    /// A user's rank plus the neighbor window around it.
    pub async fn user_rank(&mut self, user_id: Uuid, category: Option<&str>) -> Option<RankContext> {
        if let Some(source) = &self.source {
            match with_backoff("rank read", || source.user_rank(user_id, category)).await {
                Ok(context) => return context,
                Err(e) => {
                    tracing::warn!("rank read failed, scanning fallback: {}", e);
                }
            }
        }
        self.fallback_rank(user_id)
    }

    /// Fold a finished quiz into the local dataset, re-rank, drop the
    /// cached pages, and notify. With a remote source the authoritative
    /// write already happened there; the next read refreshes either way.
    pub fn update_user_score(&mut self, user_id: Uuid, username: &str, points: i64) {
        match self.fallback.iter_mut().find(|e| e.user_id == user_id) {
            Some(entry) => entry.apply_result(points),
            None => {
                let mut entry = LeaderboardEntry::new(user_id, username);
                entry.apply_result(points);
                self.fallback.push(entry);
            }
        }
        self.resort_fallback();

        // Every cached page predates the mutation.
        self.cache.clear();
        self.notify();
    }

    /// A pushed change from the backend: the remote snapshot replaces the
    /// cached pages and subscribers hear about it.
    pub fn apply_remote_snapshot(&mut self, entries: Vec<LeaderboardEntry>) {
        self.cache.clear();
        self.cache.insert(
            ("all".to_string(), entries.len()),
            CachedPage {
                fetched_at: Instant::now(),
                entries: entries.clone(),
            },
        );
        for tx in &self.subscribers {
            let _ = tx.send(entries.clone());
        }
        self.subscribers.retain(|tx| !tx.is_closed());
    }

    /// Observer registration; dropped receivers fall off on the next
    /// notification.
    pub fn subscribe(&mut self) -> mpsc::UnboundedReceiver<Vec<LeaderboardEntry>> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.subscribers.push(tx);
        rx
    }

    /// Development aid: synthesize a small random delta against the
    /// fallback dataset, as if another player finished a quiz.
    pub fn demo_tick<R: Rng>(&mut self, rng: &mut R) {
        if self.fallback.is_empty() {
            return;
        }
        let idx = rng.gen_range(0..self.fallback.len());
        let delta = rng.gen_range(5..=60);
        let (user_id, username) = {
            let entry = &self.fallback[idx];
            (entry.user_id, entry.username.clone())
        };
        self.update_user_score(user_id, &username, delta);
    }

    pub fn fallback_entries(&self) -> &[LeaderboardEntry] {
        &self.fallback
    }

    fn fallback_top(&self, limit: usize) -> Vec<LeaderboardEntry> {
        self.fallback.iter().take(limit).cloned().collect()
    }

    fn fallback_rank(&self, user_id: Uuid) -> Option<RankContext> {
        let pos = self.fallback.iter().position(|e| e.user_id == user_id)?;
        let entry = self.fallback[pos].clone();
        let lo = pos.saturating_sub(config::RANK_WINDOW);
        let hi = (pos + config::RANK_WINDOW + 1).min(self.fallback.len());
        Some(RankContext {
            rank: entry.rank,
            entry,
            neighbors: self.fallback[lo..hi].to_vec(),
        })
    }

    /// Stable descending sort by points (ties keep prior relative order),
    /// then sequential 1-based ranks.
    fn resort_fallback(&mut self) {
        self.fallback.sort_by(|a, b| b.total_points.cmp(&a.total_points));
        for (i, entry) in self.fallback.iter_mut().enumerate() {
            entry.rank = i + 1;
        }
    }

    fn notify(&mut self) {
        let snapshot = self.fallback.clone();
        self.subscribers.retain(|tx| tx.send(snapshot.clone()).is_ok());
    }
}

/// Fixed demo dataset used when no backend is configured.
pub fn demo_entries() -> Vec<LeaderboardEntry> {
    let seed = [
        ("quizmaster", 1480, 21, 160),
        ("trivia_nora", 1120, 15, 142),
        ("brainstorm", 960, 12, 131),
        ("prof_echo", 700, 11, 98),
        ("lucky_guess", 430, 9, 77),
        ("rookie_rae", 180, 4, 61),
    ];
    seed.iter()
        .map(|(name, points, quizzes, best)| {
            let mut entry = LeaderboardEntry::new(Uuid::new_v4(), *name);
            entry.total_points = *points;
            entry.quizzes_completed = *quizzes;
            entry.average_score = *points as f64 / *quizzes as f64;
            entry.best_score = *best;
            entry
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(name: &str, points: i64) -> LeaderboardEntry {
        let mut e = LeaderboardEntry::new(Uuid::new_v4(), name);
        e.total_points = points;
        e
    }

    fn three_user_cache() -> (LeaderboardCache, Uuid, Uuid, Uuid) {
        let a = entry("user1", 100);
        let b = entry("user2", 100);
        let c = entry("user3", 50);
        let (ida, idb, idc) = (a.user_id, b.user_id, c.user_id);
        let cache = LeaderboardCache::new(None).with_fallback(vec![a, b, c]);
        (cache, ida, idb, idc)
    }

    #[test]
    fn ranks_are_sequential_and_descending() {
        let (cache, ..) = three_user_cache();
        let entries = cache.fallback_entries();
        assert_eq!(entries[0].rank, 1);
        assert_eq!(entries[1].rank, 2);
        assert_eq!(entries[2].rank, 3);
        assert!(entries.windows(2).all(|w| w[0].total_points >= w[1].total_points));
    }

    #[test]
    fn update_resorts_above_old_ties() {
        // 100/100/50; +60 to user3 puts them at 110, strictly above both.
        let (mut cache, _ida, _idb, idc) = three_user_cache();
        cache.update_user_score(idc, "user3", 60);

        let entries = cache.fallback_entries();
        assert_eq!(entries[0].username, "user3");
        assert_eq!(entries[0].total_points, 110);
        assert_eq!(entries[0].rank, 1);
        assert_eq!(entries[1].total_points, 100);
        assert_eq!(entries[2].total_points, 100);
    }

    #[test]
    fn ties_keep_prior_relative_order() {
        let (mut cache, ida, idb, idc) = three_user_cache();
        // No point change, just a recompute: order among the 100s holds.
        cache.update_user_score(idc, "user3", 0);
        let entries = cache.fallback_entries();
        assert_eq!(entries[0].user_id, ida);
        assert_eq!(entries[1].user_id, idb);
    }

    #[test]
    fn update_also_tracks_quiz_aggregates() {
        let (mut cache, ida, ..) = three_user_cache();
        cache.update_user_score(ida, "user1", 40);

        let user1 = cache
            .fallback_entries()
            .iter()
            .find(|e| e.user_id == ida)
            .unwrap();
        assert_eq!(user1.total_points, 140);
        assert_eq!(user1.quizzes_completed, 1);
        assert_eq!(user1.average_score, 140.0);
        assert_eq!(user1.best_score, 40);
    }

    #[test]
    fn subscribers_hear_about_mutations() {
        let (mut cache, ida, ..) = three_user_cache();
        let mut rx = cache.subscribe();

        cache.update_user_score(ida, "user1", 10);
        let snapshot = rx.try_recv().unwrap();
        assert_eq!(snapshot.len(), 3);

        drop(rx);
        // Dropped receivers are pruned on the next notification.
        cache.update_user_score(ida, "user1", 10);
        assert!(cache.subscribers.is_empty());
    }

    #[tokio::test]
    async fn fallback_serves_without_a_source() {
        let (mut cache, ..) = three_user_cache();
        let top = cache.top_users(2, None).await;
        assert_eq!(top.len(), 2);
        assert_eq!(top[0].rank, 1);
    }

    #[tokio::test]
    async fn top_users_hits_the_cache_while_fresh() {
        let (mut cache, ida, ..) = three_user_cache();
        let before = cache.top_users(3, None).await;

        // Mutate the dataset without invalidation (no source configured):
        // a fresh page keeps serving the earlier snapshot.
        cache.fallback.iter_mut().for_each(|e| {
            if e.user_id == ida {
                e.total_points += 500;
            }
        });
        let after = cache.top_users(3, None).await;
        assert_eq!(before[0].total_points, after[0].total_points);
    }

    #[tokio::test]
    async fn update_invalidates_served_pages() {
        let (mut cache, ida, ..) = three_user_cache();
        let before = cache.top_users(3, None).await;
        assert_eq!(before[0].total_points, 100);

        // An accepted mutation must show on the very next read, TTL or
        // not, so the screen agrees with the result the player just saw.
        cache.update_user_score(ida, "user1", 60);
        let after = cache.top_users(3, None).await;
        assert_eq!(after[0].username, "user1");
        assert_eq!(after[0].total_points, 160);
    }

    #[tokio::test]
    async fn rank_context_includes_the_neighbor_window() {
        let entries: Vec<_> = (0..7)
            .map(|i| entry(&format!("u{}", i), 700 - i as i64 * 100))
            .collect();
        let mid = entries[3].user_id;
        let mut cache = LeaderboardCache::new(None).with_fallback(entries);

        let context = cache.user_rank(mid, None).await.unwrap();
        assert_eq!(context.rank, 4);
        assert_eq!(context.neighbors.len(), 5);
        assert!(context.neighbors.iter().any(|e| e.user_id == mid));

        // A user at the top edge gets a clipped window.
        let top = cache.fallback_entries()[0].user_id;
        let context = cache.user_rank(top, None).await.unwrap();
        assert_eq!(context.rank, 1);
        assert_eq!(context.neighbors.len(), 3);
    }

    #[test]
    fn demo_tick_moves_someone() {
        let (mut cache, ..) = three_user_cache();
        let before: i64 = cache.fallback_entries().iter().map(|e| e.total_points).sum();
        let mut rng = rand::thread_rng();
        cache.demo_tick(&mut rng);
        let after: i64 = cache.fallback_entries().iter().map(|e| e.total_points).sum();
        assert!(after > before);
    }
}
