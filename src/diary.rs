use std::collections::HashMap;

use chrono::{Duration, NaiveDate};
use hourglass_rs::SafeTimeProvider;
use tracing::debug;
use uuid::Uuid;

use crate::decimal::Money;
use crate::errors::{LedgerError, Result};
use crate::model::DiaryEntry;
use crate::store::MemoryStore;
use crate::types::{DiaryEntryId, UserId};

/// parameters for one journal entry
#[derive(Debug, Clone)]
pub struct NewDiaryEntry {
    pub title: String,
    pub content: String,
    pub entry_date: NaiveDate,
    pub related_amount: Option<Money>,
    pub financial_goal: Option<String>,
    pub tags: Option<String>,
}

/// journal summary: entry counts per goal and the current daily streak
#[derive(Debug, Clone, PartialEq)]
pub struct DiaryStats {
    pub total_entries: usize,
    pub goal_counts: HashMap<String, usize>,
    pub last_entry_date: Option<NaiveDate>,
    pub current_streak: u32,
}

/// daily financial journal, one entry per calendar day
///
/// The streak counts consecutive entry days ending at the most recent entry;
/// it survives until a full day is missed, so an entry yesterday but not yet
/// today still counts.
pub struct DiaryJournal;

impl DiaryJournal {
    pub fn add_entry(
        store: &mut MemoryStore,
        user_id: UserId,
        req: NewDiaryEntry,
        time: &SafeTimeProvider,
    ) -> Result<DiaryEntry> {
        if store.diary_date_taken(user_id, req.entry_date) {
            return Err(LedgerError::DuplicateEntryDate {
                date: req.entry_date,
            });
        }

        let entry = DiaryEntry {
            id: Uuid::new_v4(),
            user_id,
            title: req.title,
            content: req.content,
            entry_date: req.entry_date,
            related_amount: req.related_amount,
            financial_goal: req.financial_goal,
            tags: req.tags,
            created_at: time.now(),
        };
        debug!(entry = %entry.id, date = %entry.entry_date, "diary entry added");
        Ok(store.insert_diary_entry(entry))
    }

    pub fn get(store: &MemoryStore, user_id: UserId, entry_id: DiaryEntryId) -> Result<DiaryEntry> {
        Self::owned_entry(store, entry_id, user_id).cloned()
    }

    pub fn entry_for_date(
        store: &MemoryStore,
        user_id: UserId,
        date: NaiveDate,
    ) -> Option<DiaryEntry> {
        store.diary_entry_by_date(user_id, date).cloned()
    }

    pub fn list(store: &MemoryStore, user_id: UserId) -> Vec<DiaryEntry> {
        store
            .diary_entries_for_user(user_id)
            .into_iter()
            .cloned()
            .collect()
    }

    pub fn delete(store: &mut MemoryStore, user_id: UserId, entry_id: DiaryEntryId) -> Result<()> {
        Self::owned_entry(store, entry_id, user_id)?;
        store.remove_diary_entry(entry_id);
        Ok(())
    }

    pub fn stats(store: &MemoryStore, user_id: UserId, time: &SafeTimeProvider) -> DiaryStats {
        let entries = store.diary_entries_for_user(user_id);

        let mut goal_counts: HashMap<String, usize> = HashMap::new();
        for entry in &entries {
            if let Some(goal) = entry.financial_goal.as_deref() {
                if !goal.is_empty() {
                    *goal_counts.entry(goal.to_string()).or_insert(0) += 1;
                }
            }
        }

        DiaryStats {
            total_entries: entries.len(),
            goal_counts,
            last_entry_date: entries.first().map(|e| e.entry_date),
            current_streak: Self::current_streak(store, user_id, time),
        }
    }

    /// consecutive entry days ending at the most recent entry; zero once the
    /// most recent entry is older than yesterday
    pub fn current_streak(store: &MemoryStore, user_id: UserId, time: &SafeTimeProvider) -> u32 {
        let entries = store.diary_entries_for_user(user_id);
        let Some(latest) = entries.first() else {
            return 0;
        };

        let today = time.now().date_naive();
        if latest.entry_date < today - Duration::days(1) {
            return 0;
        }

        let mut streak = 1;
        let mut current = latest.entry_date;
        for entry in entries.iter().skip(1) {
            if entry.entry_date == current - Duration::days(1) {
                streak += 1;
                current = entry.entry_date;
            } else {
                break;
            }
        }
        streak
    }

    fn owned_entry(
        store: &MemoryStore,
        entry_id: DiaryEntryId,
        user_id: UserId,
    ) -> Result<&DiaryEntry> {
        let entry = store.diary_entry(entry_id)?;
        if entry.user_id != user_id {
            return Err(LedgerError::Forbidden {
                resource: "diary entry",
                id: entry_id,
            });
        }
        Ok(entry)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use hourglass_rs::TimeSource;

    fn time_at(y: i32, m: u32, d: u32) -> SafeTimeProvider {
        SafeTimeProvider::new(TimeSource::Test(
            Utc.with_ymd_and_hms(y, m, d, 12, 0, 0).unwrap(),
        ))
    }

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn entry(date: NaiveDate, goal: Option<&str>) -> NewDiaryEntry {
        NewDiaryEntry {
            title: "daily check-in".to_string(),
            content: "kept to the budget".to_string(),
            entry_date: date,
            related_amount: None,
            financial_goal: goal.map(str::to_string),
            tags: None,
        }
    }

    fn add(store: &mut MemoryStore, user: UserId, date: NaiveDate) {
        DiaryJournal::add_entry(store, user, entry(date, None), &time_at(2024, 6, 15)).unwrap();
    }

    #[test]
    fn test_one_entry_per_day() {
        let mut store = MemoryStore::new();
        let user = Uuid::new_v4();
        add(&mut store, user, d(2024, 6, 10));

        let err = DiaryJournal::add_entry(
            &mut store,
            user,
            entry(d(2024, 6, 10), None),
            &time_at(2024, 6, 10),
        )
        .unwrap_err();
        assert_eq!(
            err,
            LedgerError::DuplicateEntryDate {
                date: d(2024, 6, 10),
            }
        );

        // another user may use the same date
        let other = Uuid::new_v4();
        add(&mut store, other, d(2024, 6, 10));
    }

    #[test]
    fn test_streak_counts_consecutive_days() {
        let mut store = MemoryStore::new();
        let user = Uuid::new_v4();
        // three consecutive days ending today, with an older gap before them
        for date in [d(2024, 6, 15), d(2024, 6, 14), d(2024, 6, 13), d(2024, 6, 10)] {
            add(&mut store, user, date);
        }

        let time = time_at(2024, 6, 15);
        assert_eq!(DiaryJournal::current_streak(&store, user, &time), 3);
    }

    #[test]
    fn test_streak_survives_until_a_day_is_missed() {
        let mut store = MemoryStore::new();
        let user = Uuid::new_v4();
        add(&mut store, user, d(2024, 6, 14));

        // yesterday's entry keeps a streak of one alive today
        assert_eq!(DiaryJournal::current_streak(&store, user, &time_at(2024, 6, 15)), 1);
        // a full missed day resets it
        assert_eq!(DiaryJournal::current_streak(&store, user, &time_at(2024, 6, 16)), 0);
    }

    #[test]
    fn test_streak_is_zero_without_entries() {
        let store = MemoryStore::new();
        let user = Uuid::new_v4();
        assert_eq!(DiaryJournal::current_streak(&store, user, &time_at(2024, 6, 15)), 0);
    }

    #[test]
    fn test_stats_counts_entries_by_goal() {
        let mut store = MemoryStore::new();
        let user = Uuid::new_v4();
        let time = time_at(2024, 6, 15);
        for (date, goal) in [
            (d(2024, 6, 15), Some("emergency fund")),
            (d(2024, 6, 14), Some("emergency fund")),
            (d(2024, 6, 13), Some("vacation")),
            (d(2024, 6, 12), None),
        ] {
            DiaryJournal::add_entry(&mut store, user, entry(date, goal), &time).unwrap();
        }

        let stats = DiaryJournal::stats(&store, user, &time);
        assert_eq!(stats.total_entries, 4);
        assert_eq!(stats.goal_counts.get("emergency fund"), Some(&2));
        assert_eq!(stats.goal_counts.get("vacation"), Some(&1));
        assert_eq!(stats.last_entry_date, Some(d(2024, 6, 15)));
        assert_eq!(stats.current_streak, 4);
    }

    #[test]
    fn test_lookup_by_date_and_owner_checked_delete() {
        let mut store = MemoryStore::new();
        let user = Uuid::new_v4();
        let stranger = Uuid::new_v4();
        add(&mut store, user, d(2024, 6, 10));

        let found = DiaryJournal::entry_for_date(&store, user, d(2024, 6, 10)).unwrap();
        assert!(DiaryJournal::entry_for_date(&store, user, d(2024, 6, 11)).is_none());

        let err = DiaryJournal::delete(&mut store, stranger, found.id).unwrap_err();
        assert!(matches!(err, LedgerError::Forbidden { .. }));

        DiaryJournal::delete(&mut store, user, found.id).unwrap();
        assert!(DiaryJournal::list(&store, user).is_empty());
    }
}
