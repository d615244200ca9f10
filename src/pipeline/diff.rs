//! Diff between the stored and the freshly extracted ads of a source.
//!
//! Ads are identified by URL. Merging carries the first-seen time of every
//! known ad over to its fresh counterpart, so the time an ad was first
//! observed survives the source re-publishing it on every fetch.

use std::collections::{HashMap, HashSet};

use serde::Serialize;

use crate::models::Ad;

/// URLs that changed between two snapshots, in snapshot order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AdDiff {
    /// In current but not in previous
    pub added: Vec<String>,
    /// In both, with different details
    pub updated: Vec<String>,
    /// In previous but not in current
    pub removed: Vec<String>,
}

impl AdDiff {
    /// Check if there are any changes.
    pub fn has_changes(&self) -> bool {
        !self.added.is_empty() || !self.updated.is_empty() || !self.removed.is_empty()
    }

    /// Get the total number of changes.
    pub fn change_count(&self) -> usize {
        self.added.len() + self.updated.len() + self.removed.len()
    }
}

/// Calculate the diff between previous and current snapshots.
pub fn calculate_diff(previous: &[Ad], current: &[Ad]) -> AdDiff {
    let prev_map: HashMap<&str, &Ad> = previous.iter().map(|ad| (ad.url(), ad)).collect();
    let curr_urls: HashSet<&str> = current.iter().map(Ad::url).collect();

    let mut diff = AdDiff::default();
    for ad in current {
        match prev_map.get(ad.url()) {
            None => diff.added.push(ad.url().to_string()),
            Some(prev) if !same_details(prev, ad) => diff.updated.push(ad.url().to_string()),
            Some(_) => {}
        }
    }
    diff.removed = previous
        .iter()
        .filter(|ad| !curr_urls.contains(ad.url()))
        .map(|ad| ad.url().to_string())
        .collect();
    diff
}

fn same_details(a: &Ad, b: &Ad) -> bool {
    a.title() == b.title()
        && a.location() == b.location()
        && a.rooms() == b.rooms()
        && a.rent() == b.rent()
}

/// Give every current ad already in `previous` its previous first-seen time.
///
/// New ads keep their own time, which is the time of the fetch.
pub fn merge_first_seen(previous: &[Ad], current: Vec<Ad>) -> Vec<Ad> {
    let first_seen: HashMap<&str, _> = previous
        .iter()
        .map(|ad| (ad.url(), ad.first_seen()))
        .collect();

    current
        .into_iter()
        .map(|ad| match first_seen.get(ad.url()) {
            Some(time) => ad.with_first_seen(*time),
            None => ad,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Duration, TimeZone, Utc};

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2023, 2, 3, 20, 0, 0).unwrap()
    }

    fn make_ad(id: &str, title: &str, time: DateTime<Utc>) -> Ad {
        Ad::new(format!("https://example.com/{id}"), title, "Mitte", 2.0, 800.0, time).unwrap()
    }

    #[test]
    fn test_no_changes() {
        let prev = vec![make_ad("001", "Title 1", t0()), make_ad("002", "Title 2", t0())];
        let curr = prev.clone();

        let diff = calculate_diff(&prev, &curr);
        assert!(!diff.has_changes());
        assert_eq!(diff.change_count(), 0);
    }

    #[test]
    fn test_mixed_changes() {
        let prev = vec![make_ad("001", "Title 1", t0()), make_ad("002", "Title 2", t0())];
        let curr = vec![
            make_ad("003", "Title 3", t0()),
            make_ad("001", "New Title", t0()),
        ];

        let diff = calculate_diff(&prev, &curr);
        assert_eq!(diff.added, ["https://example.com/003"]);
        assert_eq!(diff.updated, ["https://example.com/001"]);
        assert_eq!(diff.removed, ["https://example.com/002"]);
        assert_eq!(diff.change_count(), 3);
    }

    #[test]
    fn test_first_seen_is_not_a_change() {
        let prev = vec![make_ad("001", "Title 1", t0())];
        let curr = vec![make_ad("001", "Title 1", t0() + Duration::hours(1))];
        assert!(!calculate_diff(&prev, &curr).has_changes());
    }

    #[test]
    fn test_merge_keeps_first_seen() {
        let later = t0() + Duration::hours(1);
        let prev = vec![make_ad("001", "Title 1", t0())];
        let curr = vec![make_ad("002", "Title 2", later), make_ad("001", "Renamed", later)];

        let merged = merge_first_seen(&prev, curr);
        assert_eq!(merged[0].first_seen(), later);
        assert_eq!(merged[1].first_seen(), t0());
        assert_eq!(merged[1].title(), "Renamed");
    }

    #[test]
    fn test_merge_with_empty_previous() {
        let curr = vec![make_ad("001", "Title 1", t0())];
        assert_eq!(merge_first_seen(&[], curr.clone()), curr);
    }
}
