//! EventStore 契约测试
//!
//! 同一组场景分别跑在 MemoryStore 和临时 SQLite 上的 SeaOrmStore，
//! 保证两个后端的排序、过滤和统计结果一致。

mod common;

use std::collections::HashSet;
use std::sync::Arc;

use tempfile::TempDir;

use beacon::storage::{
    EventStore, GroupField, LOCALHOST, MemoryStore, UNKNOWN, normalize_filter,
};
use beacon::utils::UNKNOWN_IP;

use common::{located, sqlite_store, view};

/// (名称, 存储, 需要保持存活的临时目录)
async fn backends(cap: Option<usize>) -> Vec<(&'static str, Arc<dyn EventStore>, Option<TempDir>)> {
    let memory: Arc<dyn EventStore> = Arc::new(MemoryStore::new(cap.unwrap_or(1000)));
    let (sqlite, td) = sqlite_store(cap).await;
    vec![("memory", memory, None), ("sqlite", sqlite, Some(td))]
}

async fn ids_of(store: &Arc<dyn EventStore>, filter: Option<&str>) -> Vec<i64> {
    store
        .query(filter, 100)
        .await
        .unwrap()
        .iter()
        .map(|v| v.id)
        .collect()
}

// =============================================================================
// 写入与容量
// =============================================================================

#[cfg(test)]
mod insert_tests {
    use super::*;

    #[tokio::test]
    async fn test_retention_cap_keeps_most_recent() {
        for (name, store, _td) in backends(Some(5)).await {
            for id in 1..=7 {
                store.insert(view(id, &format!("/p{}", id))).await.unwrap();
            }
            assert_eq!(ids_of(&store, None).await, vec![7, 6, 5, 4, 3], "{}", name);
            assert_eq!(store.stats().await.unwrap().total_views, 5, "{}", name);
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_inserts_never_exceed_cap() {
        let store = Arc::new(MemoryStore::new(5));

        let handles: Vec<_> = (1..=200)
            .map(|id| {
                let store = Arc::clone(&store);
                tokio::spawn(async move { store.insert(view(id, "/")).await.unwrap() })
            })
            .collect();
        for handle in handles {
            handle.await.unwrap();
            assert!(store.len() <= 5);
        }

        assert_eq!(store.len(), 5);
        let ids: Vec<i64> = store
            .query(None, 100)
            .await
            .unwrap()
            .iter()
            .map(|v| v.id)
            .collect();
        assert_eq!(ids, vec![200, 199, 198, 197, 196]);
    }

    #[tokio::test]
    async fn test_sqlite_unbounded_without_cap() {
        let (store, _td) = sqlite_store(None).await;
        for id in 1..=1200 {
            store.insert(view(id, "/")).await.unwrap();
        }
        assert_eq!(store.stats().await.unwrap().total_views, 1200);
    }

    #[tokio::test]
    async fn test_query_respects_limit_and_order() {
        for (name, store, _td) in backends(None).await {
            for id in 1..=10 {
                store.insert(view(id, "/")).await.unwrap();
            }
            let recent: Vec<i64> = store
                .query(None, 3)
                .await
                .unwrap()
                .iter()
                .map(|v| v.id)
                .collect();
            assert_eq!(recent, vec![10, 9, 8], "{}", name);
        }
    }

    #[tokio::test]
    async fn test_record_round_trip() {
        for (name, store, _td) in backends(None).await {
            let mut v = located(42, "Kyoto", "Japan");
            v.referrer = "https://news.example/".to_string();
            v.isp = "NTT".to_string();
            v.browser = "Firefox".to_string();
            v.browser_version = "128.0".to_string();
            v.latitude = Some(35.0116);
            v.longitude = Some(135.7681);
            v.meta = Some(serde_json::json!({"theme": "dark", "n": 3}));
            store.insert(v.clone()).await.unwrap();

            let stored = store.query(None, 1).await.unwrap().remove(0);
            assert_eq!(stored.id, 42, "{}", name);
            assert_eq!(stored.referrer, v.referrer, "{}", name);
            assert_eq!(stored.browser_version, "128.0", "{}", name);
            assert_eq!(stored.latitude, Some(35.0116), "{}", name);
            assert_eq!(stored.meta, v.meta, "{}", name);
            assert_eq!(stored.timestamp, v.timestamp, "{}", name);
        }
    }

    #[tokio::test]
    async fn test_last_id() {
        for (name, store, _td) in backends(None).await {
            assert_eq!(store.last_id().await.unwrap(), None, "{}", name);
            store.insert(view(5, "/")).await.unwrap();
            store.insert(view(9, "/")).await.unwrap();
            assert_eq!(store.last_id().await.unwrap(), Some(9), "{}", name);
        }
    }

    #[tokio::test]
    async fn test_health_check_and_backend_name() {
        let names: Vec<&str> = backends(None)
            .await
            .iter()
            .map(|(_, s, _)| s.backend_name())
            .collect();
        assert_eq!(names, vec!["memory", "sqlite"]);
        for (name, store, _td) in backends(None).await {
            assert!(store.health_check().await.is_ok(), "{}", name);
        }
    }
}

// =============================================================================
// 过滤
// =============================================================================

#[cfg(test)]
mod filter_tests {
    use super::*;

    #[tokio::test]
    async fn test_filter_is_case_insensitive_substring() {
        for (name, store, _td) in backends(None).await {
            store.insert(view(1, "/a")).await.unwrap();
            store.insert(view(2, "/ab")).await.unwrap();
            store.insert(view(3, "/b")).await.unwrap();

            for raw in ["a", "A"] {
                let needle = normalize_filter(Some(raw));
                assert_eq!(ids_of(&store, needle.as_deref()).await, vec![2, 1], "{}", name);
            }
        }
    }

    #[tokio::test]
    async fn test_filter_matches_any_field() {
        for (name, store, _td) in backends(None).await {
            let mut chrome = view(1, "/home");
            chrome.browser = "Chrome".to_string();
            let mut paris = located(2, "Paris", "France");
            paris.os = "Linux".to_string();
            let mut private = view(3, "/x");
            private.ip = "10.1.2.3".to_string();
            for v in [chrome, paris, private] {
                store.insert(v).await.unwrap();
            }

            assert_eq!(ids_of(&store, Some("chrome")).await, vec![1], "{}", name);
            assert_eq!(ids_of(&store, Some("fran")).await, vec![2], "{}", name);
            assert_eq!(ids_of(&store, Some("linux")).await, vec![2], "{}", name);
            assert_eq!(ids_of(&store, Some("10.1.2")).await, vec![3], "{}", name);
        }
    }

    #[tokio::test]
    async fn test_filter_folds_non_ascii_case() {
        for (name, store, _td) in backends(None).await {
            store.insert(located(1, "ÅRHUS", "Denmark")).await.unwrap();
            store.insert(located(2, "Zürich", "Switzerland")).await.unwrap();
            store.insert(located(3, "Oslo", "Norway")).await.unwrap();

            for raw in ["århus", "ÅRHUS", "Århus"] {
                let needle = normalize_filter(Some(raw));
                assert_eq!(ids_of(&store, needle.as_deref()).await, vec![1], "{} {}", name, raw);
            }
            let needle = normalize_filter(Some("ZÜR"));
            assert_eq!(ids_of(&store, needle.as_deref()).await, vec![2], "{}", name);
        }
    }

    #[tokio::test]
    async fn test_filter_treats_wildcards_literally() {
        for (name, store, _td) in backends(None).await {
            store.insert(view(1, "/50%off")).await.unwrap();
            store.insert(view(2, "/plain")).await.unwrap();
            store.insert(view(3, "/snake_case")).await.unwrap();

            assert_eq!(ids_of(&store, Some("%")).await, vec![1], "{}", name);
            assert_eq!(ids_of(&store, Some("_")).await, vec![3], "{}", name);
        }
    }

    #[tokio::test]
    async fn test_whitespace_filter_is_absent() {
        for (name, store, _td) in backends(None).await {
            store.insert(view(1, "/a")).await.unwrap();
            store.insert(view(2, "/b")).await.unwrap();
            let needle = normalize_filter(Some("   "));
            assert_eq!(ids_of(&store, needle.as_deref()).await, vec![2, 1], "{}", name);
        }
    }
}

// =============================================================================
// 分组与地图点位
// =============================================================================

#[cfg(test)]
mod grouping_tests {
    use super::*;

    #[tokio::test]
    async fn test_top_cities_exclude_unknown() {
        for (name, store, _td) in backends(None).await {
            let mut id = 0;
            for _ in 0..3 {
                id += 1;
                store.insert(located(id, "Paris", "France")).await.unwrap();
            }
            for _ in 0..5 {
                id += 1;
                store.insert(located(id, UNKNOWN, UNKNOWN)).await.unwrap();
            }

            let rows = store
                .count_grouped_by(GroupField::CityCountry, 5)
                .await
                .unwrap();
            assert_eq!(rows.len(), 1, "{}", name);
            assert_eq!(rows[0].key, "Paris", "{}", name);
            assert_eq!(rows[0].country.as_deref(), Some("France"), "{}", name);
            assert_eq!(rows[0].count, 3, "{}", name);
        }
    }

    #[tokio::test]
    async fn test_ties_broken_by_first_appearance() {
        for (name, store, _td) in backends(None).await {
            let isps = ["Zeta", "Alpha", "Zeta", "Alpha", "Mid", "Solo"];
            for (i, isp) in isps.iter().enumerate() {
                let mut v = view(i as i64 + 1, "/");
                v.isp = isp.to_string();
                store.insert(v).await.unwrap();
            }

            let rows = store.count_grouped_by(GroupField::Isp, 3).await.unwrap();
            let keys: Vec<&str> = rows.iter().map(|r| r.key.as_str()).collect();
            assert_eq!(keys, vec!["Zeta", "Alpha", "Mid"], "{}", name);
        }
    }

    #[tokio::test]
    async fn test_browser_grouping() {
        for (name, store, _td) in backends(None).await {
            for (id, browser) in [(1, "Firefox"), (2, "Chrome"), (3, "Chrome"), (4, UNKNOWN)] {
                let mut v = view(id, "/");
                v.browser = browser.to_string();
                store.insert(v).await.unwrap();
            }

            let rows = store
                .count_grouped_by(GroupField::Browser, 5)
                .await
                .unwrap();
            let pairs: Vec<(&str, u64)> = rows.iter().map(|r| (r.key.as_str(), r.count)).collect();
            assert_eq!(pairs, vec![("Chrome", 2), ("Firefox", 1)], "{}", name);
            assert!(rows.iter().all(|r| r.country.is_none()), "{}", name);
        }
    }

    #[tokio::test]
    async fn test_map_points() {
        for (name, store, _td) in backends(None).await {
            let coords = [
                (1, "Tokyo", 35.68, 139.69),
                (2, "Paris", 48.85, 2.35),
                (3, "Paris", 48.85, 2.35),
            ];
            for (id, city, lat, lon) in coords {
                let mut v = located(id, city, "X");
                v.latitude = Some(lat);
                v.longitude = Some(lon);
                store.insert(v).await.unwrap();
            }
            // 只有纬度的记录不参与
            let mut half = view(4, "/");
            half.latitude = Some(1.0);
            store.insert(half).await.unwrap();

            let points = store.map_points().await.unwrap();
            assert_eq!(points.len(), 2, "{}", name);
            assert_eq!(points[0].city, "Paris", "{}", name);
            assert_eq!(points[0].count, 2, "{}", name);
            assert_eq!((points[1].lat, points[1].lon), (35.68, 139.69), "{}", name);
        }
    }
}

// =============================================================================
// 统计与删除
// =============================================================================

#[cfg(test)]
mod stats_tests {
    use super::*;

    #[tokio::test]
    async fn test_stats_exclusions() {
        for (name, store, _td) in backends(None).await {
            let mut a = located(1, "Paris", "France");
            a.ip = "1.1.1.1".to_string();
            let mut b = located(2, "Lyon", "France");
            b.ip = "1.1.1.1".to_string();
            let mut c = located(3, UNKNOWN, LOCALHOST);
            c.ip = "127.0.0.1".to_string();
            let mut d = located(4, UNKNOWN, UNKNOWN);
            d.ip = UNKNOWN_IP.to_string();
            let mut e = located(5, "Berlin", "Germany");
            e.ip = "2.2.2.2".to_string();
            for v in [a, b, c, d, e] {
                store.insert(v).await.unwrap();
            }

            let stats = store.stats().await.unwrap();
            assert_eq!(stats.total_views, 5, "{}", name);
            assert_eq!(stats.unique_visitors, 3, "{}", name);
            assert_eq!(stats.active_countries, 2, "{}", name);
        }
    }

    #[tokio::test]
    async fn test_delete_all_zeroes_stats() {
        for (name, store, _td) in backends(None).await {
            for id in 1..=20 {
                store.insert(located(id, "Oslo", "Norway")).await.unwrap();
            }
            assert_eq!(store.delete_all().await.unwrap(), 20, "{}", name);

            let stats = store.stats().await.unwrap();
            assert_eq!(stats.total_views, 0, "{}", name);
            assert_eq!(stats.unique_visitors, 0, "{}", name);
            assert_eq!(stats.active_countries, 0, "{}", name);
            assert!(store.map_points().await.unwrap().is_empty(), "{}", name);
        }
    }

    #[tokio::test]
    async fn test_delete_by_ids_recomputes_stats() {
        for (name, store, _td) in backends(None).await {
            for id in 1..=4 {
                store.insert(view(id, "/")).await.unwrap();
            }
            let deleted = store
                .delete_by_ids(&HashSet::from([2, 4, 404]))
                .await
                .unwrap();
            assert_eq!(deleted, 2, "{}", name);
            assert_eq!(ids_of(&store, None).await, vec![3, 1], "{}", name);
            assert_eq!(store.stats().await.unwrap().total_views, 2, "{}", name);

            assert_eq!(store.delete_by_ids(&HashSet::new()).await.unwrap(), 0, "{}", name);
        }
    }

    #[tokio::test]
    async fn test_reset_clears_everything() {
        for (name, store, _td) in backends(None).await {
            store.insert(view(1, "/")).await.unwrap();
            store.reset().await.unwrap();
            assert!(ids_of(&store, None).await.is_empty(), "{}", name);
        }
    }
}
