use std::collections::{HashMap, HashSet, VecDeque};

use async_trait::async_trait;
use parking_lot::Mutex;
use tracing::debug;

use crate::errors::Result;
use crate::storage::models::{
    AggregateStats, GroupCount, GroupField, MapPoint, PageView, is_real_country,
};
use crate::storage::traits::EventStore;
use crate::utils::ip::UNKNOWN_IP;

/// 进程内存存储
///
/// 记录按 id 升序保存在 VecDeque 中，超过容量时从头部淘汰。
/// 所有读写都在同一把锁里完成，淘汰和插入不会被其它请求观察到中间状态。
pub struct MemoryStore {
    cap: usize,
    events: Mutex<VecDeque<PageView>>,
}

impl MemoryStore {
    pub fn new(cap: usize) -> Self {
        let cap = cap.max(1);
        Self {
            cap,
            events: Mutex::new(VecDeque::with_capacity(cap.min(4096))),
        }
    }

    pub fn capacity(&self) -> usize {
        self.cap
    }

    pub fn len(&self) -> usize {
        self.events.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// 按首次出现顺序累计，最终按 count 降序、首次出现升序排列
struct Tally<K> {
    index: HashMap<K, usize>,
    rows: Vec<(K, u64)>,
}

impl<K: std::hash::Hash + Eq + Clone> Tally<K> {
    fn new() -> Self {
        Self {
            index: HashMap::new(),
            rows: Vec::new(),
        }
    }

    fn add(&mut self, key: K) {
        match self.index.get(&key) {
            Some(&pos) => self.rows[pos].1 += 1,
            None => {
                self.index.insert(key.clone(), self.rows.len());
                self.rows.push((key, 1));
            }
        }
    }

    fn ranked(self) -> Vec<(K, u64)> {
        let mut rows = self.rows;
        // sort_by 是稳定排序，同分保持首次出现顺序
        rows.sort_by(|a, b| b.1.cmp(&a.1));
        rows
    }
}

#[async_trait]
impl EventStore for MemoryStore {
    async fn insert(&self, view: PageView) -> Result<()> {
        let mut events = self.events.lock();
        // 并发采集时 id 分配与写入顺序可能交错，按 id 插入保持有序
        let pos = events.partition_point(|e| e.id < view.id);
        events.insert(pos, view);
        while events.len() > self.cap {
            if let Some(evicted) = events.pop_front() {
                debug!("Evicted page view {} (cap {})", evicted.id, self.cap);
            }
        }
        Ok(())
    }

    async fn query(&self, filter: Option<&str>, limit: usize) -> Result<Vec<PageView>> {
        let events = self.events.lock();
        Ok(events
            .iter()
            .rev()
            .filter(|e| filter.is_none_or(|needle| e.matches(needle)))
            .take(limit)
            .cloned()
            .collect())
    }

    async fn count_grouped_by(&self, field: GroupField, limit: usize) -> Result<Vec<GroupCount>> {
        let events = self.events.lock();
        let mut tally = Tally::new();
        for event in events.iter() {
            if let Some(key) = field.key_of(event) {
                tally.add(key);
            }
        }
        Ok(tally
            .ranked()
            .into_iter()
            .take(limit)
            .map(|((key, country), count)| GroupCount {
                key,
                country,
                count,
            })
            .collect())
    }

    async fn map_points(&self) -> Result<Vec<MapPoint>> {
        let events = self.events.lock();
        let mut tally = Tally::new();
        // f64 不能直接做 HashMap 键，用位模式代替
        let mut labels: HashMap<(u64, u64), (String, String)> = HashMap::new();
        for event in events.iter() {
            let Some((lat, lon)) = event.coordinates() else {
                continue;
            };
            let key = (lat.to_bits(), lon.to_bits());
            tally.add(key);
            // 与 SQL 后端一致：同坐标取字典序最小的 city / country
            labels
                .entry(key)
                .and_modify(|(city, country)| {
                    if event.city < *city {
                        *city = event.city.clone();
                    }
                    if event.country < *country {
                        *country = event.country.clone();
                    }
                })
                .or_insert_with(|| (event.city.clone(), event.country.clone()));
        }
        Ok(tally
            .ranked()
            .into_iter()
            .map(|(key, count)| {
                let (city, country) = labels.remove(&key).unwrap_or_default();
                MapPoint {
                    lat: f64::from_bits(key.0),
                    lon: f64::from_bits(key.1),
                    city,
                    country,
                    count,
                }
            })
            .collect())
    }

    async fn stats(&self) -> Result<AggregateStats> {
        let events = self.events.lock();
        let mut visitors = HashSet::new();
        let mut countries = HashSet::new();
        for event in events.iter() {
            if event.ip != UNKNOWN_IP {
                visitors.insert(event.ip.as_str());
            }
            if is_real_country(&event.country) {
                countries.insert(event.country.as_str());
            }
        }
        Ok(AggregateStats {
            total_views: events.len() as u64,
            unique_visitors: visitors.len() as u64,
            active_countries: countries.len() as u64,
        })
    }

    async fn delete_by_ids(&self, ids: &HashSet<i64>) -> Result<u64> {
        let mut events = self.events.lock();
        let before = events.len();
        events.retain(|e| !ids.contains(&e.id));
        Ok((before - events.len()) as u64)
    }

    async fn delete_all(&self) -> Result<u64> {
        let mut events = self.events.lock();
        let removed = events.len() as u64;
        events.clear();
        Ok(removed)
    }

    async fn last_id(&self) -> Result<Option<i64>> {
        Ok(self.events.lock().back().map(|e| e.id))
    }

    async fn health_check(&self) -> Result<()> {
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}
