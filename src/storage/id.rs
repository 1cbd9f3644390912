use chrono::{DateTime, Utc};
use parking_lot::Mutex;

/// 访问记录 id 与时间戳分配器
///
/// id 以墙钟微秒为种子，保证严格递增；时间戳保证单调不减。
/// 两个后端都按 id 排序，所以 "最新优先" 与 "同分按首次出现" 在内存和数据库中一致。
#[derive(Debug)]
pub struct IdGenerator {
    last: Mutex<(i64, DateTime<Utc>)>,
}

impl IdGenerator {
    pub fn new() -> Self {
        Self::starting_after(None)
    }

    /// 从已有最大 id 之后继续分配（数据库重启后时钟回拨也不会撞 id）
    pub fn starting_after(last_id: Option<i64>) -> Self {
        Self {
            last: Mutex::new((last_id.unwrap_or(0), DateTime::<Utc>::MIN_UTC)),
        }
    }

    /// 分配下一个 (id, timestamp)
    pub fn next(&self) -> (i64, DateTime<Utc>) {
        self.next_at(Utc::now())
    }

    fn next_at(&self, now: DateTime<Utc>) -> (i64, DateTime<Utc>) {
        let mut last = self.last.lock();
        let id = now.timestamp_micros().max(last.0 + 1);
        let ts = now.max(last.1);
        *last = (id, ts);
        (id, ts)
    }
}

impl Default for IdGenerator {
    fn default() -> Self {
        Self::new()
    }
}
