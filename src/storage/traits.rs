use std::collections::HashSet;

use async_trait::async_trait;

use crate::errors::Result;
use crate::storage::models::{AggregateStats, GroupCount, GroupField, MapPoint, PageView};

/// 访问记录存储抽象
///
/// 内存和数据库后端都实现同一套接口，由 [`StorageFactory`](crate::storage::StorageFactory)
/// 在启动时选择。所有失败统一以 `BeaconError::StorageUnavailable` 返回，
/// 由调用方决定是吞掉（采集）还是上报（Dashboard）。
#[async_trait]
pub trait EventStore: Send + Sync {
    /// 写入一条记录；有容量上限时同一临界区内淘汰最旧记录
    async fn insert(&self, view: PageView) -> Result<()>;

    /// 最新优先，最多 `limit` 条；`filter` 须为 [`normalize_filter`](crate::storage::normalize_filter) 的结果
    async fn query(&self, filter: Option<&str>, limit: usize) -> Result<Vec<PageView>>;

    /// 按维度分组计数，count 降序，同分按首次出现先后
    async fn count_grouped_by(&self, field: GroupField, limit: usize) -> Result<Vec<GroupCount>>;

    /// 按 (lat, lon) 分组的地图点位
    async fn map_points(&self) -> Result<Vec<MapPoint>>;

    async fn stats(&self) -> Result<AggregateStats>;

    async fn delete_by_ids(&self, ids: &HashSet<i64>) -> Result<u64>;

    async fn delete_all(&self) -> Result<u64>;

    /// 清空存储（测试隔离用）
    async fn reset(&self) -> Result<()> {
        self.delete_all().await.map(|_| ())
    }

    /// 当前最大 id，用于启动时校准 IdGenerator
    async fn last_id(&self) -> Result<Option<i64>>;

    /// 存储连通性检查
    async fn health_check(&self) -> Result<()>;

    fn backend_name(&self) -> &'static str;
}
