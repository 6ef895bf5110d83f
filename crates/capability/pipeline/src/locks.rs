//! 按车位串行化的锁表。
//!
//! 每个车位一个 `tokio::sync::Mutex`；守卫释放后若无其他持有者则从表中移除，
//! 表的大小与正在处理的车位数成正比。

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::OwnedMutexGuard;

type SpaceMutex = Arc<tokio::sync::Mutex<()>>;

#[derive(Default)]
pub struct SpaceLocks {
    table: Mutex<HashMap<String, SpaceMutex>>,
}

/// 车位锁守卫，drop 时释放并清理空闲条目。
pub struct SpaceGuard<'a> {
    locks: &'a SpaceLocks,
    space_id: String,
    guard: Option<OwnedMutexGuard<()>>,
}

impl SpaceLocks {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn lock(&self, space_id: &str) -> SpaceGuard<'_> {
        let mutex = {
            let mut table = self.table.lock().unwrap_or_else(PoisonError::into_inner);
            table.entry(space_id.to_string()).or_default().clone()
        };
        let guard = mutex.lock_owned().await;
        SpaceGuard {
            locks: self,
            space_id: space_id.to_string(),
            guard: Some(guard),
        }
    }

    /// 当前表内条目数（持有或等待中的车位）。
    pub fn len(&self) -> usize {
        self.table
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn release(&self, space_id: &str) {
        let mut table = self.table.lock().unwrap_or_else(PoisonError::into_inner);
        // 仅剩表内引用：没有其他任务持有或等待
        if table
            .get(space_id)
            .is_some_and(|mutex| Arc::strong_count(mutex) == 1)
        {
            table.remove(space_id);
        }
    }
}

impl Drop for SpaceGuard<'_> {
    fn drop(&mut self) {
        self.guard.take();
        self.locks.release(&self.space_id);
    }
}
