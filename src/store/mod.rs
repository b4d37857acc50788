//! 背景故事缓存
//!
//! 以猫名为键的进程内键值存储，带存活时间（TTL）淘汰。流式背景故事接口写入，
//! 时间线接口在请求未携带背景故事时读取。

use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use parking_lot::Mutex;
use std::sync::Arc;
use tracing::debug;

/// 时钟抽象，便于在测试中模拟时间流逝
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// 系统时钟
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// 手动推进的时钟
#[derive(Debug, Clone)]
pub struct ManualClock {
    now: Arc<Mutex<DateTime<Utc>>>,
}

impl ManualClock {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            now: Arc::new(Mutex::new(start)),
        }
    }

    /// 时间前进
    pub fn advance(&self, by: Duration) {
        *self.now.lock() += by;
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new(Utc::now())
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock()
    }
}

/// 键值存储 trait
pub trait KeyValueStore: Send + Sync {
    /// 读取；过期或不存在时返回 None
    fn get(&self, key: &str) -> Option<String>;

    /// 写入，同键后写覆盖先写
    fn put(&self, key: &str, value: String);

    /// 删除
    fn remove(&self, key: &str) -> Option<String>;

    /// 当前条目数（含尚未清理的过期条目）
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Debug, Clone)]
struct Entry {
    value: String,
    created_at: DateTime<Utc>,
}

/// 带 TTL 的内存存储
///
/// 条目年龄达到 TTL 即视为不存在；读取时惰性删除，写入时整体清扫。
pub struct TtlStore<C: Clock = SystemClock> {
    entries: DashMap<String, Entry>,
    ttl: Duration,
    clock: C,
}

impl TtlStore<SystemClock> {
    pub fn new(ttl: Duration) -> Self {
        Self::with_clock(ttl, SystemClock)
    }
}

impl<C: Clock> TtlStore<C> {
    pub fn with_clock(ttl: Duration, clock: C) -> Self {
        Self {
            entries: DashMap::new(),
            ttl,
            clock,
        }
    }

    fn is_expired(&self, entry: &Entry, now: DateTime<Utc>) -> bool {
        now - entry.created_at >= self.ttl
    }

    /// 清理所有过期条目，返回清理数量
    pub fn purge_expired(&self) -> usize {
        let now = self.clock.now();
        let before = self.entries.len();
        self.entries.retain(|_, entry| now - entry.created_at < self.ttl);
        let cleaned = before.saturating_sub(self.entries.len());
        if cleaned > 0 {
            debug!("Cleaned up {} expired backstory entries", cleaned);
        }
        cleaned
    }
}

impl<C: Clock> KeyValueStore for TtlStore<C> {
    fn get(&self, key: &str) -> Option<String> {
        if key.is_empty() {
            return None;
        }

        let now = self.clock.now();
        {
            let entry = self.entries.get(key)?;
            if !self.is_expired(&entry, now) {
                debug!(key, length = entry.value.len(), "Backstory cache hit");
                return Some(entry.value.clone());
            }
        }

        debug!(key, "Backstory cache entry expired");
        self.entries
            .remove_if(key, |_, entry| self.is_expired(entry, now));
        None
    }

    fn put(&self, key: &str, value: String) {
        if key.is_empty() || value.is_empty() {
            return;
        }

        self.purge_expired();
        debug!(key, length = value.len(), "Saving backstory to cache");
        self.entries.insert(
            key.to_string(),
            Entry {
                value,
                created_at: self.clock.now(),
            },
        );
    }

    fn remove(&self, key: &str) -> Option<String> {
        self.entries.remove(key).map(|(_, entry)| entry.value)
    }

    fn len(&self) -> usize {
        self.entries.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> (TtlStore<ManualClock>, ManualClock) {
        let clock = ManualClock::default();
        (TtlStore::with_clock(Duration::minutes(30), clock.clone()), clock)
    }

    #[test]
    fn test_read_within_ttl() {
        let (store, clock) = store();
        store.put("Whiskerbean", "A tale of a bean.".to_string());
        clock.advance(Duration::minutes(29));
        assert_eq!(store.get("Whiskerbean").as_deref(), Some("A tale of a bean."));
    }

    #[test]
    fn test_read_after_ttl_is_absent_and_evicted() {
        let (store, clock) = store();
        store.put("Whiskerbean", "A tale of a bean.".to_string());
        clock.advance(Duration::minutes(30));
        assert_eq!(store.get("Whiskerbean"), None);
        assert!(store.is_empty());
    }

    #[test]
    fn test_last_write_wins() {
        let (store, _clock) = store();
        store.put("Mochi", "first".to_string());
        store.put("Mochi", "second".to_string());
        assert_eq!(store.get("Mochi").as_deref(), Some("second"));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_write_sweeps_expired_entries() {
        let (store, clock) = store();
        store.put("Old", "old story".to_string());
        clock.advance(Duration::minutes(31));
        store.put("New", "new story".to_string());
        assert_eq!(store.len(), 1);
        assert_eq!(store.get("New").as_deref(), Some("new story"));
    }

    #[test]
    fn test_empty_key_or_value_ignored() {
        let (store, _clock) = store();
        store.put("", "story".to_string());
        store.put("Mochi", String::new());
        assert!(store.is_empty());
        assert_eq!(store.get(""), None);
    }

    #[test]
    fn test_rewrite_refreshes_timestamp() {
        let (store, clock) = store();
        store.put("Mochi", "first".to_string());
        clock.advance(Duration::minutes(20));
        store.put("Mochi", "second".to_string());
        clock.advance(Duration::minutes(20));
        assert_eq!(store.get("Mochi").as_deref(), Some("second"));
    }
}
