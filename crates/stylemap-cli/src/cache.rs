//! Result cache for whole enhancement results.
//!
//! The engine keeps no state between calls, so repeated requests with the
//! same (design JSON, stylesheet, options) are answered here instead.
//! Entries expire after a TTL; when the cache is full the least recently
//! used entry is evicted.

use crate::error::CliError;
use crate::worker::EnhanceHandle;
use lru::LruCache;
use std::hash::{DefaultHasher, Hash, Hasher};
use std::num::NonZeroUsize;
use std::sync::Arc;
use std::time::{Duration, Instant};
use stylemap_core::{EnhanceOptions, EnhancementResult, load_design_tree};
use tokio::sync::Mutex;

pub const DEFAULT_TTL: Duration = Duration::from_secs(300);
pub const DEFAULT_MAX_ENTRIES: usize = 32;

/// One enhancement input.
///
/// Hashes by a 64-bit digest of its parts but compares the parts
/// themselves, so two inputs that share a digest are still different keys.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheKey {
    digest: u64,
    tree_json: Arc<str>,
    style_text: Arc<str>,
    options: String,
}

impl CacheKey {
    pub fn new(tree_json: &str, style_text: &str, options: &EnhanceOptions) -> Self {
        // f32 fields are not `Hash`; the serialized record is.
        let options = serde_json::to_string(options).unwrap_or_default();
        let mut hasher = DefaultHasher::new();
        tree_json.hash(&mut hasher);
        style_text.hash(&mut hasher);
        options.hash(&mut hasher);
        Self {
            digest: hasher.finish(),
            tree_json: Arc::from(tree_json),
            style_text: Arc::from(style_text),
            options,
        }
    }

    pub fn digest(&self) -> u64 {
        self.digest
    }
}

impl Hash for CacheKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.digest.hash(state);
    }
}

struct CacheEntry {
    result: Arc<EnhancementResult>,
    inserted: Instant,
}

pub struct ResultCache {
    entries: LruCache<CacheKey, CacheEntry>,
    ttl: Duration,
}

impl Default for ResultCache {
    fn default() -> Self {
        Self::new(DEFAULT_TTL, DEFAULT_MAX_ENTRIES)
    }
}

impl ResultCache {
    pub fn new(ttl: Duration, max_entries: usize) -> Self {
        let capacity = NonZeroUsize::new(max_entries).unwrap_or(NonZeroUsize::MIN);
        Self {
            entries: LruCache::new(capacity),
            ttl,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// A live entry for `key`. An expired entry is dropped on the way.
    pub fn get(&mut self, key: &CacheKey) -> Option<Arc<EnhancementResult>> {
        let ttl = self.ttl;
        let expired = self.entries.peek(key)?.inserted.elapsed() >= ttl;
        if expired {
            self.entries.pop(key);
            return None;
        }
        self.entries.get(key).map(|e| e.result.clone())
    }

    pub fn insert(&mut self, key: CacheKey, result: Arc<EnhancementResult>) {
        let entry = CacheEntry {
            result,
            inserted: Instant::now(),
        };
        // `push` also hands back the entry it replaced under the same key.
        if let Some((evicted, _)) = self.entries.push(key.clone(), entry)
            && evicted != key
        {
            log::trace!("result cache evicted {:#x}", evicted.digest());
        }
    }
}

/// Worker handle with a result cache in front of it.
pub struct CachedEnhancer {
    handle: EnhanceHandle,
    cache: Mutex<ResultCache>,
}

impl CachedEnhancer {
    pub fn new(handle: EnhanceHandle, cache: ResultCache) -> Self {
        Self {
            handle,
            cache: Mutex::new(cache),
        }
    }

    /// Enhance raw design JSON with a stylesheet, reusing a cached result
    /// when the same inputs were seen within the TTL.
    pub async fn enhance(
        &self,
        tree_json: &str,
        style_text: &str,
        options: &EnhanceOptions,
    ) -> Result<Arc<EnhancementResult>, CliError> {
        let key = CacheKey::new(tree_json, style_text, options);
        if let Some(hit) = self.cache.lock().await.get(&key) {
            log::debug!("result cache hit {:#x}", key.digest());
            return Ok(hit);
        }

        let tree = Arc::new(load_design_tree(tree_json)?);
        let result = Arc::new(
            self.handle
                .enhance(tree, style_text, options.clone())
                .await?,
        );
        self.cache.lock().await.insert(key, result.clone());
        Ok(result)
    }

    pub async fn cached_entries(&self) -> usize {
        self.cache.lock().await.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::worker::EnhanceWorker;
    use stylemap_core::{EnhancementStatistics, MappingStrategy};

    const TREE: &str = r#"{ "id": "1:1", "name": "Header", "type": "FRAME" }"#;

    fn result(rule_count: usize) -> Arc<EnhancementResult> {
        Arc::new(EnhancementResult {
            mappings: Vec::new(),
            coverage: 0.0,
            conflicts: Vec::new(),
            suggestions: Vec::new(),
            warnings: Vec::new(),
            statistics: EnhancementStatistics {
                rule_count,
                ..Default::default()
            },
        })
    }

    #[test]
    fn key_depends_on_every_input() {
        let options = EnhanceOptions::default();
        let base = CacheKey::new(TREE, ".a {}", &options);
        assert_eq!(base, CacheKey::new(TREE, ".a {}", &options));
        assert_ne!(base, CacheKey::new(TREE, ".b {}", &options));
        assert_ne!(base, CacheKey::new("{}", ".a {}", &options));
        let class = EnhanceOptions {
            mapping_strategy: MappingStrategy::Class,
            ..Default::default()
        };
        assert_ne!(base, CacheKey::new(TREE, ".a {}", &class));
    }

    #[test]
    fn shared_digest_does_not_share_a_result() {
        let options = EnhanceOptions::default();
        let stored = CacheKey::new(TREE, ".a {}", &options);
        let mut other = CacheKey::new(TREE, ".b {}", &options);
        other.digest = stored.digest;

        let mut cache = ResultCache::default();
        cache.insert(stored.clone(), result(1));
        assert!(cache.get(&other).is_none());
        assert_eq!(cache.get(&stored).unwrap().statistics.rule_count, 1);

        cache.insert(other.clone(), result(2));
        assert_eq!(cache.len(), 2);
        assert_eq!(cache.get(&other).unwrap().statistics.rule_count, 2);
    }

    #[test]
    fn expired_entries_are_not_served() {
        let mut cache = ResultCache::new(Duration::ZERO, 4);
        let key = CacheKey::new(TREE, "", &EnhanceOptions::default());
        cache.insert(key.clone(), result(1));
        assert!(cache.get(&key).is_none());
        assert!(cache.is_empty());
    }

    #[test]
    fn least_recently_used_entry_is_evicted_when_full() {
        let mut cache = ResultCache::new(DEFAULT_TTL, 2);
        let options = EnhanceOptions::default();
        let keys: Vec<CacheKey> = ["a", "b", "c"]
            .iter()
            .map(|css| CacheKey::new(TREE, css, &options))
            .collect();

        cache.insert(keys[0].clone(), result(0));
        cache.insert(keys[1].clone(), result(1));
        // touching `a` makes `b` the eviction candidate
        assert!(cache.get(&keys[0]).is_some());
        cache.insert(keys[2].clone(), result(2));

        assert_eq!(cache.len(), 2);
        assert!(cache.get(&keys[1]).is_none());
        assert_eq!(cache.get(&keys[0]).unwrap().statistics.rule_count, 0);
        assert_eq!(cache.get(&keys[2]).unwrap().statistics.rule_count, 2);
    }

    #[test]
    fn zero_capacity_still_holds_one_entry() {
        let mut cache = ResultCache::new(DEFAULT_TTL, 0);
        let key = CacheKey::new(TREE, "", &EnhanceOptions::default());
        cache.insert(key.clone(), result(3));
        assert_eq!(cache.len(), 1);
        assert!(cache.get(&key).is_some());
    }

    #[tokio::test]
    async fn repeated_request_hits_the_cache() {
        let (handle, _task) = EnhanceWorker::spawn(2);
        let enhancer = CachedEnhancer::new(handle, ResultCache::default());
        let options = EnhanceOptions::default();

        let first = enhancer
            .enhance(TREE, ".header { color: red; }", &options)
            .await
            .unwrap();
        let second = enhancer
            .enhance(TREE, ".header { color: red; }", &options)
            .await
            .unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(enhancer.cached_entries().await, 1);
        assert_eq!(first.mappings.len(), 1);
    }

    #[tokio::test]
    async fn invalid_document_is_not_cached() {
        let (handle, _task) = EnhanceWorker::spawn(1);
        let enhancer = CachedEnhancer::new(handle, ResultCache::default());

        let err = enhancer
            .enhance("{ not json", "", &EnhanceOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, CliError::Document(_)));
        assert_eq!(enhancer.cached_entries().await, 0);
    }
}
