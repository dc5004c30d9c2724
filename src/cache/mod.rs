//! TTL-bounded storage for fetched schemas.
//!
//! One entry per `(endpoint URL, header fingerprint)` key. Entries are
//! replaced wholesale on every successful fetch and expire lazily on
//! lookup; there is no background sweep and no size bound, since the set
//! of endpoints is small and operator-controlled.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use sha2::Digest;
use sha2::Sha256;
use tokio::sync::Mutex;
use tokio::time::Instant;
use url::Url;

use crate::schema::Schema;

/// How long a cached schema is served before a lookup reports a miss.
pub const DEFAULT_SCHEMA_TTL: Duration = Duration::from_secs(30 * 60);

/// Identifies a cached schema: the endpoint plus a digest of the headers
/// the schema was fetched with.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    url: String,
    header_fingerprint: String,
}

impl CacheKey {
    pub fn new(url: &Url, headers: &HashMap<String, String>) -> Self {
        CacheKey {
            url: url.to_string(),
            header_fingerprint: header_fingerprint(headers),
        }
    }
}

/// Digest of a header set, independent of iteration order.
///
/// Name and value are length-delimited before hashing so that boundary
/// shifts (`("ab", "c")` vs `("a", "bc")`) cannot collide.
pub fn header_fingerprint(headers: &HashMap<String, String>) -> String {
    let mut pairs: Vec<(&String, &String)> = headers.iter().collect();
    pairs.sort();

    let mut hasher = Sha256::new();
    for (name, value) in pairs {
        hasher.update((name.len() as u64).to_be_bytes());
        hasher.update(name.as_bytes());
        hasher.update((value.len() as u64).to_be_bytes());
        hasher.update(value.as_bytes());
    }
    hex::encode(hasher.finalize())
}

#[derive(Clone)]
struct CacheEntry {
    schema: Arc<Schema>,
    fetched_at: Instant,
}

/// Shared schema store with lazy TTL expiry.
#[derive(Clone)]
pub struct SchemaCache {
    inner: Arc<Mutex<HashMap<CacheKey, CacheEntry>>>,
    ttl: Duration,
}

impl Default for SchemaCache {
    fn default() -> Self {
        SchemaCache::new(DEFAULT_SCHEMA_TTL)
    }
}

impl SchemaCache {
    pub fn new(ttl: Duration) -> Self {
        SchemaCache {
            inner: Arc::new(Mutex::new(HashMap::new())),
            ttl,
        }
    }

    /// Returns the cached schema, or `None` when the key is absent or the
    /// entry has outlived the TTL. Expired entries are left in place; the
    /// next `put` for the key overwrites them.
    pub async fn get(&self, key: &CacheKey) -> Option<Arc<Schema>> {
        let map = self.inner.lock().await;
        map.get(key).and_then(|entry| {
            if entry.fetched_at.elapsed() >= self.ttl {
                None
            } else {
                Some(Arc::clone(&entry.schema))
            }
        })
    }

    /// Stores a schema for the key, replacing any prior entry atomically.
    pub async fn put(&self, key: CacheKey, schema: Arc<Schema>) {
        let mut map = self.inner.lock().await;
        map.insert(
            key,
            CacheEntry {
                schema,
                fetched_at: Instant::now(),
            },
        );
    }

    #[cfg(test)]
    pub(crate) async fn len(&self) -> usize {
        self.inner.lock().await.len()
    }
}

#[cfg(test)]
mod tests {
    use maplit::hashmap;

    use super::*;

    fn empty_schema() -> Arc<Schema> {
        Arc::new(Schema::new(Some("Query"), None, None, Vec::new()))
    }

    fn endpoint() -> Url {
        Url::parse("https://api.example.com/graphql").expect("valid url")
    }

    #[test]
    fn fingerprint_ignores_header_ordering() {
        let forward = hashmap! {
            "authorization".to_string() => "Bearer abc".to_string(),
            "x-tenant".to_string() => "acme".to_string(),
        };
        let mut reversed = HashMap::new();
        reversed.insert("x-tenant".to_string(), "acme".to_string());
        reversed.insert("authorization".to_string(), "Bearer abc".to_string());

        assert_eq!(header_fingerprint(&forward), header_fingerprint(&reversed));
    }

    #[test]
    fn fingerprint_changes_with_any_name_or_value() {
        let base = hashmap! {
            "authorization".to_string() => "Bearer abc".to_string(),
        };
        let other_value = hashmap! {
            "authorization".to_string() => "Bearer xyz".to_string(),
        };
        let other_name = hashmap! {
            "x-authorization".to_string() => "Bearer abc".to_string(),
        };

        assert_ne!(header_fingerprint(&base), header_fingerprint(&other_value));
        assert_ne!(header_fingerprint(&base), header_fingerprint(&other_name));
    }

    #[test]
    fn fingerprint_is_not_fooled_by_boundary_shifts() {
        let left = hashmap! { "ab".to_string() => "c".to_string() };
        let right = hashmap! { "a".to_string() => "bc".to_string() };

        assert_ne!(header_fingerprint(&left), header_fingerprint(&right));
    }

    #[tokio::test(start_paused = true)]
    async fn get_after_put_returns_the_same_schema() {
        let cache = SchemaCache::default();
        let key = CacheKey::new(&endpoint(), &HashMap::new());
        let schema = empty_schema();

        cache.put(key.clone(), Arc::clone(&schema)).await;

        let cached = cache.get(&key).await.expect("fresh entry is served");
        assert!(Arc::ptr_eq(&cached, &schema));
    }

    #[tokio::test(start_paused = true)]
    async fn entries_expire_after_the_ttl() {
        let cache = SchemaCache::default();
        let key = CacheKey::new(&endpoint(), &HashMap::new());
        cache.put(key.clone(), empty_schema()).await;

        tokio::time::advance(DEFAULT_SCHEMA_TTL - Duration::from_secs(1)).await;
        assert!(cache.get(&key).await.is_some());

        tokio::time::advance(Duration::from_secs(1)).await;
        assert!(cache.get(&key).await.is_none());

        // Lazy expiry: the entry stays until overwritten.
        assert_eq!(cache.len().await, 1);
        cache.put(key.clone(), empty_schema()).await;
        assert_eq!(cache.len().await, 1);
        assert!(cache.get(&key).await.is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn distinct_headers_map_to_distinct_entries() {
        let cache = SchemaCache::default();
        let anonymous = CacheKey::new(&endpoint(), &HashMap::new());
        let authed = CacheKey::new(
            &endpoint(),
            &hashmap! { "authorization".to_string() => "Bearer abc".to_string() },
        );

        cache.put(authed.clone(), empty_schema()).await;

        assert!(cache.get(&anonymous).await.is_none());
        assert!(cache.get(&authed).await.is_some());
    }
}
