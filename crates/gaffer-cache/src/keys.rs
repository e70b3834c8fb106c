//! Analysis cache key policy.
//!
//! Viewers scrub near-continuously, so a previously computed answer within
//! two seconds of the requested position is acceptably fresh. Lookups fan
//! out over the base second and its ±2s neighbors in priority order; writes
//! always use the exact base second, so the fuzz exists only on the read
//! side and a single write covers a five-second read window.

/// Cache key for one analyzed second of one video.
///
/// The video component is the raw client-supplied reference, not the
/// normalized locator, so legacy-id and full-URL requests for the same
/// video keep distinct key spaces (matching what each client re-sends).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub video: String,
    pub second: i64,
}

impl CacheKey {
    pub fn new(video: impl Into<String>, second: i64) -> Self {
        Self {
            video: video.into(),
            second,
        }
    }
}

impl std::fmt::Display for CacheKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.video, self.second)
    }
}

/// Truncate a timestamp to its base second.
///
/// Timestamps are clamped non-negative upstream; truncation toward zero is
/// therefore a plain floor.
pub fn base_second(timestamp: f64) -> i64 {
    timestamp as i64
}

/// Lookup keys in priority order: exact second first, then the ±2s
/// neighborhood by increasing distance.
///
/// Neighbor seconds may go negative near the start of a video; those keys
/// simply never match anything, because writes only ever use seconds ≥ 0.
pub fn lookup_keys(video: &str, timestamp: f64) -> [CacheKey; 5] {
    let base = base_second(timestamp);
    [
        CacheKey::new(video, base),
        CacheKey::new(video, base - 1),
        CacheKey::new(video, base + 1),
        CacheKey::new(video, base - 2),
        CacheKey::new(video, base + 2),
    ]
}

/// The single write key: exact base second, never fuzzed.
pub fn write_key(video: &str, timestamp: f64) -> CacheKey {
    CacheKey::new(video, base_second(timestamp))
}
