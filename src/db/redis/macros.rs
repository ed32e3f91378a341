/// Read-through caching over an optional [`Cache`](crate::db::Cache).
///
/// With a cache present, a hit is returned directly; otherwise the block is
/// awaited, its value queued for a background write and returned. Cache read
/// failures count as misses. With `None` the block simply runs.
///
/// # Arguments
/// * `$cache`: an `Option<&Cache>`
/// * `$key`: the [`CacheKey`](crate::db::CacheKey) for the value
/// * `$ttl`: time-to-live in seconds
/// * `$block`: a future producing `Result<T, E>`
///
/// # Example
/// ```rust,ignore
/// let titles = cached!(self.cache.as_ref(), CacheKey::Popular(kind), 3600, async {
///     self.fetch_list(path).await
/// })?;
/// ```
#[macro_export]
macro_rules! cached {
    ($cache:expr, $key:expr, $ttl:expr, $block:expr) => {{
        let cache: Option<&$crate::db::Cache> = $cache;
        let key = $key;
        let hit = match cache {
            Some(cache) => cache.get_or_miss(&key).await,
            None => None,
        };
        match hit {
            Some(value) => Ok(value),
            None => match $block.await {
                Ok(value) => {
                    if let Some(cache) = cache {
                        cache.set_in_background(&key, &value, $ttl);
                    }
                    Ok(value)
                }
                Err(e) => Err(e),
            },
        }
    }};
}
