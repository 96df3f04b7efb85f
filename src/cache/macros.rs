/// Serves a value from the response cache, computing and storing it on a miss.
///
/// If the fingerprint holds a fresh entry, it is returned without running the
/// block. Otherwise the block's future is awaited; on success the value is
/// stored and returned, on failure the error is returned as-is and the
/// cache is left untouched.
///
/// # Arguments
/// * `$cache`: a [`ResponseCache`](crate::cache::ResponseCache) (or reference to one).
/// * `$key`: the [`Fingerprint`](crate::cache::Fingerprint) to read and write.
/// * `$block`: a future producing `Result<T, E>` when the value is not cached.
///
/// # Example
/// ```rust,ignore
/// let payload: serde_json::Value = cached!(cache, fingerprint, async move {
///     upstream.fetch(&request).await
/// })?;
/// ```
#[macro_export]
macro_rules! cached {
    ($cache:expr, $key:expr, $block:expr) => {{
        if let Some(hit) = $cache.get(&$key) {
            tracing::debug!(fingerprint = %$key, "Cache hit");
            Ok(hit)
        } else {
            tracing::debug!(fingerprint = %$key, "Cache miss");
            match $block.await {
                Ok(value) => {
                    $cache.put(&$key, &value);
                    Ok(value)
                }
                Err(e) => Err(e),
            }
        }
    }};
}
