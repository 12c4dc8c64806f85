//! One-call burst against a URL

use std::sync::Arc;
use std::time::Duration;

use burst_bench_core::{BurstEngineBuilder, HarnessResult};

use crate::client::{HttpConfig, HttpTarget};

/// Fire `count` concurrent GETs at `url` and wait for all of them.
///
/// Returns the number of 200 responses and the wall time of the burst.
/// Every request is in flight at once; use [`BurstEngineBuilder`] directly
/// to cap concurrency or bound the burst.
pub async fn run_burst(
    url: &str,
    count: usize,
    skip_tls_verify: bool,
) -> HarnessResult<(usize, Duration)> {
    let config = HttpConfig::default().with_skip_tls_verify(skip_tls_verify);
    let target = HttpTarget::new(url, &config)?;

    let engine = BurstEngineBuilder::new().target(Arc::new(target)).build()?;
    let outcome = engine.run(count).await?;

    Ok((outcome.succeeded, outcome.elapsed))
}
