use axum::{
    body::Body,
    extract::{ConnectInfo, State},
    http::{Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use std::collections::{HashMap, VecDeque};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;

/// Sliding-window limiter for the endpoints that spend provider credits.
/// In-memory only; a multi-instance deployment would need shared storage.
#[derive(Clone)]
pub struct RateLimiter {
    windows: Arc<RwLock<HashMap<String, VecDeque<Instant>>>>,
    max_requests: usize,
    window: Duration,
}

impl RateLimiter {
    pub fn new(max_requests: usize, window: Duration) -> Self {
        Self {
            windows: Arc::new(RwLock::new(HashMap::new())),
            max_requests,
            window,
        }
    }

    /// Record a hit for `key` and report whether it fits in the window.
    pub async fn try_acquire(&self, key: &str) -> bool {
        let now = Instant::now();
        let mut windows = self.windows.write().await;
        let hits = windows.entry(key.to_string()).or_default();

        while hits
            .front()
            .is_some_and(|&hit| now.duration_since(hit) >= self.window)
        {
            hits.pop_front();
        }

        if hits.len() >= self.max_requests {
            return false;
        }
        hits.push_back(now);
        true
    }

    /// Drop identifiers whose whole window has expired.
    pub async fn sweep(&self) {
        let now = Instant::now();
        let mut windows = self.windows.write().await;
        windows.retain(|_, hits| {
            while hits
                .front()
                .is_some_and(|&hit| now.duration_since(hit) >= self.window)
            {
                hits.pop_front();
            }
            !hits.is_empty()
        });
        tracing::debug!("rate limiter sweep: {} active identifiers", windows.len());
    }
}

/// Per-IP gate in front of the AI-backed routes.
pub async fn limit_ai_requests(
    State(limiter): State<RateLimiter>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let key = addr.ip().to_string();
    if !limiter.try_acquire(&key).await {
        tracing::warn!("rate limit exceeded for {}", key);
        return (
            StatusCode::TOO_MANY_REQUESTS,
            Json(json!({ "error": "Too many requests. Please try again later." })),
        )
            .into_response();
    }
    next.run(request).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn blocks_after_limit_within_window() {
        let limiter = RateLimiter::new(2, Duration::from_secs(60));

        assert!(limiter.try_acquire("10.0.0.1").await);
        assert!(limiter.try_acquire("10.0.0.1").await);
        assert!(!limiter.try_acquire("10.0.0.1").await);

        // Other identifiers have their own window.
        assert!(limiter.try_acquire("10.0.0.2").await);
    }

    #[tokio::test]
    async fn window_expiry_frees_capacity() {
        let limiter = RateLimiter::new(1, Duration::from_millis(50));

        assert!(limiter.try_acquire("ip").await);
        assert!(!limiter.try_acquire("ip").await);

        tokio::time::sleep(Duration::from_millis(80)).await;
        assert!(limiter.try_acquire("ip").await);
    }

    #[tokio::test]
    async fn sweep_removes_expired_identifiers() {
        let limiter = RateLimiter::new(5, Duration::from_millis(50));

        limiter.try_acquire("a").await;
        limiter.try_acquire("b").await;

        tokio::time::sleep(Duration::from_millis(80)).await;
        limiter.sweep().await;

        let windows = limiter.windows.read().await;
        assert!(windows.is_empty());
    }
}
