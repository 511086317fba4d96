use std::collections::HashMap;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    extract::{ConnectInfo, Request, State},
    http::{HeaderMap, HeaderValue},
    middleware::Next,
    response::Response,
};
use tokio::sync::Mutex;
use tracing::warn;

use crate::error::ApiError;

#[derive(Debug, Clone, Copy)]
struct Window {
    started: Instant,
    count: u32,
}

#[derive(Default)]
struct Windows {
    by_ip: HashMap<IpAddr, Window>,
    last_prune: Option<Instant>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allowed { remaining: u32, reset_in: Duration },
    Limited { retry_after: Duration },
}

/// Fixed-window counter per client IP.
pub struct RateLimiter {
    max_requests: u32,
    window: Duration,
    trust_forwarded_for: bool,
    windows: Mutex<Windows>,
}

impl RateLimiter {
    pub fn new(max_requests: u32, window: Duration, trust_forwarded_for: bool) -> Self {
        Self {
            max_requests,
            window,
            trust_forwarded_for,
            windows: Mutex::default(),
        }
    }

    pub fn max_requests(&self) -> u32 {
        self.max_requests
    }

    pub async fn check(&self, ip: IpAddr) -> Decision {
        self.check_at(ip, Instant::now()).await
    }

    pub async fn check_at(&self, ip: IpAddr, now: Instant) -> Decision {
        let mut windows = self.windows.lock().await;
        self.prune(&mut windows, now);

        let window = windows.by_ip.entry(ip).or_insert(Window {
            started: now,
            count: 0,
        });
        if now.duration_since(window.started) >= self.window {
            *window = Window {
                started: now,
                count: 0,
            };
        }

        let reset_in = self.window.saturating_sub(now.duration_since(window.started));
        if window.count >= self.max_requests {
            return Decision::Limited {
                retry_after: reset_in,
            };
        }

        window.count += 1;
        Decision::Allowed {
            remaining: self.max_requests - window.count,
            reset_in,
        }
    }

    /// Drop expired windows at most once per window length.
    fn prune(&self, windows: &mut Windows, now: Instant) {
        if windows
            .last_prune
            .is_some_and(|last| now.duration_since(last) < self.window)
        {
            return;
        }
        let window = self.window;
        windows
            .by_ip
            .retain(|_, w| now.duration_since(w.started) < window);
        windows.last_prune = Some(now);
    }

    #[cfg(test)]
    async fn tracked(&self) -> usize {
        self.windows.lock().await.by_ip.len()
    }

    fn client_ip(&self, req: &Request) -> IpAddr {
        if self.trust_forwarded_for {
            if let Some(ip) = forwarded_for(req.headers()) {
                return ip;
            }
        }
        req.extensions()
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| addr.ip())
            .unwrap_or(IpAddr::V4(Ipv4Addr::UNSPECIFIED))
    }
}

/// First hop of `X-Forwarded-For`.
fn forwarded_for(headers: &HeaderMap) -> Option<IpAddr> {
    headers
        .get("x-forwarded-for")?
        .to_str()
        .ok()?
        .split(',')
        .next()?
        .trim()
        .parse()
        .ok()
}

pub async fn rate_limit(
    State(limiter): State<Arc<RateLimiter>>,
    req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let ip = limiter.client_ip(&req);

    match limiter.check(ip).await {
        Decision::Limited { retry_after } => {
            warn!("Rate limit exceeded for {}", ip);
            Err(ApiError::RateLimited { retry_after })
        }
        Decision::Allowed {
            remaining,
            reset_in,
        } => {
            let mut response = next.run(req).await;
            let headers = response.headers_mut();
            headers.insert("x-ratelimit-limit", HeaderValue::from(limiter.max_requests()));
            headers.insert("x-ratelimit-remaining", HeaderValue::from(remaining));
            headers.insert("x-ratelimit-reset", HeaderValue::from(reset_in.as_secs()));
            Ok(response)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const A: IpAddr = IpAddr::V4(Ipv4Addr::new(10, 0, 0, 1));
    const B: IpAddr = IpAddr::V4(Ipv4Addr::new(10, 0, 0, 2));

    #[tokio::test]
    async fn limits_after_max_requests() {
        let limiter = RateLimiter::new(2, Duration::from_secs(60), false);
        let now = Instant::now();

        assert!(matches!(
            limiter.check_at(A, now).await,
            Decision::Allowed { remaining: 1, .. }
        ));
        assert!(matches!(
            limiter.check_at(A, now).await,
            Decision::Allowed { remaining: 0, .. }
        ));
        let later = now + Duration::from_secs(15);
        assert_eq!(
            limiter.check_at(A, later).await,
            Decision::Limited {
                retry_after: Duration::from_secs(45)
            }
        );

        // Other clients have their own window.
        assert!(matches!(
            limiter.check_at(B, later).await,
            Decision::Allowed { .. }
        ));
    }

    #[tokio::test]
    async fn window_resets() {
        let limiter = RateLimiter::new(1, Duration::from_secs(60), false);
        let now = Instant::now();

        limiter.check_at(A, now).await;
        assert!(matches!(
            limiter.check_at(A, now).await,
            Decision::Limited { .. }
        ));
        assert!(matches!(
            limiter.check_at(A, now + Duration::from_secs(60)).await,
            Decision::Allowed { .. }
        ));
    }

    #[tokio::test]
    async fn stale_windows_are_pruned() {
        let limiter = RateLimiter::new(5, Duration::from_secs(60), false);
        let now = Instant::now();

        limiter.check_at(A, now).await;
        limiter.check_at(B, now + Duration::from_secs(30)).await;
        assert_eq!(limiter.tracked().await, 2);

        limiter.check_at(B, now + Duration::from_secs(70)).await;
        assert_eq!(limiter.tracked().await, 1);
    }

    #[test]
    fn forwarded_for_takes_the_first_hop() {
        let mut headers = HeaderMap::new();
        headers.insert(
            "x-forwarded-for",
            HeaderValue::from_static("203.0.113.7, 10.0.0.1"),
        );
        assert_eq!(
            forwarded_for(&headers),
            Some("203.0.113.7".parse().unwrap())
        );

        headers.insert("x-forwarded-for", HeaderValue::from_static("garbage"));
        assert_eq!(forwarded_for(&headers), None);
    }
}
