//! Geo Filter Middleware
//!
//! axum middleware that allows or blocks requests by client country.
//! Bypass filters run first, then the client address is derived, resolved
//! and checked against the policy. Infrastructure failures fail closed with
//! 500; policy denials go to the block handler (403 by default).

use crate::adapters::inbound::client_ip::{ClientIpStrategy, RemoteAddr};
use crate::application::GeoPolicyService;
use crate::domain::entities::{Decision, Policy};
use crate::domain::ports::{CountryResolver, LookupError};
use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware::{self, Next},
    response::{IntoResponse, Response},
    Router,
};
use std::net::IpAddr;
use std::ops::ControlFlow;
use std::sync::Arc;
use tracing::{dispatcher, Dispatch};

/// Predicate exempting a request from country filtering.
///
/// Filters run for every request, in registration order, so keep them cheap.
pub trait RequestFilter: Send + Sync {
    fn bypass(&self, req: &Request) -> bool;
}

impl<F> RequestFilter for F
where
    F: Fn(&Request) -> bool + Send + Sync,
{
    fn bypass(&self, req: &Request) -> bool {
        self(req)
    }
}

/// Bypass requests under a path prefix, e.g. `/health`.
///
/// Matching is segment-aware: `/health` covers `/health` and `/health/live`
/// but not `/healthz` or `/health-admin`. A prefix ending in `/` covers
/// everything below it.
#[derive(Debug, Clone)]
pub struct PathPrefixFilter {
    prefix: String,
}

impl PathPrefixFilter {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }
}

impl RequestFilter for PathPrefixFilter {
    fn bypass(&self, req: &Request) -> bool {
        let path = req.uri().path();
        match path.strip_prefix(self.prefix.as_str()) {
            Some(rest) => rest.is_empty() || self.prefix.ends_with('/') || rest.starts_with('/'),
            None => false,
        }
    }
}

/// Produces the response for a blocked request.
pub trait BlockHandler: Send + Sync {
    fn respond(&self, req: &Request, decision: &Decision) -> Response;
}

impl<F> BlockHandler for F
where
    F: Fn(&Request, &Decision) -> Response + Send + Sync,
{
    fn respond(&self, req: &Request, decision: &Decision) -> Response {
        self(req, decision)
    }
}

/// 403 Forbidden with an empty body.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultBlockResponse;

impl BlockHandler for DefaultBlockResponse {
    fn respond(&self, _req: &Request, _decision: &Decision) -> Response {
        StatusCode::FORBIDDEN.into_response()
    }
}

/// Options for building an [`IpFilter`].
///
/// Whitelist and blacklist are mutually exclusive: setting one clears the
/// other, and repeated calls for the same list accumulate.
///
/// The filter's events are emitted with target
/// `geofilter::adapters::inbound::geo_filter` and the message prefix
/// `geoip:`, so a subscriber can select them with a target directive.
/// [`IpFilterOptions::log_dispatch`] routes them to a dedicated
/// [`Dispatch`] instead of the global default.
pub struct IpFilterOptions {
    policy: Policy,
    filters: Vec<Arc<dyn RequestFilter>>,
    strategy: Arc<dyn ClientIpStrategy>,
    block_handler: Arc<dyn BlockHandler>,
    log_events: bool,
    log_dispatch: Option<Dispatch>,
}

impl Default for IpFilterOptions {
    fn default() -> Self {
        Self {
            policy: Policy::Unrestricted,
            filters: Vec::new(),
            strategy: Arc::new(RemoteAddr),
            block_handler: Arc::new(DefaultBlockResponse),
            log_events: true,
            log_dispatch: None,
        }
    }
}

impl IpFilterOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Deny requests from these countries. Clears any whitelist.
    pub fn blacklisted_countries<I, S>(mut self, codes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.policy = self.policy.add_blacklisted(codes);
        self
    }

    /// Allow only requests from these countries. Clears any blacklist.
    pub fn whitelisted_countries<I, S>(mut self, codes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.policy = self.policy.add_whitelisted(codes);
        self
    }

    /// Append a bypass filter.
    pub fn filter(mut self, filter: impl RequestFilter + 'static) -> Self {
        self.filters.push(Arc::new(filter));
        self
    }

    /// Strategy for deriving the client address. Defaults to [`RemoteAddr`].
    pub fn client_ip_strategy(mut self, strategy: impl ClientIpStrategy + 'static) -> Self {
        self.strategy = Arc::new(strategy);
        self
    }

    /// Response for blocked requests. Defaults to [`DefaultBlockResponse`].
    pub fn block_response(mut self, handler: impl BlockHandler + 'static) -> Self {
        self.block_handler = Arc::new(handler);
        self
    }

    /// Emit the middleware's own tracing events. Enabled by default.
    pub fn log_events(mut self, enabled: bool) -> Self {
        self.log_events = enabled;
        self
    }

    /// Send the middleware's events to `dispatch` rather than the current
    /// default subscriber.
    pub fn log_dispatch(mut self, dispatch: Dispatch) -> Self {
        self.log_dispatch = Some(dispatch);
        self
    }

    pub fn policy(&self) -> &Policy {
        &self.policy
    }
}

/// Country-based IP filter.
///
/// Intended for MaxMind GeoLite2 / GeoIP2 country databases but works with
/// any [`CountryResolver`]. Immutable once built; share it behind an `Arc`.
pub struct IpFilter {
    service: GeoPolicyService,
    filters: Vec<Arc<dyn RequestFilter>>,
    strategy: Arc<dyn ClientIpStrategy>,
    block_handler: Arc<dyn BlockHandler>,
    log_events: bool,
    log_dispatch: Option<Dispatch>,
}

impl IpFilter {
    pub fn new(resolver: Arc<dyn CountryResolver>, options: IpFilterOptions) -> Self {
        Self {
            service: GeoPolicyService::new(resolver, options.policy),
            filters: options.filters,
            strategy: options.strategy,
            block_handler: options.block_handler,
            log_events: options.log_events,
            log_dispatch: options.log_dispatch,
        }
    }

    pub fn policy(&self) -> &Policy {
        self.service.policy()
    }

    /// Check an address directly, outside of any HTTP request.
    pub fn allowed(&self, ip: IpAddr) -> Result<Decision, LookupError> {
        self.service.check(ip)
    }

    /// Run the filter pipeline for one request.
    ///
    /// `Continue` means forward to the next handler; `Break` carries the
    /// response to return instead.
    pub fn screen(&self, req: &Request) -> ControlFlow<Response> {
        match &self.log_dispatch {
            Some(dispatch) => dispatcher::with_default(dispatch, || self.run_pipeline(req)),
            None => self.run_pipeline(req),
        }
    }

    fn run_pipeline(&self, req: &Request) -> ControlFlow<Response> {
        if self.filters.iter().any(|filter| filter.bypass(req)) {
            if self.log_events {
                tracing::debug!("geoip: skipping request due to filter match");
            }
            return ControlFlow::Continue(());
        }

        let ip = match self.strategy.client_ip(req) {
            Ok(ip) => ip,
            Err(e) => {
                if self.log_events {
                    tracing::error!(error = %e, "geoip: failed to derive client ip");
                }
                return ControlFlow::Break(internal_error());
            }
        };

        let decision = match self.service.check(ip) {
            Ok(decision) => decision,
            Err(e) => {
                if self.log_events {
                    tracing::error!(ip = %ip, error = %e, "geoip: unexpected lookup error");
                }
                return ControlFlow::Break(internal_error());
            }
        };

        if !decision.allowed {
            if self.log_events {
                tracing::warn!(
                    ip = %ip,
                    country = decision.country_code(),
                    "geoip: blocking ip address"
                );
            }
            return ControlFlow::Break(self.block_handler.respond(req, &decision));
        }

        ControlFlow::Continue(())
    }
}

fn internal_error() -> Response {
    let status = StatusCode::INTERNAL_SERVER_ERROR;
    let text = status.canonical_reason().unwrap_or_default();
    (status, text).into_response()
}

/// axum middleware function; use with `middleware::from_fn_with_state`.
pub async fn filter_ip(State(filter): State<Arc<IpFilter>>, req: Request, next: Next) -> Response {
    match filter.screen(&req) {
        ControlFlow::Continue(()) => next.run(req).await,
        ControlFlow::Break(response) => response,
    }
}

/// Wrap every route of a router with the geo filter.
pub fn with_geo_filter<S>(router: Router<S>, filter: Arc<IpFilter>) -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    router.layer(middleware::from_fn_with_state(filter, filter_ip))
}
