use crate::domain::ports::TokenProvider;
use async_trait::async_trait;
use std::future::Future;
use std::sync::{Arc, PoisonError, RwLock};

/// Always yields the same token (or none).
#[derive(Debug, Clone, Default)]
pub struct StaticToken(Option<String>);

impl StaticToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(Some(token.into()))
    }

    pub fn none() -> Self {
        Self(None)
    }
}

#[async_trait]
impl TokenProvider for StaticToken {
    async fn token(&self) -> Option<String> {
        self.0.clone()
    }
}

/// Wraps an async closure, e.g. a call into the identity provider's SDK.
pub struct FnTokenProvider<F> {
    f: F,
}

impl<F, Fut> FnTokenProvider<F>
where
    F: Fn() -> Fut + Send + Sync,
    Fut: Future<Output = Option<String>> + Send + 'static,
{
    pub fn new(f: F) -> Self {
        Self { f }
    }
}

#[async_trait]
impl<F, Fut> TokenProvider for FnTokenProvider<F>
where
    F: Fn() -> Fut + Send + Sync,
    Fut: Future<Output = Option<String>> + Send + 'static,
{
    async fn token(&self) -> Option<String> {
        (self.f)().await
    }
}

/// Session token lookup for the page.
///
/// When an issuer is installed its answer is final, even if it has no token.
/// Without one, the token last stored by the sign-in flow is used.
#[derive(Clone, Default)]
pub struct SessionTokenProvider {
    issuer: Option<Arc<dyn TokenProvider>>,
    current: Arc<RwLock<Option<String>>>,
}

impl SessionTokenProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_issuer(issuer: Arc<dyn TokenProvider>) -> Self {
        Self {
            issuer: Some(issuer),
            current: Arc::default(),
        }
    }

    pub fn set_current(&self, token: impl Into<String>) {
        *self.current.write().unwrap_or_else(PoisonError::into_inner) = Some(token.into());
    }

    pub fn clear(&self) {
        *self.current.write().unwrap_or_else(PoisonError::into_inner) = None;
    }

    fn current(&self) -> Option<String> {
        self.current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[async_trait]
impl TokenProvider for SessionTokenProvider {
    async fn token(&self) -> Option<String> {
        match &self.issuer {
            Some(issuer) => issuer.token().await,
            None => self.current(),
        }
    }
}
