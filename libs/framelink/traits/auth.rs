use async_trait::async_trait;

/// Trait for supplying the bearer token sent in the socket handshake
///
/// Immediately after a stream socket opens (or reopens after a reconnect),
/// the client sends one text frame `{"token": <bearer-token>}`. Implement
/// this trait to control where that token comes from; the dashboard wires
/// in whatever session storage it uses.
#[async_trait]
pub trait TokenProvider: Send + Sync {
    /// Get the current bearer token, if any
    ///
    /// Returning `None` still sends the handshake frame, with a null token,
    /// and leaves rejection to the server.
    async fn token(&self) -> Option<String>;
}

/// Token provider backed by a fixed string
pub struct StaticToken(String);

impl StaticToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }
}

#[async_trait]
impl TokenProvider for StaticToken {
    async fn token(&self) -> Option<String> {
        Some(self.0.clone())
    }
}

/// Token provider for unauthenticated streams
pub struct NoToken;

#[async_trait]
impl TokenProvider for NoToken {
    async fn token(&self) -> Option<String> {
        None
    }
}
