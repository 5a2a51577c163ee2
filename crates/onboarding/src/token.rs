//! Gateway access token generation.

use std::sync::Arc;

use rand::RngCore;

/// Random bytes per token. Rendered as twice as many hex characters.
pub const TOKEN_BYTES: usize = 24;

/// Length of a generated token string.
pub const TOKEN_LEN: usize = TOKEN_BYTES * 2;

/// Source of secure random bytes. Swappable so tests can be deterministic.
pub trait RandomSource: Send + Sync {
    fn fill(&self, buf: &mut [u8]);
}

/// Thread-local ChaCha CSPRNG seeded from the OS.
#[derive(Debug, Clone, Copy, Default)]
pub struct ThreadRngSource;

impl RandomSource for ThreadRngSource {
    fn fill(&self, buf: &mut [u8]) {
        rand::rng().fill_bytes(buf);
    }
}

/// Produces opaque lowercase-hex gateway tokens.
#[derive(Clone)]
pub struct TokenGenerator {
    source: Arc<dyn RandomSource>,
}

impl Default for TokenGenerator {
    fn default() -> Self {
        Self::new(Arc::new(ThreadRngSource))
    }
}

impl std::fmt::Debug for TokenGenerator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenGenerator").finish_non_exhaustive()
    }
}

impl TokenGenerator {
    pub fn new(source: Arc<dyn RandomSource>) -> Self {
        Self { source }
    }

    /// A fresh token. Each call replaces, never derives from, the previous one.
    pub fn generate(&self) -> String {
        let mut bytes = [0_u8; TOKEN_BYTES];
        self.source.fill(&mut bytes);
        let mut out = String::with_capacity(TOKEN_LEN);
        const HEX: &[u8; 16] = b"0123456789abcdef";
        for b in bytes {
            out.push(HEX[(b >> 4) as usize] as char);
            out.push(HEX[(b & 0x0f) as usize] as char);
        }
        out
    }
}

/// Whether `token` has the shape [`TokenGenerator::generate`] produces.
pub fn is_well_formed(token: &str) -> bool {
    token.len() == TOKEN_LEN && token.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'))
}
