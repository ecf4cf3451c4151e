//! # iWonder
//!
//! Backend core of a Q&A forum: the session/credential lifecycle and the
//! keyset pagination codec shared by every listing endpoint.
//!
//! ## Sessions
//!
//! A login yields a short-lived HS256 access token (10 minutes) and a
//! long-lived opaque refresh token (7 days, 256 bits of entropy, hex). Refresh
//! tokens are persisted and reused until they expire; they are never rotated.
//! Every protected request passes the [`auth::AuthGate`], which also checks
//! that the token's user still exists.
//!
//! ## Pagination
//!
//! Listings page newest-first on `created_at`. Continuation cursors are JSON
//! wrapped in base64 and are untrusted on the way back in; see [`pagination`].

pub mod api;
pub mod auth;
pub mod cli;
pub mod pagination;

#[allow(clippy::doc_markdown, clippy::needless_raw_string_hashes)]
pub mod built_info {
    include!(concat!(env!("OUT_DIR"), "/built.rs"));
}

pub const GIT_COMMIT_HASH: &str = match built_info::GIT_COMMIT_HASH {
    Some(hash) => hash,
    None => "unknown",
};
