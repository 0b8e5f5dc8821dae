#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Entity-tag digest computation for tagsweep
//!
//! Reproduces the digests an S3-compatible backend records as entity tags:
//! a plain MD5 over the content for whole-object uploads, and the composite
//! scheme for multipart uploads (MD5 per part, MD5 over the concatenated
//! raw part digests, `-<part_count>` suffix). Content is always streamed;
//! objects are never buffered whole.

mod etag;
mod layout;

pub use etag::{compute_digest, md5_hex, CHUNK_SIZE};
pub use layout::{resolve_layout, DigestSpec};
