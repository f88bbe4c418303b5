//! Encrypting object storage client for Sealstore.
//!
//! Wraps an S3-compatible store with the envelope encryption core:
//! - PUT: wrap a fresh data key, encrypt the body with AES-256-GCM, merge
//!   the envelope into the object's user metadata, upload ciphertext.
//! - GET: parse the envelope, unwrap the data key, authenticate and
//!   decrypt the body.
//!
//! Reading objects written by older clients (CBC/CTR content, legacy key
//! wraps) requires the explicit legacy opt-in in [`ClientConfig`].

pub mod client;
pub mod config;
pub mod error;
pub mod store;

pub use client::{
    GetObjectOutput, GetObjectRequest, PutObjectOutput, PutObjectRequest, SealstoreClient,
};
pub use config::ClientConfig;
pub use error::{ClientError, ClientResult};
pub use store::{ByteRange, ObjectStore, S3ObjectStore, StoredObject};
