//! # storage-adapters
//!
//! Concrete implementations of the `domains` ports.
//!
//! | Port             | Always compiled            | Feature-gated                    |
//! |------------------|----------------------------|----------------------------------|
//! | `PostRepository` | [`InMemoryPostRepository`] | `PgPostRepository` (db-postgres) |
//! | `BlobStore`      | [`LocalBlobStore`]         | `S3BlobStore` (media-s3)         |

pub mod image_pipeline;
pub mod media_local;
pub mod memory;

#[cfg(feature = "media-s3")]
pub mod media_s3;
#[cfg(feature = "db-postgres")]
pub mod postgres;

pub use image_pipeline::ImagePolicy;
pub use media_local::LocalBlobStore;
pub use memory::InMemoryPostRepository;

#[cfg(feature = "media-s3")]
pub use media_s3::{S3BlobStore, S3Settings};
#[cfg(feature = "db-postgres")]
pub use postgres::PgPostRepository;
