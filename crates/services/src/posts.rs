//! Post creation and lookup.

use std::sync::Arc;

use bytes::Bytes;
use domains::{
    validation, AppError, BlobMetadata, BlobStore, Clock, Post, PostDraft, PostRepository, Result,
};
use uuid::Uuid;

/// Raw image as received from the uploader.
#[derive(Debug, Clone)]
pub struct ImageUpload {
    pub bytes: Bytes,
    pub content_type: Option<mime::Mime>,
    pub filename: Option<String>,
}

#[derive(Debug, Clone)]
pub struct CreatePostInput {
    pub username: String,
    pub caption: String,
    pub image: ImageUpload,
}

pub struct PostService {
    repo: Arc<dyn PostRepository>,
    blobs: Arc<dyn BlobStore>,
    clock: Arc<dyn Clock>,
}

impl PostService {
    pub fn new(repo: Arc<dyn PostRepository>, blobs: Arc<dyn BlobStore>, clock: Arc<dyn Clock>) -> Self {
        Self { repo, blobs, clock }
    }

    /// Validates the text fields, stores the image, then writes the post.
    ///
    /// The image is durable before the post exists, so a failure at any step
    /// never leaves a post without an image.
    #[tracing::instrument(skip(self, input), fields(username = %input.username))]
    pub async fn create_post(&self, input: CreatePostInput) -> Result<Post> {
        // Rejected text never reaches the blob store.
        validation::username(&input.username)?;
        validation::caption(&input.caption)?;

        let meta = BlobMetadata {
            content_type: input.image.content_type,
            filename: input.image.filename,
        };
        let image_url = self.blobs.store(input.image.bytes, &meta).await.map_err(|e| {
            tracing::warn!(error = %e, "image upload rejected");
            e
        })?;

        let draft = PostDraft::new(&input.username, &input.caption, &image_url, self.clock.now())?;
        let post = self.repo.insert(draft).await?;

        tracing::info!(post_id = %post.id, "post created");
        Ok(post)
    }

    #[tracing::instrument(skip(self))]
    pub async fn get_post(&self, id: Uuid) -> Result<Post> {
        self.repo.find_by_id(id).await?.ok_or(AppError::NotFound(id))
    }
}
