//! The reverse-chronological, paginated feed.

use std::sync::Arc;

use domains::{PageRequest, Pagination, PostRepository, Result, TimelinePage};

pub struct TimelineService {
    repo: Arc<dyn PostRepository>,
    default_page_size: u32,
}

impl TimelineService {
    pub fn new(repo: Arc<dyn PostRepository>, default_page_size: u32) -> Self {
        Self {
            repo,
            default_page_size,
        }
    }

    /// Lenient parsing of raw `page` / `limit` query values.
    pub fn page_request(&self, page: Option<&str>, limit: Option<&str>) -> PageRequest {
        PageRequest::from_query(page, limit, self.default_page_size)
    }

    /// Pages past the end come back empty with consistent metadata.
    #[tracing::instrument(skip(self), fields(page = request.page(), limit = request.limit()))]
    pub async fn get_timeline(&self, request: PageRequest) -> Result<TimelinePage> {
        let posts = self.repo.find_page(request.limit(), request.offset()).await?;
        let total_posts = self.repo.count().await?;
        let pagination = Pagination::compute(request, total_posts);

        tracing::debug!(returned = posts.len(), total_posts, "timeline page served");
        Ok(TimelinePage { posts, pagination })
    }
}
