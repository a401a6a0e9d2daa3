//! Sample feed content for local development.

use chrono::{DateTime, Duration, Utc};
use domains::{Post, PostDraft, PostRepository};

const USERNAMES: [&str; 20] = [
    "sarah_explores", "adventure_mike", "cityscape_lens", "nature_lover_23",
    "foodie_dreams", "travel_diaries", "urban_photographer", "coffee_chronicles",
    "mountain_seeker", "beach_vibes_only", "artsy_captures", "sunset_chaser",
    "street_stories", "wanderlust_sam", "local_flavors", "hidden_gems_finder",
    "morning_rituals", "weekend_warrior", "creative_shots", "life_moments",
];

const CAPTIONS: [&str; 20] = [
    "Golden hour hits different when you're chasing dreams ✨",
    "Found this hidden café and my soul is happy ☕️",
    "Sometimes the best adventures are in your own backyard 🏡",
    "Sunset therapy session complete 🌅",
    "Local markets always tell the best stories 📚",
    "When nature becomes your art gallery 🎨",
    "Coffee and contemplation - perfect Monday mood ☕️",
    "Street art that speaks to the heart ❤️",
    "Fresh ingredients, fresh perspective 🥬",
    "Urban exploration at its finest 🏙️",
    "Slow mornings are the best mornings ⏰",
    "Capturing light, capturing life 📸",
    "Weekend vibes in full effect 🎉",
    "Simple moments, profound beauty 🌸",
    "Architecture that takes your breath away 🏗️",
    "Food that tastes like home 🏠",
    "When the city sleeps, the magic awakens 🌙",
    "Nature's masterpiece never disappoints 🍃",
    "Finding peace in busy places 🧘‍♀️",
    "Every corner has a story to tell 📖",
];

const PHOTO_IDS: [&str; 20] = [
    "1506905925346-21bda4d32df4", "1441986300917-64674bd600d8", "1429552077091-836152271555",
    "1470071459604-3b5ec3a7fe05", "1414235077428-338989a2e8c0", "1506905925346-21bda4d32df4",
    "1551024506-0bccd828d307", "1543418219-44e4c1ad84a5", "1476514525535-07fb3b4ae5f1",
    "1493770348161-369560ae357d", "1447752875215-b2761acb3c5d", "1518837695005-2083093ee35b",
    "1465146344425-f00d5f5c8f07", "1519904981063-b0cf448d479e", "1513475382585-d06e58bcb0e0",
    "1494522358652-f30e61a60313", "1498307833015-e7b400441eb8", "1472214103451-9374bd1c798e",
    "1506905925346-21bda4d32df4", "1520637836862-4d197d17c726",
];

/// Creation times spread over the past year. Deterministic so repeated seeds
/// produce the same feed shape.
fn posted_at(i: usize, now: DateTime<Utc>) -> DateTime<Utc> {
    let i = i as i64;
    now - Duration::days((i * 37 + 11) % 365)
        - Duration::hours((i * 7) % 24)
        - Duration::minutes((i * 13) % 60)
}

/// Inserts the sample posts and gives each a few shares. Likes stay at zero:
/// there are no real callers to attribute them to.
pub async fn run(repo: &dyn PostRepository, now: DateTime<Utc>) -> anyhow::Result<Vec<Post>> {
    let mut inserted = Vec::with_capacity(USERNAMES.len());
    for (i, ((username, caption), photo)) in USERNAMES.iter().zip(CAPTIONS).zip(PHOTO_IDS).enumerate() {
        let image_url = format!("https://images.unsplash.com/photo-{photo}?w=800&h=800&fit=crop");
        let draft = PostDraft::new(username, caption, &image_url, posted_at(i, now))?;
        let mut post = repo.insert(draft).await?;

        for _ in 0..(i * 7) % 50 {
            if let Some(count) = repo.apply_share_increment(post.id, now).await? {
                post.share_count = count;
                post.updated_at = now;
            }
        }
        inserted.push(post);
    }

    tracing::info!(posts = inserted.len(), "seeded sample feed");
    Ok(inserted)
}
