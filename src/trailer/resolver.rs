use super::{MediaType, Resolution, ResolvedTrailer, Site, VideoDescriptor, VideoType};

const YOUTUBE_EMBED_BASE: &str = "https://www.youtube-nocookie.com/embed";
const VIMEO_PLAYER_BASE: &str = "https://player.vimeo.com/video";

type Tier = fn(&VideoDescriptor) -> bool;

// Strict priority, first tier with a candidate wins.
const TIERS: [Tier; 5] = [
    official_youtube_trailer,
    youtube_trailer,
    youtube_teaser,
    any_youtube,
    any_vimeo,
];

fn official_youtube_trailer(video: &VideoDescriptor) -> bool {
    youtube_trailer(video) && video.official
}

fn youtube_trailer(video: &VideoDescriptor) -> bool {
    video.video_type == VideoType::Trailer && video.site == Site::YouTube
}

fn youtube_teaser(video: &VideoDescriptor) -> bool {
    video.video_type == VideoType::Teaser && video.site == Site::YouTube
}

fn any_youtube(video: &VideoDescriptor) -> bool {
    video.site == Site::YouTube
}

fn any_vimeo(video: &VideoDescriptor) -> bool {
    video.site == Site::Vimeo
}

/// Picks the best candidate from `videos`, or `None` when nothing is playable.
///
/// Inside a tier the most recently published video wins. Undated videos lose
/// to dated ones, and equal dates (including "both undated") keep the order
/// TMDB returned.
pub fn select(videos: &[VideoDescriptor]) -> Option<&VideoDescriptor> {
    TIERS
        .iter()
        .find_map(|tier| newest(videos.iter().filter(|video| tier(video))))
}

fn newest<'a>(candidates: impl Iterator<Item = &'a VideoDescriptor>) -> Option<&'a VideoDescriptor> {
    candidates.fold(None, |best, candidate| match best {
        Some(current) if candidate.published_at <= current.published_at => Some(current),
        _ => Some(candidate),
    })
}

pub fn youtube_embed_url(key: &str) -> String {
    format!("{YOUTUBE_EMBED_BASE}/{key}?rel=0&modestbranding=1")
}

pub fn vimeo_player_url(key: &str) -> String {
    format!("{VIMEO_PLAYER_BASE}/{key}")
}

/// Playable URL for a video. Total over every [`Site`].
pub fn embed_url(site: &Site, key: &str) -> String {
    match site {
        Site::YouTube => youtube_embed_url(key),
        Site::Vimeo => vimeo_player_url(key),
        Site::Other(_) => format!("{YOUTUBE_EMBED_BASE}/{key}"),
    }
}

/// Runs the selection policy and shapes the winner for the frontend.
pub fn resolve(media_type: MediaType, videos: &[VideoDescriptor]) -> Resolution {
    match select(videos) {
        Some(video) => Resolution::Found(ResolvedTrailer {
            media_type,
            video_type: video.video_type.label().to_string(),
            video_name: video.name.clone(),
            url: embed_url(&video.site, &video.key),
            is_official: video.official,
            site: video.site.label().to_string(),
            published_at: video.published_at,
        }),
        None => Resolution::NotFound,
    }
}
