use crate::common::error::{DeepSeaError, Result};
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use walkdir::WalkDir;

/// Suffixes ffmpeg-based processors accept.
const VIDEO_SUFFIXES: &[&str] = &["mov", "avi", "mp4", "mpg", "mpeg", "m4v", "wmv", "mkv"];

fn is_candidate(path: &Path, excludes: &[String]) -> bool {
    let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
        return false;
    };
    // macOS resource forks
    if name.contains("._") {
        return false;
    }
    if excludes.iter().any(|e| name.contains(e.as_str())) {
        return false;
    }
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| VIDEO_SUFFIXES.contains(&e.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}

/// Collects videos under `input` (recursively) or `input` itself when it is a file.
pub fn find_videos(input: &Path, excludes: &[String]) -> Result<Vec<PathBuf>> {
    if excludes.is_empty() {
        info!("No video file exclusions specified");
    } else {
        info!("Excluding any video file that contains {:?}", excludes);
    }

    let mut videos = Vec::new();
    if input.is_dir() {
        for entry in WalkDir::new(input).follow_links(false) {
            let entry = entry.map_err(|e| DeepSeaError::Io(e.into()))?;
            if entry.file_type().is_file() && is_candidate(entry.path(), excludes) {
                videos.push(entry.into_path());
            }
        }
    } else if input.is_file() && is_candidate(input, excludes) {
        videos.push(input.to_path_buf());
    }
    videos.sort();

    info!("Found {} videos to process", videos.len());
    if videos.is_empty() {
        warn!("No videos found in {}", input.display());
        return Err(DeepSeaError::NoVideos(input.display().to_string()));
    }
    Ok(videos)
}
