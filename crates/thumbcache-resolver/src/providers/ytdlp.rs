//! Secondary playback provider: shell out to `yt-dlp --dump-json` and
//! parse its single-line JSON summary. Used only when the primary
//! Innertube provider is disabled or fails transiently.

use std::process::Stdio;
use std::time::Duration;

use serde_json::Value;
use thumbcache_models::{PlaybackUrl, VideoId};
use tokio::process::Command;

use crate::error::{ResolverError, ResolverResult};

const DUMP_JSON_TIMEOUT: Duration = Duration::from_secs(20);

pub async fn resolve(
    video_id: &VideoId,
    proxy_url: Option<&str>,
    default_max_height: u32,
) -> ResolverResult<PlaybackUrl> {
    let binary = which::which("yt-dlp")
        .map_err(|e| ResolverError::Transient(format!("yt-dlp not found: {e}")))?;

    let video_url = format!("https://www.youtube.com/watch?v={video_id}");
    let format_selector = format!("best[height<={default_max_height}]");

    let mut command = Command::new(binary);
    command
        .arg("--dump-json")
        .arg("--no-warnings")
        .arg("-f")
        .arg(&format_selector)
        .arg(&video_url)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());

    if let Some(proxy_url) = proxy_url {
        command.arg("--proxy").arg(proxy_url);
    }

    let mut child = command.spawn()?;

    let output = tokio::time::timeout(DUMP_JSON_TIMEOUT, child.wait_with_output())
        .await
        .map_err(|_| ResolverError::Transient("yt-dlp --dump-json timed out".to_string()))??;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(ResolverError::Transient(format!(
            "yt-dlp exited with {}: {stderr}",
            output.status
        )));
    }

    let data: Value = serde_json::from_slice(&output.stdout)?;
    parse_dump_json(&data)
}

fn parse_dump_json(data: &Value) -> ResolverResult<PlaybackUrl> {
    let url = data["url"]
        .as_str()
        .ok_or_else(|| ResolverError::Transient("yt-dlp output missing url".to_string()))?
        .to_string();
    let fps = data["fps"].as_f64().unwrap_or(30.0);
    let is_live = data["is_live"].as_bool().unwrap_or(false);
    Ok(PlaybackUrl { url, fps, is_live })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_a_minimal_dump_json_payload() {
        let data = serde_json::json!({
            "url": "https://example.com/video.mp4",
            "fps": 60.0,
            "is_live": false,
        });
        let playback = parse_dump_json(&data).unwrap();
        assert_eq!(playback.url, "https://example.com/video.mp4");
        assert_eq!(playback.fps, 60.0);
        assert!(!playback.is_live);
    }

    #[test]
    fn missing_url_is_a_transient_error() {
        let data = serde_json::json!({ "fps": 30.0 });
        assert!(parse_dump_json(&data).is_err());
    }
}
