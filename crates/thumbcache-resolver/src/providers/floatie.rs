//! Primary playback provider ("floatie"): a direct Innertube `player`
//! request, with signature decryption handled by the signing-helper
//! subprocess rather than embedded JS execution.

use std::time::Duration;

use serde_json::{json, Value};
use thumbcache_models::{PlaybackUrl, VideoId};
use url::Url;

use crate::error::{ResolverError, ResolverResult};
use crate::signing_helper::SigningHelperClient;

const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
    (KHTML, like Gecko) Chrome/125.0.0.0 Safari/537.36";
const CLIENT_VERSION: &str = "2.20240808.00.00";
const INNERTUBE_URL: &str = "https://www.youtube.com/youtubei/v1/player?prettyPrint=false";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

pub struct FloatieConfig {
    pub visitor_data: Option<String>,
    pub po_token: Option<String>,
    pub max_player_age: Duration,
    pub default_max_height: u32,
}

fn build_context(visitor_data: Option<&str>) -> Value {
    let mut client = json!({
        "browserName": "Chrome",
        "browserVersion": "125.0.0.0",
        "clientName": "WEB",
        "clientVersion": CLIENT_VERSION,
        "osName": "Windows",
        "osVersion": "10.0",
        "platform": "DESKTOP",
        "hl": "en",
        "gl": "US",
        "userAgent": USER_AGENT,
    });
    if let Some(visitor_data) = visitor_data {
        client["visitorData"] = json!(visitor_data.replace('=', "%3D"));
    }
    json!({ "client": client })
}

pub async fn resolve(
    http: &reqwest::Client,
    helper: &mut SigningHelperClient,
    config: &FloatieConfig,
    video_id: &VideoId,
    proxy_url: Option<&str>,
) -> ResolverResult<PlaybackUrl> {
    helper.update_if_stale(config.max_player_age).await?;
    let signature_timestamp = helper.signature_timestamp().await?.unwrap_or(0);

    let visitor_data = config.visitor_data.as_deref();
    let mut payload = json!({
        "context": build_context(visitor_data),
        "videoId": video_id.as_str(),
        "playbackContext": {
            "contentPlaybackContext": {
                "html5Preference": "HTML5_PREF_WANTS",
                "signatureTimestamp": signature_timestamp,
            }
        },
        "contentCheckOk": true,
        "racyCheckOk": true,
        "params": "2AMB",
    });

    let mut request = http
        .post(INNERTUBE_URL)
        .timeout(REQUEST_TIMEOUT)
        .header("X-Youtube-Client-Name", "1")
        .header("X-Youtube-Client-Version", CLIENT_VERSION)
        .header("Origin", "https://www.youtube.com")
        .header("User-Agent", USER_AGENT)
        .header("Accept", "*/*")
        .header("Accept-Language", "en-us,en;q=0.5");

    if let Some(visitor_data) = visitor_data {
        request = request.header("X-Goog-Visitor-Id", visitor_data.replace('=', "%3D"));
        payload["serviceIntegrityDimensions"] = json!({ "poToken": config.po_token });
    }
    if let Some(proxy_url) = proxy_url {
        request = request.proxy(reqwest::Proxy::all(proxy_url)?);
    }

    let response = request.json(&payload).send().await?;
    if !response.status().is_success() {
        return Err(ResolverError::Transient(format!(
            "innertube responded with status {}",
            response.status()
        )));
    }
    let data: Value = response.json().await?;
    parse_player_response(&data, helper, config, video_id).await
}

async fn parse_player_response(
    data: &Value,
    helper: &mut SigningHelperClient,
    config: &FloatieConfig,
    video_id: &VideoId,
) -> ResolverResult<PlaybackUrl> {
    let playability_status = data["playabilityStatus"]["status"]
        .as_str()
        .ok_or_else(|| ResolverError::Transient("missing playabilityStatus".to_string()))?;

    if playability_status != "OK" {
        let reason = data["playabilityStatus"]["reason"]
            .as_str()
            .unwrap_or("no reason given");
        return if playability_status == "LOGIN_REQUIRED" {
            Err(ResolverError::LoginRequired(reason.to_string()))
        } else {
            Err(ResolverError::Playability(format!(
                "{playability_status}: {reason}"
            )))
        };
    }

    let returned_id = data["videoDetails"]["videoId"].as_str().unwrap_or("");
    if returned_id != video_id.as_str() {
        return Err(ResolverError::Transient(format!(
            "innertube returned wrong video id: {returned_id} vs. {video_id}"
        )));
    }

    let is_live = data["videoDetails"]["isLive"].as_bool().unwrap_or(false);
    let formats = data["streamingData"]["adaptiveFormats"]
        .as_array()
        .ok_or_else(|| ResolverError::Transient("no adaptive formats in response".to_string()))?;

    let mut best: Option<(u32, Value)> = None;
    for format in formats {
        let Some(mime) = format["mimeType"].as_str() else {
            continue;
        };
        if !mime.starts_with("video/") {
            continue;
        }
        let height = format["height"].as_u64().unwrap_or(0) as u32;
        if height > config.default_max_height {
            continue;
        }
        let better = match &best {
            Some((best_height, _)) => height > *best_height,
            None => true,
        };
        if better {
            best = Some((height, format.clone()));
        }
    }

    let (_, chosen) = best.ok_or_else(|| {
        ResolverError::Playability("no suitable adaptive format under max height".to_string())
    })?;

    let fps = chosen["fps"].as_f64().unwrap_or(30.0);
    let url = resolve_format_url(&chosen, helper, config).await?;

    Ok(PlaybackUrl { url, fps, is_live })
}

async fn resolve_format_url(
    format: &Value,
    helper: &mut SigningHelperClient,
    config: &FloatieConfig,
) -> ResolverResult<String> {
    let mut url = if let Some(cipher) = format["signatureCipher"].as_str() {
        let params = parse_query_string(cipher);
        let raw_url = params
            .get("url")
            .ok_or_else(|| ResolverError::Transient("signatureCipher missing url".to_string()))?;
        let sig_param = params
            .get("sp")
            .cloned()
            .unwrap_or_else(|| "signature".to_string());
        let sig = params
            .get("s")
            .ok_or_else(|| ResolverError::Transient("signatureCipher missing s".to_string()))?;

        let decrypted = helper.decrypt_sig(sig).await?;
        let mut parsed = Url::parse(raw_url)
            .map_err(|e| ResolverError::Transient(format!("bad signatureCipher url: {e}")))?;
        parsed
            .query_pairs_mut()
            .append_pair(&sig_param, &decrypted);
        parsed
    } else if let Some(raw_url) = format["url"].as_str() {
        Url::parse(raw_url).map_err(|e| ResolverError::Transient(format!("bad format url: {e}")))?
    } else {
        return Err(ResolverError::Transient(
            "format had neither url nor signatureCipher".to_string(),
        ));
    };

    if let Some(po_token) = &config.po_token {
        url.query_pairs_mut().append_pair("pot", po_token);
    }

    if let Some(n) = query_value(&url, "n") {
        let decrypted_n = helper.decrypt_nsig(&n).await?;
        replace_query_param(&mut url, "n", &decrypted_n);
    }

    Ok(url.to_string())
}

fn parse_query_string(raw: &str) -> std::collections::HashMap<String, String> {
    url::form_urlencoded::parse(raw.as_bytes())
        .into_owned()
        .collect()
}

fn query_value(url: &Url, key: &str) -> Option<String> {
    url.query_pairs()
        .find(|(k, _)| k == key)
        .map(|(_, v)| v.into_owned())
}

fn replace_query_param(url: &mut Url, key: &str, value: &str) {
    let pairs: Vec<(String, String)> = url
        .query_pairs()
        .map(|(k, v)| {
            if k == key {
                (k.into_owned(), value.to_string())
            } else {
                (k.into_owned(), v.into_owned())
            }
        })
        .collect();
    let mut query = url.query_pairs_mut();
    query.clear();
    for (k, v) in pairs {
        query.append_pair(&k, &v);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_signature_cipher_query_string() {
        let params = parse_query_string("s=abc123&sp=sig&url=https%3A%2F%2Fexample.com%2Fv");
        assert_eq!(params.get("s").unwrap(), "abc123");
        assert_eq!(params.get("sp").unwrap(), "sig");
        assert_eq!(params.get("url").unwrap(), "https://example.com/v");
    }
}
