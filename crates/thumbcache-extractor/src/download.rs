//! Livestream branch helper (§4.D step 5): download a media segment over
//! HTTP with a hard 5-second timeout, writing it to a caller-supplied
//! path. Local decoding of the downloaded file is then the frame
//! extractor's job, invoked on the temp path instead of a remote URL.

use std::path::Path;
use std::time::Duration;

use crate::error::ExtractorResult;

const DOWNLOAD_TIMEOUT: Duration = Duration::from_secs(5);

pub async fn download_segment(
    http: &reqwest::Client,
    url: &str,
    proxy_url: Option<&str>,
    destination: &Path,
) -> ExtractorResult<()> {
    let mut request = http.get(url).timeout(DOWNLOAD_TIMEOUT);
    if let Some(proxy_url) = proxy_url {
        request = request.proxy(reqwest::Proxy::all(proxy_url)?);
    }

    let response = request.send().await?.error_for_status()?;
    let bytes = response.bytes().await?;
    tokio::fs::write(destination, &bytes).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn writes_response_body_to_destination() {
        let server = httptest_stub::serve(b"fake segment bytes").await;
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("segment.ts");

        let http = reqwest::Client::new();
        download_segment(&http, &server.url(), None, &dest)
            .await
            .unwrap();

        let written = std::fs::read(&dest).unwrap();
        assert_eq!(written, b"fake segment bytes");
        server.shutdown().await;
    }

    /// Minimal loopback HTTP server so this crate doesn't need a wiremock
    /// dependency just for one download test.
    mod httptest_stub {
        use tokio::io::{AsyncReadExt, AsyncWriteExt};
        use tokio::net::TcpListener;

        pub struct Server {
            addr: std::net::SocketAddr,
            handle: tokio::task::JoinHandle<()>,
        }

        impl Server {
            pub fn url(&self) -> String {
                format!("http://{}/segment", self.addr)
            }

            pub async fn shutdown(self) {
                self.handle.abort();
            }
        }

        pub async fn serve(body: &'static [u8]) -> Server {
            let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
            let addr = listener.local_addr().unwrap();
            let handle = tokio::spawn(async move {
                loop {
                    let Ok((mut socket, _)) = listener.accept().await else {
                        return;
                    };
                    let mut buf = [0u8; 1024];
                    let _ = socket.read(&mut buf).await;
                    let response = format!(
                        "HTTP/1.1 200 OK\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
                        body.len()
                    );
                    let _ = socket.write_all(response.as_bytes()).await;
                    let _ = socket.write_all(body).await;
                    let _ = socket.shutdown().await;
                }
            });
            Server { addr, handle }
        }
    }
}
