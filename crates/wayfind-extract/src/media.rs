//! Turns a media reference into a request part: platform URLs go by
//! reference, direct media files are downloaded and inlined.

use std::path::PathBuf;
use std::time::Duration;

use base64::Engine;
use tempfile::NamedTempFile;
use tokio::io::AsyncWriteExt;
use wayfind_core::{MediaKind, MediaRef};

use crate::error::ExtractionError;
use crate::gemini::{Blob, FileRef, Part};

const DEFAULT_MIME: &str = "video/mp4";

pub(crate) struct MediaLoader {
    http: reqwest::Client,
    max_bytes: u64,
    temp_dir: Option<PathBuf>,
}

impl MediaLoader {
    pub(crate) fn new(timeout_secs: u64, max_bytes: u64) -> Result<Self, ExtractionError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()?;
        Ok(Self {
            http,
            max_bytes,
            temp_dir: None,
        })
    }

    #[cfg(test)]
    fn with_temp_dir(mut self, dir: PathBuf) -> Self {
        self.temp_dir = Some(dir);
        self
    }

    pub(crate) async fn to_part(&self, media: &MediaRef) -> Result<Part, ExtractionError> {
        match media.kind {
            MediaKind::PlatformUrl => Ok(Part::FileData(FileRef {
                mime_type: None,
                file_uri: media.url.clone(),
            })),
            MediaKind::DirectUrl => self.download_inline(&media.url).await,
        }
    }

    fn temp_file(&self) -> std::io::Result<NamedTempFile> {
        match &self.temp_dir {
            Some(dir) => NamedTempFile::new_in(dir),
            None => NamedTempFile::new(),
        }
    }

    /// Download into a scoped temp file (removed when it drops, on every
    /// return path) and inline it as base64.
    async fn download_inline(&self, url: &str) -> Result<Part, ExtractionError> {
        let mut response = self.http.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ExtractionError::media(url, format!("HTTP {status}")));
        }

        let mime = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.split(';').next())
            .map(|v| v.trim().to_ascii_lowercase())
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| DEFAULT_MIME.to_owned());
        let mime = match mime.as_str() {
            "application/octet-stream" | "binary/octet-stream" => DEFAULT_MIME.to_owned(),
            m if m.starts_with("video/") || m.starts_with("image/") => mime,
            other => {
                return Err(ExtractionError::media(
                    url,
                    format!("not a media file ({other})"),
                ))
            }
        };

        if let Some(len) = response.content_length() {
            if len > self.max_bytes {
                return Err(ExtractionError::media(
                    url,
                    format!("{len} bytes exceeds the {} byte cap", self.max_bytes),
                ));
            }
        }

        // `out` is a second handle; dropping `file` deletes the path.
        let file = self.temp_file()?;
        let mut out = tokio::fs::File::from_std(file.reopen()?);
        let mut written: u64 = 0;
        while let Some(chunk) = response.chunk().await? {
            written += chunk.len() as u64;
            if written > self.max_bytes {
                return Err(ExtractionError::media(
                    url,
                    format!("download exceeds the {} byte cap", self.max_bytes),
                ));
            }
            out.write_all(&chunk).await?;
        }
        out.flush().await?;
        drop(out);

        let bytes = tokio::fs::read(file.path()).await?;
        tracing::debug!(url, bytes = bytes.len(), mime = %mime, "media downloaded");

        Ok(Part::InlineData(Blob {
            mime_type: mime,
            data: base64::engine::general_purpose::STANDARD.encode(bytes),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wayfind_core::Platform;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn direct(url: String) -> MediaRef {
        MediaRef {
            platform: Platform::Instagram,
            url,
            kind: MediaKind::DirectUrl,
        }
    }

    fn dir_is_empty(dir: &std::path::Path) -> bool {
        std::fs::read_dir(dir).expect("read dir").next().is_none()
    }

    #[tokio::test]
    async fn platform_url_is_passed_by_reference() {
        let loader = MediaLoader::new(5, 1024).expect("loader");
        let media = MediaRef {
            platform: Platform::Youtube,
            url: "https://www.youtube.com/watch?v=dQw4w9WgXcQ".to_owned(),
            kind: MediaKind::PlatformUrl,
        };
        match loader.to_part(&media).await.expect("part") {
            Part::FileData(file) => assert_eq!(file.file_uri, media.url),
            other => panic!("unexpected part {other:?}"),
        }
    }

    #[tokio::test]
    async fn direct_media_is_inlined_and_temp_file_removed() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/clip.mp4"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("content-type", "video/mp4")
                    .set_body_bytes(b"fake-video".to_vec()),
            )
            .mount(&server)
            .await;

        let temp = tempfile::tempdir().expect("tempdir");
        let loader = MediaLoader::new(5, 1024)
            .expect("loader")
            .with_temp_dir(temp.path().to_path_buf());
        let part = loader
            .to_part(&direct(format!("{}/clip.mp4", server.uri())))
            .await
            .expect("part");

        match part {
            Part::InlineData(blob) => {
                assert_eq!(blob.mime_type, "video/mp4");
                assert_eq!(
                    blob.data,
                    base64::engine::general_purpose::STANDARD.encode(b"fake-video")
                );
            }
            other => panic!("unexpected part {other:?}"),
        }
        assert!(dir_is_empty(temp.path()));
    }

    #[tokio::test]
    async fn download_at_the_cap_is_inlined_byte_for_byte() {
        let body: Vec<u8> = (0..1024u32).map(|i| (i % 251) as u8).collect();
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/photo.jpg"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("content-type", "image/jpeg; charset=binary")
                    .set_body_bytes(body.clone()),
            )
            .mount(&server)
            .await;

        let temp = tempfile::tempdir().expect("tempdir");
        let loader = MediaLoader::new(5, 1024)
            .expect("loader")
            .with_temp_dir(temp.path().to_path_buf());
        let part = loader
            .to_part(&direct(format!("{}/photo.jpg", server.uri())))
            .await
            .expect("part");

        let Part::InlineData(blob) = part else {
            panic!("expected inline data");
        };
        assert_eq!(blob.mime_type, "image/jpeg");
        let decoded = base64::engine::general_purpose::STANDARD
            .decode(blob.data)
            .expect("base64");
        assert_eq!(decoded, body);
        assert!(dir_is_empty(temp.path()));
    }

    #[tokio::test]
    async fn oversized_download_fails_and_cleans_up() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/big.mp4"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("content-type", "video/mp4")
                    .set_body_bytes(vec![0_u8; 4096]),
            )
            .mount(&server)
            .await;

        let temp = tempfile::tempdir().expect("tempdir");
        let loader = MediaLoader::new(5, 1024)
            .expect("loader")
            .with_temp_dir(temp.path().to_path_buf());
        let err = loader
            .to_part(&direct(format!("{}/big.mp4", server.uri())))
            .await
            .expect_err("over cap");
        assert!(matches!(err, ExtractionError::MediaUnavailable { .. }));
        assert!(dir_is_empty(temp.path()));
    }

    #[tokio::test]
    async fn html_page_is_not_media() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("content-type", "text/html; charset=utf-8")
                    .set_body_string("<html></html>"),
            )
            .mount(&server)
            .await;

        let loader = MediaLoader::new(5, 1024).expect("loader");
        let err = loader
            .to_part(&direct(format!("{}/p/abc/", server.uri())))
            .await
            .expect_err("html");
        assert!(matches!(err, ExtractionError::MediaUnavailable { .. }));
    }
}
