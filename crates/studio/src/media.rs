use std::path::Path;
use std::time::UNIX_EPOCH;

use anyhow::{bail, Context};
use media_provider::{FailureKind, GenerationError};
use retouch::{Artifact, ArtifactPayload, LocalBinary};

/// Mime type for the file extensions the shell accepts.
pub fn mime_for_path(path: &Path) -> Option<&'static str> {
    let extension = path.extension()?.to_str()?.to_ascii_lowercase();
    let mime = match extension.as_str() {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "webp" => "image/webp",
        "gif" => "image/gif",
        "heic" => "image/heic",
        "mp4" => "video/mp4",
        "webm" => "video/webm",
        "mov" => "video/quicktime",
        _ => return None,
    };
    Some(mime)
}

/// Reads a local image or video. Read failures are classified as
/// [`FailureKind::IoFailure`], unknown extensions as unsupported input.
pub async fn load_binary(path: &Path) -> Result<LocalBinary, GenerationError> {
    let Some(mime_type) = mime_for_path(path) else {
        return Err(GenerationError::unsupported(format!(
            "unsupported file type: {}",
            path.display()
        )));
    };
    let bytes = tokio::fs::read(path).await.map_err(|error| {
        GenerationError::new(
            FailureKind::IoFailure,
            format!("reading {}: {error}", path.display()),
        )
    })?;
    if bytes.is_empty() {
        return Err(GenerationError::new(
            FailureKind::IoFailure,
            format!("{} is empty", path.display()),
        ));
    }

    let last_modified_ms = tokio::fs::metadata(path)
        .await
        .ok()
        .and_then(|metadata| metadata.modified().ok())
        .and_then(|modified| modified.duration_since(UNIX_EPOCH).ok())
        .map_or(0, |elapsed| i64::try_from(elapsed.as_millis()).unwrap_or(i64::MAX));
    let filename = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| "upload".to_string());

    Ok(LocalBinary::new(bytes, mime_type, filename, last_modified_ms))
}

/// `http(s)` URLs become remote references, anything else is read from disk.
pub async fn load_reference(value: &str) -> Result<Artifact, GenerationError> {
    if value.starts_with("http://") || value.starts_with("https://") {
        return Ok(Artifact::remote(value));
    }
    Ok(Artifact::local(load_binary(Path::new(value)).await?))
}

pub async fn export(artifact: &Artifact, path: &Path) -> anyhow::Result<()> {
    match artifact.payload() {
        ArtifactPayload::LocalBinary(binary) => tokio::fs::write(path, binary.bytes())
            .await
            .with_context(|| format!("writing {}", path.display())),
        ArtifactPayload::RemoteReference(reference) => bail!(
            "the active artifact is hosted remotely; download it from {}",
            reference.url()
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mime_follows_the_extension_case_insensitively() {
        assert_eq!(mime_for_path(Path::new("a/b.PNG")), Some("image/png"));
        assert_eq!(mime_for_path(Path::new("clip.mov")), Some("video/quicktime"));
        assert_eq!(mime_for_path(Path::new("notes.txt")), None);
        assert_eq!(mime_for_path(Path::new("README")), None);
    }

    #[tokio::test]
    async fn load_and_export_round_trip_through_disk() {
        let dir = tempfile::tempdir().expect("tempdir");
        let source = dir.path().join("photo.jpg");
        std::fs::write(&source, [0xff, 0xd8, 0xff]).expect("write source");

        let binary = load_binary(&source).await.expect("load");
        assert_eq!(binary.mime_type(), "image/jpeg");
        assert_eq!(binary.filename(), "photo.jpg");
        assert!(binary.last_modified_ms() > 0);

        let target = dir.path().join("out.jpg");
        export(&Artifact::local(binary), &target).await.expect("export");
        assert_eq!(std::fs::read(&target).expect("read back"), vec![0xff, 0xd8, 0xff]);
    }

    #[tokio::test]
    async fn references_and_rejections() {
        let remote = load_reference("https://cdn.example.com/a.png")
            .await
            .expect("remote reference");
        assert!(remote.is_reference());

        let missing = load_reference("missing.png").await.expect_err("missing file");
        assert_eq!(missing.kind(), FailureKind::IoFailure);
        assert_eq!(
            missing.user_message(),
            "The source file could not be read. Please select it again."
        );
        let unsupported = load_binary(Path::new("notes.txt")).await.expect_err("text file");
        assert_eq!(unsupported.kind(), FailureKind::UnsupportedInput);
        assert!(export(&remote, Path::new("out.png")).await.is_err());
    }
}
