//! Lossless concatenation through the FFmpeg concat demuxer.
//!
//! The manifest lists one `file '<path>'` line per input, in playback order.
//! Streams are copied, never re-encoded, so every input must share codec
//! parameters (true for segments cut from one continuous recording).

use std::path::{Path, PathBuf};
use tracing::info;

use crate::command::{FfmpegCommand, FfmpegRunner};
use crate::error::MediaResult;

/// Quote a path for a concat manifest line.
///
/// Single quotes inside the path are closed, escaped and reopened (`'\''`).
fn manifest_line(path: &Path) -> String {
    let escaped = path.to_string_lossy().replace('\'', "'\\''");
    format!("file '{}'", escaped)
}

/// Build manifest text for the given inputs, preserving their order.
pub fn build_manifest(files: &[PathBuf]) -> String {
    files
        .iter()
        .map(|f| manifest_line(f))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Write a manifest file for the given inputs.
pub async fn write_manifest(list_path: impl AsRef<Path>, files: &[PathBuf]) -> MediaResult<()> {
    tokio::fs::write(list_path.as_ref(), build_manifest(files)).await?;
    Ok(())
}

/// Build the concat command for a manifest.
///
/// `-safe 0` is required because manifest entries are absolute paths.
pub fn concat_command(list_path: impl AsRef<Path>, output: impl AsRef<Path>) -> FfmpegCommand {
    FfmpegCommand::new(list_path.as_ref().to_string_lossy().to_string(), output)
        .input_format("concat")
        .input_args(["-safe", "0"])
        .codec_copy()
}

/// Concatenate the manifest's inputs into `output` without re-encoding.
pub async fn concat_copy(
    runner: &FfmpegRunner,
    list_path: impl AsRef<Path>,
    output: impl AsRef<Path>,
) -> MediaResult<()> {
    let list_path = list_path.as_ref();
    let output = output.as_ref();

    let cmd = concat_command(list_path, output);
    runner.run(&cmd).await?;

    info!("Concatenated {} -> {}", list_path.display(), output.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_manifest_preserves_order() {
        let files = vec![
            PathBuf::from("/a/20240101120000_1704110400.mp4"),
            PathBuf::from("/a/20240101120002_1704110402.mp4"),
        ];

        assert_eq!(
            build_manifest(&files),
            "file '/a/20240101120000_1704110400.mp4'\nfile '/a/20240101120002_1704110402.mp4'"
        );
    }

    #[test]
    fn test_manifest_escapes_single_quotes() {
        let files = vec![PathBuf::from("/rec/bob's cam/seg.mp4")];
        assert_eq!(build_manifest(&files), r"file '/rec/bob'\''s cam/seg.mp4'");
    }

    #[test]
    fn test_concat_command_is_lossless() {
        let args = concat_command("/x/list.txt", "/x/out.mp4").build_args();
        let joined = args.join(" ");
        assert!(joined.contains("-f concat -safe 0 -i /x/list.txt"));
        assert!(joined.contains("-c copy /x/out.mp4"));
        assert!(!joined.contains("libx264"));
    }

    #[tokio::test]
    async fn test_write_manifest() {
        let dir = TempDir::new().unwrap();
        let list = dir.path().join("list.txt");
        let files = vec![dir.path().join("a.mp4"), dir.path().join("b.mp4")];

        write_manifest(&list, &files).await.unwrap();

        let body = tokio::fs::read_to_string(&list).await.unwrap();
        assert_eq!(body.lines().count(), 2);
        assert!(body.lines().next().unwrap().ends_with("a.mp4'"));
    }
}
