use std::path::Path;

use videoup_protocol::SUPPORTED_EXTENSIONS;

use crate::TransferError;

/// Checks that `file_name` carries a supported video extension.
///
/// The comparison is case-insensitive; names without an extension are
/// rejected.
pub fn validate_video_file(file_name: &str) -> Result<(), TransferError> {
    let ext = Path::new(file_name)
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);

    match ext {
        Some(ext) if SUPPORTED_EXTENSIONS.contains(&ext.as_str()) => Ok(()),
        _ => Err(TransferError::UnsupportedFormat(file_name.to_string())),
    }
}

/// Splits `items` into supported and rejected entries, preserving order.
pub fn partition_supported<T, F>(items: Vec<T>, name_of: F) -> (Vec<T>, Vec<T>)
where
    F: Fn(&T) -> &str,
{
    items
        .into_iter()
        .partition(|item| validate_video_file(name_of(item)).is_ok())
}

/// Builds the user-facing alert for rejected files.
///
/// Returns `None` when nothing was rejected.
pub fn rejection_message(rejected: &[&str]) -> Option<String> {
    if rejected.is_empty() {
        return None;
    }
    Some(format!(
        "File(s) \"{}\" not in supported format ({}) and has been removed.",
        rejected.join(", "),
        SUPPORTED_EXTENSIONS.join(", ")
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_supported_extensions() {
        assert!(validate_video_file("clip.mp4").is_ok());
        assert!(validate_video_file("clip.mov").is_ok());
        assert!(validate_video_file("clip.avi").is_ok());
    }

    #[test]
    fn extension_check_is_case_insensitive() {
        assert!(validate_video_file("CLIP.MP4").is_ok());
        assert!(validate_video_file("holiday.MoV").is_ok());
    }

    #[test]
    fn rejects_other_extensions() {
        assert!(validate_video_file("notes.txt").is_err());
        assert!(validate_video_file("clip.mkv").is_err());
        assert!(validate_video_file("clip.mp4.zip").is_err());
    }

    #[test]
    fn rejects_missing_extension() {
        assert!(validate_video_file("clip").is_err());
        assert!(validate_video_file("").is_err());
        assert!(validate_video_file(".mp4").is_err());
    }

    #[test]
    fn accepts_path_with_directories() {
        assert!(validate_video_file("/videos/2024/clip.mp4").is_ok());
    }

    #[test]
    fn partition_keeps_order() {
        let names = vec!["a.mp4", "b.txt", "c.avi", "d.mkv"];
        let (ok, bad) = partition_supported(names, |n| *n);
        assert_eq!(ok, vec!["a.mp4", "c.avi"]);
        assert_eq!(bad, vec!["b.txt", "d.mkv"]);
    }

    #[test]
    fn rejection_message_lists_files() {
        let msg = rejection_message(&["b.txt", "d.mkv"]).unwrap();
        assert_eq!(
            msg,
            "File(s) \"b.txt, d.mkv\" not in supported format (avi, mov, mp4) and has been removed."
        );
    }

    #[test]
    fn no_rejections_no_message() {
        assert!(rejection_message(&[]).is_none());
    }
}
