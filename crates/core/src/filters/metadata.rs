//! Track title preservation.

use tracing::debug;

use crate::probe::AudioTrack;

/// Escapes double quotes so the title survives ffmpeg's option parsing.
pub fn escape_title(title: &str) -> String {
    title.replace('"', "\\\"")
}

/// Builds `-metadata:s:a:{i} title=...` pairs for every titled track.
///
/// `i` is the track's position among the output audio tracks. Tracks with no
/// title are skipped; an empty result means there is nothing to restore.
pub fn title_metadata_args(tracks: &[AudioTrack]) -> Vec<String> {
    let mut args = Vec::new();
    for (i, track) in tracks.iter().enumerate() {
        if let Some(title) = track.title() {
            let title = escape_title(title);
            debug!("Preserving title of audio track {}: '{}'", i + 1, title);
            args.push(format!("-metadata:s:a:{}", i));
            args.push(format!("title={}", title));
        }
    }

    if args.is_empty() {
        debug!("No audio track titles to preserve");
    }
    args
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_track_list() {
        assert!(title_metadata_args(&[]).is_empty());
    }

    #[test]
    fn test_untitled_tracks() {
        let tracks = vec![
            AudioTrack::new(1, "aac").with_tag("language", "eng"),
            AudioTrack::new(2, "aac"),
        ];
        assert!(title_metadata_args(&tracks).is_empty());
    }

    #[test]
    fn test_only_titled_track_in_order() {
        let tracks = vec![
            AudioTrack::new(1, "aac"),
            AudioTrack::new(2, "ac3").with_tag("title", "Commentary"),
        ];
        assert_eq!(
            title_metadata_args(&tracks),
            vec!["-metadata:s:a:1".to_string(), "title=Commentary".to_string()]
        );
    }

    #[test]
    fn test_one_pair_per_titled_track() {
        let tracks = vec![
            AudioTrack::new(1, "aac").with_tag("title", "Main"),
            AudioTrack::new(2, "aac").with_tag("TITLE", "Dub"),
            AudioTrack::new(3, "aac"),
            AudioTrack::new(4, "aac").with_tag("TAG:title", "Music"),
        ];
        assert_eq!(
            title_metadata_args(&tracks),
            vec![
                "-metadata:s:a:0",
                "title=Main",
                "-metadata:s:a:1",
                "title=Dub",
                "-metadata:s:a:3",
                "title=Music",
            ]
        );
    }

    #[test]
    fn test_quotes_escaped() {
        let tracks = vec![AudioTrack::new(1, "aac").with_tag("title", r#"The "Director" Cut"#)];
        assert_eq!(
            title_metadata_args(&tracks)[1],
            r#"title=The \"Director\" Cut"#
        );
    }
}
