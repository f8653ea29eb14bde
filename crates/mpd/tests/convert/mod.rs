use std::{fs, path::Path};

use iori_mpd::{
    convert, extract_tracks, playlist, ConvertOptions, FixedPrompt, MpdError, TerminalPrompt,
};

use crate::AssertWrapper;

const VOD_TEMPLATE: &str = include_str!("../fixtures/vod_template.mpd");
const MULTI_LANGUAGE: &str = include_str!("../fixtures/multi_language.mpd");
const AUDIO_ONLY: &str = include_str!("../fixtures/audio_only.mpd");
const TEXT_ONLY: &str = include_str!("../fixtures/text_only.mpd");

fn options(output_dir: &Path) -> ConvertOptions {
    ConvertOptions {
        manifest_url: "https://origin.example.com/vod/manifest.mpd?sig=abc".to_string(),
        output_dir: output_dir.to_path_buf(),
        created_by: "iori-mpd-test".to_string(),
        ..Default::default()
    }
}

fn read(path: impl AsRef<Path>) -> String {
    fs::read_to_string(path).assert_success()
}

#[test]
fn test_vod_template_emits_master() {
    let dir = tempfile::tempdir().assert_success();
    let entry = convert(VOD_TEMPLATE, &options(dir.path()), &mut FixedPrompt::default())
        .assert_success();
    assert_eq!(entry, dir.path().join(playlist::MASTER_PLAYLIST));

    let video = read(dir.path().join(playlist::VIDEO_PLAYLIST));
    assert_eq!(
        video,
        "#EXTM3U
#EXT-X-VERSION:3
#EXT-X-PLAYLIST-TYPE:VOD
#CREATED-BY:iori-mpd-test
#EXT-VIDEO-WIDTH:1920
#EXT-VIDEO-HEIGHT:1080
#EXT-CODEC:avc1.640028
#EXT-TBR:5000
#EXT-X-MAP:URI=\"https://origin.example.com/vod/media/video-1080/init.mp4\"
#EXT-X-KEY:METHOD=PLZ-KEEP-RAW,URI=\"None\"
#EXTINF:4.00
https://origin.example.com/vod/media/video-1080/seg-001.m4s
#EXTINF:4.00
https://origin.example.com/vod/media/video-1080/seg-002.m4s
#EXTINF:4.00
https://origin.example.com/vod/media/video-1080/seg-003.m4s
#EXT-X-ENDLIST
"
    );

    let audio = read(dir.path().join(playlist::AUDIO_PLAYLIST));
    assert!(audio.contains("#EXT-TBR:128\n"));
    assert!(audio.contains("https://origin.example.com/vod/media/audio-en/seg-003.m4s\n"));
    assert!(!audio.contains("#EXT-VIDEO-WIDTH"));

    let master = read(&entry);
    let lines: Vec<_> = master.lines().collect();
    assert_eq!(lines.len(), 4);
    assert_eq!(lines[0], "#EXTM3U");
    assert!(lines[1].starts_with("#EXT-X-MEDIA:TYPE=AUDIO,URI=\"file://"));
    assert!(lines[1].contains("audio.m3u8\",GROUP-ID=\"default-audio-group\""));
    assert_eq!(
        lines[2],
        "#EXT-X-STREAM-INF:BANDWIDTH=5128000,CODECS=\"avc1.640028,mp4a.40.2\",RESOLUTION=1920x1080,AUDIO=\"default-audio-group\""
    );
    assert!(lines[3].starts_with("file://"));
    assert!(lines[3].ends_with("/video.m3u8"));
}

#[test]
fn test_extract_tracks_ranked() {
    let tracks = extract_tracks(VOD_TEMPLATE, &options(Path::new("."))).assert_success();
    let ids: Vec<_> = tracks.iter().map(|t| t.format_id.as_str()).collect();
    // subtitles are skipped and resolution outranks bitrate
    assert_eq!(ids, vec!["video-1080", "video-720", "audio-en"]);
    assert_eq!(tracks[0].frame_rate, Some(30));
    assert_eq!(tracks[0].total_duration(), 12.);
}

#[test]
fn test_fractional_presentation_duration() {
    let manifest = r#"<MPD mediaPresentationDuration="PT63.36S"><Period>
  <AdaptationSet mimeType="video/mp4">
    <SegmentTemplate timescale="1000" duration="1920" media="$Number$.m4s"/>
    <Representation id="v" width="1280" height="720" bandwidth="2000000"/>
  </AdaptationSet>
</Period></MPD>"#;
    let tracks = extract_tracks(manifest, &options(Path::new("."))).assert_success();

    assert_eq!(tracks[0].fragments.len(), 33);
    assert_eq!(
        tracks[0].fragments[32].address.to_string(),
        "https://origin.example.com/vod/33.m4s"
    );
}

#[test]
fn test_multi_language_selection() {
    let dir = tempfile::tempdir().assert_success();
    let options = options(dir.path());

    let tracks = extract_tracks(MULTI_LANGUAGE, &options).assert_success();
    let ids: Vec<_> = tracks.iter().map(|t| t.format_id.as_str()).collect();
    assert_eq!(ids, vec!["v", "en-128", "ja-96", "en-64"]);

    let entry = convert(
        MULTI_LANGUAGE,
        &options,
        &mut FixedPrompt::new(Some("0 2".to_string())),
    )
    .assert_success();
    assert_eq!(entry, dir.path().join(playlist::MASTER_PLAYLIST));

    let video = read(dir.path().join(playlist::VIDEO_PLAYLIST));
    assert!(video.contains("#EXT-X-MAP:URI=\"https://cdn.example.com/show/v/4000000/init.mp4\"\n"));
    assert!(video.contains(
        "#EXTINF:2.00
https://cdn.example.com/show/v/4000000/0.m4s
#EXTINF:2.00
https://cdn.example.com/show/v/4000000/180000.m4s
#EXTINF:1.00
https://cdn.example.com/show/v/4000000/360000.m4s
#EXT-X-ENDLIST"
    ));

    let audio = read(dir.path().join(playlist::AUDIO_PLAYLIST));
    assert!(audio.contains("#EXT-X-MAP:URI=\"https://cdn.example.com/show/a/ja-96/init.mp4\""));
    assert!(audio.contains("https://cdn.example.com/show/a/ja-96/0.m4s\n"));
    assert!(audio.contains("https://cdn.example.com/show/a/ja-96/2.m4s\n"));
}

#[test]
fn test_multi_language_only_audio_chosen() {
    let dir = tempfile::tempdir().assert_success();
    let mut prompt = TerminalPrompt::new("x\n3\n".as_bytes(), Vec::new());

    let entry = convert(MULTI_LANGUAGE, &options(dir.path()), &mut prompt).assert_success();
    assert_eq!(entry, dir.path().join(playlist::AUDIO_PLAYLIST));
    assert!(read(&entry).contains("/a/en-64/"));
    assert!(!dir.path().join(playlist::MASTER_PLAYLIST).exists());
}

#[test]
fn test_audio_only_segment_list() {
    let dir = tempfile::tempdir().assert_success();
    let entry = convert(AUDIO_ONLY, &options(dir.path()), &mut FixedPrompt::default())
        .assert_success();

    assert_eq!(entry, dir.path().join(playlist::AUDIO_PLAYLIST));
    assert!(!dir.path().join(playlist::MASTER_PLAYLIST).exists());
    assert!(!dir.path().join(playlist::VIDEO_PLAYLIST).exists());

    let audio = read(&entry);
    assert!(audio.contains("#EXT-X-MAP:URI=\"https://radio.example.com/a/init.mp4\"\n"));
    assert!(audio.ends_with(
        "#EXTINF:2.00
https://radio.example.com/a/0.m4s
#EXTINF:2.00
https://radio.example.com/a/1.m4s
#EXTINF:1.00
https://radio.example.com/a/2.m4s?part=last
#EXT-X-ENDLIST
"
    ));
}

#[test]
fn test_no_selectable_track() {
    let dir = tempfile::tempdir().assert_success();
    let result = convert(TEXT_ONLY, &options(dir.path()), &mut FixedPrompt::default());
    assert!(matches!(result, Err(MpdError::NoSelectableTrack)));
}

#[test]
fn test_malformed_manifest() {
    let dir = tempfile::tempdir().assert_success();
    convert(
        "<MPD><Period>",
        &options(dir.path()),
        &mut FixedPrompt::default(),
    )
    .assert_error();
    convert(
        "<html><body/></html>",
        &options(dir.path()),
        &mut FixedPrompt::default(),
    )
    .assert_error();
}

#[test]
fn test_strict_templates() {
    let manifest = r#"<MPD mediaPresentationDuration="PT4S"><Period>
  <AdaptationSet mimeType="audio/mp4">
    <SegmentTemplate duration="2" media="$Bandwidth$/$Number$.m4s"/>
    <Representation id="a"/>
  </AdaptationSet>
</Period></MPD>"#;
    let dir = tempfile::tempdir().assert_success();

    let lenient = convert(manifest, &options(dir.path()), &mut FixedPrompt::default())
        .assert_success();
    assert!(read(lenient).contains("https://origin.example.com/vod/$Bandwidth$/2.m4s\n"));

    let strict = ConvertOptions {
        strict_templates: true,
        ..options(dir.path())
    };
    let result = convert(manifest, &strict, &mut FixedPrompt::default());
    assert!(matches!(
        result,
        Err(MpdError::UnresolvedTemplate { identifier, .. }) if identifier == "Bandwidth"
    ));
}
