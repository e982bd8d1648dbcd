use super::*;

fn parse(url: &str) -> SourceReference {
    SourceReference::parse(url).unwrap_or_else(|e| panic!("{url} should parse: {e}"))
}

#[test]
fn youtube_watch_url() {
    let r = parse("https://www.youtube.com/watch?v=dQw4w9WgXcQ&t=42s");
    assert_eq!(r.platform, Platform::Youtube);
    assert_eq!(r.external_id, "dQw4w9WgXcQ");
    assert_eq!(r.url, "https://www.youtube.com/watch?v=dQw4w9WgXcQ");
}

#[test]
fn youtube_short_link_without_scheme() {
    let r = parse("youtu.be/dQw4w9WgXcQ");
    assert_eq!(r.platform, Platform::Youtube);
    assert_eq!(r.external_id, "dQw4w9WgXcQ");
}

#[test]
fn youtube_embed_and_live_paths() {
    assert_eq!(
        parse("https://youtube.com/embed/dQw4w9WgXcQ").external_id,
        "dQw4w9WgXcQ"
    );
    assert_eq!(
        parse("https://m.youtube.com/live/dQw4w9WgXcQ?feature=share").platform,
        Platform::Youtube
    );
}

#[test]
fn youtube_shorts_is_its_own_platform() {
    let r = parse("https://www.youtube.com/shorts/abcdefghijk");
    assert_eq!(r.platform, Platform::YoutubeShorts);
    assert_eq!(r.url, "https://www.youtube.com/shorts/abcdefghijk");
    assert!(r.platform.is_short_form());
}

#[test]
fn host_match_is_case_insensitive() {
    let r = parse("HTTPS://WWW.YouTube.COM/watch?v=dQw4w9WgXcQ");
    assert_eq!(r.platform, Platform::Youtube);
}

#[test]
fn youtube_rejects_malformed_video_id() {
    let err = SourceReference::parse("https://www.youtube.com/watch?v=short").unwrap_err();
    assert!(matches!(err, CoreError::InvalidSource { .. }));
}

#[test]
fn tiktok_video_url() {
    let r = parse("https://www.tiktok.com/@foodie/video/7234567890123456789?lang=en");
    assert_eq!(r.platform, Platform::Tiktok);
    assert_eq!(r.external_id, "7234567890123456789");
    assert_eq!(
        r.url,
        "https://www.tiktok.com/@foodie/video/7234567890123456789"
    );
}

#[test]
fn tiktok_short_links_keep_code() {
    let vm = parse("https://vm.tiktok.com/ZMabc123/");
    assert_eq!(vm.platform, Platform::Tiktok);
    assert_eq!(vm.external_id, "ZMabc123");
    assert_eq!(vm.url, "https://vm.tiktok.com/ZMabc123/");

    let vt = parse("vt.tiktok.com/ZSxyz789");
    assert_eq!(vt.external_id, "ZSxyz789");
}

#[test]
fn tiktok_rejects_non_numeric_video_id() {
    assert!(SourceReference::parse("https://www.tiktok.com/@foodie/video/notanid").is_err());
}

#[test]
fn instagram_post_and_reel() {
    let post = parse("https://www.instagram.com/p/Cx1_abc-DEF/?igsh=xyz");
    assert_eq!(post.platform, Platform::Instagram);
    assert_eq!(post.external_id, "Cx1_abc-DEF");
    assert_eq!(post.url, "https://www.instagram.com/p/Cx1_abc-DEF/");

    let reel = parse("instagram.com/reel/C9zzzzzz/");
    assert_eq!(reel.external_id, "C9zzzzzz");
    assert_eq!(reel.platform.family(), PlatformFamily::SocialPost);
}

#[test]
fn reddit_thread_urls() {
    let r = parse("https://old.reddit.com/r/JapanTravel/comments/1AbC2d/best_ramen_in_tokyo/");
    assert_eq!(r.platform, Platform::Reddit);
    assert_eq!(r.external_id, "1abc2d");
    assert_eq!(r.url, "https://www.reddit.com/comments/1abc2d/");

    let short = parse("https://redd.it/1abc2d");
    assert_eq!(short.external_id, "1abc2d");
}

#[test]
fn reddit_subreddit_listing_is_rejected() {
    let err = SourceReference::parse("https://www.reddit.com/r/JapanTravel/").unwrap_err();
    assert!(matches!(err, CoreError::InvalidSource { ref reason, .. } if reason.contains("no content id")));
}

#[test]
fn unsupported_host_is_rejected() {
    let err = SourceReference::parse("https://example.com/watch?v=dQw4w9WgXcQ").unwrap_err();
    assert!(matches!(err, CoreError::InvalidSource { ref reason, .. } if reason.contains("example.com")));
}

#[test]
fn empty_and_garbage_input_rejected() {
    assert!(SourceReference::parse("").is_err());
    assert!(SourceReference::parse("   ").is_err());
    assert!(SourceReference::parse("ftp://youtube.com/watch?v=dQw4w9WgXcQ").is_err());
    assert!(SourceReference::parse("http://").is_err());
}

#[test]
fn platform_round_trips_through_str() {
    for platform in Platform::ALL {
        let parsed: Platform = platform.as_str().parse().expect("known platform");
        assert_eq!(parsed, platform);
    }
    assert!("vimeo".parse::<Platform>().is_err());
}

#[test]
fn platform_families() {
    assert_eq!(Platform::Youtube.family(), PlatformFamily::LongFormVideo);
    assert_eq!(Platform::Tiktok.family(), PlatformFamily::ShortFormVideo);
    assert_eq!(Platform::Reddit.family(), PlatformFamily::DiscussionThread);
}
