use crate::manifest::Representation;

/// Reads `name` from the representation, falling back to its adaptation set.
///
/// An empty string means the attribute is absent on both levels.
pub fn resolve<'a>(representation: &Representation<'a>, name: &str) -> &'a str {
    match representation.element.attr(name) {
        "" => representation.adaptation_set.element.attr(name),
        value => value,
    }
}

pub fn resolve_opt<'a>(representation: &Representation<'a>, name: &str) -> Option<&'a str> {
    match resolve(representation, name) {
        "" => None,
        value => Some(value),
    }
}

/// Optional integer attribute. Values that are not plain integers are treated as unknown.
pub fn resolve_u32(representation: &Representation<'_>, name: &str) -> Option<u32> {
    resolve_opt(representation, name).and_then(|v| v.trim().parse().ok())
}

/// `@frameRate` is either an integer or a `num/den` fraction such as `30000/1001`.
pub fn resolve_frame_rate(representation: &Representation<'_>) -> Option<u32> {
    let value = resolve_opt(representation, "frameRate")?.trim();
    match value.split_once('/') {
        Some((num, den)) => {
            let num: f64 = num.parse().ok()?;
            let den: f64 = den.parse().ok()?;
            (den > 0.).then(|| (num / den).round() as u32)
        }
        None => value.parse().ok(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::manifest::Manifest;

    fn with_first_representation(xml: &str, f: impl FnOnce(Representation<'_>)) {
        let manifest = Manifest::parse(xml).unwrap();
        let period = manifest.periods().next().unwrap();
        let adaptation_set = period.adaptation_sets().next().unwrap();
        let representation = adaptation_set.representations().next().unwrap();
        f(representation)
    }

    #[test]
    fn test_fallback_to_adaptation_set() {
        with_first_representation(
            r#"<MPD><Period>
  <AdaptationSet mimeType="audio/mp4" lang="ja" codecs="mp4a.40.2">
    <Representation id="a1" codecs="" bandwidth="128000"/>
  </AdaptationSet>
</Period></MPD>"#,
            |r| {
                assert_eq!(resolve(&r, "id"), "a1");
                assert_eq!(resolve(&r, "lang"), "ja");
                // empty attribute on the representation counts as absent
                assert_eq!(resolve(&r, "codecs"), "mp4a.40.2");
                assert_eq!(resolve(&r, "width"), "");
                assert_eq!(resolve_opt(&r, "width"), None);
                assert_eq!(resolve_u32(&r, "bandwidth"), Some(128000));
            },
        );
    }

    #[test]
    fn test_representation_wins() {
        with_first_representation(
            r#"<MPD><Period>
  <AdaptationSet mimeType="video/mp4" frameRate="25">
    <Representation id="v1" mimeType="video/webm" frameRate="30000/1001" width="abc"/>
  </AdaptationSet>
</Period></MPD>"#,
            |r| {
                assert_eq!(resolve(&r, "mimeType"), "video/webm");
                assert_eq!(resolve_frame_rate(&r), Some(30));
                assert_eq!(resolve_u32(&r, "width"), None);
            },
        );
    }
}
