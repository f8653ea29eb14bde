use std::path::PathBuf;

use url::Url;

use crate::{error::MpdResult, manifest::Representation, track::FragmentAddress};

pub(crate) fn is_absolute_url(s: &str) -> bool {
    s.starts_with("http://") || s.starts_with("https://")
}

/// Anything carrying a scheme separator is treated as a URL, everything else
/// (including `C:\...` style paths) as a filesystem location.
fn looks_like_url(s: &str) -> bool {
    s.contains("://")
}

/// Collects `BaseURL` fragments from the representation up to the MPD root.
///
/// Each fragment found is prepended to what was collected so far, and the walk
/// stops as soon as the result is an absolute http(s) URL. A relative BaseURL on
/// a deeper level is therefore resolved against the ones above it.
pub fn collect_base_url(representation: &Representation<'_>) -> String {
    let mut base_url = String::new();
    for level in representation.hierarchy() {
        for element in level.children_named("BaseURL") {
            base_url.insert_str(0, element.text());
            if is_absolute_url(&base_url) {
                return base_url;
            }
        }
    }
    base_url
}

/// Directory part of the manifest location: query dropped, cut after the last `/`.
pub fn manifest_directory(manifest_url: &str) -> &str {
    let location = manifest_url
        .rsplit_once('?')
        .map_or(manifest_url, |(location, _)| location);
    match location.rfind(|c| c == '/' || c == '\\') {
        Some(index) => &location[..=index],
        None => "",
    }
}

/// Turns the collected BaseURL into the absolute base every fragment of the
/// representation is resolved against.
///
/// `explicit_base` replaces the manifest directory when it is given.
pub fn resolve_against(manifest_url: &str, collected: &str, explicit_base: Option<&str>) -> String {
    if is_absolute_url(collected) {
        return collected.to_string();
    }

    let base = explicit_base
        .filter(|base| !base.is_empty())
        .unwrap_or_else(|| manifest_directory(manifest_url));
    if base.is_empty() {
        return collected.to_string();
    }

    let mut resolved = String::with_capacity(base.len() + collected.len() + 1);
    resolved.push_str(base);
    if !base.ends_with('/') && !collected.starts_with('/') {
        resolved.push('/');
    }
    resolved.push_str(collected);
    resolved
}

/// RFC 3986 reference resolution of `reference` against `base`.
pub fn combine_url(base: &str, reference: &str) -> MpdResult<FragmentAddress> {
    if is_absolute_url(reference) {
        return Ok(FragmentAddress::Url(Url::parse(reference)?));
    }

    if looks_like_url(base) {
        let base = Url::parse(base)?;
        Ok(FragmentAddress::Url(base.join(reference)?))
    } else if reference.is_empty() {
        Ok(FragmentAddress::Path(PathBuf::from(base)))
    } else {
        Ok(FragmentAddress::Path(PathBuf::from(base).join(reference)))
    }
}
