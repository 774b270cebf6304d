use std::{fmt, path::Path};

use url::Url;

fn has_scheme(s: &str, schemes: &[&str]) -> bool {
    schemes.iter().any(|scheme| {
        s.get(..scheme.len())
            .is_some_and(|prefix| prefix.eq_ignore_ascii_case(scheme))
    })
}

pub(crate) fn is_absolute_url(s: &str) -> bool {
    has_scheme(s, &["http://", "https://", "file://", "ftp://"])
}

pub(crate) fn is_http_url(s: &str) -> bool {
    has_scheme(s, &["http://", "https://"])
}

/// Effective base of one level of the manifest tree.
///
/// Manifests loaded over HTTP resolve against a [`Url`], manifests loaded from
/// disk resolve against a plain `/`-separated path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BaseUrl {
    Remote(Url),
    Local(String),
}

impl BaseUrl {
    /// Directory of a manifest url, without its query or fragment.
    ///
    /// `https://cdn/foo/bar/stream.mpd?token=abc#frag` => `https://cdn/foo/bar/`
    pub fn from_manifest_url(manifest: &Url) -> Self {
        let mut base = manifest.clone();
        base.set_query(None);
        base.set_fragment(None);

        let directory = match manifest.path().rfind('/') {
            Some(index) => &manifest.path()[..=index],
            None => "/",
        };
        base.set_path(directory);
        Self::Remote(base)
    }

    /// Absolute parent directory of a manifest file, with a trailing `/`.
    pub fn from_manifest_path(manifest: &Path) -> Self {
        let manifest = std::path::absolute(manifest).unwrap_or_else(|_| manifest.to_path_buf());
        let directory = manifest
            .parent()
            .map(|p| p.to_string_lossy().replace('\\', "/"))
            .unwrap_or_default();

        if directory.ends_with('/') {
            Self::Local(directory)
        } else {
            Self::Local(format!("{directory}/"))
        }
    }

    /// Resolves a `BaseURL` (or a segment uri) against this base.
    ///
    /// - An absolute url replaces the base.
    /// - A rooted reference (`/path`) replaces the path of a remote base and
    ///   is taken verbatim for a local one.
    /// - Anything else is appended as a relative path.
    ///
    /// Strings that are not valid urls are passed through untouched.
    pub fn join(&self, reference: &str) -> Self {
        if reference.is_empty() {
            return self.clone();
        }

        if is_absolute_url(reference) {
            return match Url::parse(reference) {
                Ok(url) => Self::Remote(url),
                Err(_) => Self::Local(reference.to_string()),
            };
        }

        match self {
            Self::Remote(base) => Self::Remote(join_remote(base, reference)),
            Self::Local(base) => Self::Local(join_local(base, reference)),
        }
    }

    /// Effective base of a nested level given that level's `BaseURL` elements.
    ///
    /// Only the first element is honored. Manifests listing several CDNs as
    /// alternative `BaseURL`s always resolve against the first one.
    pub fn resolve(&self, overrides: &[String]) -> Self {
        match overrides {
            [] => self.clone(),
            [first, rest @ ..] => {
                if !rest.is_empty() {
                    tracing::debug!(
                        "Ignoring {} alternative BaseURL(s), using {first}",
                        rest.len()
                    );
                }
                self.join(first)
            }
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Remote(url) => url.as_str(),
            Self::Local(path) => path.as_str(),
        }
    }
}

impl fmt::Display for BaseUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn join_remote(base: &Url, reference: &str) -> Url {
    let reference = reference
        .split_once('#')
        .map_or(reference, |(before, _)| before);
    let (path, query) = match reference.split_once('?') {
        Some((path, query)) => (path, Some(query)),
        None => (reference, None),
    };

    let mut merged = base.clone();
    merged.set_fragment(None);
    if path.starts_with('/') {
        merged.set_path(&collapse_slashes(path));
    } else if !path.is_empty() {
        let joined = format!("{}/{}", base.path().trim_end_matches('/'), path);
        merged.set_path(&collapse_slashes(&joined));
    }

    // The query of the base (an auth token on the manifest url for example)
    // is kept unless the reference brings its own.
    //
    // https://example.com/a/?auth=secret + video42.mp4 => https://example.com/a/video42.mp4?auth=secret
    // https://example.com/a/?auth=old + video42.mp4?auth=new => https://example.com/a/video42.mp4?auth=new
    if query.is_some() {
        merged.set_query(query);
    }
    merged
}

fn join_local(base: &str, reference: &str) -> String {
    if reference.starts_with('/') || base.is_empty() {
        return reference.to_string();
    }
    normalize_local(&format!("{base}/{reference}"))
}

fn collapse_slashes(path: &str) -> String {
    let mut result = String::with_capacity(path.len());
    let mut previous_slash = false;
    for c in path.chars() {
        if c == '/' {
            if previous_slash {
                continue;
            }
            previous_slash = true;
        } else {
            previous_slash = false;
        }
        result.push(c);
    }
    result
}

/// Removes empty, `.` and `..` segments from a `/`-separated path.
fn normalize_local(path: &str) -> String {
    let absolute = path.starts_with('/');
    let trailing = path.ends_with('/');

    let mut parts: Vec<&str> = Vec::new();
    for part in path.split('/') {
        match part {
            "" | "." => {}
            ".." => match parts.last() {
                Some(&last) if last != ".." => {
                    parts.pop();
                }
                _ if absolute => {}
                _ => parts.push(".."),
            },
            _ => parts.push(part),
        }
    }

    let mut result = parts.join("/");
    if absolute {
        result.insert(0, '/');
    }
    if trailing && !result.ends_with('/') {
        result.push('/');
    }
    result
}
