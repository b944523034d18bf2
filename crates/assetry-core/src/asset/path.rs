// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! String helpers for asset URLs and the relative references found in
//! asset data.
//!
//! Asset URLs are treated as `/`-separated paths. References that carry a
//! scheme (`http:`, `blob:`, `data:`...) or start with `/` are absolute and
//! never rewritten.

use url::Url;

/// Drops any `?query` or `#fragment` suffix.
pub fn strip_query(url: &str) -> &str {
    match url.find(|c| c == '?' || c == '#') {
        Some(end) => &url[..end],
        None => url,
    }
}

/// Returns `true` if the reference starts with a URL scheme such as `http:`
/// or `blob:`. Single-letter prefixes are treated as drive letters, not schemes.
pub fn has_scheme(reference: &str) -> bool {
    let Some(colon) = reference.find(':') else {
        return false;
    };
    let scheme = &reference[..colon];
    scheme.len() >= 2
        && scheme.starts_with(|c: char| c.is_ascii_alphabetic())
        && scheme
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
}

/// Returns `true` for references that must not be resolved against a base.
pub fn is_absolute(reference: &str) -> bool {
    has_scheme(reference) || reference.starts_with('/')
}

/// The part of the URL before its last `/`, or `""` when there is none.
pub fn directory(url: &str) -> &str {
    let path = strip_query(url);
    match path.rfind('/') {
        Some(slash) => &path[..slash],
        None => "",
    }
}

/// The last path segment of the URL.
pub fn basename(url: &str) -> &str {
    let path = strip_query(url);
    match path.rfind('/') {
        Some(slash) => &path[slash + 1..],
        None => path,
    }
}

/// The extension of the last path segment, including the leading dot.
///
/// Dot-files such as `.env` have no extension.
pub fn extension(url: &str) -> Option<&str> {
    let base = basename(url);
    base.rfind('.').filter(|&dot| dot > 0).map(|dot| &base[dot..])
}

/// Collapses `.` and `..` segments and duplicate separators.
///
/// Leading `..` segments of a relative path are kept, since there is nothing
/// to pop them against.
pub fn normalize(path: &str) -> String {
    let absolute = path.starts_with('/');
    let mut parts: Vec<&str> = Vec::new();
    for segment in path.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                if matches!(parts.last(), Some(last) if *last != "..") {
                    parts.pop();
                } else if !absolute {
                    parts.push("..");
                }
            }
            other => parts.push(other),
        }
    }
    let joined = parts.join("/");
    if absolute {
        format!("/{joined}")
    } else {
        joined
    }
}

/// Joins a relative path onto a directory and normalizes the result.
pub fn join(directory: &str, relative: &str) -> String {
    if directory.is_empty() {
        normalize(relative)
    } else {
        normalize(&format!("{}/{}", directory.trim_end_matches('/'), relative))
    }
}

/// Resolves a reference found in an asset's data against that asset's URL.
///
/// Absolute references pass through untouched. Scheme-qualified bases are
/// resolved with RFC 3986 rules; plain paths are joined onto the base's
/// directory.
pub fn resolve(base: &str, reference: &str) -> String {
    if is_absolute(reference) {
        return reference.to_string();
    }
    if has_scheme(base) {
        return match Url::parse(base) {
            Ok(base_url) if !base_url.cannot_be_a_base() => base_url
                .join(reference)
                .map(String::from)
                .unwrap_or_else(|_| reference.to_string()),
            _ => reference.to_string(),
        };
    }
    join(directory(base), reference)
}

/// Replaces the extension of the URL's last segment with `suffix`, keeping
/// the directory: `models/crate.json` + `.mapping.json` gives
/// `models/crate.mapping.json`.
pub fn with_suffix(url: &str, suffix: &str) -> String {
    let dir = directory(url);
    let base = basename(url);
    let stem = match extension(url) {
        Some(ext) => &base[..base.len() - ext.len()],
        None => base,
    };
    if dir.is_empty() {
        format!("{stem}{suffix}")
    } else {
        format!("{dir}/{stem}{suffix}")
    }
}
