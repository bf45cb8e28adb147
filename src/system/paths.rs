//! Cross-platform path handling for library refreshes.
//!
//! Stored filesystem paths can originate on a POSIX host or a Windows host.
//! They are parsed into a [`CanonicalPath`] that remembers which rules produced
//! it, so comparisons follow the right case rules and rendering is the same no
//! matter which OS this code runs on.

use std::fmt;

/// Path rules a [`CanonicalPath`] was parsed with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flavor {
    Posix,
    Windows,
}

impl Flavor {
    /// Rules native to the running host.
    pub fn host() -> Self {
        if cfg!(windows) {
            Flavor::Windows
        } else {
            Flavor::Posix
        }
    }

    pub fn separator(self) -> char {
        match self {
            Flavor::Posix => '/',
            Flavor::Windows => '\\',
        }
    }

    fn segment_eq(self, left: &str, right: &str) -> bool {
        match self {
            Flavor::Posix => left == right,
            Flavor::Windows => left == right || left.to_lowercase() == right.to_lowercase(),
        }
    }
}

/// Normalized, flavor-tagged path.
///
/// Windows paths may carry a drive anchor, either a drive letter (`C:`) or a
/// UNC share (`\\server\share`). Equality is case-sensitive for POSIX paths
/// and case-insensitive for Windows paths; paths of different flavors are
/// never equal.
#[derive(Debug, Clone)]
pub struct CanonicalPath {
    flavor: Flavor,
    drive: Option<String>,
    rooted: bool,
    segments: Vec<String>,
}

impl CanonicalPath {
    /// Parse `raw` as if the code were running on a `host` machine.
    ///
    /// Windows rules apply when the host is Windows, when the string contains
    /// a backslash, or when it starts with a drive letter. Everything else is
    /// parsed with POSIX rules.
    pub fn parse_with_host(raw: &str, host: Flavor) -> Self {
        if host == Flavor::Windows || raw.contains('\\') || has_drive_letter(raw) {
            Self::parse_windows(raw)
        } else {
            Self::parse_posix(raw)
        }
    }

    pub fn parse(raw: &str) -> Self {
        Self::parse_with_host(raw, Flavor::host())
    }

    fn parse_posix(raw: &str) -> Self {
        Self {
            flavor: Flavor::Posix,
            drive: None,
            rooted: raw.starts_with('/'),
            segments: split_segments(raw, '/'),
        }
    }

    fn parse_windows(raw: &str) -> Self {
        let unified = raw.replace('/', "\\");
        let (drive, rest) = split_windows_drive(&unified);
        let is_unc = drive.as_deref().is_some_and(|d| d.starts_with("\\\\"));
        Self {
            flavor: Flavor::Windows,
            rooted: is_unc || rest.starts_with('\\'),
            segments: split_segments(rest, '\\'),
            drive,
        }
    }

    pub fn flavor(&self) -> Flavor {
        self.flavor
    }

    /// Drive letter (`C:`) or UNC share (`\\server\share`), Windows only.
    pub fn drive(&self) -> Option<&str> {
        self.drive.as_deref()
    }

    pub fn is_rooted(&self) -> bool {
        self.rooted
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// POSIX paths are absolute when rooted. Windows paths additionally need a
    /// drive, so `\shows` is relative to whatever drive is current.
    pub fn is_absolute(&self) -> bool {
        match self.flavor {
            Flavor::Posix => self.rooted,
            Flavor::Windows => self.rooted && self.drive.is_some(),
        }
    }

    /// The containing directory. An anchor-only path is its own parent.
    pub fn parent(&self) -> CanonicalPath {
        let mut parent = self.clone();
        parent.segments.pop();
        parent
    }

    /// Append `segments` below this path, keeping this path's flavor.
    pub fn join<I, S>(&self, segments: I) -> CanonicalPath
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut joined = self.clone();
        joined.segments.extend(
            segments
                .into_iter()
                .map(|s| s.as_ref().to_string())
                .filter(|s| !s.is_empty() && s != "."),
        );
        joined
    }

    /// Remainder of this path below `base`, matched segment by segment.
    pub fn strip_prefix(&self, base: &CanonicalPath) -> Option<CanonicalPath> {
        if !self.same_anchor(base) || base.segments.len() > self.segments.len() {
            return None;
        }
        let prefix_matches = base
            .segments
            .iter()
            .zip(&self.segments)
            .all(|(b, s)| self.flavor.segment_eq(b, s));
        if !prefix_matches {
            return None;
        }
        Some(CanonicalPath {
            flavor: self.flavor,
            drive: None,
            rooted: false,
            segments: self.segments[base.segments.len()..].to_vec(),
        })
    }

    /// Render with the separator of this path's flavor, independent of host.
    pub fn as_os_string(&self) -> String {
        let separator = self.flavor.separator();
        let mut out = String::new();
        if let Some(drive) = &self.drive {
            out.push_str(drive);
        }
        if self.rooted {
            out.push(separator);
        }
        out.push_str(&self.segments.join(&separator.to_string()));
        if out.is_empty() {
            out.push('.');
        }
        out
    }

    fn same_anchor(&self, other: &CanonicalPath) -> bool {
        if self.flavor != other.flavor || self.rooted != other.rooted {
            return false;
        }
        match (&self.drive, &other.drive) {
            (None, None) => true,
            (Some(left), Some(right)) => self.flavor.segment_eq(left, right),
            _ => false,
        }
    }
}

impl PartialEq for CanonicalPath {
    fn eq(&self, other: &Self) -> bool {
        self.same_anchor(other)
            && self.segments.len() == other.segments.len()
            && self
                .segments
                .iter()
                .zip(&other.segments)
                .all(|(l, r)| self.flavor.segment_eq(l, r))
    }
}

impl Eq for CanonicalPath {}

impl fmt::Display for CanonicalPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.as_os_string())
    }
}

impl From<&str> for CanonicalPath {
    fn from(raw: &str) -> Self {
        CanonicalPath::parse(raw)
    }
}

impl From<String> for CanonicalPath {
    fn from(raw: String) -> Self {
        CanonicalPath::parse(&raw)
    }
}

impl From<&String> for CanonicalPath {
    fn from(raw: &String) -> Self {
        CanonicalPath::parse(raw)
    }
}

impl From<&CanonicalPath> for CanonicalPath {
    fn from(path: &CanonicalPath) -> Self {
        path.clone()
    }
}

fn has_drive_letter(raw: &str) -> bool {
    let bytes = raw.as_bytes();
    bytes.len() >= 2 && bytes[0].is_ascii_alphabetic() && bytes[1] == b':'
}

fn split_segments(raw: &str, separator: char) -> Vec<String> {
    raw.split(separator)
        .filter(|s| !s.is_empty() && *s != ".")
        .map(str::to_string)
        .collect()
}

/// Split a backslash-only Windows path into its drive anchor and the rest.
fn split_windows_drive(path: &str) -> (Option<String>, &str) {
    if let Some(unc) = path.strip_prefix("\\\\") {
        let mut parts = unc.splitn(3, '\\');
        let server = parts.next().unwrap_or_default();
        let share = parts.next().unwrap_or_default();
        if server.is_empty() || share.is_empty() {
            // Incomplete UNC prefix, keep it as a plain rooted path.
            return (None, path);
        }
        let len = 2 + server.len() + 1 + share.len();
        return (Some(path[..len].to_string()), &path[len..]);
    }
    if has_drive_letter(path) {
        return (Some(path[..2].to_string()), &path[2..]);
    }
    (None, path)
}

/// Convert anything path-like into a [`CanonicalPath`].
///
/// Already-canonical input comes back unchanged.
pub fn normalize(path: impl Into<CanonicalPath>) -> CanonicalPath {
    path.into()
}

/// Render any path-like value with its flavor's native separators.
pub fn as_os_string(path: impl Into<CanonicalPath>) -> String {
    normalize(path).as_os_string()
}

/// True when both paths name the same location.
pub fn paths_match(left: impl Into<CanonicalPath>, right: impl Into<CanonicalPath>) -> bool {
    normalize(left) == normalize(right)
}

/// True when `path` is one of `candidates` or lies underneath one of them.
pub fn path_is_within<I, P>(path: impl Into<CanonicalPath>, candidates: I) -> bool
where
    I: IntoIterator<Item = P>,
    P: Into<CanonicalPath>,
{
    let target = normalize(path);
    candidates.into_iter().any(|candidate| {
        let candidate = normalize(candidate);
        target == candidate || target.strip_prefix(&candidate).is_some()
    })
}

/// Root `filesystem_path` beneath `library_root` unless it is already absolute.
///
/// Absolute Windows paths are returned untouched. Absolute POSIX paths that
/// already sit inside the library are also untouched; any other absolute POSIX
/// path is re-rooted below the library. Relative paths of either flavor are
/// appended onto the root with the root's rules. No filesystem access happens.
pub fn combine_library_path(
    library_root: impl Into<CanonicalPath>,
    filesystem_path: impl Into<CanonicalPath>,
) -> CanonicalPath {
    let root = normalize(library_root);
    let candidate = normalize(filesystem_path);

    match candidate.flavor {
        Flavor::Windows => {
            if candidate.is_absolute() || candidate.drive.is_some() {
                return candidate;
            }
            root.join(&candidate.segments)
        }
        Flavor::Posix => {
            if candidate.is_absolute() && path_is_within(&candidate, [&root]) {
                return candidate;
            }
            root.join(&candidate.segments)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn posix(raw: &str) -> CanonicalPath {
        CanonicalPath::parse_with_host(raw, Flavor::Posix)
    }

    #[test]
    fn test_flavor_detection() {
        assert_eq!(posix("/mnt/library").flavor(), Flavor::Posix);
        assert_eq!(posix("C:\\Riven").flavor(), Flavor::Windows);
        assert_eq!(posix("C:/Riven").flavor(), Flavor::Windows);
        assert_eq!(posix("\\shows\\Test").flavor(), Flavor::Windows);
        assert_eq!(posix("\\\\nas\\media").flavor(), Flavor::Windows);
        assert_eq!(
            CanonicalPath::parse_with_host("/mnt/library", Flavor::Windows).flavor(),
            Flavor::Windows
        );
    }

    #[test]
    fn test_normalize_is_idempotent() {
        for raw in ["/mnt/library/shows", "movies/Test", "C:\\Riven", "\\\\nas\\share\\x"] {
            let once = normalize(raw);
            let twice = normalize(&once);
            assert_eq!(once, twice);
            assert_eq!(once.as_os_string(), twice.as_os_string());
        }
    }

    #[test]
    fn test_windows_anchors() {
        let drive = posix("C:\\Riven\\Library");
        assert_eq!(drive.drive(), Some("C:"));
        assert!(drive.is_absolute());
        assert_eq!(drive.segments(), ["Riven", "Library"]);

        let unc = posix("\\\\nas\\media\\movies");
        assert_eq!(unc.drive(), Some("\\\\nas\\media"));
        assert!(unc.is_absolute());
        assert_eq!(unc.segments(), ["movies"]);

        let rooted = posix("\\shows\\Test");
        assert_eq!(rooted.drive(), None);
        assert!(rooted.is_rooted());
        assert!(!rooted.is_absolute());
    }

    #[test]
    fn test_as_os_string_round_trip() {
        let windows = "C:\\Riven\\Library\\movies";
        assert_eq!(as_os_string(windows), windows);

        let unc = "\\\\nas\\media\\movies";
        assert_eq!(as_os_string(unc), unc);

        let posix_path = "/mnt/library/shows";
        assert_eq!(posix(posix_path).as_os_string(), posix_path);
    }

    #[test]
    fn test_as_os_string_uses_path_flavor() {
        assert_eq!(posix("C:/Riven/Library").as_os_string(), "C:\\Riven\\Library");
        assert_eq!(posix("//mnt///library/./x").as_os_string(), "/mnt/library/x");
        assert_eq!(posix("").as_os_string(), ".");
    }

    #[test]
    fn test_paths_match_case_rules() {
        assert!(paths_match(posix("C:\\Riven\\Movies"), posix("c:\\riven\\MOVIES")));
        assert!(paths_match(posix("/mnt/library"), posix("/mnt/library/")));
        assert!(!paths_match(posix("/mnt/Library"), posix("/mnt/library")));
        assert!(!paths_match(posix("/mnt/library"), posix("mnt/library")));
        assert!(!paths_match(posix("\\mnt\\library"), posix("/mnt/library")));
    }

    #[test]
    fn test_path_is_within_respects_segment_boundaries() {
        assert!(path_is_within(posix("/a/b/c"), [posix("/a/b")]));
        assert!(path_is_within(posix("/a/b"), [posix("/a/b")]));
        assert!(!path_is_within(posix("/a/bx"), [posix("/a/b")]));
        assert!(!path_is_within(posix("/a"), [posix("/a/b")]));
        assert!(path_is_within(posix("/x/y"), [posix("/a"), posix("/x")]));
        assert!(path_is_within(
            posix("D:\\Media\\Shows\\Test"),
            [posix("d:\\media")]
        ));
        assert!(!path_is_within(posix("E:\\Media\\Shows"), [posix("D:\\Media")]));
    }

    #[test]
    fn test_combine_library_path_posix_relative() {
        let result = combine_library_path(posix("/mnt/library"), posix("movies/Test"));
        assert_eq!(result.as_os_string(), "/mnt/library/movies/Test");
    }

    #[test]
    fn test_combine_library_path_posix_leading_slash() {
        let result = combine_library_path(posix("/mnt/library"), posix("/shows/Test"));
        assert_eq!(result.as_os_string(), "/mnt/library/shows/Test");
    }

    #[test]
    fn test_combine_library_path_posix_already_inside_root() {
        let result = combine_library_path(posix("/mnt/library"), posix("/mnt/library/shows/Test"));
        assert_eq!(result.as_os_string(), "/mnt/library/shows/Test");
    }

    #[test]
    fn test_combine_library_path_root_marker_only() {
        let result = combine_library_path(posix("/mnt/library"), posix("/"));
        assert_eq!(result, posix("/mnt/library"));
    }

    #[test]
    fn test_combine_library_path_windows_relative_on_posix() {
        let result = combine_library_path(posix("/mnt/library"), posix("\\shows\\Test"));
        assert_eq!(result.flavor(), Flavor::Posix);
        assert_eq!(result.as_os_string(), "/mnt/library/shows/Test");
    }

    #[test]
    fn test_combine_library_path_windows_absolute() {
        let candidate = "C:\\Riven\\Library\\movies";
        let result = combine_library_path(posix("C:\\Riven\\Library"), posix(candidate));
        assert_eq!(result.as_os_string(), candidate);

        let elsewhere = combine_library_path(posix("/mnt/library"), posix("D:\\Other\\x.mkv"));
        assert_eq!(elsewhere.as_os_string(), "D:\\Other\\x.mkv");
    }

    #[test]
    fn test_combine_library_path_windows_root() {
        let result = combine_library_path(posix("C:\\Riven\\Library"), posix("shows/Test/S01"));
        assert_eq!(result.as_os_string(), "C:\\Riven\\Library\\shows\\Test\\S01");
    }

    #[test]
    fn test_parent_stays_at_anchor() {
        let path = posix("/mnt/x");
        let parent = path.parent();
        assert_eq!(parent.as_os_string(), "/mnt");
        assert_eq!(parent.parent().as_os_string(), "/");
        assert_eq!(posix("/").parent().as_os_string(), "/");
        assert_eq!(posix("C:\\").parent().as_os_string(), "C:\\");
        assert_eq!(posix("\\\\nas\\media").parent(), posix("\\\\nas\\media"));
    }
}
