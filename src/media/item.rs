//! Read-mostly view of the media items a refresh is requested for.
//!
//! Only the fields the updater needs are modeled: the stored filesystem path,
//! whether an episode is materialized in the VFS, and the `updated` flag the
//! updater sets after a pass.

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Movie,
    Show,
    Season,
    Episode,
}

impl MediaKind {
    /// How many directories above the stored file the rescan unit sits.
    ///
    /// Movies live in their own folder. Episode files sit inside a season
    /// folder inside the show folder, and the show folder is what gets
    /// rescanned, so episodes and shows climb one level further.
    pub fn refresh_unit_depth(self) -> usize {
        match self {
            MediaKind::Movie | MediaKind::Season => 1,
            MediaKind::Show | MediaKind::Episode => 2,
        }
    }
}

impl fmt::Display for MediaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            MediaKind::Movie => "movie",
            MediaKind::Show => "show",
            MediaKind::Season => "season",
            MediaKind::Episode => "episode",
        };
        write!(f, "{}", s)
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct Movie {
    pub title: String,
    #[serde(default)]
    pub year: Option<u16>,
    #[serde(default)]
    pub filesystem_path: Option<String>,
    #[serde(default)]
    pub updated: bool,
}

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct Episode {
    pub number: u32,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub filesystem_path: Option<String>,
    #[serde(default)]
    pub available_in_vfs: bool,
    #[serde(default)]
    pub updated: bool,
}

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct Season {
    pub number: u32,
    #[serde(default)]
    pub episodes: Vec<Episode>,
    #[serde(default)]
    pub filesystem_path: Option<String>,
    #[serde(default)]
    pub updated: bool,
}

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct Show {
    pub title: String,
    #[serde(default)]
    pub seasons: Vec<Season>,
    #[serde(default)]
    pub filesystem_path: Option<String>,
    #[serde(default)]
    pub updated: bool,
}

/// A movie, show, season or episode.
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum MediaItem {
    Movie(Movie),
    Show(Show),
    Season(Season),
    Episode(Episode),
}

impl MediaItem {
    pub fn kind(&self) -> MediaKind {
        match self {
            MediaItem::Movie(_) => MediaKind::Movie,
            MediaItem::Show(_) => MediaKind::Show,
            MediaItem::Season(_) => MediaKind::Season,
            MediaItem::Episode(_) => MediaKind::Episode,
        }
    }

    pub fn filesystem_path(&self) -> Option<&str> {
        let path = match self {
            MediaItem::Movie(m) => &m.filesystem_path,
            MediaItem::Show(s) => &s.filesystem_path,
            MediaItem::Season(s) => &s.filesystem_path,
            MediaItem::Episode(e) => &e.filesystem_path,
        };
        path.as_deref().filter(|p| !p.is_empty())
    }

    pub fn is_updated(&self) -> bool {
        match self {
            MediaItem::Movie(m) => m.updated,
            MediaItem::Show(s) => s.updated,
            MediaItem::Season(s) => s.updated,
            MediaItem::Episode(e) => e.updated,
        }
    }

    /// Short human-readable label for logs.
    pub fn log_string(&self) -> String {
        match self {
            MediaItem::Movie(m) => movie_label(m),
            MediaItem::Show(s) => s.title.clone(),
            MediaItem::Season(s) => format!("Season {:02}", s.number),
            MediaItem::Episode(e) => episode_label(e),
        }
    }

    /// Collect the items whose files should be refreshed for this item.
    ///
    /// Shows expand to every materialized episode and fall back to the show
    /// itself when nothing is materialized yet. Seasons expand to their
    /// materialized episodes and may come back empty.
    pub fn refreshable_items(&mut self) -> Vec<RefreshableItem<'_>> {
        match self {
            MediaItem::Movie(movie) => vec![RefreshableItem::Movie(movie)],
            MediaItem::Episode(episode) => vec![RefreshableItem::Episode(episode)],
            MediaItem::Season(season) => available_episodes(&mut season.episodes)
                .map(RefreshableItem::Episode)
                .collect(),
            MediaItem::Show(show) => {
                let any_available = show
                    .seasons
                    .iter()
                    .flat_map(|season| &season.episodes)
                    .any(|episode| episode.available_in_vfs);
                if !any_available {
                    return vec![RefreshableItem::Show(show)];
                }
                show.seasons
                    .iter_mut()
                    .flat_map(|season| available_episodes(&mut season.episodes))
                    .map(RefreshableItem::Episode)
                    .collect()
            }
        }
    }
}

fn available_episodes(episodes: &mut [Episode]) -> impl Iterator<Item = &mut Episode> {
    episodes.iter_mut().filter(|e| e.available_in_vfs)
}

fn movie_label(movie: &Movie) -> String {
    match movie.year {
        Some(year) => format!("{} ({})", movie.title, year),
        None => movie.title.clone(),
    }
}

fn episode_label(episode: &Episode) -> String {
    match &episode.title {
        Some(title) => format!("Episode {:02}: {}", episode.number, title),
        None => format!("Episode {:02}", episode.number),
    }
}

/// Mutable handle to one leaf of a [`MediaItem`] tree chosen for refresh.
#[derive(Debug)]
pub enum RefreshableItem<'a> {
    Movie(&'a mut Movie),
    Show(&'a mut Show),
    Episode(&'a mut Episode),
}

impl RefreshableItem<'_> {
    pub fn kind(&self) -> MediaKind {
        match self {
            RefreshableItem::Movie(_) => MediaKind::Movie,
            RefreshableItem::Show(_) => MediaKind::Show,
            RefreshableItem::Episode(_) => MediaKind::Episode,
        }
    }

    pub fn filesystem_path(&self) -> Option<&str> {
        let path = match self {
            RefreshableItem::Movie(m) => &m.filesystem_path,
            RefreshableItem::Show(s) => &s.filesystem_path,
            RefreshableItem::Episode(e) => &e.filesystem_path,
        };
        path.as_deref().filter(|p| !p.is_empty())
    }

    pub fn log_string(&self) -> String {
        match self {
            RefreshableItem::Movie(m) => movie_label(m),
            RefreshableItem::Show(s) => s.title.clone(),
            RefreshableItem::Episode(e) => episode_label(e),
        }
    }

    pub fn mark_updated(&mut self) {
        match self {
            RefreshableItem::Movie(m) => m.updated = true,
            RefreshableItem::Show(s) => s.updated = true,
            RefreshableItem::Episode(e) => e.updated = true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn episode(number: u32, available: bool) -> Episode {
        Episode {
            number,
            filesystem_path: Some(format!("shows/Show/Season 01/e{:02}.mkv", number)),
            available_in_vfs: available,
            ..Default::default()
        }
    }

    #[test]
    fn test_refresh_unit_depth() {
        assert_eq!(MediaKind::Movie.refresh_unit_depth(), 1);
        assert_eq!(MediaKind::Season.refresh_unit_depth(), 1);
        assert_eq!(MediaKind::Episode.refresh_unit_depth(), 2);
        assert_eq!(MediaKind::Show.refresh_unit_depth(), 2);
    }

    #[test]
    fn test_movie_label_matches_when_expanded() {
        let mut item = MediaItem::Movie(Movie {
            title: "Heat".into(),
            year: Some(1995),
            ..Default::default()
        });
        let label = item.log_string();
        assert_eq!(label, "Heat (1995)");
        let items = item.refreshable_items();
        assert_eq!(items[0].log_string(), label);
    }

    #[test]
    fn test_movie_expands_to_itself() {
        let mut item = MediaItem::Movie(Movie {
            title: "Movie".into(),
            ..Default::default()
        });
        let items = item.refreshable_items();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].kind(), MediaKind::Movie);
    }

    #[test]
    fn test_show_expands_to_available_episodes() {
        let mut item = MediaItem::Show(Show {
            title: "Show".into(),
            seasons: vec![
                Season {
                    number: 1,
                    episodes: vec![episode(1, true), episode(2, false)],
                    ..Default::default()
                },
                Season {
                    number: 2,
                    episodes: vec![episode(1, true)],
                    ..Default::default()
                },
            ],
            ..Default::default()
        });
        let items = item.refreshable_items();
        assert_eq!(items.len(), 2);
        assert!(items.iter().all(|i| i.kind() == MediaKind::Episode));
    }

    #[test]
    fn test_show_without_available_episodes_falls_back_to_itself() {
        let mut item = MediaItem::Show(Show {
            title: "Show".into(),
            seasons: vec![Season {
                number: 1,
                episodes: vec![episode(1, false)],
                ..Default::default()
            }],
            ..Default::default()
        });
        let items = item.refreshable_items();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].kind(), MediaKind::Show);
    }

    #[test]
    fn test_season_without_available_episodes_is_empty() {
        let mut item = MediaItem::Season(Season {
            number: 1,
            episodes: vec![episode(1, false), episode(2, false)],
            ..Default::default()
        });
        assert!(item.refreshable_items().is_empty());
    }

    #[test]
    fn test_mark_updated_reaches_nested_episode() {
        let mut item = MediaItem::Season(Season {
            number: 1,
            episodes: vec![episode(1, true), episode(2, false)],
            ..Default::default()
        });
        for mut sub in item.refreshable_items() {
            sub.mark_updated();
        }
        let MediaItem::Season(season) = &item else {
            panic!("Expected a season");
        };
        assert!(season.episodes[0].updated);
        assert!(!season.episodes[1].updated);
    }

    #[test]
    fn test_deserialize_tagged_item() {
        let json = r#"{
            "type": "episode",
            "number": 3,
            "filesystem_path": "shows/Show/Season 01/e03.mkv",
            "available_in_vfs": true
        }"#;
        let item: MediaItem = match serde_json::from_str(json) {
            Ok(item) => item,
            Err(e) => panic!("Expected episode to parse: {}", e),
        };
        assert_eq!(item.kind(), MediaKind::Episode);
        assert_eq!(item.filesystem_path(), Some("shows/Show/Season 01/e03.mkv"));
        assert!(!item.is_updated());
    }
}
