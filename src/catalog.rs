//! Default track catalog.
//!
//! Pink noise is synthesized; every other track is a local audio file
//! resolved against the assets directory.

use std::path::Path;

use crate::types::{NoiseKind, Track, TrackCategory};

/// File-backed catalog entries: (id, title, category, file name).
const FILE_TRACKS: &[(&str, &str, TrackCategory, &str)] = &[
    ("white-noise", "White Noise", TrackCategory::Noise, "white-noise.mp3"),
    ("brown-noise", "Brown Noise", TrackCategory::Noise, "soft-brown-noise.mp3"),
    ("rain", "Rain", TrackCategory::Nature, "rain.mp3"),
    ("wind", "Wind", TrackCategory::Nature, "wind.mp3"),
    ("waves", "Waves", TrackCategory::Nature, "waves.mp3"),
    ("forest", "Forest", TrackCategory::Nature, "forest.mp3"),
    ("lofi", "Lo-Fi", TrackCategory::Music, "lofi.mp3"),
    ("classical", "Piano", TrackCategory::Music, "piano.mp3"),
    ("jazz", "Jazz", TrackCategory::Music, "jazz.mp3"),
];

/// Builds the default catalog with file tracks under `assets_dir`.
#[must_use]
pub fn default_catalog(assets_dir: &Path) -> Vec<Track> {
    let mut tracks: Vec<Track> = FILE_TRACKS
        .iter()
        .map(|(id, title, category, file)| Track::file(*id, *title, *category, assets_dir.join(file)))
        .collect();

    // Keep pink noise between the two file-backed noise tracks.
    tracks.insert(
        1,
        Track::synth("pink-noise", "Pink Noise", TrackCategory::Noise, NoiseKind::Pink),
    );
    tracks
}

/// Finds a track by id.
#[must_use]
pub fn find_track<'a>(catalog: &'a [Track], id: &str) -> Option<&'a Track> {
    catalog.iter().find(|track| track.id == id)
}

/// Returns the tracks in `category`, preserving catalog order.
#[must_use]
pub fn filter_by_category(catalog: &[Track], category: TrackCategory) -> Vec<&Track> {
    catalog.iter().filter(|track| track.category == category).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{SourceDescriptor, TrackKind};
    use std::collections::HashSet;

    #[test]
    fn test_catalog_ids_are_unique() {
        let catalog = default_catalog(Path::new("/assets"));
        let ids: HashSet<_> = catalog.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids.len(), catalog.len());
        assert_eq!(catalog.len(), 10);
    }

    #[test]
    fn test_pink_noise_is_synthesized() {
        let catalog = default_catalog(Path::new("/assets"));
        let pink = find_track(&catalog, "pink-noise").unwrap();
        assert_eq!(pink.kind(), TrackKind::Synth);
        assert_eq!(pink.source, SourceDescriptor::Synth(NoiseKind::Pink));
        assert_eq!(catalog[1].id, "pink-noise");
    }

    #[test]
    fn test_file_tracks_resolve_against_assets_dir() {
        let catalog = default_catalog(Path::new("/assets"));
        let rain = find_track(&catalog, "rain").unwrap();
        assert_eq!(
            rain.source,
            SourceDescriptor::File(Path::new("/assets").join("rain.mp3"))
        );
    }

    #[test]
    fn test_filter_by_category() {
        let catalog = default_catalog(Path::new("/assets"));
        let noise: Vec<_> = filter_by_category(&catalog, TrackCategory::Noise)
            .iter()
            .map(|t| t.id.as_str())
            .collect();
        assert_eq!(noise, vec!["white-noise", "pink-noise", "brown-noise"]);
        assert_eq!(filter_by_category(&catalog, TrackCategory::Nature).len(), 4);
        assert_eq!(filter_by_category(&catalog, TrackCategory::Music).len(), 3);
    }

    #[test]
    fn test_find_track_missing() {
        let catalog = default_catalog(Path::new("/assets"));
        assert!(find_track(&catalog, "missing").is_none());
    }
}
