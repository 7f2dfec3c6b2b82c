use anyhow::{bail, Result};

/// One track to fetch lyrics for. `index` only correlates the track with
/// status reporting and carries no ordering meaning.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackDescriptor {
    title: String,
    artist: String,
    index: usize,
}

impl TrackDescriptor {
    pub fn new(title: &str, artist: &str, index: usize) -> Result<Self> {
        let title = title.trim();
        let artist = artist.trim();

        if title.is_empty() {
            bail!("Track {} has an empty title", index);
        }
        if artist.is_empty() {
            bail!("Track {} has an empty artist", index);
        }

        Ok(Self {
            title: title.to_string(),
            artist: artist.to_string(),
            index,
        })
    }

    /// Parses an `"Artist - Song"` entry. Only the first separator splits,
    /// so titles may contain `" - "` themselves.
    pub fn parse(entry: &str, index: usize) -> Result<Self> {
        match entry.split_once(" - ") {
            Some((artist, title)) => Self::new(title, artist, index),
            None => bail!("Expected \"Artist - Song\", got \"{}\"", entry.trim()),
        }
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn artist(&self) -> &str {
        &self.artist
    }

    pub fn index(&self) -> usize {
        self.index
    }
}

impl std::fmt::Display for TrackDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} - {}", self.artist, self.title)
    }
}

/// Raw lyric bytes as returned by a downloader.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct LyricPayload(Vec<u8>);

impl LyricPayload {
    pub fn new(data: impl Into<Vec<u8>>) -> Self {
        Self(data.into())
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Published once per successful download.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletionNotification {
    pub track: TrackDescriptor,
    pub lyric: LyricPayload,
}

/// Builds the list of tracks from `"Artist - Song"` lines, skipping blank
/// lines and `#` comments. Indices follow the order of accepted entries.
pub fn parse_batch<'a>(lines: impl IntoIterator<Item = &'a str>) -> Result<Vec<TrackDescriptor>> {
    let mut batch = Vec::new();

    for line in lines {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        batch.push(TrackDescriptor::parse(line, batch.len())?);
    }

    Ok(batch)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_track() {
        let track = TrackDescriptor::parse("Daft Punk - One More Time", 3).unwrap();
        assert_eq!(track.artist(), "Daft Punk");
        assert_eq!(track.title(), "One More Time");
        assert_eq!(track.index(), 3);
        assert_eq!(track.to_string(), "Daft Punk - One More Time");
    }

    #[test]
    fn test_parse_track_splits_on_first_separator() {
        let track = TrackDescriptor::parse("Artist - Song - Live", 0).unwrap();
        assert_eq!(track.artist(), "Artist");
        assert_eq!(track.title(), "Song - Live");
    }

    #[test]
    fn test_rejects_empty_fields() {
        assert!(TrackDescriptor::new("", "Artist", 0).is_err());
        assert!(TrackDescriptor::new("Song", "   ", 0).is_err());
        assert!(TrackDescriptor::parse("no separator here", 0).is_err());
        assert!(TrackDescriptor::parse(" - Song", 0).is_err());
    }

    #[test]
    fn test_parse_batch_skips_comments() {
        let input = "# favourites\nArtistA - SongA\n\n  ArtistB - SongB  \n";
        let batch = parse_batch(input.lines()).unwrap();
        assert_eq!(batch.len(), 2);
        assert_eq!(batch[0].index(), 0);
        assert_eq!(batch[1].index(), 1);
        assert_eq!(batch[1].title(), "SongB");
    }

    #[test]
    fn test_parse_batch_reports_bad_line() {
        let err = parse_batch(["ArtistA - SongA", "garbage"]).unwrap_err();
        assert!(err.to_string().contains("garbage"));
    }
}
