//! Album names and the destination key layout.
//!
//! Every artifact of an album lives under `pictures/<album>/`:
//!
//! | Artifact | Key |
//! |---|---|
//! | Zip download | `pictures/<album>/<album>.zip` |
//! | Display image | `pictures/<album>/images/<file name>.jpg` |
//! | Thumbnail | `pictures/<album>/thumbnails/<file name>.jpg` |
//! | Gallery page | `pictures/<album>/index.html` |
//!
//! `<file name>` is the full source name, extension included, so `a.jpg`
//! becomes `images/a.jpg.jpg`.

use std::fmt;

use crate::error::{GalleryError, Result};

pub const PICTURES_PREFIX: &str = "pictures";

/// A validated album name: letters, digits, hyphens, and underscores
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Album(String);

impl Album {
    pub fn new(name: impl Into<String>) -> Result<Self> {
        let name = name.into();
        let valid = !name.is_empty()
            && name
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        if valid {
            Ok(Self(name))
        } else {
            Err(GalleryError::InvalidAlbumName(name))
        }
    }

    pub fn name(&self) -> &str {
        &self.0
    }

    /// Key prefix shared by every artifact of this album, with trailing slash
    pub fn prefix(&self) -> String {
        format!("{}/{}/", PICTURES_PREFIX, self.0)
    }

    pub fn zip_key(&self) -> String {
        format!("{}{}.zip", self.prefix(), self.0)
    }

    pub fn image_key(&self, file_name: &str) -> String {
        format!("{}{}", self.prefix(), image_path(file_name))
    }

    pub fn thumbnail_key(&self, file_name: &str) -> String {
        format!("{}{}", self.prefix(), thumbnail_path(file_name))
    }

    pub fn page_key(&self) -> String {
        format!("{}index.html", self.prefix())
    }
}

impl fmt::Display for Album {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Display image path relative to the gallery page
pub fn image_path(file_name: &str) -> String {
    format!("images/{}.jpg", file_name)
}

/// Thumbnail path relative to the gallery page
pub fn thumbnail_path(file_name: &str) -> String {
    format!("thumbnails/{}.jpg", file_name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_album_name_validation() {
        assert!(Album::new("vacation").is_ok());
        assert!(Album::new("Summer_2012-Paris").is_ok());

        assert!(Album::new("").is_err());
        assert!(Album::new("two words").is_err());
        assert!(Album::new("../escape").is_err());
        assert!(Album::new("a/b").is_err());
        assert!(Album::new("café").is_err());
    }

    #[test]
    fn test_key_layout() {
        let album = Album::new("vacation").unwrap();

        assert_eq!(album.prefix(), "pictures/vacation/");
        assert_eq!(album.zip_key(), "pictures/vacation/vacation.zip");
        assert_eq!(
            album.image_key("a.jpg"),
            "pictures/vacation/images/a.jpg.jpg"
        );
        assert_eq!(
            album.thumbnail_key("B.JPG"),
            "pictures/vacation/thumbnails/B.JPG.jpg"
        );
        assert_eq!(album.page_key(), "pictures/vacation/index.html");
    }
}
