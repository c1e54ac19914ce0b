//! Zone archives
//!
//! A zone `<short>` ships as up to three archives in the game directory:
//! `<short>.s3d` with the terrain, `<short>_obj.s3d` with placeable objects,
//! and `<short>_chr.s3d` with characters. Each holds bitmaps and one or more
//! `.wld` streams referring to them by material name.

mod error;

pub use error::{ZoneError, ZoneResult};

use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::pfs::{PfsArchive, PfsEntry};
use crate::wld::{WldFile, WldOptions};

/// Extensions of archive entries holding bitmaps
const BITMAP_EXTENSIONS: &[&str] = &["bmp", "dds"];

/// Which of a zone's archives a file is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ArchiveRole {
    /// `<short>.s3d`
    Main,
    /// `<short>_obj.s3d`
    Objects,
    /// `<short>_chr.s3d`
    Characters,
}

impl ArchiveRole {
    /// File name suffix after the zone's short name
    pub fn suffix(self) -> &'static str {
        match self {
            Self::Main => "",
            Self::Objects => "_obj",
            Self::Characters => "_chr",
        }
    }

    /// Archive file name for zone `short`
    pub fn file_name(self, short: &str) -> String {
        format!("{short}{}.s3d", self.suffix())
    }
}

/// Paths of the archives making up one zone
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ZoneFiles {
    /// Zone short name, such as `gfaydark`
    pub short_name: String,
    /// Terrain archive
    pub main: PathBuf,
    /// Object archive, if present
    pub objects: Option<PathBuf>,
    /// Character archive, if present
    pub characters: Option<PathBuf>,
}

impl ZoneFiles {
    /// Locate the archives of zone `short_name` in `dir`
    ///
    /// Only the main archive is required.
    pub fn discover(dir: impl AsRef<Path>, short_name: &str) -> ZoneResult<Self> {
        let dir = dir.as_ref();
        let locate = |role: ArchiveRole| {
            let path = dir.join(role.file_name(short_name));
            path.is_file().then_some(path)
        };

        let main = locate(ArchiveRole::Main).ok_or_else(|| {
            ZoneError::MissingArchive(dir.join(ArchiveRole::Main.file_name(short_name)))
        })?;

        Ok(Self {
            short_name: short_name.to_string(),
            main,
            objects: locate(ArchiveRole::Objects),
            characters: locate(ArchiveRole::Characters),
        })
    }

    /// Present archives with their roles
    pub fn archives(&self) -> impl Iterator<Item = (ArchiveRole, &Path)> {
        [
            (ArchiveRole::Main, Some(self.main.as_path())),
            (ArchiveRole::Objects, self.objects.as_deref()),
            (ArchiveRole::Characters, self.characters.as_deref()),
        ]
        .into_iter()
        .filter_map(|(role, path)| path.map(|path| (role, path)))
    }
}

/// An archive with its WLD streams decoded
#[derive(Debug)]
pub struct ZoneArchive {
    role: ArchiveRole,
    archive: PfsArchive,
    worlds: Vec<(String, WldFile)>,
    material_suffix: String,
}

impl ZoneArchive {
    /// Open and decode the archive at `path`
    pub fn load(
        path: impl AsRef<Path>,
        role: ArchiveRole,
        options: &WldOptions,
    ) -> ZoneResult<Self> {
        let archive = PfsArchive::open(path)?;
        Self::from_archive(archive, role, options)
    }

    /// Decode every `.wld` entry of an archive already in memory
    pub fn from_archive(
        archive: PfsArchive,
        role: ArchiveRole,
        options: &WldOptions,
    ) -> ZoneResult<Self> {
        let mut worlds = Vec::new();
        for entry in archive.entries_with_extension("wld") {
            let name = entry.name.clone().unwrap_or_default();
            let wld = WldFile::parse_with(&entry.data, options).map_err(|source| {
                ZoneError::Wld {
                    entry: name.clone(),
                    source,
                }
            })?;
            worlds.push((name, wld));
        }

        let zone = Self {
            role,
            archive,
            worlds,
            material_suffix: options.bitmap_suffix.clone(),
        };
        debug!(
            "Loaded {:?} archive: {} entries, {} bitmaps, {} WLD streams",
            role,
            zone.archive.len(),
            zone.bitmaps().count(),
            zone.worlds.len()
        );
        Ok(zone)
    }

    /// Role of the archive within its zone
    pub fn role(&self) -> ArchiveRole {
        self.role
    }

    /// Underlying archive
    pub fn archive(&self) -> &PfsArchive {
        &self.archive
    }

    /// Decoded WLD streams with their entry names
    pub fn worlds(&self) -> &[(String, WldFile)] {
        &self.worlds
    }

    /// Decoded WLD stream by entry name
    pub fn world(&self, name: &str) -> Option<&WldFile> {
        self.worlds
            .iter()
            .find(|(entry, _)| entry.eq_ignore_ascii_case(name))
            .map(|(_, wld)| wld)
    }

    /// Entries holding bitmaps
    pub fn bitmaps(&self) -> impl Iterator<Item = &PfsEntry> {
        self.archive.entries().iter().filter(|entry| {
            entry
                .extension()
                .is_some_and(|ext| BITMAP_EXTENSIONS.iter().any(|b| ext.eq_ignore_ascii_case(b)))
        })
    }

    /// Material names of the bitmaps, as bitmap name lists spell them
    pub fn materials(&self) -> impl Iterator<Item = String> + '_ {
        self.bitmaps()
            .filter_map(|entry| entry.name.as_deref())
            .map(|name| format!("{name}{}", self.material_suffix))
    }

    /// Bitmap entry for a material name such as `grass.bmp_Material`
    pub fn bitmap(&self, material: &str) -> Option<&PfsEntry> {
        let file = material
            .strip_suffix(self.material_suffix.as_str())
            .unwrap_or(material);
        self.archive.entry(file)
    }
}

/// All archives of one zone, decoded
#[derive(Debug)]
pub struct Zone {
    /// Archive paths
    pub files: ZoneFiles,
    /// Terrain archive
    pub main: ZoneArchive,
    /// Object archive
    pub objects: Option<ZoneArchive>,
    /// Character archive
    pub characters: Option<ZoneArchive>,
}

impl Zone {
    /// Discover and load zone `short_name` from `dir`
    pub fn open(dir: impl AsRef<Path>, short_name: &str, options: &WldOptions) -> ZoneResult<Self> {
        Self::load(ZoneFiles::discover(dir, short_name)?, options)
    }

    /// Load the archives listed in `files`
    pub fn load(files: ZoneFiles, options: &WldOptions) -> ZoneResult<Self> {
        let load_optional = |path: &Option<PathBuf>, role| {
            path.as_ref()
                .map(|path| ZoneArchive::load(path, role, options))
                .transpose()
        };

        let main = ZoneArchive::load(&files.main, ArchiveRole::Main, options)?;
        let objects = load_optional(&files.objects, ArchiveRole::Objects)?;
        let characters = load_optional(&files.characters, ArchiveRole::Characters)?;

        Ok(Self {
            files,
            main,
            objects,
            characters,
        })
    }

    /// Loaded archives
    pub fn archives(&self) -> impl Iterator<Item = &ZoneArchive> {
        std::iter::once(&self.main)
            .chain(self.objects.as_ref())
            .chain(self.characters.as_ref())
    }

    /// Bitmap entry for a material name, searched across all archives
    pub fn bitmap(&self, material: &str) -> Option<&PfsEntry> {
        self.archives().find_map(|archive| archive.bitmap(material))
    }
}
