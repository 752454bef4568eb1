//! Font discovery and face resolution.
//!
//! Fonts dropped into the configured directory are registered under a family
//! name derived from their filename, so `comic_neue-bold.ttf` becomes
//! `Comic Neue Bold`. Anything not found there resolves against the system
//! font database, ending at the generic sans-serif face.

use std::{
    collections::HashMap,
    fmt, fs, io,
    path::{Path, PathBuf},
};

use ab_glyph::{FontArc, FontVec};
use fontdb::{Database, Family, Query, Weight};
use tracing::{debug, info, warn};

use crate::domain::theme::GENERIC_SANS_SERIF;

const FONT_EXTENSIONS: [&str; 2] = ["ttf", "otf"];
const HIDDEN_PREFIX: &str = "._";
/// Installed families tried, in order, for the generic sans-serif face.
const SANS_SERIF_PREFERENCES: [&str; 8] = [
    "Arial",
    "Helvetica",
    "DejaVu Sans",
    "Liberation Sans",
    "Noto Sans",
    "Open Sans",
    "Roboto",
    "FreeSans",
];

/// A font file and the family name it is registered under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FontEntry {
    pub family: String,
    pub path: PathBuf,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FontWeight {
    Regular,
    Bold,
}

impl FontWeight {
    fn as_fontdb(self) -> Weight {
        match self {
            FontWeight::Regular => Weight::NORMAL,
            FontWeight::Bold => Weight::BOLD,
        }
    }
}

/// Faces available to the renderer. Built once at startup, read-only afterwards.
pub struct FontRegistry {
    entries: Vec<FontEntry>,
    faces: HashMap<String, FontArc>,
    system: Option<Database>,
}

impl FontRegistry {
    /// A registry with no faces at all; text falls back to approximate metrics.
    pub fn empty() -> Self {
        Self {
            entries: Vec::new(),
            faces: HashMap::new(),
            system: None,
        }
    }

    /// Register every loadable font file found directly inside `dir`.
    ///
    /// Unreadable or malformed files are logged and skipped.
    pub fn scan(dir: &Path) -> Self {
        let mut registry = Self::empty();

        let candidates = match discover_font_files(dir) {
            Ok(candidates) => candidates,
            Err(err) => {
                warn!(
                    target = "naas::fonts",
                    directory = %dir.display(),
                    error = %err,
                    "font directory unavailable; using system fonts only"
                );
                return registry;
            }
        };

        for entry in candidates {
            let key = family_key(&entry.family);
            if let Some(kept) = registry.entries.iter().find(|e| family_key(&e.family) == key) {
                warn!(
                    target = "naas::fonts",
                    family = %entry.family,
                    kept = %kept.path.display(),
                    ignored = %entry.path.display(),
                    "duplicate font family; keeping the first loadable file"
                );
                continue;
            }
            match load_face(&entry.path) {
                Ok(face) => {
                    info!(
                        target = "naas::fonts",
                        family = %entry.family,
                        path = %entry.path.display(),
                        "registered font"
                    );
                    registry.faces.insert(key, face);
                    registry.entries.push(entry);
                }
                Err(err) => {
                    warn!(
                        target = "naas::fonts",
                        family = %entry.family,
                        path = %entry.path.display(),
                        error = %err,
                        "failed to register font"
                    );
                }
            }
        }

        registry
    }

    /// Make installed system fonts available as a fallback.
    pub fn with_system_fonts(self) -> Self {
        let mut db = Database::new();
        db.load_system_fonts();
        self.with_database(db)
    }

    fn with_database(mut self, mut db: Database) -> Self {
        let sans_serif = installed_sans_serif(&db);
        debug!(
            target = "naas::fonts",
            faces = db.len(),
            sans_serif = sans_serif.as_deref().unwrap_or("none"),
            "loaded system fonts"
        );
        if let Some(family) = sans_serif {
            db.set_sans_serif_family(family);
        }
        self.system = Some(db);
        self
    }

    pub fn entries(&self) -> &[FontEntry] {
        &self.entries
    }

    /// Find a face for `family`, falling back to the generic sans-serif face.
    ///
    /// Registered families ignore `weight`: one file is one face.
    pub fn resolve(&self, family: &str, weight: FontWeight) -> Option<FontArc> {
        let family = family.trim();
        if !is_generic(family) {
            if let Some(face) = self.faces.get(&family_key(family)) {
                return Some(face.clone());
            }
            if let Some(face) = self.system_face(Family::Name(family), weight) {
                return Some(face);
            }
            debug!(
                target = "naas::fonts",
                family,
                "family not installed; falling back to sans-serif"
            );
        }
        self.system_face(Family::SansSerif, weight)
    }

    fn system_face(&self, family: Family<'_>, weight: FontWeight) -> Option<FontArc> {
        let db = self.system.as_ref()?;
        let families = [family];
        let query = Query {
            families: &families,
            weight: weight.as_fontdb(),
            ..Query::default()
        };
        let id = db.query(&query)?;
        db.with_face_data(id, |data, index| {
            FontVec::try_from_vec_and_index(data.to_vec(), index).ok()
        })
        .flatten()
        .map(FontArc::new)
    }
}

impl fmt::Debug for FontRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FontRegistry")
            .field("entries", &self.entries)
            .field("system_faces", &self.system.as_ref().map(Database::len))
            .finish()
    }
}

/// List font files in `dir`, sorted by filename.
///
/// Several files may derive the same family; [`FontRegistry::scan`] keeps the
/// first one that loads.
pub fn discover_font_files(dir: &Path) -> io::Result<Vec<FontEntry>> {
    let mut names: Vec<(String, PathBuf)> = Vec::new();
    for item in fs::read_dir(dir)? {
        let item = item?;
        if !item.file_type()?.is_file() {
            continue;
        }
        let Some(name) = item.file_name().to_str().map(str::to_string) else {
            continue;
        };
        if is_font_file(&name) {
            names.push((name, item.path()));
        }
    }
    names.sort_by(|a, b| a.0.cmp(&b.0));

    Ok(names
        .into_iter()
        .map(|(name, path)| FontEntry {
            family: family_from_filename(&name),
            path,
        })
        .collect())
}

/// Name of the installed family standing in for `sans-serif`.
///
/// fontdb maps the generic family to Arial, which many Linux hosts lack.
fn installed_sans_serif(db: &Database) -> Option<String> {
    let installed = |wanted: &str| {
        db.faces()
            .flat_map(|face| face.families.iter())
            .map(|(name, _)| name)
            .find(|name| name.eq_ignore_ascii_case(wanted))
            .cloned()
    };
    SANS_SERIF_PREFERENCES
        .iter()
        .find_map(|wanted| installed(wanted))
        .or_else(|| {
            db.faces()
                .filter(|face| !face.monospaced)
                .find_map(|face| face.families.first().map(|(name, _)| name.clone()))
        })
}

fn is_font_file(name: &str) -> bool {
    if name.starts_with(HIDDEN_PREFIX) {
        return false;
    }
    Path::new(name)
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| {
            FONT_EXTENSIONS
                .iter()
                .any(|known| ext.eq_ignore_ascii_case(known))
        })
}

/// Derive a display family from a font filename.
///
/// The extension is dropped, `_` and `-` become spaces, and the first
/// character of every word is upper-cased. Characters inside a word keep
/// their case, so `CamiRaeRegular-l2x0.otf` becomes `CamiRaeRegular L2x0`.
pub fn family_from_filename(name: &str) -> String {
    let stem = Path::new(name)
        .file_stem()
        .and_then(|stem| stem.to_str())
        .unwrap_or(name);

    let mut family = String::with_capacity(stem.len());
    let mut previous_is_word = false;
    for ch in stem.chars() {
        let ch = if ch == '_' || ch == '-' { ' ' } else { ch };
        let is_word = ch.is_ascii_alphanumeric();
        if is_word && !previous_is_word {
            family.push(ch.to_ascii_uppercase());
        } else {
            family.push(ch);
        }
        previous_is_word = is_word;
    }
    family
}

fn load_face(path: &Path) -> Result<FontArc, io::Error> {
    let bytes = fs::read(path)?;
    FontArc::try_from_vec(bytes)
        .map_err(|err| io::Error::new(io::ErrorKind::InvalidData, err.to_string()))
}

fn family_key(family: &str) -> String {
    family.trim().to_ascii_lowercase()
}

fn is_generic(family: &str) -> bool {
    family.is_empty()
        || family.eq_ignore_ascii_case(GENERIC_SANS_SERIF)
        || family.eq_ignore_ascii_case("sans serif")
}


#[cfg(test)]
pub(crate) mod test_support {
    use fontdb::Source;

    use super::*;

    /// Path of an installed proportional `.ttf`/`.otf` face.
    pub(crate) fn installed_sans_file() -> PathBuf {
        let mut db = Database::new();
        db.load_system_fonts();
        db.faces()
            .filter(|face| !face.monospaced && face.index == 0)
            .find_map(|face| match &face.source {
                Source::File(path)
                    if path
                        .file_name()
                        .and_then(|name| name.to_str())
                        .is_some_and(is_font_file) =>
                {
                    Some(path.clone())
                }
                _ => None,
            })
            .expect("tests need an installed .ttf or .otf font")
    }
}
