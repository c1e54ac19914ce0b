//! Command implementations.
//!
//! Every command writes its report to a caller-supplied writer, as text or as
//! pretty-printed JSON.

use serde::Serialize;
use std::collections::BTreeMap;
use std::io::Write;
use std::path::Path;
use tracing::{debug, info, warn};
use zeq_formats::pfs::{PfsArchive, PfsEntry};
use zeq_formats::wld::{FragmentData, FragmentKind, TextureSet, WldFile, WldOptions};
use zeq_formats::zone::{ArchiveRole, Zone};

use crate::config::{Command, InspectConfig};
use crate::error::InspectError;

/// One archive entry in a listing.
#[derive(Debug, Clone, Serialize)]
pub struct EntrySummary {
    /// File name, if the name table covers the entry
    pub name: Option<String>,
    /// Directory checksum
    pub crc: u32,
    /// Offset of the first block
    pub offset: u32,
    /// Inflated size
    pub size: usize,
}

impl From<&PfsEntry> for EntrySummary {
    fn from(entry: &PfsEntry) -> Self {
        Self {
            name: entry.name.clone(),
            crc: entry.crc,
            offset: entry.offset,
            size: entry.size(),
        }
    }
}

/// One fragment in a dump.
#[derive(Debug, Clone, Serialize)]
pub struct FragmentSummary<'a> {
    /// 1-based sequence number
    pub index: u32,
    /// Type tag and label
    pub kind: String,
    /// Fragment name
    pub name: Option<&'a str>,
    /// Decoded payload
    pub data: &'a FragmentData,
}

/// Per-archive part of a zone report.
#[derive(Debug, Clone, Serialize)]
pub struct ArchiveSummary {
    /// Archive role within the zone
    pub role: ArchiveRole,
    /// Number of entries
    pub entries: usize,
    /// Number of bitmap entries
    pub bitmaps: usize,
    /// Fragment counts of each WLD stream
    pub worlds: BTreeMap<String, BTreeMap<String, usize>>,
}

/// Run the configured command.
///
/// # Errors
///
/// Returns `InspectError` if an input cannot be decoded or output cannot be
/// written.
pub fn run(config: &InspectConfig, out: &mut impl Write) -> Result<(), InspectError> {
    let options = config.wld_options();
    match &config.command {
        Command::List { archive } => list(&PfsArchive::open(archive)?, config.json, out),
        Command::Extract {
            archive,
            output,
            entries,
        } => extract(&PfsArchive::open(archive)?, output, entries, out),
        Command::Fragments { archive, wld, .. } => {
            let archive = PfsArchive::open(archive)?;
            let wld = decode_stream(&archive, wld.as_deref(), &options)?;
            fragments(&wld, config.kind_filter()?, config.json, out)
        }
        Command::Textures { archive, wld } => {
            let archive = PfsArchive::open(archive)?;
            let wld = decode_stream(&archive, wld.as_deref(), &options)?;
            textures(&wld.texture_sets(), config.json, out)
        }
        Command::Zone { dir, short_name } => {
            let zone = Zone::open(dir, short_name, &options)?;
            zone_summary(&zone, config.json, out)
        }
    }
}

/// Decode the named `.wld` entry, or the first one.
pub fn decode_stream(
    archive: &PfsArchive,
    name: Option<&str>,
    options: &WldOptions,
) -> Result<WldFile, InspectError> {
    let entry = match name {
        Some(name) => archive.entry(name),
        None => archive.entries_with_extension("wld").next(),
    }
    .ok_or_else(|| InspectError::MissingEntry(name.unwrap_or("*.wld").to_string()))?;

    debug!(
        "Decoding {} ({} bytes)",
        entry.name.as_deref().unwrap_or("<unnamed>"),
        entry.size()
    );
    Ok(WldFile::parse_with(&entry.data, options)?)
}

/// Print the entries of an archive.
pub fn list(archive: &PfsArchive, json: bool, out: &mut impl Write) -> Result<(), InspectError> {
    let summaries: Vec<EntrySummary> = archive.entries().iter().map(Into::into).collect();
    if json {
        return write_json(&summaries, out);
    }

    for entry in &summaries {
        writeln!(
            out,
            "{:08X} {:>10} {:>10}  {}",
            entry.crc,
            entry.offset,
            entry.size,
            entry.name.as_deref().unwrap_or("<unnamed>")
        )?;
    }
    writeln!(out, "{} entries", summaries.len())?;
    Ok(())
}

/// Write entries to `output`, all of them when `names` is empty.
pub fn extract(
    archive: &PfsArchive,
    output: &Path,
    names: &[String],
    out: &mut impl Write,
) -> Result<(), InspectError> {
    let selected: Vec<&PfsEntry> = if names.is_empty() {
        archive.entries().iter().collect()
    } else {
        names
            .iter()
            .map(|name| {
                archive
                    .entry(name)
                    .ok_or_else(|| InspectError::MissingEntry(name.clone()))
            })
            .collect::<Result<_, _>>()?
    };

    std::fs::create_dir_all(output)?;
    let mut written = 0;
    for entry in selected {
        let file_name = match entry.name.as_deref() {
            Some(name) if is_plain_file_name(name) => name.to_string(),
            Some(name) => {
                warn!("Skipping entry with unsafe name {:?}", name);
                continue;
            }
            None => format!("unnamed_{:08x}.bin", entry.offset),
        };

        std::fs::write(output.join(&file_name), &entry.data)?;
        writeln!(out, "{file_name} ({} bytes)", entry.size())?;
        written += 1;
    }

    info!("Extracted {} entries to {}", written, output.display());
    Ok(())
}

fn is_plain_file_name(name: &str) -> bool {
    !name.is_empty() && name != "." && name != ".." && !name.contains(['/', '\\', ':'])
}

/// Print the fragments of a stream, optionally of one kind only.
pub fn fragments(
    wld: &WldFile,
    kind: Option<FragmentKind>,
    json: bool,
    out: &mut impl Write,
) -> Result<(), InspectError> {
    let selected = wld
        .fragments()
        .filter(|fragment| kind.is_none_or(|kind| fragment.kind() == kind));

    if json {
        let summaries: Vec<FragmentSummary<'_>> = selected
            .map(|fragment| FragmentSummary {
                index: fragment.index,
                kind: fragment.kind().to_string(),
                name: wld.name(fragment),
                data: &fragment.data,
            })
            .collect();
        return write_json(&summaries, out);
    }

    for fragment in selected {
        writeln!(
            out,
            "{:>6}  {:<32} {}",
            fragment.index,
            fragment.kind().to_string(),
            wld.name(fragment).unwrap_or("")
        )?;
    }
    writeln!(
        out,
        "{} records, {} decoded",
        wld.len(),
        wld.fragment_count()
    )?;
    Ok(())
}

/// Print resolved texture sets.
pub fn textures(sets: &[TextureSet], json: bool, out: &mut impl Write) -> Result<(), InspectError> {
    if json {
        return write_json(&sets, out);
    }

    for set in sets {
        writeln!(out, "texture list {}", set.list_index)?;
        for (slot, texture) in &set.textures {
            match texture.animation_delay {
                Some(delay) => writeln!(
                    out,
                    "  [{slot}] {} ({delay} ms)",
                    texture.names.join(", ")
                )?,
                None => writeln!(out, "  [{slot}] {}", texture.names.join(", "))?,
            }
        }
    }
    Ok(())
}

/// Print a summary of every archive of a zone.
pub fn zone_summary(zone: &Zone, json: bool, out: &mut impl Write) -> Result<(), InspectError> {
    let summaries: Vec<ArchiveSummary> = zone
        .archives()
        .map(|archive| ArchiveSummary {
            role: archive.role(),
            entries: archive.archive().len(),
            bitmaps: archive.bitmaps().count(),
            worlds: archive
                .worlds()
                .iter()
                .map(|(name, wld)| {
                    let counts = wld
                        .kind_counts()
                        .into_iter()
                        .map(|(kind, count)| (kind.to_string(), count))
                        .collect();
                    (name.clone(), counts)
                })
                .collect(),
        })
        .collect();

    if json {
        return write_json(&summaries, out);
    }

    writeln!(out, "zone {}", zone.files.short_name)?;
    for summary in &summaries {
        writeln!(
            out,
            "{:?}: {} entries, {} bitmaps",
            summary.role, summary.entries, summary.bitmaps
        )?;
        for (name, counts) in &summary.worlds {
            writeln!(out, "  {name}")?;
            for (kind, count) in counts {
                writeln!(out, "    {kind:<32} {count}")?;
            }
        }
    }
    Ok(())
}

fn write_json<T: Serialize + ?Sized>(value: &T, out: &mut impl Write) -> Result<(), InspectError> {
    serde_json::to_writer_pretty(&mut *out, value)?;
    writeln!(out)?;
    Ok(())
}
