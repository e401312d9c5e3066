use std::collections::HashMap;
use std::path::Path;

use anyhow::{Context, Result};

use mirvar_core::Strand;
use mirvar_core::utils::get_dynamic_reader;

/// Genomic placement of one annotated miRNA feature.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MirnaFeature {
    pub chrom: String,
    /// 1-based inclusive.
    pub start: u32,
    pub end: u32,
    pub strand: Strand,
    /// Name of the hairpin this mature feature derives from.
    pub hairpin: Option<String>,
}

/// Coordinates parsed from the annotation GFF3, keyed by feature `Name`.
#[derive(Debug, Default)]
pub struct CoordinateMap {
    pub matures: HashMap<String, MirnaFeature>,
    pub hairpins: HashMap<String, MirnaFeature>,
}

fn attribute<'a>(attrs: &'a str, key: &str) -> Option<&'a str> {
    attrs
        .split(';')
        .filter_map(|kv| kv.trim().split_once('='))
        .find(|(k, _)| *k == key)
        .map(|(_, v)| v)
}

///
/// Read miRNA coordinates from a GFF3 annotation.
///
/// `miRNA_primary_transcript` features become hairpin entries;
/// `miRNA` features become mature entries linked to their hairpin through
/// the `Derives_from` attribute (which references the primary transcript's
/// `ID`).
///
pub fn read_coordinates(path: &Path) -> Result<CoordinateMap> {
    use std::io::BufRead;

    let reader = get_dynamic_reader(path)?;

    struct RawFeature {
        name: String,
        feature: MirnaFeature,
        derives_from: Option<String>,
    }

    // primary transcript ID -> Name, resolved after the full pass since
    // miRBase does not guarantee parent-before-child ordering
    let mut primary_names: HashMap<String, String> = HashMap::new();
    let mut matures: Vec<RawFeature> = Vec::new();
    let mut map = CoordinateMap::default();

    for (line_num, line) in reader.lines().enumerate() {
        let line = line?;
        if line.starts_with('#') || line.trim().is_empty() {
            continue;
        }
        let fields: Vec<&str> = line.split('\t').collect();
        if fields.len() < 9 {
            anyhow::bail!(
                "{}: line {} has {} fields, expected 9",
                path.display(),
                line_num + 1,
                fields.len()
            );
        }

        let feature_type = fields[2];
        if feature_type != "miRNA" && feature_type != "miRNA_primary_transcript" {
            continue;
        }

        let start: u32 = fields[3]
            .parse()
            .with_context(|| format!("{}: bad start on line {}", path.display(), line_num + 1))?;
        let end: u32 = fields[4]
            .parse()
            .with_context(|| format!("{}: bad end on line {}", path.display(), line_num + 1))?;
        let strand = Strand::parse(fields[6]).with_context(|| {
            format!("{}: bad strand on line {}", path.display(), line_num + 1)
        })?;

        let attrs = fields[8];
        let name = attribute(attrs, "Name")
            .or_else(|| attribute(attrs, "ID"))
            .with_context(|| {
                format!("{}: feature without Name on line {}", path.display(), line_num + 1)
            })?
            .to_string();

        let feature = MirnaFeature {
            chrom: fields[0].to_string(),
            start,
            end,
            strand,
            hairpin: None,
        };

        if feature_type == "miRNA_primary_transcript" {
            if let Some(id) = attribute(attrs, "ID") {
                primary_names.insert(id.to_string(), name.clone());
            }
            map.hairpins.insert(name, feature);
        } else {
            matures.push(RawFeature {
                name,
                feature,
                derives_from: attribute(attrs, "Derives_from").map(|v| v.to_string()),
            });
        }
    }

    for raw in matures {
        let mut feature = raw.feature;
        feature.hairpin = raw
            .derives_from
            .and_then(|id| primary_names.get(&id).cloned());
        map.matures.insert(raw.name, feature);
    }

    Ok(map)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const GFF: &str = "\
##gff-version 3
chr14\t.\tmiRNA_primary_transcript\t100\t180\t.\t+\t.\tID=MI0017340;Name=hsa-mir-4707
chr14\t.\tmiRNA\t110\t131\t.\t+\t.\tID=MIMAT0019807;Name=hsa-miR-4707-5p;Derives_from=MI0017340
chr2\t.\tmiRNA\t5000\t5021\t.\t-\t.\tID=MIMAT0000449;Name=hsa-miR-146a-5p;Derives_from=MI0000477
chr2\t.\tmiRNA_primary_transcript\t4980\t5078\t.\t-\t.\tID=MI0000477;Name=hsa-mir-146a
";

    #[test]
    fn links_matures_to_hairpins() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("coords.gff3");
        std::fs::write(&path, GFF).unwrap();

        let map = read_coordinates(&path).unwrap();
        assert_eq!(map.hairpins.len(), 2);
        assert_eq!(map.matures.len(), 2);

        let m = &map.matures["hsa-miR-4707-5p"];
        assert_eq!(m.chrom, "chr14");
        assert_eq!((m.start, m.end), (110, 131));
        assert_eq!(m.hairpin.as_deref(), Some("hsa-mir-4707"));

        // parent declared after the child still resolves
        let m = &map.matures["hsa-miR-146a-5p"];
        assert_eq!(m.strand, Strand::Reverse);
        assert_eq!(m.hairpin.as_deref(), Some("hsa-mir-146a"));
    }
}
