//! One full build: global → distance → character units, then the version
//! index and the master index.

use std::path::Path;

use indexmap::IndexMap;
use rayon::prelude::*;
use serde::Serialize;

use crate::aggregate::{sorted_character_ids, unique_count, Aggregator, StatsContext};
use crate::dataset::{publish, DatasetIndex, DatasetVersion, DatasetWriter, Manifest, MasterIndex};
use crate::error::Result;
use crate::records::{Distance, TrainingRecord};

/// What a build produced.
#[derive(Debug, Clone, Serialize)]
pub struct CompileOutput {
    pub index: DatasetIndex,
    pub manifest: Manifest,
    pub master: MasterIndex,
    pub distance_units: usize,
    pub character_units: usize,
}

impl CompileOutput {
    pub fn files_written(&self) -> usize {
        self.manifest.files.len()
    }
}

/// Aggregate `records` and publish them as `version` under `output_root`.
///
/// Distance and character units are computed and written in parallel; the
/// first failure aborts the build before the master index is touched.
pub fn compile(
    ctx: &StatsContext,
    records: &[TrainingRecord],
    output_root: &Path,
    version: &DatasetVersion,
) -> Result<CompileOutput> {
    let writer = DatasetWriter::create(output_root, version)?;
    let agg = Aggregator::new(ctx, version.generated_at());

    log::info!("Calculating global statistics ({} records)...", records.len());
    let global = agg.global(records);
    writer.write_json("global/global.json", &global)?;

    log::info!("Calculating distance statistics...");
    let distance_units = Distance::ALL
        .par_iter()
        .map(|&distance| match agg.distance(records, distance) {
            Some(report) => {
                writer.write_unit("distance", &distance.file_stem(), &report)?;
                log::info!("  {distance}: {} records", report.metadata.total_entries);
                Ok(1)
            }
            None => Ok(0),
        })
        .collect::<Result<Vec<usize>>>()?
        .into_iter()
        .sum();

    let groups = group_by_character(records);
    log::info!("Calculating statistics for {} characters...", groups.len());
    let character_units = groups
        .par_iter()
        .map(|(character_id, slice)| {
            let report = agg.character_report(character_id, slice);
            writer.write_unit("characters", character_id, &report)
        })
        .collect::<Result<Vec<_>>>()?
        .len();

    let manifest = writer.finish()?;

    let index = DatasetIndex {
        generated_at: version.generated_at(),
        total_entries: records.len(),
        total_trainers: unique_count(records.iter().map(|r| r.trainer_id.as_str())),
        total_characters: groups.len(),
        distances: Distance::ALL.iter().map(|d| d.name().to_string()).collect(),
        character_ids: sorted_character_ids(records),
        version: version.id().to_string(),
        name: version.name(),
    };
    let master = publish(output_root, version, &index, &ctx.config.public_base)?;

    Ok(CompileOutput {
        index,
        manifest,
        master,
        distance_units,
        character_units,
    })
}

fn group_by_character(records: &[TrainingRecord]) -> Vec<(&str, Vec<&TrainingRecord>)> {
    let mut groups: IndexMap<&str, Vec<&TrainingRecord>> = IndexMap::new();
    for record in records {
        groups
            .entry(record.character_id.as_str())
            .or_default()
            .push(record);
    }
    groups.into_iter().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::test_support::batch;
    use crate::dataset::verify_version;
    use crate::lookup::LookupTables;
    use chrono::NaiveDate;
    use tempfile::TempDir;

    fn version() -> DatasetVersion {
        let at = NaiveDate::from_ymd_opt(2025, 6, 1)
            .and_then(|d| d.and_hms_micro_opt(10, 0, 0, 0))
            .unwrap();
        DatasetVersion::dated(at)
    }

    #[test]
    fn test_compile_writes_tree() -> Result<()> {
        let root = TempDir::new().unwrap();
        let mut lookups = LookupTables::new();
        lookups.insert_card("30020", "Kitasan Black", Some("speed"));
        lookups.insert_card("30021", "Fine Motion", Some("wiz"));
        let ctx = StatsContext::new(lookups, Default::default());

        let mut records = batch("a", 60, "100201", 7, Distance::Mile);
        records.extend(batch("b", 40, "100101", 6, Distance::Long));

        let out = compile(&ctx, &records, root.path(), &version())?;
        assert_eq!(out.distance_units, 2);
        assert_eq!(out.character_units, 2);
        assert_eq!(out.files_written(), 5);
        assert_eq!(out.index.character_ids, ["100101", "100201"]);
        assert_eq!(out.index.distances, ["Sprint", "Mile", "Medium", "Long", "Dirt"]);
        assert_eq!(out.index.total_trainers, 100);
        assert_eq!(out.master.datasets.len(), 1);

        let dir = root.path().join("2025-06-01");
        assert!(dir.join("global/global.json").is_file());
        assert!(dir.join("distance/mile.json").is_file());
        assert!(!dir.join("distance/sprint.json").exists());
        assert!(dir.join("characters/100101.json").is_file());
        assert!(dir.join("index.json").is_file());
        assert!(root.path().join("datasets.json").is_file());

        let mile: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(dir.join("distance/mile.json")).unwrap())?;
        let combos = &mile["by_team_class"]["7"]["support_card_combinations"];
        assert_eq!(combos["1xspeed_1xwiz"]["percentage"], 100.0);

        // the 40-record Long tier stays under the distance threshold
        let long: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(dir.join("distance/long.json")).unwrap())?;
        assert_eq!(long["metadata"]["total_entries"], 40);
        assert!(long["by_team_class"].get("6").is_none());

        assert_eq!(verify_version(root.path(), "2025-06-01")?, 5);
        Ok(())
    }

    #[test]
    fn test_rebuild_same_version() -> Result<()> {
        let root = TempDir::new().unwrap();
        let ctx = StatsContext::default();
        let records = batch("a", 3, "100101", 7, Distance::Dirt);

        let first = compile(&ctx, &records, root.path(), &version())?;
        let second = compile(&ctx, &records, root.path(), &version())?;
        assert_eq!(first.master, second.master);
        assert_eq!(second.master.datasets.len(), 1);
        Ok(())
    }
}
