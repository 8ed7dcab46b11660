//! Stats Builder Library
//!
//! 원본 행 (CSV / JSON / SQLite) → 정규화 → 집계 → 버전별 JSON 데이터셋
//! Lookup tables (skills, support cards, characters, colours) → 이름 해석

pub mod lookups;
pub mod source;

use anyhow::{Context, Result};
use chrono::NaiveDateTime;
use serde::Serialize;
use stats_core::dataset::DatasetEntry;
use stats_core::{
    compile, load_master_index, normalize_rows, verify_version, DatasetVersion, NormalizeStats,
    StatsConfig, StatsContext,
};
use std::fs;
use std::path::{Path, PathBuf};

pub use lookups::load_lookup_tables;
pub use source::{open_source, ParseStats, RowSource, TEAM_STADIUM_QUERY};

/// 빌드 옵션
#[derive(Debug, Clone)]
pub struct BuildOptions {
    /// 원본 행 파일 (csv, json, jsonl, sqlite)
    pub input: PathBuf,
    /// `skills.json` 등 lookup 테이블 디렉토리
    pub data_dir: PathBuf,
    /// 캐릭터 색상용 게임 마스터 DB
    pub game_db: Option<PathBuf>,
    /// 데이터셋 루트 (`datasets.json` 위치)
    pub output_root: PathBuf,
    /// 버전 키; 없으면 생성 날짜 (`YYYY-MM-DD`)
    pub version: Option<String>,
    /// YAML 설정 파일
    pub config: Option<PathBuf>,
}

/// 빌드 결과 요약
#[derive(Debug, Clone, Serialize)]
pub struct BuildSummary {
    pub version: String,
    pub generated_at: String,
    pub base_path: String,
    pub parse: ParseStats,
    pub normalize: NormalizeStats,
    pub total_entries: usize,
    pub total_trainers: usize,
    pub total_characters: usize,
    pub distance_units: usize,
    pub character_units: usize,
    pub files_written: usize,
}

/// 설정 로드 (파일이 없으면 기본값)
pub fn load_config(path: Option<&Path>) -> Result<StatsConfig> {
    let Some(path) = path else {
        return Ok(StatsConfig::default());
    };
    let yaml = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;
    StatsConfig::from_yaml_str(&yaml)
        .with_context(|| format!("Invalid config file: {}", path.display()))
}

/// 원본 행을 읽어 하나의 데이터셋 버전을 빌드
///
/// # Arguments
///
/// * `opts` - 입력/출력 경로와 버전
///
/// # Returns
///
/// 빌드 결과 요약
pub fn build_statistics(opts: &BuildOptions) -> Result<BuildSummary> {
    build_statistics_at(opts, chrono::Local::now().naive_local())
}

/// [`build_statistics`] with a fixed generation time.
pub fn build_statistics_at(opts: &BuildOptions, generated_at: NaiveDateTime) -> Result<BuildSummary> {
    // 1. 설정 + 버전
    let config = load_config(opts.config.as_deref())?;
    let version = match &opts.version {
        Some(id) => DatasetVersion::new(id.clone(), generated_at)?,
        None => DatasetVersion::dated(generated_at),
    };

    // 2. 원본 행 읽기
    let source = open_source(&opts.input)?;
    log::info!("Loading rows from {}", source.describe());
    let (rows, parse) = source.load()?;
    if parse.failed > 0 {
        log::warn!("{} of {} rows could not be parsed", parse.failed, parse.total_rows);
    }

    // 3. 정규화
    let (records, normalize) = normalize_rows(&rows);
    log::info!(
        "Normalized {} records ({} rejected)",
        normalize.kept,
        normalize.rejected
    );

    // 4. Lookup 테이블
    let lookups = load_lookup_tables(&opts.data_dir, opts.game_db.as_deref());

    // 5. 집계 + 출력
    let ctx = StatsContext::new(lookups, config);
    let output = compile(&ctx, &records, &opts.output_root, &version).with_context(|| {
        format!(
            "Failed to build dataset {} under {}",
            version.id(),
            opts.output_root.display()
        )
    })?;

    Ok(BuildSummary {
        version: version.id().to_string(),
        generated_at: version.generated_at(),
        base_path: version.base_path(&ctx.config.public_base),
        parse,
        normalize,
        total_entries: output.index.total_entries,
        total_trainers: output.index.total_trainers,
        total_characters: output.index.total_characters,
        distance_units: output.distance_units,
        character_units: output.character_units,
        files_written: output.files_written(),
    })
}

/// 데이터셋 버전의 무결성 검증
///
/// # Returns
///
/// 검증된 파일 수
pub fn verify_dataset(output_root: &Path, version: &str) -> Result<usize> {
    verify_version(output_root, version).with_context(|| {
        format!(
            "Dataset {} failed verification under {}",
            version,
            output_root.display()
        )
    })
}

/// Published datasets, newest first. Empty when nothing was published yet.
pub fn list_datasets(output_root: &Path) -> Result<Vec<DatasetEntry>> {
    let master = load_master_index(output_root).with_context(|| {
        format!("Failed to read master index under {}", output_root.display())
    })?;
    Ok(master.map(|m| m.datasets).unwrap_or_default())
}
