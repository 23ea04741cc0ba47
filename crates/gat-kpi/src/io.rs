//! Persisting episode frames.
//!
//! Every table is first written under `<dir>/episode-tables/<table>.<ext>`
//! and then copied to `<dir>/<table>.<ext>`. Partitioned tables stay in the
//! staging directory as hive-style `key=value/part-NNNN.parquet` trees.

use std::{
    ffi::OsStr,
    fs::{self, File},
    path::{Path, PathBuf},
};

use anyhow::{anyhow, bail, Context, Result};
use polars::frame::group_by::GroupsIndicator;
use polars::prelude::*;
#[cfg(feature = "parquet")]
use polars::prelude::{ParquetReader, ParquetWriter};
use tracing::{debug, info};

use crate::config::{OutputConfig, OutputFormat};
use crate::frames::EpisodeFrames;

pub const EPISODE_TABLES_STAGE: &str = "episode-tables";

pub fn staged_output_path(output: &Path, stage: &str) -> PathBuf {
    let parent = output.parent().unwrap_or_else(|| Path::new("."));
    let file_name = output.file_name().unwrap_or_else(|| OsStr::new("output"));
    parent.join(stage).join(file_name)
}

/// Write all eight tables into `dir` and return the written locations.
///
/// Partition columns apply only to tables that carry all of them; the other
/// tables are written as single files.
pub fn persist_frames(
    frames: EpisodeFrames,
    dir: &Path,
    output: &OutputConfig,
) -> Result<Vec<PathBuf>> {
    if !output.partitions.is_empty() && output.format == OutputFormat::Csv {
        bail!("partitioned output requires the parquet format");
    }
    fs::create_dir_all(dir)
        .with_context(|| format!("creating output directory '{}'", dir.display()))?;

    let mut written = Vec::new();
    for (kind, mut df) in frames.into_tables() {
        let path = dir.join(format!("{}.{}", kind.as_str(), output.format.extension()));
        let partitions = applicable_partitions(&df, &output.partitions);
        let location = persist_dataframe(
            &mut df,
            &path,
            output.format,
            partitions,
            EPISODE_TABLES_STAGE,
        )?;
        debug!(table = kind.as_str(), rows = df.height(), path = %location.display(), "table written");
        written.push(location);
    }
    info!(tables = written.len(), dir = %dir.display(), "episode tables persisted");
    Ok(written)
}

/// Write `df` to `output` through the staging directory of `stage`.
pub fn persist_dataframe(
    df: &mut DataFrame,
    output: &Path,
    format: OutputFormat,
    partitions: &[String],
    stage: &str,
) -> Result<PathBuf> {
    let staged = staged_output_path(output, stage);
    if !partitions.is_empty() && df.height() > 0 {
        write_partitions(df, &staged, partitions)?;
        return Ok(staged);
    }

    if let Some(parent) = staged.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("creating output directory '{}'", parent.display()))?;
    }
    let mut file =
        File::create(&staged).with_context(|| format!("creating {}", staged.display()))?;
    write_frame(df, &mut file, format)
        .with_context(|| format!("writing {}", staged.display()))?;
    if let Some(parent) = output.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("creating output directory '{}'", parent.display()))?;
    }
    fs::copy(&staged, output)
        .with_context(|| format!("copying {} to {}", staged.display(), output.display()))?;
    Ok(output.to_path_buf())
}

/// Read a table written by [`persist_frames`], picking the reader by extension.
pub fn read_frame(path: &Path) -> Result<DataFrame> {
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|s| s.to_lowercase())
        .unwrap_or_default();
    let mut file = File::open(path).with_context(|| format!("opening {}", path.display()))?;

    match extension.as_str() {
        #[cfg(feature = "parquet")]
        "parquet" => ParquetReader::new(&mut file)
            .finish()
            .context("reading Parquet file"),
        #[cfg(not(feature = "parquet"))]
        "parquet" => Err(anyhow!(
            "parquet support is disabled; rebuild with the 'parquet' feature"
        )),
        "csv" => CsvReader::new(&mut file)
            .has_header(true)
            .finish()
            .context("reading CSV file"),
        _ => Err(anyhow!(
            "unsupported file extension '{}'; use .csv or .parquet",
            extension
        )),
    }
}

fn applicable_partitions<'p>(df: &DataFrame, partitions: &'p [String]) -> &'p [String] {
    let names = df.get_column_names();
    if partitions.iter().all(|key| names.contains(&key.as_str())) {
        partitions
    } else {
        &[]
    }
}

fn write_frame(df: &mut DataFrame, file: &mut File, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Csv => CsvWriter::new(file)
            .finish(df)
            .context("writing CSV file"),
        #[cfg(feature = "parquet")]
        OutputFormat::Parquet => ParquetWriter::new(file)
            .finish(df)
            .map(|_| ())
            .context("writing Parquet file"),
        #[cfg(not(feature = "parquet"))]
        OutputFormat::Parquet => Err(anyhow!(
            "parquet support is disabled; rebuild with the 'parquet' feature"
        )),
    }
}

fn write_partitions(df: &DataFrame, output: &Path, partitions: &[String]) -> Result<()> {
    let group_by = df.group_by(partitions)?;
    let groups = group_by.get_groups();
    for (i, group) in groups.iter().enumerate() {
        let (mut partition_df, first) = match group {
            GroupsIndicator::Idx((first, indices)) => {
                let idx_ca = IdxCa::new("row_idx", indices.as_slice());
                (df.take(&idx_ca)?, first)
            }
            GroupsIndicator::Slice([first, len]) => (df.slice(first as i64, len as usize), first),
        };
        let dir = partition_dir(output, partitions, df, first)?;
        fs::create_dir_all(&dir)
            .with_context(|| format!("creating partition directory '{}'", dir.display()))?;
        let file_path = dir.join(format!("part-{i:04}.parquet"));
        let mut file = File::create(&file_path)
            .with_context(|| format!("creating partition file '{}'", file_path.display()))?;
        write_frame(&mut partition_df, &mut file, OutputFormat::Parquet)
            .with_context(|| format!("writing partition file '{}'", file_path.display()))?;
    }
    Ok(())
}

fn partition_dir(
    output: &Path,
    partitions: &[String],
    df: &DataFrame,
    row_idx: IdxSize,
) -> Result<PathBuf> {
    let mut path = output.to_path_buf();
    for key in partitions {
        let value = df.column(key)?.get(row_idx as usize)?;
        let value = sanitize_partition_value(&value.to_string());
        path.push(format!("{key}={value}"));
    }
    Ok(path)
}

fn sanitize_partition_value(value: &str) -> String {
    value
        .trim_matches('"')
        .replace([std::path::MAIN_SEPARATOR, ':', ' '], "_")
}
