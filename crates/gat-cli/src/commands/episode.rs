use std::{
    fs::File,
    io::{self, BufReader, Write},
    path::Path,
    time::Instant,
};

use anyhow::{Context, Result};
use gat_cli::cli::{EpisodeCommands, SummaryFormat};
use gat_core::Episode;
use gat_kpi::{
    build_episode_tables, first_substation_touched, format_topological_impact, persist_frames,
    topological_impact, EpisodeTables, KpiConfig,
};
use serde_json::json;
use tabwriter::TabWriter;
use tracing::info;

use crate::commands::util::parse_partitions;

pub fn handle(command: &EpisodeCommands, config: &KpiConfig) -> Result<()> {
    match command {
        EpisodeCommands::Tables {
            episode,
            out,
            format,
            out_partitions,
        } => {
            let mut config = config.clone();
            if let Some(format) = format {
                config.output.format = (*format).into();
            }
            let partitions = parse_partitions(out_partitions.as_ref());
            if !partitions.is_empty() {
                config.output.partitions = partitions;
            }
            config.validate()?;
            write_tables(episode, out, &config)
        }
        EpisodeCommands::Summary { episode, format } => {
            let episode = load_episode(episode)?;
            let tables = build_episode_tables(&episode, config)?;
            match format {
                SummaryFormat::Table => print_summary_table(&episode, &tables, config),
                SummaryFormat::Json => print_summary_json(&episode, &tables, config),
            }
        }
    }
}

pub fn load_episode(path: &Path) -> Result<Episode> {
    let file = File::open(path).with_context(|| format!("opening episode '{}'", path.display()))?;
    let episode: Episode = serde_json::from_reader(BufReader::new(file))
        .with_context(|| format!("parsing episode '{}'", path.display()))?;
    info!(
        path = %path.display(),
        timesteps = episode.size(),
        "episode loaded"
    );
    Ok(episode)
}

fn write_tables(episode: &Path, out: &Path, config: &KpiConfig) -> Result<()> {
    let start = Instant::now();
    let episode = load_episode(episode)?;
    let tables = build_episode_tables(&episode, config)?;
    let frames = tables.to_frames(&config.separator)?;
    let written = persist_frames(frames, out, &config.output)?;
    println!(
        "Wrote {} tables ({} timesteps) to {} in {:.1} ms",
        written.len(),
        tables.size(),
        out.display(),
        start.elapsed().as_secs_f64() * 1000.0
    );
    print_diagnostics(&tables);
    Ok(())
}

fn print_diagnostics(tables: &EpisodeTables) {
    if !tables.diagnostics.has_issues() {
        return;
    }
    println!("Diagnostics: {}", tables.diagnostics.summary());
    for issue in &tables.diagnostics.issues {
        println!("  {issue}");
    }
}

fn total_reward(tables: &EpisodeTables) -> f64 {
    tables.reward.last().map_or(0.0, |row| row.cum_reward)
}

fn print_summary_table(episode: &Episode, tables: &EpisodeTables, config: &KpiConfig) -> Result<()> {
    let mut writer = TabWriter::new(io::stdout());
    writeln!(writer, "timesteps\t{}", tables.size())?;
    writeln!(writer, "played\t{}", episode.meta.nb_timestep_played)?;
    writeln!(writer, "total reward\t{:.4}", total_reward(tables))?;
    writeln!(writer, "hazards\t{}", tables.nb_hazards())?;
    writeln!(writer, "maintenances\t{}", tables.nb_maintenances())?;
    writeln!(writer, "distinct actions\t{}", tables.distinct_actions.len())?;
    writeln!(writer, "diagnostics\t{}", tables.diagnostics.summary())?;
    writer.flush()?;

    if !tables.distinct_actions.is_empty() {
        println!();
        let mut writer = TabWriter::new(io::stdout());
        writeln!(writer, "ACTION ID\tLINES\tSUBSTATIONS\tFIRST SUBSTATION")?;
        for (id, action) in tables.distinct_actions.iter().enumerate() {
            let impact = topological_impact(action);
            let (subs, lines) =
                format_topological_impact(&impact, &episode.names, &config.separator);
            writeln!(
                writer,
                "{}\t{}\t{}\t{}",
                id,
                lines.as_deref().unwrap_or("-"),
                subs.as_deref().unwrap_or("-"),
                first_substation_touched(action, &episode.names).unwrap_or("-"),
            )?;
        }
        writer.flush()?;
    }

    let production_types = episode.production_types();
    if !production_types.is_empty() {
        println!();
        let mut writer = TabWriter::new(io::stdout());
        writeln!(writer, "GENERATOR\tTYPE")?;
        for (name, kind) in &production_types {
            writeln!(writer, "{name}\t{kind}")?;
        }
        writer.flush()?;
    }
    Ok(())
}

fn print_summary_json(episode: &Episode, tables: &EpisodeTables, config: &KpiConfig) -> Result<()> {
    let actions: Vec<_> = tables
        .distinct_actions
        .iter()
        .enumerate()
        .map(|(id, action)| {
            let impact = topological_impact(action);
            let (subs, lines) =
                format_topological_impact(&impact, &episode.names, &config.separator);
            json!({
                "id": id,
                "lines": lines,
                "substations": subs,
                "first_substation": first_substation_touched(action, &episode.names),
            })
        })
        .collect();
    let summary = json!({
        "timesteps": tables.size(),
        "played": episode.meta.nb_timestep_played,
        "total_reward": total_reward(tables),
        "nb_hazards": tables.nb_hazards(),
        "nb_maintenances": tables.nb_maintenances(),
        "distinct_actions": tables.distinct_actions.len(),
        "actions": actions,
        "warnings": tables.diagnostics.warning_count(),
        "production_types": episode
            .production_types()
            .into_iter()
            .map(|(name, kind)| json!({ "name": name, "type": kind }))
            .collect::<Vec<_>>(),
    });
    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}
