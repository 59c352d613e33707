#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! CLI entry point for the disaster geocoding pipeline.
//!
//! Each subcommand runs one batch stage; intermediate results live in
//! plain CSV/`GeoJSON` files so a long run can be inspected and resumed
//! between stages.

mod io;

use std::collections::HashSet;
use std::error::Error;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::{Parser, Subcommand};
use geo_disasters_boundaries::{AdminLevel, BoundaryLayer, SpatialIndex};
use geo_disasters_catalog::EventKey;
use geo_disasters_catalog::corrections::Corrections;
use geo_disasters_gazetteer::chunks::{self, CHUNK_SIZE};
use geo_disasters_gazetteer::{GeoNamesClient, GeocodedCandidate, Resolver};
use geo_disasters_locations::{Mention, mentions_for_event};
use geo_disasters_matcher::{Candidate, disambiguate};
use geo_disasters_pipeline::{
    PendingLocation, compare, consolidate, dissolve_national, explicit, filters, output,
};

#[derive(Parser)]
#[command(name = "geo_disasters", about = "Disaster catalog geocoding pipeline")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Split catalog location fields into atomic geocodable mentions
    Split {
        /// Catalog CSV export
        catalog: PathBuf,
        /// Output mention list CSV
        #[arg(long, default_value = "mentions.csv")]
        output: PathBuf,
    },
    /// Geocode mentions through the gazetteer (resumable)
    Geocode {
        /// Mention list CSV produced by `split`
        mentions: PathBuf,
        /// Directory for chunked checkpoint files
        #[arg(long, default_value = ".")]
        checkpoint_dir: PathBuf,
        /// Gazetteer account username
        #[arg(long)]
        username: String,
    },
    /// Match, disambiguate, consolidate and dissolve into final layers
    Finalize {
        /// Catalog CSV export
        catalog: PathBuf,
        /// Directory holding the geocoding checkpoint files
        #[arg(long, default_value = ".")]
        checkpoint_dir: PathBuf,
        /// Level-1 boundary layer `GeoJSON`
        #[arg(long)]
        level1: PathBuf,
        /// Level-2 boundary layer `GeoJSON`
        #[arg(long)]
        level2: PathBuf,
        /// Output directory for the final layers
        #[arg(long, default_value = ".")]
        out_dir: PathBuf,
    },
    /// Compare national footprints against a reference dataset
    Compare {
        /// This pipeline's national layer `GeoJSON`
        national: PathBuf,
        /// Reference national layer `GeoJSON` (same property schema)
        reference: PathBuf,
        /// Output comparison report CSV
        #[arg(long, default_value = "comparison.csv")]
        output: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    pretty_env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Split { catalog, output } => run_split(&catalog, &output),
        Commands::Geocode {
            mentions,
            checkpoint_dir,
            username,
        } => run_geocode(&mentions, &checkpoint_dir, username).await,
        Commands::Finalize {
            catalog,
            checkpoint_dir,
            level1,
            level2,
            out_dir,
        } => run_finalize(&catalog, &checkpoint_dir, &level1, &level2, &out_dir),
        Commands::Compare {
            national,
            reference,
            output,
        } => run_compare(&national, &reference, &output).await,
    }
}

fn run_split(catalog: &Path, output: &Path) -> Result<(), Box<dyn Error>> {
    let corrections = Corrections::embedded();
    let events = io::read_events(catalog)?;

    let mut mentions: Vec<Mention> = Vec::new();
    for event in &events {
        let Some(location) = event.location.as_deref() else {
            continue;
        };
        mentions.extend(mentions_for_event(corrections, &event.dis_no, location));
    }

    io::write_mentions(output, &mentions)
}

async fn run_geocode(
    mentions_path: &Path,
    checkpoint_dir: &Path,
    username: String,
) -> Result<(), Box<dyn Error>> {
    let corrections = Corrections::embedded();
    let mentions = io::read_mentions(mentions_path)?;

    let offset = chunks::resume_offset(checkpoint_dir)?;
    if offset > 0 {
        log::info!("Resuming past {offset} already-processed mentions");
    }

    let mut resolver = Resolver::new(GeoNamesClient::new(username), corrections);
    let mut chunk_index = offset / CHUNK_SIZE;
    let mut buffer: Vec<GeocodedCandidate> = Vec::new();
    let mut processed = 0_usize;

    for mention in mentions.iter().skip(offset) {
        if let Some(hit) = resolver
            .resolve(&mention.dis_no, &mention.iso3, &mention.location)
            .await?
        {
            buffer.push(hit);
        }
        processed += 1;
        if processed % CHUNK_SIZE == 0 {
            chunk_index += 1;
            chunks::write_chunk(checkpoint_dir, chunk_index, &buffer)?;
            buffer.clear();
        }
    }
    if processed % CHUNK_SIZE != 0 {
        chunk_index += 1;
        chunks::write_chunk(checkpoint_dir, chunk_index, &buffer)?;
    }

    log::info!("Geocoded {processed} mentions in {chunk_index} chunks");
    Ok(())
}

fn run_finalize(
    catalog: &Path,
    checkpoint_dir: &Path,
    level1_path: &Path,
    level2_path: &Path,
    out_dir: &Path,
) -> Result<(), Box<dyn Error>> {
    let corrections = Corrections::embedded();

    let events = filters::retain_reportable(io::read_events(catalog)?, corrections);
    let reportable: HashSet<EventKey> = events.iter().map(|e| e.dis_no.clone()).collect();

    let level1 = BoundaryLayer::from_geojson(
        AdminLevel::Level1,
        &std::fs::read_to_string(level1_path)?,
    )?;
    let level2 = BoundaryLayer::from_geojson(
        AdminLevel::Level2,
        &std::fs::read_to_string(level2_path)?,
    )?;
    level2.validate_hierarchy(&level1)?;

    let geocoded = chunks::read_all(checkpoint_dir)?;
    let candidates = spatial_match(&geocoded, &reportable, &level1, &level2);

    let name_matched = disambiguate(candidates, &level1, &level2, corrections);
    let pending: Vec<PendingLocation> = explicit::explicit_locations(&events)
        .into_iter()
        .chain(name_matched.into_iter().map(Into::into))
        .collect();

    let consolidated = consolidate(pending, &level1, &level2);
    let footprints = dissolve_national(&consolidated.locations);

    output::write_geojson(
        &out_dir.join("subnational.geojson"),
        output::subnational_collection(&consolidated.locations),
    )?;
    output::write_geojson(
        &out_dir.join("national.geojson"),
        output::national_collection(&footprints),
    )?;
    Ok(())
}

/// Attaches containing admin units to each geocoded mention. Points
/// outside every level-1 polygon are dropped (a level-2 hit alone is
/// not actionable), as are mentions of filtered-out events.
fn spatial_match(
    geocoded: &[GeocodedCandidate],
    reportable: &HashSet<EventKey>,
    level1: &BoundaryLayer,
    level2: &BoundaryLayer,
) -> Vec<Candidate> {
    let index1 = SpatialIndex::build(level1);
    let index2 = SpatialIndex::build(level2);

    let mut candidates = Vec::new();
    let mut offshore = 0_usize;
    for row in geocoded {
        if !reportable.contains(&row.dis_no) {
            continue;
        }
        let Some(adm1_code) = index1.locate(row.longitude, row.latitude) else {
            log::debug!(
                "{}: point for '{}' lands in no level-1 polygon",
                row.dis_no,
                row.mention
            );
            offshore += 1;
            continue;
        };
        let Some(adm1) = level1.unit(adm1_code) else {
            continue;
        };
        let adm2 = index2
            .locate(row.longitude, row.latitude)
            .and_then(|code| level2.unit(code));

        candidates.push(Candidate {
            dis_no: row.dis_no.clone(),
            iso3: row.iso3.clone(),
            mention: row.mention.clone(),
            place_name: row.place_name.clone(),
            province: row.province.clone(),
            adm1_code: adm1.code,
            adm1_name: adm1.name.clone(),
            adm2_code: adm2.map(|u| u.code),
            adm2_name: adm2.map(|u| u.name.clone()),
        });
    }

    log::info!(
        "Spatially matched {} of {} geocoded mentions ({offshore} offshore)",
        candidates.len(),
        geocoded.len()
    );
    candidates
}

async fn run_compare(
    national: &Path,
    reference: &Path,
    output_path: &Path,
) -> Result<(), Box<dyn Error>> {
    let ours = Arc::new(io::read_national(national)?);
    let theirs = Arc::new(io::read_national(reference)?);

    let rows = compare(ours, theirs).await;
    output::write_comparison_csv(output_path, &rows)?;
    Ok(())
}
