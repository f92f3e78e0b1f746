//! Batch pose exporter
//!
//! Loads a VRM avatar, retargets each configured motion onto it and writes
//! one pose document per pose id into the output directory.
//!
//! ```text
//! pose_batch avatar.vrm --motions motions/ --out poses/
//! pose_batch avatar.vrm --motions motions/ --out poses/ --only dawn-runner --only green-loom
//! ```

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::Parser;

use poselab::assets::load_rig;
use poselab::batch::{BatchExporter, DirectoryMotionSource, DirectoryPoseSink, default_batch_configs};
use poselab::session::{LoadOutcome, PoseSession};
use poselab::PoseId;

#[derive(Debug, Parser)]
#[command(name = "pose_batch", version, about = "Retarget motions onto a VRM avatar and export pose documents")]
struct Cli {
    /// VRM or glTF avatar file
    avatar: PathBuf,

    /// Directory holding the source motions (.glb / .gltf)
    #[arg(short, long, default_value = "motions")]
    motions: PathBuf,

    /// Directory the pose documents are written to
    #[arg(short, long, default_value = "poses")]
    out: PathBuf,

    /// Export only these pose ids (repeatable)
    #[arg(long = "only", value_name = "POSE_ID")]
    only: Vec<PoseId>,

    /// Increase log verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

/// Level forced by `-v` flags; `None` leaves `RUST_LOG` (default `info`) in charge.
fn verbosity_level(verbose: u8) -> Option<log::LevelFilter> {
    match verbose {
        0 => None,
        1 => Some(log::LevelFilter::Debug),
        _ => Some(log::LevelFilter::Trace),
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut logger = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"));
    if let Some(level) = verbosity_level(cli.verbose) {
        logger.filter_level(level);
    }
    logger.init();

    let url = cli.avatar.display().to_string();
    let bytes = fs::read(&cli.avatar).with_context(|| format!("reading avatar {url}"))?;
    let rig = load_rig(&url, &bytes).with_context(|| format!("loading avatar {url}"))?;

    let mut session = PoseSession::default();
    let ticket = session.begin_avatar_load(&url);
    if session.finish_avatar_load(ticket, rig) != LoadOutcome::Applied {
        bail!("avatar {url} was not applied");
    }

    let configs = default_batch_configs()
        .into_iter()
        .filter(|c| cli.only.is_empty() || cli.only.contains(&c.id))
        .collect::<Vec<_>>();

    let mut source = DirectoryMotionSource::new(&cli.motions);
    let mut sink = DirectoryPoseSink::new(&cli.out);
    let report = BatchExporter::new(configs).run(&mut session, &mut source, &mut sink)?;

    for id in &report.completed {
        println!("ok     {id}");
    }
    if let Some((id, err)) = report.failure {
        println!("failed {id}: {err}");
        bail!("batch export stopped after {} poses", report.completed.len());
    }

    println!("{} poses written to {}", report.completed.len(), cli.out.display());
    Ok(())
}
