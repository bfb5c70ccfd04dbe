use std::path::PathBuf;

use anyhow::Result;
use clap::Args;
use courseware_core::duration::{ceil_seconds, format_duration};
use courseware_media::probe::probe_with_timeout;
use courseware_media::session::SET_DURATION_MANUALLY;
use courseware_media::{EditorConfig, FfprobeDurationProbe, VideoFile};

#[derive(Debug, Args)]
pub struct ProbeArgs {
    /// Local video file
    pub video: PathBuf,
}

pub async fn probe(args: ProbeArgs, config: &EditorConfig) -> Result<()> {
    let file = VideoFile::open(&args.video).await?;
    let probe = FfprobeDurationProbe::new(config.ffprobe_path.clone());

    let outcome = probe_with_timeout(&probe, &file.path, config.probe_timeout).await;
    match outcome.seconds().and_then(ceil_seconds) {
        Some(rounded) => println!(
            "{}: {} ({rounded}s)",
            file.file_name,
            format_duration(u64::from(rounded))
        ),
        None => println!("{}: {SET_DURATION_MANUALLY}", file.file_name),
    }
    Ok(())
}
