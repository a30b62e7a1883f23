use clap::Parser;
use std::path::PathBuf;
use tsdemux::config::{create_default_config_template, DemuxConfig};
use tsdemux::format::ts::{ContinuityMode, FileSinkFactory, StreamAssembler, TSDemuxer};

#[derive(Parser)]
#[command(about = "Split an MPEG-TS file into per-PID elementary streams")]
struct Opt {
    /// Transport stream file to read
    input: PathBuf,

    /// Output directory (overrides config)
    #[arg(long)]
    output_dir: Option<PathBuf>,

    /// Output file extension (overrides config)
    #[arg(long)]
    extension: Option<String>,

    /// Stop after this many packets
    #[arg(long)]
    max_packets: Option<u64>,

    /// Continuity counter checking: off, warn or strict
    #[arg(long)]
    continuity: Option<ContinuityMode>,

    /// Write a config template to this path and exit
    #[arg(long)]
    write_config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    let opt = Opt::parse();

    if let Some(path) = &opt.write_config {
        create_default_config_template(path)?;
        println!("Config template at {}", path.display());
        return Ok(());
    }

    let mut config = DemuxConfig::load();
    if let Some(dir) = opt.output_dir {
        config.output_dir = dir;
    }
    if let Some(extension) = opt.extension {
        config.extension = extension;
    }
    if let Some(mode) = opt.continuity {
        config.continuity = mode;
    }
    if opt.max_packets.is_some() {
        config.max_packets = opt.max_packets;
    }

    let sinks = FileSinkFactory::new(&config.output_dir)?.with_extension(config.extension.clone());
    let assembler = StreamAssembler::new(sinks).with_continuity(config.continuity);

    let input = tokio::fs::File::open(&opt.input).await?;
    let mut demuxer = TSDemuxer::new(input, assembler).with_max_packets(config.max_packets);
    let summary = demuxer.run().await?;

    println!(
        "Read {} packets ({} invalid, {} assembler errors)",
        summary.packets_read, summary.invalid_packets, summary.assembler_errors
    );
    if let Some(len) = summary.truncated_tail {
        println!("Ignored truncated final packet of {} bytes", len);
    }
    for (pid, stats) in &summary.pids {
        println!(
            "  PID {:4}: {:6} packets, {:5} units, {:10} ES bytes, {} continuity errors",
            pid, stats.packets, stats.units, stats.es_bytes, stats.continuity_errors
        );
    }
    println!("Output written to {}", config.output_dir.display());

    Ok(())
}
