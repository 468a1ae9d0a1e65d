use argh::FromArgs;
use colored::Colorize;
use muxupd::{format_size, render_text, ProgressEvent, RomSystem, StorageRoot};
use std::path::PathBuf;

use muxupd_packer::{build_session, load_config, Error, PackJob, PackOutcome};

#[derive(Debug, FromArgs)]
#[argh(
    description = "Expects a folder with a muxupd.toml file that follows this format\n\t[config]\n\tstorage = \"sd1\"\t\t\t# sd1 (/mnt/mmc) or sd2 (/mnt/sdcard)\n\trom_system = \"gba\"\t\t\t# Folder under ROMS/\n\tlevel = 6\t\t\t\t# Optional, 0-9\n\t[files]\n\troms = [ \"Pokemon.gba\", \"hacks\" ]\t# folders are added with their contents\n\tbios = [ \"gba_bios.bin\" ]\n"
)]
struct Args {
    /// folder containing muxupd.toml
    #[argh(positional)]
    folder: String,
    /// output directory, defaults to the current directory
    #[argh(option, short = 'o')]
    output: Option<String>,
    /// storage root to install to (sd1 or sd2), overrides muxupd.toml
    #[argh(option)]
    storage: Option<StorageRoot>,
    /// ROM system folder, overrides muxupd.toml
    #[argh(option)]
    rom_system: Option<String>,
    /// compression level 0-9, overrides muxupd.toml
    #[argh(option)]
    level: Option<u32>,
    /// only print the resulting layout
    #[argh(switch)]
    preview: bool,
}

fn main() -> Result<(), Error> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let args: Args = argh::from_env();
    let folder = PathBuf::from(&args.folder);

    let mut config = load_config(&folder)?;
    if let Some(storage) = args.storage {
        config.storage = storage;
    }
    if let Some(rom_system) = &args.rom_system {
        config.rom_system = RomSystem::parse(rom_system)?;
    }
    if args.level.is_some() {
        config.level = args.level;
    }
    let options = config.compression()?;

    let session = build_session(&folder, &config)?;
    let summary = session.summary();

    if args.preview || !session.can_build() {
        match session.preview()? {
            Some(tree) => print!("{}", render_text(&tree)),
            None => println!("{}", "No files added yet...".dimmed()),
        }
        println!(
            "{} files, {}",
            summary.total_files,
            format_size(summary.total_size)
        );
    }
    if summary.exceeds_size_warning {
        eprintln!(
            "{}",
            "Warning: Archive size exceeds 2GB. Consider splitting into multiple archives for better compatibility.".yellow()
        );
    }
    if args.preview || !session.can_build() {
        return Ok(());
    }

    let output_dir = PathBuf::from(args.output.unwrap_or_else(|| ".".to_string()));
    let job = PackJob::spawn(session, output_dir, options);

    let mut last_percent = None;
    let outcome = job.wait(|event| match event {
        ProgressEvent::Adding { processed, total } => {
            println!("+ {} {}", "Adding".green(), format!("{processed}/{total}").dimmed());
        }
        ProgressEvent::Compressing { percent } => {
            if last_percent.map_or(true, |last| percent >= last + 10 || percent == 100) {
                println!("  {} {percent}%", "Compressing...".dimmed());
                last_percent = Some(percent);
            }
        }
    });

    match outcome {
        PackOutcome::Success { output_path } => {
            println!("Wrote {}! {}", output_path.display().to_string().green(), "".clear());
            Ok(())
        }
        PackOutcome::Error { output_dir, error } => {
            eprintln!(
                "{} {}",
                "Error:".red(),
                format!("could not build archive in {}", output_dir.display()).red()
            );
            Err(error)
        }
    }
}
