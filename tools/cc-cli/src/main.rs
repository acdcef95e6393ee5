use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use ccfile::{name_id, Archive, ArchiveBuilder, Entry, Source};
use clap::{Parser, Subcommand, ValueEnum};
use log::{debug, warn};
use maze::draw::{VIEW_HEIGHT, VIEW_WIDTH};
use maze::{Direction, DrawList, Map, Pos};
use miette::{miette, IntoDiagnostic, Result};
use serde::Serialize;
use sprite::{DrawOptions, FrameHeader, Palette, Scale, Sprite, SpriteCache, Surface};

#[derive(Parser, Debug)]
#[command(name = "CC CLI")]
#[command(about, author, version, long_about = None)]
struct Cli {
    /// Log at debug level unless RUST_LOG says otherwise
    #[arg(short, long, global = true, default_value_t = false)]
    verbose: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Print the entries of a ".cc" archive
    #[command(arg_required_else_help = true)]
    Ls {
        /// ".cc" archive
        file: PathBuf,
        /// List the save sub-archive instead
        #[arg(long, default_value_t = false)]
        save: bool,
    },
    /// Extract every entry of a ".cc" archive
    #[command(arg_required_else_help = true)]
    Extract {
        /// ".cc" archive
        file: PathBuf,
        /// Overwrite files
        #[arg(short, long, default_value_t = false, value_name = "TRUE|FALSE")]
        force: bool,
        /// Outbound directory
        #[arg(short, long, value_name = "DIR")]
        out: PathBuf,
        /// Extract the save sub-archive instead
        #[arg(long, default_value_t = false)]
        save: bool,
    },
    /// Print the archive ids of asset names
    #[command(arg_required_else_help = true)]
    Hash {
        names: Vec<String>,
    },
    /// Render one sprite frame to a PNG file
    #[command(arg_required_else_help = true)]
    Sprite {
        /// ".cc" archive
        file: PathBuf,
        /// Sprite asset name, e.g. "SKY.SKY"
        name: String,
        #[arg(long, default_value_t = 0)]
        frame: usize,
        #[arg(short, long, value_name = "PNG")]
        out: PathBuf,
        #[arg(long, default_value_t = false)]
        flip: bool,
        /// Scale code: 0-15 shrinks, 32768 doubles
        #[arg(long, default_value_t = 0)]
        scale: u16,
        /// Palette asset name
        #[arg(long, default_value = "MM4.PAL")]
        palette: String,
    },
    /// Print a map segment's walls, attributes, occupants and events
    #[command(arg_required_else_help = true)]
    Maze {
        /// ".cc" archive
        file: PathBuf,
        map: u16,
    },
    /// Render the first-person view from a map cell to a PNG file
    #[command(arg_required_else_help = true)]
    View {
        /// ".cc" archive
        file: PathBuf,
        map: u16,
        x: i32,
        y: i32,
        #[arg(long, value_enum, default_value_t = Facing::North)]
        facing: Facing,
        #[arg(short, long, value_name = "PNG")]
        out: PathBuf,
        #[arg(long, default_value = "MM4.PAL")]
        palette: String,
    },
    /// Build a ".cc" archive from "{id:04X}.bin" files
    #[command(arg_required_else_help = true)]
    Pack {
        /// Directory holding the payloads
        dir: PathBuf,
        #[arg(short, long, value_name = "FILE")]
        out: PathBuf,
    },
}

#[derive(Copy, Clone, Debug, ValueEnum)]
enum Facing {
    North,
    East,
    South,
    West,
}

impl From<Facing> for Direction {
    fn from(facing: Facing) -> Self {
        match facing {
            Facing::North => Direction::North,
            Facing::East => Direction::East,
            Facing::South => Direction::South,
            Facing::West => Direction::West,
        }
    }
}

#[derive(Serialize, Debug)]
struct IndexEntry {
    id: u16,
    offset: u32,
    size: u32,
    file: String,
}

pub fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logger(cli.verbose);
    let stdout = console::Term::stdout();

    match cli.command {
        Commands::Ls { file, save } => command_ls(stdout, &file, save)?,
        Commands::Extract {
            file,
            force,
            out,
            save,
        } => command_extract(&file, &out, force, save)?,
        Commands::Hash { names } => command_hash(stdout, &names)?,
        Commands::Sprite {
            file,
            name,
            frame,
            out,
            flip,
            scale,
            palette,
        } => {
            let opts = DrawOptions {
                flip,
                scale: Scale(scale),
                ..DrawOptions::default()
            };
            command_sprite(&file, &name, frame, &out, &opts, &palette)?
        }
        Commands::Maze { file, map } => command_maze(stdout, &file, map)?,
        Commands::View {
            file,
            map,
            x,
            y,
            facing,
            out,
            palette,
        } => command_view(&file, map, Pos::new(x, y), facing.into(), &out, &palette)?,
        Commands::Pack { dir, out } => command_pack(&dir, &out)?,
    }

    Ok(())
}

fn init_logger(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default)).init();
}

fn open_archive(path: &Path) -> Result<Archive> {
    Archive::open_path(path).into_diagnostic()
}

fn listed_entries(archive: &Archive, save: bool) -> Vec<Entry> {
    if save {
        archive.save_entries().copied().collect()
    } else {
        archive.entries().copied().collect()
    }
}

fn source_of(save: bool) -> Source {
    if save {
        Source::Save
    } else {
        Source::Main
    }
}

fn command_ls(stdout: console::Term, file: &Path, save: bool) -> Result<()> {
    let archive = open_archive(file)?;
    for entry in listed_entries(&archive, save) {
        let text = format!("{:04X} {:>8} {:>6}", entry.id, entry.offset, entry.size);
        stdout.write_line(&text).into_diagnostic()?;
    }
    Ok(())
}

fn command_extract(file: &Path, out: &Path, force: bool, save: bool) -> Result<()> {
    let archive = open_archive(file)?;
    let entries = listed_entries(&archive, save);
    fs::create_dir_all(out).into_diagnostic()?;

    let bar = indicatif::ProgressBar::new(entries.len() as u64);
    bar.set_style(get_bar_style()?);

    let mut index = Vec::with_capacity(entries.len());
    for entry in entries {
        let name = format!("{:04X}.bin", entry.id);
        bar.set_message(name.clone());
        let path = out.join(&name);

        if !force && path.exists() {
            let message = format!("File \"{}\" exists. Overwrite it?", path.display());
            if !dialoguer::Confirm::new()
                .with_prompt(message)
                .interact()
                .into_diagnostic()?
            {
                bar.inc(1);
                continue;
            }
        }

        let Some(payload) = archive.file(entry.id, source_of(save)) else {
            warn!("entry {:04X} is unreadable", entry.id);
            bar.inc(1);
            continue;
        };
        let mut output = fs::File::create(&path).into_diagnostic()?;
        output.write_all(payload.as_slice()).into_diagnostic()?;
        index.push(IndexEntry {
            id: entry.id,
            offset: entry.offset,
            size: entry.size,
            file: name,
        });
        bar.inc(1);
    }
    bar.finish();

    let json = serde_json::to_string_pretty(&index).into_diagnostic()?;
    fs::write(out.join("index.json"), json).into_diagnostic()?;
    Ok(())
}

fn command_hash(stdout: console::Term, names: &[String]) -> Result<()> {
    for name in names {
        let text = format!("{:04X} {name}", name_id(name));
        stdout.write_line(&text).into_diagnostic()?;
    }
    Ok(())
}

fn load_palette(archive: &Archive, name: &str) -> Palette {
    let palette = archive
        .file_by_name(name, Source::Main)
        .and_then(|file| Palette::from_vga(file.as_slice()));
    palette.unwrap_or_else(|| {
        warn!("palette {name} unavailable, using grayscale");
        Palette::grayscale()
    })
}

fn frame_extent(headers: &[FrameHeader], scale: Scale) -> (usize, usize) {
    let width = headers
        .iter()
        .map(|header| usize::from(header.pen_x) + usize::from(header.width))
        .max()
        .unwrap_or(0);
    let height = headers
        .iter()
        .map(|header| usize::from(header.pen_y) + usize::from(header.height))
        .max()
        .unwrap_or(0);
    (scale.scaled(width).max(1), scale.scaled(height).max(1))
}

fn save_png(surface: &Surface, palette: &Palette, out: &Path) -> Result<()> {
    let image = image::RgbaImage::from_raw(
        surface.width() as u32,
        surface.height() as u32,
        surface.to_rgba(palette),
    )
    .ok_or_else(|| miette!("surface does not fit a {}x{} image", surface.width(), surface.height()))?;
    image.save(out).into_diagnostic()
}

fn command_sprite(
    file: &Path,
    name: &str,
    frame: usize,
    out: &Path,
    opts: &DrawOptions,
    palette: &str,
) -> Result<()> {
    let archive = open_archive(file)?;
    let asset = archive
        .file_by_name(name, Source::Main)
        .ok_or_else(|| miette!("{name} is not in {}", file.display()))?;
    let sprite = Sprite::from_file(&asset).into_diagnostic()?;
    let headers = sprite.frame_headers(frame).into_diagnostic()?;
    let (width, height) = frame_extent(&headers, opts.scale);
    debug!("{name} frame {frame}: {} images, {width}x{height}", headers.len());

    let mut surface = Surface::new(width, height);
    sprite
        .draw(&mut surface, frame, 0, 0, opts)
        .into_diagnostic()?;
    save_png(&surface, &load_palette(&archive, palette), out)
}

fn command_maze(stdout: console::Term, file: &Path, id: u16) -> Result<()> {
    let archive = open_archive(file)?;
    let map = Map::load(&archive, id).into_diagnostic()?;
    let home = map.home();

    stdout
        .write_line(&format!(
            "Map {id} ({}, {}):",
            home.wall_kind(),
            if map.is_outdoors() { "outdoors" } else { "indoors" }
        ))
        .into_diagnostic()?;
    for y in (0..16u8).rev() {
        let row: Vec<String> = (0..16u8)
            .map(|x| format!("{:04X}", home.wall(x, y)))
            .collect();
        stdout
            .write_line(&format!("{y:>2} {}", row.join(" ")))
            .into_diagnostic()?;
    }

    let neighbours: Vec<String> = Direction::ALL
        .iter()
        .map(|&dir| match home.neighbour(dir) {
            Some(next) => format!("{dir}={next}"),
            None => format!("{dir}=-"),
        })
        .collect();
    stdout
        .write_line(&format!("Neighbours: {}", neighbours.join(" ")))
        .into_diagnostic()?;
    stdout
        .write_line(&format!("Attributes: {:#?}", map.attributes()))
        .into_diagnostic()?;

    for object in map.objects().iter() {
        stdout
            .write_line(&format!(
                "Object {} at {} facing {}",
                object.sprite_name(),
                object.pos,
                object.facing
            ))
            .into_diagnostic()?;
    }
    for line in map.events().disassemble() {
        let text = match line {
            Ok(line) => line.to_string(),
            Err(err) => format!("<{err}>"),
        };
        stdout.write_line(&text).into_diagnostic()?;
    }
    Ok(())
}

fn command_view(
    file: &Path,
    id: u16,
    pos: Pos,
    facing: Direction,
    out: &Path,
    palette: &str,
) -> Result<()> {
    let archive = open_archive(file)?;
    let map = Map::load(&archive, id).into_diagnostic()?;

    let mut list = DrawList::new();
    map.fill_draw_list(&mut list, pos, facing);
    let mut surface = Surface::new(VIEW_WIDTH as usize, VIEW_HEIGHT as usize);
    let mut sprites = SpriteCache::new();
    let drawn = list.render(&mut surface, &archive, &mut sprites, (0, 0));
    debug!("view from {pos} facing {facing}: {drawn} items drawn");

    save_png(&surface, &load_palette(&archive, palette), out)
}

fn command_pack(dir: &Path, out: &Path) -> Result<()> {
    let mut paths: Vec<PathBuf> = fs::read_dir(dir)
        .into_diagnostic()?
        .filter_map(|entry| entry.ok().map(|entry| entry.path()))
        .filter(|path| {
            path.extension()
                .and_then(|ext| ext.to_str())
                .is_some_and(|ext| ext.eq_ignore_ascii_case("bin"))
        })
        .collect();
    paths.sort();

    let bar = indicatif::ProgressBar::new(paths.len() as u64);
    bar.set_style(get_bar_style()?);

    let mut builder = ArchiveBuilder::new();
    for path in paths {
        let stem = path
            .file_stem()
            .and_then(|stem| stem.to_str())
            .unwrap_or_default()
            .to_string();
        bar.set_message(stem.clone());
        let id = u16::from_str_radix(&stem, 16)
            .map_err(|_| miette!("\"{}\" is not named by a hex id", path.display()))?;
        builder.add(id, fs::read(&path).into_diagnostic()?);
        bar.inc(1);
    }
    bar.finish();

    let bytes = builder.build().into_diagnostic()?;
    fs::write(out, &bytes).into_diagnostic()?;

    // Reopen to prove the container reads back.
    let archive = Archive::open_bytes(Arc::from(bytes.into_boxed_slice()), Default::default())
        .into_diagnostic()?;
    debug!("packed {} entries into {}", archive.entry_count(), out.display());
    Ok(())
}

fn get_bar_style() -> Result<indicatif::ProgressStyle> {
    Ok(
        indicatif::ProgressStyle::with_template("[{bar:32}] {pos:>7}/{len:7} {msg}")
            .into_diagnostic()?
            .progress_chars("=>-"),
    )
}
