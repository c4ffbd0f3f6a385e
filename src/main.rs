// main.rs      gifread command
//
#![forbid(unsafe_code)]

use clap::{Arg, ArgMatches, Command};
use gifread::block::{BlockEvent, DisposalMethod, Frame};
use gifread::Decoder;
use std::error::Error;
use std::fs::File;
use std::io::{BufReader, Write};
use termcolor::{Color, ColorChoice, ColorSpec, StandardStream, WriteColor};

/// Crate version
const VERSION: &str = std::env!("CARGO_PKG_VERSION");

/// Main entry point
fn main() -> Result<(), Box<dyn Error>> {
    env_logger::builder().format_timestamp(None).init();
    let mut out = StandardStream::stdout(ColorChoice::Always);
    match create_app().get_matches().subcommand() {
        Some(("show", matches)) => show(&mut out, matches)?,
        Some(("peek", matches)) => peek(&mut out, matches)?,
        _ => panic!(),
    }
    out.reset()?;
    Ok(())
}

/// Create clap Command
fn create_app() -> Command {
    Command::new("gifread")
        .version(VERSION)
        .about("GIF frame inspection utility")
        .arg_required_else_help(true)
        .subcommand(
            Command::new("show")
                .about("Show GIF frame table")
                .arg(
                    Arg::new("files")
                        .required(true)
                        .num_args(1..)
                        .help("input file(s)"),
                ),
        )
        .subcommand(
            Command::new("peek")
                .about("Show metadata without decoding image data")
                .arg(
                    Arg::new("files")
                        .required(true)
                        .num_args(1..)
                        .help("input file(s)"),
                ),
        )
}

/// Handle peek subcommand
fn peek(
    out: &mut StandardStream,
    matches: &ArgMatches,
) -> Result<(), Box<dyn Error>> {
    for path in matches.get_many::<String>("files").into_iter().flatten() {
        peek_file(out, path)?;
    }
    Ok(())
}

/// Scan one file's metadata, filtering out the image data blocks
fn peek_file(
    out: &mut StandardStream,
    path: &str,
) -> Result<(), Box<dyn Error>> {
    let mut magenta = ColorSpec::new();
    magenta.set_fg(Some(Color::Magenta));
    let mut cyan = ColorSpec::new();
    cyan.set_fg(Some(Color::Cyan)).set_intense(true);
    let mut bold = ColorSpec::new();
    bold.set_fg(Some(Color::White))
        .set_intense(true)
        .set_bold(true);
    let f = BufReader::new(File::open(path)?);
    let mut reader = Decoder::new(f)
        .filter(Box::new(|ev| ev == BlockEvent::ImageData))
        .open()?;
    while reader.has_remaining() {
        reader.next_frame()?;
    }
    let meta = reader.metadata();
    out.set_color(&magenta)?;
    writeln!(out, "{}", path)?;
    out.set_color(&bold)?;
    write!(
        out,
        "GIF{}, {}x{}, frames: {}",
        String::from_utf8_lossy(&meta.version),
        meta.width,
        meta.height,
        meta.total_frames
    )?;
    write!(out, ", colors: {}", meta.global_color_table_size)?;
    write!(out, ", repeat: ")?;
    if meta.loop_count == 0 {
        writeln!(out, "∞")?;
    } else {
        writeln!(out, "{}", meta.loop_count)?;
    }
    if let Some(bg) = meta.background_color() {
        out.set_color(&cyan)?;
        writeln!(out, "  background #{:08X}", bg)?;
    }
    out.set_color(&cyan)?;
    for comment in &meta.comments {
        writeln!(out, "  # {}", String::from_utf8_lossy(comment).trim())?;
    }
    if let Some(pt) = &meta.plain_text {
        writeln!(
            out,
            "  plain text {}x{} cells",
            pt.grid_width, pt.grid_height
        )?;
    }
    Ok(())
}

/// Handle show subcommand
fn show(
    out: &mut StandardStream,
    matches: &ArgMatches,
) -> Result<(), Box<dyn Error>> {
    for path in matches.get_many::<String>("files").into_iter().flatten() {
        show_file(out, path)?;
    }
    Ok(())
}

/// Show one GIF file
fn show_file(
    out: &mut StandardStream,
    path: &str,
) -> Result<(), Box<dyn Error>> {
    let mut magenta = ColorSpec::new();
    magenta.set_fg(Some(Color::Magenta));
    let mut yellow = ColorSpec::new();
    yellow.set_fg(Some(Color::Yellow)).set_intense(true);
    let mut cyan = ColorSpec::new();
    cyan.set_fg(Some(Color::Cyan)).set_intense(true);
    let mut bold = ColorSpec::new();
    bold.set_fg(Some(Color::White))
        .set_intense(true)
        .set_bold(true);
    let f = BufReader::new(File::open(path)?);
    let mut reader = Decoder::new(f).open()?;
    let mut frames = vec![];
    for frame in reader.frames() {
        frames.push(frame?);
    }
    let meta = reader.metadata();
    let width = meta.width;
    let height = meta.height;
    let global_clr = meta.global_color_table_size;
    let version = String::from_utf8_lossy(&meta.version).to_string();
    let frame_digits = digits(frames.len()).max(3);
    let size_digits = 4.max(1 + digits(width.into()) + digits(height.into()));
    out.set_color(&magenta)?;
    writeln!(out, "{}", path)?;
    out.set_color(&bold)?;
    write!(out, "GIF{}, {}x{}, frames: {}", version, width, height,
        frames.len())?;
    write!(out, ", repeat: ")?;
    if meta.loop_count == 0 {
        write!(out, "∞")?;
    } else {
        write!(out, "{}", meta.loop_count)?;
    }
    writeln!(out)?;
    out.set_color(&cyan)?;
    for comment in &meta.comments {
        for line in String::from_utf8_lossy(comment).split('\n') {
            let line = line.trim();
            if !line.is_empty() {
                writeln!(out, "  # {}", line)?;
            }
        }
    }
    out.set_color(&yellow)?;
    write!(out, " {:>w$}", "Fr#", w = frame_digits)?;
    write!(out, "  Delay Disp")?;
    write!(out, " {:>w$}", "Size", w = size_digits)?;
    write!(out, " {:>w$}", "X,Y", w = size_digits)?;
    writeln!(out, " Clrs Trn")?;
    for frame in &frames {
        write_frame(out, frame, width, height, global_clr, frame_digits,
            size_digits)?;
    }
    Ok(())
}

/// Write one frame table row
fn write_frame(
    out: &mut StandardStream,
    frame: &Frame,
    width: u16,
    height: u16,
    global_clr: usize,
    frame_digits: usize,
    size_digits: usize,
) -> Result<(), Box<dyn Error>> {
    let mut dflt = ColorSpec::new();
    dflt.set_fg(Some(Color::White));
    let mut bold = ColorSpec::new();
    bold.set_fg(Some(Color::White))
        .set_intense(true)
        .set_bold(true);
    let mut red = ColorSpec::new();
    red.set_fg(Some(Color::Red)).set_intense(true);
    out.set_color(&dflt)?;
    write!(out, "{}", if frame.interlaced { 'i' } else { ' ' })?;
    out.set_color(&bold)?;
    write!(out, "{:>w$}", frame.index, w = frame_digits)?;
    if frame.delay_cs == 0 {
        out.set_color(&dflt)?;
    }
    write!(out, " {:6.2}", f32::from(frame.delay_cs) / 100.0)?;
    let disp = match frame.disposal {
        DisposalMethod::NoAction => "none",
        DisposalMethod::Keep => "keep",
        DisposalMethod::Background => "bg",
        DisposalMethod::Previous => "prev",
        DisposalMethod::Reserved(_) => "res",
    };
    out.set_color(match disp {
        "none" => &dflt,
        "res" => &red,
        _ => &bold,
    })?;
    write!(out, " {:>4}", disp)?;
    if width == frame.width && height == frame.height {
        out.set_color(&dflt)?;
    } else {
        out.set_color(&bold)?;
    }
    write!(
        out,
        " {:>w$}",
        &format!("{}x{}", frame.width, frame.height),
        w = size_digits
    )?;
    if frame.left == 0 && frame.top == 0 {
        out.set_color(&dflt)?;
    } else {
        out.set_color(&bold)?;
    }
    write!(
        out,
        " {:>w$}",
        &format!("{},{}", frame.left, frame.top),
        w = size_digits
    )?;
    if frame.local_color_table_size > 0 {
        out.set_color(&bold)?;
        write!(out, "  {:3}", frame.local_color_table_size)?;
    } else {
        out.set_color(&dflt)?;
        write!(out, " {:3}g", global_clr)?;
    }
    match frame.transparent_color {
        Some(idx) => {
            out.set_color(&bold)?;
            write!(out, " {:>3}", idx)?;
        }
        None => {
            out.set_color(&dflt)?;
            write!(out, " {:>3}", "-")?;
        }
    }
    if let Some(err) = &frame.error {
        out.set_color(&red)?;
        write!(out, " {}", err)?;
    } else if frame.trimmed > 0 {
        out.set_color(&red)?;
        write!(out, " trimmed {}", frame.trimmed)?;
    }
    writeln!(out)?;
    Ok(())
}

/// Count decimal digits
fn digits(v: usize) -> usize {
    match v {
        0..=9 => 1,
        10..=99 => 2,
        100..=999 => 3,
        1000..=9999 => 4,
        _ => 5,
    }
}
