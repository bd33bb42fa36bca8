//! Command-line interface

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use usbdisp_protocol::{BlendOp, ColorMode};

/// Drive a usbdisp USB pixel display
#[derive(Debug, Parser)]
#[command(name = "usbdisp", version, about)]
pub struct Cli {
    /// Configuration file (defaults to the built-in display.toml)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Channel quantization for raw color values: 555 or 565
    #[arg(short, long, global = true, value_parser = parse_mode)]
    pub mode: Option<ColorMode>,

    /// Frame and log packets without opening the device
    #[arg(long, global = true)]
    pub dry_run: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Print the descriptors of every matching device
    Info,

    /// Fill the screen with one color
    Fill {
        r: u32,
        g: u32,
        b: u32,
    },

    /// Fill a rectangle
    Rect {
        left: u16,
        top: u16,
        width: u16,
        height: u16,

        /// Color as R,G,B channel values
        #[arg(long, value_parser = parse_rgb, default_value = "31,31,31")]
        color: Rgb,

        /// Blend op: copy, xor, or, and
        #[arg(long, value_parser = parse_op, default_value = "copy")]
        op: BlendOp,
    },

    /// Blit a raw RGB file (3 bytes per pixel, row-major)
    Image {
        path: PathBuf,

        #[arg(long)]
        width: u16,

        #[arg(long)]
        height: u16,

        #[arg(long, default_value_t = 0)]
        x: u16,

        #[arg(long, default_value_t = 0)]
        y: u16,

        /// Blend op: copy, xor, or, and
        #[arg(long, value_parser = parse_op, default_value = "copy")]
        op: BlendOp,

        /// Treat channels as full-range 8-bit instead of raw 5/6-bit values
        #[arg(long)]
        full_range: bool,
    },

    /// Cycle colors, ramp grays and draw sample rectangles
    Demo,
}

/// Raw channel values as typed on the command line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb {
    pub r: u32,
    pub g: u32,
    pub b: u32,
}

fn parse_mode(s: &str) -> Result<ColorMode, String> {
    s.parse().map_err(|e: usbdisp_protocol::color::UnknownColorMode| e.to_string())
}

fn parse_op(s: &str) -> Result<BlendOp, String> {
    s.parse().map_err(|e: usbdisp_protocol::command::UnknownBlendOp| e.to_string())
}

fn parse_rgb(s: &str) -> Result<Rgb, String> {
    let parts: Vec<&str> = s.split(',').map(str::trim).collect();
    let [r, g, b] = parts.as_slice() else {
        return Err(format!("expected R,G,B but got {:?}", s));
    };
    let channel = |v: &str| v.parse::<u32>().map_err(|e| format!("bad channel {:?}: {}", v, e));
    Ok(Rgb {
        r: channel(*r)?,
        g: channel(*g)?,
        b: channel(*b)?,
    })
}
