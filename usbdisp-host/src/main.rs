//! usbdisp - command-line host for the USB pixel display
//!
//! ```text
//! usbdisp info
//! usbdisp fill 31 0 0
//! usbdisp rect 50 150 200 60 --color 0,0,8 --op or
//! usbdisp image frame.rgb --width 320 --height 240 --full-range
//! usbdisp demo --dry-run
//! ```
//!
//! Logging goes through `env_logger`; set `RUST_LOG=debug` (or `trace` to
//! see every packet).

mod cli;
mod config;
mod demo;
mod dry_run;
mod error;

use std::fs;
use std::process::ExitCode;

use clap::Parser;
use log::{error, info, warn};
use usbdisp_driver::UsbDisplay;
use usbdisp_hal::{connect, BulkSession};
use usbdisp_hal_rusb::{RusbHost, UsbError};
use usbdisp_protocol::{ColorMode, ImageBuffer, Rect};

use crate::cli::{Cli, Command};
use crate::config::HostConfig;
use crate::dry_run::DryRunSession;
use crate::error::Error;

fn main() -> ExitCode {
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), Error> {
    let config = config::load(cli.config.as_deref())?;
    let mode = cli.mode.unwrap_or(config.screen.color_mode);

    if matches!(cli.command, Command::Info) {
        return list_devices(&config);
    }

    if cli.dry_run {
        info!("Dry run: packets are logged, not sent");
        let session = DryRunSession::new();
        let display = UsbDisplay::new(session, config.endpoint(), config.framer()?);
        let display = execute(display, &cli.command, &config, mode)?;
        let session = display.session();
        info!(
            "Dry run framed {} commands into {} packets ({} bytes)",
            session.commands(),
            session.packets(),
            session.bytes()
        );
        if session.malformed() > 0 {
            warn!("{} commands did not reassemble", session.malformed());
        }
        display.close()?;
    } else {
        let mut host = RusbHost::new(config.write_timeout());
        let session = connect(&mut host, config.device_id(), config.endpoint())?;
        let display = UsbDisplay::new(session, config.endpoint(), config.framer()?);
        let display = execute(display, &cli.command, &config, mode)?;
        info!(
            "Sent {} commands in {} packets",
            display.commands_sent(),
            display.packets_sent()
        );
        display.close()?;
    }

    Ok(())
}

/// Dump descriptors of every device matching the configured identity
fn list_devices(config: &HostConfig) -> Result<(), Error> {
    let host = RusbHost::new(config.write_timeout());
    let devices = host.list(config.device_id())?;
    if devices.is_empty() {
        return Err(usbdisp_hal::TransportError::NotFound.into());
    }
    for device in &devices {
        println!("{}", device);
        match device.find_bulk_out(config.endpoint()) {
            Some(ep) => println!(
                "Bulk OUT 0x{:02x}: interface {} (max packet {})",
                config.device.endpoint, ep.interface, ep.max_packet_size
            ),
            None => println!("Bulk OUT 0x{:02x}: not present", config.device.endpoint),
        }
    }
    Ok(())
}

/// Run one drawing subcommand, handing the display back for closing
fn execute<S>(
    mut display: UsbDisplay<S>,
    command: &Command,
    config: &HostConfig,
    mode: ColorMode,
) -> Result<UsbDisplay<S>, Error>
where
    S: BulkSession<Error = UsbError>,
{
    match command {
        Command::Info => {}
        Command::Fill { r, g, b } => {
            display.fill(mode.pack(*r, *g, *b))?;
        }
        Command::Rect {
            left,
            top,
            width,
            height,
            color,
            op,
        } => {
            display.rect(Rect {
                left: *left,
                top: *top,
                width: *width,
                height: *height,
                color: mode.pack(color.r, color.g, color.b),
                op: *op,
            })?;
        }
        Command::Image {
            path,
            width,
            height,
            x,
            y,
            op,
            full_range,
        } => {
            let rgb = fs::read(path).map_err(|source| Error::Io {
                path: path.clone(),
                source,
            })?;
            let image = load_image(&rgb, *width, *height, *full_range, mode)?;
            info!(
                "Blitting {}x{} image at ({}, {})",
                image.width(),
                image.height(),
                x,
                y
            );
            display.blit(image, *x, *y, *op)?;
        }
        Command::Demo => {
            demo::run(&mut display, &config.screen, &config.demo, mode)?;
        }
    }
    Ok(display)
}

/// Convert raw RGB bytes into an image, checking the size first
fn load_image(
    rgb: &[u8],
    width: u16,
    height: u16,
    full_range: bool,
    mode: ColorMode,
) -> Result<ImageBuffer, Error> {
    let expected = usize::from(width) * usize::from(height) * 3;
    if rgb.len() != expected {
        return Err(Error::ImageSize {
            width,
            height,
            expected,
            actual: rgb.len(),
        });
    }
    Ok(if full_range {
        ImageBuffer::from_rgb888(width, height, rgb)
    } else {
        ImageBuffer::from_rgb(width, height, rgb, mode)
    })
}
