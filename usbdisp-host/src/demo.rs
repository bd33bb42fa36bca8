//! Demo sequence
//!
//! Cycles primary colors, ramps through grays, clears, then layers four
//! OR-blended rectangles over the black screen.

use std::thread;
use std::time::Duration;

use log::info;
use usbdisp_driver::{DisplayError, UsbDisplay};
use usbdisp_hal::BulkSession;
use usbdisp_protocol::{BlendOp, ColorMode, Rect};

use crate::config::{DemoConfig, ScreenConfig};

/// Colors shown during the cycle, as raw channel values
const CYCLE: [(u32, u32, u32); 8] = [
    (0x1f, 0, 0),
    (0, 0x1f, 0),
    (0, 0, 0x1f),
    (0, 0, 0),
    (0x1f, 0x1f, 0x1f),
    (0x1f, 0x1f, 0),
    (0x1f, 0x1f, 0),
    (0x1f, 0, 0x1f),
];

/// Gray ramp steps
const RAMP_STEPS: u32 = 31;

/// Number of commands one run sends
pub const COMMAND_COUNT: u32 = CYCLE.len() as u32 + RAMP_STEPS + 1 + 4;

/// Sample rectangles for a screen, with their raw colors
fn sample_rects(screen: &ScreenConfig) -> [(u16, u16, u16, u16, (u32, u32, u32)); 4] {
    let (w, h) = (screen.width, screen.height);
    [
        (0, h.saturating_sub(10), w, 10, (0, 0, 8)),
        (w.saturating_sub(10), 0, 10, h, (0, 0, 8)),
        (50, 150, 200, 60, (0, 0, 8)),
        (150, 140, 50, 100, (0, 8, 0)),
    ]
}

fn pause(ms: u64) {
    if ms > 0 {
        thread::sleep(Duration::from_millis(ms));
    }
}

/// Run the demo once
pub fn run<S: BulkSession>(
    display: &mut UsbDisplay<S>,
    screen: &ScreenConfig,
    demo: &DemoConfig,
    mode: ColorMode,
) -> Result<(), DisplayError<S::Error>> {
    info!("Color cycle");
    for (r, g, b) in CYCLE {
        display.fill(mode.pack(r, g, b))?;
        pause(demo.cycle_delay_ms);
    }

    info!("Gray ramp");
    for i in 0..RAMP_STEPS {
        display.fill(mode.pack(i, i, i))?;
        pause(demo.ramp_delay_ms);
    }

    display.fill(mode.pack(0, 0, 0))?;
    pause(demo.settle_delay_ms);

    info!("Rectangles");
    for (left, top, width, height, (r, g, b)) in sample_rects(screen) {
        display.rect(Rect {
            left,
            top,
            width,
            height,
            color: mode.pack(r, g, b),
            op: BlendOp::Or,
        })?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dry_run::DryRunSession;
    use usbdisp_hal::EndpointAddress;
    use usbdisp_protocol::PacketFramer;

    fn no_delay() -> DemoConfig {
        DemoConfig {
            cycle_delay_ms: 0,
            ramp_delay_ms: 0,
            settle_delay_ms: 0,
        }
    }

    #[test]
    fn test_demo_command_count() {
        let mut display = UsbDisplay::new(
            DryRunSession::new(),
            EndpointAddress::default(),
            PacketFramer::default(),
        );
        run(&mut display, &ScreenConfig::default(), &no_delay(), ColorMode::Rgb555).unwrap();

        assert_eq!(COMMAND_COUNT, 44);
        assert_eq!(display.commands_sent(), COMMAND_COUNT);
        // Every demo command fits in a single packet
        assert_eq!(display.packets_sent(), COMMAND_COUNT);
        assert_eq!(display.session().commands(), COMMAND_COUNT);
    }

    #[test]
    fn test_sample_rects_hug_screen_edges() {
        let rects = sample_rects(&ScreenConfig::default());
        assert_eq!(rects[0], (0, 230, 320, 10, (0, 0, 8)));
        assert_eq!(rects[1], (310, 0, 10, 240, (0, 0, 8)));
    }

    #[test]
    fn test_small_screen_does_not_underflow() {
        let screen = ScreenConfig {
            width: 4,
            height: 4,
            ..ScreenConfig::default()
        };
        let rects = sample_rects(&screen);
        assert_eq!(rects[0].1, 0);
        assert_eq!(rects[1].0, 0);
    }
}
