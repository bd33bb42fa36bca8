//! Display session driver
//!
//! Owns one claimed [`BulkSession`] and streams commands to it packet by
//! packet. Writes are synchronous: a packet is only built after the previous
//! write returned. The first failure ends the command; the device is then in
//! an undefined state and the session should be reopened.

use log::{debug, trace};
use usbdisp_hal::{BulkSession, EndpointAddress};
use usbdisp_protocol::{BlendOp, Color, Command, FrameError, ImageBuffer, PacketFramer, Rect};

/// Errors from sending a command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DisplayError<E> {
    /// Command could not be framed
    Frame(FrameError),
    /// Backend write failed
    Transport(E),
    /// Device accepted only part of a packet
    ShortWrite { expected: usize, written: usize },
}

impl<E> From<FrameError> for DisplayError<E> {
    fn from(e: FrameError) -> Self {
        DisplayError::Frame(e)
    }
}

/// Display driver
///
/// The interface is released when the driver is dropped; use
/// [`UsbDisplay::close`] to observe release errors.
pub struct UsbDisplay<S: BulkSession> {
    session: S,
    endpoint: EndpointAddress,
    framer: PacketFramer,
    commands_sent: u32,
    packets_sent: u32,
}

impl<S: BulkSession> UsbDisplay<S> {
    /// Wrap a claimed session
    pub fn new(session: S, endpoint: EndpointAddress, framer: PacketFramer) -> Self {
        Self {
            session,
            endpoint,
            framer,
            commands_sent: 0,
            packets_sent: 0,
        }
    }

    /// Encode, frame and write one command
    pub fn send(&mut self, command: &Command) -> Result<(), DisplayError<S::Error>> {
        let encoded = command.encode();
        let packets = self.framer.packets(&encoded)?;

        debug!(
            "Sending {:?}: {} header + {} payload bytes in {} packets",
            encoded.opcode,
            encoded.header.len(),
            encoded.payload.len(),
            packets.len()
        );

        for packet in packets {
            let written = self
                .session
                .write_bulk(self.endpoint, &packet)
                .map_err(DisplayError::Transport)?;
            if written != packet.len() {
                return Err(DisplayError::ShortWrite {
                    expected: packet.len(),
                    written,
                });
            }
            trace!("Packet {:02x?}", &packet[..]);
            self.packets_sent = self.packets_sent.wrapping_add(1);
        }

        self.commands_sent = self.commands_sent.wrapping_add(1);
        Ok(())
    }

    /// Fill the whole screen
    pub fn fill(&mut self, color: Color) -> Result<(), DisplayError<S::Error>> {
        self.send(&Command::Fill(color))
    }

    /// Fill a rectangle
    pub fn rect(&mut self, rect: Rect) -> Result<(), DisplayError<S::Error>> {
        self.send(&Command::Rect(rect))
    }

    /// Blit an image with its top-left corner at (x, y)
    pub fn blit(
        &mut self,
        image: ImageBuffer,
        x: u16,
        y: u16,
        op: BlendOp,
    ) -> Result<(), DisplayError<S::Error>> {
        self.send(&image.into_command(x, y, op))
    }

    /// Release the interface and report the outcome
    pub fn close(mut self) -> Result<(), S::Error> {
        debug!(
            "Closing display after {} commands / {} packets",
            self.commands_sent, self.packets_sent
        );
        self.session.release()
    }

    /// Commands fully written so far
    pub fn commands_sent(&self) -> u32 {
        self.commands_sent
    }

    /// Packets written so far
    pub fn packets_sent(&self) -> u32 {
        self.packets_sent
    }

    /// Framer in use
    pub fn framer(&self) -> &PacketFramer {
        &self.framer
    }

    /// Underlying session
    pub fn session(&self) -> &S {
        &self.session
    }
}

impl<S: BulkSession> Drop for UsbDisplay<S> {
    fn drop(&mut self) {
        // Release is idempotent, so this is a no-op after close()
        let _ = self.session.release();
    }
}

#[cfg(test)]
mod tests {
    extern crate std;

    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;
    use std::vec::Vec;

    use usbdisp_hal::TransportError;
    use usbdisp_protocol::{reassemble, Opcode, DEFAULT_PKT_MAX};

    /// What the fake device saw; shared so it outlives the driver
    #[derive(Default)]
    struct Log {
        packets: Vec<Vec<u8>>,
        endpoints: Vec<EndpointAddress>,
        releases: u32,
    }

    struct RecordingSession {
        log: Rc<RefCell<Log>>,
        fail_at: Option<usize>,
        truncate: bool,
        claimed: bool,
    }

    impl RecordingSession {
        fn new() -> (Self, Rc<RefCell<Log>>) {
            let log = Rc::new(RefCell::new(Log::default()));
            let session = Self {
                log: log.clone(),
                fail_at: None,
                truncate: false,
                claimed: true,
            };
            (session, log)
        }
    }

    impl BulkSession for RecordingSession {
        type Error = TransportError;

        fn write_bulk(&mut self, endpoint: EndpointAddress, data: &[u8]) -> Result<usize, TransportError> {
            let mut log = self.log.borrow_mut();
            if self.fail_at == Some(log.packets.len()) {
                return Err(TransportError::Write);
            }
            log.packets.push(data.to_vec());
            log.endpoints.push(endpoint);
            if self.truncate {
                Ok(data.len() - 1)
            } else {
                Ok(data.len())
            }
        }

        fn release(&mut self) -> Result<(), TransportError> {
            if self.claimed {
                self.claimed = false;
                self.log.borrow_mut().releases += 1;
            }
            Ok(())
        }
    }

    fn display(session: RecordingSession) -> UsbDisplay<RecordingSession> {
        UsbDisplay::new(session, EndpointAddress::default(), PacketFramer::default())
    }

    #[test]
    fn test_fill_writes_one_packet() {
        let (session, log) = RecordingSession::new();
        let mut display = display(session);

        display.fill(Color::rgb565(31, 63, 31)).unwrap();

        let log = log.borrow();
        assert_eq!(log.packets, [std::vec![0xC1, 0xFF, 0xFF]]);
        assert_eq!(log.endpoints, [EndpointAddress(0x01)]);
        assert_eq!(display.commands_sent(), 1);
        assert_eq!(display.packets_sent(), 1);
    }

    #[test]
    fn test_blit_packets_reassemble() {
        let (session, log) = RecordingSession::new();
        let mut display = display(session);

        let mut image = ImageBuffer::new(20, 10);
        for i in 0..image.len() {
            image.set(i, Color::from_raw(i as u16));
        }
        let expected = image.clone().into_command(5, 6, BlendOp::Xor).encode();

        display.blit(image, 5, 6, BlendOp::Xor).unwrap();

        let log = log.borrow();
        // 400 payload bytes: 54 + 63 * 5 + 31
        assert_eq!(log.packets.len(), 7);
        let (opcode, body) = reassemble(&log.packets).unwrap();
        assert_eq!(opcode, Opcode::Image);
        assert_eq!(body, expected.body());
    }

    #[test]
    fn test_commands_start_fresh() {
        let (session, log) = RecordingSession::new();
        let mut display = display(session);

        display.fill(Color::BLACK).unwrap();
        display
            .rect(Rect {
                left: 0,
                top: 230,
                width: 320,
                height: 10,
                color: Color::rgb555(0, 0, 8),
                op: BlendOp::Or,
            })
            .unwrap();

        let log = log.borrow();
        assert_eq!(log.packets.len(), 2);
        assert_eq!(log.packets[0][0], 0xC1);
        assert_eq!(log.packets[1][0], 0xC3);
        assert_eq!(&log.packets[1][5..9], &[64, 1, 240, 0]);
    }

    #[test]
    fn test_write_failure_stops_command() {
        let (mut session, log) = RecordingSession::new();
        session.fail_at = Some(1);
        let mut display = display(session);

        let result = display.blit(ImageBuffer::new(16, 16), 0, 0, BlendOp::Copy);

        assert_eq!(result, Err(DisplayError::Transport(TransportError::Write)));
        assert_eq!(log.borrow().packets.len(), 1);
        assert_eq!(display.commands_sent(), 0);
        assert_eq!(display.packets_sent(), 1);
    }

    #[test]
    fn test_short_write_is_error() {
        let (mut session, log) = RecordingSession::new();
        session.truncate = true;
        let mut display = display(session);

        let result = display.fill(Color::WHITE);

        assert_eq!(
            result,
            Err(DisplayError::ShortWrite {
                expected: 3,
                written: 2
            })
        );
        assert_eq!(log.borrow().packets.len(), 1);
    }

    #[test]
    fn test_header_too_large_writes_nothing() {
        let (session, log) = RecordingSession::new();
        let mut display = UsbDisplay::new(
            session,
            EndpointAddress::default(),
            PacketFramer::new(8).unwrap(),
        );

        let result = display.rect(Rect {
            left: 0,
            top: 0,
            width: 1,
            height: 1,
            color: Color::WHITE,
            op: BlendOp::Copy,
        });

        assert_eq!(result, Err(DisplayError::Frame(FrameError::HeaderTooLarge)));
        assert!(log.borrow().packets.is_empty());
    }

    #[test]
    fn test_close_releases_once() {
        let (session, log) = RecordingSession::new();
        let display = display(session);

        display.close().unwrap();

        assert_eq!(log.borrow().releases, 1);
    }

    #[test]
    fn test_drop_releases() {
        let (session, log) = RecordingSession::new();
        {
            let mut display = display(session);
            let _ = display.fill(Color::BLACK);
        }
        assert_eq!(log.borrow().releases, 1);
    }

    #[test]
    fn test_drop_releases_after_error() {
        let (mut session, log) = RecordingSession::new();
        session.fail_at = Some(0);
        {
            let mut display = display(session);
            assert!(display.fill(Color::BLACK).is_err());
        }
        assert_eq!(log.borrow().releases, 1);
    }

    #[test]
    fn test_default_framer_budget() {
        let (session, _log) = RecordingSession::new();
        assert_eq!(display(session).framer().pkt_max(), DEFAULT_PKT_MAX);
    }
}
