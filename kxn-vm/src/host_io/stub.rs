//! An in-memory `HostIo` implementation with no real window, stdout, or
//! blocking I/O. Used by this crate's own tests and suitable for embedding
//! in anything that wants to drive the engine without a real backend.

use super::{dispatch, Framebuffer, IoEffects, IoOutcome};
use crate::engine::Engine;
use crate::error::Fault;

pub struct StubHost {
    pub framebuffer: Framebuffer,
    pub printed: Vec<u8>,
    pub refresh_count: u32,

    key: u8,
    key_available: bool,
    waiting_for_input: bool,

    mouse_x: u16,
    mouse_y: u16,
    mouse_buttons: u8,
    mouse_event: bool,
}

impl StubHost {
    pub fn new() -> StubHost {
        StubHost {
            framebuffer: Framebuffer::new(),
            printed: Vec::new(),
            refresh_count: 0,
            key: 0,
            key_available: false,
            waiting_for_input: false,
            mouse_x: 0,
            mouse_y: 0,
            mouse_buttons: 0,
            mouse_event: false,
        }
    }

    /// Makes a key available for the next `READ_CHAR`/`GET_KEY`/`POLL_KEY`.
    pub fn push_key(&mut self, key: u8) {
        self.key = key;
        self.key_available = true;
    }

    pub fn set_mouse(&mut self, x: u16, y: u16, buttons: u8) {
        self.mouse_x = x;
        self.mouse_y = y;
        self.mouse_buttons = buttons;
        self.mouse_event = true;
    }

    pub fn printed_as_string(&self) -> String {
        self.printed.iter().map(|&b| b as char).collect()
    }
}

impl Default for StubHost {
    fn default() -> Self {
        Self::new()
    }
}

impl IoEffects for StubHost {
    fn print_char(&mut self, byte: u8) {
        self.printed.push(byte);
    }

    fn key_available(&self) -> bool {
        self.key_available
    }

    fn last_key(&self) -> u8 {
        self.key
    }

    fn clear_key_available(&mut self) {
        self.key_available = false;
    }

    fn set_waiting_for_input(&mut self, waiting: bool) {
        self.waiting_for_input = waiting;
    }

    fn mouse_event_available(&self) -> bool {
        self.mouse_event
    }

    fn mouse_position(&self) -> (u16, u16) {
        (self.mouse_x, self.mouse_y)
    }

    fn mouse_buttons(&self) -> u8 {
        self.mouse_buttons
    }

    fn clear_mouse_event(&mut self) {
        self.mouse_event = false;
    }

    fn draw_pixel(&mut self, x: u8, y: u8, color: u8) {
        self.framebuffer.set_pixel(x as u16, y as u16, color);
    }

    fn draw_line(&mut self, x1: u8, y1: u8, x2: u8, y2: u8, color: u8) {
        self.framebuffer
            .draw_line(x1 as u16, y1 as u16, x2 as u16, y2 as u16, color);
    }

    fn fill_rect(&mut self, x: u8, y: u8, w: u8, h: u8, color: u8) {
        self.framebuffer
            .fill_rect(x as u16, y as u16, w as u16, h as u16, color);
    }

    fn refresh(&mut self) {
        self.refresh_count += 1;
    }
}

impl super::HostIo for StubHost {
    fn process_events(&mut self) -> bool {
        true
    }

    fn is_waiting_for_input(&self) -> bool {
        self.waiting_for_input && !self.key_available
    }

    fn handle_io(&mut self, engine: &mut Engine, op: u8) -> Result<IoOutcome, Fault> {
        dispatch(engine, self, op)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_push_key_then_clear() {
        let mut host = StubHost::new();
        assert!(!host.key_available());
        host.push_key(b'x');
        assert!(host.key_available());
        assert_eq!(host.last_key(), b'x');
        host.clear_key_available();
        assert!(!host.key_available());
    }

    #[test]
    fn test_printed_as_string() {
        let mut host = StubHost::new();
        host.print_char(b'h');
        host.print_char(b'i');
        assert_eq!(host.printed_as_string(), "hi");
    }
}
