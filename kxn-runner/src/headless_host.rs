//! A window-free host backend: `PRINT_CHAR` goes to stdout, the
//! framebuffer is kept in memory for later inspection, and blocking reads
//! never block. Used for `--headless` runs and by anything that wants to
//! drive a program to completion without a human at the keyboard.

use kxn_vm::engine::Engine;
use kxn_vm::error::Fault;
use kxn_vm::host_io::{dispatch, Framebuffer, HostIo, IoEffects, IoOutcome};

pub struct HeadlessHost {
    pub framebuffer: Framebuffer,
}

impl HeadlessHost {
    pub fn new() -> HeadlessHost {
        HeadlessHost {
            framebuffer: Framebuffer::new(),
        }
    }
}

impl Default for HeadlessHost {
    fn default() -> Self {
        Self::new()
    }
}

impl IoEffects for HeadlessHost {
    fn print_char(&mut self, byte: u8) {
        print!("{}", byte as char);
        use std::io::Write;
        let _ = std::io::stdout().flush();
    }

    // There is no keyboard behind this backend. Reporting a key as always
    // available (with value 0) means READ_CHAR/GET_KEY never block a
    // headless run waiting on input that can't arrive.
    fn key_available(&self) -> bool {
        true
    }

    fn last_key(&self) -> u8 {
        0
    }

    fn clear_key_available(&mut self) {}

    fn set_waiting_for_input(&mut self, _waiting: bool) {}

    fn mouse_event_available(&self) -> bool {
        false
    }

    fn mouse_position(&self) -> (u16, u16) {
        (0, 0)
    }

    fn mouse_buttons(&self) -> u8 {
        0
    }

    fn clear_mouse_event(&mut self) {}

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

    fn refresh(&mut self) {}
}

impl HostIo for HeadlessHost {
    fn process_events(&mut self) -> bool {
        true
    }

    fn is_waiting_for_input(&self) -> bool {
        false
    }

    fn handle_io(&mut self, engine: &mut Engine, op: u8) -> Result<IoOutcome, Fault> {
        dispatch(engine, self, op)
    }
}
