//! The windowed host backend: an SDL2 canvas scaled over the engine's
//! 320x240 framebuffer, plus keyboard and mouse translated into the
//! host-I/O capability set.
//!
//! Split into `SdlSystem` (owns the SDL context, canvas, and texture
//! creator) and `SdlHost` (borrows the system, owns the one streaming
//! `Texture` created against it) the same way the teacher splits `System`
//! from `ScreenBuffer`: a `Texture`'s lifetime is tied to the
//! `TextureCreator` it came from, so the texture can't live in the same
//! struct that owns the creator without borrowing it from outside.

use kxn_vm::engine::Engine;
use kxn_vm::error::Fault;
use kxn_vm::host_io::{dispatch, Framebuffer, HostIo, IoEffects, IoOutcome};
use sdl2::event::Event;
use sdl2::keyboard::Keycode;
use sdl2::mouse::MouseButton;
use sdl2::pixels::PixelFormatEnum;
use sdl2::render::{Canvas, Texture, TextureCreator};
use sdl2::video::{Window, WindowContext};
use sdl2::{EventPump, Sdl};
use std::cell::RefCell;

/// Owns everything SDL2 hands out only once: the context, the canvas, and
/// the texture creator. Canvas and event pump are behind `RefCell` so
/// `SdlHost` can mutate them while holding only a shared reference to this
/// struct, which is what lets its `Texture` borrow `texture_creator` for as
/// long as the system itself lives.
pub struct SdlSystem {
    _sdl_context: Sdl,
    event_pump: RefCell<EventPump>,
    canvas: RefCell<Canvas<Window>>,
    texture_creator: TextureCreator<WindowContext>,
}

impl SdlSystem {
    pub fn new(scale: u32) -> Result<SdlSystem, String> {
        let sdl_context = sdl2::init()?;
        let video_subsystem = sdl_context.video()?;

        let window = video_subsystem
            .window(
                "kxn",
                Framebuffer::WIDTH as u32 * scale,
                Framebuffer::HEIGHT as u32 * scale,
            )
            .position_centered()
            .build()
            .map_err(|e| e.to_string())?;

        let canvas = window
            .into_canvas()
            .present_vsync()
            .build()
            .map_err(|e| e.to_string())?;
        let texture_creator = canvas.texture_creator();
        let event_pump = sdl_context.event_pump()?;

        Ok(SdlSystem {
            _sdl_context: sdl_context,
            event_pump: RefCell::new(event_pump),
            canvas: RefCell::new(canvas),
            texture_creator,
        })
    }
}

pub struct SdlHost<'a> {
    system: &'a SdlSystem,
    frame_texture: Texture<'a>,
    framebuffer: Framebuffer,
    scale: u32,

    key: u8,
    key_available: bool,
    waiting_for_input: bool,

    mouse_x: u16,
    mouse_y: u16,
    mouse_buttons: u8,
    mouse_event: bool,
}

impl<'a> SdlHost<'a> {
    pub fn new(system: &'a SdlSystem, scale: u32) -> Result<SdlHost<'a>, String> {
        let frame_texture = system
            .texture_creator
            .create_texture_streaming(
                PixelFormatEnum::RGB24,
                Framebuffer::WIDTH as u32,
                Framebuffer::HEIGHT as u32,
            )
            .map_err(|e| e.to_string())?;

        Ok(SdlHost {
            system,
            frame_texture,
            framebuffer: Framebuffer::new(),
            scale,
            key: 0,
            key_available: false,
            waiting_for_input: false,
            mouse_x: 0,
            mouse_y: 0,
            mouse_buttons: 0,
            mouse_event: false,
        })
    }

    /// Window coordinates come off SDL in physical pixels; the engine deals
    /// exclusively in the 320x240 logical framebuffer, so every mouse
    /// coordinate is divided back down by the window scale before storage.
    fn to_logical(&self, physical: i32) -> u16 {
        (physical.max(0) as u32 / self.scale) as u16
    }
}

/// Best-effort mapping from an SDL keycode to the ASCII byte the engine
/// expects back from `READ_CHAR`/`GET_KEY`. Keys outside this table are
/// dropped rather than forwarded as `0x00`.
fn keycode_to_byte(keycode: Keycode) -> Option<u8> {
    match keycode {
        Keycode::Return => Some(b'\r'),
        Keycode::Backspace => Some(0x08),
        Keycode::Escape => Some(0x1B),
        Keycode::Space => Some(b' '),
        Keycode::Tab => Some(b'\t'),
        _ => {
            let name = keycode.name();
            if name.len() == 1 {
                name.bytes().next()
            } else {
                None
            }
        }
    }
}

impl<'a> IoEffects for SdlHost<'a> {
    fn print_char(&mut self, byte: u8) {
        print!("{}", byte as char);
        use std::io::Write;
        let _ = std::io::stdout().flush();
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
        let framebuffer = &self.framebuffer;
        let _ = self
            .frame_texture
            .with_lock(None, |buffer: &mut [u8], pitch: usize| {
                for y in 0..Framebuffer::HEIGHT as usize {
                    for x in 0..Framebuffer::WIDTH as usize {
                        let shade = framebuffer.get_pixel(x as u16, y as u16);
                        let offset = y * pitch + x * 3;
                        buffer[offset] = shade;
                        buffer[offset + 1] = shade;
                        buffer[offset + 2] = shade;
                    }
                }
            });

        let mut canvas = self.system.canvas.borrow_mut();
        canvas.clear();
        let _ = canvas.copy(&self.frame_texture, None, None);
        canvas.present();
    }
}

impl<'a> HostIo for SdlHost<'a> {
    fn process_events(&mut self) -> bool {
        let mut event_pump = self.system.event_pump.borrow_mut();
        for event in event_pump.poll_iter() {
            match event {
                Event::Quit { .. } => return false,
                Event::KeyDown {
                    keycode: Some(keycode),
                    ..
                } => {
                    if let Some(byte) = keycode_to_byte(keycode) {
                        self.key = byte;
                        self.key_available = true;
                    }
                }
                Event::MouseMotion { x, y, .. } => {
                    self.mouse_x = self.to_logical(x);
                    self.mouse_y = self.to_logical(y);
                    self.mouse_event = true;
                }
                Event::MouseButtonDown { mouse_btn, x, y, .. } => {
                    self.mouse_x = self.to_logical(x);
                    self.mouse_y = self.to_logical(y);
                    self.mouse_buttons |= mouse_button_bit(mouse_btn);
                    self.mouse_event = true;
                }
                Event::MouseButtonUp { mouse_btn, x, y, .. } => {
                    self.mouse_x = self.to_logical(x);
                    self.mouse_y = self.to_logical(y);
                    self.mouse_buttons &= !mouse_button_bit(mouse_btn);
                    self.mouse_event = true;
                }
                _ => {}
            }
        }
        true
    }

    fn is_waiting_for_input(&self) -> bool {
        self.waiting_for_input && !self.key_available
    }

    fn handle_io(&mut self, engine: &mut Engine, op: u8) -> Result<IoOutcome, Fault> {
        dispatch(engine, self, op)
    }
}

fn mouse_button_bit(button: MouseButton) -> u8 {
    match button {
        MouseButton::Left => 0b001,
        MouseButton::Right => 0b010,
        MouseButton::Middle => 0b100,
        _ => 0,
    }
}
