use std::time::Instant;

use bytemuck::{Pod, Zeroable};
use chrono::{Datelike, Local, Timelike};

/// Per-dispatch environment record bound at the environment slot.
///
/// The layout mirrors the `Uniform` struct the generated header declares
/// (see [`Environment::MSL_LAYOUT`]): 80 bytes, 16-byte aligned, with the
/// trailing padding spelled out so the whole record can be uploaded verbatim.
#[repr(C, align(16))]
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Environment {
    /// Year, month, day, seconds since local midnight.
    pub date: [f32; 4],
    pub pointer: [f32; 2],
    pub last_touch: [f32; 2],
    pub resolution: [f32; 2],
    /// `keys[0]` is the key currently held, `keys[1]` the key clicked this frame only.
    pub keys: [u32; 2],
    pub frame: i32,
    pub time: f32,
    pub time_delta: f32,
    pub buttons: i32,
    pub modifiers: i32,
    padding: [u32; 3],
}

unsafe impl Zeroable for Environment {}
unsafe impl Pod for Environment {}

/// One field of the shader-side `Uniform` struct.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MslField {
    pub ty: &'static str,
    pub name: &'static str,
    pub offset: usize,
}

/// Wall-clock bookkeeping the host keeps between frames.
#[derive(Debug, Clone, Copy)]
pub struct FrameClock {
    start: Instant,
    last: Instant,
    frames: u32,
}

impl FrameClock {
    pub fn new(now: Instant) -> Self {
        Self {
            start: now,
            last: now,
            frames: 0,
        }
    }

    pub fn frames(&self) -> u32 {
        self.frames
    }
}

impl Environment {
    pub const SIZE: usize = 80;

    pub const MSL_LAYOUT: [MslField; 10] = [
        MslField { ty: "float4", name: "iDate", offset: 0 },
        MslField { ty: "float2", name: "iMouse", offset: 16 },
        MslField { ty: "float2", name: "lastTouch", offset: 24 },
        MslField { ty: "float2", name: "iResolution", offset: 32 },
        MslField { ty: "uint2", name: "keyPress", offset: 40 },
        MslField { ty: "int", name: "iFrame", offset: 48 },
        MslField { ty: "float", name: "iTime", offset: 52 },
        MslField { ty: "float", name: "iTimeDelta", offset: 56 },
        MslField { ty: "int", name: "mouseButtons", offset: 60 },
        MslField { ty: "int", name: "eventModifiers", offset: 64 },
    ];

    pub fn new(width: u32, height: u32) -> Self {
        let mut environment = Self {
            resolution: [width as f32, height as f32],
            ..Self::zeroed()
        };
        environment.refresh_date();
        environment
    }

    pub fn set_resolution(&mut self, width: f32, height: f32) {
        self.resolution = [width, height];
    }

    pub fn set_pointer(&mut self, x: f32, y: f32) {
        self.pointer = [x, y];
    }

    pub fn set_last_touch(&mut self, x: f32, y: f32) {
        self.last_touch = [x, y];
    }

    pub fn set_buttons(&mut self, buttons: i32) {
        self.buttons = buttons;
    }

    pub fn set_modifiers(&mut self, modifiers: i32) {
        self.modifiers = modifiers;
    }

    pub fn press_key(&mut self, code: u32) {
        self.keys = [code, code];
    }

    pub fn release_key(&mut self) {
        self.keys[0] = 0;
    }

    /// Clears the clicked key once the frame that observed it has been dispatched.
    pub fn finish_frame(&mut self) {
        self.keys[1] = 0;
    }

    pub fn update_time(&mut self, clock: &mut FrameClock, now: Instant) {
        if clock.frames == 0 {
            clock.start = now;
            clock.last = now;
        }
        let elapsed = now.saturating_duration_since(clock.start);
        let delta = now.saturating_duration_since(clock.last);
        clock.last = now;

        self.time = elapsed.as_secs_f32();
        self.time_delta = delta.as_secs_f32();
        self.frame = clock.frames.min(i32::MAX as u32) as i32;
        clock.frames = clock.frames.saturating_add(1);
        self.refresh_date();
    }

    pub fn refresh_date(&mut self) {
        let local_now = Local::now();
        let seconds_since_midnight = local_now.num_seconds_from_midnight() as f32
            + local_now.nanosecond() as f32 / 1_000_000_000.0;
        self.date = [
            local_now.year() as f32,
            local_now.month() as f32,
            local_now.day() as f32,
            seconds_since_midnight,
        ];
    }

    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::bytes_of(self)
    }
}

#[cfg(test)]
mod tests {
    use std::mem::{align_of, offset_of, size_of};
    use std::time::Duration;

    use super::*;

    #[test]
    fn layout_matches_shader_struct() {
        assert_eq!(size_of::<Environment>(), Environment::SIZE);
        assert_eq!(align_of::<Environment>(), 16);
        let offsets = [
            offset_of!(Environment, date),
            offset_of!(Environment, pointer),
            offset_of!(Environment, last_touch),
            offset_of!(Environment, resolution),
            offset_of!(Environment, keys),
            offset_of!(Environment, frame),
            offset_of!(Environment, time),
            offset_of!(Environment, time_delta),
            offset_of!(Environment, buttons),
            offset_of!(Environment, modifiers),
        ];
        let declared: Vec<usize> = Environment::MSL_LAYOUT.iter().map(|f| f.offset).collect();
        assert_eq!(offsets.to_vec(), declared);
    }

    #[test]
    fn new_sets_resolution_and_date() {
        let env = Environment::new(640, 480);
        assert_eq!(env.resolution, [640.0, 480.0]);
        assert!(env.date[0] >= 2000.0);
        assert!((1.0..=12.0).contains(&env.date[1]));
        assert_eq!(env.as_bytes().len(), Environment::SIZE);
    }

    #[test]
    fn update_time_tracks_frames_and_deltas() {
        let start = Instant::now();
        let mut clock = FrameClock::new(start);
        let mut env = Environment::new(1, 1);

        env.update_time(&mut clock, start);
        assert_eq!(env.frame, 0);
        assert_eq!(env.time, 0.0);

        env.update_time(&mut clock, start + Duration::from_millis(500));
        assert_eq!(env.frame, 1);
        assert!((env.time - 0.5).abs() < 1e-4);
        assert!((env.time_delta - 0.5).abs() < 1e-4);

        env.update_time(&mut clock, start + Duration::from_millis(750));
        assert_eq!(env.frame, 2);
        assert!((env.time_delta - 0.25).abs() < 1e-4);
        assert_eq!(clock.frames(), 3);
    }

    #[test]
    fn clicked_key_lasts_one_frame() {
        let mut env = Environment::new(1, 1);
        env.press_key(32);
        assert_eq!(env.keys, [32, 32]);
        env.finish_frame();
        assert_eq!(env.keys, [32, 0]);
        env.release_key();
        assert_eq!(env.keys, [0, 0]);
    }
}
