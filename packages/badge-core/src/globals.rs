//! Persisted Globals
//!
//! The record the badge modes share and that survives a reboot: the mode to resume,
//! the menu cursor and the per mode selections.
//!
//! Every field is stored under its own key in the `fsm` namespace. A field that is
//! not listed in [`FIELDS`] is not persisted.

use crate::store::KeyValueStore;

/// Namespace the globals are stored in
pub const NAMESPACE: &str = "fsm";

/// State shared by all badge modes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Globals {
    /// Id of the mode to resume after a reboot
    pub resume_state_idx: u8,
    /// Main menu cursor
    pub menu_main_pointer_idx: u8,
    /// Pride flag selection, 0 cycles through all flags
    pub pride_flag_mode_idx: u8,
    pub anim_rainbow_idx: u8,
    pub anim_snake_idx: u8,
    pub anim_matrix_idx: u8,
    pub anim_heartbeat_hue: u8,
    pub anim_heartbeat_speed: u8,
    pub anim_perlin_speed: u8,
    pub huemesh_own_hue: u8,
    /// Global LED brightness in percent
    pub led_brightness_percent: u8,
    /// Ignore touch input in display modes
    pub locked: bool,
}

impl Default for Globals {
    fn default() -> Self {
        Self {
            resume_state_idx: 0,
            menu_main_pointer_idx: 0,
            pride_flag_mode_idx: 1,
            anim_rainbow_idx: 0,
            anim_snake_idx: 0,
            anim_matrix_idx: 0,
            anim_heartbeat_hue: 0,
            anim_heartbeat_speed: 1,
            anim_perlin_speed: 1,
            huemesh_own_hue: 0,
            led_brightness_percent: 40,
            locked: false,
        }
    }
}

/// A persisted field: storage key, default and accessors
pub struct Field {
    pub key: &'static str,
    pub default: u8,
    pub get: fn(&Globals) -> u8,
    pub set: fn(&mut Globals, u8),
}

/// All persisted fields
pub const FIELDS: [Field; 12] = [
    Field {
        key: "resumeStateIdx",
        default: 0,
        get: |g| g.resume_state_idx,
        set: |g, v| g.resume_state_idx = v,
    },
    Field {
        key: "menuIdx",
        default: 0,
        get: |g| g.menu_main_pointer_idx,
        set: |g, v| g.menu_main_pointer_idx = v,
    },
    Field {
        key: "prideFlagMode",
        default: 1,
        get: |g| g.pride_flag_mode_idx,
        set: |g, v| g.pride_flag_mode_idx = v,
    },
    Field {
        key: "animRainbow",
        default: 0,
        get: |g| g.anim_rainbow_idx,
        set: |g, v| g.anim_rainbow_idx = v,
    },
    Field {
        key: "animSnake",
        default: 0,
        get: |g| g.anim_snake_idx,
        set: |g, v| g.anim_snake_idx = v,
    },
    Field {
        key: "animMatrixIdx",
        default: 0,
        get: |g| g.anim_matrix_idx,
        set: |g, v| g.anim_matrix_idx = v,
    },
    Field {
        key: "animHbHue",
        default: 0,
        get: |g| g.anim_heartbeat_hue,
        set: |g, v| g.anim_heartbeat_hue = v,
    },
    Field {
        key: "animHbSpeed",
        default: 1,
        get: |g| g.anim_heartbeat_speed,
        set: |g, v| g.anim_heartbeat_speed = v,
    },
    Field {
        key: "animPerlinSpeed",
        default: 1,
        get: |g| g.anim_perlin_speed,
        set: |g, v| g.anim_perlin_speed = v,
    },
    Field {
        key: "huemeshOwnHue",
        default: 0,
        get: |g| g.huemesh_own_hue,
        set: |g, v| g.huemesh_own_hue = v,
    },
    Field {
        key: "ledBrightPcent",
        default: 40,
        get: |g| g.led_brightness_percent,
        set: |g, v| g.led_brightness_percent = v,
    },
    Field {
        key: "locked",
        default: 0,
        get: |g| u8::from(g.locked),
        set: |g, v| g.locked = v != 0,
    },
];

impl Globals {
    /// Replaces the stored record with this one
    pub fn persist<S: KeyValueStore>(&self, store: &mut S) -> Result<(), S::Error> {
        store.begin(NAMESPACE, false)?;
        info!("globals: persisting to namespace {}", NAMESPACE);
        store.clear()?;
        for field in &FIELDS {
            let value = (field.get)(self);
            store.put_u8(field.key, value)?;
            debug!("globals:  -> {} = {}", field.key, value);
        }
        store.end()
    }

    /// Reads the stored record, using defaults for missing keys
    pub fn restore<S: KeyValueStore>(store: &mut S) -> Result<Self, S::Error> {
        let mut globals = Self::default();
        store.begin(NAMESPACE, true)?;
        info!("globals: restoring from namespace {}", NAMESPACE);
        for field in &FIELDS {
            let value = store.get_u8(field.key, field.default)?;
            (field.set)(&mut globals, value);
            debug!("globals:  -> {} = {}", field.key, value);
        }
        store.end()?;
        Ok(globals)
    }
}
