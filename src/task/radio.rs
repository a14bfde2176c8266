//! Radio
//!
//! This board variant ships without a radio module. [`OfflineRadio`] answers every
//! request the way a radio out of range would, so the update mode and the mesh game
//! still run and show their failure state.

use badge_core::board::{Radio, UpdateProgress};
use defmt::{debug, info, warn};

#[derive(Debug, Default)]
pub struct OfflineRadio {
    receiver_enabled: bool,
}

impl Radio for OfflineRadio {
    fn connect(&mut self, ssid: &str, _password: &str) -> bool {
        warn!("radio: no radio fitted, cannot join {}", ssid);
        false
    }

    fn enable_update_receiver(&mut self, _password: &str) {
        info!("radio: update receiver enabled, no updates can arrive");
        self.receiver_enabled = true;
    }

    fn disable(&mut self) {
        if self.receiver_enabled {
            info!("radio: update receiver disabled");
        }
        self.receiver_enabled = false;
    }

    fn pump(&mut self) -> UpdateProgress {
        UpdateProgress::Idle
    }

    fn mesh_broadcast(&mut self, payload: &[u8]) {
        debug!("radio: dropping {} byte mesh payload", payload.len());
    }

    fn mesh_receive(&mut self, _buffer: &mut [u8]) -> Option<usize> {
        None
    }
}
