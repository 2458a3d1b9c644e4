use log::debug;
use serde::Deserialize;
use winit::keyboard::KeyCode;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Lane {
    Left = 0,
    Down = 1,
    Up = 2,
    Right = 3,
}

impl Lane {
    pub const ALL: [Lane; 4] = [Lane::Left, Lane::Down, Lane::Up, Lane::Right];

    #[inline(always)]
    pub const fn index(self) -> usize {
        self as usize
    }

    pub const fn from_index(index: usize) -> Option<Lane> {
        match index {
            0 => Some(Lane::Left),
            1 => Some(Lane::Down),
            2 => Some(Lane::Up),
            3 => Some(Lane::Right),
            _ => None,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Lane::Left => "left",
            Lane::Down => "down",
            Lane::Up => "up",
            Lane::Right => "right",
        }
    }

    pub fn from_name(name: &str) -> Option<Lane> {
        match name {
            "left" => Some(Lane::Left),
            "down" => Some(Lane::Down),
            "up" => Some(Lane::Up),
            "right" => Some(Lane::Right),
            _ => None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InputSource {
    Keyboard,
    Remote,
}

#[derive(Clone, Copy, Debug)]
pub struct InputEvent {
    pub lane: Lane,
    pub source: InputSource,
}

#[inline(always)]
pub fn lane_from_keycode(code: KeyCode) -> Option<Lane> {
    match code {
        KeyCode::ArrowLeft | KeyCode::KeyD => Some(Lane::Left),
        KeyCode::ArrowDown | KeyCode::KeyF => Some(Lane::Down),
        KeyCode::ArrowUp | KeyCode::KeyJ => Some(Lane::Up),
        KeyCode::ArrowRight | KeyCode::KeyK => Some(Lane::Right),
        _ => None,
    }
}

#[derive(Deserialize)]
struct RemoteMessage {
    direction: String,
}

/// Parses a remote pad message of the shape `{"direction": "left"}`.
/// Malformed payloads and unknown directions are discarded; no error
/// surfaces to the caller.
pub fn lane_from_message(payload: &str) -> Option<Lane> {
    let message: RemoteMessage = match serde_json::from_str(payload) {
        Ok(message) => message,
        Err(_) => {
            debug!("Discarding unparseable input message: {:?}", payload);
            return None;
        }
    };

    let lane = Lane::from_name(&message.direction);
    if lane.is_none() {
        debug!("Discarding unknown input direction: {:?}", message.direction);
    }
    lane
}

#[cfg(test)]
mod tests {
    use super::{Lane, lane_from_keycode, lane_from_message};
    use winit::keyboard::KeyCode;

    #[test]
    fn arrow_keys_map_to_lanes() {
        assert_eq!(lane_from_keycode(KeyCode::ArrowLeft), Some(Lane::Left));
        assert_eq!(lane_from_keycode(KeyCode::ArrowDown), Some(Lane::Down));
        assert_eq!(lane_from_keycode(KeyCode::ArrowUp), Some(Lane::Up));
        assert_eq!(lane_from_keycode(KeyCode::ArrowRight), Some(Lane::Right));
        assert_eq!(lane_from_keycode(KeyCode::Escape), None);
    }

    #[test]
    fn remote_messages_parse_known_directions() {
        assert_eq!(lane_from_message(r#"{"direction": "left"}"#), Some(Lane::Left));
        assert_eq!(lane_from_message(r#"{"direction": "right"}"#), Some(Lane::Right));
    }

    #[test]
    fn remote_messages_discard_garbage() {
        assert_eq!(lane_from_message(r#"{"direction": "diagonal"}"#), None);
        assert_eq!(lane_from_message("not json"), None);
        assert_eq!(lane_from_message(r#"{"other": "left"}"#), None);
    }

    #[test]
    fn lane_indices_round_trip() {
        for lane in Lane::ALL {
            assert_eq!(Lane::from_index(lane.index()), Some(lane));
            assert_eq!(Lane::from_name(lane.as_str()), Some(lane));
        }
        assert_eq!(Lane::from_index(4), None);
    }
}
