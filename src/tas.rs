//! TAS (Tool-Assisted Speedrun) input recording and playback.
//!
//! Recordings are stored as a small JSON container listing only the
//! frames where the active button set changed, rather than one row per
//! frame.

use serde::{Deserialize, Serialize};

use gbcore_common::error::Error;

use crate::pad::{Pad, PadKey};

const BUTTON_NAMES: [(&str, PadKey); 8] = [
    ("Up", PadKey::Up),
    ("Down", PadKey::Down),
    ("Left", PadKey::Left),
    ("Right", PadKey::Right),
    ("Start", PadKey::Start),
    ("Select", PadKey::Select),
    ("A", PadKey::A),
    ("B", PadKey::B),
];

fn button_name(key: PadKey) -> &'static str {
    BUTTON_NAMES
        .iter()
        .find(|(_, candidate)| *candidate == key)
        .map(|(name, _)| *name)
        .unwrap()
}

fn button_key(name: &str) -> Option<PadKey> {
    BUTTON_NAMES
        .iter()
        .find(|(candidate, _)| *candidate == name)
        .map(|(_, key)| *key)
}

/// A single input row: the complete set of buttons held as of `frame`.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TasInput {
    pub frame: u64,
    pub buttons: Vec<String>,
}

/// Full TAS recording container, matching the on-disk JSON schema exactly.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TasRecording {
    pub version: String,
    pub frames: u64,
    pub inputs: Vec<TasInput>,
}

impl TasRecording {
    pub fn new() -> Self {
        Self {
            version: String::from("1.0"),
            frames: 0,
            inputs: vec![],
        }
    }

    pub fn from_json(data: &str) -> Result<Self, Error> {
        let recording: TasRecording = serde_json::from_str(data)
            .map_err(|error| Error::InvalidTasRecording(error.to_string()))?;
        recording.validate()?;
        Ok(recording)
    }

    pub fn to_json(&self) -> Result<String, Error> {
        serde_json::to_string_pretty(self).map_err(|error| Error::InvalidTasRecording(error.to_string()))
    }

    fn validate(&self) -> Result<(), Error> {
        let mut previous_frame: Option<u64> = None;
        for input in self.inputs.iter() {
            if let Some(previous) = previous_frame {
                if input.frame <= previous {
                    return Err(Error::InvalidTasRecording(format!(
                        "frame {} is not strictly greater than the previous frame {}",
                        input.frame, previous
                    )));
                }
            }
            previous_frame = Some(input.frame);

            for button in input.buttons.iter() {
                if button_key(button).is_none() {
                    return Err(Error::InvalidTasRecording(format!(
                        "unknown button name '{}'",
                        button
                    )));
                }
            }
        }
        Ok(())
    }
}

impl Default for TasRecording {
    fn default() -> Self {
        Self::new()
    }
}

/// Observes a [`Pad`] frame by frame, emitting a new [`TasInput`] row only
/// when the active button set differs from the previous frame.
pub struct TasRecorder {
    frame: u64,
    last_buttons: Option<Vec<PadKey>>,
    recording: TasRecording,
}

impl TasRecorder {
    pub fn new() -> Self {
        Self {
            frame: 0,
            last_buttons: None,
            recording: TasRecording::new(),
        }
    }

    /// Should be called once per emulated frame, after input has been
    /// applied to `pad` for that frame.
    pub fn sample(&mut self, pad: &Pad) {
        let active = pad.active_keys();
        let changed = match &self.last_buttons {
            Some(previous) => *previous != active,
            None => true,
        };
        if changed {
            self.recording.inputs.push(TasInput {
                frame: self.frame,
                buttons: active.iter().map(|key| String::from(button_name(*key))).collect(),
            });
            self.last_buttons = Some(active);
        }
        self.frame += 1;
        self.recording.frames = self.frame;
    }

    pub fn finish(self) -> TasRecording {
        self.recording
    }
}

impl Default for TasRecorder {
    fn default() -> Self {
        Self::new()
    }
}

/// Replays a [`TasRecording`] against a [`Pad`], driving `key_press`/
/// `key_lift` transitions at the recorded frame numbers.
pub struct TasPlayer {
    recording: TasRecording,
    cursor: usize,
    active: Vec<PadKey>,
    frame: u64,
}

impl TasPlayer {
    pub fn new(recording: TasRecording) -> Self {
        Self {
            recording,
            cursor: 0,
            active: vec![],
            frame: 0,
        }
    }

    /// Advances one emulated frame, applying any button transitions that
    /// are due, then returns whether the recording has been exhausted.
    pub fn step(&mut self, pad: &mut Pad) -> bool {
        while let Some(input) = self.recording.inputs.get(self.cursor) {
            if input.frame != self.frame {
                break;
            }

            let next: Vec<PadKey> = input
                .buttons
                .iter()
                .filter_map(|name| button_key(name))
                .collect();

            for key in self.active.iter() {
                if !next.contains(key) {
                    pad.key_lift(*key);
                }
            }
            for key in next.iter() {
                if !self.active.contains(key) {
                    pad.key_press(*key);
                }
            }

            self.active = next;
            self.cursor += 1;
        }

        self.frame += 1;
        self.frame >= self.recording.frames
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_json_roundtrip() {
        let json = r#"{ "version": "1.0", "frames": 1800, "inputs": [ { "frame": 0, "buttons": ["Start"] }, { "frame": 120, "buttons": [] } ] }"#;
        let recording = TasRecording::from_json(json).unwrap();
        assert_eq!(recording.frames, 1800);
        assert_eq!(recording.inputs.len(), 2);
        assert_eq!(recording.inputs[0].buttons, vec!["Start"]);

        let reencoded = recording.to_json().unwrap();
        let reparsed = TasRecording::from_json(&reencoded).unwrap();
        assert_eq!(reparsed.frames, recording.frames);
    }

    #[test]
    fn test_rejects_unknown_button() {
        let json = r#"{ "version": "1.0", "frames": 1, "inputs": [ { "frame": 0, "buttons": ["Turbo"] } ] }"#;
        assert!(TasRecording::from_json(json).is_err());
    }

    #[test]
    fn test_rejects_non_monotonic_frames() {
        let json = r#"{ "version": "1.0", "frames": 10, "inputs": [ { "frame": 5, "buttons": [] }, { "frame": 5, "buttons": ["A"] } ] }"#;
        assert!(TasRecording::from_json(json).is_err());
    }

    #[test]
    fn test_recorder_emits_change_only_rows() {
        let mut pad = Pad::new();
        let mut recorder = TasRecorder::new();

        recorder.sample(&pad);
        recorder.sample(&pad);

        pad.key_press(PadKey::A);
        recorder.sample(&pad);
        recorder.sample(&pad);

        pad.key_lift(PadKey::A);
        recorder.sample(&pad);

        let recording = recorder.finish();
        assert_eq!(recording.inputs.len(), 3);
        assert_eq!(recording.inputs[0].frame, 0);
        assert_eq!(recording.inputs[1].frame, 2);
        assert_eq!(recording.inputs[1].buttons, vec!["A"]);
        assert_eq!(recording.inputs[2].frame, 4);
        assert!(recording.inputs[2].buttons.is_empty());
    }

    #[test]
    fn test_player_replays_transitions() {
        let json = r#"{ "version": "1.0", "frames": 3, "inputs": [ { "frame": 0, "buttons": ["A"] }, { "frame": 2, "buttons": [] } ] }"#;
        let recording = TasRecording::from_json(json).unwrap();
        let mut player = TasPlayer::new(recording);
        let mut pad = Pad::new();

        player.step(&mut pad);
        assert!(pad.active_keys().contains(&PadKey::A));

        player.step(&mut pad);
        let done = player.step(&mut pad);
        assert!(!pad.active_keys().contains(&PadKey::A));
        assert!(done);
    }
}
