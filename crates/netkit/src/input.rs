//! Console key input for the headless host.
//!
//! Each line typed on stdin names a key (`F9`, `backquote`, ...). Keys typed
//! since the previous tick count as pressed for exactly one tick.

use netkit_service::{InputPoll, KeyCode};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing::{debug, warn};

pub struct ConsoleInput {
    receiver: mpsc::UnboundedReceiver<KeyCode>,
    pressed: Vec<KeyCode>,
}

impl ConsoleInput {
    /// Spawns a task that reads key names from stdin.
    pub fn spawn() -> Self {
        let (sender, receiver) = mpsc::unbounded_channel();

        tokio::spawn(async move {
            let mut lines = BufReader::new(tokio::io::stdin()).lines();
            loop {
                match lines.next_line().await {
                    Ok(Some(line)) => {
                        let line = line.trim();
                        if line.is_empty() {
                            continue;
                        }
                        match line.parse::<KeyCode>() {
                            Ok(key) => {
                                if sender.send(key).is_err() {
                                    break;
                                }
                            }
                            Err(e) => warn!("⌨️ {}", e),
                        }
                    }
                    Ok(None) => {
                        debug!("⌨️ stdin closed, console input disabled");
                        break;
                    }
                    Err(e) => {
                        warn!("⌨️ Failed to read stdin: {}", e);
                        break;
                    }
                }
            }
        });

        Self::from_receiver(receiver)
    }

    pub fn from_receiver(receiver: mpsc::UnboundedReceiver<KeyCode>) -> Self {
        Self {
            receiver,
            pressed: Vec::new(),
        }
    }

    /// Replaces this tick's pressed keys with everything queued since the last call.
    pub fn drain(&mut self) {
        self.pressed.clear();
        while let Ok(key) = self.receiver.try_recv() {
            self.pressed.push(key);
        }
    }
}

impl InputPoll for ConsoleInput {
    fn key_pressed(&self, key: KeyCode) -> bool {
        self.pressed.contains(&key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keys_are_pressed_for_one_tick() {
        let (sender, receiver) = mpsc::unbounded_channel();
        let mut input = ConsoleInput::from_receiver(receiver);

        sender.send(KeyCode::F9).unwrap();
        input.drain();
        assert!(input.key_pressed(KeyCode::F9));
        assert!(!input.key_pressed(KeyCode::F1));

        input.drain();
        assert!(!input.key_pressed(KeyCode::F9));
    }

    #[test]
    fn test_closed_channel_reports_nothing() {
        let (sender, receiver) = mpsc::unbounded_channel();
        let mut input = ConsoleInput::from_receiver(receiver);
        sender.send(KeyCode::Insert).unwrap();
        drop(sender);

        input.drain();
        assert!(input.key_pressed(KeyCode::Insert));
        input.drain();
        assert!(!input.key_pressed(KeyCode::Insert));
    }
}
