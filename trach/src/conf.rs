//! Board wiring and tuning, stored as JSON.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};

use crate::device::{ht16k33, vl6180x};
use crate::poll::PollPolicy;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum PwmConf {
    /// One of the SoC's PWM channels.
    Hardware { channel: u8 },
    /// Software PWM on a plain GPIO line. Jittery, fine for a buzzer.
    Software { pin: u8 },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TofConf {
    pub address: u8,
    pub poll: PollPolicy,
    pub blocked_mm: u8,
}

impl Default for TofConf {
    fn default() -> Self {
        Self {
            address: vl6180x::DEFAULT_ADDRESS,
            poll: PollPolicy::default(),
            blocked_mm: 39,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayConf {
    pub address: u8,
    pub brightness: u8,
}

impl Default for DisplayConf {
    fn default() -> Self {
        Self {
            address: ht16k33::DEFAULT_ADDRESS,
            brightness: ht16k33::BRIGHTNESS_HIGHEST,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ButtonConf {
    pub start: u8,
    pub ems: u8,
    /// Hall switch, reads as pressed while the magnet is near.
    pub hall: u8,
    /// Used for press and release waits.
    pub poll: PollPolicy,
}

impl Default for ButtonConf {
    fn default() -> Self {
        Self {
            start: 5,
            ems: 6,
            hall: 26,
            poll: PollPolicy::new(100, 100),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Conf {
    pub i2c_bus: u8,
    pub tof: TofConf,
    pub display: DisplayConf,
    /// LED name -> BCM pin.
    pub leds: BTreeMap<String, u8>,
    pub buttons: ButtonConf,
    pub heartbeat_buzzer: PwmConf,
    pub alarm_buzzer: PwmConf,
    pub servo: PwmConf,
}

impl Default for Conf {
    fn default() -> Self {
        let leds = [
            ("red", 17),
            ("yellow", 27),
            ("green", 22),
            ("white", 23),
            ("blue", 24),
            ("status", 4),
        ]
        .into_iter()
        .map(|(name, pin)| (name.to_string(), pin))
        .collect();
        Self {
            i2c_bus: 1,
            tof: TofConf::default(),
            display: DisplayConf::default(),
            leds,
            buttons: ButtonConf::default(),
            heartbeat_buzzer: PwmConf::Hardware { channel: 1 },
            alarm_buzzer: PwmConf::Software { pin: 16 },
            servo: PwmConf::Hardware { channel: 0 },
        }
    }
}

impl Conf {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        let conf: Conf = serde_json::from_str(&text)
            .with_context(|| format!("parsing config {}", path.display()))?;
        conf.validate()?;
        Ok(conf)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let text = serde_json::to_string_pretty(self)?;
        fs::write(path, text).with_context(|| format!("writing config {}", path.display()))
    }

    /// Catches what the hardware would otherwise reject at runtime: a GPIO
    /// line claimed twice, a PWM channel the SoC does not have, an
    /// unreachable brightness.
    pub fn validate(&self) -> Result<()> {
        if self.display.brightness > ht16k33::BRIGHTNESS_HIGHEST {
            bail!("display brightness {} above 15", self.display.brightness);
        }

        let mut pins: BTreeMap<u8, String> = BTreeMap::new();
        let mut claim = |pin: u8, owner: String| -> Result<()> {
            if let Some(previous) = pins.insert(pin, owner.clone()) {
                bail!("GPIO {} used by both {} and {}", pin, previous, owner);
            }
            Ok(())
        };
        for (name, pin) in &self.leds {
            claim(*pin, format!("led {}", name))?;
        }
        claim(self.buttons.start, "start button".into())?;
        claim(self.buttons.ems, "ems button".into())?;
        claim(self.buttons.hall, "hall switch".into())?;

        let mut channels = Vec::new();
        for (owner, pwm) in [
            ("heartbeat buzzer", self.heartbeat_buzzer),
            ("alarm buzzer", self.alarm_buzzer),
            ("servo", self.servo),
        ] {
            match pwm {
                PwmConf::Software { pin } => claim(pin, owner.into())?,
                PwmConf::Hardware { channel } if channel > 1 => {
                    bail!("{}: no PWM channel {}", owner, channel)
                }
                PwmConf::Hardware { channel } if channels.contains(&channel) => {
                    bail!("{}: PWM channel {} already in use", owner, channel)
                }
                PwmConf::Hardware { channel } => channels.push(channel),
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        Conf::default().validate().unwrap();
    }

    #[test]
    fn partial_json_fills_in_defaults() {
        let conf: Conf =
            serde_json::from_str(r#"{ "i2c_bus": 2, "tof": { "blocked_mm": 50 } }"#).unwrap();
        assert_eq!(conf.i2c_bus, 2);
        assert_eq!(conf.tof.blocked_mm, 50);
        assert_eq!(conf.tof.address, 0x29);
        assert_eq!(conf.tof.poll, PollPolicy::new(100, 1));
        assert_eq!(conf.display.address, 0x70);
        assert_eq!(conf.leds.len(), 6);
    }

    #[test]
    fn pwm_conf_is_tagged() {
        let pwm: PwmConf = serde_json::from_str(r#"{ "kind": "software", "pin": 12 }"#).unwrap();
        assert_eq!(pwm, PwmConf::Software { pin: 12 });
    }

    #[test]
    fn duplicate_pin_rejected() {
        let mut conf = Conf::default();
        conf.buttons.ems = conf.buttons.start;
        assert!(conf.validate().is_err());
    }

    #[test]
    fn shared_hardware_channel_rejected() {
        let mut conf = Conf::default();
        conf.alarm_buzzer = conf.servo;
        assert!(conf.validate().is_err());
    }

    #[test]
    fn save_then_load() {
        let path = std::env::temp_dir().join(format!("trach-conf-{}.json", std::process::id()));
        let mut conf = Conf::default();
        conf.display.brightness = 3;
        conf.save(&path).unwrap();
        assert_eq!(Conf::load(&path).unwrap(), conf);
        let _ = fs::remove_file(&path);
    }
}
