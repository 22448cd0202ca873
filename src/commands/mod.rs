// commands/mod.rs
mod dispatcher;

pub use dispatcher::{CommandDispatcher, CommandOutcome, corrective_command};

use std::{fmt, str::FromStr};

use crate::error::CommandError;

/// A device command. On the wire it is `"<verb>"` or `"<verb> <value>"`.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    TurnOn,
    TurnOff,
    SetBrightness(u8),
    SetTargetTemp(f64),
    TakeSnapshot,
    StartRecording,
    StopRecording,
}

impl Command {
    pub fn verb(&self) -> &'static str {
        match self {
            Command::TurnOn => "turn_on",
            Command::TurnOff => "turn_off",
            Command::SetBrightness(_) => "set_brightness",
            Command::SetTargetTemp(_) => "set_target_temp",
            Command::TakeSnapshot => "take_snapshot",
            Command::StartRecording => "start_recording",
            Command::StopRecording => "stop_recording",
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Command::SetBrightness(value) => write!(f, "{} {}", self.verb(), value),
            Command::SetTargetTemp(value) => write!(f, "{} {:.1}", self.verb(), value),
            _ => f.write_str(self.verb()),
        }
    }
}

impl FromStr for Command {
    type Err = CommandError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let mut parts = line.split_whitespace();
        let verb = parts.next().unwrap_or_default();
        let value = parts.next();

        let command = match verb {
            "turn_on" => Command::TurnOn,
            "turn_off" => Command::TurnOff,
            "take_snapshot" => Command::TakeSnapshot,
            "start_recording" => Command::StartRecording,
            "stop_recording" => Command::StopRecording,
            "set_brightness" => {
                let value = value.ok_or(CommandError::MissingValue("set_brightness"))?;
                let brightness = value
                    .parse::<u8>()
                    .ok()
                    .filter(|brightness| *brightness <= 100)
                    .ok_or_else(|| CommandError::InvalidValue {
                        verb: "set_brightness",
                        value: value.to_string(),
                    })?;
                Command::SetBrightness(brightness)
            }
            "set_target_temp" => {
                let value = value.ok_or(CommandError::MissingValue("set_target_temp"))?;
                let target = value
                    .parse::<f64>()
                    .ok()
                    .filter(|target| target.is_finite())
                    .ok_or_else(|| CommandError::InvalidValue {
                        verb: "set_target_temp",
                        value: value.to_string(),
                    })?;
                Command::SetTargetTemp(target)
            }
            _ => return Err(CommandError::UnknownVerb(line.to_string())),
        };
        Ok(command)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_every_verb() {
        let cases = [
            ("turn_on", Command::TurnOn),
            ("turn_off", Command::TurnOff),
            ("set_brightness 40", Command::SetBrightness(40)),
            ("set_target_temp 18.5", Command::SetTargetTemp(18.5)),
            ("take_snapshot", Command::TakeSnapshot),
            ("start_recording", Command::StartRecording),
            ("stop_recording", Command::StopRecording),
        ];
        for (line, expected) in cases {
            assert_eq!(line.parse::<Command>().unwrap(), expected, "{line}");
        }
    }

    #[test]
    fn target_temperature_keeps_one_decimal() {
        assert_eq!(Command::SetTargetTemp(20.0).to_string(), "set_target_temp 20.0");
        assert_eq!(Command::SetBrightness(7).to_string(), "set_brightness 7");
        assert_eq!(Command::TakeSnapshot.to_string(), "take_snapshot");
    }

    #[test]
    fn rejects_bad_lines() {
        assert_eq!(
            "open_door".parse::<Command>(),
            Err(CommandError::UnknownVerb("open_door".into()))
        );
        assert_eq!(
            "set_brightness".parse::<Command>(),
            Err(CommandError::MissingValue("set_brightness"))
        );
        assert!(matches!(
            "set_brightness 250".parse::<Command>(),
            Err(CommandError::InvalidValue { .. })
        ));
        assert!(matches!(
            "set_target_temp warm".parse::<Command>(),
            Err(CommandError::InvalidValue { .. })
        ));
        assert!(matches!("".parse::<Command>(), Err(CommandError::UnknownVerb(_))));
    }
}
