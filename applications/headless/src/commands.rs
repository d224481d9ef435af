//! Line commands
//!
//! One command per line, whitespace separated. Unknown words and malformed
//! arguments are reported back without touching the session.

use crate::error::{AppError, Result};
use longplay_core::Track;
use longplay_session::Visibility;

pub const HELP: &str = "\
commands:
  load <id> [start]      load a track, optionally at an exact position
  queue <id>...          replace the queue and play the first entry
  play | pause | toggle
  seek <secs>            absolute seek
  fwd [secs] | back [secs]
  next | prev | select <index>
  shuffle | repeat | autoplay <on|off>
  rate <x> | volume <0-100> | expand <on|off>
  advance <secs>         run the simulated embed clock forward
  fail <code>            make the simulated embed report an error code
  hide | show            app visibility
  status | history [n] | close | help | quit";

/// A parsed input line
#[derive(Debug, Clone, PartialEq)]
pub enum Input {
    Load { track: Track, start: Option<f64> },
    Queue(Vec<Track>),
    Play,
    Pause,
    Toggle,
    Seek(f64),
    Forward(Option<f64>),
    Back(Option<f64>),
    Next,
    Previous,
    Select(usize),
    Shuffle,
    Repeat,
    AutoPlay(bool),
    Rate(f64),
    Volume(u8),
    Expand(bool),
    Advance(f64),
    Fail(i32),
    Visibility(Visibility),
    Status,
    History(usize),
    Close,
    Help,
    Quit,
}

/// Parse one line; `Ok(None)` for blank lines
pub fn parse_line(line: &str) -> Result<Option<Input>> {
    let mut words = line.split_whitespace();
    let Some(verb) = words.next() else {
        return Ok(None);
    };
    let args: Vec<&str> = words.collect();

    let input = match verb.to_ascii_lowercase().as_str() {
        "load" => {
            let id = required(&args, 0, "load <id> [start]")?;
            let start = args.get(1).map(|s| number(s)).transpose()?;
            Input::Load {
                track: placeholder_track(id),
                start,
            }
        }
        "queue" => {
            if args.is_empty() {
                return Err(AppError::Command("queue needs at least one id".to_string()));
            }
            Input::Queue(args.iter().map(|id| placeholder_track(id)).collect())
        }
        "play" => Input::Play,
        "pause" => Input::Pause,
        "toggle" => Input::Toggle,
        "seek" => Input::Seek(number(required(&args, 0, "seek <secs>")?)?),
        "fwd" | "forward" => Input::Forward(args.first().map(|s| number(s)).transpose()?),
        "back" | "rewind" => Input::Back(args.first().map(|s| number(s)).transpose()?),
        "next" => Input::Next,
        "prev" | "previous" => Input::Previous,
        "select" => {
            let raw = required(&args, 0, "select <index>")?;
            Input::Select(
                raw.parse()
                    .map_err(|_| AppError::Command(format!("'{raw}' is not an index")))?,
            )
        }
        "shuffle" => Input::Shuffle,
        "repeat" => Input::Repeat,
        "autoplay" => Input::AutoPlay(switch(required(&args, 0, "autoplay <on|off>")?)?),
        "rate" => Input::Rate(number(required(&args, 0, "rate <x>")?)?),
        "volume" | "vol" => {
            let raw = number(required(&args, 0, "volume <0-100>")?)?;
            Input::Volume(raw.clamp(0.0, 100.0).round() as u8)
        }
        "expand" => Input::Expand(switch(required(&args, 0, "expand <on|off>")?)?),
        "advance" | "tick" => Input::Advance(number(required(&args, 0, "advance <secs>")?)?),
        "fail" => {
            let raw = required(&args, 0, "fail <code>")?;
            Input::Fail(
                raw.parse()
                    .map_err(|_| AppError::Command(format!("'{raw}' is not an error code")))?,
            )
        }
        "hide" => Input::Visibility(Visibility::Hidden),
        "show" => Input::Visibility(Visibility::Visible),
        "status" | "s" => Input::Status,
        "history" => Input::History(
            args.first()
                .map(|s| {
                    s.parse()
                        .map_err(|_| AppError::Command(format!("'{s}' is not a count")))
                })
                .transpose()?
                .unwrap_or(10),
        ),
        "close" | "stop" => Input::Close,
        "help" | "?" => Input::Help,
        "quit" | "exit" | "q" => Input::Quit,
        other => return Err(AppError::Command(format!("unknown command '{other}'"))),
    };
    Ok(Some(input))
}

fn placeholder_track(id: &str) -> Track {
    Track::new(id, id).with_author("headless")
}

fn required<'a>(args: &[&'a str], index: usize, usage: &str) -> Result<&'a str> {
    args.get(index)
        .copied()
        .ok_or_else(|| AppError::Command(format!("usage: {usage}")))
}

fn number(raw: &str) -> Result<f64> {
    raw.parse::<f64>()
        .ok()
        .filter(|n| n.is_finite())
        .ok_or_else(|| AppError::Command(format!("'{raw}' is not a number")))
}

fn switch(raw: &str) -> Result<bool> {
    match raw.to_ascii_lowercase().as_str() {
        "on" | "true" | "yes" | "1" => Ok(true),
        "off" | "false" | "no" | "0" => Ok(false),
        _ => Err(AppError::Command(format!("expected on/off, got '{raw}'"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_lines_are_skipped() {
        assert_eq!(parse_line("   ").unwrap(), None);
    }

    #[test]
    fn load_with_and_without_start() {
        match parse_line("load abc 90").unwrap() {
            Some(Input::Load { track, start }) => {
                assert_eq!(track.id.as_str(), "abc");
                assert_eq!(start, Some(90.0));
            }
            other => panic!("unexpected {other:?}"),
        }
        assert!(matches!(
            parse_line("LOAD abc").unwrap(),
            Some(Input::Load { start: None, .. })
        ));
    }

    #[test]
    fn volume_is_clamped() {
        assert_eq!(parse_line("volume 250").unwrap(), Some(Input::Volume(100)));
        assert_eq!(parse_line("vol -3").unwrap(), Some(Input::Volume(0)));
    }

    #[test]
    fn malformed_arguments_are_rejected() {
        assert!(parse_line("seek").is_err());
        assert!(parse_line("seek soon").is_err());
        assert!(parse_line("rate NaN").is_err());
        assert!(parse_line("autoplay maybe").is_err());
        assert!(parse_line("queue").is_err());
        assert!(parse_line("dance").is_err());
    }

    #[test]
    fn optional_seek_step() {
        assert_eq!(parse_line("fwd").unwrap(), Some(Input::Forward(None)));
        assert_eq!(parse_line("back 30").unwrap(), Some(Input::Back(Some(30.0))));
    }
}
