//! Script parser.
//!
//! # Format
//!
//! One line per process, fields separated by spaces or tabs:
//!
//! ```text
//! # arrival  id  ops...
//! 0          0   C5 I3 P0 C2 V0 E
//! 1.5        1   P0 C4 V0 E
//! ```
//!
//! | Field     | Meaning                                                    |
//! |-----------|------------------------------------------------------------|
//! | arrival   | non-negative decimal; fractions round up to the next tick  |
//! | id        | must equal the line's position among process lines (0, 1, …) |
//! | `C<n>`    | CPU burst of `n` ticks                                     |
//! | `I<n>`    | IO request of `n` ticks                                    |
//! | `P<s>`    | acquire semaphore `s`                                      |
//! | `V<s>`    | release semaphore `s`                                      |
//! | `E`       | exit; must be the last op                                  |
//!
//! Blank lines and lines starting with `#` are skipped.  Errors carry the
//! 1-based physical line number.

use std::io::{BufRead, BufReader, Read};
use std::path::Path;

use ps_core::{ActorId, SemId, Tick};

use crate::script::{ActorScript, Op, Script};
use crate::{ScriptError, ScriptResult};

/// Load a script from a file.
pub fn load_script_path(path: &Path) -> ScriptResult<Script> {
    let file = std::fs::File::open(path)?;
    parse_script(file)
}

/// Like [`load_script_path`] but accepts any `Read` source.
pub fn parse_script<R: Read>(reader: R) -> ScriptResult<Script> {
    let mut actors = Vec::new();
    for (i, line) in BufReader::new(reader).lines().enumerate() {
        let line = line?;
        let text = line.trim();
        if text.is_empty() || text.starts_with('#') {
            continue;
        }
        let expected = ActorId::try_from(actors.len())
            .map_err(|_| ScriptError::parse(i + 1, "too many process lines"))?;
        actors.push(parse_line(i + 1, text, expected)?);
    }
    if actors.is_empty() {
        return Err(ScriptError::Empty);
    }
    Ok(Script { actors })
}

/// Parse one non-blank process line.
pub fn parse_line(line_no: usize, text: &str, expected: ActorId) -> ScriptResult<ActorScript> {
    let mut fields = text.split([' ', '\t']).filter(|f| !f.is_empty());
    let err = |msg: String| ScriptError::parse(line_no, msg);

    let arrival_field = fields.next().ok_or_else(|| err("missing arrival time".into()))?;
    let arrival = arrival_field
        .parse::<f64>()
        .ok()
        .and_then(Tick::ceil_from)
        .ok_or_else(|| err(format!("invalid arrival time {arrival_field:?}")))?;

    let id_field = fields.next().ok_or_else(|| err("missing process id".into()))?;
    let id = id_field
        .parse::<u32>()
        .map_err(|_| err(format!("invalid process id {id_field:?}")))?;
    if id != expected.0 {
        return Err(err(format!("process id {id} out of order: expected {}", expected.0)));
    }

    let mut ops = Vec::new();
    for token in fields {
        if ops.last() == Some(&Op::Exit) {
            return Err(err(format!("{token:?} after E")));
        }
        ops.push(parse_op(token).map_err(err)?);
    }
    if ops.last() != Some(&Op::Exit) {
        return Err(err("line does not end with E".into()));
    }

    Ok(ActorScript { actor: ActorId(id), arrival, ops })
}

fn parse_op(token: &str) -> Result<Op, String> {
    let mut chars = token.chars();
    let Some(kind) = chars.next() else {
        return Err("empty op".into());
    };
    let arg = chars.as_str();
    match kind {
        'C' => parse_amount(token, arg).map(Op::Cpu),
        'I' => parse_amount(token, arg).map(Op::Io),
        'P' => parse_sem(token, arg).map(Op::Acquire),
        'V' => parse_sem(token, arg).map(Op::Release),
        'E' if arg.is_empty() => Ok(Op::Exit),
        _ => Err(format!("unknown op {token:?}")),
    }
}

fn parse_amount(token: &str, arg: &str) -> Result<u64, String> {
    if arg.starts_with('-') {
        return Err(format!("negative duration in {token:?}"));
    }
    arg.parse::<u64>().map_err(|_| format!("invalid duration in {token:?}"))
}

fn parse_sem(token: &str, arg: &str) -> Result<SemId, String> {
    arg.parse::<u16>()
        .map(SemId)
        .map_err(|_| format!("invalid semaphore id in {token:?}"))
}
