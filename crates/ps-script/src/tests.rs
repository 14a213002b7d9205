//! Unit tests for ps-script.

use std::io::Cursor;

use ps_core::{ActorId, SemId, Tick};

use crate::{parse_script, Op, ScriptError};

fn parse(text: &str) -> Result<crate::Script, ScriptError> {
    parse_script(Cursor::new(text.as_bytes().to_vec()))
}

fn parse_err_line(text: &str) -> usize {
    match parse(text) {
        Err(ScriptError::Parse { line, .. }) => line,
        other => panic!("expected a parse error, got {other:?}"),
    }
}

#[cfg(test)]
mod valid {
    use super::*;

    #[test]
    fn parses_all_op_kinds() {
        let script = parse("0 0 C5 I3 P2 V2 E\n").unwrap();
        assert_eq!(script.len(), 1);
        let actor = &script.actors[0];
        assert_eq!(actor.actor, ActorId(0));
        assert_eq!(actor.arrival, Tick(0));
        assert_eq!(
            actor.ops,
            vec![Op::Cpu(5), Op::Io(3), Op::Acquire(SemId(2)), Op::Release(SemId(2)), Op::Exit]
        );
    }

    #[test]
    fn tabs_comments_and_blank_lines() {
        let text = "# two processes\n0\t0\tC1\tE\n\n  2 1  C2 C3 E  \n";
        let script = parse(text).unwrap();
        assert_eq!(script.len(), 2);
        assert_eq!(script.actors[1].arrival, Tick(2));
        assert_eq!(script.actors[1].ops, vec![Op::Cpu(2), Op::Cpu(3), Op::Exit]);
    }

    #[test]
    fn fractional_arrival_rounds_up() {
        let script = parse("1.5 0 E\n0.0 1 E\n").unwrap();
        assert_eq!(script.actors[0].arrival, Tick(2));
        assert_eq!(script.actors[1].arrival, Tick(0));
    }

    #[test]
    fn max_semaphore_scans_every_line() {
        let script = parse("0 0 P1 V1 E\n0 1 P7 E\n0 2 C1 E\n").unwrap();
        assert_eq!(script.max_semaphore(), Some(SemId(7)));
        assert_eq!(parse("0 0 C1 E\n").unwrap().max_semaphore(), None);
    }

    #[test]
    fn op_display_round_trips_tokens() {
        let line = "C5 I3 P0 V9 E";
        let script = parse(&format!("0 0 {line}\n")).unwrap();
        let shown: Vec<String> = script.actors[0].ops.iter().map(Op::to_string).collect();
        assert_eq!(shown.join(" "), line);
    }
}

#[cfg(test)]
mod invalid {
    use super::*;

    #[test]
    fn empty_script() {
        assert!(matches!(parse("\n# nothing\n"), Err(ScriptError::Empty)));
    }

    #[test]
    fn missing_exit() {
        assert_eq!(parse_err_line("0 0 C1 E\n0 1 C2\n"), 2);
    }

    #[test]
    fn op_after_exit() {
        assert_eq!(parse_err_line("0 0 E C1\n"), 1);
    }

    #[test]
    fn out_of_order_id() {
        assert_eq!(parse_err_line("0 1 E\n"), 1);
        assert_eq!(parse_err_line("0 0 E\n\n0 2 E\n"), 3);
    }

    #[test]
    fn negative_values() {
        assert_eq!(parse_err_line("-1 0 E\n"), 1);
        assert_eq!(parse_err_line("0 0 C-3 E\n"), 1);
        assert_eq!(parse_err_line("0 0 I-1 E\n"), 1);
    }

    #[test]
    fn malformed_tokens() {
        for bad in ["0 0 X1 E", "0 0 C E", "0 0 Pq E", "0 0 E1", "abc 0 E", "0 zero E", "0"] {
            assert_eq!(parse_err_line(bad), 1, "{bad:?} should fail");
        }
    }

    #[test]
    fn error_message_names_the_line() {
        let err = parse("0 0 C1 E\n0 1 Z E\n").unwrap_err();
        assert!(err.to_string().contains("line 2"), "{err}");
    }
}
