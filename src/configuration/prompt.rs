//! Interactive initial-condition entry.
//!
//! Asks for each body's position, velocity and mass, then the duration.
//! An empty answer (or end of input) keeps the default shown in brackets;
//! an answer that does not parse is asked again.

use std::io::{self, BufRead, Write};

use super::config::ScenarioConfig;

/// Parse "x y", "x, y", "[x, y]" or "(x, y)" into two finite numbers
pub fn parse_pair(text: &str) -> Option<[f64; 2]> {
    let trimmed = text
        .trim()
        .trim_start_matches(['[', '('])
        .trim_end_matches([']', ')']);
    let values: Vec<f64> = trimmed
        .split(|c: char| c == ',' || c.is_whitespace())
        .filter(|s| !s.is_empty())
        .map(|s| s.parse::<f64>().ok().filter(|v| v.is_finite()))
        .collect::<Option<Vec<_>>>()?;
    match values.as_slice() {
        [x, y] => Some([*x, *y]),
        _ => None,
    }
}

/// Parse a single finite number
pub fn parse_scalar(text: &str) -> Option<f64> {
    text.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Ask until the answer parses; `None` from `parse` re-asks.
/// Returns `default` on an empty line or end of input.
fn ask<R, W, T, P>(input: &mut R, output: &mut W, question: &str, default: T, shown: &str, parse: P) -> io::Result<T>
where
    R: BufRead,
    W: Write,
    P: Fn(&str) -> Option<T>,
{
    loop {
        write!(output, "{} [{}]: ", question, shown)?;
        output.flush()?;

        let mut line = String::new();
        if input.read_line(&mut line)? == 0 {
            writeln!(output)?;
            return Ok(default);
        }
        if line.trim().is_empty() {
            return Ok(default);
        }
        match parse(&line) {
            Some(value) => return Ok(value),
            None => writeln!(output, "could not read '{}', try again", line.trim())?,
        }
    }
}

/// Fill a scenario from interactive answers, starting from `base`.
///
/// Only the body states and the duration are asked for; everything else
/// is taken from `base` unchanged.
pub fn prompt_scenario<R: BufRead, W: Write>(
    input: &mut R,
    output: &mut W,
    base: ScenarioConfig,
) -> io::Result<ScenarioConfig> {
    let mut cfg = base;

    for (i, body) in cfg.bodies.iter_mut().enumerate() {
        let n = i + 1;
        body.x = ask(
            input,
            output,
            &format!("Body {} position (x, y)", n),
            body.x,
            &format!("{}, {}", body.x[0], body.x[1]),
            parse_pair,
        )?;
        body.v = ask(
            input,
            output,
            &format!("Body {} velocity (vx, vy)", n),
            body.v,
            &format!("{}, {}", body.v[0], body.v[1]),
            parse_pair,
        )?;
        body.m = ask(
            input,
            output,
            &format!("Body {} mass", n),
            body.m,
            &body.m.to_string(),
            |s| parse_scalar(s).filter(|m| *m >= 0.0),
        )?;
    }

    let t_start = cfg.parameters.t_start;
    let duration = cfg.parameters.t_end - t_start;
    let duration = ask(
        input,
        output,
        "Simulation duration in seconds",
        duration,
        &duration.to_string(),
        |s| parse_scalar(s).filter(|d| *d > 0.0),
    )?;
    cfg.parameters.t_end = t_start + duration;

    Ok(cfg)
}
