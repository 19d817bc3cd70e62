//! The per-iteration diagnostic line: `Pred:<y>,True:<sin>`.
//!
//! Written for a serial plotter, so the format is fixed at two decimal
//! places. [`Diagnostic`] also parses the line back, which the monitor
//! uses.

use std::error::Error;
use std::fmt;
use std::str::FromStr;

/// One prediction next to its reference value.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Diagnostic {
    /// Model output.
    pub prediction: f32,
    /// `sin(phase)`.
    pub reference: f32,
}

impl Diagnostic {
    /// `|prediction - reference|`.
    pub fn abs_error(&self) -> f32 {
        (self.prediction - self.reference).abs()
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Pred:{:.2},True:{:.2}", self.prediction, self.reference)
    }
}

/// A line that is not a diagnostic.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ParseDiagnosticError {
    line: String,
}

impl fmt::Display for ParseDiagnosticError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "not a diagnostic line: {:?}", self.line)
    }
}

impl Error for ParseDiagnosticError {}

/// Split a leading decimal number off `s`: an optional sign, then digits
/// with an optional fraction, or a bare fraction like `.5`. Exponents,
/// `inf` and `nan` are not numbers here.
fn leading_number(s: &str) -> Option<(f32, &str)> {
    let bytes = s.as_bytes();
    let digits_from = |start: usize| {
        start
            + bytes[start..]
                .iter()
                .take_while(|b| b.is_ascii_digit())
                .count()
    };

    let int_start = usize::from(matches!(bytes.first().copied(), Some(b'+' | b'-')));
    let int_end = digits_from(int_start);
    let mut end = int_end;
    if bytes.get(int_end) == Some(&b'.') {
        let frac_end = digits_from(int_end + 1);
        if frac_end > int_end + 1 {
            end = frac_end;
        }
    }
    if end == int_start {
        return None;
    }
    let value: f32 = s[..end].parse().ok()?;
    value.is_finite().then(|| (value, &s[end..]))
}

/// Parse `Pred:<n>,True:<n>` at the start of `s`.
fn parse_at(s: &str) -> Option<Diagnostic> {
    let (prediction, rest) = leading_number(s.strip_prefix("Pred:")?)?;
    let (reference, _) = leading_number(rest.strip_prefix(",True:")?)?;
    Some(Diagnostic {
        prediction,
        reference,
    })
}

impl FromStr for Diagnostic {
    type Err = ParseDiagnosticError;

    /// Finds the first well-formed `Pred:<n>,True:<n>` anywhere in `s`.
    /// Text around it is ignored.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.match_indices("Pred:")
            .find_map(|(at, _)| parse_at(&s[at..]))
            .ok_or_else(|| ParseDiagnosticError { line: s.to_owned() })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_two_decimals() {
        let d = Diagnostic {
            prediction: 0.8412,
            reference: -0.007,
        };
        assert_eq!(d.to_string(), "Pred:0.84,True:-0.01");
    }

    #[test]
    fn parses_its_own_output() {
        let d: Diagnostic = "Pred:0.50,True:0.48\r\n".parse().unwrap();
        assert_eq!(d.prediction, 0.5);
        assert_eq!(d.reference, 0.48);
        assert!((d.abs_error() - 0.02).abs() < 1e-6);
    }

    #[test]
    fn rejects_other_lines() {
        for line in ["", "Pred:0.5", "True:0.5,Pred:0.5", "Pred:x,True:0.1"] {
            assert!(line.parse::<Diagnostic>().is_err(), "{line:?}");
        }
    }

    #[test]
    fn rejects_non_finite_values() {
        for line in [
            "Pred:nan,True:0.40",
            "Pred:NaN,True:0.40",
            "Pred:0.10,True:inf",
            "Pred:-inf,True:0.10",
            "Pred:1e3,True:0.10",
        ] {
            assert!(line.parse::<Diagnostic>().is_err(), "{line:?}");
        }
    }

    #[test]
    fn finds_diagnostic_inside_noise() {
        let d: Diagnostic = "[12] Pred:0.30,True:0.10 ok\n".parse().unwrap();
        assert_eq!(d.prediction, 0.3);
        assert_eq!(d.reference, 0.1);

        let d: Diagnostic = "Pred:bad Pred:-.5,True:+2".parse().unwrap();
        assert_eq!(d.prediction, -0.5);
        assert_eq!(d.reference, 2.0);
    }
}
