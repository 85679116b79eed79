//! Strings are borrowed from the dump as written, so escape sequences are
//! rejected rather than kept undecoded.

use std::str::FromStr;

use crate::{error::ParseError, sexpr::SExpr};

use super::{MountingSide, PartType, RawBoard, RawNail, RawPart, RawPin, RawPoint};

fn number<T: FromStr>(field: &str, value: &str) -> Result<T, ParseError> {
    value.parse().map_err(|_| ParseError::InvalidNumber {
        field: field.to_owned(),
        value: value.to_owned(),
    })
}

/// String fields are borrowed as written, so a backslash escape cannot be
/// decoded
fn text<'a>(field: &str, value: &'a str) -> Result<&'a str, ParseError> {
    if value.contains('\\') {
        return Err(ParseError::UnsupportedEscape {
            field: field.to_owned(),
            value: value.to_owned(),
        });
    }
    Ok(value)
}

fn required_text<'a>(sexpr: &SExpr<'a>, field: &str) -> Result<&'a str, ParseError> {
    text(field, sexpr.value(field)?)
}

fn optional_text<'a>(sexpr: &SExpr<'a>, field: &str) -> Result<Option<&'a str>, ParseError> {
    sexpr
        .optional_value(field)?
        .map(|value| text(field, value))
        .transpose()
}

/// `(label x y)`
fn point(sexpr: &SExpr, label: &str) -> Result<RawPoint, ParseError> {
    let mut atoms = sexpr.child(label)?.atoms();
    let mut coord = || {
        atoms
            .next()
            .ok_or_else(|| ParseError::MissingValue(label.to_owned()))
            .and_then(|value| number(label, value))
    };
    let x = coord()?;
    let y = coord()?;
    Ok(RawPoint { x, y })
}

impl From<&str> for MountingSide {
    fn from(value: &str) -> Self {
        match value {
            "top" => Self::Top,
            "bottom" => Self::Bottom,
            _ => Self::Both,
        }
    }
}

impl From<&str> for PartType {
    fn from(value: &str) -> Self {
        match value {
            "smd" => Self::Smd,
            _ => Self::ThroughHole,
        }
    }
}

impl<'a> TryFrom<&SExpr<'a>> for RawPart<'a> {
    type Error = ParseError;

    fn try_from(sexpr: &SExpr<'a>) -> Result<Self, Self::Error> {
        Ok(RawPart {
            name: required_text(sexpr, "name")?,
            mfgcode: optional_text(sexpr, "mfgcode")?.unwrap_or_default(),
            p1: point(sexpr, "p1")?,
            p2: point(sexpr, "p2")?,
            mounting_side: sexpr
                .optional_value("side")?
                .map(MountingSide::from)
                .unwrap_or_default(),
            part_type: sexpr
                .optional_value("type")?
                .map(PartType::from)
                .unwrap_or_default(),
        })
    }
}

impl<'a> TryFrom<&SExpr<'a>> for RawPin<'a> {
    type Error = ParseError;

    fn try_from(sexpr: &SExpr<'a>) -> Result<Self, Self::Error> {
        let radius = match sexpr.optional_value("radius")? {
            Some(radius) => number("radius", radius)?,
            None => 0.0,
        };
        Ok(RawPin {
            part: number("part", sexpr.value("part")?)?,
            net: optional_text(sexpr, "net")?.unwrap_or_default(),
            snum: optional_text(sexpr, "snum")?,
            pos: point(sexpr, "pos")?,
            radius,
        })
    }
}

impl<'a> TryFrom<&SExpr<'a>> for RawNail<'a> {
    type Error = ParseError;

    fn try_from(sexpr: &SExpr<'a>) -> Result<Self, Self::Error> {
        let side = match sexpr.optional_value("side")? {
            Some(side) => number("side", side)?,
            None => 0,
        };
        Ok(RawNail {
            net: required_text(sexpr, "net")?,
            side,
            probe: number("probe", sexpr.value("probe")?)?,
        })
    }
}

impl<'a> TryFrom<&SExpr<'a>> for RawBoard<'a> {
    type Error = ParseError;

    fn try_from(root: &SExpr<'a>) -> Result<Self, Self::Error> {
        match root.label() {
            Some("board") => {}
            label => {
                return Err(ParseError::UnknownRecord(
                    label.unwrap_or_default().to_owned(),
                ))
            }
        }

        let mut board = RawBoard::default();
        for record in root.records() {
            match record.label() {
                Some("format") => {
                    for p in record.children("point") {
                        let mut atoms = p.atoms();
                        let (Some(x), Some(y)) = (atoms.next(), atoms.next()) else {
                            return Err(ParseError::MissingValue("point".to_owned()));
                        };
                        board.format.push(RawPoint {
                            x: number("point", x)?,
                            y: number("point", y)?,
                        });
                    }
                }
                Some("part") => board.parts.push(record.try_into()?),
                Some("pin") => board.pins.push(record.try_into()?),
                Some("nail") => board.nails.push(record.try_into()?),
                label => {
                    return Err(ParseError::UnknownRecord(
                        label.unwrap_or_default().to_owned(),
                    ))
                }
            }
        }
        Ok(board)
    }
}

/// Parse a record dump. The records borrow their strings from `input`.
impl<'a> TryFrom<&'a str> for RawBoard<'a> {
    type Error = ParseError;

    fn try_from(input: &'a str) -> Result<Self, Self::Error> {
        let root = SExpr::try_from(input)?;
        RawBoard::try_from(&root)
    }
}
