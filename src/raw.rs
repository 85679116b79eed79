//! Flat records as produced by a board-file parser, before any
//! cross-referencing.

mod parser;

/// All records of one board file
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawBoard<'a> {
    pub format: Vec<RawPoint>,
    pub parts: Vec<RawPart<'a>>,
    pub pins: Vec<RawPin<'a>>,
    pub nails: Vec<RawNail<'a>>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RawPoint {
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum MountingSide {
    Top,
    Bottom,
    #[default]
    Both,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PartType {
    Smd,
    #[default]
    ThroughHole,
}

/// A part on the board
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawPart<'a> {
    pub name: &'a str,
    pub mfgcode: &'a str,
    pub p1: RawPoint,
    pub p2: RawPoint,
    pub mounting_side: MountingSide,
    pub part_type: PartType,
}

/// A pin, owned by the part at the 1-based index `part`
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawPin<'a> {
    pub part: u32,
    /// Empty when the file carries no net for this pin
    pub net: &'a str,
    pub snum: Option<&'a str>,
    pub pos: RawPoint,
    /// Zero when the format has no radius field
    pub radius: f64,
}

/// A test probe ("nail") on a net
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawNail<'a> {
    pub net: &'a str,
    /// 1 is the top side, anything else the bottom
    pub side: i32,
    pub probe: u32,
}
