//! Cross-referenced board model built from the flat records of a board file.
//!
//! A [`BrdBoard`] is built once from a [`raw::RawBoard`] and is read-only
//! afterwards. Pins, nets and components refer to each other through the
//! index handles [`PinId`], [`NetId`] and [`ComponentId`].

mod convert;
pub mod error;
pub mod raw;
mod registry;
mod sexpr;

pub use error::{ParseError, RecordError};

/// Name of the net collecting every pin without a usable net name. Any net
/// name starting with this prefix is folded into it.
pub const UNCONNECTED_NET_NAME: &str = "UNCONNECTED";
/// Name of the component holding all test pads. Parts whose name starts with
/// it are dummies.
pub const DUMMY_COMPONENT_NAME: &str = "...";
pub const GROUND_NET_NAME: &str = "GND";

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

impl From<raw::RawPoint> for Point {
    fn from(raw::RawPoint { x, y }: raw::RawPoint) -> Self {
        Self { x, y }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum BoardSide {
    Top,
    Bottom,
    #[default]
    Both,
}

impl BoardSide {
    pub fn is_top(self) -> bool {
        matches!(self, Self::Top | Self::Both)
    }

    pub fn is_bottom(self) -> bool {
        matches!(self, Self::Bottom | Self::Both)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum MountType {
    Smd,
    #[default]
    Dip,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum ComponentType {
    #[default]
    Normal,
    /// Placeholder holding test pads
    Dummy,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PinType {
    Component,
    TestPad,
    NotConnected,
}

/// Handle of a net in [`Board::nets`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NetId(usize);

/// Handle of a component in [`Board::components`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ComponentId(usize);

/// Handle of a pin in [`Board::pins`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PinId(usize);

macro_rules! impl_index {
    ($($id:ident),*) => {
        $(impl $id {
            pub fn index(self) -> usize {
                self.0
            }
        })*
    };
}

impl_index!(NetId, ComponentId, PinId);

/// An electrical net, unique by name
#[derive(Debug, Clone, PartialEq)]
pub struct Net {
    pub name: String,
    pub is_ground: bool,
    /// Probe number, only known for nets with a nail
    pub number: Option<u32>,
    pub board_side: Option<BoardSide>,
    pub pins: Vec<PinId>,
}

impl Net {
    pub fn is_unconnected(&self) -> bool {
        self.name == UNCONNECTED_NET_NAME
    }
}

/// A part placed on the board
#[derive(Debug, Clone, PartialEq)]
pub struct Component {
    pub name: String,
    pub mfgcode: String,
    pub p1: Point,
    pub p2: Point,
    pub board_side: BoardSide,
    pub mount_type: MountType,
    pub component_type: ComponentType,
    pub pins: Vec<PinId>,
}

impl Component {
    pub fn is_dummy(&self) -> bool {
        self.component_type == ComponentType::Dummy
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Pin {
    pub pin_type: PinType,
    /// Side of the net for test pads, of the component otherwise
    pub board_side: BoardSide,
    /// Explicit label from the file, or the position within its part
    pub number: String,
    pub position: Point,
    pub diameter: f64,
    pub net: NetId,
    pub component: ComponentId,
}

/// The file format a board model was built from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BoardType {
    Brd,
}

/// Read-only view shared by every board format
pub trait Board {
    fn board_type(&self) -> BoardType;
    /// Board outline, in file order
    fn outline_points(&self) -> &[Point];
    /// Components sorted by name, exactly one of them the dummy
    fn components(&self) -> &[Component];
    /// Pins in file order
    fn pins(&self) -> &[Pin];
    /// Nets sorted by name, including the unconnected net
    fn nets(&self) -> &[Net];
}

/// Board model built from BRD style records
#[derive(Debug, Clone, PartialEq)]
pub struct BrdBoard {
    outline: Vec<Point>,
    components: Vec<Component>,
    pins: Vec<Pin>,
    nets: Vec<Net>,
    unconnected: NetId,
    dummy: ComponentId,
}

impl BrdBoard {
    /// Read a record dump and build the board from it
    pub fn from_dump(input: &str) -> Result<Self, ParseError> {
        let raw = raw::RawBoard::try_from(input)?;
        Ok(Self::try_from(raw)?)
    }

    pub fn net(&self, id: NetId) -> &Net {
        &self.nets[id.0]
    }

    pub fn component(&self, id: ComponentId) -> &Component {
        &self.components[id.0]
    }

    pub fn pin(&self, id: PinId) -> &Pin {
        &self.pins[id.0]
    }

    pub fn net_by_name(&self, name: &str) -> Option<&Net> {
        self.nets
            .binary_search_by(|net| net.name.as_str().cmp(name))
            .ok()
            .map(|idx| &self.nets[idx])
    }

    pub fn unconnected_net(&self) -> &Net {
        self.net(self.unconnected)
    }

    pub fn dummy_component(&self) -> &Component {
        self.component(self.dummy)
    }

    pub fn net_pins<'a>(&'a self, net: &'a Net) -> impl Iterator<Item = &'a Pin> + 'a {
        net.pins.iter().map(|&id| self.pin(id))
    }

    pub fn component_pins<'a>(
        &'a self,
        comp: &'a Component,
    ) -> impl Iterator<Item = &'a Pin> + 'a {
        comp.pins.iter().map(|&id| self.pin(id))
    }
}

impl Board for BrdBoard {
    fn board_type(&self) -> BoardType {
        BoardType::Brd
    }

    fn outline_points(&self) -> &[Point] {
        &self.outline
    }

    fn components(&self) -> &[Component] {
        &self.components
    }

    fn pins(&self) -> &[Pin] {
        &self.pins
    }

    fn nets(&self) -> &[Net] {
        &self.nets
    }
}
