use tracing::{debug, trace, warn};

use crate::{
    raw::{self, MountingSide, PartType, RawBoard, RawPin},
    registry::{NetRegistry, NetResolution, NetTable},
    BoardSide, BrdBoard, Component, ComponentId, ComponentType, MountType, Pin, PinId, PinType,
    Point, RecordError, DUMMY_COMPONENT_NAME,
};

impl From<MountingSide> for BoardSide {
    fn from(value: MountingSide) -> Self {
        match value {
            MountingSide::Top => Self::Top,
            MountingSide::Bottom => Self::Bottom,
            MountingSide::Both => Self::Both,
        }
    }
}

impl From<PartType> for MountType {
    fn from(value: PartType) -> Self {
        match value {
            PartType::Smd => Self::Smd,
            PartType::ThroughHole => Self::Dip,
        }
    }
}

impl<'a> From<&raw::RawPart<'a>> for Component {
    fn from(value: &raw::RawPart<'a>) -> Self {
        let raw::RawPart {
            name,
            mfgcode,
            p1,
            p2,
            mounting_side,
            part_type,
        } = *value;
        let component_type = if name.starts_with(DUMMY_COMPONENT_NAME) {
            ComponentType::Dummy
        } else {
            ComponentType::Normal
        };
        Component {
            name: name.to_owned(),
            mfgcode: mfgcode.to_owned(),
            p1: p1.into(),
            p2: p2.into(),
            board_side: mounting_side.into(),
            mount_type: part_type.into(),
            component_type,
            pins: vec![],
        }
    }
}

impl Component {
    /// The single component every test pad belongs to
    fn canonical_dummy() -> Self {
        Component {
            name: DUMMY_COMPONENT_NAME.to_owned(),
            mfgcode: String::new(),
            p1: Point::default(),
            p2: Point::default(),
            board_side: BoardSide::Both,
            mount_type: MountType::Dip,
            component_type: ComponentType::Dummy,
            pins: vec![],
        }
    }
}

/// Final component list plus, for every raw part, the component its pins
/// belong to
struct ComponentTable {
    components: Vec<Component>,
    parts: Vec<ComponentId>,
    dummy: ComponentId,
}

impl ComponentTable {
    fn new(parts: &[raw::RawPart]) -> Self {
        let mut ordered: Vec<(Option<usize>, Component)> = parts
            .iter()
            .enumerate()
            .map(|(idx, part)| (Some(idx), Component::from(part)))
            .filter(|(_, comp)| {
                if comp.is_dummy() {
                    trace!(name = %comp.name, "Dropping dummy part");
                }
                !comp.is_dummy()
            })
            .collect();
        ordered.push((None, Component::canonical_dummy()));
        // Stable, so equal names keep file order
        ordered.sort_by(|(_, a), (_, b)| a.name.cmp(&b.name));

        let dummy = ordered
            .iter()
            .position(|(part, _)| part.is_none())
            .map(ComponentId)
            .expect("canonical dummy was just added");
        let mut slots = vec![dummy; parts.len()];
        for (idx, (part, _)) in ordered.iter().enumerate() {
            if let Some(part) = part {
                slots[*part] = ComponentId(idx);
            }
        }

        ComponentTable {
            components: ordered.into_iter().map(|(_, comp)| comp).collect(),
            parts: slots,
            dummy,
        }
    }

    /// Component for the 1-based part index of the pin at `pin`
    fn lookup(&self, pin: usize, part: u32) -> Result<ComponentId, RecordError> {
        (part as usize)
            .checked_sub(1)
            .and_then(|idx| self.parts.get(idx))
            .copied()
            .ok_or_else(|| {
                warn!(pin, part, parts = self.parts.len(), "Pin references missing part");
                RecordError::PartIndexOutOfRange {
                    pin,
                    part,
                    parts: self.parts.len(),
                }
            })
    }

    fn get(&self, id: ComponentId) -> &Component {
        &self.components[id.0]
    }
}

/// Numbers pins within their part, restarting at 1 whenever the part index
/// changes between consecutive records
struct PinCounter {
    part: u32,
    idx: u32,
}

impl PinCounter {
    fn new() -> Self {
        Self { part: 1, idx: 0 }
    }

    fn advance(&mut self, part: u32) -> u32 {
        self.idx += 1;
        if part != self.part {
            self.part = part;
            self.idx = 1;
        }
        self.idx
    }
}

fn resolve_pin(
    raw_pin: &RawPin,
    component: ComponentId,
    components: &ComponentTable,
    nets: &NetTable,
    seq: u32,
) -> Pin {
    let comp = components.get(component);
    let mut pin_type = if comp.is_dummy() {
        PinType::TestPad
    } else {
        PinType::Component
    };

    let resolution = nets.resolve(raw_pin.net);
    if let NetResolution::Unconnected(_) = resolution {
        pin_type = PinType::NotConnected;
    }
    let net = resolution.id();

    let board_side = match pin_type {
        PinType::TestPad => nets.get(net).board_side.unwrap_or_default(),
        PinType::Component | PinType::NotConnected => comp.board_side,
    };

    let number = match raw_pin.snum {
        Some(snum) => snum.to_owned(),
        None => seq.to_string(),
    };

    Pin {
        pin_type,
        board_side,
        number,
        position: raw_pin.pos.into(),
        // Formats without a radius leave this at zero
        diameter: raw_pin.radius,
        net,
        component,
    }
}

impl<'a> TryFrom<RawBoard<'a>> for BrdBoard {
    type Error = RecordError;

    fn try_from(value: RawBoard<'a>) -> Result<Self, Self::Error> {
        let RawBoard {
            format,
            parts,
            pins,
            nails,
        } = value;
        debug!(
            points = format.len(),
            parts = parts.len(),
            pins = pins.len(),
            nails = nails.len(),
            "Building board"
        );

        let outline: Vec<Point> = format.into_iter().map(Point::from).collect();

        let mut components = ComponentTable::new(&parts);

        // Every net must exist before the first pin takes a handle to one
        let mut registry = NetRegistry::from_nails(&nails);
        let owners = pins
            .iter()
            .enumerate()
            .map(|(idx, pin)| {
                let owner = components.lookup(idx, pin.part)?;
                registry.register(pin.net, components.get(owner).board_side);
                Ok(owner)
            })
            .collect::<Result<Vec<_>, RecordError>>()?;
        let mut nets = registry.freeze();

        let mut counter = PinCounter::new();
        let pins: Vec<Pin> = pins
            .iter()
            .zip(owners)
            .map(|(raw_pin, owner)| {
                let seq = counter.advance(raw_pin.part);
                resolve_pin(raw_pin, owner, &components, &nets, seq)
            })
            .collect();

        for (idx, pin) in pins.iter().enumerate() {
            nets.nets_mut()[pin.net.0].pins.push(PinId(idx));
            components.components[pin.component.0].pins.push(PinId(idx));
        }

        let unconnected = nets.unconnected();
        let nets = nets.into_nets();
        debug!(
            components = components.components.len(),
            pins = pins.len(),
            nets = nets.len(),
            "Board built"
        );

        Ok(BrdBoard {
            outline,
            components: components.components,
            pins,
            nets,
            unconnected,
            dummy: components.dummy,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        raw::{RawNail, RawPart, RawPoint},
        Board, Net,
    };
    use rstest::*;

    macro_rules! test_data {
        ($fname:expr) => {
            std::fs::read_to_string(concat!(
                env!("CARGO_MANIFEST_DIR"),
                "/resources/test/",
                $fname
            ))
            .unwrap()
        };
    }

    fn part(name: &str, side: MountingSide) -> RawPart {
        RawPart {
            name,
            mounting_side: side,
            ..Default::default()
        }
    }

    fn pin(part: u32, net: &str) -> RawPin {
        RawPin {
            part,
            net,
            ..Default::default()
        }
    }

    fn nail(net: &str, side: i32, probe: u32) -> RawNail {
        RawNail { net, side, probe }
    }

    fn net<'b>(board: &'b BrdBoard, name: &str) -> &'b Net {
        board.net_by_name(name).unwrap()
    }

    #[fixture]
    fn sample() -> BrdBoard {
        BrdBoard::from_dump(&test_data!("board.sexpr")).unwrap()
    }

    #[test]
    fn ground_probe_on_top_part() {
        let board = BrdBoard::try_from(RawBoard {
            parts: vec![part("U1", MountingSide::Top)],
            pins: vec![pin(1, "GND")],
            nails: vec![nail("GND", 1, 3)],
            ..Default::default()
        })
        .unwrap();

        let gnd = net(&board, "GND");
        assert!(gnd.is_ground);
        assert_eq!(gnd.board_side, Some(BoardSide::Top));
        assert_eq!(gnd.number, Some(3));
        assert_eq!(board.pins()[0].board_side, BoardSide::Top);
        assert_eq!(board.pins()[0].pin_type, PinType::Component);
        assert_eq!(gnd.pins, [PinId(0)]);
    }

    #[test]
    fn empty_net_name_is_not_connected() {
        let board = BrdBoard::try_from(RawBoard {
            parts: vec![part("R1", MountingSide::Bottom)],
            pins: vec![pin(1, "")],
            ..Default::default()
        })
        .unwrap();

        let pin = &board.pins()[0];
        assert_eq!(pin.pin_type, PinType::NotConnected);
        assert_eq!(pin.board_side, BoardSide::Bottom);
        assert!(board.net(pin.net).is_unconnected());
        assert_eq!(board.unconnected_net().pins, [PinId(0)]);
    }

    #[test]
    fn dummy_part_pins_are_test_pads() {
        let board = BrdBoard::try_from(RawBoard {
            parts: vec![part("...", MountingSide::Top)],
            pins: vec![pin(1, "TP_VBUS")],
            nails: vec![nail("TP_VBUS", 2, 9)],
            ..Default::default()
        })
        .unwrap();

        let pin = &board.pins()[0];
        assert_eq!(pin.pin_type, PinType::TestPad);
        assert_eq!(pin.board_side, BoardSide::Bottom);
        assert_eq!(board.component(pin.component), board.dummy_component());
        assert_eq!(board.dummy_component().pins, [PinId(0)]);
    }

    #[test]
    fn test_pad_on_net_without_probe_takes_dummy_side() {
        let board = BrdBoard::try_from(RawBoard {
            parts: vec![part("...", MountingSide::Top)],
            pins: vec![pin(1, "TP1")],
            ..Default::default()
        })
        .unwrap();

        assert_eq!(net(&board, "TP1").board_side, Some(BoardSide::Both));
        assert_eq!(board.pins()[0].board_side, BoardSide::Both);
    }

    #[test]
    fn dummy_parts_collapse_into_one() {
        let board = BrdBoard::try_from(RawBoard {
            parts: vec![
                part("...", MountingSide::Top),
                part("U1", MountingSide::Top),
                part("...", MountingSide::Bottom),
            ],
            pins: vec![pin(1, "A"), pin(2, "B"), pin(3, "C")],
            ..Default::default()
        })
        .unwrap();

        let dummies: Vec<_> = board.components().iter().filter(|c| c.is_dummy()).collect();
        assert_eq!(dummies.len(), 1);
        assert_eq!(board.dummy_component().pins, [PinId(0), PinId(2)]);
        assert!(board
            .component_pins(board.dummy_component())
            .all(|p| p.pin_type == PinType::TestPad));
    }

    #[test]
    fn equal_names_keep_file_order() {
        let mut r1_b = part("R1", MountingSide::Top);
        r1_b.mfgcode = "b";
        let mut a = part("A", MountingSide::Top);
        a.mfgcode = "x";
        let mut r1_a = part("R1", MountingSide::Bottom);
        r1_a.mfgcode = "a";
        let board = BrdBoard::try_from(RawBoard {
            parts: vec![r1_b, a, r1_a],
            pins: vec![pin(1, "N1"), pin(2, "N1"), pin(3, "N2")],
            ..Default::default()
        })
        .unwrap();

        let comps: Vec<_> = board
            .components()
            .iter()
            .map(|c| (c.name.as_str(), c.mfgcode.as_str()))
            .collect();
        assert_eq!(comps, [("...", ""), ("A", "x"), ("R1", "b"), ("R1", "a")]);

        let owners: Vec<_> = board
            .pins()
            .iter()
            .map(|p| board.component(p.component).mfgcode.as_str())
            .collect();
        assert_eq!(owners, ["b", "x", "a"]);
        assert_eq!(board.components()[2].pins, [PinId(0)]);
        assert_eq!(board.components()[3].pins, [PinId(2)]);
    }

    #[rstest]
    #[case("")]
    #[case("UNCONNECTED")]
    #[case("UNCONNECTED_TP4")]
    fn unconnected_test_pad_is_not_connected(#[case] net_name: &str) {
        let board = BrdBoard::try_from(RawBoard {
            parts: vec![part("...", MountingSide::Top), part("U1", MountingSide::Top)],
            pins: vec![pin(1, net_name), pin(2, "GND")],
            nails: vec![nail("GND", 1, 1)],
            ..Default::default()
        })
        .unwrap();

        let pad = &board.pins()[0];
        assert_eq!(pad.pin_type, PinType::NotConnected);
        assert_eq!(pad.board_side, BoardSide::Both);
        assert_eq!(board.component(pad.component), board.dummy_component());
        assert_eq!(board.dummy_component().pins, [PinId(0)]);
        assert_eq!(board.unconnected_net().pins, [PinId(0)]);
    }

    #[rstest]
    #[case(vec![])]
    #[case(vec![part("...", MountingSide::Top)])]
    #[case(vec![part("...", MountingSide::Top), part("....", MountingSide::Both), part("...", MountingSide::Bottom)])]
    fn exactly_one_dummy(#[case] parts: Vec<RawPart<'static>>) {
        let board = BrdBoard::try_from(RawBoard {
            parts,
            ..Default::default()
        })
        .unwrap();

        assert_eq!(board.components().iter().filter(|c| c.is_dummy()).count(), 1);
        assert_eq!(board.dummy_component().name, DUMMY_COMPONENT_NAME);
    }

    #[test]
    fn unconnected_probes_do_not_fragment() {
        let board = BrdBoard::try_from(RawBoard {
            parts: vec![part("U1", MountingSide::Top)],
            pins: vec![pin(1, "UNCONNECTED3"), pin(1, "UNCONNECTED")],
            nails: vec![nail("UNCONNECTED1", 1, 1), nail("UNCONNECTED2", 1, 2)],
            ..Default::default()
        })
        .unwrap();

        let names: Vec<_> = board.nets().iter().map(|n| n.name.as_str()).collect();
        assert_eq!(names, ["UNCONNECTED"]);
        assert!(board
            .pins()
            .iter()
            .all(|p| p.pin_type == PinType::NotConnected));
        assert_eq!(board.unconnected_net().pins.len(), 2);
    }

    #[test]
    fn lazily_created_net_takes_first_component_side() {
        let board = BrdBoard::try_from(RawBoard {
            parts: vec![
                part("C1", MountingSide::Bottom),
                part("C2", MountingSide::Top),
            ],
            pins: vec![pin(1, "VCC"), pin(2, "VCC")],
            ..Default::default()
        })
        .unwrap();

        let vcc = net(&board, "VCC");
        assert_eq!(vcc.board_side, Some(BoardSide::Bottom));
        assert_eq!(vcc.number, None);
        assert_eq!(vcc.pins, [PinId(0), PinId(1)]);
        let sides: Vec<_> = board.pins().iter().map(|p| p.board_side).collect();
        assert_eq!(sides, [BoardSide::Bottom, BoardSide::Top]);
    }

    #[test]
    fn pin_numbers_restart_per_part() {
        let mut labelled = pin(2, "B");
        labelled.snum = Some("A7");
        let board = BrdBoard::try_from(RawBoard {
            parts: vec![part("U1", MountingSide::Top), part("U2", MountingSide::Top)],
            pins: vec![
                pin(1, "A"),
                pin(1, "A"),
                pin(1, "B"),
                pin(2, "A"),
                labelled,
                pin(2, "B"),
                pin(1, "C"),
            ],
            ..Default::default()
        })
        .unwrap();

        let numbers: Vec<_> = board.pins().iter().map(|p| p.number.as_str()).collect();
        assert_eq!(numbers, ["1", "2", "3", "1", "A7", "3", "1"]);
    }

    #[rstest]
    #[case(0)]
    #[case(3)]
    fn part_index_out_of_range(#[case] part_idx: u32) {
        let err = BrdBoard::try_from(RawBoard {
            parts: vec![part("U1", MountingSide::Top), part("U2", MountingSide::Top)],
            pins: vec![pin(1, "A"), pin(part_idx, "A")],
            ..Default::default()
        })
        .unwrap_err();

        assert_eq!(
            err,
            RecordError::PartIndexOutOfRange {
                pin: 1,
                part: part_idx,
                parts: 2,
            }
        );
    }

    #[test]
    fn geometry_is_copied() {
        let mut raw_pin = pin(1, "A");
        raw_pin.pos = RawPoint { x: 1.5, y: -2.0 };
        let mut raw_part = part("Q1", MountingSide::Both);
        raw_part.mfgcode = "BSS138";
        raw_part.p2 = RawPoint { x: 3.0, y: 4.0 };
        raw_part.part_type = PartType::Smd;
        let board = BrdBoard::try_from(RawBoard {
            format: vec![RawPoint { x: 5.0, y: 0.0 }, RawPoint { x: 0.0, y: 5.0 }],
            parts: vec![raw_part],
            pins: vec![raw_pin],
            ..Default::default()
        })
        .unwrap();

        assert_eq!(
            board.outline_points(),
            [Point::new(5.0, 0.0), Point::new(0.0, 5.0)]
        );
        let q1 = &board.components()[1];
        assert_eq!(q1.name, "Q1");
        assert_eq!(q1.mfgcode, "BSS138");
        assert_eq!(q1.p2, Point::new(3.0, 4.0));
        assert_eq!(q1.mount_type, MountType::Smd);
        assert_eq!(q1.board_side, BoardSide::Both);
        assert_eq!(board.pins()[0].position, Point::new(1.5, -2.0));
        assert_eq!(board.pins()[0].diameter, 0.0);
    }

    #[rstest]
    fn sample_is_sorted(sample: BrdBoard) {
        let nets: Vec<_> = sample.nets().iter().map(|n| n.name.as_str()).collect();
        let mut sorted = nets.clone();
        sorted.sort();
        assert_eq!(nets, sorted);
        assert_eq!(nets.iter().filter(|n| **n == "UNCONNECTED").count(), 1);

        let comps: Vec<_> = sample.components().iter().map(|c| c.name.as_str()).collect();
        let mut sorted = comps.clone();
        sorted.sort();
        assert_eq!(comps, sorted);
    }

    #[rstest]
    fn sample_pins_follow_their_side(sample: BrdBoard) {
        for pin in sample.pins() {
            let expected = match pin.pin_type {
                PinType::TestPad => sample.net(pin.net).board_side.unwrap_or_default(),
                _ => sample.component(pin.component).board_side,
            };
            assert_eq!(pin.board_side, expected);
        }
    }

    #[rstest]
    fn sample_links_are_consistent(sample: BrdBoard) {
        assert_eq!(sample.board_type(), crate::BoardType::Brd);
        for (idx, pin) in sample.pins().iter().enumerate() {
            assert!(sample.net(pin.net).pins.contains(&PinId(idx)));
            assert!(sample.component(pin.component).pins.contains(&PinId(idx)));
        }
        let linked: usize = sample.nets().iter().map(|n| n.pins.len()).sum();
        assert_eq!(linked, sample.pins().len());
    }

    #[rstest]
    fn sample_contents(sample: BrdBoard) {
        let names: Vec<_> = sample.components().iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, ["...", "C1", "R1", "U1"]);

        let gnd = net(&sample, "GND");
        assert!(gnd.is_ground);
        assert_eq!(gnd.number, Some(1));
        assert_eq!(gnd.board_side, Some(BoardSide::Top));

        let tp = sample.dummy_component();
        assert_eq!(tp.pins.len(), 2);
        let sides: Vec<_> = sample.component_pins(tp).map(|p| p.board_side).collect();
        assert_eq!(sides, [BoardSide::Top, BoardSide::Bottom]);

        let u1 = sample.components().iter().find(|c| c.name == "U1").unwrap();
        let numbers: Vec<_> = sample.component_pins(u1).map(|p| p.number.as_str()).collect();
        assert_eq!(numbers, ["1", "2", "3", "4"]);

        let nc: Vec<_> = sample
            .net_pins(sample.unconnected_net())
            .map(|p| p.pin_type)
            .collect();
        assert_eq!(nc, [PinType::NotConnected, PinType::NotConnected]);
    }
}
