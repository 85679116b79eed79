//! Net registry: nets keyed by name while records are read, frozen into a
//! name sorted table before any pin refers to them.

use std::collections::BTreeMap;

use tracing::{debug, trace};

use crate::{raw::RawNail, BoardSide, Net, NetId, GROUND_NET_NAME, UNCONNECTED_NET_NAME};

/// Names that never get a net of their own
pub(crate) fn is_unconnected_name(name: &str) -> bool {
    name.is_empty() || name.starts_with(UNCONNECTED_NET_NAME)
}

fn new_net(name: &str) -> Net {
    Net {
        name: name.to_owned(),
        is_ground: name == GROUND_NET_NAME,
        number: None,
        board_side: None,
        pins: vec![],
    }
}

#[derive(Debug)]
pub(crate) struct NetRegistry {
    nets: BTreeMap<String, Net>,
}

impl NetRegistry {
    pub(crate) fn new() -> Self {
        let mut nets = BTreeMap::new();
        nets.insert(
            UNCONNECTED_NET_NAME.to_owned(),
            new_net(UNCONNECTED_NET_NAME),
        );
        Self { nets }
    }

    /// Seed the registry with the nets named by test probes. A later probe on
    /// the same net replaces the earlier one.
    pub(crate) fn from_nails(nails: &[RawNail]) -> Self {
        let mut registry = Self::new();
        for nail in nails {
            if is_unconnected_name(nail.net) {
                trace!(net = nail.net, probe = nail.probe, "Probe folded into unconnected net");
                continue;
            }
            let mut net = new_net(nail.net);
            net.number = Some(nail.probe);
            net.board_side = Some(if nail.side == 1 {
                BoardSide::Top
            } else {
                BoardSide::Bottom
            });
            if let Some(old) = registry.nets.insert(net.name.clone(), net) {
                debug!(net = %old.name, old_probe = ?old.number, probe = nail.probe, "Probe replaces earlier probe");
            }
        }
        registry
    }

    /// Make sure a net called `name` exists. A new net takes its side from
    /// `side`, the side of the component whose pin names it.
    pub(crate) fn register(&mut self, name: &str, side: BoardSide) {
        if is_unconnected_name(name) || self.nets.contains_key(name) {
            return;
        }
        debug!(net = name, ?side, "Creating net without probe");
        let mut net = new_net(name);
        net.board_side = Some(side);
        self.nets.insert(name.to_owned(), net);
    }

    pub(crate) fn freeze(self) -> NetTable {
        let nets: Vec<Net> = self.nets.into_values().collect();
        let unconnected = nets
            .binary_search_by(|net| net.name.as_str().cmp(UNCONNECTED_NET_NAME))
            .map(NetId)
            .expect("registry is seeded with the unconnected net");
        NetTable { nets, unconnected }
    }
}

/// Where a pin's net name leads
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum NetResolution {
    Named(NetId),
    /// Empty, unconnected or unknown name
    Unconnected(NetId),
}

impl NetResolution {
    pub(crate) fn id(self) -> NetId {
        match self {
            Self::Named(id) | Self::Unconnected(id) => id,
        }
    }
}

/// The final, name sorted nets. Handles into it stay valid.
#[derive(Debug)]
pub(crate) struct NetTable {
    nets: Vec<Net>,
    unconnected: NetId,
}

impl NetTable {
    pub(crate) fn resolve(&self, name: &str) -> NetResolution {
        if is_unconnected_name(name) {
            return NetResolution::Unconnected(self.unconnected);
        }
        match self
            .nets
            .binary_search_by(|net| net.name.as_str().cmp(name))
        {
            Ok(idx) => NetResolution::Named(NetId(idx)),
            Err(_) => NetResolution::Unconnected(self.unconnected),
        }
    }

    pub(crate) fn get(&self, id: NetId) -> &Net {
        &self.nets[id.0]
    }

    pub(crate) fn unconnected(&self) -> NetId {
        self.unconnected
    }

    pub(crate) fn into_nets(self) -> Vec<Net> {
        self.nets
    }

    pub(crate) fn nets_mut(&mut self) -> &mut [Net] {
        &mut self.nets
    }
}
