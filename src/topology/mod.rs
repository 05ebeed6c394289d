pub use direction::{Direction, N_SOURCES, SRC_BOUNDARY, SRC_FLOODPLAIN, SRC_POINT};

pub mod builder;
pub mod direction;
pub mod length;

/// What sits in one compass slot of a link's branch table.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub enum BranchSlot {
    /// No branch connects through this direction.
    #[default]
    None,
    /// Reserved marker for an upstream connection at the domain edge.
    Boundary,
    /// A link of the network connects through this direction.
    Link(usize),
}

impl BranchSlot {
    pub fn is_some(&self) -> bool {
        *self != BranchSlot::None
    }
}

/// Interface code of one flow path at a node, used as the source index
/// for mass balance bookkeeping.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub enum InterfaceCode {
    /// No flow path (headwater upstream interface).
    #[default]
    None,
    /// Flow path through one of the 8 compass directions.
    Dir(Direction),
    /// Flow path across the domain boundary (source index 10).
    Boundary,
}

impl InterfaceCode {
    /// Source index 0..=10 of this interface, or None.
    pub fn source(&self) -> Option<usize> {
        match self {
            InterfaceCode::None => None,
            InterfaceCode::Dir(d) => Some(d.code()),
            InterfaceCode::Boundary => Some(SRC_BOUNDARY),
        }
    }
}

/// Interface direction tables of one node. Interior nodes carry their two
/// flow paths in the zeroeth slot; junction nodes carry one slot per
/// compass direction a branch connects through.
#[derive(Clone, Debug, Default)]
pub struct NodeDirections {
    pub up: [InterfaceCode; 9],
    pub down: [InterfaceCode; 9],
}

/// One internode flow path, listed exactly once for the whole network.
/// Routing and solids transport sweep these so that the outflux written
/// on one side is, by construction, the influx seen on the other.
#[derive(Clone, Copy, Debug)]
pub struct ChannelInterface {
    pub up_link: usize,
    pub up_node: usize,
    pub down_link: usize,
    pub down_node: usize,
    /// Source index of this interface in the upstream node's flux arrays.
    pub up_source: usize,
    /// Source index of this interface in the downstream node's flux arrays.
    pub down_source: usize,
}

/// The channel network: per-link ordered node anchors, branch tables at
/// junctions, per-node interface directions, internode interfaces and
/// channel lengths. Built once from the link/node rasters and read-only
/// for the duration of a run.
#[derive(Clone, Default, Debug)]
pub struct ChannelNetwork {
    pub nlinks: usize,
    pub nodes_per_link: Vec<usize>,

    /// (row, col) of every node, `anchors[link][node]`.
    pub anchors: Vec<Vec<(usize, usize)>>,
    /// Cell of the last node of the nearest upstream link, if any.
    pub upstream_anchor: Vec<Option<(usize, usize)>>,
    /// Cell of the first node of the downstream link, if any.
    pub downstream_anchor: Vec<Option<(usize, usize)>>,

    /// `up_branches[link][d - 1]` for compass code d.
    pub up_branches: Vec<[BranchSlot; 8]>,
    pub down_branches: Vec<[BranchSlot; 8]>,

    pub directions: Vec<Vec<NodeDirections>>,
    pub interfaces: Vec<ChannelInterface>,

    /// Node-to-node channel length including sinuosity (m).
    pub length: Vec<Vec<f64>>,
    /// Half length from the upstream edge to the node midpoint (m).
    pub length_up: Vec<Vec<f64>>,
    /// Half length from the node midpoint to the downstream edge (m).
    pub length_down: Vec<Vec<f64>>,

    /// Per grid cell: the (link, node) bound to it, if the cell is a
    /// channel cell.
    pub link_node_of_cell: Vec<Option<(usize, usize)>>,
}

impl ChannelNetwork {
    pub fn n_nodes(&self, link: usize) -> usize {
        self.nodes_per_link[link]
    }

    pub fn is_first_node(&self, node: usize) -> bool {
        node == 0
    }

    pub fn is_last_node(&self, link: usize, node: usize) -> bool {
        node + 1 == self.nodes_per_link[link]
    }

    pub fn up_branch_count(&self, link: usize) -> usize {
        self.up_branches[link].iter().filter(|b| b.is_some()).count()
    }

    pub fn down_branch_count(&self, link: usize) -> usize {
        self.down_branches[link].iter().filter(|b| b.is_some()).count()
    }

    /// Iterate (link, node) over the whole network.
    pub fn nodes(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        (0..self.nlinks).flat_map(move |l| (0..self.nodes_per_link[l]).map(move |n| (l, n)))
    }

    pub fn n_nodes_total(&self) -> usize {
        self.nodes_per_link.iter().sum()
    }
}
