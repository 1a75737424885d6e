use macroquad::math::Vec2;

/// One node of a map's layer tree.
#[derive(Debug, Clone, PartialEq)]
pub enum LayerNode {
    /// Ordered children, drawn first to last.
    Group(GroupLayer),
    /// A grid of global tile ids.
    Tiles(TileLayer),
    /// A layer kind this renderer does not draw (objects, images, ...).
    Unsupported {
        /// Layer name.
        name: String,
        /// The `type` string from the map file.
        kind: String,
    },
}

impl LayerNode {
    /// Layer name.
    pub fn name(&self) -> &str {
        match self {
            LayerNode::Group(group) => &group.name,
            LayerNode::Tiles(tiles) => &tiles.name,
            LayerNode::Unsupported { name, .. } => name,
        }
    }

    /// Calls `f` for every tile layer in the subtree, depth-first.
    pub fn for_each_tile_layer<'a>(&'a self, f: &mut impl FnMut(&'a TileLayer)) {
        match self {
            LayerNode::Group(group) => {
                for child in &group.layers {
                    child.for_each_tile_layer(f);
                }
            }
            LayerNode::Tiles(tiles) => f(tiles),
            LayerNode::Unsupported { .. } => {}
        }
    }
}

/// Layer that only groups other layers.
#[derive(Debug, Clone, PartialEq)]
pub struct GroupLayer {
    /// Group name.
    pub name: String,
    /// Hidden groups hide their whole subtree.
    pub visible: bool,
    /// Added to the offsets of every child.
    pub offset: Vec2,
    /// Children in draw order.
    pub layers: Vec<LayerNode>,
}

impl GroupLayer {
    /// Visible group with no offset.
    pub fn new(name: impl Into<String>, layers: Vec<LayerNode>) -> Self {
        Self {
            name: name.into(),
            visible: true,
            offset: Vec2::ZERO,
            layers,
        }
    }
}

/// Row-major grid of global tile ids; `0` is an empty cell.
#[derive(Debug, Clone, PartialEq)]
pub struct TileLayer {
    /// Layer name.
    pub name: String,
    /// Columns.
    pub width: u32,
    /// Rows.
    pub height: u32,
    /// Hidden layers are never evaluated.
    pub visible: bool,
    /// World offset of the layer.
    pub offset: Vec2,
    /// `width * height` global tile ids.
    pub data: Vec<u32>,
}

impl TileLayer {
    /// Visible layer with no offset.
    pub fn new(name: impl Into<String>, width: u32, height: u32, data: Vec<u32>) -> Self {
        Self {
            name: name.into(),
            width,
            height,
            visible: true,
            offset: Vec2::ZERO,
            data,
        }
    }

    /// `data` holds exactly one id per cell.
    pub fn is_well_formed(&self) -> bool {
        self.data.len() as u64 == self.width as u64 * self.height as u64
    }
}

impl From<TileLayer> for LayerNode {
    fn from(layer: TileLayer) -> Self {
        LayerNode::Tiles(layer)
    }
}

impl From<GroupLayer> for LayerNode {
    fn from(group: GroupLayer) -> Self {
        LayerNode::Group(group)
    }
}
