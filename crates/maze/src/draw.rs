use ccfile::{name_id, Archive};
use log::warn;
use sprite::{DrawOptions, Scale, SpriteCache, SpriteTarget};
use std::ops::RangeInclusive;

/// Mirror the sprite horizontally.
pub const FLIP: u16 = sprite::FLAG_FLIP;
/// Distant occupant: the host may swap in its far-away pose.
pub const ALT_FRAME: u16 = 0x4000;

pub const VIEW_WIDTH: i16 = 176;
pub const VIEW_HEIGHT: i16 = 136;
const CENTER_X: i16 = VIEW_WIDTH / 2;
const HORIZON_Y: i16 = 68;

/// Surface tiles per forward distance, centred on the viewer's column.
pub const SURFACE_WIDTHS: [u8; 5] = [3, 3, 5, 7, 7];
pub const FACING_WALL_WIDTHS: [u8; 5] = [3, 3, 3, 5, 9];
pub const OBJECT_WIDTHS: [u8; 4] = [1, 3, 3, 5];
pub const SLOT_COUNT: usize = 91;

/// Scale code per forward distance.
pub const DISTANCE_SCALES: [u16; 5] = [0, 4, 8, 11, 13];
const WALL_WIDTH: [i16; 5] = [128, 96, 64, 40, 24];
const WALL_HEIGHT: [i16; 5] = [96, 72, 48, 30, 18];
const SIDE_DEPTH: [i16; 5] = [24, 16, 16, 12, 8];

/// Frame in `F{KIND}3.FWL` for each wall art code; several codes share one distant look.
pub const FAR_WALL_FRAMES: [u16; 16] = [0, 0, 0, 1, 1, 1, 2, 2, 3, 3, 3, 4, 4, 5, 5, 5];

pub const NO_SPRITE: u16 = 0xFFFF;

/// Outdoor wall sheets by art code; `NO_SPRITE` codes are never drawn.
pub const OUTDOOR_WALL_IDS: [u16; 16] = [
    NO_SPRITE,
    name_id("MOUNT.WAL"),
    name_id("LTREE.WAL"),
    name_id("DTREE.WAL"),
    NO_SPRITE,
    name_id("SNOTREE.WAL"),
    name_id("DSNOTREE.WAL"),
    name_id("SNOMNT.WAL"),
    NO_SPRITE,
    name_id("DEDLTREE.WAL"),
    name_id("DMOUNT.WAL"),
    name_id("LAVAMNT.WAL"),
    name_id("PALM.WAL"),
    name_id("DPALM.WAL"),
    name_id("CACTUS.WAL"),
    name_id("SANDMNT.WAL"),
];

/// Surface sheets by surface type. Type 0 leaves the ground visible.
pub const SURFACE_NAMES: [&str; 16] = [
    "", "DIRT.SRF", "GRASS.SRF", "SNOW.SRF", "SWAMP.SRF", "LAVA.SRF", "DESERT.SRF",
    "ROAD.SRF", "DWATER.SRF", "TFLR.SRF", "SKY.SRF", "CROAD.SRF", "SEWER.SRF", "CLOUD.SRF",
    "SCORTCH.SRF", "SPACE.SRF",
];

/// Surface frame per surface slot, plain and mirrored. Mirroring swaps each row end for end.
pub const SURFACE_FRAMES: [[u8; 25]; 2] = [
    [
        0, 1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12, 13, 14, 15, 16, 17, 18, 19, 20, 21, 22, 23, 24,
    ],
    [
        2, 1, 0, 5, 4, 3, 10, 9, 8, 7, 6, 17, 16, 15, 14, 13, 12, 11, 24, 23, 22, 21, 20, 19, 18,
    ],
];

pub fn sky_name(dark: bool) -> &'static str {
    if dark {
        "NIGHT.SKY"
    } else {
        "SKY.SKY"
    }
}

pub fn ground_name(outdoors: bool, kind: &str) -> String {
    if outdoors {
        "OUTDOOR.GND".to_string()
    } else {
        format!("{kind}.GND")
    }
}

/// Sheet and frame for an indoor wall seen from `distance`. Code 0 is open.
pub fn indoor_wall(kind: &str, code: u8, distance: u8) -> Option<(String, u16)> {
    let code = code & 0x0F;
    match (code, distance) {
        (0, _) => None,
        (1..=7, 0..=1) => Some((format!("F{kind}1.FWL"), u16::from(code - 1))),
        (_, 0..=1) => Some((format!("F{kind}2.FWL"), u16::from(code - 8))),
        _ => Some((format!("F{kind}3.FWL"), FAR_WALL_FRAMES[usize::from(code)])),
    }
}

pub fn side_wall_name(kind: &str) -> String {
    format!("S{kind}.SWL")
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum SlotKind {
    Sky,
    Horizon,
    Ground,
    Surface,
    FacingWall,
    /// Left wall of the cell in `lateral`.
    LeftWall,
    RightWall,
    Object,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SlotId(pub u8);

/// Fixed placement of one slot in the view.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct SlotDef {
    pub kind: SlotKind,
    /// Cells ahead of the viewer.
    pub distance: u8,
    /// Cells to the viewer's right (negative = left).
    pub lateral: i8,
    pub x: i16,
    pub y: i16,
    pub scale: Scale,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct DrawItem {
    pub slot: SlotId,
    /// Archive id of the sprite sheet; `None` hides the slot.
    pub sprite: Option<u16>,
    pub frame: u16,
    pub x: i16,
    pub y: i16,
    pub scale: Scale,
    pub flags: u16,
}

fn lateral_range(width: u8) -> RangeInclusive<i8> {
    let half = (width / 2) as i8;
    -half..=half
}

fn column_x(distance: usize, lateral: i8) -> i16 {
    let width = WALL_WIDTH[distance];
    CENTER_X + i16::from(lateral) * width - width / 2
}

fn slot_layout() -> Vec<SlotDef> {
    let mut slots = Vec::with_capacity(SLOT_COUNT);
    let mut push = |kind: SlotKind, distance: usize, lateral: i8, x: i16, y: i16, scale: Scale| {
        slots.push(SlotDef {
            kind,
            distance: distance as u8,
            lateral,
            x,
            y,
            scale,
        });
    };

    push(SlotKind::Sky, 0, 0, 0, 0, Scale::FULL);
    push(SlotKind::Horizon, 0, 0, 0, HORIZON_Y - 8, Scale::FULL);
    push(SlotKind::Ground, 0, 0, 0, HORIZON_Y, Scale::FULL);

    for (distance, &width) in SURFACE_WIDTHS.iter().enumerate() {
        for lateral in lateral_range(width) {
            push(
                SlotKind::Surface,
                distance,
                lateral,
                column_x(distance, lateral),
                HORIZON_Y + WALL_HEIGHT[distance] / 2,
                Scale(DISTANCE_SCALES[distance]),
            );
        }
    }

    for (distance, &width) in FACING_WALL_WIDTHS.iter().enumerate() {
        for lateral in lateral_range(width) {
            push(
                SlotKind::FacingWall,
                distance,
                lateral,
                column_x(distance, lateral),
                HORIZON_Y - WALL_HEIGHT[distance] / 2,
                Scale(DISTANCE_SCALES[distance]),
            );
        }
    }

    for (distance, &width) in FACING_WALL_WIDTHS.iter().enumerate() {
        let half = (width / 2) as i8;
        let y = HORIZON_Y - WALL_HEIGHT[distance] / 2;
        let scale = Scale(DISTANCE_SCALES[distance]);
        for lateral in -half..=0 {
            let x = column_x(distance, lateral) - SIDE_DEPTH[distance];
            push(SlotKind::LeftWall, distance, lateral, x, y, scale);
        }
        for lateral in 0..=half {
            let x = column_x(distance, lateral) + WALL_WIDTH[distance];
            push(SlotKind::RightWall, distance, lateral, x, y, scale);
        }
    }

    for (distance, &width) in OBJECT_WIDTHS.iter().enumerate() {
        for lateral in lateral_range(width) {
            push(
                SlotKind::Object,
                distance,
                lateral,
                column_x(distance, lateral),
                HORIZON_Y - WALL_HEIGHT[distance] / 4,
                Scale(DISTANCE_SCALES[distance]),
            );
        }
    }

    slots
}

fn select(layout: &[SlotDef], pred: impl Fn(&SlotDef) -> bool) -> Vec<usize> {
    layout
        .iter()
        .enumerate()
        .filter(|(_, def)| pred(def))
        .map(|(idx, _)| idx)
        .collect()
}

/// Slot indices in painter's order: backdrop, surfaces far to near, then per distance
/// (far to near) facing walls, side walls and occupants.
fn blit_order(layout: &[SlotDef]) -> Vec<usize> {
    let mut order = select(layout, |def| {
        matches!(
            def.kind,
            SlotKind::Sky | SlotKind::Horizon | SlotKind::Ground
        )
    });
    for distance in (0..5u8).rev() {
        order.extend(select(layout, |def| {
            def.kind == SlotKind::Surface && def.distance == distance
        }));
    }
    for distance in (0..5u8).rev() {
        for kinds in [
            &[SlotKind::FacingWall][..],
            &[SlotKind::LeftWall, SlotKind::RightWall],
            &[SlotKind::Object],
        ] {
            order.extend(select(layout, |def| {
                kinds.contains(&def.kind) && def.distance == distance
            }));
        }
    }
    order
}

/// Fixed-shape draw list for the first-person view, refilled every frame.
#[derive(Clone, Debug)]
pub struct DrawList {
    layout: Vec<SlotDef>,
    items: Vec<DrawItem>,
    order: Vec<usize>,
}

impl Default for DrawList {
    fn default() -> Self {
        Self::new()
    }
}

impl DrawList {
    pub fn new() -> Self {
        let layout = slot_layout();
        let order = blit_order(&layout);
        let mut list = Self {
            items: Vec::with_capacity(layout.len()),
            layout,
            order,
        };
        list.items = (0..list.layout.len())
            .map(|idx| list.blank_item(idx))
            .collect();
        list
    }

    fn blank_item(&self, idx: usize) -> DrawItem {
        let def = &self.layout[idx];
        DrawItem {
            slot: SlotId(idx as u8),
            sprite: None,
            frame: 0,
            x: def.x,
            y: def.y,
            scale: def.scale,
            flags: 0,
        }
    }

    /// Hides every slot and restores the fixed placements.
    pub fn clear(&mut self) {
        for idx in 0..self.items.len() {
            self.items[idx] = self.blank_item(idx);
        }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn slot(&self, id: SlotId) -> Option<&SlotDef> {
        self.layout.get(usize::from(id.0))
    }

    pub fn item(&self, id: SlotId) -> Option<&DrawItem> {
        self.items.get(usize::from(id.0))
    }

    pub(crate) fn item_mut(&mut self, id: SlotId) -> &mut DrawItem {
        &mut self.items[usize::from(id.0)]
    }

    /// Slot of `kind` at the given distance and lateral offset.
    pub fn find(&self, kind: SlotKind, distance: u8, lateral: i8) -> Option<SlotId> {
        self.layout
            .iter()
            .position(|def| def.kind == kind && def.distance == distance && def.lateral == lateral)
            .map(|idx| SlotId(idx as u8))
    }

    pub fn slots_of(&self, kind: SlotKind) -> impl Iterator<Item = (SlotId, &SlotDef)> + '_ {
        self.layout
            .iter()
            .enumerate()
            .filter(move |(_, def)| def.kind == kind)
            .map(|(idx, def)| (SlotId(idx as u8), def))
    }

    /// Items in storage order.
    pub fn items(&self) -> &[DrawItem] {
        &self.items
    }

    /// Items in blit order.
    pub fn iter(&self) -> impl Iterator<Item = &DrawItem> + '_ {
        self.order.iter().map(move |&idx| &self.items[idx])
    }

    pub fn visible(&self) -> impl Iterator<Item = &DrawItem> + '_ {
        self.iter().filter(|item| item.sprite.is_some())
    }

    /// Blits every visible item into `target` with the view's top-left at `origin`.
    /// Returns the number of items drawn; missing or corrupt sprites are skipped.
    pub fn render(
        &self,
        target: &mut dyn SpriteTarget,
        archive: &Archive,
        sprites: &mut SpriteCache,
        origin: (i32, i32),
    ) -> usize {
        let mut drawn = 0;
        for item in self.visible() {
            let Some(id) = item.sprite else {
                continue;
            };
            let Some(sheet) = sprites.get(archive, id) else {
                continue;
            };
            let opts = DrawOptions::from_flags(item.flags, item.scale);
            let x = origin.0 + i32::from(item.x);
            let y = origin.1 + i32::from(item.y);
            match sheet.draw(target, usize::from(item.frame), x, y, &opts) {
                Ok(()) => drawn += 1,
                Err(err) => warn!("slot {}: sprite {id:#06x}: {err}", item.slot.0),
            }
        }
        drawn
    }
}
