use crate::direction::{Direction, Pos};
use crate::draw::{
    ground_name, indoor_wall, side_wall_name, sky_name, DrawList, SlotDef, SlotId, SlotKind,
    ALT_FRAME, FLIP, NO_SPRITE, OUTDOOR_WALL_IDS, SURFACE_FRAMES, SURFACE_NAMES,
};
use crate::map::Map;
use ccfile::name_id;

/// Nearest blocking facing-wall distance per lateral column `-4..=4`.
struct Occlusion([Option<u8>; 9]);

impl Occlusion {
    fn column(lateral: i8) -> usize {
        (i16::from(lateral) + 4).clamp(0, 8) as usize
    }

    fn block(&mut self, lateral: i8, distance: u8) {
        let slot = &mut self.0[Self::column(lateral)];
        if slot.map_or(true, |nearest| distance < nearest) {
            *slot = Some(distance);
        }
    }

    /// Whether something at `distance` sits behind a nearer blocking wall.
    fn hides(&self, lateral: i8, distance: u8) -> bool {
        self.0[Self::column(lateral)].is_some_and(|nearest| nearest < distance)
    }
}

fn show(list: &mut DrawList, id: SlotId, sprite: u16, frame: u16, flags: u16) {
    let item = list.item_mut(id);
    item.sprite = Some(sprite);
    item.frame = frame;
    item.flags = flags;
}

fn slots(list: &DrawList, kind: SlotKind) -> Vec<(SlotId, SlotDef)> {
    list.slots_of(kind).map(|(id, def)| (id, *def)).collect()
}

fn cell_of(pos: Pos, facing: Direction, def: &SlotDef) -> Pos {
    facing.move_by(pos, i32::from(def.lateral), i32::from(def.distance))
}

impl Map {
    /// Projects the view from `pos` looking `facing` into `list`.
    pub fn fill_draw_list(&self, list: &mut DrawList, pos: Pos, facing: Direction) {
        list.clear();
        let outdoors = self.is_outdoors();
        let kind = self.home().wall_kind();
        let mirror = self.is_mirrored();
        let flip = if mirror { FLIP } else { 0 };

        let sky = name_id(sky_name(self.is_dark()));
        let ground = name_id(&ground_name(outdoors, kind));
        for (id, _) in slots(list, SlotKind::Sky) {
            show(list, id, sky, 0, flip);
        }
        if outdoors {
            for (id, _) in slots(list, SlotKind::Horizon) {
                show(list, id, ground, 1, flip);
            }
        }
        for (id, _) in slots(list, SlotKind::Ground) {
            show(list, id, ground, 0, flip);
        }

        for (n, (id, def)) in slots(list, SlotKind::Surface).into_iter().enumerate() {
            let surface = self.get_surface(cell_of(pos, facing, &def));
            if surface == 0 {
                continue;
            }
            let frame = SURFACE_FRAMES[usize::from(mirror)][n];
            let sheet = name_id(SURFACE_NAMES[usize::from(surface & 0x0F)]);
            show(list, id, sheet, u16::from(frame), flip);
        }

        let walls = slots(list, SlotKind::FacingWall);
        let mut occlusion = Occlusion([None; 9]);
        for (_, def) in &walls {
            if self.blocks_view(cell_of(pos, facing, def), facing) {
                occlusion.block(def.lateral, def.distance);
            }
        }

        for (id, def) in &walls {
            if occlusion.hides(def.lateral, def.distance) {
                continue;
            }
            let cell = cell_of(pos, facing, def);
            let code = self.wall(cell, facing);
            if code == 0 {
                continue;
            }
            let art = self.wall_art(cell, code);
            if outdoors {
                let sheet = OUTDOOR_WALL_IDS[usize::from(art & 0x0F)];
                if sheet != NO_SPRITE {
                    show(list, *id, sheet, u16::from(def.distance), 0);
                }
            } else if let Some((sheet, frame)) = indoor_wall(kind, art, def.distance) {
                show(list, *id, name_id(&sheet), frame, 0);
            }
        }

        if !outdoors {
            let sheet = name_id(&side_wall_name(kind));
            for (side, right) in [(SlotKind::LeftWall, false), (SlotKind::RightWall, true)] {
                for (id, def) in slots(list, side) {
                    if occlusion.hides(def.lateral, def.distance) {
                        continue;
                    }
                    let tile = self.get_tile(cell_of(pos, facing, &def), facing);
                    let code = if right { (tile >> 8) & 0x0F } else { tile & 0x0F };
                    if code == 0 {
                        continue;
                    }
                    let parity = u16::from(mirror) ^ u16::from(def.distance & 1);
                    let frame = u16::from(def.distance) * 2 + parity;
                    show(list, id, sheet, frame, if right { FLIP } else { 0 });
                }
            }
        }

        for (id, def) in slots(list, SlotKind::Object) {
            if occlusion.hides(def.lateral, def.distance) {
                continue;
            }
            let Some(object) = self.objects().at(cell_of(pos, facing, &def)) else {
                continue;
            };
            let (frame, mut flags) = match facing.relative(object.facing) {
                0 => (2, 0),
                2 => (0, 0),
                1 => (1, FLIP),
                _ => (1, 0),
            };
            if def.distance > 1 {
                flags |= ALT_FRAME;
            }
            show(list, id, name_id(&object.sprite_name()), frame, flags);
        }
    }

    /// Art code for wall `code` at `pos`, through the owning segment's wall-type table.
    fn wall_art(&self, pos: Pos, code: u8) -> u8 {
        match self.segment_at(pos) {
            Some((segment, _)) => segment.wall_type(code),
            None => self.home().wall_type(code),
        }
    }
}
