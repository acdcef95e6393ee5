pub mod error;
pub mod line;

use crate::error::Error;
use crate::line::{facing_matches, frame_line};
use log::{debug, trace, warn};
use std::collections::btree_map::Entry;
use std::collections::BTreeMap;

pub use crate::line::{CellPos, EventLine, EventOp, ANY_FACING};

pub type Result<T> = core::result::Result<T, Error>;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
struct LineRef {
    offset: usize,
    facing: u8,
}

/// A run of contiguous lines sharing one cell.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct EventInfo {
    pub cell: CellPos,
    /// Byte offset of the first line.
    pub offset: usize,
    /// Index of the first line across the whole blob.
    pub first_line: usize,
    pub line_count: usize,
}

/// What the host has to do after a heartbeat.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum EventAction {
    /// Show map text `text`; answer with [`Decision::Dismissed`].
    Message { text: u8 },
    /// Ask a yes/no question.
    YesNo { text: u8 },
    /// Open an NPC dialog; [`Decision::Yes`] confirms.
    Npc { text: u8, portrait: u8 },
    /// Move the party. The event has finished.
    Teleport {
        x: u8,
        y: u8,
        facing: u8,
        map: Option<u16>,
    },
    Sound { id: u8 },
    Finished,
}

/// Answer from the UI window an opcode opened.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Decision {
    Dismissed,
    Yes,
    No,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum Pending {
    Message,
    Choice { branch: u8 },
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
struct Running {
    event: usize,
    line: usize,
    pending: Option<Pending>,
}

/// Scripted events of one map plus the state of the event currently executing.
#[derive(Clone, Debug, Default)]
pub struct EventList {
    data: Vec<u8>,
    lines: Vec<LineRef>,
    events: Vec<EventInfo>,
    index: BTreeMap<CellPos, usize>,
    running: Option<Running>,
}

impl EventList {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Splits `bytes` into lines and indexes the first line of every cell.
    pub fn parse(bytes: &[u8]) -> Result<Self> {
        let mut lines = Vec::new();
        let mut events: Vec<EventInfo> = Vec::new();
        let mut index = BTreeMap::new();

        let mut offset = 0usize;
        while offset < bytes.len() {
            let (header, end) = frame_line(bytes, offset)?;
            let cell = CellPos::new(header[0], header[1]);
            match events.last_mut() {
                Some(current) if current.cell == cell => current.line_count += 1,
                _ => {
                    events.push(EventInfo {
                        cell,
                        offset,
                        first_line: lines.len(),
                        line_count: 1,
                    });
                    match index.entry(cell) {
                        Entry::Vacant(slot) => {
                            slot.insert(offset);
                        }
                        Entry::Occupied(first) => {
                            debug!(
                                "cell {cell} has a second event at {offset:#x}, keeping {:#x}",
                                first.get()
                            );
                        }
                    }
                }
            }
            lines.push(LineRef {
                offset,
                facing: header[2],
            });
            offset = end;
        }

        debug!(
            "event list: {} lines, {} events, {} cells",
            lines.len(),
            events.len(),
            index.len()
        );
        Ok(Self {
            data: bytes.to_vec(),
            lines,
            events,
            index,
            running: None,
        })
    }

    /// Cell to byte offset of the first line of its event.
    pub fn index(&self) -> &BTreeMap<CellPos, usize> {
        &self.index
    }

    pub fn events(&self) -> impl Iterator<Item = &EventInfo> {
        self.events.iter()
    }

    pub fn event_at(&self, cell: CellPos) -> Option<&EventInfo> {
        let offset = *self.index.get(&cell)?;
        self.event_slot(offset).map(|event| &self.events[event])
    }

    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Decodes every line in blob order.
    pub fn disassemble(&self) -> impl Iterator<Item = Result<EventLine>> + '_ {
        self.lines
            .iter()
            .map(|line| EventLine::decode(&self.data, line.offset))
    }

    /// Begins the event at `cell` from its `line`-th line. Fails when another event is
    /// running, nothing is attached to the cell, or the line's facing does not match.
    pub fn start(&mut self, cell: CellPos, facing: u8, line: usize) -> bool {
        if self.running.is_some() {
            return false;
        }
        let Some(&offset) = self.index.get(&cell) else {
            return false;
        };
        let Some(event) = self.event_slot(offset) else {
            return false;
        };
        let info = self.events[event];
        if line >= info.line_count {
            return false;
        }
        if !facing_matches(self.lines[info.first_line + line].facing, facing) {
            return false;
        }

        debug!("event at {cell} started at line {line}");
        self.running = Some(Running {
            event,
            line,
            pending: None,
        });
        true
    }

    /// Executes one line of the running event.
    ///
    /// Returns `None` when nothing is running, the event waits for [`EventList::resume`],
    /// or the line only moved the cursor.
    pub fn heartbeat(&mut self) -> Option<EventAction> {
        let mut state = self.running?;
        if state.pending.is_some() {
            return None;
        }
        let info = self.events[state.event];
        if state.line >= info.line_count {
            return Some(self.finish());
        }

        let offset = self.lines[info.first_line + state.line].offset;
        let line = match EventLine::decode(&self.data, offset) {
            Ok(line) => line,
            Err(err) => {
                warn!("event at {}: {err}", info.cell);
                return Some(self.finish());
            }
        };
        trace!("{line}");

        let action = match line.op {
            EventOp::Exit => return Some(self.finish()),
            EventOp::Message { text } => {
                state.pending = Some(Pending::Message);
                Some(EventAction::Message { text })
            }
            EventOp::YesNo { text, no_line } => {
                state.pending = Some(Pending::Choice { branch: no_line });
                Some(EventAction::YesNo { text })
            }
            EventOp::Npc {
                text,
                portrait,
                deny_line,
            } => {
                state.pending = Some(Pending::Choice { branch: deny_line });
                Some(EventAction::Npc { text, portrait })
            }
            EventOp::Teleport { x, y, facing, map } => {
                self.finish();
                return Some(EventAction::Teleport {
                    x,
                    y,
                    facing,
                    map: (map != 0).then_some(map),
                });
            }
            EventOp::Goto { line } => {
                state.line = jump_target(&info, line);
                None
            }
            EventOp::Sound { id } => {
                state.line += 1;
                Some(EventAction::Sound { id })
            }
            EventOp::Unknown { opcode, .. } => {
                warn!(
                    "event at {}: unknown opcode {opcode:#04x} at {offset:#x}",
                    info.cell
                );
                return Some(self.finish());
            }
        };
        self.running = Some(state);
        action
    }

    /// Hands the UI's answer to a suspended event. Returns false when nothing waits for one.
    pub fn resume(&mut self, decision: Decision) -> bool {
        let Some(mut state) = self.running else {
            return false;
        };
        let Some(pending) = state.pending.take() else {
            return false;
        };
        let info = self.events[state.event];
        state.line = match (pending, decision) {
            (Pending::Choice { branch }, Decision::No | Decision::Dismissed) => {
                jump_target(&info, branch)
            }
            _ => state.line + 1,
        };
        self.running = Some(state);
        true
    }

    /// Drops the running event, e.g. when the party leaves the map.
    pub fn abort(&mut self) {
        if let Some(state) = self.running.take() {
            debug!("event at {} aborted", self.events[state.event].cell);
        }
    }

    pub fn is_running(&self) -> bool {
        self.running.is_some()
    }

    pub fn is_suspended(&self) -> bool {
        matches!(self.running, Some(Running { pending: Some(_), .. }))
    }

    pub fn running_cell(&self) -> Option<CellPos> {
        self.running.map(|state| self.events[state.event].cell)
    }

    fn event_slot(&self, offset: usize) -> Option<usize> {
        self.events
            .binary_search_by_key(&offset, |event| event.offset)
            .ok()
    }

    fn finish(&mut self) -> EventAction {
        if let Some(state) = self.running.take() {
            debug!("event at {} finished", self.events[state.event].cell);
        }
        EventAction::Finished
    }
}

fn jump_target(info: &EventInfo, target: u8) -> usize {
    let target = usize::from(target);
    if target >= info.line_count {
        warn!(
            "event at {}: jump to line {target} past its {} lines",
            info.cell, info.line_count
        );
        return info.line_count;
    }
    target
}
