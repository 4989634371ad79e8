//! Shared box cells for the encode pass.
//!
//! A parent container and the nested container it creates both refer to
//! the same slot by index into one arena. The walk is strictly nested, so
//! the nested container borrows the arena exclusively while it is alive and
//! the parent observes its writes afterwards. `into_box` freezes the arena
//! into an owned tree.
use crate::boxes::{Attributes, KeyedBox, SingleElementBox, XmlBox};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellId(usize);

#[derive(Debug)]
pub(crate) enum Cell {
    /// Allocated, nothing written yet; freezes to Null.
    Pending,
    Built(XmlBox),
    Keyed(KeyedCell),
    Unkeyed(Vec<CellId>),
    SingleElement(SingleElementCell),
}

#[derive(Debug, Default)]
pub(crate) struct KeyedCell {
    pub elements: Vec<(String, CellId)>,
    pub attributes: Attributes,
}

/// One slot; a later write replaces the earlier child.
#[derive(Debug, Default)]
pub(crate) struct SingleElementCell {
    pub element: Option<(String, CellId)>,
    pub attributes: Attributes,
}

#[derive(Debug, Default)]
pub struct BoxArena {
    cells: Vec<Cell>,
}

impl BoxArena {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub(crate) fn alloc(&mut self, cell: Cell) -> CellId {
        self.cells.push(cell);
        CellId(self.cells.len() - 1)
    }

    pub(crate) fn alloc_built(&mut self, value: XmlBox) -> CellId {
        self.alloc(Cell::Built(value))
    }

    /// Keyed view of a slot; a slot of another shape is reset to an empty
    /// keyed cell first.
    pub(crate) fn keyed_mut(&mut self, id: CellId) -> &mut KeyedCell {
        let cell = &mut self.cells[id.0];
        if !matches!(cell, Cell::Keyed(_)) {
            *cell = Cell::Keyed(KeyedCell::default());
        }
        match cell {
            Cell::Keyed(keyed) => keyed,
            _ => unreachable!("slot was just made keyed"),
        }
    }

    pub(crate) fn unkeyed_mut(&mut self, id: CellId) -> &mut Vec<CellId> {
        let cell = &mut self.cells[id.0];
        if !matches!(cell, Cell::Unkeyed(_)) {
            *cell = Cell::Unkeyed(Vec::new());
        }
        match cell {
            Cell::Unkeyed(items) => items,
            _ => unreachable!("slot was just made unkeyed"),
        }
    }

    pub(crate) fn single_mut(&mut self, id: CellId) -> &mut SingleElementCell {
        let cell = &mut self.cells[id.0];
        if !matches!(cell, Cell::SingleElement(_)) {
            *cell = Cell::SingleElement(SingleElementCell::default());
        }
        match cell {
            Cell::SingleElement(single) => single,
            _ => unreachable!("slot was just made single-element"),
        }
    }

    pub(crate) fn set(&mut self, id: CellId, cell: Cell) {
        self.cells[id.0] = cell;
    }

    pub(crate) fn is_keyed(&self, id: CellId) -> bool {
        matches!(self.cells[id.0], Cell::Keyed(_))
    }

    pub(crate) fn is_unkeyed(&self, id: CellId) -> bool {
        matches!(self.cells[id.0], Cell::Unkeyed(_))
    }

    pub(crate) fn is_single(&self, id: CellId) -> bool {
        matches!(self.cells[id.0], Cell::SingleElement(_))
    }

    /// Freeze the subtree rooted at `root`. Cells not reachable from it
    /// (overwritten single-element children) are dropped.
    pub fn into_box(mut self, root: CellId) -> XmlBox {
        self.take(root)
    }

    fn take(&mut self, id: CellId) -> XmlBox {
        match std::mem::replace(&mut self.cells[id.0], Cell::Pending) {
            Cell::Pending => XmlBox::Null,
            Cell::Built(value) => value,
            Cell::Keyed(keyed) => {
                let mut out = KeyedBox { elements: Vec::with_capacity(keyed.elements.len()), attributes: keyed.attributes };
                for (key, child) in keyed.elements {
                    let child = self.take(child);
                    out.elements.push((key, child));
                }
                XmlBox::Keyed(out)
            }
            Cell::Unkeyed(items) => XmlBox::Unkeyed(items.into_iter().map(|item| self.take(item)).collect()),
            Cell::SingleElement(single) => match single.element {
                Some((key, child)) => XmlBox::SingleElement(SingleElementBox {
                    key,
                    element: Box::new(self.take(child)),
                    attributes: single.attributes,
                }),
                // attributes without a child still describe the element
                None if !single.attributes.is_empty() => {
                    XmlBox::Keyed(KeyedBox { elements: Vec::new(), attributes: single.attributes })
                }
                None => XmlBox::Null,
            },
        }
    }
}
