//! Dispatch-table geometry.

/// Pointer-sized slots at the top of every class object before the first
/// method pointer: parent, name, ivars size and method count.
pub const DISPATCH_HEADER_SLOTS: usize = 4;

/// Byte layout of per-class dispatch tables.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct DispatchLayout {
    /// Bytes before the first method slot.
    pub header_size: usize,
    /// Width of one method slot.
    pub pointer_size: usize,
}

impl Default for DispatchLayout {
    fn default() -> Self {
        DispatchLayout::for_pointer_size(8)
    }
}

impl DispatchLayout {
    /// Layout with the standard header on a target with `pointer_size`-byte
    /// pointers.
    pub fn for_pointer_size(pointer_size: usize) -> Self {
        DispatchLayout {
            header_size: DISPATCH_HEADER_SLOTS * pointer_size,
            pointer_size,
        }
    }

    /// Byte offset of the method in dispatch slot `index`.
    pub fn offset(&self, index: usize) -> usize {
        self.header_size + index * self.pointer_size
    }

    /// Total size of a table holding `num_methods` slots.
    pub fn table_size(&self, num_methods: usize) -> usize {
        self.offset(num_methods)
    }
}
