// ABOUTME: Bus address translation for reg properties
// ABOUTME: Walks ancestor ranges properties to map child bus addresses into the root address space

use super::property::decode_cells;
use super::tree::{DeviceTree, DeviceTreeNode};
use log::trace;

/// Combine big-endian cells into one number, most significant first.
fn combine(cells: &[u32]) -> Option<u128> {
    if cells.len() > 4 {
        return None;
    }
    Some(
        cells
            .iter()
            .fold(0u128, |acc, &cell| (acc << 32) | u128::from(cell)),
    )
}

/// Translate `reg` cells of `node` into flattened `(address, size)` pairs.
///
/// Returns `None` when the payload does not split into whole entries for the
/// node's cell sizes, or when a field spans more than two cells; the caller
/// then keeps the plain cell list.
pub fn translate_reg(tree: &DeviceTree, node: &DeviceTreeNode, cells: &[u32]) -> Option<Vec<u64>> {
    let sizes = tree.cell_sizes(&node.path)?;
    let (address_cells, size_cells) = (sizes.address as usize, sizes.size as usize);
    if address_cells == 0 || address_cells > 2 || size_cells > 2 {
        return None;
    }

    let entry_cells = address_cells + size_cells;
    if cells.is_empty() || cells.len() % entry_cells != 0 {
        return None;
    }

    let mut words = Vec::with_capacity(cells.len() / entry_cells * 2);
    for entry in cells.chunks_exact(entry_cells) {
        let (address, size) = entry.split_at(address_cells);
        let address = u64::try_from(combine(address)?).ok()?;
        words.push(translate_address(tree, node, address));
        if size_cells > 0 {
            words.push(u64::try_from(combine(size)?).ok()?);
        }
    }
    Some(words)
}

/// Map `address`, expressed in the address space of `node`'s parent bus, up
/// through every ancestor's `ranges`.
///
/// Translation stops (keeping the address reached so far) at the root, at a
/// bus with no `ranges`, or at a bus none of whose ranges cover the address.
/// An empty `ranges` is an identity mapping.
pub fn translate_address(tree: &DeviceTree, node: &DeviceTreeNode, address: u64) -> u64 {
    let mut address = address;
    let mut bus = tree.parent(node);

    while let Some(current) = bus {
        if current.is_root() {
            break;
        }
        let Some(ranges) = current.find_property("ranges") else {
            break;
        };
        if !ranges.data.is_empty() {
            match map_through_ranges(tree, current, &ranges.data, address) {
                Some(mapped) => {
                    trace!("{}: 0x{:x} -> 0x{:x}", current.path, address, mapped);
                    address = mapped;
                }
                None => break,
            }
        }
        bus = tree.parent(current);
    }

    address
}

fn map_through_ranges(
    tree: &DeviceTree,
    bus: &DeviceTreeNode,
    ranges: &[u8],
    address: u64,
) -> Option<u64> {
    let child = tree.child_cell_sizes(&bus.path)?;
    let parent_address_cells = tree.cell_sizes(&bus.path)?.address as usize;
    let (child_address_cells, size_cells) = (child.address as usize, child.size as usize);

    let entry_cells = child_address_cells + parent_address_cells + size_cells;
    let cells = decode_cells(ranges)?;
    if entry_cells == 0 || cells.len() % entry_cells != 0 {
        return None;
    }

    let address = u128::from(address);
    cells.chunks_exact(entry_cells).find_map(|entry| {
        let (child_base, rest) = entry.split_at(child_address_cells);
        let (parent_base, size) = rest.split_at(parent_address_cells);
        let (child_base, parent_base, size) =
            (combine(child_base)?, combine(parent_base)?, combine(size)?);

        let offset = address.checked_sub(child_base)?;
        if offset >= size {
            return None;
        }
        u64::try_from(parent_base.checked_add(offset)?).ok()
    })
}
