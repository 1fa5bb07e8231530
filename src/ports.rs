// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Port range arithmetic shared by listener discovery and validation.

use crate::crd::PortRange;

/// Consolidate individual ports into the minimal set of contiguous ranges.
///
/// Duplicates collapse and adjacent ports merge; the input order does not matter.
///
/// ```rust
/// use accelerator_operator::crd::PortRange;
/// use accelerator_operator::ports::consolidate_port_ranges;
///
/// assert_eq!(
///     consolidate_port_ranges(&[82, 80, 81, 443, 80]),
///     vec![PortRange::new(80, 82), PortRange::single(443)]
/// );
/// ```
#[must_use]
pub fn consolidate_port_ranges(ports: &[i32]) -> Vec<PortRange> {
    let singles: Vec<PortRange> = ports.iter().copied().map(PortRange::single).collect();
    merge_port_ranges(&singles)
}

/// Merge overlapping or adjacent ranges into a sorted, minimal list.
#[must_use]
pub fn merge_port_ranges(ranges: &[PortRange]) -> Vec<PortRange> {
    let mut sorted = ranges.to_vec();
    sorted.sort_unstable();

    let mut merged: Vec<PortRange> = Vec::with_capacity(sorted.len());
    for range in sorted {
        match merged.last_mut() {
            Some(last) if range.from_port <= last.to_port.saturating_add(1) => {
                last.to_port = last.to_port.max(range.to_port);
            }
            _ => merged.push(range),
        }
    }
    merged
}

/// Whether `port` lies in at least one of `ranges` (bounds inclusive).
#[must_use]
pub fn is_port_in_ranges(port: i32, ranges: &[PortRange]) -> bool {
    ranges
        .iter()
        .any(|range| range.from_port <= port && port <= range.to_port)
}

/// Whether any range of `a` shares a port with any range of `b`.
#[must_use]
pub fn ranges_overlap(a: &[PortRange], b: &[PortRange]) -> bool {
    a.iter().any(|left| {
        b.iter()
            .any(|right| left.from_port <= right.to_port && right.from_port <= left.to_port)
    })
}

#[cfg(test)]
#[path = "ports_tests.rs"]
mod ports_tests;
