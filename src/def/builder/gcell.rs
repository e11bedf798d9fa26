// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Huang Rui <vowstar@gmail.com>

use super::{impl_builder, BuilderBase, Session};
use crate::db::{GCellGrid, GridPattern};
use crate::def::DefAxis;

/// GCELLGRID statements. Each one is complete on its own.
#[derive(Default)]
pub struct GCellBuilder {
    base: BuilderBase,
}

impl_builder!(GCellBuilder);

impl GCellBuilder {
    fn reset_state(&mut self) {}

    pub fn grid(&mut self, s: &mut Session<'_>, axis: DefAxis, start: i32, count: i32, step: i32) {
        let pattern = GridPattern {
            origin: self.base.dbdist(start),
            count,
            step: self.base.dbdist(step),
        };
        let grid = s.block.gcell_grid.get_or_insert_with(GCellGrid::default);
        match axis {
            DefAxis::X => grid.x.push(pattern),
            DefAxis::Y => grid.y.push(pattern),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::super::testutil;
    use super::super::Builder;
    use super::*;

    #[test]
    fn test_grid_accumulates() {
        let (tech, libs, mut block) = (testutil::tech(), testutil::libs(), testutil::block());
        let mut s = Session::new(&tech, &libs, &mut block);
        let mut b = GCellBuilder::default();
        b.init(1000);
        b.grid(&mut s, DefAxis::X, 0, 10, 100);
        b.grid(&mut s, DefAxis::X, 1000, 2, 50);
        b.grid(&mut s, DefAxis::Y, 0, 5, 100);
        let grid = s.block.gcell_grid.as_ref().unwrap();
        assert_eq!(grid.x.len(), 2);
        assert_eq!(grid.y[0].step, 1000);
    }
}
