// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Huang Rui <vowstar@gmail.com>

use super::{impl_builder, BuilderBase, Session, Slot};
use crate::db::{find_site, Orient, PropValue, Row, RowDir};
use crate::def::props::PropertySink;
use crate::def::DefPoint;
use crate::error::ProtocolError;

pub struct RowBuilder {
    base: BuilderBase,
    row: Slot<Row>,
    pub row_cnt: u32,
}

impl Default for RowBuilder {
    fn default() -> Self {
        Self {
            base: BuilderBase::default(),
            row: Slot::new("row"),
            row_cnt: 0,
        }
    }
}

impl_builder!(RowBuilder);

impl RowBuilder {
    fn reset_state(&mut self) {
        self.row.abandon();
        self.row_cnt = 0;
    }

    pub fn begin(
        &mut self,
        s: &mut Session<'_>,
        name: &str,
        site: &str,
        origin: DefPoint,
        orient: Orient,
    ) -> Result<(), ProtocolError> {
        if s.block.rows.contains(name) {
            self.base.error(s, format!("Row {name} already exists"));
            return self.row.begin_discarded();
        }
        if find_site(s.libs, site).is_none() {
            self.base
                .error(s, format!("Unknown site {site} referenced by row {name}"));
            return self.row.begin_discarded();
        }
        self.row.begin(Row {
            name: name.to_string(),
            site: site.to_string(),
            origin: self.base.point(origin),
            orient,
            dir: Some(RowDir::Horizontal),
            num_sites: 1,
            spacing: 0,
            properties: Default::default(),
        })
    }

    /// `DO x BY y STEP sx sy`. A single row of sites is horizontal, anything
    /// else is a vertical column.
    pub fn repeat(&mut self, count: (i32, i32), step: Option<(i32, i32)>) -> Result<(), ProtocolError> {
        let (sx, sy) = step.unwrap_or_default();
        let (xstep, ystep) = (self.base.dbdist(sx), self.base.dbdist(sy));
        if let Some(row) = self.row.draft("repeat")? {
            if count.1 == 1 {
                row.dir = Some(RowDir::Horizontal);
                row.num_sites = count.0;
                row.spacing = xstep;
            } else {
                row.dir = Some(RowDir::Vertical);
                row.num_sites = count.1;
                row.spacing = ystep;
            }
        }
        Ok(())
    }

    pub fn end(&mut self, s: &mut Session<'_>) -> Result<(), ProtocolError> {
        if let Some(row) = self.row.finish()? {
            self.row_cnt += 1;
            let _ = s.block.rows.insert(row);
        }
        Ok(())
    }

    pub fn abandon(&mut self) {
        self.row.abandon();
    }
}

impl PropertySink for RowBuilder {
    fn set_property(&mut self, name: &str, value: PropValue) -> Result<(), ProtocolError> {
        if let Some(row) = self.row.draft("property")? {
            row.properties.insert(name.to_string(), value);
        }
        Ok(())
    }
}
